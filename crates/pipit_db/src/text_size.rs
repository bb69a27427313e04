//! Byte offsets and ranges into a source file's text.
//!
//! Grounded on the teacher's `ruff_text_size` crate: a `u32`-backed offset and
//! a half-open `[start, end)` range over it. Kept intentionally small --
//! arithmetic overflow checks and `TryFrom<usize>` are the only ceremony a
//! single-file arena needs.

use std::fmt;
use std::ops::{Add, Sub};

/// A zero-indexed byte offset into a source file.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TextSize(u32);

impl TextSize {
    pub const fn new(offset: u32) -> Self {
        Self(offset)
    }

    pub const fn to_u32(self) -> u32 {
        self.0
    }

    pub fn to_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for TextSize {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl TryFrom<usize> for TextSize {
    type Error = std::num::TryFromIntError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Ok(Self(u32::try_from(value)?))
    }
}

impl fmt::Display for TextSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for TextSize {
    type Output = TextSize;

    fn add(self, rhs: Self) -> Self::Output {
        TextSize(self.0 + rhs.0)
    }
}

impl Sub for TextSize {
    type Output = TextSize;

    fn sub(self, rhs: Self) -> Self::Output {
        TextSize(self.0 - rhs.0)
    }
}

/// A half-open `[start, end)` range of byte offsets in a source file.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct TextRange {
    start: TextSize,
    end: TextSize,
}

impl TextRange {
    pub fn new(start: TextSize, end: TextSize) -> Self {
        assert!(start <= end, "range start must not exceed its end");
        Self { start, end }
    }

    pub fn empty(offset: TextSize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub const fn start(self) -> TextSize {
        self.start
    }

    pub const fn end(self) -> TextSize {
        self.end
    }

    pub fn len(self) -> TextSize {
        self.end - self.start
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    pub fn contains(self, offset: TextSize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// The smallest range containing both `self` and `other`.
    pub fn cover(self, other: TextRange) -> TextRange {
        TextRange::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_takes_the_union_bounds() {
        let a = TextRange::new(TextSize::new(5), TextSize::new(10));
        let b = TextRange::new(TextSize::new(2), TextSize::new(7));
        assert_eq!(a.cover(b), TextRange::new(TextSize::new(2), TextSize::new(10)));
    }

    #[test]
    fn contains_is_half_open() {
        let range = TextRange::new(TextSize::new(0), TextSize::new(3));
        assert!(range.contains(TextSize::new(0)));
        assert!(!range.contains(TextSize::new(3)));
    }
}
