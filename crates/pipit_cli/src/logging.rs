//! `tracing-subscriber` setup: a plain `fmt` layer filtered by an
//! `EnvFilter`, with `-v`/`-vv` raising the default level the way the
//! teacher's own CLI logging init does.

use tracing_subscriber::EnvFilter;

pub fn init(verbose: u8, quiet: bool) {
    let default_directive = if quiet {
        "pipit=error"
    } else {
        match verbose {
            0 => "pipit=info",
            1 => "pipit=debug",
            _ => "pipit=trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}
