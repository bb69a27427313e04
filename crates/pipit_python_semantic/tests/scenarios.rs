//! Integration tests covering the checker's core narrowing, assignment,
//! overload, unreachable-code, forward-reference, and unnecessary-isinstance
//! behaviors end to end, each built as a hand-constructed AST and run
//! through a full `analyze_file` pass.

use pipit_python_ast::builder;
use pipit_python_ast::{AstArena, Constant, NodeKind};

use pipit_python_semantic::arena::NodeKey;
use pipit_python_semantic::diagnostics::DiagnosticSettings;
use pipit_python_semantic::{analyze_file, AnalysisOutcome, DiagnosticRule, Severity, Type};

fn builtin_name(arena: &pipit_python_semantic::FileArena, ty: &Type) -> Option<String> {
    match ty {
        Type::Object(id) | Type::Class(id) => arena.classes.get(*id).map(|data| data.name.to_string()),
        _ => None,
    }
}

/// S1: `f(x: int | None) -> int` with `if x is None: return 0` followed by
/// `return x + 1` narrows `x` to `int` on the line after the guard, and the
/// function raises no diagnostics of its own.
#[test]
fn s1_early_return_guard_narrows_following_statement() {
    let mut ast = AstArena::new();

    let int_ann = builder::name_expr(&mut ast, "int");
    let none_ann = builder::none_literal(&mut ast);
    let param_ann = builder::bin_op(&mut ast, int_ann, pipit_python_ast::BinOp::BitOr, none_ann);
    let param = builder::simple_param("x", Some(param_ann));
    let return_ann = builder::name_expr(&mut ast, "int");

    let test_subject = builder::name_expr(&mut ast, "x");
    let test_none = builder::none_literal(&mut ast);
    let test = builder::compare_is(&mut ast, test_subject, pipit_python_ast::CmpOp::Is, test_none);
    let zero = builder::int_literal(&mut ast, 0);
    let return_zero = builder::return_stmt(&mut ast, Some(zero));
    let guard = builder::if_stmt(&mut ast, test, vec![return_zero], vec![]);

    let x_in_sum = builder::name_expr(&mut ast, "x");
    let one = builder::int_literal(&mut ast, 1);
    let x_plus_1 = builder::bin_op(&mut ast, x_in_sum, pipit_python_ast::BinOp::Add, one);
    let final_return = builder::return_stmt(&mut ast, Some(x_plus_1));

    let f_def = builder::function_def(&mut ast, "f", vec![param], Some(return_ann), vec![guard, final_return]);
    let f_name = builder::name_expr(&mut ast, "f");
    let five = builder::int_literal(&mut ast, 5);
    let call_f = builder::call(&mut ast, f_name, vec![five]);
    let call_stmt = builder::expr_stmt(&mut ast, call_f);
    let module = builder::module(&mut ast, vec![f_def, call_stmt]);

    let path = camino::Utf8PathBuf::from("s1.py");
    let settings = DiagnosticSettings::default();
    let analyzed = analyze_file(&ast, &path, module, &settings);

    assert!(
        !analyzed.diagnostics.iter().any(|d| d.severity == Severity::Error),
        "unexpected error diagnostics: {:?}",
        analyzed.diagnostics
    );

    let cached = analyzed.arena.type_cache_get(NodeKey::new(x_plus_1)).and_then(|c| c.ty.clone());
    let name = cached.as_ref().and_then(|ty| builtin_name(&analyzed.arena, ty));
    assert_eq!(name.as_deref(), Some("int"), "x + 1 should have narrowed to int, got {cached:?}");
}

/// S2: `x: int = "s"` must report exactly one incompatible-assignment error,
/// and the target's cached type must be the declared `int`, not the string
/// literal's own type.
#[test]
fn s2_incompatible_annotated_assignment_is_reported() {
    let mut ast = AstArena::new();

    let annotation = builder::name_expr(&mut ast, "int");
    let target = builder::name_expr(&mut ast, "x");
    let value = builder::str_literal(&mut ast, "s");
    let ann_assign = builder::ann_assign(&mut ast, target, annotation, Some(value));
    let module = builder::module(&mut ast, vec![ann_assign]);

    let path = camino::Utf8PathBuf::from("s2.py");
    let settings = DiagnosticSettings::default();
    let analyzed = analyze_file(&ast, &path, module, &settings);

    let errors: Vec<_> = analyzed.diagnostics.iter().filter(|d| d.severity == Severity::Error).collect();
    assert_eq!(errors.len(), 1, "expected exactly one error, got {:?}", analyzed.diagnostics);
    assert!(errors[0].message.contains("incompatible"));
    assert!(errors[0].rule.is_none());

    let cached = analyzed.arena.type_cache_get(NodeKey::new(target)).and_then(|c| c.ty.clone());
    let name = cached.as_ref().and_then(|ty| builtin_name(&analyzed.arena, ty));
    assert_eq!(name.as_deref(), Some("int"), "target's cached type should be the declared int, got {cached:?}");
}

/// S3: an overloaded `f` with `(int) -> int` and `(str) -> str` arms resolves
/// `f(1)` to `int` with no diagnostics, and flags `f(1.0)` as matching no
/// overload.
#[test]
fn s3_overload_resolution_picks_matching_arm_and_flags_mismatch() {
    let mut ast = AstArena::new();

    let int_param_ann = builder::name_expr(&mut ast, "int");
    let int_param = builder::simple_param("x", Some(int_param_ann));
    let int_ret = builder::name_expr(&mut ast, "int");
    let int_pass = builder::pass_stmt(&mut ast);
    let f_int = builder::function_def(&mut ast, "f", vec![int_param], Some(int_ret), vec![int_pass]);

    let str_param_ann = builder::name_expr(&mut ast, "str");
    let str_param = builder::simple_param("x", Some(str_param_ann));
    let str_ret = builder::name_expr(&mut ast, "str");
    let str_pass = builder::pass_stmt(&mut ast);
    let f_str = builder::function_def(&mut ast, "f", vec![str_param], Some(str_ret), vec![str_pass]);

    let one = builder::int_literal(&mut ast, 1);
    let f_name_for_int = builder::name_expr(&mut ast, "f");
    let call_int = builder::call(&mut ast, f_name_for_int, vec![one]);
    let call_int_stmt = builder::expr_stmt(&mut ast, call_int);

    let one_float = ast.push(NodeKind::Constant(Constant::Float("1.0".into())), builder::zero_range(), &[]);
    let f_name_for_float = builder::name_expr(&mut ast, "f");
    let call_float = builder::call(&mut ast, f_name_for_float, vec![one_float]);
    let call_float_stmt = builder::expr_stmt(&mut ast, call_float);

    let module = builder::module(&mut ast, vec![f_int, f_str, call_int_stmt, call_float_stmt]);

    let path = camino::Utf8PathBuf::from("s3.py");
    let settings = DiagnosticSettings::default();
    let analyzed = analyze_file(&ast, &path, module, &settings);

    let cached = analyzed.arena.type_cache_get(NodeKey::new(call_int)).and_then(|c| c.ty.clone());
    let name = cached.as_ref().and_then(|ty| builtin_name(&analyzed.arena, ty));
    assert_eq!(name.as_deref(), Some("int"), "f(1) should resolve to int, got {cached:?}");

    let overload_errors: Vec<_> = analyzed
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error && d.message.contains("no overloads match"))
        .collect();
    assert_eq!(
        overload_errors.len(),
        1,
        "expected exactly one overload-mismatch error, got {:?}",
        analyzed.diagnostics
    );
}

/// S4: `def g(): raise E(); print("x")` -- the statement after an
/// unconditional raise is unreachable and reported as such.
#[test]
fn s4_unreachable_statement_after_raise_is_reported() {
    let mut ast = AstArena::new();

    let exc_callee = builder::name_expr(&mut ast, "E");
    let exc = builder::call(&mut ast, exc_callee, vec![]);
    let raise = builder::raise_stmt(&mut ast, Some(exc));
    let message = builder::str_literal(&mut ast, "x");
    let print_callee = builder::name_expr(&mut ast, "print");
    let print_call = builder::call(&mut ast, print_callee, vec![message]);
    let print_stmt = builder::expr_stmt(&mut ast, print_call);

    let g_def = builder::function_def(&mut ast, "g", vec![], None, vec![raise, print_stmt]);
    let module = builder::module(&mut ast, vec![g_def]);

    let path = camino::Utf8PathBuf::from("s4.py");
    let settings = DiagnosticSettings::default();
    let analyzed = analyze_file(&ast, &path, module, &settings);

    assert!(
        analyzed
            .diagnostics
            .iter()
            .any(|d| d.message.contains("unreachable") && d.range == ast.range(print_stmt)),
        "expected an unreachable-code diagnostic on the print statement, got {:?}",
        analyzed.diagnostics
    );
}

/// S5: `class A: x: "B"` followed by `class B: pass` resolves `A.x`'s
/// forward-reference annotation to `B` within a few passes, with no
/// diagnostics.
#[test]
fn s5_forward_reference_to_a_later_class_resolves() {
    let mut ast = AstArena::new();

    let forward_ann = builder::str_literal(&mut ast, "B");
    let field_target = builder::name_expr(&mut ast, "x");
    let field = builder::ann_assign(&mut ast, field_target, forward_ann, None);
    let class_a = builder::class_def(&mut ast, "A", vec![], vec![field]);

    let b_pass = builder::pass_stmt(&mut ast);
    let class_b = builder::class_def(&mut ast, "B", vec![], vec![b_pass]);

    let module = builder::module(&mut ast, vec![class_a, class_b]);

    let path = camino::Utf8PathBuf::from("s5.py");
    let settings = DiagnosticSettings::default();
    let analyzed = analyze_file(&ast, &path, module, &settings);

    assert!(analyzed.passes <= 3, "expected convergence within 3 passes, took {}", analyzed.passes);
    assert_eq!(analyzed.outcome, AnalysisOutcome::Converged);
    assert!(
        !analyzed.diagnostics.iter().any(|d| d.severity == Severity::Error),
        "unexpected error diagnostics: {:?}",
        analyzed.diagnostics
    );

    let NodeKind::ClassDef { body: a_body, .. } = ast.kind(class_a).clone() else {
        panic!("class_a is not a ClassDef");
    };
    let field_node = a_body[0];
    let NodeKind::AnnAssign { target: a_target, .. } = ast.kind(field_node).clone() else {
        panic!("field is not an AnnAssign");
    };

    let a_class_id = analyzed
        .arena
        .classes
        .iter_enumerated()
        .find(|(_, data)| data.name == "A")
        .map(|(id, _)| id)
        .expect("class A should be registered");
    let a_data = analyzed.arena.classes.get(a_class_id).unwrap();
    let x_symbol_id = *a_data.fields.get("x").expect("A should declare field x");
    let x_symbol = analyzed.arena.symbols.get(x_symbol_id).unwrap();
    let declared = x_symbol.declarations.iter().find_map(|id| match analyzed.arena.declarations.get(*id) {
        Some(pipit_python_semantic::declaration::Declaration::Variable { node, declared_type: Some(ty), .. })
            if *node == a_target =>
        {
            Some(ty.clone())
        }
        _ => None,
    });
    let name = declared.as_ref().and_then(|ty| builtin_name(&analyzed.arena, ty));
    assert_eq!(name.as_deref(), Some("B"), "A.x should resolve to class B, got {declared:?}");
}

/// S6: `isinstance(x, int)` where `x: int` is always true and is flagged.
#[test]
fn s6_unnecessary_isinstance_is_reported() {
    let mut ast = AstArena::new();

    let param_ann = builder::name_expr(&mut ast, "int");
    let param = builder::simple_param("x", Some(param_ann));

    let check_subject = builder::name_expr(&mut ast, "x");
    let check_class = builder::name_expr(&mut ast, "int");
    let check = builder::isinstance_call(&mut ast, check_subject, vec![check_class]);
    let check_stmt = builder::expr_stmt(&mut ast, check);

    let h_def = builder::function_def(&mut ast, "h", vec![param], None, vec![check_stmt]);
    let module = builder::module(&mut ast, vec![h_def]);

    let path = camino::Utf8PathBuf::from("s6.py");
    let settings = DiagnosticSettings::default();
    let analyzed = analyze_file(&ast, &path, module, &settings);

    assert!(
        analyzed
            .diagnostics
            .iter()
            .any(|d| d.rule == Some(DiagnosticRule::ReportUnnecessaryIsInstance) && d.message.contains("is always instance")),
        "expected a reportUnnecessaryIsInstance diagnostic, got {:?}",
        analyzed.diagnostics
    );
}
