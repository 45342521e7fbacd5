use funq::{check, compile};

fn code_of(source: &str) -> &'static str {
    compile(source).unwrap_err().code()
}

#[test]
fn unlexable_character_is_s0() {
    assert_eq!(code_of("region R<1> { Q[] q = ?; }"), "S0");
}

#[test]
fn unexpected_token_is_s0() {
    assert_eq!(code_of("region R<1> { Q[] q ^0^; }"), "S0");
    assert_eq!(code_of("fn broken"), "S0");
    assert_eq!(code_of("region R<1> { measure; }"), "S0");
}

#[test]
fn undefined_variable_is_v0() {
    assert_eq!(code_of("region R<1> { hadamard(q[0]); }"), "V0");
    assert_eq!(
        code_of("region R<1> { Q[] q = ^0^; measure q -> c[0]; }"),
        "V0"
    );
}

#[test]
fn unknown_type_is_t0() {
    assert_eq!(code_of("region R<1> { Widget w = 3; }"), "T0");
    assert_eq!(code_of("fn mix(Widget[] w, Q t) { hadamard(t); }"), "T0");
}

#[test]
fn declaration_in_function_is_f0() {
    assert_eq!(code_of("fn mix(Q t) { Q[] q = ^0^; }"), "F0");
    assert_eq!(
        code_of("fn mix(Q t) { C[] c = ^0^; }"),
        "F0"
    );
}

#[test]
fn measurement_in_function_is_f0() {
    assert_eq!(code_of("fn mix(Q t) { measure t -> t[0]; }"), "F0");
}

#[test]
fn recursion_is_f1() {
    assert_eq!(code_of("fn mix(Q t) { mix(t); }"), "F1");
}

#[test]
fn wrong_argument_count_is_f2() {
    assert_eq!(code_of("region R<2> { Q[] q = ^00^; cx(q[0]); }"), "F2");
    assert_eq!(
        code_of("region R<1> { Q[] q = ^0^; hadamard(q[0], q[0]); }"),
        "F2"
    );
}

#[test]
fn argument_type_mismatch_is_f3() {
    assert_eq!(code_of("region R<1> { Q[] q = ^0^; hadamard(7); }"), "F3");
    assert_eq!(
        code_of("region R<1> { Q[] q = ^0^; rx(q[0], q[0]); }"),
        "F3"
    );
}

#[test]
fn f3_message_names_the_parameter() {
    let err = compile("region R<1> { Q[] q = ^0^; hadamard(7); }").unwrap_err();
    let text = err.to_string();
    assert!(text.contains("argument 'arg' of function 'hadamard'"));
    assert!(text.contains("Expected type 'Q', got 'Const'"));
}

#[test]
fn duplicate_function_is_f5() {
    assert_eq!(
        code_of("fn mix(Q t) { hadamard(t); } fn mix(Q u) { not(u); }"),
        "F5"
    );
}

#[test]
fn register_parameter_is_f6() {
    assert_eq!(code_of("fn mix(Q[] q) { hadamard(q[0]); }"), "F6");
    assert_eq!(code_of("fn mix(C[] c, Q t) { hadamard(t); }"), "F6");
}

#[test]
fn no_quantum_argument_is_f7() {
    assert_eq!(code_of("fn mix(Const n) { rx(n, n); }"), "F7");
}

#[test]
fn unknown_callee_is_f8() {
    assert_eq!(code_of("region R<1> { Q[] q = ^0^; teleport(q[0]); }"), "F8");
}

#[test]
fn duplicate_region_is_r0() {
    assert_eq!(
        code_of("region R<1> { Q[] q = ^0^; } region R<1> { Q[] p = ^0^; }"),
        "R0"
    );
}

#[test]
fn region_colliding_with_function_is_r0() {
    assert_eq!(
        code_of("fn mix(Q t) { hadamard(t); } region mix<1> { Q[] q = ^0^; }"),
        "R0"
    );
}

#[test]
fn qubit_budget_exceeded_is_r1() {
    let err = compile("region R<2> { Q[] q = ^000^; }").unwrap_err();
    assert_eq!(err.code(), "R1");
    assert!(err.to_string().contains("'q'"));
    assert!(err.to_string().contains("'R'"));
}

#[test]
fn hidden_helper_qubit_makes_it_r1n() {
    let err = compile("region R<2> { C[] c = ^1^; Q[] q = ^00^; }").unwrap_err();
    assert_eq!(err.code(), "R1N");
    assert!(err.to_string().contains("non-zero classical"));
}

#[test]
fn duplicate_classical_variable_is_c0() {
    assert_eq!(code_of("region R<1> { C[] c = ^0^; C[] c = ^0^; }"), "C0");
}

#[test]
fn classical_slice_out_of_bounds_is_c3() {
    assert_eq!(
        code_of("region R<4> { Q[] q = ^000^; C[] c = ^00^; measure q[0:2] -> c[0]; }"),
        "C3"
    );
    assert_eq!(
        code_of("region R<2> { Q[] q = ^0^; C[] c = ^0^; measure q[0] -> c[1]; }"),
        "C3"
    );
}

#[test]
fn initializer_shape_mismatch_is_c5() {
    assert_eq!(code_of("region R<1> { Const n = ^1^; }"), "C5");
    assert_eq!(code_of("region R<1> { C[] c = 3; }"), "C5");
    assert_eq!(code_of("region R<1> { C[] c = 1 + 2; }"), "C5");
}

#[test]
fn scalar_quantum_declaration_is_q0() {
    assert_eq!(code_of("region R<1> { Q q = ^0^; }"), "Q0");
}

#[test]
fn duplicate_quantum_variable_is_q2() {
    assert_eq!(code_of("region R<2> { Q[] q = ^0^; Q[] q = ^0^; }"), "Q2");
}

#[test]
fn quantum_slice_out_of_bounds_is_q2() {
    assert_eq!(
        code_of("region R<3> { Q[] q = ^00^; C[] c = ^00^; measure q[1:2] -> c[0]; }"),
        "Q2"
    );
}

#[test]
fn quantum_index_out_of_bounds_is_q3() {
    assert_eq!(
        code_of("region R<3> { Q[] q = ^00^; C[] c = ^00^; measure q[5] -> c[0]; }"),
        "Q3"
    );
}

#[test]
fn measuring_a_nonquantum_source_is_q4() {
    assert_eq!(
        code_of("region R<1> { Const n = 1; C[] c = ^0^; measure n -> c[0]; }"),
        "Q4"
    );
}

#[test]
fn repeated_measurement_is_q5() {
    assert_eq!(
        code_of(
            "region R<3> { Q[] q = ^00^; C[] c = ^00^; \
             measure q -> c[0]; measure q -> c[0]; }"
        ),
        "Q5"
    );
}

#[test]
fn use_after_measurement_is_q6() {
    assert_eq!(
        code_of(
            "region R<3> { Q[] q = ^00^; C[] c = ^00^; \
             measure q -> c[0]; hadamard(q[0]); }"
        ),
        "Q6"
    );
}

#[test]
fn measuring_into_a_nonregister_is_c2() {
    assert_eq!(
        code_of("region R<1> { Q[] q = ^0^; Const n = 1; measure q -> n[0]; }"),
        "C2"
    );
}

#[test]
fn constant_division_by_zero_is_e0() {
    assert_eq!(
        code_of("region R<1> { Const n = 1 / 0; Q[] q = ^0^; rx(n, q[0]); }"),
        "E0"
    );
}

#[test]
fn errors_carry_positions() {
    let err = compile("region R<1> {\n  Q[] q = ^00^;\n}").unwrap_err();
    assert_eq!(err.code(), "R1");
    assert_eq!(err.line, 2);
    assert_eq!(err.column, 3);
}

#[test]
fn error_display_is_framed() {
    let err = compile("region R<2> { Q[] q = ^000^; }").unwrap_err();
    let text = err.to_string();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[1].starts_with('-'));
    assert!(lines[2].starts_with("Error at line 1"));
    assert!(lines[2].ends_with('|'));
    assert_eq!(lines[1], lines[4]);
}

#[test]
fn check_accumulates_multiple_errors() {
    let errors = check(
        "region R<2> { Q[] q = ^00^; hadamard(3); cx(q[0]); }",
    )
    .unwrap_err();
    let codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
    assert_eq!(codes, vec!["F3", "F2"]);
}

#[test]
fn check_passes_a_valid_program() {
    check("region R<1> { Q[] q = ^0^; hadamard(q[0]); }").unwrap();
}
