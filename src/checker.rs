//! Semantic validation. The checker walks the resolved tree and collects
//! every violation as a coded error; the driver decides whether to stop at
//! the first one. Per-region state (qubit budget, measured variables)
//! resets on region entry.

use crate::errors::{CompilerError, ErrorKind};
use crate::payload::Payload;
use crate::scope::{Ast, ScopeId};
use crate::state::State;
use crate::types;
use crate::visitor::{walk, Visitor};

pub struct ErrorChecker<'a> {
    state: &'a State,
    errors: Vec<CompilerError>,
    // Qubit accounting for the region currently being visited. The counter
    // starts at one when the region needs the synthesized measurement
    // qubit, since that allocation is invisible in the source.
    qubit_counter: i64,
    qubit_max: i64,
    current_region: String,
    region_needs_helper: bool,
    in_region: bool,
    current_function: String,
    measured_variables: Vec<String>,
}

impl<'a> ErrorChecker<'a> {
    pub fn new(state: &'a State) -> Self {
        Self {
            state,
            errors: Vec::new(),
            qubit_counter: 0,
            qubit_max: 0,
            current_region: String::new(),
            region_needs_helper: false,
            in_region: false,
            current_function: String::new(),
            measured_variables: Vec::new(),
        }
    }

    fn err(&self, ast: &Ast, kind: ErrorKind, at: ScopeId) -> CompilerError {
        let (line, column) = ast.position(at);
        CompilerError::new(kind, line, column)
    }

    fn enter_region(&mut self, ast: &mut Ast, scope: ScopeId) -> Result<(), CompilerError> {
        let (name, _) = ast
            .region_name(scope)
            .expect("region scope missing name child");
        self.in_region = true;
        self.current_region = name.clone();
        self.measured_variables.clear();
        if let Some(info) = self.state.regions.get(&name) {
            self.region_needs_helper = info.needs_measurement_qubit;
            self.qubit_counter = if info.needs_measurement_qubit { 1 } else { 0 };
            self.qubit_max = info.qubits;
        }
        Ok(())
    }

    fn enter_function(&mut self, ast: &mut Ast, scope: ScopeId) -> Result<(), CompilerError> {
        let (name, _) = ast
            .function_name(scope)
            .expect("function scope missing name child");
        self.current_function = name.clone();

        let arg_list = match ast.arg_list_of(scope) {
            Some(arg_list) => arg_list,
            None => return Err(self.err(ast, ErrorKind::NoQuantumArgument(name), scope)),
        };
        let mut has_quantum = false;
        for &arg in ast.children(arg_list) {
            let children = ast.children(arg);
            let type_scope = match children.first() {
                Some(&type_scope) => type_scope,
                None => continue,
            };
            let typename = ast.type_name(type_scope).unwrap_or_default();
            if types::is_register(&typename) {
                return Err(self.err(ast, ErrorKind::RegisterFunctionParameter, type_scope));
            }
            if types::is_quantum(&typename) {
                has_quantum = true;
            }
        }
        if !has_quantum {
            return Err(self.err(ast, ErrorKind::NoQuantumArgument(name), arg_list));
        }
        Ok(())
    }

    fn check_quantum_declaration(
        &mut self,
        ast: &mut Ast,
        scope: ScopeId,
    ) -> Result<(), CompilerError> {
        if !self.in_region {
            return Err(self.err(ast, ErrorKind::DeclarationOutsideRegion, scope));
        }
        let (type_scope, name_scope, expr_scope) = match ast.declaration_parts(scope) {
            Some(parts) => parts,
            None => return Ok(()),
        };
        let typename = ast.type_name(type_scope).unwrap_or_default();
        if !types::is_quantum(&typename) || !types::is_register(&typename) {
            return Err(self.err(ast, ErrorKind::NonRegisterQuantumDeclaration, type_scope));
        }
        self.qubit_counter += ast.literal_bits(expr_scope).len() as i64;
        if self.qubit_counter > self.qubit_max {
            let variable = ast.vident_name(name_scope).unwrap_or_default();
            let region = self.current_region.clone();
            let kind = if self.region_needs_helper {
                ErrorKind::QubitBudgetExceededWithHelper { variable, region }
            } else {
                ErrorKind::QubitBudgetExceeded { variable, region }
            };
            return Err(self.err(ast, kind, scope));
        }
        Ok(())
    }

    fn check_classical_declaration(
        &mut self,
        ast: &mut Ast,
        scope: ScopeId,
    ) -> Result<(), CompilerError> {
        if !self.in_region {
            return Err(self.err(ast, ErrorKind::DeclarationOutsideRegion, scope));
        }
        let (type_scope, _, expr_scope) = match ast.declaration_parts(scope) {
            Some(parts) => parts,
            None => return Ok(()),
        };
        let typename = ast.type_name(type_scope).unwrap_or_default();
        if types::is_quantum(&typename) {
            return Err(self.err(ast, ErrorKind::QuantumTypeInClassicalDeclaration, type_scope));
        }
        // `C[]` takes a bit literal; `Const` takes a numeric expression.
        let is_literal = matches!(ast.payload(expr_scope), Payload::ClassicalLiteral);
        if is_literal != types::is_register(&typename) {
            return Err(self.err(ast, ErrorKind::InitializerTypeMismatch, expr_scope));
        }
        Ok(())
    }

    fn measured_name(&self, ast: &Ast, q_expr: ScopeId) -> String {
        match ast.payload(q_expr) {
            Payload::VIdent { name, .. } => name.clone(),
            Payload::QuantumIndex | Payload::QuantumSlice => ast
                .children(q_expr)
                .first()
                .and_then(|&child| ast.vident_name(child))
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    fn check_measurement(&mut self, ast: &mut Ast, scope: ScopeId) -> Result<(), CompilerError> {
        if !self.in_region {
            return Err(self.err(ast, ErrorKind::DeclarationOutsideRegion, scope));
        }
        let (q_expr, r_scope, start_scope) = match ast.children(scope)[..] {
            [a, b, c] => (a, b, c),
            _ => return Ok(()),
        };
        let q_name = self.measured_name(ast, q_expr);
        if self.measured_variables.contains(&q_name) {
            return Err(self.err(ast, ErrorKind::RepeatedMeasurement, scope));
        }

        let q_entry = ast
            .type_for(scope, &q_name)
            .ok_or_else(|| self.err(ast, ErrorKind::MeasurementSourceNotQuantum(q_name.clone()), scope))?;
        if !types::is_quantum(&q_entry.typename) || !types::is_register(&q_entry.typename) {
            return Err(self.err(
                ast,
                ErrorKind::MeasurementSourceNotQuantum(q_name.clone()),
                scope,
            ));
        }
        let q_size = ast.register_length(scope, &q_name).ok_or_else(|| {
            self.err(ast, ErrorKind::MeasurementSourceNotQuantum(q_name.clone()), scope)
        })? as i64;

        let is_slice = matches!(ast.payload(q_expr), Payload::QuantumSlice);
        let (q_start, q_end) = match ast.payload(q_expr) {
            Payload::QuantumIndex => {
                let pos = ast
                    .children(q_expr)
                    .get(1)
                    .and_then(|&c| ast.uint_value(c))
                    .unwrap_or(0);
                (pos, pos)
            }
            Payload::QuantumSlice => {
                let start = ast
                    .children(q_expr)
                    .get(1)
                    .and_then(|&c| ast.uint_value(c))
                    .unwrap_or(0);
                let end = ast
                    .children(q_expr)
                    .get(2)
                    .and_then(|&c| ast.uint_value(c))
                    .unwrap_or(0);
                (start, end)
            }
            _ => (0, q_size - 1),
        };
        let slice_range = q_end - q_start;
        if q_end >= q_size || q_start > q_end {
            let kind = if is_slice {
                ErrorKind::QuantumSliceOutOfBounds(q_start, q_end)
            } else {
                ErrorKind::QuantumIndexOutOfBounds(q_start)
            };
            return Err(self.err(ast, kind, scope));
        }

        let r_name = ast.vident_name(r_scope).unwrap_or_default();
        let r_entry = ast
            .type_for(scope, &r_name)
            .ok_or_else(|| self.err(ast, ErrorKind::MeasurementTargetNotRegister(r_name.clone()), scope))?;
        if r_entry.typename != types::TYPE_CREG {
            return Err(self.err(
                ast,
                ErrorKind::MeasurementTargetNotRegister(r_name.clone()),
                scope,
            ));
        }
        let c_size = ast.register_length(scope, &r_name).ok_or_else(|| {
            self.err(ast, ErrorKind::MeasurementTargetNotRegister(r_name.clone()), scope)
        })? as i64;
        let r_start = ast.uint_value(start_scope).unwrap_or(0);
        // Reject as soon as any written index would fall outside the target.
        if r_start + slice_range >= c_size {
            return Err(self.err(
                ast,
                ErrorKind::ClassicalSliceOutOfBounds(r_start, r_start + slice_range),
                scope,
            ));
        }
        Ok(())
    }

    fn check_function_call(&mut self, ast: &mut Ast, scope: ScopeId) -> Result<(), CompilerError> {
        let (name, _) = ast
            .function_name(scope)
            .expect("call scope missing name child");
        if !self.in_region && name == self.current_function {
            return Err(self.err(ast, ErrorKind::RecursionNotAllowed, scope));
        }
        let signature = self
            .state
            .arguments_for(&name)
            .ok_or_else(|| self.err(ast, ErrorKind::UnknownFunction(name.clone()), scope))?;
        let call_args: Vec<ScopeId> = ast
            .call_list_of(scope)
            .map(|list| ast.children(list).to_vec())
            .unwrap_or_default();
        if call_args.len() != signature.len() {
            return Err(self.err(ast, ErrorKind::WrongArgumentCount, scope));
        }
        for (i, &arg) in call_args.iter().enumerate() {
            let actual = argument_type_name(ast, arg);
            let (param, expected) = &signature[i];
            if expected != &actual {
                return Err(self.err(
                    ast,
                    ErrorKind::ArgumentTypeMismatch {
                        param: param.clone(),
                        function: name.clone(),
                        expected: expected.clone(),
                        actual,
                    },
                    arg,
                ));
            }
        }
        Ok(())
    }

    fn check_v_ident(&mut self, ast: &Ast, scope: ScopeId, name: &str) -> Result<(), CompilerError> {
        if self.measured_variables.iter().any(|m| m == name) {
            return Err(self.err(ast, ErrorKind::UseAfterMeasurement, scope));
        }
        Ok(())
    }
}

/// Typename a call argument presents for signature matching. Operator
/// expressions type as `Const`; the checker runs before folding replaces
/// them with literal values.
fn argument_type_name(ast: &Ast, arg: ScopeId) -> String {
    match ast.payload(arg) {
        Payload::UInt(_) => types::TYPE_CONST.to_string(),
        Payload::Op(_) => types::TYPE_CONST.to_string(),
        Payload::VIdent { v_type, .. } => v_type.clone().unwrap_or_default(),
        Payload::QuantumIndex | Payload::QuantumSlice => types::TYPE_QUBIT.to_string(),
        _ => String::new(),
    }
}

impl Visitor for ErrorChecker<'_> {
    fn visit(&mut self, ast: &mut Ast, scope: ScopeId) -> Result<(), CompilerError> {
        let result = match ast.payload(scope).clone() {
            Payload::Region => self.enter_region(ast, scope),
            Payload::Function => self.enter_function(ast, scope),
            Payload::QuantumDeclaration => self.check_quantum_declaration(ast, scope),
            Payload::ClassicalDeclaration => self.check_classical_declaration(ast, scope),
            Payload::Measurement => self.check_measurement(ast, scope),
            Payload::FunctionCall => self.check_function_call(ast, scope),
            Payload::VIdent { name, .. } => self.check_v_ident(ast, scope, &name),
            _ => Ok(()),
        };
        if let Err(error) = result {
            self.errors.push(error);
        }
        Ok(())
    }

    fn after_visit(&mut self, ast: &mut Ast, scope: ScopeId) -> Result<(), CompilerError> {
        match ast.payload(scope) {
            Payload::Region => {
                self.in_region = false;
                self.measured_variables.clear();
            }
            Payload::Function => {
                self.current_function.clear();
            }
            Payload::Measurement => {
                let q_expr = match ast.children(scope).first() {
                    Some(&q_expr) => q_expr,
                    None => return Ok(()),
                };
                let name = self.measured_name(ast, q_expr);
                if !name.is_empty() && !self.measured_variables.contains(&name) {
                    self.measured_variables.push(name);
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Run the checker over the whole tree, accumulating diagnostics.
pub fn check(ast: &mut Ast, state: &State) -> Result<(), Vec<CompilerError>> {
    let root = ast.root;
    let mut checker = ErrorChecker::new(state);
    let walk_result = walk(&mut checker, ast, root);
    let mut errors = checker.errors;
    if let Err(error) = walk_result {
        errors.push(error);
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast_builder::AstBuilder;
    use crate::lexer::tokenize;
    use crate::parser::Parser;
    use crate::resolver::resolve;

    fn check_source(source: &str) -> Result<(), Vec<CompilerError>> {
        let tree = Parser::new(tokenize(source).unwrap())
            .parse_program()
            .unwrap();
        let mut ast = AstBuilder::new().build(&tree).unwrap();
        resolve(&mut ast).map_err(|e| vec![e])?;
        let state = State::from_ast(&ast);
        check(&mut ast, &state)
    }

    fn first_code(source: &str) -> &'static str {
        check_source(source).unwrap_err()[0].code()
    }

    #[test]
    fn accepts_a_valid_program() {
        check_source(
            "fn rotate(Const theta, Q t) { rx(theta, t); } \
             region R<2> { Q[] q = ^00^; rotate(1, q[0]); }",
        )
        .unwrap();
    }

    #[test]
    fn qubit_budget_is_enforced() {
        assert_eq!(first_code("region R<2> { Q[] q = ^000^; }"), "R1");
    }

    #[test]
    fn helper_qubit_counts_toward_the_budget() {
        assert_eq!(
            first_code("region R<2> { C[] c = ^1^; Q[] q = ^00^; }"),
            "R1N"
        );
    }

    #[test]
    fn budget_without_helper_is_exact() {
        check_source("region R<2> { C[] c = ^0^; Q[] q = ^00^; }").unwrap();
    }

    #[test]
    fn repeated_measurement_is_q5_then_q6() {
        let errors = check_source(
            "region R<3> { Q[] q = ^00^; C[] c = ^00^; \
             measure q -> c[0]; measure q -> c[0]; }",
        )
        .unwrap_err();
        assert_eq!(errors[0].code(), "Q5");
        assert!(errors.iter().any(|e| e.code() == "Q6"));
    }

    #[test]
    fn use_after_measurement_is_q6() {
        let errors = check_source(
            "region R<3> { Q[] q = ^00^; C[] c = ^00^; \
             measure q -> c[0]; hadamard(q[0]); }",
        )
        .unwrap_err();
        assert_eq!(errors[0].code(), "Q6");
    }

    #[test]
    fn quantum_index_out_of_bounds_is_q3() {
        assert_eq!(
            first_code("region R<3> { Q[] q = ^00^; C[] c = ^00^; measure q[2] -> c[0]; }"),
            "Q3"
        );
    }

    #[test]
    fn quantum_slice_out_of_bounds_is_q2() {
        assert_eq!(
            first_code("region R<3> { Q[] q = ^00^; C[] c = ^00^; measure q[0:2] -> c[0]; }"),
            "Q2"
        );
    }

    #[test]
    fn classical_slice_out_of_bounds_is_c3() {
        assert_eq!(
            first_code("region R<4> { Q[] q = ^000^; C[] c = ^00^; measure q[0:2] -> c[0]; }"),
            "C3"
        );
    }

    #[test]
    fn classical_destination_offset_is_checked() {
        assert_eq!(
            first_code("region R<3> { Q[] q = ^00^; C[] c = ^00^; measure q[0:1] -> c[1]; }"),
            "C3"
        );
        check_source("region R<3> { Q[] q = ^00^; C[] c = ^00^; measure q[0:1] -> c[0]; }")
            .unwrap();
    }

    #[test]
    fn declarations_outside_regions_are_f0() {
        assert_eq!(first_code("fn mix(Q t) { Q[] q = ^0^; }"), "F0");
        assert_eq!(first_code("fn mix(Q t) { C[] c = ^0^; }"), "F0");
    }

    #[test]
    fn recursion_is_f1() {
        assert_eq!(first_code("fn mix(Q t) { mix(t); }"), "F1");
    }

    #[test]
    fn wrong_arity_is_f2() {
        assert_eq!(first_code("region R<1> { Q[] q = ^0^; cx(q[0]); }"), "F2");
    }

    #[test]
    fn argument_type_mismatch_is_f3() {
        assert_eq!(
            first_code("region R<1> { Q[] q = ^0^; hadamard(3); }"),
            "F3"
        );
        assert_eq!(
            first_code("region R<1> { Q[] q = ^0^; rx(q[0], q[0]); }"),
            "F3"
        );
        // A whole register does not fit a scalar qubit parameter.
        assert_eq!(
            first_code("region R<1> { Q[] q = ^0^; hadamard(q); }"),
            "F3"
        );
    }

    #[test]
    fn register_parameter_is_f6() {
        assert_eq!(first_code("fn mix(Q[] q) { hadamard(q[0]); }"), "F6");
        assert_eq!(first_code("fn mix(C[] c, Q t) { hadamard(t); }"), "F6");
    }

    #[test]
    fn purely_classical_function_is_f7() {
        assert_eq!(first_code("fn mix(Const n) { rx(n, n); }"), "F7");
    }

    #[test]
    fn unknown_callee_is_f8() {
        assert_eq!(first_code("region R<1> { Q[] q = ^0^; teleport(q[0]); }"), "F8");
    }

    #[test]
    fn non_register_quantum_declaration_is_q0() {
        assert_eq!(first_code("region R<1> { Q q = ^0^; }"), "Q0");
    }

    #[test]
    fn quantum_type_in_classical_declaration_is_c4() {
        // Not reachable from source text (the parser routes quantum
        // typenames to quantum declarations), so patch the type in place.
        let tree = Parser::new(tokenize("region R<1> { C[] c = ^0^; }").unwrap())
            .parse_program()
            .unwrap();
        let mut ast = AstBuilder::new().build(&tree).unwrap();
        resolve(&mut ast).unwrap();
        let region = ast.children(ast.root)[0];
        let block = ast.block_of(region).unwrap();
        let decl = ast.children(block)[0];
        let (type_scope, _, _) = ast.declaration_parts(decl).unwrap();
        ast.arena.scope_mut(type_scope).payload = crate::payload::Payload::Type("Q[]".into());
        let state = State::from_ast(&ast);
        let errors = check(&mut ast, &state).unwrap_err();
        assert_eq!(errors[0].code(), "C4");
    }

    #[test]
    fn initializer_shape_must_match_type() {
        assert_eq!(first_code("region R<1> { Const n = ^1^; }"), "C5");
        assert_eq!(first_code("region R<1> { C[] c = 3; }"), "C5");
    }

    #[test]
    fn measuring_a_constant_is_q4() {
        assert_eq!(
            first_code("region R<1> { Const n = 1; C[] c = ^0^; measure n -> c[0]; }"),
            "Q4"
        );
    }

    #[test]
    fn measuring_into_a_constant_is_c2() {
        assert_eq!(
            first_code("region R<1> { Q[] q = ^0^; Const n = 1; measure q -> n[0]; }"),
            "C2"
        );
    }
}
