//! Lowers the checked, folded scope tree into the QASM IR: one `Program`
//! per region and one `Gate` per function.

use std::collections::BTreeMap;

use crate::errors::CompilerError;
use crate::payload::Payload;
use crate::qasm::{Argument, Comparison, Gate, Instruction, Program};
use crate::scope::{Ast, ScopeId};
use crate::state::State;
use crate::stdlib;
use crate::types;

pub struct Transpiler<'a> {
    ast: &'a Ast,
    state: &'a State,
}

#[derive(Debug)]
pub struct TranspileOutput {
    pub programs: BTreeMap<String, Program>,
    pub gates: BTreeMap<String, Gate>,
}

impl<'a> Transpiler<'a> {
    pub fn new(ast: &'a Ast, state: &'a State) -> Self {
        Self { ast, state }
    }

    pub fn transpile(&self) -> Result<TranspileOutput, CompilerError> {
        let mut gates = BTreeMap::new();
        for (name, info) in &self.state.functions {
            let instructions = self.lower_statement(info.block)?;
            gates.insert(
                name.clone(),
                Gate {
                    name: name.clone(),
                    cargs: info.classical_args.clone(),
                    qargs: info.quantum_args.clone(),
                    instructions,
                },
            );
        }

        let mut programs = BTreeMap::new();
        for (name, info) in &self.state.regions {
            let instructions = self.lower_statement(info.block)?;
            programs.insert(
                name.clone(),
                Program {
                    qubits: info.qubits,
                    instructions,
                    dependencies: info.dependencies.clone(),
                    needs_measurement_qubit: info.needs_measurement_qubit,
                },
            );
        }

        Ok(TranspileOutput { programs, gates })
    }

    fn lower_statement(&self, scope: ScopeId) -> Result<Vec<Instruction>, CompilerError> {
        let ast = self.ast;
        match ast.payload(scope) {
            Payload::Block => {
                let mut instructions = Vec::new();
                for &child in ast.children(scope) {
                    instructions.extend(self.lower_statement(child)?);
                }
                Ok(instructions)
            }
            Payload::FunctionCall => {
                let (name, _) = ast
                    .function_name(scope)
                    .expect("call scope missing name child");
                let args: Vec<ScopeId> = ast
                    .call_list_of(scope)
                    .map(|list| ast.children(list).to_vec())
                    .unwrap_or_default();
                let mut cargs = Vec::new();
                let mut qargs = Vec::new();
                for arg in args {
                    if self.is_classical_argument(arg) {
                        cargs.push(self.lower_classical_argument(arg));
                    } else {
                        qargs.push(self.lower_quantum_argument(arg));
                    }
                }
                let emitted = stdlib::standard_name(&name)
                    .map(str::to_string)
                    .unwrap_or(name);
                Ok(vec![Instruction::FunctionCall {
                    name: emitted,
                    cargs,
                    qargs,
                }])
            }
            Payload::If => {
                let children = ast.children(scope);
                let (cond, block) = match children[..] {
                    [cond, block] => (cond, block),
                    _ => return Ok(Vec::new()),
                };
                let op = match ast.payload(cond) {
                    Payload::BoolOp(op) => *op,
                    _ => return Ok(Vec::new()),
                };
                let operands = ast.children(cond);
                let (lhs, rhs) = match operands[..] {
                    [lhs, rhs] => (lhs, rhs),
                    _ => return Ok(Vec::new()),
                };
                let comparison = Comparison {
                    lhs: self.lower_classical_argument(lhs),
                    op,
                    rhs: self.lower_classical_argument(rhs),
                };
                let body = self.lower_statement(block)?;
                Ok(vec![Instruction::If { comparison, body }])
            }
            Payload::QuantumDeclaration => {
                let (_, name_scope, expr_scope) = ast
                    .declaration_parts(scope)
                    .expect("declaration scope missing children");
                let bits = ast.literal_bits(expr_scope);
                Ok(vec![Instruction::QuantumInitialization {
                    name: ast.vident_name(name_scope).unwrap_or_default(),
                    size: bits.len(),
                    bits,
                }])
            }
            Payload::ClassicalDeclaration => {
                let (_, name_scope, expr_scope) = ast
                    .declaration_parts(scope)
                    .expect("declaration scope missing children");
                let bits = ast.literal_bits(expr_scope);
                Ok(vec![Instruction::ClassicalInitialization {
                    name: ast.vident_name(name_scope).unwrap_or_default(),
                    size: bits.len(),
                    bits,
                }])
            }
            Payload::Measurement => Ok(vec![self.lower_measurement(scope)]),
            _ => unreachable!("statement cannot be lowered"),
        }
    }

    fn lower_measurement(&self, scope: ScopeId) -> Instruction {
        let ast = self.ast;
        let children = ast.children(scope);
        let (q_expr, r_scope, start_scope) = (children[0], children[1], children[2]);
        let r_name = ast.vident_name(r_scope).unwrap_or_default();
        let r_start = ast.uint_value(start_scope).unwrap_or(0);
        let (q_name, q_start, q_end) = match ast.payload(q_expr) {
            Payload::QuantumIndex => {
                let name = ast
                    .children(q_expr)
                    .first()
                    .and_then(|&c| ast.vident_name(c))
                    .unwrap_or_default();
                let pos = ast
                    .children(q_expr)
                    .get(1)
                    .and_then(|&c| ast.uint_value(c))
                    .unwrap_or(0);
                (name, pos, pos)
            }
            Payload::QuantumSlice => {
                let name = ast
                    .children(q_expr)
                    .first()
                    .and_then(|&c| ast.vident_name(c))
                    .unwrap_or_default();
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
                (name, start, end)
            }
            // A bare register name measures the whole register.
            _ => {
                let name = ast.vident_name(q_expr).unwrap_or_default();
                let size = ast.register_length(scope, &name).unwrap_or(1) as i64;
                (name, 0, size - 1)
            }
        };
        Instruction::Measurement {
            r_name,
            r_start,
            q_name,
            q_start,
            q_end,
        }
    }

    fn is_classical_argument(&self, arg: ScopeId) -> bool {
        match self.ast.payload(arg) {
            Payload::UInt(_) => true,
            Payload::VIdent { v_type, .. } => v_type
                .as_deref()
                .map(types::is_classical)
                .unwrap_or(false),
            _ => false,
        }
    }

    fn lower_classical_argument(&self, arg: ScopeId) -> Argument {
        match self.ast.payload(arg) {
            Payload::UInt(value) => Argument::UInt(*value),
            Payload::VIdent { name, .. } => Argument::CReg(name.clone()),
            _ => unreachable!("argument is not classical"),
        }
    }

    fn lower_quantum_argument(&self, arg: ScopeId) -> Argument {
        let ast = self.ast;
        match ast.payload(arg) {
            Payload::VIdent { name, .. } => Argument::QuantumReg(name.clone()),
            Payload::QuantumIndex => {
                let name = ast
                    .children(arg)
                    .first()
                    .and_then(|&c| ast.vident_name(c))
                    .unwrap_or_default();
                let index = ast
                    .children(arg)
                    .get(1)
                    .and_then(|&c| ast.uint_value(c))
                    .unwrap_or(0);
                Argument::QuantumIndex { name, index }
            }
            Payload::QuantumSlice => {
                let name = ast
                    .children(arg)
                    .first()
                    .and_then(|&c| ast.vident_name(c))
                    .unwrap_or_default();
                let start = ast
                    .children(arg)
                    .get(1)
                    .and_then(|&c| ast.uint_value(c))
                    .unwrap_or(0);
                let end = ast
                    .children(arg)
                    .get(2)
                    .and_then(|&c| ast.uint_value(c))
                    .unwrap_or(0);
                Argument::QuantumSlice { name, start, end }
            }
            _ => unreachable!("argument is not quantum"),
        }
    }
}
