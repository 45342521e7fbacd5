//! Compile-time evaluation of classical constants. Inside regions, `Const`
//! declarations are evaluated and removed, uses of `Const` variables become
//! integer literals, and arithmetic on literals folds. Function bodies are
//! left alone: their classical parameters stay symbolic until the gate is
//! applied.

use crate::errors::{CompilerError, ErrorKind};
use crate::payload::{BinaryOp, Payload};
use crate::scope::{Ast, ScopeId};
use crate::types;
use crate::visitor::{walk_transform, Transformer};

pub struct ComputationHandler {
    in_region: bool,
}

impl ComputationHandler {
    pub fn new() -> Self {
        Self { in_region: false }
    }

    /// The name child of a declaration must survive folding so the
    /// declaration can still be evaluated and bound once its children have
    /// been processed.
    fn is_declaration_name(&self, ast: &Ast, scope: ScopeId) -> bool {
        let parent = match ast.arena.scope(scope).parent {
            Some(parent) => parent,
            None => return false,
        };
        matches!(
            ast.payload(parent),
            Payload::ClassicalDeclaration | Payload::QuantumDeclaration
        ) && ast.children(parent).get(1) == Some(&scope)
    }

    fn replace_with_uint(
        &self,
        ast: &mut Ast,
        scope: ScopeId,
        value: i64,
    ) -> Result<Option<ScopeId>, CompilerError> {
        let (line, column) = ast.position(scope);
        let replacement = ast.arena.alloc(line, column, Payload::UInt(value), None);
        Ok(Some(replacement))
    }
}

impl Transformer for ComputationHandler {
    fn enter(&mut self, ast: &mut Ast, scope: ScopeId) -> Result<(), CompilerError> {
        match ast.payload(scope) {
            Payload::Region => self.in_region = true,
            Payload::Function => self.in_region = false,
            _ => {}
        }
        Ok(())
    }

    fn transform(
        &mut self,
        ast: &mut Ast,
        scope: ScopeId,
    ) -> Result<Option<ScopeId>, CompilerError> {
        if let Payload::Region = ast.payload(scope) {
            self.in_region = false;
            return Ok(Some(scope));
        }
        if !self.in_region {
            return Ok(Some(scope));
        }

        match ast.payload(scope).clone() {
            Payload::ClassicalDeclaration => {
                let (type_scope, name_scope, expr_scope) = match ast.declaration_parts(scope) {
                    Some(parts) => parts,
                    None => return Ok(Some(scope)),
                };
                if ast.type_name(type_scope).as_deref() != Some(types::TYPE_CONST) {
                    return Ok(Some(scope));
                }
                let name = ast.vident_name(name_scope).unwrap_or_default();
                let value = evaluate(ast, expr_scope)?;
                ast.set_constant(scope, &name, value);
                Ok(None)
            }
            Payload::VIdent { name, v_type } => {
                if v_type.as_deref() != Some(types::TYPE_CONST)
                    || self.is_declaration_name(ast, scope)
                {
                    return Ok(Some(scope));
                }
                let value = match ast.constant_for(scope, &name) {
                    Some(value) => value,
                    None => {
                        let (line, column) = ast.position(scope);
                        return Err(CompilerError::new(
                            ErrorKind::ConstantEvaluation,
                            line,
                            column,
                        ));
                    }
                };
                self.replace_with_uint(ast, scope, value)
            }
            Payload::Op(_) => {
                let value = evaluate(ast, scope)?;
                self.replace_with_uint(ast, scope, value)
            }
            _ => Ok(Some(scope)),
        }
    }
}

impl Default for ComputationHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursive evaluator over constant expressions. Division is floor
/// division; anything that is not a literal, a bound constant, or an
/// operator node cannot be evaluated.
fn evaluate(ast: &Ast, scope: ScopeId) -> Result<i64, CompilerError> {
    let (line, column) = ast.position(scope);
    let fail = || CompilerError::new(ErrorKind::ConstantEvaluation, line, column);
    match ast.payload(scope).clone() {
        Payload::UInt(value) => Ok(value),
        Payload::VIdent { name, .. } => ast.constant_for(scope, &name).ok_or_else(fail),
        Payload::Op(op) => {
            let children = ast.children(scope).to_vec();
            let (lhs, rhs) = match children[..] {
                [a, b] => (evaluate(ast, a)?, evaluate(ast, b)?),
                _ => return Err(fail()),
            };
            match op {
                BinaryOp::Add => Ok(lhs + rhs),
                BinaryOp::Sub => Ok(lhs - rhs),
                BinaryOp::Mul => Ok(lhs * rhs),
                BinaryOp::Div => {
                    if rhs == 0 {
                        Err(fail())
                    } else {
                        Ok(lhs.div_euclid(rhs))
                    }
                }
            }
        }
        _ => Err(fail()),
    }
}

/// Fold all constant expressions in place.
pub fn fold(ast: &mut Ast) -> Result<(), CompilerError> {
    let root = ast.root;
    walk_transform(&mut ComputationHandler::new(), ast, root)?;
    Ok(())
}
