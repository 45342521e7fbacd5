//! Depth-first traversal over the scope tree. `Visitor` gets pre- and
//! post-order hooks; `Transformer` runs post-order and may replace a node
//! or delete it by returning `None`, shrinking the parent's child list.

use crate::errors::CompilerError;
use crate::scope::{Ast, ScopeId};

pub trait Visitor {
    fn visit(&mut self, ast: &mut Ast, scope: ScopeId) -> Result<(), CompilerError> {
        let _ = (ast, scope);
        Ok(())
    }

    fn after_visit(&mut self, ast: &mut Ast, scope: ScopeId) -> Result<(), CompilerError> {
        let _ = (ast, scope);
        Ok(())
    }
}

pub fn walk<V: Visitor>(
    visitor: &mut V,
    ast: &mut Ast,
    scope: ScopeId,
) -> Result<(), CompilerError> {
    visitor.visit(ast, scope)?;
    let children = ast.arena.scope(scope).children.clone();
    for child in children {
        walk(visitor, ast, child)?;
    }
    visitor.after_visit(ast, scope)
}

pub trait Transformer {
    fn enter(&mut self, ast: &mut Ast, scope: ScopeId) -> Result<(), CompilerError> {
        let _ = (ast, scope);
        Ok(())
    }

    /// Return the same id to keep the node, a fresh id to replace it, or
    /// `None` to remove it from the parent's child list.
    fn transform(
        &mut self,
        ast: &mut Ast,
        scope: ScopeId,
    ) -> Result<Option<ScopeId>, CompilerError>;
}

pub fn walk_transform<T: Transformer>(
    transformer: &mut T,
    ast: &mut Ast,
    scope: ScopeId,
) -> Result<Option<ScopeId>, CompilerError> {
    transformer.enter(ast, scope)?;
    let children = ast.arena.scope(scope).children.clone();
    let mut kept = Vec::with_capacity(children.len());
    for child in children {
        if let Some(replacement) = walk_transform(transformer, ast, child)? {
            if replacement != child {
                ast.arena.scope_mut(replacement).parent = Some(scope);
            }
            kept.push(replacement);
        }
    }
    ast.arena.scope_mut(scope).children = kept;
    transformer.transform(ast, scope)
}
