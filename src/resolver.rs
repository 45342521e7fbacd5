//! Name resolution: registers functions and regions in the global tables,
//! records declarations in their enclosing scope's identifier map,
//! annotates variable uses with their declared type, and notes which
//! regions will need the synthesized measurement qubit.

use crate::errors::{CompilerError, ErrorKind};
use crate::payload::Payload;
use crate::scope::{Ast, ScopeId};
use crate::types;
use crate::visitor::{walk, Visitor};

pub struct Resolver {
    current_region: String,
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            current_region: String::new(),
        }
    }

    fn visit_function(&mut self, ast: &mut Ast, scope: ScopeId) -> Result<(), CompilerError> {
        if let Some(arg_list) = ast.arg_list_of(scope) {
            for arg in ast.children(arg_list).to_vec() {
                let children = ast.children(arg).to_vec();
                if let [type_scope, name_scope] = children[..] {
                    ast.register_variable(scope, name_scope, type_scope, arg)?;
                }
            }
        }
        let (name, _) = ast
            .function_name(scope)
            .expect("function scope missing name child");
        ast.add_function(&name, scope)
    }

    fn visit_region(&mut self, ast: &mut Ast, scope: ScopeId) -> Result<(), CompilerError> {
        let (name, _) = ast
            .region_name(scope)
            .expect("region scope missing name child");
        self.current_region = name.clone();
        ast.add_region(&name, scope)
    }

    fn visit_classical_declaration(
        &mut self,
        ast: &mut Ast,
        scope: ScopeId,
    ) -> Result<(), CompilerError> {
        let (type_scope, name_scope, expr_scope) = ast
            .declaration_parts(scope)
            .expect("declaration scope missing children");
        let parent = ast
            .arena
            .scope(scope)
            .parent
            .expect("declaration without enclosing scope");
        ast.register_variable(parent, name_scope, type_scope, scope)?;

        // A classical register initialized to a non-zero pattern needs the
        // helper qubit to set its bits.
        let typename = ast.type_name(type_scope).unwrap_or_default();
        if types::is_register(&typename)
            && matches!(ast.payload(expr_scope), Payload::ClassicalLiteral)
            && ast.literal_bits(expr_scope).iter().any(|&bit| bit)
        {
            let region = self.current_region.clone();
            ast.region_needs_measurement_qubit(&region);
        }
        Ok(())
    }

    fn visit_quantum_declaration(
        &mut self,
        ast: &mut Ast,
        scope: ScopeId,
    ) -> Result<(), CompilerError> {
        let (type_scope, name_scope, _) = ast
            .declaration_parts(scope)
            .expect("declaration scope missing children");
        let parent = ast
            .arena
            .scope(scope)
            .parent
            .expect("declaration without enclosing scope");
        ast.register_variable(parent, name_scope, type_scope, scope)
    }

    fn visit_v_ident(&mut self, ast: &mut Ast, scope: ScopeId) -> Result<(), CompilerError> {
        let name = ast.vident_name(scope).unwrap_or_default();
        match ast.type_for(scope, &name) {
            Some(entry) => {
                ast.arena.scope_mut(scope).payload = Payload::VIdent {
                    name,
                    v_type: Some(entry.typename),
                };
                Ok(())
            }
            None => {
                let (line, column) = ast.position(scope);
                Err(CompilerError::new(
                    ErrorKind::UndefinedVariable(name),
                    line,
                    column,
                ))
            }
        }
    }
}

impl Visitor for Resolver {
    fn visit(&mut self, ast: &mut Ast, scope: ScopeId) -> Result<(), CompilerError> {
        match ast.payload(scope) {
            Payload::Function => self.visit_function(ast, scope),
            Payload::Region => self.visit_region(ast, scope),
            Payload::ClassicalDeclaration => self.visit_classical_declaration(ast, scope),
            Payload::QuantumDeclaration => self.visit_quantum_declaration(ast, scope),
            Payload::VIdent { .. } => self.visit_v_ident(ast, scope),
            _ => Ok(()),
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

pub fn resolve(ast: &mut Ast) -> Result<(), CompilerError> {
    let root = ast.root;
    walk(&mut Resolver::new(), ast, root)
}
