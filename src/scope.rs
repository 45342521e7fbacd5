//! The scope tree. Scopes live in an arena and reference each other through
//! indices, so parent links need no reference cycles; the arena length
//! doubles as the monotonic scope-ID counter for one compilation.

use std::collections::{BTreeMap, HashMap};

use crate::errors::{CompilerError, ErrorKind};
use crate::payload::Payload;
use crate::types;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub usize);

/// A variable recorded in a scope's identifier map: its declared typename
/// and the scope that declared it (a declaration node or a function
/// argument node).
#[derive(Debug, Clone, PartialEq)]
pub struct VariableEntry {
    pub typename: String,
    pub declaration: ScopeId,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub line: usize,
    pub column: usize,
    pub payload: Payload,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    /// Variables declared directly in this scope.
    pub variables: HashMap<String, VariableEntry>,
    /// Compile-time values of `Const` variables declared in this scope.
    pub constants: HashMap<String, i64>,
}

#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    pub fn alloc(
        &mut self,
        line: usize,
        column: usize,
        payload: Payload,
        parent: Option<ScopeId>,
    ) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            id,
            line,
            column,
            payload,
            parent,
            children: Vec::new(),
            variables: HashMap::new(),
            constants: HashMap::new(),
        });
        if let Some(parent) = parent {
            self.scopes[parent.0].children.push(id);
        }
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

/// A registered region and whether initializing its classical registers
/// requires the synthesized measurement qubit.
#[derive(Debug, Clone)]
pub struct RegionEntry {
    pub scope: ScopeId,
    pub needs_measurement_qubit: bool,
}

/// The abstract syntax tree: the scope arena plus the global function and
/// region tables. Map types are ordered so that every downstream stage
/// iterates deterministically.
#[derive(Debug)]
pub struct Ast {
    pub arena: ScopeArena,
    pub root: ScopeId,
    pub functions: BTreeMap<String, ScopeId>,
    pub regions: BTreeMap<String, RegionEntry>,
}

impl Ast {
    pub fn new() -> Self {
        let mut arena = ScopeArena::new();
        let root = arena.alloc(1, 1, Payload::Root, None);
        Self {
            arena,
            root,
            functions: BTreeMap::new(),
            regions: BTreeMap::new(),
        }
    }

    pub fn payload(&self, id: ScopeId) -> &Payload {
        &self.arena.scope(id).payload
    }

    pub fn children(&self, id: ScopeId) -> &[ScopeId] {
        &self.arena.scope(id).children
    }

    pub fn position(&self, id: ScopeId) -> (usize, usize) {
        let scope = self.arena.scope(id);
        (scope.line, scope.column)
    }

    fn err(&self, kind: ErrorKind, at: ScopeId) -> CompilerError {
        let (line, column) = self.position(at);
        CompilerError::new(kind, line, column)
    }

    // ---- global tables ----

    pub fn add_function(&mut self, name: &str, scope: ScopeId) -> Result<(), CompilerError> {
        if self.functions.contains_key(name) {
            return Err(self.err(ErrorKind::DuplicateFunction(name.to_string()), scope));
        }
        self.functions.insert(name.to_string(), scope);
        Ok(())
    }

    pub fn add_region(&mut self, name: &str, scope: ScopeId) -> Result<(), CompilerError> {
        if self.regions.contains_key(name) || self.functions.contains_key(name) {
            return Err(self.err(ErrorKind::DuplicateRegion(name.to_string()), scope));
        }
        self.regions.insert(
            name.to_string(),
            RegionEntry {
                scope,
                needs_measurement_qubit: false,
            },
        );
        Ok(())
    }

    pub fn region_needs_measurement_qubit(&mut self, name: &str) {
        if let Some(entry) = self.regions.get_mut(name) {
            entry.needs_measurement_qubit = true;
        }
    }

    pub fn does_region_need_measurement_qubit(&self, name: &str) -> bool {
        self.regions
            .get(name)
            .map(|entry| entry.needs_measurement_qubit)
            .unwrap_or(false)
    }

    // ---- identifier maps ----

    /// Record a variable in `target`'s identifier map. Fails with T0 for an
    /// invalid typename and Q2/C0 when the name shadows a declaration in
    /// the same scope.
    pub fn register_variable(
        &mut self,
        target: ScopeId,
        name_scope: ScopeId,
        type_scope: ScopeId,
        declaration: ScopeId,
    ) -> Result<(), CompilerError> {
        let typename = match self.payload(type_scope) {
            Payload::Type(name) => name.clone(),
            _ => String::new(),
        };
        let name = match self.payload(name_scope) {
            Payload::VIdent { name, .. } => name.clone(),
            _ => String::new(),
        };
        if !types::is_valid(&typename) {
            return Err(self.err(ErrorKind::UnknownType(typename), type_scope));
        }
        if self.arena.scope(target).variables.contains_key(&name) {
            let kind = if types::is_quantum(&typename) {
                ErrorKind::DuplicateQuantumVariable(name)
            } else {
                ErrorKind::DuplicateClassicalVariable(name)
            };
            return Err(self.err(kind, name_scope));
        }
        self.arena.scope_mut(target).variables.insert(
            name,
            VariableEntry {
                typename,
                declaration,
            },
        );
        Ok(())
    }

    /// Lexical lookup: walk the parent chain starting at `from`.
    pub fn type_for(&self, from: ScopeId, name: &str) -> Option<VariableEntry> {
        let mut current = Some(from);
        while let Some(id) = current {
            let scope = self.arena.scope(id);
            if let Some(entry) = scope.variables.get(name) {
                return Some(entry.clone());
            }
            current = scope.parent;
        }
        None
    }

    /// Bind a constant value in the scope where `name` was registered.
    pub fn set_constant(&mut self, from: ScopeId, name: &str, value: i64) -> bool {
        let mut current = Some(from);
        while let Some(id) = current {
            if self.arena.scope(id).variables.contains_key(name) {
                self.arena
                    .scope_mut(id)
                    .constants
                    .insert(name.to_string(), value);
                return true;
            }
            current = self.arena.scope(id).parent;
        }
        false
    }

    pub fn constant_for(&self, from: ScopeId, name: &str) -> Option<i64> {
        let mut current = Some(from);
        while let Some(id) = current {
            let scope = self.arena.scope(id);
            if let Some(&value) = scope.constants.get(name) {
                return Some(value);
            }
            current = scope.parent;
        }
        None
    }

    // ---- payload accessors ----

    pub fn child_where(
        &self,
        id: ScopeId,
        predicate: impl Fn(&Payload) -> bool,
    ) -> Option<ScopeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&child| predicate(self.payload(child)))
    }

    /// Name carried by an `FIdent` child (functions and calls).
    pub fn function_name(&self, id: ScopeId) -> Option<(String, ScopeId)> {
        self.children(id).iter().copied().find_map(|child| {
            if let Payload::FIdent(name) = self.payload(child) {
                Some((name.clone(), child))
            } else {
                None
            }
        })
    }

    /// Name carried by an `RIdent` child (regions).
    pub fn region_name(&self, id: ScopeId) -> Option<(String, ScopeId)> {
        self.children(id).iter().copied().find_map(|child| {
            if let Payload::RIdent(name) = self.payload(child) {
                Some((name.clone(), child))
            } else {
                None
            }
        })
    }

    pub fn vident_name(&self, id: ScopeId) -> Option<String> {
        if let Payload::VIdent { name, .. } = self.payload(id) {
            Some(name.clone())
        } else {
            None
        }
    }

    pub fn uint_value(&self, id: ScopeId) -> Option<i64> {
        if let Payload::UInt(value) = self.payload(id) {
            Some(*value)
        } else {
            None
        }
    }

    pub fn block_of(&self, id: ScopeId) -> Option<ScopeId> {
        self.child_where(id, |p| matches!(p, Payload::Block))
    }

    pub fn arg_list_of(&self, id: ScopeId) -> Option<ScopeId> {
        self.child_where(id, |p| matches!(p, Payload::ArgList))
    }

    pub fn call_list_of(&self, id: ScopeId) -> Option<ScopeId> {
        self.child_where(id, |p| matches!(p, Payload::CallList))
    }

    /// The qubit cap of a region: its `UInt` child.
    pub fn region_cap(&self, id: ScopeId) -> Option<i64> {
        self.child_where(id, |p| matches!(p, Payload::UInt(_)))
            .and_then(|child| self.uint_value(child))
    }

    /// `(type scope, name scope, expression scope)` of a declaration.
    pub fn declaration_parts(&self, id: ScopeId) -> Option<(ScopeId, ScopeId, ScopeId)> {
        let children = self.children(id);
        if children.len() == 3 {
            Some((children[0], children[1], children[2]))
        } else {
            None
        }
    }

    pub fn type_name(&self, id: ScopeId) -> Option<String> {
        if let Payload::Type(name) = self.payload(id) {
            Some(name.clone())
        } else {
            None
        }
    }

    /// Bit values of a classical or quantum literal scope.
    pub fn literal_bits(&self, id: ScopeId) -> Vec<bool> {
        self.children(id)
            .iter()
            .filter_map(|&child| {
                if let Payload::Bit(value) = self.payload(child) {
                    Some(*value)
                } else {
                    None
                }
            })
            .collect()
    }

    /// Register length of a declared variable, from the bit literal of its
    /// declaration. `None` for non-register declarations (function args,
    /// `Const`).
    pub fn register_length(&self, from: ScopeId, name: &str) -> Option<usize> {
        let entry = self.type_for(from, name)?;
        let literal = self.child_where(entry.declaration, |p| {
            matches!(p, Payload::ClassicalLiteral | Payload::QuantumLiteral)
        })?;
        Some(self.literal_bits(literal).len())
    }
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::Payload;

    #[test]
    fn ids_are_monotonic() {
        let mut ast = Ast::new();
        let a = ast.arena.alloc(1, 1, Payload::Block, Some(ast.root));
        let b = ast.arena.alloc(1, 2, Payload::Block, Some(a));
        assert!(ast.root < a && a < b);
        assert_eq!(ast.arena.scope(b).parent, Some(a));
        assert_eq!(ast.children(ast.root), &[a]);
    }

    #[test]
    fn lexical_lookup_walks_parents() {
        let mut ast = Ast::new();
        let block = ast.arena.alloc(1, 1, Payload::Block, Some(ast.root));
        let decl = ast
            .arena
            .alloc(2, 1, Payload::ClassicalDeclaration, Some(block));
        let ty = ast
            .arena
            .alloc(2, 1, Payload::Type("Const".into()), Some(decl));
        let name = ast.arena.alloc(
            2,
            7,
            Payload::VIdent {
                name: "n".into(),
                v_type: None,
            },
            Some(decl),
        );
        ast.register_variable(block, name, ty, decl).unwrap();

        // Lookup from a grandchild scope finds the block-level entry.
        assert_eq!(ast.type_for(name, "n").unwrap().typename, "Const");
        assert!(ast.type_for(name, "m").is_none());
    }

    #[test]
    fn shadowing_in_same_scope_is_rejected() {
        let mut ast = Ast::new();
        let block = ast.arena.alloc(1, 1, Payload::Block, Some(ast.root));
        let decl = ast
            .arena
            .alloc(2, 1, Payload::ClassicalDeclaration, Some(block));
        let ty = ast
            .arena
            .alloc(2, 1, Payload::Type("C[]".into()), Some(decl));
        let name = ast.arena.alloc(
            2,
            5,
            Payload::VIdent {
                name: "c".into(),
                v_type: None,
            },
            Some(decl),
        );
        ast.register_variable(block, name, ty, decl).unwrap();
        let err = ast.register_variable(block, name, ty, decl).unwrap_err();
        assert_eq!(err.code(), "C0");
    }

    #[test]
    fn unknown_type_is_t0() {
        let mut ast = Ast::new();
        let block = ast.arena.alloc(1, 1, Payload::Block, Some(ast.root));
        let decl = ast
            .arena
            .alloc(2, 1, Payload::ClassicalDeclaration, Some(block));
        let ty = ast
            .arena
            .alloc(2, 1, Payload::Type("Foo[]".into()), Some(decl));
        let name = ast.arena.alloc(
            2,
            7,
            Payload::VIdent {
                name: "f".into(),
                v_type: None,
            },
            Some(decl),
        );
        let err = ast.register_variable(block, name, ty, decl).unwrap_err();
        assert_eq!(err.code(), "T0");
    }

    #[test]
    fn constants_bind_in_declaring_scope() {
        let mut ast = Ast::new();
        let block = ast.arena.alloc(1, 1, Payload::Block, Some(ast.root));
        let decl = ast
            .arena
            .alloc(2, 1, Payload::ClassicalDeclaration, Some(block));
        let ty = ast
            .arena
            .alloc(2, 1, Payload::Type("Const".into()), Some(decl));
        let name = ast.arena.alloc(
            2,
            7,
            Payload::VIdent {
                name: "n".into(),
                v_type: None,
            },
            Some(decl),
        );
        ast.register_variable(block, name, ty, decl).unwrap();
        assert!(ast.set_constant(decl, "n", 14));
        assert_eq!(ast.constant_for(name, "n"), Some(14));
        assert_eq!(ast.constant_for(ast.root, "n"), None);
    }

    #[test]
    fn region_function_name_collision_is_r0() {
        let mut ast = Ast::new();
        let f = ast.arena.alloc(1, 1, Payload::Function, Some(ast.root));
        let r = ast.arena.alloc(2, 1, Payload::Region, Some(ast.root));
        ast.add_function("mix", f).unwrap();
        let err = ast.add_region("mix", r).unwrap_err();
        assert_eq!(err.code(), "R0");
    }
}
