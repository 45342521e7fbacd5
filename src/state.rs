//! The program state is a post-resolver index over the scope tree: which
//! regions and functions exist, their bodies, argument signatures, qubit
//! budgets, and the user-defined gates each region depends on.

use std::collections::BTreeMap;

use crate::payload::Payload;
use crate::scope::{Ast, ScopeId};
use crate::stdlib;

#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub scope: ScopeId,
    pub block: ScopeId,
    /// `(name, typename)` for every argument, in declaration order.
    pub signature: Vec<(String, String)>,
    pub classical_args: Vec<String>,
    pub quantum_args: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RegionInfo {
    pub scope: ScopeId,
    pub block: ScopeId,
    pub qubits: i64,
    /// User-defined gates reachable from the region body, in order of first
    /// appearance, closed over gate-to-gate calls.
    pub dependencies: Vec<String>,
    pub needs_measurement_qubit: bool,
}

#[derive(Debug)]
pub struct State {
    pub functions: BTreeMap<String, FunctionInfo>,
    pub regions: BTreeMap<String, RegionInfo>,
}

impl State {
    pub fn from_ast(ast: &Ast) -> Self {
        let mut functions = BTreeMap::new();
        for (name, &scope) in &ast.functions {
            let block = ast.block_of(scope).expect("function scope missing block");
            let signature = argument_signature(ast, scope);
            let classical_args = signature
                .iter()
                .filter(|(_, ty)| crate::types::is_classical(ty))
                .map(|(n, _)| n.clone())
                .collect();
            let quantum_args = signature
                .iter()
                .filter(|(_, ty)| crate::types::is_quantum(ty))
                .map(|(n, _)| n.clone())
                .collect();
            functions.insert(
                name.clone(),
                FunctionInfo {
                    scope,
                    block,
                    signature,
                    classical_args,
                    quantum_args,
                },
            );
        }

        let mut regions = BTreeMap::new();
        for (name, entry) in &ast.regions {
            let block = ast.block_of(entry.scope).expect("region scope missing block");
            let mut dependencies = Vec::new();
            collect_dependencies(ast, block, &mut dependencies);
            regions.insert(
                name.clone(),
                RegionInfo {
                    scope: entry.scope,
                    block,
                    qubits: ast.region_cap(entry.scope).unwrap_or(0),
                    dependencies,
                    needs_measurement_qubit: entry.needs_measurement_qubit,
                },
            );
        }

        Self { functions, regions }
    }

    /// Signature of a callee: a user-defined function or a standard-library
    /// gate. `None` means the callee does not exist (F8).
    pub fn arguments_for(&self, function_name: &str) -> Option<Vec<(String, String)>> {
        if let Some(info) = self.functions.get(function_name) {
            return Some(info.signature.clone());
        }
        stdlib::standard_args(function_name).map(|args| {
            args.iter()
                .map(|&(name, ty)| (name.to_string(), ty.to_string()))
                .collect()
        })
    }
}

fn argument_signature(ast: &Ast, function: ScopeId) -> Vec<(String, String)> {
    let mut signature = Vec::new();
    if let Some(arg_list) = ast.arg_list_of(function) {
        for &arg in ast.children(arg_list) {
            let children = ast.children(arg);
            if let [type_scope, name_scope] = children[..] {
                let typename = ast.type_name(type_scope).unwrap_or_default();
                let name = ast.vident_name(name_scope).unwrap_or_default();
                signature.push((name, typename));
            }
        }
    }
    signature
}

/// Walk a body for calls to user-defined gates, then close over the called
/// gates' own bodies so every definition a program prints is present.
fn collect_dependencies(ast: &Ast, scope: ScopeId, dependencies: &mut Vec<String>) {
    if let Payload::FunctionCall = ast.payload(scope) {
        if let Some((name, _)) = ast.function_name(scope) {
            if !stdlib::is_standard(&name) && !dependencies.iter().any(|d| d == &name) {
                dependencies.push(name.clone());
                if let Some(&function) = ast.functions.get(&name) {
                    if let Some(block) = ast.block_of(function) {
                        collect_dependencies(ast, block, dependencies);
                    }
                }
            }
        }
    }
    for &child in ast.children(scope) {
        collect_dependencies(ast, child, dependencies);
    }
}
