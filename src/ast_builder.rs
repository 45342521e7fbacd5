//! Builds the scope tree from the parse tree. Pass-through precedence nodes
//! (`sum` over a lone `product`, `product` over a lone `atomic`, `atomic`,
//! `paren`) collapse away, operator productions become `Op`/`BoolOp` scopes,
//! and the right-recursive `call_list`/`arg_list` productions lower to one
//! flat list scope each.

use crate::errors::CompilerError;
use crate::parse_tree::{NodeKind, ParseNode};
use crate::payload::{BinaryOp, CompareOp, Payload};
use crate::scope::{Ast, ScopeId};

pub struct AstBuilder {
    ast: Ast,
    context: ScopeId,
}

impl AstBuilder {
    pub fn new() -> Self {
        let ast = Ast::new();
        let context = ast.root;
        Self { ast, context }
    }

    pub fn build(mut self, tree: &ParseNode) -> Result<Ast, CompilerError> {
        self.visit_node(tree)?;
        Ok(self.ast)
    }

    fn visit_node(&mut self, node: &ParseNode) -> Result<(), CompilerError> {
        self.enter_node(node)?;
        for child in &node.children {
            self.visit_node(child)?;
        }
        self.exit_node(node);
        Ok(())
    }

    fn create(&mut self, node: &ParseNode, payload: Payload) -> ScopeId {
        self.ast
            .arena
            .alloc(node.line, node.column, payload, Some(self.context))
    }

    fn create_and_enter(&mut self, node: &ParseNode, payload: Payload) {
        self.context = self.create(node, payload);
    }

    fn pop(&mut self) {
        if let Some(parent) = self.ast.arena.scope(self.context).parent {
            self.context = parent;
        }
    }

    fn context_is_call_list(&self) -> bool {
        self.ast.payload(self.context).is_call_list()
    }

    fn parent_is_call_list(&self) -> bool {
        self.ast
            .arena
            .scope(self.context)
            .parent
            .map(|p| self.ast.payload(p).is_call_list())
            .unwrap_or(false)
    }

    fn context_is_arg_list(&self) -> bool {
        self.ast.payload(self.context).is_arg_list()
    }

    fn parent_is_arg_list(&self) -> bool {
        self.ast
            .arena
            .scope(self.context)
            .parent
            .map(|p| self.ast.payload(p).is_arg_list())
            .unwrap_or(false)
    }

    fn node_value(node: &ParseNode) -> String {
        node.value.clone().unwrap_or_default()
    }

    fn enter_node(&mut self, node: &ParseNode) -> Result<(), CompilerError> {
        match node.kind {
            NodeKind::FunctionDef => self.create_and_enter(node, Payload::Function),
            NodeKind::Region => self.create_and_enter(node, Payload::Region),
            NodeKind::FunctionCall => self.create_and_enter(node, Payload::FunctionCall),
            NodeKind::If => self.create_and_enter(node, Payload::If),
            NodeKind::Block => self.create_and_enter(node, Payload::Block),
            NodeKind::Assignment => self.create_and_enter(node, Payload::Assignment),

            NodeKind::Sum => match node.children.first().map(|c| c.kind) {
                Some(NodeKind::Add) => {
                    self.create_and_enter(node, Payload::Op(BinaryOp::Add));
                }
                Some(NodeKind::Sub) => {
                    self.create_and_enter(node, Payload::Op(BinaryOp::Sub));
                }
                // A lone product forwards to its child.
                _ => {}
            },
            NodeKind::Product => match node.children.first().map(|c| c.kind) {
                Some(NodeKind::Mul) => {
                    self.create_and_enter(node, Payload::Op(BinaryOp::Mul));
                }
                Some(NodeKind::Div) => {
                    self.create_and_enter(node, Payload::Op(BinaryOp::Div));
                }
                _ => {}
            },
            NodeKind::BExpr => {
                let op = match node.children.first().map(|c| c.kind) {
                    Some(NodeKind::Eq) => CompareOp::Eq,
                    Some(NodeKind::Neq) => CompareOp::Neq,
                    Some(NodeKind::Greater) => CompareOp::Greater,
                    _ => CompareOp::Lesser,
                };
                self.create_and_enter(node, Payload::BoolOp(op));
            }

            NodeKind::Type => {
                let payload = Payload::Type(Self::node_value(node));
                self.create(node, payload);
            }
            // Function and variable identifiers are lowercased: OpenQASM
            // identifiers are conventionally lowercase. Region names keep
            // their case.
            NodeKind::FIdent => {
                let payload = Payload::FIdent(Self::node_value(node).to_lowercase());
                self.create(node, payload);
            }
            NodeKind::VIdent => {
                let payload = Payload::VIdent {
                    name: Self::node_value(node).to_lowercase(),
                    v_type: None,
                };
                self.create(node, payload);
            }
            NodeKind::RIdent => {
                let payload = Payload::RIdent(Self::node_value(node));
                self.create(node, payload);
            }
            NodeKind::UInt => {
                // The lexer only produces digit runs here.
                let value = Self::node_value(node).parse().unwrap_or_default();
                self.create(node, Payload::UInt(value));
            }
            NodeKind::Bit => {
                let payload = Payload::Bit(Self::node_value(node) == "1");
                self.create(node, payload);
            }

            NodeKind::CallList => {
                if !self.context_is_call_list() && !self.parent_is_call_list() {
                    self.create_and_enter(node, Payload::CallList);
                }
            }
            NodeKind::ArgList => {
                if !self.context_is_arg_list() && !self.parent_is_arg_list() {
                    self.create_and_enter(node, Payload::ArgList);
                }
            }
            NodeKind::Arg => self.create_and_enter(node, Payload::Arg),

            NodeKind::QSlice => self.create_and_enter(node, Payload::QuantumSlice),
            NodeKind::QIndex => self.create_and_enter(node, Payload::QuantumIndex),
            NodeKind::QLit => self.create_and_enter(node, Payload::QuantumLiteral),
            NodeKind::CLit => self.create_and_enter(node, Payload::ClassicalLiteral),
            NodeKind::QDeclaration => self.create_and_enter(node, Payload::QuantumDeclaration),
            NodeKind::Declaration => self.create_and_enter(node, Payload::ClassicalDeclaration),
            NodeKind::Measurement => self.create_and_enter(node, Payload::Measurement),

            // Pass-through productions: recurse without creating a scope.
            NodeKind::Program
            | NodeKind::Atomic
            | NodeKind::Paren
            | NodeKind::Add
            | NodeKind::Sub
            | NodeKind::Mul
            | NodeKind::Div
            | NodeKind::Eq
            | NodeKind::Neq
            | NodeKind::Greater
            | NodeKind::Lesser => {}
        }
        Ok(())
    }

    fn exit_node(&mut self, node: &ParseNode) {
        match node.kind {
            NodeKind::FunctionDef
            | NodeKind::Region
            | NodeKind::FunctionCall
            | NodeKind::If
            | NodeKind::Block
            | NodeKind::Assignment
            | NodeKind::Arg
            | NodeKind::QSlice
            | NodeKind::QIndex
            | NodeKind::QLit
            | NodeKind::CLit
            | NodeKind::QDeclaration
            | NodeKind::Declaration
            | NodeKind::Measurement
            | NodeKind::BExpr => self.pop(),

            NodeKind::Sum => {
                if matches!(
                    node.children.first().map(|c| c.kind),
                    Some(NodeKind::Add) | Some(NodeKind::Sub)
                ) {
                    self.pop();
                }
            }
            NodeKind::Product => {
                if matches!(
                    node.children.first().map(|c| c.kind),
                    Some(NodeKind::Mul) | Some(NodeKind::Div)
                ) {
                    self.pop();
                }
            }

            // Pop exactly once, at the outermost occurrence of the list.
            NodeKind::CallList => {
                if self.context_is_call_list() && !self.parent_is_call_list() {
                    self.pop();
                }
            }
            NodeKind::ArgList => {
                if self.context_is_arg_list() && !self.parent_is_arg_list() {
                    self.pop();
                }
            }

            _ => {}
        }
    }
}

impl Default for AstBuilder {
    fn default() -> Self {
        Self::new()
    }
}
