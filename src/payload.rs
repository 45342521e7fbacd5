//! Payloads are the packets of information stored in scope-tree nodes.
//! Accessors live on [`crate::scope::Ast`] and pattern-match on these
//! variants.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Greater,
    Lesser,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Neq => "!=",
            CompareOp::Greater => ">",
            CompareOp::Lesser => "<",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// The top-level scope holding functions and regions.
    Root,
    Function,
    Region,
    FunctionCall,
    Block,
    If,
    Assignment,
    Op(BinaryOp),
    BoolOp(CompareOp),
    FIdent(String),
    VIdent {
        name: String,
        /// Typename filled in by the resolver.
        v_type: Option<String>,
    },
    RIdent(String),
    Type(String),
    UInt(i64),
    Bit(bool),
    CallList,
    ArgList,
    Arg,
    ClassicalDeclaration,
    QuantumDeclaration,
    ClassicalLiteral,
    QuantumLiteral,
    QuantumSlice,
    QuantumIndex,
    Measurement,
}

impl Payload {
    pub fn is_call_list(&self) -> bool {
        matches!(self, Payload::CallList)
    }

    pub fn is_arg_list(&self) -> bool {
        matches!(self, Payload::ArgList)
    }
}
