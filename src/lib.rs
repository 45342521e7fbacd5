//! The Funq compiler: a source-to-source compiler from the Funq quantum
//! programming language to OpenQASM 2.0. Each `region` in a Funq program
//! compiles to a standalone circuit; each `fn` compiles to a reusable QASM
//! gate definition.

pub mod ast_builder;
pub mod checker;
pub mod computation;
pub mod errors;
pub mod lexer;
pub mod output;
pub mod parse_tree;
pub mod parser;
pub mod payload;
pub mod qasm;
pub mod resolver;
pub mod scope;
pub mod state;
pub mod stdlib;
pub mod transpiler;
pub mod types;
pub mod visitor;

pub use errors::{CompilerError, ErrorKind};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compile a Funq source file into `(region name, QASM text)` pairs.
/// Stops at the first error.
pub fn compile(source: &str) -> Result<Vec<(String, String)>, CompilerError> {
    // 1. Lex and parse into the raw syntax tree.
    let tokens = lexer::tokenize(source)?;
    let tree = parser::Parser::new(tokens).parse_program()?;

    // 2. Build the scope tree.
    let mut ast = ast_builder::AstBuilder::new().build(&tree)?;

    // 3. Resolve names and variable types.
    resolver::resolve(&mut ast)?;

    // 4. Index regions, functions, and dependencies.
    let state = state::State::from_ast(&ast);

    // 5. Check for semantic errors.
    if let Err(mut errors) = checker::check(&mut ast, &state) {
        return Err(errors.remove(0));
    }

    // 6. Resolve constant expressions.
    computation::fold(&mut ast)?;

    // 7. Transpile into the QASM IR and serialize.
    let lowered = transpiler::Transpiler::new(&ast, &state).transpile()?;
    Ok(output::generate_output(&lowered.programs, &lowered.gates))
}

/// Run the frontend and the checker, returning every diagnostic the
/// checker accumulates rather than stopping at the first.
pub fn check(source: &str) -> Result<(), Vec<CompilerError>> {
    let tokens = lexer::tokenize(source).map_err(|e| vec![e])?;
    let tree = parser::Parser::new(tokens)
        .parse_program()
        .map_err(|e| vec![e])?;
    let mut ast = ast_builder::AstBuilder::new()
        .build(&tree)
        .map_err(|e| vec![e])?;
    resolver::resolve(&mut ast).map_err(|e| vec![e])?;
    let state = state::State::from_ast(&ast);
    checker::check(&mut ast, &state)
}
