//! Function inlining.
//!
//! Flattens the program into a single token stream starting from `main`:
//! every body token whose value names a function is replaced by that
//! function's body, recursively. The call graph is checked for cycles
//! before this runs, so the recursion here terminates.

use crate::ast::Function;
use crate::call_graph::CallGraph;
use crate::error::{CompileResult, CompilerError, ErrorKind};
use crate::lexer::Token;
use std::collections::HashMap;

/// Produce the flat token stream of the whole program.
pub fn inline_program(functions: &[Function]) -> CompileResult<Vec<Token>> {
    CallGraph::build(functions).check_acyclic()?;

    let main = functions
        .iter()
        .find(|f| f.name.eq_ignore_ascii_case("main"))
        .ok_or_else(|| {
            CompilerError::new(
                ErrorKind::MissingMainFunction,
                "The program does not have a main function",
            )
        })?;

    let by_name: HashMap<&str, &Function> =
        functions.iter().map(|f| (f.name.as_str(), f)).collect();
    let mut tokens = Vec::new();
    expand(main, &by_name, &mut tokens);
    Ok(tokens)
}

fn expand(func: &Function, by_name: &HashMap<&str, &Function>, out: &mut Vec<Token>) {
    for token in &func.body {
        match by_name.get(token.value.as_str()) {
            Some(callee) => expand(callee, by_name, out),
            None => out.push(token.clone()),
        }
    }
}
