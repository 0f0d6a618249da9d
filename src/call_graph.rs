//! Call graph analysis for the inliner.
//!
//! Inlining terminates only when the function call graph is acyclic, so
//! direct and mutual recursion are rejected before any substitution
//! happens. Cycles are found as strongly connected components using
//! Tarjan's algorithm.

use crate::ast::Function;
use crate::error::{CompileResult, CompilerError, ErrorKind};
use std::collections::{HashMap, HashSet};

/// Which functions call which other functions.
#[derive(Debug)]
pub struct CallGraph {
    /// Map from function name to the set of functions it calls.
    edges: HashMap<String, HashSet<String>>,
    /// All function names in the program.
    names: Vec<String>,
}

impl CallGraph {
    /// Build a call graph from the parsed functions. A call is any body
    /// token whose value matches a function name (the same rule the
    /// inliner substitutes by).
    pub fn build(functions: &[Function]) -> Self {
        let name_set: HashSet<&str> = functions.iter().map(|f| f.name.as_str()).collect();
        let mut edges = HashMap::new();
        for func in functions {
            let callees: HashSet<String> = func
                .body
                .iter()
                .filter(|t| name_set.contains(t.value.as_str()))
                .map(|t| t.value.clone())
                .collect();
            edges.insert(func.name.clone(), callees);
        }
        CallGraph {
            edges,
            names: functions.iter().map(|f| f.name.clone()).collect(),
        }
    }

    /// Fail with `RECURSIVE_FUNCTION` if any function takes part in a
    /// recursive cycle, naming the cycle members.
    pub fn check_acyclic(&self) -> CompileResult<()> {
        let cycles = self.recursive_sccs();
        match cycles.first() {
            None => Ok(()),
            Some(cycle) => {
                let mut members: Vec<&str> = cycle.iter().map(String::as_str).collect();
                members.sort_unstable();
                Err(CompilerError::new(
                    ErrorKind::RecursiveFunction,
                    format!(
                        "Recursion is not supported: function{} {} form{} a call cycle",
                        if members.len() > 1 { "s" } else { "" },
                        members.join(", "),
                        if members.len() > 1 { "" } else { "s" },
                    ),
                ))
            }
        }
    }

    /// Strongly connected components that represent recursion: multi-member
    /// components, or single functions that call themselves.
    fn recursive_sccs(&self) -> Vec<HashSet<String>> {
        let mut state = TarjanState::default();
        for name in &self.names {
            if !state.indices.contains_key(name) {
                self.tarjan_visit(name, &mut state);
            }
        }
        state
            .sccs
            .into_iter()
            .filter(|scc| {
                if scc.len() > 1 {
                    return true;
                }
                let name = scc.iter().next().unwrap();
                self.edges
                    .get(name)
                    .is_some_and(|callees| callees.contains(name))
            })
            .collect()
    }

    fn tarjan_visit(&self, name: &str, state: &mut TarjanState) {
        let index = state.counter;
        state.counter += 1;
        state.indices.insert(name.to_string(), index);
        state.lowlinks.insert(name.to_string(), index);
        state.stack.push(name.to_string());
        state.on_stack.insert(name.to_string());

        if let Some(callees) = self.edges.get(name) {
            for callee in callees {
                if !state.indices.contains_key(callee) {
                    self.tarjan_visit(callee, state);
                    let low = state.lowlinks[callee].min(state.lowlinks[name]);
                    state.lowlinks.insert(name.to_string(), low);
                } else if state.on_stack.contains(callee) {
                    let low = state.indices[callee].min(state.lowlinks[name]);
                    state.lowlinks.insert(name.to_string(), low);
                }
            }
        }

        if state.lowlinks[name] == state.indices[name] {
            let mut scc = HashSet::new();
            while let Some(member) = state.stack.pop() {
                state.on_stack.remove(&member);
                let done = member == name;
                scc.insert(member);
                if done {
                    break;
                }
            }
            state.sccs.push(scc);
        }
    }
}

#[derive(Default)]
struct TarjanState {
    counter: usize,
    stack: Vec<String>,
    on_stack: HashSet<String>,
    indices: HashMap<String, usize>,
    lowlinks: HashMap<String, usize>,
    sccs: Vec<HashSet<String>>,
}
