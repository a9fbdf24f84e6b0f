//! Detects self-recursion from the call graph, cross-validated against
//! source text where available.

use std::collections::HashSet;

use crate::model::CallGraph;
use crate::source_utils::{self, find_function_body};

/// Detects recursive functions from `graph`'s self-loops, filtering out
/// `main` when its apparent self-loop is actually just an infinite event
/// loop (`while(1)`/`for(;;)`) and source is available to prove it.
pub fn detect_recursive_functions(graph: &CallGraph, source_text: Option<&str>) -> HashSet<String> {
    let mut recursive: HashSet<String> = graph
        .nodes()
        .filter(|n| graph.has_self_loop(n))
        .map(str::to_string)
        .collect();

    if let (true, Some(source)) = (recursive.contains("main"), source_text) {
        if let Some(body) = find_function_body(source, "main") {
            if source_utils::contains_infinite_loop(body) && !source_utils::calls_itself(source, "main")
            {
                recursive.remove("main");
            }
        }
    }

    recursive
}
