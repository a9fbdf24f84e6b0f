//! For each recursive function, identifies its recurrence pattern and
//! initial argument value, then computes a finite call depth or fails.

use std::collections::HashMap;

use regex::Regex;

use crate::error::{AnalysisError, Result};
use crate::model::{Finding, Findings, Reduction, RecursionInfo};
use crate::source_utils;

fn reduction_regex(name: &str) -> Regex {
    Regex::new(&format!(
        r"\b{}\s*\(\s*\w+\s*(-|/|>>)\s*(\d+)\s*\)",
        regex::escape(name)
    ))
    .expect("reduction regex")
}

/// Inspects `body` for the first matching recurrence on the function's
/// argument. Returns `(reduction, pattern_recognized)`;
/// `pattern_recognized == false` means the `subtract(1)` default was used
/// and a `RecursionPatternUnknown` finding should be recorded.
fn detect_reduction(body: &str, name: &str) -> (Reduction, bool) {
    let re = reduction_regex(name);
    match re.captures(body) {
        Some(caps) => match &caps[1] {
            "-" => (
                Reduction::Subtract(caps[2].parse().unwrap_or(1).max(1)),
                true,
            ),
            "/" => (
                Reduction::Divide(caps[2].parse().unwrap_or(2).max(2)),
                true,
            ),
            ">>" => {
                let shift: u32 = caps[2].parse().unwrap_or(0);
                (Reduction::Divide(1u32 << shift.max(1)), true)
            }
            _ => (Reduction::Subtract(1), false),
        },
        None => (Reduction::Subtract(1), false),
    }
}

/// Determines the initial argument value passed into `callee`'s recursion,
/// trying four methods in order of specificity.
fn estimate_initial_value(source: &str, callee: &str, known_functions: &[String]) -> Option<u32> {
    // Rule 1: direct literal argument at any call site.
    if let Some(&max) = source_utils::literal_call_args(source, callee).iter().max() {
        return Some(max.max(0) as u32);
    }

    // Rule 2: variable argument in `main`, resolved via a local assignment
    // in `main`.
    if let Some(value) = variable_argument_in_main(source, callee) {
        return Some(value);
    }

    // Rule 3: parameter propagation one hop up the caller chain.
    for (caller, _param) in source_utils::callers_passing_param(source, callee, known_functions) {
        if let Some(&max) = source_utils::literal_call_args(source, &caller).iter().max() {
            return Some(max.max(0) as u32);
        }
        if let Some(value) = variable_argument_in_main(source, &caller) {
            return Some(value);
        }
    }

    // Rule 4: any literal call elsewhere in the source. A safety-net
    // duplicate of rule 1's already-global scan, reached only once rules
    // 2-3 have both failed (see DESIGN.md).
    source_utils::literal_call_args(source, callee)
        .into_iter()
        .max()
        .map(|v| v.max(0) as u32)
}

fn variable_argument_in_main(source: &str, callee: &str) -> Option<u32> {
    let main_body = source_utils::find_function_body(source, "main")?;
    let assignments = source_utils::variable_assignments(source);
    for var in source_utils::variable_call_args(main_body, callee) {
        if let Some(&value) = assignments.get(&var) {
            return Some(value.max(0) as u32);
        }
    }
    None
}

fn compute_depth(reduction: Reduction, initial: u32) -> u32 {
    match reduction {
        Reduction::Subtract(n) if n > 0 => initial / n + 1,
        Reduction::Divide(n) if n >= 2 && initial >= 1 => ceil_log(initial, n) + 1,
        _ => initial + 1,
    }
}

/// `ceil(log_base(value))` via repeated multiplication (value, base >= 1).
fn ceil_log(value: u32, base: u32) -> u32 {
    let mut k = 0u32;
    let mut pow: u64 = 1;
    while pow < value as u64 {
        pow *= base as u64;
        k += 1;
    }
    k
}

/// Computes [`RecursionInfo`] for every function in `recursive_functions`.
/// Fails fast, naming the function, on the first one for which no initial
/// value can be determined.
pub fn estimate_depths(
    source: &str,
    recursive_functions: &[String],
    known_functions: &[String],
    findings: &mut Findings,
) -> Result<HashMap<String, RecursionInfo>> {
    let mut result = HashMap::new();

    for name in recursive_functions {
        let body = source_utils::find_function_body(source, name).unwrap_or(source);
        let (reduction, recognized) = detect_reduction(body, name);
        if !recognized {
            findings.push(Finding::RecursionPatternUnknown {
                function: name.clone(),
            });
        }

        let initial_value = estimate_initial_value(source, name, known_functions)
            .ok_or_else(|| AnalysisError::RecursionDepthUnknown(name.clone()))?;

        let depth = compute_depth(reduction, initial_value).max(1);

        result.insert(
            name.clone(),
            RecursionInfo {
                depth,
                reduction,
                initial_value,
            },
        );
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_recursion_depth_matches_scenario_2() {
        let source = "void rec(int n) { if (n > 0) rec(n - 1); } int main() { rec(5); }";
        let mut findings = Findings::new();
        let known = vec!["rec".to_string(), "main".to_string()];
        let depths = estimate_depths(source, &["rec".to_string()], &known, &mut findings).unwrap();
        let info = &depths["rec"];
        assert_eq!(info.reduction, Reduction::Subtract(1));
        assert_eq!(info.initial_value, 5);
        assert_eq!(info.depth, 6);
    }

    #[test]
    fn logarithmic_recursion_depth_matches_scenario_3() {
        let source = "void split(int n) { if (n > 1) split(n >> 2); } int main() { split(64); }";
        let mut findings = Findings::new();
        let known = vec!["split".to_string(), "main".to_string()];
        let depths = estimate_depths(source, &["split".to_string()], &known, &mut findings).unwrap();
        let info = &depths["split"];
        assert_eq!(info.reduction, Reduction::Divide(4));
        assert_eq!(info.initial_value, 64);
        assert_eq!(info.depth, 4);
    }

    #[test]
    fn unrecognized_pattern_defaults_to_subtract_one_with_warning() {
        let source = "void rec(int n) { if (n) rec(foo(n)); } int main() { rec(3); }";
        let mut findings = Findings::new();
        let known = vec!["rec".to_string(), "main".to_string()];
        let depths = estimate_depths(source, &["rec".to_string()], &known, &mut findings).unwrap();
        assert_eq!(depths["rec"].reduction, Reduction::Subtract(1));
        assert_eq!(findings.0.len(), 1);
    }

    #[test]
    fn parameter_propagation_one_hop_resolves_initial_value() {
        let source = "\
void rec(int n) { if (n > 0) rec(n - 1); }
void g(int p) { rec(p); }
int main() { g(9); }
";
        let mut findings = Findings::new();
        let known = vec!["rec".to_string(), "g".to_string(), "main".to_string()];
        let depths = estimate_depths(source, &["rec".to_string()], &known, &mut findings).unwrap();
        assert_eq!(depths["rec"].initial_value, 9);
        assert_eq!(depths["rec"].depth, 10);
    }

    #[test]
    fn unknown_initial_value_is_fatal() {
        let source = "void rec(int n) { if (n > 0) rec(n - 1); } int main() { return 0; }";
        let mut findings = Findings::new();
        let known = vec!["rec".to_string(), "main".to_string()];
        let err = estimate_depths(source, &["rec".to_string()], &known, &mut findings).unwrap_err();
        assert_eq!(err, AnalysisError::RecursionDepthUnknown("rec".to_string()));
    }
}
