//! Small C-source text helpers shared by [`crate::recursion`] and
//! [`crate::depth`]. These are deliberately shallow (regex-plus-brace-
//! matching, not a real C parser): locating a recursive call's reduction
//! shape and initial value doesn't need a full AST, just a reliable scan
//! for call sites and simple literal assignments.

use once_cell::sync::Lazy;
use regex::Regex;

fn function_def_regex(name: &str) -> Regex {
    Regex::new(&format!(
        r"(?s)(?:\w+\s+)+{}\s*\([^)]*\)\s*\{{",
        regex::escape(name)
    ))
    .expect("function def regex")
}

/// Finds the first definition of `name` in `source` and returns its full
/// body, including the enclosing braces.
pub fn find_function_body<'s>(source: &'s str, name: &str) -> Option<&'s str> {
    let def = function_def_regex(name);
    let m = def.find(source)?;
    let start = m.start();
    let brace_start = source[start..].find('{')? + start;

    let mut depth = 0i32;
    for (i, ch) in source[brace_start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&source[start..=brace_start + i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// The statement body only (from the opening brace onward), so that a
/// call matching the function's own declaration signature isn't mistaken
/// for a recursive call.
fn body_after_declaration(full_def: &str) -> &str {
    match full_def.find('{') {
        Some(idx) => &full_def[idx..],
        None => full_def,
    }
}

static INFINITE_LOOP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"while\s*\(\s*(1|true)\s*\)|for\s*\(\s*;\s*;\s*\)").unwrap());

pub fn contains_infinite_loop(body: &str) -> bool {
    INFINITE_LOOP.is_match(body)
}

/// Whether `name`'s body contains a direct call expression to itself,
/// excluding the declaration itself.
pub fn calls_itself(source: &str, name: &str) -> bool {
    let Some(full_def) = find_function_body(source, name) else {
        return false;
    };
    let body = body_after_declaration(full_def);
    let call = Regex::new(&format!(r"(?s)\b{}\s*\([^)]*\)", regex::escape(name))).unwrap();
    call.is_match(body)
}

/// Every literal-integer argument passed at a direct call site
/// `callee(LIT, ...)` anywhere in `source`.
pub fn literal_call_args(source: &str, callee: &str) -> Vec<i64> {
    let re = Regex::new(&format!(r"\b{}\s*\(\s*(-?\d+)\s*[,)]", regex::escape(callee))).unwrap();
    re.captures_iter(source)
        .filter_map(|c| c[1].parse().ok())
        .collect()
}

/// Every *variable* argument name passed at a direct call site
/// `callee(var, ...)`.
pub fn variable_call_args(source: &str, callee: &str) -> Vec<String> {
    let re = Regex::new(&format!(r"\b{}\s*\(\s*(\w+)\s*[,)]", regex::escape(callee))).unwrap();
    re.captures_iter(source)
        .map(|c| c[1].to_string())
        .filter(|s| s.parse::<i64>().is_err())
        .collect()
}

/// All `TYPE name = LITERAL;` assignments in `source`.
pub fn variable_assignments(source: &str) -> std::collections::HashMap<String, i64> {
    let re = Regex::new(r"(?:int|char|uint\d+_t|long|short|float|double)\s+(\w+)\s*=\s*(-?\d+)\s*;")
        .unwrap();
    let mut map = std::collections::HashMap::new();
    for caps in re.captures_iter(source) {
        if let Ok(v) = caps[2].parse() {
            map.insert(caps[1].to_string(), v);
        }
    }
    map
}

/// Parameter names of `name`'s signature, in declaration order (best
/// effort: splits on commas and takes the last identifier token of each).
pub fn function_parameters(source: &str, name: &str) -> Vec<String> {
    let re = Regex::new(&format!(r"(?:\w+\s+)+{}\s*\(([^)]*)\)", regex::escape(name))).unwrap();
    let Some(caps) = re.captures(source) else {
        return Vec::new();
    };
    let params = &caps[1];
    if params.trim().is_empty() || params.trim() == "void" {
        return Vec::new();
    }
    params
        .split(',')
        .filter_map(|p| p.split_whitespace().last())
        .map(|tok| tok.trim_start_matches('*').to_string())
        .collect()
}

/// Every caller `g` whose body contains `callee(p)` where `p` is one of
/// `g`'s own parameter names — one-hop propagation up the caller chain.
/// Returns `(caller_name, param_name)` pairs.
pub fn callers_passing_param(
    source: &str,
    callee: &str,
    known_functions: &[String],
) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for caller in known_functions {
        if caller == callee {
            continue;
        }
        let Some(body) = find_function_body(source, caller) else {
            continue;
        };
        let params = function_parameters(source, caller);
        if params.is_empty() {
            continue;
        }
        let body = body_after_declaration(body);
        for param in &params {
            let re = Regex::new(&format!(
                r"\b{}\s*\(\s*{}\s*[,)]",
                regex::escape(callee),
                regex::escape(param)
            ))
            .unwrap();
            if re.is_match(body) {
                out.push((caller.clone(), param.clone()));
            }
        }
    }
    out
}
