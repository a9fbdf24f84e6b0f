//! Memoized depth-first traversal from the entry symbol, expanding every
//! recursive node to its full depth and recording each complete
//! root-to-leaf path with its summed cost.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::model::{CallGraph, PathResult, RecursionInfo};

/// `local_frame(f) * depth(f)`, collapsing a recursive function's entire
/// descent into one scalar.
fn recursive_cost(
    name: &str,
    frames: &HashMap<String, u32>,
    recursion_info: &HashMap<String, RecursionInfo>,
) -> u64 {
    let frame = *frames.get(name).unwrap_or(&0) as u64;
    let depth = recursion_info.get(name).map(|i| i.depth).unwrap_or(1) as u64;
    frame * depth
}

/// Scratch state for one traversal. The memo and recorded-paths tables are
/// the only mutable state, needing interior mutability only on a scratch
/// table; the call graph itself is a frozen adjacency structure built
/// before traversal.
struct PathSearch<'a> {
    graph: &'a CallGraph,
    frames: &'a HashMap<String, u32>,
    recursive: &'a HashSet<String>,
    recursion_info: &'a HashMap<String, RecursionInfo>,
    memo: RefCell<HashMap<(String, Vec<String>), u64>>,
    paths: RefCell<Vec<PathResult>>,
}

impl<'a> PathSearch<'a> {
    fn frame_of(&self, name: &str) -> u64 {
        *self.frames.get(name).unwrap_or(&0) as u64
    }

    fn path_cost(&self, path: &[String]) -> u64 {
        path.iter().map(|n| self.frame_of(n)).sum()
    }

    /// Returns `f`'s contribution to whatever path led to it. `path` holds
    /// every ancestor from the root up to but not including `f`; it is
    /// restored to its original contents before returning.
    fn search(&self, f: &str, path: &mut Vec<String>) -> u64 {
        let key = (f.to_string(), path.clone());
        if let Some(&cached) = self.memo.borrow().get(&key) {
            return cached;
        }

        let already_on_path = path.iter().any(|n| n == f);

        if self.recursive.contains(f) {
            if already_on_path {
                self.memo.borrow_mut().insert(key, 0);
                return 0;
            }

            let cost = recursive_cost(f, self.frames, self.recursion_info);
            let depth = self.recursion_info.get(f).map(|i| i.depth).unwrap_or(1);
            let mut full_path = path.clone();
            full_path.extend(std::iter::repeat(f.to_string()).take(depth.max(1) as usize));
            let total_cost = self.path_cost(&full_path);
            self.paths.borrow_mut().push(PathResult {
                functions: full_path,
                cost: total_cost,
            });

            self.memo.borrow_mut().insert(key, cost);
            return cost;
        }

        if already_on_path {
            self.memo.borrow_mut().insert(key, 0);
            return 0;
        }

        path.push(f.to_string());
        let successors: Vec<String> = self.graph.successors(f).map(str::to_string).collect();

        let max_successor = successors
            .iter()
            .map(|g| self.search(g, path))
            .max()
            .unwrap_or(0);

        if successors.is_empty() {
            self.paths.borrow_mut().push(PathResult {
                functions: path.clone(),
                cost: self.path_cost(path),
            });
        }

        path.pop();
        let contribution = self.frame_of(f) + max_successor;
        self.memo.borrow_mut().insert(key, contribution);
        contribution
    }
}

/// Every complete root-to-leaf path discovered from `entry`, plus the
/// maximum raw (pre-safety-multiplier) stack depth across all of them.
#[derive(Debug, Clone)]
pub struct PathSearchResult {
    pub raw_max: u64,
    pub paths: Vec<PathResult>,
}

pub fn search_paths(
    graph: &CallGraph,
    frames: &HashMap<String, u32>,
    recursive: &HashSet<String>,
    recursion_info: &HashMap<String, RecursionInfo>,
    entry: &str,
) -> PathSearchResult {
    let search = PathSearch {
        graph,
        frames,
        recursive,
        recursion_info,
        memo: RefCell::new(HashMap::new()),
        paths: RefCell::new(Vec::new()),
    };

    let mut path = Vec::new();
    let raw_max = search.search(entry, &mut path);

    PathSearchResult {
        raw_max,
        paths: search.paths.into_inner(),
    }
}
