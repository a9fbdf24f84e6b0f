//! Core data types shared across the pipeline stages.

use std::ops::Range;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// One of the two halves of the 16-bit pointer register pair used for
/// indirect-call target resolution (r30 = low byte, r31 = high byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PointerHalf {
    Low,
    High,
}

/// A parsed disassembly instruction. Only the forms that materially affect
/// the analysis are represented; everything else collapses to `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    DirectCall { target_addr: u32 },
    RelativeCall { offset: i32 },
    IndirectCall,
    LoadImm { reg: PointerHalf, byte: u8 },
    FrameSub { n: u32 },
    FrameAdd { n: u32 },
    Push,
    Pop,
    ArrayLoad,
    Other,
}

/// A single parsed disassembly line: an address plus its instruction form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub address: u32,
    pub instruction: Instruction,
    pub raw: String,
}

/// A function discovered by [`crate::partitioner::FunctionPartitioner`].
#[derive(Debug, Clone, Serialize)]
pub struct Function {
    pub label: String,
    pub base_name: String,
    pub byte_address: u32,
    pub line_range: Range<usize>,
    /// Filled in by the frame/reconciliation stage; `None` until then.
    pub local_frame: Option<u32>,
}

impl Function {
    pub fn word_address(&self) -> u32 {
        self.byte_address / 2
    }
}

/// Strip optimizer-clone suffixes, returning the normalized base name.
///
/// Strips any suffix starting at the first occurrence of `.constprop`,
/// `.isra`, or `.part`, to the end of the name (including a trailing `.N`).
pub fn normalize_base_name(name: &str) -> String {
    let mut cut = name.len();
    for marker in [".constprop", ".isra", ".part"] {
        if let Some(idx) = name.find(marker) {
            cut = cut.min(idx);
        }
    }
    name[..cut].to_string()
}

/// Directed multigraph over function base names.
///
/// Nodes are inserted in the order they are first seen so that successor
/// enumeration during path search follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    nodes: IndexSet<String>,
    edges: IndexMap<String, IndexSet<String>>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, name: &str) {
        if self.nodes.insert(name.to_string()) {
            self.edges.entry(name.to_string()).or_default();
        }
    }

    /// Adds an edge `from -> to`, inserting both endpoints as nodes if
    /// necessary (maintains the invariant that every edge's endpoints are
    /// nodes). Duplicate edges are suppressed.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        self.add_node(from);
        self.add_node(to);
        self.edges.get_mut(from).unwrap().insert(to.to_string());
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn contains_node(&self, name: &str) -> bool {
        self.nodes.contains(name)
    }

    /// Successors of `name` in insertion order, or an empty slice if `name`
    /// has no outgoing edges (or is not a node).
    pub fn successors(&self, name: &str) -> impl Iterator<Item = &str> {
        self.edges
            .get(name)
            .into_iter()
            .flat_map(|s| s.iter().map(String::as_str))
    }

    pub fn has_self_loop(&self, name: &str) -> bool {
        self.successors(name).any(|s| s == name)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(|s| s.len()).sum()
    }
}

/// How a recursive function's argument shrinks per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Reduction {
    Subtract(u32),
    Divide(u32),
}

/// Proven recursion characteristics for one recursive function.
#[derive(Debug, Clone, Serialize)]
pub struct RecursionInfo {
    pub depth: u32,
    pub reduction: Reduction,
    pub initial_value: u32,
}

/// One complete root-to-leaf path discovered by [`crate::path_search`].
#[derive(Debug, Clone, Serialize)]
pub struct PathResult {
    pub functions: Vec<String>,
    pub cost: u64,
}

/// A non-fatal finding accumulated during analysis.
#[derive(Debug, Clone, Serialize)]
pub enum Finding {
    AddressUnresolved { function: String, detail: String },
    IndirectCallUnresolved { function: String },
    RecursionPatternUnknown { function: String },
    StackPointerDirectWrite { function: String },
    MalformedFrameReportLine { line: String },
}

/// Accumulator for non-fatal findings, threaded through every pipeline
/// stage and attached to the final analysis report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Findings(pub Vec<Finding>);

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, finding: Finding) {
        self.0.push(finding);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
