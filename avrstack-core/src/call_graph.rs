//! The core of the pipeline: walks each function's instructions and emits
//! edges for direct calls, short relative calls, and indirect calls
//! resolved via pointer-register tracking or array-dispatch heuristics.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::address_resolver::AddressResolver;
use crate::frame_report::FrameReport;
use crate::instruction::parse_instruction_line;
use crate::model::{CallGraph, Finding, Findings, Instruction, PointerHalf};
use crate::partitioner::Partition;

const ARRAY_DISPATCH_EXCLUDED: &[&str] = &["delay_ms", "delay_us", "_delay_ms", "_delay_us"];

/// Per-function register-tracking scratch state for the `Z` pointer pair
/// (r30/r31) plus whether an auto-increment array load has been seen.
/// Strictly per-function and reset at function boundaries.
#[derive(Debug, Clone, Copy, Default)]
struct PointerPairState {
    low: Option<u8>,
    high: Option<u8>,
    array_load_seen: bool,
}

impl PointerPairState {
    fn both_set(&self) -> bool {
        self.low.is_some() && self.high.is_some()
    }

    fn reset_pair(&mut self) {
        self.low = None;
        self.high = None;
    }
}

/// Builds the sealed call graph from a function partition, its resolved
/// addresses, and (optionally) source text used for the textual fallback
/// heuristics below.
pub struct CallGraphBuilder<'a> {
    disassembly_lines: Vec<&'a str>,
    resolver: &'a AddressResolver,
    frame_report: &'a FrameReport,
    partition: &'a Partition,
    source_text: Option<&'a str>,
    entry: &'a str,
}

impl<'a> CallGraphBuilder<'a> {
    pub fn new(
        disassembly: &'a str,
        resolver: &'a AddressResolver,
        frame_report: &'a FrameReport,
        partition: &'a Partition,
        source_text: Option<&'a str>,
        entry: &'a str,
    ) -> Self {
        CallGraphBuilder {
            disassembly_lines: disassembly.lines().collect(),
            resolver,
            frame_report,
            partition,
            source_text,
            entry,
        }
    }

    pub fn build(&self, findings: &mut Findings) -> CallGraph {
        let mut graph = CallGraph::new();

        for (idx, function) in self.partition.functions.iter().enumerate() {
            if self.partition.is_runtime(idx) {
                continue;
            }
            graph.add_node(&function.base_name);
            let mut state = PointerPairState::default();

            for i in function.line_range.clone() {
                let Some(line) = self.disassembly_lines.get(i) else {
                    continue;
                };
                let Some(parsed) = parse_instruction_line(line) else {
                    continue;
                };

                match parsed.instruction {
                    Instruction::DirectCall { target_addr } => {
                        match self.resolver.resolve_any(target_addr) {
                            Some(target) => graph.add_edge(&function.base_name, target),
                            None => findings.push(Finding::AddressUnresolved {
                                function: function.base_name.clone(),
                                detail: format!("direct call target 0x{target_addr:x} unresolved"),
                            }),
                        }
                    }
                    Instruction::RelativeCall { offset: 0 } => {
                        // Stack-reservation idiom; not an actual call, no edge.
                    }
                    Instruction::RelativeCall { .. } => {
                        if let Some(target) = self.scan_for_known_function(&parsed.raw, &function.base_name)
                        {
                            graph.add_edge(&function.base_name, &target);
                        }
                    }
                    Instruction::LoadImm { reg, byte } => match reg {
                        PointerHalf::Low => state.low = Some(byte),
                        PointerHalf::High => state.high = Some(byte),
                    },
                    Instruction::ArrayLoad => state.array_load_seen = true,
                    Instruction::IndirectCall => {
                        self.handle_indirect_call(&mut graph, findings, &function.base_name, &mut state);
                    }
                    _ => {}
                }
            }
        }

        self.synthesize_entry_edges(&mut graph);
        graph
    }

    fn handle_indirect_call(
        &self,
        graph: &mut CallGraph,
        findings: &mut Findings,
        current: &str,
        state: &mut PointerPairState,
    ) {
        if state.both_set() {
            let low = state.low.unwrap() as u32;
            let high = state.high.unwrap() as u32;
            let byte_addr = (high << 8) | low;
            if let Some(target) = self.resolver.resolve_any(byte_addr) {
                graph.add_edge(current, target);
                state.reset_pair();
                return;
            }
            state.reset_pair();
        }

        if state.array_load_seen {
            for name in self.frame_report.by_base_name.keys() {
                if name == current || name == "main" || ARRAY_DISPATCH_EXCLUDED.contains(&name.as_str())
                {
                    continue;
                }
                graph.add_edge(current, name);
            }
            state.array_load_seen = false;
            return;
        }

        findings.push(Finding::IndirectCallUnresolved {
            function: current.to_string(),
        });
    }

    /// Last-resort heuristic for a relative call whose offset can't be
    /// turned into a target address from the line alone: scan the raw
    /// instruction text for any known function name.
    fn scan_for_known_function(&self, raw_line: &str, exclude: &str) -> Option<String> {
        let mut candidates: Vec<&str> = self
            .partition
            .functions
            .iter()
            .map(|f| f.base_name.as_str())
            .filter(|name| *name != exclude)
            .collect();
        // Prefer longer names first so a short name that is a substring of
        // a longer one doesn't win spuriously.
        candidates.sort_by_key(|n| std::cmp::Reverse(n.len()));
        for name in candidates {
            if word_boundary_regex(name).is_match(raw_line) {
                return Some(name.to_string());
            }
        }
        None
    }

    /// Recovers cases where the entry's call sites were elided by
    /// inlining: if the entry has no outgoing edges but the source text
    /// names other known functions, synthesize edges from entry to each.
    fn synthesize_entry_edges(&self, graph: &mut CallGraph) {
        if !graph.contains_node(self.entry) {
            return;
        }
        if graph.successors(self.entry).next().is_some() {
            return;
        }
        let Some(source) = self.source_text else {
            return;
        };

        let mut known: HashSet<&str> = self
            .partition
            .functions
            .iter()
            .map(|f| f.base_name.as_str())
            .collect();
        known.extend(self.frame_report.by_base_name.keys().map(String::as_str));

        for name in known {
            if name == self.entry {
                continue;
            }
            if word_boundary_regex(name).is_match(source) {
                graph.add_edge(self.entry, name);
            }
        }
    }
}

fn word_boundary_regex(name: &str) -> Regex {
    Regex::new(&format!(r"\b{}\b", regex::escape(name))).expect("function name regex")
}
