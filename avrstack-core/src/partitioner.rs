//! Splits disassembly text into per-function line ranges.

use crate::instruction::parse_function_header;
use crate::model::{normalize_base_name, Function};

const RUNTIME_SYMBOLS: &[&str] = &["__ctors_end", "__bad_interrupt", "_exit", "__stop_program"];

fn is_local_label(label: &str) -> bool {
    label.starts_with(".L") || label.starts_with(".Loc") || label.contains('^')
}

fn is_runtime_symbol(label: &str) -> bool {
    label.starts_with("__") || RUNTIME_SYMBOLS.contains(&label)
}

/// Result of partitioning: real functions (in first-seen order) plus a
/// parallel flag for which ones are runtime symbols excluded from stack
/// accounting but still present for address resolution.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub functions: Vec<Function>,
    pub runtime: Vec<bool>,
}

impl Partition {
    pub fn is_runtime(&self, index: usize) -> bool {
        self.runtime.get(index).copied().unwrap_or(false)
    }
}

/// Partitions `disassembly` into function line ranges keyed by address and
/// demangled label, distinguishing real functions from compiler-generated
/// local labels.
pub fn partition(disassembly: &str) -> Partition {
    let lines: Vec<&str> = disassembly.lines().collect();
    let mut functions: Vec<Function> = Vec::new();
    let mut runtime: Vec<bool> = Vec::new();
    let mut current: Option<(usize, usize, u32, String)> = None; // (idx, start_line, addr, label)

    for (i, line) in lines.iter().enumerate() {
        if let Some((addr, label)) = parse_function_header(line) {
            if is_local_label(&label) {
                // Absorbed into the enclosing function; not a boundary.
                continue;
            }
            if let Some((_, start, caddr, clabel)) = current.take() {
                functions.push(Function {
                    base_name: normalize_base_name(&clabel),
                    label: clabel.clone(),
                    byte_address: caddr,
                    line_range: start..i,
                    local_frame: None,
                });
                runtime.push(is_runtime_symbol(&clabel));
            }
            current = Some((functions.len(), i, addr, label));
        }
    }

    if let Some((_, start, caddr, clabel)) = current.take() {
        functions.push(Function {
            base_name: normalize_base_name(&clabel),
            label: clabel.clone(),
            byte_address: caddr,
            line_range: start..lines.len(),
            local_frame: None,
        });
        runtime.push(is_runtime_symbol(&clabel));
    }

    Partition { functions, runtime }
}
