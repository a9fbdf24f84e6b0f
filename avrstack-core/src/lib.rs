//! Static worst-case stack-depth analysis for AVR programs.
//!
//! This crate consumes a compiled AVR executable's disassembly and
//! per-function frame report (via a [`toolchain::Toolchain`] collaborator)
//! and produces a proven worst-case call path and its stack cost. It never
//! touches the filesystem or spawns a process itself; driving a real
//! toolchain is the concern of `avrstack-cli`.

pub mod address_resolver;
pub mod call_graph;
pub mod depth;
pub mod error;
pub mod frame_analyzer;
pub mod frame_report;
pub mod instruction;
pub mod mcu;
pub mod model;
pub mod partitioner;
pub mod path_search;
pub mod pipeline;
pub mod recursion;
pub mod source_utils;
pub mod toolchain;

pub use error::{AnalysisError, Result};
pub use model::{
    CallGraph, Finding, Findings, Function, Instruction, ParsedLine, PathResult, PointerHalf,
    Reduction, RecursionInfo,
};
pub use pipeline::{AnalysisReport, Pipeline};
pub use toolchain::Toolchain;
