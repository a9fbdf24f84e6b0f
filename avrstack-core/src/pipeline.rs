//! The top-level pipeline: sequences every stage from a
//! compiled-and-disassembled program down to a proven worst-case stack
//! path. One orchestrating entry point, [`Pipeline::run`], calling into
//! well-separated modules rather than a God object.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::address_resolver::AddressResolver;
use crate::call_graph::CallGraphBuilder;
use crate::depth;
use crate::error::{AnalysisError, Result};
use crate::frame_analyzer::{analyze_function, reconcile};
use crate::frame_report::{parse_frame_report, FrameReport};
use crate::mcu::{self, McuProperties};
use crate::model::{CallGraph, Findings, PathResult, RecursionInfo};
use crate::partitioner::{self, Partition};
use crate::path_search;
use crate::recursion;
use crate::toolchain::Toolchain;

/// The traversal root: every analysis starts from the function symbol
/// `main`.
pub const ENTRY_SYMBOL: &str = "main";

/// The reported worst case is `raw_max * safety_multiplier`; this is the
/// default margin applied when the caller doesn't override it.
pub const DEFAULT_SAFETY_MULTIPLIER: f64 = 1.10;

/// The final structure handed to the reporter: max, raw_max, per-function
/// frames, call graph, recursion info, and every discovered path, plus the
/// non-fatal findings accumulated along the way.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub raw_max: u64,
    pub reported_max: u64,
    pub safety_multiplier: f64,
    pub local_frames: HashMap<String, u32>,
    pub call_graph: CallGraph,
    pub recursion_info: HashMap<String, RecursionInfo>,
    pub paths: Vec<PathResult>,
    pub findings: Findings,
    pub data_bss_bytes: u64,
    pub mcu: McuProperties,
    pub mcu_fell_back_to_default: bool,
}

/// Drives the full pipeline against a [`Toolchain`] collaborator.
pub struct Pipeline<'a> {
    toolchain: &'a dyn Toolchain,
}

impl<'a> Pipeline<'a> {
    pub fn new(toolchain: &'a dyn Toolchain) -> Self {
        Pipeline { toolchain }
    }

    /// Runs every pipeline stage in sequence, single-threaded, with no
    /// stage concurrent with another.
    pub fn run(
        &self,
        source: &Path,
        target: &str,
        optimization_level: &str,
        extra_flags: &[String],
        safety_multiplier: f64,
    ) -> Result<AnalysisReport> {
        let mut findings = Findings::new();

        info!(mcu = target, "compiling with frame reporting enabled");
        let compiled = self
            .toolchain
            .compile(source, target, optimization_level, extra_flags)?;

        debug!("disassembling compiled executable");
        let disassembly = self.toolchain.disassemble(&compiled.executable)?;

        debug!("reading .data/.bss section sizes");
        let sizes = self.toolchain.size_sections(&compiled.executable)?;
        let data_bss_bytes = sizes.get(".data") + sizes.get(".bss");

        let (mcu_props, mcu_fell_back_to_default) = mcu::ram_properties(target);
        if mcu_fell_back_to_default {
            warn!(mcu = target, "unrecognized MCU type, using default RAM table entry");
        }

        let frame_report = parse_frame_report(&compiled.frame_report, &mut findings);
        let partition = partitioner::partition(&disassembly);
        let resolver = AddressResolver::build(&partition.functions);
        let local_frames = reconcile_frames(&disassembly, &partition, &frame_report, &mut findings)?;

        // Source text backs optional textual fallback heuristics (call
        // graph indirect-target hints, recursion cross-check, depth
        // estimation); its absence degrades those gracefully rather than
        // failing the pipeline.
        let source_text = std::fs::read_to_string(source).ok();
        if source_text.is_none() {
            warn!(path = %source.display(), "source text unavailable; textual fallbacks disabled");
        }

        let call_graph = CallGraphBuilder::new(
            &disassembly,
            &resolver,
            &frame_report,
            &partition,
            source_text.as_deref(),
            ENTRY_SYMBOL,
        )
        .build(&mut findings);

        if !call_graph.contains_node(ENTRY_SYMBOL) {
            return Err(AnalysisError::EntryNotFound(ENTRY_SYMBOL.to_string()));
        }

        let recursive = recursion::detect_recursive_functions(&call_graph, source_text.as_deref());

        let known_functions: Vec<String> = partition
            .functions
            .iter()
            .enumerate()
            .filter(|(idx, _)| !partition.is_runtime(*idx))
            .map(|(_, f)| f.base_name.clone())
            .collect();

        let recursion_info = if recursive.is_empty() {
            HashMap::new()
        } else {
            let recursive_names: Vec<String> = recursive.iter().cloned().collect();
            let source = source_text.as_deref().unwrap_or("");
            depth::estimate_depths(source, &recursive_names, &known_functions, &mut findings)?
        };

        let search_result = path_search::search_paths(
            &call_graph,
            &local_frames,
            &recursive,
            &recursion_info,
            ENTRY_SYMBOL,
        );

        let reported_max = (search_result.raw_max as f64 * safety_multiplier).ceil() as u64;

        info!(
            raw_max = search_result.raw_max,
            reported_max, "analysis complete"
        );

        Ok(AnalysisReport {
            raw_max: search_result.raw_max,
            reported_max,
            safety_multiplier,
            local_frames,
            call_graph,
            recursion_info,
            paths: search_result.paths,
            findings,
            data_bss_bytes,
            mcu: mcu_props,
            mcu_fell_back_to_default,
        })
    }
}

fn reconcile_frames(
    disassembly: &str,
    partition: &Partition,
    frame_report: &FrameReport,
    findings: &mut Findings,
) -> Result<HashMap<String, u32>> {
    let lines: Vec<&str> = disassembly.lines().collect();
    let mut local_frames = HashMap::new();

    for (idx, function) in partition.functions.iter().enumerate() {
        if partition.is_runtime(idx) {
            continue;
        }
        let function_lines = &lines[function.line_range.clone()];
        let analysis = analyze_function(function_lines);
        let sp_warn = analysis.sp_direct_io && !analysis.has_y_frame();
        let frame = reconcile(
            &function.base_name,
            Some(analysis.observed_frame()),
            frame_report.get(&function.base_name),
            findings,
            sp_warn,
        )?;
        local_frames.insert(function.base_name.clone(), frame);
    }

    Ok(local_frames)
}
