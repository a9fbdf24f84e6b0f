//! Renders an [`AnalysisReport`] as text or JSON, and optionally writes the
//! call graph as a Graphviz DOT file.

use std::io::Write;
use std::path::Path;

use avrstack_core::pipeline::AnalysisReport;
use serde::Serialize;

use crate::cli::ReportFormat;

pub fn render(report: &AnalysisReport, format: ReportFormat) -> String {
    match format {
        ReportFormat::Text => render_text(report),
        ReportFormat::Json => render_json(report),
    }
}

fn render_text(report: &AnalysisReport) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "raw worst-case stack depth:      {} bytes\n",
        report.raw_max
    ));
    out.push_str(&format!(
        "reported worst-case (x{:.2}):     {} bytes\n",
        report.safety_multiplier, report.reported_max
    ));

    let ram_size = report.mcu.ram_size as i64;
    let headroom = ram_size - report.reported_max as i64 - report.data_bss_bytes as i64;
    let percentage = if ram_size > 0 {
        (report.reported_max + report.data_bss_bytes) as f64 / ram_size as f64 * 100.0
    } else {
        0.0
    };

    out.push_str(&format!(
        "static .data+.bss usage:          {} bytes\n",
        report.data_bss_bytes
    ));
    out.push_str(&format!(
        "available stack headroom:         {headroom} bytes ({percentage:.1}% of {ram_size} byte RAM used)\n"
    ));
    if report.mcu_fell_back_to_default {
        out.push_str("note: unrecognized MCU type, RAM figures use the default table entry\n");
    }

    out.push('\n');
    out.push_str("per-function frame sizes (largest first):\n");
    let mut frames: Vec<(&String, &u32)> = report.local_frames.iter().collect();
    frames.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (name, frame) in frames {
        out.push_str(&format!("  {name:<32} {frame:>6} bytes\n"));
    }

    if !report.recursion_info.is_empty() {
        out.push('\n');
        out.push_str("recursive functions:\n");
        let mut names: Vec<&String> = report.recursion_info.keys().collect();
        names.sort();
        for name in names {
            let info = &report.recursion_info[name];
            out.push_str(&format!(
                "  {name:<32} depth {:>3}  reduction {:?}  initial {}\n",
                info.depth, info.reduction, info.initial_value
            ));
        }
    }

    if !report.findings.is_empty() {
        out.push('\n');
        out.push_str("findings:\n");
        for finding in &report.findings.0 {
            out.push_str(&format!("  {finding:?}\n"));
        }
    }

    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    raw_max: u64,
    reported_max: u64,
    safety_multiplier: f64,
    data_bss_bytes: u64,
    mcu: &'a avrstack_core::mcu::McuProperties,
    mcu_fell_back_to_default: bool,
    local_frames: &'a std::collections::HashMap<String, u32>,
    recursion_info: &'a std::collections::HashMap<String, avrstack_core::RecursionInfo>,
    paths: &'a [avrstack_core::PathResult],
    findings: &'a [avrstack_core::Finding],
}

fn render_json(report: &AnalysisReport) -> String {
    let json = JsonReport {
        raw_max: report.raw_max,
        reported_max: report.reported_max,
        safety_multiplier: report.safety_multiplier,
        data_bss_bytes: report.data_bss_bytes,
        mcu: &report.mcu,
        mcu_fell_back_to_default: report.mcu_fell_back_to_default,
        local_frames: &report.local_frames,
        recursion_info: &report.recursion_info,
        paths: &report.paths,
        findings: &report.findings.0,
    };
    serde_json::to_string_pretty(&json).expect("report serializes to JSON")
}

/// Writes the call graph as a Graphviz DOT file, emitted only on request
/// via `--call-graph` rather than automatically whenever recursion is
/// found.
pub fn write_call_graph_dot(report: &AnalysisReport, path: &Path) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    writeln!(file, "digraph call_graph {{")?;
    for node in report.call_graph.nodes() {
        let shape = if report.recursion_info.contains_key(node) {
            "doublecircle"
        } else {
            "box"
        };
        writeln!(file, "  \"{node}\" [shape={shape}];")?;
    }
    for node in report.call_graph.nodes() {
        for successor in report.call_graph.successors(node) {
            writeln!(file, "  \"{node}\" -> \"{successor}\";")?;
        }
    }
    writeln!(file, "}}")?;
    Ok(())
}
