//! Derives an observed per-function frame cost from register-save
//! operations, frame-pointer adjustments, and call instructions, then
//! reconciles it against the compiler-reported value.

use crate::error::{AnalysisError, Result};
use crate::instruction::{is_stack_pointer_io, parse_instruction_line};
use crate::model::{Finding, Findings, Instruction};

/// Raw counts gathered from one function's instruction lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameAnalysis {
    pub push_count: u32,
    pub pop_count: u32,
    pub frame_down: u32,
    pub frame_up: u32,
    pub call_count: u32,
    pub rel_call_count: u32,
    pub icall_count: u32,
    pub sp_direct_io: bool,
}

impl FrameAnalysis {
    /// `local_frame = push_count + frame_down + 2`, where the `+2`
    /// accounts for the return address the caller's call instruction
    /// pushes.
    pub fn observed_frame(&self) -> u32 {
        self.push_count + self.frame_down + 2
    }

    /// A Y-frame is present whenever any `sbiw`/`adiw` against r28 was
    /// seen; direct SP manipulation without one is surfaced as a warning,
    /// since the PUSH-plus-frame sum may then understate the real frame.
    pub fn has_y_frame(&self) -> bool {
        self.frame_down > 0 || self.frame_up > 0
    }
}

/// Scans `lines` (one function's disassembly text) and counts the forms
/// that materially affect frame cost.
pub fn analyze_function(lines: &[&str]) -> FrameAnalysis {
    let mut analysis = FrameAnalysis::default();

    for line in lines {
        if is_stack_pointer_io(line) {
            analysis.sp_direct_io = true;
        }

        let Some(parsed) = parse_instruction_line(line) else {
            continue;
        };

        match parsed.instruction {
            Instruction::Push => analysis.push_count += 1,
            Instruction::Pop => analysis.pop_count += 1,
            Instruction::FrameSub { n } => analysis.frame_down += n,
            Instruction::FrameAdd { n } => analysis.frame_up += n,
            Instruction::DirectCall { .. } => analysis.call_count += 1,
            Instruction::RelativeCall { offset: 0 } => {
                // Known 2-byte stack-reservation idiom; not a call.
                analysis.frame_down += 2;
            }
            Instruction::RelativeCall { .. } => analysis.rel_call_count += 1,
            Instruction::IndirectCall => analysis.icall_count += 1,
            _ => {}
        }
    }

    analysis
}

/// Reconciles the observed frame with the compiler-reported one, taking
/// the maximum. Fails if neither value is available.
pub fn reconcile(
    function_name: &str,
    observed: Option<u32>,
    reported: Option<u32>,
    findings: &mut Findings,
    sp_direct_io_without_y_frame: bool,
) -> Result<u32> {
    if sp_direct_io_without_y_frame {
        findings.push(Finding::StackPointerDirectWrite {
            function: function_name.to_string(),
        });
    }

    match (observed, reported) {
        (Some(o), Some(r)) => Ok(o.max(r)),
        (Some(o), None) => Ok(o),
        (None, Some(r)) => Ok(r),
        (None, None) => Err(AnalysisError::FrameReportMissing(function_name.to_string())),
    }
}
