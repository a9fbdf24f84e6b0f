use thiserror::Error;

/// The error type used by the analysis pipeline.
///
/// Only the fatal kinds from the error taxonomy appear here; non-fatal
/// findings (`AddressUnresolved`, `IndirectCallUnresolved`,
/// `RecursionPatternUnknown`, `StackPointerDirectWrite`) are accumulated on
/// [`crate::model::Findings`] instead of aborting the pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnalysisError {
    #[error("required toolchain component is not available: {0}")]
    ToolchainAbsent(String),

    #[error("compilation failed: {stderr}")]
    CompilationFailure { stderr: String },

    #[error("no frame information (compiler-reported or assembly-derived) for function `{0}`")]
    FrameReportMissing(String),

    #[error("could not determine initial recursion argument for function `{0}`")]
    RecursionDepthUnknown(String),

    #[error("entry symbol `{0}` not found in disassembly")]
    EntryNotFound(String),

    #[error("malformed disassembly: {0}")]
    MalformedDisassembly(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
