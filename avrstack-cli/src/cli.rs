use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "avrstack",
    version,
    about = "Worst-case stack-depth analyzer for AVR C programs.",
    long_about = r#"
avrstack compiles an AVR C program, disassembles it, and proves a worst-case
call path through the program's functions, accounting for register pushes,
frame-pointer adjustments, and (bounded) recursion.

EXAMPLES:
    # Analyze a program for the default MCU (atmega328p):
    avrstack blink.c

    # Analyze for a specific MCU and emit a JSON report:
    avrstack --mcu atmega2560 --format json blink.c

    # Also write the call graph as a Graphviz DOT file:
    avrstack --call-graph blink.dot blink.c
"#
)]
pub struct Opt {
    /// Path to the C source file to analyze.
    pub source: PathBuf,

    /// Target MCU identifier (drives the RAM-size table used for the
    /// headroom/percentage figures in the report).
    #[arg(long, default_value = "atmega328p")]
    pub mcu: String,

    /// Optimization level passed to the compiler (e.g. -O0, -O1, -Os).
    #[arg(long, default_value = "-Os")]
    pub optimization_level: String,

    /// Extra flags forwarded verbatim to the compiler.
    #[arg(long = "cflag")]
    pub extra_flags: Vec<String>,

    /// Safety multiplier applied to the raw worst-case depth.
    #[arg(long, default_value_t = 1.10)]
    pub safety_multiplier: f64,

    /// Report output format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// If set, also write the call graph as a Graphviz DOT file here.
    #[arg(long)]
    pub call_graph: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}
