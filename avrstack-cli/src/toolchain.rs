//! `ProcessToolchain`: the real `avr-gcc`/`avr-objdump`/`avr-size`-spawning
//! implementation of `avrstack_core::Toolchain`, driving each tool via
//! `std::process::Command` inside a scoped `tempfile::TempDir` workspace.

use std::path::{Path, PathBuf};
use std::process::Command;

use avrstack_core::error::{AnalysisError, Result};
use avrstack_core::toolchain::{CompileOutput, SectionSizes, Toolchain};
use tempfile::TempDir;
use tracing::{debug, warn};

/// The three external tools the pipeline requires.
const REQUIRED_TOOLS: &[&str] = &["avr-gcc", "avr-objdump", "avr-size"];

pub struct ProcessToolchain {
    _workspace: TempDir,
    workspace_path: PathBuf,
}

impl ProcessToolchain {
    /// Creates a scoped workspace directory, removed on drop regardless of
    /// success or failure, and verifies every required tool is reachable on
    /// `PATH`.
    pub fn new() -> Result<Self> {
        for tool in REQUIRED_TOOLS {
            if which::which(tool).is_err() {
                return Err(AnalysisError::ToolchainAbsent(tool.to_string()));
            }
        }

        let workspace = TempDir::new()
            .map_err(|e| AnalysisError::ToolchainAbsent(format!("could not create scratch workspace: {e}")))?;
        let workspace_path = workspace.path().to_path_buf();

        Ok(ProcessToolchain {
            _workspace: workspace,
            workspace_path,
        })
    }

    /// Searches every candidate location for the GCC-emitted `.su`
    /// stack-usage report (a sibling of the object file, not stdout): next
    /// to the source, in the current directory, and in the scratch
    /// workspace, in both the plain and `<exe>-<base>.su` naming
    /// conventions GCC has used across versions.
    fn find_stack_usage_report(&self, source: &Path, executable: &Path) -> Option<PathBuf> {
        let base_name = source.file_stem()?.to_str()?;
        let exe_name = executable.file_stem()?.to_str()?;

        let mut candidates = Vec::new();
        if let Some(source_dir) = source.parent() {
            candidates.push(source_dir.join(format!("{base_name}.su")));
            candidates.push(source_dir.join(format!("{exe_name}-{base_name}.su")));
        }
        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd.join(format!("{base_name}.su")));
            candidates.push(cwd.join(format!("{exe_name}-{base_name}.su")));
        }
        candidates.push(self.workspace_path.join(format!("{base_name}.su")));
        candidates.push(self.workspace_path.join(format!("{exe_name}-{base_name}.su")));

        candidates.into_iter().find(|p| p.is_file())
    }
}

impl Toolchain for ProcessToolchain {
    fn compile(
        &self,
        source: &Path,
        target: &str,
        optimization_level: &str,
        extra_flags: &[String],
    ) -> Result<CompileOutput> {
        let base_name = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("program");
        let executable = self.workspace_path.join(format!("{base_name}.elf"));

        debug!(?source, target, "invoking avr-gcc");
        let output = Command::new("avr-gcc")
            .arg(format!("-mmcu={target}"))
            .arg(optimization_level)
            // Disable inlining of both large and small functions so every
            // source function stays a visible disassembly symbol.
            .arg("-fno-inline-small-functions")
            .arg("-fno-inline")
            .arg("-fstack-usage")
            .args(extra_flags)
            .arg("-o")
            .arg(&executable)
            .arg(source)
            .current_dir(&self.workspace_path)
            .output()
            .map_err(|e| AnalysisError::ToolchainAbsent(format!("avr-gcc: {e}")))?;

        if !output.status.success() {
            return Err(AnalysisError::CompilationFailure {
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let frame_report = match self.find_stack_usage_report(source, &executable) {
            Some(path) => std::fs::read_to_string(&path).unwrap_or_default(),
            None => {
                warn!(?source, "no .su stack-usage report found in any candidate location");
                String::new()
            }
        };

        Ok(CompileOutput {
            executable,
            frame_report,
        })
    }

    fn disassemble(&self, executable: &Path) -> Result<String> {
        debug!(?executable, "invoking avr-objdump");
        let output = Command::new("avr-objdump")
            .arg("-d")
            .arg(executable)
            .output()
            .map_err(|e| AnalysisError::ToolchainAbsent(format!("avr-objdump: {e}")))?;

        if !output.status.success() {
            return Err(AnalysisError::CompilationFailure {
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn size_sections(&self, executable: &Path) -> Result<SectionSizes> {
        debug!(?executable, "invoking avr-size");
        let output = Command::new("avr-size")
            .arg("-A")
            .arg(executable)
            .output()
            .map_err(|e| AnalysisError::ToolchainAbsent(format!("avr-size: {e}")))?;

        if !output.status.success() {
            return Err(AnalysisError::CompilationFailure {
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(parse_size_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parses `avr-size -A` output: lines of `<section> <bytes> <hex>...`.
fn parse_size_output(text: &str) -> SectionSizes {
    let mut sizes = Vec::new();
    for line in text.lines() {
        let mut fields = line.split_whitespace();
        let Some(name) = fields.next() else { continue };
        let Some(bytes) = fields.next().and_then(|b| b.parse::<u64>().ok()) else {
            continue;
        };
        if matches!(name, ".data" | ".bss" | ".text") {
            sizes.push((name.to_string(), bytes));
        }
    }
    SectionSizes { sizes }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_data_and_bss_from_avr_size_output() {
        let text = "\
section       size      addr
.data           10        8368800
.bss            20        8368810
.text         1234               0
Total          1264
";
        let sizes = parse_size_output(text);
        assert_eq!(sizes.get(".data"), 10);
        assert_eq!(sizes.get(".bss"), 20);
    }
}
