//! End-to-end boundary scenarios, run through the public `Pipeline` API
//! against a fake `Toolchain` double. These mirror the seed cases used to
//! validate the analysis: a straight call chain, two recursion shapes
//! (linear and logarithmic), both indirect-call resolution strategies, and
//! optimizer-clone frame-report normalization.

use std::io::Write;
use std::path::Path;

use avrstack_core::error::Result;
use avrstack_core::pipeline::Pipeline;
use avrstack_core::toolchain::{CompileOutput, SectionSizes, Toolchain};
use tempfile::NamedTempFile;

struct FakeToolchain {
    disassembly: String,
    frame_report: String,
}

impl Toolchain for FakeToolchain {
    fn compile(
        &self,
        _source: &Path,
        _target: &str,
        _optimization_level: &str,
        _extra_flags: &[String],
    ) -> Result<CompileOutput> {
        Ok(CompileOutput {
            executable: std::path::PathBuf::from("fake.elf"),
            frame_report: self.frame_report.clone(),
        })
    }

    fn disassemble(&self, _executable: &Path) -> Result<String> {
        Ok(self.disassembly.clone())
    }

    fn size_sections(&self, _executable: &Path) -> Result<SectionSizes> {
        Ok(SectionSizes { sizes: vec![] })
    }
}

/// Writes `content` to a scratch file and returns the handle. Scenarios that
/// involve recursion need a real file on disk because the pipeline reads
/// source text directly for the textual fallback heuristics (depth
/// estimation, recursion cross-check). The file is removed when the
/// `NamedTempFile` is dropped.
fn scratch_source(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".c")
        .tempfile()
        .expect("create scratch source file");
    file.write_all(content.as_bytes())
        .expect("write scratch source file");
    file
}

fn run(disasm: &str, frame_report: &str, source_path: &Path) -> avrstack_core::pipeline::AnalysisReport {
    let toolchain = FakeToolchain {
        disassembly: disasm.to_string(),
        frame_report: frame_report.to_string(),
    };
    let pipeline = Pipeline::new(&toolchain);
    pipeline
        .run(source_path, "atmega328p", "-Os", &[], 1.10)
        .expect("pipeline run")
}

#[test]
fn scenario_1_straight_chain() {
    let disasm = "\
00000050 <main>:
  50:\t1f 93       \tpush\tr16
  52:\t1f 93       \tpush\tr17
  54:\t0e 94 2c 00 \tcall\t0x58\t; 0x58 <a>
  58:\t08 95       \tret

00000058 <a>:
  58:\t1f 93       \tpush\tr16
  5a:\t1f 93       \tpush\tr17
  5c:\t0e 94 32 00 \tcall\t0x64\t; 0x64 <b>
  5e:\t08 95       \tret

00000064 <b>:
  64:\t1f 93       \tpush\tr16
  66:\t1f 93       \tpush\tr17
  68:\t0e 94 38 00 \tcall\t0x70\t; 0x70 <c>
  6a:\t08 95       \tret

00000070 <c>:
  70:\t1f 93       \tpush\tr16
  72:\t1f 93       \tpush\tr17
  74:\t08 95       \tret
";
    let source_file = scratch_source("int main(void) { a(); return 0; }");
    let report = run(disasm, "", source_file.path());

    assert_eq!(report.local_frames["main"], 4);
    assert_eq!(report.local_frames["a"], 4);
    assert_eq!(report.local_frames["b"], 4);
    assert_eq!(report.local_frames["c"], 4);
    assert_eq!(report.raw_max, 16);
    assert_eq!(report.reported_max, 18);

    let longest = report.paths.iter().max_by_key(|p| p.cost).unwrap();
    assert_eq!(longest.functions, vec!["main", "a", "b", "c"]);
}

#[test]
fn scenario_2_countdown_recursion() {
    let disasm = "\
00000050 <main>:
  50:\t1f 93       \tpush\tr16
  52:\t1f 93       \tpush\tr17
  54:\t0e 94 30 00 \tcall\t0x60\t; 0x60 <rec>
  58:\t08 95       \tret

00000060 <rec>:
  60:\t1f 93       \tpush\tr17
  62:\t0e 94 30 00 \tcall\t0x60\t; 0x60 <rec>
  64:\t08 95       \tret
";
    let source = "\
void rec(int n) { if (n > 0) rec(n - 1); }
int main(void) { rec(5); return 0; }
";
    let source_file = scratch_source(source);
    let report = run(disasm, "", source_file.path());

    assert_eq!(report.local_frames["main"], 4);
    assert_eq!(report.local_frames["rec"], 3);
    let rec_info = &report.recursion_info["rec"];
    assert_eq!(rec_info.initial_value, 5);
    assert_eq!(rec_info.depth, 6);
    // recursive_cost(rec) = 3 * 6 = 18; raw_max = 4 + 18 = 22.
    assert_eq!(report.raw_max, 22);
    assert_eq!(report.reported_max, 25);
}

#[test]
fn scenario_3_logarithmic_recursion() {
    let disasm = "\
00000050 <main>:
  50:\t1f 93       \tpush\tr16
  52:\t1f 93       \tpush\tr17
  54:\t0e 94 30 00 \tcall\t0x60\t; 0x60 <split>
  58:\t08 95       \tret

00000060 <split>:
  60:\t1f 93       \tpush\tr16
  62:\t1f 93       \tpush\tr17
  64:\t1f 93       \tpush\tr18
  66:\t0e 94 30 00 \tcall\t0x60\t; 0x60 <split>
  68:\t08 95       \tret
";
    let source = "\
void split(int n) { if (n > 1) split(n >> 2); }
int main(void) { split(64); return 0; }
";
    let source_file = scratch_source(source);
    let report = run(disasm, "", source_file.path());

    assert_eq!(report.local_frames["main"], 4);
    assert_eq!(report.local_frames["split"], 5);
    let info = &report.recursion_info["split"];
    assert_eq!(info.initial_value, 64);
    assert_eq!(info.depth, 4);
    // recursive_cost(split) = 5 * 4 = 20; raw_max = 4 + 20 = 24.
    assert_eq!(report.raw_max, 24);
    assert_eq!(report.reported_max, 27);
}

#[test]
fn scenario_4_indirect_call_resolved_by_immediate_load() {
    let disasm = "\
000000a4 <tgt>:
  a4:\t1f 93       \tpush\tr16
  a6:\t1f 93       \tpush\tr17
  a8:\t1f 93       \tpush\tr18
  aa:\t1f 93       \tpush\tr19
  ac:\t08 95       \tret

00000050 <main>:
  50:\t40 ea       \tldi\tr30, 0x52
  52:\t00 e0       \tldi\tr31, 0x00
  54:\t09 95       \ticall
  56:\t08 95       \tret
";
    let source_file = scratch_source("int main(void) { return 0; }");
    let report = run(disasm, "", source_file.path());

    // r30/r31 form the word address 0x0052, which only resolves to `tgt`
    // (at byte address 0x00A4) through the word-to-byte fallback (0x52 * 2).
    assert_eq!(report.local_frames["tgt"], 6);
    assert!(report.call_graph.successors("main").any(|s| s == "tgt"));
    assert_eq!(report.raw_max, report.local_frames["main"] + 6);
}

#[test]
fn scenario_5_indirect_call_via_array_dispatch() {
    let disasm = "\
00000050 <main>:
  50:\t01 90       \tld\tr16, Z+
  52:\t09 95       \ticall
  54:\t08 95       \tret

00000060 <a>:
  60:\t1f 93       \tpush\tr16
  62:\t1f 93       \tpush\tr17
  64:\t1f 93       \tpush\tr18
  66:\t08 95       \tret

00000070 <b>:
  70:\t1f 93       \tpush\tr16
  72:\t08 95       \tret

00000080 <delay_ms>:
  80:\t08 95       \tret
";
    // The array-dispatch heuristic draws its candidate set from every
    // function named in the frame report, so the report must actually
    // list the dispatch targets.
    let frame_report = "\
test.c:1:1:main\t4\tstatic
test.c:2:1:a\t6\tstatic
test.c:3:1:b\t4\tstatic
test.c:4:1:delay_ms\t2\tstatic
";
    let source_file = scratch_source("int main(void) { return 0; }");
    let report = run(disasm, frame_report, source_file.path());

    let successors: Vec<&str> = report.call_graph.successors("main").collect();
    assert!(successors.contains(&"a"));
    assert!(successors.contains(&"b"));
    assert!(!successors.contains(&"main"));
    assert!(!successors.contains(&"delay_ms"));

    // Path search should pick the heavier of the two dispatch targets.
    let heaviest = report.local_frames["a"].max(report.local_frames["b"]);
    assert_eq!(report.raw_max, report.local_frames["main"] + heaviest as u64);
}

#[test]
fn scenario_6_optimizer_suffixed_clone_normalizes_to_observed_minimum() {
    let disasm = "\
00000050 <main>:
  50:\t0e 94 2c 00 \tcall\t0x58\t; 0x58 <foo.constprop.0>
  54:\t08 95       \tret

00000058 <foo.constprop.0>:
  58:\t1f 93       \tpush\tr16
  5a:\t1f 93       \tpush\tr17
  5c:\t1f 93       \tpush\tr18
  5e:\t08 95       \tret
";
    // The raw frame report lists the un-normalized name at 7 and the
    // optimizer clone at 5; normalization must keep the minimum (5), and
    // reconciliation must not resurrect the dropped 7.
    let frame_report = "test.c:1:1:foo\t7\tstatic\ntest.c:5:1:foo.constprop.0\t5\tstatic\n";
    let source_file = scratch_source("void foo(void) {} int main(void) { foo(); return 0; }");
    let report = run(disasm, frame_report, source_file.path());

    assert_eq!(report.local_frames["foo"], 5);
}
