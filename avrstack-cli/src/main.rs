mod cli;
mod reporter;
mod toolchain;

use clap::Parser;

use avrstack_core::pipeline::{Pipeline, DEFAULT_SAFETY_MULTIPLIER};
use toolchain::ProcessToolchain;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opt = cli::Opt::parse();

    if let Err(err) = run(&opt) {
        eprintln!("avrstack: {err}");
        std::process::exit(1);
    }
}

fn run(opt: &cli::Opt) -> Result<(), Box<dyn std::error::Error>> {
    let toolchain = ProcessToolchain::new()?;
    let pipeline = Pipeline::new(&toolchain);

    let safety_multiplier = if opt.safety_multiplier > 0.0 {
        opt.safety_multiplier
    } else {
        DEFAULT_SAFETY_MULTIPLIER
    };

    let report = pipeline.run(
        &opt.source,
        &opt.mcu,
        &opt.optimization_level,
        &opt.extra_flags,
        safety_multiplier,
    )?;

    if let Some(dot_path) = &opt.call_graph {
        reporter::write_call_graph_dot(&report, dot_path)?;
    }

    println!("{}", reporter::render(&report, opt.format));

    Ok(())
}
