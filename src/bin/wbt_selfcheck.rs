extern crate clap;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use landsight::config::DEFAULT_WHITEBOX_EXE;
use landsight::diagnostics::{environment_summary, run_self_check};
use landsight::error::error_chain;
use landsight::whiteboxtools_wrappers::WhiteboxTools;

#[derive(Parser)]
#[clap(version, about = "Checks that WhiteboxTools can derive slope and aspect")]
struct Opts {
    /// WhiteboxTools executable
    #[clap(long, env = "WHITEBOX_EXE", default_value = DEFAULT_WHITEBOX_EXE)]
    whitebox_exe: PathBuf,

    /// Scratch directory for the synthetic DEM
    #[clap(long)]
    work_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts: Opts = Opts::parse();
    let work_dir = opts
        .work_dir
        .unwrap_or_else(|| std::env::temp_dir().join("landsight_selfcheck"));

    for (var, value) in environment_summary() {
        println!("{}: {}", var, value.as_deref().unwrap_or("not set"));
    }

    let wbt = WhiteboxTools::new(opts.whitebox_exe);
    match run_self_check(&wbt, &work_dir) {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
            println!("WhiteboxTools is ready");
            ExitCode::SUCCESS
        }
        Err(report) => {
            eprintln!("self-check failed: {}", error_chain(&report));
            ExitCode::FAILURE
        }
    }
}
