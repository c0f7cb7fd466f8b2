extern crate clap;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use error_stack::{Report, ResultExt};
use rayon::ThreadPoolBuilder;

use landsight::analysis::AnalysisContext;
use landsight::config::{self, Config};
use landsight::error::AnalysisError;
use landsight::server::router;

#[derive(Parser)]
#[clap(version, about = "Land analysis HTTP service")]
struct Opts {
    /// Address to listen on
    #[clap(short, long, default_value = "127.0.0.1:5000")]
    bind: String,

    /// Number of CPU threads for raster statistics
    #[clap(short, long, default_value = "4")]
    ncpu: usize,

    /// Directory for per-request outputs
    #[clap(long, default_value = config::DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// WhiteboxTools executable
    #[clap(long, env = "WHITEBOX_EXE", default_value = config::DEFAULT_WHITEBOX_EXE)]
    whitebox_exe: PathBuf,

    /// Pass -v to WhiteboxTools
    #[clap(long, default_value = "false")]
    whitebox_verbose: bool,

    #[clap(long, env = "OPENTOPO_API_KEY", hide_env_values = true)]
    opentopo_api_key: Option<String>,

    /// OpenTopography global DEM product
    #[clap(long, default_value = config::DEFAULT_DEM_TYPE)]
    dem_type: String,

    #[clap(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,

    #[clap(long, default_value = config::GEMINI_MODEL)]
    gemini_model: String,
}

impl Opts {
    fn into_config(self) -> Config {
        Config {
            output_dir: self.output_dir,
            whitebox_exe: self.whitebox_exe,
            whitebox_verbose: self.whitebox_verbose,
            opentopo_api_key: self.opentopo_api_key.filter(|k| !k.is_empty()),
            dem_type: self.dem_type,
            gemini_api_key: self.gemini_api_key.filter(|k| !k.is_empty()),
            gemini_model: self.gemini_model,
            ..Config::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Report<AnalysisError>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opts: Opts = Opts::parse();

    ThreadPoolBuilder::new()
        .num_threads(opts.ncpu)
        .build_global()
        .change_context(AnalysisError::Startup)?;

    let bind = opts.bind.clone();
    let config = opts.into_config();
    config.log_summary();

    let ctx = Arc::new(AnalysisContext::new(config)?);
    let app = router(ctx);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .change_context(AnalysisError::Startup)
        .attach_printable_lazy(|| format!("bind address: {}", bind))?;
    log::info!("listening on {}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("shutting down");
        })
        .await
        .change_context(AnalysisError::Startup)
}
