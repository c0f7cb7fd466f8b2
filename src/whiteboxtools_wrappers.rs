use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use error_stack::{Report, ResultExt};

use crate::error::ToolkitError;

pub type ToolkitResult<T> = Result<T, Report<ToolkitError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlopeUnits {
    Degrees,
    Percent,
}

impl SlopeUnits {
    fn as_arg(&self) -> &'static str {
        match self {
            SlopeUnits::Degrees => "degrees",
            SlopeUnits::Percent => "percent",
        }
    }
}

/// Thin wrapper over the `whitebox_tools` command line.
#[derive(Debug, Clone)]
pub struct WhiteboxTools {
    exe: PathBuf,
    verbose: bool,
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf()
}

impl WhiteboxTools {
    pub fn new<P: Into<PathBuf>>(exe: P) -> Self {
        Self { exe: exe.into(), verbose: false }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn exe(&self) -> &Path {
        &self.exe
    }

    fn exec(&self, args: &[String]) -> ToolkitResult<Output> {
        Command::new(&self.exe)
            .args(args)
            .output()
            .change_context_lazy(|| ToolkitError::Launch {
                exe: self.exe.display().to_string(),
            })
    }

    /// Runs one tool with the working directory set to the output's folder.
    fn run_tool(&self, tool: &str, output: &Path, args: Vec<String>) -> ToolkitResult<()> {
        let mut full_args = vec![
            format!("-r={}", tool),
            format!("--wd={}", parent_dir(output).to_string_lossy()),
        ];
        if self.verbose {
            full_args.push("-v".to_string());
        }
        full_args.extend(args);

        log::info!("whitebox_tools {}", full_args.join(" "));
        let result = self.exec(&full_args)?;

        if result.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
        log::error!("{} failed: {}", tool, stderr);
        match result.status.code() {
            Some(code) => Err(Report::new(ToolkitError::Failed {
                tool: tool.to_string(),
                code,
                stderr,
            })),
            None => Err(Report::new(ToolkitError::Terminated { tool: tool.to_string() })),
        }
    }

    pub fn slope(&self, dem_fn: &Path, slope_fn: &Path, units: SlopeUnits) -> ToolkitResult<()> {
        self.run_tool(
            "Slope",
            slope_fn,
            vec![
                format!("-i={}", dem_fn.to_string_lossy()),
                format!("-o={}", slope_fn.to_string_lossy()),
                format!("--units={}", units.as_arg()),
            ],
        )
    }

    pub fn aspect(&self, dem_fn: &Path, aspect_fn: &Path) -> ToolkitResult<()> {
        self.run_tool(
            "Aspect",
            aspect_fn,
            vec![
                format!("-i={}", dem_fn.to_string_lossy()),
                format!("-o={}", aspect_fn.to_string_lossy()),
            ],
        )
    }

    /// ESRI-style D8 pointer grid.
    pub fn d8_pointer(&self, dem_fn: &Path, flow_dir_fn: &Path) -> ToolkitResult<()> {
        self.run_tool(
            "D8Pointer",
            flow_dir_fn,
            vec![
                format!("-i={}", dem_fn.to_string_lossy()),
                format!("-o={}", flow_dir_fn.to_string_lossy()),
            ],
        )
    }

    /// D8 accumulation in upslope cells, computed directly from the DEM.
    pub fn d8_flow_accumulation(&self, dem_fn: &Path, flow_acc_fn: &Path) -> ToolkitResult<()> {
        self.run_tool(
            "D8FlowAccumulation",
            flow_acc_fn,
            vec![
                format!("-i={}", dem_fn.to_string_lossy()),
                format!("-o={}", flow_acc_fn.to_string_lossy()),
                "--out_type=cells".to_string(),
            ],
        )
    }

    pub fn version(&self) -> ToolkitResult<String> {
        let output = self.exec(&["--version".to_string()])?;
        let text = String::from_utf8_lossy(&output.stdout);
        text.lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                Report::new(ToolkitError::Output {
                    exe: self.exe.display().to_string(),
                })
            })
    }

    /// Tool names reported by `--listtools`.
    pub fn list_tools(&self) -> ToolkitResult<Vec<String>> {
        let output = self.exec(&["--listtools".to_string()])?;
        Ok(parse_tool_list(&String::from_utf8_lossy(&output.stdout)))
    }

    pub fn missing_tools(&self, required: &[&str]) -> ToolkitResult<Vec<String>> {
        let available = self.list_tools()?;
        Ok(required
            .iter()
            .filter(|t| !available.iter().any(|a| a == *t))
            .map(|t| t.to_string())
            .collect())
    }
}

/// Lines look like `Slope: Calculates a slope raster ...`; the header line
/// (`All 500 Tools:`) has spaces before its colon and is skipped.
fn parse_tool_list(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(name, _)| name.trim())
        .filter(|name| !name.is_empty() && !name.contains(char::is_whitespace))
        .map(str::to_string)
        .collect()
}
