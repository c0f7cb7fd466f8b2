use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_PROJECT_NAME: &str = "unnamed_project";

/// Keeps alphanumerics, `-` and `_`.
pub fn sanitize_project_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Creates `dir` (and parents) if needed and returns its absolute form.
pub fn ensure_output_directory(dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    dir.canonicalize()
}

/// Output naming for one project: `<dir>/<sanitized name>_<suffix>.<ext>`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectFiles {
    dir: PathBuf,
    stem: String,
}

impl ProjectFiles {
    pub fn prepare(output_dir: &Path, project_name: &str) -> io::Result<Self> {
        Ok(Self {
            dir: ensure_output_directory(output_dir)?,
            stem: sanitize_project_name(project_name),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn raster(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.tif", self.stem, suffix))
    }

    pub fn geojson(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.geojson", self.stem, suffix))
    }
}
