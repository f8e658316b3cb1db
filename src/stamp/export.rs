use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{StampError, StampResult};

pub const MESH_EXTENSION: &str = "obj";

/// Output name for a source file: the final `.<word chars>` suffix is
/// dropped and the mesh extension appended.
pub fn output_file_name(source: &str) -> String {
    let base = match source.rfind('.') {
        Some(dot) => {
            let ext = &source[dot + 1..];
            if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                &source[..dot]
            } else {
                source
            }
        }
        None => source,
    };
    format!("{}.{}", base, MESH_EXTENSION)
}

/// Writes generated meshes into a target directory.
pub struct Exporter {
    dir: PathBuf,
}

impl Exporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn check_available(&self) -> StampResult<()> {
        if self.dir.is_dir() {
            Ok(())
        } else {
            Err(StampError::ExportUnavailable {
                dir: self.dir.clone(),
            })
        }
    }

    pub fn export(&self, source_name: &str, mesh_text: &str) -> StampResult<PathBuf> {
        self.check_available()?;

        let path = self.dir.join(output_file_name(source_name));
        fs::write(&path, mesh_text)?;
        info!(path = %path.display(), bytes = mesh_text.len(), "exported mesh");
        Ok(path)
    }
}
