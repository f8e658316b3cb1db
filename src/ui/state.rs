use std::path::PathBuf;

use glam::Vec3;

use crate::stamp::Options;

/// What the status line shows about the displayed mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshInfo {
    pub triangles: usize,
    pub size: Vec3,
}

pub struct UiState {
    /// Edited copy of the controller's options; changes are reported as a
    /// whole new value.
    pub options: Options,
    pub path_input: String,

    pub source_name: Option<String>,
    pub reading: bool,
    pub export_enabled: bool,
    pub export_dir: PathBuf,
    pub last_export: Option<PathBuf>,
    pub mesh_info: Option<MeshInfo>,
    pub last_error: Option<String>,

    pub show_help: bool,
}

impl UiState {
    pub fn new(options: Options, export_dir: PathBuf) -> Self {
        Self {
            options,
            path_input: String::new(),

            source_name: None,
            reading: false,
            export_enabled: false,
            export_dir,
            last_export: None,
            mesh_info: None,
            last_error: None,

            show_help: true,
        }
    }

    pub fn report_error(&mut self, error: impl ToString) {
        self.last_error = Some(error.to_string());
    }
}
