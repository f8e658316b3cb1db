use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{StampError, StampResult};
use crate::stamp::{CommandGenerator, Options};

#[derive(Parser, Debug)]
#[command(name = "stamp-maker")]
#[command(about = "Turn an image into a printable stamp mesh")]
pub struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Converter executable; overrides the config file
    #[arg(long)]
    pub converter: Option<PathBuf>,

    /// Directory exported meshes are written to
    #[arg(short, long)]
    pub export_dir: Option<PathBuf>,

    /// Image to open at start-up
    pub image: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    pub program: PathBuf,
    /// Passed before the option flags.
    pub args: Vec<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("stamp-converter"),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Stamp Maker".to_string(),
            width: 1280,
            height: 800,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StampConfig {
    pub converter: ConverterConfig,
    pub export_dir: PathBuf,
    pub window: WindowConfig,
    pub defaults: Options,
}

impl Default for StampConfig {
    fn default() -> Self {
        Self {
            converter: ConverterConfig::default(),
            export_dir: PathBuf::from("."),
            window: WindowConfig::default(),
            defaults: Options::default(),
        }
    }
}

impl StampConfig {
    pub fn load(path: &Path) -> StampResult<Self> {
        let text = fs::read_to_string(path)?;
        let config = serde_json::from_str(&text).map_err(|source| StampError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Config file if given, then command-line overrides on top.
    pub fn from_cli(cli: &Cli) -> StampResult<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(program) = &cli.converter {
            config.converter.program = program.clone();
        }
        if let Some(dir) = &cli.export_dir {
            config.export_dir = dir.clone();
        }

        config.defaults.validate()?;
        Ok(config)
    }

    pub fn generator(&self) -> CommandGenerator {
        CommandGenerator::new(self.converter.program.clone(), self.converter.args.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: StampConfig =
            serde_json::from_str(r#"{ "defaults": { "height_mm": 6.0 } }"#).unwrap();

        assert_eq!(config.converter, ConverterConfig::default());
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.defaults.height_mm, 6.0);
        assert!(config.defaults.invert);
        assert_eq!(config.defaults.max_edge_mm, 40.0);
    }

    #[test]
    fn loads_file_and_applies_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stamp.json");
        let mut file = fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{ "converter": {{ "program": "convert-a", "args": ["--fast"] }}, "export_dir": "out" }}"#
        )
        .unwrap();

        let cli = Cli::parse_from([
            "stamp-maker",
            "--config",
            path.to_str().unwrap(),
            "--converter",
            "convert-b",
            "photo.png",
        ]);
        let config = StampConfig::from_cli(&cli).unwrap();

        assert_eq!(config.converter.program, PathBuf::from("convert-b"));
        assert_eq!(config.converter.args, vec!["--fast".to_string()]);
        assert_eq!(config.export_dir, PathBuf::from("out"));
        assert_eq!(cli.image, Some(PathBuf::from("photo.png")));
        assert_eq!(config.generator().program(), Path::new("convert-b"));
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        match StampConfig::load(&path) {
            Err(StampError::Config { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn invalid_default_options_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stamp.json");
        fs::write(&path, r#"{ "defaults": { "max_edge_mm": -1.0 } }"#).unwrap();

        let cli = Cli::parse_from(["stamp-maker", "-c", path.to_str().unwrap()]);
        assert!(matches!(
            StampConfig::from_cli(&cli),
            Err(StampError::InvalidOptions { .. })
        ));
    }
}
