use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::export::DEFAULT_LINE_LENGTH_M;

/// Top-level configuration for photo-geotag.
///
/// Controls the direction line length, which exports are produced and where
/// they are written.
///
/// # Loading
///
/// ```rust,no_run
/// use photo_geotag::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.export.line_length = 100.0;
/// config.export.write_shapefile = false;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Export settings (line length, output file names).
    pub export: ExportConfig,
    /// Output behavior (directory, JSON summary).
    pub output: OutputConfig,
}

/// Which exports to produce and how.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Length of the camera direction line, in meters. Must be positive.
    pub line_length: f64,
    /// Write the KML document.
    pub write_kml: bool,
    /// Write the zipped shapefile set.
    pub write_shapefile: bool,
    /// File name of the KML document inside the output directory.
    pub kml_file: String,
    /// File name of the shapefile archive inside the output directory.
    pub shapefile_file: String,
}

/// Output and behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory the exports are written to.
    pub output_dir: PathBuf,
    /// If `true`, print a JSON summary of every processed photo.
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            export: ExportConfig {
                line_length: DEFAULT_LINE_LENGTH_M,
                write_kml: true,
                write_shapefile: true,
                kml_file: "Photo_Locations.kml".to_string(),
                shapefile_file: "Photo_Locations.zip".to_string(),
            },
            output: OutputConfig {
                output_dir: PathBuf::from("."),
                json: false,
            },
        }
    }
}

impl Config {
    /// Resolve the config file path — same directory as the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Reject settings the exporters cannot work with.
    pub fn validate(&self) -> Result<()> {
        let length = self.export.line_length;
        if !length.is_finite() || length <= 0.0 {
            anyhow::bail!("line_length must be a positive number of meters, got {length}");
        }
        Ok(())
    }

    pub fn kml_path(&self) -> PathBuf {
        self.output.output_dir.join(&self.export.kml_file)
    }

    pub fn shapefile_path(&self) -> PathBuf {
        self.output.output_dir.join(&self.export.shapefile_file)
    }
}
