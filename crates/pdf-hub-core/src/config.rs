use serde::{Deserialize, Serialize};

use crate::error::{Error, OptimizeError};
use crate::pdf::OptimizeOptions;

/// Default combine ceiling in MiB
pub const DEFAULT_CEILING_MB: f64 = 200.0;
/// Download name of a merged document
pub const DEFAULT_COMBINED_FILENAME: &str = "arquivos_combinados.pdf";
/// Download name of a converted document
pub const DEFAULT_CONVERTED_FILENAME: &str = "documento_convertido.docx";
/// Default JPEG quality for recompressed images
pub const DEFAULT_IMAGE_QUALITY: u8 = 75;
/// Default target resolution for downsampled images
pub const DEFAULT_IMAGE_DPI: u32 = 150;

/// Combine (merge) workflow configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombineConfig {
    /// Maximum aggregate upload size in MiB (inclusive)
    #[serde(default = "default_ceiling_mb")]
    pub ceiling_mb: f64,

    /// Filename offered for the merged download
    #[serde(default = "default_combined_filename")]
    pub output_filename: String,
}

const fn default_ceiling_mb() -> f64 {
    DEFAULT_CEILING_MB
}

fn default_combined_filename() -> String {
    DEFAULT_COMBINED_FILENAME.to_string()
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            ceiling_mb: default_ceiling_mb(),
            output_filename: default_combined_filename(),
        }
    }
}

/// Size-reduction configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizeConfig {
    /// JPEG quality for recompressed images (10-100)
    #[serde(default = "default_image_quality")]
    pub image_quality: u8,

    /// Target resolution for downsampled images (50-300)
    #[serde(default = "default_image_dpi")]
    pub image_dpi: u32,

    /// Remove document info, XMP metadata and thumbnails
    #[serde(default = "default_true")]
    pub scrub_metadata: bool,

    /// Flate-compress uncompressed streams before saving
    #[serde(default = "default_true")]
    pub compress_streams: bool,
}

const fn default_image_quality() -> u8 {
    DEFAULT_IMAGE_QUALITY
}

const fn default_image_dpi() -> u32 {
    DEFAULT_IMAGE_DPI
}

const fn default_true() -> bool {
    true
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            image_quality: default_image_quality(),
            image_dpi: default_image_dpi(),
            scrub_metadata: true,
            compress_streams: true,
        }
    }
}

impl OptimizeConfig {
    /// Default optimizer options from this configuration.
    pub fn options(&self) -> Result<OptimizeOptions, OptimizeError> {
        OptimizeOptions::new(self.image_quality, self.image_dpi)
    }
}

/// PDF to DOCX conversion configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Filename offered for the converted download
    #[serde(default = "default_converted_filename")]
    pub output_filename: String,

    /// Insert a page break between PDF pages
    #[serde(default = "default_true")]
    pub page_breaks: bool,
}

fn default_converted_filename() -> String {
    DEFAULT_CONVERTED_FILENAME.to_string()
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            output_filename: default_converted_filename(),
            page_breaks: true,
        }
    }
}

/// Web server limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Request body limit in MiB (must leave room above the combine ceiling)
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,

    /// Sessions older than this are discarded
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

/// Largest accepted request body limit (4 GiB).
pub const MAX_UPLOAD_MB: usize = 4096;

const fn default_max_upload_mb() -> usize {
    300
}

const fn default_session_ttl_secs() -> u64 {
    3600
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_upload_mb: default_max_upload_mb(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

impl ServerConfig {
    pub const fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub combine: CombineConfig,

    #[serde(default)]
    pub optimize: OptimizeConfig,

    #[serde(default)]
    pub convert: ConvertConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::ConfigLoad(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Load from default locations (~/.config/pdf-hub/config.toml, ./config.toml)
    pub fn load() -> Self {
        // Try user config
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("pdf-hub").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // Try local config
        let local_config = std::path::PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Self::default()
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.combine.ceiling_mb.is_finite() || self.combine.ceiling_mb <= 0.0 {
            return Err(Error::ConfigInvalid {
                field: "combine.ceiling_mb".to_string(),
                reason: format!("must be a positive number, got {}", self.combine.ceiling_mb),
            });
        }

        if self.combine.output_filename.trim().is_empty() {
            return Err(Error::ConfigInvalid {
                field: "combine.output_filename".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        self.optimize.options().map_err(|e| Error::ConfigInvalid {
            field: "optimize".to_string(),
            reason: e.to_string(),
        })?;

        if !(1..=MAX_UPLOAD_MB).contains(&self.server.max_upload_mb) {
            return Err(Error::ConfigInvalid {
                field: "server.max_upload_mb".to_string(),
                reason: format!(
                    "must be between 1 and {MAX_UPLOAD_MB}, got {}",
                    self.server.max_upload_mb
                ),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!((config.combine.ceiling_mb - 200.0).abs() < f64::EPSILON);
        assert_eq!(config.combine.output_filename, "arquivos_combinados.pdf");
        assert_eq!(config.convert.output_filename, "documento_convertido.docx");
        assert_eq!(config.optimize.image_quality, 75);
        assert_eq!(config.optimize.image_dpi, 150);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [combine]
            ceiling_mb = 50.0

            [optimize]
            image_dpi = 96
            "#,
        )
        .unwrap();

        assert!((config.combine.ceiling_mb - 50.0).abs() < f64::EPSILON);
        assert_eq!(config.combine.output_filename, DEFAULT_COMBINED_FILENAME);
        assert_eq!(config.optimize.image_dpi, 96);
        assert_eq!(config.optimize.image_quality, DEFAULT_IMAGE_QUALITY);
        assert_eq!(config.server.max_upload_mb, 300);
    }

    #[test]
    fn test_rejects_out_of_range_quality() {
        let result = AppConfig::from_toml("[optimize]\nimage_quality = 5\n");
        assert!(matches!(result, Err(Error::ConfigInvalid { .. })));
    }

    #[test]
    fn test_rejects_non_positive_ceiling() {
        let result = AppConfig::from_toml("[combine]\nceiling_mb = 0.0\n");
        assert!(matches!(result, Err(Error::ConfigInvalid { .. })));
    }

    #[test]
    fn test_upload_limit_bounds() {
        let result = AppConfig::from_toml("[server]\nmax_upload_mb = 0\n");
        assert!(matches!(result, Err(Error::ConfigInvalid { .. })));

        let huge = format!("[server]\nmax_upload_mb = {}\n", i64::MAX);
        let result = AppConfig::from_toml(&huge);
        assert!(matches!(result, Err(Error::ConfigInvalid { .. })));

        let server = ServerConfig {
            max_upload_mb: usize::MAX,
            ..ServerConfig::default()
        };
        assert_eq!(server.max_upload_bytes(), usize::MAX);
        assert_eq!(ServerConfig::default().max_upload_bytes(), 300 * 1024 * 1024);
    }

    #[test]
    fn test_malformed_toml() {
        let result = AppConfig::from_toml("[combine\nceiling_mb = ");
        assert!(matches!(result, Err(Error::ConfigLoad(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[convert]\npage_breaks = false\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert!(!config.convert.page_breaks);
    }
}
