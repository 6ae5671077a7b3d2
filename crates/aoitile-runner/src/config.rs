//! YAML project configuration.
//!
//! ```yaml
//! aoi:
//!   name: BRAHMANBARIA_BBOX
//!   vertices: [[90.5024, 24.4451], [90.6174, 23.5101], [91.4834, 23.5049], [91.4655, 24.3480]]
//! tiling:
//!   width_km: 5.0
//!   height_km: 5.0
//!   overlap_km: 0.5
//! provider:
//!   url_template: "https://export.example.org/s2?bbox={lon_min},{lat_min},{lon_max},{lat_max}"
//!   token_env: AOITILE_TOKEN
//! datasets:
//!   s2_2024:
//!     output: map/2024/s2/brahmanbaria_s2_2024.tif
//!     year: 2024
//! ```
//!
//! Every section is optional; missing values fall back to the Brahmanbaria
//! defaults. Credentials are never read from the file, only the name of the
//! environment variable that holds them.

use crate::{Result, RunnerError};
use aoitile_grid::{AreaOfInterest, TileSpec, BRAHMANBARIA_AOI_NAME, BRAHMANBARIA_VERTICES};
use aoitile_provider::DEFAULT_TIMEOUT_SECS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable holding the provider bearer token by default.
pub const DEFAULT_TOKEN_ENV: &str = "AOITILE_TOKEN";

// ============================================================================
// Sections
// ============================================================================

/// Top-level project configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    pub aoi: AoiConfig,
    #[serde(default)]
    pub tiling: TilingConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Named tile sets, e.g. one per product and year.
    #[serde(default)]
    pub datasets: BTreeMap<String, DatasetConfig>,
}

/// Area of interest as a lon/lat polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AoiConfig {
    pub name: String,
    /// `[lon, lat]` vertices; the ring is closed automatically.
    pub vertices: Vec<[f64; 2]>,
}

impl Default for AoiConfig {
    fn default() -> Self {
        Self {
            name: BRAHMANBARIA_AOI_NAME.to_string(),
            vertices: BRAHMANBARIA_VERTICES.to_vec(),
        }
    }
}

/// Tile size and overlap in kilometres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TilingConfig {
    pub width_km: f64,
    pub height_km: f64,
    pub overlap_km: f64,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            width_km: 5.0,
            height_km: 5.0,
            overlap_km: 0.5,
        }
    }
}

impl TilingConfig {
    pub fn spec(&self) -> Result<TileSpec> {
        Ok(TileSpec::new(self.width_km, self.height_km, self.overlap_km)?)
    }
}

/// Imagery provider session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default)]
    pub url_template: Option<String>,
    /// Name of the environment variable with the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_crs")]
    pub crs: String,
    /// Pixel size in metres.
    #[serde(default = "default_scale")]
    pub scale: f64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url_template: None,
            token_env: default_token_env(),
            timeout_secs: default_timeout_secs(),
            crs: default_crs(),
            scale: default_scale(),
        }
    }
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_crs() -> String {
    "EPSG:4326".to_string()
}

fn default_scale() -> f64 {
    10.0
}

/// One named tile set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    /// Base output path; tiles are `{stem}_rNN_cNN{suffix}` next to it.
    pub output: PathBuf,
    #[serde(default)]
    pub year: Option<i32>,
    /// Overrides `provider.url_template` for this dataset.
    #[serde(default)]
    pub url_template: Option<String>,
    /// Overrides the project tiling for this dataset.
    #[serde(default)]
    pub tiling: Option<TilingConfig>,
    /// Mosaic output path.
    #[serde(default)]
    pub mosaic: Option<PathBuf>,
}

// ============================================================================
// Loading
// ============================================================================

impl ProjectConfig {
    /// Load a project file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| RunnerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| RunnerError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path` if given, else the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn area_of_interest(&self) -> Result<AreaOfInterest> {
        Ok(AreaOfInterest::from_vertices(&self.aoi.name, &self.aoi.vertices)?)
    }

    /// Look up a dataset by name.
    pub fn dataset(&self, name: &str) -> Result<&DatasetConfig> {
        self.datasets.get(name).ok_or_else(|| RunnerError::UnknownDataset {
            name: name.to_string(),
            known: if self.datasets.is_empty() {
                "(none)".to_string()
            } else {
                self.datasets.keys().cloned().collect::<Vec<_>>().join(", ")
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: ProjectConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, ProjectConfig::default());
        assert_eq!(config.aoi.name, BRAHMANBARIA_AOI_NAME);
        assert_eq!(config.provider.token_env, DEFAULT_TOKEN_ENV);
        assert_eq!(config.provider.timeout_secs, 300);
        assert!(config.area_of_interest().is_ok());
    }

    #[test]
    fn test_dataset_section() {
        let yaml = r#"
tiling:
  width_km: 2.5
  height_km: 2.5
  overlap_km: 0.5
datasets:
  alphaearth_2017:
    output: map/2017/alphaearth/brahmanbaria_alphaearth_2017.tif
    year: 2017
    tiling: { width_km: 10.0, height_km: 10.0, overlap_km: 1.0 }
"#;
        let config: ProjectConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.tiling.width_km, 2.5);
        let ds = config.dataset("alphaearth_2017").unwrap();
        assert_eq!(ds.year, Some(2017));
        assert_eq!(ds.tiling.unwrap().overlap_km, 1.0);
        assert_eq!(ds.mosaic, None);
    }

    #[test]
    fn test_shipped_config_parses() {
        let config: ProjectConfig =
            serde_yaml::from_str(include_str!("../../../configs/brahmanbaria.yaml")).unwrap();
        assert_eq!(config.aoi, AoiConfig::default());
        assert_eq!(config.datasets.len(), 3);
        assert!(config.provider.url_template.is_some());
        for dataset in config.datasets.values() {
            dataset.tiling.unwrap_or(config.tiling).spec().unwrap();
        }
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(serde_yaml::from_str::<ProjectConfig>("tiling: { width: 5 }").is_err());
        assert!(serde_yaml::from_str::<ProjectConfig>("token: abc").is_err());
    }

    #[test]
    fn test_unknown_dataset_lists_known() {
        let mut config = ProjectConfig::default();
        config.datasets.insert(
            "s2".to_string(),
            DatasetConfig {
                output: PathBuf::from("s2.tif"),
                year: None,
                url_template: None,
                tiling: None,
                mosaic: None,
            },
        );
        let err = config.dataset("ndvi").unwrap_err();
        assert!(err.to_string().contains("s2"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_invalid_tiling_is_configuration_error() {
        let tiling = TilingConfig {
            width_km: 1.0,
            height_km: 1.0,
            overlap_km: 1.0,
        };
        assert_eq!(tiling.spec().unwrap_err().exit_code(), 2);
    }
}
