//! HTTP export provider.
//!
//! Tiles are fetched with a blocking GET against a URL template such as
//!
//! ```text
//! https://export.example.org/s2?bbox={lon_min},{lat_min},{lon_max},{lat_max}&crs={crs}&scale={scale}&year={year}
//! ```
//!
//! Supported placeholders: `{lon_min}`, `{lat_min}`, `{lon_max}`, `{lat_max}`,
//! `{row}`, `{col}`, `{crs}`, `{scale}`, `{year}` and `{region}` (GeoJSON
//! coordinates of the tile's part of the AOI).

use crate::provider::ImageryProvider;
use crate::request::TileRequest;
use crate::{ProviderError, Result};
use reqwest::StatusCode;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

const PLACEHOLDERS: [&str; 10] = [
    "lon_min", "lat_min", "lon_max", "lat_max", "row", "col", "crs", "scale", "year", "region",
];

/// Settings for an [`HttpProvider`].
#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    /// URL with `{placeholder}` fields.
    pub url_template: String,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Honour `HTTP_PROXY`/`HTTPS_PROXY` from the environment.
    pub use_env_proxy: bool,
}

impl HttpProviderConfig {
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
            token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            use_env_proxy: true,
        }
    }
}

/// Download statistics for a provider session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadStats {
    /// Number of tiles written.
    pub tiles_downloaded: usize,
    /// Total bytes written.
    pub bytes_downloaded: u64,
}

/// A provider session: one HTTP client and credential shared by every
/// request of a run.
pub struct HttpProvider {
    config: HttpProviderConfig,
    client: reqwest::blocking::Client,
    tiles_downloaded: AtomicUsize,
    bytes_downloaded: AtomicU64,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("url_template", &self.config.url_template)
            .field("timeout", &self.config.timeout)
            .finish()
    }
}

impl HttpProvider {
    /// Validate the URL template and build the HTTP client.
    pub fn new(config: HttpProviderConfig) -> Result<Self> {
        validate_template(&config.url_template)?;

        let mut builder = reqwest::blocking::Client::builder().timeout(config.timeout);
        if !config.use_env_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        Ok(Self {
            config,
            client,
            tiles_downloaded: AtomicUsize::new(0),
            bytes_downloaded: AtomicU64::new(0),
        })
    }

    /// Get download statistics for this session.
    pub fn download_stats(&self) -> DownloadStats {
        DownloadStats {
            tiles_downloaded: self.tiles_downloaded.load(Ordering::Relaxed),
            bytes_downloaded: self.bytes_downloaded.load(Ordering::Relaxed),
        }
    }

    /// The request URL for `request`.
    pub fn url_for(&self, request: &TileRequest) -> Result<String> {
        fill_template(&self.config.url_template, request)
    }

    fn download(&self, request: &TileRequest, url: &str, part: &Path, dest: &Path) -> Result<u64> {
        let mut get = self.client.get(url);
        if let Some(token) = &self.config.token {
            get = get.bearer_auth(token);
        }
        let mut response = get.send()?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_FOUND {
            return Err(ProviderError::EmptyResult {
                row: request.row,
                col: request.col,
            });
        }
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let mut file = fs::File::create(part)?;
        let bytes = response.copy_to(&mut file)?;
        file.sync_all()?;
        drop(file);

        if bytes == 0 {
            return Err(ProviderError::EmptyResult {
                row: request.row,
                col: request.col,
            });
        }
        fs::rename(part, dest)?;
        Ok(bytes)
    }
}

impl ImageryProvider for HttpProvider {
    fn fetch(&self, request: &TileRequest, dest: &Path) -> Result<u64> {
        let url = self.url_for(request)?;
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let part = part_path(dest);
        debug!(%url, dest = %dest.display(), "Requesting tile");

        match self.download(request, &url, &part, dest) {
            Ok(bytes) => {
                self.tiles_downloaded.fetch_add(1, Ordering::Relaxed);
                self.bytes_downloaded.fetch_add(bytes, Ordering::Relaxed);
                Ok(bytes)
            }
            Err(e) => {
                if part.exists() {
                    if let Err(cleanup) = fs::remove_file(&part) {
                        warn!(path = %part.display(), error = %cleanup, "Failed to remove partial download");
                    }
                }
                Err(e)
            }
        }
    }
}

/// `<dest>.part`, the file a download is streamed to before it is renamed.
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

fn placeholders(template: &str) -> Result<Vec<&str>> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            return Err(ProviderError::InvalidTemplate(format!(
                "unclosed '{{' in {template}"
            )));
        };
        names.push(&rest[start + 1..start + len]);
        rest = &rest[start + len + 1..];
    }
    Ok(names)
}

fn validate_template(template: &str) -> Result<()> {
    if template.trim().is_empty() {
        return Err(ProviderError::InvalidTemplate("empty URL template".to_string()));
    }
    for name in placeholders(template)? {
        if !PLACEHOLDERS.contains(&name) {
            return Err(ProviderError::InvalidTemplate(format!(
                "unknown placeholder {{{name}}}"
            )));
        }
    }
    Ok(())
}

fn fill_template(template: &str, request: &TileRequest) -> Result<String> {
    let mut url = String::with_capacity(template.len() + 64);
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        url.push_str(&rest[..start]);
        let Some(len) = rest[start..].find('}') else {
            return Err(ProviderError::InvalidTemplate(format!(
                "unclosed '{{' in {template}"
            )));
        };
        let name = &rest[start + 1..start + len];
        let b = &request.bounds;
        let value = match name {
            "lon_min" => b.min_lon.to_string(),
            "lat_min" => b.min_lat.to_string(),
            "lon_max" => b.max_lon.to_string(),
            "lat_max" => b.max_lat.to_string(),
            "row" => request.row.to_string(),
            "col" => request.col.to_string(),
            "crs" => request.params.crs.clone(),
            "scale" => request.params.scale.to_string(),
            "year" => request.params.year.map(|y| y.to_string()).unwrap_or_default(),
            "region" => serde_json::to_string(&request.region_coordinates())
                .map_err(|e| ProviderError::InvalidTemplate(e.to_string()))?,
            other => {
                return Err(ProviderError::InvalidTemplate(format!(
                    "unknown placeholder {{{other}}}"
                )))
            }
        };
        url.push_str(&value);
        rest = &rest[start + len + 1..];
    }
    url.push_str(rest);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ExportParams;
    use aoitile_grid::{Tile, TileBounds};
    use geo::{MultiPolygon, Rect};

    fn request() -> TileRequest {
        let bounds = TileBounds {
            min_lon: 90.5,
            min_lat: 23.5,
            max_lon: 90.75,
            max_lat: 23.625,
        };
        let tile = Tile {
            row: 3,
            col: 7,
            bounds,
            geometry: MultiPolygon::new(vec![Rect::new((90.5, 23.5), (90.75, 23.625)).to_polygon()]),
        };
        let params = ExportParams {
            crs: "EPSG:4326".to_string(),
            scale: 10.0,
            year: Some(2024),
        };
        TileRequest::new(&tile, &params)
    }

    #[test]
    fn test_fill_template() {
        let url = fill_template(
            "http://host/export?bbox={lon_min},{lat_min},{lon_max},{lat_max}&crs={crs}&scale={scale}&year={year}&tile=r{row}c{col}",
            &request(),
        )
        .unwrap();
        assert_eq!(
            url,
            "http://host/export?bbox=90.5,23.5,90.75,23.625&crs=EPSG:4326&scale=10&year=2024&tile=r3c7"
        );
    }

    #[test]
    fn test_region_placeholder_is_geojson() {
        let url = fill_template("{region}", &request()).unwrap();
        let coords: Vec<Vec<Vec<[f64; 2]>>> = serde_json::from_str(&url).unwrap();
        assert_eq!(coords.len(), 1);
        assert_eq!(coords[0][0].len(), 5);
        assert!(coords[0][0].contains(&[90.5, 23.5]));
    }

    #[test]
    fn test_validate_template() {
        assert!(validate_template("http://host/{row}/{col}.tif").is_ok());
        assert!(validate_template("").is_err());
        assert!(validate_template("http://host/{zoom}.tif").is_err());
        assert!(validate_template("http://host/{row.tif").is_err());
    }

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path(Path::new("out/s2_r00_c01.tif")),
            PathBuf::from("out/s2_r00_c01.tif.part")
        );
    }
}
