//! Sequential tile download driver.

use crate::provider::ImageryProvider;
use crate::request::{ExportParams, TileRequest};
use crate::{ProviderError, Result};
use aoitile_grid::{reconcile, GridError, Tile, TileTemplate};
use tracing::info;

/// Which tiles a download run exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadMode {
    /// Export every tile, replacing existing files.
    #[default]
    All,
    /// Export only tiles whose file is not on disk.
    MissingOnly,
}

/// Outcome of a completed download run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DownloadReport {
    /// Tiles in the tile set.
    pub expected: usize,
    /// Tiles skipped because their file already existed.
    pub skipped: usize,
    /// Tiles exported in this run.
    pub downloaded: usize,
    /// Bytes written in this run.
    pub bytes: u64,
}

/// Export `tiles` through `provider` into the files named by `template`.
///
/// Tiles are exported one at a time in tile order. The run stops at the
/// first failure with [`ProviderError::Interrupted`]; files written before
/// it are kept, so a `MissingOnly` re-run picks up where it stopped.
pub fn download_tiles<P: ImageryProvider>(
    provider: &P,
    tiles: &[Tile],
    template: &TileTemplate,
    params: &ExportParams,
    mode: DownloadMode,
) -> Result<DownloadReport> {
    if tiles.is_empty() {
        return Err(GridError::NoTiles.into());
    }

    let todo: Vec<&Tile> = match mode {
        DownloadMode::All => {
            std::fs::create_dir_all(template.dir())?;
            tiles.iter().collect()
        }
        DownloadMode::MissingOnly => {
            let rec = reconcile(tiles, template)?;
            info!(
                "Tiles expected: {}, present: {}, missing: {}",
                rec.expected(),
                rec.present.len(),
                rec.missing.len()
            );
            if rec.missing.is_empty() {
                info!("All tiles present.");
            }
            tiles
                .iter()
                .filter(|t| rec.missing.iter().any(|m| m.key() == t.key()))
                .collect()
        }
    };

    let mut report = DownloadReport {
        expected: tiles.len(),
        skipped: tiles.len() - todo.len(),
        ..Default::default()
    };

    let total = todo.len();
    for (i, tile) in todo.into_iter().enumerate() {
        let path = template.path_for(tile);
        info!(
            "[{}/{}] Exporting tile row={} col={} -> {}",
            i + 1,
            total,
            tile.row,
            tile.col,
            path.display()
        );
        let request = TileRequest::new(tile, params);
        match provider.fetch(&request, &path) {
            Ok(bytes) => {
                report.downloaded += 1;
                report.bytes += bytes;
            }
            Err(e) => {
                return Err(ProviderError::Interrupted {
                    completed: i,
                    total,
                    row: tile.row,
                    col: tile.col,
                    path,
                    source: Box::new(e),
                })
            }
        }
    }

    info!(
        "Downloaded {} tiles ({} bytes), skipped {}",
        report.downloaded, report.bytes, report.skipped
    );
    Ok(report)
}
