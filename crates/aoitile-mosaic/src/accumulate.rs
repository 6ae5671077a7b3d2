//! Streaming tiles into the output raster.

use crate::plan::{MosaicPlan, PlacedTile};
use crate::{MosaicError, Result};
use aoitile_raster::{RasterReader, RasterWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default size below which a tile is copied in one read.
pub const DEFAULT_MAX_TILE_MB: u64 = 256;

/// Default number of tiles between progress messages.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 250;

/// Options controlling a mosaic run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MosaicOptions {
    /// Replace an existing output when not resuming.
    pub overwrite: bool,
    /// 1-based index of the first tile to write. Values above 1 resume into
    /// an existing output.
    pub start_tile: usize,
    /// Tiles up to this many MiB are read whole; larger tiles are streamed
    /// block by block. 0 always streams.
    pub max_tile_mb: u64,
    /// Log progress every this many tiles (and after the last one).
    pub progress_interval: usize,
}

impl Default for MosaicOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            start_tile: 1,
            max_tile_mb: DEFAULT_MAX_TILE_MB,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl MosaicOptions {
    pub fn is_resume(&self) -> bool {
        self.start_tile > 1
    }
}

/// Lifecycle of a mosaic run, reported in debug logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MosaicStage {
    /// Tile metadata is being read and the output prepared.
    Initializing,
    /// Tiles are being copied.
    Writing,
    /// The output is being flushed.
    Finalizing,
    Done,
}

/// How a tile's pixels were copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMode {
    WholeTile,
    Blocks,
}

/// Summary of a finished mosaic.
#[derive(Debug, Clone, PartialEq)]
pub struct MosaicReport {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub total_tiles: usize,
    /// Tiles written in this run (excludes tiles skipped by resuming).
    pub written: usize,
}

/// Writes the tiles of a [`MosaicPlan`] one at a time into its output.
pub struct Accumulator {
    plan: MosaicPlan,
    writer: RasterWriter,
    options: MosaicOptions,
    next: usize,
    written: usize,
}

impl Accumulator {
    /// Prepare the output raster for `plan`.
    ///
    /// A fresh run creates the output pre-filled with nodata, refusing to
    /// replace an existing file unless `overwrite` is set. A resumed run
    /// opens the existing output and checks that its grid matches the plan
    /// before anything is written.
    pub fn open(
        plan: MosaicPlan,
        output: impl AsRef<Path>,
        options: MosaicOptions,
    ) -> Result<Self> {
        let output = output.as_ref();
        let total = plan.total();
        if total == 0 {
            return Err(MosaicError::NoTiles);
        }
        if options.start_tile < 1 || options.start_tile > total {
            return Err(MosaicError::StartTileOutOfRange {
                start: options.start_tile,
                total,
            });
        }

        let writer = if options.is_resume() {
            if !output.exists() {
                return Err(MosaicError::ResumeWithoutOutput(output.to_path_buf()));
            }
            let writer = RasterWriter::open(output).map_err(|e| MosaicError::ResumeMismatch {
                path: output.to_path_buf(),
                reason: e.to_string(),
            })?;
            plan.check_resumable(output, writer.info())?;
            info!(
                "Resuming mosaic at tile {}/{} using existing file {}",
                options.start_tile,
                total,
                output.display()
            );
            writer
        } else {
            if output.exists() && !options.overwrite {
                return Err(MosaicError::OutputExists(output.to_path_buf()));
            }
            if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            RasterWriter::create(output, &plan.output)?
        };

        debug!(stage = ?MosaicStage::Writing, start = options.start_tile, total, "Output ready");
        Ok(Self {
            next: options.start_tile - 1,
            plan,
            writer,
            options,
            written: 0,
        })
    }

    pub fn plan(&self) -> &MosaicPlan {
        &self.plan
    }

    /// Copy the next tile. Returns its 1-based index, or `None` when all
    /// tiles have been written.
    ///
    /// A failure is reported as [`MosaicError::Interrupted`] carrying the
    /// index to resume from.
    pub fn write_next(&mut self) -> Result<Option<usize>> {
        let Some(tile) = self.plan.tiles.get(self.next) else {
            return Ok(None);
        };
        let index = self.next + 1;
        let total = self.plan.total();

        let mode = copy_tile(&mut self.writer, tile, self.options.max_tile_mb).map_err(|e| {
            MosaicError::Interrupted {
                tile: index,
                total,
                path: tile.path.clone(),
                source: Box::new(e),
            }
        })?;
        debug!(tile = index, path = %tile.path.display(), ?mode, "Copied tile");

        self.next += 1;
        self.written += 1;
        let interval = self.options.progress_interval.max(1);
        if index % interval == 0 || index == total {
            info!("Wrote {index}/{total} tiles ...");
        }
        Ok(Some(index))
    }

    /// Flush the output and report.
    pub fn finish(self) -> Result<MosaicReport> {
        debug!(stage = ?MosaicStage::Finalizing, written = self.written, "Flushing output");
        let output = self.writer.path().to_path_buf();
        self.writer.finish()?;
        info!("Saved mosaic to {}", output.display());
        Ok(MosaicReport {
            output,
            width: self.plan.output.width,
            height: self.plan.output.height,
            total_tiles: self.plan.total(),
            written: self.written,
        })
    }
}

/// Build (or resume) the mosaic of `tiles` at `output`.
///
/// Tiles are written in the given order; where they overlap, later tiles
/// overwrite earlier ones.
pub fn accumulate<P: AsRef<Path>>(
    tiles: &[P],
    output: impl AsRef<Path>,
    options: &MosaicOptions,
) -> Result<MosaicReport> {
    debug!(stage = ?MosaicStage::Initializing, tiles = tiles.len(), "Reading tile metadata");
    let plan = MosaicPlan::from_tiles(tiles)?;
    info!(
        "Mosaic grid {}x{} with {} bands of {} from {} tiles",
        plan.output.width,
        plan.output.height,
        plan.output.bands,
        plan.output.sample_type,
        plan.total()
    );

    let mut accumulator = Accumulator::open(plan, output, options.clone())?;
    while accumulator.write_next()?.is_some() {}
    let report = accumulator.finish()?;
    debug!(stage = ?MosaicStage::Done, written = report.written, "Mosaic complete");
    Ok(report)
}

fn copy_tile(writer: &mut RasterWriter, tile: &PlacedTile, max_tile_mb: u64) -> Result<CopyMode> {
    let mut reader = RasterReader::open(&tile.path)?;
    let info = reader.info();
    if info.width != tile.window.width || info.height != tile.window.height {
        return Err(MosaicError::WindowMismatch {
            path: tile.path.clone(),
            tile_width: info.width,
            tile_height: info.height,
            window_width: tile.window.width,
            window_height: tile.window.height,
        });
    }

    let order = writer.byte_order();
    let whole = max_tile_mb > 0 && info.data_bytes() <= max_tile_mb.saturating_mul(1024 * 1024);
    if whole {
        let data = reader.read_bytes(order)?;
        writer.write_window(tile.window, &data)?;
        return Ok(CopyMode::WholeTile);
    }

    for chunk in 0..reader.chunk_count() {
        let (block, data) = reader.read_chunk_bytes(chunk, order)?;
        writer.write_window(block.translate(tile.window.col_off, tile.window.row_off), &data)?;
    }
    Ok(CopyMode::Blocks)
}
