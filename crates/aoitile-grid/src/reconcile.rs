//! Missing-tile reconciliation against a tile directory.

use crate::naming::TileTemplate;
use crate::tiler::Tile;
use crate::Result;
use tracing::debug;

/// Outcome of [`reconcile`]. Both lists keep the tiler's canonical order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub present: Vec<Tile>,
    pub missing: Vec<Tile>,
}

impl Reconciliation {
    /// Number of tiles expected.
    pub fn expected(&self) -> usize {
        self.present.len() + self.missing.len()
    }

    /// True when every expected tile is on disk.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Split `tiles` into those whose file exists under `template` and those
/// that are missing.
///
/// Only the presence of a correctly named file is checked. A missing tile
/// directory is created so that later downloads can write into it, and all
/// tiles are reported missing.
pub fn reconcile(tiles: &[Tile], template: &TileTemplate) -> Result<Reconciliation> {
    if !template.dir().is_dir() {
        debug!(dir = %template.dir().display(), "Creating tile directory");
        std::fs::create_dir_all(template.dir())?;
    }

    let mut result = Reconciliation::default();
    for tile in tiles {
        if template.path_for(tile).is_file() {
            result.present.push(tile.clone());
        } else {
            result.missing.push(tile.clone());
        }
    }
    Ok(result)
}
