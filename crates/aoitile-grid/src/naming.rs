//! Deterministic tile file names: `{stem}_r{row:02}_c{col:02}{suffix}`.

use crate::tiler::Tile;
use crate::{GridError, Result};
use std::path::{Path, PathBuf};

/// Stem used when the output base path has no extension.
pub const DEFAULT_TILE_STEM: &str = "tile";

/// Suffix used when the output base path has no extension.
pub const DEFAULT_TILE_SUFFIX: &str = ".tif";

/// Directory, stem, and suffix shared by all tiles of one tile set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileTemplate {
    dir: PathBuf,
    stem: String,
    suffix: String,
}

/// A tile file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileFile {
    pub row: u32,
    pub col: u32,
    pub path: PathBuf,
}

impl TileTemplate {
    /// Create a template from its parts. `suffix` includes the leading dot.
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
            suffix: suffix.into(),
        }
    }

    /// Resolve a template from a download output path.
    ///
    /// `out/s2_2024.tif` gives tiles `out/s2_2024_r00_c00.tif`, ...; a path
    /// without an extension is taken as the tile directory with the default
    /// `tile` stem and `.tif` suffix. A bare file name resolves to the
    /// current directory.
    pub fn from_base(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        match (base.extension(), base.file_stem()) {
            (Some(ext), Some(stem)) => Self {
                dir: dir_or_current(base.parent()),
                stem: stem.to_string_lossy().into_owned(),
                suffix: format!(".{}", ext.to_string_lossy()),
            },
            _ => Self::new(dir_or_current(Some(base)), DEFAULT_TILE_STEM, DEFAULT_TILE_SUFFIX),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// File name of the tile at `(row, col)`.
    pub fn file_name(&self, row: u32, col: u32) -> String {
        format!("{}_r{:02}_c{:02}{}", self.stem, row, col, self.suffix)
    }

    /// Full path of the tile at `(row, col)`.
    pub fn path(&self, row: u32, col: u32) -> PathBuf {
        self.dir.join(self.file_name(row, col))
    }

    /// Full path of `tile`.
    pub fn path_for(&self, tile: &Tile) -> PathBuf {
        self.path(tile.row, tile.col)
    }

    /// Glob-style pattern describing the tile names, for messages.
    pub fn pattern(&self) -> String {
        format!("{}_r*_c*{}", self.stem, self.suffix)
    }

    /// Parse a file name produced by [`file_name`](Self::file_name) back
    /// into `(row, col)`. Returns `None` for names that do not match.
    pub fn parse(&self, file_name: &str) -> Option<(u32, u32)> {
        let rest = file_name
            .strip_prefix(self.stem.as_str())?
            .strip_prefix("_r")?
            .strip_suffix(self.suffix.as_str())?;
        let (row, col) = rest.split_once("_c")?;
        Some((parse_index(row)?, parse_index(col)?))
    }

    /// List tile files in the template directory, sorted by `(row, col)`.
    ///
    /// Fails with [`GridError::NoTileFiles`] when nothing matches.
    pub fn list(&self) -> Result<Vec<TileFile>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(self.no_tiles());
            }
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some((row, col)) = self.parse(name) {
                if entry.file_type()?.is_file() {
                    files.push(TileFile {
                        row,
                        col,
                        path: entry.path(),
                    });
                }
            }
        }

        if files.is_empty() {
            return Err(self.no_tiles());
        }
        files.sort_by_key(|f| (f.row, f.col));
        Ok(files)
    }

    fn no_tiles(&self) -> GridError {
        GridError::NoTileFiles {
            pattern: self.pattern(),
            dir: self.dir.clone(),
        }
    }
}

fn dir_or_current(dir: Option<&Path>) -> PathBuf {
    match dir {
        Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn parse_index(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_format() {
        let t = TileTemplate::new("out", "s2", ".tif");
        assert_eq!(t.file_name(0, 0), "s2_r00_c00.tif");
        assert_eq!(t.file_name(3, 12), "s2_r03_c12.tif");
        assert_eq!(t.file_name(123, 4), "s2_r123_c04.tif");
        assert_eq!(t.path(1, 2), PathBuf::from("out/s2_r01_c02.tif"));
        assert_eq!(t.pattern(), "s2_r*_c*.tif");
    }

    #[test]
    fn test_from_base() {
        let t = TileTemplate::from_base("map/2024/s2/brahmanbaria_s2_2024.tif");
        assert_eq!(t.dir(), Path::new("map/2024/s2"));
        assert_eq!(t.stem(), "brahmanbaria_s2_2024");
        assert_eq!(t.suffix(), ".tif");

        let t = TileTemplate::from_base("map/tiles");
        assert_eq!(t.dir(), Path::new("map/tiles"));
        assert_eq!(t.stem(), DEFAULT_TILE_STEM);
        assert_eq!(t.suffix(), DEFAULT_TILE_SUFFIX);

        let t = TileTemplate::from_base("brahmanbaria_s2.tif");
        assert_eq!(t.dir(), Path::new("."));
        assert_eq!(t.path(0, 1), PathBuf::from("./brahmanbaria_s2_r00_c01.tif"));

        let t = TileTemplate::from_base("");
        assert_eq!(t.dir(), Path::new("."));
        assert_eq!(t.stem(), DEFAULT_TILE_STEM);
    }

    #[test]
    fn test_parse() {
        let t = TileTemplate::new("out", "ae_2023", ".tif");
        assert_eq!(t.parse("ae_2023_r07_c11.tif"), Some((7, 11)));
        assert_eq!(t.parse("ae_2023_r100_c01.tif"), Some((100, 1)));
        assert_eq!(t.parse(&t.file_name(42, 9)), Some((42, 9)));
        assert_eq!(t.parse("ae_2023_r07_c11.tif.part"), None);
        assert_eq!(t.parse("ae_2023_r_c11.tif"), None);
        assert_eq!(t.parse("other_r07_c11.tif"), None);
        assert_eq!(t.parse("ae_2023_r+7_c11.tif"), None);
    }
}
