use aoitile_index::{DEFAULT_NIR_BAND, DEFAULT_RED_BAND, DEFAULT_REFLECTANCE_SCALE};
use aoitile_mosaic::{DEFAULT_MAX_TILE_MB, DEFAULT_PROGRESS_INTERVAL};
use std::path::PathBuf;

/// Tile, download, check and mosaic satellite imagery over an AOI.
#[derive(clap::Parser, Debug)]
#[command(name = "aoitile", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only report warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Project configuration (YAML). Defaults to the built-in Brahmanbaria AOI.
    #[arg(short, long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Print the tile grid without touching the network or disk
    Tiles(GridArgs),

    /// Report which tile files are missing
    Check(GridArgs),

    /// Export tiles from the imagery provider
    Download(DownloadArgs),

    /// Assemble tile files into one GeoTIFF
    Mosaic(MosaicArgs),

    /// Clip a raster to the AOI
    Clip(ClipArgs),

    /// Compute a vegetation index
    #[command(subcommand)]
    Index(IndexCommand),
}

/// Which tile set to work on, and how it is tiled.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct GridArgs {
    /// Named dataset from the project configuration
    #[arg(short, long)]
    pub dataset: Option<String>,

    /// Base output path; tiles are written as {stem}_rNN_cNN{suffix} next to it
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Tile width in kilometres
    #[arg(long)]
    pub tile_width_km: Option<f64>,

    /// Tile height in kilometres
    #[arg(long)]
    pub tile_height_km: Option<f64>,

    /// Tile overlap in kilometres
    #[arg(long)]
    pub tile_overlap_km: Option<f64>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub grid: GridArgs,

    /// Only export tiles whose file is missing
    #[arg(long)]
    pub missing_only: bool,

    /// Provider URL template (overrides the configuration)
    #[arg(long)]
    pub url_template: Option<String>,

    /// Bearer token (overrides the token environment variable)
    #[arg(long)]
    pub token: Option<String>,

    /// Acquisition year
    #[arg(long)]
    pub year: Option<i32>,

    /// Export CRS, e.g. EPSG:4326
    #[arg(long)]
    pub crs: Option<String>,

    /// Pixel size in metres
    #[arg(long)]
    pub scale: Option<f64>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct MosaicArgs {
    #[command(flatten)]
    pub grid: GridArgs,

    /// Mosaic output path (default: {stem}_mosaic{suffix} next to the tiles)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub to: Option<PathBuf>,

    /// Replace an existing mosaic
    #[arg(long)]
    pub overwrite: bool,

    /// 1-based tile to resume from; the existing mosaic is kept
    #[arg(long, default_value_t = 1)]
    pub start_tile: usize,

    /// Copy tiles up to this many MiB in one read; larger tiles stream by block (0 = always stream)
    #[arg(long, default_value_t = DEFAULT_MAX_TILE_MB)]
    pub max_tile_mb: u64,

    /// Log progress every N tiles
    #[arg(long, default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    pub progress_interval: usize,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ClipArgs {
    /// Raster to clip
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Clipped output
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum IndexCommand {
    /// (NIR - Red) / (NIR + Red)
    Ndvi(NdviArgs),

    /// NIR / Green - 1 on reflectances
    Cigreen(CigreenArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct NdviArgs {
    /// Raster holding the red band (and the NIR band unless --nir is given)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: PathBuf,

    /// Separate raster holding the NIR band
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub nir: Option<PathBuf>,

    /// 1-based red band
    #[arg(long, default_value_t = DEFAULT_RED_BAND)]
    pub red_band: u16,

    /// 1-based NIR band
    #[arg(long, default_value_t = DEFAULT_NIR_BAND)]
    pub nir_band: u16,

    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CigreenArgs {
    /// Raster holding the green band (B03)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub green: PathBuf,

    /// Raster holding the NIR band (B08)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub nir: PathBuf,

    #[arg(long, default_value_t = 1)]
    pub green_band: u16,

    #[arg(long, default_value_t = 1)]
    pub nir_band: u16,

    /// Digital number to reflectance factor; use 1.0 for already scaled inputs
    #[arg(long, default_value_t = DEFAULT_REFLECTANCE_SCALE)]
    pub scale: f64,

    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: PathBuf,
}
