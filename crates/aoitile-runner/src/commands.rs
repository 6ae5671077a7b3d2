//! Subcommand implementations.
//!
//! Reports meant for the user go to `out`; progress goes through `tracing`.

use crate::cli::{CigreenArgs, ClipArgs, DownloadArgs, GridArgs, IndexCommand, MosaicArgs, NdviArgs};
use crate::config::{DatasetConfig, ProjectConfig};
use crate::{Result, RunnerError};
use aoitile_grid::{reconcile, tile, AreaOfInterest, Tile, TileSpec, TileTemplate};
use aoitile_index::BandRef;
use aoitile_mosaic::MosaicOptions;
use aoitile_provider::{download_tiles, DownloadMode, ExportParams, HttpProvider, HttpProviderConfig};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// AOI, tiling and naming resolved from the configuration and flags.
struct TileSet<'a> {
    aoi: AreaOfInterest,
    spec: TileSpec,
    template: Option<TileTemplate>,
    dataset: Option<&'a DatasetConfig>,
}

impl TileSet<'_> {
    fn template(&self) -> Result<&TileTemplate> {
        self.template.as_ref().ok_or_else(|| {
            RunnerError::Config("no output path; pass --output or --dataset".to_string())
        })
    }

    fn tiles(&self) -> Result<Vec<Tile>> {
        Ok(tile(&self.aoi, &self.spec)?)
    }
}

fn resolve<'a>(config: &'a ProjectConfig, args: &GridArgs) -> Result<TileSet<'a>> {
    let dataset = args
        .dataset
        .as_deref()
        .map(|name| config.dataset(name))
        .transpose()?;

    let mut tiling = dataset.and_then(|d| d.tiling).unwrap_or(config.tiling);
    if let Some(w) = args.tile_width_km {
        tiling.width_km = w;
    }
    if let Some(h) = args.tile_height_km {
        tiling.height_km = h;
    }
    if let Some(o) = args.tile_overlap_km {
        tiling.overlap_km = o;
    }

    let output = args.output.clone().or_else(|| dataset.map(|d| d.output.clone()));
    let set = TileSet {
        aoi: config.area_of_interest()?,
        spec: tiling.spec()?,
        template: output.map(TileTemplate::from_base),
        dataset,
    };
    debug!(
        aoi = set.aoi.name(),
        width_km = tiling.width_km,
        height_km = tiling.height_km,
        overlap_km = tiling.overlap_km,
        "Resolved tile set"
    );
    Ok(set)
}

/// `tiles`: print the canonical grid.
pub fn tiles(config: &ProjectConfig, args: &GridArgs, out: &mut dyn Write) -> Result<()> {
    let set = resolve(config, args)?;
    let tiles = set.tiles()?;
    let template = set
        .template
        .clone()
        .unwrap_or_else(|| TileTemplate::from_base(PathBuf::new()));

    writeln!(
        out,
        "AOI {}: {} tiles ({} x {} km, overlap {} km)",
        set.aoi.name(),
        tiles.len(),
        set.spec.width_km(),
        set.spec.height_km(),
        set.spec.overlap_km()
    )?;
    for t in &tiles {
        let b = &t.bounds;
        writeln!(
            out,
            "r{:02} c{:02}  {:.6},{:.6},{:.6},{:.6}  {}",
            t.row,
            t.col,
            b.min_lon,
            b.min_lat,
            b.max_lon,
            b.max_lat,
            template.file_name(t.row, t.col)
        )?;
    }
    Ok(())
}

/// `check`: report missing tile files.
pub fn check(config: &ProjectConfig, args: &GridArgs, out: &mut dyn Write) -> Result<()> {
    let set = resolve(config, args)?;
    let template = set.template()?;
    let tiles = set.tiles()?;
    let rec = reconcile(&tiles, template)?;

    writeln!(out, "AOI: {}", set.aoi.name())?;
    writeln!(out, "Expected tiles: {}", rec.expected())?;
    writeln!(out, "Found tiles: {}", rec.present.len())?;
    if rec.is_complete() {
        writeln!(out, "All tiles present.")?;
    } else {
        writeln!(out, "Missing tiles: {}", rec.missing.len())?;
        for t in &rec.missing {
            writeln!(out, "  {}", template.path_for(t).display())?;
        }
    }
    Ok(())
}

/// Explicit flag first, then the environment variable named in the config.
pub fn resolve_token(flag: Option<&str>, env_var: &str) -> Option<String> {
    flag.map(str::to_string)
        .or_else(|| std::env::var(env_var).ok())
        .filter(|t| !t.trim().is_empty())
}

/// `download`: export tiles through the configured provider.
pub fn download(config: &ProjectConfig, args: &DownloadArgs, out: &mut dyn Write) -> Result<()> {
    let set = resolve(config, &args.grid)?;
    let template = set.template()?;

    let url_template = args
        .url_template
        .clone()
        .or_else(|| set.dataset.and_then(|d| d.url_template.clone()))
        .or_else(|| config.provider.url_template.clone())
        .ok_or_else(|| {
            RunnerError::Config(
                "no provider URL template; set provider.url_template or pass --url-template".to_string(),
            )
        })?;

    let mut provider_config = HttpProviderConfig::new(url_template);
    provider_config.token = resolve_token(args.token.as_deref(), &config.provider.token_env);
    provider_config.timeout =
        Duration::from_secs(args.timeout_secs.unwrap_or(config.provider.timeout_secs));
    if provider_config.token.is_none() {
        debug!(env = %config.provider.token_env, "No provider token configured");
    }
    let provider = HttpProvider::new(provider_config)?;

    let params = ExportParams {
        crs: args.crs.clone().unwrap_or_else(|| config.provider.crs.clone()),
        scale: args.scale.unwrap_or(config.provider.scale),
        year: args.year.or_else(|| set.dataset.and_then(|d| d.year)),
    };
    let mode = if args.missing_only {
        DownloadMode::MissingOnly
    } else {
        DownloadMode::All
    };

    let tiles = set.tiles()?;
    info!("Generated {} tiles for {}", tiles.len(), set.aoi.name());
    let report = download_tiles(&provider, &tiles, template, &params, mode)?;

    writeln!(
        out,
        "Downloaded {} of {} tiles ({} skipped, {} bytes) into {}",
        report.downloaded,
        report.expected,
        report.skipped,
        report.bytes,
        template.dir().display()
    )?;
    Ok(())
}

/// `mosaic`: assemble every tile file on disk.
pub fn mosaic(config: &ProjectConfig, args: &MosaicArgs, out: &mut dyn Write) -> Result<()> {
    let set = resolve(config, &args.grid)?;
    let template = set.template()?;

    let files = template.list()?;
    info!("Found {} tiles matching {}", files.len(), template.pattern());
    let paths: Vec<PathBuf> = files.into_iter().map(|f| f.path).collect();

    let output = args
        .to
        .clone()
        .or_else(|| set.dataset.and_then(|d| d.mosaic.clone()))
        .unwrap_or_else(|| {
            template
                .dir()
                .join(format!("{}_mosaic{}", template.stem(), template.suffix()))
        });

    let options = MosaicOptions {
        overwrite: args.overwrite,
        start_tile: args.start_tile,
        max_tile_mb: args.max_tile_mb,
        progress_interval: args.progress_interval,
    };
    let report = aoitile_mosaic::accumulate(&paths, &output, &options)?;

    writeln!(
        out,
        "Saved mosaic to {} ({}x{}, {} of {} tiles written)",
        report.output.display(),
        report.width,
        report.height,
        report.written,
        report.total_tiles
    )?;
    Ok(())
}

/// `clip`: mask a raster to the configured AOI.
pub fn clip(config: &ProjectConfig, args: &ClipArgs, out: &mut dyn Write) -> Result<()> {
    let aoi = config.area_of_interest()?;
    let report = aoitile_index::clip(&args.input, &aoi, &args.output)?;
    writeln!(
        out,
        "Saved clipped raster to {} ({}x{}, {} pixels outside {})",
        report.output.display(),
        report.width,
        report.height,
        report.masked,
        aoi.name()
    )?;
    Ok(())
}

/// `index ndvi|cigreen`.
pub fn index(command: &IndexCommand, out: &mut dyn Write) -> Result<()> {
    let summary = match command {
        IndexCommand::Ndvi(NdviArgs {
            input,
            nir,
            red_band,
            nir_band,
            output,
        }) => {
            let red = BandRef::new(input, *red_band);
            let nir = BandRef::new(nir.as_ref().unwrap_or(input), *nir_band);
            aoitile_index::ndvi(&red, &nir, output)?
        }
        IndexCommand::Cigreen(CigreenArgs {
            green,
            nir,
            green_band,
            nir_band,
            scale,
            output,
        }) => aoitile_index::cigreen(
            &BandRef::new(green, *green_band),
            &BandRef::new(nir, *nir_band),
            *scale,
            output,
        )?,
    };

    match (summary.min, summary.max) {
        (Some(min), Some(max)) => writeln!(
            out,
            "Saved {} ({}x{}); min {:.4} max {:.4}",
            summary.output.display(),
            summary.width,
            summary.height,
            min,
            max
        )?,
        _ => writeln!(out, "Saved {} (no valid pixels)", summary.output.display())?,
    }
    Ok(())
}
