//! Creation of pre-allocated GeoTIFFs and in-place windowed writes.
//!
//! Output files are uncompressed, pixel-interleaved and strip-organised so
//! that every pixel has a fixed byte offset. That allows a mosaic to be
//! filled window by window, resumed after a failure, and never held in
//! memory as a whole.

use crate::error::RasterError;
use crate::info::RasterInfo;
use crate::reader::{
    decoder_limits, optional_u32, read_info, tag, GDAL_NODATA, GEO_ASCII_PARAMS,
    GEO_DOUBLE_PARAMS, GEO_KEY_DIRECTORY, MODEL_PIXEL_SCALE, MODEL_TIEPOINT,
};
use crate::sample::ByteOrder;
use crate::window::Window;
use crate::Result;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tiff::decoder::Decoder;
use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKind, TiffKindBig, TiffKindStandard};
use tiff::tags::Tag;
use tracing::debug;

/// Preferred strip size; a strip always holds at least one row.
const STRIP_TARGET_BYTES: u64 = 1 << 20;

/// Largest file a classic (32-bit offset) TIFF can address.
const CLASSIC_TIFF_LIMIT: u64 = u32::MAX as u64;

const EXTRA_SAMPLES: u16 = 338;

/// Writes offset arrays in the width the TIFF flavour requires.
trait OffsetWidth: TiffKind + Sized {
    fn write_offsets<W: Write + Seek>(
        dir: &mut DirectoryEncoder<'_, W, Self>,
        tag: Tag,
        values: &[u64],
    ) -> Result<()>;
}

impl OffsetWidth for TiffKindStandard {
    fn write_offsets<W: Write + Seek>(
        dir: &mut DirectoryEncoder<'_, W, Self>,
        tag: Tag,
        values: &[u64],
    ) -> Result<()> {
        let narrow = values
            .iter()
            .map(|&v| u32::try_from(v))
            .collect::<std::result::Result<Vec<u32>, _>>()
            .map_err(|_| {
                RasterError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "strip offset exceeds the classic TIFF range",
                ))
            })?;
        dir.write_tag(tag, &narrow[..])?;
        Ok(())
    }
}

impl OffsetWidth for TiffKindBig {
    fn write_offsets<W: Write + Seek>(
        dir: &mut DirectoryEncoder<'_, W, Self>,
        tag: Tag,
        values: &[u64],
    ) -> Result<()> {
        dir.write_tag(tag, values)?;
        Ok(())
    }
}

/// Read/write handle on an uncompressed strip GeoTIFF.
pub struct RasterWriter {
    file: File,
    path: PathBuf,
    info: RasterInfo,
    byte_order: ByteOrder,
    strip_offsets: Vec<u64>,
    rows_per_strip: u32,
}

impl RasterWriter {
    /// Create a GeoTIFF described by `info`, with every pixel set to its
    /// nodata value (0 when there is none), and open it for writing.
    ///
    /// Files larger than 4 GiB are written as BigTIFF.
    pub fn create(path: impl AsRef<Path>, info: &RasterInfo) -> Result<Self> {
        let path = path.as_ref();
        if info.width == 0 || info.height == 0 {
            return Err(RasterError::invalid(path, "raster has no pixels"));
        }

        let row_bytes = u64::from(info.width) * info.pixel_bytes() as u64;
        let rows_per_strip = (STRIP_TARGET_BYTES / row_bytes).clamp(1, u64::from(info.height)) as u32;
        let strips = u64::from(info.height.div_ceil(rows_per_strip));
        let big = info.data_bytes() + strips * 16 + STRIP_TARGET_BYTES > CLASSIC_TIFF_LIMIT;

        let file = File::create(path)?;
        if big {
            encode(TiffEncoder::new_big(file)?, info, rows_per_strip)?;
        } else {
            encode(TiffEncoder::new(file)?, info, rows_per_strip)?;
        }
        debug!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            bands = info.bands,
            sample_type = %info.sample_type,
            rows_per_strip,
            bigtiff = big,
            "Created raster"
        );

        Self::open(path)
    }

    /// Open an existing uncompressed, pixel-interleaved, strip GeoTIFF for
    /// in-place writes.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let (info, strip_offsets, rows_per_strip) = {
            let file = BufReader::new(File::open(&path)?);
            let mut decoder = Decoder::new(file)?.with_limits(decoder_limits());
            let info = read_info(&mut decoder, &path)?;

            if optional_u32(&mut decoder, Tag::Compression)?.unwrap_or(1) != 1 {
                return Err(RasterError::unsupported(
                    &path,
                    "compressed file cannot be written in place",
                ));
            }
            if decoder.find_tag(Tag::TileWidth)?.is_some() {
                return Err(RasterError::unsupported(
                    &path,
                    "tiled file cannot be written in place",
                ));
            }
            let rows_per_strip = optional_u32(&mut decoder, Tag::RowsPerStrip)?
                .unwrap_or(info.height)
                .clamp(1, info.height.max(1));
            let offsets = decoder.get_tag_u64_vec(Tag::StripOffsets)?;
            let strips = info.height.div_ceil(rows_per_strip) as usize;
            if offsets.len() != strips {
                return Err(RasterError::invalid(
                    &path,
                    format!("{} strip offsets for {strips} strips", offsets.len()),
                ));
            }
            (info, offsets, rows_per_strip)
        };

        let mut file = OpenOptions::new().read(true).write(true).open(&path)?;
        let mut magic = [0u8; 2];
        file.read_exact(&mut magic)?;
        let byte_order = ByteOrder::from_header(magic)
            .ok_or_else(|| RasterError::invalid(&path, "not a TIFF header"))?;

        Ok(Self {
            file,
            path,
            info,
            byte_order,
            strip_offsets,
            rows_per_strip,
        })
    }

    pub fn info(&self) -> &RasterInfo {
        &self.info
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte order that window data must be supplied in.
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Overwrite `window` with pixel-interleaved `data` in [`byte_order`](Self::byte_order).
    pub fn write_window(&mut self, window: Window, data: &[u8]) -> Result<()> {
        let info = &self.info;
        if !window.fits(info.width, info.height) {
            return Err(RasterError::WindowOutOfBounds {
                col_off: window.col_off,
                row_off: window.row_off,
                width: window.width,
                height: window.height,
                raster_width: info.width,
                raster_height: info.height,
            });
        }

        let px = info.pixel_bytes();
        let row_len = window.width as usize * px;
        let expected = row_len * window.height as usize;
        if data.len() != expected {
            return Err(RasterError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        if expected == 0 {
            return Ok(());
        }

        for (r, row_data) in data.chunks_exact(row_len).enumerate() {
            let row = window.row_off + r as u32;
            let strip = (row / self.rows_per_strip) as usize;
            let Some(&strip_offset) = self.strip_offsets.get(strip) else {
                return Err(RasterError::invalid(&self.path, format!("no strip for row {row}")));
            };
            let within = u64::from(row % self.rows_per_strip) * u64::from(info.width)
                + u64::from(window.col_off);
            self.file
                .seek(SeekFrom::Start(strip_offset + within * px as u64))?;
            self.file.write_all(row_data)?;
        }
        Ok(())
    }

    /// Overwrite `window` with pixel-interleaved `values`, converted to the
    /// raster sample type.
    pub fn write_window_f64(&mut self, window: Window, values: &[f64]) -> Result<()> {
        let sample_type = self.info.sample_type;
        let mut data = Vec::with_capacity(values.len() * sample_type.size());
        for &v in values {
            sample_type.encode(v, self.byte_order, &mut data);
        }
        self.write_window(window, &data)
    }

    /// Flush all writes to disk.
    pub fn finish(mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }
}

/// Create a GeoTIFF described by `info` holding `values` (pixel-interleaved).
pub fn write_raster(path: impl AsRef<Path>, info: &RasterInfo, values: &[f64]) -> Result<()> {
    let mut writer = RasterWriter::create(path, info)?;
    writer.write_window_f64(Window::full(info.width, info.height), values)?;
    writer.finish()
}

fn encode<W: Write + Seek, K: OffsetWidth>(
    mut encoder: TiffEncoder<W, K>,
    info: &RasterInfo,
    rows_per_strip: u32,
) -> Result<()> {
    let bands = usize::from(info.bands);
    let row_bytes = info.width as usize * info.pixel_bytes();

    // One strip worth of nodata in the encoder's (native) byte order
    let mut pixel = Vec::with_capacity(info.pixel_bytes());
    for _ in 0..bands {
        info.sample_type
            .encode(info.nodata.unwrap_or(0.0), ByteOrder::native(), &mut pixel);
    }
    let fill = pixel.repeat(info.width as usize * rows_per_strip as usize);

    let mut dir = encoder.new_directory()?;

    let mut offsets = Vec::new();
    let mut byte_counts = Vec::new();
    let mut row = 0u32;
    while row < info.height {
        let rows = rows_per_strip.min(info.height - row);
        let len = rows as usize * row_bytes;
        offsets.push(dir.write_data(&fill[..len])?);
        byte_counts.push(len as u64);
        row += rows;
    }

    dir.write_tag(Tag::ImageWidth, info.width)?;
    dir.write_tag(Tag::ImageLength, info.height)?;
    dir.write_tag(Tag::BitsPerSample, &vec![info.sample_type.bits(); bands][..])?;
    dir.write_tag(Tag::Compression, 1u16)?;
    dir.write_tag(Tag::PhotometricInterpretation, 1u16)?; // BlackIsZero
    K::write_offsets(&mut dir, Tag::StripOffsets, &offsets)?;
    dir.write_tag(Tag::SamplesPerPixel, info.bands)?;
    dir.write_tag(Tag::RowsPerStrip, rows_per_strip)?;
    K::write_offsets(&mut dir, Tag::StripByteCounts, &byte_counts)?;
    dir.write_tag(Tag::PlanarConfiguration, 1u16)?;
    dir.write_tag(Tag::SampleFormat, &vec![info.sample_type.format_code(); bands][..])?;
    if bands > 1 {
        // Unspecified extra samples
        dir.write_tag(tag(EXTRA_SAMPLES), &vec![0u16; bands - 1][..])?;
    }

    dir.write_tag(tag(MODEL_PIXEL_SCALE), &info.transform.pixel_scale()[..])?;
    dir.write_tag(tag(MODEL_TIEPOINT), &info.transform.tiepoint()[..])?;
    if let Some(keys) = &info.geokeys {
        dir.write_tag(tag(GEO_KEY_DIRECTORY), &keys.directory[..])?;
        if let Some(doubles) = &keys.doubles {
            dir.write_tag(tag(GEO_DOUBLE_PARAMS), &doubles[..])?;
        }
        if let Some(ascii) = &keys.ascii {
            dir.write_tag(tag(GEO_ASCII_PARAMS), ascii.as_str())?;
        }
    }
    if let Some(nodata) = info.nodata {
        dir.write_tag(tag(GDAL_NODATA), format_nodata(nodata).as_str())?;
    }

    dir.finish()?;
    Ok(())
}

fn format_nodata(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else {
        value.to_string()
    }
}
