//! GeoTIFF decoding: metadata, whole-image reads and block-wise reads.

use crate::error::RasterError;
use crate::info::RasterInfo;
use crate::sample::{samples_to_bytes, samples_to_f64, ByteOrder, SampleType};
use crate::transform::{GeoKeys, GeoTransform};
use crate::window::Window;
use crate::Result;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use tiff::decoder::{Decoder, Limits};
use tiff::tags::Tag;

// GeoTIFF and GDAL private tags
pub(crate) const MODEL_PIXEL_SCALE: u16 = 33550;
pub(crate) const MODEL_TIEPOINT: u16 = 33922;
pub(crate) const MODEL_TRANSFORMATION: u16 = 34264;
pub(crate) const GEO_KEY_DIRECTORY: u16 = 34735;
pub(crate) const GEO_DOUBLE_PARAMS: u16 = 34736;
pub(crate) const GEO_ASCII_PARAMS: u16 = 34737;
pub(crate) const GDAL_NODATA: u16 = 42113;

/// Tag for a numeric code, resolving to the named variant when the tiff
/// crate knows it so that decoder lookups match.
pub(crate) fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

/// Decoder limits large enough for multi-gigabyte mosaics.
pub(crate) fn decoder_limits() -> Limits {
    let mut limits = Limits::default();
    limits.decoding_buffer_size = usize::MAX;
    limits.intermediate_buffer_size = usize::MAX;
    limits.ifd_value_size = usize::MAX;
    limits
}

/// An open GeoTIFF with its metadata.
pub struct RasterReader {
    decoder: Decoder<BufReader<File>>,
    info: RasterInfo,
    path: PathBuf,
}

impl RasterReader {
    /// Open a GeoTIFF and read its metadata.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = BufReader::new(File::open(&path)?);
        let mut decoder = Decoder::new(file)?.with_limits(decoder_limits());
        let info = read_info(&mut decoder, &path)?;
        Ok(Self {
            decoder,
            info,
            path,
        })
    }

    pub fn info(&self) -> &RasterInfo {
        &self.info
    }

    pub fn into_info(self) -> RasterInfo {
        self.info
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode the whole image as pixel-interleaved bytes in `order`.
    pub fn read_bytes(&mut self, order: ByteOrder) -> Result<Vec<u8>> {
        let result = self.decoder.read_image()?;
        let bytes = samples_to_bytes(result, order)
            .ok_or_else(|| RasterError::unsupported(&self.path, "64-bit integer samples"))?;
        let expected = self.info.data_bytes();
        if bytes.len() as u64 != expected {
            return Err(RasterError::invalid(
                &self.path,
                format!("decoded {} bytes, expected {}", bytes.len(), expected),
            ));
        }
        Ok(bytes)
    }

    /// Decode the whole image as pixel-interleaved `f64` samples.
    pub fn read_f64(&mut self) -> Result<Vec<f64>> {
        let values = samples_to_f64(self.decoder.read_image()?);
        let expected =
            self.info.width as usize * self.info.height as usize * usize::from(self.info.bands);
        if values.len() != expected {
            return Err(RasterError::invalid(
                &self.path,
                format!("decoded {} samples, expected {}", values.len(), expected),
            ));
        }
        Ok(values)
    }

    /// Decode one band (1-based) in row-major order.
    pub fn read_band(&mut self, band: u16) -> Result<Vec<f64>> {
        let bands = self.info.bands;
        if band == 0 || band > bands {
            return Err(RasterError::BandOutOfRange { band, bands });
        }
        let values = self.read_f64()?;
        if bands == 1 {
            return Ok(values);
        }
        Ok(values
            .into_iter()
            .skip(usize::from(band - 1))
            .step_by(usize::from(bands))
            .collect())
    }

    /// Number of strips or tiles in the image.
    pub fn chunk_count(&self) -> u32 {
        let (across, down) = self.chunk_grid();
        across * down
    }

    /// Pixel window covered by chunk `index`, clipped to the image.
    pub fn chunk_window(&self, index: u32) -> Window {
        let (chunk_w, chunk_h) = self.decoder.chunk_dimensions();
        let (across, _) = self.chunk_grid();
        let col_off = (index % across) * chunk_w;
        let row_off = (index / across) * chunk_h;
        Window::new(
            col_off,
            row_off,
            chunk_w.min(self.info.width - col_off),
            chunk_h.min(self.info.height - row_off),
        )
    }

    /// Decode chunk `index` as pixel-interleaved bytes in `order`, together
    /// with the window it covers. Edge padding is removed.
    pub fn read_chunk_bytes(&mut self, index: u32, order: ByteOrder) -> Result<(Window, Vec<u8>)> {
        let window = self.chunk_window(index);
        let result = self.decoder.read_chunk(index)?;
        let bytes = samples_to_bytes(result, order)
            .ok_or_else(|| RasterError::unsupported(&self.path, "64-bit integer samples"))?;

        let px = self.info.pixel_bytes();
        let row_len = window.width as usize * px;
        let expected = row_len * window.height as usize;
        if bytes.len() == expected {
            return Ok((window, bytes));
        }

        // Padded tile: keep the data part of each row
        let (chunk_w, _) = self.decoder.chunk_dimensions();
        let padded_row = chunk_w as usize * px;
        if padded_row == 0 || bytes.len() < padded_row * (window.height as usize - 1) + row_len {
            return Err(RasterError::invalid(
                &self.path,
                format!("chunk {index} decoded to {} bytes, expected {expected}", bytes.len()),
            ));
        }
        let mut cropped = Vec::with_capacity(expected);
        for row in bytes.chunks(padded_row).take(window.height as usize) {
            cropped.extend_from_slice(&row[..row_len]);
        }
        Ok((window, cropped))
    }

    fn chunk_grid(&self) -> (u32, u32) {
        let (chunk_w, chunk_h) = self.decoder.chunk_dimensions();
        let chunk_w = chunk_w.max(1);
        let chunk_h = chunk_h.max(1);
        (
            self.info.width.div_ceil(chunk_w),
            self.info.height.div_ceil(chunk_h),
        )
    }
}

/// Read [`RasterInfo`] from the current image of `decoder`.
pub(crate) fn read_info<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    path: &Path,
) -> Result<RasterInfo> {
    let (width, height) = decoder.dimensions()?;

    let bands = optional_u32(decoder, Tag::SamplesPerPixel)?.unwrap_or(1);
    let bands = u16::try_from(bands)
        .ok()
        .filter(|&b| b > 0)
        .ok_or_else(|| RasterError::invalid(path, format!("invalid samples per pixel {bands}")))?;

    let bits = optional_u16_vec(decoder, Tag::BitsPerSample)?.unwrap_or_else(|| vec![1]);
    let formats = optional_u16_vec(decoder, Tag::SampleFormat)?.unwrap_or_else(|| vec![1]);
    let (Some(&first_bits), Some(&first_format)) = (bits.first(), formats.first()) else {
        return Err(RasterError::invalid(path, "empty BitsPerSample or SampleFormat"));
    };
    if bits.iter().any(|&b| b != first_bits) || formats.iter().any(|&f| f != first_format) {
        return Err(RasterError::unsupported(path, "bands with different sample types"));
    }
    let sample_type = SampleType::from_tiff(first_bits, first_format).ok_or_else(|| {
        RasterError::unsupported(
            path,
            format!("{first_bits}-bit samples with sample format {first_format}"),
        )
    })?;

    if optional_u32(decoder, Tag::PlanarConfiguration)?.unwrap_or(1) != 1 {
        return Err(RasterError::unsupported(path, "band-sequential (planar) layout"));
    }

    let transform = read_transform(decoder, path)?;
    let nodata = read_nodata(decoder)?;
    let geokeys = read_geokeys(decoder)?;

    Ok(RasterInfo {
        width,
        height,
        bands,
        sample_type,
        transform,
        nodata,
        geokeys,
    })
}

fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>, path: &Path) -> Result<GeoTransform> {
    let scale = optional_f64_vec(decoder, tag(MODEL_PIXEL_SCALE))?;
    let tiepoint = optional_f64_vec(decoder, tag(MODEL_TIEPOINT))?;

    let transform = match (scale, tiepoint) {
        (Some(scale), Some(tie)) if scale.len() >= 2 && tie.len() >= 6 => {
            // Tiepoint format: [i, j, k, x, y, z], raster (i, j) maps to model (x, y)
            GeoTransform::new(
                tie[3] - tie[0] * scale[0],
                tie[4] + tie[1] * scale[1],
                scale[0],
                scale[1],
            )
        }
        _ => {
            let Some(m) = optional_f64_vec(decoder, tag(MODEL_TRANSFORMATION))? else {
                return Err(RasterError::invalid(
                    path,
                    "missing ModelPixelScale/ModelTiepoint or ModelTransformation tags",
                ));
            };
            if m.len() < 16 {
                return Err(RasterError::invalid(path, "short ModelTransformation tag"));
            }
            if m[1] != 0.0 || m[4] != 0.0 {
                return Err(RasterError::unsupported(path, "rotated or sheared transform"));
            }
            GeoTransform::new(m[3], m[7], m[0], -m[5])
        }
    };

    let valid = |v: f64| v.is_finite() && v > 0.0;
    if !valid(transform.pixel_width) || !valid(transform.pixel_height) {
        return Err(RasterError::unsupported(
            path,
            format!(
                "pixel size {} x {} is not north-up",
                transform.pixel_width, transform.pixel_height
            ),
        ));
    }
    Ok(transform)
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Option<f64>> {
    let nodata_tag = tag(GDAL_NODATA);
    if decoder.find_tag(nodata_tag)?.is_none() {
        return Ok(None);
    }
    let text = decoder.get_tag_ascii_string(nodata_tag)?;
    Ok(text.trim_matches(char::from(0)).trim().parse().ok())
}

fn read_geokeys<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Option<GeoKeys>> {
    let Some(directory) = optional_u16_vec(decoder, tag(GEO_KEY_DIRECTORY))? else {
        return Ok(None);
    };
    let doubles = optional_f64_vec(decoder, tag(GEO_DOUBLE_PARAMS))?;
    let ascii_tag = tag(GEO_ASCII_PARAMS);
    let ascii = if decoder.find_tag(ascii_tag)?.is_some() {
        Some(decoder.get_tag_ascii_string(ascii_tag)?)
    } else {
        None
    };
    Ok(Some(GeoKeys {
        directory,
        doubles,
        ascii,
    }))
}

pub(crate) fn optional_u32<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    tag: Tag,
) -> Result<Option<u32>> {
    match decoder.find_tag(tag)? {
        Some(value) => Ok(Some(value.into_u32()?)),
        None => Ok(None),
    }
}

fn optional_u16_vec<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    tag: Tag,
) -> Result<Option<Vec<u16>>> {
    if decoder.find_tag(tag)?.is_none() {
        return Ok(None);
    }
    Ok(Some(decoder.get_tag_u16_vec(tag)?))
}

fn optional_f64_vec<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    tag: Tag,
) -> Result<Option<Vec<f64>>> {
    if decoder.find_tag(tag)?.is_none() {
        return Ok(None);
    }
    Ok(Some(decoder.get_tag_f64_vec(tag)?))
}
