//! Sample types and byte-order conversions.

use std::fmt;
use tiff::decoder::DecodingResult;

/// Byte order of a TIFF file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    /// Byte order of the host, which is what the encoder writes.
    pub fn native() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrder::LittleEndian
        } else {
            ByteOrder::BigEndian
        }
    }

    /// Parse the first two bytes of a TIFF header (`II` or `MM`).
    pub fn from_header(magic: [u8; 2]) -> Option<Self> {
        match &magic {
            b"II" => Some(ByteOrder::LittleEndian),
            b"MM" => Some(ByteOrder::BigEndian),
            _ => None,
        }
    }
}

/// Numeric type of one raster sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

// SampleFormat tag values
const FORMAT_UINT: u16 = 1;
const FORMAT_INT: u16 = 2;
const FORMAT_FLOAT: u16 = 3;

impl SampleType {
    /// Map TIFF `BitsPerSample` and `SampleFormat` to a sample type.
    pub fn from_tiff(bits: u16, format: u16) -> Option<Self> {
        match (format, bits) {
            (FORMAT_UINT, 8) => Some(SampleType::U8),
            (FORMAT_UINT, 16) => Some(SampleType::U16),
            (FORMAT_UINT, 32) => Some(SampleType::U32),
            (FORMAT_INT, 8) => Some(SampleType::I8),
            (FORMAT_INT, 16) => Some(SampleType::I16),
            (FORMAT_INT, 32) => Some(SampleType::I32),
            (FORMAT_FLOAT, 32) => Some(SampleType::F32),
            (FORMAT_FLOAT, 64) => Some(SampleType::F64),
            _ => None,
        }
    }

    /// Size of one sample in bytes.
    pub fn size(self) -> usize {
        match self {
            SampleType::U8 | SampleType::I8 => 1,
            SampleType::U16 | SampleType::I16 => 2,
            SampleType::U32 | SampleType::I32 | SampleType::F32 => 4,
            SampleType::F64 => 8,
        }
    }

    /// Value of the `BitsPerSample` tag.
    pub fn bits(self) -> u16 {
        (self.size() * 8) as u16
    }

    /// Value of the `SampleFormat` tag.
    pub fn format_code(self) -> u16 {
        match self {
            SampleType::U8 | SampleType::U16 | SampleType::U32 => FORMAT_UINT,
            SampleType::I8 | SampleType::I16 | SampleType::I32 => FORMAT_INT,
            SampleType::F32 | SampleType::F64 => FORMAT_FLOAT,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, SampleType::F32 | SampleType::F64)
    }

    /// Append `value` converted to this type. Integer conversions saturate.
    pub fn encode(self, value: f64, order: ByteOrder, out: &mut Vec<u8>) {
        macro_rules! push {
            ($v:expr) => {
                match order {
                    ByteOrder::LittleEndian => out.extend_from_slice(&$v.to_le_bytes()),
                    ByteOrder::BigEndian => out.extend_from_slice(&$v.to_be_bytes()),
                }
            };
        }
        match self {
            SampleType::U8 => push!(value as u8),
            SampleType::I8 => push!(value as i8),
            SampleType::U16 => push!(value as u16),
            SampleType::I16 => push!(value as i16),
            SampleType::U32 => push!(value as u32),
            SampleType::I32 => push!(value as i32),
            SampleType::F32 => push!(value as f32),
            SampleType::F64 => push!(value),
        }
    }

    /// Decode one sample from the start of `bytes`, which must hold at least
    /// [`size`](Self::size) bytes.
    pub fn decode(self, bytes: &[u8], order: ByteOrder) -> f64 {
        macro_rules! read {
            ($t:ty, $n:expr) => {{
                let mut raw = [0u8; $n];
                raw.copy_from_slice(&bytes[..$n]);
                match order {
                    ByteOrder::LittleEndian => <$t>::from_le_bytes(raw) as f64,
                    ByteOrder::BigEndian => <$t>::from_be_bytes(raw) as f64,
                }
            }};
        }
        match self {
            SampleType::U8 => read!(u8, 1),
            SampleType::I8 => read!(i8, 1),
            SampleType::U16 => read!(u16, 2),
            SampleType::I16 => read!(i16, 2),
            SampleType::U32 => read!(u32, 4),
            SampleType::I32 => read!(i32, 4),
            SampleType::F32 => read!(f32, 4),
            SampleType::F64 => read!(f64, 8),
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SampleType::U8 => "uint8",
            SampleType::I8 => "int8",
            SampleType::U16 => "uint16",
            SampleType::I16 => "int16",
            SampleType::U32 => "uint32",
            SampleType::I32 => "int32",
            SampleType::F32 => "float32",
            SampleType::F64 => "float64",
        };
        f.write_str(name)
    }
}

/// Serialize decoded samples in `order`. Returns `None` for 64-bit integer
/// samples, which have no [`SampleType`].
pub(crate) fn samples_to_bytes(result: DecodingResult, order: ByteOrder) -> Option<Vec<u8>> {
    macro_rules! serialize {
        ($buf:expr) => {{
            let buf = $buf;
            let mut out = Vec::with_capacity(std::mem::size_of_val(buf.as_slice()));
            match order {
                ByteOrder::LittleEndian => {
                    buf.iter().for_each(|v| out.extend_from_slice(&v.to_le_bytes()))
                }
                ByteOrder::BigEndian => {
                    buf.iter().for_each(|v| out.extend_from_slice(&v.to_be_bytes()))
                }
            }
            out
        }};
    }
    let bytes = match result {
        DecodingResult::U8(buf) => buf,
        DecodingResult::I8(buf) => serialize!(buf),
        DecodingResult::U16(buf) => serialize!(buf),
        DecodingResult::I16(buf) => serialize!(buf),
        DecodingResult::U32(buf) => serialize!(buf),
        DecodingResult::I32(buf) => serialize!(buf),
        DecodingResult::F32(buf) => serialize!(buf),
        DecodingResult::F64(buf) => serialize!(buf),
        DecodingResult::U64(_) | DecodingResult::I64(_) => return None,
    };
    Some(bytes)
}

/// Convert decoded samples to `f64`.
pub(crate) fn samples_to_f64(result: DecodingResult) -> Vec<f64> {
    match result {
        DecodingResult::U8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::F32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::F64(data) => data,
        DecodingResult::U64(data) => data.into_iter().map(|v| v as f64).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|v| v as f64).collect(),
    }
}
