//! Image sequence loading from NumPy `.npy` arrays.
//!
//! Each user gets one array of shape `[N, H, W, C]` (or `[N, H, W]`),
//! read whole into memory and widened to `f32`.

use crate::error::ImageError;
use std::fs;
use std::path::Path;

const MAGIC: &[u8] = b"\x93NUMPY";

/// An immutable, fixed-shape sequence of images indexed by cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSequence {
    data: Vec<f32>,
    len: usize,
    height: usize,
    width: usize,
    channels: usize,
}

/// Element type of the array, fixed when the header is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scalar {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl Scalar {
    fn size(self) -> usize {
        match self {
            Scalar::U8 | Scalar::I8 => 1,
            Scalar::U16 | Scalar::I16 => 2,
            Scalar::U32 | Scalar::I32 | Scalar::F32 => 4,
            Scalar::U64 | Scalar::I64 | Scalar::F64 => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Dtype {
    scalar: Scalar,
    big_endian: bool,
}

impl Dtype {
    fn parse(descr: &str) -> Result<Self, ImageError> {
        let unsupported = || ImageError::UnsupportedDtype(descr.to_string());
        let mut chars = descr.chars();
        let order = chars.next().ok_or_else(unsupported)?;
        let big_endian = match order {
            '<' | '|' => false,
            '>' => true,
            '=' => cfg!(target_endian = "big"),
            _ => return Err(unsupported()),
        };
        let kind = chars.next().ok_or_else(unsupported)?;
        let size: usize = chars.as_str().parse().map_err(|_| unsupported())?;
        let scalar = match (kind, size) {
            ('u', 1) => Scalar::U8,
            ('i', 1) => Scalar::I8,
            ('u', 2) => Scalar::U16,
            ('i', 2) => Scalar::I16,
            ('u', 4) => Scalar::U32,
            ('i', 4) => Scalar::I32,
            ('u', 8) => Scalar::U64,
            ('i', 8) => Scalar::I64,
            ('f', 4) => Scalar::F32,
            ('f', 8) => Scalar::F64,
            _ => return Err(unsupported()),
        };
        Ok(Self { scalar, big_endian })
    }

    fn size(&self) -> usize {
        self.scalar.size()
    }

    fn decode(&self, b: &[u8]) -> f32 {
        let big = self.big_endian;
        match self.scalar {
            Scalar::U8 => b[0] as f32,
            Scalar::I8 => b[0] as i8 as f32,
            Scalar::U16 => u16::from_le_bytes(le(b, big)) as f32,
            Scalar::I16 => i16::from_le_bytes(le(b, big)) as f32,
            Scalar::U32 => u32::from_le_bytes(le(b, big)) as f32,
            Scalar::I32 => i32::from_le_bytes(le(b, big)) as f32,
            Scalar::U64 => u64::from_le_bytes(le(b, big)) as f32,
            Scalar::I64 => i64::from_le_bytes(le(b, big)) as f32,
            Scalar::F32 => f32::from_le_bytes(le(b, big)),
            Scalar::F64 => f64::from_le_bytes(le(b, big)) as f32,
        }
    }
}

/// Product of the dimensions, or `None` if it does not fit in `usize`.
fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

/// Copy `N` bytes into little-endian order.
fn le<const N: usize>(b: &[u8], big_endian: bool) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&b[..N]);
    if big_endian {
        out.reverse();
    }
    out
}

/// Find the raw text that follows `'key':` in a header dict.
fn dict_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let quoted = [format!("'{key}'"), format!("\"{key}\"")];
    let start = quoted.iter().find_map(|k| header.find(k.as_str()).map(|i| i + k.len()))?;
    let rest = header[start..].trim_start();
    Some(rest.strip_prefix(':')?.trim_start())
}

fn parse_descr(header: &str) -> Result<String, ImageError> {
    let value = dict_value(header, "descr").ok_or_else(|| ImageError::BadHeader("missing descr".into()))?;
    let quote = value
        .chars()
        .next()
        .filter(|c| *c == '\'' || *c == '"')
        .ok_or_else(|| ImageError::BadHeader("descr is not a string".into()))?;
    let inner = &value[1..];
    let end = inner
        .find(quote)
        .ok_or_else(|| ImageError::BadHeader("unterminated descr".into()))?;
    Ok(inner[..end].to_string())
}

fn parse_fortran_order(header: &str) -> Result<bool, ImageError> {
    let value = dict_value(header, "fortran_order")
        .ok_or_else(|| ImageError::BadHeader("missing fortran_order".into()))?;
    if value.starts_with("True") {
        Ok(true)
    } else if value.starts_with("False") {
        Ok(false)
    } else {
        Err(ImageError::BadHeader("fortran_order is not a bool".into()))
    }
}

fn parse_shape(header: &str) -> Result<Vec<usize>, ImageError> {
    let value = dict_value(header, "shape").ok_or_else(|| ImageError::BadHeader("missing shape".into()))?;
    let inner = value
        .strip_prefix('(')
        .and_then(|v| v.split_once(')'))
        .map(|(inner, _)| inner)
        .ok_or_else(|| ImageError::BadHeader("shape is not a tuple".into()))?;
    inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| ImageError::BadHeader(format!("bad shape dimension '{s}'")))
        })
        .collect()
}

impl ImageSequence {
    /// Read a whole `.npy` file into memory.
    pub fn load(path: &Path) -> Result<Self, ImageError> {
        let bytes = fs::read(path).map_err(|source| ImageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_npy_bytes(&bytes)
    }

    /// Parse an in-memory `.npy` buffer.
    pub fn from_npy_bytes(bytes: &[u8]) -> Result<Self, ImageError> {
        if bytes.len() < 10 || &bytes[..6] != MAGIC {
            return Err(ImageError::BadMagic);
        }
        let (major, minor) = (bytes[6], bytes[7]);
        let (header_len, header_start): (usize, usize) = match major {
            1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
            2 | 3 => {
                if bytes.len() < 12 {
                    return Err(ImageError::BadHeader("truncated header length".into()));
                }
                let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
                (len as usize, 12)
            }
            _ => return Err(ImageError::UnsupportedVersion(major, minor)),
        };
        let data_start = header_start
            .checked_add(header_len)
            .ok_or_else(|| ImageError::BadHeader("header length overflows".into()))?;
        let header = bytes
            .get(header_start..data_start)
            .ok_or_else(|| ImageError::BadHeader("header runs past end of file".into()))?;
        let header = std::str::from_utf8(header)
            .map_err(|_| ImageError::BadHeader("header is not text".into()))?;

        let dtype = Dtype::parse(&parse_descr(header)?)?;
        if parse_fortran_order(header)? {
            return Err(ImageError::FortranOrder);
        }
        let shape = parse_shape(header)?;

        let payload = &bytes[data_start..];
        let expected = element_count(&shape)
            .and_then(|count| count.checked_mul(dtype.size()))
            .ok_or_else(|| ImageError::BadShape(shape.clone()))?;
        if payload.len() < expected {
            return Err(ImageError::Truncated {
                expected,
                actual: payload.len(),
            });
        }
        let data = payload[..expected]
            .chunks_exact(dtype.size())
            .map(|chunk| dtype.decode(chunk))
            .collect();
        Self::from_raw(&shape, data)
    }

    /// Build a sequence from a shape and row-major values.
    pub fn from_raw(shape: &[usize], data: Vec<f32>) -> Result<Self, ImageError> {
        let (len, height, width, channels) = match *shape {
            [n, h, w] => (n, h, w, 1),
            [n, h, w, c] => (n, h, w, c),
            _ => return Err(ImageError::BadShape(shape.to_vec())),
        };
        if height == 0 || width == 0 || channels == 0 {
            return Err(ImageError::BadShape(shape.to_vec()));
        }
        if len == 0 {
            return Err(ImageError::Empty);
        }
        let expected =
            element_count(shape).ok_or_else(|| ImageError::BadShape(shape.to_vec()))?;
        if data.len() != expected {
            return Err(ImageError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            len,
            height,
            width,
            channels,
        })
    }

    /// Number of images (N).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `(height, width)` of every image.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// One channel of one image, row-major, `height * width` values.
    pub fn plane(&self, index: usize, channel: usize) -> Option<Vec<f32>> {
        if index >= self.len || channel >= self.channels {
            return None;
        }
        let pixels = self.height * self.width;
        let start = index * pixels * self.channels;
        let image = &self.data[start..start + pixels * self.channels];
        Some(
            image
                .iter()
                .skip(channel)
                .step_by(self.channels)
                .copied()
                .collect(),
        )
    }
}

/// Min-max normalise a plane to 8-bit grey. Flat or non-finite input maps to black.
pub fn to_grayscale(plane: &[f32]) -> Vec<u8> {
    let finite = plane.iter().copied().filter(|v| v.is_finite());
    let (min, max) = finite.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let range = max - min;
    if !range.is_finite() || range <= 0.0 {
        return vec![0; plane.len()];
    }
    plane
        .iter()
        .map(|v| {
            if v.is_finite() {
                (((v - min) / range) * 255.0).round() as u8
            } else {
                0
            }
        })
        .collect()
}
