use crate::error::{DaisyError, Result};
use log::*;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Number of 4-byte elements preceding the descriptor payload in a descriptor file.
pub const HEADER_ELEMENTS: usize = 4;

/// Size of the descriptor file header in bytes.
pub const HEADER_BYTES: usize = HEADER_ELEMENTS * 4;

/// Shape of a descriptor field: `height × width` pixels with one descriptor of
/// `descriptor_length` floats each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDimensions {
    height: usize,
    width: usize,
    descriptor_length: usize,
}

impl FieldDimensions {
    /// Validates and creates a new shape. Every component must be non-zero and the whole
    /// file, header included, must be addressable in bytes.
    pub fn new(height: usize, width: usize, descriptor_length: usize) -> Result<Self> {
        for (name, value) in [
            ("height", height),
            ("width", width),
            ("descriptor_length", descriptor_length),
        ] {
            if value == 0 {
                return Err(DaisyError::InvalidDimension { name, value: 0 });
            }
        }
        let file_bytes = height
            .checked_mul(width)
            .and_then(|pixels| pixels.checked_mul(descriptor_length))
            .and_then(|elements| elements.checked_mul(4))
            .and_then(|bytes| bytes.checked_add(HEADER_BYTES));
        if file_bytes.is_none() {
            return Err(DaisyError::InvalidDimension {
                name: "height x width x descriptor_length",
                value: i64::try_from(height).unwrap_or(i64::MAX),
            });
        }
        Ok(FieldDimensions {
            height,
            width,
            descriptor_length,
        })
    }

    /// Same as [`FieldDimensions::new`] for values coming from signed sources such as
    /// the command line, where negative values have to be reported rather than wrapped.
    pub fn from_signed(height: i64, width: i64, descriptor_length: i64) -> Result<Self> {
        Self::new(
            DaisyError::positive("height", height)?,
            DaisyError::positive("width", width)?,
            DaisyError::positive("descriptor_length", descriptor_length)?,
        )
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn descriptor_length(&self) -> usize {
        self.descriptor_length
    }

    pub fn pixel_count(&self) -> usize {
        self.height * self.width
    }

    /// Number of floats in the payload (header excluded).
    pub fn element_count(&self) -> usize {
        self.pixel_count() * self.descriptor_length
    }

    /// Size of a descriptor file of this shape, header included.
    pub fn file_bytes(&self) -> usize {
        HEADER_BYTES + self.element_count() * 4
    }

    /// Offset of the first element of the descriptor at `(y, x)` within the payload.
    pub fn element_offset(&self, y: usize, x: usize) -> usize {
        (y * self.width + x) * self.descriptor_length
    }
}

impl fmt::Display for FieldDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}x{}",
            self.height, self.width, self.descriptor_length
        )
    }
}

/// A dense grid of DAISY descriptors for one image.
///
/// The descriptors are stored in one flat row-major vector: the vector for pixel `(y, x)`
/// occupies `[(y * width + x) * descriptor_length, +descriptor_length)`. A field is never
/// modified once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorField {
    dimensions: FieldDimensions,
    data: Vec<f32>,
}

impl DescriptorField {
    /// Wraps an in-memory payload. The payload length must match `dimensions` exactly.
    pub fn from_vec(dimensions: FieldDimensions, data: Vec<f32>) -> Result<Self> {
        if data.len() != dimensions.element_count() {
            return Err(DaisyError::InvalidDimension {
                name: "payload length",
                value: data.len() as i64,
            });
        }
        Ok(DescriptorField { dimensions, data })
    }

    /// Loads a descriptor file: skips the 16 byte header and reads exactly
    /// `dimensions.element_count()` little-endian floats. Bytes after the payload are ignored.
    pub fn from_file(path: impl AsRef<Path>, dimensions: FieldDimensions) -> Result<Self> {
        let path = path.as_ref();
        info!("Reading {} descriptors from {}", dimensions, path.display());
        let file = File::open(path).map_err(|e| DaisyError::io(path, e))?;
        let file_len = file
            .metadata()
            .map_err(|e| DaisyError::io(path, e))?
            .len();
        if file_len < dimensions.file_bytes() as u64 {
            return Err(DaisyError::TruncatedFile {
                path: path.to_path_buf(),
                expected: dimensions.element_count(),
                available: (file_len.saturating_sub(HEADER_BYTES as u64) / 4) as usize,
            });
        }
        Self::from_reader(BufReader::new(file), dimensions, path)
    }

    /// Reads a field from any byte source laid out like a descriptor file.
    /// `source` is only used to label errors.
    pub fn from_reader<R: Read>(
        reader: R,
        dimensions: FieldDimensions,
        source: impl AsRef<Path>,
    ) -> Result<Self> {
        let source = source.as_ref();
        let expected = dimensions.element_count();
        let wanted_bytes = dimensions.file_bytes();

        // grows with what the source actually delivers
        let mut bytes = Vec::new();
        reader
            .take(wanted_bytes as u64)
            .read_to_end(&mut bytes)
            .map_err(|e| DaisyError::io(source, e))?;

        if bytes.len() < wanted_bytes {
            let available = bytes.len().saturating_sub(HEADER_BYTES) / 4;
            return Err(DaisyError::TruncatedFile {
                path: source.to_path_buf(),
                expected,
                available,
            });
        }

        let data = decode_f32s(&bytes[HEADER_BYTES..]);
        debug!("Loaded {} elements from {}", data.len(), source.display());
        Ok(DescriptorField { dimensions, data })
    }

    /// Writes the field in the descriptor file format with a zeroed header.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| DaisyError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        let write = |writer: &mut BufWriter<File>| -> std::io::Result<()> {
            writer.write_all(&[0u8; HEADER_BYTES])?;
            for value in &self.data {
                writer.write_all(&value.to_le_bytes())?;
            }
            writer.flush()
        };
        write(&mut writer).map_err(|e| DaisyError::io(path, e))
    }

    pub fn dimensions(&self) -> FieldDimensions {
        self.dimensions
    }

    pub fn height(&self) -> usize {
        self.dimensions.height
    }

    pub fn width(&self) -> usize {
        self.dimensions.width
    }

    pub fn descriptor_length(&self) -> usize {
        self.dimensions.descriptor_length
    }

    /// Returns the descriptor vector of pixel `(y, x)`.
    ///
    /// # Panics
    /// Panics if `(y, x)` is outside the field.
    pub fn descriptor(&self, y: usize, x: usize) -> &[f32] {
        assert!(
            y < self.dimensions.height && x < self.dimensions.width,
            "pixel ({y}, {x}) outside of {} field",
            self.dimensions
        );
        let offset = self.dimensions.element_offset(y, x);
        &self.data[offset..offset + self.dimensions.descriptor_length]
    }

    /// The whole payload, row-major by `(y, x, i)`.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Reads the single descriptor of pixel `(y, x)` from a descriptor file without loading
/// the rest of it.
pub fn read_descriptor_at(
    path: impl AsRef<Path>,
    image_width: usize,
    y: usize,
    x: usize,
    descriptor_length: usize,
) -> Result<Vec<f32>> {
    let path = path.as_ref();
    if image_width == 0 {
        return Err(DaisyError::InvalidDimension {
            name: "width",
            value: 0,
        });
    }
    if descriptor_length == 0 {
        return Err(DaisyError::InvalidDimension {
            name: "descriptor_length",
            value: 0,
        });
    }
    if x >= image_width {
        return Err(DaisyError::InvalidDimension {
            name: "x",
            value: x as i64,
        });
    }

    let element = y
        .checked_mul(image_width)
        .and_then(|row| row.checked_add(x))
        .and_then(|pixel| pixel.checked_mul(descriptor_length))
        .filter(|element| {
            element
                .checked_add(descriptor_length)
                .and_then(|end| end.checked_mul(4))
                .and_then(|bytes| bytes.checked_add(HEADER_BYTES))
                .is_some()
        })
        .ok_or(DaisyError::InvalidDimension {
            name: "y",
            value: i64::try_from(y).unwrap_or(i64::MAX),
        })?;
    let byte_offset = (HEADER_BYTES + element * 4) as u64;

    let mut file = File::open(path).map_err(|e| DaisyError::io(path, e))?;
    let file_len = file
        .metadata()
        .map_err(|e| DaisyError::io(path, e))?
        .len();
    let needed = byte_offset + (descriptor_length * 4) as u64;
    if file_len < needed {
        return Err(DaisyError::TruncatedFile {
            path: path.to_path_buf(),
            expected: element + descriptor_length,
            available: (file_len.saturating_sub(HEADER_BYTES as u64) / 4) as usize,
        });
    }

    file.seek(SeekFrom::Start(byte_offset))
        .map_err(|e| DaisyError::io(path, e))?;
    let mut bytes = vec![0u8; descriptor_length * 4];
    file.read_exact(&mut bytes)
        .map_err(|e| DaisyError::io(path, e))?;
    Ok(decode_f32s(&bytes))
}

fn decode_f32s(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
