use crate::error::{DaisyError, Result};
use image::{GrayImage, Luma};
use log::*;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Dissimilarity stored for a pixel before any candidate has been compared.
pub const NO_MATCH_DIFF: f32 = 9999.0;

/// The best match found for a single pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelMatch {
    /// Row of the match in the second field minus the row of the pixel.
    pub offset_y: i64,
    /// Column of the match in the second field minus the column of the pixel.
    pub offset_x: i64,
    /// L1 distance between the two descriptors.
    pub diff: f32,
}

impl Default for PixelMatch {
    fn default() -> Self {
        PixelMatch {
            offset_y: 0,
            offset_x: 0,
            diff: NO_MATCH_DIFF,
        }
    }
}

/// Which displacement component to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetAxis {
    Y,
    X,
}

/// The three files a match run produces for a given prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub offset_y: PathBuf,
    pub offset_x: PathBuf,
    pub diff: PathBuf,
}

impl OutputPaths {
    /// `{prefix}MatchYOffset.bin`, `{prefix}MatchXOffset.bin` and `{prefix}MatchDiff.bin`.
    pub fn from_prefix(prefix: &str) -> Self {
        OutputPaths {
            offset_y: PathBuf::from(format!("{prefix}MatchYOffset.bin")),
            offset_x: PathBuf::from(format!("{prefix}MatchXOffset.bin")),
            diff: PathBuf::from(format!("{prefix}MatchDiff.bin")),
        }
    }
}

/// Per-pixel displacement and dissimilarity maps, each `height × width`, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    height: usize,
    width: usize,
    offset_y: Vec<i64>,
    offset_x: Vec<i64>,
    diff: Vec<f32>,
}

impl MatchResult {
    /// Allocates maps with zero offsets and [`NO_MATCH_DIFF`] everywhere.
    pub fn new(height: usize, width: usize) -> Self {
        let len = height * width;
        MatchResult {
            height,
            width,
            offset_y: vec![0; len],
            offset_x: vec![0; len],
            diff: vec![NO_MATCH_DIFF; len],
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn get(&self, y: usize, x: usize) -> PixelMatch {
        let index = y * self.width + x;
        PixelMatch {
            offset_y: self.offset_y[index],
            offset_x: self.offset_x[index],
            diff: self.diff[index],
        }
    }

    pub fn set(&mut self, y: usize, x: usize, pixel: PixelMatch) {
        let index = y * self.width + x;
        self.offset_y[index] = pixel.offset_y;
        self.offset_x[index] = pixel.offset_x;
        self.diff[index] = pixel.diff;
    }

    pub fn offsets_y(&self) -> &[i64] {
        &self.offset_y
    }

    pub fn offsets_x(&self) -> &[i64] {
        &self.offset_x
    }

    pub fn diffs(&self) -> &[f32] {
        &self.diff
    }

    /// Mutable access to the three maps at once so that disjoint rows can be filled
    /// independently.
    pub(crate) fn maps_mut(&mut self) -> (&mut [i64], &mut [i64], &mut [f32]) {
        (
            self.offset_y.as_mut_slice(),
            self.offset_x.as_mut_slice(),
            self.diff.as_mut_slice(),
        )
    }

    /// Writes the maps next to each other using `prefix`. Offsets are stored as
    /// little-endian `i64`, dissimilarities as little-endian `f32`, without header.
    ///
    /// If any of the three files cannot be written, the ones already produced by this call
    /// are removed again so that no incomplete result set is left behind.
    pub fn write_to_prefix(&self, prefix: &str) -> Result<OutputPaths> {
        let paths = OutputPaths::from_prefix(prefix);
        let writes: [(&Path, &dyn Fn(&Path) -> Result<()>); 3] = [
            (paths.offset_y.as_path(), &|path: &Path| {
                write_values(path, &self.offset_y, |v: i64| v.to_le_bytes())
            }),
            (paths.offset_x.as_path(), &|path: &Path| {
                write_values(path, &self.offset_x, |v: i64| v.to_le_bytes())
            }),
            (paths.diff.as_path(), &|path: &Path| {
                write_values(path, &self.diff, |v: f32| v.to_le_bytes())
            }),
        ];
        for (done, &(path, write)) in writes.iter().enumerate() {
            if let Err(e) = write(path) {
                // the failed file may hold a partial write; files that existed before this
                // call and were never reached are left alone
                for &(written, _) in &writes[..=done] {
                    if written.is_file() && std::fs::remove_file(written).is_ok() {
                        warn!("Removed incomplete output {}", written.display());
                    }
                }
                return Err(e);
            }
        }
        info!(
            "Wrote {}, {} and {}",
            paths.offset_y.display(),
            paths.offset_x.display(),
            paths.diff.display()
        );
        Ok(paths)
    }

    /// Reads back maps written by [`MatchResult::write_to_prefix`].
    pub fn read_from_prefix(prefix: &str, height: usize, width: usize) -> Result<Self> {
        let paths = OutputPaths::from_prefix(prefix);
        let len = height * width;
        Ok(MatchResult {
            height,
            width,
            offset_y: read_values(&paths.offset_y, len, i64::from_le_bytes)?,
            offset_x: read_values(&paths.offset_x, len, i64::from_le_bytes)?,
            diff: read_values(&paths.diff, len, f32::from_le_bytes)?,
        })
    }

    pub fn summary(&self) -> MatchSummary {
        let matched: Vec<f32> = self
            .diff
            .iter()
            .copied()
            .filter(|&d| d != NO_MATCH_DIFF)
            .collect();
        let mean_diff = if matched.is_empty() {
            0.0
        } else {
            matched.iter().map(|&d| d as f64).sum::<f64>() / matched.len() as f64
        };
        MatchSummary {
            pixels: self.diff.len(),
            unmatched: self.diff.len() - matched.len(),
            stationary: self
                .offset_y
                .iter()
                .zip(&self.offset_x)
                .filter(|&(&dy, &dx)| dy == 0 && dx == 0)
                .count(),
            mean_diff,
            max_diff: matched.iter().copied().fold(0.0, f32::max),
        }
    }

    /// Renders one offset map as a grey image, smallest offset black, largest white.
    pub fn offset_preview(&self, axis: OffsetAxis) -> GrayImage {
        let values = match axis {
            OffsetAxis::Y => &self.offset_y,
            OffsetAxis::X => &self.offset_x,
        };
        let min = values.iter().copied().min().unwrap_or(0);
        let max = values.iter().copied().max().unwrap_or(0);
        let range = (max - min) as f64;
        let width = self.width;
        GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let v = values[y as usize * width + x as usize];
            if range == 0.0 {
                Luma([128])
            } else {
                Luma([((v - min) as f64 / range * 255.0).round() as u8])
            }
        })
    }
}

/// Aggregate figures over a [`MatchResult`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchSummary {
    pub pixels: usize,
    /// Pixels still carrying [`NO_MATCH_DIFF`].
    pub unmatched: usize,
    /// Pixels whose best match is at the same position.
    pub stationary: usize,
    pub mean_diff: f64,
    pub max_diff: f32,
}

fn write_values<T: Copy, const N: usize>(
    path: &Path,
    values: &[T],
    encode: impl Fn(T) -> [u8; N],
) -> Result<()> {
    let file = File::create(path).map_err(|e| DaisyError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    for &value in values {
        writer
            .write_all(&encode(value))
            .map_err(|e| DaisyError::io(path, e))?;
    }
    writer.flush().map_err(|e| DaisyError::io(path, e))
}

fn read_values<T, const N: usize>(
    path: &Path,
    len: usize,
    decode: impl Fn([u8; N]) -> T,
) -> Result<Vec<T>> {
    let file = File::open(path).map_err(|e| DaisyError::io(path, e))?;
    let mut bytes = Vec::with_capacity(len * N);
    BufReader::new(file)
        .take((len * N) as u64)
        .read_to_end(&mut bytes)
        .map_err(|e| DaisyError::io(path, e))?;
    if bytes.len() < len * N {
        return Err(DaisyError::TruncatedFile {
            path: path.to_path_buf(),
            expected: len,
            available: bytes.len() / N,
        });
    }
    Ok(bytes
        .chunks_exact(N)
        .map(|chunk| {
            let mut raw = [0u8; N];
            raw.copy_from_slice(chunk);
            decode(raw)
        })
        .collect())
}
