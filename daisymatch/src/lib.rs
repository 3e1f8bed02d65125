//! # DaisyMatch Library
//!
//! The `daisymatch` library provides tools for analyzing dense DAISY descriptor fields:
//! loading descriptor files, brute-force block matching of the descriptors of two images
//! into per-pixel displacement and dissimilarity maps, comparing single descriptors
//! between two files, and studying which DAISY petals fall inside a cropped region.
//!
//! ## Overview of Modules
//!
//! - **`descriptor_field`**: Loads a descriptor file (16 byte header followed by row-major
//!   `f32` descriptors) into an immutable [`DescriptorField`].
//!
//! - **`block_matcher`**: For every pixel of one field, searches a window of the other field
//!   for the descriptor with the smallest L1 distance.
//!
//! - **`search_window`**: Defines the searched neighbourhood, including the asymmetric
//!   layout existing match files were produced with.
//!
//! - **`distance`**: SIMD L1 distance between two descriptors.
//!
//! - **`match_result`**: The three output maps (row offset, column offset, distance) and
//!   their flat binary files.
//!
//! - **`daisy_grid`**: The fixed DAISY sampling geometry (centre plus three rings of petals).
//!
//! - **`petal_coverage`**: Counts the petals landing inside a crop window for every pixel
//!   of a canvas and rates crop sizes by how many petals arrive in adjacent pairs.
//!
//! - **`descriptor_compare`**: Reads the descriptor of a single pixel from two files and
//!   reports their difference.
//!
//! - **`error`**: The [`DaisyError`] type shared by all of the above.

pub mod block_matcher;
pub mod daisy_grid;
pub mod descriptor_compare;
pub mod descriptor_field;
pub mod distance;
pub mod error;
pub mod match_result;
pub mod petal_coverage;
pub mod search_window;

pub use block_matcher::BlockMatcher;
pub use descriptor_field::{DescriptorField, FieldDimensions};
pub use error::{DaisyError, Result};
pub use match_result::{MatchResult, OutputPaths, PixelMatch};
pub use search_window::{SearchWindow, WindowAlignment};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
