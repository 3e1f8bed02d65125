use std::path::PathBuf;

/// Everything that can stop an analysis run.
///
/// None of these are recoverable: the caller is expected to report the error and abort
/// without writing partial results.
#[derive(Debug, thiserror::Error)]
pub enum DaisyError {
    #[error("invalid dimension `{name}`: {value}")]
    InvalidDimension { name: &'static str, value: i64 },

    #[error(
        "{}: truncated data, expected {expected} elements but only {available} are available",
        path.display()
    )]
    TruncatedFile {
        path: PathBuf,
        expected: usize,
        available: usize,
    },

    #[error("descriptor fields differ in shape: {left} vs {right}")]
    DimensionMismatch { left: String, right: String },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DaisyError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DaisyError::Io {
            path: path.into(),
            source,
        }
    }

    /// Checks that `value` is strictly positive and converts it to `usize`.
    pub fn positive(name: &'static str, value: i64) -> Result<usize> {
        if value <= 0 {
            return Err(DaisyError::InvalidDimension { name, value });
        }
        usize::try_from(value).map_err(|_| DaisyError::InvalidDimension { name, value })
    }
}

pub type Result<T> = std::result::Result<T, DaisyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_rejects_zero_and_negative() {
        assert!(matches!(
            DaisyError::positive("height", 0),
            Err(DaisyError::InvalidDimension { name: "height", value: 0 })
        ));
        assert!(matches!(
            DaisyError::positive("width", -3),
            Err(DaisyError::InvalidDimension { name: "width", value: -3 })
        ));
        assert_eq!(DaisyError::positive("width", 7).unwrap(), 7);
    }

    #[test]
    fn messages_name_the_culprit() {
        let err = DaisyError::TruncatedFile {
            path: PathBuf::from("a.bdaisy"),
            expected: 10,
            available: 3,
        };
        let text = err.to_string();
        assert!(text.contains("a.bdaisy"));
        assert!(text.contains("10"));
    }
}
