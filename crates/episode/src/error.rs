use thiserror::Error;

/// Errors raised while validating episode data or parsing mesh sources.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("sequence has no frames")]
    EmptySequence,

    #[error("frame {frame} holds {len} values, expected a multiple of {stride}")]
    BadStride {
        frame: usize,
        len: usize,
        stride: usize,
    },

    #[error("frame {frame} holds {found} points, expected {expected} like frame 0")]
    RaggedFrame {
        frame: usize,
        found: usize,
        expected: usize,
    },

    #[error("OBJ line {line}: {reason}")]
    Obj { line: usize, reason: String },

    #[error("MTL line {line}: {reason}")]
    Mtl { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DataError {
    pub(crate) fn obj(line: usize, reason: impl Into<String>) -> Self {
        Self::Obj {
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn mtl(line: usize, reason: impl Into<String>) -> Self {
        Self::Mtl {
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = DataError> = std::result::Result<T, E>;
