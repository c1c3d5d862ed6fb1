//! Error types for xmlx

use std::fmt;
use std::io;
use thiserror::Error;

/// Position in source input
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

/// Main error type for xmlx
#[derive(Error, Debug)]
pub enum Error {
    /// The underlying byte source or sink failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The tokenizer rejected the input as malformed XML.
    #[error("syntax error at {pos}: {message}")]
    Syntax { message: String, pos: Pos },

    /// The input declares an encoding that cannot be decoded.
    #[error("encoding {charset:?}: {message}")]
    Charset { charset: String, message: String },

    /// A remote document could not be fetched.
    #[error("http {status} fetching {uri}")]
    Http { status: u16, uri: String },
}

impl Error {
    /// Create a syntax error at a specific position
    pub fn syntax(message: impl Into<String>, pos: Pos) -> Self {
        Self::Syntax {
            message: message.into(),
            pos,
        }
    }

    pub fn charset(charset: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Charset {
            charset: charset.into(),
            message: message.into(),
        }
    }

    /// Returns true for malformed-input errors
    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax { .. })
    }

    /// Source position of a syntax error
    pub fn pos(&self) -> Option<Pos> {
        match self {
            Self::Syntax { pos, .. } => Some(*pos),
            _ => None,
        }
    }
}

/// Result type alias for xmlx
pub type Result<T> = std::result::Result<T, Error>;
