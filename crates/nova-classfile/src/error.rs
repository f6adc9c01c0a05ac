use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A modified UTF-8 sequence was truncated or malformed at `offset`.
    InvalidModifiedUtf8 { offset: usize },
    InvalidDescriptor(String),
    /// `offset..offset + len` does not fit inside a buffer of `buffer_len` bytes.
    SpanOutOfBounds {
        offset: usize,
        len: usize,
        buffer_len: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidModifiedUtf8 { offset } => {
                write!(f, "invalid modified UTF-8 at byte offset {offset}")
            }
            Error::InvalidDescriptor(desc) => write!(f, "invalid descriptor: {desc}"),
            Error::SpanOutOfBounds {
                offset,
                len,
                buffer_len,
            } => write!(
                f,
                "span {offset}..{} is out of bounds for buffer of length {buffer_len}",
                offset.saturating_add(*len)
            ),
        }
    }
}

impl std::error::Error for Error {}
