use crate::SectionKind;
use core::fmt;

/// An error encountered while decoding a module or compiling a predicate
/// list.
///
/// Decoding errors carry the byte offset, relative to the start of the input,
/// at which the problem was detected. Compiler-side errors have no offset.
#[derive(Debug)]
pub struct Error {
    // Boxed so that the error is one word and `Result`s stay small.
    inner: Box<ErrorInner>,
}

#[derive(Debug)]
struct ErrorInner {
    kind: ErrorKind,
    offset: Option<usize>,
}

/// The result type used throughout this crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// The kind of error.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The input does not start with the `\0asm` magic and version 1 header.
    #[error("magic header not detected")]
    BadHeader,

    /// A declared length exceeds the bytes remaining in the input.
    #[error("unexpected end-of-file")]
    TruncatedInput,

    /// A LEB128 integer was overlong or too large for its type.
    #[error("invalid var_u32: {0}")]
    InvalidVarInt(&'static str),

    /// A length-prefixed item count exceeds this crate's hard limits.
    #[error("{0} size is out of bounds")]
    SizeOutOfBounds(&'static str),

    /// A section id byte is not one this format defines.
    #[error("unknown section id (0x{0:x})")]
    UnknownSection(u8),

    /// A feature's negation flag was encoded as something other than 0 or 1.
    #[error("invalid negation flag (0x{0:x}) for feature, must be 0 or 1")]
    MalformedFeature(u8),

    /// A feature name was not valid UTF-8.
    #[error("malformed UTF-8 encoding in feature name")]
    InvalidUtf8,

    /// The contents of a satisfied conditional section were themselves a
    /// conditional section.
    #[error("conditional section contents may not themselves be conditional")]
    NestedConditional,

    /// Bytes remained after the single section record a field is required to
    /// contain.
    #[error("extra bytes after section contents")]
    TrailingBytes,

    /// A section kind reappeared after a later-ordered kind had already been
    /// seen in the resolved stream.
    #[error("{0} section cannot reopen after a later section kind")]
    SectionOrder(SectionKind),

    /// The summed data count of all data count sections overflowed.
    #[error("data count sum exceeds the representable range")]
    CountOverflow,

    /// The predicate compiler was invoked with zero alternatives.
    #[error("cannot compile an empty priority list")]
    EmptyPriorityList,
}

impl Error {
    #[cold]
    pub(crate) fn new(kind: ErrorKind, offset: usize) -> Self {
        Error {
            inner: Box::new(ErrorInner {
                kind,
                offset: Some(offset),
            }),
        }
    }

    #[cold]
    pub(crate) fn eof(offset: usize) -> Self {
        Error::new(ErrorKind::TruncatedInput, offset)
    }

    /// Get the kind of error that this is.
    pub fn kind(&self) -> &ErrorKind {
        &self.inner.kind
    }

    /// Get the offset within the input where the error occurred, if the error
    /// came from decoding.
    pub fn offset(&self) -> Option<usize> {
        self.inner.offset
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error {
            inner: Box::new(ErrorInner { kind, offset: None }),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.inner.offset {
            Some(offset) => write!(f, "{} (at offset 0x{offset:x})", self.inner.kind),
            None => write!(f, "{}", self.inner.kind),
        }
    }
}

impl std::error::Error for Error {}
