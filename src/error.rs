//! Crate-wide error type and the `err_at!` construction macro.
//!
//! Every fallible call site tags its failure with one of these kinds and the
//! `file:line` it came from, rather than bubbling up anonymous `io::Error`s.
//! Adapters built on top of this crate match on kind; the core never logs an
//! error, it only ever returns one.

use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// Failure performing `open`/`stat`/`mmap`/`write`/`close`/`sync`.
    IOError(String, String),
    /// Header magic/version/section-table malformed beyond lenient recovery.
    InvalidFormat(String, String),
    /// A path could not be interpreted as a Set or section file.
    InvalidFile(String, String),
    /// A section's bytes could not be decoded into the records they claim.
    DecodeFail(String, String),
    /// A record could not be encoded into its section's byte layout.
    EncodeFail(String, String),
    /// A numeric conversion between width-bounded integer types failed.
    FailConvert(String, String),
    /// A 24-bit reference payload would overflow; fatal, no recovery path.
    CapacityExceeded(String, String),
    /// An invariant the rest of the crate relies on was violated.
    Fatal(String, String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (kind, at, msg) = match self {
            Error::IOError(at, msg) => ("io-error", at, msg),
            Error::InvalidFormat(at, msg) => ("invalid-format", at, msg),
            Error::InvalidFile(at, msg) => ("invalid-file", at, msg),
            Error::DecodeFail(at, msg) => ("decode-fail", at, msg),
            Error::EncodeFail(at, msg) => ("encode-fail", at, msg),
            Error::FailConvert(at, msg) => ("fail-convert", at, msg),
            Error::CapacityExceeded(at, msg) => ("capacity-exceeded", at, msg),
            Error::Fatal(at, msg) => ("fatal", at, msg),
        };
        write!(f, "{} {}: {}", at, kind, msg)
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// Tag a `Result`'s error with a kind and the call site, or build one
/// directly from a message.
///
/// ```ignore
/// err_at!(IOError, fs::metadata(path))?;
/// err_at!(IOError, fs::metadata(path), "reading {:?}", path)?;
/// err_at!(InvalidFile, msg: "{:?} is not a set file", path)?;
/// ```
#[macro_export]
macro_rules! err_at {
    ($v:ident, msg: $($arg:expr),+ $(,)?) => {{
        let prefix = format!("{}:{}", file!(), line!());
        Err($crate::Error::$v(prefix, format!($($arg),+)))
    }};
    ($v:ident, $e:expr $(,)?) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                Err($crate::Error::$v(prefix, err.to_string()))
            }
        }
    }};
    ($v:ident, $e:expr, $($arg:expr),+ $(,)?) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                Err($crate::Error::$v(prefix, format!("{}: {}", format!($($arg),+), err)))
            }
        }
    }};
}
