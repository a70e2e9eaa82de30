//! `packset` — a compact, mmap-able store of packages, their versioned
//! `requires`/`provides`/`conflicts`/`obsoletes` properties, and their
//! installed-file trees.
//!
//! A [`set::Set`] is built once, in bulk, through [`importer::Importer`] and
//! [`finalizer::finalize`], then either queried in place or persisted with
//! [`set::Set::write_atomic`] and reopened zero-copy via [`set::Set::open`].
//! [`merge::merge`] combines two sets; [`resolve::validate`] and
//! [`resolve::update`] check and repair unsatisfied requirements.

pub mod buffer;
pub mod error;
pub mod finalizer;
pub mod importer;
pub mod merge;
pub mod query;
pub mod refword;
pub mod resolve;
pub mod set;
pub mod strpool;
mod util;
pub mod versioncmp;

pub use error::{Error, Result};
pub use set::Set;

#[cfg(test)]
#[path = "scenarios_test.rs"]
mod scenarios_test;
