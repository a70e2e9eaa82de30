//! Bulk ingestion: accumulate packages, their versioned
//! properties and their installed-file paths in whatever order the caller
//! discovers them. Nothing here sorts, dedups or builds the file tree — that
//! is `finalizer`'s job; the importer's only contract is "nothing is lost".

use crate::err_at;
use crate::error::Result;
use crate::refword::{PropertyKind, VersionRelation};
use crate::strpool::{InternTable, StringPool};

#[derive(Clone, Debug)]
pub struct RawProperty {
    pub kind: PropertyKind,
    pub name: u32,
    pub version: u32,
    pub relation: VersionRelation,
}

#[derive(Clone, Debug)]
pub struct RawPackage {
    pub name: u32,
    pub version: u32,
    pub properties: Vec<RawProperty>,
    /// Flat, slash-separated installed-file paths, one per file.
    pub files: Vec<String>,
}

/// Tuning knobs for a bulk import: buffers are pre-sized from an expected
/// record count rather than growing from empty one push at a time.
#[derive(Clone, Debug)]
pub struct ImporterConfig {
    pub expected_packages: usize,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        ImporterConfig {
            expected_packages: 256,
        }
    }
}

/// Output of a finished import: interned strings plus the raw, unsorted,
/// possibly-duplicate-laden package list ready for `finalizer::finalize`.
pub struct RawData {
    pub pool: StringPool,
    pub table: InternTable,
    pub packages: Vec<RawPackage>,
}

pub struct Importer {
    pool: StringPool,
    table: InternTable,
    packages: Vec<RawPackage>,
    current: Option<RawPackage>,
}

impl Importer {
    pub fn new(config: ImporterConfig) -> Importer {
        Importer {
            pool: StringPool::new(),
            table: InternTable::new(),
            packages: Vec::with_capacity(config.expected_packages),
            current: None,
        }
    }

    /// Open a new package record. Any previously begun package not yet
    /// finished is silently dropped, mirroring a caller that abandons a
    /// partially filled-in package on error.
    pub fn begin_package(&mut self, name: &str, version: &str) -> Result<()> {
        let name = self.table.tokenize(&mut self.pool, name)?;
        let version = self.table.tokenize(&mut self.pool, version)?;
        self.current = Some(RawPackage {
            name,
            version,
            properties: Vec::new(),
            files: Vec::new(),
        });
        Ok(())
    }

    pub fn add_property(
        &mut self,
        kind: PropertyKind,
        name: &str,
        version: &str,
        relation: VersionRelation,
    ) -> Result<()> {
        let pkg = self.current_mut()?;
        let name_off = self.table.tokenize(&mut self.pool, name)?;
        let version_off = self.table.tokenize(&mut self.pool, version)?;
        pkg.properties.push(RawProperty {
            kind,
            name: name_off,
            version: version_off,
            relation,
        });
        Ok(())
    }

    /// Record one installed file, given as a `/`-rooted path. Leading and
    /// trailing slashes are trimmed; the finalizer splits on `/` to build
    /// the directory tree.
    pub fn add_file(&mut self, path: &str) -> Result<()> {
        let pkg = self.current_mut()?;
        pkg.files.push(path.trim_matches('/').to_string());
        Ok(())
    }

    pub fn finish_package(&mut self) -> Result<()> {
        let pkg = self.current.take();
        match pkg {
            Some(pkg) => {
                self.packages.push(pkg);
                Ok(())
            }
            None => err_at!(Fatal, msg: "finish_package called with no package open"),
        }
    }

    pub fn finish(self) -> RawData {
        RawData {
            pool: self.pool,
            table: self.table,
            packages: self.packages,
        }
    }

    fn current_mut(&mut self) -> Result<&mut RawPackage> {
        match &mut self.current {
            Some(pkg) => Ok(pkg),
            None => err_at!(Fatal, msg: "no package open; call begin_package first"),
        }
    }
}

#[cfg(test)]
#[path = "importer_test.rs"]
mod importer_test;
