//! Read-only queries over a finalized `Set`, plus the `list_files` glob
//! lookup grounded on `original_source/razor.c`'s `razor_set_list_files`.
//!
//! Packages and properties are sorted by name (then version), so matching
//! names form one contiguous run; file-tree siblings are sorted too, since
//! the finalizer lays them out from a `BTreeMap`.

use crate::set::{PackageRecord, PropertyRecord, SectionType, Set};

impl Set {
    /// First package index whose name is `>= name` (the start of `name`'s
    /// run, or where it would be inserted if absent).
    fn package_lower_bound(&self, name: &str) -> u32 {
        let mut lo = 0u32;
        let mut hi = self.package_count() as u32;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.string(self.package(mid).name) < name {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// First property index whose name is `>= name`.
    fn property_lower_bound(&self, name: &str) -> u32 {
        let mut lo = 0u32;
        let mut hi = self.property_count() as u32;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.string(self.property(mid).name.payload()) < name {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// The package named `name`, if any. Packages are sorted by name then
    /// version, so a binary search locates the run and its first entry (the
    /// lowest version present) in O(log n).
    pub fn get_package(&self, name: &str) -> Option<PackageRecord> {
        let idx = self.package_lower_bound(name);
        if idx < self.package_count() as u32 && self.string(self.package(idx).name) == name {
            Some(self.package(idx))
        } else {
            None
        }
    }

    /// Index of the property named `name`, if any (the lowest-sorted match).
    pub fn get_property(&self, name: &str) -> Option<u32> {
        let idx = self.property_lower_bound(name);
        if idx < self.property_count() as u32 && self.string(self.property(idx).name.payload()) == name {
            Some(idx)
        } else {
            None
        }
    }

    /// Indices of every package named `name`, in version order. Packages are
    /// sorted by name then version, so a binary search finds the start of
    /// the run and the rest is a forward scan over just that run.
    pub fn find_packages(&self, name: &str) -> Vec<u32> {
        let count = self.package_count() as u32;
        let mut idx = self.package_lower_bound(name);
        let mut out = Vec::new();
        while idx < count && self.string(self.package(idx).name) == name {
            out.push(idx);
            idx += 1;
        }
        out
    }

    /// Indices of every property named `name`, in kind/version order.
    pub fn find_properties(&self, name: &str) -> Vec<u32> {
        let count = self.property_count() as u32;
        let mut idx = self.property_lower_bound(name);
        let mut out = Vec::new();
        while idx < count && self.string(self.property(idx).name.payload()) == name {
            out.push(idx);
            idx += 1;
        }
        out
    }

    pub fn packages(&self) -> impl Iterator<Item = (u32, PackageRecord)> + '_ {
        (0..self.package_count() as u32).map(move |i| (i, self.package(i)))
    }

    pub fn properties(&self) -> impl Iterator<Item = (u32, PropertyRecord)> + '_ {
        (0..self.property_count() as u32).map(move |i| (i, self.property(i)))
    }

    /// Indices of packages that carry property `prop_idx`.
    pub fn property_packages(&self, prop_idx: u32) -> Vec<u32> {
        let prop = self.property(prop_idx);
        self.ref_list(SectionType::PackagePool, prop.packages)
    }

    /// Indices of file-tree entries installed by package `pkg_idx`.
    pub fn package_files(&self, pkg_idx: u32) -> Vec<u32> {
        let pkg = self.package(pkg_idx);
        self.ref_list(SectionType::FilePool, pkg.files)
    }

    /// Indices of properties carried by package `pkg_idx`.
    pub fn package_properties(&self, pkg_idx: u32) -> Vec<u32> {
        let pkg = self.package(pkg_idx);
        self.ref_list(SectionType::PropertyPool, pkg.properties)
    }

    /// Packages that own file-tree entry `entry_idx`.
    pub fn file_packages(&self, entry_idx: u32) -> Vec<u32> {
        let entry = self.file_entry(entry_idx);
        self.ref_list(SectionType::PackagePool, entry.packages)
    }

    /// Walk the file tree along `path`'s `/`-separated components, returning
    /// the entry index of the final component if the whole path exists.
    pub fn find_entry(&self, path: &str) -> Option<u32> {
        let mut children = self.root_children();
        let mut current: Option<u32> = None;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let found = children
                .iter()
                .find(|&&idx| self.string(self.file_entry(idx).name.payload()) == segment)?;
            current = Some(*found);
            children = self.children_of(*found);
        }
        current
    }

    fn root_children(&self) -> Vec<u32> {
        self.siblings_from(0)
    }

    fn children_of(&self, entry_idx: u32) -> Vec<u32> {
        let entry = self.file_entry(entry_idx);
        if entry.first_child == u32::MAX {
            return Vec::new();
        }
        self.siblings_from(entry.first_child)
    }

    fn siblings_from(&self, start: u32) -> Vec<u32> {
        if self.file_count() == 0 {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut idx = start;
        loop {
            let entry = self.file_entry(idx);
            out.push(idx);
            if entry.name.is_last() {
                break;
            }
            idx += 1;
        }
        out
    }

    /// Reconstruct the full `/`-joined path of file-tree entry `entry_idx`
    /// by walking the tree from the root and matching descendants; O(n) in
    /// the number of entries, acceptable for the diagnostic/listing use this
    /// exists for.
    fn path_of(&self, target: u32, prefix: &str, children: &[u32]) -> Option<String> {
        for &idx in children {
            let entry = self.file_entry(idx);
            let name = self.string(entry.name.payload());
            let path = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{}/{}", prefix, name)
            };
            if idx == target {
                return Some(path);
            }
            if let Some(found) = self.path_of(target, &path, &self.children_of(idx)) {
                return Some(found);
            }
        }
        None
    }

    /// All installed-file paths matching a `*`-glob pattern, grounded on
    /// `razor_set_list_files`'s glob-filtered directory walk.
    pub fn list_files(&self, pattern: &str) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_paths(&self.root_children(), String::new(), pattern, &mut out);
        out
    }

    fn collect_paths(&self, children: &[u32], prefix: &str, pattern: &str, out: &mut Vec<String>) {
        for &idx in children {
            let entry = self.file_entry(idx);
            let name = self.string(entry.name.payload());
            let path = if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{}/{}", prefix, name)
            };
            if glob_match(pattern, &path) {
                out.push(path.clone());
            }
            self.collect_paths(&self.children_of(idx), &path, pattern, out);
        }
    }

    /// Full `/`-joined path of a file-tree entry, or `None` if `entry_idx`
    /// is out of range.
    pub fn entry_path(&self, entry_idx: u32) -> Option<String> {
        if entry_idx as usize >= self.file_count() {
            return None;
        }
        self.path_of(entry_idx, "", &self.root_children())
    }
}

/// Simple glob matching supporting `*` (any run of characters) and literal
/// bytes elsewhere; matches `original_source`'s shell-style file patterns.
fn glob_match(pattern: &str, text: &str) -> bool {
    fn helper(p: &[u8], t: &[u8]) -> bool {
        match p.first() {
            None => t.is_empty(),
            Some(b'*') => helper(&p[1..], t) || (!t.is_empty() && helper(p, &t[1..])),
            Some(&c) => !t.is_empty() && t[0] == c && helper(&p[1..], &t[1..]),
        }
    }
    helper(pattern.as_bytes(), text.as_bytes())
}

#[cfg(test)]
#[path = "query_test.rs"]
mod query_test;
