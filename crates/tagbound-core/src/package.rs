//! Package tree: maps files and module paths to declared packages.
//!
//! The tree is built once from package declarations and never mutated
//! afterwards, so it can be shared by reference across extraction workers.

use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::ConfigError;
use crate::tag::{TagError, TagSet, TagTable};
use crate::utils::paths::{dir_to_module_path, is_module_prefix, normalize};

/// Index of a package inside its [`PackageTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PackageId(usize);

impl PackageId {
    /// Wraps a raw index.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Raw index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A package declaration before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDecl {
    /// Root directory relative to the project root.
    pub root_path: PathBuf,
    /// Declared tags.
    pub tags: Vec<String>,
    /// Strict interface flag.
    pub strict: bool,
    /// Names from the entry module's interface declaration, if any.
    pub public_symbols: Option<Vec<String>>,
}

impl PackageDecl {
    /// Creates a non-strict declaration without a public interface.
    #[must_use]
    pub fn new<I, S>(root_path: impl Into<PathBuf>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            root_path: root_path.into(),
            tags: tags.into_iter().map(Into::into).collect(),
            strict: false,
            public_symbols: None,
        }
    }

    /// Sets the strict flag.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets the public interface.
    #[must_use]
    pub fn with_public_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.public_symbols = Some(symbols.into_iter().map(Into::into).collect());
        self
    }
}

/// A validated package.
#[derive(Debug, Clone, Serialize)]
pub struct Package {
    /// Handle of this package in its tree.
    pub id: PackageId,
    /// Normalized root directory relative to the project root.
    pub root_path: PathBuf,
    /// Dotted module path of the root directory.
    pub module_path: String,
    /// Interned tags, never empty.
    pub tags: TagSet,
    /// Strict interface flag.
    pub strict: bool,
    /// Declared public interface in declaration order, without duplicates.
    pub public_symbols: Option<Vec<String>>,
}

impl Package {
    /// Returns true if `symbol` is part of the declared public interface.
    #[must_use]
    pub fn exports(&self, symbol: &str) -> bool {
        self.public_symbols
            .as_ref()
            .is_some_and(|symbols| symbols.iter().any(|s| s == symbol))
    }

    /// Display name: the root path with `/` separators.
    #[must_use]
    pub fn name(&self) -> String {
        self.root_path.to_string_lossy().replace('\\', "/")
    }
}

/// Immutable snapshot of every package in a project.
#[derive(Debug, Clone, Default)]
pub struct PackageTree {
    packages: Vec<Package>,
    tags: TagTable,
    /// Package indices sorted by module path length, longest first.
    by_module: Vec<usize>,
}

impl PackageTree {
    /// Validates declarations and builds the tree.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a package with no tags, a blank tag, a
    /// duplicated root, a root outside every source root, or a strict package
    /// without a declared interface.
    pub fn build(decls: Vec<PackageDecl>, source_roots: &[PathBuf]) -> Result<Self, ConfigError> {
        let mut tags = TagTable::new();
        let mut packages = Vec::with_capacity(decls.len());
        let mut seen_roots: HashSet<PathBuf> = HashSet::new();

        for decl in decls {
            let root_path = normalize(&decl.root_path);
            let name = root_path.to_string_lossy().replace('\\', "/");

            if decl.tags.is_empty() {
                return Err(ConfigError::MissingTags { package: name });
            }
            if !seen_roots.insert(root_path.clone()) {
                return Err(ConfigError::DuplicateRoot { path: name });
            }

            let mut set = TagSet::new();
            for (i, raw) in decl.tags.iter().enumerate() {
                let id = tags.intern(raw).map_err(|TagError::Blank| ConfigError::BlankTag {
                    context: format!("package '{name}' tags[{i}]"),
                })?;
                set.insert(id);
            }

            let module_path = dir_to_module_path(source_roots, &root_path)
                .ok_or_else(|| ConfigError::OutsideSourceRoots {
                    package: name.clone(),
                })?;

            let public_symbols = decl.public_symbols.map(|symbols| {
                let mut unique: Vec<String> = Vec::with_capacity(symbols.len());
                for s in symbols {
                    if !unique.contains(&s) {
                        unique.push(s);
                    }
                }
                unique
            });

            if decl.strict && public_symbols.is_none() {
                return Err(ConfigError::StrictWithoutInterface { package: name });
            }

            packages.push(Package {
                id: PackageId(packages.len()),
                root_path,
                module_path,
                tags: set,
                strict: decl.strict,
                public_symbols,
            });
        }

        let mut by_module: Vec<usize> = (0..packages.len()).collect();
        by_module.sort_by(|&a, &b| {
            packages[b]
                .module_path
                .len()
                .cmp(&packages[a].module_path.len())
                .then_with(|| packages[a].module_path.cmp(&packages[b].module_path))
        });

        tracing::debug!(
            "Resolved {} package(s) with {} distinct tag(s)",
            packages.len(),
            tags.len()
        );

        Ok(Self {
            packages,
            tags,
            by_module,
        })
    }

    /// Which package does this project-relative file belong to?
    ///
    /// Returns the innermost package whose root encloses the file.
    #[must_use]
    pub fn resolve(&self, file_path: &Path) -> Option<&Package> {
        let file = normalize(file_path);
        self.packages
            .iter()
            .filter(|p| file.starts_with(&p.root_path))
            .max_by_key(|p| p.root_path.components().count())
    }

    /// Which package does this dotted module path belong to?
    ///
    /// Resolution uses longest-prefix-match so nested packages take priority
    /// over their parents.
    #[must_use]
    pub fn resolve_module(&self, module_path: &str) -> Option<&Package> {
        self.by_module
            .iter()
            .map(|&i| &self.packages[i])
            .find(|p| is_module_prefix(&p.module_path, module_path))
    }

    /// Looks up a package by handle.
    #[must_use]
    pub fn get(&self, id: PackageId) -> Option<&Package> {
        self.packages.get(id.0)
    }

    /// Looks up a package by its root directory.
    #[must_use]
    pub fn find_by_root(&self, root: &Path) -> Option<&Package> {
        let root = normalize(root);
        self.packages.iter().find(|p| p.root_path == root)
    }

    /// All packages in declaration order.
    #[must_use]
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// The tag table shared by every package.
    #[must_use]
    pub fn tags(&self) -> &TagTable {
        &self.tags
    }

    /// Number of packages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Returns true if no package is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
