//! Constraint checking over the import graph.
//!
//! Two rules are evaluated per edge, independently:
//! tag constraints (`TB001`) and strict interfaces (`TB002`).

use std::collections::HashMap;

use crate::config::{ConfigError, Constraint};
use crate::graph::{ImportEdge, ImportGraph, ImportedSymbol};
use crate::package::{Package, PackageId, PackageTree};
use crate::tag::{TagId, TagSet, TagTable};
use crate::types::{Violation, ViolationKind};

/// Fatal failure while checking.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// An edge references a package the tree does not know.
    #[error("internal error: edge references unknown package #{0}")]
    Internal(usize),
}

/// Declared constraints with every tag interned.
///
/// Duplicate entries for one tag are merged by union.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    allowed: HashMap<TagId, TagSet>,
}

impl ConstraintSet {
    /// Interns the declared constraints against the project's tag table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownTag`] if a constraint names a tag that no
    /// package carries.
    pub fn new(constraints: &[Constraint], tags: &TagTable) -> Result<Self, ConfigError> {
        let lookup = |raw: &str, context: String| {
            tags.get(raw).ok_or_else(|| ConfigError::UnknownTag {
                tag: raw.to_string(),
                context,
            })
        };

        let mut allowed: HashMap<TagId, TagSet> = HashMap::new();
        for (i, c) in constraints.iter().enumerate() {
            let source = lookup(&c.tag, format!("constraints[{i}].tag"))?;
            let entry = allowed.entry(source).or_default();
            for (j, dep) in c.depends_on.iter().enumerate() {
                entry.insert(lookup(dep, format!("constraints[{i}].depends_on[{j}]"))?);
            }
        }
        Ok(Self { allowed })
    }

    /// Union of allowed tags over every tag in `from`.
    #[must_use]
    pub fn allowed_for(&self, from: &TagSet) -> TagSet {
        let mut out = TagSet::new();
        for tag in from.iter() {
            if let Some(deps) = self.allowed.get(&tag) {
                out.extend_from(deps);
            }
        }
        out
    }

    /// Returns true if some tag of `from` may depend on some tag of `to`.
    #[must_use]
    pub fn permits(&self, from: &TagSet, to: &TagSet) -> bool {
        self.allowed_for(from).intersects(to)
    }
}

/// Evaluates every non-suppressed edge against the constraints.
///
/// Violations come back sorted by file, line, column and code.
///
/// # Errors
///
/// Returns [`CheckError::Internal`] if an edge names a package missing from
/// `tree`.
pub fn check(
    graph: &ImportGraph,
    tree: &PackageTree,
    constraints: &ConstraintSet,
) -> Result<Vec<Violation>, CheckError> {
    let mut violations = Vec::new();

    for edge in graph.active_edges() {
        let from = package(tree, edge.from_package)?;
        let to = package(tree, edge.to_package)?;

        if !constraints.permits(&from.tags, &to.tags) {
            violations.push(undeclared(edge, from, to, tree.tags()));
        }
        if to.strict && !through_interface(edge, to) {
            violations.push(strict(edge, from, to));
        }
    }

    violations.sort_by(|a, b| {
        a.location
            .cmp(&b.location)
            .then_with(|| a.code().cmp(b.code()))
            .then_with(|| a.edge.imported_symbol.cmp(&b.edge.imported_symbol))
    });

    tracing::debug!(
        "Checked {} edge(s), {} violation(s)",
        graph.len(),
        violations.len()
    );
    Ok(violations)
}

fn package(tree: &PackageTree, id: PackageId) -> Result<&Package, CheckError> {
    tree.get(id).ok_or(CheckError::Internal(id.index()))
}

/// Wildcards never go through the interface.
fn through_interface(edge: &ImportEdge, to: &Package) -> bool {
    edge.imported_symbol
        .as_name()
        .is_some_and(|name| edge.module_path == to.module_path && to.exports(name))
}

fn undeclared(edge: &ImportEdge, from: &Package, to: &Package, tags: &TagTable) -> Violation {
    Violation::new(
        ViolationKind::UndeclaredDependency,
        edge.clone(),
        format!(
            "Cannot import '{}'. Tags {} of '{}' cannot depend on {} of '{}'.",
            edge.qualified_path(),
            tags.display(&from.tags),
            from.name(),
            tags.display(&to.tags),
            to.name(),
        ),
    )
}

fn strict(edge: &ImportEdge, from: &Package, to: &Package) -> Violation {
    let detail = match &edge.imported_symbol {
        ImportedSymbol::Wildcard => format!(
            "Importing '{}' as a whole from '{}' bypasses its public interface.",
            edge.module_path,
            from.name()
        ),
        ImportedSymbol::Name(_) => format!(
            "The import '{}' (in '{}') is not listed in the package's __all__.",
            edge.qualified_path(),
            from.name()
        ),
    };
    Violation::new(
        ViolationKind::StrictInterfaceViolation,
        edge.clone(),
        format!(
            "Package '{}' is in strict mode. Only imports from its public interface are allowed. {detail}",
            to.name()
        ),
    )
}
