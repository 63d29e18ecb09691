//! Reconciles declared constraints with the observed import graph.
//!
//! Sync works on tag names rather than interned handles so that declared
//! constraints naming tags no package carries can still be pruned.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::check::CheckError;
use crate::config::{Constraint, ProjectConfig};
use crate::graph::ImportGraph;
use crate::package::PackageTree;

/// One `(source, allowed)` tag dependency.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TagPair {
    /// Tag of the importing package.
    pub source_tag: String,
    /// Tag of the imported package.
    pub allowed_tag: String,
}

impl TagPair {
    /// Creates a pair.
    #[must_use]
    pub fn new(source_tag: impl Into<String>, allowed_tag: impl Into<String>) -> Self {
        Self {
            source_tag: source_tag.into(),
            allowed_tag: allowed_tag.into(),
        }
    }
}

impl std::fmt::Display for TagPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.source_tag, self.allowed_tag)
    }
}

/// Changes that bring the declared constraints in line with the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConstraintPatch {
    /// Observed pairs that are not declared, sorted.
    pub additions: Vec<TagPair>,
    /// Declared pairs with no observed support, sorted. Empty unless pruning.
    pub prunes: Vec<TagPair>,
}

impl ConstraintPatch {
    /// Returns true if nothing would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.prunes.is_empty()
    }

    /// Applies the patch to a configuration.
    ///
    /// Additions join the first constraint for their tag, or a new one is
    /// appended. Pruned pairs are removed from every constraint for their
    /// tag. Constraints left without dependencies stay in place.
    pub fn apply(&self, config: &mut ProjectConfig) {
        for pair in &self.additions {
            config.add_dependencies_to_tag(&pair.source_tag, [pair.allowed_tag.as_str()]);
        }
        for pair in &self.prunes {
            config.remove_dependency(&pair.source_tag, &pair.allowed_tag);
        }
    }
}

/// Computes the patch between `declared` and the pairs observed in `graph`.
///
/// Suppressed edges are not observations. Prunes never include an observed
/// pair.
///
/// # Errors
///
/// Returns [`CheckError::Internal`] if an edge names a package missing from
/// `tree`.
pub fn sync(
    graph: &ImportGraph,
    tree: &PackageTree,
    declared: &[Constraint],
    prune: bool,
) -> Result<ConstraintPatch, CheckError> {
    let tags = tree.tags();
    let mut observed: BTreeSet<TagPair> = BTreeSet::new();
    for edge in graph.active_edges() {
        let from = tree
            .get(edge.from_package)
            .ok_or(CheckError::Internal(edge.from_package.index()))?;
        let to = tree
            .get(edge.to_package)
            .ok_or(CheckError::Internal(edge.to_package.index()))?;
        for source in from.tags.iter() {
            for target in to.tags.iter() {
                observed.insert(TagPair::new(tags.name(source), tags.name(target)));
            }
        }
    }

    let declared: BTreeSet<TagPair> = declared
        .iter()
        .flat_map(|c| {
            c.depends_on
                .iter()
                .map(move |d| TagPair::new(c.tag.trim(), d.trim()))
        })
        .collect();

    let additions: Vec<TagPair> = observed.difference(&declared).cloned().collect();
    let prunes: Vec<TagPair> = if prune {
        declared.difference(&observed).cloned().collect()
    } else {
        Vec::new()
    };

    tracing::debug!(
        "Observed {} tag pair(s): {} to add, {} to prune",
        observed.len(),
        additions.len(),
        prunes.len()
    );
    Ok(ConstraintPatch { additions, prunes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::testing::LineExtractor;
    use crate::extractor::SourceFile;
    use crate::graph::GraphBuilder;
    use crate::package::PackageDecl;
    use std::path::PathBuf;

    fn graph_and_tree(files: &[SourceFile]) -> (ImportGraph, PackageTree) {
        let roots = vec![PathBuf::from(".")];
        let tree = PackageTree::build(
            vec![
                PackageDecl::new("utils", ["utils"]),
                PackageDecl::new("db", ["db"]),
                PackageDecl::new("core", ["core"]),
            ],
            &roots,
        )
        .unwrap();
        let graph = GraphBuilder::new(&tree, &LineExtractor, &roots)
            .build(files)
            .unwrap();
        (graph, tree)
    }

    fn files() -> Vec<SourceFile> {
        vec![
            SourceFile::new("core/service.py", "from db import Session\n"),
            SourceFile::new("utils/helpers.py", "from core import PublicAPI\n"),
        ]
    }

    fn config() -> ProjectConfig {
        ProjectConfig {
            constraints: vec![
                Constraint::new("core", ["db", "utils"]),
                Constraint::new("db", ["utils"]),
            ],
            ..ProjectConfig::default()
        }
    }

    #[test]
    fn without_prune_only_adds() {
        let (graph, tree) = graph_and_tree(&files());
        let patch = sync(&graph, &tree, &config().constraints, false).unwrap();
        assert_eq!(patch.additions, vec![TagPair::new("utils", "core")]);
        assert!(patch.prunes.is_empty());
    }

    #[test]
    fn prune_removes_unsupported_pairs() {
        let (graph, tree) = graph_and_tree(&files());
        let patch = sync(&graph, &tree, &config().constraints, true).unwrap();
        assert_eq!(patch.additions, vec![TagPair::new("utils", "core")]);
        assert_eq!(
            patch.prunes,
            vec![TagPair::new("core", "utils"), TagPair::new("db", "utils")]
        );
    }

    #[test]
    fn apply_then_resync_is_empty() {
        let (graph, tree) = graph_and_tree(&files());
        for prune in [false, true] {
            let mut cfg = config();
            let patch = sync(&graph, &tree, &cfg.constraints, prune).unwrap();
            patch.apply(&mut cfg);
            let again = sync(&graph, &tree, &cfg.constraints, prune).unwrap();
            assert!(again.is_empty(), "prune={prune}: {again:?}");
        }
    }

    #[test]
    fn padded_tags_converge_after_one_pass() {
        let (graph, tree) = graph_and_tree(&files());
        let mut cfg = ProjectConfig {
            constraints: vec![
                Constraint::new(" core", [" utils ", "db"]),
                Constraint::new("utils ", Vec::<String>::new()),
            ],
            ..ProjectConfig::default()
        };
        let patch = sync(&graph, &tree, &cfg.constraints, true).unwrap();
        assert_eq!(patch.prunes, vec![TagPair::new("core", "utils")]);
        patch.apply(&mut cfg);
        assert_eq!(cfg.constraints.len(), 2);
        assert!(sync(&graph, &tree, &cfg.constraints, true).unwrap().is_empty());
    }

    #[test]
    fn apply_keeps_emptied_constraints() {
        let (graph, tree) = graph_and_tree(&files());
        let mut cfg = config();
        sync(&graph, &tree, &cfg.constraints, true)
            .unwrap()
            .apply(&mut cfg);
        assert_eq!(
            cfg.constraints,
            vec![
                Constraint::new("core", ["db"]),
                Constraint::new("db", Vec::<String>::new()),
                Constraint::new("utils", ["core"]),
            ]
        );
    }

    #[test]
    fn suppressed_edges_are_not_observed() {
        let (graph, tree) = graph_and_tree(&[SourceFile::new(
            "utils/helpers.py",
            "# tagbound: ignore\nfrom core import A\n",
        )]);
        let patch = sync(&graph, &tree, &[], false).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn unknown_declared_tags_are_pruned_not_rejected() {
        let (graph, tree) = graph_and_tree(&files());
        let declared = vec![Constraint::new("legacy", ["core"])];
        let patch = sync(&graph, &tree, &declared, true).unwrap();
        assert_eq!(patch.prunes, vec![TagPair::new("legacy", "core")]);
    }
}
