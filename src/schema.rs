//! Declarative schema rules for the manifest document.
//!
//! This module has no behavior of its own: it is the queryable contract
//! the validation engine checks against — which statuses an artifact
//! kind may take, where a figure tree may appear.

use crate::models::{ArtifactKind, ArtifactStatus};

/// File name of the manifest at the project root.
pub const MANIFEST_FILE: &str = "manifest.yaml";

/// Statuses an artifact of the given kind may take.
///
/// `published` is reserved for publication-facing outputs (figures,
/// tables, datasets); models and scripts stop at `delivered`.
pub fn allowed_statuses(kind: ArtifactKind) -> &'static [ArtifactStatus] {
    match kind {
        ArtifactKind::Figure | ArtifactKind::Table | ArtifactKind::Dataset => &[
            ArtifactStatus::Draft,
            ArtifactStatus::Ready,
            ArtifactStatus::Delivered,
            ArtifactStatus::Published,
        ],
        ArtifactKind::Model | ArtifactKind::Script => &[
            ArtifactStatus::Draft,
            ArtifactStatus::Ready,
            ArtifactStatus::Delivered,
        ],
    }
}

/// Whether an artifact of this kind may carry a figure tree.
pub fn kind_allows_figure_tree(kind: ArtifactKind) -> bool {
    matches!(kind, ArtifactKind::Figure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn published_is_not_allowed_for_scripts() {
        assert!(!allowed_statuses(ArtifactKind::Script).contains(&ArtifactStatus::Published));
        assert!(allowed_statuses(ArtifactKind::Figure).contains(&ArtifactStatus::Published));
    }

    #[test]
    fn only_figures_carry_figure_trees() {
        assert!(kind_allows_figure_tree(ArtifactKind::Figure));
        assert!(!kind_allows_figure_tree(ArtifactKind::Dataset));
    }
}
