use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::figure::FigureTree;
use super::project::today;

/// A tracked project output registered in the manifest.
///
/// Artifacts are keyed by name in the manifest's `artifacts` mapping, so
/// identifiers are unique by construction. A `figure` tree describing the
/// sources that contribute to the output may only be attached to artifacts
/// of kind [`ArtifactKind::Figure`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    /// Project-relative path to the output file.
    pub path: String,
    pub kind: ArtifactKind,
    #[serde(default)]
    pub status: ArtifactStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "today")]
    pub created: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<NaiveDate>,
    /// Hierarchical breakdown of the sources behind a figure output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub figure: Option<FigureTree>,
}

impl Artifact {
    pub fn new(path: impl Into<String>, kind: ArtifactKind) -> Self {
        Self {
            path: path.into(),
            kind,
            status: ArtifactStatus::Draft,
            description: None,
            created: today(),
            updated: None,
            figure: None,
        }
    }
}

/// The kind of output an artifact represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Figure,
    Table,
    Dataset,
    Model,
    Script,
}

impl ArtifactKind {
    pub const ALL: &'static [ArtifactKind] = &[
        Self::Figure,
        Self::Table,
        Self::Dataset,
        Self::Model,
        Self::Script,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Figure => "figure",
            Self::Table => "table",
            Self::Dataset => "dataset",
            Self::Model => "model",
            Self::Script => "script",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "figure" => Some(Self::Figure),
            "table" => Some(Self::Table),
            "dataset" => Some(Self::Dataset),
            "model" => Some(Self::Model),
            "script" => Some(Self::Script),
            _ => None,
        }
    }
}

/// Delivery status of an artifact.
///
/// Which statuses are reachable depends on the artifact kind; see
/// [`crate::schema::allowed_statuses`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    #[default]
    Draft,
    Ready,
    Delivered,
    Published,
}

impl ArtifactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Ready => "ready",
            Self::Delivered => "delivered",
            Self::Published => "published",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "ready" => Some(Self::Ready),
            "delivered" => Some(Self::Delivered),
            "published" => Some(Self::Published),
            _ => None,
        }
    }
}
