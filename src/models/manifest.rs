use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::artifact::Artifact;
use super::project::Project;
use super::worklog::Worklog;

/// The root aggregate: everything `manifest.yaml` holds for one project.
///
/// A `Manifest` value in memory is always schema-valid — construction from
/// raw data goes through [`crate::validate::validate`], and every save
/// re-validates the serialized form before it reaches disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub project: Project,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyst: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Tracked outputs, keyed by artifact name. Keys are unique by
    /// construction; insertion order is irrelevant.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub artifacts: BTreeMap<String, Artifact>,
    #[serde(default, skip_serializing_if = "worklog_is_empty")]
    pub worklog: Worklog,
    /// Free-form key/value metadata, passed through untouched.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_yaml::Value>,
}

impl Manifest {
    /// Empty template manifest created at project initialization.
    pub fn template(project_name: &str, analyst: Option<&str>) -> Self {
        Self {
            project: Project::new(project_name),
            analyst: analyst.map(|s| s.to_string()),
            tags: Vec::new(),
            artifacts: BTreeMap::new(),
            worklog: Worklog::default(),
            metadata: BTreeMap::new(),
        }
    }
}

fn worklog_is_empty(worklog: &Worklog) -> bool {
    worklog.tasks.is_empty()
}
