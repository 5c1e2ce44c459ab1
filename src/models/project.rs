use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Project identity fields stored at the top of the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default = "today")]
    pub created: NaiveDate,
    #[serde(default = "default_status")]
    pub status: String,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created: today(),
            status: default_status(),
        }
    }
}

pub(crate) fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

fn default_status() -> String {
    "active".to_string()
}
