use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The time-tracking log: an ordered list of tasks, each with its punch
/// sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Worklog {
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Worklog {
    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: Uuid) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// The task currently punched in (open session), if any.
    ///
    /// A valid manifest has at most one; validation enforces it.
    pub fn open_task(&self) -> Option<&Task> {
        self.tasks.iter().find(|t| t.open_session().is_some())
    }

    pub fn children_of(&self, parent: Uuid) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.parent == Some(parent))
            .collect()
    }

    /// Ids of `id` and every task below it in the hierarchy.
    pub fn subtree_ids(&self, id: Uuid) -> Vec<Uuid> {
        let mut ids = vec![id];
        let mut cursor = 0;
        while cursor < ids.len() {
            let current = ids[cursor];
            ids.extend(
                self.tasks
                    .iter()
                    .filter(|t| t.parent == Some(current))
                    .map(|t| t.id),
            );
            cursor += 1;
        }
        ids
    }
}

/// A unit of tracked work. Tasks form a tree of unbounded depth via
/// `parent`; time accrues in `sessions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Uuid>,
    #[serde(default)]
    pub category: TaskCategory,
    #[serde(default, skip_serializing_if = "is_false")]
    pub completed: bool,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sessions: Vec<Session>,
}

impl Task {
    pub fn new(name: impl Into<String>, category: TaskCategory, parent: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            parent,
            category,
            completed: false,
            created: Utc::now(),
            sessions: Vec::new(),
        }
    }

    pub fn open_session(&self) -> Option<&Session> {
        self.sessions.iter().find(|s| s.is_open())
    }

    pub fn open_session_mut(&mut self) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.is_open())
    }

    /// Punch state derived from the sessions, never stored.
    pub fn state(&self) -> TaskState {
        match self.open_session() {
            Some(session) if session.open_pause().is_some() => TaskState::Paused,
            Some(_) => TaskState::Active,
            None => TaskState::Idle,
        }
    }

    /// Total tracked time across all sessions, pauses excluded.
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> Duration {
        self.sessions
            .iter()
            .fold(Duration::zero(), |acc, s| acc + s.elapsed_at(now))
    }
}

/// One interval of punched-in work on a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub punch_in: DateTime<Utc>,
    /// Absent while the session is open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub punch_out: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pauses: Vec<Pause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Session {
    pub fn open_at(punch_in: DateTime<Utc>) -> Self {
        Self {
            punch_in,
            punch_out: None,
            pauses: Vec::new(),
            note: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.punch_out.is_none()
    }

    pub fn open_pause(&self) -> Option<&Pause> {
        self.pauses.iter().find(|p| p.end.is_none())
    }

    /// Worked time in this session: (end − start) minus the pause
    /// intervals. Open intervals are measured up to `now`.
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> Duration {
        let end = self.punch_out.unwrap_or(now);
        let paused = self
            .pauses
            .iter()
            .fold(Duration::zero(), |acc, p| acc + (p.end.unwrap_or(end) - p.start));
        (end - self.punch_in) - paused
    }
}

/// A break inside a session; `end` is absent while the pause is open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pause {
    pub start: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

/// Punch state of a task, derived from its sessions.
///
/// - `Idle`: no open session
/// - `Active`: open session, accruing time
/// - `Paused`: open session with an open pause
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Idle,
    Active,
    Paused,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Paused => "paused",
        }
    }
}

/// What kind of work a task is.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    Development,
    DataCopying,
    Execution,
    Documentation,
    Meeting,
    Admin,
    #[default]
    Other,
}

impl TaskCategory {
    pub const ALL: &'static [TaskCategory] = &[
        Self::Development,
        Self::DataCopying,
        Self::Execution,
        Self::Documentation,
        Self::Meeting,
        Self::Admin,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::DataCopying => "data_copying",
            Self::Execution => "execution",
            Self::Documentation => "documentation",
            Self::Meeting => "meeting",
            Self::Admin => "admin",
            Self::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "development" => Some(Self::Development),
            "data_copying" => Some(Self::DataCopying),
            "execution" => Some(Self::Execution),
            "documentation" => Some(Self::Documentation),
            "meeting" => Some(Self::Meeting),
            "admin" => Some(Self::Admin),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

fn is_false(v: &bool) -> bool {
    !v
}
