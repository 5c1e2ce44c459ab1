//! Punch-in/out state machine over the task hierarchy.
//!
//! Transitions per task: `idle -> active` (punch in), `active <-> paused`
//! (pause/resume), `active|paused -> idle` (punch out). At most one task
//! in the whole manifest may hold an open session; a second punch-in is
//! rejected until the first task is punched out.
//!
//! Transitions take `now` explicitly so callers (and tests) control the
//! clock; the CLI passes `Utc::now()`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::models::{Pause, Session, Task, TaskCategory, TaskState, Worklog};

impl Worklog {
    /// Create a task, optionally nested under `parent`.
    pub fn add_task(
        &mut self,
        name: impl Into<String>,
        category: TaskCategory,
        parent: Option<Uuid>,
    ) -> Result<Uuid, ValidationError> {
        if let Some(parent) = parent {
            if self.task(parent).is_none() {
                return Err(ValidationError::referential(
                    "worklog.tasks",
                    format!("parent task {parent} does not exist"),
                ));
            }
        }
        let task = Task::new(name, category, parent);
        let id = task.id;
        self.tasks.push(task);
        Ok(id)
    }

    /// Open a new session on a task.
    ///
    /// Fails when the task is already punched in, or when any other task
    /// holds the open session.
    pub fn punch_in(&mut self, id: Uuid, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if let Some(open) = self.open_task() {
            let message = if open.id == id {
                format!("task '{}' is already punched in", open.name)
            } else {
                format!("task '{}' is already punched in; punch out first", open.name)
            };
            return Err(ValidationError::invariant("worklog", message));
        }
        let task = self.require_task_mut(id)?;
        task.sessions.push(Session::open_at(now));
        Ok(())
    }

    /// Close the open session, ending any open pause at the same instant.
    pub fn punch_out(&mut self, id: Uuid, now: DateTime<Utc>) -> Result<(), ValidationError> {
        let task = self.require_task_mut(id)?;
        let name = task.name.clone();
        let Some(session) = task.open_session_mut() else {
            return Err(ValidationError::invariant(
                "worklog",
                format!("task '{name}' is not punched in"),
            ));
        };
        if let Some(pause) = session.pauses.iter_mut().find(|p| p.end.is_none()) {
            pause.end = Some(now);
        }
        session.punch_out = Some(now);
        Ok(())
    }

    /// Suspend accrual without closing the session.
    pub fn pause(&mut self, id: Uuid, now: DateTime<Utc>) -> Result<(), ValidationError> {
        let task = self.require_task_mut(id)?;
        match task.state() {
            TaskState::Active => {}
            TaskState::Paused => {
                return Err(ValidationError::invariant(
                    "worklog",
                    format!("task '{}' is already paused", task.name),
                ));
            }
            TaskState::Idle => {
                return Err(ValidationError::invariant(
                    "worklog",
                    format!("task '{}' is not punched in", task.name),
                ));
            }
        }
        let session = task.open_session_mut().expect("active task has open session");
        session.pauses.push(Pause {
            start: now,
            end: None,
        });
        Ok(())
    }

    /// Resume accrual inside the same session.
    pub fn resume(&mut self, id: Uuid, now: DateTime<Utc>) -> Result<(), ValidationError> {
        let task = self.require_task_mut(id)?;
        if task.state() != TaskState::Paused {
            return Err(ValidationError::invariant(
                "worklog",
                format!("task '{}' is not paused", task.name),
            ));
        }
        let session = task.open_session_mut().expect("paused task has open session");
        let pause = session
            .pauses
            .iter_mut()
            .find(|p| p.end.is_none())
            .expect("paused session has open pause");
        pause.end = Some(now);
        Ok(())
    }

    /// Mark a task completed, punching it out first if needed.
    pub fn complete_task(&mut self, id: Uuid, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if self.require_task(id)?.open_session().is_some() {
            self.punch_out(id, now)?;
        }
        let task = self.require_task_mut(id)?;
        task.completed = true;
        Ok(())
    }

    /// Reopen a completed task.
    pub fn reopen_task(&mut self, id: Uuid) -> Result<(), ValidationError> {
        let task = self.require_task_mut(id)?;
        task.completed = false;
        Ok(())
    }

    /// Delete a task. A task with descendants is only deleted when
    /// `cascade` is set — subtree removal must be explicit, never
    /// implicit. Returns how many tasks were removed.
    pub fn delete_task(&mut self, id: Uuid, cascade: bool) -> Result<usize, ValidationError> {
        self.require_task(id)?;
        let subtree = self.subtree_ids(id);
        if subtree.len() > 1 && !cascade {
            return Err(ValidationError::invariant(
                "worklog.tasks",
                format!(
                    "task has {} descendant(s); deleting the subtree must be explicit",
                    subtree.len() - 1
                ),
            ));
        }
        let before = self.tasks.len();
        self.tasks.retain(|t| !subtree.contains(&t.id));
        Ok(before - self.tasks.len())
    }

    fn require_task(&self, id: Uuid) -> Result<&Task, ValidationError> {
        self.task(id).ok_or_else(|| {
            ValidationError::referential("worklog.tasks", format!("no task with id {id}"))
        })
    }

    fn require_task_mut(&mut self, id: Uuid) -> Result<&mut Task, ValidationError> {
        self.require_task(id)?;
        Ok(self.task_mut(id).expect("task exists"))
    }
}
