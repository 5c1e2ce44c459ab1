//! CLI command implementations.
//!
//! Every subcommand loads the manifest through the persistence gateway,
//! applies at most one mutation, and saves back through the gateway.
//! Output discipline: exactly one JSON envelope on stdout per
//! invocation (`{"status": "ok" | "error", ...}`); logs go to stderr.

use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::Subcommand;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::models::{
    Artifact, ArtifactKind, ArtifactStatus, FigureElement, FigureStatus, FigureTree, Manifest,
    TaskCategory,
};
use crate::render;
use crate::scaffold;
use crate::store::{LoadError, ManifestStore, SaveError};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Initialize a project: manifest, directory layout, ideas folder
    Init {
        /// Project name
        #[arg(long)]
        name: String,
        #[arg(long)]
        analyst: Option<String>,
        /// External dataset location to symlink as data/raw
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Validate the manifest and report every violated rule
    Validate,
    /// Summarize the project state
    Show,
    /// Create an idea note under ideas/
    Idea {
        title: String,
        #[arg(long, default_value = "")]
        problem: String,
        #[arg(long, default_value = "")]
        approach: String,
    },
    /// Task and punch-clock operations
    #[command(subcommand)]
    Task(TaskCommand),
    /// Artifact registry operations
    #[command(subcommand)]
    Artifact(ArtifactCommand),
    /// Figure tree operations
    #[command(subcommand)]
    Figure(FigureCommand),
}

#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    /// Create a task, optionally nested under a parent
    Add {
        name: String,
        #[arg(long, default_value = "other")]
        category: String,
        #[arg(long)]
        parent: Option<Uuid>,
    },
    /// List all tasks flat
    List,
    /// Render the task hierarchy
    Tree,
    /// Start tracking time on a task
    PunchIn { id: Uuid },
    /// Stop tracking time
    PunchOut { id: Uuid },
    /// Suspend the open session without closing it
    Pause { id: Uuid },
    /// Resume a paused session
    Resume { id: Uuid },
    /// Mark a task completed (punches out first if needed)
    Complete { id: Uuid },
    /// Delete a task; --cascade removes its whole subtree
    Delete {
        id: Uuid,
        #[arg(long)]
        cascade: bool,
    },
    /// Show the currently punched-in task
    Status,
}

#[derive(Debug, Subcommand)]
pub enum ArtifactCommand {
    /// Register an artifact under a unique name
    Add {
        name: String,
        #[arg(long)]
        path: String,
        #[arg(long)]
        kind: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List registered artifacts
    List,
    /// Update an artifact's status
    SetStatus { name: String, status: String },
    /// Remove an artifact from the registry
    Remove { name: String },
}

#[derive(Debug, Subcommand)]
pub enum FigureCommand {
    /// Add a figure element; --parent is a slash path like fig1/1a
    Add {
        /// Artifact the element belongs to
        artifact: String,
        id: String,
        #[arg(long)]
        parent: Option<String>,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long)]
        source: Option<String>,
    },
    /// Move a subtree under a new parent (omit --to for root)
    Move {
        artifact: String,
        path: String,
        #[arg(long)]
        to: Option<String>,
    },
    /// Delete a subtree
    Remove { artifact: String, path: String },
    /// Update an element's status
    SetStatus {
        artifact: String,
        path: String,
        status: String,
    },
    /// Render the figure tree
    Tree { artifact: String },
    /// List all elements depth-first
    List { artifact: String },
}

/// Dispatch a command and emit its envelope; returns the process exit code.
pub fn run(root: &Path, command: Command) -> i32 {
    match dispatch(root, command) {
        Ok(payload) => {
            emit(&payload);
            0
        }
        Err(err) => {
            emit(&err.envelope());
            1
        }
    }
}

fn emit(payload: &Value) {
    println!("{payload}");
}

#[derive(Debug)]
enum CliError {
    Load(LoadError),
    Save(SaveError),
    Rule(ValidationError),
    Message(String),
    Io(std::io::Error),
}

impl From<LoadError> for CliError {
    fn from(err: LoadError) -> Self {
        Self::Load(err)
    }
}

impl From<SaveError> for CliError {
    fn from(err: SaveError) -> Self {
        Self::Save(err)
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        Self::Rule(err)
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl CliError {
    fn envelope(&self) -> Value {
        match self {
            Self::Load(LoadError::Invalid(errors)) => json!({
                "status": "error",
                "message": "manifest validation failed",
                "errors": errors,
            }),
            Self::Load(err) => json!({
                "status": "error",
                "message": err.to_string(),
            }),
            Self::Save(SaveError::Rejected { errors, backup }) => json!({
                "status": "error",
                "message": "save rejected, manifest validation failed",
                "errors": errors,
                "backup": backup.as_ref().map(|p| p.display().to_string()),
            }),
            Self::Save(SaveError::BackupFailed { errors, source }) => json!({
                "status": "error",
                "message": "save rejected, manifest validation failed",
                "errors": errors,
                "backup_error": source.to_string(),
            }),
            Self::Save(err) => json!({
                "status": "error",
                "message": err.to_string(),
            }),
            Self::Rule(err) => json!({
                "status": "error",
                "message": err.to_string(),
                "errors": [err],
            }),
            Self::Message(message) => json!({
                "status": "error",
                "message": message,
            }),
            Self::Io(err) => json!({
                "status": "error",
                "message": err.to_string(),
            }),
        }
    }
}

fn dispatch(root: &Path, command: Command) -> Result<Value, CliError> {
    match command {
        Command::Init {
            name,
            analyst,
            data,
        } => init(root, &name, analyst.as_deref(), data.as_deref()),
        Command::Validate => {
            let mut store = ManifestStore::for_project(root);
            let manifest = store.load()?;
            Ok(json!({
                "status": "ok",
                "project": manifest.project.name,
                "errors": [],
            }))
        }
        Command::Show => show(root),
        Command::Idea {
            title,
            problem,
            approach,
        } => {
            let path = scaffold::create_idea_file(root, &title, &problem, &approach)?;
            Ok(json!({"status": "ok", "idea": path.display().to_string()}))
        }
        Command::Task(command) => task(root, command),
        Command::Artifact(command) => artifact(root, command),
        Command::Figure(command) => figure(root, command),
    }
}

fn init(
    root: &Path,
    name: &str,
    analyst: Option<&str>,
    data: Option<&Path>,
) -> Result<Value, CliError> {
    let mut store = ManifestStore::for_project(root);
    if store.path().exists() {
        return Err(CliError::Message(format!(
            "{} already exists; refusing to overwrite",
            store.path().display()
        )));
    }

    scaffold::ensure_directories(root)?;
    let manifest = Manifest::template(name, analyst);
    store.save(&manifest)?;

    let mut payload = json!({
        "status": "ok",
        "manifest": store.path().display().to_string(),
    });
    #[cfg(unix)]
    if let Some(target) = data {
        let link = scaffold::ensure_data_symlink(root, target)?;
        payload["data_link"] = Value::String(link.display().to_string());
    }
    #[cfg(not(unix))]
    let _ = data;
    Ok(payload)
}

fn show(root: &Path) -> Result<Value, CliError> {
    let mut store = ManifestStore::for_project(root);
    let manifest = store.load()?;
    let now = Utc::now();

    let punched_in = manifest.worklog.open_task().map(|task| {
        json!({
            "id": task.id,
            "name": task.name,
            "state": task.state().as_str(),
            "elapsed_minutes": task.elapsed_at(now).num_minutes(),
        })
    });

    Ok(json!({
        "status": "ok",
        "project": manifest.project.name,
        "project_status": manifest.project.status,
        "analyst": manifest.analyst,
        "artifacts": manifest.artifacts.len(),
        "tasks": manifest.worklog.tasks.len(),
        "punched_in": punched_in,
    }))
}

// ============================================================
// Worklog commands
// ============================================================

fn task(root: &Path, command: TaskCommand) -> Result<Value, CliError> {
    let mut store = ManifestStore::for_project(root);
    let mut manifest = store.load()?;
    let now = Utc::now();

    let payload = match command {
        TaskCommand::Add {
            name,
            category,
            parent,
        } => {
            let category = TaskCategory::from_str(&category).ok_or_else(|| {
                CliError::Message(format!("'{category}' is not a known task category"))
            })?;
            let id = manifest.worklog.add_task(&name, category, parent)?;
            json!({"status": "ok", "task": id, "name": name})
        }
        TaskCommand::List => {
            let tasks: Vec<Value> = manifest
                .worklog
                .tasks
                .iter()
                .map(|t| {
                    json!({
                        "id": t.id,
                        "name": t.name,
                        "parent": t.parent,
                        "category": t.category.as_str(),
                        "state": t.state().as_str(),
                        "completed": t.completed,
                        "elapsed_minutes": t.elapsed_at(now).num_minutes(),
                    })
                })
                .collect();
            return Ok(json!({"status": "ok", "tasks": tasks}));
        }
        TaskCommand::Tree => {
            return Ok(json!({
                "status": "ok",
                "tree": render::render_task_tree(&manifest.worklog, now),
            }));
        }
        TaskCommand::Status => {
            let punched_in = manifest.worklog.open_task().map(|task| {
                json!({
                    "id": task.id,
                    "name": task.name,
                    "state": task.state().as_str(),
                    "elapsed_minutes": task.elapsed_at(now).num_minutes(),
                })
            });
            return Ok(json!({"status": "ok", "punched_in": punched_in}));
        }
        TaskCommand::PunchIn { id } => {
            manifest.worklog.punch_in(id, now)?;
            json!({"status": "ok", "task": id, "state": "active"})
        }
        TaskCommand::PunchOut { id } => {
            manifest.worklog.punch_out(id, now)?;
            json!({"status": "ok", "task": id, "state": "idle"})
        }
        TaskCommand::Pause { id } => {
            manifest.worklog.pause(id, now)?;
            json!({"status": "ok", "task": id, "state": "paused"})
        }
        TaskCommand::Resume { id } => {
            manifest.worklog.resume(id, now)?;
            json!({"status": "ok", "task": id, "state": "active"})
        }
        TaskCommand::Complete { id } => {
            manifest.worklog.complete_task(id, now)?;
            json!({"status": "ok", "task": id, "completed": true})
        }
        TaskCommand::Delete { id, cascade } => {
            let removed = manifest.worklog.delete_task(id, cascade)?;
            json!({"status": "ok", "removed": removed})
        }
    };

    store.save(&manifest)?;
    Ok(payload)
}

// ============================================================
// Artifact commands
// ============================================================

fn artifact(root: &Path, command: ArtifactCommand) -> Result<Value, CliError> {
    let mut store = ManifestStore::for_project(root);
    let mut manifest = store.load()?;

    let payload = match command {
        ArtifactCommand::Add {
            name,
            path,
            kind,
            description,
        } => {
            if manifest.artifacts.contains_key(&name) {
                return Err(CliError::Message(format!(
                    "artifact '{name}' is already registered"
                )));
            }
            let kind = ArtifactKind::from_str(&kind).ok_or_else(|| {
                CliError::Message(format!("'{kind}' is not a known artifact kind"))
            })?;
            let mut artifact = Artifact::new(path, kind);
            artifact.description = description;
            manifest.artifacts.insert(name.clone(), artifact);
            json!({"status": "ok", "artifact": name})
        }
        ArtifactCommand::List => {
            let artifacts: Vec<Value> = manifest
                .artifacts
                .iter()
                .map(|(name, a)| {
                    json!({
                        "name": name,
                        "path": a.path,
                        "kind": a.kind.as_str(),
                        "status": a.status.as_str(),
                        "figure_elements": a.figure.as_ref().map(|f| f.len()).unwrap_or(0),
                    })
                })
                .collect();
            return Ok(json!({"status": "ok", "artifacts": artifacts}));
        }
        ArtifactCommand::SetStatus { name, status } => {
            let status = ArtifactStatus::from_str(&status).ok_or_else(|| {
                CliError::Message(format!("'{status}' is not a known artifact status"))
            })?;
            let artifact = require_artifact_mut(&mut manifest, &name)?;
            artifact.status = status;
            artifact.updated = Some(Utc::now().date_naive());
            json!({"status": "ok", "artifact": name, "artifact_status": status.as_str()})
        }
        ArtifactCommand::Remove { name } => {
            if manifest.artifacts.remove(&name).is_none() {
                return Err(unknown_artifact(&name));
            }
            json!({"status": "ok", "removed": name})
        }
    };

    store.save(&manifest)?;
    Ok(payload)
}

// ============================================================
// Figure tree commands
// ============================================================

fn figure(root: &Path, command: FigureCommand) -> Result<Value, CliError> {
    let mut store = ManifestStore::for_project(root);
    let mut manifest = store.load()?;

    let payload = match command {
        FigureCommand::Add {
            artifact,
            id,
            parent,
            title,
            source,
        } => {
            let tree = require_figure_tree(&mut manifest, &artifact)?;
            let parent = match parent.as_deref() {
                Some(path) => Some(resolve_node(tree, &artifact, path)?),
                None => None,
            };
            let node = tree.insert(
                parent,
                FigureElement {
                    id,
                    title,
                    source,
                    status: FigureStatus::Draft,
                },
            )?;
            let path = tree.path_of(node);
            json!({"status": "ok", "artifact": artifact, "element": path})
        }
        FigureCommand::Move { artifact, path, to } => {
            let tree = require_figure_tree(&mut manifest, &artifact)?;
            let node = resolve_node(tree, &artifact, &path)?;
            let dest = match to.as_deref() {
                Some(path) => Some(resolve_node(tree, &artifact, path)?),
                None => None,
            };
            tree.move_to(node, dest)?;
            let path = tree.path_of(node);
            json!({"status": "ok", "artifact": artifact, "element": path})
        }
        FigureCommand::Remove { artifact, path } => {
            let tree = require_figure_tree(&mut manifest, &artifact)?;
            let node = resolve_node(tree, &artifact, &path)?;
            let removed = tree.remove(node);
            json!({"status": "ok", "artifact": artifact, "removed": removed})
        }
        FigureCommand::SetStatus {
            artifact,
            path,
            status,
        } => {
            let status = FigureStatus::from_str(&status).ok_or_else(|| {
                CliError::Message(format!("'{status}' is not a known figure status"))
            })?;
            let tree = require_figure_tree(&mut manifest, &artifact)?;
            let node = resolve_node(tree, &artifact, &path)?;
            tree.get_mut(node).expect("resolved node").status = status;
            json!({"status": "ok", "artifact": artifact, "element": path, "element_status": status.as_str()})
        }
        FigureCommand::Tree { artifact } => {
            let tree = require_figure_tree(&mut manifest, &artifact)?;
            return Ok(json!({
                "status": "ok",
                "artifact": artifact,
                "tree": render::render_figure_tree(tree),
            }));
        }
        FigureCommand::List { artifact } => {
            let tree = require_figure_tree(&mut manifest, &artifact)?;
            let elements: Vec<Value> = tree
                .iter()
                .map(|(depth, id, element)| {
                    json!({
                        "path": tree.path_of(id),
                        "depth": depth,
                        "title": element.title,
                        "source": element.source,
                        "status": element.status.as_str(),
                        "rollup_status": tree.rollup_status(id).as_str(),
                    })
                })
                .collect();
            return Ok(json!({"status": "ok", "artifact": artifact, "elements": elements}));
        }
    };

    store.save(&manifest)?;
    Ok(payload)
}

fn require_artifact_mut<'a>(
    manifest: &'a mut Manifest,
    name: &str,
) -> Result<&'a mut Artifact, CliError> {
    manifest
        .artifacts
        .get_mut(name)
        .ok_or_else(|| unknown_artifact(name))
}

/// The figure tree of an artifact, created on first use for figure-kind
/// artifacts.
fn require_figure_tree<'a>(
    manifest: &'a mut Manifest,
    name: &str,
) -> Result<&'a mut FigureTree, CliError> {
    let artifact = require_artifact_mut(manifest, name)?;
    if !crate::schema::kind_allows_figure_tree(artifact.kind) {
        return Err(CliError::Message(format!(
            "artifact '{name}' has kind '{}'; only figures carry figure trees",
            artifact.kind.as_str()
        )));
    }
    Ok(artifact.figure.get_or_insert_with(FigureTree::new))
}

fn resolve_node(
    tree: &FigureTree,
    artifact: &str,
    path: &str,
) -> Result<crate::models::FigureId, CliError> {
    tree.find(path).ok_or_else(|| {
        CliError::Message(format!("no figure element '{path}' in artifact '{artifact}'"))
    })
}

fn unknown_artifact(name: &str) -> CliError {
    CliError::Message(format!("no artifact named '{name}'"))
}
