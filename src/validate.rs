//! Pure validation of raw manifest data.
//!
//! [`validate`] is the only way a [`Manifest`] enters memory: it checks
//! structure against the schema, then referential integrity, then the
//! worklog invariants, and returns *every* violated rule rather than the
//! first — a user should be able to fix a broken manifest in one pass.
//! It never touches storage and never mutates its input.

use chrono::{DateTime, NaiveDate};
use serde_yaml::Value;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::models::{
    ArtifactKind, ArtifactStatus, FigureStatus, Manifest, TaskCategory,
};
use crate::schema;

/// Validate raw manifest data into a typed [`Manifest`].
///
/// Checks run in order: structural well-formedness, referential
/// integrity, worklog invariants, tree acyclicity. On failure the full
/// error list is returned.
pub fn validate(raw: &Value) -> Result<Manifest, Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_structure(raw, &mut errors);
    if !errors.is_empty() {
        return Err(errors);
    }

    let manifest: Manifest = match serde_yaml::from_value(raw.clone()) {
        Ok(manifest) => manifest,
        Err(err) => {
            return Err(vec![ValidationError::structural("manifest", err.to_string())]);
        }
    };

    check_artifacts(&manifest, &mut errors);
    check_worklog(&manifest, &mut errors);

    if errors.is_empty() {
        Ok(manifest)
    } else {
        Err(errors)
    }
}

// ============================================================
// Structural checks (raw document vs. schema)
// ============================================================

fn check_structure(raw: &Value, errors: &mut Vec<ValidationError>) {
    if raw.as_mapping().is_none() {
        errors.push(ValidationError::structural(
            "manifest",
            "expected a mapping at the document root",
        ));
        return;
    }

    check_project(raw, errors);

    if let Some(analyst) = present(raw.get("analyst")) {
        if analyst.as_str().is_none() {
            errors.push(ValidationError::structural("analyst", "expected a string"));
        }
    }

    if let Some(tags) = present(raw.get("tags")) {
        match tags.as_sequence() {
            Some(entries) => {
                for (i, entry) in entries.iter().enumerate() {
                    if entry.as_str().is_none() {
                        errors.push(ValidationError::structural(
                            format!("tags[{i}]"),
                            "expected a string",
                        ));
                    }
                }
            }
            None => errors.push(ValidationError::structural("tags", "expected a sequence")),
        }
    }

    if let Some(artifacts) = present(raw.get("artifacts")) {
        match artifacts.as_mapping() {
            Some(entries) => {
                for (key, value) in entries {
                    let name = key.as_str().unwrap_or("<non-string key>");
                    check_artifact(name, value, errors);
                }
            }
            None => errors.push(ValidationError::structural(
                "artifacts",
                "expected a mapping of artifact name to entry",
            )),
        }
    }

    if let Some(worklog) = present(raw.get("worklog")) {
        check_worklog_structure(worklog, errors);
    }

    if let Some(metadata) = present(raw.get("metadata")) {
        if metadata.as_mapping().is_none() {
            errors.push(ValidationError::structural("metadata", "expected a mapping"));
        }
    }
}

fn check_project(raw: &Value, errors: &mut Vec<ValidationError>) {
    let Some(project) = present(raw.get("project")) else {
        errors.push(ValidationError::structural(
            "project",
            "missing required field",
        ));
        return;
    };
    if project.as_mapping().is_none() {
        errors.push(ValidationError::structural("project", "expected a mapping"));
        return;
    }

    require_string(project, "project", "name", errors);
    check_date(project.get("created"), "project.created", errors);
    if let Some(status) = present(project.get("status")) {
        if status.as_str().is_none() {
            errors.push(ValidationError::structural(
                "project.status",
                "expected a string",
            ));
        }
    }
}

fn check_artifact(name: &str, value: &Value, errors: &mut Vec<ValidationError>) {
    let path = format!("artifacts.{name}");
    if value.as_mapping().is_none() {
        errors.push(ValidationError::structural(path, "expected a mapping"));
        return;
    }

    require_string(value, &path, "path", errors);

    match present(value.get("kind")).and_then(|v| v.as_str()) {
        Some(kind) => {
            if ArtifactKind::from_str(kind).is_none() {
                errors.push(ValidationError::structural(
                    format!("{path}.kind"),
                    format!("'{kind}' is not a known artifact kind"),
                ));
            }
        }
        None => errors.push(ValidationError::structural(
            format!("{path}.kind"),
            "missing required field",
        )),
    }

    if let Some(status) = present(value.get("status")) {
        match status.as_str().and_then(ArtifactStatus::from_str) {
            Some(_) => {}
            None => errors.push(ValidationError::structural(
                format!("{path}.status"),
                "not a known artifact status",
            )),
        }
    }

    check_date(value.get("created"), &format!("{path}.created"), errors);
    check_date(value.get("updated"), &format!("{path}.updated"), errors);

    if let Some(figure) = present(value.get("figure")) {
        match figure.as_sequence() {
            Some(nodes) => {
                for (i, node) in nodes.iter().enumerate() {
                    check_figure_node(node, &format!("{path}.figure[{i}]"), errors);
                }
            }
            None => errors.push(ValidationError::structural(
                format!("{path}.figure"),
                "expected a sequence of figure elements",
            )),
        }
    }
}

fn check_figure_node(node: &Value, path: &str, errors: &mut Vec<ValidationError>) {
    if node.as_mapping().is_none() {
        errors.push(ValidationError::structural(path, "expected a mapping"));
        return;
    }

    require_string(node, path, "id", errors);

    if let Some(status) = present(node.get("status")) {
        if status.as_str().and_then(FigureStatus::from_str).is_none() {
            errors.push(ValidationError::structural(
                format!("{path}.status"),
                "not a known figure status",
            ));
        }
    }

    if let Some(children) = present(node.get("children")) {
        match children.as_sequence() {
            Some(nodes) => {
                for (i, child) in nodes.iter().enumerate() {
                    check_figure_node(child, &format!("{path}.children[{i}]"), errors);
                }
            }
            None => errors.push(ValidationError::structural(
                format!("{path}.children"),
                "expected a sequence",
            )),
        }
    }
}

fn check_worklog_structure(worklog: &Value, errors: &mut Vec<ValidationError>) {
    if worklog.as_mapping().is_none() {
        errors.push(ValidationError::structural("worklog", "expected a mapping"));
        return;
    }
    let Some(tasks) = present(worklog.get("tasks")) else {
        return;
    };
    let Some(tasks) = tasks.as_sequence() else {
        errors.push(ValidationError::structural(
            "worklog.tasks",
            "expected a sequence",
        ));
        return;
    };

    for (i, task) in tasks.iter().enumerate() {
        let path = format!("worklog.tasks[{i}]");
        if task.as_mapping().is_none() {
            errors.push(ValidationError::structural(path, "expected a mapping"));
            continue;
        }

        check_uuid(task.get("id"), &format!("{path}.id"), true, errors);
        require_string(task, &path, "name", errors);
        check_uuid(task.get("parent"), &format!("{path}.parent"), false, errors);

        if let Some(category) = present(task.get("category")) {
            if category.as_str().and_then(TaskCategory::from_str).is_none() {
                errors.push(ValidationError::structural(
                    format!("{path}.category"),
                    "not a known task category",
                ));
            }
        }
        check_datetime(task.get("created"), &format!("{path}.created"), false, errors);

        if let Some(sessions) = present(task.get("sessions")) {
            match sessions.as_sequence() {
                Some(entries) => {
                    for (j, session) in entries.iter().enumerate() {
                        check_session(session, &format!("{path}.sessions[{j}]"), errors);
                    }
                }
                None => errors.push(ValidationError::structural(
                    format!("{path}.sessions"),
                    "expected a sequence",
                )),
            }
        }
    }
}

fn check_session(session: &Value, path: &str, errors: &mut Vec<ValidationError>) {
    if session.as_mapping().is_none() {
        errors.push(ValidationError::structural(path, "expected a mapping"));
        return;
    }
    check_datetime(
        session.get("punch_in"),
        &format!("{path}.punch_in"),
        true,
        errors,
    );
    check_datetime(
        session.get("punch_out"),
        &format!("{path}.punch_out"),
        false,
        errors,
    );

    if let Some(pauses) = present(session.get("pauses")) {
        match pauses.as_sequence() {
            Some(entries) => {
                for (k, pause) in entries.iter().enumerate() {
                    let pause_path = format!("{path}.pauses[{k}]");
                    if pause.as_mapping().is_none() {
                        errors.push(ValidationError::structural(pause_path, "expected a mapping"));
                        continue;
                    }
                    check_datetime(
                        pause.get("start"),
                        &format!("{pause_path}.start"),
                        true,
                        errors,
                    );
                    check_datetime(pause.get("end"), &format!("{pause_path}.end"), false, errors);
                }
            }
            None => errors.push(ValidationError::structural(
                format!("{path}.pauses"),
                "expected a sequence",
            )),
        }
    }
}

// ============================================================
// Semantic checks (typed manifest)
// ============================================================

fn check_artifacts(manifest: &Manifest, errors: &mut Vec<ValidationError>) {
    for (name, artifact) in &manifest.artifacts {
        if !schema::allowed_statuses(artifact.kind).contains(&artifact.status) {
            errors.push(ValidationError::invariant(
                format!("artifacts.{name}.status"),
                format!(
                    "status '{}' is not allowed for kind '{}'",
                    artifact.status.as_str(),
                    artifact.kind.as_str()
                ),
            ));
        }

        let Some(figure) = &artifact.figure else {
            continue;
        };
        if !schema::kind_allows_figure_tree(artifact.kind) {
            errors.push(ValidationError::invariant(
                format!("artifacts.{name}.figure"),
                format!(
                    "a figure tree is not allowed on kind '{}'",
                    artifact.kind.as_str()
                ),
            ));
        }
        for node_path in figure.duplicate_sibling_paths() {
            errors.push(ValidationError::referential(
                format!("artifacts.{name}.figure.{node_path}"),
                "duplicate figure element id among siblings",
            ));
        }
    }
}

fn check_worklog(manifest: &Manifest, errors: &mut Vec<ValidationError>) {
    let tasks = &manifest.worklog.tasks;

    // Duplicate ids make every parent reference ambiguous.
    for (i, task) in tasks.iter().enumerate() {
        if tasks[..i].iter().any(|t| t.id == task.id) {
            errors.push(ValidationError::referential(
                format!("worklog.tasks[{i}].id"),
                format!("duplicate task id {}", task.id),
            ));
        }
    }

    for (i, task) in tasks.iter().enumerate() {
        if let Some(parent) = task.parent {
            if !tasks.iter().any(|t| t.id == parent) {
                errors.push(ValidationError::referential(
                    format!("worklog.tasks[{i}].parent"),
                    format!("references unknown task {parent}"),
                ));
            }
        }
    }

    // A parent chain must terminate at a root; walking more hops than
    // there are tasks means the chain loops back on itself.
    for (i, task) in tasks.iter().enumerate() {
        let mut cursor = task.parent;
        let mut hops = 0;
        while let Some(parent) = cursor {
            if parent == task.id {
                errors.push(ValidationError::referential(
                    format!("worklog.tasks[{i}].parent"),
                    "cyclic parent chain",
                ));
                break;
            }
            hops += 1;
            if hops > tasks.len() {
                break;
            }
            cursor = tasks.iter().find(|t| t.id == parent).and_then(|t| t.parent);
        }
    }

    let mut open_seen: Option<String> = None;
    for (i, task) in tasks.iter().enumerate() {
        for (j, session) in task.sessions.iter().enumerate() {
            let path = format!("worklog.tasks[{i}].sessions[{j}]");

            if let Some(punch_out) = session.punch_out {
                if punch_out < session.punch_in {
                    errors.push(ValidationError::invariant(
                        format!("{path}.punch_out"),
                        "session ends before it starts",
                    ));
                }
            } else {
                match &open_seen {
                    Some(first) => errors.push(ValidationError::invariant(
                        path.clone(),
                        format!("another session is already open ({first})"),
                    )),
                    None => open_seen = Some(format!("task '{}'", task.name)),
                }
            }

            check_session_pauses(session, &path, errors);
        }
    }
}

fn check_session_pauses(
    session: &crate::models::Session,
    path: &str,
    errors: &mut Vec<ValidationError>,
) {
    let mut open_pause = false;
    for (k, pause) in session.pauses.iter().enumerate() {
        let pause_path = format!("{path}.pauses[{k}]");

        if let Some(end) = pause.end {
            if end < pause.start {
                errors.push(ValidationError::invariant(
                    format!("{pause_path}.end"),
                    "pause ends before it starts",
                ));
            }
        } else {
            if open_pause {
                errors.push(ValidationError::invariant(
                    pause_path.clone(),
                    "more than one open pause in a session",
                ));
            }
            open_pause = true;
            if session.punch_out.is_some() {
                errors.push(ValidationError::invariant(
                    pause_path.clone(),
                    "open pause in a closed session",
                ));
            }
        }

        if pause.start < session.punch_in {
            errors.push(ValidationError::invariant(
                format!("{pause_path}.start"),
                "pause starts before its session",
            ));
        }
        if let (Some(end), Some(punch_out)) = (pause.end, session.punch_out) {
            if end > punch_out {
                errors.push(ValidationError::invariant(
                    format!("{pause_path}.end"),
                    "pause ends after its session",
                ));
            }
        }
    }
}

// ============================================================
// Value helpers
// ============================================================

/// Treats an explicit `null` the same as an absent field.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn require_string(value: &Value, parent: &str, field: &str, errors: &mut Vec<ValidationError>) {
    match present(value.get(field)).and_then(|v| v.as_str()) {
        Some(s) if !s.trim().is_empty() => {}
        Some(_) => errors.push(ValidationError::structural(
            format!("{parent}.{field}"),
            "must not be empty",
        )),
        None => errors.push(ValidationError::structural(
            format!("{parent}.{field}"),
            "missing required field",
        )),
    }
}

fn check_date(value: Option<&Value>, path: &str, errors: &mut Vec<ValidationError>) {
    if let Some(value) = present(value) {
        let ok = value
            .as_str()
            .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok())
            .unwrap_or(false);
        if !ok {
            errors.push(ValidationError::structural(
                path,
                "expected a date (YYYY-MM-DD)",
            ));
        }
    }
}

fn check_datetime(
    value: Option<&Value>,
    path: &str,
    required: bool,
    errors: &mut Vec<ValidationError>,
) {
    match present(value) {
        Some(value) => {
            let ok = value
                .as_str()
                .map(|s| DateTime::parse_from_rfc3339(s).is_ok())
                .unwrap_or(false);
            if !ok {
                errors.push(ValidationError::structural(
                    path,
                    "expected an RFC 3339 timestamp",
                ));
            }
        }
        None if required => {
            errors.push(ValidationError::structural(path, "missing required field"));
        }
        None => {}
    }
}

fn check_uuid(
    value: Option<&Value>,
    path: &str,
    required: bool,
    errors: &mut Vec<ValidationError>,
) {
    match present(value) {
        Some(value) => {
            let ok = value
                .as_str()
                .map(|s| Uuid::parse_str(s).is_ok())
                .unwrap_or(false);
            if !ok {
                errors.push(ValidationError::structural(path, "expected a UUID"));
            }
        }
        None if required => {
            errors.push(ValidationError::structural(path, "missing required field"));
        }
        None => {}
    }
}
