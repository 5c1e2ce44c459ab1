//! Project directory scaffolding: layout, ideas files, data symlink.
//!
//! Plain filesystem side effects with no manifest logic; every function
//! is idempotent.

use std::io;
use std::path::{Path, PathBuf};

/// Standard output directories created at project init.
pub const OUTPUT_DIRS: &[&str] = &["data", "doc", "figures", "ideas", "log", "scripts"];

pub fn ensure_directories(root: &Path) -> io::Result<()> {
    for name in OUTPUT_DIRS {
        std::fs::create_dir_all(root.join(name))?;
    }
    Ok(())
}

/// Create `ideas/<slug>.md` from the idea template. An existing file is
/// left untouched.
pub fn create_idea_file(root: &Path, title: &str, problem: &str, approach: &str) -> io::Result<PathBuf> {
    let ideas_dir = root.join("ideas");
    std::fs::create_dir_all(&ideas_dir)?;
    let path = ideas_dir.join(format!("{}.md", slugify(title)));
    if path.exists() {
        return Ok(path);
    }

    let today = chrono::Utc::now().date_naive();
    let title = if title.trim().is_empty() {
        "Untitled Idea"
    } else {
        title.trim()
    };
    let content = format!(
        "# {title}\n\n- created: {today}\n- updated: {today}\n\n## Problem\n\n{problem}\n\n## Approach\n\n{approach}\n",
        problem = default_text(problem, "Describe the problem."),
        approach = default_text(approach, "Outline the proposed approach."),
    );
    std::fs::write(&path, content)?;
    Ok(path)
}

/// Symlink `data/raw` to an external dataset location, replacing a stale
/// link but never a real directory.
#[cfg(unix)]
pub fn ensure_data_symlink(root: &Path, target: &Path) -> io::Result<PathBuf> {
    let link = root.join("data").join("raw");
    std::fs::create_dir_all(root.join("data"))?;
    if link.symlink_metadata().map(|m| m.file_type().is_symlink()).unwrap_or(false) {
        std::fs::remove_file(&link)?;
    } else if link.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} exists and is not a symlink", link.display()),
        ));
    }
    std::os::unix::fs::symlink(target, &link)?;
    Ok(link)
}

/// Lowercase alphanumeric slug with single dashes, `idea` as fallback.
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    for ch in text.trim().to_lowercase().chars() {
        if ch.is_alphanumeric() {
            slug.push(ch);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "idea".to_string()
    } else {
        slug
    }
}

fn default_text<'a>(text: &'a str, fallback: &'a str) -> &'a str {
    if text.trim().is_empty() {
        fallback
    } else {
        text.trim()
    }
}
