//! Directory walk producing source units
//!
//! `a/b/Order.jschema` under the root becomes the source `a.b.Order`. A file
//! directly under the root would define a type without a namespace, which is
//! rejected.

use super::source::SourceUnit;
use crate::config::DiscoveryConfig;
use crate::error::{Error, Result};
use crate::types::SourceKind;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Find all schema sources under `root`.
///
/// The walk is sorted, so the result is deterministic. JSchema sources are
/// listed before JSON sources.
pub fn discover_sources(root: &Path, config: &DiscoveryConfig) -> Result<Vec<SourceUnit>> {
    if !root.is_dir() {
        return Err(Error::FileNotFound {
            path: root.display().to_string(),
        });
    }

    let mut files = Vec::new();
    walk(root, config, &mut files)?;

    let mut units = Vec::new();
    for path in files {
        let Some(kind) = classify(&path, config) else {
            continue;
        };
        let name = logical_name(root, &path)?;
        debug!("Discovered {} source '{}' at {}", kind, name, path.display());
        units.push(SourceUnit::file(name, kind, path));
    }
    units.sort_by_key(|unit| unit.kind != SourceKind::JSchema);
    Ok(units)
}

fn walk(dir: &Path, config: &DiscoveryConfig, out: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        entries.push((entry.path(), entry.file_type()?));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    for (path, file_type) in entries {
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'));
        if hidden && config.skip_hidden {
            continue;
        }
        if file_type.is_dir() {
            walk(&path, config, out)?;
        } else if file_type.is_symlink() && path.is_dir() {
            // Never descend through links; they may loop back to an ancestor.
            debug!("Skipping symlinked directory {}", path.display());
        } else {
            out.push(path);
        }
    }
    Ok(())
}

/// Classify a file by extension
pub fn classify(path: &Path, config: &DiscoveryConfig) -> Option<SourceKind> {
    let ext = path.extension()?.to_str()?;
    if ext == config.jschema_extension {
        Some(SourceKind::JSchema)
    } else if ext == config.json_extension {
        Some(SourceKind::Json)
    } else {
        None
    }
}

/// Map a file path under `root` to its dotted logical name
pub fn logical_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).unwrap_or(path).with_extension("");
    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    if segments.len() < 2 {
        return Err(Error::DefaultNamespace {
            path: path.display().to_string(),
        });
    }
    Ok(segments.join("."))
}
