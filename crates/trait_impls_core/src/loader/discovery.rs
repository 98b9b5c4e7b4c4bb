//! On-disk chunk discovery for a documentation output tree.
//!
//! Chunk files live at `implementors/<module path>/trait.<Name>.js`; the
//! directory path below `implementors/` plus `<Name>` is the trait path.

use crate::loader::chunk::{deliver_chunk_to_index, Chunk};
use crate::loader::script::{parse_chunk_script, ChunkScriptError};
use crate::registry::trait_index::TraitIndex;
use log::{error, info};
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

const CHUNK_FILE_PREFIX: &str = "trait.";
const CHUNK_FILE_SUFFIX: &str = ".js";

/// Derives `core::fmt::Display` from `<root>/core/fmt/trait.Display.js`.
///
/// Returns `None` for files outside `root` or not named `trait.<Name>.js`.
pub fn trait_path_for_file(root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?;
    let file_name = relative.file_name()?.to_str()?;
    let name = file_name
        .strip_prefix(CHUNK_FILE_PREFIX)?
        .strip_suffix(CHUNK_FILE_SUFFIX)?;
    if name.is_empty() {
        return None;
    }

    let mut segments = Vec::new();
    if let Some(parent) = relative.parent() {
        for component in parent.components() {
            match component {
                Component::Normal(segment) => segments.push(segment.to_str()?.to_string()),
                _ => return None,
            }
        }
    }
    segments.push(name.to_string());
    Some(segments.join("::"))
}

/// Lists every chunk file below `root`, sorted by path.
pub fn discover_chunk_files(root: &Path) -> Result<Vec<PathBuf>, ChunkScriptError> {
    let mut files = Vec::new();
    collect_chunk_files(root, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_chunk_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), ChunkScriptError> {
    let entries = std::fs::read_dir(dir).map_err(|err| io_error(dir, &err))?;
    for entry in entries {
        let entry = entry.map_err(|err| io_error(dir, &err))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|err| io_error(&path, &err))?;
        if file_type.is_dir() {
            collect_chunk_files(&path, files)?;
        } else if is_chunk_file_name(&path) {
            files.push(path);
        }
    }
    Ok(())
}

fn is_chunk_file_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| {
            name.len() > CHUNK_FILE_PREFIX.len() + CHUNK_FILE_SUFFIX.len()
                && name.starts_with(CHUNK_FILE_PREFIX)
                && name.ends_with(CHUNK_FILE_SUFFIX)
        })
        .unwrap_or(false)
}

/// Reads and parses one chunk file located below `root`.
pub fn load_chunk_file(root: &Path, file: &Path) -> Result<Chunk, ChunkScriptError> {
    let trait_path = trait_path_for_file(root, file)
        .ok_or_else(|| ChunkScriptError::NotAChunkFile(file.display().to_string()))?;
    let source = std::fs::read_to_string(file).map_err(|err| io_error(file, &err))?;
    parse_chunk_script(&trait_path, &source)
}

/// Loads every chunk below `root` into `index`, stopping at the first error.
///
/// Returns the number of chunks delivered.
pub fn load_implementors_dir(
    root: &Path,
    index: &mut TraitIndex,
) -> Result<usize, ChunkScriptError> {
    let started_at = Instant::now();
    info!(
        "event=chunks_load module=loader status=start root={}",
        root.display()
    );

    let files = discover_chunk_files(root).inspect_err(|err| {
        error!(
            "event=chunks_load module=loader status=error error_code=discover_failed error={}",
            err
        );
    })?;

    for file in &files {
        let chunk = load_chunk_file(root, file).inspect_err(|err| {
            error!(
                "event=chunk_load module=loader status=error file={} error={}",
                file.display(),
                err
            );
        })?;
        info!(
            "event=chunk_load module=loader status=ok trait_path={} packages={} implementors={}",
            chunk.trait_path(),
            chunk.mapping().len(),
            chunk.mapping().implementor_count()
        );
        deliver_chunk_to_index(chunk, index);
    }

    info!(
        "event=chunks_load module=loader status=ok chunks={} traits={} duration_ms={}",
        files.len(),
        index.len(),
        started_at.elapsed().as_millis()
    );
    Ok(files.len())
}

fn io_error(path: &Path, err: &std::io::Error) -> ChunkScriptError {
    ChunkScriptError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}
