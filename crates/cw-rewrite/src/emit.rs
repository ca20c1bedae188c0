use crate::edits::{Edit, EditCollector, EditKind, FileEdits};
use crate::error::EditError;
use cw_core::source_map::SourceMap;
use itertools::Itertools;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// Applies the edits recorded for one file to its original text.
///
/// Edits are interpreted against the original buffer, so the order they were collected in does
/// not matter. Any overlap rejects the whole file: the caller gets an error and no partial
/// rewrite.
pub fn apply_edits(path: &Path, original: &str, edits: &FileEdits) -> Result<String, EditError> {
    // At equal offsets an insertion goes before the replacement starting there.
    let sorted: Vec<&Edit> = edits
        .edits()
        .iter()
        .sorted_by_key(|edit| (edit.lo, edit.kind() == EditKind::Replacement, edit.hi))
        .collect();

    for edit in &sorted {
        let in_bounds = (edit.hi as usize) <= original.len()
            && edit.lo <= edit.hi
            && original.is_char_boundary(edit.lo as usize)
            && original.is_char_boundary(edit.hi as usize);
        if !in_bounds {
            return Err(EditError::OutOfBounds {
                path: path.to_path_buf(),
                lo: edit.lo,
                hi: edit.hi,
            });
        }
    }

    check_overlaps(path, &sorted)?;

    let mut out = String::with_capacity(original.len());
    let mut cursor = 0usize;
    for edit in sorted {
        out.push_str(&original[cursor..edit.lo as usize]);
        out.push_str(&edit.text);
        cursor = edit.hi as usize;
    }
    out.push_str(&original[cursor..]);
    Ok(out)
}

fn check_overlaps(path: &Path, sorted: &[&Edit]) -> Result<(), EditError> {
    let overlap = |first: &Edit, second: &Edit| EditError::Overlap {
        path: path.to_path_buf(),
        first_lo: first.lo,
        first_hi: first.hi,
        second_lo: second.lo,
        second_hi: second.hi,
    };

    // The edit reaching furthest so far; anything starting before its end collides with it.
    let mut reach: Option<&Edit> = None;
    let mut last_insertion: Option<&Edit> = None;
    for &edit in sorted {
        match edit.kind() {
            EditKind::Insertion => {
                if let Some(previous) = last_insertion.filter(|prev| prev.lo == edit.lo) {
                    return Err(overlap(previous, edit));
                }
                if let Some(covering) = reach.filter(|r| r.lo < edit.lo && edit.lo < r.hi) {
                    return Err(overlap(covering, edit));
                }
                last_insertion = Some(edit);
            }
            EditKind::Replacement => {
                if let Some(covering) = reach.filter(|r| edit.lo < r.hi) {
                    return Err(overlap(covering, edit));
                }
                reach = Some(edit);
            }
        }
    }
    Ok(())
}

/// Outcome of emitting one file.
#[derive(Debug)]
pub enum Emitted {
    Rewritten(String),
    /// The file had no edits; its text is passed through.
    Unchanged(String),
}

impl Emitted {
    pub fn text(&self) -> &str {
        match self {
            Emitted::Rewritten(text) | Emitted::Unchanged(text) => text,
        }
    }
}

/// Serializes rewritten buffers once traversal of a translation unit has finished.
pub struct Emitter<'a> {
    source_map: &'a SourceMap,
    edits: &'a EditCollector,
}

impl<'a> Emitter<'a> {
    pub fn new(source_map: &'a SourceMap, edits: &'a EditCollector) -> Self {
        Self { source_map, edits }
    }

    pub fn rewrite(&self, path: &Path) -> Result<Emitted, EditError> {
        let original = self
            .source_map
            .file_id(path)
            .and_then(|id| self.source_map.file(id))
            .ok_or_else(|| EditError::UnknownFile(path.display().to_string()))?;
        match self.edits.file(path) {
            Some(edits) if !edits.is_empty() => {
                debug!("applying {} edits to {}", edits.len(), path.display());
                apply_edits(path, &original.source, edits).map(Emitted::Rewritten)
            }
            _ => Ok(Emitted::Unchanged(original.source.to_string())),
        }
    }

    /// Writes the rewritten text of `path` to `out`. On a conflict the original buffer is written
    /// instead and the conflict is returned.
    pub fn emit<W: Write>(&self, path: &Path, out: &mut W) -> std::io::Result<Result<(), EditError>> {
        match self.rewrite(path) {
            Ok(emitted) => {
                out.write_all(emitted.text().as_bytes())?;
                Ok(Ok(()))
            }
            Err(err) => {
                warn!("not rewriting {}: {}", path.display(), err);
                if let Some(file) = self.source_map.file_id(path).and_then(|id| self.source_map.file(id)) {
                    out.write_all(file.source.as_bytes())?;
                }
                Ok(Err(err))
            }
        }
    }
}
