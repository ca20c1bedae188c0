use crate::error::EditError;
use cw_core::source_map::SourceMap;
use cw_core::span::Span;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Replacement,
    Insertion,
}

/// One edit against a file's original text. Insertions have an empty range.
///
/// `origin` is the range of the call expression the edit was computed for; it is null for edits
/// that do not come from a call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub lo: u32,
    pub hi: u32,
    pub text: String,
    pub origin: Span,
}

impl Edit {
    pub fn replacement(span: Span, text: impl Into<String>) -> Self {
        Self {
            lo: span.lo,
            hi: span.hi,
            text: text.into(),
            origin: Span::null(),
        }
    }

    pub fn insertion(offset: u32, text: impl Into<String>) -> Self {
        Self {
            lo: offset,
            hi: offset,
            text: text.into(),
            origin: Span::null(),
        }
    }

    pub fn with_origin(mut self, origin: Span) -> Self {
        self.origin = origin;
        self
    }

    pub fn kind(&self) -> EditKind {
        if self.lo == self.hi {
            EditKind::Insertion
        } else {
            EditKind::Replacement
        }
    }
}

/// Edits recorded for one file, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileEdits {
    edits: Vec<Edit>,
}

impl FileEdits {
    /// Records `edit` unless the same edit from the same origin is already present. Equal edits
    /// from different origins are both kept so applying the batch reports them as a conflict.
    pub fn push(&mut self, edit: Edit) -> bool {
        if self.edits.contains(&edit) {
            return false;
        }
        self.edits.push(edit);
        true
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

/// Accumulates edits for a whole translation unit, keyed by file path.
///
/// Nothing is checked for conflicts here; overlapping edits are rejected when the batch is
/// applied so every conflict is reported against the final edit set. The `add_*` methods return
/// whether the edit was new.
#[derive(Debug, Clone, Default)]
pub struct EditCollector {
    files: BTreeMap<PathBuf, FileEdits>,
}

impl EditCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_replacement(
        &mut self,
        source_map: &SourceMap,
        span: Span,
        text: impl Into<String>,
        origin: Span,
    ) -> Result<bool, EditError> {
        let path = self.path_of(source_map, span)?;
        Ok(self.add(path, Edit::replacement(span, text).with_origin(origin)))
    }

    /// Inserts `text` immediately before the first character of `at`.
    pub fn add_insertion(
        &mut self,
        source_map: &SourceMap,
        at: Span,
        text: impl Into<String>,
        origin: Span,
    ) -> Result<bool, EditError> {
        let path = self.path_of(source_map, at)?;
        Ok(self.add(path, Edit::insertion(at.lo, text).with_origin(origin)))
    }

    pub fn add(&mut self, path: PathBuf, edit: Edit) -> bool {
        let (lo, hi) = (edit.lo, edit.hi);
        let added = self.files.entry(path.clone()).or_default().push(edit);
        if !added {
            debug!("dropping duplicate edit {}:{}..{}", path.display(), lo, hi);
        }
        added
    }

    pub fn file(&self, path: &Path) -> Option<&FileEdits> {
        self.files.get(path)
    }

    pub fn files(&self) -> impl Iterator<Item = (&PathBuf, &FileEdits)> {
        self.files.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.files.values().all(FileEdits::is_empty)
    }

    /// Moves every edit of `other` into `self`.
    pub fn merge(&mut self, other: EditCollector) {
        for (path, edits) in other.files {
            for edit in edits.edits {
                self.add(path.clone(), edit);
            }
        }
    }

    fn path_of(&self, source_map: &SourceMap, span: Span) -> Result<PathBuf, EditError> {
        source_map
            .path(span.file)
            .ok_or_else(|| EditError::UnknownFile(span.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_edits_from_one_call_are_recorded_once() {
        let map = SourceMap::new();
        let file = map.register_source(PathBuf::from("a.cpp"), "f(x);");
        let call = Span::new(file, 0, 4);
        let mut collector = EditCollector::new();
        assert!(collector
            .add_replacement(&map, Span::new(file, 0, 1), "g", call)
            .unwrap());
        assert!(!collector
            .add_replacement(&map, Span::new(file, 0, 1), "g", call)
            .unwrap());
        collector
            .add_insertion(&map, Span::new(file, 3, 4), ", f", call)
            .unwrap();
        let edits = collector.file(Path::new("a.cpp")).unwrap();
        assert_eq!(edits.len(), 2);
        assert_eq!(edits.edits()[1].kind(), EditKind::Insertion);
    }

    #[test]
    fn identical_edits_from_different_calls_are_both_kept() {
        let map = SourceMap::new();
        let file = map.register_source(PathBuf::from("a.cpp"), "f(x);");
        let mut collector = EditCollector::new();
        collector
            .add_replacement(&map, Span::new(file, 0, 1), "g", Span::new(file, 0, 4))
            .unwrap();
        assert!(collector
            .add_replacement(&map, Span::new(file, 0, 1), "g", Span::new(file, 0, 5))
            .unwrap());
        assert_eq!(collector.file(Path::new("a.cpp")).unwrap().len(), 2);
    }

    #[test]
    fn edits_against_unregistered_files_are_rejected() {
        let map = SourceMap::new();
        let mut collector = EditCollector::new();
        let err = collector
            .add_replacement(&map, Span::new(42, 0, 1), "g", Span::null())
            .unwrap_err();
        assert!(matches!(err, EditError::UnknownFile(_)));
    }
}
