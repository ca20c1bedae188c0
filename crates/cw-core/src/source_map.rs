use crate::span::{FileId, Span};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

#[derive(Clone, Debug)]
pub struct SourceFile {
    pub id: FileId,
    pub path: PathBuf,
    pub source: Arc<str>,
    line_starts: Arc<Vec<usize>>,
}

impl SourceFile {
    pub fn line_col(&self, offset: u32) -> (usize, usize) {
        let offset = offset as usize;
        let idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let line_start = self.line_starts.get(idx).copied().unwrap_or(0);
        let line = idx + 1;
        let col = offset.saturating_sub(line_start) + 1;
        (line, col)
    }

    pub fn line_text(&self, line: usize) -> Option<&str> {
        if line == 0 {
            return None;
        }
        let idx = line - 1;
        let start = *self.line_starts.get(idx)?;
        let end = self
            .line_starts
            .get(idx + 1)
            .copied()
            .unwrap_or_else(|| self.source.len());
        self.source
            .get(start..end)
            .map(|s| s.trim_end_matches('\n'))
    }

    /// Verbatim text covered by `span`, or `None` when the range falls outside the buffer or
    /// splits a UTF-8 sequence.
    pub fn slice(&self, span: Span) -> Option<&str> {
        if span.file != self.id || !span.is_valid() {
            return None;
        }
        self.source.get(span.lo as usize..span.hi as usize)
    }
}

/// Registry of source buffers for one tool run.
///
/// Ids start at 1; 0 stays reserved for [`Span::null`].
#[derive(Debug)]
pub struct SourceMap {
    next_id: AtomicU64,
    files: RwLock<HashMap<FileId, SourceFile>>,
    paths: RwLock<HashMap<PathBuf, FileId>>,
}

impl Default for SourceMap {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceMap {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            files: RwLock::new(HashMap::new()),
            paths: RwLock::new(HashMap::new()),
        }
    }

    /// Registers `source` under `path`. Registering the same path again returns the existing id
    /// and keeps the original text, so spans handed out earlier stay meaningful.
    pub fn register_source(&self, path: PathBuf, source: &str) -> FileId {
        if let Some(id) = self.file_id(&path) {
            return id;
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let file = SourceFile {
            id,
            path: path.clone(),
            source: Arc::from(source),
            line_starts: Arc::new(compute_line_starts(source)),
        };
        if let Ok(mut files) = self.files.write() {
            files.insert(id, file);
        }
        if let Ok(mut paths) = self.paths.write() {
            paths.insert(path, id);
        }
        id
    }

    pub fn file(&self, id: FileId) -> Option<SourceFile> {
        self.files
            .read()
            .ok()
            .and_then(|files| files.get(&id).cloned())
    }

    pub fn file_id(&self, path: &Path) -> Option<FileId> {
        self.paths
            .read()
            .ok()
            .and_then(|paths| paths.get(path).copied())
    }

    pub fn path(&self, id: FileId) -> Option<PathBuf> {
        self.file(id).map(|file| file.path)
    }

    /// Text of a token range. Invalid spans yield `None`.
    pub fn snippet(&self, span: Span) -> Option<String> {
        let file = self.file(span.file)?;
        file.slice(span).map(str::to_string)
    }

    /// `path:line:col` for the start of `span`, used when rendering diagnostics.
    pub fn describe(&self, span: Span) -> Option<String> {
        let file = self.file(span.file)?;
        let (line, col) = file.line_col(span.lo);
        Some(format!("{}:{}:{}", file.path.display(), line, col))
    }
}

fn compute_line_starts(source: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (idx, ch) in source.char_indices() {
        if ch == '\n' {
            starts.push(idx + 1);
        }
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn snippet_returns_verbatim_token_text() {
        let map = SourceMap::new();
        let id = map.register_source(PathBuf::from("a.cpp"), "int r = compute(x, y);\n");
        assert_eq!(map.snippet(Span::new(id, 8, 15)).as_deref(), Some("compute"));
        assert_eq!(map.snippet(Span::null()), None);
        assert_eq!(map.snippet(Span::new(id, 8, 400)), None);
    }

    #[test]
    fn registering_a_path_twice_keeps_the_first_buffer() {
        let map = SourceMap::new();
        let first = map.register_source(PathBuf::from("a.cpp"), "one");
        let second = map.register_source(PathBuf::from("a.cpp"), "two");
        assert_eq!(first, second);
        assert_eq!(map.snippet(Span::new(first, 0, 3)).as_deref(), Some("one"));
    }

    #[test]
    fn describe_reports_one_based_line_and_column() {
        let map = SourceMap::new();
        let id = map.register_source(PathBuf::from("a.cpp"), "int a;\nint b = f();\n");
        assert_eq!(
            map.describe(Span::new(id, 15, 16)).as_deref(),
            Some("a.cpp:2:9")
        );
    }

    proptest! {
        #[test]
        fn line_col_points_back_at_the_offset(
            lines in prop::collection::vec("[a-z ;(){}]{0,12}", 1..8),
            pick in any::<prop::sample::Index>(),
        ) {
            let source = lines.join("\n");
            let map = SourceMap::new();
            let file = map.file(map.register_source(PathBuf::from("p.cpp"), &source)).unwrap();
            let offset = pick.index(source.len() + 1);
            let (line, col) = file.line_col(offset as u32);
            let start: usize = lines[..line - 1].iter().map(|l| l.len() + 1).sum();
            prop_assert_eq!(start + col - 1, offset);
        }
    }
}
