//! The callsite-wrapper run: parse each translation unit, rewrite its wrapped calls, then print
//! every input file with all collected edits applied.

use crate::diagnostics::{report, DiagnosticStyle};
use crate::{CliError, Result};
use cw_clang::compile_db::normalize_path;
use cw_clang::{ClangError, ClangParser, CompilationDatabase};
use cw_core::diagnostics::{Diagnostic, DiagnosticManager};
use cw_core::source_map::SourceMap;
use cw_rewrite::{
    contract_diagnostic, rewrite_translation_unit, EditCollector, Emitter, RewriteError,
    RewriteOptions, RewriteStats,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct ToolOptions {
    pub build_dir: PathBuf,
    pub files: Vec<PathBuf>,
    pub clang: Option<PathBuf>,
    pub extra_args: Vec<String>,
    pub rewrite: RewriteOptions,
    pub style: DiagnosticStyle,
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Rewritten,
    Unchanged,
    /// The file was printed as it is on disk, or not at all when it could not be read.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub status: FileStatus,
    pub stats: RewriteStats,
}

#[derive(Debug, Clone, Default)]
pub struct ToolReport {
    pub files: Vec<FileReport>,
}

impl ToolReport {
    pub fn failed(&self) -> usize {
        self.files
            .iter()
            .filter(|file| matches!(file.status, FileStatus::Failed(_)))
            .count()
    }

    pub fn rewritten(&self) -> usize {
        self.files
            .iter()
            .filter(|file| file.status == FileStatus::Rewritten)
            .count()
    }

    pub fn success(&self) -> bool {
        self.failed() == 0
    }
}

pub struct CallsiteTool {
    options: ToolOptions,
    database: CompilationDatabase,
    parser: ClangParser,
    source_map: SourceMap,
}

impl CallsiteTool {
    pub fn new(options: ToolOptions) -> Result<Self> {
        let database = CompilationDatabase::load(&options.build_dir).map_err(cw_core::Error::from)?;
        let parser = ClangParser::resolve(options.clang.as_deref())?;
        Ok(Self {
            options,
            database,
            parser,
            source_map: SourceMap::new(),
        })
    }

    /// Processes every input file, then writes each one to `out` with the edits of all
    /// successful translation units applied. A file that failed is written unchanged.
    pub fn run<W: Write>(&self, out: &mut W) -> Result<ToolReport> {
        let mut edits = EditCollector::new();
        let mut reports = Vec::with_capacity(self.options.files.len());

        for file in &self.options.files {
            let path = normalize_path(file);
            let (status, stats) = match self.process(&path) {
                Ok((file_edits, stats)) => {
                    edits.merge(file_edits);
                    (FileStatus::Unchanged, stats)
                }
                Err(err) => {
                    error!("{}: {}", file.display(), err);
                    (FileStatus::Failed(err.to_string()), RewriteStats::default())
                }
            };
            reports.push(FileReport { path, status, stats });
        }

        let emitter = Emitter::new(&self.source_map, &edits);
        for report in &mut reports {
            if let Err(err) = self.ensure_loaded(&report.path) {
                warn!("cannot print {}: {}", report.path.display(), err);
                if !matches!(report.status, FileStatus::Failed(_)) {
                    report.status = FileStatus::Failed(err.to_string());
                }
                continue;
            }
            let has_edits = edits.file(&report.path).is_some_and(|file| !file.is_empty());
            match emitter.emit(&report.path, out)? {
                Ok(()) => {
                    if has_edits && report.status == FileStatus::Unchanged {
                        report.status = FileStatus::Rewritten;
                    }
                }
                Err(err) => {
                    let err = RewriteError::from(err);
                    self.emit_diagnostics(&report.path, &[contract_diagnostic(&err, true)]);
                    report.status = FileStatus::Failed(err.to_string());
                }
            }
        }
        out.flush()?;

        let report = ToolReport { files: reports };
        info!(
            "{} files: {} rewritten, {} failed",
            report.files.len(),
            report.rewritten(),
            report.failed()
        );
        Ok(report)
    }

    /// Parses and rewrites one translation unit. Edits are only returned when the whole unit
    /// succeeded.
    fn process(&self, path: &Path) -> Result<(EditCollector, RewriteStats)> {
        let command = self
            .database
            .find(path)
            .ok_or_else(|| ClangError::MissingCompileCommand(path.to_path_buf()))?;
        let tu = self
            .parser
            .parse_translation_unit(command, &self.options.extra_args, &self.source_map)?;

        let diagnostics = DiagnosticManager::new();
        let (edits, stats) =
            match rewrite_translation_unit(&tu, &self.source_map, self.options.rewrite, &diagnostics) {
                Ok(done) => done,
                Err(err) => {
                    diagnostics.add_diagnostic(contract_diagnostic(&err, true));
                    self.emit_diagnostics(path, &diagnostics.get_diagnostics());
                    return Err(err.into());
                }
            };
        diagnostics.add_diagnostic(Diagnostic::info(format!(
            "{} wrapped calls, {} rewritten, {} skipped",
            stats.matched, stats.rewritten, stats.skipped
        )));
        self.emit_diagnostics(path, &diagnostics.get_diagnostics());
        Ok((edits, stats))
    }

    fn emit_diagnostics(&self, path: &Path, diagnostics: &[Diagnostic]) {
        let context = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        report(
            diagnostics,
            &context,
            self.options.style,
            self.options.verbose,
            &self.source_map,
        );
    }

    /// Registers `path` with the source map if parsing never did.
    fn ensure_loaded(&self, path: &Path) -> Result<()> {
        if self.source_map.file_id(path).is_none() {
            let source = fs::read_to_string(path)
                .map_err(|err| CliError::InvalidInput(format!("{}: {}", path.display(), err)))?;
            self.source_map.register_source(path.to_path_buf(), &source);
        }
        Ok(())
    }
}
