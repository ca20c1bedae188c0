//! Clang driver for dumping the AST of a compile command

use crate::compile_db::CompileCommand;
use crate::{lowering, ClangError, Result};
use cw_core::ast::TranslationUnit;
use cw_core::config::clang_override;
use cw_core::source_map::SourceMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// Main interface for parsing translation units using clang
#[derive(Debug, Clone)]
pub struct ClangParser {
    clang_path: PathBuf,
}

impl ClangParser {
    /// Create a new ClangParser, finding clang in PATH
    pub fn new() -> Result<Self> {
        let clang_path = which::which("clang++")
            .or_else(|_| which::which("clang"))
            .or_else(|_| which::which("clang-19"))
            .or_else(|_| which::which("clang-18"))
            .or_else(|_| which::which("clang-17"))
            .or_else(|_| which::which("clang-16"))
            .map_err(|e| ClangError::ClangNotFound(e.to_string()))?;

        info!("Found clang at: {}", clang_path.display());
        Ok(Self { clang_path })
    }

    /// Create a ClangParser with a specific clang path
    pub fn with_path(clang_path: PathBuf) -> Result<Self> {
        if !clang_path.exists() {
            return Err(ClangError::FileNotFound(clang_path));
        }
        Ok(Self { clang_path })
    }

    /// Picks the clang binary: an explicit path first, then `CALLSITE_WRAPPER_CLANG`, then
    /// `PATH`.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit.map(Path::to_path_buf).or_else(clang_override) {
            Some(path) => Self::with_path(path),
            None => Self::new(),
        }
    }

    pub fn clang_path(&self) -> &Path {
        &self.clang_path
    }

    /// Dumps and lowers the translation unit of `command`. Every file the AST points into is
    /// registered with `source_map`.
    pub fn parse_translation_unit(
        &self,
        command: &CompileCommand,
        extra_args: &[String],
        source_map: &SourceMap,
    ) -> Result<TranslationUnit> {
        let source_file = command.source_path();
        Self::ensure_valid_source_file(&source_file)?;
        let json = self.dump_ast_json(command, extra_args)?;
        lowering::lower_translation_unit_from_json(&json, &source_file, &command.directory, source_map)
    }

    /// Runs clang in the command's directory with its arguments and `-ast-dump=json`.
    pub fn dump_ast_json(&self, command: &CompileCommand, extra_args: &[String]) -> Result<String> {
        let source_file = command.source_path();
        let mut cmd = Command::new(&self.clang_path);
        cmd.current_dir(&command.directory);

        for arg in command.clang_args() {
            cmd.arg(arg);
        }
        for arg in extra_args {
            cmd.arg(arg);
        }

        cmd.arg("-Xclang")
            .arg("-ast-dump=json")
            .arg("-fsyntax-only")
            .arg(&source_file);

        debug!("Running clang command: {:?}", cmd);

        let output = cmd.output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("Clang AST dump failed: {}", stderr);
            return Err(ClangError::CompilationFailed(stderr.to_string()));
        }

        String::from_utf8(output.stdout)
            .map_err(|err| ClangError::ParseError(format!("AST dump is not UTF-8: {err}")))
    }

    fn ensure_valid_source_file(source_file: &Path) -> Result<()> {
        if !source_file.exists() {
            return Err(ClangError::FileNotFound(source_file.to_path_buf()));
        }

        let ext = source_file
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ClangError::InvalidExtension("No extension".to_string()))?;

        match ext {
            "c" | "cc" | "cpp" | "cxx" | "c++" | "C" | "m" | "mm" | "cu" => Ok(()),
            _ => Err(ClangError::InvalidExtension(ext.to_string())),
        }
    }

    /// Get clang version information
    pub fn version(&self) -> Result<String> {
        let output = Command::new(&self.clang_path).arg("--version").output()?;

        if !output.status.success() {
            return Err(ClangError::Other("Failed to get clang version".to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
