//! `compile_commands.json` loading.

use eyre::{Result, WrapErr};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const COMPILE_COMMANDS: &str = "compile_commands.json";

#[derive(Debug, Clone, Deserialize)]
pub struct CompileCommand {
    pub directory: PathBuf,
    pub file: PathBuf,
    #[serde(default)]
    pub arguments: Option<Vec<String>>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl CompileCommand {
    /// The source file as an absolute path.
    pub fn source_path(&self) -> PathBuf {
        normalize_path(&self.directory.join(&self.file))
    }

    /// Compiler arguments with the compiler itself, `-c`, the output file and the source file
    /// removed, ready to be reused for an AST dump.
    pub fn clang_args(&self) -> Vec<String> {
        let args = match (&self.arguments, &self.command) {
            (Some(arguments), _) => arguments.clone(),
            (None, Some(command)) => split_command_line(command),
            (None, None) => Vec::new(),
        };
        let source = self.source_path();
        let mut out = Vec::with_capacity(args.len());
        let mut iter = args.into_iter().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-c" => {}
                "-o" => {
                    iter.next();
                }
                _ if arg.starts_with("-o") && arg.len() > 2 => {}
                _ if normalize_path(&self.directory.join(&arg)) == source => {}
                _ => out.push(arg),
            }
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct CompilationDatabase {
    path: PathBuf,
    commands: Vec<CompileCommand>,
}

impl CompilationDatabase {
    /// Loads `compile_commands.json` from `build_dir`.
    pub fn load(build_dir: &Path) -> Result<Self> {
        let path = build_dir.join(COMPILE_COMMANDS);
        let text = fs::read_to_string(&path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;
        let commands = Self::parse(&text).wrap_err_with(|| format!("invalid {}", path.display()))?;
        debug!("loaded {} compile commands from {}", commands.len(), path.display());
        Ok(Self { path, commands })
    }

    fn parse(text: &str) -> Result<Vec<CompileCommand>> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_commands(path: PathBuf, commands: Vec<CompileCommand>) -> Self {
        Self { path, commands }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn commands(&self) -> &[CompileCommand] {
        &self.commands
    }

    /// The first command compiling `file`. Relative paths are taken relative to the working
    /// directory.
    pub fn find(&self, file: &Path) -> Option<&CompileCommand> {
        let wanted = normalize_path(file);
        self.commands
            .iter()
            .find(|command| command.source_path() == wanted)
    }
}

/// Splits a shell-style command line. Single quotes are literal, double quotes allow `\"` and
/// `\\` escapes, and a backslash outside quotes escapes the next character.
pub fn split_command_line(command: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut chars = command.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {
                in_arg = true;
                for quoted in chars.by_ref() {
                    if quoted == '\'' {
                        break;
                    }
                    current.push(quoted);
                }
            }
            '"' => {
                in_arg = true;
                while let Some(quoted) = chars.next() {
                    match quoted {
                        '"' => break,
                        '\\' => match chars.next() {
                            Some(escaped @ ('"' | '\\')) => current.push(escaped),
                            Some(other) => {
                                current.push('\\');
                                current.push(other);
                            }
                            None => current.push('\\'),
                        },
                        _ => current.push(quoted),
                    }
                }
            }
            '\\' => {
                in_arg = true;
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            _ if ch.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            _ => {
                in_arg = true;
                current.push(ch);
            }
        }
    }
    if in_arg {
        args.push(current);
    }
    args
}

/// Canonical form of `path`; paths that do not exist are made absolute lexically.
pub fn normalize_path(path: &Path) -> PathBuf {
    match fs::canonicalize(path) {
        Ok(canonical) => canonical,
        Err(_) => absolute_lexical(path),
    }
}

/// Absolute form of a path that may not exist, resolving `.` and `..` lexically.
fn absolute_lexical(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_quoted_arguments() {
        assert_eq!(
            split_command_line(r#"clang++ -DNAME="a b" '-DQ=x y' -I\ dir  main.cpp"#),
            vec!["clang++", "-DNAME=a b", "-DQ=x y", "-I dir", "main.cpp"]
        );
        assert_eq!(split_command_line(r#"cc "" x"#), vec!["cc", "", "x"]);
    }

    #[test]
    fn strips_compiler_output_and_source() {
        let command = CompileCommand {
            directory: PathBuf::from("/build"),
            file: PathBuf::from("../src/main.cpp"),
            arguments: None,
            command: Some("/usr/bin/c++ -std=c++17 -Iinclude -c -o main.o ../src/main.cpp".to_string()),
            output: None,
        };
        assert_eq!(command.clang_args(), vec!["-std=c++17", "-Iinclude"]);
        assert_eq!(command.source_path(), PathBuf::from("/src/main.cpp"));
    }

    #[test]
    fn prefers_the_argument_array() {
        let command = CompileCommand {
            directory: PathBuf::from("/build"),
            file: PathBuf::from("/src/a.cpp"),
            arguments: Some(vec![
                "clang++".to_string(),
                "-DX".to_string(),
                "-omain.o".to_string(),
                "/src/a.cpp".to_string(),
            ]),
            command: Some("ignored -DY".to_string()),
            output: None,
        };
        assert_eq!(command.clang_args(), vec!["-DX"]);
    }
}
