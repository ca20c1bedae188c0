//! Diagnostic and error reporting utilities

use crate::Result;
use cw_core::diagnostics::{Diagnostic, DiagnosticDisplayOptions, DiagnosticLevel, DiagnosticManager};
use cw_core::source_map::SourceMap;
use miette::{LabeledSpan, NamedSource, Severity, SourceCode, SourceSpan};
use std::fmt::{Display, Formatter};

/// Set up enhanced error reporting with miette
pub fn setup_error_reporting() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .map_err(|e| crate::CliError::Config(format!("Failed to setup error reporting: {}", e)))?;

    Ok(())
}

/// How diagnostics reach stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticStyle {
    /// miette reports with a source snippet, where the location is known.
    Fancy,
    /// One line per diagnostic, for machine-readable log output.
    Plain,
}

/// A diagnostic attached to the text of the file it points into.
#[derive(Debug)]
pub struct SourceDiagnostic {
    message: String,
    code: Option<String>,
    severity: Severity,
    help: Vec<String>,
    source: NamedSource<String>,
    span: SourceSpan,
}

impl SourceDiagnostic {
    /// `None` when the diagnostic has no location the source map can resolve.
    pub fn new(diagnostic: &Diagnostic, source_map: &SourceMap) -> Option<Self> {
        let span = diagnostic.span?;
        let file = source_map.file(span.file)?;
        file.slice(span)?;
        Some(Self {
            message: diagnostic.message.clone(),
            code: diagnostic.code.clone(),
            severity: match diagnostic.level {
                DiagnosticLevel::Error => Severity::Error,
                DiagnosticLevel::Warning => Severity::Warning,
                DiagnosticLevel::Info => Severity::Advice,
            },
            help: diagnostic.suggestions.clone(),
            source: NamedSource::new(file.path.display().to_string(), file.source.to_string()),
            span: SourceSpan::new((span.lo as usize).into(), span.len() as usize),
        })
    }
}

impl Display for SourceDiagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SourceDiagnostic {}

impl miette::Diagnostic for SourceDiagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        self.code
            .as_ref()
            .map(|code| Box::new(code) as Box<dyn Display + 'a>)
    }

    fn severity(&self) -> Option<Severity> {
        Some(self.severity)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        if self.help.is_empty() {
            return None;
        }
        Some(Box::new(self.help.join("\n")))
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        Some(&self.source)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(LabeledSpan::underline(self.span))))
    }
}

/// Writes `diagnostics` to stderr. Fancy output falls back to the plain template for
/// diagnostics without a usable location.
pub fn report(
    diagnostics: &[Diagnostic],
    context: &str,
    style: DiagnosticStyle,
    verbose: bool,
    source_map: &SourceMap,
) {
    let options = match style {
        DiagnosticStyle::Fancy => DiagnosticDisplayOptions::pretty(verbose),
        DiagnosticStyle::Plain => DiagnosticDisplayOptions::plain(verbose),
    };
    for diagnostic in diagnostics {
        if diagnostic.level == DiagnosticLevel::Info && !verbose {
            continue;
        }
        let fancy = match style {
            DiagnosticStyle::Fancy => SourceDiagnostic::new(diagnostic, source_map),
            DiagnosticStyle::Plain => None,
        };
        match fancy {
            Some(fancy) => eprintln!("{:?}", miette::Report::new(fancy)),
            None => DiagnosticManager::emit(
                std::slice::from_ref(diagnostic),
                Some(context),
                &options,
                Some(source_map),
            ),
        }
    }
}
