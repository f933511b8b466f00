//! Pass 0+1: walk a source tree, extract comment blocks, parse specs.
//!
//! Per-file failures are handled by [`LoadOptions::on_error`]; files that
//! parse but declare nothing by [`LoadOptions::on_empty`].

use crate::ast::RawSpec;
use crate::config::{LoadOptions, Policy};
use crate::error::LoadError;
use crate::lexer;
use crate::parser;
use crate::source::SourceProvider;
use serde::Serialize;
use std::path::Path;

/// What happened during a source walk.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    /// Files that passed the name filter and were read.
    pub files_read: usize,
    /// Specs parsed across all files.
    pub specs: usize,
    /// Files skipped because they failed to read or parse.
    pub skipped: Vec<LoadError>,
    /// Files that parsed but declared no specs.
    pub empty: Vec<String>,
    /// Dangling references and cycles found when the load was finished.
    pub unresolved: Vec<LoadError>,
}

impl LoadReport {
    pub fn merge(&mut self, other: LoadReport) {
        self.files_read += other.files_read;
        self.specs += other.specs;
        self.skipped.extend(other.skipped);
        self.empty.extend(other.empty);
        self.unresolved.extend(other.unresolved);
    }

    /// Did anything go wrong short of aborting the load?
    pub fn has_problems(&self) -> bool {
        !self.skipped.is_empty() || !self.unresolved.is_empty()
    }
}

/// Parse every accepted file under `root` using the given provider.
pub fn load_sources_with_provider(
    root: &Path,
    provider: &dyn SourceProvider,
    options: &LoadOptions,
) -> Result<(Vec<RawSpec>, LoadReport), LoadError> {
    let files = provider.list_sources(root).map_err(|e| {
        LoadError::new(
            1,
            None,
            &root.to_string_lossy(),
            0,
            format!("cannot list sources: {}", e),
        )
    })?;

    let mut report = LoadReport::default();
    let mut all: Vec<RawSpec> = Vec::new();
    for path in files.iter().filter(|p| options.accepts(p)) {
        report.files_read += 1;
        let file = path.to_string_lossy().into_owned();
        match load_file(path, provider, options) {
            Ok(specs) if specs.is_empty() => {
                match options.on_empty {
                    Policy::Raise => {
                        return Err(LoadError::new(1, None, &file, 0, "no specs found in file"))
                    }
                    Policy::Warn => tracing::warn!(file = %file, "no specs found in file"),
                    Policy::Ignore => tracing::debug!(file = %file, "no specs found in file"),
                }
                report.empty.push(file);
            }
            Ok(specs) => {
                tracing::debug!(file = %file, count = specs.len(), "parsed specs");
                report.specs += specs.len();
                all.extend(specs);
            }
            Err(e) => {
                match options.on_error {
                    Policy::Raise => return Err(e),
                    Policy::Warn => tracing::warn!(error = %e, "skipping file"),
                    Policy::Ignore => tracing::debug!(error = %e, "skipping file"),
                }
                report.skipped.push(e);
            }
        }
    }
    Ok((all, report))
}

/// Read and parse one source file.
pub fn load_file(
    path: &Path,
    provider: &dyn SourceProvider,
    options: &LoadOptions,
) -> Result<Vec<RawSpec>, LoadError> {
    let file = path.to_string_lossy();
    let text = provider
        .read_source(path)
        .map_err(|e| LoadError::new(1, None, &file, 0, format!("cannot read file: {}", e)))?;
    load_text(&file, &options.stem(path), &text)
}

/// Parse specs out of a source text. `stem` names headerless scopes.
pub fn load_text(filename: &str, stem: &str, text: &str) -> Result<Vec<RawSpec>, LoadError> {
    let lines = lexer::extract_comments(text);
    parser::parse(&lines, filename, stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemoryProvider;

    const GOOD: &str = "/*!\n * `\"x`\" ``[double]``\n */\nclass Good {};\n";
    const BAD: &str = "/*!\n * `\"y`\" ``[flux]\n */\n";
    const NONE: &str = "// nothing here\nint main() {}\n";

    fn provider() -> InMemoryProvider {
        InMemoryProvider::new()
            .with_file("/src/Good.hh", GOOD)
            .with_file("/src/Bad.hh", BAD)
            .with_file("/src/Empty.hh", NONE)
            .with_file("/src/Good.cc", GOOD)
            .with_file("/src/pks_reg.hh", GOOD)
    }

    #[test]
    fn warn_policy_skips_bad_files() {
        let (specs, report) =
            load_sources_with_provider(Path::new("/src"), &provider(), &LoadOptions::default())
                .unwrap();
        assert_eq!(report.files_read, 3);
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, "good-spec");
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].file.ends_with("Bad.hh"));
        assert_eq!(report.empty.len(), 1);
    }

    #[test]
    fn raise_policy_aborts() {
        let err = load_sources_with_provider(Path::new("/src"), &provider(), &LoadOptions::strict())
            .unwrap_err();
        assert!(err.file.ends_with("Bad.hh"));
    }

    #[test]
    fn raise_on_empty() {
        let opts = LoadOptions {
            on_empty: Policy::Raise,
            ..LoadOptions::default()
        };
        let p = InMemoryProvider::new().with_file("/e/Empty.hh", NONE);
        let err = load_sources_with_provider(Path::new("/e"), &p, &opts).unwrap_err();
        assert!(err.message.contains("no specs"));
    }

    #[test]
    fn missing_root_is_an_error() {
        let err = load_sources_with_provider(
            Path::new("/nowhere"),
            &InMemoryProvider::new(),
            &LoadOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.pass, 1);
    }
}
