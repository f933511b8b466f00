//! Load orchestrator: walk every source root, then finish the registry.
//!
//! This is a thin driver over the pass modules:
//! pass 0+1 per root ([`crate::pass1_load`]), then passes 2-4 once
//! ([`Registry::finish_load`]).

use crate::config::LoadOptions;
use crate::error::LoadError;
use crate::pass1_load::LoadReport;
use crate::registry::Registry;
use crate::source::{FileSystemProvider, SourceProvider};
use std::path::Path;

/// Load every accepted file under `roots` and return a finished registry.
pub fn load<P: AsRef<Path>>(
    roots: &[P],
    options: &LoadOptions,
) -> Result<(Registry, LoadReport), LoadError> {
    load_with_provider(roots, &FileSystemProvider, options)
}

pub fn load_with_provider<P: AsRef<Path>>(
    roots: &[P],
    provider: &dyn SourceProvider,
    options: &LoadOptions,
) -> Result<(Registry, LoadReport), LoadError> {
    let mut registry = Registry::with_options(options.clone());
    let mut report = LoadReport::default();

    // Passes 0+1: scan sources
    for root in roots {
        report.merge(registry.load_with_provider(root.as_ref(), provider)?);
    }

    // Passes 2-4: index, references, desugar
    report.unresolved = registry.finish_load()?.to_vec();

    Ok((registry, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemoryProvider;

    #[test]
    fn loads_multiple_roots() {
        let provider = InMemoryProvider::new()
            .with_file("/a/One.hh", "/*!\n* `\"x`\" ``[int]``\n*/\n")
            .with_file("/b/Two.hh", "/*!\n* `\"one`\" ``[one-spec]``\n* `\"gone`\" ``[gone-spec]``\n*/\n");
        let (registry, report) =
            load_with_provider(&["/a", "/b"], &provider, &LoadOptions::default()).unwrap();
        assert_eq!(report.files_read, 2);
        assert_eq!(registry.names(), vec!["one-spec", "two-spec"]);
        assert_eq!(report.unresolved.len(), 1);
        assert!(report.has_problems());
        assert!(registry.get("two-spec").is_err());
    }
}
