//! Pass 2: spec indexing -- build the name-to-definition index.
//!
//! A name defined twice keeps the later definition; the earlier one is
//! reported as a warning.

use crate::ast::RawSpec;
use indexmap::IndexMap;

/// Raw definitions by spec name, in first-seen order.
pub type Index = IndexMap<String, RawSpec>;

/// Add `specs` to `index`, returning the names that were redefined.
pub fn build_index(index: &mut Index, specs: Vec<RawSpec>) -> Vec<String> {
    let mut redefined = Vec::new();
    for spec in specs {
        if let Some(first) = index.get(&spec.name) {
            tracing::warn!(
                spec = %spec.name,
                first = %format!("{}:{}", first.prov.file, first.prov.line),
                again = %format!("{}:{}", spec.prov.file, spec.prov.line),
                "duplicate spec definition; keeping the later one"
            );
            redefined.push(spec.name.clone());
        }
        index.insert(spec.name.clone(), spec);
    }
    redefined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Provenance;

    fn spec(name: &str, file: &str) -> RawSpec {
        RawSpec {
            name: name.to_owned(),
            prov: Provenance {
                file: file.to_owned(),
                line: 1,
            },
            ..RawSpec::default()
        }
    }

    #[test]
    fn later_definition_wins() {
        let mut index = Index::new();
        let redefined = build_index(
            &mut index,
            vec![spec("a-spec", "one.hh"), spec("b-spec", "one.hh"), spec("a-spec", "two.hh")],
        );
        assert_eq!(redefined, vec!["a-spec".to_owned()]);
        assert_eq!(index.len(), 2);
        assert_eq!(index["a-spec"].prov.file, "two.hh");
        assert_eq!(index.keys().next().map(String::as_str), Some("a-spec"));
    }
}
