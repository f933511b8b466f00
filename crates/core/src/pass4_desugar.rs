//! Pass 4: desugaring -- expand includes, rewrite key parameters, and
//! discover the variants of every typed field. Produces the frozen
//! [`Catalog`].

use crate::ast::{RawComponent, RawParam, RawSpec, RawType};
use crate::naming::{hyphenate, spec_form, variant_spec_name, SpecForm, LIST_SUFFIX};
use crate::pass2_index::Index;
use crate::primitives::{PrimitiveType, Value};
use crate::registry::Catalog;
use std::collections::{BTreeMap, HashMap};

/// The run-time prefix stripped from key defaults to form suffix defaults.
const DOMAIN_PREFIX: &str = "DOMAIN-";

pub fn desugar(index: &Index) -> Catalog {
    let mut keyed: Index = index.clone();
    for spec in keyed.values_mut() {
        desugar_keys(spec);
    }

    let mut expanded: HashMap<String, RawSpec> = HashMap::new();
    for name in keyed.keys() {
        let spec = expand_includes(name, &keyed, &mut Vec::new());
        expanded.insert(name.clone(), spec);
    }

    let mut valid_types = HashMap::new();
    for typed in typed_names(index) {
        if let SpecForm::Typed { field, .. } = spec_form(&typed) {
            let found = variants(&typed, &field, index.keys().map(String::as_str));
            tracing::debug!(spec = %typed, count = found.len(), "discovered variants");
            valid_types.insert(typed, found);
        }
    }

    Catalog::new(expanded, valid_types)
}

/// Rewrite each top-level `"<x> key"` parameter into a `ONE OF` between the
/// key and a `"<x> suffix"` string.
///
/// The suffix defaults to the key's default with any `DOMAIN-` prefix
/// removed. A spec that already declares the suffix is left alone.
pub(crate) fn desugar_keys(spec: &mut RawSpec) {
    let declared: Vec<String> = spec.params().map(|p| p.name.clone()).collect();
    let mut alternations = Vec::new();
    for component in &mut spec.components {
        let RawComponent::Params(params) = component else {
            continue;
        };
        let mut kept = Vec::new();
        for p in std::mem::take(params) {
            let Some(base) = p.name.strip_suffix(" key").filter(|b| !b.is_empty()) else {
                kept.push(p);
                continue;
            };
            let suffix_name = format!("{} suffix", base);
            if declared.contains(&suffix_name) {
                tracing::warn!(
                    spec = %spec.name,
                    key = %p.name,
                    "suffix parameter already declared; leaving key as is"
                );
                kept.push(p);
                continue;
            }
            let default = p
                .default
                .as_ref()
                .and_then(Value::as_str)
                .map(|d| Value::String(d.strip_prefix(DOMAIN_PREFIX).unwrap_or(d).to_owned()));
            let suffix = RawParam {
                name: suffix_name,
                type_: RawType::Primitive(PrimitiveType::String),
                optional: default.is_some(),
                default,
                doc: p.doc.clone(),
                prov: p.prov.clone(),
            };
            alternations.push(RawComponent::OneOf(vec![vec![p], vec![suffix]]));
        }
        *params = kept;
    }
    spec.components
        .retain(|c| !matches!(c, RawComponent::Params(ps) if ps.is_empty()));
    spec.components.extend(alternations);
}

/// A copy of `name` with its includes (recursively) merged in.
fn expand_includes(name: &str, index: &Index, stack: &mut Vec<String>) -> RawSpec {
    let Some(spec) = index.get(name) else {
        return RawSpec::default();
    };
    let mut out = spec.clone();
    stack.push(name.to_owned());
    for inc in &spec.includes {
        if stack.contains(inc) {
            tracing::warn!(spec = %name, include = %inc, "skipping cyclic include");
            continue;
        }
        if !index.contains_key(inc) {
            continue;
        }
        let sub = expand_includes(inc, index, stack);
        out.components.extend(sub.components);
        union_into(&mut out.evaluators, sub.evaluators);
        union_into(&mut out.keys, sub.keys);
        union_into(&mut out.dependencies, sub.dependencies);
    }
    stack.pop();
    out
}

fn union_into(into: &mut Vec<String>, from: Vec<String>) {
    for s in from {
        if !into.contains(&s) {
            into.push(s);
        }
    }
}

/// Typed names that are registered or referenced anywhere.
fn typed_names(index: &Index) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut add = |n: &str| {
        let mut n = n;
        while let Some(element) = n.strip_suffix(LIST_SUFFIX) {
            n = element;
        }
        if matches!(spec_form(n), SpecForm::Typed { .. }) && !names.iter().any(|x| x == n) {
            names.push(n.to_owned());
        }
    };
    for (name, spec) in index {
        add(name.as_str());
        for (r, _) in spec.references() {
            add(r);
        }
    }
    names
}

/// Variants of a typed field: registered plain names `<field>-<type>-spec`,
/// keyed by the hyphenated type name.
pub(crate) fn variants<'a>(
    typed: &str,
    field: &str,
    names: impl Iterator<Item = &'a str>,
) -> BTreeMap<String, String> {
    let prefix = format!("{}-", hyphenate(field));
    names
        .filter(|n| *n != typed && matches!(spec_form(n), SpecForm::Plain))
        .filter_map(|n| {
            let type_name = n.strip_prefix(&prefix)?.strip_suffix("-spec")?;
            let spec = variant_spec_name(field, type_name);
            (!type_name.is_empty() && spec == n).then(|| (type_name.to_owned(), spec))
        })
        .collect()
}
