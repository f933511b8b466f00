//! Pass 3: reference checking -- dangling spec names and eager cycles.
//!
//! Derived parameters are instantiated eagerly and includes are expanded
//! eagerly, so a cycle through those edges can never be built. Lists and
//! typed selections resolve on demand and do not count as edges.

use crate::config::Policy;
use crate::error::LoadError;
use crate::naming::{resolvable, spec_form, SpecForm};
use crate::pass2_index::Index;
use std::collections::HashSet;

/// Check every reference in `index`, handling problems per `on_error`.
///
/// Under [`Policy::Raise`] the first problem is returned as the error;
/// otherwise all problems are returned (and logged under `Warn`).
pub fn check_references(index: &Index, on_error: Policy) -> Result<Vec<LoadError>, LoadError> {
    let registered = |n: &str| index.contains_key(n);
    let mut problems = Vec::new();

    for spec in index.values() {
        for (name, line) in spec.references() {
            if !resolvable(name, &registered) {
                problems.push(LoadError::new(
                    3,
                    Some(spec.name.as_str()),
                    &spec.prov.file,
                    line,
                    format!("reference to unknown spec '{}'", name),
                ));
            }
        }
    }

    let mut visited: HashSet<String> = HashSet::new();
    let mut in_stack: Vec<String> = Vec::new();
    for name in index.keys() {
        detect_cycle(name, index, &mut visited, &mut in_stack, &mut problems);
    }

    for p in &problems {
        match on_error {
            Policy::Raise => return Err(p.clone()),
            Policy::Warn => tracing::warn!(error = %p, "reference problem"),
            Policy::Ignore => tracing::debug!(error = %p, "reference problem"),
        }
    }
    Ok(problems)
}

/// Names `spec` pulls in at instantiation time.
fn eager_edges<'a>(index: &'a Index, name: &str) -> Vec<(&'a str, u32)> {
    let Some(spec) = index.get(name) else {
        return Vec::new();
    };
    spec.references()
        .into_iter()
        .filter(|(n, _)| {
            matches!(spec_form(n), SpecForm::Plain | SpecForm::Typed { .. })
                && index.contains_key(*n)
        })
        .collect()
}

fn detect_cycle(
    name: &str,
    index: &Index,
    visited: &mut HashSet<String>,
    in_stack: &mut Vec<String>,
    problems: &mut Vec<LoadError>,
) {
    if visited.contains(name) {
        return;
    }
    if let Some(pos) = in_stack.iter().position(|x| x == name) {
        let mut cycle: Vec<String> = in_stack[pos..].to_vec();
        cycle.push(name.to_owned());
        let back_edge = &in_stack[in_stack.len() - 1];
        let (file, line) = match index.get(back_edge) {
            Some(spec) => {
                let line = eager_edges(index, back_edge)
                    .into_iter()
                    .find(|(n, _)| *n == name)
                    .map_or(spec.prov.line, |(_, l)| l);
                (spec.prov.file.clone(), line)
            }
            None => (String::new(), 0),
        };
        problems.push(LoadError::new(
            3,
            Some(back_edge.as_str()),
            &file,
            line,
            format!("spec reference cycle: {}", cycle.join(" \u{2192} ")),
        ));
        return;
    }

    in_stack.push(name.to_owned());
    let edges: Vec<String> = eager_edges(index, name)
        .into_iter()
        .map(|(n, _)| n.to_owned())
        .collect();
    for next in edges {
        detect_cycle(&next, index, visited, in_stack, problems);
    }
    in_stack.pop();
    visited.insert(name.to_owned());
}
