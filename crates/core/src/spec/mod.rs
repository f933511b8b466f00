//! Runtime spec instances.
//!
//! A [`SchemaNode`] is what the registry hands out: a plain [`Spec`], a
//! [`TypedCollection`] (`<x>-list`), or a polymorphic [`TypedSpec`]
//! (`<x>-typed*-spec`). A spec is a sequence of [`Component`]s: fixed
//! [`ParameterCollection`]s, [`OneOf`] alternations, and [`CaseSwitch`]
//! conditionals, all holding [`Parameter`] leaves.
//!
//! Every node is an independent deep copy; `Clone` is the copy operation.

mod collection;
mod component;
mod node;
mod oneof;
mod parameter;
mod switch;
mod typed;

pub use collection::{ParameterCollection, UnknownKeys};
pub use component::Component;
pub use node::{OpenAlternation, OpenChoice, SchemaNode, Spec};
pub use oneof::OneOf;
pub use parameter::{ParamType, Parameter};
pub use switch::CaseSwitch;
pub use typed::{ElementType, Placement, TypedCollection, TypedSpec};

/// Keep the first parameter of each name, preserving order.
pub(crate) fn dedup_by_name(params: Vec<&Parameter>) -> Vec<&Parameter> {
    let mut seen = std::collections::HashSet::new();
    params
        .into_iter()
        .filter(|p| seen.insert(p.name().to_owned()))
        .collect()
}
