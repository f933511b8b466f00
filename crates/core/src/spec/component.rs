use super::{CaseSwitch, OneOf, Parameter, ParameterCollection, SchemaNode};
use crate::error::TreeError;
use crate::primitives::Value;

/// One building block of a [`Spec`](super::Spec).
#[derive(Debug, Clone)]
pub enum Component {
    Collection(ParameterCollection),
    OneOf(OneOf),
    Switch(CaseSwitch),
}

impl Component {
    pub fn contains(&self, key: &str) -> bool {
        match self {
            Component::Collection(c) => c.contains(key),
            Component::OneOf(o) => o.contains(key),
            Component::Switch(s) => s.contains(key),
        }
    }

    pub fn parameter(&self, key: &str) -> Option<&Parameter> {
        match self {
            Component::Collection(c) => c.parameter(key),
            Component::OneOf(o) => o.parameter(key),
            Component::Switch(s) => s.parameter(key),
        }
    }

    /// Validate a write of `value` to a key this component declares.
    pub(crate) fn check_set(&self, key: &str, value: &Value) -> Result<(), TreeError> {
        match self {
            Component::Collection(c) => c.check_set(key, value),
            Component::OneOf(o) => o.plan(key, Some(value)).map(drop),
            Component::Switch(s) => s.plan(key, Some(value)).map(drop),
        }
    }

    /// Validate reaching into the sub-spec under `key`.
    pub(crate) fn check_access(&self, key: &str) -> Result<(), TreeError> {
        match self {
            Component::Collection(_) => Ok(()),
            Component::OneOf(o) => o.plan(key, None).map(drop),
            Component::Switch(s) => s.plan(key, None).map(drop),
        }
    }

    pub fn set(&mut self, key: &str, value: Value) -> Result<(), TreeError> {
        match self {
            Component::Collection(c) => c.set(key, value),
            Component::OneOf(o) => o.set(key, value),
            Component::Switch(s) => s.set(key, value),
        }
    }

    pub(crate) fn node_mut(&mut self, key: &str) -> Result<&mut SchemaNode, TreeError> {
        match self {
            Component::Collection(c) => match c.parameter_mut(key) {
                Some(p) => p.node_mut_checked(),
                None => Err(TreeError::UnknownKey {
                    key: key.to_owned(),
                    owner: "collection".to_owned(),
                }),
            },
            Component::OneOf(o) => o.node_mut(key),
            Component::Switch(s) => s.node_mut(key),
        }
    }

    /// Narrow a ONE OF as an access to `key` would; no-op otherwise.
    pub(crate) fn select(&mut self, key: &str) -> Result<(), TreeError> {
        match self {
            Component::OneOf(o) => o.select(key),
            _ => Ok(()),
        }
    }

    pub fn is_complete(&self) -> bool {
        match self {
            Component::Collection(c) => c.is_complete(),
            Component::OneOf(o) => o.is_complete(),
            Component::Switch(s) => s.is_complete(),
        }
    }

    pub fn has_value(&self) -> bool {
        match self {
            Component::Collection(c) => c.has_value(),
            Component::OneOf(o) => o.has_value(),
            Component::Switch(s) => s.has_value(),
        }
    }

    pub fn is_optional(&self) -> bool {
        match self {
            Component::Collection(c) => c.is_optional(),
            Component::OneOf(o) => o.is_optional(),
            Component::Switch(s) => s.is_optional(),
        }
    }

    pub fn parameters(&self) -> Vec<&Parameter> {
        match self {
            Component::Collection(c) => c.parameters().collect(),
            Component::OneOf(o) => o.parameters(),
            Component::Switch(s) => s.parameters(),
        }
    }

    pub fn complete(&self) -> Vec<&Parameter> {
        match self {
            Component::Collection(c) => c.complete(),
            Component::OneOf(o) => o.complete(),
            Component::Switch(s) => s.complete(),
        }
    }

    pub fn valued(&self) -> Vec<&Parameter> {
        match self {
            Component::Collection(c) => c.valued(),
            Component::OneOf(o) => o.valued(),
            Component::Switch(s) => s.valued(),
        }
    }

    pub fn unfilled(&self) -> Vec<&Parameter> {
        match self {
            Component::Collection(c) => c.unfilled(),
            Component::OneOf(o) => o.unfilled(),
            Component::Switch(s) => s.unfilled(),
        }
    }

    pub fn optional(&self) -> Vec<&Parameter> {
        match self {
            Component::Collection(c) => c.optional(),
            Component::OneOf(o) => o.optional(),
            Component::Switch(s) => s.optional(),
        }
    }
}
