//! Populate a spec instance from a JSON document.
//!
//! Objects recurse into derived parameters (appending a new entry when the
//! node is a list of specs); scalars and arrays are written through the
//! parameter's declared type. Selector keys (`"<field> type"`, case
//! parameters) are written before the keys that depend on them.

use crate::error::TreeError;
use crate::primitives::{PrimitiveType, Value};
use crate::spec::{ElementType, SchemaNode};
use serde_json::Value as Json;

#[derive(Debug, thiserror::Error)]
pub enum FillError {
    #[error("{path}: {source}")]
    Tree {
        path: String,
        #[source]
        source: TreeError,
    },

    #[error("{path}: expected a JSON object")]
    NotObject { path: String },

    #[error("{path}: cannot use JSON value {value} here")]
    Unsupported { path: String, value: String },
}

/// Apply every entry of the JSON object `values` to `node`.
pub fn apply_json(node: &mut SchemaNode, values: &Json) -> Result<(), FillError> {
    apply(node, values, "")
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_owned()
    } else {
        format!("{}/{}", path, key)
    }
}

fn apply(node: &mut SchemaNode, values: &Json, path: &str) -> Result<(), FillError> {
    let Some(object) = values.as_object() else {
        return Err(FillError::NotObject {
            path: if path.is_empty() { "/".to_owned() } else { path.to_owned() },
        });
    };
    let (first, rest): (Vec<_>, Vec<_>) = object.iter().partition(|(k, _)| node.is_selector(k));

    for (key, value) in first.into_iter().chain(rest) {
        let here = join(path, key);
        let tree = |source| FillError::Tree {
            path: here.clone(),
            source,
        };

        if let SchemaNode::List(list) = &mut *node {
            if !list.contains(key) {
                list.append_empty(key).map_err(tree)?;
            }
        }

        if value.is_object() {
            let child = node.node_mut(key).map_err(tree)?;
            apply(child, value, &here)?;
            continue;
        }

        let hint = match node.parameter(key).and_then(|p| p.primitive_type()) {
            Some(p) => Some(p),
            None => match node.as_list().map(|l| l.element()) {
                Some(ElementType::Primitive(p)) => Some(*p),
                _ => None,
            },
        };
        let converted = to_value(value, hint).ok_or_else(|| FillError::Unsupported {
            path: here.clone(),
            value: value.to_string(),
        })?;
        node.set(key, converted).map_err(tree)?;
    }
    Ok(())
}

/// Convert a JSON scalar or array; `hint` decides number and empty-array
/// types.
pub fn to_value(json: &Json, hint: Option<PrimitiveType>) -> Option<Value> {
    match json {
        Json::Bool(b) => Some(Value::Bool(*b)),
        Json::Number(n) => match (n.as_i64(), hint) {
            (Some(i), Some(PrimitiveType::Double)) => Some(Value::Double(i as f64)),
            (Some(i), _) => Some(Value::Int(i)),
            (None, _) => n.as_f64().map(Value::Double),
        },
        Json::String(s) => Some(Value::String(s.clone())),
        Json::Array(items) => array_value(items, hint),
        Json::Null | Json::Object(_) => None,
    }
}

fn array_value(items: &[Json], hint: Option<PrimitiveType>) -> Option<Value> {
    if items.is_empty() {
        return Some(match hint {
            Some(PrimitiveType::DoubleArray) => Value::DoubleArray(Vec::new()),
            Some(PrimitiveType::IntArray) => Value::IntArray(Vec::new()),
            Some(PrimitiveType::BoolArray) => Value::BoolArray(Vec::new()),
            _ => Value::StringArray(Vec::new()),
        });
    }
    if items.iter().all(Json::is_boolean) {
        return Some(Value::BoolArray(items.iter().filter_map(Json::as_bool).collect()));
    }
    if items.iter().all(|j| j.as_i64().is_some()) && hint != Some(PrimitiveType::DoubleArray) {
        return Some(Value::IntArray(items.iter().filter_map(Json::as_i64).collect()));
    }
    if items.iter().all(Json::is_number) {
        return Some(Value::DoubleArray(items.iter().filter_map(Json::as_f64).collect()));
    }
    if items.iter().all(Json::is_string) {
        return Some(Value::StringArray(
            items
                .iter()
                .filter_map(|j| j.as_str().map(str::to_owned))
                .collect(),
        ));
    }
    None
}
