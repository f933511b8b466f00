use super::{dedup_by_name, Component, Parameter, ParameterCollection, SchemaNode, Spec};
use crate::error::TreeError;
use crate::naming::hyphenate;
use crate::primitives::{to_text, PrimitiveType, Value};
use crate::registry::{instantiate, Catalog};
use indexmap::IndexMap;
use std::sync::Arc;

/// Where a typed spec puts the parameters of its chosen variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Under a derived parameter `"<type> parameters"`.
    Standard,
    /// Merged into the typed spec itself.
    Inline,
    /// Under `"<field>: <type>"`, with no type parameter of its own.
    Sublist,
    /// Under `"<field>-<type>"` (hyphenated), with no type parameter.
    SublistDash,
}

impl Placement {
    /// Does the selector exist as a real parameter?
    pub fn has_type_parameter(self) -> bool {
        matches!(self, Placement::Standard | Placement::Inline)
    }
}

/// Element type of a [`TypedCollection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementType {
    Primitive(PrimitiveType),
    Spec(String),
}

/// A homogeneous, user-named list of entries (`<x>-list`).
///
/// Entries are created with [`append_empty`](Self::append_empty); spec
/// elements are instantiated on append.
#[derive(Debug, Clone)]
pub struct TypedCollection {
    element: ElementType,
    entries: IndexMap<String, Parameter>,
    empty_is_complete: bool,
    catalog: Arc<Catalog>,
}

impl TypedCollection {
    pub fn of_primitive(ptype: PrimitiveType) -> Self {
        TypedCollection {
            element: ElementType::Primitive(ptype),
            entries: IndexMap::new(),
            empty_is_complete: false,
            catalog: Arc::default(),
        }
    }

    pub(crate) fn of_spec(spec: impl Into<String>, catalog: Arc<Catalog>) -> Self {
        TypedCollection {
            element: ElementType::Spec(spec.into()),
            entries: IndexMap::new(),
            empty_is_complete: false,
            catalog,
        }
    }

    pub fn with_empty_is_complete(mut self, flag: bool) -> Self {
        self.empty_is_complete = flag;
        self
    }

    pub fn element(&self) -> &ElementType {
        &self.element
    }

    /// Display name: `<element>-list`.
    pub fn type_name(&self) -> String {
        match &self.element {
            ElementType::Primitive(p) => format!("{}-list", p),
            ElementType::Spec(s) => format!("{}-list", s),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Add a fresh element under `name`.
    pub fn append_empty(&mut self, name: &str) -> Result<&mut Parameter, TreeError> {
        if self.entries.contains_key(name) {
            return Err(TreeError::DuplicateEntry {
                key: name.to_owned(),
            });
        }
        let param = match &self.element {
            ElementType::Primitive(p) => Parameter::primitive(name, *p),
            ElementType::Spec(s) => {
                let node = instantiate(&self.catalog, s)?;
                Parameter::derived(name, s.clone()).with_node(node)
            }
        };
        tracing::trace!(list = %self.type_name(), entry = name, "appended entry");
        Ok(self.entries.entry(name.to_owned()).or_insert(param))
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.entries.get(name)
    }

    pub fn parameter_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.entries.get_mut(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name).and_then(Parameter::get)
    }

    /// Write an existing primitive entry.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), TreeError> {
        match self.entries.get_mut(name) {
            Some(p) => p.set(value),
            None => Err(TreeError::UnknownKey {
                key: name.to_owned(),
                owner: self.type_name(),
            }),
        }
    }

    pub(crate) fn node_mut(&mut self, name: &str) -> Result<&mut SchemaNode, TreeError> {
        let owner = self.type_name();
        match self.entries.get_mut(name) {
            Some(p) => p.node_mut_checked(),
            None => Err(TreeError::UnknownKey {
                key: name.to_owned(),
                owner,
            }),
        }
    }

    pub fn is_complete(&self) -> bool {
        if self.entries.is_empty() {
            return self.empty_is_complete;
        }
        self.entries.values().all(Parameter::is_complete)
    }

    pub fn has_value(&self) -> bool {
        self.entries.values().any(Parameter::has_value)
    }

    pub fn is_optional(&self) -> bool {
        self.entries.values().all(Parameter::is_optional)
    }

    pub fn parameters(&self) -> Vec<&Parameter> {
        self.entries.values().collect()
    }

    pub fn complete(&self) -> Vec<&Parameter> {
        self.entries.values().filter(|p| p.is_complete()).collect()
    }

    pub fn valued(&self) -> Vec<&Parameter> {
        self.entries.values().filter(|p| p.has_value()).collect()
    }

    pub fn unfilled(&self) -> Vec<&Parameter> {
        self.entries.values().filter(|p| !p.is_complete()).collect()
    }

    pub fn optional(&self) -> Vec<&Parameter> {
        self.entries.values().filter(|p| p.is_optional()).collect()
    }
}

/// A polymorphic spec: writing `"<field> type"` picks a variant
/// `<field>-<type>-spec` from the registry and places its parameters
/// according to the [`Placement`].
#[derive(Debug, Clone)]
pub struct TypedSpec {
    name: String,
    field: String,
    placement: Placement,
    body: Spec,
    selected: Option<Value>,
    catalog: Arc<Catalog>,
}

impl TypedSpec {
    /// `others` holds the parameters registered under the typed name itself;
    /// any `"<field> type"` it declares is replaced by the selector.
    pub(crate) fn new(
        name: &str,
        field: &str,
        placement: Placement,
        others: Option<Spec>,
        catalog: Arc<Catalog>,
    ) -> Self {
        let selector = format!("{} type", field);
        let mut body = Spec::new(name);
        if placement.has_type_parameter() {
            body.push(Component::Collection(ParameterCollection::from_params([
                Parameter::primitive(selector.clone(), PrimitiveType::String),
            ])));
        }
        if let Some(mut others) = others {
            others.remove_parameter(&selector);
            body.merge(others);
        }
        TypedSpec {
            name: name.to_owned(),
            field: field.to_owned(),
            placement,
            body,
            selected: None,
            catalog,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn body(&self) -> &Spec {
        &self.body
    }

    pub fn selector_key(&self) -> String {
        format!("{} type", self.field)
    }

    /// The chosen type name, once set.
    pub fn selected_type(&self) -> Option<&str> {
        self.selected.as_ref().and_then(Value::as_str)
    }

    /// Valid type names, in sorted order.
    pub fn valid_types(&self) -> Vec<String> {
        self.catalog
            .valid_types(&self.name, &self.field)
            .into_keys()
            .collect()
    }

    /// Choose the variant. Allowed once; the name is matched with spaces
    /// read as hyphens.
    pub fn set_type(&mut self, type_name: &str) -> Result<(), TreeError> {
        if let Some(current) = self.selected_type() {
            return Err(TreeError::TypeAlreadySet {
                field: self.field.clone(),
                current: current.to_owned(),
            });
        }
        let valid = self.catalog.valid_types(&self.name, &self.field);
        let Some(variant) = valid.get(&hyphenate(type_name)) else {
            return Err(TreeError::UnknownType {
                field: self.field.clone(),
                type_name: type_name.to_owned(),
                valid: valid.keys().cloned().collect::<Vec<_>>().join(", "),
            });
        };
        let node = instantiate(&self.catalog, variant)?;
        let selector = self.selector_key();
        let derived = |key: String| Parameter::derived(key, variant.clone());

        match self.placement {
            Placement::Standard => {
                self.body.set(&selector, type_name)?;
                let key = format!("{} parameters", type_name);
                self.body.insert_fixed(derived(key).with_node(node));
            }
            Placement::Inline => {
                self.body.set(&selector, type_name)?;
                match node {
                    SchemaNode::Spec(spec) => self.body.merge(spec),
                    other => {
                        let key = format!("{} parameters", type_name);
                        self.body.insert_fixed(derived(key).with_node(other));
                    }
                }
            }
            Placement::Sublist => {
                let key = format!("{}: {}", self.field, type_name);
                self.body.push(Component::Collection(ParameterCollection::from_params([
                    derived(key).with_node(node),
                ])));
            }
            Placement::SublistDash => {
                let key = hyphenate(&format!("{}-{}", self.field, type_name));
                self.body.push(Component::Collection(ParameterCollection::from_params([
                    derived(key).with_node(node),
                ])));
            }
        }
        tracing::debug!(field = %self.field, variant = %variant, "selected type");
        self.selected = Some(Value::from(type_name));
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        key == self.selector_key() || self.body.contains(key)
    }

    pub fn is_selector(&self, key: &str) -> bool {
        key == self.selector_key() || self.body.is_selector(key)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), TreeError> {
        let value = value.into();
        if key == self.selector_key() {
            let name = match value.as_str() {
                Some(s) => s.to_owned(),
                None => to_text(&value),
            };
            return self.set_type(&name);
        }
        self.body.set(key, value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        if key == self.selector_key() {
            return self.selected.as_ref();
        }
        self.body.get(key)
    }

    pub fn parameter(&self, key: &str) -> Option<&Parameter> {
        self.body.parameter(key)
    }

    pub(crate) fn node_mut(&mut self, key: &str) -> Result<&mut SchemaNode, TreeError> {
        self.body.node_mut(key)
    }

    pub fn is_complete(&self) -> bool {
        self.selected.is_some() && self.body.is_complete()
    }

    pub fn has_value(&self) -> bool {
        if !self.placement.has_type_parameter() && self.selected.is_some() {
            return true;
        }
        self.body.has_value()
    }

    pub fn is_optional(&self) -> bool {
        self.body.is_optional()
    }

    pub fn parameters(&self) -> Vec<&Parameter> {
        self.body.parameters()
    }

    pub fn complete(&self) -> Vec<&Parameter> {
        self.body.complete()
    }

    pub fn valued(&self) -> Vec<&Parameter> {
        dedup_by_name(self.body.valued())
    }

    pub fn unfilled(&self) -> Vec<&Parameter> {
        self.body.unfilled()
    }

    pub fn optional(&self) -> Vec<&Parameter> {
        self.body.optional()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_list_append_and_set() {
        let mut list = TypedCollection::of_primitive(PrimitiveType::Double);
        assert!(!list.is_complete());
        list.append_empty("a").unwrap();
        assert!(!list.is_complete());
        list.set("a", 2).unwrap();
        assert!(list.is_complete());
        assert_eq!(list.get("a"), Some(&Value::Double(2.0)));
        assert!(matches!(
            list.append_empty("a"),
            Err(TreeError::DuplicateEntry { .. })
        ));
        assert!(matches!(list.set("b", 1.0), Err(TreeError::UnknownKey { .. })));
        assert_eq!(list.type_name(), "double-list");
    }

    #[test]
    fn empty_list_policy() {
        let list = TypedCollection::of_primitive(PrimitiveType::Int).with_empty_is_complete(true);
        assert!(list.is_complete());
    }

    #[test]
    fn only_standard_and_inline_have_a_type_parameter() {
        assert!(Placement::Standard.has_type_parameter());
        assert!(Placement::Inline.has_type_parameter());
        assert!(!Placement::Sublist.has_type_parameter());
        assert!(!Placement::SublistDash.has_type_parameter());
    }

    #[test]
    fn unknown_type_without_variants() {
        let mut t = TypedSpec::new(
            "my-typed-spec",
            "my",
            Placement::Standard,
            None,
            Arc::default(),
        );
        assert!(t.contains("my type"));
        assert!(!t.is_complete());
        let err = t.set("my type", "a").unwrap_err();
        assert!(matches!(err, TreeError::UnknownType { .. }));
        assert_eq!(t.selected_type(), None);
    }
}
