use super::{
    dedup_by_name, Component, Parameter, ParameterCollection, TypedCollection, TypedSpec,
    UnknownKeys,
};
use crate::error::TreeError;
use crate::primitives::Value;
use serde::Serialize;

/// A concrete spec: fixed parameters, alternations and conditionals, plus
/// the metadata lists carried over from the comment block.
///
/// Writes are atomic. A key declared by several components (e.g. two
/// `ONE OF` blocks sharing a name) is written to all of them, and the write
/// fails without changing anything if any of them rejects it.
#[derive(Debug, Clone, Default)]
pub struct Spec {
    name: String,
    components: Vec<Component>,
    pub(crate) evaluators: Vec<String>,
    pub(crate) keys: Vec<String>,
    pub(crate) includes: Vec<String>,
    pub(crate) dependencies: Vec<String>,
    unknown: UnknownKeys,
}

impl Spec {
    pub fn new(name: impl Into<String>) -> Self {
        Spec {
            name: name.into(),
            ..Spec::default()
        }
    }

    /// The free-form `list`: accepts any key, incomplete while empty.
    pub fn generic_list() -> Self {
        Spec::new(crate::naming::GENERIC_LIST)
            .with_unknown_keys(UnknownKeys::Accept)
            .with_component(Component::Collection(
                ParameterCollection::new().with_unknown_keys(UnknownKeys::Accept),
            ))
    }

    pub fn with_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    pub fn with_unknown_keys(mut self, policy: UnknownKeys) -> Self {
        self.unknown = policy;
        self
    }

    pub fn push(&mut self, component: Component) {
        self.components.push(component);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn evaluators(&self) -> &[String] {
        &self.evaluators
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Append `other`'s components and union its metadata lists.
    pub fn merge(&mut self, other: Spec) {
        self.components.extend(other.components);
        union_into(&mut self.evaluators, other.evaluators);
        union_into(&mut self.keys, other.keys);
        union_into(&mut self.includes, other.includes);
        union_into(&mut self.dependencies, other.dependencies);
    }

    /// Drop `key` from every fixed collection, removing collections left empty.
    pub fn remove_parameter(&mut self, key: &str) {
        for c in &mut self.components {
            if let Component::Collection(pars) = c {
                pars.remove(key);
            }
        }
        self.components
            .retain(|c| !matches!(c, Component::Collection(pars) if pars.is_empty()));
    }

    /// Insert into the first fixed collection, creating one if needed.
    pub fn insert_fixed(&mut self, param: Parameter) {
        let found = self.components.iter_mut().find_map(|c| match c {
            Component::Collection(pars) => Some(pars),
            _ => None,
        });
        match found {
            Some(pars) => {
                pars.insert(param);
            }
            None => self
                .components
                .push(Component::Collection(ParameterCollection::from_params([param]))),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.components.iter().any(|c| c.contains(key))
    }

    /// Is `key` the case parameter of a conditional?
    pub fn is_selector(&self, key: &str) -> bool {
        self.components
            .iter()
            .any(|c| matches!(c, Component::Switch(s) if s.case().name() == key))
    }

    pub fn parameter(&self, key: &str) -> Option<&Parameter> {
        self.components.iter().find_map(|c| c.parameter(key))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.parameter(key).and_then(Parameter::get)
    }

    fn targets(&self, key: &str) -> Vec<usize> {
        (0..self.components.len())
            .filter(|&i| self.components[i].contains(key))
            .collect()
    }

    fn unknown_key(&self, key: &str) -> TreeError {
        TreeError::UnknownKey {
            key: key.to_owned(),
            owner: self.name.clone(),
        }
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), TreeError> {
        let value = value.into();
        let targets = self.targets(key);
        if targets.is_empty() {
            return match self.unknown {
                UnknownKeys::Error => Err(self.unknown_key(key)),
                policy => {
                    if policy == UnknownKeys::Warn {
                        tracing::warn!(spec = %self.name, key, "adding parameter not declared by the spec");
                    }
                    let mut p = Parameter::primitive(key, value.primitive_type());
                    p.set(value)?;
                    self.insert_fixed(p);
                    Ok(())
                }
            };
        }
        for &i in &targets {
            self.components[i].check_set(key, &value)?;
        }
        for &i in &targets {
            self.components[i].set(key, value.clone())?;
        }
        Ok(())
    }

    /// Mutable access to the sub-spec under `key`, narrowing any `ONE OF`
    /// the same way a write would.
    pub fn node_mut(&mut self, key: &str) -> Result<&mut SchemaNode, TreeError> {
        let targets = self.targets(key);
        let Some((&first, rest)) = targets.split_first() else {
            return Err(self.unknown_key(key));
        };
        for &i in &targets {
            self.components[i].check_access(key)?;
        }
        for &i in rest {
            self.components[i].select(key)?;
        }
        self.components[first].node_mut(key)
    }

    pub fn is_complete(&self) -> bool {
        self.components.iter().all(Component::is_complete)
    }

    pub fn has_value(&self) -> bool {
        self.components.iter().any(Component::has_value)
    }

    pub fn is_optional(&self) -> bool {
        self.components.iter().all(Component::is_optional)
    }

    pub fn parameters(&self) -> Vec<&Parameter> {
        dedup_by_name(self.components.iter().flat_map(Component::parameters).collect())
    }

    pub fn complete(&self) -> Vec<&Parameter> {
        dedup_by_name(self.components.iter().flat_map(Component::complete).collect())
    }

    pub fn valued(&self) -> Vec<&Parameter> {
        dedup_by_name(self.components.iter().flat_map(Component::valued).collect())
    }

    pub fn unfilled(&self) -> Vec<&Parameter> {
        dedup_by_name(self.components.iter().flat_map(Component::unfilled).collect())
    }

    pub fn optional(&self) -> Vec<&Parameter> {
        dedup_by_name(self.components.iter().flat_map(Component::optional).collect())
    }

    /// Alternations and conditionals in this spec still awaiting a choice.
    pub fn open_choices(&self) -> Vec<OpenChoice> {
        self.components
            .iter()
            .filter_map(|c| match c {
                Component::OneOf(o) if o.is_open() => Some(OpenChoice::OneOf {
                    branches: o.open_branches(),
                }),
                Component::Switch(s) if s.is_open() => Some(OpenChoice::Case {
                    name: s.case().name().to_owned(),
                }),
                _ => None,
            })
            .collect()
    }
}

fn union_into(into: &mut Vec<String>, from: Vec<String>) {
    for s in from {
        if !into.contains(&s) {
            into.push(s);
        }
    }
}

/// A pending decision inside a spec tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OpenChoice {
    /// A `ONE OF` with no branch, or several, still viable.
    OneOf { branches: Vec<Vec<String>> },
    /// A conditional whose case parameter has no value.
    Case { name: String },
    /// A typed spec whose type is not chosen yet.
    Type { field: String, valid: Vec<String> },
}

/// An [`OpenChoice`] and the parameter path leading to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAlternation {
    pub path: Vec<String>,
    #[serde(flatten)]
    pub choice: OpenChoice,
}

/// A spec instance handed out by the registry.
#[derive(Debug, Clone)]
pub enum SchemaNode {
    Spec(Spec),
    List(TypedCollection),
    Typed(TypedSpec),
}

impl SchemaNode {
    /// The registry name this node was built from.
    pub fn type_name(&self) -> String {
        match self {
            SchemaNode::Spec(s) => s.name().to_owned(),
            SchemaNode::List(l) => l.type_name(),
            SchemaNode::Typed(t) => t.name().to_owned(),
        }
    }

    pub fn as_spec(&self) -> Option<&Spec> {
        match self {
            SchemaNode::Spec(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_spec_mut(&mut self) -> Option<&mut Spec> {
        match self {
            SchemaNode::Spec(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&TypedCollection> {
        match self {
            SchemaNode::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut TypedCollection> {
        match self {
            SchemaNode::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_typed(&self) -> Option<&TypedSpec> {
        match self {
            SchemaNode::Typed(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_typed_mut(&mut self) -> Option<&mut TypedSpec> {
        match self {
            SchemaNode::Typed(t) => Some(t),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        match self {
            SchemaNode::Spec(s) => s.contains(key),
            SchemaNode::List(l) => l.contains(key),
            SchemaNode::Typed(t) => t.contains(key),
        }
    }

    /// Keys that steer structure (type selectors, case parameters) and so
    /// must be written before the keys they govern.
    pub fn is_selector(&self, key: &str) -> bool {
        match self {
            SchemaNode::Spec(s) => s.is_selector(key),
            SchemaNode::List(_) => false,
            SchemaNode::Typed(t) => t.is_selector(key),
        }
    }

    pub fn parameter(&self, key: &str) -> Option<&Parameter> {
        match self {
            SchemaNode::Spec(s) => s.parameter(key),
            SchemaNode::List(l) => l.parameter(key),
            SchemaNode::Typed(t) => t.parameter(key),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            SchemaNode::Spec(s) => s.get(key),
            SchemaNode::List(l) => l.get(key),
            SchemaNode::Typed(t) => t.get(key),
        }
    }

    /// The sub-spec under `key`, if `key` is a derived parameter.
    pub fn node(&self, key: &str) -> Option<&SchemaNode> {
        self.parameter(key).and_then(Parameter::node)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), TreeError> {
        match self {
            SchemaNode::Spec(s) => s.set(key, value),
            SchemaNode::List(l) => l.set(key, value),
            SchemaNode::Typed(t) => t.set(key, value),
        }
    }

    pub fn node_mut(&mut self, key: &str) -> Result<&mut SchemaNode, TreeError> {
        match self {
            SchemaNode::Spec(s) => s.node_mut(key),
            SchemaNode::List(l) => l.node_mut(key),
            SchemaNode::Typed(t) => t.node_mut(key),
        }
    }

    /// Append a fresh spec entry to a list node and return it.
    pub fn append(&mut self, name: &str) -> Result<&mut SchemaNode, TreeError> {
        let owner = self.type_name();
        match self {
            SchemaNode::List(l) => l.append_empty(name)?.node_mut_checked(),
            _ => Err(TreeError::NotAList { owner }),
        }
    }

    pub fn is_complete(&self) -> bool {
        match self {
            SchemaNode::Spec(s) => s.is_complete(),
            SchemaNode::List(l) => l.is_complete(),
            SchemaNode::Typed(t) => t.is_complete(),
        }
    }

    pub fn has_value(&self) -> bool {
        match self {
            SchemaNode::Spec(s) => s.has_value(),
            SchemaNode::List(l) => l.has_value(),
            SchemaNode::Typed(t) => t.has_value(),
        }
    }

    pub fn is_optional(&self) -> bool {
        match self {
            SchemaNode::Spec(s) => s.is_optional(),
            SchemaNode::List(l) => l.is_optional(),
            SchemaNode::Typed(t) => t.is_optional(),
        }
    }

    pub fn parameters(&self) -> Vec<&Parameter> {
        match self {
            SchemaNode::Spec(s) => s.parameters(),
            SchemaNode::List(l) => l.parameters(),
            SchemaNode::Typed(t) => t.parameters(),
        }
    }

    pub fn complete(&self) -> Vec<&Parameter> {
        match self {
            SchemaNode::Spec(s) => s.complete(),
            SchemaNode::List(l) => l.complete(),
            SchemaNode::Typed(t) => t.complete(),
        }
    }

    pub fn valued(&self) -> Vec<&Parameter> {
        match self {
            SchemaNode::Spec(s) => s.valued(),
            SchemaNode::List(l) => l.valued(),
            SchemaNode::Typed(t) => t.valued(),
        }
    }

    pub fn unfilled(&self) -> Vec<&Parameter> {
        match self {
            SchemaNode::Spec(s) => s.unfilled(),
            SchemaNode::List(l) => l.unfilled(),
            SchemaNode::Typed(t) => t.unfilled(),
        }
    }

    pub fn optional(&self) -> Vec<&Parameter> {
        match self {
            SchemaNode::Spec(s) => s.optional(),
            SchemaNode::List(l) => l.optional(),
            SchemaNode::Typed(t) => t.optional(),
        }
    }

    /// Every pending choice in this node and the sub-specs below it.
    pub fn open_alternations(&self) -> Vec<OpenAlternation> {
        let mut out = Vec::new();
        self.collect_open(&mut Vec::new(), &mut out);
        out
    }

    fn collect_open(&self, path: &mut Vec<String>, out: &mut Vec<OpenAlternation>) {
        let here = |choice| OpenAlternation {
            path: path.clone(),
            choice,
        };
        match self {
            SchemaNode::Spec(s) => out.extend(s.open_choices().into_iter().map(here)),
            SchemaNode::Typed(t) => {
                if t.selected_type().is_none() {
                    out.push(here(OpenChoice::Type {
                        field: t.field().to_owned(),
                        valid: t.valid_types(),
                    }));
                }
                out.extend(t.body().open_choices().into_iter().map(here));
            }
            SchemaNode::List(_) => {}
        }
        let mut visible = self.complete();
        visible.extend(self.unfilled());
        for p in dedup_by_name(visible) {
            if let Some(child) = p.node() {
                path.push(p.name().to_owned());
                child.collect_open(path, out);
                path.pop();
            }
        }
    }
}
