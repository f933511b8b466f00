use super::SchemaNode;
use crate::error::TreeError;
use crate::primitives::{coerce, PrimitiveType, Value};
use std::fmt;

/// Declared type of a parameter: a primitive leaf, or a sub-spec by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Primitive(PrimitiveType),
    Spec(String),
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Primitive(p) => write!(f, "{}", p),
            ParamType::Spec(s) => f.write_str(s),
        }
    }
}

/// A named slot. Primitive parameters hold a [`Value`]; derived parameters
/// hold a sub-spec instance.
///
/// A parameter with a default is optional. `get()` falls back to the
/// default, but `has_value()` is only true after an explicit set.
#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    ptype: ParamType,
    default: Option<Value>,
    optional: bool,
    value: Option<Value>,
    node: Option<Box<SchemaNode>>,
    doc: String,
}

impl Parameter {
    pub fn primitive(name: impl Into<String>, ptype: PrimitiveType) -> Self {
        Parameter {
            name: name.into(),
            ptype: ParamType::Primitive(ptype),
            default: None,
            optional: false,
            value: None,
            node: None,
            doc: String::new(),
        }
    }

    pub fn derived(name: impl Into<String>, spec: impl Into<String>) -> Self {
        Parameter {
            name: name.into(),
            ptype: ParamType::Spec(spec.into()),
            default: None,
            optional: false,
            value: None,
            node: None,
            doc: String::new(),
        }
    }

    /// Set a default (coerced to the declared type); makes the parameter optional.
    pub fn with_default(mut self, default: impl Into<Value>) -> Result<Self, TreeError> {
        let default = self.check(default.into())?;
        self.default = Some(default);
        self.optional = true;
        Ok(self)
    }

    pub fn as_optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    pub fn with_node(mut self, node: SchemaNode) -> Self {
        self.node = Some(Box::new(node));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ptype(&self) -> &ParamType {
        &self.ptype
    }

    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        match self.ptype {
            ParamType::Primitive(p) => Some(p),
            ParamType::Spec(_) => None,
        }
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.ptype, ParamType::Primitive(_))
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// The explicitly set value, ignoring any default.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// The set value, or else the default.
    pub fn get(&self) -> Option<&Value> {
        self.value.as_ref().or(self.default.as_ref())
    }

    /// Coerce `value` to this parameter's type without storing it.
    pub(crate) fn check(&self, value: Value) -> Result<Value, TreeError> {
        match self.ptype {
            ParamType::Primitive(p) => coerce(p, value).map_err(|source| TreeError::Type {
                key: self.name.clone(),
                source,
            }),
            ParamType::Spec(_) => Err(TreeError::NotPrimitive {
                key: self.name.clone(),
            }),
        }
    }

    pub fn set(&mut self, value: impl Into<Value>) -> Result<(), TreeError> {
        let value = self.check(value.into())?;
        self.value = Some(value);
        Ok(())
    }

    pub fn node(&self) -> Option<&SchemaNode> {
        self.node.as_deref()
    }

    pub fn node_mut(&mut self) -> Option<&mut SchemaNode> {
        self.node.as_deref_mut()
    }

    /// Sub-spec access for writing; primitives are rejected.
    pub(crate) fn node_mut_checked(&mut self) -> Result<&mut SchemaNode, TreeError> {
        let key = self.name.clone();
        match self.ptype {
            ParamType::Primitive(_) => Err(TreeError::NotDerived { key }),
            ParamType::Spec(ref spec) => {
                let spec = spec.clone();
                self.node
                    .as_deref_mut()
                    .ok_or_else(|| TreeError::UnknownKey { key, owner: spec })
            }
        }
    }

    /// Attach a sub-spec instance to a derived parameter.
    pub fn attach(&mut self, node: SchemaNode) -> Result<(), TreeError> {
        if self.is_primitive() {
            return Err(TreeError::NotDerived {
                key: self.name.clone(),
            });
        }
        self.node = Some(Box::new(node));
        Ok(())
    }

    pub fn has_value(&self) -> bool {
        match self.ptype {
            ParamType::Primitive(_) => self.value.is_some(),
            ParamType::Spec(_) => self.node.as_ref().is_some_and(|n| n.has_value()),
        }
    }

    pub fn is_complete(&self) -> bool {
        if self.optional {
            return true;
        }
        match self.ptype {
            ParamType::Primitive(_) => self.value.is_some(),
            ParamType::Spec(_) => self.node.as_ref().is_some_and(|n| n.is_complete()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_makes_optional_and_complete_without_value() {
        let p = Parameter::primitive("dt", PrimitiveType::Double)
            .with_default(1)
            .unwrap();
        assert!(p.is_optional());
        assert!(p.is_complete());
        assert!(!p.has_value());
        assert_eq!(p.get(), Some(&Value::Double(1.0)));
        assert_eq!(p.value(), None);
    }

    #[test]
    fn required_parameter_completes_on_set() {
        let mut p = Parameter::primitive("n", PrimitiveType::Int);
        assert!(!p.is_complete());
        p.set("12").unwrap();
        assert!(p.is_complete());
        assert!(p.has_value());
        assert_eq!(p.get(), Some(&Value::Int(12)));
    }

    #[test]
    fn set_rejects_bad_values_and_keeps_old() {
        let mut p = Parameter::primitive("flag", PrimitiveType::Bool);
        p.set(true).unwrap();
        let err = p.set("maybe").unwrap_err();
        assert!(matches!(err, TreeError::Type { ref key, .. } if key == "flag"));
        assert_eq!(p.get(), Some(&Value::Bool(true)));
    }

    #[test]
    fn derived_without_node_is_incomplete() {
        let mut p = Parameter::derived("solver", "solver-spec");
        assert!(!p.is_complete());
        assert!(matches!(p.set(1.0), Err(TreeError::NotPrimitive { .. })));
        assert!(Parameter::derived("x", "y").as_optional().is_complete());
        assert!(p.node_mut_checked().is_err());
    }

    #[test]
    fn primitives_cannot_hold_nodes() {
        let mut p = Parameter::primitive("x", PrimitiveType::Int);
        assert!(matches!(
            p.node_mut_checked(),
            Err(TreeError::NotDerived { .. })
        ));
    }
}
