use super::Parameter;
use crate::error::TreeError;
use crate::primitives::Value;
use indexmap::IndexMap;

/// What a container does with a write to a key it does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownKeys {
    /// Reject with [`TreeError::UnknownKey`].
    #[default]
    Error,
    /// Add a primitive parameter typed after the value, and log a warning.
    Warn,
    /// Add a primitive parameter typed after the value.
    Accept,
}

/// An ordered map of name to [`Parameter`].
#[derive(Debug, Clone, Default)]
pub struct ParameterCollection {
    pars: IndexMap<String, Parameter>,
    unknown: UnknownKeys,
    empty_is_complete: bool,
}

impl ParameterCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_params(params: impl IntoIterator<Item = Parameter>) -> Self {
        let mut c = Self::new();
        for p in params {
            c.insert(p);
        }
        c
    }

    pub fn with_unknown_keys(mut self, policy: UnknownKeys) -> Self {
        self.unknown = policy;
        self
    }

    /// Whether an empty collection counts as complete (default: no).
    pub fn with_empty_is_complete(mut self, flag: bool) -> Self {
        self.empty_is_complete = flag;
        self
    }

    pub fn unknown_keys(&self) -> UnknownKeys {
        self.unknown
    }

    pub fn len(&self) -> usize {
        self.pars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pars.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pars.contains_key(key)
    }

    /// Insert or replace a parameter; returns the one it replaced.
    pub fn insert(&mut self, param: Parameter) -> Option<Parameter> {
        self.pars.insert(param.name().to_owned(), param)
    }

    pub fn remove(&mut self, key: &str) -> Option<Parameter> {
        self.pars.shift_remove(key)
    }

    pub fn parameter(&self, key: &str) -> Option<&Parameter> {
        self.pars.get(key)
    }

    pub fn parameter_mut(&mut self, key: &str) -> Option<&mut Parameter> {
        self.pars.get_mut(key)
    }

    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.pars.values()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.pars.get(key).and_then(Parameter::get)
    }

    /// Validate a write without performing it.
    pub(crate) fn check_set(&self, key: &str, value: &Value) -> Result<(), TreeError> {
        match self.pars.get(key) {
            Some(p) => p.check(value.clone()).map(drop),
            None if self.unknown == UnknownKeys::Error => Err(TreeError::UnknownKey {
                key: key.to_owned(),
                owner: "collection".to_owned(),
            }),
            None => Ok(()),
        }
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), TreeError> {
        let value = value.into();
        if let Some(p) = self.pars.get_mut(key) {
            return p.set(value);
        }
        match self.unknown {
            UnknownKeys::Error => Err(TreeError::UnknownKey {
                key: key.to_owned(),
                owner: "collection".to_owned(),
            }),
            policy => {
                if policy == UnknownKeys::Warn {
                    tracing::warn!(key, "adding parameter not declared by the spec");
                }
                let mut p = Parameter::primitive(key, value.primitive_type());
                p.set(value)?;
                self.insert(p);
                Ok(())
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        if self.pars.is_empty() {
            return self.empty_is_complete;
        }
        self.pars.values().all(Parameter::is_complete)
    }

    pub fn has_value(&self) -> bool {
        self.pars.values().any(Parameter::has_value)
    }

    /// True when every parameter is optional (vacuously true when empty).
    pub fn is_optional(&self) -> bool {
        self.pars.values().all(Parameter::is_optional)
    }

    pub fn complete(&self) -> Vec<&Parameter> {
        self.pars.values().filter(|p| p.is_complete()).collect()
    }

    pub fn valued(&self) -> Vec<&Parameter> {
        self.pars.values().filter(|p| p.has_value()).collect()
    }

    pub fn unfilled(&self) -> Vec<&Parameter> {
        self.pars.values().filter(|p| !p.is_complete()).collect()
    }

    pub fn optional(&self) -> Vec<&Parameter> {
        self.pars.values().filter(|p| p.is_optional()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::PrimitiveType;

    fn abc() -> ParameterCollection {
        ParameterCollection::from_params([
            Parameter::primitive("a", PrimitiveType::Double),
            Parameter::primitive("b", PrimitiveType::Int)
                .with_default(3)
                .unwrap(),
            Parameter::primitive("c", PrimitiveType::String),
        ])
    }

    #[test]
    fn completeness_tracks_required_parameters() {
        let mut c = abc();
        assert!(!c.is_complete());
        assert!(!c.has_value());
        c.set("a", 1.5).unwrap();
        assert!(!c.is_complete());
        c.set("c", "x").unwrap();
        assert!(c.is_complete());
        let valued: Vec<&str> = c.valued().iter().map(|p| p.name()).collect();
        assert_eq!(valued, vec!["a", "c"]);
        let optional: Vec<&str> = c.optional().iter().map(|p| p.name()).collect();
        assert_eq!(optional, vec!["b"]);
    }

    #[test]
    fn unknown_key_policies() {
        let mut strict = abc();
        assert!(matches!(
            strict.set("zzz", 1),
            Err(TreeError::UnknownKey { .. })
        ));

        let mut lax = abc().with_unknown_keys(UnknownKeys::Accept);
        lax.set("zzz", vec![1.0, 2.0]).unwrap();
        assert_eq!(
            lax.parameter("zzz").unwrap().primitive_type(),
            Some(PrimitiveType::DoubleArray)
        );
        assert_eq!(lax.len(), 4);
    }

    #[test]
    fn empty_policy() {
        assert!(!ParameterCollection::new().is_complete());
        assert!(ParameterCollection::new()
            .with_empty_is_complete(true)
            .is_complete());
        assert!(ParameterCollection::new().is_optional());
    }

    #[test]
    fn remove_keeps_order() {
        let mut c = abc();
        c.remove("b");
        let names: Vec<&str> = c.parameters().map(Parameter::name).collect();
        assert_eq!(names, vec!["a", "c"]);
    }
}
