use super::{Parameter, ParameterCollection, SchemaNode};
use crate::error::TreeError;
use crate::primitives::{to_text, PrimitiveType, Value};

/// A case parameter selecting one of several parameter groups.
///
/// Branch parameters can only be written once the case parameter holds (or
/// defaults to) a value, and only within the branch that value selects.
#[derive(Debug, Clone)]
pub struct CaseSwitch {
    case: Parameter,
    branches: Vec<(Value, ParameterCollection)>,
}

impl CaseSwitch {
    /// Branch keys are coerced to the case parameter's type.
    pub fn new(
        case: Parameter,
        branches: Vec<(Value, ParameterCollection)>,
    ) -> Result<Self, TreeError> {
        match case.primitive_type() {
            Some(PrimitiveType::Bool) | Some(PrimitiveType::String) => {}
            _ => {
                return Err(TreeError::NotPrimitive {
                    key: case.name().to_owned(),
                })
            }
        }
        let branches = branches
            .into_iter()
            .map(|(k, c)| Ok((case.check(k)?, c)))
            .collect::<Result<Vec<_>, TreeError>>()?;
        Ok(CaseSwitch { case, branches })
    }

    /// The `IF` / `THEN` / `ELSE` form: a bool case with `true` and `false`
    /// branches. Missing branches are empty and count as complete.
    pub fn if_then_else(
        condition: Parameter,
        then_branch: ParameterCollection,
        else_branch: ParameterCollection,
    ) -> Result<Self, TreeError> {
        CaseSwitch::new(
            condition,
            vec![
                (Value::Bool(true), then_branch.with_empty_is_complete(true)),
                (Value::Bool(false), else_branch.with_empty_is_complete(true)),
            ],
        )
    }

    pub fn case(&self) -> &Parameter {
        &self.case
    }

    pub fn branches(&self) -> &[(Value, ParameterCollection)] {
        &self.branches
    }

    fn selected_index(&self) -> Option<usize> {
        let current = self.case.get()?;
        self.branches.iter().position(|(k, _)| k == current)
    }

    /// The branch chosen by the case parameter's current value or default.
    pub fn selected(&self) -> Option<&ParameterCollection> {
        self.selected_index().map(|i| &self.branches[i].1)
    }

    pub fn contains(&self, key: &str) -> bool {
        key == self.case.name() || self.branches.iter().any(|(_, b)| b.contains(key))
    }

    fn case_error(&self, key: &str) -> TreeError {
        match self.case.get() {
            None => TreeError::CaseNotSet {
                key: key.to_owned(),
                case: self.case.name().to_owned(),
            },
            Some(v) => TreeError::BranchMismatch {
                key: key.to_owned(),
                case: self.case.name().to_owned(),
                value: to_text(v),
            },
        }
    }

    /// The branch a write to `key` would land in (`None` for the case
    /// parameter itself), checking `value` when given.
    pub(crate) fn plan(&self, key: &str, value: Option<&Value>) -> Result<Option<usize>, TreeError> {
        if key == self.case.name() {
            if let Some(value) = value {
                let v = self.case.check(value.clone())?;
                if !self.branches.iter().any(|(k, _)| *k == v) {
                    return Err(TreeError::InvalidCase {
                        case: key.to_owned(),
                        value: to_text(&v),
                    });
                }
            }
            return Ok(None);
        }
        match self.selected_index() {
            Some(i) if self.branches[i].1.contains(key) => {
                if let Some(value) = value {
                    self.branches[i].1.check_set(key, value)?;
                }
                Ok(Some(i))
            }
            _ => Err(self.case_error(key)),
        }
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), TreeError> {
        let value = value.into();
        match self.plan(key, Some(&value))? {
            None => self.case.set(value),
            Some(i) => self.branches[i].1.set(key, value),
        }
    }

    /// The case parameter, or a parameter of the selected branch.
    pub fn parameter(&self, key: &str) -> Option<&Parameter> {
        if key == self.case.name() {
            return Some(&self.case);
        }
        self.selected().and_then(|b| b.parameter(key))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.parameter(key).and_then(Parameter::get)
    }

    pub(crate) fn node_mut(&mut self, key: &str) -> Result<&mut SchemaNode, TreeError> {
        match self.plan(key, None)? {
            None => Err(TreeError::NotDerived {
                key: key.to_owned(),
            }),
            Some(i) => match self.branches[i].1.parameter_mut(key) {
                Some(p) => p.node_mut_checked(),
                None => Err(TreeError::NotDerived {
                    key: key.to_owned(),
                }),
            },
        }
    }

    pub fn is_complete(&self) -> bool {
        self.case.is_complete() && self.selected().is_some_and(ParameterCollection::is_complete)
    }

    pub fn has_value(&self) -> bool {
        self.case.has_value()
            || (self.case.is_complete() && self.selected().is_some_and(ParameterCollection::has_value))
    }

    pub fn is_optional(&self) -> bool {
        self.case.is_optional() && self.selected().is_some_and(ParameterCollection::is_optional)
    }

    /// Is the case parameter still without a value or default?
    pub fn is_open(&self) -> bool {
        self.case.get().is_none()
    }

    fn with_case<'s>(
        &'s self,
        include_case: bool,
        branch: impl Fn(&'s ParameterCollection) -> Vec<&'s Parameter>,
    ) -> Vec<&'s Parameter> {
        let mut out = Vec::new();
        if include_case {
            out.push(&self.case);
        }
        if let Some(b) = self.selected() {
            out.extend(branch(b));
        }
        out
    }

    /// The case parameter and every branch parameter.
    pub fn parameters(&self) -> Vec<&Parameter> {
        let mut out = vec![&self.case];
        for (_, b) in &self.branches {
            out.extend(b.parameters());
        }
        super::dedup_by_name(out)
    }

    pub fn complete(&self) -> Vec<&Parameter> {
        self.with_case(self.case.is_complete(), ParameterCollection::complete)
    }

    pub fn valued(&self) -> Vec<&Parameter> {
        self.with_case(self.case.has_value(), ParameterCollection::valued)
    }

    pub fn unfilled(&self) -> Vec<&Parameter> {
        self.with_case(!self.case.is_complete(), ParameterCollection::unfilled)
    }

    pub fn optional(&self) -> Vec<&Parameter> {
        self.with_case(self.case.is_optional(), ParameterCollection::optional)
    }
}
