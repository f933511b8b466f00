use super::{dedup_by_name, Parameter, ParameterCollection, SchemaNode};
use crate::error::TreeError;
use crate::primitives::Value;

/// Mutually exclusive parameter groups.
///
/// Nothing is selected until the first write. Each write narrows the active
/// set to the branches (among those still active) that declare the key; a
/// write that would leave no branch fails and changes nothing.
///
/// A sub-spec handed out by [`node_mut`](OneOf::node_mut) lives in one owner
/// branch and stands in for the same-typed parameter of every other branch
/// that declares it. The narrowing happens once that sub-spec holds a value.
#[derive(Debug, Clone)]
pub struct OneOf {
    branches: Vec<ParameterCollection>,
    active: Option<Vec<usize>>,
    live: Option<(String, usize)>,
}

impl OneOf {
    pub fn new(branches: Vec<ParameterCollection>) -> Result<Self, TreeError> {
        if branches.len() < 2 || branches.iter().any(ParameterCollection::is_empty) {
            return Err(TreeError::MalformedOneOf);
        }
        Ok(OneOf {
            branches,
            active: None,
            live: None,
        })
    }

    pub fn branches(&self) -> &[ParameterCollection] {
        &self.branches
    }

    /// Indices of the still-viable branches, or `None` before any write.
    pub fn active(&self) -> Option<Vec<usize>> {
        match self.live_param() {
            Some((key, owner, p)) if p.has_value() => Some(self.sharing(key, owner)),
            _ => self.active.clone(),
        }
    }

    /// The branch index once exactly one remains.
    pub fn selected(&self) -> Option<usize> {
        match self.active().as_deref() {
            Some([one]) => Some(*one),
            _ => None,
        }
    }

    /// Unselected, or narrowed to more than one branch.
    pub fn is_open(&self) -> bool {
        self.active().map_or(true, |a| a.len() > 1)
    }

    fn visible(&self) -> Vec<usize> {
        match self.active() {
            Some(a) => a,
            None => (0..self.branches.len()).collect(),
        }
    }

    fn committed(&self) -> Vec<usize> {
        match &self.active {
            Some(a) => a.clone(),
            None => (0..self.branches.len()).collect(),
        }
    }

    fn live_param(&self) -> Option<(&str, usize, &Parameter)> {
        let (key, owner) = self.live.as_ref()?;
        let p = self.branches[*owner].parameter(key)?;
        Some((key.as_str(), *owner, p))
    }

    /// Committed branches declaring `key` with the owner's type.
    fn sharing(&self, key: &str, owner: usize) -> Vec<usize> {
        let ptype = self.branches[owner].parameter(key).map(Parameter::ptype);
        self.committed()
            .into_iter()
            .filter(|&i| self.branches[i].parameter(key).map(Parameter::ptype) == ptype)
            .collect()
    }

    /// Parameters of branch `i`, with the live sub-spec in place of its stale copies.
    pub fn branch_parameters(&self, i: usize) -> Vec<&Parameter> {
        let live = self
            .live_param()
            .filter(|(_, owner, _)| *owner != i)
            .map(|(_, _, p)| p);
        self.branches[i]
            .parameters()
            .map(move |p| match live {
                Some(l) if l.name() == p.name() && l.ptype() == p.ptype() => l,
                _ => p,
            })
            .collect()
    }

    fn visible_parameters(&self) -> Vec<Vec<&Parameter>> {
        self.visible()
            .into_iter()
            .map(|i| self.branch_parameters(i))
            .collect()
    }

    /// Copy the live sub-spec into its sharing branches and commit the
    /// narrowing it implies. An untouched sub-spec selects nothing.
    fn settle(&mut self) {
        let Some((key, owner)) = self.live.take() else {
            return;
        };
        let Some(live) = self.branches[owner]
            .parameter(&key)
            .filter(|p| p.has_value())
            .cloned()
        else {
            return;
        };
        let next = self.sharing(&key, owner);
        for &i in &next {
            if i == owner {
                continue;
            }
            if let Some(p) = self.branches[i].parameter_mut(&key) {
                *p = live.clone();
            }
        }
        self.active = Some(next);
    }

    /// Declared in any branch, viable or not.
    pub fn contains(&self, key: &str) -> bool {
        self.branches.iter().any(|b| b.contains(key))
    }

    /// The active set that writing `key` would leave, checking `value`
    /// against each surviving branch when given.
    pub(crate) fn plan(&self, key: &str, value: Option<&Value>) -> Result<Vec<usize>, TreeError> {
        let next: Vec<usize> = self
            .visible()
            .into_iter()
            .filter(|&i| self.branches[i].contains(key))
            .collect();
        if next.is_empty() {
            return Err(TreeError::PrunedBranch {
                key: key.to_owned(),
            });
        }
        if let Some(value) = value {
            for &i in &next {
                self.branches[i].check_set(key, value)?;
            }
        }
        Ok(next)
    }

    /// Narrow the active set as a write to `key` would.
    pub(crate) fn select(&mut self, key: &str) -> Result<(), TreeError> {
        self.settle();
        let next = self.plan(key, None)?;
        self.active = Some(next);
        Ok(())
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), TreeError> {
        let value = value.into();
        self.settle();
        let next = self.plan(key, Some(&value))?;
        for &i in &next {
            self.branches[i].set(key, value.clone())?;
        }
        self.active = Some(next);
        Ok(())
    }

    pub fn parameter(&self, key: &str) -> Option<&Parameter> {
        self.visible_parameters()
            .into_iter()
            .find_map(|ps| ps.into_iter().find(|p| p.name() == key))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.parameter(key).and_then(Parameter::get)
    }

    /// The sub-spec under `key` in the first viable branch declaring it.
    /// The active set is left alone until something is written into it.
    pub(crate) fn node_mut(&mut self, key: &str) -> Result<&mut SchemaNode, TreeError> {
        self.settle();
        let owner = self.plan(key, None)?[0];
        let derived = self.branches[owner]
            .parameter(key)
            .is_some_and(|p| !p.is_primitive());
        if derived {
            self.live = Some((key.to_owned(), owner));
        }
        match self.branches[owner].parameter_mut(key) {
            Some(p) => p.node_mut_checked(),
            None => Err(TreeError::PrunedBranch {
                key: key.to_owned(),
            }),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.visible_parameters()
            .iter()
            .any(|ps| ps.iter().all(|p| p.is_complete()))
    }

    pub fn has_value(&self) -> bool {
        self.visible_parameters()
            .iter()
            .any(|ps| ps.iter().any(|p| p.has_value()))
    }

    /// Some viable branch needs nothing.
    pub fn is_optional(&self) -> bool {
        self.visible_parameters()
            .iter()
            .any(|ps| ps.iter().all(|p| p.is_optional()))
    }

    /// Every declared parameter across all branches, deduplicated by name.
    pub fn parameters(&self) -> Vec<&Parameter> {
        dedup_by_name(self.branches.iter().flat_map(|b| b.parameters()).collect())
    }

    fn visible_where(&self, keep: impl Fn(&Parameter) -> bool) -> Vec<&Parameter> {
        dedup_by_name(
            self.visible_parameters()
                .into_iter()
                .flatten()
                .filter(|p| keep(p))
                .collect(),
        )
    }

    pub fn complete(&self) -> Vec<&Parameter> {
        self.visible_where(Parameter::is_complete)
    }

    pub fn valued(&self) -> Vec<&Parameter> {
        self.visible_where(Parameter::has_value)
    }

    pub fn unfilled(&self) -> Vec<&Parameter> {
        self.visible_where(|p| !p.is_complete())
    }

    pub fn optional(&self) -> Vec<&Parameter> {
        self.visible_where(Parameter::is_optional)
    }

    /// Parameter names of each viable branch.
    pub fn open_branches(&self) -> Vec<Vec<String>> {
        self.visible_parameters()
            .into_iter()
            .map(|ps| ps.into_iter().map(|p| p.name().to_owned()).collect())
            .collect()
    }
}
