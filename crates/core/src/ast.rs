//! Raw scan output: one record per comment scope, with type references kept
//! symbolic. Resolution against the full corpus happens in passes 3 and 4.
use crate::primitives::{PrimitiveType, Value};

/// Source position of a spec or parameter declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Provenance {
    pub file: String,
    pub line: u32,
}

/// Declared parameter type: a primitive, or another spec by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawType {
    Primitive(PrimitiveType),
    Named(String),
}

impl RawType {
    /// Parse the text between type brackets.
    pub fn from_text(text: &str) -> Self {
        match PrimitiveType::from_name(text) {
            Some(p) => RawType::Primitive(p),
            None => RawType::Named(text.trim().to_owned()),
        }
    }

    pub fn spec_name(&self) -> Option<&str> {
        match self {
            RawType::Named(n) => Some(n),
            RawType::Primitive(_) => None,
        }
    }
}

impl std::fmt::Display for RawType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawType::Primitive(p) => write!(f, "{}", p),
            RawType::Named(n) => f.write_str(n),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawParam {
    pub name: String,
    pub type_: RawType,
    pub default: Option<Value>,
    pub optional: bool,
    pub doc: String,
    pub prov: Provenance,
}

/// An entry of a KEYS / EVALUATORS / INCLUDES / DEPENDENCIES list.
#[derive(Debug, Clone, PartialEq)]
pub struct RawItem {
    pub name: String,
    pub default: Option<String>,
    pub doc: String,
}

/// One component of a scope, in encounter order.
#[derive(Debug, Clone, PartialEq)]
pub enum RawComponent {
    Params(Vec<RawParam>),
    OneOf(Vec<Vec<RawParam>>),
    IfThenElse {
        condition: RawParam,
        then_branch: Vec<RawParam>,
        else_branch: Vec<RawParam>,
    },
}

impl RawComponent {
    pub fn params(&self) -> Box<dyn Iterator<Item = &RawParam> + '_> {
        match self {
            RawComponent::Params(ps) => Box::new(ps.iter()),
            RawComponent::OneOf(branches) => Box::new(branches.iter().flatten()),
            RawComponent::IfThenElse {
                condition,
                then_branch,
                else_branch,
            } => Box::new(
                std::iter::once(condition)
                    .chain(then_branch.iter())
                    .chain(else_branch.iter()),
            ),
        }
    }
}

/// A scanned scope: the raw definition of one named spec.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSpec {
    pub name: String,
    pub components: Vec<RawComponent>,
    pub evaluators: Vec<String>,
    pub keys: Vec<String>,
    pub includes: Vec<String>,
    pub dependencies: Vec<String>,
    pub prov: Provenance,
}

impl RawSpec {
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
            && self.evaluators.is_empty()
            && self.keys.is_empty()
            && self.includes.is_empty()
            && self.dependencies.is_empty()
    }

    pub fn params(&self) -> impl Iterator<Item = &RawParam> {
        self.components.iter().flat_map(|c| c.params())
    }

    /// Every spec name this definition refers to, with the declaring line.
    pub fn references(&self) -> Vec<(&str, u32)> {
        let mut refs: Vec<(&str, u32)> = self
            .params()
            .filter_map(|p| p.type_.spec_name().map(|n| (n, p.prov.line)))
            .collect();
        refs.extend(self.includes.iter().map(|i| (i.as_str(), self.prov.line)));
        refs
    }
}
