//! Human-readable dumps of spec instances (`Display` for every tree node).
//!
//! ```text
//! max iterations [int] : 100 (default)
//! solver [solver-spec] : [incomplete]
//!   tolerance [double] : [unset]
//! ONE OF:
//!   pressure key [string] : DOMAIN-pressure (default)
//! OR:
//!   pressure suffix [string] : pressure (default)
//! END
//! ```

use crate::primitives::{to_text, Value};
use crate::spec::{
    CaseSwitch, Component, OneOf, ParamType, Parameter, ParameterCollection, SchemaNode, Spec,
    TypedCollection, TypedSpec,
};
use std::fmt;

fn indent(text: &str) -> String {
    text.lines()
        .map(|l| format!("  {}", l))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write non-empty sections separated by newlines.
fn write_sections(f: &mut fmt::Formatter<'_>, sections: Vec<String>) -> fmt::Result {
    let sections: Vec<String> = sections.into_iter().filter(|s| !s.is_empty()).collect();
    f.write_str(&sections.join("\n"))
}

fn status(p: &Parameter) -> &'static str {
    if !p.is_complete() {
        "[incomplete]"
    } else if !p.has_value() && p.is_optional() {
        "[optional]"
    } else {
        "[complete]"
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ptype() {
            ParamType::Primitive(t) => {
                let shown = match (self.value(), self.default()) {
                    (Some(v), _) => to_text(v),
                    (None, Some(d)) => format!("{} (default)", to_text(d)),
                    (None, None) if self.is_optional() => "[optional]".to_owned(),
                    (None, None) => "[unset]".to_owned(),
                };
                write!(f, "{} [{}] : {}", self.name(), t, shown)
            }
            ParamType::Spec(spec) => {
                write!(f, "{} [{}] : {}", self.name(), spec, status(self))?;
                if let Some(node) = self.node() {
                    let body = node.to_string();
                    if !body.is_empty() {
                        write!(f, "\n{}", indent(&body))?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for ParameterCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_sections(f, self.parameters().map(|p| p.to_string()).collect())
    }
}

impl fmt::Display for OneOf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = |i: usize| -> Vec<String> {
            self.branch_parameters(i)
                .iter()
                .map(|p| p.to_string())
                .collect()
        };
        if let Some(i) = self.selected() {
            return write_sections(f, lines(i));
        }
        let shown: Vec<usize> = match self.active() {
            Some(active) => active,
            None => (0..self.branches().len()).collect(),
        };
        let branches: Vec<String> = shown
            .iter()
            .map(|&i| indent(&lines(i).join("\n")))
            .collect();
        write!(f, "ONE OF:\n{}\nEND", branches.join("\nOR:\n"))
    }
}

impl fmt::Display for CaseSwitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(branch) = self.selected() {
            return write_sections(f, vec![self.case().to_string(), branch.to_string()]);
        }
        let mut out = vec!["IF:".to_owned(), indent(&self.case().to_string())];
        for (key, branch) in self.branches() {
            let label = match key {
                Value::Bool(true) => "THEN:".to_owned(),
                Value::Bool(false) => "ELSE:".to_owned(),
                other => format!("WHEN {}:", to_text(other)),
            };
            if !branch.is_empty() {
                out.push(label);
                out.push(indent(&branch.to_string()));
            }
        }
        out.push("END".to_owned());
        f.write_str(&out.join("\n"))
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Collection(c) => fmt::Display::fmt(c, f),
            Component::OneOf(o) => fmt::Display::fmt(o, f),
            Component::Switch(s) => fmt::Display::fmt(s, f),
        }
    }
}

impl fmt::Display for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_sections(f, self.components().iter().map(|c| c.to_string()).collect())
    }
}

impl fmt::Display for TypedCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(no entries; {})", self.type_name());
        }
        write_sections(f, self.parameters().iter().map(|p| p.to_string()).collect())
    }
}

impl fmt::Display for TypedSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sections = Vec::new();
        if self.selected_type().is_none() {
            let valid = self.valid_types().join(", ");
            if !self.placement().has_type_parameter() {
                sections.push(format!("{} [string] : [unset]", self.selector_key()));
            }
            sections.push(self.body().to_string());
            sections.push(format!("  valid types: {}", valid));
        } else {
            if !self.placement().has_type_parameter() {
                sections.push(format!(
                    "{} [string] : {}",
                    self.selector_key(),
                    self.selected_type().unwrap_or_default()
                ));
            }
            sections.push(self.body().to_string());
        }
        write_sections(f, sections)
    }
}

impl fmt::Display for SchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaNode::Spec(s) => fmt::Display::fmt(s, f),
            SchemaNode::List(l) => fmt::Display::fmt(l, f),
            SchemaNode::Typed(t) => fmt::Display::fmt(t, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::PrimitiveType;

    fn pc(params: Vec<Parameter>) -> ParameterCollection {
        ParameterCollection::from_params(params)
    }

    #[test]
    fn parameter_lines() {
        let p = Parameter::primitive("n", PrimitiveType::Int)
            .with_default(100)
            .unwrap();
        assert_eq!(p.to_string(), "n [int] : 100 (default)");
        let mut q = Parameter::primitive("x", PrimitiveType::Double);
        assert_eq!(q.to_string(), "x [double] : [unset]");
        q.set(0.5).unwrap();
        assert_eq!(q.to_string(), "x [double] : 0.50000000");
    }

    #[test]
    fn open_one_of_lists_branches() {
        let mut o = OneOf::new(vec![
            pc(vec![Parameter::primitive("a", PrimitiveType::Int)]),
            pc(vec![Parameter::primitive("b", PrimitiveType::Int)]),
        ])
        .unwrap();
        assert_eq!(
            o.to_string(),
            "ONE OF:\n  a [int] : [unset]\nOR:\n  b [int] : [unset]\nEND"
        );
        o.set("b", 2).unwrap();
        assert_eq!(o.to_string(), "b [int] : 2");
    }

    #[test]
    fn undecided_conditional() {
        let s = CaseSwitch::if_then_else(
            Parameter::primitive("flag", PrimitiveType::Bool),
            pc(vec![Parameter::primitive("x", PrimitiveType::Int)]),
            ParameterCollection::new(),
        )
        .unwrap();
        assert_eq!(
            s.to_string(),
            "IF:\n  flag [bool] : [unset]\nTHEN:\n  x [int] : [unset]\nEND"
        );
    }

    #[test]
    fn nested_spec_is_indented() {
        let inner = Spec::new("inner").with_component(Component::Collection(pc(vec![
            Parameter::primitive("v", PrimitiveType::String),
        ])));
        let outer = Spec::new("outer").with_component(Component::Collection(pc(vec![
            Parameter::derived("sub", "inner").with_node(SchemaNode::Spec(inner)),
        ])));
        assert_eq!(
            outer.to_string(),
            "sub [inner] : [incomplete]\n  v [string] : [unset]"
        );
    }
}
