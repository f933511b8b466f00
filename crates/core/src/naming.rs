//! Spec naming conventions: filename-derived names and the suffix forms the
//! registry synthesizes on demand.

use crate::primitives::PrimitiveType;
use crate::spec::Placement;

pub const LIST_SUFFIX: &str = "-list";
pub const GENERIC_LIST: &str = "list";

const TYPED_SUFFIXES: [(&str, Placement); 4] = [
    ("-typed-spec", Placement::Standard),
    ("-typedinline-spec", Placement::Inline),
    ("-typedsublist-spec", Placement::Sublist),
    ("-typedsublistdash-spec", Placement::SublistDash),
];

/// Derive a spec name from a source file stem: `BDF_FnBase` → `bdf-fn-base-spec`.
///
/// Underscores and spaces become hyphens. An uppercase letter (other than the
/// first) gets a hyphen before it when the next or previous character is
/// lowercase.
pub fn to_specname(stem: &str) -> String {
    let chars: Vec<char> = stem
        .chars()
        .map(|c| if c == '_' || c == ' ' { '-' } else { c })
        .collect();
    let mut out = String::with_capacity(chars.len() + 8);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i != 0 {
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let prev_lower = chars[i - 1].is_lowercase();
            if next_lower || prev_lower {
                out.push('-');
            }
        }
        out.extend(c.to_lowercase());
    }
    out.push_str("-spec");
    while out.contains("--") {
        out = out.replace("--", "-");
    }
    out
}

/// How the registry builds a node for a given name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecForm<'a> {
    /// `<element>-list`: a typed collection of `<element>`.
    List { element: &'a str },
    /// `<field>-typed*-spec`: a polymorphic wrapper.
    Typed { field: String, placement: Placement },
    /// `list`: a free-form collection.
    Generic,
    /// Anything else: looked up verbatim.
    Plain,
}

pub fn spec_form(name: &str) -> SpecForm<'_> {
    if name == GENERIC_LIST {
        return SpecForm::Generic;
    }
    if let Some(element) = name.strip_suffix(LIST_SUFFIX) {
        if !element.is_empty() {
            return SpecForm::List { element };
        }
    }
    for (suffix, placement) in TYPED_SUFFIXES {
        if let Some(prefix) = name.strip_suffix(suffix) {
            if !prefix.is_empty() {
                return SpecForm::Typed {
                    field: prefix.replace('-', " "),
                    placement,
                };
            }
        }
    }
    SpecForm::Plain
}

/// The registered spec name for variant `type_name` of a typed field:
/// `("pk physical", "richards flow")` → `pk-physical-richards-flow-spec`.
pub fn variant_spec_name(field: &str, type_name: &str) -> String {
    format!("{}-{}-spec", hyphenate(field), hyphenate(type_name))
}

/// Can `name` be built, given a test for registered plain names?
///
/// Typed wrappers and the generic list always can; a list needs a
/// buildable element.
pub fn resolvable(name: &str, registered: &dyn Fn(&str) -> bool) -> bool {
    match spec_form(name) {
        SpecForm::Generic | SpecForm::Typed { .. } => true,
        SpecForm::List { element } => {
            PrimitiveType::from_name(element).is_some() || resolvable(element, registered)
        }
        SpecForm::Plain => registered(name),
    }
}

/// Spaces to hyphens, used for type-name lookup and sublist-dash keys.
pub fn hyphenate(s: &str) -> String {
    s.trim().replace(' ', "-")
}
