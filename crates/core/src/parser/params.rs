use super::Parser;
use crate::ast::{Provenance, RawItem, RawParam, RawType};
use crate::error::LoadError;
use crate::primitives::parse_text;

/// A `*` declaration: a parameter, or (when it has no name) an include.
#[derive(Debug)]
pub(super) enum Decl {
    Param(RawParam),
    Include(String),
}

/// Split off a quoted name: `` `"name`" `` or `"name"`.
fn take_name(s: &str) -> Option<Result<(String, &str), &'static str>> {
    let (close, rest) = if let Some(rest) = s.strip_prefix("`\"") {
        ("`\"", rest)
    } else if let Some(rest) = s.strip_prefix('"') {
        ("\"", rest)
    } else {
        return None;
    };
    Some(match rest.find(close) {
        Some(end) => Ok((rest[..end].trim().to_owned(), rest[end + close.len()..].trim_start())),
        None => Err("unterminated parameter name quoting"),
    })
}

/// Split off the bracketed type: ``` ``[type]`` ``` or `[type]`.
fn take_type(s: &str) -> Result<(String, &str), &'static str> {
    let (close, rest) = if let Some(rest) = s.strip_prefix("``[") {
        ("]``", rest)
    } else if let Some(rest) = s.strip_prefix('[') {
        ("]", rest)
    } else {
        return Err("missing type brackets");
    };
    match rest.find(close) {
        Some(end) => Ok((rest[..end].trim().to_owned(), rest[end + close.len()..].trim_start())),
        None => Err("malformed type brackets"),
    }
}

struct Tail {
    default: Option<String>,
    optional: bool,
    doc: String,
}

/// Parse `**default** doc`, `**optional** doc`, or plain doc text.
fn take_tail(s: &str) -> Result<Tail, &'static str> {
    let s = s.trim();
    if !s.starts_with("**") {
        return Ok(Tail {
            default: None,
            optional: false,
            doc: s.to_owned(),
        });
    }
    let parts: Vec<&str> = s.split("**").collect();
    if parts.len() < 3 {
        return Err("malformed **default** marker");
    }
    let doc = parts[2..].join("**").trim().to_owned();
    if parts[1] == "optional" {
        Ok(Tail {
            default: None,
            optional: true,
            doc,
        })
    } else {
        Ok(Tail {
            default: Some(parts[1].to_owned()),
            optional: false,
            doc,
        })
    }
}

impl<'a> Parser<'a> {
    pub(super) fn param_decl(&mut self) -> Result<Decl, LoadError> {
        let (text, line) = self.gather();
        let prov = Provenance {
            file: self.filename.clone(),
            line,
        };
        self.parse_param_text(&text, prov)
            .map_err(|msg| self.err_at(line, format!("{}: {}", msg, text)))
    }

    fn parse_param_text(&self, text: &str, prov: Provenance) -> Result<Decl, String> {
        let body = text
            .trim()
            .strip_prefix('*')
            .ok_or("parameter declaration must start with '*'")?
            .trim_start();

        let (name, rest) = match take_name(body) {
            Some(named) => {
                let (name, rest) = named?;
                (Some(name), rest)
            }
            None if body.starts_with('[') || body.starts_with("``[") => (None, body),
            None => return Err("missing parameter name quoting".into()),
        };
        let (type_text, rest) = take_type(rest)?;
        let tail = take_tail(rest)?;
        let type_ = RawType::from_text(&type_text);

        let Some(name) = name else {
            return match type_ {
                RawType::Named(spec) if tail.default.is_none() => Ok(Decl::Include(spec)),
                RawType::Named(_) => Err("defaults are not allowed on includes".into()),
                RawType::Primitive(_) => Err("primitive parameter has no name".into()),
            };
        };

        let default = match (&type_, tail.default) {
            (_, None) => None,
            (RawType::Primitive(p), Some(d)) => {
                Some(parse_text(*p, &d).map_err(|e| format!("invalid default ({})", e))?)
            }
            (RawType::Named(n), Some(_)) => {
                return Err(format!("default given for non-primitive type '{}'", n));
            }
        };

        Ok(Decl::Param(RawParam {
            name,
            optional: tail.optional || default.is_some(),
            type_,
            default,
            doc: tail.doc,
            prov,
        }))
    }

    /// Parse one `- "name" **default** doc` entry starting at the cursor.
    pub(super) fn item_decl(&mut self) -> Result<(RawItem, u32), LoadError> {
        let (text, line) = self.gather();
        parse_item_text(&text)
            .map(|item| (item, line))
            .map_err(|msg| self.err_at(line, format!("{}: {}", msg, text)))
    }
}

fn parse_item_text(text: &str) -> Result<RawItem, &'static str> {
    let body = text
        .trim()
        .strip_prefix('-')
        .ok_or("list item must start with '-'")?
        .trim_start();
    let (name, rest) = take_name(body).ok_or("missing item name quoting")??;
    let tail = take_tail(rest)?;
    Ok(RawItem {
        name,
        default: tail.default,
        doc: tail.doc,
    })
}
