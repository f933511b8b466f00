//! Pass 0 (second half): a forward-only, line-oriented scanner over extracted
//! comment lines. Each scope becomes one `RawSpec`.
use crate::ast::{Provenance, RawComponent, RawItem, RawParam, RawSpec, RawType};
use crate::error::LoadError;
use crate::lexer::{classify, Keyword, LineKind, Spanned};
use crate::naming::to_specname;
use crate::primitives::{PrimitiveType, Value};
use tracing::debug;

mod blocks;
mod params;

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

pub(crate) struct Parser<'a> {
    lines: &'a [Spanned],
    pos: usize,
    filename: String,
    spec: Option<String>,
}

/// What one scope accumulated before it was closed.
#[derive(Default)]
struct Scope {
    header: Option<String>,
    header_line: u32,
    components: Vec<RawComponent>,
    params: Vec<RawParam>,
    evaluators: Vec<String>,
    keys: Vec<String>,
    includes: Vec<String>,
    dependencies: Vec<String>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(lines: &'a [Spanned], filename: &str) -> Self {
        Parser {
            lines,
            pos: 0,
            filename: filename.to_owned(),
            spec: None,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.lines.len()
    }

    fn kind(&self) -> LineKind {
        match self.lines.get(self.pos) {
            Some(l) => classify(&l.text),
            None => LineKind::Blank,
        }
    }

    fn cur_line(&self) -> u32 {
        match self.lines.get(self.pos) {
            Some(l) => l.line,
            None => self.lines.last().map(|l| l.line).unwrap_or(0),
        }
    }

    fn prov(&self) -> Provenance {
        Provenance {
            file: self.filename.clone(),
            line: self.cur_line(),
        }
    }

    fn err(&self, msg: impl Into<String>) -> LoadError {
        self.err_at(self.cur_line(), msg)
    }

    fn err_at(&self, line: u32, msg: impl Into<String>) -> LoadError {
        let e = LoadError::scan(&self.filename, line, msg);
        match &self.spec {
            Some(s) => e.in_spec(s),
            None => e,
        }
    }

    /// Skip prose and blank lines up to the next marker or the end.
    fn advance(&mut self) {
        while !self.at_end() && !self.kind().is_marker() {
            self.pos += 1;
        }
    }

    /// Collect a marker line plus its continuation lines, stopping at a
    /// blank line or any other marker. Returns the whitespace-joined text and
    /// the line the declaration started on.
    fn gather(&mut self) -> (String, u32) {
        let line = self.cur_line();
        let mut parts = vec![self.lines[self.pos].text.trim().to_owned()];
        self.pos += 1;
        while !self.at_end() {
            match self.kind() {
                LineKind::Prose => {
                    parts.push(self.lines[self.pos].text.trim().to_owned());
                    self.pos += 1;
                }
                _ => break,
            }
        }
        (parts.join(" "), line)
    }

    // -- Top level ------------------------------------------------

    /// Scan every scope. Scopes without a header are named after `stem`.
    pub(crate) fn parse_file(&mut self, stem: &str) -> Result<Vec<RawSpec>, LoadError> {
        let mut specs = Vec::new();
        loop {
            self.advance();
            if self.at_end() {
                break;
            }
            if let LineKind::Keyword(kw @ (Keyword::Or | Keyword::End | Keyword::Then | Keyword::Else)) =
                self.kind()
            {
                return Err(self.err(format!(
                    "unexpected {} outside a ONE OF or IF block",
                    kw.as_str()
                )));
            }
            let start = self.pos;
            let start_line = self.cur_line();
            self.spec = None;
            let scope = self.read_scope(false)?;
            let name = scope.header.clone().unwrap_or_else(|| to_specname(stem));
            let line = if scope.header.is_some() {
                scope.header_line
            } else {
                start_line
            };
            let spec = RawSpec {
                name,
                components: scope.components,
                evaluators: scope.evaluators,
                keys: scope.keys,
                includes: scope.includes,
                dependencies: scope.dependencies,
                prov: Provenance {
                    file: self.filename.clone(),
                    line,
                },
            };
            if spec.is_empty() {
                debug!(spec = %spec.name, file = %self.filename, "skipping empty scope");
            } else {
                specs.push(spec);
            }
            if self.pos == start {
                self.pos += 1;
            }
        }
        Ok(specs)
    }

    /// Read one scope. Nested scopes (block branches) may hold only
    /// parameters and end at the next block keyword or header.
    fn read_scope(&mut self, nested: bool) -> Result<Scope, LoadError> {
        let mut scope = Scope::default();
        self.advance();

        if !nested {
            if let LineKind::Header(name) = self.kind() {
                scope.header_line = self.cur_line();
                self.spec = Some(name.clone());
                scope.header = Some(name);
                self.pos += 1;
                self.advance();
            }
        }

        while !self.at_end() {
            match self.kind() {
                LineKind::Param => match self.param_decl()? {
                    params::Decl::Param(p) if p.name.starts_with('_') => {
                        debug!(param = %p.name, "dropping private parameter");
                    }
                    params::Decl::Param(p) => scope.params.push(p),
                    params::Decl::Include(name) => {
                        if nested {
                            return Err(self.err("includes are not allowed inside a block"));
                        }
                        scope.includes.push(name);
                    }
                },
                LineKind::Keyword(kw @ (Keyword::OneOf | Keyword::If)) => {
                    if nested {
                        return Err(self.err(format!(
                            "nested {} blocks are not supported",
                            kw.as_str()
                        )));
                    }
                    let component = match kw {
                        Keyword::OneOf => self.one_of()?,
                        _ => self.if_block()?,
                    };
                    scope.components.push(component);
                }
                LineKind::Keyword(
                    kw @ (Keyword::Evaluators | Keyword::Keys | Keyword::Includes | Keyword::Dependencies),
                ) => {
                    if nested {
                        return Err(self.err(format!(
                            "{} lists are not allowed inside a block",
                            kw.as_str()
                        )));
                    }
                    let items = self.item_list()?;
                    self.add_items(&mut scope, kw, items);
                }
                LineKind::Item => {
                    debug!(line = self.cur_line(), "treating stray list item as prose");
                    self.pos += 1;
                }
                _ => break,
            }
            self.advance();
        }

        // Block branches hand their params to the caller untouched.
        if !nested && !scope.params.is_empty() {
            let params = std::mem::take(&mut scope.params);
            scope.components.push(RawComponent::Params(params));
        }
        Ok(scope)
    }

    fn add_items(&self, scope: &mut Scope, kw: Keyword, items: Vec<(RawItem, u32)>) {
        for (item, line) in items {
            match kw {
                Keyword::Evaluators => scope.evaluators.push(item.name),
                Keyword::Includes => scope.includes.push(item.name),
                Keyword::Dependencies => scope.dependencies.push(item.name),
                _ => {
                    scope.params.push(RawParam {
                        name: format!("{} key", item.name),
                        type_: RawType::Primitive(PrimitiveType::String),
                        default: item.default.map(Value::String),
                        optional: true,
                        doc: item.doc,
                        prov: Provenance {
                            file: self.filename.clone(),
                            line,
                        },
                    });
                    scope.keys.push(item.name);
                }
            }
        }
    }
}

/// Scan extracted comment lines into raw specs. `stem` names any scope that
/// has no explicit header.
pub fn parse(lines: &[Spanned], filename: &str, stem: &str) -> Result<Vec<RawSpec>, LoadError> {
    Parser::new(lines, filename).parse_file(stem)
}
