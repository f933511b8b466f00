//! The spec registry: staged loading, then on-demand instantiation.
//!
//! Loading stages raw definitions; [`Registry::finish_load`] runs passes 2-4
//! and freezes the result into a [`Catalog`]. [`Registry::get`] builds a
//! fresh, independent [`SchemaNode`] from the catalog on every call.

use crate::ast::{RawComponent, RawParam, RawSpec, RawType};
use crate::config::LoadOptions;
use crate::error::{LoadError, RegistryError};
use crate::lexer;
use crate::naming::{self, spec_form, SpecForm};
use crate::pass1_load::{self, LoadReport};
use crate::pass2_index::{self, Index};
use crate::pass3_refs;
use crate::pass4_desugar;
use crate::primitives::PrimitiveType;
use crate::source::{FileSystemProvider, SourceProvider};
use crate::spec::{
    CaseSwitch, Component, OneOf, Parameter, ParameterCollection, SchemaNode, Spec,
    TypedCollection, TypedSpec,
};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

/// Frozen, fully desugared definitions plus the typed-field variant map.
#[derive(Debug, Default)]
pub struct Catalog {
    specs: HashMap<String, RawSpec>,
    valid_types: HashMap<String, BTreeMap<String, String>>,
}

impl Catalog {
    pub(crate) fn new(
        specs: HashMap<String, RawSpec>,
        valid_types: HashMap<String, BTreeMap<String, String>>,
    ) -> Self {
        Catalog { specs, valid_types }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    /// The expanded definition registered under `name`.
    pub fn raw(&self, name: &str) -> Option<&RawSpec> {
        self.specs.get(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.specs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Can `get(name)` succeed?
    pub fn resolvable(&self, name: &str) -> bool {
        naming::resolvable(name, &|n: &str| self.contains(n))
    }

    /// Type name to variant spec name for the typed spec `typed`.
    pub fn valid_types(&self, typed: &str, field: &str) -> BTreeMap<String, String> {
        match self.valid_types.get(typed) {
            Some(found) => found.clone(),
            None => pass4_desugar::variants(typed, field, self.specs.keys().map(String::as_str)),
        }
    }
}

/// Build a fresh node for `name`.
pub(crate) fn instantiate(catalog: &Arc<Catalog>, name: &str) -> Result<SchemaNode, RegistryError> {
    Builder {
        catalog,
        stack: Vec::new(),
    }
    .node(name)
}

/// Recursive instantiation with a guard against eager cycles.
struct Builder<'c> {
    catalog: &'c Arc<Catalog>,
    stack: Vec<String>,
}

impl Builder<'_> {
    fn node(&mut self, name: &str) -> Result<SchemaNode, RegistryError> {
        match spec_form(name) {
            SpecForm::Generic => Ok(SchemaNode::Spec(Spec::generic_list())),
            SpecForm::List { element } => match PrimitiveType::from_name(element) {
                Some(p) => Ok(SchemaNode::List(TypedCollection::of_primitive(p))),
                None if self.catalog.resolvable(element) => Ok(SchemaNode::List(
                    TypedCollection::of_spec(element, Arc::clone(self.catalog)),
                )),
                None => Err(RegistryError::UnknownSpec(element.to_owned())),
            },
            SpecForm::Typed { field, placement } => {
                let others = match self.catalog.raw(name) {
                    Some(raw) => Some(self.spec(raw)?),
                    None => None,
                };
                Ok(SchemaNode::Typed(TypedSpec::new(
                    name,
                    &field,
                    placement,
                    others,
                    Arc::clone(self.catalog),
                )))
            }
            SpecForm::Plain => {
                let raw = self
                    .catalog
                    .raw(name)
                    .ok_or_else(|| RegistryError::UnknownSpec(name.to_owned()))?;
                Ok(SchemaNode::Spec(self.spec(raw)?))
            }
        }
    }

    fn spec(&mut self, raw: &RawSpec) -> Result<Spec, RegistryError> {
        if let Some(pos) = self.stack.iter().position(|n| *n == raw.name) {
            let mut cycle = self.stack[pos..].to_vec();
            cycle.push(raw.name.clone());
            return Err(RegistryError::Cycle(cycle.join(" \u{2192} ")));
        }
        self.stack.push(raw.name.clone());

        let mut spec = Spec::new(&raw.name);
        spec.evaluators = raw.evaluators.clone();
        spec.keys = raw.keys.clone();
        spec.includes = raw.includes.clone();
        spec.dependencies = raw.dependencies.clone();
        for component in &raw.components {
            let built = match component {
                RawComponent::Params(params) => Component::Collection(self.collection(params)?),
                RawComponent::OneOf(branches) => {
                    let branches = branches
                        .iter()
                        .map(|b| self.collection(b))
                        .collect::<Result<Vec<_>, _>>()?;
                    Component::OneOf(OneOf::new(branches)?)
                }
                RawComponent::IfThenElse {
                    condition,
                    then_branch,
                    else_branch,
                } => Component::Switch(CaseSwitch::if_then_else(
                    self.param(condition)?,
                    self.collection(then_branch)?,
                    self.collection(else_branch)?,
                )?),
            };
            spec.push(built);
        }

        self.stack.pop();
        Ok(spec)
    }

    fn collection(&mut self, params: &[RawParam]) -> Result<ParameterCollection, RegistryError> {
        let params = params
            .iter()
            .map(|p| self.param(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ParameterCollection::from_params(params))
    }

    fn param(&mut self, raw: &RawParam) -> Result<Parameter, RegistryError> {
        let mut param = match &raw.type_ {
            RawType::Primitive(p) => {
                let param = Parameter::primitive(&raw.name, *p);
                match &raw.default {
                    Some(d) => param.with_default(d.clone())?,
                    None => param,
                }
            }
            RawType::Named(spec) => {
                let node = self.node(spec)?;
                Parameter::derived(&raw.name, spec).with_node(node)
            }
        };
        if raw.optional {
            param = param.as_optional();
        }
        Ok(param.with_doc(&raw.doc))
    }
}

/// Loaded spec definitions, keyed by name.
///
/// Load calls stage definitions; [`finish_load`](Self::finish_load) must run
/// before [`get`](Self::get). Loading more afterwards is allowed and needs
/// another `finish_load`.
#[derive(Debug, Default)]
pub struct Registry {
    options: LoadOptions,
    index: Index,
    pending: Vec<RawSpec>,
    catalog: Arc<Catalog>,
    problems: Vec<LoadError>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: LoadOptions) -> Self {
        Registry {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Stage already-parsed definitions.
    pub fn add_specs(&mut self, specs: Vec<RawSpec>) -> usize {
        let n = specs.len();
        self.pending.extend(specs);
        n
    }

    /// Stage specs from extracted comment lines; `filename` names headerless
    /// scopes.
    pub fn load_lines<S: AsRef<str>>(
        &mut self,
        filename: &str,
        lines: &[S],
    ) -> Result<usize, LoadError> {
        let stem = self.options.stem(Path::new(filename));
        let specs = crate::parser::parse(&lexer::from_lines(lines), filename, &stem)?;
        Ok(self.add_specs(specs))
    }

    /// Stage specs from a whole source text.
    pub fn load_source(&mut self, filename: &str, text: &str) -> Result<usize, LoadError> {
        let stem = self.options.stem(Path::new(filename));
        let specs = pass1_load::load_text(filename, &stem, text)?;
        Ok(self.add_specs(specs))
    }

    /// Stage every accepted file under `root`.
    pub fn load_dir(&mut self, root: &Path) -> Result<LoadReport, LoadError> {
        self.load_with_provider(root, &FileSystemProvider)
    }

    pub fn load_with_provider(
        &mut self,
        root: &Path,
        provider: &dyn SourceProvider,
    ) -> Result<LoadReport, LoadError> {
        let (specs, report) = pass1_load::load_sources_with_provider(root, provider, &self.options)?;
        tracing::info!(
            root = %root.display(),
            files = report.files_read,
            specs = report.specs,
            skipped = report.skipped.len(),
            "loaded sources"
        );
        self.add_specs(specs);
        Ok(report)
    }

    /// Index, check and desugar everything staged so far, then freeze it.
    ///
    /// Reference problems are handled per the `on_error` policy; the ones
    /// that did not abort are returned.
    pub fn finish_load(&mut self) -> Result<&[LoadError], LoadError> {
        let staged = std::mem::take(&mut self.pending);
        pass2_index::build_index(&mut self.index, staged);
        self.problems = pass3_refs::check_references(&self.index, self.options.on_error)?;
        self.catalog = Arc::new(pass4_desugar::desugar(&self.index));
        tracing::debug!(specs = self.index.len(), "registry finished");
        Ok(&self.problems)
    }

    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }

    /// A fresh instance for `name`, resolving `-list`, `-typed*-spec` and
    /// `list` forms.
    pub fn get(&self, name: &str) -> Result<SchemaNode, RegistryError> {
        if !self.is_finished() {
            return Err(RegistryError::NotFinished);
        }
        instantiate(&self.catalog, name)
    }

    /// Is `name` registered (staged names excluded)?
    pub fn contains(&self, name: &str) -> bool {
        self.catalog.contains(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.catalog.names()
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Reference problems found by the last `finish_load`.
    pub fn problems(&self) -> &[LoadError] {
        &self.problems
    }

    /// Forget everything, keeping the options.
    pub fn clear(&mut self) {
        self.index.clear();
        self.pending.clear();
        self.problems.clear();
        self.catalog = Arc::default();
    }
}
