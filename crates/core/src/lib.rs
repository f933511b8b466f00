#![allow(clippy::result_large_err)]
//! parspec-core: schema engine for input specs declared in source comments.
//!
//! Spec definitions live in `/*! ... */` comment blocks of C++ headers. The
//! loader extracts those blocks, parses the comment grammar, and registers
//! every spec by name; the registry then builds fresh, independent parameter
//! trees on demand.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`load()`] -- walk source roots and return a finished [`Registry`]
//! - [`Registry`] -- staged loading plus on-demand instantiation
//! - [`SchemaNode`] -- an instantiated spec, list, or typed spec
//! - [`PrimitiveType`] / [`Value`] -- the primitive type system
//! - [`LoadError`], [`TreeError`], [`RegistryError`] -- error types
//!
//! Individual pass entry functions are also re-exported for selective
//! pipeline execution.

pub mod ast;
pub mod config;
pub mod error;
pub mod explain;
pub mod fill;
pub mod lexer;
pub mod load;
pub mod naming;
pub mod parser;
pub mod pass1_load;
pub mod pass2_index;
pub mod pass3_refs;
pub mod pass4_desugar;
pub mod primitives;
pub mod registry;
pub mod source;
pub mod spec;
pub mod xml;

// ── Convenience re-exports: key types ────────────────────────────────

pub use ast::{Provenance, RawComponent, RawParam, RawSpec, RawType};
pub use config::{Config, LoadOptions, Policy};
pub use error::{LoadError, RegistryError, TreeError, TypeError};
pub use pass1_load::LoadReport;
pub use pass2_index::Index;
pub use primitives::{PrimitiveType, Value};
pub use registry::{Catalog, Registry};
pub use spec::{
    CaseSwitch, Component, OneOf, OpenAlternation, OpenChoice, Parameter, ParameterCollection,
    SchemaNode, Spec, TypedCollection, TypedSpec, UnknownKeys,
};

// ── Convenience re-exports: pipeline entry points ────────────────────

pub use load::load;
pub use pass1_load::load_sources_with_provider;
pub use pass2_index::build_index;
pub use pass3_refs::check_references;
pub use pass4_desugar::desugar;
