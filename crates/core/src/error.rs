use crate::primitives::PrimitiveType;
use serde::{Deserialize, Serialize};

/// A load-time error: comment grammar, source I/O, or reference resolution.
///
/// `pass` names the load stage that raised it (0 = scan, 1 = source walk,
/// 2 = index, 3 = references, 4 = desugar). Serializes to the JSON shape
/// the CLI emits for `--output json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, thiserror::Error)]
#[error("{file}:{line}: {}{message}", spec_prefix(.spec))]
pub struct LoadError {
    pub pass: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<String>,
    pub file: String,
    pub line: u32,
    pub message: String,
}

fn spec_prefix(spec: &Option<String>) -> String {
    match spec {
        Some(s) => format!("[{}] ", s),
        None => String::new(),
    }
}

impl LoadError {
    pub fn new(
        pass: u8,
        spec: Option<&str>,
        file: &str,
        line: u32,
        message: impl Into<String>,
    ) -> Self {
        LoadError {
            pass,
            spec: spec.map(str::to_owned),
            file: file.to_owned(),
            line,
            message: message.into(),
        }
    }

    pub fn scan(file: &str, line: u32, message: impl Into<String>) -> Self {
        LoadError::new(0, None, file, line, message)
    }

    /// Attach the spec name once the scope header is known.
    pub fn in_spec(mut self, spec: &str) -> Self {
        if self.spec.is_none() {
            self.spec = Some(spec.to_owned());
        }
        self
    }

    /// Serialize with every field present (null for a missing spec name).
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "file":    self.file,
            "line":    self.line,
            "message": self.message,
            "pass":    self.pass,
            "spec":    self.spec,
        })
    }
}

/// A value that cannot be interpreted as the declared primitive type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeError {
    #[error("cannot interpret {value:?} as {target}")]
    Coerce { value: String, target: PrimitiveType },

    #[error("unknown primitive type '{0}'")]
    UnknownType(String),
}

impl TypeError {
    pub fn coerce(value: impl Into<String>, target: PrimitiveType) -> Self {
        TypeError::Coerce {
            value: value.into(),
            target,
        }
    }
}

/// Usage errors raised by spec tree instances.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Key is not declared anywhere in the node and the node rejects unknown keys.
    #[error("'{key}' is not a parameter of {owner}")]
    UnknownKey { key: String, owner: String },

    /// Setting the key would leave a ONE OF with no viable branch.
    #[error("setting '{key}' conflicts with a previously selected ONE OF branch")]
    PrunedBranch { key: String },

    #[error("cannot set '{key}' before the case parameter '{case}' is set")]
    CaseNotSet { key: String, case: String },

    #[error("'{key}' is not in the branch selected by '{case}' = {value}")]
    BranchMismatch {
        key: String,
        case: String,
        value: String,
    },

    #[error("{value} does not select a branch of case parameter '{case}'")]
    InvalidCase { case: String, value: String },

    #[error("'{key}' holds a sub-spec, not a primitive value")]
    NotPrimitive { key: String },

    #[error("'{key}' is a primitive parameter and holds no sub-spec")]
    NotDerived { key: String },

    #[error("'{key}' already exists; cannot append an entry of this name")]
    DuplicateEntry { key: String },

    #[error("'{type_name}' is not a valid type for '{field}' (valid: {valid})")]
    UnknownType {
        field: String,
        type_name: String,
        valid: String,
    },

    #[error("type of '{field}' is already set to '{current}'")]
    TypeAlreadySet { field: String, current: String },

    #[error("{owner} is not a list")]
    NotAList { owner: String },

    #[error("ONE OF requires at least two non-empty branches")]
    MalformedOneOf,

    #[error("parameter '{key}': {source}")]
    Type {
        key: String,
        #[source]
        source: TypeError,
    },

    #[error(transparent)]
    Registry(#[from] Box<RegistryError>),
}

/// Failures resolving a spec name into a fresh instance.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown spec '{0}'")]
    UnknownSpec(String),

    #[error("spec reference cycle: {0}")]
    Cycle(String),

    #[error("registry has pending loads; call finish_load() first")]
    NotFinished,

    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl From<RegistryError> for TreeError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::Tree(inner) => inner,
            other => TreeError::Registry(Box::new(other)),
        }
    }
}
