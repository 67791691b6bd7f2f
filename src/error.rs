use crate::model::SourceLayer;

/// A model that breaks one of the structural or numeric invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("input layer must contain at least one node")]
    EmptyInputLayer,

    #[error("output layer must contain at least one node")]
    EmptyOutputLayer,

    #[error("hidden layer {layer} must contain at least one node")]
    EmptyHiddenLayer { layer: usize },

    #[error("{layer}, node {node}: expected {expected} weights for the next layer, found {actual}")]
    WeightCountMismatch {
        layer: SourceLayer,
        node: usize,
        expected: usize,
        actual: usize,
    },

    #[error("input layer, node {node}: value is not a finite number")]
    NonFiniteValue { node: usize },

    #[error("{layer}, node {node}: weight {weight} is not a finite number")]
    NonFiniteWeight {
        layer: SourceLayer,
        node: usize,
        weight: usize,
    },
}

/// An identifier string that does not follow the node/weight/edge id grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised identifier '{id}': {reason}")]
pub struct IdParseError {
    pub id: String,
    pub reason: &'static str,
}

impl IdParseError {
    pub(crate) fn new(id: &str, reason: &'static str) -> Self {
        Self { id: id.to_string(), reason }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("state is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("state could not be decompressed: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("state is not a network document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("state describes an invalid network: {0}")]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("failed to serialize network: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to compress network: {0}")]
    Compress(#[source] std::io::Error),
}

/// Rejection of a document supplied through the bulk text editor.
#[derive(Debug, thiserror::Error)]
pub enum BulkEditError {
    #[error("document is not valid JSON for a network: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
