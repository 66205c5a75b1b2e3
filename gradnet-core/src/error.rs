use thiserror::Error;

/// Custom error type for the GradNet framework.
///
/// Variants fall into four families: configuration errors (invalid model
/// assembly or hyper-parameters), precondition violations (shape contracts,
/// call ordering), graph-structure violations and construction errors.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum GradNetError {
    #[error("Shape mismatch: expected {expected:?}, got {actual:?} during operation {operation}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
        operation: String,
    },

    #[error("Tensor creation error: data length {data_len} does not match shape {shape:?}")]
    TensorCreationError { data_len: usize, shape: Vec<usize> },

    #[error("Index out of bounds: index {index:?} for shape {shape:?}")]
    IndexOutOfBounds {
        index: Vec<usize>,
        shape: Vec<usize>,
    },

    #[error("Invalid layer order: {0}")]
    InvalidLayerOrder(String),

    #[error("Width mismatch for layer '{layer}': previous layer outputs {expected}, layer expects {actual}")]
    WidthMismatch {
        layer: String,
        expected: usize,
        actual: usize,
    },

    #[error("Model must be compiled before calling {0}")]
    NotCompiled(String),

    #[error("Invalid hyper-parameter '{name}': {value}")]
    InvalidHyperParameter { name: String, value: f64 },

    #[error("Unknown {category} kind: '{name}'")]
    UnknownKind { category: String, name: String },

    #[error("Backward called on layer '{layer}' without a matching forward pass")]
    BackwardBeforeForward { layer: String },

    #[error("Label {label} is out of range for {classes} output classes")]
    LabelOutOfRange { label: usize, classes: usize },

    #[error("Empty input for operation {0}")]
    EmptyInput(String),

    #[error("Graph node value is not numeric (contains NaN or infinity): {0}")]
    NonNumericValue(String),

    #[error("Unknown graph node handle {index} (graph holds {len} nodes)")]
    UnknownNode { index: usize, len: usize },

    #[error("Operation {operation} is not supported: {reason}")]
    UnsupportedOperation { operation: String, reason: String },

    #[error("Persistence hook failed: {0}")]
    Persistence(String),
}
