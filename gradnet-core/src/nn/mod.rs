pub mod activation;
pub mod config;
pub mod cost;
pub mod layers;
pub mod model;

pub use activation::Activation;
pub use config::{FitConfig, HyperParams};
pub use cost::Cost;
pub use layers::{Dense, Flatten, Layer, LayerKind, LayerSnapshot, UpdateContext};
pub use model::{Model, ModelSink, ModelSnapshot};
