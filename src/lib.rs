//! Weighted-network model, forward pass, editing, graph synthesis and layout.

pub mod codec;
pub mod config;
pub mod editor;
pub mod error;
pub mod id;
pub mod layered;
pub mod layout;
pub mod model;
pub mod propagate;
pub mod store;

pub use config::{EditorConfig, LayoutConfig};
pub use editor::EditCommand;
pub use error::{BulkEditError, DecodeError, IdParseError, ValidationError};
pub use id::{EdgeId, NodeId, WeightId};
pub use model::{HiddenNode, InputNode, NeuralNetwork, OutputNode};
pub use propagate::{NodeKind, VisualEdge, VisualGraph, VisualNode};
pub use store::{HostEvent, Scene, Store};
