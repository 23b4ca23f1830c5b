pub mod id;
pub mod model;
pub mod snapshot;
pub mod zorder;

pub use id::{ElementId, Name};
pub use model::*;
pub use snapshot::{Snapshot, reconstruct, serialize_tree};
pub use zorder::StackIndex;

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
