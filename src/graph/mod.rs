//! Shading graphs: the arena model, node kinds and the normalization passes.

pub mod group_inline;
pub mod kind;
pub mod model;
pub mod normalize;

pub use group_inline::MAX_GROUP_DEPTH;
pub use kind::{NodeKind, OutputTarget, RotationType, VectorType};
pub use model::{InputSlot, Link, Literal, NodeId, OutputSlot, ShaderGraph, ShaderNode, SlotInput};
pub use normalize::{NormalizeReport, normalize};
