use thiserror::Error;

/// Everything that can go wrong while lowering a scene.
///
/// Most variants are reported through [`crate::diagnostics::Diagnostics`] and the
/// affected fragment degrades to a fallback. Only [`ExportError::is_fatal_for_material`]
/// conditions abort the current material.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExportError {
    #[error("graph '{graph}' has a node '{node}' of type {kind} which is not supported")]
    UnsupportedNodeKind {
        graph: String,
        node: String,
        kind: String,
    },
    #[error("multi-input links are not supported ({node}.{slot})")]
    MultiInputUnsupported { node: String, slot: String },
    #[error("cannot remove node '{node}' as '{consumer}'.'{slot}' still relies on output '{output}'")]
    DanglingReference {
        node: String,
        consumer: String,
        slot: String,
        output: String,
    },
    #[error("maximum depth reached while inlining node group '{node}'")]
    GroupNestingTooDeep { node: String },
    #[error("unsupported color space {0}")]
    UnsupportedColorSpace(String),
    #[error("only constant values for emission strength are supported")]
    NonConstantEmissionStrength,
    #[error("only constant values for transformations are supported")]
    NonConstantTransform,
    #[error("unsupported light shape '{0}'")]
    UnsupportedLightShape(String),
    #[error("light type {0} unsupported")]
    UnsupportedLightType(String),
    #[error("graph '{graph}' has a mapping of type {vector_type} which is not supported")]
    UnsupportedVectorType { graph: String, vector_type: String },
    #[error("graph '{graph}' has a vector rotation of type {rotation_type} which is not supported")]
    UnsupportedRotationType {
        graph: String,
        rotation_type: String,
    },
    #[error("graph '{0}' has no active output")]
    MissingActiveOutput(String),
    #[error("node tree '{0}' could not be found")]
    MissingNodeTree(String),
    #[error("image export failed: {0}")]
    ImageExportFailure(String),
    #[error("cyclic link structure at node '{node}' in graph '{graph}'")]
    CyclicGraph { graph: String, node: String },
    #[error("scale component of zero cannot be inverted in graph '{0}'")]
    DegenerateScale(String),
}

impl ExportError {
    /// Conditions that abort the current material; the caller substitutes its default.
    pub fn is_fatal_for_material(&self) -> bool {
        matches!(self, ExportError::MissingNodeTree(_))
    }
}
