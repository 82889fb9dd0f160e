//! Closed set of shading node kinds understood by the exporter.

use std::collections::HashMap;

use crate::dsl::{parse_bool, parse_str};

/// How a mapping node interprets its input vector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VectorType {
    Point,
    Texture,
    Normal,
    Vector,
    Unsupported(String),
}

impl VectorType {
    fn parse(s: &str) -> Self {
        match s {
            "POINT" => VectorType::Point,
            "TEXTURE" => VectorType::Texture,
            "NORMAL" => VectorType::Normal,
            "VECTOR" => VectorType::Vector,
            other => VectorType::Unsupported(other.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RotationType {
    EulerXyz,
    AxisAngle,
    XAxis,
    YAxis,
    ZAxis,
    Unsupported(String),
}

impl RotationType {
    fn parse(s: &str) -> Self {
        match s {
            "EULER_XYZ" => RotationType::EulerXyz,
            "AXIS_ANGLE" => RotationType::AxisAngle,
            "X_AXIS" => RotationType::XAxis,
            "Y_AXIS" => RotationType::YAxis,
            "Z_AXIS" => RotationType::ZAxis,
            other => RotationType::Unsupported(other.to_string()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputTarget {
    Material,
    World,
    Light,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    TexImage {
        image: Option<String>,
        extension: String,
        interpolation: String,
    },
    TexEnvironment {
        image: Option<String>,
        interpolation: String,
    },
    Value,
    Rgb,
    NormalMap,
    Mapping {
        vector_type: VectorType,
    },
    VectorRotate {
        rotation_type: RotationType,
        invert: bool,
    },
    TexCoord,
    BsdfDiffuse,
    BsdfGlass {
        distribution: String,
    },
    BsdfRefraction {
        distribution: String,
    },
    BsdfTransparent,
    BsdfGlossy,
    BsdfPrincipled,
    Emission,
    Background,
    Group {
        tree: Option<String>,
    },
    GroupInput,
    GroupOutput {
        active: bool,
    },
    Reroute,
    Frame,
    Output {
        target: OutputTarget,
        active: bool,
    },
    Other(String),
}

impl NodeKind {
    /// Parses the node `type` tag and its kind-specific params.
    pub fn parse(node_type: &str, params: &HashMap<String, serde_json::Value>) -> Self {
        let string = |key: &str, default: &str| parse_str(params, key).unwrap_or(default).to_string();
        let image = || parse_str(params, "image").map(str::to_string);
        let active = || parse_bool(params, "isActiveOutput").unwrap_or(true);

        match node_type {
            "TexImage" => NodeKind::TexImage {
                image: image(),
                extension: string("extension", "REPEAT"),
                interpolation: string("interpolation", "Linear"),
            },
            "TexEnvironment" => NodeKind::TexEnvironment {
                image: image(),
                interpolation: string("interpolation", "Linear"),
            },
            "Value" => NodeKind::Value,
            "RGB" => NodeKind::Rgb,
            "NormalMap" => NodeKind::NormalMap,
            "Mapping" => NodeKind::Mapping {
                vector_type: VectorType::parse(&string("vectorType", "POINT")),
            },
            "VectorRotate" => NodeKind::VectorRotate {
                rotation_type: RotationType::parse(&string("rotationType", "AXIS_ANGLE")),
                invert: parse_bool(params, "invert").unwrap_or(false),
            },
            "TexCoord" => NodeKind::TexCoord,
            "BsdfDiffuse" => NodeKind::BsdfDiffuse,
            "BsdfGlass" => NodeKind::BsdfGlass {
                distribution: string("distribution", "GGX"),
            },
            "BsdfRefraction" => NodeKind::BsdfRefraction {
                distribution: string("distribution", "GGX"),
            },
            "BsdfTransparent" => NodeKind::BsdfTransparent,
            "BsdfGlossy" => NodeKind::BsdfGlossy,
            "BsdfPrincipled" => NodeKind::BsdfPrincipled,
            "Emission" => NodeKind::Emission,
            "Background" => NodeKind::Background,
            "Group" => NodeKind::Group {
                tree: parse_str(params, "nodeTree").map(str::to_string),
            },
            "GroupInput" => NodeKind::GroupInput,
            "GroupOutput" => NodeKind::GroupOutput { active: active() },
            "Reroute" => NodeKind::Reroute,
            "Frame" => NodeKind::Frame,
            "OutputMaterial" => NodeKind::Output {
                target: OutputTarget::Material,
                active: active(),
            },
            "OutputWorld" => NodeKind::Output {
                target: OutputTarget::World,
                active: active(),
            },
            "OutputLight" => NodeKind::Output {
                target: OutputTarget::Light,
                active: active(),
            },
            other => NodeKind::Other(other.to_string()),
        }
    }

    /// The type tag as written in the input document.
    pub fn type_name(&self) -> &str {
        match self {
            NodeKind::TexImage { .. } => "TexImage",
            NodeKind::TexEnvironment { .. } => "TexEnvironment",
            NodeKind::Value => "Value",
            NodeKind::Rgb => "RGB",
            NodeKind::NormalMap => "NormalMap",
            NodeKind::Mapping { .. } => "Mapping",
            NodeKind::VectorRotate { .. } => "VectorRotate",
            NodeKind::TexCoord => "TexCoord",
            NodeKind::BsdfDiffuse => "BsdfDiffuse",
            NodeKind::BsdfGlass { .. } => "BsdfGlass",
            NodeKind::BsdfRefraction { .. } => "BsdfRefraction",
            NodeKind::BsdfTransparent => "BsdfTransparent",
            NodeKind::BsdfGlossy => "BsdfGlossy",
            NodeKind::BsdfPrincipled => "BsdfPrincipled",
            NodeKind::Emission => "Emission",
            NodeKind::Background => "Background",
            NodeKind::Group { .. } => "Group",
            NodeKind::GroupInput => "GroupInput",
            NodeKind::GroupOutput { .. } => "GroupOutput",
            NodeKind::Reroute => "Reroute",
            NodeKind::Frame => "Frame",
            NodeKind::Output {
                target: OutputTarget::Material,
                ..
            } => "OutputMaterial",
            NodeKind::Output {
                target: OutputTarget::World,
                ..
            } => "OutputWorld",
            NodeKind::Output {
                target: OutputTarget::Light,
                ..
            } => "OutputLight",
            NodeKind::Other(tag) => tag,
        }
    }

    pub fn is_active_output(&self) -> bool {
        matches!(self, NodeKind::Output { active: true, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kind_params() {
        let params = HashMap::from([
            ("vectorType".to_string(), serde_json::json!("TEXTURE")),
        ]);
        assert_eq!(
            NodeKind::parse("Mapping", &params),
            NodeKind::Mapping {
                vector_type: VectorType::Texture
            }
        );

        let params = HashMap::from([
            ("rotationType".to_string(), serde_json::json!("QUATERNION")),
            ("invert".to_string(), serde_json::json!(true)),
        ]);
        assert_eq!(
            NodeKind::parse("VectorRotate", &params),
            NodeKind::VectorRotate {
                rotation_type: RotationType::Unsupported("QUATERNION".to_string()),
                invert: true,
            }
        );
    }

    #[test]
    fn unknown_tags_round_trip_their_name() {
        let kind = NodeKind::parse("MixShader", &HashMap::new());
        assert_eq!(kind, NodeKind::Other("MixShader".to_string()));
        assert_eq!(kind.type_name(), "MixShader");
    }

    #[test]
    fn outputs_default_to_active() {
        let kind = NodeKind::parse("OutputWorld", &HashMap::new());
        assert!(kind.is_active_output());
        let params = HashMap::from([("isActiveOutput".to_string(), serde_json::json!(false))]);
        assert!(!NodeKind::parse("OutputMaterial", &params).is_active_output());
    }
}
