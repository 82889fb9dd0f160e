use crate::dsl::RenderDSL;

use super::ir::IrNode;

/// Path tracer rendering the scene into the `noisy` image.
pub fn export_technique(render: Option<&RenderDSL>) -> Vec<IrNode> {
    let render = render.cloned().unwrap_or_default();

    let mut integrator = IrNode::new("integrator")
        .with("type", "pathtracer")
        .with("depth", render.max_bounces)
        .with("nee", "true")
        .with("mis", "true");
    integrator.add_child(IrNode::new("ref").with("id", "scene"));
    integrator.add_child(IrNode::new("image").with("id", "noisy"));
    integrator.add_child(
        IrNode::new("sampler")
            .with("type", "independent")
            .with("count", render.samples),
    );
    vec![integrator]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_render_settings() {
        let nodes = export_technique(None);
        assert_eq!(
            nodes[0].dump(0),
            "<integrator type=\"pathtracer\" depth=\"10\" nee=\"true\" mis=\"true\">\n\
             \x20 <ref id=\"scene\"/>\n\
             \x20 <image id=\"noisy\"/>\n\
             \x20 <sampler type=\"independent\" count=\"64\"/>\n\
             </integrator>"
        );
    }

    #[test]
    fn render_settings_drive_depth_and_samples() {
        let render = RenderDSL {
            max_bounces: 4,
            samples: 256,
        };
        let dump = export_technique(Some(&render))[0].dump(0);
        assert!(dump.contains("depth=\"4\""));
        assert!(dump.contains("count=\"256\""));
    }
}
