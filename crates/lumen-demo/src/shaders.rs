use lumen_engine::render::ShaderLibrary;

const COMMON: &str = include_str!("../shaders/common.wgsl");
const FULLSCREEN: &str = include_str!("../shaders/fullscreen.wgsl");

fn with_prelude(preludes: &[&str], body: &str) -> String {
    let mut src = preludes.join("\n");
    src.push('\n');
    src.push_str(body);
    src
}

/// Every shader the frame pipeline needs, with the shared WGSL preludes
/// prepended.
pub fn library() -> ShaderLibrary {
    let mut lib = ShaderLibrary::new();
    lib.insert(
        "scene",
        with_prelude(&[COMMON], include_str!("../shaders/scene.wgsl")),
    )
    .insert(
        "sky",
        with_prelude(&[COMMON], include_str!("../shaders/sky.wgsl")),
    )
    .insert(
        "shadow",
        with_prelude(&[COMMON], include_str!("../shaders/shadow.wgsl")),
    )
    .insert("hiz_first", include_str!("../shaders/hiz_first.wgsl"))
    .insert("hiz_reduce", include_str!("../shaders/hiz_reduce.wgsl"))
    .insert(
        "ssr",
        with_prelude(&[COMMON, FULLSCREEN], include_str!("../shaders/ssr.wgsl")),
    )
    .insert(
        "composite",
        with_prelude(&[FULLSCREEN], include_str!("../shaders/composite.wgsl")),
    )
    .insert(
        "brdf_lut",
        with_prelude(&[FULLSCREEN], include_str!("../shaders/brdf_lut.wgsl")),
    );
    lib
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_has_every_required_shader() {
        assert!(library().missing().is_empty());
    }

    #[test]
    fn mesh_shaders_carry_the_shared_bindings() {
        let lib = library();
        for name in ["scene", "sky", "shadow", "ssr"] {
            let src = &lib.get(name).unwrap().wgsl;
            assert!(src.contains("var<uniform> frame_cb"), "{name}");
        }
        assert!(!lib.get("composite").unwrap().wgsl.contains("frame_cb"));
    }
}
