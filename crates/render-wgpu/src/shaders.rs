/// WGSL shader for the instanced road scene.
///
/// Lit instances take a hemisphere light with a Lambert response. Every
/// instance is then ACES tone mapped and blended into exponential-squared
/// fog by its distance from the eye. Faces are double-sided: the normal is
/// flipped towards the viewer before lighting.
pub const SCENE_SHADER: &str = r#"
const PI: f32 = 3.141592653589793;

struct Uniforms {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    // rgb, density
    fog: vec4<f32>,
    // rgb, intensity
    sky: vec4<f32>,
    // rgb, exposure
    ground: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
    // x: 1 when lit
    @location(7) params: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) color: vec4<f32>,
    @location(3) lit: f32,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);
    let normal_matrix = mat3x3<f32>(model[0].xyz, model[1].xyz, model[2].xyz);

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * world_pos;
    out.world_position = world_pos.xyz;
    out.world_normal = normal_matrix * vertex.normal;
    out.color = instance.color;
    out.lit = instance.params.x;
    return out;
}

fn rrt_and_odt_fit(v: vec3<f32>) -> vec3<f32> {
    let a = v * (v + 0.0245786) - 0.000090537;
    let b = v * (0.983729 * v + 0.4329510) + 0.238081;
    return a / b;
}

fn aces_filmic(color: vec3<f32>, exposure: f32) -> vec3<f32> {
    let aces_input = mat3x3<f32>(
        vec3<f32>(0.59719, 0.07600, 0.02840),
        vec3<f32>(0.35458, 0.90834, 0.13383),
        vec3<f32>(0.04823, 0.01566, 0.83777),
    );
    let aces_output = mat3x3<f32>(
        vec3<f32>(1.60475, -0.10208, -0.00327),
        vec3<f32>(-0.53108, 1.10813, -0.07276),
        vec3<f32>(-0.07367, -0.00605, 1.07602),
    );
    var c = color * exposure / 0.6;
    c = aces_input * c;
    c = rrt_and_odt_fit(c);
    c = aces_output * c;
    return clamp(c, vec3<f32>(0.0), vec3<f32>(1.0));
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let to_eye = uniforms.camera_position.xyz - in.world_position;

    var rgb = in.color.rgb;
    if (in.lit > 0.5) {
        var n = normalize(in.world_normal);
        if (dot(n, to_eye) < 0.0) {
            n = -n;
        }
        let w = 0.5 * n.y + 0.5;
        let irradiance = mix(uniforms.ground.rgb, uniforms.sky.rgb, w) * uniforms.sky.w;
        rgb = rgb * irradiance / PI;
    }

    rgb = aces_filmic(rgb, uniforms.ground.w);

    let depth = length(to_eye);
    let density = uniforms.fog.w;
    let fog = 1.0 - exp(-density * density * depth * depth);
    rgb = mix(rgb, uniforms.fog.rgb, clamp(fog, 0.0, 1.0));

    return vec4<f32>(rgb, in.color.a);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shader_declares_entry_points() {
        assert!(SCENE_SHADER.contains("fn vs_main"));
        assert!(SCENE_SHADER.contains("fn fs_main"));
    }

    #[test]
    fn instance_locations_match_vertex_layout() {
        for location in 0..=7 {
            assert!(SCENE_SHADER.contains(&format!("@location({location})")));
        }
    }
}
