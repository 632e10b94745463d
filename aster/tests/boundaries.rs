//! Boundary declarations: compute buffers, samplers, uniform blocks and the
//! ray-tracing interface, as seen in the emitted GLSL.

use aster::dsl::{
    field, local_size, trace_ray, vec3, vec4, AccelerationStructure, AggregateLayout, LayoutIn,
    LayoutOut, Mat4, RayPayload, Sampler2D, ShaderType, StorageBuffer, Uniform, Vec2, Vec3, Vec4,
    F32, I32,
};
use aster::ir::Index;
use aster::link::link;
use aster::procedure::procedure;

#[test]
fn compute_boundaries_declare_blocks() {
    let shader = procedure("main", || {
        local_size(64);
        let data = StorageBuffer::<F32>::read(0);
        let sink = StorageBuffer::<F32>::write(1);
        let x = data.load(0);
        sink.store(0, x * 2.0);
    });

    let glsl = link(&shader).generate_glsl().unwrap();
    assert!(glsl.contains("layout(local_size_x = 64) in;"), "{}", glsl);
    assert!(
        glsl.contains("layout(binding = 0) readonly buffer _sb0_t { float _sb0[]; };"),
        "{}",
        glsl
    );
    assert!(
        glsl.contains("layout(binding = 1) buffer _sb1_t { float _sb1[]; };"),
        "{}",
        glsl
    );
    assert!(glsl.contains("_sb1[0] = (_sb0[0] * 2.0);"), "{}", glsl);
}

#[test]
fn sampler_binding_and_texture_call() {
    let shader = procedure("main", || {
        let uv = LayoutIn::<Vec2>::new(0);
        let color = LayoutOut::<Vec4>::new(0);
        let tex = Sampler2D::new(1);
        color.set(tex.sample(uv.get()));
    });

    let glsl = link(&shader).generate_glsl().unwrap();
    assert!(
        glsl.contains("layout(binding = 1) uniform sampler2D _sampler1;"),
        "{}",
        glsl
    );
    assert!(glsl.contains("_lout0 = texture(_sampler1, _lin0);"), "{}", glsl);
}

#[derive(Copy, Clone)]
struct Mvp {
    model: Mat4,
    view: Mat4,
    proj: Mat4,
}

impl ShaderType for Mvp {
    fn type_index() -> Index {
        AggregateLayout::named("MVP")
            .field::<Mat4>("model")
            .field::<Mat4>("view")
            .field::<Mat4>("proj")
            .emit()
    }

    fn from_base(base: Index) -> Self {
        Mvp {
            model: field(base, 0),
            view: field(base, 1),
            proj: field(base, 2),
        }
    }
}

#[test]
fn uniform_block_wraps_aggregates() {
    let shader = procedure("main", || {
        let mvp = Uniform::<Mvp>::new(0);
        let position = LayoutIn::<Vec3>::new(0);
        let clip = LayoutOut::<Vec4>::new(0);

        let vh = vec4((position.get(), 1));
        vh.set(mvp.proj * (mvp.view * (mvp.model * vh)));
        clip.set(vh);
    });

    let glsl = link(&shader).generate_glsl().unwrap();
    assert!(
        glsl.contains("layout(binding = 0) uniform _ubo0_t { MVP _ubo0; };"),
        "{}",
        glsl
    );
    assert!(glsl.contains("struct MVP {"), "{}", glsl);
    assert!(glsl.contains("(_ubo0.model * s0)"), "{}", glsl);
}

#[test]
fn ray_tracing_boundaries_require_the_extension() {
    let shader = procedure("main", || {
        let payload = RayPayload::<Vec3>::new(0);
        let tlas = AccelerationStructure::new(0);

        let origin = vec3((0.0f32, 0.0f32, 0.0f32));
        let direction = vec3((0.0f32, 0.0f32, 1.0f32));
        trace_ray(&tlas, 0xff, 0xff, 0, 0, 0, origin, 0.001f32, direction, 1000.0f32, 0);
        payload.set(vec3((1.0f32, 0.0f32, 0.0f32)));
    });

    let glsl = link(&shader).generate_glsl().unwrap();
    assert!(glsl.contains("#extension GL_EXT_ray_tracing : require"), "{}", glsl);
    assert!(
        glsl.contains("layout(location = 0) rayPayloadEXT vec3 _payload0;"),
        "{}",
        glsl
    );
    assert!(
        glsl.contains("layout(binding = 0) uniform accelerationStructureEXT _tlas0;"),
        "{}",
        glsl
    );
    assert!(
        glsl.contains("traceRayEXT(_tlas0, 255, 255, 0, 0, 0, s0, 0.001, s1, 1000.0, 0);"),
        "{}",
        glsl
    );
}

#[test]
fn explicit_casts_fold_inline() {
    let widen = procedure("widen", |x: I32| x.to_f32() + 0.5);
    let glsl = link(&widen).generate_glsl().unwrap();
    assert!(glsl.contains("float widen(int _arg0)"), "{}", glsl);
    assert!(glsl.contains("return (float(_arg0) + 0.5);"), "{}", glsl);
}
