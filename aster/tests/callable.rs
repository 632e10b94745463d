//! End-to-end GLSL generation scenarios.

use aster::dsl::{
    cond, construct, end, field, loop_while, otherwise, returns, vec2, vec4, AggregateLayout,
    LayoutIn, LayoutOut, Mat4, ShaderType, Vec3, F32, I32, U32,
};
use aster::ir::Index;
use aster::link::{link, LinkageUnit};
use aster::procedure::{call, procedure};

/// Token-stream comparison, whitespace-insensitive, mirroring how the GLSL
/// outputs are checked against golden sources.
fn check_shader_sources(expected: &str, given: &str) {
    let expected_tokens: Vec<&str> = expected.split_whitespace().collect();
    let given_tokens: Vec<&str> = given.split_whitespace().collect();
    assert_eq!(
        expected_tokens, given_tokens,
        "shader sources differ\n--- expected ---\n{}\n--- given ---\n{}",
        expected, given
    );
}

const EXPECTED_PASSTHROUGH_GLSL: &str = r#"
#version 460

layout(location = 0) in int _lin0;
layout(location = 0) out int _lout0;

void main()
{
    _lout0 = _lin0;
}
"#;

#[test]
fn passthrough_layout_io() {
    let shader = procedure("main", || {
        let lin = LayoutIn::<I32>::new(0);
        let lout = LayoutOut::<I32>::new(0);
        lout.set(lin.get());
    });

    let glsl = link(&shader).generate_glsl().unwrap();
    check_shader_sources(EXPECTED_PASSTHROUGH_GLSL, &glsl);
}

const EXPECTED_SUM_GLSL: &str = r#"
#version 460

int sum(int _arg0, int _arg1)
{
    return (_arg0 + _arg1);
}
"#;

#[test]
fn sum() {
    let sum = procedure("sum", |x: I32, y: I32| x + y);
    let glsl = link(&sum).generate_glsl().unwrap();
    check_shader_sources(EXPECTED_SUM_GLSL, &glsl);
}

const EXPECTED_ARITHMETIC_GLSL: &str = r#"
#version 460

float arithmetic(float _arg0, float _arg1, float _arg2)
{
    return ((_arg0 + (_arg1 * _arg2)) / ((((_arg0 + (_arg1 * _arg2)) / (_arg0 - _arg1)) * _arg2) * _arg2));
}
"#;

#[test]
fn arithmetic() {
    let arithmetic = procedure("arithmetic", |x: F32, y: F32, z: F32| {
        let a = x + y * z;
        let b = a / (x - y) * z * z;
        a / b
    });

    let glsl = link(&arithmetic).generate_glsl().unwrap();
    check_shader_sources(EXPECTED_ARITHMETIC_GLSL, &glsl);
}

#[test]
fn explicit_returns() {
    let arithmetic = procedure("arithmetic", |x: F32, y: F32, z: F32| {
        let a = x + y * z;
        let b = a / (x - y) * z * z;
        returns(a / b);
    });

    let glsl = link(&arithmetic).generate_glsl().unwrap();
    check_shader_sources(EXPECTED_ARITHMETIC_GLSL, &glsl);
}

const EXPECTED_CONDITIONAL_GLSL: &str = r#"
#version 460

float conditional(float _arg0, float _arg1, float _arg2)
{
    if (((_arg0 + (_arg1 * _arg2)) < 0)) {
        return ((_arg0 + (_arg1 * _arg2)) / ((((_arg0 + (_arg1 * _arg2)) / (_arg0 - _arg1)) * _arg2) * _arg2));
    }
    return (_arg0 + (_arg1 * _arg2));
}
"#;

#[test]
fn conditional_returns() {
    let conditional = procedure("conditional", |x: F32, y: F32, z: F32| {
        let a = x + y * z;
        cond(a.lt(0));
        {
            let b = a / (x - y) * z * z;
            returns(a / b);
        }
        end();
        a
    });

    let glsl = link(&conditional).generate_glsl().unwrap();
    check_shader_sources(EXPECTED_CONDITIONAL_GLSL, &glsl);
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

const EXPECTED_STRUCT_PARAMETER_GLSL: &str = r#"
#version 460

struct MVP {
    mat4 model;
    mat4 view;
    mat4 proj;
};

vec4 project(MVP _arg0, vec3 _arg1)
{
    vec4 s0 = vec4(_arg1, 1);
    s0 = (_arg0.model * s0);
    s0 = (_arg0.view * s0);
    s0 = (_arg0.proj * s0);
    return s0;
}
"#;

#[test]
fn struct_parameter() {
    let project = procedure("project", |mvp: Mvp, v: Vec3| {
        let vh = vec4((v, 1));
        vh.set(mvp.model * vh);
        vh.set(mvp.view * vh);
        vh.set(mvp.proj * vh);
        vh
    });

    let glsl = link(&project).generate_glsl().unwrap();
    check_shader_sources(EXPECTED_STRUCT_PARAMETER_GLSL, &glsl);
}

#[derive(Copy, Clone)]
struct Seed {
    root: U32,
    shifted: U32,
}

impl ShaderType for Seed {
    fn type_index() -> Index {
        AggregateLayout::named("Seed")
            .field::<U32>("root")
            .field::<U32>("shifted")
            .emit()
    }

    fn from_base(base: Index) -> Self {
        Seed {
            root: field(base, 0),
            shifted: field(base, 1),
        }
    }
}

const EXPECTED_STRUCT_RETURN_GLSL: &str = r#"
#version 460

struct Seed {
    uint root;
    uint shifted;
};

Seed shift_seed(Seed _arg0)
{
    Seed s0 = Seed(((_arg0.root << _arg0.shifted) & (_arg0.shifted | _arg0.root)), (_arg0.shifted | _arg0.root));
    return s0;
}
"#;

#[test]
fn struct_return() {
    let shift_seed = procedure("shift_seed", |seed: Seed| {
        let a = seed.root << seed.shifted;
        let b = seed.shifted | seed.root;
        construct::<Seed>((a & b, b))
    });

    let glsl = link(&shift_seed).generate_glsl().unwrap();
    check_shader_sources(EXPECTED_STRUCT_RETURN_GLSL, &glsl);
}

#[test]
fn loops_and_else_branches() {
    let steps = procedure("steps", |x: F32| {
        let acc = vec2((x, x));
        loop_while(acc.x().lt(8.0));
        {
            acc.set(acc + acc);
        }
        end();
        cond(acc.x().lt(0.0));
        {
            acc.set(acc * 0.0);
        }
        otherwise();
        {
            acc.set(acc * 0.5);
        }
        end();
        acc.x()
    });

    let glsl = link(&steps).generate_glsl().unwrap();
    assert!(glsl.contains("while ((s0.x < 8.0)) {"), "{}", glsl);
    assert!(glsl.contains("        s0 = (s0 + s0);"), "{}", glsl);
    assert!(glsl.contains("} else {"), "{}", glsl);
    assert!(glsl.contains("return s0.x;"), "{}", glsl);
}

#[test]
fn linked_call_orders_callee_first() {
    let sum = procedure("sum", |x: I32, y: I32| x + y);
    let twice = procedure("twice", |x: I32| call::<I32>(&sum, (x, x)));

    let mut unit = LinkageUnit::new();
    unit.add(&twice);
    unit.add(&sum);
    let glsl = unit.generate_glsl().unwrap();

    let sum_at = glsl.find("int sum(").unwrap();
    let twice_at = glsl.find("int twice(").unwrap();
    assert!(sum_at < twice_at, "callee must precede caller:\n{}", glsl);
    assert!(glsl.contains("return sum(_arg0, _arg0);"), "{}", glsl);
}

#[test]
fn unresolved_call_is_rejected() {
    let sum = procedure("sum", |x: I32, y: I32| x + y);
    let twice = procedure("twice", |x: I32| call::<I32>(&sum, (x, x)));

    let err = link(&twice).generate_glsl().unwrap_err();
    assert!(matches!(err, aster::Error::UnresolvedCall(id) if id == sum.id));
}

#[test]
fn emission_is_deterministic() {
    let project = procedure("project", |mvp: Mvp, v: Vec3| {
        let vh = vec4((v, 1));
        vh.set(mvp.proj * (mvp.view * (mvp.model * vh)));
        vh
    });

    let unit = link(&project);
    let first = unit.generate_glsl().unwrap();
    let second = unit.generate_glsl().unwrap();
    assert_eq!(first, second);
}

#[test]
fn shared_struct_is_emitted_once() {
    let enter = procedure("enter", |mvp: Mvp, v: Vec3| {
        let vh = vec4((v, 1));
        vh.set(mvp.model * vh);
        vh
    });
    let leave = procedure("leave", |mvp: Mvp, v: Vec3| {
        let vh = vec4((v, 0));
        vh.set(mvp.proj * vh);
        vh
    });

    let mut unit = LinkageUnit::new();
    unit.add(&enter);
    unit.add(&leave);
    let glsl = unit.generate_glsl().unwrap();

    assert_eq!(glsl.matches("struct MVP {").count(), 1, "{}", glsl);
}
