//! GLSL built-ins as recording functions.

use crate::dsl::scalar::{F32, I32, U32};
use crate::dsl::vector::{FloatValue, FloatVector, IVec2, IVec3, IVec4, UVec2, UVec3, UVec4, Vec2, Vec3, Vec4};
use crate::dsl::{ScalarArg, ShaderType, Value};
use crate::emitter::Emitter;
use crate::ir::IntrinsicKind;

fn intrinsic<R: Value>(kind: IntrinsicKind, args: &[crate::ir::Index]) -> R {
    let list = Emitter::emit_list_chain(args);
    let ret = R::type_index();
    R::from_index(Emitter::emit_intrinsic(list, kind, ret))
}

pub fn dot<V: FloatVector>(a: V, b: V) -> F32 {
    intrinsic(IntrinsicKind::Dot, &[a.index(), b.index()])
}

pub fn normalize<V: FloatVector>(v: V) -> V {
    intrinsic(IntrinsicKind::Normalize, &[v.index()])
}

pub fn length<V: FloatVector>(v: V) -> F32 {
    intrinsic(IntrinsicKind::Length, &[v.index()])
}

pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    intrinsic(IntrinsicKind::Cross, &[a.index(), b.index()])
}

pub fn reflect<V: FloatVector>(incident: V, normal: V) -> V {
    intrinsic(IntrinsicKind::Reflect, &[incident.index(), normal.index()])
}

pub fn pow<V: FloatValue>(base: V, exponent: impl ScalarArg) -> V {
    intrinsic(IntrinsicKind::Pow, &[base.index(), exponent.record()])
}

macro_rules! unary_builtin {
    ($($name:ident => $kind:ident),+ $(,)?) => {
        $(
            pub fn $name<V: FloatValue>(v: V) -> V {
                intrinsic(IntrinsicKind::$kind, &[v.index()])
            }
        )+
    };
}

unary_builtin!(
    sqrt => Sqrt,
    abs => Abs,
    floor => Floor,
    ceil => Ceil,
    fract => Fract,
    sin => Sin,
    cos => Cos,
    tan => Tan,
    exp => Exp,
    log => Log,
    dfdx => DFdx,
    dfdy => DFdy,
    dfdx_fine => DFdxFine,
    dfdy_fine => DFdyFine,
);

pub fn min<V: FloatValue>(a: V, b: V) -> V {
    intrinsic(IntrinsicKind::Min, &[a.index(), b.index()])
}

pub fn max<V: FloatValue>(a: V, b: V) -> V {
    intrinsic(IntrinsicKind::Max, &[a.index(), b.index()])
}

pub fn clamp<V: FloatValue>(v: V, lo: impl ScalarArg, hi: impl ScalarArg) -> V {
    intrinsic(IntrinsicKind::Clamp, &[v.index(), lo.record(), hi.record()])
}

pub fn mix<V: FloatValue>(a: V, b: V, t: impl ScalarArg) -> V {
    intrinsic(IntrinsicKind::Mix, &[a.index(), b.index(), t.record()])
}

/// Float types with bit-preserving integer counterparts.
pub trait BitcastFloat: Value {
    type AsUInt: Value;
    type AsInt: Value;
}

impl BitcastFloat for F32 {
    type AsUInt = U32;
    type AsInt = I32;
}

impl BitcastFloat for Vec2 {
    type AsUInt = UVec2;
    type AsInt = IVec2;
}

impl BitcastFloat for Vec3 {
    type AsUInt = UVec3;
    type AsInt = IVec3;
}

impl BitcastFloat for Vec4 {
    type AsUInt = UVec4;
    type AsInt = IVec4;
}

/// Integer types with bit-preserving float counterparts.
pub trait BitcastInt: Value {
    type AsFloat: Value;
}

impl BitcastInt for U32 {
    type AsFloat = F32;
}

impl BitcastInt for I32 {
    type AsFloat = F32;
}

impl BitcastInt for UVec2 {
    type AsFloat = Vec2;
}

impl BitcastInt for UVec3 {
    type AsFloat = Vec3;
}

impl BitcastInt for UVec4 {
    type AsFloat = Vec4;
}

impl BitcastInt for IVec2 {
    type AsFloat = Vec2;
}

impl BitcastInt for IVec3 {
    type AsFloat = Vec3;
}

impl BitcastInt for IVec4 {
    type AsFloat = Vec4;
}

pub fn float_bits_to_uint<V: BitcastFloat>(v: V) -> V::AsUInt {
    intrinsic(IntrinsicKind::FloatBitsToUint, &[v.index()])
}

pub fn float_bits_to_int<V: BitcastFloat>(v: V) -> V::AsInt {
    intrinsic(IntrinsicKind::FloatBitsToInt, &[v.index()])
}

pub fn uint_bits_to_float<V: BitcastInt>(v: V) -> V::AsFloat {
    intrinsic(IntrinsicKind::UintBitsToFloat, &[v.index()])
}

pub fn int_bits_to_float<V: BitcastInt>(v: V) -> V::AsFloat {
    intrinsic(IntrinsicKind::IntBitsToFloat, &[v.index()])
}
