//! Vector value types, constructors and swizzles.

use crate::dsl::scalar::{binary, shader_value, F32, I32, U32};
use crate::dsl::{ArgPack, ProcReturn, ScalarArg, ShaderType, Value};
use crate::emitter::Emitter;
use crate::ir::{ConstructMode, Index, OpCode, PrimitiveKind, SwizzleCode};

shader_value!(Vec2, PrimitiveKind::Vec2);
shader_value!(Vec3, PrimitiveKind::Vec3);
shader_value!(Vec4, PrimitiveKind::Vec4);
shader_value!(IVec2, PrimitiveKind::IVec2);
shader_value!(IVec3, PrimitiveKind::IVec3);
shader_value!(IVec4, PrimitiveKind::IVec4);
shader_value!(UVec2, PrimitiveKind::UVec2);
shader_value!(UVec3, PrimitiveKind::UVec3);
shader_value!(UVec4, PrimitiveKind::UVec4);

/// Float scalars and vectors, the domain of most built-ins.
pub trait FloatValue: Value {}

impl FloatValue for F32 {}
impl FloatValue for Vec2 {}
impl FloatValue for Vec3 {}
impl FloatValue for Vec4 {}

/// Float vectors only.
pub trait FloatVector: FloatValue {}

impl FloatVector for Vec2 {}
impl FloatVector for Vec3 {}
impl FloatVector for Vec4 {}

/// Records the arguments, the result type and a `Normal`-mode construct.
pub(crate) fn construct_value<V: Value>(args: impl ArgPack) -> V {
    let list = crate::dsl::record_args(args);
    let ty = V::type_index();
    V::from_index(Emitter::emit_construct(ty, list, ConstructMode::Normal))
}

pub fn vec2(args: impl ArgPack) -> Vec2 {
    construct_value(args)
}

pub fn vec3(args: impl ArgPack) -> Vec3 {
    construct_value(args)
}

pub fn vec4(args: impl ArgPack) -> Vec4 {
    construct_value(args)
}

pub fn ivec2(args: impl ArgPack) -> IVec2 {
    construct_value(args)
}

pub fn ivec3(args: impl ArgPack) -> IVec3 {
    construct_value(args)
}

pub fn ivec4(args: impl ArgPack) -> IVec4 {
    construct_value(args)
}

pub fn uvec2(args: impl ArgPack) -> UVec2 {
    construct_value(args)
}

pub fn uvec3(args: impl ArgPack) -> UVec3 {
    construct_value(args)
}

pub fn uvec4(args: impl ArgPack) -> UVec4 {
    construct_value(args)
}

/// Component-wise arithmetic between equal vector types.
macro_rules! vector_componentwise {
    ($($ty:ident),+) => {
        $(
            impl std::ops::Add for $ty {
                type Output = $ty;
                fn add(self, rhs: $ty) -> $ty {
                    binary(self.index(), rhs.index(), OpCode::Add)
                }
            }

            impl std::ops::Sub for $ty {
                type Output = $ty;
                fn sub(self, rhs: $ty) -> $ty {
                    binary(self.index(), rhs.index(), OpCode::Sub)
                }
            }

            impl std::ops::Mul for $ty {
                type Output = $ty;
                fn mul(self, rhs: $ty) -> $ty {
                    binary(self.index(), rhs.index(), OpCode::Mul)
                }
            }
        )+
    };
}

vector_componentwise!(Vec2, Vec3, Vec4, IVec2, IVec3, IVec4, UVec2, UVec3, UVec4);

/// Scaling by a float scalar, from either side.
macro_rules! vector_scale {
    ($($ty:ident),+) => {
        $(
            impl std::ops::Mul<F32> for $ty {
                type Output = $ty;
                fn mul(self, rhs: F32) -> $ty {
                    binary(self.index(), rhs.index(), OpCode::Mul)
                }
            }

            impl std::ops::Mul<$ty> for F32 {
                type Output = $ty;
                fn mul(self, rhs: $ty) -> $ty {
                    binary(self.index(), rhs.index(), OpCode::Mul)
                }
            }

            impl std::ops::Mul<f32> for $ty {
                type Output = $ty;
                fn mul(self, rhs: f32) -> $ty {
                    let rhs = ScalarArg::record(rhs);
                    binary(self.index(), rhs, OpCode::Mul)
                }
            }

            impl std::ops::Mul<$ty> for f32 {
                type Output = $ty;
                fn mul(self, rhs: $ty) -> $ty {
                    let lhs = ScalarArg::record(self);
                    binary(lhs, rhs.index(), OpCode::Mul)
                }
            }

            impl std::ops::Div<F32> for $ty {
                type Output = $ty;
                fn div(self, rhs: F32) -> $ty {
                    binary(self.index(), rhs.index(), OpCode::Div)
                }
            }

            impl std::ops::Div<f32> for $ty {
                type Output = $ty;
                fn div(self, rhs: f32) -> $ty {
                    let rhs = ScalarArg::record(rhs);
                    binary(self.index(), rhs, OpCode::Div)
                }
            }

            impl std::ops::Neg for $ty {
                type Output = $ty;
                fn neg(self) -> $ty {
                    $ty::from_index(Emitter::emit_operation(self.index(), crate::ir::NONE, OpCode::Neg))
                }
            }

            impl std::ops::Add<f32> for $ty {
                type Output = $ty;
                fn add(self, rhs: f32) -> $ty {
                    let rhs = ScalarArg::record(rhs);
                    binary(self.index(), rhs, OpCode::Add)
                }
            }

            impl std::ops::Add<$ty> for f32 {
                type Output = $ty;
                fn add(self, rhs: $ty) -> $ty {
                    let lhs = ScalarArg::record(self);
                    binary(lhs, rhs.index(), OpCode::Add)
                }
            }
        )+
    };
}

vector_scale!(Vec2, Vec3, Vec4);

macro_rules! swizzle {
    ($ty:ident => $scalar:ident, $($method:ident : $code:ident -> $out:ident),+ $(,)?) => {
        impl $ty {
            $(
                pub fn $method(self) -> $out {
                    $out::from_index(Emitter::emit_swizzle(self.index(), SwizzleCode::$code))
                }
            )+

            /// Stores `rhs` over this value.
            pub fn set(&self, rhs: $ty) {
                Emitter::emit_store(self.index(), rhs.index());
            }
        }
    };
}

swizzle!(Vec2 => F32,
    x: X -> F32,
    y: Y -> F32,
);

swizzle!(Vec3 => F32,
    x: X -> F32,
    y: Y -> F32,
    z: Z -> F32,
    xy: Xy -> Vec2,
    yz: Yz -> Vec2,
    xz: Xz -> Vec2,
);

swizzle!(Vec4 => F32,
    x: X -> F32,
    y: Y -> F32,
    z: Z -> F32,
    w: W -> F32,
    xy: Xy -> Vec2,
    zw: Zw -> Vec2,
    xyz: Xyz -> Vec3,
    yzw: Yzw -> Vec3,
);

swizzle!(IVec2 => I32,
    x: X -> I32,
    y: Y -> I32,
);

swizzle!(IVec3 => I32,
    x: X -> I32,
    y: Y -> I32,
    z: Z -> I32,
);

swizzle!(IVec4 => I32,
    x: X -> I32,
    y: Y -> I32,
    z: Z -> I32,
    w: W -> I32,
    xyz: Xyz -> IVec3,
);

swizzle!(UVec2 => U32,
    x: X -> U32,
    y: Y -> U32,
);

swizzle!(UVec3 => U32,
    x: X -> U32,
    y: Y -> U32,
    z: Z -> U32,
);

swizzle!(UVec4 => U32,
    x: X -> U32,
    y: Y -> U32,
    z: Z -> U32,
    w: W -> U32,
    xyz: Xyz -> UVec3,
);
