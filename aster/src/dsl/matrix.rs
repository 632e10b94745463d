//! Matrix value types.

use crate::dsl::scalar::{binary, shader_value};
use crate::dsl::vector::{Vec2, Vec3, Vec4};
use crate::dsl::{ProcReturn, ScalarArg, ShaderType, Value};
use crate::emitter::Emitter;
use crate::ir::{Index, OpCode, PrimitiveKind};

shader_value!(Mat2, PrimitiveKind::Mat2);
shader_value!(Mat3, PrimitiveKind::Mat3);
shader_value!(Mat4, PrimitiveKind::Mat4);

macro_rules! matrix_ops {
    ($mat:ident * $vec:ident) => {
        impl std::ops::Mul for $mat {
            type Output = $mat;
            fn mul(self, rhs: $mat) -> $mat {
                binary(self.index(), rhs.index(), OpCode::Mul)
            }
        }

        impl std::ops::Mul<$vec> for $mat {
            type Output = $vec;
            fn mul(self, rhs: $vec) -> $vec {
                binary(self.index(), rhs.index(), OpCode::Mul)
            }
        }

        impl std::ops::Add for $mat {
            type Output = $mat;
            fn add(self, rhs: $mat) -> $mat {
                binary(self.index(), rhs.index(), OpCode::Add)
            }
        }

        impl $mat {
            pub fn set(&self, rhs: $mat) {
                Emitter::emit_store(self.index(), rhs.index());
            }
        }
    };
}

matrix_ops!(Mat2 * Vec2);
matrix_ops!(Mat3 * Vec3);
matrix_ops!(Mat4 * Vec4);
