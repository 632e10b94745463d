//! Scalar value types.

use crate::dsl::{ProcReturn, ScalarArg, ShaderType, Value};
use crate::emitter::Emitter;
use crate::ir::{Index, OpCode, PrimitiveKind, Scalar};

macro_rules! shader_value {
    ($ty:ident, $kind:expr) => {
        #[derive(Copy, Clone, Debug)]
        pub struct $ty {
            index: Index,
        }

        impl ShaderType for $ty {
            fn type_index() -> Index {
                Emitter::emit_primitive_type($kind)
            }

            fn from_base(base: Index) -> Self {
                $ty { index: base }
            }
        }

        impl Value for $ty {
            fn from_index(index: Index) -> Self {
                $ty { index }
            }

            fn index(&self) -> Index {
                self.index
            }
        }

        impl ScalarArg for $ty {
            fn record(self) -> Index {
                self.index
            }
        }

        impl ProcReturn for $ty {
            fn record_return(self) -> Index {
                let ty = <$ty as ShaderType>::type_index();
                Emitter::emit_return(self.index, ty);
                ty
            }
        }
    };
}

pub(crate) use shader_value;

shader_value!(F32, PrimitiveKind::Float);
shader_value!(I32, PrimitiveKind::Int);
shader_value!(U32, PrimitiveKind::UInt);
shader_value!(Boolean, PrimitiveKind::Bool);

pub(crate) fn binary<V: Value>(a: Index, b: Index, code: OpCode) -> V {
    V::from_index(Emitter::emit_operation(a, b, code))
}

/// Same-type and host-literal arithmetic for one scalar wrapper.
macro_rules! scalar_binary_ops {
    ($ty:ident, $host:ty, $($trait:ident :: $method:ident => $code:expr),+ $(,)?) => {
        $(
            impl std::ops::$trait for $ty {
                type Output = $ty;
                fn $method(self, rhs: $ty) -> $ty {
                    binary(self.index(), rhs.index(), $code)
                }
            }

            impl std::ops::$trait<$host> for $ty {
                type Output = $ty;
                fn $method(self, rhs: $host) -> $ty {
                    let rhs = ScalarArg::record(rhs);
                    binary(self.index(), rhs, $code)
                }
            }

            impl std::ops::$trait<$ty> for $host {
                type Output = $ty;
                fn $method(self, rhs: $ty) -> $ty {
                    let lhs = ScalarArg::record(self);
                    binary(lhs, rhs.index(), $code)
                }
            }
        )+
    };
}

scalar_binary_ops!(F32, f32,
    Add::add => OpCode::Add,
    Sub::sub => OpCode::Sub,
    Mul::mul => OpCode::Mul,
    Div::div => OpCode::Div,
);

scalar_binary_ops!(I32, i32,
    Add::add => OpCode::Add,
    Sub::sub => OpCode::Sub,
    Mul::mul => OpCode::Mul,
    Div::div => OpCode::Div,
    Rem::rem => OpCode::Mod,
    Shl::shl => OpCode::Shl,
    Shr::shr => OpCode::Shr,
    BitAnd::bitand => OpCode::BitAnd,
    BitOr::bitor => OpCode::BitOr,
    BitXor::bitxor => OpCode::BitXor,
);

scalar_binary_ops!(U32, u32,
    Add::add => OpCode::Add,
    Sub::sub => OpCode::Sub,
    Mul::mul => OpCode::Mul,
    Div::div => OpCode::Div,
    Rem::rem => OpCode::Mod,
    Shl::shl => OpCode::Shl,
    Shr::shr => OpCode::Shr,
    BitAnd::bitand => OpCode::BitAnd,
    BitOr::bitor => OpCode::BitOr,
    BitXor::bitxor => OpCode::BitXor,
);

// `&` and `|` on booleans record the logical operators.
scalar_binary_ops!(Boolean, bool,
    BitAnd::bitand => OpCode::And,
    BitOr::bitor => OpCode::Or,
);

macro_rules! scalar_neg {
    ($ty:ident) => {
        impl std::ops::Neg for $ty {
            type Output = $ty;
            fn neg(self) -> $ty {
                $ty::from_index(Emitter::emit_operation(self.index(), crate::ir::NONE, OpCode::Neg))
            }
        }
    };
}

scalar_neg!(F32);
scalar_neg!(I32);

/// Comparison surface; Rust's comparison operators must return `bool`, so
/// these are methods yielding recorded [`Boolean`]s.
macro_rules! scalar_compare {
    ($ty:ident) => {
        impl $ty {
            pub fn lt(self, rhs: impl ScalarArg) -> Boolean {
                binary(self.index(), rhs.record(), OpCode::Lt)
            }

            pub fn le(self, rhs: impl ScalarArg) -> Boolean {
                binary(self.index(), rhs.record(), OpCode::Le)
            }

            pub fn gt(self, rhs: impl ScalarArg) -> Boolean {
                binary(self.index(), rhs.record(), OpCode::Gt)
            }

            pub fn ge(self, rhs: impl ScalarArg) -> Boolean {
                binary(self.index(), rhs.record(), OpCode::Ge)
            }

            pub fn eq_(self, rhs: impl ScalarArg) -> Boolean {
                binary(self.index(), rhs.record(), OpCode::Eq)
            }

            pub fn ne_(self, rhs: impl ScalarArg) -> Boolean {
                binary(self.index(), rhs.record(), OpCode::Ne)
            }
        }
    };
}

scalar_compare!(F32);
scalar_compare!(I32);
scalar_compare!(U32);

/// Explicit conversions record a transient constructor call, printed as
/// `float(x)` style casts.
fn convert<V: Value>(from: Index) -> V {
    let list = Emitter::emit_list_chain(&[from]);
    let ty = V::type_index();
    V::from_index(Emitter::emit_construct(
        ty,
        list,
        crate::ir::ConstructMode::Transient,
    ))
}

macro_rules! scalar_casts {
    ($ty:ident) => {
        impl $ty {
            pub fn to_f32(self) -> F32 {
                convert(self.index())
            }

            pub fn to_i32(self) -> I32 {
                convert(self.index())
            }

            pub fn to_u32(self) -> U32 {
                convert(self.index())
            }
        }
    };
}

scalar_casts!(F32);
scalar_casts!(I32);
scalar_casts!(U32);

impl F32 {
    /// Records a float literal.
    pub fn lit(value: f32) -> F32 {
        F32::from_index(Emitter::emit_primitive(Scalar::Float(value)))
    }
}

impl I32 {
    pub fn lit(value: i32) -> I32 {
        I32::from_index(Emitter::emit_primitive(Scalar::Int(value)))
    }
}

impl U32 {
    pub fn lit(value: u32) -> U32 {
        U32::from_index(Emitter::emit_primitive(Scalar::UInt(value)))
    }
}

impl Boolean {
    pub fn lit(value: bool) -> Boolean {
        Boolean::from_index(Emitter::emit_primitive(Scalar::Bool(value)))
    }
}
