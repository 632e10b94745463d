//! The typed recording surface.
//!
//! DSL values are small `Copy` handles carrying the pool index at which the
//! value materialized. Arithmetic, comparisons, swizzles, construction and
//! assignment record atoms into the active emitter as a side effect, so a
//! plain Rust expression over these types writes the shader's IR in
//! evaluation order.

pub mod aggregate;
pub mod control;
pub mod intrinsics;
pub mod layout;
pub mod matrix;
pub mod scalar;
pub mod vector;

pub use aggregate::{construct, field, AggregateLayout, Composite};
pub use control::{cond, elif, end, loop_while, otherwise, returns};
pub use intrinsics::*;
pub use layout::{
    local_size, trace_ray, AccelerationStructure, BufferReference, HitAttribute, Image2D, LayoutIn,
    LayoutOut, PushConstant, RayPayload, RayPayloadIn, Sampler2D, StorageBuffer, Uniform,
};
pub use matrix::{Mat2, Mat3, Mat4};
pub use scalar::{Boolean, F32, I32, U32};
pub use vector::{
    ivec2, ivec3, ivec4, uvec2, uvec3, uvec4, vec2, vec3, vec4, FloatValue, FloatVector, IVec2,
    IVec3, IVec4, UVec2, UVec3, UVec4, Vec2, Vec3, Vec4,
};

use smallvec::SmallVec;

use crate::emitter::Emitter;
use crate::ir::{Index, Scalar};

/// Types that can describe themselves in the IR.
///
/// `type_index` records the type's `TypeField` chain into the active buffer
/// and returns its head; `from_base` materializes a host-side handle over a
/// value already present at `base` (identity for plain values, per-field
/// loads for aggregates).
pub trait ShaderType: Sized {
    fn type_index() -> Index;
    fn from_base(base: Index) -> Self;
}

/// Plain single-index values: scalars, vectors, matrices.
pub trait Value: ShaderType + Copy {
    fn from_index(index: Index) -> Self;
    fn index(&self) -> Index;
}

/// Anything accepted where a recorded operand is expected. Host literals
/// record a `Primitive` atom at the use site.
pub trait ScalarArg {
    fn record(self) -> Index;
}

impl ScalarArg for f32 {
    fn record(self) -> Index {
        Emitter::emit_primitive(Scalar::Float(self))
    }
}

impl ScalarArg for f64 {
    fn record(self) -> Index {
        Emitter::emit_primitive(Scalar::Double(self))
    }
}

impl ScalarArg for i32 {
    fn record(self) -> Index {
        Emitter::emit_primitive(Scalar::Int(self))
    }
}

impl ScalarArg for u32 {
    fn record(self) -> Index {
        Emitter::emit_primitive(Scalar::UInt(self))
    }
}

impl ScalarArg for bool {
    fn record(self) -> Index {
        Emitter::emit_primitive(Scalar::Bool(self))
    }
}

/// Argument tuples for constructors, calls and intrinsics.
pub trait ArgPack {
    fn record(self, out: &mut SmallVec<[Index; 8]>);
}

impl ArgPack for () {
    fn record(self, _: &mut SmallVec<[Index; 8]>) {}
}

macro_rules! arg_pack_tuple {
    ($($name:ident),+) => {
        #[allow(non_snake_case)]
        impl<$($name: ScalarArg),+> ArgPack for ($($name,)+) {
            fn record(self, out: &mut SmallVec<[Index; 8]>) {
                let ($($name,)+) = self;
                $(out.push($name.record());)+
            }
        }
    };
}

arg_pack_tuple!(A);
arg_pack_tuple!(A, B);
arg_pack_tuple!(A, B, C);
arg_pack_tuple!(A, B, C, D);
arg_pack_tuple!(A, B, C, D, E);
arg_pack_tuple!(A, B, C, D, E, G);

/// Records an argument pack as a list chain, returning the head.
pub(crate) fn record_args(args: impl ArgPack) -> Index {
    let mut indices = SmallVec::new();
    args.record(&mut indices);
    Emitter::emit_list_chain(&indices)
}

/// What a procedure body may evaluate to. Recording the return emits the
/// value's type chain and a `Return` atom; `()` means a void procedure.
pub trait ProcReturn {
    /// Returns the emitted return-type index, or [`crate::ir::NONE`].
    fn record_return(self) -> Index;
}

impl ProcReturn for () {
    fn record_return(self) -> Index {
        crate::ir::NONE
    }
}
