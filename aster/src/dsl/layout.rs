//! Boundary declarations: layout IO, constants, buffers, samplers and the
//! ray-tracing interface.
//!
//! Construction of any of these records the underlying type chain, a
//! `Qualifier` atom, and a transient `Construct` over the qualifier; the
//! construct index is the value the rest of the recording refers to.

use std::marker::PhantomData;

use crate::dsl::vector::{Vec2, Vec3, Vec4};
use crate::dsl::{IVec2, ScalarArg, ShaderType, Value, I32};
use crate::emitter::Emitter;
use crate::ir::{ConstructMode, Index, IntrinsicKind, OpCode, PrimitiveKind, QualifierKind, NONE};

fn bound_value<T: ShaderType>(binding: u32, kind: QualifierKind) -> (T, Index) {
    let ty = T::type_index();
    let qualifier = Emitter::emit_qualifier(ty, binding, kind);
    let base = Emitter::emit_construct(qualifier, NONE, ConstructMode::Transient);
    (T::from_base(base), base)
}

/// An interpolated (or `flat`) stage input.
#[derive(Copy, Clone)]
pub struct LayoutIn<T: Value> {
    value: T,
}

impl<T: Value> LayoutIn<T> {
    pub fn new(binding: u32) -> LayoutIn<T> {
        let (value, _) = bound_value(binding, QualifierKind::LayoutInSmooth);
        LayoutIn { value }
    }

    pub fn flat(binding: u32) -> LayoutIn<T> {
        let (value, _) = bound_value(binding, QualifierKind::LayoutInFlat);
        LayoutIn { value }
    }

    pub fn get(&self) -> T {
        self.value
    }
}

/// A stage output; assignment goes through [`LayoutOut::set`].
#[derive(Copy, Clone)]
pub struct LayoutOut<T: Value> {
    value: T,
}

impl<T: Value> LayoutOut<T> {
    pub fn new(binding: u32) -> LayoutOut<T> {
        let (value, _) = bound_value(binding, QualifierKind::LayoutOutSmooth);
        LayoutOut { value }
    }

    pub fn flat(binding: u32) -> LayoutOut<T> {
        let (value, _) = bound_value(binding, QualifierKind::LayoutOutFlat);
        LayoutOut { value }
    }

    pub fn set(&self, value: T) {
        Emitter::emit_store(self.value.index(), value.index());
    }

    pub fn get(&self) -> T {
        self.value
    }
}

/// Push-constant block contents.
pub struct PushConstant<T: ShaderType> {
    value: T,
}

impl<T: ShaderType> PushConstant<T> {
    pub fn new(offset: u32) -> PushConstant<T> {
        let (value, _) = bound_value(offset, QualifierKind::PushConstant);
        PushConstant { value }
    }
}

impl<T: ShaderType> std::ops::Deref for PushConstant<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

/// A uniform block with a single member of `T`.
pub struct Uniform<T: ShaderType> {
    value: T,
}

impl<T: ShaderType> Uniform<T> {
    pub fn new(binding: u32) -> Uniform<T> {
        let (value, _) = bound_value(binding, QualifierKind::Uniform);
        Uniform { value }
    }
}

impl<T: ShaderType> std::ops::Deref for Uniform<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

/// A buffer-reference block (`GL_EXT_buffer_reference`).
pub struct BufferReference<T: ShaderType> {
    value: T,
}

impl<T: ShaderType> BufferReference<T> {
    pub fn new(binding: u32) -> BufferReference<T> {
        let (value, _) = bound_value(binding, QualifierKind::BufferReference);
        BufferReference { value }
    }
}

impl<T: ShaderType> std::ops::Deref for BufferReference<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

/// An unsized storage-buffer array of `T`.
#[derive(Copy, Clone)]
pub struct StorageBuffer<T: Value> {
    index: Index,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Value> StorageBuffer<T> {
    pub fn read(binding: u32) -> StorageBuffer<T> {
        StorageBuffer::with(binding, QualifierKind::StorageBufferRead)
    }

    pub fn write(binding: u32) -> StorageBuffer<T> {
        StorageBuffer::with(binding, QualifierKind::StorageBufferWrite)
    }

    fn with(binding: u32, kind: QualifierKind) -> StorageBuffer<T> {
        let ty = T::type_index();
        let qualifier = Emitter::emit_qualifier(ty, binding, kind);
        let index = Emitter::emit_construct(qualifier, NONE, ConstructMode::Transient);
        StorageBuffer {
            index,
            _marker: PhantomData,
        }
    }

    pub fn load(&self, at: impl ScalarArg) -> T {
        let at = at.record();
        T::from_index(Emitter::emit_operation(self.index, at, OpCode::Subscript))
    }

    pub fn store(&self, at: impl ScalarArg, value: T) {
        let at = at.record();
        let slot = Emitter::emit_operation(self.index, at, OpCode::Subscript);
        Emitter::emit_store(slot, value.index());
    }
}

/// A combined texture/sampler binding.
#[derive(Copy, Clone)]
pub struct Sampler2D {
    index: Index,
}

impl Sampler2D {
    pub fn new(binding: u32) -> Sampler2D {
        let ty = Emitter::emit_primitive_type(PrimitiveKind::Vec4);
        let qualifier = Emitter::emit_qualifier(ty, binding, QualifierKind::Sampler2D);
        let index = Emitter::emit_construct(qualifier, NONE, ConstructMode::Transient);
        Sampler2D { index }
    }

    pub fn sample(&self, uv: Vec2) -> Vec4 {
        let list = Emitter::emit_list_chain(&[self.index, uv.index()]);
        let ret = Vec4::type_index();
        Vec4::from_index(Emitter::emit_intrinsic(list, IntrinsicKind::Texture, ret))
    }

    pub fn fetch(&self, coord: IVec2, lod: I32) -> Vec4 {
        let list = Emitter::emit_list_chain(&[self.index, coord.index(), lod.index()]);
        let ret = Vec4::type_index();
        Vec4::from_index(Emitter::emit_intrinsic(list, IntrinsicKind::TexelFetch, ret))
    }
}

/// A storage image binding.
#[derive(Copy, Clone)]
pub struct Image2D {
    index: Index,
}

impl Image2D {
    pub fn new(binding: u32) -> Image2D {
        let ty = Emitter::emit_primitive_type(PrimitiveKind::Vec4);
        let qualifier = Emitter::emit_qualifier(ty, binding, QualifierKind::Image2D);
        let index = Emitter::emit_construct(qualifier, NONE, ConstructMode::Transient);
        Image2D { index }
    }

    pub fn load(&self, coord: IVec2) -> Vec4 {
        let list = Emitter::emit_list_chain(&[self.index, coord.index()]);
        let ret = Vec4::type_index();
        Vec4::from_index(Emitter::emit_intrinsic(list, IntrinsicKind::ImageLoad, ret))
    }

    pub fn store(&self, coord: IVec2, value: Vec4) {
        let list = Emitter::emit_list_chain(&[self.index, coord.index(), value.index()]);
        Emitter::emit_intrinsic(list, IntrinsicKind::ImageStore, NONE);
    }
}

/// A ray payload written by closest-hit and miss stages.
#[derive(Copy, Clone)]
pub struct RayPayload<T: Value> {
    value: T,
    location: u32,
}

impl<T: Value> RayPayload<T> {
    pub fn new(location: u32) -> RayPayload<T> {
        let (value, _) = bound_value(location, QualifierKind::RayPayload);
        RayPayload { value, location }
    }

    pub fn location(&self) -> u32 {
        self.location
    }

    pub fn set(&self, value: T) {
        Emitter::emit_store(self.value.index(), value.index());
    }

    pub fn get(&self) -> T {
        self.value
    }
}

/// The incoming payload of the current ray.
#[derive(Copy, Clone)]
pub struct RayPayloadIn<T: Value> {
    value: T,
}

impl<T: Value> RayPayloadIn<T> {
    pub fn new(location: u32) -> RayPayloadIn<T> {
        let (value, _) = bound_value(location, QualifierKind::RayPayloadIn);
        RayPayloadIn { value }
    }

    pub fn set(&self, value: T) {
        Emitter::emit_store(self.value.index(), value.index());
    }

    pub fn get(&self) -> T {
        self.value
    }
}

/// Intersection attributes handed to hit shaders.
#[derive(Copy, Clone)]
pub struct HitAttribute<T: Value> {
    value: T,
}

impl<T: Value> HitAttribute<T> {
    pub fn new() -> HitAttribute<T> {
        let (value, _) = bound_value(0, QualifierKind::HitAttribute);
        HitAttribute { value }
    }

    pub fn get(&self) -> T {
        self.value
    }
}

impl<T: Value> Default for HitAttribute<T> {
    fn default() -> Self {
        HitAttribute::new()
    }
}

/// A top-level acceleration structure binding.
#[derive(Copy, Clone)]
pub struct AccelerationStructure {
    index: Index,
}

impl AccelerationStructure {
    pub fn new(binding: u32) -> AccelerationStructure {
        let ty = Emitter::emit_primitive_type(PrimitiveKind::UInt);
        let qualifier = Emitter::emit_qualifier(ty, binding, QualifierKind::AccelerationStructure);
        let index = Emitter::emit_construct(qualifier, NONE, ConstructMode::Transient);
        AccelerationStructure { index }
    }

    pub fn index(&self) -> Index {
        self.index
    }
}

/// Records a `traceRayEXT` invocation against `tlas`.
#[allow(clippy::too_many_arguments)]
pub fn trace_ray(
    tlas: &AccelerationStructure,
    flags: u32,
    cull_mask: u32,
    sbt_offset: u32,
    sbt_stride: u32,
    miss_index: u32,
    origin: Vec3,
    tmin: impl ScalarArg,
    direction: Vec3,
    tmax: impl ScalarArg,
    payload: u32,
) {
    let args = [
        tlas.index,
        flags.record(),
        cull_mask.record(),
        sbt_offset.record(),
        sbt_stride.record(),
        miss_index.record(),
        origin.index(),
        tmin.record(),
        direction.index(),
        tmax.record(),
        payload.record(),
    ];
    let list = Emitter::emit_list_chain(&args);
    Emitter::emit_intrinsic(list, IntrinsicKind::TraceRay, NONE);
}

/// Declares the compute workgroup width.
pub fn local_size(x: u32) {
    Emitter::emit_qualifier(NONE, x, QualifierKind::LocalSize);
}
