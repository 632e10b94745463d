//! The atomic instruction set.
//!
//! A recorded shader is a flat pool of [`Atom`]s. Every atom is addressed by
//! its position in the pool, and refers back to earlier atoms through plain
//! indices. `-1` ([`NONE`]) stands for "no reference"; control-flow `failto`
//! targets are the only indices allowed to point forward, and only after the
//! scope that opened them has been closed.

use smallvec::SmallVec;
use std::fmt;

use crate::transform::reindex::Reindex;

/// Position of an atom within a buffer. Negative values mean "none".
pub type Index = i32;

/// The "no reference" sentinel.
pub const NONE: Index = -1;

/// Formats an index as `%N`, or `(nil)` when absent.
pub(crate) struct Addr(pub Index);

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 >= 0 {
            write!(f, "%{}", self.0)
        } else {
            write!(f, "(nil)")
        }
    }
}

/// Primitive types expressible in a `TypeField` leaf.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, strum::IntoStaticStr)]
pub enum PrimitiveKind {
    #[strum(serialize = "bool")]
    Bool,
    #[strum(serialize = "int")]
    Int,
    #[strum(serialize = "uint")]
    UInt,
    #[strum(serialize = "float")]
    Float,
    #[strum(serialize = "double")]
    Double,
    #[strum(serialize = "vec2")]
    Vec2,
    #[strum(serialize = "vec3")]
    Vec3,
    #[strum(serialize = "vec4")]
    Vec4,
    #[strum(serialize = "ivec2")]
    IVec2,
    #[strum(serialize = "ivec3")]
    IVec3,
    #[strum(serialize = "ivec4")]
    IVec4,
    #[strum(serialize = "uvec2")]
    UVec2,
    #[strum(serialize = "uvec3")]
    UVec3,
    #[strum(serialize = "uvec4")]
    UVec4,
    #[strum(serialize = "bvec2")]
    BVec2,
    #[strum(serialize = "bvec3")]
    BVec3,
    #[strum(serialize = "bvec4")]
    BVec4,
    #[strum(serialize = "mat2")]
    Mat2,
    #[strum(serialize = "mat3")]
    Mat3,
    #[strum(serialize = "mat4")]
    Mat4,
}

impl PrimitiveKind {
    pub fn glsl_name(self) -> &'static str {
        self.into()
    }
}

/// Literal payload of a [`Atom::Primitive`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i32),
    UInt(u32),
    Float(f32),
    Double(f64),
}

impl Scalar {
    pub fn kind(self) -> PrimitiveKind {
        match self {
            Scalar::Bool(_) => PrimitiveKind::Bool,
            Scalar::Int(_) => PrimitiveKind::Int,
            Scalar::UInt(_) => PrimitiveKind::UInt,
            Scalar::Float(_) => PrimitiveKind::Float,
            Scalar::Double(_) => PrimitiveKind::Double,
        }
    }

    /// Minimal lossless literal form, shared by the dump and GLSL printers.
    pub fn literal(self) -> String {
        match self {
            Scalar::Bool(v) => v.to_string(),
            Scalar::Int(v) => v.to_string(),
            Scalar::UInt(v) => v.to_string(),
            Scalar::Float(v) => format!("{:?}", v),
            Scalar::Double(v) => format!("{:?}", v),
        }
    }
}

/// Operation codes for [`Atom::Operation`].
///
/// The swizzle projections exist so the molecule lowering can express a
/// `Swizzle` atom as a unary operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, strum::IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OpCode {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Neg,
    Subscript,
    SwzX,
    SwzY,
    SwzZ,
    SwzW,
}

impl OpCode {
    pub fn is_unary(self) -> bool {
        matches!(
            self,
            OpCode::Neg | OpCode::SwzX | OpCode::SwzY | OpCode::SwzZ | OpCode::SwzW
        )
    }

    /// GLSL spelling of a binary operator.
    pub fn glsl_symbol(self) -> Option<&'static str> {
        Some(match self {
            OpCode::Add => "+",
            OpCode::Sub => "-",
            OpCode::Mul => "*",
            OpCode::Div => "/",
            OpCode::Mod => "%",
            OpCode::BitAnd => "&",
            OpCode::BitOr => "|",
            OpCode::BitXor => "^",
            OpCode::Shl => "<<",
            OpCode::Shr => ">>",
            OpCode::And => "&&",
            OpCode::Or => "||",
            OpCode::Eq => "==",
            OpCode::Ne => "!=",
            OpCode::Lt => "<",
            OpCode::Le => "<=",
            OpCode::Gt => ">",
            OpCode::Ge => ">=",
            _ => return None,
        })
    }

    /// Binding strength, `* / %` tightest. Binary operators only.
    pub fn precedence(self) -> Option<u8> {
        Some(match self {
            OpCode::Mul | OpCode::Div | OpCode::Mod => 7,
            OpCode::Add | OpCode::Sub => 6,
            OpCode::Shl | OpCode::Shr => 5,
            OpCode::Lt | OpCode::Le | OpCode::Gt | OpCode::Ge | OpCode::Eq | OpCode::Ne => 4,
            OpCode::BitAnd => 3,
            OpCode::BitXor => 3,
            OpCode::BitOr => 3,
            OpCode::And => 2,
            OpCode::Or => 1,
            _ => return None,
        })
    }
}

/// Component projections for [`Atom::Swizzle`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum SwizzleCode {
    X,
    Y,
    Z,
    W,
    Xy,
    Xz,
    Yz,
    Zw,
    Xyz,
    Yzw,
    Xyzw,
}

impl SwizzleCode {
    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn component_count(self) -> usize {
        match self {
            SwizzleCode::X | SwizzleCode::Y | SwizzleCode::Z | SwizzleCode::W => 1,
            SwizzleCode::Xy | SwizzleCode::Xz | SwizzleCode::Yz | SwizzleCode::Zw => 2,
            SwizzleCode::Xyz | SwizzleCode::Yzw => 3,
            SwizzleCode::Xyzw => 4,
        }
    }
}

/// Boundary-declaration categories for [`Atom::Qualifier`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum QualifierKind {
    LayoutInSmooth,
    LayoutInFlat,
    LayoutOutSmooth,
    LayoutOutFlat,
    PushConstant,
    Uniform,
    StorageBufferRead,
    StorageBufferWrite,
    BufferReference,
    RayPayload,
    RayPayloadIn,
    HitAttribute,
    #[strum(serialize = "image2D")]
    Image2D,
    #[strum(serialize = "sampler2D")]
    Sampler2D,
    AccelerationStructure,
    #[strum(serialize = "parameter")]
    Parameter(u32),
    LocalSize,
}

impl QualifierKind {
    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn is_layout_in(self) -> bool {
        matches!(self, QualifierKind::LayoutInSmooth | QualifierKind::LayoutInFlat)
    }

    pub fn is_layout_out(self) -> bool {
        matches!(self, QualifierKind::LayoutOutSmooth | QualifierKind::LayoutOutFlat)
    }

    /// Opaque qualifiers have no underlying data type in GLSL.
    pub fn is_opaque(self) -> bool {
        matches!(
            self,
            QualifierKind::Sampler2D | QualifierKind::Image2D | QualifierKind::AccelerationStructure
        )
    }
}

/// Intrinsic identifiers, spelled the way GLSL spells them.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, strum::IntoStaticStr)]
pub enum IntrinsicKind {
    #[strum(serialize = "dot")]
    Dot,
    #[strum(serialize = "normalize")]
    Normalize,
    #[strum(serialize = "length")]
    Length,
    #[strum(serialize = "cross")]
    Cross,
    #[strum(serialize = "reflect")]
    Reflect,
    #[strum(serialize = "pow")]
    Pow,
    #[strum(serialize = "sqrt")]
    Sqrt,
    #[strum(serialize = "abs")]
    Abs,
    #[strum(serialize = "floor")]
    Floor,
    #[strum(serialize = "ceil")]
    Ceil,
    #[strum(serialize = "fract")]
    Fract,
    #[strum(serialize = "sin")]
    Sin,
    #[strum(serialize = "cos")]
    Cos,
    #[strum(serialize = "tan")]
    Tan,
    #[strum(serialize = "exp")]
    Exp,
    #[strum(serialize = "log")]
    Log,
    #[strum(serialize = "min")]
    Min,
    #[strum(serialize = "max")]
    Max,
    #[strum(serialize = "clamp")]
    Clamp,
    #[strum(serialize = "mix")]
    Mix,
    #[strum(serialize = "dFdx")]
    DFdx,
    #[strum(serialize = "dFdy")]
    DFdy,
    #[strum(serialize = "dFdxFine")]
    DFdxFine,
    #[strum(serialize = "dFdyFine")]
    DFdyFine,
    #[strum(serialize = "floatBitsToInt")]
    FloatBitsToInt,
    #[strum(serialize = "floatBitsToUint")]
    FloatBitsToUint,
    #[strum(serialize = "intBitsToFloat")]
    IntBitsToFloat,
    #[strum(serialize = "uintBitsToFloat")]
    UintBitsToFloat,
    #[strum(serialize = "texture")]
    Texture,
    #[strum(serialize = "texelFetch")]
    TexelFetch,
    #[strum(serialize = "imageLoad")]
    ImageLoad,
    #[strum(serialize = "imageStore")]
    ImageStore,
    #[strum(serialize = "traceRayEXT")]
    TraceRay,
}

impl IntrinsicKind {
    pub fn glsl_name(self) -> &'static str {
        self.into()
    }

    /// Intrinsics invoked for their effect; they become statements.
    pub fn is_statement(self) -> bool {
        matches!(self, IntrinsicKind::ImageStore | IntrinsicKind::TraceRay)
    }
}

/// How a [`Atom::Construct`] materializes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ConstructMode {
    /// Folds into the consuming expression (or names a boundary value).
    Transient,
    /// Declares a named local.
    Normal,
    /// Declares a named local without an initializer.
    Forward,
}

/// One IR instruction.
#[derive(Clone, Debug, PartialEq)]
pub enum Atom {
    /// Either a primitive leaf (`item` set) or one link of a structure's
    /// field chain (`down` to the field type, `next` to the next field).
    TypeField {
        item: Option<PrimitiveKind>,
        down: Index,
        next: Index,
    },
    /// A boundary declaration over an underlying type.
    Qualifier {
        underlying: Index,
        binding: u32,
        kind: QualifierKind,
    },
    /// A literal.
    Primitive(Scalar),
    /// Produces a value of `ty`, optionally from an argument list chain.
    Construct {
        ty: Index,
        args: Index,
        mode: ConstructMode,
    },
    /// Argument/field pack link.
    List { item: Index, next: Index },
    /// Invocation of another recorded procedure.
    Call { callable: u32, args: Index, ret: Index },
    /// Unary (`b == NONE`) or binary operation.
    Operation { a: Index, b: Index, code: OpCode },
    /// Component projection.
    Swizzle { src: Index, code: SwizzleCode },
    /// Assignment.
    Store { dst: Index, src: Index },
    /// Field access; `idx` is the field ordinal (not a pool address), or
    /// `NONE` for a plain load. Dynamic subscripts use
    /// [`OpCode::Subscript`].
    Load { src: Index, idx: Index },
    /// A GLSL built-in applied to an argument list chain.
    Intrinsic {
        args: Index,
        kind: IntrinsicKind,
        ret: Index,
    },
    /// Opens an `if` scope; `failto` is patched to the closing atom.
    Cond { cond: Index, failto: Index },
    /// Opens an `else if` (`cond >= 0`) or `else` (`cond == NONE`) scope.
    Elif { cond: Index, failto: Index },
    /// Opens a loop scope.
    While { cond: Index, failto: Index },
    /// Returns `value` (or nothing when `value == NONE`) of type `ty`.
    Return { value: Index, ty: Index },
    /// Closes the most recent unclosed scope.
    End,
}

impl Atom {
    /// Every pool index this atom stores, `failto` targets included.
    pub fn addresses(&self) -> SmallVec<[Index; 4]> {
        let mut out = SmallVec::new();
        let mut push = |i: Index| {
            if i >= 0 {
                out.push(i);
            }
        };

        match *self {
            Atom::TypeField { down, next, .. } => {
                push(down);
                push(next);
            }
            Atom::Qualifier { underlying, .. } => push(underlying),
            Atom::Primitive(_) | Atom::End => {}
            Atom::Construct { ty, args, .. } => {
                push(ty);
                push(args);
            }
            Atom::List { item, next } => {
                push(item);
                push(next);
            }
            Atom::Call { args, ret, .. } => {
                push(args);
                push(ret);
            }
            Atom::Operation { a, b, .. } => {
                push(a);
                push(b);
            }
            Atom::Swizzle { src, .. } => push(src),
            Atom::Store { dst, src } => {
                push(dst);
                push(src);
            }
            // `idx` is a field ordinal, not a pool address.
            Atom::Load { src, .. } => push(src),
            Atom::Intrinsic { args, ret, .. } => {
                push(args);
                push(ret);
            }
            Atom::Cond { cond, failto } | Atom::Elif { cond, failto } | Atom::While { cond, failto } => {
                push(cond);
                push(failto);
            }
            Atom::Return { value, ty } => {
                push(value);
                push(ty);
            }
        }

        out
    }

    /// Remaps every index-bearing field present in `map`.
    pub fn reindex(&mut self, map: &Reindex) {
        match self {
            Atom::TypeField { down, next, .. } => {
                map.remap(down);
                map.remap(next);
            }
            Atom::Qualifier { underlying, .. } => map.remap(underlying),
            Atom::Primitive(_) | Atom::End => {}
            Atom::Construct { ty, args, .. } => {
                map.remap(ty);
                map.remap(args);
            }
            Atom::List { item, next } => {
                map.remap(item);
                map.remap(next);
            }
            Atom::Call { args, ret, .. } => {
                map.remap(args);
                map.remap(ret);
            }
            Atom::Operation { a, b, .. } => {
                map.remap(a);
                map.remap(b);
            }
            Atom::Swizzle { src, .. } => map.remap(src),
            Atom::Store { dst, src } => {
                map.remap(dst);
                map.remap(src);
            }
            Atom::Load { src, .. } => map.remap(src),
            Atom::Intrinsic { args, ret, .. } => {
                map.remap(args);
                map.remap(ret);
            }
            Atom::Cond { cond, failto } | Atom::Elif { cond, failto } | Atom::While { cond, failto } => {
                map.remap(cond);
                map.remap(failto);
            }
            Atom::Return { value, ty } => {
                map.remap(value);
                map.remap(ty);
            }
        }
    }

    pub fn is_control_flow(&self) -> bool {
        matches!(
            self,
            Atom::Cond { .. } | Atom::Elif { .. } | Atom::While { .. } | Atom::End
        )
    }

    /// Short tag used in diagnostics.
    pub fn tag(&self) -> &'static str {
        match self {
            Atom::TypeField { .. } => "type",
            Atom::Qualifier { .. } => "global",
            Atom::Primitive(_) => "primitive",
            Atom::Construct { .. } => "construct",
            Atom::List { .. } => "list",
            Atom::Call { .. } => "call",
            Atom::Operation { .. } => "op",
            Atom::Swizzle { .. } => "swizzle",
            Atom::Store { .. } => "store",
            Atom::Load { .. } => "load",
            Atom::Intrinsic { .. } => "intr",
            Atom::Cond { .. } => "cond",
            Atom::Elif { .. } => "elif",
            Atom::While { .. } => "while",
            Atom::Return { .. } => "return",
            Atom::End => "end",
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Atom::Qualifier {
                underlying,
                binding,
                kind,
            } => write!(f, "global: {} = ({}, {})", Addr(underlying), kind.name(), binding),
            Atom::TypeField { item, down, next } => {
                write!(f, "type: ")?;
                if let Some(item) = item {
                    write!(f, "{}", item.glsl_name())?;
                } else if down >= 0 {
                    write!(f, "%{}", down)?;
                } else {
                    write!(f, "<BAD>")?;
                }
                write!(f, " -> {}", Addr(next))
            }
            Atom::Primitive(scalar) => {
                write!(f, "primitive: {} = {}", scalar.kind().glsl_name(), scalar.literal())
            }
            Atom::List { item, next } => write!(f, "list: {} -> {}", Addr(item), Addr(next)),
            Atom::Construct { ty, args, .. } => write!(f, "construct: {} = {}", Addr(ty), Addr(args)),
            Atom::Call { callable, args, ret } => {
                write!(f, "call ${}: {} -> {}", callable, Addr(args), Addr(ret))
            }
            Atom::Store { dst, src } => write!(f, "store {} -> {}", Addr(src), Addr(dst)),
            Atom::Load { src, idx } => write!(f, "load {} #{}", Addr(src), idx),
            Atom::Swizzle { src, code } => write!(f, "swizzle {} #{}", Addr(src), code.name()),
            Atom::Operation { a, b, code } => {
                let name: &'static str = code.into();
                write!(f, "op ${} {} -> {}", name, Addr(a), Addr(b))
            }
            Atom::Intrinsic { args, kind, ret } => {
                write!(f, "intr ${} {} -> {}", kind.glsl_name(), Addr(args), Addr(ret))
            }
            Atom::Cond { cond, failto } => write!(f, "cond {} -> {}", Addr(cond), Addr(failto)),
            Atom::Elif { cond, failto } => write!(f, "elif {} -> {}", Addr(cond), Addr(failto)),
            Atom::While { cond, failto } => write!(f, "while {} -> {}", Addr(cond), Addr(failto)),
            Atom::Return { value, ty } => write!(f, "return {} -> {}", Addr(value), Addr(ty)),
            Atom::End => write!(f, "end"),
        }
    }
}
