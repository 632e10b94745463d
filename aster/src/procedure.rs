//! Named, signature-bearing recordings.

use std::sync::atomic::{AtomicU32, Ordering};

use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::buffer::Buffer;
use crate::dsl::{ArgPack, ProcReturn, ShaderType, Value};
use crate::emitter::{Emitter, RecordingScope};
use crate::ir::{ConstructMode, Index, QualifierKind, NONE};

static NEXT_CALLABLE: AtomicU32 = AtomicU32::new(0);

/// A compiled recording: the buffer plus name, parameter signature and
/// return type, ready for transformation and linking.
#[derive(Clone, Debug)]
pub struct Procedure {
    pub name: SmolStr,
    pub buffer: Buffer,
    /// Parameter type indices, in slot order.
    pub parameters: Vec<Index>,
    /// Return type index, or [`NONE`] for void.
    pub returns: Index,
    /// Process-unique callable handle stored by `Call` atoms.
    pub id: u32,
}

fn parameter<T: ShaderType>(slot: u32) -> (T, Index) {
    let ty = T::type_index();
    let qualifier = Emitter::emit_qualifier(ty, slot, QualifierKind::Parameter(slot));
    let base = Emitter::emit_construct(qualifier, NONE, ConstructMode::Transient);
    (T::from_base(base), ty)
}

/// Parameter tuples a procedure body may accept.
pub trait ParameterPack: Sized {
    fn materialize() -> (Self, Vec<Index>);
}

impl ParameterPack for () {
    fn materialize() -> (Self, Vec<Index>) {
        ((), Vec::new())
    }
}

macro_rules! parameter_pack {
    ($($name:ident : $slot:expr),+) => {
        #[allow(non_snake_case)]
        impl<$($name: ShaderType),+> ParameterPack for ($($name,)+) {
            fn materialize() -> (Self, Vec<Index>) {
                let mut types = Vec::new();
                $(
                    let ($name, ty) = parameter::<$name>($slot);
                    types.push(ty);
                )+
                (($($name,)+), types)
            }
        }
    };
}

parameter_pack!(A: 0);
parameter_pack!(A: 0, B: 1);
parameter_pack!(A: 0, B: 1, C: 2);
parameter_pack!(A: 0, B: 1, C: 2, D: 3);

/// Closures usable as procedure bodies, keyed by their parameter tuple.
pub trait BodyFn<Args> {
    type Ret: ProcReturn;

    fn invoke(self, args: Args) -> Self::Ret;
}

impl<F, R> BodyFn<()> for F
where
    F: FnOnce() -> R,
    R: ProcReturn,
{
    type Ret = R;

    fn invoke(self, _: ()) -> R {
        self()
    }
}

macro_rules! body_fn {
    ($($name:ident),+) => {
        #[allow(non_snake_case)]
        impl<F, R, $($name),+> BodyFn<($($name,)+)> for F
        where
            F: FnOnce($($name),+) -> R,
            R: ProcReturn,
        {
            type Ret = R;

            fn invoke(self, ($($name,)+): ($($name,)+)) -> R {
                self($($name),+)
            }
        }
    };
}

body_fn!(A);
body_fn!(A, B);
body_fn!(A, B, C);
body_fn!(A, B, C, D);

/// Records `body` into a fresh buffer under `name`.
///
/// Parameters materialize as `parameter(i)` qualifiers in slot order; the
/// body's return value records the trailing `Return`. The emitter stack is
/// unwound even if the body panics.
pub fn procedure<Args, F>(name: &str, body: F) -> Procedure
where
    Args: ParameterPack,
    F: BodyFn<Args>,
{
    let scope = RecordingScope::new();
    let (args, parameters) = Args::materialize();
    let returns = body.invoke(args).record_return();
    let buffer = scope.finish();

    Procedure {
        name: name.into(),
        buffer,
        parameters,
        returns,
        id: NEXT_CALLABLE.fetch_add(1, Ordering::Relaxed),
    }
}

/// Records an invocation of a previously recorded procedure.
pub fn call<R: Value>(procedure: &Procedure, args: impl ArgPack) -> R {
    let mut indices = SmallVec::new();
    args.record(&mut indices);
    let list = Emitter::emit_list_chain(&indices);
    let ret = R::type_index();
    R::from_index(Emitter::emit_call(procedure.id, list, ret))
}
