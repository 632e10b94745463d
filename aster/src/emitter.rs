//! The recording target stack.
//!
//! Every DSL expression records atoms as a side effect. The target of those
//! emissions is the top of a process-wide, thread-scoped stack of recording
//! frames; a frame owns its buffer together with the auxiliary stack of open
//! control-flow scopes awaiting their `failto` patch.

use std::cell::RefCell;

use crate::buffer::{Buffer, StructNames};
use crate::error::Error;
use crate::ir::{
    Atom, ConstructMode, Index, IntrinsicKind, OpCode, PrimitiveKind, QualifierKind, Scalar,
    SwizzleCode, NONE,
};

struct Frame {
    buffer: Buffer,
    /// Indices of branch atoms whose `failto` is still unpatched.
    branches: Vec<Index>,
}

thread_local! {
    static STACK: RefCell<Vec<Frame>> = RefCell::new(Vec::new());
}

/// Namespace for the thread-local emitter operations.
pub struct Emitter;

impl Emitter {
    /// Installs `buffer` as the active recording target.
    pub fn push(buffer: Buffer) {
        STACK.with(|stack| {
            stack.borrow_mut().push(Frame {
                buffer,
                branches: Vec::new(),
            })
        });
    }

    /// Removes and returns the active buffer.
    ///
    /// Panics when no recording is active; use [`Emitter::try_pop`] on
    /// cleanup paths that must not double-panic.
    pub fn pop() -> Buffer {
        Emitter::try_pop().expect("emitter stack underflow")
    }

    pub fn try_pop() -> Result<Buffer, Error> {
        STACK.with(|stack| {
            let frame = stack.borrow_mut().pop().ok_or(Error::EmitterStackUnderflow)?;
            if !frame.branches.is_empty() {
                tracing::warn!(
                    target: "aster::emitter",
                    open = frame.branches.len(),
                    "recording popped with unclosed control-flow scopes"
                );
            }
            Ok(frame.buffer)
        })
    }

    pub fn depth() -> usize {
        STACK.with(|stack| stack.borrow().len())
    }

    pub fn is_recording() -> bool {
        Emitter::depth() > 0
    }

    /// Runs `f` against the active buffer. Panics when nothing is recording.
    pub fn with<R>(f: impl FnOnce(&mut Buffer) -> R) -> R {
        STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            let frame = stack.last_mut().expect("no active recording buffer");
            f(&mut frame.buffer)
        })
    }

    pub fn emit(atom: Atom) -> Index {
        Emitter::with(|buffer| buffer.emit(atom))
    }

    pub fn emit_type_field(item: Option<PrimitiveKind>, down: Index, next: Index) -> Index {
        Emitter::emit(Atom::TypeField { item, down, next })
    }

    pub fn emit_primitive_type(item: PrimitiveKind) -> Index {
        Emitter::emit_type_field(Some(item), NONE, NONE)
    }

    pub fn emit_qualifier(underlying: Index, binding: u32, kind: QualifierKind) -> Index {
        Emitter::emit(Atom::Qualifier {
            underlying,
            binding,
            kind,
        })
    }

    pub fn emit_primitive(scalar: Scalar) -> Index {
        Emitter::emit(Atom::Primitive(scalar))
    }

    pub fn emit_construct(ty: Index, args: Index, mode: ConstructMode) -> Index {
        Emitter::emit(Atom::Construct { ty, args, mode })
    }

    pub fn emit_list(item: Index, next: Index) -> Index {
        Emitter::emit(Atom::List { item, next })
    }

    /// Chains `items` into list atoms, returning the head (or [`NONE`]).
    pub fn emit_list_chain(items: &[Index]) -> Index {
        let mut next = NONE;
        for &item in items.iter().rev() {
            next = Emitter::emit_list(item, next);
        }
        next
    }

    pub fn emit_call(callable: u32, args: Index, ret: Index) -> Index {
        Emitter::emit(Atom::Call { callable, args, ret })
    }

    pub fn emit_operation(a: Index, b: Index, code: OpCode) -> Index {
        Emitter::emit(Atom::Operation { a, b, code })
    }

    pub fn emit_swizzle(src: Index, code: SwizzleCode) -> Index {
        Emitter::emit(Atom::Swizzle { src, code })
    }

    pub fn emit_store(dst: Index, src: Index) -> Index {
        Emitter::emit(Atom::Store { dst, src })
    }

    pub fn emit_load(src: Index, idx: Index) -> Index {
        Emitter::emit(Atom::Load { src, idx })
    }

    pub fn emit_intrinsic(args: Index, kind: IntrinsicKind, ret: Index) -> Index {
        Emitter::emit(Atom::Intrinsic { args, kind, ret })
    }

    pub fn emit_return(value: Index, ty: Index) -> Index {
        Emitter::emit(Atom::Return { value, ty })
    }

    /// Opens an `if` scope; its `failto` is patched by the matching
    /// [`Emitter::emit_end`] or [`Emitter::emit_elif`].
    pub fn emit_cond(cond: Index) -> Index {
        Emitter::open_branch(Atom::Cond { cond, failto: NONE })
    }

    /// Opens an `else if` scope (`cond == NONE` for a plain `else`) and
    /// redirects the previous segment's `failto` here.
    pub fn emit_elif(cond: Index) -> Index {
        STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            let frame = stack.last_mut().expect("no active recording buffer");
            let index = frame.buffer.emit(Atom::Elif { cond, failto: NONE });
            let previous = frame
                .branches
                .pop()
                .expect("elif outside of a conditional scope");
            patch_failto(&mut frame.buffer, previous, index);
            frame.branches.push(index);
            index
        })
    }

    pub fn emit_while(cond: Index) -> Index {
        Emitter::open_branch(Atom::While { cond, failto: NONE })
    }

    /// Closes the most recent unclosed scope and patches its `failto`.
    pub fn emit_end() -> Index {
        STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            let frame = stack.last_mut().expect("no active recording buffer");
            let index = frame.buffer.emit(Atom::End);
            let open = frame.branches.pop().expect("end without an open scope");
            patch_failto(&mut frame.buffer, open, index);
            index
        })
    }

    fn open_branch(atom: Atom) -> Index {
        STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            let frame = stack.last_mut().expect("no active recording buffer");
            let index = frame.buffer.emit(atom);
            frame.branches.push(index);
            index
        })
    }

    pub fn cached_struct(name: &str) -> Option<Index> {
        Emitter::with(|buffer| buffer.cached_struct(name))
    }

    pub fn register_struct(head: Index, names: StructNames) {
        Emitter::with(|buffer| buffer.register_struct(head, names));
    }
}

fn patch_failto(buffer: &mut Buffer, at: Index, target: Index) {
    match buffer.get_mut(at) {
        Some(Atom::Cond { failto, .. })
        | Some(Atom::Elif { failto, .. })
        | Some(Atom::While { failto, .. }) => *failto = target,
        other => panic!("branch patch target is {:?}, not a control atom", other),
    }
}

/// Scoped push/pop pair: pushes a fresh buffer on construction and pops on
/// drop, so a panic while recording still unwinds the stack.
pub struct RecordingScope {
    armed: bool,
}

impl RecordingScope {
    pub fn new() -> RecordingScope {
        Emitter::push(Buffer::new());
        RecordingScope { armed: true }
    }

    /// Ends the scope, returning the recorded buffer.
    pub fn finish(mut self) -> Buffer {
        self.armed = false;
        Emitter::pop()
    }
}

impl Default for RecordingScope {
    fn default() -> Self {
        RecordingScope::new()
    }
}

impl Drop for RecordingScope {
    fn drop(&mut self) {
        if self.armed {
            let _ = Emitter::try_pop();
        }
    }
}
