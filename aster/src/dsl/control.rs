//! Structured control flow.
//!
//! Branches record open scopes whose `failto` targets are patched when the
//! matching [`end`] closes them.

use crate::dsl::scalar::Boolean;
use crate::dsl::{ProcReturn, Value};
use crate::emitter::Emitter;
use crate::ir::NONE;

/// Opens an `if` scope.
pub fn cond(condition: Boolean) {
    Emitter::emit_cond(condition.index());
}

/// Continues the current conditional with an `else if` arm.
pub fn elif(condition: Boolean) {
    Emitter::emit_elif(condition.index());
}

/// Continues the current conditional with an `else` arm.
pub fn otherwise() {
    Emitter::emit_elif(NONE);
}

/// Opens a `while` scope.
pub fn loop_while(condition: Boolean) {
    Emitter::emit_while(condition.index());
}

/// Closes the most recent open scope.
pub fn end() {
    Emitter::emit_end();
}

/// Records an early return.
pub fn returns(value: impl ProcReturn) {
    value.record_return();
}
