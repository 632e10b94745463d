//! Rewrites over recorded buffers.

pub mod dce;
pub mod reindex;
pub mod type_name;

use crate::procedure::Procedure;

/// The standard pre-link pipeline: the pool-level dead-code sweep.
///
/// The molecule-based pass ([`crate::mir::dce`]) is the canonical
/// formulation; this pool fast path reaches the same fixpoint for buffers
/// the lowering supports and also covers control flow.
pub fn optimize(procedure: &mut Procedure) {
    let (buffer, map) = dce::eliminate_with_map(&procedure.buffer);
    procedure.buffer = buffer;
    for parameter in &mut procedure.parameters {
        map.remap(parameter);
    }
    map.remap(&mut procedure.returns);
}
