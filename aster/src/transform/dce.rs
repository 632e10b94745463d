//! Pool-level dead-code elimination.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::buffer::Buffer;
use crate::ir::{Atom, Index, QualifierKind};
use crate::transform::reindex::Reindex;

/// `users[i]`: indices of atoms that address `i`.
pub fn users(buffer: &Buffer) -> BTreeMap<Index, BTreeSet<Index>> {
    let mut graph: BTreeMap<Index, BTreeSet<Index>> = BTreeMap::new();
    for (i, atom) in buffer.atoms().iter().enumerate() {
        for address in atom.addresses() {
            graph.entry(address).or_default().insert(i as Index);
        }
    }
    graph
}

struct Pass {
    buffer: Buffer,
    map: Reindex,
    changed: bool,
}

/// One sweep: keep roots (stores, returns, control flow) and anything still
/// referenced, compact the survivors into a fresh buffer, and remap.
fn eliminate_pass(buffer: &Buffer) -> Pass {
    let users = users(buffer);

    let mut out = Buffer::new();
    let mut map = Reindex::new();

    for (i, atom) in buffer.atoms().iter().enumerate() {
        let index = i as Index;
        let exempt = match atom {
            Atom::Store { .. } | Atom::Return { .. } => true,
            // Effectful intrinsics and valueless declarations have no
            // users to keep them alive.
            Atom::Intrinsic { kind, .. } => kind.is_statement(),
            Atom::Qualifier { kind, .. } => matches!(kind, QualifierKind::LocalSize),
            other => other.is_control_flow(),
        };
        let used = users.get(&index).map_or(false, |set| !set.is_empty());
        if exempt || used {
            map.insert(index, out.emit(atom.clone()));
        }
    }

    for (head, names) in buffer.names() {
        if let Some(new_head) = map.mapped(*head) {
            out.register_struct(new_head, names.clone());
        }
    }

    let changed = out.pointer() != buffer.pointer();
    for i in 0..out.pointer() {
        if let Some(atom) = out.get_mut(i as Index) {
            atom.reindex(&map);
        }
    }

    Pass {
        buffer: out,
        map,
        changed,
    }
}

/// Runs sweeps until a pass removes nothing. Idempotent by construction.
pub fn eliminate(buffer: &Buffer) -> Buffer {
    eliminate_with_map(buffer).0
}

/// Like [`eliminate`], also returning the cumulative `old -> new` map for
/// the surviving atoms, so signatures held outside the buffer can follow.
pub fn eliminate_with_map(buffer: &Buffer) -> (Buffer, Reindex) {
    let mut pass = eliminate_pass(buffer);
    let mut total = pass.map.clone();
    while pass.changed {
        debug!(target: "aster::dce", atoms = pass.buffer.pointer(), "dead-code pass");
        pass = eliminate_pass(&pass.buffer);
        total = total.forward(&pass.map);
    }
    (pass.buffer, total)
}
