//! Use-def analysis over molecules.

use std::collections::{BTreeMap, BTreeSet};

use crate::ir::Index;
use crate::mir::{Block, Field, Molecule};

/// The molecule indices a molecule depends on.
pub fn addresses(molecule: &Molecule) -> BTreeSet<Index> {
    let mut out = BTreeSet::new();
    match molecule {
        Molecule::Type(ty) => {
            for field in &ty.fields {
                if let Field::Aggregate(r) = field {
                    out.insert(r.index);
                }
            }
        }
        Molecule::Primitive(_) => {}
        Molecule::Operation(op) => {
            out.insert(op.a.index);
            if let Some(b) = &op.b {
                out.insert(b.index);
            }
        }
        Molecule::Intrinsic(intr) => {
            for arg in &intr.args {
                out.insert(arg.index);
            }
        }
        Molecule::Construct(ctor) => {
            out.insert(ctor.ty.index);
            for arg in &ctor.args {
                out.insert(arg.index);
            }
        }
        Molecule::Store(store) => {
            out.insert(store.dst.index);
            out.insert(store.src.index);
        }
        Molecule::Storage(storage) => {
            out.insert(storage.ty.index);
        }
        Molecule::Return(ret) => {
            if let Some(value) = &ret.value {
                out.insert(value.index);
            }
        }
    }
    out
}

/// `usage[i]`: what molecule `i` depends on.
pub fn mole_usage(block: &Block) -> BTreeMap<Index, BTreeSet<Index>> {
    let mut graph = BTreeMap::new();
    for r in &block.body {
        graph.insert(r.index, addresses(&r.borrow()));
    }
    graph
}

/// `users[i]`: which molecules depend on `i`.
pub fn mole_users(block: &Block) -> BTreeMap<Index, BTreeSet<Index>> {
    let mut graph: BTreeMap<Index, BTreeSet<Index>> = BTreeMap::new();
    for r in &block.body {
        for address in addresses(&r.borrow()) {
            graph.entry(address).or_default().insert(r.index);
        }
    }
    graph
}
