//! Storage legalization.
//!
//! Stores must target addressable storage. A store whose destination is a
//! transient value gets a fresh `Storage` molecule of the destination's
//! type; every user of the old destination is redirected to the storage,
//! and the store itself writes through it.

use std::collections::BTreeMap;

use tracing::trace;

use crate::error::Error;
use crate::ir::Index;
use crate::mir::usage::mole_users;
use crate::mir::{Block, Field, Molecule, Ref, Storage, Type};

/// Resolves the type of a value-producing molecule, materializing a type
/// molecule when the value does not already carry one.
fn mole_type(
    out: &mut Vec<Ref<Molecule>>,
    next: &mut Index,
    value: &Ref<Molecule>,
) -> Result<Ref<Molecule>, Error> {
    let resolved = match &*value.borrow() {
        Molecule::Primitive(p) => {
            let kind = match p {
                crate::mir::Primitive::Bool(_) => crate::ir::PrimitiveKind::Bool,
                crate::mir::Primitive::Int(_) => crate::ir::PrimitiveKind::Int,
                crate::mir::Primitive::UInt(_) => crate::ir::PrimitiveKind::UInt,
                crate::mir::Primitive::Float(_) => crate::ir::PrimitiveKind::Float,
                crate::mir::Primitive::Double(_) => crate::ir::PrimitiveKind::Double,
            };
            let ty = Ref::new(*next, Molecule::Type(Type::primitive(kind)));
            *next += 1;
            out.push(ty.clone());
            return Ok(ty);
        }
        Molecule::Construct(ctor) => return Ok(ctor.ty.clone()),
        Molecule::Storage(storage) => return Ok(storage.ty.clone()),
        Molecule::Operation(op) => op.a.clone(),
        other => {
            return Err(Error::UnsupportedAtom {
                index: value.index,
                atom: other.tag().to_owned(),
            })
        }
    };
    mole_type(out, next, &resolved)
}

/// Replaces every operand ref of `user` whose index is `from`.
fn readdress(user: &Ref<Molecule>, from: Index, to: &Ref<Molecule>) {
    let mut molecule = user.borrow_mut();
    let swap = |r: &mut Ref<Molecule>| {
        if r.index == from {
            *r = to.clone();
        }
    };
    match &mut *molecule {
        Molecule::Type(ty) => {
            for field in &mut ty.fields {
                if let Field::Aggregate(r) = field {
                    swap(r);
                }
            }
        }
        Molecule::Primitive(_) => {}
        Molecule::Operation(op) => {
            swap(&mut op.a);
            if let Some(b) = &mut op.b {
                swap(b);
            }
        }
        Molecule::Intrinsic(intr) => {
            for arg in &mut intr.args {
                swap(arg);
            }
        }
        Molecule::Construct(ctor) => {
            swap(&mut ctor.ty);
            for arg in &mut ctor.args {
                swap(arg);
            }
        }
        Molecule::Store(store) => {
            swap(&mut store.dst);
            swap(&mut store.src);
        }
        Molecule::Storage(storage) => swap(&mut storage.ty),
        Molecule::Return(ret) => {
            if let Some(value) = &mut ret.value {
                swap(value);
            }
        }
    }
}

pub fn legalize_storage(block: &Block) -> Result<Block, Error> {
    let users = mole_users(block);
    let by_index: BTreeMap<Index, Ref<Molecule>> =
        block.body.iter().map(|r| (r.index, r.clone())).collect();

    let mut next = block.next_index();
    let mut body = Vec::new();

    for r in &block.body {
        let transient_dst = match &*r.borrow() {
            Molecule::Store(store) if !store.dst.borrow().is_addressable() => Some(store.dst.clone()),
            _ => None,
        };

        if let Some(dst) = transient_dst {
            trace!(target: "aster::mir", store = r.index, dst = dst.index, "legalizing store");

            let ty = mole_type(&mut body, &mut next, &dst)?;
            let storage = Ref::new(next, Molecule::Storage(Storage { ty }));
            next += 1;
            body.push(storage.clone());

            if let Some(set) = users.get(&dst.index) {
                for &user in set {
                    if let Some(user) = by_index.get(&user) {
                        readdress(user, dst.index, &storage);
                    }
                }
            }

            if let Molecule::Store(store) = &mut *r.borrow_mut() {
                if store.dst.index == dst.index {
                    store.dst = storage.clone();
                }
            }
        }

        body.push(r.clone());
    }

    Ok(Block::new(body))
}
