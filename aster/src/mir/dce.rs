//! Molecule-level dead-code elimination.
//!
//! This is the canonical formulation of the pass; the pool sweep in
//! [`crate::transform::dce`] is the fast path.

use tracing::debug;

use crate::mir::usage::mole_users;
use crate::mir::{Block, Molecule};

struct Pass {
    block: Block,
    changed: bool,
}

fn eliminate_pass(block: &Block) -> Pass {
    let users = mole_users(block);

    let mut body = Vec::new();
    for r in &block.body {
        let exempt = match &*r.borrow() {
            Molecule::Store(_) | Molecule::Return(_) => true,
            Molecule::Intrinsic(intrinsic) => intrinsic.kind.is_statement(),
            _ => false,
        };
        let used = users.get(&r.index).map_or(false, |set| !set.is_empty());
        if exempt || used {
            body.push(r.clone());
        }
    }

    let changed = body.len() != block.body.len();
    Pass {
        block: Block::new(body),
        changed,
    }
}

pub fn eliminate(block: &Block) -> Block {
    let mut pass = eliminate_pass(block);
    while pass.changed {
        debug!(target: "aster::mir", molecules = pass.block.len(), "dead-code pass");
        pass = eliminate_pass(&pass.block);
    }
    pass.block
}
