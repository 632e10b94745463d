//! Rewrite passes: dead-code elimination, reindexing, lowering and
//! storage legalization.

use aster::buffer::Buffer;
use aster::dsl::{returns, F32, I32};
use aster::emitter::Emitter;
use aster::ir::{Atom, Index, OpCode, Scalar, NONE};
use aster::link::link;
use aster::mir::{legalize, Molecule};
use aster::procedure::procedure;
use aster::transform::{self, dce, reindex::Reindex};

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn dce_removes_unused_expressions() {
    init_logging();

    Emitter::push(Buffer::new());
    let x = F32::lit(1.0);
    let y = F32::lit(2.0);
    let _dead = x * y;
    let sum = x + y;
    returns(sum);
    let buffer = Emitter::pop();

    let once = dce::eliminate(&buffer);
    assert!(once.pointer() < buffer.pointer());

    let twice = dce::eliminate(&once);
    assert_eq!(once.atoms(), twice.atoms());
}

fn lcg(state: &mut u64) -> u64 {
    *state = state
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    *state >> 33
}

/// A structurally valid buffer with arbitrary dead and live regions.
fn random_buffer(seed: u64) -> Buffer {
    let mut state = seed;
    let mut buffer = Buffer::new();

    buffer.emit(Atom::Primitive(Scalar::Float(0.0)));
    for _ in 0..200 {
        let pointer = buffer.pointer() as Index;
        let pick = |state: &mut u64| (lcg(state) % pointer as u64) as Index;
        match lcg(&mut state) % 6 {
            0 | 1 => {
                buffer.emit(Atom::Primitive(Scalar::Int(lcg(&mut state) as i32)));
            }
            2 | 3 => {
                let a = pick(&mut state);
                let b = pick(&mut state);
                buffer.emit(Atom::Operation {
                    a,
                    b,
                    code: OpCode::Add,
                });
            }
            4 => {
                let dst = pick(&mut state);
                let src = pick(&mut state);
                buffer.emit(Atom::Store { dst, src });
            }
            _ => {
                let value = pick(&mut state);
                buffer.emit(Atom::Return { value, ty: NONE });
            }
        }
    }

    buffer
}

#[test]
fn dce_is_idempotent_on_random_buffers() {
    for seed in 1..=16u64 {
        let buffer = random_buffer(seed);
        let once = dce::eliminate(&buffer);
        let twice = dce::eliminate(&once);
        assert_eq!(once.atoms(), twice.atoms(), "seed {}", seed);
    }
}

#[test]
fn reindex_composes() {
    let mut f = Reindex::new();
    f.insert(0, 10);
    f.insert(1, 11);

    let mut g = Reindex::new();
    g.insert(10, 20);
    g.insert(2, 12);

    let combined = f.then(&g);

    let mut stepwise = Atom::Operation {
        a: 0,
        b: 2,
        code: OpCode::Add,
    };
    let mut direct = stepwise.clone();

    stepwise.reindex(&f);
    stepwise.reindex(&g);
    direct.reindex(&combined);

    assert_eq!(stepwise, direct);
    assert_eq!(
        stepwise,
        Atom::Operation {
            a: 20,
            b: 12,
            code: OpCode::Add,
        }
    );
}

#[test]
fn reindex_leaves_unmapped_indices_alone() {
    let mut map = Reindex::new();
    map.insert(3, 7);

    let mut atom = Atom::Store { dst: 3, src: 4 };
    atom.reindex(&map);
    assert_eq!(atom, Atom::Store { dst: 7, src: 4 });

    let mut none = NONE;
    map.remap(&mut none);
    assert_eq!(none, NONE);
}

#[test]
fn lowering_produces_one_molecule_per_atom() {
    Emitter::push(Buffer::new());
    let x = F32::lit(1.0);
    let y = F32::lit(2.0);
    returns(x + y);
    let buffer = Emitter::pop();

    let block = buffer.lower_to_mir().unwrap();
    // No list atoms were recorded, so the mapping is one to one.
    assert_eq!(block.len(), buffer.pointer());
}

#[test]
fn lowering_rejects_missing_mappings() {
    let mut buffer = Buffer::new();
    buffer.emit(Atom::Store { dst: 5, src: 6 });

    let err = buffer.lower_to_mir().unwrap_err();
    assert!(matches!(err, aster::Error::MissingMapping { .. }));
}

#[test]
fn legalize_storage_rewrites_transient_stores() {
    init_logging();

    let mut buffer = Buffer::new();
    let one = buffer.emit(Atom::Primitive(Scalar::Float(1.0)));
    let two = buffer.emit(Atom::Primitive(Scalar::Float(2.0)));
    let add = buffer.emit(Atom::Operation {
        a: one,
        b: two,
        code: OpCode::Add,
    });
    buffer.emit(Atom::Store { dst: add, src: two });
    buffer.emit(Atom::Operation {
        a: add,
        b: one,
        code: OpCode::Mul,
    });

    let block = buffer.lower_to_mir().unwrap();
    let legal = legalize::legalize_storage(&block).unwrap();

    let storage = legal
        .body
        .iter()
        .find(|r| matches!(&*r.borrow(), Molecule::Storage(_)))
        .expect("a storage molecule is materialized")
        .clone();

    let store = legal
        .body
        .iter()
        .find(|r| matches!(&*r.borrow(), Molecule::Store(_)))
        .unwrap()
        .clone();
    match &*store.borrow() {
        Molecule::Store(store) => assert_eq!(store.dst.index, storage.index),
        _ => unreachable!(),
    }

    // The downstream multiply reads through the storage now.
    let multiply = legal
        .body
        .iter()
        .filter_map(|r| match &*r.borrow() {
            Molecule::Operation(op) if op.code == OpCode::Mul => Some(op.a.index),
            _ => None,
        })
        .next()
        .unwrap();
    assert_eq!(multiply, storage.index);
}

#[test]
fn mir_dce_drops_unreferenced_molecules() {
    Emitter::push(Buffer::new());
    let x = F32::lit(1.0);
    let y = F32::lit(2.0);
    let _dead = F32::lit(3.0);
    returns(x + y);
    let buffer = Emitter::pop();

    let block = buffer.lower_to_mir().unwrap();
    let swept = aster::mir::dce::eliminate(&block);

    // The stray literal and the unused return-type molecule are gone.
    assert_eq!(swept.len(), block.len() - 2);
}

#[test]
fn optimize_preserves_emitted_glsl() {
    init_logging();

    let mut sum = procedure("sum", |x: I32, y: I32| {
        let _dead = x * y;
        x + y
    });

    let before = link(&sum).generate_glsl().unwrap();
    let atoms_before = sum.buffer.pointer();

    transform::optimize(&mut sum);
    assert!(sum.buffer.pointer() < atoms_before);

    let after = link(&sum).generate_glsl().unwrap();
    assert_eq!(before, after);
}
