//! Recording through the typed surface must synthesize the same atoms as
//! driving the emitter by hand.

use aster::buffer::Buffer;
use aster::dsl::{Boolean, LayoutIn, LayoutOut, Value, F32, I32};
use aster::emitter::Emitter;
use aster::ir::{Atom, ConstructMode, PrimitiveKind, QualifierKind, NONE};

fn check_contents(reference: &Buffer, given: &Buffer) -> bool {
    reference.pointer() == given.pointer()
        && reference
            .atoms()
            .iter()
            .zip(given.atoms())
            .all(|(a, b)| a == b)
}

fn synthesize_layout_io_inner<T: Value>(kind: PrimitiveKind) {
    // The reference, spelled out atom by atom.
    Emitter::push(Buffer::new());
    {
        let type_in = Emitter::emit_type_field(Some(kind), NONE, NONE);
        let in_qualifier = Emitter::emit_qualifier(type_in, 0, QualifierKind::LayoutInSmooth);
        let input = Emitter::emit_construct(in_qualifier, NONE, ConstructMode::Transient);

        // A duplicate type atom is expected to be recorded.
        let type_out = Emitter::emit_type_field(Some(kind), NONE, NONE);
        let out_qualifier = Emitter::emit_qualifier(type_out, 0, QualifierKind::LayoutOutSmooth);
        let output = Emitter::emit_construct(out_qualifier, NONE, ConstructMode::Transient);

        Emitter::emit_store(output, input);
    }
    let reference = Emitter::pop();

    // The same recording through the DSL.
    Emitter::push(Buffer::new());
    {
        let lin = LayoutIn::<T>::new(0);
        let lout = LayoutOut::<T>::new(0);
        lout.set(lin.get());
    }
    let given = Emitter::pop();

    assert!(
        check_contents(&reference, &given),
        "reference:\n{}\ngiven:\n{}",
        reference.dump(),
        given.dump()
    );
}

#[test]
fn synthesize_layout_io_int() {
    synthesize_layout_io_inner::<I32>(PrimitiveKind::Int);
}

#[test]
fn synthesize_layout_io_float() {
    synthesize_layout_io_inner::<F32>(PrimitiveKind::Float);
}

#[test]
fn synthesize_layout_io_bool() {
    synthesize_layout_io_inner::<Boolean>(PrimitiveKind::Bool);
}

fn occurrences(buffer: &Buffer, predicate: impl Fn(&Atom) -> bool) -> usize {
    buffer.atoms().iter().filter(|atom| predicate(atom)).count()
}

#[test]
fn layout_io_atom_occurrences() {
    Emitter::push(Buffer::new());
    {
        let lin = LayoutIn::<F32>::new(0);
        let lout = LayoutOut::<F32>::new(0);
        lout.set(lin.get());
    }
    let buffer = Emitter::pop();

    let layout_in = occurrences(&buffer, |atom| {
        matches!(
            atom,
            Atom::Qualifier {
                kind: QualifierKind::LayoutInSmooth,
                binding: 0,
                ..
            }
        )
    });
    let layout_out = occurrences(&buffer, |atom| {
        matches!(
            atom,
            Atom::Qualifier {
                kind: QualifierKind::LayoutOutSmooth,
                binding: 0,
                ..
            }
        )
    });
    let float_types = occurrences(&buffer, |atom| {
        matches!(
            atom,
            Atom::TypeField {
                item: Some(PrimitiveKind::Float),
                ..
            }
        )
    });

    assert_eq!(layout_in, 1);
    assert_eq!(layout_out, 1);
    assert_eq!(float_types, 2);
    assert_eq!(occurrences(&buffer, |atom| matches!(atom, Atom::Store { .. })), 1);
}

#[test]
fn recording_scope_unwinds_on_panic() {
    let depth = Emitter::depth();
    let result = std::panic::catch_unwind(|| {
        let _scope = aster::emitter::RecordingScope::new();
        F32::lit(1.0);
        panic!("interrupted recording");
    });
    assert!(result.is_err());
    assert_eq!(Emitter::depth(), depth);
}

#[test]
fn atom_order_follows_evaluation_order() {
    Emitter::push(Buffer::new());
    let a = F32::lit(1.0);
    let b = F32::lit(2.0);
    let _ = a + b;
    let buffer = Emitter::pop();

    assert!(matches!(buffer.atoms()[0], Atom::Primitive(_)));
    assert!(matches!(buffer.atoms()[1], Atom::Primitive(_)));
    assert!(matches!(buffer.atoms()[2], Atom::Operation { a: 0, b: 1, .. }));
}
