//! Layout-IO consistency validation.

use aster::buffer::Buffer;
use aster::dsl::{LayoutOut, F32, I32};
use aster::ir::{Atom, PrimitiveKind, QualifierKind, NONE};
use aster::link::LinkageUnit;
use aster::procedure::procedure;

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn qualifier(buffer: &mut Buffer, item: PrimitiveKind, binding: u32, kind: QualifierKind) {
    let ty = buffer.emit(Atom::TypeField {
        item: Some(item),
        down: NONE,
        next: NONE,
    });
    buffer.emit(Atom::Qualifier {
        underlying: ty,
        binding,
        kind,
    });
}

#[test]
fn conflicting_binding_is_reported() {
    init_logging();

    let mut buffer = Buffer::new();
    qualifier(&mut buffer, PrimitiveKind::Float, 0, QualifierKind::LayoutInSmooth);
    qualifier(&mut buffer, PrimitiveKind::Int, 0, QualifierKind::LayoutInSmooth);

    let findings = buffer.validate();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].kind, QualifierKind::LayoutInSmooth);
    assert_eq!(findings[0].binding, 0);
}

#[test]
fn consistent_bindings_produce_no_findings() {
    let mut buffer = Buffer::new();
    qualifier(&mut buffer, PrimitiveKind::Float, 0, QualifierKind::LayoutInSmooth);
    qualifier(&mut buffer, PrimitiveKind::Float, 0, QualifierKind::LayoutInSmooth);
    qualifier(&mut buffer, PrimitiveKind::Int, 1, QualifierKind::LayoutInSmooth);

    assert!(buffer.validate().is_empty());
}

#[test]
fn distinct_kinds_do_not_conflict() {
    let mut buffer = Buffer::new();
    qualifier(&mut buffer, PrimitiveKind::Float, 0, QualifierKind::LayoutInSmooth);
    qualifier(&mut buffer, PrimitiveKind::Int, 0, QualifierKind::LayoutOutSmooth);
    qualifier(&mut buffer, PrimitiveKind::Vec4, 0, QualifierKind::Uniform);

    assert!(buffer.validate().is_empty());
}

#[test]
fn validation_does_not_mutate_the_buffer() {
    let mut buffer = Buffer::new();
    qualifier(&mut buffer, PrimitiveKind::Float, 0, QualifierKind::LayoutInSmooth);
    qualifier(&mut buffer, PrimitiveKind::Int, 0, QualifierKind::LayoutInSmooth);

    let before: Vec<Atom> = buffer.atoms().to_vec();
    let _ = buffer.validate();
    assert_eq!(buffer.atoms(), &before[..]);
}

#[test]
fn cross_procedure_conflict_is_reported_but_emission_continues() {
    init_logging();

    let red = procedure("red", || {
        let lout = LayoutOut::<F32>::new(0);
        lout.set(F32::lit(1.0));
    });
    let blue = procedure("blue", || {
        let lout = LayoutOut::<I32>::new(0);
        lout.set(I32::lit(1));
    });

    let mut unit = LinkageUnit::new();
    unit.add(&red);
    unit.add(&blue);

    let findings = unit.validate();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].kind, QualifierKind::LayoutOutSmooth);

    // The result is undefined under a conflict, but emission still runs.
    assert!(unit.generate_glsl().is_ok());
}

#[test]
fn parameter_slots_do_not_participate_in_layout_validation() {
    let float_sink = procedure("float_sink", |_x: F32| {});
    let int_sink = procedure("int_sink", |_x: I32| {});

    let mut unit = LinkageUnit::new();
    unit.add(&float_sink);
    unit.add(&int_sink);

    assert!(unit.validate().is_empty());
}
