//! Textual outputs: the one-line atom dump grammar, the assembly-form
//! dump, the DOT dump, and the pool invariants behind them.

use aster::buffer::Buffer;
use aster::dsl::{cond, end, returns, F32, I32};
use aster::emitter::Emitter;
use aster::ir::{
    Atom, ConstructMode, IntrinsicKind, OpCode, PrimitiveKind, QualifierKind, Scalar, SwizzleCode,
    NONE,
};
use aster::link::link;
use aster::procedure::procedure;

#[test]
fn atom_dump_grammar() {
    let mut buffer = Buffer::new();
    let ty = buffer.emit(Atom::TypeField {
        item: Some(PrimitiveKind::Float),
        down: NONE,
        next: NONE,
    });
    let qualifier = buffer.emit(Atom::Qualifier {
        underlying: ty,
        binding: 0,
        kind: QualifierKind::LayoutInSmooth,
    });
    let value = buffer.emit(Atom::Construct {
        ty: qualifier,
        args: NONE,
        mode: ConstructMode::Transient,
    });
    let seven = buffer.emit(Atom::Primitive(Scalar::Int(7)));
    let half = buffer.emit(Atom::Primitive(Scalar::Float(0.5)));
    let add = buffer.emit(Atom::Operation {
        a: seven,
        b: half,
        code: OpCode::Add,
    });
    let list = buffer.emit(Atom::List {
        item: add,
        next: NONE,
    });
    let fract = buffer.emit(Atom::Intrinsic {
        args: list,
        kind: IntrinsicKind::Fract,
        ret: ty,
    });
    buffer.emit(Atom::Store {
        dst: value,
        src: fract,
    });
    buffer.emit(Atom::Load { src: value, idx: 1 });
    buffer.emit(Atom::Swizzle {
        src: value,
        code: SwizzleCode::Xyz,
    });
    buffer.emit(Atom::Call {
        callable: 3,
        args: NONE,
        ret: ty,
    });
    buffer.emit(Atom::Cond {
        cond: add,
        failto: 13,
    });
    buffer.emit(Atom::End);
    buffer.emit(Atom::Return {
        value: fract,
        ty,
    });

    let expected = "\
   [   0]: type: float -> (nil)
   [   1]: global: %0 = (layout_in_smooth, 0)
   [   2]: construct: %1 = (nil)
   [   3]: primitive: int = 7
   [   4]: primitive: float = 0.5
   [   5]: op $ADD %3 -> %4
   [   6]: list: %5 -> (nil)
   [   7]: intr $fract %6 -> %0
   [   8]: store %7 -> %2
   [   9]: load %2 #1
   [  10]: swizzle %2 #xyz
   [  11]: call $3: (nil) -> %0
   [  12]: cond %5 -> %13
   [  13]: end
   [  14]: return %7 -> %0
";
    assert_eq!(buffer.dump(), expected);
}

#[test]
fn branch_dump_forms() {
    let plain = Atom::Elif {
        cond: NONE,
        failto: 5,
    };
    assert_eq!(plain.to_string(), "elif (nil) -> %5");

    let guarded = Atom::Elif { cond: 2, failto: 5 };
    assert_eq!(guarded.to_string(), "elif %2 -> %5");

    let repeat = Atom::While { cond: 2, failto: 9 };
    assert_eq!(repeat.to_string(), "while %2 -> %9");

    let unary = Atom::Operation {
        a: 4,
        b: NONE,
        code: OpCode::Neg,
    };
    assert_eq!(unary.to_string(), "op $NEG %4 -> (nil)");
}

#[test]
fn assembly_dump_frames_procedures() {
    let sum = procedure("sum", |x: I32, y: I32| x + y);
    let unit = link(&sum);

    let assembly = unit.display_assembly();
    assert!(
        assembly.starts_with("sum (2 parameters) -> int\n"),
        "{}",
        assembly
    );
    assert!(assembly.contains("op $ADD"));
    assert!(assembly.ends_with("\n\n"));
}

#[test]
fn write_assembly_round_trips() -> anyhow::Result<()> {
    let sum = procedure("sum", |x: I32, y: I32| x + y);
    let unit = link(&sum);

    let path = std::env::temp_dir().join(format!("aster-assembly-{}.s", std::process::id()));
    unit.write_assembly(&path)?;
    let written = std::fs::read_to_string(&path)?;
    std::fs::remove_file(&path)?;

    assert_eq!(written, unit.display_assembly());
    Ok(())
}

#[test]
fn graphviz_lists_uses_edges() {
    let sum = procedure("sum", |x: I32, y: I32| x + y);
    let unit = link(&sum);

    let dot = unit.graphviz();
    assert!(dot.starts_with("digraph kernel {"));
    // The first qualifier always uses the first type atom.
    assert!(dot.contains("n1 -> n0;"), "{}", dot);
    assert!(dot.trim_end().ends_with('}'));
}

#[test]
fn recorded_buffers_keep_addresses_local() {
    let conditional = procedure("conditional", |x: F32, y: F32| {
        let a = x + y;
        cond(a.lt(0));
        returns(a * 2.0);
        end();
        a
    });

    // Control-flow `failto` is the only forward reference.
    assert!(conditional.buffer.check_addresses().is_ok());
}

#[test]
fn out_of_range_addresses_are_rejected() {
    let mut buffer = Buffer::new();
    buffer.emit(Atom::Store { dst: 5, src: 6 });
    assert!(buffer.check_addresses().is_err());
}

#[test]
fn failto_patching_matches_scopes() {
    Emitter::push(Buffer::new());
    let a = F32::lit(1.0);
    cond(a.lt(0.5));
    let _ = a + 1.0;
    end();
    let buffer = Emitter::pop();

    let cond_at = buffer
        .atoms()
        .iter()
        .position(|atom| matches!(atom, Atom::Cond { .. }))
        .unwrap();
    let end_at = buffer
        .atoms()
        .iter()
        .position(|atom| matches!(atom, Atom::End))
        .unwrap();
    match buffer.atoms()[cond_at] {
        Atom::Cond { failto, .. } => assert_eq!(failto as usize, end_at),
        _ => unreachable!(),
    }
}

#[test]
fn pools_tolerate_a_million_atoms() {
    let mut buffer = Buffer::new();
    buffer.reserve(1_000_000);
    for i in 0..1_000_000u32 {
        buffer.emit(Atom::Primitive(Scalar::UInt(i)));
    }
    assert_eq!(buffer.pointer(), 1_000_000);

    buffer.clear();
    assert_eq!(buffer.pointer(), 0);
}
