//! Lowering the pool into molecules.

use std::collections::BTreeMap;

use crate::buffer::Buffer;
use crate::error::Error;
use crate::ir::{Atom, Index, OpCode, Scalar, SwizzleCode};
use crate::mir::{
    Block, Construct, Intrinsic, Molecule, Operation, Primitive, Ref, Return, Seq, Store, Type,
};

impl Buffer {
    /// Walks the pool in order, producing one molecule ref per supported
    /// atom. List chains collapse into argument sequences; qualifiers fold
    /// into their underlying type molecule.
    pub fn lower_to_mir(&self) -> Result<Block, Error> {
        let mut mapping: BTreeMap<Index, Ref<Molecule>> = BTreeMap::new();
        let mut block = Block::default();

        let list_walk = |mapping: &BTreeMap<Index, Ref<Molecule>>,
                         mut at: Index|
         -> Result<Seq<Ref<Molecule>>, Error> {
            let mut out = Seq::new();
            while at >= 0 {
                let atom = self.fetch(at)?;
                let (item, next) = match *atom {
                    Atom::List { item, next } => (item, next),
                    _ => {
                        return Err(Error::UnsupportedAtom {
                            index: at,
                            atom: atom.to_string(),
                        })
                    }
                };
                let r = mapping.get(&item).ok_or(Error::MissingMapping { index: item })?;
                out.push(r.clone());
                at = next;
            }
            Ok(out)
        };

        for (i, atom) in self.atoms().iter().enumerate() {
            let index = i as Index;

            let molecule = match *atom {
                Atom::TypeField { item, down, next } => {
                    if next >= 0 || down >= 0 {
                        // Chains describe aggregates; those never reach the
                        // molecule passes.
                        return Err(Error::UnsupportedAtom {
                            index,
                            atom: atom.to_string(),
                        });
                    }
                    let item = item.ok_or(Error::UnsupportedAtom {
                        index,
                        atom: atom.to_string(),
                    })?;
                    Molecule::Type(Type::primitive(item))
                }
                Atom::Qualifier {
                    underlying, kind, ..
                } => {
                    let r = mapping
                        .get(&underlying)
                        .ok_or(Error::MissingMapping { index: underlying })?;
                    let mut ty = match &*r.borrow() {
                        Molecule::Type(ty) => ty.clone(),
                        other => {
                            return Err(Error::UnsupportedAtom {
                                index,
                                atom: other.tag().to_owned(),
                            })
                        }
                    };
                    ty.qualifiers.push(kind);
                    Molecule::Type(ty)
                }
                Atom::Primitive(scalar) => Molecule::Primitive(match scalar {
                    Scalar::Bool(v) => Primitive::Bool(v),
                    Scalar::Int(v) => Primitive::Int(v),
                    Scalar::UInt(v) => Primitive::UInt(v),
                    Scalar::Float(v) => Primitive::Float(v),
                    Scalar::Double(v) => Primitive::Double(v),
                }),
                Atom::Swizzle { src, code } => {
                    let a = mapping.get(&src).ok_or(Error::MissingMapping { index: src })?;
                    let code = match code {
                        SwizzleCode::X => OpCode::SwzX,
                        SwizzleCode::Y => OpCode::SwzY,
                        SwizzleCode::Z => OpCode::SwzZ,
                        SwizzleCode::W => OpCode::SwzW,
                        _ => {
                            return Err(Error::UnsupportedAtom {
                                index,
                                atom: atom.to_string(),
                            })
                        }
                    };
                    Molecule::Operation(Operation {
                        a: a.clone(),
                        b: None,
                        code,
                    })
                }
                Atom::Operation { a, b, code } => {
                    let a = mapping.get(&a).ok_or(Error::MissingMapping { index: a })?.clone();
                    let b = if b >= 0 {
                        Some(mapping.get(&b).ok_or(Error::MissingMapping { index: b })?.clone())
                    } else {
                        None
                    };
                    Molecule::Operation(Operation { a, b, code })
                }
                Atom::Intrinsic { args, kind, .. } => Molecule::Intrinsic(Intrinsic {
                    args: list_walk(&mapping, args)?,
                    kind,
                }),
                Atom::List { .. } => continue,
                Atom::Construct { ty, args, mode } => {
                    let ty = mapping.get(&ty).ok_or(Error::MissingMapping { index: ty })?.clone();
                    if !matches!(&*ty.borrow(), Molecule::Type(_)) {
                        return Err(Error::UnsupportedAtom {
                            index,
                            atom: atom.to_string(),
                        });
                    }
                    Molecule::Construct(Construct {
                        ty,
                        args: list_walk(&mapping, args)?,
                        mode,
                    })
                }
                Atom::Store { dst, src } => {
                    let dst = mapping.get(&dst).ok_or(Error::MissingMapping { index: dst })?.clone();
                    let src = mapping.get(&src).ok_or(Error::MissingMapping { index: src })?.clone();
                    Molecule::Store(Store { dst, src })
                }
                Atom::Return { value, .. } => {
                    let value = if value >= 0 {
                        Some(
                            mapping
                                .get(&value)
                                .ok_or(Error::MissingMapping { index: value })?
                                .clone(),
                        )
                    } else {
                        None
                    };
                    Molecule::Return(Return { value })
                }
                ref other => {
                    return Err(Error::UnsupportedAtom {
                        index,
                        atom: other.to_string(),
                    })
                }
            };

            let r = Ref::new(index, molecule);
            mapping.insert(index, r.clone());
            block.body.push(r);
        }

        Ok(block)
    }
}
