//! Append-only atom pools.

use std::collections::HashMap;
use std::fmt::Write as _;

use smol_str::SmolStr;
use tracing::error;

use crate::error::{Error, LayoutFinding};
use crate::ir::{Atom, Index, QualifierKind};

/// Registered names for a structure's `TypeField` chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructNames {
    pub name: SmolStr,
    pub fields: Vec<SmolStr>,
}

/// A growable, index-addressed pool of atoms. Appending is the only
/// mutation while recording; transformations produce new buffers.
#[derive(Clone, Debug, Default)]
pub struct Buffer {
    pool: Vec<Atom>,
    /// Struct-chain head index -> registered names.
    names: HashMap<Index, StructNames>,
    /// Aggregate signature -> emitted chain head, so a struct's type chain
    /// is recorded once per buffer.
    struct_cache: HashMap<SmolStr, Index>,
}

impl Buffer {
    pub fn new() -> Buffer {
        Buffer::default()
    }

    /// Appends an atom and returns its position.
    pub fn emit(&mut self, atom: Atom) -> Index {
        let index = self.pool.len() as Index;
        self.pool.push(atom);
        index
    }

    /// Ensures capacity for `n` more atoms.
    pub fn reserve(&mut self, n: usize) {
        self.pool.reserve(n);
    }

    /// Resets the append pointer; pool memory is retained for reuse.
    pub fn clear(&mut self) {
        self.pool.clear();
        self.names.clear();
        self.struct_cache.clear();
    }

    pub fn pointer(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.pool
    }

    pub fn get(&self, index: Index) -> Option<&Atom> {
        usize::try_from(index).ok().and_then(|i| self.pool.get(i))
    }

    pub fn get_mut(&mut self, index: Index) -> Option<&mut Atom> {
        usize::try_from(index).ok().and_then(|i| self.pool.get_mut(i))
    }

    pub fn fetch(&self, index: Index) -> Result<&Atom, Error> {
        self.get(index).ok_or(Error::IndexOutOfRange {
            index,
            size: self.pool.len(),
        })
    }

    pub fn register_struct(&mut self, head: Index, names: StructNames) {
        self.struct_cache.insert(names.name.clone(), head);
        self.names.insert(head, names);
    }

    pub fn struct_names(&self, head: Index) -> Option<&StructNames> {
        self.names.get(&head)
    }

    pub fn names(&self) -> &HashMap<Index, StructNames> {
        &self.names
    }

    pub fn cached_struct(&self, name: &str) -> Option<Index> {
        self.struct_cache.get(name).copied()
    }

    /// One line per live atom.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (i, atom) in self.pool.iter().enumerate() {
            let _ = writeln!(out, "   [{:4}]: {}", i, atom);
        }
        out
    }

    /// Address-locality check: every stored index except control-flow
    /// `failto` must refer strictly backwards.
    pub fn check_addresses(&self) -> Result<(), Error> {
        for (i, atom) in self.pool.iter().enumerate() {
            let failto = match *atom {
                Atom::Cond { failto, .. } | Atom::Elif { failto, .. } | Atom::While { failto, .. } => failto,
                _ => crate::ir::NONE,
            };
            for address in atom.addresses() {
                if address as usize >= self.pool.len() {
                    return Err(Error::IndexOutOfRange {
                        index: address,
                        size: self.pool.len(),
                    });
                }
                if address != failto && address as usize >= i {
                    return Err(Error::IndexOutOfRange {
                        index: address,
                        size: i,
                    });
                }
            }
        }
        Ok(())
    }

    /// Structural equality of two type references, following qualifiers to
    /// their underlying chains.
    pub fn types_equal(&self, a: Index, b: Index) -> bool {
        if a == b {
            return true;
        }
        match (self.get(a), self.get(b)) {
            (Some(&Atom::Qualifier { underlying, .. }), _) => self.types_equal(underlying, b),
            (_, Some(&Atom::Qualifier { underlying, .. })) => self.types_equal(a, underlying),
            (
                Some(&Atom::TypeField {
                    item: ia,
                    down: da,
                    next: na,
                }),
                Some(&Atom::TypeField {
                    item: ib,
                    down: db,
                    next: nb,
                }),
            ) => {
                ia == ib
                    && (da == db || self.types_equal(da, db))
                    && (na == nb || self.types_equal(na, nb))
            }
            _ => false,
        }
    }

    /// Layout-IO consistency: every `(qualifier kind, binding)` pair must
    /// resolve to one structural type. Findings are reported, not fatal.
    pub fn validate(&self) -> Vec<LayoutFinding> {
        let mut seen: HashMap<(QualifierKind, u32), Index> = HashMap::new();
        let mut findings = Vec::new();

        for (i, atom) in self.pool.iter().enumerate() {
            let (underlying, binding, kind) = match *atom {
                Atom::Qualifier {
                    underlying,
                    binding,
                    kind,
                } => (underlying, binding, kind),
                _ => continue,
            };
            // Parameter slots are procedure-local, not a shared interface.
            if matches!(kind, QualifierKind::Parameter(_)) {
                continue;
            }
            match seen.get(&(kind, binding)) {
                None => {
                    seen.insert((kind, binding), i as Index);
                }
                Some(&first) => {
                    let first_ty = match self.get(first) {
                        Some(&Atom::Qualifier { underlying, .. }) => underlying,
                        _ => continue,
                    };
                    if !self.types_equal(first_ty, underlying) {
                        error!(
                            target: "aster::buffer",
                            ?kind, binding, "layout type conflict with binding #{binding}"
                        );
                        findings.push(LayoutFinding {
                            kind,
                            binding,
                            first,
                            second: i as Index,
                        });
                    }
                }
            }
        }

        findings
    }

    /// Immutable snapshot for transformations and emitters.
    pub fn export_to_kernel(&self) -> Kernel {
        Kernel {
            atoms: self.pool.clone(),
            names: self.names.clone(),
        }
    }
}

/// An immutable snapshot of a recorded buffer.
#[derive(Clone, Debug)]
pub struct Kernel {
    pub atoms: Vec<Atom>,
    pub names: HashMap<Index, StructNames>,
}

impl Kernel {
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (i, atom) in self.atoms.iter().enumerate() {
            let _ = writeln!(out, "   [{:4}]: {}", i, atom);
        }
        out
    }

    /// DOT digraph of the `uses` relation: one node per atom, one edge from
    /// each atom to every atom it addresses.
    pub fn graphviz(&self) -> String {
        let mut out = String::from("digraph kernel {\n    rankdir=BT;\n");
        for (i, atom) in self.atoms.iter().enumerate() {
            let _ = writeln!(out, "    n{} [label=\"[{}] {}\"];", i, i, atom);
        }
        for (i, atom) in self.atoms.iter().enumerate() {
            for address in atom.addresses() {
                let _ = writeln!(out, "    n{} -> n{};", i, address);
            }
        }
        out.push_str("}\n");
        out
    }
}
