//! Merging procedures into one emission unit.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::io;
use std::ops::Range;
use std::path::Path;

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::debug;

use crate::buffer::Buffer;
use crate::error::{Error, LayoutFinding};
use crate::ir::{Atom, Index, NONE};
use crate::procedure::Procedure;
use crate::transform::reindex::Reindex;
use crate::transform::type_name::{type_name, type_signature};

/// One merged procedure: its atom range within the unit pool plus the
/// offset signature.
#[derive(Clone, Debug)]
pub(crate) struct ProcEntry {
    pub name: SmolStr,
    pub range: Range<usize>,
    pub parameters: Vec<Index>,
    pub returns: Index,
    pub id: u32,
}

/// An ordered collection of procedures merged into one pool, with
/// cross-procedure type deduplication and call resolution.
#[derive(Debug, Default)]
pub struct LinkageUnit {
    pool: Buffer,
    procedures: Vec<ProcEntry>,
}

/// One-procedure convenience: `link(&f).generate_glsl()`.
pub fn link(procedure: &Procedure) -> LinkageUnit {
    let mut unit = LinkageUnit::new();
    unit.add(procedure);
    unit
}

impl LinkageUnit {
    pub fn new() -> LinkageUnit {
        LinkageUnit::default()
    }

    /// Copies the procedure's atoms into the unit pool, offsetting every
    /// internal index, and records its signature.
    pub fn add(&mut self, procedure: &Procedure) -> &mut Self {
        let offset = self.pool.pointer() as Index;
        let map: Reindex = (0..procedure.buffer.pointer() as Index)
            .map(|i| (i, i + offset))
            .collect();

        for atom in procedure.buffer.atoms() {
            let mut atom = atom.clone();
            atom.reindex(&map);
            self.pool.emit(atom);
        }

        for (&head, names) in procedure.buffer.names() {
            self.pool.register_struct(head + offset, names.clone());
        }

        let shift = |i: Index| if i >= 0 { i + offset } else { i };
        self.procedures.push(ProcEntry {
            name: procedure.name.clone(),
            range: offset as usize..self.pool.pointer(),
            parameters: procedure.parameters.iter().map(|&i| shift(i)).collect(),
            returns: shift(procedure.returns),
            id: procedure.id,
        });

        debug!(
            target: "aster::link",
            procedure = %procedure.name,
            atoms = self.pool.pointer(),
            "merged procedure"
        );

        self
    }

    pub fn pool(&self) -> &Buffer {
        &self.pool
    }

    /// Layout-binding consistency across every merged procedure.
    pub fn validate(&self) -> Vec<LayoutFinding> {
        self.pool.validate()
    }

    /// Maps each `Call` atom's callable handle to a unit procedure,
    /// rejecting unresolved handles.
    pub(crate) fn resolve_calls(&self) -> Result<HashMap<u32, usize>, Error> {
        let handles: HashMap<u32, usize> = self
            .procedures
            .iter()
            .enumerate()
            .map(|(at, entry)| (entry.id, at))
            .collect();

        for atom in self.pool.atoms() {
            if let Atom::Call { callable, .. } = *atom {
                if !handles.contains_key(&callable) {
                    return Err(Error::UnresolvedCall(callable));
                }
            }
        }

        Ok(handles)
    }

    /// Deduplicates `TypeField` chains by structural signature. The lowest
    /// index of each signature class is canonical (keeping references
    /// strictly backwards); registered names migrate to the canonical head.
    pub(crate) fn deduplicated(&self) -> (Buffer, Vec<ProcEntry>) {
        let atoms = self.pool.atoms();

        let mut canonical: IndexMap<String, Index> = IndexMap::new();
        let mut map = Reindex::new();

        for (i, atom) in atoms.iter().enumerate() {
            if !matches!(atom, Atom::TypeField { .. }) {
                continue;
            }
            let index = i as Index;
            let signature = type_signature(atoms, index);
            match canonical.get(&signature) {
                None => {
                    canonical.insert(signature, index);
                }
                Some(&head) => map.insert(index, head),
            }
        }

        let mut pool = self.pool.clone();
        if !map.is_empty() {
            for i in 0..pool.pointer() {
                if let Some(atom) = pool.get_mut(i as Index) {
                    atom.reindex(&map);
                }
            }
        }

        // Names registered on a duplicate chain move to its canonical head,
        // scanned in pool order so the first registration wins.
        for head in 0..self.pool.pointer() as Index {
            if let Some(names) = self.pool.struct_names(head) {
                let target = map.mapped(head).unwrap_or(head);
                if pool.struct_names(target).is_none() {
                    pool.register_struct(target, names.clone());
                }
            }
        }

        let procedures = self
            .procedures
            .iter()
            .map(|entry| {
                let remap = |i: Index| map.mapped(i).unwrap_or(i);
                ProcEntry {
                    name: entry.name.clone(),
                    range: entry.range.clone(),
                    parameters: entry.parameters.iter().map(|&i| remap(i)).collect(),
                    returns: remap(entry.returns),
                    id: entry.id,
                }
            })
            .collect();

        (pool, procedures)
    }

    /// The full textual GLSL program.
    pub fn generate_glsl(&self) -> Result<String, Error> {
        crate::glsl::generate(self)
    }

    /// Per-procedure header plus atom dump, blank line between procedures.
    pub fn display_assembly(&self) -> String {
        let atoms = self.pool.atoms();
        let names = self.pool.names();

        let mut out = String::new();
        for entry in &self.procedures {
            let returns = if entry.returns == NONE {
                "void".to_owned()
            } else {
                type_name(atoms, names, entry.returns)
            };
            let _ = writeln!(
                out,
                "{} ({} parameters) -> {}",
                entry.name,
                entry.parameters.len(),
                returns
            );
            for i in entry.range.clone() {
                let _ = writeln!(out, "   [{:4}]: {}", i, atoms[i]);
            }
            out.push('\n');
        }
        out
    }

    pub fn write_assembly(&self, path: impl AsRef<Path>) -> io::Result<()> {
        std::fs::write(path, self.display_assembly())
    }

    /// DOT dump of the merged pool's `uses` relation.
    pub fn graphviz(&self) -> String {
        self.pool.export_to_kernel().graphviz()
    }
}
