//! Recovering human-readable type strings from the pool.

use std::collections::HashMap;

use crate::buffer::StructNames;
use crate::ir::{Atom, Index};

/// Resolves the printable type name of the atom at `index`.
///
/// Registered struct names win; otherwise the `TypeField` chain is followed
/// through `down` links and the primitive table supplies the leaves.
pub fn type_name(atoms: &[Atom], names: &HashMap<Index, StructNames>, index: Index) -> String {
    if index < 0 {
        return "void".to_owned();
    }
    if let Some(registered) = names.get(&index) {
        return registered.name.to_string();
    }

    match atoms.get(index as usize) {
        Some(&Atom::Qualifier { underlying, .. }) => type_name(atoms, names, underlying),
        Some(&Atom::TypeField { item: Some(item), .. }) => item.glsl_name().to_owned(),
        Some(&Atom::TypeField { down, .. }) if down >= 0 => type_name(atoms, names, down),
        _ => "<BAD>".to_owned(),
    }
}

/// The `ordinal`-th node of the field chain starting at `head`.
pub fn chain_field(atoms: &[Atom], head: Index, ordinal: usize) -> Option<Index> {
    let mut at = head;
    for _ in 0..ordinal {
        match atoms.get(usize::try_from(at).ok()?) {
            Some(&Atom::TypeField { next, .. }) if next >= 0 => at = next,
            _ => return None,
        }
    }
    Some(at)
}

/// Number of nodes in the chain at `head`.
pub fn chain_len(atoms: &[Atom], head: Index) -> usize {
    let mut len = 0;
    let mut at = head;
    while let Some(&Atom::TypeField { next, .. }) = atoms.get(usize::try_from(at).unwrap_or(usize::MAX)) {
        len += 1;
        if next < 0 {
            break;
        }
        at = next;
    }
    len
}

/// A canonical structural signature of the type at `index`, used to
/// deduplicate chains across procedures.
pub fn type_signature(atoms: &[Atom], index: Index) -> String {
    if index < 0 {
        return "void".to_owned();
    }
    match atoms.get(index as usize) {
        Some(&Atom::Qualifier { underlying, .. }) => type_signature(atoms, underlying),
        Some(&Atom::TypeField { item, down, next }) => {
            let mut sig = String::new();
            match item {
                Some(item) => sig.push_str(item.glsl_name()),
                None if down >= 0 => {
                    sig.push('{');
                    sig.push_str(&type_signature(atoms, down));
                    sig.push('}');
                }
                None => sig.push('?'),
            }
            if next >= 0 {
                sig.push(',');
                sig.push_str(&type_signature(atoms, next));
            }
            sig
        }
        _ => "?".to_owned(),
    }
}
