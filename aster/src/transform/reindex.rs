//! Index remapping.

use std::collections::BTreeMap;

use crate::ir::Index;

/// A partial map `old index -> new index`. Indices absent from the map are
/// left untouched, which also keeps [`crate::ir::NONE`] stable.
#[derive(Clone, Debug, Default)]
pub struct Reindex {
    map: BTreeMap<Index, Index>,
}

impl Reindex {
    pub fn new() -> Reindex {
        Reindex::default()
    }

    pub fn insert(&mut self, from: Index, to: Index) {
        self.map.insert(from, to);
    }

    pub fn mapped(&self, i: Index) -> Option<Index> {
        self.map.get(&i).copied()
    }

    pub fn remap(&self, i: &mut Index) {
        if let Some(&to) = self.map.get(i) {
            *i = to;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The map equivalent to applying `self`, then `then`, restricted to
    /// `self`'s domain. Used to accumulate compaction maps across passes,
    /// where `then`'s keys live in the intermediate index space.
    pub fn forward(&self, then: &Reindex) -> Reindex {
        self.map
            .iter()
            .map(|(&from, &mid)| (from, then.mapped(mid).unwrap_or(mid)))
            .collect()
    }

    /// The map equivalent to applying `self`, then `then`.
    pub fn then(&self, then: &Reindex) -> Reindex {
        let mut out = Reindex::new();
        for (&from, &mid) in &self.map {
            out.insert(from, then.mapped(mid).unwrap_or(mid));
        }
        for (&from, &to) in &then.map {
            out.map.entry(from).or_insert(to);
        }
        out
    }
}

impl FromIterator<(Index, Index)> for Reindex {
    fn from_iter<T: IntoIterator<Item = (Index, Index)>>(iter: T) -> Reindex {
        Reindex {
            map: iter.into_iter().collect(),
        }
    }
}
