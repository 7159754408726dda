//! Canonical itemsets.
//!
//! An [`Itemset`] is always sorted by the item universe order and free of
//! duplicates, so equal membership means equal keys. Candidate generation,
//! subset lookup and rule splitting all rely on that.

use std::fmt;

use serde::Serialize;

use super::item::ItemId;
use crate::errors::MiningError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Itemset(Vec<ItemId>);

impl Itemset {
    /// Build an itemset from arbitrary members, canonicalizing order and
    /// dropping duplicates.
    pub fn new(items: impl IntoIterator<Item = ItemId>) -> Self {
        let mut items: Vec<ItemId> = items.into_iter().collect();
        items.sort();
        items.dedup();
        Self(items)
    }

    pub fn singleton(item: ItemId) -> Self {
        Self(vec![item])
    }

    /// Wrap members that are expected to already be canonical.
    pub fn from_canonical(items: Vec<ItemId>) -> Result<Self, MiningError> {
        if let Some(pair) = items.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(MiningError::MalformedItemset(format!(
                "`{}` does not strictly follow `{}`",
                pair[1], pair[0]
            )));
        }
        Ok(Self(items))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn items(&self) -> &[ItemId] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemId> {
        self.0.iter()
    }

    pub fn contains(&self, item: &ItemId) -> bool {
        self.0.binary_search(item).is_ok()
    }

    pub fn is_subset_of(&self, other: &Itemset) -> bool {
        self.0.iter().all(|item| other.contains(item))
    }

    pub fn is_disjoint(&self, other: &Itemset) -> bool {
        !self.0.iter().any(|item| other.contains(item))
    }

    pub fn union(&self, other: &Itemset) -> Itemset {
        Itemset::new(self.0.iter().chain(other.0.iter()).cloned())
    }

    /// Members selected by the set bits of `mask` (bit `i` picks the `i`-th
    /// member). The result stays canonical because selection preserves order.
    pub(crate) fn select(&self, mask: u64) -> Itemset {
        Itemset(
            self.0
                .iter()
                .enumerate()
                .filter(|(position, _)| mask & (1u64 << position) != 0)
                .map(|(_, item)| item.clone())
                .collect(),
        )
    }
}

impl fmt::Display for Itemset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (position, item) in self.0.iter().enumerate() {
            if position > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{item}")?;
        }
        f.write_str("}")
    }
}

impl FromIterator<ItemId> for Itemset {
    fn from_iter<T: IntoIterator<Item = ItemId>>(iter: T) -> Self {
        Self::new(iter)
    }
}
