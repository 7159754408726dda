use std::collections::HashMap;

use serde::Serialize;

use crate::domain::itemset::Itemset;

/// A frequent itemset with its cached support.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrequentItemset {
    pub itemset: Itemset,
    /// Number of transactions containing every member.
    pub count: usize,
    /// `count / transaction_count`
    pub support: f64,
}

/// Size-indexed output of one mining run.
///
/// Level `k` holds the frequent itemsets of size `k` in generation order; the
/// canonical-key index answers support lookups for rule generation.
#[derive(Clone, Debug, Default)]
pub struct FrequentItemsetTable {
    transaction_count: usize,
    min_support: f64,
    levels: Vec<Vec<FrequentItemset>>,
    index: HashMap<Itemset, (usize, usize)>,
}

impl FrequentItemsetTable {
    pub(crate) fn new(transaction_count: usize, min_support: f64) -> Self {
        Self { transaction_count, min_support, levels: Vec::new(), index: HashMap::new() }
    }

    pub(crate) fn push_level(&mut self, level: Vec<FrequentItemset>) {
        let depth = self.levels.len();
        for (position, entry) in level.iter().enumerate() {
            debug_assert_eq!(entry.itemset.len(), depth + 1, "itemset pushed to wrong level");
            self.index.insert(entry.itemset.clone(), (depth, position));
        }
        self.levels.push(level);
    }

    pub fn transaction_count(&self) -> usize {
        self.transaction_count
    }

    pub fn min_support(&self) -> f64 {
        self.min_support
    }

    /// Frequent itemsets of size `k` (empty for sizes never reached).
    pub fn level(&self, k: usize) -> &[FrequentItemset] {
        k.checked_sub(1).and_then(|depth| self.levels.get(depth)).map_or(&[], Vec::as_slice)
    }

    /// Largest itemset size present.
    pub fn max_len(&self) -> usize {
        self.levels.len()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// All frequent itemsets, smallest level first, generation order within a level.
    pub fn iter(&self) -> impl Iterator<Item = &FrequentItemset> {
        self.levels.iter().flatten()
    }

    pub fn get(&self, itemset: &Itemset) -> Option<&FrequentItemset> {
        self.index.get(itemset).map(|(depth, position)| &self.levels[*depth][*position])
    }

    pub fn support(&self, itemset: &Itemset) -> Option<f64> {
        self.get(itemset).map(|entry| entry.support)
    }

    pub fn contains(&self, itemset: &Itemset) -> bool {
        self.index.contains_key(itemset)
    }
}
