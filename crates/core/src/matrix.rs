//! Transaction × item membership matrix.
//!
//! Stored column-wise: every item owns one fixed-width bit-vector over the
//! transactions, so the support of an itemset is the popcount of the AND of its
//! members' columns. Items are kept sorted by [`ItemId`], which makes a column
//! index the item's position in the universe order.

use std::collections::{BTreeSet, HashMap};

use crate::domain::item::ItemId;
use crate::domain::itemset::Itemset;
use crate::errors::MiningError;

const WORD_BITS: usize = u64::BITS as usize;

/// Fixed-width bit-vector over transaction row indices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionBits {
    words: Vec<u64>,
    len: usize,
}

impl TransactionBits {
    pub fn zeroed(len: usize) -> Self {
        Self { words: vec![0; len.div_ceil(WORD_BITS)], len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn set(&mut self, row: usize) {
        debug_assert!(row < self.len, "row {row} out of range {}", self.len);
        self.words[row / WORD_BITS] |= 1 << (row % WORD_BITS);
    }

    pub fn contains(&self, row: usize) -> bool {
        row < self.len && self.words[row / WORD_BITS] & (1 << (row % WORD_BITS)) != 0
    }

    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Popcount of `self & other` without materializing the intersection.
    pub fn intersection_count(&self, other: &TransactionBits) -> usize {
        self.words.iter().zip(&other.words).map(|(a, b)| (a & b).count_ones() as usize).sum()
    }

    pub fn intersect_with(&mut self, other: &TransactionBits) {
        for (word, other) in self.words.iter_mut().zip(&other.words) {
            *word &= other;
        }
    }
}

#[derive(Clone, Debug)]
pub struct TransactionMatrix {
    transaction_ids: Vec<String>,
    items: Vec<ItemId>,
    columns: Vec<TransactionBits>,
}

impl TransactionMatrix {
    /// Build from `(transaction id, items present)` rows. Rows keep their given
    /// order; the item universe is the sorted union of all row items.
    pub fn from_transactions<T, I>(rows: impl IntoIterator<Item = (T, I)>) -> Self
    where
        T: Into<String>,
        I: IntoIterator<Item = ItemId>,
    {
        let rows: Vec<(String, Vec<ItemId>)> = rows
            .into_iter()
            .map(|(id, items)| (id.into(), items.into_iter().collect()))
            .collect();

        let universe: BTreeSet<&ItemId> = rows.iter().flat_map(|(_, items)| items.iter()).collect();
        let items: Vec<ItemId> = universe.into_iter().cloned().collect();
        let positions: HashMap<&ItemId, usize> =
            items.iter().enumerate().map(|(position, item)| (item, position)).collect();

        let mut columns = vec![TransactionBits::zeroed(rows.len()); items.len()];
        for (row, (_, row_items)) in rows.iter().enumerate() {
            for item in row_items {
                columns[positions[item]].set(row);
            }
        }

        let transaction_ids = rows.into_iter().map(|(id, _)| id).collect();
        Self { transaction_ids, items, columns }
    }

    /// Build from a dense boolean table (`rows[t][i]` = item `i` present in
    /// transaction `t`). Item columns may arrive in any order.
    pub fn from_dense(
        transaction_ids: Vec<String>,
        items: Vec<ItemId>,
        rows: &[Vec<bool>],
    ) -> Result<Self, MiningError> {
        if rows.len() != transaction_ids.len() {
            return Err(MiningError::InvalidParameter(format!(
                "{} transaction ids for {} rows",
                transaction_ids.len(),
                rows.len()
            )));
        }
        if let Some(row) = rows.iter().position(|row| row.len() != items.len()) {
            return Err(MiningError::InvalidParameter(format!(
                "row {row} has {} cells, expected {}",
                rows[row].len(),
                items.len()
            )));
        }

        let mut order: Vec<usize> = (0..items.len()).collect();
        order.sort_by(|a, b| items[*a].cmp(&items[*b]));
        if let Some(pair) = order.windows(2).find(|pair| items[pair[0]] == items[pair[1]]) {
            return Err(MiningError::InvalidParameter(format!(
                "item `{}` appears in more than one column",
                items[pair[0]]
            )));
        }

        let mut columns = Vec::with_capacity(items.len());
        for &source in &order {
            let mut bits = TransactionBits::zeroed(rows.len());
            for (row, cells) in rows.iter().enumerate() {
                if cells[source] {
                    bits.set(row);
                }
            }
            columns.push(bits);
        }

        let items = order.into_iter().map(|source| items[source].clone()).collect();
        Ok(Self { transaction_ids, items, columns })
    }

    pub fn transaction_count(&self) -> usize {
        self.transaction_ids.len()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn transaction_ids(&self) -> &[String] {
        &self.transaction_ids
    }

    /// Items in universe order.
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn item(&self, index: usize) -> &ItemId {
        &self.items[index]
    }

    pub fn item_index(&self, item: &ItemId) -> Option<usize> {
        self.items.binary_search(item).ok()
    }

    pub fn column(&self, index: usize) -> &TransactionBits {
        &self.columns[index]
    }

    /// Items present in the transaction at `row`.
    pub fn transaction(&self, row: usize) -> Itemset {
        self.columns
            .iter()
            .zip(&self.items)
            .filter(|(column, _)| column.contains(row))
            .map(|(_, item)| item.clone())
            .collect()
    }

    /// Number of transactions containing every item in `indices`.
    pub fn support_count(&self, indices: &[usize]) -> usize {
        match indices {
            [] => self.transaction_count(),
            [only] => self.columns[*only].count_ones(),
            [first, second] => self.columns[*first].intersection_count(&self.columns[*second]),
            [first, middle @ .., last] => {
                let mut scratch = self.columns[*first].clone();
                for index in middle {
                    scratch.intersect_with(&self.columns[*index]);
                }
                scratch.intersection_count(&self.columns[*last])
            }
        }
    }
}
