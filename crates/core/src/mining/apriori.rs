//! Level-wise frequent itemset discovery (Apriori).
//!
//! Candidates of size `k` come from joining frequent `(k-1)`-itemsets that
//! share their first `k-2` members, then pruning any candidate with an
//! infrequent `(k-1)`-subset. Support is counted by intersecting the item
//! bit-vectors of the [`TransactionMatrix`].
//!
//! Internally itemsets are keyed by sorted column indices. Column order equals
//! the item universe order, so index keys and [`Itemset`]s sort identically.

use std::collections::HashSet;

use rayon::prelude::*;
use tracing::{debug, info};

use super::table::{FrequentItemset, FrequentItemsetTable};
use crate::domain::itemset::Itemset;
use crate::errors::MiningError;
use crate::matrix::TransactionMatrix;

/// Below this many candidates a level is counted on the calling thread.
const PARALLEL_MIN_CANDIDATES: usize = 256;

type Key = Vec<usize>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemsetMiner {
    parallel: bool,
    max_len: Option<usize>,
}

impl ItemsetMiner {
    pub fn new() -> Self {
        Self { parallel: false, max_len: None }
    }

    /// Count candidate support on the rayon pool.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Stop after itemsets of this size.
    pub fn with_max_len(mut self, max_len: Option<usize>) -> Self {
        self.max_len = max_len;
        self
    }

    pub fn mine(
        &self,
        matrix: &TransactionMatrix,
        min_support: f64,
    ) -> Result<FrequentItemsetTable, MiningError> {
        validate_min_support(min_support)?;
        if self.max_len == Some(0) {
            return Err(MiningError::InvalidParameter("max_len must be at least 1".to_owned()));
        }
        if matrix.transaction_count() == 0 {
            return Err(MiningError::EmptyInput(
                "transaction matrix has no transactions".to_owned(),
            ));
        }
        if matrix.item_count() == 0 {
            return Err(MiningError::EmptyInput("transaction matrix has no items".to_owned()));
        }

        let total = matrix.transaction_count();
        let mut table = FrequentItemsetTable::new(total, min_support);
        let mut candidates: Vec<Key> = (0..matrix.item_count()).map(|index| vec![index]).collect();
        let mut size = 1;

        loop {
            let candidate_count = candidates.len();
            let counts = self.count_support(matrix, &candidates);
            let frequent: Vec<(Key, usize)> = candidates
                .into_iter()
                .zip(counts)
                .filter(|(_, count)| support_fraction(*count, total) >= min_support)
                .collect();

            debug!(size, candidates = candidate_count, frequent = frequent.len(), "apriori level");
            if frequent.is_empty() {
                break;
            }

            let level = frequent
                .iter()
                .map(|(key, count)| {
                    Ok(FrequentItemset {
                        itemset: itemset_for(matrix, key)?,
                        count: *count,
                        support: support_fraction(*count, total),
                    })
                })
                .collect::<Result<Vec<_>, MiningError>>()?;
            table.push_level(level);

            if self.max_len.is_some_and(|max_len| size >= max_len) {
                break;
            }

            let previous: Vec<Key> = frequent.into_iter().map(|(key, _)| key).collect();
            candidates = generate_candidates(&previous);
            if candidates.is_empty() {
                break;
            }
            size += 1;
        }

        info!(
            transactions = total,
            items = matrix.item_count(),
            min_support,
            frequent_itemsets = table.len(),
            max_len = table.max_len(),
            "frequent itemsets mined"
        );
        Ok(table)
    }

    fn count_support(&self, matrix: &TransactionMatrix, candidates: &[Key]) -> Vec<usize> {
        // rayon's indexed collect keeps candidate order regardless of which
        // worker finishes first.
        if self.parallel && candidates.len() >= PARALLEL_MIN_CANDIDATES {
            candidates.par_iter().map(|key| matrix.support_count(key)).collect()
        } else {
            candidates.iter().map(|key| matrix.support_count(key)).collect()
        }
    }
}

impl Default for ItemsetMiner {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_min_support(min_support: f64) -> Result<(), MiningError> {
    if !(min_support > 0.0 && min_support <= 1.0) {
        return Err(MiningError::InvalidParameter(format!(
            "min_support must be in (0, 1], got {min_support}"
        )));
    }
    Ok(())
}

fn support_fraction(count: usize, total: usize) -> f64 {
    count as f64 / total as f64
}

fn itemset_for(matrix: &TransactionMatrix, key: &[usize]) -> Result<Itemset, MiningError> {
    Itemset::from_canonical(key.iter().map(|index| matrix.item(*index).clone()).collect())
}

/// Apriori-gen: join lexicographically ordered `(k-1)`-keys that share a
/// `(k-2)`-prefix, then prune candidates with an infrequent `(k-1)`-subset.
/// Output stays in lexicographic order.
fn generate_candidates(previous: &[Key]) -> Vec<Key> {
    let Some(width) = previous.first().map(Vec::len) else {
        return Vec::new();
    };
    let prefix = width - 1;
    let known: HashSet<&[usize]> = previous.iter().map(Vec::as_slice).collect();

    let mut candidates = Vec::new();
    let mut subset = Vec::with_capacity(width);
    for (position, left) in previous.iter().enumerate() {
        for right in &previous[position + 1..] {
            if left[..prefix] != right[..prefix] {
                break;
            }

            let mut candidate = left.clone();
            candidate.push(right[prefix]);

            // Dropping either of the last two members yields `left` or `right`.
            let all_subsets_frequent = (0..prefix).all(|skip| {
                subset.clear();
                subset.extend(
                    candidate
                        .iter()
                        .enumerate()
                        .filter(|(index, _)| *index != skip)
                        .map(|(_, member)| *member),
                );
                known.contains(subset.as_slice())
            });
            if all_subsets_frequent {
                candidates.push(candidate);
            }
        }
    }
    candidates
}
