//! Frequent itemset mining.

mod apriori;
mod table;

pub use apriori::ItemsetMiner;
pub use table::{FrequentItemset, FrequentItemsetTable};

use crate::errors::MiningError;
use crate::matrix::TransactionMatrix;

/// Mine every itemset whose support reaches `min_support`, single-threaded and
/// without a size cap.
pub fn mine(
    matrix: &TransactionMatrix,
    min_support: f64,
) -> Result<FrequentItemsetTable, MiningError> {
    ItemsetMiner::new().mine(matrix, min_support)
}
