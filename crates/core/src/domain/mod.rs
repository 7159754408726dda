pub mod item;
pub mod itemset;
