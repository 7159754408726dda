use std::collections::BTreeMap;

use super::basket::ItemKey;
use super::records::LineRecord;
use crate::domain::item::ItemId;
use crate::domain::itemset::Itemset;

/// Item id → human-readable description, first description seen wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemCatalog {
    names: BTreeMap<ItemId, String>,
}

impl ItemCatalog {
    pub fn from_records(records: &[LineRecord], item_key: ItemKey) -> Self {
        let mut names = BTreeMap::new();
        for record in records {
            let Some(description) = record.description.as_deref().map(str::trim) else {
                continue;
            };
            let Some(id) = item_key.key_for(record) else {
                continue;
            };
            names.entry(id).or_insert_with(|| description.to_owned());
        }
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn describe(&self, item: &ItemId) -> Option<&str> {
        self.names.get(item).map(String::as_str)
    }

    /// Descriptions for every member, falling back to the raw id.
    pub fn describe_all(&self, itemset: &Itemset) -> Vec<String> {
        itemset
            .iter()
            .map(|item| self.describe(item).map_or_else(|| item.to_string(), str::to_owned))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::ItemCatalog;
    use crate::domain::item::ItemId;
    use crate::domain::itemset::Itemset;
    use crate::prep::basket::ItemKey;
    use crate::prep::records::LineRecord;

    fn line(code: &str, description: Option<&str>) -> LineRecord {
        LineRecord {
            invoice: "1".to_owned(),
            stock_code: code.to_owned(),
            description: description.map(str::to_owned),
            quantity: 1,
            price: Decimal::ONE,
            customer_id: None,
            country: None,
        }
    }

    #[test]
    fn first_description_wins() {
        let catalog = ItemCatalog::from_records(
            &[
                line("22492", Some("MINI PAINT SET VINTAGE ")),
                line("22492", Some("mini paint set")),
                line("23084", None),
            ],
            ItemKey::StockCode,
        );

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.describe(&ItemId::from(22492u64)), Some("MINI PAINT SET VINTAGE"));

        let itemset: Itemset = [ItemId::from("22492"), ItemId::from("23084")].into_iter().collect();
        assert_eq!(catalog.describe_all(&itemset), vec!["MINI PAINT SET VINTAGE", "23084"]);
    }

    #[test]
    fn description_keys_match_trimmed_targets() {
        let catalog = ItemCatalog::from_records(
            &[line("22492", Some("ROSE DOORSTOP  ")), line("23084", Some("   "))],
            ItemKey::Description,
        );

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.describe(&ItemId::from("ROSE DOORSTOP")), Some("ROSE DOORSTOP"));
    }
}
