//! Invoice × item basket matrix construction.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::records::LineRecord;
use crate::domain::item::ItemId;
use crate::errors::MiningError;
use crate::matrix::TransactionMatrix;

/// Which record field identifies an item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKey {
    #[default]
    StockCode,
    Description,
}

impl ItemKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StockCode => "stock_code",
            Self::Description => "description",
        }
    }

    /// Item id for `record`. Descriptions are trimmed; exports pad them with
    /// trailing spaces.
    pub(crate) fn key_for(&self, record: &LineRecord) -> Option<ItemId> {
        match self {
            Self::StockCode => Some(ItemId(record.stock_code.clone())),
            Self::Description => record
                .description
                .as_deref()
                .map(str::trim)
                .filter(|description| !description.is_empty())
                .map(ItemId::from),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKey {
    type Err = MiningError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "stock_code" | "id" => Ok(Self::StockCode),
            "description" => Ok(Self::Description),
            other => Err(MiningError::InvalidParameter(format!(
                "unsupported item key `{other}` (expected stock_code|description)"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BasketOptions {
    /// Keep only lines from this country.
    pub country: Option<String>,
    pub item_key: ItemKey,
}

/// Group lines by (invoice, item), sum quantities and mark an item present in
/// an invoice when the sum is positive. Invoices come out sorted by id.
pub fn build_matrix(records: &[LineRecord], options: &BasketOptions) -> TransactionMatrix {
    let mut baskets: BTreeMap<&str, BTreeMap<ItemId, i64>> = BTreeMap::new();

    for record in records {
        if let Some(country) = &options.country {
            if record.country.as_deref() != Some(country.as_str()) {
                continue;
            }
        }
        if record.quantity <= 0 || record.price <= Decimal::ZERO {
            continue;
        }
        let Some(item) = options.item_key.key_for(record) else {
            continue;
        };

        *baskets.entry(record.invoice.as_str()).or_default().entry(item).or_default() +=
            record.quantity;
    }

    debug!(
        invoices = baskets.len(),
        country = options.country.as_deref().unwrap_or("<all>"),
        item_key = options.item_key.as_str(),
        "basket matrix built"
    );

    TransactionMatrix::from_transactions(baskets.into_iter().map(|(invoice, items)| {
        let present = items.into_iter().filter(|(_, quantity)| *quantity > 0).map(|(item, _)| item);
        (invoice.to_owned(), present.collect::<Vec<_>>())
    }))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{build_matrix, BasketOptions, ItemKey};
    use crate::domain::item::ItemId;
    use crate::prep::records::LineRecord;

    fn line(invoice: &str, code: &str, quantity: i64, country: &str) -> LineRecord {
        LineRecord {
            invoice: invoice.to_owned(),
            stock_code: code.to_owned(),
            description: Some(format!("item {code}")),
            quantity,
            price: Decimal::ONE,
            customer_id: Some("1".to_owned()),
            country: Some(country.to_owned()),
        }
    }

    #[test]
    fn groups_lines_per_invoice_and_item() {
        let records = vec![
            line("2", "B", 1, "France"),
            line("1", "A", 2, "France"),
            line("1", "A", 3, "France"),
            line("1", "B", 1, "France"),
            line("3", "C", 1, "Germany"),
        ];

        let matrix = build_matrix(&records, &BasketOptions::default());

        assert_eq!(matrix.transaction_ids(), ["1", "2", "3"]);
        assert_eq!(matrix.transaction(0).to_string(), "{A, B}");
        assert_eq!(matrix.transaction(1).to_string(), "{B}");
        assert_eq!(matrix.item_count(), 3);
    }

    #[test]
    fn country_filter_and_description_keys() {
        let records = vec![line("1", "A", 2, "France"), line("2", "C", 1, "Germany")];
        let options =
            BasketOptions { country: Some("France".to_owned()), item_key: ItemKey::Description };

        let matrix = build_matrix(&records, &options);

        assert_eq!(matrix.transaction_count(), 1);
        assert_eq!(matrix.items(), [ItemId::from("item A")]);
    }

    #[test]
    fn description_keys_ignore_padding() {
        let mut padded = line("1", "A", 1, "France");
        padded.description = Some("ROSE DOORSTOP ".to_owned());
        let mut plain = line("2", "B", 1, "France");
        plain.description = Some("ROSE DOORSTOP".to_owned());
        let options = BasketOptions { item_key: ItemKey::Description, ..Default::default() };

        let matrix = build_matrix(&[padded, plain], &options);

        assert_eq!(matrix.items(), [ItemId::from("ROSE DOORSTOP")]);
        assert_eq!(matrix.support_count(&[0]), 2);
    }

    #[test]
    fn non_positive_lines_never_mark_presence() {
        let records = vec![line("1", "A", 2, "France"), line("1", "B", -2, "France")];
        let matrix = build_matrix(&records, &BasketOptions::default());

        assert_eq!(matrix.items(), [ItemId::from("A")]);
    }

    #[test]
    fn item_key_parses_aliases() {
        assert_eq!("id".parse::<ItemKey>(), Ok(ItemKey::StockCode));
        assert_eq!("Description".parse::<ItemKey>(), Ok(ItemKey::Description));
        assert!("sku".parse::<ItemKey>().is_err());
    }
}
