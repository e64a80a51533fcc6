//! Spending breakdown by category, the data behind the pie chart and
//! per-category item lists in the UI.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::receipt::{round_cents, Receipt, ReceiptItem};

/// Spend within one category.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CategorySpend {
    pub category: String,
    pub total: f64,
    pub items: Vec<ReceiptItem>,
}

/// Per-category spending, categories in first-seen order.
#[derive(Debug, Clone, Default, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SpendingBreakdown {
    pub categories: Vec<CategorySpend>,
    /// Sum of item prices across all categories (tax excluded)
    pub total: f64,
}

impl SpendingBreakdown {
    /// Group items by category.
    pub fn from_items<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a ReceiptItem>,
    {
        let mut categories: Vec<CategorySpend> = Vec::new();

        for item in items {
            // Category counts are tiny; a linear scan keeps insertion order.
            match categories.iter_mut().find(|c| c.category == item.category) {
                Some(spend) => {
                    spend.total += item.price;
                    spend.items.push(item.clone());
                }
                None => categories.push(CategorySpend {
                    category: item.category.clone(),
                    total: item.price,
                    items: vec![item.clone()],
                }),
            }
        }

        let mut total = 0.0;
        for spend in &mut categories {
            spend.total = round_cents(spend.total);
            total += spend.total;
        }

        Self {
            categories,
            total: round_cents(total),
        }
    }

    /// Breakdown of a single receipt.
    pub fn from_receipt(receipt: &Receipt) -> Self {
        Self::from_items(&receipt.items)
    }

    /// Breakdown across many receipts.
    pub fn from_receipts(receipts: &[Receipt]) -> Self {
        Self::from_items(receipts.iter().flat_map(|r| r.items.iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, price: f64, category: &str) -> ReceiptItem {
        ReceiptItem {
            name: name.to_string(),
            price,
            category: category.to_string(),
        }
    }

    #[test]
    fn test_groups_in_first_seen_order() {
        let items = vec![
            item("Milk", 3.49, "Groceries"),
            item("Batteries", 8.99, "Household"),
            item("Eggs", 4.29, "Groceries"),
        ];

        let breakdown = SpendingBreakdown::from_items(&items);

        assert_eq!(breakdown.categories.len(), 2);
        assert_eq!(breakdown.categories[0].category, "Groceries");
        assert_eq!(breakdown.categories[0].total, 7.78);
        assert_eq!(breakdown.categories[0].items[1].name, "Eggs");
        assert_eq!(breakdown.categories[1].category, "Household");
        assert_eq!(breakdown.total, 16.77);
    }

    #[test]
    fn test_empty_breakdown() {
        let breakdown = SpendingBreakdown::from_receipts(&[]);
        assert!(breakdown.categories.is_empty());
        assert_eq!(breakdown.total, 0.0);
    }

    #[test]
    fn test_across_receipts_excludes_tax() {
        let a = Receipt::new(
            "a.jpg".into(),
            String::new(),
            vec![item("Coffee", 4.50, "Dining")],
            0.40,
            String::new(),
        );
        let b = Receipt::new(
            "b.jpg".into(),
            String::new(),
            vec![item("Bagel", 2.25, "Dining"), item("Gum", 1.00, "Snacks")],
            0.30,
            String::new(),
        );

        let breakdown = SpendingBreakdown::from_receipts(&[a, b]);

        assert_eq!(breakdown.categories[0].category, "Dining");
        assert_eq!(breakdown.categories[0].total, 6.75);
        assert_eq!(breakdown.categories[0].items.len(), 2);
        assert_eq!(breakdown.total, 7.75);
    }
}
