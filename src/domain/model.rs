use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// YNAB 以 milliunits 表示金額 (1 dollar = 1000)
pub const MILLIUNITS_SCALE: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payee {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub deleted: bool,
}

/// A budgeting transaction still waiting for a memo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub id: String,
    pub date: NaiveDate,
    #[serde(rename = "amount")]
    pub amount_milliunits: i64,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub payee_id: Option<String>,
    #[serde(default)]
    pub deleted: bool,
}

impl PendingTransaction {
    /// Signed amount in dollars, negative for outflows.
    pub fn amount(&self) -> Decimal {
        Decimal::new(self.amount_milliunits, MILLIUNITS_SCALE)
    }
}

#[derive(Debug, Clone)]
pub struct PendingBatch {
    pub transactions: Vec<PendingTransaction>,
    pub completed_payee: Payee,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub title: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_number: String,
    pub order_placed_date: NaiveDate,
    pub grand_total: Decimal,
    pub order_details_link: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// Raw payment line from the order history, negative for charges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTransaction {
    pub completed_date: NaiveDate,
    pub grand_total: Decimal,
    pub order_number: String,
}

/// An order transaction joined with its order and tagged with the account it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedOrderTransaction {
    pub completed_date: NaiveDate,
    /// Sign inverted from the raw payment line, so charges are positive.
    pub transaction_total: Decimal,
    pub order_total: Decimal,
    pub order_number: String,
    pub order_link: String,
    pub items: Vec<OrderItem>,
    pub account_name: String,
}

impl MatchedOrderTransaction {
    pub fn from_transaction_and_order(
        transaction: &OrderTransaction,
        order: &Order,
        account_name: &str,
    ) -> Self {
        Self {
            completed_date: transaction.completed_date,
            transaction_total: -transaction.grand_total,
            order_total: order.grand_total,
            order_number: order.order_number.clone(),
            order_link: order.order_details_link.clone(),
            items: order.items.clone(),
            account_name: account_name.to_string(),
        }
    }

    /// True when this payment covers only part of the order.
    pub fn is_partial(&self) -> bool {
        self.transaction_total != self.order_total
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionUpdate {
    pub transaction_id: String,
    pub memo: String,
    pub payee_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub pending: usize,
    pub matched: usize,
    pub updated: usize,
    pub skipped: usize,
    pub unmatched: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRequest {
    pub items: Vec<String>,
    pub markdown: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_pending_amount_from_milliunits() {
        let txn = PendingTransaction {
            id: "t1".to_string(),
            date: date("2024-03-01"),
            amount_milliunits: -25_990,
            memo: None,
            payee_id: None,
            deleted: false,
        };
        assert_eq!(txn.amount(), dec!(-25.99));
    }

    #[test]
    fn test_matched_transaction_inverts_total() {
        let order = Order {
            order_number: "113-1".to_string(),
            order_placed_date: date("2024-02-27"),
            grand_total: dec!(40.00),
            order_details_link: "https://www.amazon.com/gp/your-account/order-details?orderID=113-1"
                .to_string(),
            items: vec![],
        };
        let txn = OrderTransaction {
            completed_date: date("2024-03-01"),
            grand_total: dec!(-25.99),
            order_number: "113-1".to_string(),
        };

        let matched = MatchedOrderTransaction::from_transaction_and_order(&txn, &order, "Account 2");
        assert_eq!(matched.transaction_total, dec!(25.99));
        assert_eq!(matched.account_name, "Account 2");
        assert!(matched.is_partial());
    }

    #[test]
    fn test_pending_transaction_deserializes_ynab_shape() {
        let json = r#"{"id":"abc","date":"2024-03-01","amount":-12340,"memo":null,"payee_id":"p1","approved":false}"#;
        let txn: PendingTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(txn.amount_milliunits, -12340);
        assert_eq!(txn.memo, None);
        assert!(!txn.deleted);
    }
}
