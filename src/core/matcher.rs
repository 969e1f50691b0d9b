use crate::domain::model::{MatchedOrderTransaction, Order, OrderTransaction};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Index of the first order transaction whose absolute total equals `amount`'s.
pub fn locate_by_amount(pool: &[MatchedOrderTransaction], amount: Decimal) -> Option<usize> {
    let wanted = amount.abs();
    pool.iter()
        .position(|candidate| candidate.transaction_total.abs() == wanted)
}

/// Joins payment lines with their orders. Payments whose order was not fetched are dropped.
pub fn join_transactions(
    orders: &[Order],
    transactions: &[OrderTransaction],
    account_name: &str,
) -> Vec<MatchedOrderTransaction> {
    let orders_by_number: HashMap<&str, &Order> = orders
        .iter()
        .map(|order| (order.order_number.as_str(), order))
        .collect();

    transactions
        .iter()
        .filter_map(|transaction| {
            match orders_by_number.get(transaction.order_number.as_str()) {
                Some(order) => Some(MatchedOrderTransaction::from_transaction_and_order(
                    transaction,
                    order,
                    account_name,
                )),
                None => {
                    tracing::debug!(
                        "Transaction {} not found in retrieved orders.",
                        transaction.order_number
                    );
                    None
                }
            }
        })
        .collect()
}

/// Concatenates per-account results in account order.
pub fn merge_accounts(
    per_account: Vec<Vec<MatchedOrderTransaction>>,
) -> Vec<MatchedOrderTransaction> {
    per_account.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn matched(total: Decimal, account: &str) -> MatchedOrderTransaction {
        MatchedOrderTransaction {
            completed_date: date(1),
            transaction_total: total,
            order_total: total,
            order_number: format!("113-{}", total),
            order_link: "https://www.amazon.com/gp/your-account/order-details?orderID=113"
                .to_string(),
            items: vec![],
            account_name: account.to_string(),
        }
    }

    fn order(number: &str, total: Decimal) -> Order {
        Order {
            order_number: number.to_string(),
            order_placed_date: date(1),
            grand_total: total,
            order_details_link: format!(
                "https://www.amazon.com/gp/your-account/order-details?orderID={}",
                number
            ),
            items: vec![],
        }
    }

    #[test]
    fn test_first_element_is_a_valid_match() {
        let pool = vec![matched(dec!(25.99), "Account 1"), matched(dec!(10.00), "Account 1")];
        assert_eq!(locate_by_amount(&pool, dec!(-25.99)), Some(0));
        assert_eq!(locate_by_amount(&pool, dec!(-10)), Some(1));
    }

    #[test]
    fn test_match_uses_absolute_amount() {
        let pool = vec![matched(dec!(-12.50), "Account 1")];
        assert_eq!(locate_by_amount(&pool, dec!(12.5)), Some(0));
        assert_eq!(locate_by_amount(&pool, dec!(-12.50)), Some(0));
        assert_eq!(locate_by_amount(&pool, dec!(12.51)), None);
    }

    #[test]
    fn test_first_of_duplicates_wins() {
        let pool = vec![matched(dec!(5), "Account 1"), matched(dec!(5), "Account 2")];
        assert_eq!(locate_by_amount(&pool, dec!(-5)), Some(0));
    }

    #[test]
    fn test_join_drops_unknown_orders() {
        let orders = vec![order("113-1", dec!(40.00))];
        let transactions = vec![
            OrderTransaction {
                completed_date: date(2),
                grand_total: dec!(-25.99),
                order_number: "113-1".to_string(),
            },
            OrderTransaction {
                completed_date: date(3),
                grand_total: dec!(-9.99),
                order_number: "113-404".to_string(),
            },
        ];

        let joined = join_transactions(&orders, &transactions, "Account 1");
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].transaction_total, dec!(25.99));
        assert_eq!(joined[0].order_total, dec!(40.00));
        assert_eq!(joined[0].completed_date, date(2));
    }

    #[test]
    fn test_merge_keeps_account_tags() {
        let merged = merge_accounts(vec![
            vec![matched(dec!(1), "Account 1")],
            vec![],
            vec![matched(dec!(2), "Account 3"), matched(dec!(3), "Account 3")],
        ]);
        let accounts: Vec<&str> = merged.iter().map(|m| m.account_name.as_str()).collect();
        assert_eq!(accounts, vec!["Account 1", "Account 3", "Account 3"]);
    }
}
