//! Plain-text tables for the print commands.

use crate::domain::model::{MatchedOrderTransaction, PendingTransaction};

/// Pads or cuts `s` to exactly `max_len` characters.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        format!("{:width$}", s, width = max_len)
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn single_line(s: &str) -> String {
    s.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

pub fn format_ynab_table(transactions: &[PendingTransaction]) -> String {
    let mut output = String::new();
    output.push_str(&format!("{:10} {:>12}  {}\n", "Date", "Amount", "Memo"));
    output.push_str(&"-".repeat(60));
    output.push('\n');

    for transaction in transactions {
        let memo = transaction
            .memo
            .as_deref()
            .map(single_line)
            .filter(|memo| !memo.is_empty())
            .unwrap_or_else(|| "n/a".to_string());
        output.push_str(&format!(
            "{:10} {:>12}  {}\n",
            transaction.date.format("%Y-%m-%d"),
            format!("${:.2}", -transaction.amount()),
            memo
        ));
    }

    output
}

pub fn format_amazon_table(transactions: &[MatchedOrderTransaction]) -> String {
    let link_width = transactions
        .iter()
        .map(|transaction| transaction.order_link.chars().count())
        .max()
        .unwrap_or(0)
        .max("Order Link".len());

    let mut output = String::new();
    output.push_str(&format!(
        "{:12} {:14} {:>17} {:>12}  {:20} {:link_width$}  {}\n",
        "Account",
        "Completed Date",
        "Transaction Total",
        "Order Total",
        "Order Number",
        "Order Link",
        "Item Names",
        link_width = link_width
    ));
    output.push_str(&"-".repeat(100 + link_width));
    output.push('\n');

    for transaction in transactions {
        let items = transaction
            .items
            .iter()
            .map(|item| item.title.as_str())
            .collect::<Vec<_>>()
            .join(" | ");
        output.push_str(&format!(
            "{} {:14} {:>17} {:>12}  {:20} {:link_width$}  {}\n",
            truncate(&transaction.account_name, 12),
            transaction.completed_date.format("%Y-%m-%d").to_string(),
            format!("${:.2}", transaction.transaction_total),
            format!("${:.2}", transaction.order_total),
            transaction.order_number,
            transaction.order_link,
            items,
            link_width = link_width
        ));
    }

    output
}
