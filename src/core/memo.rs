use crate::domain::model::{MatchedOrderTransaction, OrderItem, SummaryRequest};
use crate::domain::ports::MemoSummarizer;
use crate::utils::error::{Result, YnaError};
use rust_decimal::Decimal;
use std::sync::Arc;

/// YNAB memo 的字元上限
pub const MEMO_LIMIT: usize = 500;

const ELLIPSIS: &str = "...";
const PLAIN_ITEMS_HEADER: &str = "Items";
const MARKDOWN_ITEMS_HEADER: &str = "**Items**";
/// Below this many free characters a non-fitting item is replaced by "..." instead of being cut.
const MIN_PARTIAL_ITEM: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoOptions {
    pub markdown: bool,
    pub show_account: bool,
    pub suppress_partial_order_warning: bool,
}

/// Structured memo for one matched order transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memo {
    account: Option<String>,
    partial_warning: Option<String>,
    items: Vec<OrderItem>,
    order_number: String,
    order_link: String,
    markdown: bool,
}

pub fn partial_order_warning(order_total: Decimal) -> String {
    format!(
        "-This transaction doesn't represent the entire order. The order total is ${:.2}-",
        order_total
    )
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

impl Memo {
    pub fn new(transaction: &MatchedOrderTransaction, options: MemoOptions) -> Self {
        let partial_warning = (transaction.is_partial()
            && !options.suppress_partial_order_warning)
            .then(|| partial_order_warning(transaction.order_total));

        Self {
            account: options
                .show_account
                .then(|| transaction.account_name.clone()),
            partial_warning,
            items: transaction.items.clone(),
            order_number: transaction.order_number.clone(),
            order_link: transaction.order_link.clone(),
            markdown: options.markdown,
        }
    }

    fn account_line(&self) -> Option<String> {
        self.account.as_ref().map(|name| format!("[{}]", name))
    }

    fn order_link_line(&self) -> String {
        if self.markdown {
            format!("[Order #{}]({})", self.order_number, self.order_link)
        } else {
            self.order_link.clone()
        }
    }

    fn item_title(&self, item: &OrderItem) -> String {
        match (&item.link, self.markdown) {
            (Some(link), true) => format!("[{}]({})", item.title, link),
            _ => item.title.clone(),
        }
    }

    fn item_lines(&self, rich: bool) -> Vec<String> {
        let title = |item: &OrderItem| {
            if rich {
                self.item_title(item)
            } else {
                item.title.clone()
            }
        };

        match self.items.as_slice() {
            [] => Vec::new(),
            [single] => vec![format!("- {}", title(single))],
            many => many
                .iter()
                .enumerate()
                .map(|(i, item)| format!("{}. {}", i + 1, title(item)))
                .collect(),
        }
    }

    /// Full memo, no length limit applied.
    pub fn render(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        lines.extend(self.account_line());
        lines.extend(self.partial_warning.clone());

        if self.items.len() > 1 {
            let header = if self.markdown {
                MARKDOWN_ITEMS_HEADER
            } else {
                PLAIN_ITEMS_HEADER
            };
            lines.push(header.to_string());
        }
        lines.extend(self.item_lines(true));

        lines.push(String::new());
        lines.push(self.order_link_line());
        lines.join("\n")
    }

    /// Renders the memo so it never exceeds `limit` characters.
    ///
    /// A memo within the limit is returned as rendered. Otherwise markdown is dropped,
    /// the account tag, partial-order warning and order URL are kept, and items are
    /// added while they fit.
    pub fn fit(&self, limit: usize) -> String {
        let full = self.render();
        if char_len(&full) <= limit {
            return full;
        }

        let mut required: Vec<String> = Vec::new();
        required.extend(self.account_line());
        required.extend(self.partial_warning.clone());
        let header = (self.items.len() > 1).then(|| PLAIN_ITEMS_HEADER.to_string());
        let url_line = self.order_link.clone();

        // 每行多算一個換行字元
        let required_space: usize = required
            .iter()
            .chain(header.iter())
            .chain(std::iter::once(&url_line))
            .map(|line| char_len(line) + 1)
            .sum();
        let available = limit.saturating_sub(required_space);

        let kept = fit_item_lines(&self.item_lines(false), available);

        let mut lines = required;
        if let Some(header) = header {
            if !kept.is_empty() {
                lines.push(header);
            }
        }
        lines.extend(kept);
        lines.push(url_line);

        let memo = lines.join("\n");
        if char_len(&memo) > limit {
            tracing::warn!("Memo header lines alone exceed {} characters, cutting", limit);
            return truncate_chars(&memo, limit);
        }
        memo
    }

    pub fn summary_request(&self) -> SummaryRequest {
        SummaryRequest {
            items: self
                .items
                .iter()
                .map(|item| match item.quantity {
                    Some(quantity) if quantity > 1 => format!("{} ({})", item.title, quantity),
                    _ => item.title.clone(),
                })
                .collect(),
            markdown: self.markdown,
        }
    }

    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    /// Wraps a summarized item list with the account tag, warning and order link.
    ///
    /// The summary is cut to whatever room is left; `None` when nothing of it fits.
    pub fn compose_summary(&self, summary: &str, limit: usize) -> Option<String> {
        let summary = summary.trim();
        if summary.is_empty() {
            return None;
        }

        let head: Vec<String> = self.account_line().into_iter().collect();
        let mut tail: Vec<String> = self.partial_warning.clone().into_iter().collect();
        tail.push(String::new());
        tail.push(self.order_link_line());

        let line_count = head.len() + tail.len() + 1;
        let fixed: usize = head
            .iter()
            .chain(tail.iter())
            .map(|line| char_len(line))
            .sum::<usize>()
            + (line_count - 1);

        let budget = limit.checked_sub(fixed).filter(|budget| *budget > 0)?;
        let summary = if char_len(summary) > budget {
            truncate_chars(summary, budget).trim_end().to_string()
        } else {
            summary.to_string()
        };
        if summary.is_empty() {
            return None;
        }

        let mut lines = head;
        lines.push(summary);
        lines.extend(tail);
        Some(lines.join("\n"))
    }
}

fn fit_item_lines(item_lines: &[String], available: usize) -> Vec<String> {
    let mut kept = Vec::new();
    let mut used = 0;

    for line in item_lines {
        let cost = char_len(line) + 1;
        if used + cost <= available {
            kept.push(line.clone());
            used += cost;
            continue;
        }

        let remaining = available - used;
        if remaining >= MIN_PARTIAL_ITEM {
            let keep = remaining - 1 - ELLIPSIS.len();
            kept.push(format!("{}{}", truncate_chars(line, keep).trim_end(), ELLIPSIS));
        } else if remaining > ELLIPSIS.len() {
            kept.push(ELLIPSIS.to_string());
        }
        break;
    }

    kept
}

/// Turns a [`Memo`] into the final memo text, optionally through a summarizer.
pub struct MemoProcessor {
    summarizer: Option<Arc<dyn MemoSummarizer>>,
    limit: usize,
}

impl MemoProcessor {
    pub fn new(summarizer: Option<Arc<dyn MemoSummarizer>>) -> Self {
        Self {
            summarizer,
            limit: MEMO_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub async fn process(&self, memo: &Memo) -> Result<String> {
        if let (Some(summarizer), true) = (&self.summarizer, memo.has_items()) {
            tracing::info!("🤖 Using AI summarization");
            match summarizer.summarize(&memo.summary_request()).await {
                Ok(Some(summary)) => {
                    if let Some(composed) = memo.compose_summary(&summary, self.limit) {
                        tracing::info!(
                            "Processed memo to {} characters using AI",
                            char_len(&composed)
                        );
                        return Ok(composed);
                    }
                    tracing::warn!("AI summary left no room in the memo, falling back to truncation");
                }
                Ok(None) => {
                    tracing::warn!("AI summarization failed, falling back to truncation");
                }
                Err(YnaError::InvalidOpenAiKey) => return Err(YnaError::InvalidOpenAiKey),
                Err(e) => {
                    tracing::warn!("AI summarization failed ({}), falling back to truncation", e);
                }
            }
        }

        let full_length = char_len(&memo.render());
        let fitted = memo.fit(self.limit);
        let fitted_length = char_len(&fitted);
        if fitted_length < full_length {
            tracing::info!(
                "Processed memo from {} to {} characters using truncation",
                full_length,
                fitted_length
            );
        }
        Ok(fitted)
    }
}
