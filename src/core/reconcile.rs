use crate::core::matcher::{locate_by_amount, merge_accounts};
use crate::core::memo::{Memo, MemoOptions, MemoProcessor};
use crate::domain::model::{ReconcileReport, TransactionUpdate};
use crate::domain::ports::{BudgetService, Confirm, OrderSource};
use crate::utils::error::{Result, YnaError};

#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    pub markdown: bool,
    pub suppress_partial_order_warning: bool,
}

/// Matches pending budget transactions to order transactions and writes memos back.
pub struct Reconciler<B: BudgetService, P: Confirm> {
    budget: B,
    sources: Vec<Box<dyn OrderSource>>,
    processor: MemoProcessor,
    confirm: P,
    options: ReconcileOptions,
}

impl<B: BudgetService, P: Confirm> Reconciler<B, P> {
    pub fn new(
        budget: B,
        sources: Vec<Box<dyn OrderSource>>,
        processor: MemoProcessor,
        confirm: P,
        options: ReconcileOptions,
    ) -> Self {
        Self {
            budget,
            sources,
            processor,
            confirm,
            options,
        }
    }

    pub async fn run(&self) -> Result<ReconcileReport> {
        let batch = match self.budget.pending_transactions().await {
            Ok(batch) => batch,
            Err(YnaError::YnabSetupError { message }) => {
                tracing::warn!("YNAB setup incomplete: {}", message);
                println!("❌ No matching Transactions found in YNAB. Exiting.");
                return Ok(ReconcileReport::default());
            }
            Err(e) => return Err(e),
        };

        let mut report = ReconcileReport {
            pending: batch.transactions.len(),
            ..ReconcileReport::default()
        };

        println!("🔍 Starting search for Amazon transactions across all accounts...");
        let mut per_account = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            println!("Fetching transactions for {}...", source.account_name());
            let transactions = source.matched_transactions().await?;
            println!(
                "✅ {} transactions retrieved for {}.",
                transactions.len(),
                source.account_name()
            );
            per_account.push(transactions);
        }

        let mut pool = merge_accounts(per_account);
        println!(
            "✅ Total: {} Amazon transactions retrieved successfully across {} account(s).",
            pool.len(),
            self.sources.len()
        );

        let memo_options = MemoOptions {
            markdown: self.options.markdown,
            show_account: self.sources.len() > 1,
            suppress_partial_order_warning: self.options.suppress_partial_order_warning,
        };

        println!("🔍 Starting to look for matching transactions...");
        for transaction in &batch.transactions {
            println!(
                "\nLooking for an Amazon Transaction that matches this YNAB transaction: {} ${:.2}",
                transaction.date,
                -transaction.amount()
            );
            tracing::debug!("YNAB transaction amount [dollars]: {}", transaction.amount());

            let Some(index) = locate_by_amount(&pool, transaction.amount()) else {
                println!("⚠️  **** Could not find a matching Amazon Transaction!");
                report.unmatched += 1;
                continue;
            };
            report.matched += 1;

            let candidate = &pool[index];
            println!(
                "Matching Amazon Transaction ({}): {} ${:.2}",
                candidate.account_name, candidate.completed_date, candidate.transaction_total
            );

            let memo = Memo::new(candidate, memo_options);
            println!("Memo:\n{}", memo.render());

            let processed = self.processor.process(&memo).await?;
            println!("Processed Memo:\n{}", processed);

            if candidate.completed_date != transaction.date {
                println!(
                    "⚠️  **** The dates don't match! YNAB: {} Amazon: {}",
                    transaction.date, candidate.completed_date
                );
                if !self
                    .confirm
                    .confirm("Continue matching this transaction anyway?")?
                {
                    println!("Skipping this transaction...");
                    report.skipped += 1;
                    continue;
                }
            }

            if !self.confirm.confirm("Update YNAB transaction memo?")? {
                println!("Skipping YNAB transaction update...\n");
                println!("Memo Preview:\n{}", processed);
                report.skipped += 1;
                continue;
            }

            println!("Updating YNAB transaction memo...");
            self.budget
                .update_transaction(&TransactionUpdate {
                    transaction_id: transaction.id.clone(),
                    memo: processed,
                    payee_id: batch.completed_payee.id.clone(),
                })
                .await?;

            // 已寫回的訂單交易不再參與後續比對
            pool.remove(index);
            report.updated += 1;
        }

        tracing::info!(
            "Reconcile finished: {} pending, {} matched, {} updated, {} skipped, {} unmatched",
            report.pending,
            report.matched,
            report.updated,
            report.skipped,
            report.unmatched
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{
        MatchedOrderTransaction, OrderItem, Payee, PendingBatch, PendingTransaction,
    };
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn pending(id: &str, milliunits: i64, day: u32) -> PendingTransaction {
        PendingTransaction {
            id: id.to_string(),
            date: date(day),
            amount_milliunits: milliunits,
            memo: None,
            payee_id: Some("needs-memo".to_string()),
            deleted: false,
        }
    }

    fn order_txn(number: &str, total: Decimal, day: u32, account: &str) -> MatchedOrderTransaction {
        MatchedOrderTransaction {
            completed_date: date(day),
            transaction_total: total,
            order_total: total,
            order_number: number.to_string(),
            order_link: format!(
                "https://www.amazon.com/gp/your-account/order-details?orderID={}",
                number
            ),
            items: vec![OrderItem {
                title: format!("Item of {}", number),
                link: None,
                quantity: None,
            }],
            account_name: account.to_string(),
        }
    }

    struct FakeBudget {
        batch: Option<PendingBatch>,
        updates: Mutex<Vec<TransactionUpdate>>,
    }

    #[async_trait]
    impl BudgetService for FakeBudget {
        async fn pending_transactions(&self) -> Result<PendingBatch> {
            self.batch.clone().ok_or_else(|| YnaError::YnabSetupError {
                message: "payee missing".to_string(),
            })
        }

        async fn update_transaction(&self, update: &TransactionUpdate) -> Result<()> {
            self.updates.lock().unwrap().push(update.clone());
            Ok(())
        }
    }

    struct FakeSource {
        name: String,
        transactions: Vec<MatchedOrderTransaction>,
    }

    #[async_trait]
    impl OrderSource for FakeSource {
        fn account_name(&self) -> &str {
            &self.name
        }

        async fn matched_transactions(&self) -> Result<Vec<MatchedOrderTransaction>> {
            Ok(self.transactions.clone())
        }
    }

    struct Scripted {
        answers: Mutex<VecDeque<bool>>,
        questions: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(answers: &[bool]) -> Self {
            Self {
                answers: Mutex::new(answers.iter().copied().collect()),
                questions: Mutex::new(Vec::new()),
            }
        }
    }

    impl Confirm for Scripted {
        fn confirm(&self, question: &str) -> Result<bool> {
            self.questions.lock().unwrap().push(question.to_string());
            Ok(self.answers.lock().unwrap().pop_front().unwrap_or(false))
        }
    }

    fn budget(transactions: Vec<PendingTransaction>) -> FakeBudget {
        FakeBudget {
            batch: Some(PendingBatch {
                transactions,
                completed_payee: Payee {
                    id: "amazon".to_string(),
                    name: "Amazon".to_string(),
                    deleted: false,
                },
            }),
            updates: Mutex::new(Vec::new()),
        }
    }

    fn source(name: &str, transactions: Vec<MatchedOrderTransaction>) -> Box<dyn OrderSource> {
        Box::new(FakeSource {
            name: name.to_string(),
            transactions,
        })
    }

    #[tokio::test]
    async fn test_updates_confirmed_matches_and_consumes_pool() {
        let reconciler = Reconciler::new(
            budget(vec![pending("t1", -25_990, 1), pending("t2", -25_990, 1)]),
            vec![source("Account 1", vec![order_txn("113-1", dec!(25.99), 1, "Account 1")])],
            MemoProcessor::new(None),
            Scripted::new(&[true, true]),
            ReconcileOptions::default(),
        );

        let report = reconciler.run().await.unwrap();
        assert_eq!(
            report,
            ReconcileReport {
                pending: 2,
                matched: 1,
                updated: 1,
                skipped: 0,
                unmatched: 1,
            }
        );

        let updates = reconciler.budget.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].transaction_id, "t1");
        assert_eq!(updates[0].payee_id, "amazon");
        assert!(updates[0].memo.starts_with("- Item of 113-1"));
    }

    #[tokio::test]
    async fn test_date_mismatch_asks_before_update() {
        let reconciler = Reconciler::new(
            budget(vec![pending("t1", -10_000, 1), pending("t2", -5_000, 2)]),
            vec![source(
                "Account 1",
                vec![
                    order_txn("113-1", dec!(10), 3, "Account 1"),
                    order_txn("113-2", dec!(5), 2, "Account 1"),
                ],
            )],
            MemoProcessor::new(None),
            Scripted::new(&[false, false]),
            ReconcileOptions::default(),
        );

        let report = reconciler.run().await.unwrap();
        assert_eq!(report.matched, 2);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.updated, 0);
        assert!(reconciler.budget.updates.lock().unwrap().is_empty());

        let questions = reconciler.confirm.questions.lock().unwrap();
        assert_eq!(
            *questions,
            vec![
                "Continue matching this transaction anyway?".to_string(),
                "Update YNAB transaction memo?".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_date_mismatch_continue_then_update() {
        let reconciler = Reconciler::new(
            budget(vec![pending("t1", -10_000, 1)]),
            vec![source("Account 1", vec![order_txn("113-1", dec!(10), 3, "Account 1")])],
            MemoProcessor::new(None),
            Scripted::new(&[true, true]),
            ReconcileOptions::default(),
        );

        let report = reconciler.run().await.unwrap();
        assert_eq!(report.matched, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(report.skipped, 0);

        let updates = reconciler.budget.updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].transaction_id, "t1");
        assert!(updates[0].memo.starts_with("- Item of 113-1"));

        let questions = reconciler.confirm.questions.lock().unwrap();
        assert_eq!(
            *questions,
            vec![
                "Continue matching this transaction anyway?".to_string(),
                "Update YNAB transaction memo?".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_multiple_accounts_tag_memo() {
        let reconciler = Reconciler::new(
            budget(vec![pending("t1", -7_500, 4)]),
            vec![
                source("Account 1", vec![]),
                source("Account 2", vec![order_txn("114-9", dec!(7.50), 4, "Account 2")]),
            ],
            MemoProcessor::new(None),
            Scripted::new(&[true]),
            ReconcileOptions::default(),
        );

        reconciler.run().await.unwrap();
        let updates = reconciler.budget.updates.lock().unwrap();
        assert!(updates[0].memo.starts_with("[Account 2]\n"));
    }

    #[tokio::test]
    async fn test_missing_payee_ends_quietly() {
        let reconciler = Reconciler::new(
            FakeBudget {
                batch: None,
                updates: Mutex::new(Vec::new()),
            },
            vec![source("Account 1", vec![])],
            MemoProcessor::new(None),
            Scripted::new(&[]),
            ReconcileOptions::default(),
        );

        assert_eq!(reconciler.run().await.unwrap(), ReconcileReport::default());
    }
}
