use crate::domain::model::{
    MatchedOrderTransaction, Order, OrderTransaction, PendingBatch, SummaryRequest,
    TransactionUpdate,
};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// The budgeting side: where pending transactions come from and memos go back to.
#[async_trait]
pub trait BudgetService: Send + Sync {
    async fn pending_transactions(&self) -> Result<PendingBatch>;
    async fn update_transaction(&self, update: &TransactionUpdate) -> Result<()>;
}

/// Raw order history of a single account.
#[async_trait]
pub trait OrderHistoryClient: Send + Sync {
    async fn order_history(&self, year: &str) -> Result<Vec<Order>>;
    async fn transactions(&self, days: u32) -> Result<Vec<OrderTransaction>>;
}

/// Joined order transactions of a single account, ready for matching.
#[async_trait]
pub trait OrderSource: Send + Sync {
    fn account_name(&self) -> &str;
    async fn matched_transactions(&self) -> Result<Vec<MatchedOrderTransaction>>;
}

#[async_trait]
pub trait MemoSummarizer: Send + Sync {
    /// `Ok(None)` means the summarizer gave up and the caller should fall back to truncation.
    async fn summarize(&self, request: &SummaryRequest) -> Result<Option<String>>;
}

pub trait Confirm: Send + Sync {
    fn confirm(&self, question: &str) -> Result<bool>;
}
