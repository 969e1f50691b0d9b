pub mod cache;
pub mod matcher;
pub mod memo;
pub mod reconcile;
pub mod retriever;

pub use crate::domain::model::{MatchedOrderTransaction, PendingTransaction, ReconcileReport};
pub use crate::domain::ports::{
    BudgetService, Confirm, MemoSummarizer, OrderHistoryClient, OrderSource, Storage,
};
pub use crate::utils::error::Result;
