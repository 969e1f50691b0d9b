use crate::core::Storage;
use crate::domain::model::MatchedOrderTransaction;
use crate::utils::error::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// 預設快取兩小時
pub const DEFAULT_CACHE_TTL_MINUTES: u64 = 120;
/// 最長一年
pub const MAX_CACHE_TTL_MINUTES: u64 = 525_600;

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    fetched_at: DateTime<Utc>,
    transactions: Vec<MatchedOrderTransaction>,
}

/// Short-lived file cache for fetched order transactions, expired by age only.
pub struct TransactionCache<S: Storage> {
    storage: S,
    ttl: Duration,
}

impl<S: Storage> TransactionCache<S> {
    pub fn new(storage: S, ttl: Duration) -> Self {
        Self { storage, ttl }
    }

    /// File name built from the fetch parameters, anything outside `[a-z0-9.-]` becomes `_`.
    pub fn cache_key(account_name: &str, user: &str, years: &[String], days: u32) -> String {
        let raw = format!("{}_{}_{}_{}d", account_name, user, years.join("-"), days);
        let sanitized: String = raw
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("amazon_transactions_{}.json", sanitized)
    }

    pub async fn load(&self, key: &str) -> Option<Vec<MatchedOrderTransaction>> {
        self.load_at(key, Utc::now()).await
    }

    pub async fn load_at(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Option<Vec<MatchedOrderTransaction>> {
        let data = match self.storage.read_file(key).await {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!("Cache miss for {}: {}", key, e);
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_slice(&data) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Ignoring unreadable cache file {}: {}", key, e);
                return None;
            }
        };

        if now - entry.fetched_at > self.ttl {
            tracing::debug!("Cache entry {} expired (fetched at {})", key, entry.fetched_at);
            return None;
        }

        Some(entry.transactions)
    }

    pub async fn store(&self, key: &str, transactions: &[MatchedOrderTransaction]) -> Result<()> {
        self.store_at(key, transactions, Utc::now()).await
    }

    pub async fn store_at(
        &self,
        key: &str,
        transactions: &[MatchedOrderTransaction],
        fetched_at: DateTime<Utc>,
    ) -> Result<()> {
        let entry = CacheEntry {
            fetched_at,
            transactions: transactions.to_vec(),
        };
        let data = serde_json::to_vec(&entry)?;
        self.storage.write_file(key, &data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::LocalStorage;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn sample() -> Vec<MatchedOrderTransaction> {
        vec![MatchedOrderTransaction {
            completed_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            transaction_total: dec!(25.99),
            order_total: dec!(25.99),
            order_number: "113-1".to_string(),
            order_link: "https://www.amazon.com/gp/your-account/order-details?orderID=113-1"
                .to_string(),
            items: vec![],
            account_name: "Account 1".to_string(),
        }]
    }

    fn cache(dir: &TempDir) -> TransactionCache<LocalStorage> {
        TransactionCache::new(
            LocalStorage::new(dir.path().to_path_buf()),
            Duration::minutes(DEFAULT_CACHE_TTL_MINUTES as i64),
        )
    }

    #[tokio::test]
    async fn test_store_then_load_within_ttl() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        let key = TransactionCache::<LocalStorage>::cache_key("Account 1", "a@b.com", &["2024".to_string()], 31);

        cache.store(&key, &sample()).await.unwrap();
        assert_eq!(cache.load(&key).await, Some(sample()));
    }

    #[tokio::test]
    async fn test_expired_entry_is_ignored() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        let fetched_at = Utc::now() - Duration::hours(3);

        cache.store_at("old.json", &sample(), fetched_at).await.unwrap();
        assert_eq!(cache.load("old.json").await, None);
        assert_eq!(
            cache.load_at("old.json", fetched_at + Duration::minutes(119)).await,
            Some(sample())
        );
    }

    #[tokio::test]
    async fn test_missing_or_corrupt_file_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = cache(&dir);
        assert_eq!(cache.load("missing.json").await, None);

        std::fs::write(dir.path().join("corrupt.json"), b"not json").unwrap();
        assert_eq!(cache.load("corrupt.json").await, None);
    }

    #[test]
    fn test_cache_key_depends_on_parameters() {
        let years = vec!["2024".to_string()];
        let a = TransactionCache::<LocalStorage>::cache_key("Account 1", "a@b.com", &years, 31);
        let b = TransactionCache::<LocalStorage>::cache_key("Account 1", "a@b.com", &years, 60);
        let c = TransactionCache::<LocalStorage>::cache_key("Account 2", "c@d.com", &years, 31);

        assert_eq!(a, TransactionCache::<LocalStorage>::cache_key("Account 1", "a@b.com", &years, 31));
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, "amazon_transactions_account_1_a_b.com_2024_31d.json");

        let multi = TransactionCache::<LocalStorage>::cache_key(
            "Account 2",
            "../x@y.com",
            &["2023".to_string(), "2024".to_string()],
            14,
        );
        assert_eq!(multi, "amazon_transactions_account_2_.._x_y.com_2023-2024_14d.json");
        assert!(!multi.contains('/'));
    }
}
