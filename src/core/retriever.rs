use crate::core::cache::TransactionCache;
use crate::core::matcher::join_transactions;
use crate::core::Storage;
use crate::domain::model::MatchedOrderTransaction;
use crate::domain::ports::{OrderHistoryClient, OrderSource};
use crate::utils::error::{Result, YnaError};
use async_trait::async_trait;
use chrono::Datelike;

pub const DEFAULT_TRANSACTION_DAYS: u32 = 31;

/// "24" -> "2024"，四位數原樣保留，未指定時使用今年
pub fn normalize_years(years: &[String], current_year: i32) -> Result<Vec<String>> {
    if years.is_empty() {
        return Ok(vec![current_year.to_string()]);
    }

    years
        .iter()
        .map(|year| {
            let year = year.trim();
            if !year.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid_year(year));
            }
            match year.len() {
                2 => Ok(format!("20{}", year)),
                4 => Ok(year.to_string()),
                _ => Err(invalid_year(year)),
            }
        })
        .collect()
}

fn invalid_year(year: &str) -> YnaError {
    YnaError::InvalidConfigValueError {
        field: "order_years".to_string(),
        value: year.to_string(),
        reason: "Year must be specified as 2 or 4 digits (e.g. 21 or 2021)".to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct RetrieverOptions {
    pub order_years: Vec<String>,
    pub transaction_days: u32,
    pub force_refresh: bool,
}

impl Default for RetrieverOptions {
    fn default() -> Self {
        Self {
            order_years: Vec::new(),
            transaction_days: DEFAULT_TRANSACTION_DAYS,
            force_refresh: false,
        }
    }
}

/// Fetches and joins one account's order history, going through the cache unless refreshing.
pub struct AmazonTransactionRetriever<C: OrderHistoryClient, S: Storage> {
    account_name: String,
    user: String,
    client: C,
    cache: Option<TransactionCache<S>>,
    order_years: Vec<String>,
    transaction_days: u32,
    force_refresh: bool,
}

impl<C: OrderHistoryClient, S: Storage> AmazonTransactionRetriever<C, S> {
    pub fn new(
        account_name: impl Into<String>,
        user: impl Into<String>,
        client: C,
        cache: Option<TransactionCache<S>>,
        options: RetrieverOptions,
    ) -> Result<Self> {
        let order_years = normalize_years(&options.order_years, chrono::Local::now().year())?;
        Ok(Self {
            account_name: account_name.into(),
            user: user.into(),
            client,
            cache,
            order_years,
            transaction_days: options.transaction_days,
            force_refresh: options.force_refresh,
        })
    }

    async fn fetch_from_service(&self) -> Result<Vec<MatchedOrderTransaction>> {
        let mut orders = Vec::new();
        for year in &self.order_years {
            let yearly = self.client.order_history(year).await?;
            tracing::debug!("{}: {} orders in {}", self.account_name, yearly.len(), year);
            orders.extend(yearly);
        }
        orders.sort_by_key(|order| order.order_placed_date);

        let mut transactions = self.client.transactions(self.transaction_days).await?;
        transactions.sort_by_key(|transaction| transaction.completed_date);

        Ok(join_transactions(&orders, &transactions, &self.account_name))
    }
}

#[async_trait]
impl<C: OrderHistoryClient, S: Storage> OrderSource for AmazonTransactionRetriever<C, S> {
    fn account_name(&self) -> &str {
        &self.account_name
    }

    async fn matched_transactions(&self) -> Result<Vec<MatchedOrderTransaction>> {
        let key = TransactionCache::<S>::cache_key(
            &self.account_name,
            &self.user,
            &self.order_years,
            self.transaction_days,
        );

        if let (Some(cache), false) = (&self.cache, self.force_refresh) {
            if let Some(cached) = cache.load(&key).await {
                tracing::info!(
                    "📦 {}: using {} cached transactions",
                    self.account_name,
                    cached.len()
                );
                return Ok(cached);
            }
        }

        let transactions = self.fetch_from_service().await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(&key, &transactions).await {
                tracing::warn!("Could not write transaction cache: {}", e);
            }
        }

        Ok(transactions)
    }
}
