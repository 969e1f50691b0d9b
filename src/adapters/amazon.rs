use crate::adapters::http::{build_client, ensure_success, join_url};
use crate::domain::model::{Order, OrderTransaction};
use crate::domain::ports::OrderHistoryClient;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

pub const DEFAULT_AMAZON_API_URL: &str = "http://localhost:8765";
const SERVICE: &str = "Amazon order history";

#[derive(Debug, Deserialize)]
struct OrdersResponse {
    orders: Vec<Order>,
}

#[derive(Debug, Deserialize)]
struct TransactionsResponse {
    transactions: Vec<OrderTransaction>,
}

/// Client for the order-history bridge service, authenticated with one account's credentials.
pub struct HttpOrderHistoryClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl HttpOrderHistoryClient {
    pub fn new(base_url: &str, username: &str, password: &str) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

#[async_trait]
impl OrderHistoryClient for HttpOrderHistoryClient {
    async fn order_history(&self, year: &str) -> Result<Vec<Order>> {
        let url = join_url(&self.base_url, "orders");
        tracing::debug!("Fetching {} order history for {}", year, self.username);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .query(&[("year", year)])
            .send()
            .await?;
        let body: OrdersResponse = ensure_success(SERVICE, response).await?.json().await?;
        Ok(body.orders)
    }

    async fn transactions(&self, days: u32) -> Result<Vec<OrderTransaction>> {
        let url = join_url(&self.base_url, "transactions");
        tracing::debug!("Fetching {} days of transactions for {}", days, self.username);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .query(&[("days", days)])
            .send()
            .await?;
        let body: TransactionsResponse = ensure_success(SERVICE, response).await?.json().await?;
        Ok(body.transactions)
    }
}
