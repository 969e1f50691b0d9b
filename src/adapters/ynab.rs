use crate::adapters::http::{build_client, ensure_success, join_url};
use crate::domain::model::{Payee, PendingBatch, PendingTransaction, TransactionUpdate};
use crate::domain::ports::BudgetService;
use crate::utils::error::{Result, YnaError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_YNAB_API_URL: &str = "https://api.ynab.com/v1";
const SERVICE: &str = "YNAB";

#[derive(Debug, Clone)]
pub struct YnabConfig {
    pub base_url: String,
    pub api_key: String,
    pub budget_id: String,
    pub payee_to_process: String,
    pub payee_completed: String,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct PayeesData {
    payees: Vec<Payee>,
}

#[derive(Debug, Deserialize)]
struct TransactionsData {
    transactions: Vec<PendingTransaction>,
}

#[derive(Debug, Serialize)]
struct UpdateBody<'a> {
    transaction: UpdateFields<'a>,
}

#[derive(Debug, Serialize)]
struct UpdateFields<'a> {
    memo: &'a str,
    payee_id: &'a str,
}

pub struct YnabClient {
    client: Client,
    config: YnabConfig,
}

impl YnabClient {
    pub fn new(config: YnabConfig) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            config,
        })
    }

    fn budget_url(&self, path: &str) -> String {
        join_url(
            &self.config.base_url,
            &format!("budgets/{}/{}", self.config.budget_id, path),
        )
    }

    pub async fn payees(&self) -> Result<Vec<Payee>> {
        let url = self.budget_url("payees");
        tracing::debug!("Fetching YNAB payees from {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;
        let envelope: Envelope<PayeesData> = ensure_success(SERVICE, response).await?.json().await?;

        Ok(envelope
            .data
            .payees
            .into_iter()
            .filter(|payee| !payee.deleted)
            .collect())
    }

    pub async fn payee_transactions(&self, payee_id: &str) -> Result<Vec<PendingTransaction>> {
        let url = self.budget_url(&format!("payees/{}/transactions", payee_id));
        tracing::debug!("Fetching YNAB transactions from {}", url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;
        let envelope: Envelope<TransactionsData> =
            ensure_success(SERVICE, response).await?.json().await?;

        Ok(envelope
            .data
            .transactions
            .into_iter()
            .filter(|transaction| !transaction.deleted)
            .collect())
    }
}

fn find_payee(payees: &[Payee], name: &str) -> Result<Payee> {
    payees
        .iter()
        .find(|payee| payee.name == name)
        .cloned()
        .ok_or_else(|| YnaError::YnabSetupError {
            message: format!("Payee '{}' not found in budget", name),
        })
}

#[async_trait]
impl BudgetService for YnabClient {
    async fn pending_transactions(&self) -> Result<PendingBatch> {
        let payees = self.payees().await?;
        let to_process = find_payee(&payees, &self.config.payee_to_process)?;
        let completed_payee = find_payee(&payees, &self.config.payee_completed)?;

        let transactions = self.payee_transactions(&to_process.id).await?;
        tracing::info!(
            "📥 {} YNAB transactions waiting under payee '{}'",
            transactions.len(),
            to_process.name
        );

        Ok(PendingBatch {
            transactions,
            completed_payee,
        })
    }

    async fn update_transaction(&self, update: &TransactionUpdate) -> Result<()> {
        let url = self.budget_url(&format!("transactions/{}", update.transaction_id));
        let body = UpdateBody {
            transaction: UpdateFields {
                memo: &update.memo,
                payee_id: &update.payee_id,
            },
        };

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;
        ensure_success(SERVICE, response).await?;

        tracing::info!("✏️  Updated YNAB transaction {}", update.transaction_id);
        Ok(())
    }
}
