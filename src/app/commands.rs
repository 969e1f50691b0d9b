use crate::adapters::amazon::HttpOrderHistoryClient;
use crate::adapters::openai::OpenAiSummarizer;
use crate::adapters::storage::LocalStorage;
use crate::adapters::ynab::YnabClient;
use crate::app::display::{format_amazon_table, format_ynab_table};
use crate::config::settings::{AmazonAccount, Settings};
use crate::core::cache::TransactionCache;
use crate::core::memo::MemoProcessor;
use crate::core::reconcile::{ReconcileOptions, Reconciler};
use crate::core::retriever::{AmazonTransactionRetriever, RetrieverOptions};
use crate::domain::model::ReconcileReport;
use crate::domain::ports::{BudgetService, Confirm, MemoSummarizer, OrderSource};
use crate::utils::error::{Result, YnaError};
use std::sync::Arc;

pub fn build_retriever(
    settings: &Settings,
    account: &AmazonAccount,
    options: RetrieverOptions,
) -> Result<AmazonTransactionRetriever<HttpOrderHistoryClient, LocalStorage>> {
    let client = HttpOrderHistoryClient::new(
        &settings.amazon_api_url,
        &account.username,
        account.password.expose(),
    )?;
    let cache = TransactionCache::new(
        LocalStorage::new(settings.cache_dir.clone()),
        settings.cache_ttl()?,
    );

    AmazonTransactionRetriever::new(
        account.name.clone(),
        account.username.clone(),
        client,
        Some(cache),
        options,
    )
}

pub fn build_sources(
    settings: &Settings,
    force_refresh: bool,
) -> Result<Vec<Box<dyn OrderSource>>> {
    let options = RetrieverOptions {
        order_years: Vec::new(),
        transaction_days: settings.transaction_days,
        force_refresh,
    };

    settings
        .amazon_accounts
        .iter()
        .map(|account| {
            build_retriever(settings, account, options.clone())
                .map(|retriever| Box::new(retriever) as Box<dyn OrderSource>)
        })
        .collect()
}

pub fn build_summarizer(settings: &Settings) -> Result<Option<Arc<dyn MemoSummarizer>>> {
    if !settings.use_ai_summarization {
        return Ok(None);
    }

    let api_key = settings
        .openai_api_key
        .as_ref()
        .ok_or(YnaError::MissingOpenAiKey)?;
    let summarizer = OpenAiSummarizer::new(
        &settings.openai_api_url,
        api_key.expose(),
        &settings.openai_model,
    )?;
    Ok(Some(Arc::new(summarizer)))
}

pub async fn run_reconcile<P: Confirm>(
    settings: &Settings,
    force_refresh: bool,
    confirm: P,
) -> Result<ReconcileReport> {
    let budget = YnabClient::new(settings.ynab_config()?)?;
    let sources = build_sources(settings, force_refresh)?;
    let processor = MemoProcessor::new(build_summarizer(settings)?);

    let reconciler = Reconciler::new(
        budget,
        sources,
        processor,
        confirm,
        ReconcileOptions {
            markdown: settings.use_markdown,
            suppress_partial_order_warning: settings.suppress_partial_order_warning,
        },
    );
    reconciler.run().await
}

/// Prints the pending YNAB transactions and returns how many there were.
pub async fn print_ynab(settings: &Settings) -> Result<usize> {
    let budget = YnabClient::new(settings.ynab_config()?)?;
    let batch = budget.pending_transactions().await?;

    println!("✅ Found {} transactions.", batch.transactions.len());
    if !batch.transactions.is_empty() {
        print!("{}", format_ynab_table(&batch.transactions));
    }
    Ok(batch.transactions.len())
}

pub async fn print_amazon(
    settings: &Settings,
    account: &AmazonAccount,
    options: RetrieverOptions,
) -> Result<usize> {
    let retriever = build_retriever(settings, account, options)?;
    let transactions = retriever.matched_transactions().await?;

    println!("✅ Found {} transactions.", transactions.len());
    if !transactions.is_empty() {
        print!("{}", format_amazon_table(&transactions));
    }
    Ok(transactions.len())
}
