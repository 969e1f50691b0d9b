use crate::adapters::amazon::DEFAULT_AMAZON_API_URL;
use crate::adapters::openai::{DEFAULT_OPENAI_API_URL, DEFAULT_OPENAI_MODEL};
use crate::adapters::ynab::{YnabConfig, DEFAULT_YNAB_API_URL};
use crate::core::cache::{DEFAULT_CACHE_TTL_MINUTES, MAX_CACHE_TTL_MINUTES};
use crate::core::retriever::DEFAULT_TRANSACTION_DAYS;
use crate::utils::error::{Result, YnaError};
use crate::utils::validation::{
    is_valid_email, validate_non_empty_string, validate_number_range, validate_positive_number,
    validate_required_field, validate_url, Validate,
};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_PAYEE_TO_PROCESS: &str = "Amazon - Needs Memo";
pub const DEFAULT_PAYEE_COMPLETED: &str = "Amazon";

/// A credential that never shows up in full in logs or Debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        match chars.len() {
            0 => "****empty****".to_string(),
            n if n <= 8 => "****".to_string(),
            n => format!(
                "{}****{}",
                chars[..4].iter().collect::<String>(),
                chars[n - 4..].iter().collect::<String>()
            ),
        }
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({})", self.masked())
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmazonAccount {
    pub name: String,
    pub username: String,
    pub password: Secret,
}

/// Layered key lookup: process environment first, then the TOML file.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    env: HashMap<String, String>,
    file: HashMap<String, String>,
}

impl ConfigSource {
    pub fn new(env: HashMap<String, String>, file: HashMap<String, String>) -> Self {
        Self { env, file }
    }

    pub fn from_process(config_file: Option<&Path>) -> Result<Self> {
        let file = match config_file {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                Self::parse_toml(&content)?
            }
            None => HashMap::new(),
        };
        Ok(Self::new(std::env::vars().collect(), file))
    }

    /// 解析扁平的 TOML 設定檔，鍵一律轉成小寫
    pub fn parse_toml(content: &str) -> Result<HashMap<String, String>> {
        let processed = substitute_env_vars(content)?;
        let table: toml::Table =
            toml::from_str(&processed).map_err(|e| YnaError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;

        table
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    toml::Value::String(s) => s,
                    toml::Value::Boolean(b) => b.to_string(),
                    toml::Value::Integer(i) => i.to_string(),
                    toml::Value::Float(f) => f.to_string(),
                    other => {
                        return Err(YnaError::ConfigValidationError {
                            field: key,
                            message: format!("Unsupported value type: {}", other.type_str()),
                        })
                    }
                };
                Ok((key.to_lowercase(), value))
            })
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let upper = key.to_uppercase();
        let lower = key.to_lowercase();
        self.env
            .get(&upper)
            .or_else(|| self.env.get(&lower))
            .or_else(|| self.file.get(&lower))
            .filter(|value| !value.trim().is_empty())
            .cloned()
    }

    fn get_bool(&self, key: &str) -> Result<bool> {
        match self.get(key) {
            None => Ok(false),
            Some(value) => match value.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(YnaError::InvalidConfigValueError {
                    field: key.to_string(),
                    value,
                    reason: "Expected a boolean (true/false)".to_string(),
                }),
            },
        }
    }

    fn get_number<T: std::str::FromStr>(&self, key: &str, default: T) -> Result<T> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| YnaError::InvalidConfigValueError {
                    field: key.to_string(),
                    value,
                    reason: "Expected a whole number".to_string(),
                }),
        }
    }
}

/// 替換環境變數 (例如 ${OPENAI_API_KEY})
fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| YnaError::ConfigError {
        message: e.to_string(),
    })?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    });

    Ok(result.to_string())
}

/// Numbered accounts (`AMAZON_USER_1`, `AMAZON_USER_2`, ...) scanned until the first gap,
/// falling back to the single `AMAZON_USER` pair.
pub fn amazon_accounts(source: &ConfigSource) -> Vec<AmazonAccount> {
    let mut accounts = Vec::new();

    let mut number = 1;
    while let (Some(user), Some(password)) = (
        source.get(&format!("amazon_user_{}", number)),
        source.get(&format!("amazon_password_{}", number)),
    ) {
        if is_valid_email(&user) {
            accounts.push(AmazonAccount {
                name: format!("Account {}", number),
                username: user.trim().to_string(),
                password: Secret::new(password),
            });
        } else {
            tracing::warn!("Skipping AMAZON_USER_{}: '{}' is not a valid email", number, user);
        }
        number += 1;
    }

    if accounts.is_empty() {
        if let (Some(user), Some(password)) =
            (source.get("amazon_user"), source.get("amazon_password"))
        {
            if is_valid_email(&user) {
                accounts.push(AmazonAccount {
                    name: "Account 1".to_string(),
                    username: user.trim().to_string(),
                    password: Secret::new(password),
                });
            } else {
                tracing::warn!("Skipping AMAZON_USER: '{}' is not a valid email", user);
            }
        }
    }

    accounts
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub ynab_api_key: Option<Secret>,
    pub ynab_budget_id: Option<Secret>,
    pub amazon_accounts: Vec<AmazonAccount>,
    pub openai_api_key: Option<Secret>,
    pub payee_to_process: String,
    pub payee_completed: String,
    pub use_markdown: bool,
    pub use_ai_summarization: bool,
    pub suppress_partial_order_warning: bool,
    pub ynab_api_url: String,
    pub openai_api_url: String,
    pub openai_model: String,
    pub amazon_api_url: String,
    pub cache_ttl_minutes: u64,
    pub transaction_days: u32,
    pub cache_dir: PathBuf,
    pub json_logs: bool,
}

impl Settings {
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        Self::from_source(&ConfigSource::from_process(config_file)?)
    }

    pub fn from_source(source: &ConfigSource) -> Result<Self> {
        let log_format = source.get("log_format").unwrap_or_else(|| "text".to_string());
        let json_logs = match log_format.to_lowercase().as_str() {
            "text" => false,
            "json" => true,
            _ => {
                return Err(YnaError::InvalidConfigValueError {
                    field: "log_format".to_string(),
                    value: log_format,
                    reason: "Expected 'text' or 'json'".to_string(),
                })
            }
        };

        Ok(Self {
            ynab_api_key: source.get("ynab_api_key").map(Secret::new),
            ynab_budget_id: source.get("ynab_budget_id").map(Secret::new),
            amazon_accounts: amazon_accounts(source),
            openai_api_key: source.get("openai_api_key").map(Secret::new),
            payee_to_process: source
                .get("ynab_payee_name_to_be_processed")
                .unwrap_or_else(|| DEFAULT_PAYEE_TO_PROCESS.to_string()),
            payee_completed: source
                .get("ynab_payee_name_processing_completed")
                .unwrap_or_else(|| DEFAULT_PAYEE_COMPLETED.to_string()),
            use_markdown: source.get_bool("ynab_use_markdown")?,
            use_ai_summarization: source.get_bool("use_ai_summarization")?,
            suppress_partial_order_warning: source.get_bool("suppress_partial_order_warning")?,
            ynab_api_url: source
                .get("ynab_api_url")
                .unwrap_or_else(|| DEFAULT_YNAB_API_URL.to_string()),
            openai_api_url: source
                .get("openai_api_url")
                .unwrap_or_else(|| DEFAULT_OPENAI_API_URL.to_string()),
            openai_model: source
                .get("openai_model")
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            amazon_api_url: source
                .get("amazon_api_url")
                .unwrap_or_else(|| DEFAULT_AMAZON_API_URL.to_string()),
            cache_ttl_minutes: source
                .get_number("amazon_cache_ttl_minutes", DEFAULT_CACHE_TTL_MINUTES)?,
            transaction_days: source
                .get_number("amazon_transaction_days", DEFAULT_TRANSACTION_DAYS)?,
            // 預設放在系統暫存目錄
            cache_dir: source
                .get("amazon_cache_dir")
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join("ynamazon")),
            json_logs,
        })
    }

    pub fn validate_ynab(&self) -> Result<()> {
        let api_key = validate_required_field("ynab_api_key", &self.ynab_api_key)?;
        validate_non_empty_string("ynab_api_key", api_key.expose())?;
        let budget_id = validate_required_field("ynab_budget_id", &self.ynab_budget_id)?;
        validate_non_empty_string("ynab_budget_id", budget_id.expose())?;
        validate_url("ynab_api_url", &self.ynab_api_url)?;
        validate_non_empty_string("ynab_payee_name_to_be_processed", &self.payee_to_process)?;
        validate_non_empty_string(
            "ynab_payee_name_processing_completed",
            &self.payee_completed,
        )?;
        Ok(())
    }

    pub fn validate_amazon(&self) -> Result<()> {
        if self.amazon_accounts.is_empty() {
            return Err(YnaError::ConfigError {
                message: "No Amazon account configured. Please set either:\n  \
                    - Single account: AMAZON_USER and AMAZON_PASSWORD\n  \
                    - Multiple accounts: AMAZON_USER_1/AMAZON_PASSWORD_1, AMAZON_USER_2/AMAZON_PASSWORD_2, etc."
                    .to_string(),
            });
        }
        validate_url("amazon_api_url", &self.amazon_api_url)?;
        validate_positive_number("amazon_transaction_days", self.transaction_days as u64, 1)?;
        self.cache_ttl()?;
        Ok(())
    }

    pub fn cache_ttl(&self) -> Result<chrono::Duration> {
        validate_number_range(
            "amazon_cache_ttl_minutes",
            self.cache_ttl_minutes,
            0,
            MAX_CACHE_TTL_MINUTES,
        )?;
        i64::try_from(self.cache_ttl_minutes)
            .ok()
            .and_then(chrono::Duration::try_minutes)
            .ok_or_else(|| YnaError::InvalidConfigValueError {
                field: "amazon_cache_ttl_minutes".to_string(),
                value: self.cache_ttl_minutes.to_string(),
                reason: "Value does not fit in a duration".to_string(),
            })
    }

    pub fn ynab_config(&self) -> Result<YnabConfig> {
        let api_key = validate_required_field("ynab_api_key", &self.ynab_api_key)?;
        let budget_id = validate_required_field("ynab_budget_id", &self.ynab_budget_id)?;
        Ok(YnabConfig {
            base_url: self.ynab_api_url.clone(),
            api_key: api_key.expose().to_string(),
            budget_id: budget_id.expose().to_string(),
            payee_to_process: self.payee_to_process.clone(),
            payee_completed: self.payee_completed.clone(),
        })
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        self.validate_ynab()?;
        self.validate_amazon()?;

        if self.use_ai_summarization {
            if self.openai_api_key.is_none() {
                return Err(YnaError::MissingOpenAiKey);
            }
            validate_url("openai_api_url", &self.openai_api_url)?;
        }
        Ok(())
    }
}
