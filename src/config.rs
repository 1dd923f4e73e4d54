use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_TURNSTILE_VERIFY_URL: &str =
    "https://challenges.cloudflare.com/turnstile/v0/siteverify";
pub const DEFAULT_KLAVIYO_BASE_URL: &str = "https://a.klaviyo.com";
pub const DEFAULT_KLAVIYO_REVISION: &str = "2024-10-15";

/// Which name fields the lead form carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameMode {
    /// `firstname` + `lastname`
    #[default]
    Split,
    /// a single `name`
    Full,
}

/// How the submitted phone number is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhoneMode {
    /// Store the `+1XXXXXXXXXX` form, or nothing if it does not normalize.
    #[default]
    Normalize,
    /// Store the phone exactly as typed (trimmed).
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrmSyncMode {
    #[default]
    Enabled,
    Disabled,
}

impl FromStr for NameMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "split" => Ok(NameMode::Split),
            "full" => Ok(NameMode::Full),
            other => anyhow::bail!("NAME_MODE must be 'split' or 'full', got '{}'", other),
        }
    }
}

impl FromStr for PhoneMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normalize" => Ok(PhoneMode::Normalize),
            "raw" => Ok(PhoneMode::Raw),
            other => anyhow::bail!("PHONE_MODE must be 'normalize' or 'raw', got '{}'", other),
        }
    }
}

impl FromStr for CrmSyncMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enabled" | "true" | "on" => Ok(CrmSyncMode::Enabled),
            "disabled" | "false" | "off" => Ok(CrmSyncMode::Disabled),
            other => anyhow::bail!("CRM_SYNC must be 'enabled' or 'disabled', got '{}'", other),
        }
    }
}

/// Deployment variant knobs for the submission handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubmissionConfig {
    pub name_mode: NameMode,
    pub phone_mode: PhoneMode,
    pub crm_sync: CrmSyncMode,
}

#[derive(Clone)]
pub struct TurnstileConfig {
    pub secret_key: String,
    pub verify_url: String,
}

impl fmt::Debug for TurnstileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnstileConfig")
            .field("secret_key", &"[REDACTED]")
            .field("verify_url", &self.verify_url)
            .finish()
    }
}

#[derive(Clone)]
pub struct KlaviyoConfig {
    pub api_key: String,
    pub list_id: String,
    pub base_url: String,
    pub revision: String,
}

impl fmt::Debug for KlaviyoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KlaviyoConfig")
            .field("api_key", &"[REDACTED]")
            .field("list_id", &self.list_id)
            .field("base_url", &self.base_url)
            .field("revision", &self.revision)
            .finish()
    }
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub turnstile: TurnstileConfig,
    /// Present only when `submission.crm_sync` is enabled.
    pub klaviyo: Option<KlaviyoConfig>,
    pub submission: SubmissionConfig,
    /// Upper bound for every outbound HTTP call (Turnstile, Klaviyo).
    pub outbound_timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &redacted_database_url(&self.database_url))
            .field("port", &self.port)
            .field("turnstile", &self.turnstile)
            .field("klaviyo", &self.klaviyo)
            .field("submission", &self.submission)
            .field("outbound_timeout", &self.outbound_timeout)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. `from_env` uses the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = var("DB_URL")
            .or_else(|| var("DATABASE_URL"))
            .ok_or_else(|| anyhow::anyhow!("DB_URL or DATABASE_URL environment variable required"))
            .and_then(|url| {
                if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                    anyhow::bail!("DB_URL must start with postgresql:// or postgres://");
                }
                Ok(url)
            })?;

        let port = var("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?;

        let turnstile = TurnstileConfig {
            secret_key: var("TURNSTILE_SECRET_KEY").ok_or_else(|| {
                anyhow::anyhow!("TURNSTILE_SECRET_KEY environment variable required")
            })?,
            verify_url: http_url(
                "TURNSTILE_VERIFY_URL",
                var("TURNSTILE_VERIFY_URL")
                    .unwrap_or_else(|| DEFAULT_TURNSTILE_VERIFY_URL.to_string()),
            )?,
        };

        let submission = SubmissionConfig {
            name_mode: var("NAME_MODE").map(|v| v.parse()).transpose()?.unwrap_or_default(),
            phone_mode: var("PHONE_MODE").map(|v| v.parse()).transpose()?.unwrap_or_default(),
            crm_sync: var("CRM_SYNC").map(|v| v.parse()).transpose()?.unwrap_or_default(),
        };

        let klaviyo = match submission.crm_sync {
            CrmSyncMode::Disabled => None,
            CrmSyncMode::Enabled => Some(KlaviyoConfig {
                api_key: var("KLAVIYO_API_KEY").ok_or_else(|| {
                    anyhow::anyhow!("KLAVIYO_API_KEY is required when CRM_SYNC is enabled")
                })?,
                list_id: var("KLAVIYO_LIST_ID").ok_or_else(|| {
                    anyhow::anyhow!("KLAVIYO_LIST_ID is required when CRM_SYNC is enabled")
                })?,
                base_url: http_url(
                    "KLAVIYO_BASE_URL",
                    var("KLAVIYO_BASE_URL").unwrap_or_else(|| DEFAULT_KLAVIYO_BASE_URL.to_string()),
                )?,
                revision: var("KLAVIYO_REVISION")
                    .unwrap_or_else(|| DEFAULT_KLAVIYO_REVISION.to_string()),
            }),
        };

        let outbound_timeout = var("OUTBOUND_TIMEOUT_SECS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or_else(|| anyhow::anyhow!("OUTBOUND_TIMEOUT_SECS must be a positive integer"))?;

        let config = Self {
            database_url,
            port,
            turnstile,
            klaviyo,
            submission,
            outbound_timeout,
        };

        // Log successful configuration load (without sensitive values)
        tracing::debug!("Database: {}", redacted_database_url(&config.database_url));
        tracing::debug!("Turnstile verify URL: {}", config.turnstile.verify_url);
        match config.klaviyo {
            Some(ref k) => tracing::info!("Klaviyo sync enabled: {} (list {})", k.base_url, k.list_id),
            None => tracing::info!("Klaviyo sync disabled"),
        }
        tracing::debug!("Submission variant: {:?}", config.submission);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

/// `scheme://host:port/dbname` with credentials and query parameters removed.
fn redacted_database_url(database_url: &str) -> String {
    match url::Url::parse(database_url) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or("localhost");
            let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();
            format!("{}://{}{}{}", parsed.scheme(), host, port, parsed.path())
        }
        Err(_) => "<unparseable>".to_string(),
    }
}

/// Validates that `value` is an absolute http(s) URL and strips a trailing slash.
fn http_url(name: &str, value: String) -> anyhow::Result<String> {
    let parsed = url::Url::parse(&value)
        .map_err(|e| anyhow::anyhow!("{} is not a valid URL: {}", name, e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(value.trim_end_matches('/').to_string())
}
