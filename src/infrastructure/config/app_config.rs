use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::Currency;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const REDACTED: &str = "<redacted>";

/// 读取必填配置项，缺失时返回配置错误而不是 panic
fn required<'a>(value: &'a Option<String>, var: &str) -> DomainResult<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| DomainError::ConfigError(format!("{} is not set", var)))
}

fn redact(value: &Option<String>) -> &'static str {
    if value.is_some() { REDACTED } else { "<unset>" }
}

/// 服务监听配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 卡支付网关配置
#[derive(Clone, Default)]
pub struct GatewayConfig {
    pub base_url: Option<String>,
    pub client_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn base_url(&self) -> DomainResult<&str> {
        required(&self.base_url, "GATEWAY_BASE_URL").map(|u| u.trim_end_matches('/'))
    }

    pub fn client_id(&self) -> DomainResult<&str> {
        required(&self.client_id, "GATEWAY_CLIENT_ID")
    }

    pub fn username(&self) -> DomainResult<&str> {
        required(&self.username, "GATEWAY_USERNAME")
    }

    pub fn password(&self) -> DomainResult<&str> {
        required(&self.password, "GATEWAY_PASSWORD")
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("username", &redact(&self.username))
            .field("password", &redact(&self.password))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// 记录存储配置
#[derive(Clone)]
pub struct RecordStoreConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub base_id: Option<String>,
    pub purchases_table: String,
    pub leads_table: String,
    pub payment_id_field: String,
    pub status_field: String,
    pub timeout: Duration,
}

impl RecordStoreConfig {
    pub fn api_key(&self) -> DomainResult<&str> {
        required(&self.api_key, "RECORD_STORE_API_KEY")
    }

    pub fn base_id(&self) -> DomainResult<&str> {
        required(&self.base_id, "RECORD_STORE_BASE_ID")
    }
}

impl Default for RecordStoreConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.airtable.com/v0".to_string(),
            api_key: None,
            base_id: None,
            purchases_table: "Purchases".to_string(),
            leads_table: "Leads".to_string(),
            payment_id_field: "Payment ID".to_string(),
            status_field: "Status".to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

impl fmt::Debug for RecordStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStoreConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("base_id", &self.base_id)
            .field("purchases_table", &self.purchases_table)
            .field("leads_table", &self.leads_table)
            .field("payment_id_field", &self.payment_id_field)
            .field("status_field", &self.status_field)
            .finish()
    }
}

/// 跳转式支付链接配置
#[derive(Clone)]
pub struct PaymentLinkConfig {
    pub base_url: Option<String>,
    pub merchant_id: Option<String>,
    pub secret: Option<String>,
    /// 走支付链接而不走网关的货币
    pub currency: Currency,
}

impl PaymentLinkConfig {
    pub fn base_url(&self) -> DomainResult<&str> {
        required(&self.base_url, "PAYMENT_LINK_BASE_URL")
    }

    pub fn merchant_id(&self) -> DomainResult<&str> {
        required(&self.merchant_id, "PAYMENT_LINK_MERCHANT_ID")
    }

    pub fn secret(&self) -> DomainResult<&str> {
        required(&self.secret, "PAYMENT_LINK_SECRET")
    }
}

impl Default for PaymentLinkConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            merchant_id: None,
            secret: None,
            currency: Currency::Rub,
        }
    }
}

impl fmt::Debug for PaymentLinkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentLinkConfig")
            .field("base_url", &self.base_url)
            .field("merchant_id", &self.merchant_id)
            .field("secret", &redact(&self.secret))
            .field("currency", &self.currency)
            .finish()
    }
}

/// 客户端轮询配置
#[derive(Debug, Clone, Copy)]
pub struct PollerConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(5000),
            max_attempts: 60,
        }
    }
}

/// 应用配置，进程启动时构建一次，显式传给各组件
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    /// 站点公开地址（网关回跳地址的前缀）
    pub public_base_url: Option<String>,
    pub gateway: GatewayConfig,
    pub record_store: RecordStoreConfig,
    pub payment_link: PaymentLinkConfig,
    pub poller: PollerConfig,
}

impl AppConfig {
    pub fn from_env() -> Arc<Self> {
        Arc::new(Self::from_lookup(|name| std::env::var(name).ok()))
    }

    /// 从任意键值来源构建，空字符串视为未设置
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let get_or = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());
        let millis = |name: &str, default: u64| {
            Duration::from_millis(get(name).and_then(|v| v.parse().ok()).unwrap_or(default))
        };

        let record_defaults = RecordStoreConfig::default();
        let poller_defaults = PollerConfig::default();

        Self {
            server: ServerConfig {
                host: get_or("SERVER_HOST", "0.0.0.0"),
                port: get("SERVER_PORT")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(3000),
            },
            public_base_url: get("PUBLIC_BASE_URL").map(|u| u.trim_end_matches('/').to_string()),
            gateway: GatewayConfig {
                base_url: get("GATEWAY_BASE_URL"),
                client_id: get("GATEWAY_CLIENT_ID"),
                username: get("GATEWAY_USERNAME"),
                password: get("GATEWAY_PASSWORD"),
                timeout: millis("GATEWAY_TIMEOUT_MS", 15_000),
            },
            record_store: RecordStoreConfig {
                api_url: get_or("RECORD_STORE_API_URL", &record_defaults.api_url)
                    .trim_end_matches('/')
                    .to_string(),
                api_key: get("RECORD_STORE_API_KEY"),
                base_id: get("RECORD_STORE_BASE_ID"),
                purchases_table: get_or("RECORD_STORE_TABLE", &record_defaults.purchases_table),
                leads_table: get_or("RECORD_STORE_LEADS_TABLE", &record_defaults.leads_table),
                payment_id_field: get_or(
                    "RECORD_STORE_PAYMENT_ID_FIELD",
                    &record_defaults.payment_id_field,
                ),
                status_field: get_or("RECORD_STORE_STATUS_FIELD", &record_defaults.status_field),
                timeout: record_defaults.timeout,
            },
            payment_link: PaymentLinkConfig {
                base_url: get("PAYMENT_LINK_BASE_URL"),
                merchant_id: get("PAYMENT_LINK_MERCHANT_ID"),
                secret: get("PAYMENT_LINK_SECRET"),
                currency: get("PAYMENT_LINK_CURRENCY")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(Currency::Rub),
            },
            poller: PollerConfig {
                interval: millis("POLL_INTERVAL_MS", poller_defaults.interval.as_millis() as u64),
                max_attempts: get("POLL_MAX_ATTEMPTS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(poller_defaults.max_attempts),
            },
        }
    }

    pub fn public_base_url(&self) -> DomainResult<&str> {
        required(&self.public_base_url, "PUBLIC_BASE_URL")
    }
}
