use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 网关状态的归一化分类（不持久化，每次轮询重新计算）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankStatus {
    Paid,
    Pending,
    Declined,
    Canceled,
    Refunded,
    Error,
}

impl BankStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BankStatus::Paid => "paid",
            BankStatus::Pending => "pending",
            BankStatus::Declined => "declined",
            BankStatus::Canceled => "canceled",
            BankStatus::Refunded => "refunded",
            BankStatus::Error => "error",
        }
    }

    /// 轮询方可以停止的状态，`Error` 不算终态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BankStatus::Paid | BankStatus::Declined | BankStatus::Canceled | BankStatus::Refunded
        )
    }
}

impl fmt::Display for BankStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 购买记录状态，只能前进：created -> paid，不会回退
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Created,
    Paid,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Created => "created",
            RecordStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 支持的结算货币
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Amd,
    Eur,
    Usd,
    Rub,
}

impl Currency {
    pub const ALL: [Currency; 4] = [Currency::Amd, Currency::Eur, Currency::Usd, Currency::Rub];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Amd => "AMD",
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Rub => "RUB",
        }
    }

    /// ISO-4217 数字代码（网关使用）
    pub fn iso_numeric(&self) -> &'static str {
        match self {
            Currency::Amd => "051",
            Currency::Eur => "978",
            Currency::Usd => "840",
            Currency::Rub => "643",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Currency::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| DomainError::ValidationError(format!("Unsupported currency: {}", s)))
    }
}

/// 站点语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Hy,
    Ru,
    En,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::Hy => "hy",
            Locale::Ru => "ru",
            Locale::En => "en",
        }
    }

    /// 网关支付页使用的语言代码
    pub fn gateway_lang(&self) -> &'static str {
        match self {
            Locale::Hy => "am",
            Locale::Ru => "ru",
            Locale::En => "en",
        }
    }

    /// 解析语言标签（如 `ru`, `en-US`, `hy_AM`），只看主子标签
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "hy" | "am" => Some(Locale::Hy),
            "ru" => Some(Locale::Ru),
            "en" => Some(Locale::En),
            _ => None,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 货币金额（最小单位，避免浮点数精度问题）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// 金额（最小单位）
    pub amount_minor: i64,
}

impl Money {
    pub fn from_minor(minor: i64) -> Self {
        Self {
            amount_minor: minor,
        }
    }

    /// 从主单位金额创建，保留两位小数
    pub fn from_major(amount: f64) -> DomainResult<Self> {
        if !amount.is_finite() {
            return Err(DomainError::ValidationError(
                "amount must be a finite number".to_string(),
            ));
        }
        Ok(Self {
            amount_minor: (amount * 100.0).round() as i64,
        })
    }

    pub fn to_minor(&self) -> i64 {
        self.amount_minor
    }

    pub fn to_major(&self) -> f64 {
        self.amount_minor as f64 / 100.0
    }

    pub fn is_positive(&self) -> bool {
        self.amount_minor > 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount_minor < 0 { "-" } else { "" };
        let abs = self.amount_minor.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}
