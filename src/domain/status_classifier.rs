//! 将网关返回的原始支付详情归类为 [`BankStatus`]。
//!
//! 上游字段填充不一致，规则按顺序匹配，第一条命中即返回；
//! 已支付信号总是最先检查。

use crate::domain::value_objects::BankStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 支付详情查询的成功响应码
pub const SUCCESS_RESPONSE_CODE: &str = "00";

/// 网关支付详情原始载荷
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentDetails(pub Value);

impl PaymentDetails {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// 读取字段为字符串；数字按两位补零（`0` -> `"00"`）
    pub fn text_field(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(n) => Some(match n.as_u64() {
                Some(v) => format!("{:02}", v),
                None => n.to_string(),
            }),
            _ => None,
        }
    }

    pub fn response_code(&self) -> Option<String> {
        self.text_field("ResponseCode")
    }

    pub fn payment_state(&self) -> Option<String> {
        self.text_field("PaymentState")
    }

    pub fn order_status(&self) -> Option<String> {
        self.text_field("OrderStatus")
    }

    /// 失败原因，按 Description / TrxnDescription / ResponseMessage 的顺序取第一个
    pub fn reason(&self) -> Option<String> {
        ["Description", "TrxnDescription", "ResponseMessage"]
            .iter()
            .find_map(|key| self.text_field(key))
    }
}

/// 分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: BankStatus,
    /// 仅 declined / error 携带
    pub reason: Option<String>,
}

impl Classification {
    fn plain(status: BankStatus) -> Self {
        Self {
            status,
            reason: None,
        }
    }
}

pub fn classify(details: &PaymentDetails) -> Classification {
    let state = details
        .payment_state()
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();
    let order_status = details.order_status().and_then(|s| s.parse::<i64>().ok());

    if details.response_code().as_deref() == Some(SUCCESS_RESPONSE_CODE) {
        return Classification::plain(BankStatus::Paid);
    }
    if state.contains("deposited") || order_status == Some(2) {
        return Classification::plain(BankStatus::Paid);
    }
    if state.contains("refunded") {
        return Classification::plain(BankStatus::Refunded);
    }
    if state.contains("void") {
        return Classification::plain(BankStatus::Canceled);
    }
    if state.contains("declined") {
        return Classification {
            status: BankStatus::Declined,
            reason: details.reason(),
        };
    }
    if state.contains("started") || order_status == Some(0) {
        return Classification::plain(BankStatus::Pending);
    }

    Classification {
        status: BankStatus::Error,
        reason: details.reason(),
    }
}
