use crate::domain::{BankStatus, Classification, PaymentDetails};
use serde::{Deserialize, Serialize};

/// 创建支付请求。字段均可缺省，以便返回具体字段的校验信息
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentRequest {
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub buyer_name: Option<String>,
    pub buyer_email: Option<String>,
    pub buyer_phone: Option<String>,
    pub tariff_id: Option<String>,
    pub locale: Option<String>,
}

/// 创建支付响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentResponse {
    pub payment_url: String,
    pub payment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

/// 支付状态查询请求
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckPaymentRequest {
    pub payment_id: Option<String>,
}

/// 返回给前端的网关状态摘要
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl BankSummary {
    pub fn from_details(details: &PaymentDetails, classification: &Classification) -> Self {
        Self {
            response_code: details.response_code(),
            payment_state: details.payment_state(),
            order_status: details.order_status(),
            reason: classification.reason.clone(),
        }
    }
}

/// 记录存储同步结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSyncOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub record_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecordSyncOutcome {
    pub const NOT_FOUND: &'static str = "not_found";
    pub const MULTIPLE_FOUND: &'static str = "multiple_found";
    pub const LOOKUP_FAILED: &'static str = "lookup_failed";
    pub const WRITE_FAILED: &'static str = "write_failed";

    pub fn patched() -> Self {
        Self {
            ok: true,
            reason: None,
            record_ids: Vec::new(),
            error: None,
        }
    }

    pub fn failed(reason: &str, error: Option<String>) -> Self {
        Self {
            ok: false,
            reason: Some(reason.to_string()),
            record_ids: Vec::new(),
            error,
        }
    }

    pub fn ambiguous(record_ids: Vec<String>) -> Self {
        Self {
            ok: false,
            reason: Some(Self::MULTIPLE_FOUND.to_string()),
            record_ids,
            error: None,
        }
    }
}

/// 支付状态查询响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckPaymentResponse {
    pub ok: bool,
    pub paid: bool,
    pub status: BankStatus,
    pub bank: BankSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub airtable: Option<RecordSyncOutcome>,
}

/// 线索表单请求
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub goal: Option<String>,
    pub locale: Option<String>,
}

/// 线索表单响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadResponse {
    pub ok: bool,
    pub record_id: String,
}

/// 错误响应
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// 状态查询的错误响应
#[derive(Debug, Serialize)]
pub struct CheckPaymentFailure {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BankStatus>,
    pub error: String,
}
