use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{Currency, Locale, Money, RecordStatus};
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// 买家信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buyer {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// 网关侧的一次支付尝试
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// 网关返回的支付ID（发送前为空）
    pub external_payment_id: Option<String>,

    /// 商户订单号
    pub order_id: String,

    pub amount: Money,

    pub currency: Currency,

    /// 商品描述
    pub description: String,

    /// 网关支付完成后的回跳地址
    pub return_url: String,

    pub locale: Locale,

    /// 原样回传的附加数据
    pub opaque: String,
}

impl PaymentIntent {
    pub fn new(
        order_id: String,
        amount: Money,
        currency: Currency,
        description: String,
        return_url: String,
        locale: Locale,
        opaque: String,
    ) -> DomainResult<Self> {
        if !amount.is_positive() {
            return Err(DomainError::ValidationError(
                "amount must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            external_payment_id: None,
            order_id,
            amount,
            currency,
            description,
            return_url,
            locale,
            opaque,
        })
    }

    /// 网关受理后绑定支付ID，之后意图不再变化
    pub fn accepted(self, external_payment_id: String) -> Self {
        Self {
            external_payment_id: Some(external_payment_id),
            ..self
        }
    }
}

/// 购买记录（记录存储是唯一真相源）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRecord {
    /// 存储分配的记录ID，创建前为空
    pub record_id: Option<String>,

    pub payment_id: String,

    pub order_id: Option<String>,

    pub buyer: Buyer,

    pub amount: Money,

    pub currency: Currency,

    /// 课程/套餐标签
    pub tariff: Option<String>,

    pub status: RecordStatus,

    pub locale: Locale,

    /// 支付链接令牌
    pub link_token: String,

    pub created_at: DateTime<Utc>,
}

impl PurchaseRecord {
    /// 创建状态为 created 的新记录
    pub fn pending(
        payment_id: String,
        order_id: Option<String>,
        buyer: Buyer,
        amount: Money,
        currency: Currency,
        tariff: Option<String>,
        locale: Locale,
        link_token: String,
    ) -> Self {
        Self {
            record_id: None,
            payment_id,
            order_id,
            buyer,
            amount,
            currency,
            tariff,
            status: RecordStatus::Created,
            locale,
            link_token,
            created_at: Utc::now(),
        }
    }
}

/// 线索表单提交
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub contact: Buyer,
    pub goal: Option<String>,
    pub locale: Locale,
    pub created_at: DateTime<Utc>,
}

impl Lead {
    pub fn new(contact: Buyer, goal: Option<String>, locale: Locale) -> Self {
        Self {
            contact,
            goal,
            locale,
            created_at: Utc::now(),
        }
    }
}

/// 生成URL安全的随机链接令牌
pub fn generate_link_token() -> String {
    let mut bytes = [0u8; 18];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buyer() -> Buyer {
        Buyer {
            name: "Ani".to_string(),
            email: "ani@example.com".to_string(),
            phone: "+37400000000".to_string(),
        }
    }

    #[test]
    fn test_pending_record_starts_created() {
        let record = PurchaseRecord::pending(
            "PAY-123456".to_string(),
            Some("1001".to_string()),
            buyer(),
            Money::from_minor(10000),
            Currency::Eur,
            Some("starter".to_string()),
            Locale::En,
            generate_link_token(),
        );

        assert_eq!(record.status, RecordStatus::Created);
        assert!(record.record_id.is_none());
    }

    #[test]
    fn test_intent_requires_positive_amount() {
        let result = PaymentIntent::new(
            "1001".to_string(),
            Money::from_minor(0),
            Currency::Eur,
            "Course".to_string(),
            "https://site.test/payment-return".to_string(),
            Locale::En,
            String::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_intent_accepted_binds_external_id() {
        let intent = PaymentIntent::new(
            "1001".to_string(),
            Money::from_minor(100),
            Currency::Eur,
            "Course".to_string(),
            "https://site.test/payment-return".to_string(),
            Locale::En,
            String::new(),
        )
        .unwrap()
        .accepted("PAY-1".to_string());

        assert_eq!(intent.external_payment_id.as_deref(), Some("PAY-1"));
    }

    #[test]
    fn test_link_tokens_differ() {
        let a = generate_link_token();
        let b = generate_link_token();
        assert_eq!(a.len(), 24);
        assert_ne!(a, b);
    }
}
