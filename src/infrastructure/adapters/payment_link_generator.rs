use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::{Currency, Money};
use crate::infrastructure::config::PaymentLinkConfig;
use hmac::{Hmac, Mac};
use reqwest::Url;
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// 生成好的跳转支付链接
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentLink {
    pub url: String,
    pub order_id: String,
    pub signature: String,
}

/// 跳转式支付链接生成器，不调用任何上游接口
#[derive(Clone)]
pub struct PaymentLinkGenerator {
    config: PaymentLinkConfig,
}

impl PaymentLinkGenerator {
    pub fn new(config: PaymentLinkConfig) -> Self {
        Self { config }
    }

    /// 该货币是否走支付链接
    pub fn handles(&self, currency: Currency) -> bool {
        self.config.currency == currency
    }

    /// 签名：HMAC-SHA256(secret, "merchant_id:amount:order_id")，小写十六进制
    pub fn sign(&self, amount: Money, order_id: &str) -> DomainResult<String> {
        let merchant_id = self.config.merchant_id()?;
        let message = format!("{}:{}:{}", merchant_id, amount, order_id);

        let mut mac = HmacSha256::new_from_slice(self.config.secret()?.as_bytes())
            .map_err(|e| DomainError::CryptoError(format!("HMAC init error: {}", e)))?;
        mac.update(message.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    pub fn generate(
        &self,
        amount: Money,
        currency: Currency,
        order_id: &str,
        return_url: &str,
    ) -> DomainResult<PaymentLink> {
        let signature = self.sign(amount, order_id)?;
        let amount_text = amount.to_string();

        let url = Url::parse_with_params(
            self.config.base_url()?,
            &[
                ("merchant_id", self.config.merchant_id()?),
                ("order_id", order_id),
                ("amount", amount_text.as_str()),
                ("currency", currency.code()),
                ("return_url", return_url),
                ("signature", signature.as_str()),
            ],
        )
        .map_err(|e| DomainError::ConfigError(format!("invalid PAYMENT_LINK_BASE_URL: {}", e)))?;

        debug!("Payment link generated for order {}", order_id);
        Ok(PaymentLink {
            url: url.to_string(),
            order_id: order_id.to_string(),
            signature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> PaymentLinkGenerator {
        PaymentLinkGenerator::new(PaymentLinkConfig {
            base_url: Some("https://pay.link.test/checkout".to_string()),
            merchant_id: Some("m-42".to_string()),
            secret: Some("shared-secret".to_string()),
            currency: Currency::Rub,
        })
    }

    #[test]
    fn test_signature_verifies_with_shared_secret() {
        let signature = generator().sign(Money::from_minor(150000), "ord-1").unwrap();

        let mut mac = HmacSha256::new_from_slice(b"shared-secret").unwrap();
        mac.update(b"m-42:1500.00:ord-1");
        assert!(mac.verify_slice(&hex::decode(&signature).unwrap()).is_ok());
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn test_signature_depends_on_amount_and_order() {
        let g = generator();
        let base = g.sign(Money::from_minor(100), "ord-1").unwrap();
        assert_ne!(base, g.sign(Money::from_minor(101), "ord-1").unwrap());
        assert_ne!(base, g.sign(Money::from_minor(100), "ord-2").unwrap());
    }

    #[test]
    fn test_generate_carries_all_parameters() {
        let link = generator()
            .generate(
                Money::from_minor(500000),
                Currency::Rub,
                "ord-1",
                "https://coach.test/ru/payment/pending?x=1",
            )
            .unwrap();

        let url = Url::parse(&link.url).unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(url.host_str(), Some("pay.link.test"));
        assert_eq!(params["merchant_id"], "m-42");
        assert_eq!(params["amount"], "5000.00");
        assert_eq!(params["currency"], "RUB");
        assert_eq!(params["return_url"], "https://coach.test/ru/payment/pending?x=1");
        assert_eq!(params["signature"], link.signature);
    }

    #[test]
    fn test_missing_secret_is_config_error() {
        let g = PaymentLinkGenerator::new(PaymentLinkConfig::default());
        assert!(g.handles(Currency::Rub));
        assert!(!g.handles(Currency::Eur));
        assert!(matches!(
            g.sign(Money::from_minor(100), "ord-1"),
            Err(DomainError::ConfigError(_))
        ));
    }
}
