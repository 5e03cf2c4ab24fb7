use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::{PaymentDetails, PaymentIntent};
use crate::infrastructure::config::GatewayConfig;
use crate::ports::payment_gateway_port::*;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

/// 取消支付的成功响应码
const CANCEL_SUCCESS_CODE: &str = "00";

/// 卡支付网关适配器实现
#[derive(Clone)]
pub struct CardGatewayAdapter {
    config: GatewayConfig,
    client: Client,
}

impl CardGatewayAdapter {
    pub fn new(config: GatewayConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    fn endpoint(&self, method: &str) -> DomainResult<String> {
        Ok(format!("{}/api/VPOS/{}", self.config.base_url()?, method))
    }

    /// 发送JSON请求并解析响应体。请求体含凭据，不记录日志
    async fn call(&self, method: &str, body: &Value) -> DomainResult<Value> {
        let url = self.endpoint(method)?;

        let response = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!("Gateway {} request failed: {}", method, e);
                DomainError::UpstreamError(format!("{} request failed: {}", method, e))
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            DomainError::UpstreamError(format!("{} response unreadable: {}", method, e))
        })?;

        if !status.is_success() {
            error!("Gateway {} returned {}: {}", method, status, text);
            return Err(DomainError::UpstreamError(format!(
                "{} returned {}",
                method, status
            )));
        }

        debug!("Gateway {} response: {}", method, text);
        serde_json::from_str(&text).map_err(|e| {
            DomainError::UpstreamError(format!("{} returned unparsable body: {}", method, e))
        })
    }

    fn credentials(&self) -> DomainResult<Value> {
        Ok(json!({
            "ClientID": self.config.client_id()?,
            "Username": self.config.username()?,
            "Password": self.config.password()?,
        }))
    }

    fn payment_page_url(&self, payment_id: &str, lang: &str) -> DomainResult<String> {
        let page = format!("{}/Payments/Pay", self.config.base_url()?);
        let url = Url::parse_with_params(&page, &[("id", payment_id), ("lang", lang)])
            .map_err(|e| DomainError::ConfigError(format!("invalid GATEWAY_BASE_URL: {}", e)))?;
        Ok(url.to_string())
    }
}

fn merge(mut base: Value, extra: Value) -> Value {
    if let (Some(target), Value::Object(fields)) = (base.as_object_mut(), extra) {
        target.extend(fields);
    }
    base
}

#[async_trait]
impl PaymentGatewayPort for CardGatewayAdapter {
    async fn init_payment(&self, intent: &PaymentIntent) -> DomainResult<InitPaymentResponse> {
        let order_id: i64 = intent.order_id.parse().map_err(|_| {
            DomainError::InternalError(format!(
                "gateway order id must be numeric: {}",
                intent.order_id
            ))
        })?;

        let body = merge(
            self.credentials()?,
            json!({
                "Amount": intent.amount.to_major(),
                "Currency": intent.currency.iso_numeric(),
                "OrderID": order_id,
                "Description": intent.description,
                "BackURL": intent.return_url,
                "Opaque": intent.opaque,
            }),
        );

        info!("Initiating gateway payment for order {}", intent.order_id);
        let raw = self.call("InitPayment", &body).await?;
        let reply = PaymentDetails::new(raw);

        let code = reply.response_code().and_then(|c| c.parse::<i64>().ok());
        if code != Some(1) {
            let message = reply.text_field("ResponseMessage").unwrap_or_default();
            warn!(
                "Gateway rejected order {}: code {:?} {}",
                intent.order_id,
                reply.response_code(),
                message
            );
            return Err(DomainError::UpstreamError(format!(
                "InitPayment rejected: {}",
                message
            )));
        }

        let payment_id = reply.text_field("PaymentID").ok_or_else(|| {
            DomainError::UpstreamError("InitPayment response missing PaymentID".to_string())
        })?;
        let redirect_url = self.payment_page_url(&payment_id, intent.locale.gateway_lang())?;

        Ok(InitPaymentResponse {
            payment_id,
            redirect_url,
        })
    }

    async fn get_payment_details(&self, payment_id: &str) -> DomainResult<PaymentDetails> {
        let body = merge(self.credentials()?, json!({ "PaymentID": payment_id }));

        let raw = self.call("GetPaymentDetails", &body).await?;
        Ok(PaymentDetails::new(raw))
    }

    async fn cancel_payment(&self, payment_id: &str) -> DomainResult<CancelAck> {
        let body = merge(self.credentials()?, json!({ "PaymentID": payment_id }));

        let reply = PaymentDetails::new(self.call("CancelPayment", &body).await?);
        let response_code = reply.response_code().unwrap_or_default();
        let message = reply.text_field("ResponseMessage");

        if response_code != CANCEL_SUCCESS_CODE {
            return Err(DomainError::UpstreamError(format!(
                "CancelPayment rejected with code {}: {}",
                response_code,
                message.unwrap_or_default()
            )));
        }

        info!("Gateway payment {} canceled", payment_id);
        Ok(CancelAck {
            response_code,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Currency, Locale, Money};
    use mockito::Matcher;
    use std::time::Duration;

    fn config(base_url: &str) -> GatewayConfig {
        GatewayConfig {
            base_url: Some(base_url.to_string()),
            client_id: Some("client-1".to_string()),
            username: Some("merchant".to_string()),
            password: Some("secret".to_string()),
            timeout: Duration::from_secs(5),
        }
    }

    fn intent() -> PaymentIntent {
        PaymentIntent::new(
            "1700000000123".to_string(),
            Money::from_minor(10000),
            Currency::Eur,
            "Online coaching".to_string(),
            "https://coach.test/payment-return?lang=en".to_string(),
            Locale::En,
            "token-1".to_string(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_init_payment_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/VPOS/InitPayment")
            .match_body(Matcher::PartialJson(json!({
                "ClientID": "client-1",
                "Currency": "978",
                "OrderID": 1700000000123i64,
                "Amount": 100.0,
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"PaymentID":"6F3A1C2E-91B4","ResponseCode":1,"ResponseMessage":"OK"}"#)
            .create_async()
            .await;

        let adapter = CardGatewayAdapter::new(config(&server.url()));
        let response = adapter.init_payment(&intent()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.payment_id, "6F3A1C2E-91B4");
        assert_eq!(
            response.redirect_url,
            format!("{}/Payments/Pay?id=6F3A1C2E-91B4&lang=en", server.url())
        );
    }

    #[tokio::test]
    async fn test_init_payment_rejected_code() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/VPOS/InitPayment")
            .with_status(200)
            .with_body(r#"{"PaymentID":null,"ResponseCode":400,"ResponseMessage":"Duplicate order"}"#)
            .create_async()
            .await;

        let adapter = CardGatewayAdapter::new(config(&server.url()));
        let err = adapter.init_payment(&intent()).await.unwrap_err();
        assert!(matches!(err, DomainError::UpstreamError(_)));
    }

    #[tokio::test]
    async fn test_init_payment_missing_payment_id() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/VPOS/InitPayment")
            .with_status(200)
            .with_body(r#"{"ResponseCode":1}"#)
            .create_async()
            .await;

        let adapter = CardGatewayAdapter::new(config(&server.url()));
        let err = adapter.init_payment(&intent()).await.unwrap_err();
        assert!(err.to_string().contains("missing PaymentID"));
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_any_request() {
        let mut cfg = config("http://127.0.0.1:9");
        cfg.password = None;
        let adapter = CardGatewayAdapter::new(cfg);

        let err = adapter.get_payment_details("PAY-123456").await.unwrap_err();
        assert!(matches!(err, DomainError::ConfigError(_)));
        let err = adapter.init_payment(&intent()).await.unwrap_err();
        assert!(matches!(err, DomainError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_payment_details_returns_raw_payload() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/VPOS/GetPaymentDetails")
            .match_body(Matcher::PartialJson(json!({
                "PaymentID": "PAY-123456",
                "ClientID": "client-1",
                "Username": "merchant",
                "Password": "secret"
            })))
            .with_status(200)
            .with_body(r#"{"ResponseCode":"00","PaymentState":"payment_deposited","OrderStatus":"2"}"#)
            .create_async()
            .await;

        let adapter = CardGatewayAdapter::new(config(&server.url()));
        let details = adapter.get_payment_details("PAY-123456").await.unwrap();
        assert_eq!(details.response_code().as_deref(), Some("00"));
        assert_eq!(details.payment_state().as_deref(), Some("payment_deposited"));
    }

    #[tokio::test]
    async fn test_payment_details_http_failure_is_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/VPOS/GetPaymentDetails")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let adapter = CardGatewayAdapter::new(config(&server.url()));
        let err = adapter.get_payment_details("PAY-123456").await.unwrap_err();
        assert!(matches!(err, DomainError::UpstreamError(_)));
    }

    #[tokio::test]
    async fn test_payment_details_unparsable_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/VPOS/GetPaymentDetails")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let adapter = CardGatewayAdapter::new(config(&server.url()));
        let err = adapter.get_payment_details("PAY-123456").await.unwrap_err();
        assert!(err.to_string().contains("unparsable"));
    }

    #[tokio::test]
    async fn test_cancel_payment() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server
            .mock("POST", "/api/VPOS/CancelPayment")
            .match_body(Matcher::PartialJson(json!({
                "PaymentID": "PAY-123456",
                "ClientID": "client-1"
            })))
            .with_status(200)
            .with_body(r#"{"ResponseCode":"00","ResponseMessage":"Canceled"}"#)
            .create_async()
            .await;
        let _rejected = server
            .mock("POST", "/api/VPOS/CancelPayment")
            .match_body(Matcher::PartialJson(json!({ "PaymentID": "PAY-654321" })))
            .with_status(200)
            .with_body(r#"{"ResponseCode":"0-24","ResponseMessage":"Already deposited"}"#)
            .create_async()
            .await;

        let adapter = CardGatewayAdapter::new(config(&server.url()));
        let ack = adapter.cancel_payment("PAY-123456").await.unwrap();
        assert_eq!(ack.message.as_deref(), Some("Canceled"));

        let err = adapter.cancel_payment("PAY-654321").await.unwrap_err();
        assert!(err.to_string().contains("0-24"));
    }
}
