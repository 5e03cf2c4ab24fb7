use crate::application::dto::CheckPaymentResponse;
use crate::application::poller::PaymentStatusSource;
use crate::domain::errors::{DomainError, DomainResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// 通过 `POST /check-payment` 查询状态，供站点外的轮询方使用
#[derive(Clone)]
pub struct HttpStatusSource {
    base_url: String,
    client: Client,
}

impl HttpStatusSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl PaymentStatusSource for HttpStatusSource {
    async fn check(&self, payment_id: &str) -> DomainResult<CheckPaymentResponse> {
        let url = format!("{}/check-payment", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "paymentId": payment_id }))
            .send()
            .await
            .map_err(|e| DomainError::UpstreamError(format!("check-payment failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DomainError::UpstreamError(format!("check-payment unreadable: {}", e)))?;

        if status.is_client_error() {
            let reason = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.error)
                .unwrap_or(text);
            return Err(DomainError::ValidationError(reason));
        }
        if !status.is_success() {
            return Err(DomainError::UpstreamError(format!(
                "check-payment returned {}",
                status
            )));
        }

        Ok(serde_json::from_str(&text)?)
    }
}
