use crate::api::locale::{infer_locale, payment_page_location};
use crate::application::{
    CheckPaymentFailure, CheckPaymentRequest, ErrorResponse, InitiatePaymentRequest, LeadRequest,
    LeadService, PaymentService,
};
use crate::domain::status_classifier::SUCCESS_RESPONSE_CODE;
use crate::domain::{BankStatus, DomainError};
use crate::ports::{PaymentGatewayPort, RecordStorePort};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Redirect},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 应用状态
pub struct AppState<G: PaymentGatewayPort, S: RecordStorePort> {
    pub payment_service: Arc<PaymentService<G, S>>,
    pub lead_service: Arc<LeadService<S>>,
    /// 回跳重定向使用的站点地址，缺省时使用相对路径
    pub public_base_url: Option<String>,
}

impl<G: PaymentGatewayPort, S: RecordStorePort> Clone for AppState<G, S> {
    fn clone(&self) -> Self {
        Self {
            payment_service: self.payment_service.clone(),
            lead_service: self.lead_service.clone(),
            public_base_url: self.public_base_url.clone(),
        }
    }
}

fn error_status(e: &DomainError) -> StatusCode {
    if e.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn bad_json(rejection: JsonRejection) -> (StatusCode, Json<ErrorResponse>) {
    warn!("Rejected request body: {}", rejection.body_text());
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new("Invalid JSON body")),
    )
}

/// 创建支付
pub async fn initiate_payment<G: PaymentGatewayPort, S: RecordStorePort>(
    State(state): State<AppState<G, S>>,
    payload: Result<Json<InitiatePaymentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let Json(request) = payload.map_err(bad_json)?;
    info!(
        "Received payment initiation request ({})",
        request.currency.as_deref().unwrap_or("no currency")
    );

    state
        .payment_service
        .initiate_payment(request)
        .await
        .map(|response| (StatusCode::OK, Json(response)))
        .map_err(|e| {
            let status = error_status(&e);
            if status.is_server_error() {
                error!("Payment initiation error: {}", e);
                (status, Json(ErrorResponse::new("Payment initiation failed")))
            } else {
                warn!("Payment initiation rejected: {}", e);
                (status, Json(ErrorResponse::new(e.to_string())))
            }
        })
}

/// 对账：查询网关状态并在已支付时回写记录
pub async fn check_payment<G: PaymentGatewayPort, S: RecordStorePort>(
    State(state): State<AppState<G, S>>,
    payload: Result<Json<CheckPaymentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, (StatusCode, Json<CheckPaymentFailure>)> {
    let client_error = |message: String| {
        (
            StatusCode::BAD_REQUEST,
            Json(CheckPaymentFailure {
                ok: false,
                status: None,
                error: message,
            }),
        )
    };

    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected check body: {}", rejection.body_text());
        client_error("Invalid JSON body".to_string())
    })?;
    let payment_id = request
        .payment_id
        .ok_or_else(|| client_error("paymentId is required".to_string()))?;

    match state.payment_service.check_payment(&payment_id).await {
        Ok(response) => Ok((StatusCode::OK, Json(response))),
        Err(e) if e.is_client_error() => Err(client_error(e.to_string())),
        Err(e) => {
            error!("Payment check error: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CheckPaymentFailure {
                    ok: false,
                    status: Some(BankStatus::Error),
                    error: "Payment status is unavailable".to_string(),
                }),
            ))
        }
    }
}

/// 网关回跳参数
#[derive(Debug, Default, Deserialize)]
pub struct PaymentReturnParams {
    #[serde(rename = "paymentID", alias = "paymentId")]
    pub payment_id: Option<String>,
    #[serde(rename = "responseCode")]
    pub response_code: Option<String>,
    #[serde(rename = "orderID", alias = "orderId")]
    pub order_id: Option<String>,
    pub lang: Option<String>,
}

/// 网关支付页回跳，转到带语言前缀的结果页
pub async fn payment_return<G: PaymentGatewayPort, S: RecordStorePort>(
    State(state): State<AppState<G, S>>,
    Query(params): Query<PaymentReturnParams>,
    headers: HeaderMap,
) -> Redirect {
    let locale = infer_locale(params.lang.as_deref(), &headers);
    let success = params.response_code.as_deref().map(str::trim) == Some(SUCCESS_RESPONSE_CODE);
    info!(
        "Gateway return for payment {} (responseCode {}, locale {})",
        params.payment_id.as_deref().unwrap_or("-"),
        params.response_code.as_deref().unwrap_or("-"),
        locale
    );

    let location = payment_page_location(
        state.public_base_url.as_deref(),
        locale,
        success,
        &[
            ("paymentId", params.payment_id.as_deref()),
            ("orderId", params.order_id.as_deref()),
        ],
    );
    Redirect::to(&location)
}

/// 提交线索表单
pub async fn submit_lead<G: PaymentGatewayPort, S: RecordStorePort>(
    State(state): State<AppState<G, S>>,
    payload: Result<Json<LeadRequest>, JsonRejection>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let Json(request) = payload.map_err(bad_json)?;

    state
        .lead_service
        .submit(request)
        .await
        .map(|response| (StatusCode::CREATED, Json(response)))
        .map_err(|e| {
            let status = error_status(&e);
            if status.is_server_error() {
                error!("Lead submission error: {}", e);
                (status, Json(ErrorResponse::new("Lead submission failed")))
            } else {
                (status, Json(ErrorResponse::new(e.to_string())))
            }
        })
}

/// 健康检查
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}
