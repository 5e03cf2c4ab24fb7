use crate::domain::errors::DomainResult;
use crate::domain::{PaymentDetails, PaymentIntent};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 网关创建支付的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitPaymentResponse {
    pub payment_id: String,
    /// 用户跳转去支付的地址
    pub redirect_url: String,
}

/// 取消支付确认
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelAck {
    pub response_code: String,
    pub message: Option<String>,
}

/// 卡支付网关端口接口
#[async_trait]
pub trait PaymentGatewayPort: Send + Sync {
    /// 创建支付，返回支付ID与跳转地址
    async fn init_payment(&self, intent: &PaymentIntent) -> DomainResult<InitPaymentResponse>;

    /// 查询支付详情（原始载荷）
    async fn get_payment_details(&self, payment_id: &str) -> DomainResult<PaymentDetails>;

    /// 取消支付，尽力而为，不重试
    async fn cancel_payment(&self, payment_id: &str) -> DomainResult<CancelAck>;
}
