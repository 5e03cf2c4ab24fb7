//! 支付状态轮询：固定间隔、有限次数、同一时间最多一个在途查询。
//!
//! 在途查询未返回时到期的 tick 直接跳过；调用 [`PollHandle::cancel`]
//! 或丢弃句柄都会停止轮询。

use crate::application::dto::CheckPaymentResponse;
use crate::application::payment_service::PaymentService;
use crate::domain::errors::DomainResult;
use crate::infrastructure::config::PollerConfig;
use crate::ports::{PaymentGatewayPort, RecordStorePort};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// 支付状态来源
#[async_trait]
pub trait PaymentStatusSource: Send + Sync {
    async fn check(&self, payment_id: &str) -> DomainResult<CheckPaymentResponse>;
}

#[async_trait]
impl<G: PaymentGatewayPort, S: RecordStorePort> PaymentStatusSource for PaymentService<G, S> {
    async fn check(&self, payment_id: &str) -> DomainResult<CheckPaymentResponse> {
        self.check_payment(payment_id).await
    }
}

/// 轮询结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// 到达终态
    Settled(CheckPaymentResponse),
    /// 达到次数上限仍未终态
    Exhausted { attempts: u32 },
    /// 查询被拒绝（如支付ID非法），重试无意义
    Rejected { reason: String },
    Cancelled,
}

/// 轮询任务句柄
pub struct PollHandle {
    cancel: watch::Sender<bool>,
    task: JoinHandle<PollOutcome>,
}

impl PollHandle {
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    pub async fn outcome(self) -> PollOutcome {
        let PollHandle { cancel, task } = self;
        let outcome = task.await.unwrap_or(PollOutcome::Cancelled);
        drop(cancel);
        outcome
    }
}

pub struct PaymentPoller<C: PaymentStatusSource + 'static> {
    source: Arc<C>,
    config: PollerConfig,
}

impl<C: PaymentStatusSource + 'static> PaymentPoller<C> {
    pub fn new(source: Arc<C>, config: PollerConfig) -> Self {
        Self { source, config }
    }

    pub fn spawn(&self, payment_id: impl Into<String>) -> PollHandle {
        let (cancel, cancelled) = watch::channel(false);
        let task = tokio::spawn(run(
            self.source.clone(),
            payment_id.into(),
            self.config,
            cancelled,
        ));
        PollHandle { cancel, task }
    }
}

async fn run<C: PaymentStatusSource + 'static>(
    source: Arc<C>,
    payment_id: String,
    config: PollerConfig,
    mut cancelled: watch::Receiver<bool>,
) -> PollOutcome {
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let (results_tx, mut results) = mpsc::channel::<DomainResult<CheckPaymentResponse>>(1);
    let mut in_flight: Option<JoinHandle<()>> = None;
    let mut attempts = 0u32;

    let outcome = loop {
        tokio::select! {
            _ = cancelled.changed() => {
                break PollOutcome::Cancelled;
            }
            Some(result) = results.recv() => {
                in_flight = None;
                match result {
                    Ok(response) if response.status.is_terminal() => {
                        info!(
                            "Payment {} settled as {} after {} checks",
                            payment_id, response.status, attempts
                        );
                        break PollOutcome::Settled(response);
                    }
                    Ok(response) => debug!("Payment {} still {}", payment_id, response.status),
                    Err(e) if e.is_client_error() => {
                        warn!("Status check for payment {} rejected: {}", payment_id, e);
                        break PollOutcome::Rejected { reason: e.to_string() };
                    }
                    Err(e) => warn!("Status check for payment {} failed: {}", payment_id, e),
                }
                if attempts >= config.max_attempts {
                    break PollOutcome::Exhausted { attempts };
                }
            }
            _ = ticker.tick() => {
                if in_flight.is_some() {
                    debug!("Check for payment {} still in flight, skipping tick", payment_id);
                    continue;
                }
                if attempts >= config.max_attempts {
                    break PollOutcome::Exhausted { attempts };
                }
                attempts += 1;
                let source = source.clone();
                let id = payment_id.clone();
                let tx = results_tx.clone();
                in_flight = Some(tokio::spawn(async move {
                    let _ = tx.send(source.check(&id).await).await;
                }));
            }
        }
    };

    if let Some(task) = in_flight {
        task.abort();
    }
    outcome
}
