use crate::application::dto::{
    BankSummary, CheckPaymentResponse, InitiatePaymentRequest, InitiatePaymentResponse,
    RecordSyncOutcome,
};
use crate::domain::entities::generate_link_token;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::validation::{require_text, validate_email, validate_payment_id, validate_phone};
use crate::domain::{
    classify, BankStatus, Buyer, Currency, Locale, Money, PaymentIntent, PurchaseRecord,
    RecordStatus,
};
use crate::infrastructure::adapters::PaymentLinkGenerator;
use crate::ports::{PaymentGatewayPort, RecordPatch, RecordStorePort};
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const DEFAULT_DESCRIPTION: &str = "Online coaching program";

/// 校验后的创建支付输入
struct ValidatedPurchase {
    buyer: Buyer,
    amount: Money,
    currency: Currency,
    tariff: Option<String>,
    locale: Locale,
}

fn validate_initiation(request: InitiatePaymentRequest) -> DomainResult<ValidatedPurchase> {
    let amount = match request.amount {
        Some(value) => Money::from_major(value)?,
        None => {
            return Err(DomainError::ValidationError("amount is required".to_string()));
        }
    };
    if !amount.is_positive() {
        return Err(DomainError::ValidationError(
            "amount must be greater than 0".to_string(),
        ));
    }

    let currency: Currency = require_text("currency", request.currency.as_deref())?.parse()?;
    let name = require_text("buyerName", request.buyer_name.as_deref())?;
    let email = require_text("buyerEmail", request.buyer_email.as_deref())?;
    let email = validate_email("buyerEmail", &email)?;
    let phone = require_text("buyerPhone", request.buyer_phone.as_deref())?;
    let phone = validate_phone("buyerPhone", &phone)?;

    Ok(ValidatedPurchase {
        buyer: Buyer { name, email, phone },
        amount,
        currency,
        tariff: request
            .tariff_id
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()),
        locale: request
            .locale
            .as_deref()
            .and_then(Locale::from_tag)
            .unwrap_or_default(),
    })
}

/// 网关要求数字订单号：毫秒时间戳 + 三位随机后缀
fn next_order_number() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: i64 = rand::thread_rng().gen_range(0..1000);
    (millis * 1000 + suffix).to_string()
}

/// 支付服务：创建支付与对账
pub struct PaymentService<G: PaymentGatewayPort, S: RecordStorePort> {
    gateway: Arc<G>,
    store: Arc<S>,
    links: PaymentLinkGenerator,
    public_base_url: Option<String>,
}

impl<G: PaymentGatewayPort, S: RecordStorePort> PaymentService<G, S> {
    pub fn new(
        gateway: Arc<G>,
        store: Arc<S>,
        links: PaymentLinkGenerator,
        public_base_url: Option<String>,
    ) -> Self {
        Self {
            gateway,
            store,
            links,
            public_base_url,
        }
    }

    fn public_base_url(&self) -> DomainResult<&str> {
        self.public_base_url
            .as_deref()
            .ok_or_else(|| DomainError::ConfigError("PUBLIC_BASE_URL is not set".to_string()))
    }

    /// 创建支付：先落一条 created 记录，再把跳转地址交给调用方
    pub async fn initiate_payment(
        &self,
        request: InitiatePaymentRequest,
    ) -> DomainResult<InitiatePaymentResponse> {
        let purchase = validate_initiation(request)?;
        let base_url = self.public_base_url()?;
        let link_token = generate_link_token();
        let description = match &purchase.tariff {
            Some(tariff) => format!("{}: {}", DEFAULT_DESCRIPTION, tariff),
            None => DEFAULT_DESCRIPTION.to_string(),
        };

        if self.links.handles(purchase.currency) {
            let order_id = uuid::Uuid::new_v4().simple().to_string();
            let return_url = format!(
                "{}/{}/payment/pending?orderId={}",
                base_url, purchase.locale, order_id
            );
            let intent = PaymentIntent::new(
                order_id.clone(),
                purchase.amount,
                purchase.currency,
                description,
                return_url,
                purchase.locale,
                link_token.clone(),
            )?;

            info!("Creating payment link for order {}", order_id);
            let link = self.links.generate(
                intent.amount,
                intent.currency,
                &intent.order_id,
                &intent.return_url,
            )?;

            let record = PurchaseRecord::pending(
                order_id.clone(),
                Some(order_id.clone()),
                purchase.buyer,
                purchase.amount,
                purchase.currency,
                purchase.tariff,
                purchase.locale,
                link_token,
            );
            let record_id = self.store.create_purchase(&record).await?;
            info!("Purchase record {} created for link order {}", record_id, order_id);

            return Ok(InitiatePaymentResponse {
                payment_url: link.url,
                payment_id: order_id.clone(),
                order_id: Some(order_id),
            });
        }

        let order_id = next_order_number();
        let return_url = format!("{}/payment-return?lang={}", base_url, purchase.locale);
        let intent = PaymentIntent::new(
            order_id.clone(),
            purchase.amount,
            purchase.currency,
            description,
            return_url,
            purchase.locale,
            link_token.clone(),
        )?;

        info!("Initiating gateway payment for order {}", order_id);
        let init = self.gateway.init_payment(&intent).await?;
        let intent = intent.accepted(init.payment_id.clone());
        debug!(
            "Gateway accepted order {} as {:?}",
            intent.order_id, intent.external_payment_id
        );

        let record = PurchaseRecord::pending(
            init.payment_id.clone(),
            Some(order_id.clone()),
            purchase.buyer,
            purchase.amount,
            purchase.currency,
            purchase.tariff,
            purchase.locale,
            link_token,
        );

        match self.store.create_purchase(&record).await {
            Ok(record_id) => {
                info!(
                    "Purchase record {} created for payment {}",
                    record_id, init.payment_id
                );
            }
            Err(e) => {
                error!(
                    "Failed to record payment {}, canceling it: {}",
                    init.payment_id, e
                );
                if let Err(cancel_err) = self.gateway.cancel_payment(&init.payment_id).await {
                    warn!("Cancel of payment {} failed: {}", init.payment_id, cancel_err);
                }
                return Err(e);
            }
        }

        Ok(InitiatePaymentResponse {
            payment_url: init.redirect_url,
            payment_id: init.payment_id,
            order_id: Some(order_id),
        })
    }

    /// 对账：查询网关状态，仅在已支付时更新记录
    pub async fn check_payment(&self, raw_payment_id: &str) -> DomainResult<CheckPaymentResponse> {
        let payment_id = validate_payment_id(raw_payment_id)?;

        let details = self.gateway.get_payment_details(&payment_id).await?;
        let classification = classify(&details);
        let bank = BankSummary::from_details(&details, &classification);
        info!("Payment {} classified as {}", payment_id, classification.status);

        if classification.status != BankStatus::Paid {
            return Ok(CheckPaymentResponse {
                ok: true,
                paid: false,
                status: classification.status,
                bank,
                record_id: None,
                airtable: None,
            });
        }

        let (record_id, outcome) = match self.store.find_by_payment_id(&payment_id).await {
            Ok(record_id) => {
                let outcome = self.confirm_record(&record_id).await;
                (Some(record_id), outcome)
            }
            Err(DomainError::RecordNotFound(_)) => {
                warn!("Paid payment {} has no purchase record", payment_id);
                (None, RecordSyncOutcome::failed(RecordSyncOutcome::NOT_FOUND, None))
            }
            Err(DomainError::AmbiguousMatch { record_ids, .. }) => {
                warn!(
                    "Paid payment {} matches several records, not patching: {:?}",
                    payment_id, record_ids
                );
                (None, RecordSyncOutcome::ambiguous(record_ids))
            }
            Err(e) => {
                error!("Record lookup for payment {} failed: {}", payment_id, e);
                let outcome = RecordSyncOutcome::failed(
                    RecordSyncOutcome::LOOKUP_FAILED,
                    Some(e.to_string()),
                );
                (None, outcome)
            }
        };

        Ok(CheckPaymentResponse {
            ok: true,
            paid: true,
            status: BankStatus::Paid,
            bank,
            record_id,
            airtable: Some(outcome),
        })
    }

    /// 写入终态 paid。读快照只做检查，失败不影响写入
    async fn confirm_record(&self, record_id: &str) -> RecordSyncOutcome {
        match self.store.get_record(record_id).await {
            Ok(snapshot) if snapshot.record_status() == Some(RecordStatus::Paid) => {
                debug!("Record {} already paid", record_id);
            }
            Ok(snapshot) => {
                debug!("Record {} status before patch: {:?}", record_id, snapshot.status);
            }
            Err(e) => {
                warn!("Pre-patch read of record {} failed: {}", record_id, e);
            }
        }

        match self
            .store
            .patch_record(record_id, &RecordPatch::status(RecordStatus::Paid))
            .await
        {
            Ok(()) => {
                info!("Record {} marked paid", record_id);
                RecordSyncOutcome::patched()
            }
            Err(e) => {
                error!("Failed to mark record {} paid: {}", record_id, e);
                RecordSyncOutcome::failed(RecordSyncOutcome::WRITE_FAILED, Some(e.to_string()))
            }
        }
    }
}
