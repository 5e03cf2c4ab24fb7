use crate::application::dto::{LeadRequest, LeadResponse};
use crate::domain::errors::DomainResult;
use crate::domain::validation::{require_text, validate_email, validate_phone};
use crate::domain::{Buyer, Lead, Locale};
use crate::ports::RecordStorePort;
use std::sync::Arc;
use tracing::info;

/// 线索收集服务
pub struct LeadService<S: RecordStorePort> {
    store: Arc<S>,
}

impl<S: RecordStorePort> LeadService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn submit(&self, request: LeadRequest) -> DomainResult<LeadResponse> {
        let name = require_text("name", request.name.as_deref())?;
        let email = validate_email("email", &require_text("email", request.email.as_deref())?)?;
        let phone = validate_phone("phone", &require_text("phone", request.phone.as_deref())?)?;
        let locale = request
            .locale
            .as_deref()
            .and_then(Locale::from_tag)
            .unwrap_or_default();
        let goal = request
            .goal
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty());

        let lead = Lead::new(Buyer { name, email, phone }, goal, locale);
        let record_id = self.store.create_lead(&lead).await?;
        info!("Lead {} captured ({})", record_id, locale);

        Ok(LeadResponse {
            ok: true,
            record_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DomainError;
    use crate::domain::PurchaseRecord;
    use crate::ports::{RecordPatch, StoredRecord};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct LeadStore {
        leads: Mutex<Vec<Lead>>,
    }

    #[async_trait]
    impl RecordStorePort for LeadStore {
        async fn find_by_payment_id(&self, payment_id: &str) -> DomainResult<String> {
            Err(DomainError::RecordNotFound(payment_id.to_string()))
        }

        async fn get_record(&self, record_id: &str) -> DomainResult<StoredRecord> {
            Err(DomainError::RecordNotFound(record_id.to_string()))
        }

        async fn patch_record(&self, _record_id: &str, _patch: &RecordPatch) -> DomainResult<()> {
            Ok(())
        }

        async fn create_purchase(&self, _record: &PurchaseRecord) -> DomainResult<String> {
            Ok("recP".to_string())
        }

        async fn create_lead(&self, lead: &Lead) -> DomainResult<String> {
            self.leads.lock().unwrap().push(lead.clone());
            Ok("recL".to_string())
        }
    }

    #[tokio::test]
    async fn test_submit_lead() {
        let store = Arc::new(LeadStore::default());
        let service = LeadService::new(store.clone());

        let response = service
            .submit(LeadRequest {
                name: Some("Ani".to_string()),
                email: Some("ani@example.com".to_string()),
                phone: Some("+374 91 000000".to_string()),
                goal: Some("  lose 5kg ".to_string()),
                locale: Some("ru".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(response.record_id, "recL");
        let leads = store.leads.lock().unwrap();
        assert_eq!(leads[0].goal.as_deref(), Some("lose 5kg"));
        assert_eq!(leads[0].locale, Locale::Ru);
    }

    #[tokio::test]
    async fn test_invalid_lead_is_not_stored() {
        let store = Arc::new(LeadStore::default());
        let service = LeadService::new(store.clone());

        let err = service
            .submit(LeadRequest {
                name: Some("Ani".to_string()),
                email: Some("ani@".to_string()),
                phone: Some("+374 91 000000".to_string()),
                ..LeadRequest::default()
            })
            .await
            .unwrap_err();

        assert!(err.is_client_error());
        assert!(store.leads.lock().unwrap().is_empty());
    }
}
