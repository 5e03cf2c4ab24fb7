use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::{Lead, PurchaseRecord};
use crate::infrastructure::config::RecordStoreConfig;
use crate::ports::record_store_port::{RecordPatch, RecordStorePort, StoredRecord};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};

const PAGE_SIZE: &str = "100";

/// 列表接口响应
#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    records: Vec<RecordEnvelope>,
    offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecordEnvelope {
    id: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

/// 把值转义后放进公式的单引号字符串里
pub fn escape_formula_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn field_text(fields: &Map<String, Value>, name: &str) -> Option<String> {
    match fields.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// 表格式记录存储（Airtable REST 接口）适配器
#[derive(Clone)]
pub struct AirtableRecordStore {
    config: RecordStoreConfig,
    client: Client,
}

impl AirtableRecordStore {
    pub fn new(config: RecordStoreConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    fn table_url(&self, table: &str, record_id: Option<&str>) -> DomainResult<Url> {
        let base_id = self.config.base_id()?;
        let mut url = Url::parse(&self.config.api_url).map_err(|e| {
            DomainError::ConfigError(format!("invalid RECORD_STORE_API_URL: {}", e))
        })?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                DomainError::ConfigError("RECORD_STORE_API_URL cannot be a base".to_string())
            })?;
            segments.pop_if_empty().push(base_id).push(table);
            if let Some(id) = record_id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    pub fn lookup_formula(&self, payment_id: &str) -> String {
        format!(
            "{{{}}}='{}'",
            self.config.payment_id_field,
            escape_formula_value(payment_id)
        )
    }

    fn purchase_fields(&self, record: &PurchaseRecord) -> Value {
        let mut fields = json!({
            "Order ID": record.order_id,
            "Name": record.buyer.name,
            "Email": record.buyer.email,
            "Phone": record.buyer.phone,
            "Amount": record.amount.to_major(),
            "Currency": record.currency.code(),
            "Tariff": record.tariff,
            "Locale": record.locale.as_str(),
            "Link Token": record.link_token,
            "Created At": record.created_at.to_rfc3339(),
        });
        if let Some(map) = fields.as_object_mut() {
            map.insert(
                self.config.payment_id_field.clone(),
                Value::String(record.payment_id.clone()),
            );
            map.insert(
                self.config.status_field.clone(),
                Value::String(record.status.as_str().to_string()),
            );
        }
        fields
    }

    async fn create(&self, table: &str, fields: Value) -> DomainResult<String> {
        let url = self.table_url(table, None)?;
        let response = self
            .client
            .post(url)
            .bearer_auth(self.config.api_key()?)
            .json(&json!({ "fields": fields, "typecast": true }))
            .send()
            .await
            .map_err(|e| DomainError::WriteError(format!("create in {} failed: {}", table, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Record store create in {} returned {}: {}", table, status, body);
            return Err(DomainError::WriteError(format!(
                "create in {} returned {}",
                table, status
            )));
        }

        let created: RecordEnvelope = response
            .json()
            .await
            .map_err(|e| DomainError::WriteError(format!("create response unreadable: {}", e)))?;
        debug!("Record {} created in {}", created.id, table);
        Ok(created.id)
    }
}

#[async_trait]
impl RecordStorePort for AirtableRecordStore {
    async fn find_by_payment_id(&self, payment_id: &str) -> DomainResult<String> {
        let formula = self.lookup_formula(payment_id);
        let mut matched = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut url = self.table_url(&self.config.purchases_table, None)?;
            {
                let mut query = url.query_pairs_mut();
                query
                    .append_pair("filterByFormula", &formula)
                    .append_pair("pageSize", PAGE_SIZE);
                if let Some(cursor) = &offset {
                    query.append_pair("offset", cursor);
                }
            }

            let response = self
                .client
                .get(url)
                .bearer_auth(self.config.api_key()?)
                .send()
                .await
                .map_err(|e| DomainError::UpstreamError(format!("record lookup failed: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                error!("Record store lookup returned {}: {}", status, body);
                return Err(DomainError::UpstreamError(format!(
                    "record lookup returned {}",
                    status
                )));
            }

            let page: ListResponse = response.json().await.map_err(|e| {
                DomainError::UpstreamError(format!("record lookup unparsable: {}", e))
            })?;
            matched.extend(page.records.into_iter().map(|r| r.id));

            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        match matched.len() {
            0 => Err(DomainError::RecordNotFound(payment_id.to_string())),
            1 => Ok(matched.remove(0)),
            _ => {
                warn!(
                    "Payment {} matched {} records: {:?}",
                    payment_id,
                    matched.len(),
                    matched
                );
                Err(DomainError::AmbiguousMatch {
                    payment_id: payment_id.to_string(),
                    record_ids: matched,
                })
            }
        }
    }

    async fn get_record(&self, record_id: &str) -> DomainResult<StoredRecord> {
        let url = self.table_url(&self.config.purchases_table, Some(record_id))?;
        let response = self
            .client
            .get(url)
            .bearer_auth(self.config.api_key()?)
            .send()
            .await
            .map_err(|e| DomainError::UpstreamError(format!("record read failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::UpstreamError(format!(
                "record read returned {}",
                status
            )));
        }

        let envelope: RecordEnvelope = response
            .json()
            .await
            .map_err(|e| DomainError::UpstreamError(format!("record read unparsable: {}", e)))?;

        Ok(StoredRecord {
            payment_id: field_text(&envelope.fields, &self.config.payment_id_field),
            status: field_text(&envelope.fields, &self.config.status_field),
            id: envelope.id,
        })
    }

    async fn patch_record(&self, record_id: &str, patch: &RecordPatch) -> DomainResult<()> {
        let mut fields = Map::new();
        if let Some(status) = patch.status {
            fields.insert(
                self.config.status_field.clone(),
                Value::String(status.as_str().to_string()),
            );
        }
        if fields.is_empty() {
            return Ok(());
        }

        let url = self.table_url(&self.config.purchases_table, Some(record_id))?;
        let response = self
            .client
            .patch(url)
            .bearer_auth(self.config.api_key()?)
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(|e| DomainError::WriteError(format!("patch {} failed: {}", record_id, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Record store patch {} returned {}: {}", record_id, status, body);
            return Err(DomainError::WriteError(format!(
                "patch {} returned {}",
                record_id, status
            )));
        }

        info!("Record {} patched", record_id);
        Ok(())
    }

    async fn create_purchase(&self, record: &PurchaseRecord) -> DomainResult<String> {
        let fields = self.purchase_fields(record);
        self.create(&self.config.purchases_table, fields).await
    }

    async fn create_lead(&self, lead: &Lead) -> DomainResult<String> {
        let fields = json!({
            "Name": lead.contact.name,
            "Email": lead.contact.email,
            "Phone": lead.contact.phone,
            "Goal": lead.goal,
            "Locale": lead.locale.as_str(),
            "Created At": lead.created_at.to_rfc3339(),
        });
        self.create(&self.config.leads_table, fields).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Buyer, Currency, Locale, Money, RecordStatus};
    use mockito::Matcher;

    const PURCHASES_PATH: &str = r"^/v0/appTEST/Purchases(\?.*)?$";

    fn store(server_url: &str) -> AirtableRecordStore {
        AirtableRecordStore::new(RecordStoreConfig {
            api_url: format!("{}/v0", server_url),
            api_key: Some("patTEST".to_string()),
            base_id: Some("appTEST".to_string()),
            ..RecordStoreConfig::default()
        })
    }

    #[test]
    fn test_escape_formula_value() {
        assert_eq!(escape_formula_value("abc-123"), "abc-123");
        assert_eq!(escape_formula_value("a'b"), r"a\'b");
        assert_eq!(escape_formula_value(r"a\'"), r"a\\\'");
    }

    #[test]
    fn test_lookup_formula_quotes_field_and_value() {
        let store = store("http://localhost");
        assert_eq!(store.lookup_formula("x') OR ('1"), r"{Payment ID}='x\') OR (\'1'");
    }

    #[test]
    fn test_table_url_encodes_segments() {
        let mut config = RecordStoreConfig {
            base_id: Some("appTEST".to_string()),
            ..RecordStoreConfig::default()
        };
        config.purchases_table = "Course Purchases".to_string();
        let store = AirtableRecordStore::new(config);
        let url = store.table_url("Course Purchases", Some("rec1")).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.airtable.com/v0/appTEST/Course%20Purchases/rec1"
        );
    }

    #[tokio::test]
    async fn test_find_single_match() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(PURCHASES_PATH.to_string()))
            .match_query(Matcher::UrlEncoded(
                "filterByFormula".to_string(),
                "{Payment ID}='PAY-123456'".to_string(),
            ))
            .match_header("authorization", "Bearer patTEST")
            .with_status(200)
            .with_body(r#"{"records":[{"id":"recA","fields":{"Payment ID":"PAY-123456"}}]}"#)
            .create_async()
            .await;

        let id = store(&server.url())
            .find_by_payment_id("PAY-123456")
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(id, "recA");
    }

    #[tokio::test]
    async fn test_find_no_match() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(PURCHASES_PATH.to_string()))
            .with_status(200)
            .with_body(r#"{"records":[]}"#)
            .create_async()
            .await;

        let err = store(&server.url())
            .find_by_payment_id("PAY-123456")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::RecordNotFound(id) if id == "PAY-123456"));
    }

    #[tokio::test]
    async fn test_find_multiple_matches_lists_every_id() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(PURCHASES_PATH.to_string()))
            .with_status(200)
            .with_body(r#"{"records":[{"id":"recA","fields":{}},{"id":"recB","fields":{}}]}"#)
            .create_async()
            .await;

        let err = store(&server.url())
            .find_by_payment_id("PAY-123456")
            .await
            .unwrap_err();
        match err {
            DomainError::AmbiguousMatch { record_ids, .. } => {
                assert_eq!(record_ids, vec!["recA".to_string(), "recB".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_get_record_snapshot() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v0/appTEST/Purchases/recA")
            .with_status(200)
            .with_body(r#"{"id":"recA","fields":{"Payment ID":"PAY-123456","Status":"created"}}"#)
            .create_async()
            .await;

        let record = store(&server.url()).get_record("recA").await.unwrap();
        assert_eq!(record.id, "recA");
        assert_eq!(record.record_status(), Some(RecordStatus::Created));
    }

    #[tokio::test]
    async fn test_patch_writes_status_field() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", "/v0/appTEST/Purchases/recA")
            .match_body(Matcher::Json(json!({ "fields": { "Status": "paid" } })))
            .with_status(200)
            .with_body(r#"{"id":"recA","fields":{"Status":"paid"}}"#)
            .create_async()
            .await;

        store(&server.url())
            .patch_record("recA", &RecordPatch::status(RecordStatus::Paid))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_patch_failure_is_write_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PATCH", "/v0/appTEST/Purchases/recA")
            .with_status(422)
            .with_body(r#"{"error":{"type":"INVALID_VALUE_FOR_COLUMN"}}"#)
            .create_async()
            .await;

        let err = store(&server.url())
            .patch_record("recA", &RecordPatch::status(RecordStatus::Paid))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::WriteError(_)));
    }

    #[tokio::test]
    async fn test_create_purchase_sends_created_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v0/appTEST/Purchases")
            .match_body(Matcher::PartialJson(json!({
                "fields": {
                    "Payment ID": "PAY-123456",
                    "Status": "created",
                    "Email": "a@b.com",
                    "Currency": "EUR"
                }
            })))
            .with_status(200)
            .with_body(r#"{"id":"recNEW","fields":{}}"#)
            .create_async()
            .await;

        let record = PurchaseRecord::pending(
            "PAY-123456".to_string(),
            Some("1001".to_string()),
            Buyer {
                name: "X".to_string(),
                email: "a@b.com".to_string(),
                phone: "+37400000000".to_string(),
            },
            Money::from_minor(10000),
            Currency::Eur,
            None,
            Locale::En,
            "tok".to_string(),
        );
        let id = store(&server.url()).create_purchase(&record).await.unwrap();
        mock.assert_async().await;
        assert_eq!(id, "recNEW");
    }

    #[tokio::test]
    async fn test_missing_api_key_is_config_error() {
        let store = AirtableRecordStore::new(RecordStoreConfig {
            base_id: Some("appTEST".to_string()),
            ..RecordStoreConfig::default()
        });
        let err = store.find_by_payment_id("PAY-123456").await.unwrap_err();
        assert!(matches!(err, DomainError::ConfigError(_)));
    }
}
