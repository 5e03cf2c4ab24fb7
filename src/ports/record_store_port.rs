use crate::domain::errors::DomainResult;
use crate::domain::{Lead, PurchaseRecord, RecordStatus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 记录存储中一条购买记录的只读快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub payment_id: Option<String>,
    /// 原样保留存储中的状态文本
    pub status: Option<String>,
}

impl StoredRecord {
    pub fn record_status(&self) -> Option<RecordStatus> {
        match self.status.as_deref()?.trim().to_ascii_lowercase().as_str() {
            "created" => Some(RecordStatus::Created),
            "paid" => Some(RecordStatus::Paid),
            _ => None,
        }
    }
}

/// 部分更新
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub status: Option<RecordStatus>,
}

impl RecordPatch {
    pub fn status(status: RecordStatus) -> Self {
        Self {
            status: Some(status),
        }
    }
}

/// 表格式记录存储端口接口
#[async_trait]
pub trait RecordStorePort: Send + Sync {
    /// 按支付ID精确查找记录ID。零条返回 `RecordNotFound`，多条返回 `AmbiguousMatch`
    async fn find_by_payment_id(&self, payment_id: &str) -> DomainResult<String>;

    /// 读取记录快照
    async fn get_record(&self, record_id: &str) -> DomainResult<StoredRecord>;

    /// 部分更新记录，失败返回 `WriteError`
    async fn patch_record(&self, record_id: &str, patch: &RecordPatch) -> DomainResult<()>;

    /// 创建购买记录，返回存储分配的ID
    async fn create_purchase(&self, record: &PurchaseRecord) -> DomainResult<String>;

    /// 创建线索记录
    async fn create_lead(&self, lead: &Lead) -> DomainResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_status_parsing() {
        let mut record = StoredRecord {
            id: "rec1".to_string(),
            payment_id: Some("PAY-123456".to_string()),
            status: Some(" Paid ".to_string()),
        };
        assert_eq!(record.record_status(), Some(RecordStatus::Paid));

        record.status = Some("archived".to_string());
        assert_eq!(record.record_status(), None);

        record.status = None;
        assert_eq!(record.record_status(), None);
    }
}
