pub mod payment_gateway_port;
pub mod record_store_port;

pub use payment_gateway_port::{CancelAck, InitPaymentResponse, PaymentGatewayPort};
pub use record_store_port::{RecordPatch, RecordStorePort, StoredRecord};
