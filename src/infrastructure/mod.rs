pub mod adapters;
pub mod config;

pub use adapters::{AirtableRecordStore, CardGatewayAdapter, HttpStatusSource, PaymentLinkGenerator};
pub use config::AppConfig;
