pub mod airtable_record_store;
pub mod card_gateway_adapter;
pub mod http_status_source;
pub mod payment_link_generator;

pub use airtable_record_store::AirtableRecordStore;
pub use card_gateway_adapter::CardGatewayAdapter;
pub use http_status_source::HttpStatusSource;
pub use payment_link_generator::{PaymentLink, PaymentLinkGenerator};
