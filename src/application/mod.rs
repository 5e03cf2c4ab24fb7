pub mod dto;
pub mod lead_service;
pub mod payment_service;
pub mod poller;

pub use dto::*;
pub use lead_service::LeadService;
pub use payment_service::PaymentService;
pub use poller::{PaymentPoller, PaymentStatusSource, PollHandle, PollOutcome};
