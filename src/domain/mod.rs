pub mod entities;
pub mod errors;
pub mod status_classifier;
pub mod validation;
pub mod value_objects;

pub use entities::{Buyer, Lead, PaymentIntent, PurchaseRecord};
pub use errors::{DomainError, DomainResult};
pub use status_classifier::{classify, Classification, PaymentDetails};
pub use value_objects::{BankStatus, Currency, Locale, Money, RecordStatus};
