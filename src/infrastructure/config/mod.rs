pub mod app_config;

pub use app_config::{
    AppConfig, GatewayConfig, PaymentLinkConfig, PollerConfig, RecordStoreConfig, ServerConfig,
};
