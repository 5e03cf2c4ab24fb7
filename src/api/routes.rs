use super::handlers::*;
use crate::ports::{PaymentGatewayPort, RecordStorePort};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub fn create_router<G, S>(state: AppState<G, S>) -> Router
where
    G: PaymentGatewayPort + 'static,
    S: RecordStorePort + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/initiate-payment", post(initiate_payment::<G, S>))
        .route("/check-payment", post(check_payment::<G, S>))
        .route("/payment-return", get(payment_return::<G, S>))
        .route("/leads", post(submit_lead::<G, S>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
