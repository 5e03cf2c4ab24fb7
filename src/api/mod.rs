pub mod handlers;
pub mod locale;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
