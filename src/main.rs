use coach_checkout::api::{self, AppState};
use coach_checkout::application::{LeadService, PaymentPoller, PaymentService, PollOutcome};
use coach_checkout::infrastructure::{
    AirtableRecordStore, AppConfig, CardGatewayAdapter, HttpStatusSource, PaymentLinkGenerator,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载环境变量
    dotenvy::dotenv().ok();

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // 加载配置
    let config = AppConfig::from_env();

    // `watch <paymentId>`：轮询运行中的服务直到支付终态
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let [command, payment_id] = args.as_slice() {
        if command == "watch" {
            return watch_payment(&config, payment_id).await;
        }
    }

    info!("Starting coach checkout service...");
    if config.public_base_url.is_none() {
        warn!("PUBLIC_BASE_URL is not set, payment initiation will fail");
    }
    if config.gateway.username().is_err() || config.gateway.password().is_err() {
        warn!("Gateway credentials are incomplete, payment calls will fail");
    }
    info!("Configuration loaded: {:?}", config);

    // 创建网关适配器
    let gateway = Arc::new(CardGatewayAdapter::new(config.gateway.clone()));

    // 创建记录存储
    let store = Arc::new(AirtableRecordStore::new(config.record_store.clone()));

    // 创建支付链接生成器
    let links = PaymentLinkGenerator::new(config.payment_link.clone());

    // 创建服务
    let payment_service = Arc::new(PaymentService::new(
        gateway,
        store.clone(),
        links,
        config.public_base_url.clone(),
    ));
    let lead_service = Arc::new(LeadService::new(store));

    // 创建应用状态
    let app_state = AppState {
        payment_service,
        lead_service,
        public_base_url: config.public_base_url.clone(),
    };

    // 创建路由
    let app = api::create_router(app_state);

    // 启动服务器
    let addr = config.server.addr();
    info!("Server listening on {}", addr);
    info!("Available endpoints:");
    info!("  GET  /health - Health check");
    info!("  POST /initiate-payment - Start a card payment");
    info!("  POST /check-payment - Reconcile payment status");
    info!("  GET  /payment-return - Gateway return redirect");
    info!("  POST /leads - Capture a coaching lead");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn watch_payment(config: &AppConfig, payment_id: &str) -> anyhow::Result<()> {
    let base_url = config
        .public_base_url
        .clone()
        .unwrap_or_else(|| format!("http://{}", config.server.addr()));
    info!(
        "Watching payment {} via {} (every {:?}, at most {} checks)",
        payment_id, base_url, config.poller.interval, config.poller.max_attempts
    );

    let source = Arc::new(HttpStatusSource::new(base_url));
    let poller = PaymentPoller::new(source, config.poller);

    match poller.spawn(payment_id).outcome().await {
        PollOutcome::Settled(response) => {
            info!("Payment {} is {}", payment_id, response.status);
            Ok(())
        }
        PollOutcome::Exhausted { attempts } => {
            anyhow::bail!("payment {} still pending after {} checks", payment_id, attempts)
        }
        PollOutcome::Rejected { reason } => {
            anyhow::bail!("payment {} rejected: {}", payment_id, reason)
        }
        PollOutcome::Cancelled => anyhow::bail!("watch of payment {} was cancelled", payment_id),
    }
}
