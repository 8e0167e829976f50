use std::sync::Arc;

use invoice_analyzer::{
    api::{self, AppState},
    create_pool, ensure_schema, AppConfig, GeminiClient, InvoiceService, PgInvoiceStore,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt::time::ChronoLocal, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 本地时间格式, RUST_LOG 可覆盖级别
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 加载配置
    let config = AppConfig::from_env()?;
    info!("Starting server with config: {:?}", config);

    // 数据库连接池 + 建表
    let pool = create_pool(&config.database.url, config.database.max_connections).await?;
    ensure_schema(&pool).await?;
    info!("Database pool created");

    if config.gemini.api_key.is_empty() {
        warn!("GEMINI_API_KEY is not set, uploads will fail until it is configured");
    }

    let store = Arc::new(PgInvoiceStore::new(pool.clone()));
    let model = Arc::new(GeminiClient::new(config.gemini.clone()));
    let state = AppState {
        service: Arc::new(InvoiceService::new(store, model)),
        upload: Arc::new(config.upload.clone()),
    };
    let app = api::router(state);

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST   /api/invoices/upload");
    info!("  GET    /api/invoices");
    info!("  GET    /api/invoices/search?query=");
    info!("  GET    /api/invoices/:id");
    info!("  DELETE /api/invoices/:id");
    info!("  GET    /            - review UI");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("Server stopped");
    Ok(())
}

/// Ctrl-C 或 SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
