use anyhow::Context;
use sea_orm::Database;
use tracing::info;

use bazaar_core::config::Config;
use bazaar_core::tracing::init_tracing;
use bazaar_shop::config::ShopConfig;
use bazaar_shop::infra::mail::AppMailer;
use bazaar_shop::router::build_router;
use bazaar_shop::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ShopConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    let mailer = AppMailer::from_settings(config.smtp().as_ref(), &config.mail_from)
        .context("failed to configure mailer")?;

    let state = AppState::new(db, &config, mailer);

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.shop_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("shop service listening on {addr}");
    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
