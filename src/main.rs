use anyhow::Context;
use shelf_db::Database;
use shelf_kernel::{settings::Settings, InitCtx};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load catalog settings")?;
    shelf_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.path,
        "shelf-server bootstrap starting"
    );

    let db = Database::open(&settings.database)?;
    let registry = shelf_app::prepare(&settings, &db).await?;

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.start_modules(&ctx).await?;
    tracing::info!("shelf-server bootstrap complete");

    let served = shelf_http::start_server(&registry, &settings).await;

    registry.stop_modules().await?;
    served
}
