use std::sync::Arc;

use anyhow::Context;
use flight_delay_predictor::{build_router, AppState, Config, DelayModel, FeatureInput, Predictor};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flight_delay_predictor=info,tower_http=info".into()),
        )
        .init();

    let cfg = Config::from_env().context("invalid configuration")?;

    let model = DelayModel::load(&cfg.model_path)
        .with_context(|| format!("failed to load model from {}", cfg.model_path.display()))?;
    tracing::info!(
        "loaded model {}; {} trees; feat_list[{}]: {:?}",
        cfg.model_path.display(),
        model.n_trees(),
        model.feat_list().len(),
        model.feat_list()
    );

    // Warmup with the page defaults so an incompatible artifact fails here
    // rather than on the first user request.
    let warmup = FeatureInput::default()
        .validate()
        .context("default inputs are invalid")?;
    let minutes = model.predict(&warmup).context("warmup prediction failed")?;
    tracing::info!("warmup predict ok ({:.2} min)", minutes);

    let about = model.meta().clone();
    let state = AppState::new(Arc::new(model), about).log_predictions(cfg.log_predictions);
    let app = build_router(state);

    tracing::info!("listening on {}", cfg.addr);
    let listener = tokio::net::TcpListener::bind(cfg.addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}
