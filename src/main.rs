use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use pagewise::persist::{PersistenceMode, Persistor};
use pagewise::server::{AppState, router};
use pagewise::settings::Settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log)),
        )
        .init();

    let persistor = Persistor::new(PersistenceMode::from_setting(&settings.database))?;
    if let Some(seed) = &settings.seed {
        let written = persistor.load_file(seed)?;
        info!(seed = %seed, records = written, "seed loaded");
    }

    let listener = tokio::net::TcpListener::bind(&settings.listen).await?;
    info!(address = %settings.listen, database = %settings.database, "listening");
    axum::serve(listener, router(AppState::new(Arc::new(persistor), settings))).await?;
    Ok(())
}
