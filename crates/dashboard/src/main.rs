use anyhow::Result;
use fleet_dashboard::{app::Dashboard, config, logging, surface::LogMapSurface};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = config::Config::load()?;
    logging::init_logging(&config.logging)?;

    info!("Starting fleet dashboard v{}", env!("CARGO_PKG_VERSION"));

    let dashboard = Dashboard::connect(&config)?;
    let identity = dashboard.identity();
    info!(
        manager_id = identity.manager_id,
        organization_id = ?identity.organization_id,
        role = ?identity.role,
        "Acting identity"
    );

    let overview = dashboard.overview().await?;
    for entry in &overview {
        info!(
            geofence_id = entry.geofence.geofence_id,
            name = %entry.geofence.name,
            status = %entry.geofence.status,
            shape = entry.geofence.shape.kind(),
            active_vehicles = ?entry.active_vehicles,
            "Geofence"
        );
    }

    dashboard.refresh(&LogMapSurface).await?;

    Ok(())
}
