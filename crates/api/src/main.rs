// BizHub API Server
// Multi-tenant business backend: one shared store plus one store per business

mod config;
mod handlers;
mod middleware;
mod routes;

use anyhow::Context;
use bizhub_database::{migrate_default_store, Database};
use bizhub_models::BusinessId;
use bizhub_tenant::TenantStack;
use clap::{Parser, Subcommand};
use config::Config;
use dotenvy::dotenv;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// BizHub multi-tenant API server and storage administration
#[derive(Parser)]
#[command(name = "bizhub-api", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Migrate the default store and every registered tenant store
    MigrateAll,
    /// Provision (or re-provision) the store of one business
    Provision {
        /// Numeric business id
        business_id: i64,
    },
}

pub struct AppState {
    pub tenants: TenantStack,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,bizhub_api=debug,bizhub_tenant=debug,tower_http=debug".into()
            }),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    tracing::info!("🚀 Starting BizHub API");
    tracing::info!("📦 Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("🧭 Routing policy: {:?}", config.routing_policy);

    // Initialize default store
    tracing::info!(
        "🗄️  Opening default store in {}",
        config.database.storage_dir.display()
    );
    let database = Database::new(&config.database)
        .await
        .context("Failed to open default store")?;
    database.ping().await.context("Default store ping failed")?;
    let applied = migrate_default_store(database.pool())
        .await
        .context("Failed to migrate default store")?;
    tracing::info!("✅ Default store ready ({} migration(s) applied)", applied);

    // Rebuild the tenant catalog from business rows
    let tenants = TenantStack::new(config.database.clone(), database, config.routing_policy);
    let report = tenants.reconciler.reconcile().await?;
    tracing::info!(
        "🏢 Tenant catalog loaded: {} store(s), {} failed",
        tenants.catalog.len(),
        report.failed
    );

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, tenants).await,
        Command::MigrateAll => {
            let report = tenants.reconciler.migrate_all().await?;
            tracing::info!(
                "✅ Migrated default store ({} applied) and {} tenant store(s), {} failed",
                report.default_applied,
                report.tenants_migrated,
                report.tenants_failed
            );
            if report.tenants_failed > 0 {
                anyhow::bail!("{} tenant store(s) failed to migrate", report.tenants_failed);
            }
            Ok(())
        }
        Command::Provision { business_id } => {
            let id = BusinessId(business_id);
            let result = tenants.service.retry_provisioning(id).await?;
            if !result.storage_ready {
                anyhow::bail!("Provisioning failed for business {}", id);
            }
            tracing::info!(
                "✅ Business {} store ready ({})",
                id,
                result.business.storage_id.as_deref().unwrap_or_default()
            );
            Ok(())
        }
    }
}

async fn serve(config: Config, tenants: TenantStack) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();

    let sweeper = config.sweep_interval.map(|interval| {
        tracing::info!("🧹 Reconciliation sweep every {:?}", interval);
        tenants
            .reconciler
            .spawn_sweeper(interval, shutdown.clone())
    });

    let state = Arc::new(AppState { tenants });

    // Create router
    let app = routes::create_router(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    tracing::info!("📡 Routes configured:");
    tracing::info!("   GET    /health");
    tracing::info!("   POST   /api/businesses");
    tracing::info!("   GET    /api/businesses/:id");
    tracing::info!("   PATCH  /api/businesses/:id");
    tracing::info!("   DELETE /api/businesses/:id");
    tracing::info!("   PUT    /api/businesses/:id/owner");
    tracing::info!("   POST   /api/businesses/:id/deactivate");
    tracing::info!("   POST   /api/businesses/:id/provision");
    tracing::info!("   GET    /api/products");
    tracing::info!("   POST   /api/products");

    // Start server
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("✅ Server ready at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .context("Server error")?;

    shutdown.cancel();
    if let Some(sweeper) = sweeper {
        let _ = sweeper.await;
    }

    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("🛑 Shutdown signal received");
        }
        _ = shutdown.cancelled() => {}
    }
    shutdown.cancel();
}
