use anyhow::Context;
use drivehub_api::{app, AppState, AuthConfig};
use drivehub_catalog::SharePercentage;
use drivehub_core::repository::{LocationRepository, ReservationRepository, VehicleRepository};
use drivehub_core::{Collaborators, NotificationSink, ServiceRules};
use drivehub_store::app_config::Config;
use drivehub_store::{BroadcastNotifier, DbClient, EventProducer, InMemoryStore, LocalDocumentStore, PgStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct Repositories {
    vehicles: Arc<dyn VehicleRepository>,
    reservations: Arc<dyn ReservationRepository>,
    locations: Arc<dyn LocationRepository>,
}

async fn repositories(config: &Config) -> anyhow::Result<Repositories> {
    match &config.database.url {
        Some(url) => {
            let db = DbClient::new(url, config.database.max_connections, config.business_rules.store_timeout())
                .await
                .context("Failed to connect to PostgreSQL")?;
            db.migrate().await.context("Failed to run migrations")?;
            let store = Arc::new(PgStore::new(db.pool));
            Ok(Repositories {
                vehicles: store.clone(),
                reservations: store.clone(),
                locations: store,
            })
        }
        None => {
            tracing::warn!("No database.url configured; using the in-memory store");
            let store = Arc::new(InMemoryStore::new());
            Ok(Repositories {
                vehicles: store.clone(),
                reservations: store.clone(),
                locations: store,
            })
        }
    }
}

fn notifier(config: &Config) -> anyhow::Result<Arc<dyn NotificationSink>> {
    match &config.kafka.brokers {
        Some(brokers) => {
            let producer = EventProducer::new(brokers, &config.kafka.topic_prefix)
                .context("Failed to create Kafka producer")?;
            Ok(Arc::new(producer))
        }
        None => {
            let broadcast = BroadcastNotifier::new(100);
            let mut rx = broadcast.subscribe();
            tokio::spawn(async move {
                while let Ok(event) = rx.recv().await {
                    tracing::debug!(reservation_id = %event.reservation_id(), topic = event.topic(), "Booking event");
                }
            });
            Ok(Arc::new(broadcast))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "drivehub_api=debug,drivehub_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting DriveHub API on port {}", config.server.port);

    let repos = repositories(&config).await?;
    let documents = LocalDocumentStore::new(&config.documents.root, &config.documents.public_base_url)
        .await
        .context("Failed to prepare document root")?;
    let default_owner_share = SharePercentage::try_from(config.business_rules.default_owner_share)
        .context("business_rules.default_owner_share")?;

    let ctx = Collaborators {
        vehicles: repos.vehicles,
        reservations: repos.reservations,
        locations: repos.locations,
        documents: Arc::new(documents),
        notifier: notifier(&config)?,
        rules: ServiceRules {
            store_timeout: config.business_rules.store_timeout(),
            default_owner_share,
        },
    };

    let app_state = AppState::new(
        ctx,
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
    );

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
