use crate::shutdown;
use smart_agenda::components::agenda::Agenda;
use smart_agenda::components::event_cache::{EventCache, MemoryEventCache};
use smart_agenda::components::notifier::{LogNotifier, NotificationCenter, WebhookNotifier};
use smart_agenda::components::redis_service::{RedisActor, RedisActorHandle};
use smart_agenda::components::{AppContext, ComponentManager};
use smart_agenda::config::Config;
use smart_agenda::error::Error;
use smart_agenda::preferences::PreferencesStore;
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn,redis=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub async fn load_config() -> miette::Result<Arc<RwLock<Config>>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(RwLock::new(config))),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Shared services plus the Redis actor backing the cache, if any
pub struct Services {
    pub context: AppContext,
    pub redis: Option<RedisActorHandle>,
}

impl Services {
    /// Stop the Redis actor
    pub async fn close(&self) {
        if let Some(redis) = &self.redis {
            if let Err(e) = redis.shutdown().await {
                error!("Error shutting down Redis actor: {:?}", e);
            }
        }
    }
}

/// Open the preferences, the event cache and the notification sinks
pub async fn build_services(config: Arc<RwLock<Config>>) -> miette::Result<Services> {
    let config_read = config.read().await;

    let preferences = Arc::new(PreferencesStore::open(&config_read.preferences_path)?);

    // Redis when configured, in-process map otherwise
    let (cache, redis): (Arc<dyn EventCache>, Option<RedisActorHandle>) =
        match &config_read.redis_url {
            Some(url) => {
                let (mut redis_actor, redis_handle) = RedisActor::new(url)?;
                tokio::spawn(async move {
                    redis_actor.run().await;
                });
                info!("Using Redis event cache");
                let cache: Arc<dyn EventCache> = Arc::new(redis_handle.clone());
                (cache, Some(redis_handle))
            }
            None => {
                info!("No REDIS_URL set, using in-memory event cache");
                let cache: Arc<dyn EventCache> = Arc::new(MemoryEventCache::new());
                (cache, None)
            }
        };

    let mut center = NotificationCenter::new().with_sink(Arc::new(LogNotifier));
    if let Some(url) = &config_read.webhook_url {
        let webhook = WebhookNotifier::new(url, config_read.http_timeout())?;
        center = center.with_sink(Arc::new(webhook));
        info!("Notifications are also posted to the webhook");
    }

    drop(config_read);

    Ok(Services {
        context: AppContext {
            config,
            preferences,
            cache,
            notifier: Arc::new(center),
        },
        redis,
    })
}

/// Run the daemon until a termination signal arrives
pub async fn start_daemon(services: Services) -> miette::Result<()> {
    let Services { context, redis } = services;

    // Initialize component manager
    let mut component_manager = ComponentManager::new(Arc::clone(&context.config));

    // Register Agenda component
    component_manager.register(Agenda::new());

    let component_manager = Arc::new(component_manager);

    // Create shutdown channel
    let (shutdown_send, shutdown_recv) = oneshot::channel();

    // Spawn signal handler task
    let shutdown_components = Arc::clone(&component_manager);
    tokio::spawn(async move {
        shutdown::handle_signals(shutdown_send, shutdown_components, redis).await;
    });

    // Initialize components
    if let Err(e) = component_manager.init_all(&context).await {
        error!("Failed to initialize components: {:?}", e);
    }

    info!("SmartAgenda daemon running");
    let _ = shutdown_recv.await;
    info!("Received shutdown signal, daemon stopped");
    Ok(())
}
