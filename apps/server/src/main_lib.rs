use std::sync::Arc;

use crate::config::Config;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use wealthdesk_core::{
    irr::{IrrCache, IrrService, IrrServiceTrait},
    portfolios::PortfolioRepositoryTrait,
    scheduled::{ScheduledTransactionService, ScheduledTransactionServiceTrait},
    transactions::{OrderedTransactionService, OrderedTransactionServiceTrait},
};
use wealthdesk_storage_sqlite::{
    db::{self, write_actor},
    ActivityRepository, PortfolioRepository, ScheduledTransactionRepository, StoredIrrRepository,
    ValuationRepository,
};

pub struct AppState {
    pub portfolio_repository: Arc<dyn PortfolioRepositoryTrait>,
    pub irr_service: Arc<dyn IrrServiceTrait>,
    pub transaction_service: Arc<dyn OrderedTransactionServiceTrait>,
    pub scheduled_service: Arc<dyn ScheduledTransactionServiceTrait>,
    /// Process-wide result cache shared by every request.
    pub irr_cache: Arc<IrrCache>,
}

pub fn init_tracing() {
    let log_format = std::env::var("WD_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // `try_init` also routes `log` records from the library crates into tracing.
    let installed = if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .try_init()
    };
    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    // Keep DATABASE_URL aligned with WD_DB_PATH so the storage crate opens the same file
    std::env::set_var("DATABASE_URL", &config.db_path);
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = write_actor::spawn_writer((*pool).clone());

    let portfolio_repository = Arc::new(PortfolioRepository::new(pool.clone(), writer.clone()));
    let activity_repository = Arc::new(ActivityRepository::new(pool.clone(), writer.clone()));
    let valuation_repository = Arc::new(ValuationRepository::new(pool.clone(), writer.clone()));
    let stored_irr_repository = Arc::new(StoredIrrRepository::new(pool.clone(), writer.clone()));
    let schedule_repository = Arc::new(ScheduledTransactionRepository::new(
        pool.clone(),
        writer.clone(),
    ));

    let irr_cache = Arc::new(IrrCache::new(config.cache_ttl_minutes));
    let irr_service: Arc<dyn IrrServiceTrait> = Arc::new(IrrService::new(
        portfolio_repository.clone(),
        activity_repository.clone(),
        valuation_repository.clone(),
        stored_irr_repository,
        irr_cache.clone(),
    ));
    let transaction_service: Arc<dyn OrderedTransactionServiceTrait> =
        Arc::new(OrderedTransactionService::new(
            activity_repository,
            valuation_repository,
            portfolio_repository.clone(),
            irr_service.clone(),
        ));
    let scheduled_service = Arc::new(ScheduledTransactionService::new(
        schedule_repository,
        portfolio_repository.clone(),
        transaction_service.clone(),
    ));

    Ok(Arc::new(AppState {
        portfolio_repository,
        irr_service,
        transaction_service,
        scheduled_service,
        irr_cache,
    }))
}
