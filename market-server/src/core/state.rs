use std::sync::Arc;

use crate::balance::BalanceLedger;
use crate::collaborators::OrderEventBus;
use crate::core::Config;
use crate::db::DbService;
use crate::inventory::InventoryLedger;
use crate::orders::{Collaborators, OrderService};
use crate::payouts::PayoutService;
use crate::utils::AppError;

/// Server state shared by every handler
///
/// All services are cheap to clone: they hold the pool plus the retry
/// policy, and the orchestrator sits behind an `Arc`.
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    /// Changes on every start; lets clients notice a restart
    pub epoch: String,
    pub inventory: InventoryLedger,
    pub balance: BalanceLedger,
    pub payouts: PayoutService,
    pub orders: Arc<OrderService>,
    pub events: OrderEventBus,
}

impl ServerState {
    /// Open the database and wire the services
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        let db = DbService::with_max_connections(&config.database_path, config.db_max_connections).await?;
        Ok(Self::with_db(config.clone(), db))
    }

    /// Wire the services on an already opened database
    pub fn with_db(config: Config, db: DbService) -> Self {
        let pool = db.pool.clone();
        let retry = config.retry;
        let events = OrderEventBus::new(config.event_channel_capacity);

        let inventory = InventoryLedger::new(pool.clone(), retry);
        let balance = BalanceLedger::new(pool.clone(), retry);
        let payouts = PayoutService::new(pool.clone(), retry);
        let orders = OrderService::new(
            pool.clone(),
            retry,
            inventory.clone(),
            balance.clone(),
            Collaborators::sql(&pool, events.clone()),
        );

        Self {
            config,
            db,
            epoch: uuid::Uuid::new_v4().to_string(),
            inventory,
            balance,
            payouts,
            orders: Arc::new(orders),
            events,
        }
    }
}
