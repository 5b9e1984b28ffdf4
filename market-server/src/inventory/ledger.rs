//! Inventory Ledger
//!
//! Connection-level `*_in` functions run inside a caller's transaction;
//! [`InventoryLedger`] wraps each in its own short transaction under the
//! retry policy. Every mutation writes one movement row next to the
//! stock record change.

use super::error::{InventoryError, InventoryResult};
use crate::db::RetryPolicy;
use crate::db::repository::stock;
use shared::models::{MovementReason, StockMovement, StockRecord};
use shared::util::{now_millis, snowflake_id};
use sqlx::{SqliteConnection, SqlitePool};

/// Re-reads allowed when a release races another release on the same row
const RELEASE_CAS_ATTEMPTS: usize = 3;

fn require_positive(qty: i64) -> InventoryResult<()> {
    if qty <= 0 {
        return Err(InventoryError::InvalidQuantity(qty));
    }
    Ok(())
}

async fn record_movement(
    conn: &mut SqliteConnection,
    variant_id: i64,
    location_id: i64,
    delta: i64,
    reason: MovementReason,
    order_id: Option<i64>,
    note: Option<&str>,
    now: i64,
) -> InventoryResult<()> {
    let movement = StockMovement {
        id: snowflake_id(),
        variant_id,
        location_id,
        delta,
        reason,
        order_id,
        note: note.map(str::to_string),
        created_at: now,
    };
    stock::insert_movement(conn, &movement).await?;
    Ok(())
}

async fn existing(
    conn: &mut SqliteConnection,
    variant_id: i64,
    location_id: i64,
) -> InventoryResult<StockRecord> {
    stock::find(conn, variant_id, location_id)
        .await?
        .ok_or(InventoryError::NotFound {
            variant_id,
            location_id,
        })
}

pub async fn check_available_in(
    conn: &mut SqliteConnection,
    variant_id: i64,
    location_id: i64,
    qty: i64,
) -> InventoryResult<bool> {
    Ok(stock::find(conn, variant_id, location_id)
        .await?
        .is_some_and(|r| r.available() >= qty))
}

pub async fn reserve_in(
    conn: &mut SqliteConnection,
    variant_id: i64,
    location_id: i64,
    qty: i64,
    order_id: Option<i64>,
) -> InventoryResult<StockRecord> {
    require_positive(qty)?;
    let now = now_millis();
    match stock::try_reserve(conn, variant_id, location_id, qty, now).await? {
        Some(record) => {
            record_movement(conn, variant_id, location_id, qty, MovementReason::Reserve, order_id, None, now)
                .await?;
            Ok(record)
        }
        None => {
            let current = existing(conn, variant_id, location_id).await?;
            Err(InventoryError::InsufficientStock {
                variant_id,
                location_id,
                requested: qty,
                available: current.available(),
            })
        }
    }
}

/// Decrement `reserved` by `qty`, floored at 0. Returns the record and the
/// amount actually released.
pub async fn release_in(
    conn: &mut SqliteConnection,
    variant_id: i64,
    location_id: i64,
    qty: i64,
    order_id: Option<i64>,
) -> InventoryResult<(StockRecord, i64)> {
    require_positive(qty)?;
    for _ in 0..RELEASE_CAS_ATTEMPTS {
        let current = existing(conn, variant_id, location_id).await?;
        let released = qty.min(current.reserved);
        if released == 0 {
            return Ok((current, 0));
        }
        let now = now_millis();
        if let Some(record) = stock::try_release(conn, variant_id, location_id, released, now).await? {
            record_movement(
                conn,
                variant_id,
                location_id,
                -released,
                MovementReason::Release,
                order_id,
                None,
                now,
            )
            .await?;
            return Ok((record, released));
        }
    }
    Err(InventoryError::Contended {
        variant_id,
        location_id,
    })
}

/// Stock physically leaves: `quantity` and `reserved` both drop by `qty`
pub async fn fulfill_in(
    conn: &mut SqliteConnection,
    variant_id: i64,
    location_id: i64,
    qty: i64,
    order_id: Option<i64>,
) -> InventoryResult<StockRecord> {
    require_positive(qty)?;
    let now = now_millis();
    match stock::try_fulfill(conn, variant_id, location_id, qty, now).await? {
        Some(record) => {
            record_movement(conn, variant_id, location_id, -qty, MovementReason::Fulfill, order_id, None, now)
                .await?;
            Ok(record)
        }
        None => {
            let current = existing(conn, variant_id, location_id).await?;
            Err(InventoryError::InsufficientStock {
                variant_id,
                location_id,
                requested: qty,
                available: current.reserved,
            })
        }
    }
}

/// Manual correction of `quantity`. A positive delta on a missing record
/// creates it.
pub async fn adjust_in(
    conn: &mut SqliteConnection,
    variant_id: i64,
    location_id: i64,
    delta: i64,
    reason: &str,
) -> InventoryResult<StockRecord> {
    if delta == 0 {
        return Err(InventoryError::InvalidQuantity(delta));
    }
    let now = now_millis();
    let record = if delta > 0 {
        stock::upsert_quantity(conn, variant_id, location_id, delta, now).await?
    } else {
        match stock::try_adjust(conn, variant_id, location_id, delta, now).await? {
            Some(record) => record,
            None => {
                existing(conn, variant_id, location_id).await?;
                return Err(InventoryError::AdjustmentBelowReserved {
                    variant_id,
                    location_id,
                    delta,
                });
            }
        }
    };
    record_movement(conn, variant_id, location_id, delta, MovementReason::Adjust, None, Some(reason), now)
        .await?;
    Ok(record)
}

/// Units coming back from a completed return
pub async fn restock_in(
    conn: &mut SqliteConnection,
    variant_id: i64,
    location_id: i64,
    qty: i64,
    order_id: Option<i64>,
) -> InventoryResult<StockRecord> {
    require_positive(qty)?;
    let now = now_millis();
    let record = stock::upsert_quantity(conn, variant_id, location_id, qty, now).await?;
    record_movement(conn, variant_id, location_id, qty, MovementReason::Return, order_id, None, now)
        .await?;
    Ok(record)
}

/// `(location_id, quantity)` still reserved by `order_id` for the variant
pub async fn reservations_for_in(
    conn: &mut SqliteConnection,
    order_id: i64,
    variant_id: i64,
) -> InventoryResult<Vec<(i64, i64)>> {
    Ok(stock::order_reservations(conn, order_id, variant_id).await?)
}

/// Inventory ledger bound to a pool
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    pool: SqlitePool,
    retry: RetryPolicy,
}

impl InventoryLedger {
    pub fn new(pool: SqlitePool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    /// `quantity - reserved >= qty`; a missing record has nothing available
    pub async fn check_available(&self, variant_id: i64, location_id: i64, qty: i64) -> InventoryResult<bool> {
        let mut conn = self.pool.acquire().await?;
        check_available_in(&mut conn, variant_id, location_id, qty).await
    }

    pub async fn reserve(
        &self,
        variant_id: i64,
        location_id: i64,
        qty: i64,
        order_id: i64,
    ) -> InventoryResult<StockRecord> {
        let pool = &self.pool;
        self.retry
            .run("inventory.reserve", move || async move {
                let mut tx = pool.begin().await?;
                let record = reserve_in(&mut tx, variant_id, location_id, qty, Some(order_id)).await?;
                tx.commit().await?;
                Ok::<_, InventoryError>(record)
            })
            .await
    }

    pub async fn release(
        &self,
        variant_id: i64,
        location_id: i64,
        qty: i64,
        order_id: Option<i64>,
    ) -> InventoryResult<StockRecord> {
        let pool = &self.pool;
        self.retry
            .run("inventory.release", move || async move {
                let mut tx = pool.begin().await?;
                let (record, released) = release_in(&mut tx, variant_id, location_id, qty, order_id).await?;
                tx.commit().await?;
                if released < qty {
                    tracing::debug!(variant_id, location_id, qty, released, "Release floored at 0");
                }
                Ok::<_, InventoryError>(record)
            })
            .await
    }

    pub async fn fulfill(
        &self,
        variant_id: i64,
        location_id: i64,
        qty: i64,
        order_id: Option<i64>,
    ) -> InventoryResult<StockRecord> {
        let pool = &self.pool;
        self.retry
            .run("inventory.fulfill", move || async move {
                let mut tx = pool.begin().await?;
                let record = fulfill_in(&mut tx, variant_id, location_id, qty, order_id).await?;
                tx.commit().await?;
                Ok::<_, InventoryError>(record)
            })
            .await
    }

    pub async fn adjust(
        &self,
        variant_id: i64,
        location_id: i64,
        delta: i64,
        reason: &str,
    ) -> InventoryResult<StockRecord> {
        let pool = &self.pool;
        let record = self
            .retry
            .run("inventory.adjust", move || async move {
                let mut tx = pool.begin().await?;
                let record = adjust_in(&mut tx, variant_id, location_id, delta, reason).await?;
                tx.commit().await?;
                Ok::<_, InventoryError>(record)
            })
            .await?;
        tracing::info!(variant_id, location_id, delta, reason, "Stock adjusted");
        Ok(record)
    }

    pub async fn restock(
        &self,
        variant_id: i64,
        location_id: i64,
        qty: i64,
        order_id: Option<i64>,
    ) -> InventoryResult<StockRecord> {
        let pool = &self.pool;
        self.retry
            .run("inventory.restock", move || async move {
                let mut tx = pool.begin().await?;
                let record = restock_in(&mut tx, variant_id, location_id, qty, order_id).await?;
                tx.commit().await?;
                Ok::<_, InventoryError>(record)
            })
            .await
    }

    /// Single location able to cover `qty` on its own, highest available
    /// first; `None` when no one location can.
    pub async fn find_best_location(&self, variant_id: i64, qty: i64) -> InventoryResult<Option<i64>> {
        require_positive(qty)?;
        let mut conn = self.pool.acquire().await?;
        Ok(stock::best_location(&mut conn, variant_id, qty)
            .await?
            .map(|(location_id, _)| location_id))
    }

    pub async fn get(&self, variant_id: i64, location_id: i64) -> InventoryResult<StockRecord> {
        let mut conn = self.pool.acquire().await?;
        existing(&mut conn, variant_id, location_id).await
    }

    /// Checkout-time availability across all active locations
    pub async fn total_available(&self, variant_id: i64) -> InventoryResult<i64> {
        let mut conn = self.pool.acquire().await?;
        Ok(stock::total_available(&mut conn, variant_id).await?)
    }

    pub async fn reservations_for(&self, order_id: i64, variant_id: i64) -> InventoryResult<Vec<(i64, i64)>> {
        let mut conn = self.pool.acquire().await?;
        reservations_for_in(&mut conn, order_id, variant_id).await
    }

    /// First location still holding a reservation for this order and variant
    pub async fn reservation_for(&self, order_id: i64, variant_id: i64) -> InventoryResult<Option<(i64, i64)>> {
        Ok(self.reservations_for(order_id, variant_id).await?.into_iter().next())
    }

    pub async fn movements(&self, variant_id: i64, location_id: i64) -> InventoryResult<Vec<StockMovement>> {
        let mut conn = self.pool.acquire().await?;
        Ok(stock::movements(&mut conn, variant_id, location_id).await?)
    }
}
