//! Inventory Ledger
//!
//! Per (variant, location) stock with reservation semantics. The
//! authority for "can this be sold right now": `0 <= reserved <= quantity`
//! holds after every operation because each one is a conditional UPDATE.

pub mod error;
pub mod ledger;

pub use error::{InventoryError, InventoryResult};
pub use ledger::InventoryLedger;
