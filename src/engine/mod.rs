//! Conflict engine: employee row locking, cross-record conflict checks,
//! hour aggregation and overtime accrual.
pub mod aggregator;
pub mod conflict;
pub mod error;
pub mod lock;
pub mod mysql_store;
pub mod overtime;
pub mod store;

#[cfg(test)]
pub(crate) mod memory_store;
