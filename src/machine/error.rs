//! Error types for machine operations.

use thiserror::Error;

use super::MachineState;
use crate::Amount;
use crate::change::ChangeError;
use crate::model::{Coin, Product};

/// Top-level error returned by the public [`Machine`](super::Machine) operations.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("configuration rejected: {0}")]
    Config(#[from] ConfigError),

    #[error("selection failed: {0}")]
    Selection(#[from] SelectionError),

    #[error("stock error: {0}")]
    Stock(#[from] StockError),

    #[error("purchase failed: {0}")]
    Purchase(#[from] PurchaseError),

    #[error("not permitted: {0}")]
    Privilege(#[from] PrivilegeError),
}

/// Invalid construction parameters. No machine is produced.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max capacity must be greater than 0")]
    ZeroCapacity,
    #[error("product level {0} exceeds max capacity {1}")]
    ProductLevelExceedsCapacity(u32, u32),
    #[error("{field} must be a non-negative integer, got '{value}'")]
    Invalid { field: &'static str, value: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no product has code '{0}'")]
    InvalidCode(String),
    #[error("no item is selected")]
    NoItemSelected,
    #[error("items cannot be selected while {0}")]
    Unavailable(MachineState),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StockError {
    #[error("coin count must be at least 1, got {0}")]
    InvalidCoinCount(u32),
    #[error("no room for {1} more {0} coins")]
    Overflow(Coin, u32),
    #[error(transparent)]
    Change(#[from] ChangeError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PurchaseError {
    #[error("{0} costs {1}, only {2} deposited")]
    InsufficientFunds(Product, Amount, Amount),
    #[error("{0} is out of stock")]
    OutOfStock(Product),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrivilegeError {
    #[error("login details are incorrect")]
    InvalidCredentials,
    #[error("{0} requires admin mode")]
    AdminRequired(&'static str),
}
