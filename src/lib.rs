pub mod amount;
pub mod change;
pub mod csv;
pub mod ledger;
pub mod machine;
pub mod model;

pub use amount::Amount;
pub use ledger::{Ledger, LedgerKey};
pub use machine::{Machine, MachineConfig, MachineError, MachineState};
pub use model::{Coin, Command, Product};
