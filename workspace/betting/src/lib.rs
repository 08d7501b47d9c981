//! Core of the race betting backend: accounts, drivers, the wallet ledger,
//! race resolution and the account lifecycle.
//!
//! Every operation takes an explicit database connection; nothing here holds
//! global state.

pub mod accounts;
pub mod drivers;
pub mod error;
pub mod lifecycle;
pub mod race;
pub mod rolls;
pub mod wallet;

#[cfg(test)]
mod testing;

pub use accounts::{AccountStore, AdminSeed, NewAccount, ProfileUpdate};
pub use drivers::{DriverRegistry, DriverUpdate, NewDriver, Standing};
pub use error::{BettingError, RaceRejection, Result};
pub use lifecycle::{AccountLifecycle, LifecycleAction, StatusOverview};
pub use race::{RaceOutcome, RaceRequest, RaceResolver, RaceResult, Roll, Settlement};
pub use rolls::{RollSource, ScriptedRolls, ThreadRngRolls};
pub use wallet::WalletLedger;
