//! Repository implementations

mod account;
mod ledger;
mod merch;

pub use account::AccountRepo;
pub use ledger::LedgerRepo;
pub use merch::MerchRepo;
