pub mod export;
pub mod ledger;
