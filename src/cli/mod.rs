pub mod assets;
pub mod ledger;
pub mod rates;
pub mod setup;
pub mod stats;
pub mod ui;
