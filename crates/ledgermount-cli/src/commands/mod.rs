//! Command handlers

pub mod config;
pub mod ledger;
pub mod mounts;
pub mod record;
pub mod status;
pub mod sync;
