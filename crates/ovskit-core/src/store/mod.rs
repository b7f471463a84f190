mod data_store;
mod snapshot;
mod table;

pub use data_store::{ApplyOutcome, DataStore};
