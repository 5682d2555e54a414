pub mod persistence;
pub mod tab;
pub mod tracker;

pub use persistence::{PersistOutcome, PersistenceBridge, RestoreSource};
pub use tracker::{PageContext, Tracker};
