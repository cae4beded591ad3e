//! Diff engine - comparison, sync policy and the tree differ

mod compare;
mod engine;
mod policy;

pub use compare::{compare_files, Freshness};
pub use engine::{synchronize, SyncOptions};
pub use policy::{forward_actions, reverse_action};
