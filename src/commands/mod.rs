//! Command implementations for duckrow CLI

pub mod completions;
pub mod helpers;
pub mod install;
pub mod list;
pub mod registry;
pub mod sync;
pub mod uninstall;
pub mod update;
pub mod version;
