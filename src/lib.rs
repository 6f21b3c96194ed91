pub mod config;
pub mod core;
pub mod domain;
pub mod tracking;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{ClientConfig, FileSessionStore, LocalStorage, MemorySessionStore};

pub use core::{ApiClient, AuthSession};
pub use tracking::{Logbook, TrackPlayer, TrackRecorder};
pub use utils::error::{MarinexError, Result};
