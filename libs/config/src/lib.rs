//! # Hotel Configuration
//!
//! Configuration shared by the hosting process, the supervisor and every
//! booking agent. All processes of one hotel must agree on the IPC names
//! below, so they are loaded the same way everywhere:
//!
//! 1. built-in defaults ([`defaults`])
//! 2. an optional TOML file
//! 3. `HOTEL_*` environment variables (`HOTEL_IPC__GATE_NAME=/my_gate`)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hotel_config::load_config;
//!
//! let config = load_config(None).unwrap();
//! println!("gate semaphore: {}", config.ipc.gate_name);
//! ```

pub mod defaults;
pub mod hotel_config;

pub use hotel_config::{
    load_config, AgentConfig, HotelConfig, IpcConfig, LoggingConfig, SupervisorConfig,
    TransportKind,
};
