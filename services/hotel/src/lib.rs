//! # Hotel Service
//!
//! Process roles of the hotel allocation system:
//!
//! - **supervise**: hosts the shared resources, reads the client queue and
//!   launches one booking agent per client
//! - **agent**: books, holds and releases a room for one client
//! - **host**: hosts the shared resources for agents launched elsewhere

pub mod agent;
pub mod error;
pub mod host;
pub mod launcher;
pub mod logging;
pub mod shutdown;
pub mod supervisor;

pub use agent::{BookingAgent, RequestSource};
pub use error::{HotelError, Result};
pub use host::{run_host, HostedLedger, HotelResources};
pub use launcher::{AgentExit, AgentHandle, AgentLauncher, Handoff, ProcessLauncher, TaskLauncher};
pub use supervisor::{Supervisor, SupervisorState, SupervisorSummary};
