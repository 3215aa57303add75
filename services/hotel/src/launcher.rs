//! Launching booking agents
//!
//! The supervisor only needs to start an agent, notice when it exits and
//! ask it to stop. [`ProcessLauncher`] re-executes the `hotel` binary with
//! the `agent` subcommand; [`TaskLauncher`] runs agents as tasks of the
//! current process.

use crate::agent::{BookingAgent, RequestSource};
use crate::error::{HotelError, Result};
use async_trait::async_trait;
use hotel_config::TransportKind;
use hotel_transport::{Gate, LedgerTransport, MappedLedger, Rendezvous};
use hotel_types::{BookingOutcome, ClientId, ClientRequest};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How the supervisor passes a client record to a new agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handoff {
    /// Record already written to the mapping's handoff area
    SharedRegion,
    /// Record passed as launch arguments
    Arguments,
}

#[async_trait]
pub trait AgentLauncher: Send {
    async fn launch(&mut self, request: &ClientRequest, handoff: Handoff) -> Result<AgentHandle>;
}

/// How an agent ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentExit {
    pub client_id: ClientId,
    pub success: bool,
    /// Known only for in-process agents
    pub outcome: Option<BookingOutcome>,
}

enum Running {
    Process(Child),
    Task {
        handle: JoinHandle<Result<BookingOutcome>>,
        cancel: CancellationToken,
    },
}

/// A launched agent
pub struct AgentHandle {
    client_id: ClientId,
    running: Running,
    exit: Option<AgentExit>,
}

impl AgentHandle {
    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Non-blocking exit check
    pub fn has_exited(&mut self) -> bool {
        if self.exit.is_some() {
            return true;
        }
        let client_id = self.client_id;
        let exit = match &mut self.running {
            Running::Process(child) => match child.try_wait() {
                Ok(Some(status)) => Some(AgentExit {
                    client_id,
                    success: status.success(),
                    outcome: None,
                }),
                Ok(None) => None,
                Err(e) => {
                    warn!(client_id = %client_id, "Failed to poll agent process: {}", e);
                    None
                }
            },
            Running::Task { handle, .. } => {
                // the result is collected by wait()
                return handle.is_finished();
            }
        };
        self.exit = exit;
        self.exit.is_some()
    }

    /// Ask the agent to stop: SIGTERM for a process, cancellation for a task
    pub fn terminate(&mut self) {
        if self.exit.is_some() {
            return;
        }
        match &self.running {
            Running::Process(child) => {
                let Some(pid) = child.id() else { return };
                if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                    debug!(client_id = %self.client_id, "SIGTERM to agent failed: {}", e);
                }
            }
            Running::Task { cancel, .. } => cancel.cancel(),
        }
    }

    /// Wait for the agent to exit
    pub async fn wait(&mut self) -> AgentExit {
        if let Some(exit) = &self.exit {
            return exit.clone();
        }
        let client_id = self.client_id;
        let exit = match &mut self.running {
            Running::Process(child) => {
                let success = match child.wait().await {
                    Ok(status) => status.success(),
                    Err(e) => {
                        warn!(client_id = %client_id, "Failed to wait for agent process: {}", e);
                        false
                    }
                };
                AgentExit {
                    client_id,
                    success,
                    outcome: None,
                }
            }
            Running::Task { handle, .. } => match handle.await {
                Ok(Ok(outcome)) => AgentExit {
                    client_id,
                    success: true,
                    outcome: Some(outcome),
                },
                Ok(Err(e)) => {
                    warn!(client_id = %client_id, "Agent failed: {}", e);
                    AgentExit {
                        client_id,
                        success: false,
                        outcome: None,
                    }
                }
                Err(e) => {
                    warn!(client_id = %client_id, "Agent task panicked: {}", e);
                    AgentExit {
                        client_id,
                        success: false,
                        outcome: None,
                    }
                }
            },
        };
        self.exit = Some(exit.clone());
        exit
    }
}

/// Starts each agent as a new OS process running `hotel agent`
pub struct ProcessLauncher {
    program: PathBuf,
    transport: TransportKind,
    config_path: Option<PathBuf>,
    log_level: Option<String>,
    json_logs: bool,
}

impl ProcessLauncher {
    pub fn new(program: PathBuf, transport: TransportKind) -> Self {
        Self {
            program,
            transport,
            config_path: None,
            log_level: None,
            json_logs: false,
        }
    }

    /// Forward the supervisor's config file to every agent
    pub fn with_config(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Forward explicit logging flags to every agent
    pub fn with_logging(mut self, level: Option<String>, json_logs: bool) -> Self {
        self.log_level = level;
        self.json_logs = json_logs;
        self
    }

    fn command(&self, request: &ClientRequest, handoff: Handoff) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(path) = &self.config_path {
            cmd.arg("--config").arg(path);
        }
        if let Some(level) = &self.log_level {
            cmd.arg("--log-level").arg(level);
        }
        if self.json_logs {
            cmd.arg("--json-logs");
        }
        cmd.arg("agent")
            .arg("--transport")
            .arg(self.transport.to_string())
            .arg("--rendezvous");

        match handoff {
            Handoff::SharedRegion => {
                cmd.arg("--handoff");
            }
            Handoff::Arguments => {
                cmd.arg("--id")
                    .arg(request.id.to_string())
                    .arg("--gender")
                    .arg(i32::from(request.gender).to_string())
                    .arg("--rent")
                    .arg(request.rent_duration.to_string());
            }
        }

        cmd.stdin(Stdio::null()).kill_on_drop(false);
        cmd
    }
}

#[async_trait]
impl AgentLauncher for ProcessLauncher {
    async fn launch(&mut self, request: &ClientRequest, handoff: Handoff) -> Result<AgentHandle> {
        let child = self
            .command(request, handoff)
            .spawn()
            .map_err(|source| HotelError::Launch {
                client_id: request.id,
                source,
            })?;

        debug!(client_id = %request.id, pid = ?child.id(), "Agent process started");
        Ok(AgentHandle {
            client_id: request.id,
            running: Running::Process(child),
            exit: None,
        })
    }
}

/// Runs each agent as a task sharing this process's gate and transport
pub struct TaskLauncher {
    gate: Gate,
    transport: Arc<dyn LedgerTransport>,
    region: Option<Arc<MappedLedger>>,
    rendezvous: Rendezvous,
    rent_unit: Duration,
}

impl TaskLauncher {
    /// `region` is required for [`Handoff::SharedRegion`] launches
    pub fn new(
        gate: Gate,
        transport: Arc<dyn LedgerTransport>,
        region: Option<Arc<MappedLedger>>,
        rendezvous: Rendezvous,
        rent_unit: Duration,
    ) -> Self {
        Self {
            gate,
            transport,
            region,
            rendezvous,
            rent_unit,
        }
    }
}

#[async_trait]
impl AgentLauncher for TaskLauncher {
    async fn launch(&mut self, request: &ClientRequest, handoff: Handoff) -> Result<AgentHandle> {
        let region = match handoff {
            Handoff::SharedRegion => Some(self.region.clone().ok_or_else(|| {
                HotelError::Launch {
                    client_id: request.id,
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "no shared region for handoff",
                    ),
                }
            })?),
            Handoff::Arguments => None,
        };

        let agent = BookingAgent::new(self.gate.clone(), self.transport.clone(), self.rent_unit);
        let rendezvous = self.rendezvous.clone();
        let cancel = CancellationToken::new();
        let request = *request;

        let handle = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                let source = match &region {
                    Some(region) => RequestSource::Handoff(region),
                    None => RequestSource::Arguments(request),
                };
                agent.start(source, Some(&rendezvous), &cancel).await
            }
        });

        Ok(AgentHandle {
            client_id: request.id,
            running: Running::Task { handle, cancel },
            exit: None,
        })
    }
}
