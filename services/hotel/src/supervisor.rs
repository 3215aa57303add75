//! Supervisor
//!
//! Reads the client queue in order and launches one booking agent per
//! record. Before each dispatch it waits on the rendezvous, which the
//! previous agent signals once it has copied its record, so the handoff
//! area is never overwritten under a reader. Booking itself is not awaited;
//! agents finish in any order.

use crate::error::{HotelError, Result};
use crate::launcher::{AgentExit, AgentHandle, AgentLauncher, Handoff};
use hotel_codec::ClientQueue;
use hotel_transport::{MappedLedger, Rendezvous};
use std::io::BufRead;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// Waiting for the last launched agent to take its record
    AwaitingAcknowledgment,
    /// Reading the next record and launching its agent
    Dispatching,
    /// An agent was launched and has not acknowledged yet
    ChildRunning,
    /// The queue is exhausted and every agent has exited
    Finished,
}

/// What one supervisor run did
#[derive(Debug, Default)]
pub struct SupervisorSummary {
    pub dispatched: usize,
    pub exits: Vec<AgentExit>,
}

impl SupervisorSummary {
    pub fn failed(&self) -> usize {
        self.exits.iter().filter(|e| !e.success).count()
    }
}

pub struct Supervisor<L> {
    launcher: L,
    rendezvous: Rendezvous,
    region: Option<Arc<MappedLedger>>,
    agents: Vec<AgentHandle>,
    state: SupervisorState,
}

impl<L: AgentLauncher> Supervisor<L> {
    /// With a `region`, records go through its handoff area; otherwise they
    /// are passed as launch arguments.
    pub fn new(launcher: L, rendezvous: Rendezvous, region: Option<Arc<MappedLedger>>) -> Self {
        Self {
            launcher,
            rendezvous,
            region,
            agents: Vec::new(),
            state: SupervisorState::AwaitingAcknowledgment,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Dispatch the whole queue and wait for every agent.
    ///
    /// On cancellation or a failed launch, running agents are sent a
    /// termination request and awaited before the error is returned.
    #[instrument(name = "supervisor", skip_all)]
    pub async fn run<R: BufRead>(
        &mut self,
        queue: ClientQueue<R>,
        cancel: &CancellationToken,
    ) -> Result<SupervisorSummary> {
        let result = self.dispatch_all(queue, cancel).await;
        match result {
            Ok(dispatched) => self.wait_all(dispatched, cancel).await,
            Err(e) => {
                self.terminate_agents().await;
                Err(e)
            }
        }
    }

    async fn dispatch_all<R: BufRead>(
        &mut self,
        mut queue: ClientQueue<R>,
        cancel: &CancellationToken,
    ) -> Result<usize> {
        let mut dispatched = 0;
        loop {
            self.state = SupervisorState::AwaitingAcknowledgment;
            self.await_acknowledgment(cancel).await?;

            self.state = SupervisorState::Dispatching;
            let request = match queue.next_request() {
                Ok(Some(request)) => request,
                Ok(None) => break,
                Err(e) => {
                    warn!("Client queue ended early: {}", e);
                    break;
                }
            };

            let handoff = match &self.region {
                Some(region) => {
                    region.write_handoff(&request);
                    Handoff::SharedRegion
                }
                None => Handoff::Arguments,
            };

            let handle = self.launcher.launch(&request, handoff).await?;
            info!(client_id = %request.id, ?handoff, "🚀 Agent dispatched");
            self.agents.push(handle);
            self.state = SupervisorState::ChildRunning;
            dispatched += 1;
        }

        info!("📭 Client queue exhausted after {} record(s)", dispatched);
        Ok(dispatched)
    }

    /// Take the rendezvous permit, or give up on it once the last agent has
    /// exited without posting it.
    async fn await_acknowledgment(&mut self, cancel: &CancellationToken) -> Result<()> {
        let poll = self.rendezvous.poll_interval();
        loop {
            if self.rendezvous.try_take()? {
                return Ok(());
            }

            if let Some(last) = self.agents.last_mut() {
                if last.has_exited() {
                    // it may have posted right before exiting
                    if !self.rendezvous.try_take()? {
                        warn!(
                            client_id = %last.client_id(),
                            "Agent exited before acknowledging its handoff"
                        );
                    }
                    return Ok(());
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(HotelError::Terminated),
                _ = tokio::time::sleep(poll) => {}
            }
        }
    }

    async fn wait_all(
        &mut self,
        dispatched: usize,
        cancel: &CancellationToken,
    ) -> Result<SupervisorSummary> {
        let mut summary = SupervisorSummary {
            dispatched,
            exits: Vec::with_capacity(self.agents.len()),
        };

        let mut agents = std::mem::take(&mut self.agents);
        for index in 0..agents.len() {
            let exit = tokio::select! {
                exit = agents[index].wait() => exit,
                _ = cancel.cancelled() => {
                    self.agents = agents;
                    self.terminate_agents().await;
                    return Err(HotelError::Terminated);
                }
            };
            debug!(client_id = %exit.client_id, success = exit.success, "Agent exited");
            summary.exits.push(exit);
        }

        self.state = SupervisorState::Finished;
        info!(
            "🏁 All {} agent(s) finished, {} failed",
            summary.exits.len(),
            summary.failed()
        );
        Ok(summary)
    }

    /// Ask every running agent to stop and wait for it
    pub async fn terminate_agents(&mut self) {
        for agent in self.agents.iter_mut() {
            agent.terminate();
        }
        for agent in self.agents.iter_mut() {
            let exit = agent.wait().await;
            debug!(client_id = %exit.client_id, "Agent stopped");
        }
        self.agents.clear();
    }
}
