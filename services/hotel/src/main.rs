//! Hotel room allocation binary
//!
//! Usage:
//!   hotel supervise --queue clients.txt
//!   hotel --config hotel.toml supervise --transport brokered
//!   hotel host --transport brokered
//!   hotel agent --transport brokered --id 3 --gender 1 --rent 5

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use hotel_codec::ClientQueue;
use hotel_config::{load_config, HotelConfig, TransportKind};
use hotel_service::logging::init_logging;
use hotel_service::{
    run_host, shutdown, BookingAgent, HotelError, HotelResources, ProcessLauncher,
    RequestSource, Supervisor,
};
use hotel_transport::{BrokeredLedger, Gate, LedgerTransport, MappedLedger, Rendezvous};
use hotel_types::{ClientId, ClientRequest, Gender};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "hotel")]
#[command(about = "Hotel room allocation across processes")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Enable JSON logging format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Host the shared resources and launch one agent per queued client
    Supervise {
        #[arg(long)]
        transport: Option<TransportKind>,

        /// Client queue file
        #[arg(short, long)]
        queue: Option<PathBuf>,
    },

    /// Host the shared resources for agents started elsewhere
    Host {
        #[arg(long)]
        transport: Option<TransportKind>,
    },

    /// Book, hold and release a room for one client
    Agent(AgentArgs),
}

#[derive(Args, Debug)]
struct AgentArgs {
    #[arg(long)]
    transport: Option<TransportKind>,

    /// Read the client record from the mapping's handoff area
    #[arg(long, conflicts_with_all = ["id", "gender", "rent"])]
    handoff: bool,

    /// Signal the supervisor's rendezvous once the record is copied
    #[arg(long)]
    rendezvous: bool,

    #[arg(long)]
    id: Option<i32>,

    /// 0/male or 1/female
    #[arg(long, value_parser = parse_gender)]
    gender: Option<Gender>,

    /// Rent duration in rent units
    #[arg(long)]
    rent: Option<u32>,
}

impl AgentArgs {
    fn request(&self) -> Result<ClientRequest, HotelError> {
        let id = self.id.ok_or(HotelError::MissingParameter("id"))?;
        let gender = self.gender.ok_or(HotelError::MissingParameter("gender"))?;
        let rent = self.rent.ok_or(HotelError::MissingParameter("rent"))?;
        Ok(ClientRequest::new(ClientId(id), gender, rent))
    }
}

fn parse_gender(s: &str) -> Result<Gender, String> {
    match s.to_ascii_lowercase().as_str() {
        "0" | "male" | "m" => Ok(Gender::Male),
        "1" | "female" | "f" => Ok(Gender::Female),
        other => Err(format!("invalid gender '{other}' (expected 0/male or 1/female)")),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match prepare(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("hotel: {e:#}");
            return ExitCode::from(1);
        }
    };

    let cancel = CancellationToken::new();
    let result = match shutdown::watch_signals(cancel.clone()) {
        Ok(_signals) => run(cli, config, cancel).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let hotel_error = e.downcast_ref::<HotelError>();
            if hotel_error.is_some_and(HotelError::is_termination) {
                warn!("Stopped by termination signal");
            } else {
                error!("{:#}", e);
            }
            ExitCode::from(hotel_error.map_or(1, HotelError::exit_code))
        }
    }
}

/// Load configuration, apply CLI overrides and start logging
fn prepare(cli: &Cli) -> Result<HotelConfig> {
    let mut config = load_config(cli.config.as_deref())?;

    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    match &cli.command {
        Command::Supervise { transport, queue } => {
            if let Some(transport) = transport {
                config.ipc.transport = *transport;
            }
            if let Some(queue) = queue {
                config.supervisor.queue_path = queue.clone();
            }
        }
        Command::Host { transport } | Command::Agent(AgentArgs { transport, .. }) => {
            if let Some(transport) = transport {
                config.ipc.transport = *transport;
            }
        }
    }

    init_logging(&config.logging)?;
    Ok(config)
}

async fn run(cli: Cli, config: HotelConfig, cancel: CancellationToken) -> Result<()> {
    match cli.command {
        Command::Supervise { .. } => {
            let launcher = ProcessLauncher::new(agent_program(&config)?, config.ipc.transport)
                .with_config(cli.config)
                .with_logging(cli.log_level, cli.json_logs);
            supervise(&config, launcher, cancel).await
        }
        Command::Host { .. } => {
            info!("🏨 Starting standalone hotel host");
            run_host(&config.ipc, cancel).await?;
            Ok(())
        }
        Command::Agent(args) => agent(&config, args, cancel).await,
    }
}

fn agent_program(config: &HotelConfig) -> Result<PathBuf> {
    match &config.supervisor.agent_program {
        Some(program) => Ok(program.clone()),
        None => std::env::current_exe().context("Failed to locate the hotel executable"),
    }
}

async fn supervise(
    config: &HotelConfig,
    launcher: ProcessLauncher,
    cancel: CancellationToken,
) -> Result<()> {
    let queue_path = &config.supervisor.queue_path;
    let queue = ClientQueue::open(queue_path)
        .map_err(HotelError::from)
        .with_context(|| format!("Failed to open client queue {}", queue_path.display()))?;

    info!(
        "🏨 Supervising {} with {} transport",
        queue_path.display(),
        config.ipc.transport
    );

    let resources = HotelResources::create(&config.ipc)?;
    let rendezvous =
        match Rendezvous::create_named(&config.ipc.rendezvous_name, config.ipc.poll_interval()) {
            Ok(rendezvous) => rendezvous,
            Err(e) => {
                resources.teardown().await;
                return Err(HotelError::from(e).into());
            }
        };

    let mut supervisor = Supervisor::new(launcher, rendezvous, resources.region());
    let result = supervisor.run(queue, &cancel).await;
    drop(supervisor);
    resources.teardown().await;

    let summary = result?;
    info!(
        dispatched = summary.dispatched,
        failed = summary.failed(),
        "✅ Supervisor finished"
    );
    Ok(())
}

async fn agent(config: &HotelConfig, args: AgentArgs, cancel: CancellationToken) -> Result<()> {
    let ipc = &config.ipc;
    let gate = Gate::open_named(&ipc.gate_name, ipc.poll_interval())
        .map_err(HotelError::from)
        .context("Failed to attach to the gate; is a hotel host running?")?;
    let rendezvous = if args.rendezvous {
        Some(
            Rendezvous::open_named(&ipc.rendezvous_name, ipc.poll_interval())
                .map_err(HotelError::from)?,
        )
    } else {
        None
    };

    let (transport, region): (Arc<dyn LedgerTransport>, Option<Arc<MappedLedger>>) =
        match ipc.transport {
            TransportKind::Mapped => {
                let region = MappedLedger::open(&ipc.ledger_path).map_err(HotelError::from)?;
                let region = Arc::new(region);
                (region.clone(), Some(region))
            }
            TransportKind::Brokered => {
                let client = BrokeredLedger::connect(&ipc.request_fifo, &ipc.response_fifo)
                    .map_err(HotelError::from)?;
                (Arc::new(client), None)
            }
        };

    let source = if args.handoff {
        let region = region
            .as_deref()
            .ok_or_else(|| anyhow!("--handoff needs the mapped transport"))?;
        RequestSource::Handoff(region)
    } else {
        RequestSource::Arguments(args.request()?)
    };

    let agent = BookingAgent::new(gate, transport, config.agent.rent_unit());
    agent.start(source, rendezvous.as_ref(), &cancel).await?;
    Ok(())
}
