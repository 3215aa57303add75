//! Default values used when neither the config file nor the environment
//! provides one

/// Shared IPC resource names
pub mod ipc {
    /// POSIX semaphore serializing ledger access
    pub const GATE_NAME: &str = "/hotel_rooms_gate";

    /// POSIX semaphore for the supervisor/agent parameter handoff
    pub const RENDEZVOUS_NAME: &str = "/hotel_client_handoff";

    /// Backing file of the mapped ledger
    pub const LEDGER_PATH: &str = "/dev/shm/hotel_rooms";

    /// FIFO carrying frames from agents to the broker
    pub const REQUEST_FIFO: &str = "/tmp/hotel_rooms_input";

    /// FIFO carrying replies from the broker to agents
    pub const RESPONSE_FIFO: &str = "/tmp/hotel_rooms_output";

    /// Interval between attempts to take a busy semaphore (milliseconds)
    pub const POLL_INTERVAL_MS: u64 = 5;
}

pub mod supervisor {
    pub const QUEUE_PATH: &str = "clients.txt";
}

pub mod agent {
    /// Length of one rent unit (milliseconds). Queue durations are seconds.
    pub const RENT_UNIT_MS: u64 = 1_000;
}

pub mod logging {
    pub const LEVEL: &str = "info";
}
