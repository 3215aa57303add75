//! Ledger broker, hosting side
//!
//! Owns the canonical ledger and answers frames arriving on the request
//! FIFO, one at a time and in arrival order. A GET is answered with the
//! current ledger; a SET replaces it and is answered with the new one.

use crate::error::{Result, TransportError};
use hotel_codec::{FrameTag, LedgerFrame, ProtocolError, FRAME_SIZE};
use hotel_types::RoomLedger;
use nix::sys::stat::Mode;
use nix::unistd::mkfifo;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::pipe;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Serves the canonical ledger over a pair of FIFOs
pub struct LedgerBroker {
    ledger: RoomLedger,
    requests: pipe::Receiver,
    replies: pipe::Sender,
    fifos: [PathBuf; 2],
    served: u64,
}

impl LedgerBroker {
    /// Create both FIFOs, replacing leftovers, and open them
    pub fn bind(request_fifo: impl AsRef<Path>, response_fifo: impl AsRef<Path>) -> Result<Self> {
        let request_fifo = request_fifo.as_ref();
        let response_fifo = response_fifo.as_ref();
        prepare_fifo(request_fifo)?;
        prepare_fifo(response_fifo)?;

        let requests = pipe::OpenOptions::new()
            .read_write(true)
            .open_receiver(request_fifo)
            .map_err(|e| {
                TransportError::setup_with_source(
                    format!("Failed to open {}", request_fifo.display()),
                    e,
                )
            })?;
        let replies = pipe::OpenOptions::new()
            .read_write(true)
            .open_sender(response_fifo)
            .map_err(|e| {
                TransportError::setup_with_source(
                    format!("Failed to open {}", response_fifo.display()),
                    e,
                )
            })?;

        info!(
            "📡 Ledger broker listening on {} (replies on {})",
            request_fifo.display(),
            response_fifo.display()
        );
        Ok(Self {
            ledger: RoomLedger::new(),
            requests,
            replies,
            fifos: [request_fifo.to_path_buf(), response_fifo.to_path_buf()],
            served: 0,
        })
    }

    pub fn ledger(&self) -> &RoomLedger {
        &self.ledger
    }

    pub fn frames_served(&self) -> u64 {
        self.served
    }

    /// Answer frames until `cancel` fires
    #[instrument(skip_all, name = "ledger_broker")]
    pub async fn serve(&mut self, cancel: CancellationToken) -> Result<()> {
        let mut buf = [0u8; FRAME_SIZE];
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Ledger broker stopping after {} frame(s)", self.served);
                    return Ok(());
                }
                received = self.requests.read_exact(&mut buf) => {
                    received.map_err(|e| match e.kind() {
                        io::ErrorKind::UnexpectedEof => TransportError::closed("request FIFO"),
                        _ => TransportError::io("Failed to read request frame", e),
                    })?;
                }
            }

            let reply = self.handle(&buf);
            self.replies
                .write_all(&reply.encode())
                .await
                .map_err(|e| TransportError::io("Failed to write reply frame", e))?;
            self.served += 1;
        }
    }

    /// Apply one raw request frame and build the reply
    pub fn handle(&mut self, raw: &[u8]) -> LedgerFrame {
        match LedgerFrame::decode_request(raw) {
            Ok(LedgerFrame {
                tag: FrameTag::Get, ..
            }) => LedgerFrame {
                tag: FrameTag::Get,
                ledger: self.ledger,
            },
            Ok(LedgerFrame {
                tag: FrameTag::Set,
                ledger,
            }) => {
                self.ledger = ledger;
                debug!("Ledger replaced: {} room(s) free", ledger.free_rooms());
                LedgerFrame::set(self.ledger)
            }
            Err(ProtocolError::UnknownTag { tag }) => {
                warn!("Unknown frame tag {}, answering as GET", tag);
                LedgerFrame {
                    tag: FrameTag::Get,
                    ledger: self.ledger,
                }
            }
            Err(e) => {
                // The sender sees an unchanged ledger and reports the mismatch
                warn!("Rejected SET frame: {}", e);
                LedgerFrame::set(self.ledger)
            }
        }
    }
}

impl Drop for LedgerBroker {
    fn drop(&mut self) {
        for path in &self.fifos {
            if let Err(e) = std::fs::remove_file(path) {
                warn!("Failed to remove FIFO {}: {}", path.display(), e);
            }
        }
    }
}

fn prepare_fifo(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path).map_err(|e| {
            TransportError::setup_with_source(
                format!("Failed to remove existing {}", path.display()),
                e,
            )
        })?;
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            TransportError::setup_with_source(
                format!("Failed to create FIFO directory {}", parent.display()),
                e,
            )
        })?;
    }

    mkfifo(path, Mode::from_bits_truncate(0o666)).map_err(|e| {
        TransportError::setup_with_source(format!("mkfifo {} failed", path.display()), e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotel_codec::LEDGER_WIRE_SIZE;
    use hotel_types::{ClientId, ClientRequest, Gender};
    use tempfile::tempdir;

    fn claimed() -> RoomLedger {
        let mut ledger = RoomLedger::new();
        ledger.claim(&ClientRequest::new(ClientId(3), Gender::Male, 1));
        ledger
    }

    #[tokio::test]
    async fn test_handle_get_and_set() {
        let dir = tempdir().unwrap();
        let mut broker =
            LedgerBroker::bind(dir.path().join("in"), dir.path().join("out")).unwrap();

        let reply = broker.handle(&LedgerFrame::get().encode());
        assert_eq!(reply.tag, FrameTag::Get);
        assert_eq!(reply.ledger, RoomLedger::new());

        let reply = broker.handle(&LedgerFrame::set(claimed()).encode());
        assert_eq!(reply, LedgerFrame::set(claimed()));
        assert_eq!(broker.ledger(), &claimed());
    }

    #[tokio::test]
    async fn test_unknown_tag_is_answered_as_get() {
        let dir = tempdir().unwrap();
        let mut broker =
            LedgerBroker::bind(dir.path().join("in"), dir.path().join("out")).unwrap();
        broker.handle(&LedgerFrame::set(claimed()).encode());

        let mut raw = LedgerFrame::set(RoomLedger::new()).encode().to_vec();
        raw[..4].copy_from_slice(&7i32.to_le_bytes());
        let reply = broker.handle(&raw);

        assert_eq!(reply.tag, FrameTag::Get);
        assert_eq!(reply.ledger, claimed());
    }

    #[tokio::test]
    async fn test_undecodable_set_leaves_ledger_unchanged() {
        let dir = tempdir().unwrap();
        let mut broker =
            LedgerBroker::bind(dir.path().join("in"), dir.path().join("out")).unwrap();

        let mut raw = LedgerFrame::set(claimed()).encode().to_vec();
        raw[8..12].copy_from_slice(&99i32.to_le_bytes());
        assert_eq!(raw.len(), 4 + LEDGER_WIRE_SIZE);

        let reply = broker.handle(&raw);
        assert_eq!(reply, LedgerFrame::set(RoomLedger::new()));
        assert_eq!(broker.ledger(), &RoomLedger::new());
    }

    #[tokio::test]
    async fn test_fifos_removed_on_drop() {
        let dir = tempdir().unwrap();
        let (input, output) = (dir.path().join("in"), dir.path().join("out"));

        let broker = LedgerBroker::bind(&input, &output).unwrap();
        assert!(input.exists() && output.exists());
        drop(broker);
        assert!(!input.exists() && !output.exists());
    }
}
