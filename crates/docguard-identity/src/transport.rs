//! Outbound channel abstraction and the pass-through sniffer.
//!
//! The host owns the channel. The sniffer wraps it, peeks at each frame, and
//! always forwards the frame unchanged, whatever the peek found.

use std::sync::Arc;

use bytes::Bytes;
use docguard_core::DocumentIdentity;
use serde::Deserialize;

use crate::capture::CapturedIdentity;
use crate::error::Result;

/// RPC method whose first argument names the document being opened.
pub const OPEN_DOC_METHOD: &str = "openDoc";

/// The host's outbound message send operation.
pub trait Outbound: Send + Sync {
    /// Deliver one frame.
    fn send(&self, frame: Bytes) -> Result<()>;

    /// The capture slot, if this channel is already sniffed.
    fn sniffer_slot(&self) -> Option<&CapturedIdentity> {
        None
    }
}

/// A structured remote-procedure call as seen on the wire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcCall {
    pub method: String,
    #[serde(default)]
    pub args: Vec<serde_json::Value>,
}

impl RpcCall {
    /// Parse a frame. Returns `None` for frames that are not UTF-8.
    pub fn parse(frame: &[u8]) -> Option<serde_json::Result<Self>> {
        let text = std::str::from_utf8(frame).ok()?;
        Some(serde_json::from_str(text))
    }

    /// The document being opened, if this is an `openDoc` call.
    pub fn opened_document(&self) -> Option<DocumentIdentity> {
        if self.method != OPEN_DOC_METHOD {
            return None;
        }
        let first = self.args.first()?.as_str()?;
        DocumentIdentity::new(first).ok()
    }
}

/// Pass-through wrapper that records `openDoc` targets.
pub struct SniffingOutbound {
    inner: Arc<dyn Outbound>,
    slot: CapturedIdentity,
}

impl SniffingOutbound {
    fn inspect(&self, frame: &[u8]) {
        match RpcCall::parse(frame) {
            None => tracing::debug!(len = frame.len(), "skipping binary frame"),
            Some(Err(e)) => tracing::warn!(error = %e, "outbound frame is not an RPC call"),
            Some(Ok(call)) => {
                if let Some(id) = call.opened_document() {
                    tracing::info!(doc_id = %id, "document identity captured from openDoc");
                    self.slot.record(id);
                }
            }
        }
    }
}

impl Outbound for SniffingOutbound {
    fn send(&self, frame: Bytes) -> Result<()> {
        self.inspect(&frame);
        self.inner.send(frame)
    }

    fn sniffer_slot(&self) -> Option<&CapturedIdentity> {
        Some(&self.slot)
    }
}

/// Wrap `channel` so `openDoc` calls are recorded into `slot`.
///
/// Idempotent: a channel that is already sniffed is returned as-is, so the
/// original send operation is never wrapped twice.
pub fn install_sniffer(channel: Arc<dyn Outbound>, slot: &CapturedIdentity) -> Arc<dyn Outbound> {
    if let Some(existing) = channel.sniffer_slot() {
        if !existing.same_slot(slot) {
            tracing::warn!("channel already sniffed into a different slot; keeping existing sniffer");
        } else {
            tracing::debug!("sniffer already installed");
        }
        return channel;
    }

    Arc::new(SniffingOutbound {
        inner: channel,
        slot: slot.clone(),
    })
}

/// A recording channel for tests and host shims.
pub mod memory {
    use super::*;
    use std::sync::{Mutex, PoisonError};

    use crate::error::TransportError;

    /// Records every delivered frame; can be told to fail.
    #[derive(Default)]
    pub struct RecordingOutbound {
        frames: Mutex<Vec<Bytes>>,
        fail: bool,
    }

    impl RecordingOutbound {
        pub fn new() -> Self {
            Self::default()
        }

        /// A channel whose every send fails after recording the frame.
        pub fn failing() -> Self {
            Self {
                frames: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        /// Frames delivered so far.
        pub fn frames(&self) -> Vec<Bytes> {
            self.frames
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    impl Outbound for RecordingOutbound {
        fn send(&self, frame: Bytes) -> Result<()> {
            self.frames
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(frame);
            if self.fail {
                return Err(TransportError::Closed);
            }
            Ok(())
        }
    }
}
