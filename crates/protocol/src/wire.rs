//! Control-frame payloads exchanged over a transfer connection.

use serde::{Deserialize, Serialize};

/// Protocol version advertised by [`TransferHeader`]. There is currently
/// only one version; the field exists so a future incompatible change has
/// somewhere to negotiate from.
pub const PROTOCOL_VERSION: u32 = 1;

/// The first frame on a connection, sent by the sender.
///
/// `relative_path` is validated by the `pathsafe` crate before it is ever
/// joined to a filesystem path; this type makes no safety claims of its
/// own about the string it carries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferHeader {
    /// Always `"header"`; present so frames can be dispatched by `type`
    /// before being deserialized into a concrete struct.
    #[serde(rename = "type")]
    pub frame_type: String,
    /// Wire protocol version; currently always [`PROTOCOL_VERSION`].
    pub version: u32,
    /// POSIX-style relative path, un-normalized as received from the peer.
    pub relative_path: String,
    /// Total size of the file in bytes.
    pub file_size: u64,
    /// 64 lowercase hex characters: the SHA-256 of the whole file.
    pub sha256_hex: String,
    /// Shared-secret pair code, if pairing is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pair_code: Option<String>,
}

impl TransferHeader {
    /// Builds a header for the current protocol version.
    #[must_use]
    pub fn new(
        relative_path: impl Into<String>,
        file_size: u64,
        sha256_hex: impl Into<String>,
        pair_code: Option<String>,
    ) -> Self {
        Self {
            frame_type: "header".to_string(),
            version: PROTOCOL_VERSION,
            relative_path: relative_path.into(),
            file_size,
            sha256_hex: sha256_hex.into(),
            pair_code,
        }
    }
}

/// The receiver's response to [`TransferHeader`], sent before any payload
/// bytes. If `ok` is `false` the connection terminates without a payload
/// phase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ready {
    /// Always `"ready"`.
    #[serde(rename = "type")]
    pub frame_type: String,
    /// Whether the receiver accepted the header and will read a payload.
    pub ok: bool,
    /// Byte offset the sender should resume from. Only meaningful when
    /// `ok` is `true`; `0 <= offset <= file_size`.
    pub offset: u64,
    /// Human-readable failure reason, present when `ok` is `false`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The path the receiver will write to, for diagnostics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_path: Option<String>,
}

impl Ready {
    /// Builds an acceptance response at the given resume offset.
    #[must_use]
    pub fn accept(offset: u64, saved_path: impl Into<String>) -> Self {
        Self {
            frame_type: "ready".to_string(),
            ok: true,
            offset,
            message: None,
            saved_path: Some(saved_path.into()),
        }
    }

    /// Builds a rejection response carrying a human-readable reason.
    #[must_use]
    pub fn reject(message: impl Into<String>) -> Self {
        Self {
            frame_type: "ready".to_string(),
            ok: false,
            offset: 0,
            message: Some(message.into()),
            saved_path: None,
        }
    }
}

/// The receiver's final response, sent after the payload phase completes
/// (or after a rejection discovered mid-payload).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Ack {
    /// Always `"ack"`.
    #[serde(rename = "type")]
    pub frame_type: String,
    /// Whether the transfer completed and verified successfully.
    pub ok: bool,
    /// Human-readable failure reason, present when `ok` is `false`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The digest the receiver computed; equals `header.sha256_hex` on
    /// success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256_hex: Option<String>,
    /// Total bytes received across the whole session (including any
    /// resumed prefix); equals `header.file_size` on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_bytes: Option<u64>,
    /// The final path the file was promoted to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_path: Option<String>,
    /// The offset the transfer resumed from (`0` for a from-scratch send).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resumed_from: Option<u64>,
    /// The next pair code to use, when per-transfer rotation is active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_pair_code: Option<String>,
}

impl Ack {
    /// Builds a successful ack.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn success(
        sha256_hex: impl Into<String>,
        received_bytes: u64,
        saved_path: impl Into<String>,
        resumed_from: u64,
        next_pair_code: Option<String>,
    ) -> Self {
        Self {
            frame_type: "ack".to_string(),
            ok: true,
            message: None,
            sha256_hex: Some(sha256_hex.into()),
            received_bytes: Some(received_bytes),
            saved_path: Some(saved_path.into()),
            resumed_from: Some(resumed_from),
            next_pair_code,
        }
    }

    /// Builds a failure ack carrying a human-readable reason.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            frame_type: "ack".to_string(),
            ok: false,
            message: Some(message.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips_through_json() {
        let header = TransferHeader::new("a/b.txt", 42, "a".repeat(64), Some("123456".into()));
        let json = serde_json::to_string(&header).unwrap();
        let back: TransferHeader = serde_json::from_str(&json).unwrap();
        assert_eq!(header, back);
    }

    #[test]
    fn ready_reject_omits_offset_fields_that_matter() {
        let ready = Ready::reject("pair code mismatch");
        assert!(!ready.ok);
        assert_eq!(ready.message.as_deref(), Some("pair code mismatch"));
    }

    #[test]
    fn ack_success_round_trips() {
        let ack = Ack::success("a".repeat(64), 100, "/tmp/x", 0, Some("654321".into()));
        let json = serde_json::to_string(&ack).unwrap();
        let back: Ack = serde_json::from_str(&json).unwrap();
        assert_eq!(ack, back);
    }
}
