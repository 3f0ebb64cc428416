//! Device identity and topic derivation
//!
//! Exactly two devices participate in a chat session. Topic names are a pure
//! function of the local device identity: each device listens on its own
//! namespaced topic and publishes to the peer's.

use tracing::warn;

/// Topic namespace shared by both chat participants
pub const MESSAGE_NAMESPACE: &str = "lab/messaging";

/// The two device identities known system-wide
pub const KNOWN_DEVICES: [&str; 2] = ["car1", "car2"];

/// Peer used when the local identity is outside the known set
pub const DEFAULT_PEER: &str = "car1";

/// Resolve the peer identity for a local device.
///
/// `car1` maps to `car2`; everything else maps to `car1`. The
/// everything-else branch means an unknown identity silently chats with
/// `car1` - that behavior is kept for compatibility with existing
/// deployments, but a warning is logged so misconfigured devices are
/// visible.
pub fn peer_device(local: &str) -> &'static str {
    if local == "car1" {
        "car2"
    } else {
        if !KNOWN_DEVICES.contains(&local) {
            warn!(
                device = %local,
                fallback_peer = DEFAULT_PEER,
                "device identity is not in the known set; falling back to default peer"
            );
        }
        DEFAULT_PEER
    }
}

/// The two topics used by one chat session.
///
/// Derived once at startup and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPair {
    /// Topic this device subscribes to (`lab/messaging/<local>`)
    pub inbound: String,
    /// Topic this device publishes to (`lab/messaging/<peer>`)
    pub outbound: String,
}

impl TopicPair {
    /// Derive both topic names from the local device identity.
    pub fn for_device(local: &str) -> Self {
        let peer = peer_device(local);
        Self {
            inbound: format!("{MESSAGE_NAMESPACE}/{local}"),
            outbound: format!("{MESSAGE_NAMESPACE}/{peer}"),
        }
    }
}
