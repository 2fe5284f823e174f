use thiserror::Error;

/// The `DiscoveryError` kind of the system's error taxonomy.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Neither mDNS nor the UDP broadcast probe found a receiver within
    /// the browse timeout.
    #[error("no receiver found")]
    NoReceiverFound,

    /// The UDP broadcast probe could not be sent.
    #[error("failed to send discovery broadcast: {0}")]
    BroadcastSendFailed(#[source] std::io::Error),

    /// Advertising or browsing via mDNS failed.
    #[error("mDNS error: {0}")]
    Mdns(#[from] mdns_sd::Error),

    /// A UDP socket operation failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
