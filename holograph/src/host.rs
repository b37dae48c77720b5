use std::sync::Arc;

use holograph_protocol::{DeliveryError, Packet};
use uuid::Uuid;

/// A connected participant able to receive packets and render synthetic
/// entities.
pub trait Client: Send + Sync {
    /// Stable unique id for this client's session.
    fn id(&self) -> Uuid;

    /// Display name. Content providers use this for personalisation.
    fn name(&self) -> &str;
}

/// Shared handle to a connected client.
pub type ClientRef = Arc<dyn Client>;

/// The host's view of who is currently connected.
pub trait Roster: Send + Sync {
    fn online(&self) -> Vec<ClientRef>;
}

/// Sends synthesized packets to individual clients.
///
/// Sends are fire-and-forget: a failure is reported to the caller, which
/// logs it and keeps going, so one unreachable client never stalls a
/// broadcast to the others.
pub trait PacketTransport: Send + Sync {
    fn send(&self, client: &dyn Client, packet: &Packet) -> Result<(), DeliveryError>;
}
