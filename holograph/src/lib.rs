//! Holograph renders floating, multi-line text ("holograms") inside a live
//! multiplayer world without ever touching authoritative world state. Each
//! line of text is a synthetic entity that exists only in a client's local
//! rendering state; the engine tracks, per connected client, which of those
//! entities the client currently believes exist, and emits the exact packet
//! sequence needed to create, update, move or destroy them.
//!
//! The host process stays in charge of everything external: who is
//! connected ([`host::Roster`]), how packets reach a client
//! ([`host::PacketTransport`]), and when periodic work runs
//! ([`scheduler::Scheduler`]).

pub use glam;
pub use holograph_protocol as protocol;
pub use uuid::Uuid;

pub use hologram::{Hologram, HologramBuilder, HologramId, DEFAULT_LINE_SPACING};
pub use holograph_error::HologramError;
pub use manager::HologramManager;
pub use world::WorldPosition;

pub mod hologram;
mod holograph_error;
/// Collaborator traits implemented by the host process
pub mod host;
pub mod lines;
pub mod manager;
pub mod provider;
pub mod scheduler;
pub mod time;
/// Synthetic entity id allocation
pub mod util;
mod viewer;
pub mod world;

/// Holograph result type
pub type HolographResult<T> = std::result::Result<T, HologramError>;

/// Smallest id handed out for synthetic line entities.
pub const MIN_ENTITY_ID: i32 = 1;

/// Largest id handed out for synthetic line entities.
pub const MAX_ENTITY_ID: i32 = i32::MAX;
