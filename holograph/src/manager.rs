//! The registry of live holograms.
//!
//! Membership here is the sole authority on whether a hologram still
//! exists: admission shows an enabled hologram to everyone, removal hides
//! it from everyone and forgets it. The manager also owns the host
//! collaborators that every hologram built against it borrows.

use std::sync::Arc;

use crate::hologram::{Hologram, HologramId};
use crate::host::{PacketTransport, Roster};
use crate::scheduler::Scheduler;
use crate::util::{self, EntityIdAllocator};
use crate::world::WorldPosition;

pub struct HologramManager {
    transport: Arc<dyn PacketTransport>,
    scheduler: Arc<dyn Scheduler>,
    roster: Arc<dyn Roster>,
    ids: Arc<dyn EntityIdAllocator>,
    holograms: Vec<Hologram>,
}

impl HologramManager {
    pub fn new(
        transport: Arc<dyn PacketTransport>,
        scheduler: Arc<dyn Scheduler>,
        roster: Arc<dyn Roster>,
    ) -> Self {
        Self::with_id_allocator(transport, scheduler, roster, util::default_allocator())
    }

    /// A manager whose holograms draw entity ids from `ids` instead of the
    /// process-wide random source.
    pub fn with_id_allocator(
        transport: Arc<dyn PacketTransport>,
        scheduler: Arc<dyn Scheduler>,
        roster: Arc<dyn Roster>,
        ids: Arc<dyn EntityIdAllocator>,
    ) -> Self {
        Self {
            transport,
            scheduler,
            roster,
            ids,
            holograms: Vec::new(),
        }
    }

    /// Admit `hologram` into the live set and, when it is enabled, show it
    /// to every connected client.
    pub fn create(&mut self, hologram: Hologram) {
        let enabled = hologram.is_enabled();
        self.holograms.push(hologram.clone());
        if enabled {
            hologram.show_all();
        }
    }

    /// Hide `hologram` from every connected client and evict it. Returns
    /// whether it was in the live set.
    pub fn remove(&mut self, hologram: &Hologram) -> bool {
        let before = self.holograms.len();
        self.holograms.retain(|candidate| candidate != hologram);
        hologram.hide_all();
        self.holograms.len() < before
    }

    /// First live hologram whose identifier compares equal.
    pub fn find_by_identifier(&self, identifier: &HologramId) -> Option<Hologram> {
        self.holograms
            .iter()
            .find(|hologram| hologram.identifier() == *identifier)
            .cloned()
    }

    /// First live hologram (in insertion order) in the same world as
    /// `position` and within `radius` of it, boundary included.
    pub fn find_nearest(&self, position: &WorldPosition, radius: f32) -> Option<Hologram> {
        self.holograms
            .iter()
            .find(|hologram| Self::within(hologram, position, radius))
            .cloned()
    }

    /// Every live hologram within `radius` of `position`, boundary
    /// included. The value paired with each hologram is the query radius
    /// itself, not the computed distance.
    pub fn find_all_within_radius(
        &self,
        position: &WorldPosition,
        radius: f32,
    ) -> Vec<(Hologram, f32)> {
        self.holograms
            .iter()
            .filter(|hologram| Self::within(hologram, position, radius))
            .map(|hologram| (hologram.clone(), radius))
            .collect()
    }

    /// Remove every hologram flagged for removal on host shutdown.
    pub fn shutdown(&mut self) {
        let flagged: Vec<Hologram> = self
            .holograms
            .iter()
            .filter(|hologram| hologram.removes_on_shutdown())
            .cloned()
            .collect();
        for hologram in flagged {
            self.remove(&hologram);
        }
    }

    pub fn len(&self) -> usize {
        self.holograms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holograms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hologram> {
        self.holograms.iter()
    }

    fn within(hologram: &Hologram, position: &WorldPosition, radius: f32) -> bool {
        hologram
            .spawn_position()
            .distance_to(position)
            .map_or(false, |distance| distance <= radius)
    }

    pub(crate) fn transport(&self) -> Arc<dyn PacketTransport> {
        Arc::clone(&self.transport)
    }

    pub(crate) fn scheduler(&self) -> Arc<dyn Scheduler> {
        Arc::clone(&self.scheduler)
    }

    pub(crate) fn roster(&self) -> Arc<dyn Roster> {
        Arc::clone(&self.roster)
    }

    pub(crate) fn id_allocator(&self) -> Arc<dyn EntityIdAllocator> {
        Arc::clone(&self.ids)
    }
}
