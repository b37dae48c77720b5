//! The hologram itself: a positioned stack of text lines, and the
//! per-client machinery that keeps every connected client's view of it in
//! sync with what has actually been sent on the wire.
//!
//! Every mutating operation transitions through hidden: hide the affected
//! clients, apply the change, show them again. The round trip costs a
//! visible flicker but means no client can ever observe a half-applied
//! update, and it is what keeps the per-client id bindings consistent with
//! the packets already delivered.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use holograph_protocol::{DestroyEntities, EntityMetadata, Packet, SpawnEntity};
use log::error;
use uuid::Uuid;

use crate::holograph_error::HologramError;
use crate::host::{Client, ClientRef, PacketTransport, Roster};
use crate::lines::{InsertOutcome, Lines};
use crate::manager::HologramManager;
use crate::provider::HologramProvider;
use crate::scheduler::{Scheduler, TaskCallback};
use crate::time::{TimeSetting, Ticks};
use crate::util::EntityIdAllocator;
use crate::viewer::ViewerState;
use crate::world::WorldPosition;
use crate::HolographResult;

/// Vertical gap between consecutive lines, in world units.
pub const DEFAULT_LINE_SPACING: f32 = 0.25;

/// Opaque identifier of a hologram, chosen by the caller. Compared for
/// equality only; keeping identifiers unique is the registry owner's
/// business.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HologramId(String);

impl HologramId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HologramId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for HologramId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for HologramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A floating stack of text lines anchored at a world position.
///
/// Cloning yields another handle to the same hologram. Each operation runs
/// synchronously to completion; compound sequences issued from different
/// threads interleave at operation granularity, so callers needing
/// atomicity across several calls must serialize externally.
#[derive(Clone)]
pub struct Hologram {
    inner: Arc<Mutex<State>>,
}

struct State {
    identifier: HologramId,
    lines: Lines,
    spawn_position: WorldPosition,
    line_spacing: f32,
    enabled: bool,
    temporary: bool,
    remove_on_shutdown: bool,
    refresh_delay: Ticks,
    refresh_period: Ticks,
    provider: Option<Arc<dyn HologramProvider>>,
    viewers: HashMap<Uuid, ViewerState>,
    transport: Arc<dyn PacketTransport>,
    scheduler: Arc<dyn Scheduler>,
    roster: Arc<dyn Roster>,
    ids: Arc<dyn EntityIdAllocator>,
}

impl Hologram {
    pub fn builder() -> HologramBuilder {
        HologramBuilder::default()
    }

    pub fn identifier(&self) -> HologramId {
        self.lock().identifier.clone()
    }

    /// Current line contents, top to bottom.
    pub fn lines(&self) -> Vec<String> {
        self.lock().lines.as_slice().to_vec()
    }

    pub fn line(&self, index: usize) -> Option<String> {
        self.lock().lines.get(index).map(str::to_string)
    }

    pub fn line_count(&self) -> usize {
        self.lock().lines.len()
    }

    pub fn spawn_position(&self) -> WorldPosition {
        self.lock().spawn_position.clone()
    }

    pub fn line_spacing(&self) -> f32 {
        self.lock().line_spacing
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    pub fn is_temporary(&self) -> bool {
        self.lock().temporary
    }

    pub fn removes_on_shutdown(&self) -> bool {
        self.lock().remove_on_shutdown
    }

    /// Present the hologram to `clients`.
    ///
    /// Per client: the refresh task is started if it is not already
    /// running, then every line in order gets its create packet (at the
    /// line's position) followed by its text packet. A client that is
    /// already watching keeps its entity ids and simply has everything
    /// re-sent.
    pub fn show(&self, clients: &[ClientRef]) {
        let mut state = self.lock();
        state.show_many(self, clients);
    }

    /// Present the hologram to every connected client, returning how many
    /// clients that was.
    pub fn show_all(&self) -> usize {
        let clients = self.online();
        self.show(&clients);
        clients.len()
    }

    /// Withdraw the hologram from `clients`.
    ///
    /// Per client: the refresh task is canceled (if the scheduler still has
    /// it queued) and dropped, then every bound line entity is destroyed
    /// and its binding forgotten. Hiding a client twice is a no-op the
    /// second time.
    pub fn hide(&self, clients: &[ClientRef]) {
        let mut state = self.lock();
        state.hide_many(clients);
    }

    /// Withdraw the hologram from every connected client, returning how
    /// many clients that was.
    pub fn hide_all(&self) -> usize {
        let clients = self.online();
        self.hide(&clients);
        clients.len()
    }

    /// Move the hologram, re-anchoring every line below the new position.
    pub fn update_spawn_position(&self, position: WorldPosition, clients: &[ClientRef]) {
        let mut state = self.lock();
        state.hide_many(clients);
        state.spawn_position = position;
        state.show_many(self, clients);
    }

    pub fn update_spawn_position_all(&self, position: WorldPosition) {
        self.update_spawn_position(position, &self.online());
    }

    /// Change the vertical gap between consecutive lines.
    pub fn update_line_spacing(&self, spacing: f32, clients: &[ClientRef]) {
        let mut state = self.lock();
        state.hide_many(clients);
        state.line_spacing = spacing;
        state.show_many(self, clients);
    }

    pub fn update_line_spacing_all(&self, spacing: f32) {
        self.update_line_spacing(spacing, &self.online());
    }

    /// Replace the text of one line, growing the model with blank lines if
    /// `index` is past the end.
    pub fn update_line(&self, index: usize, text: impl Into<String>, clients: &[ClientRef]) {
        let mut state = self.lock();
        state.hide_many(clients);
        state.lines.set(index, text);
        state.show_many(self, clients);
    }

    pub fn update_line_all(&self, index: usize, text: impl Into<String>) {
        self.update_line(index, text, &self.online());
    }

    /// Replace several lines at once. `indexes` and `texts` must pair up
    /// one to one; a length mismatch fails before anything is hidden or
    /// sent.
    pub fn update_lines(
        &self,
        indexes: &[usize],
        texts: &[&str],
        clients: &[ClientRef],
    ) -> HolographResult<()> {
        if indexes.len() != texts.len() {
            return Err(HologramError::LengthMismatch {
                indexes: indexes.len(),
                texts: texts.len(),
            });
        }
        let mut state = self.lock();
        state.hide_many(clients);
        for (&index, &text) in indexes.iter().zip(texts) {
            state.lines.set(index, text);
        }
        state.show_many(self, clients);
        Ok(())
    }

    pub fn update_lines_all(&self, indexes: &[usize], texts: &[&str]) -> HolographResult<()> {
        self.update_lines(indexes, texts, &self.online())
    }

    /// Insert one blank line at `index`. Returns `false` when the index was
    /// past the end and the model was padded with appended blanks instead
    /// of a structural insert.
    pub fn add_empty_line(&self, index: usize, clients: &[ClientRef]) -> bool {
        self.add_empty_lines(std::slice::from_ref(&index), clients)
    }

    pub fn add_empty_line_all(&self, index: usize) -> bool {
        self.add_empty_line(index, &self.online())
    }

    /// Insert blank lines at each of `indexes`, in order. The batch stops
    /// early as soon as one index degenerates into append-with-padding:
    /// remaining indexes are skipped and the call returns `false`.
    pub fn add_empty_lines(&self, indexes: &[usize], clients: &[ClientRef]) -> bool {
        let mut state = self.lock();
        state.hide_many(clients);
        for &index in indexes {
            if let InsertOutcome::Appended = state.lines.insert_blank(index) {
                state.show_many(self, clients);
                return false;
            }
        }
        state.show_many(self, clients);
        true
    }

    pub fn add_empty_lines_all(&self, indexes: &[usize]) -> bool {
        self.add_empty_lines(indexes, &self.online())
    }

    /// Remove the line at `index`. Returns `false`, touching nothing, when
    /// the index is out of range.
    pub fn clear_line(&self, index: usize, clients: &[ClientRef]) -> bool {
        let mut state = self.lock();
        if index >= state.lines.len() {
            return false;
        }
        state.hide_many(clients);
        state.lines.remove(index);
        state.show_many(self, clients);
        true
    }

    pub fn clear_line_all(&self, index: usize) -> bool {
        self.clear_line(index, &self.online())
    }

    /// Remove the line at each of `indexes`, skipping those out of range.
    /// Returns whether every requested index was in range and removed.
    pub fn clear_lines(&self, indexes: &[usize], clients: &[ClientRef]) -> bool {
        let mut state = self.lock();
        let mut affected = 0;
        for &index in indexes {
            if index >= state.lines.len() {
                continue;
            }
            state.hide_many(clients);
            state.lines.remove(index);
            state.show_many(self, clients);
            affected += 1;
        }
        affected >= indexes.len()
    }

    pub fn clear_lines_all(&self, indexes: &[usize]) -> bool {
        self.clear_lines(indexes, &self.online())
    }

    fn online(&self) -> Vec<ClientRef> {
        self.lock().roster.online()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.lock().unwrap()
    }
}

impl fmt::Debug for Hologram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Hologram")
            .field("identifier", &state.identifier)
            .field("lines", &state.lines.len())
            .field("spawn_position", &state.spawn_position)
            .finish()
    }
}

impl PartialEq for Hologram {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.identifier() == other.identifier()
    }
}

impl Eq for Hologram {}

impl State {
    fn show_many(&mut self, handle: &Hologram, clients: &[ClientRef]) {
        for client in clients {
            self.show_for(handle, client);
        }
    }

    fn hide_many(&mut self, clients: &[ClientRef]) {
        for client in clients {
            self.hide_for(client);
        }
    }

    fn show_for(&mut self, handle: &Hologram, client: &ClientRef) {
        self.start_refresh_task(handle, client);

        let lines = self.lines.as_slice().to_vec();
        let ids = Arc::clone(&self.ids);
        let mut position = self.spawn_position.position;
        for (index, text) in lines.iter().enumerate() {
            let entity_id = self
                .viewers
                .entry(client.id())
                .or_default()
                .line_id(index, ids.as_ref());
            self.send(client.as_ref(), SpawnEntity::marker(entity_id, position).into());
            position.y -= self.line_spacing;
            self.send(
                client.as_ref(),
                EntityMetadata::name_tag(entity_id, text.clone()).into(),
            );
        }
    }

    fn hide_for(&mut self, client: &ClientRef) {
        let Some(mut viewer) = self.viewers.remove(&client.id()) else {
            return;
        };
        if let Some(task) = viewer.take_refresh_task() {
            if self.scheduler.is_pending(&task) {
                self.scheduler.cancel(&task);
            }
        }
        for (_, entity_id) in viewer.bound_lines() {
            self.send(client.as_ref(), DestroyEntities::single(entity_id).into());
        }
    }

    fn start_refresh_task(&mut self, handle: &Hologram, client: &ClientRef) {
        if self.provider.is_none() {
            return;
        }
        {
            let viewer = self.viewers.entry(client.id()).or_default();
            if viewer.refresh_task().is_some() {
                return;
            }
        }
        let callback = refresh_callback(Arc::downgrade(&handle.inner), Arc::clone(client));
        let task = self
            .scheduler
            .schedule_periodic(self.refresh_delay, self.refresh_period, callback);
        self.viewers
            .entry(client.id())
            .or_default()
            .set_refresh_task(task);
    }

    fn send(&self, client: &dyn Client, packet: Packet) {
        if let Err(err) = self.transport.send(client, &packet) {
            error!(
                "dropping {:?} packet for {}: {err}",
                packet.kind(),
                client.name()
            );
        }
    }
}

/// Body of the per-client refresh task. Holds only a weak reference so a
/// hologram that has been dropped silently stops refreshing; the lock is
/// released again before the provider runs, leaving it free to call back
/// into the hologram.
fn refresh_callback(state: Weak<Mutex<State>>, client: ClientRef) -> TaskCallback {
    Box::new(move || {
        let Some(inner) = state.upgrade() else {
            return;
        };
        let provider = { inner.lock().unwrap().provider.clone() };
        if let Some(provider) = provider {
            provider.update(&client, &Hologram { inner });
        }
    })
}

/// Configures and validates a new [`Hologram`].
///
/// Identifier, spawn position and at least one line are required; nothing
/// observable happens until `build` has validated all three and admitted
/// the hologram into the registry.
pub struct HologramBuilder {
    identifier: Option<HologramId>,
    lines: Vec<String>,
    spawn_position: Option<WorldPosition>,
    line_spacing: f32,
    enabled: bool,
    temporary: bool,
    remove_on_shutdown: bool,
    refresh_delay: Ticks,
    refresh_period: Ticks,
    provider: Option<Arc<dyn HologramProvider>>,
}

impl Default for HologramBuilder {
    fn default() -> Self {
        Self {
            identifier: None,
            lines: Vec::new(),
            spawn_position: None,
            line_spacing: DEFAULT_LINE_SPACING,
            enabled: true,
            temporary: false,
            remove_on_shutdown: false,
            refresh_delay: 0,
            refresh_period: 1,
            provider: None,
        }
    }
}

impl HologramBuilder {
    pub fn identifier(mut self, identifier: impl Into<HologramId>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Append a single line.
    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    /// Replace all lines.
    pub fn lines(mut self, lines: &[&str]) -> Self {
        self.lines = lines.iter().map(|line| line.to_string()).collect();
        self
    }

    pub fn spawn_position(mut self, position: WorldPosition) -> Self {
        self.spawn_position = Some(position);
        self
    }

    pub fn line_spacing(mut self, spacing: f32) -> Self {
        self.line_spacing = spacing;
        self
    }

    /// Do not show the hologram on creation; it must be shown manually.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    /// Remove the hologram automatically when the host shuts down.
    pub fn remove_on_shutdown(mut self) -> Self {
        self.remove_on_shutdown = true;
        self
    }

    /// Initial delay of the refresh task.
    pub fn delay(mut self, value: u32, unit: TimeSetting) -> Self {
        self.refresh_delay = unit.to_ticks(value);
        self
    }

    /// Repeat period of the refresh task.
    pub fn period(mut self, value: u32, unit: TimeSetting) -> Self {
        self.refresh_period = unit.to_ticks(value);
        self
    }

    /// Provider consulted by the refresh task to keep content live.
    pub fn provider(mut self, provider: Arc<dyn HologramProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Validate the configuration, admit the hologram into `manager` and,
    /// when enabled, show it to every connected client.
    pub fn build(self, manager: &mut HologramManager) -> HolographResult<Hologram> {
        let identifier = self.identifier.ok_or(HologramError::MissingIdentifier)?;
        let spawn_position = self
            .spawn_position
            .ok_or(HologramError::MissingSpawnPosition)?;
        if self.lines.is_empty() {
            return Err(HologramError::NoLines);
        }

        let hologram = Hologram {
            inner: Arc::new(Mutex::new(State {
                identifier,
                lines: Lines::new(self.lines),
                spawn_position,
                line_spacing: self.line_spacing,
                enabled: self.enabled,
                temporary: self.temporary,
                remove_on_shutdown: self.remove_on_shutdown,
                refresh_delay: self.refresh_delay,
                refresh_period: self.refresh_period,
                provider: self.provider,
                viewers: HashMap::new(),
                transport: manager.transport(),
                scheduler: manager.scheduler(),
                roster: manager.roster(),
                ids: manager.id_allocator(),
            })),
        };
        manager.create(hologram.clone());
        Ok(hologram)
    }
}
