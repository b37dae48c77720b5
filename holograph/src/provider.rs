use crate::hologram::Hologram;
use crate::host::ClientRef;

/// Fills a hologram with live, per-viewer content.
///
/// `update` is invoked from the per-client refresh task at the hologram's
/// configured cadence, once per visible client. It may call back into the
/// hologram's mutation operations (typically passing `client` through so
/// the viewer sees the new content); the hologram is not locked while the
/// provider runs.
pub trait HologramProvider: Send + Sync {
    fn update(&self, client: &ClientRef, hologram: &Hologram);
}
