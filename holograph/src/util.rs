use std::sync::Arc;

use lazy_static::lazy_static;
use rand::Rng;

/// Source of synthetic entity ids.
///
/// The allocator itself makes no uniqueness promise across calls. Holograms
/// only need ids to be unique within one client's currently visible line
/// set, and every client keeps an independent id namespace on the wire, so
/// a random draw over a wide range is enough.
pub trait EntityIdAllocator: Send + Sync {
    /// A value uniformly distributed over `min..=max`.
    fn allocate(&self, min: i32, max: i32) -> i32;
}

/// Random id source backed by the process-wide generator.
#[derive(Debug, Default)]
pub struct RandomEntityIds;

impl EntityIdAllocator for RandomEntityIds {
    fn allocate(&self, min: i32, max: i32) -> i32 {
        rand::thread_rng().gen_range(min..=max)
    }
}

lazy_static! {
    static ref DEFAULT_ALLOCATOR: Arc<RandomEntityIds> = Arc::new(RandomEntityIds);
}

/// Shared handle to the default random allocator.
pub fn default_allocator() -> Arc<dyn EntityIdAllocator> {
    DEFAULT_ALLOCATOR.clone()
}
