use std::collections::HashMap;

use crate::scheduler::TaskHandle;
use crate::util::EntityIdAllocator;
use crate::{MAX_ENTITY_ID, MIN_ENTITY_ID};

/// What one client currently believes exists for one hologram: the
/// synthetic entity bound to each line index, plus the client's refresh
/// task.
///
/// An id stays bound to its line index until the client is hidden; it is
/// never handed to a different index while live.
#[derive(Default)]
pub(crate) struct ViewerState {
    line_ids: HashMap<usize, i32>,
    refresh_task: Option<TaskHandle>,
}

impl ViewerState {
    /// The entity id bound to `index`, allocating one on first access.
    pub fn line_id(&mut self, index: usize, ids: &dyn EntityIdAllocator) -> i32 {
        *self
            .line_ids
            .entry(index)
            .or_insert_with(|| ids.allocate(MIN_ENTITY_ID, MAX_ENTITY_ID))
    }

    /// Bound (line index, entity id) pairs in line order.
    pub fn bound_lines(&self) -> Vec<(usize, i32)> {
        let mut bound: Vec<(usize, i32)> = self.line_ids.iter().map(|(i, id)| (*i, *id)).collect();
        bound.sort_unstable_by_key(|(index, _)| *index);
        bound
    }

    pub fn refresh_task(&self) -> Option<TaskHandle> {
        self.refresh_task
    }

    pub fn set_refresh_task(&mut self, handle: TaskHandle) {
        self.refresh_task = Some(handle);
    }

    pub fn take_refresh_task(&mut self) -> Option<TaskHandle> {
        self.refresh_task.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_host::SequentialIds;

    #[test]
    fn test_ids_allocated_lazily_and_reused() {
        let ids = SequentialIds::new();
        let mut viewer = ViewerState::default();

        let first = viewer.line_id(0, &*ids);
        let second = viewer.line_id(1, &*ids);
        assert_ne!(first, second);

        // a second access reuses the binding instead of reallocating
        assert_eq!(viewer.line_id(0, &*ids), first);
        assert_eq!(viewer.line_id(1, &*ids), second);
    }

    #[test]
    fn test_bound_lines_in_line_order() {
        let ids = SequentialIds::new();
        let mut viewer = ViewerState::default();
        viewer.line_id(2, &*ids);
        viewer.line_id(0, &*ids);
        viewer.line_id(1, &*ids);

        let indexes: Vec<usize> = viewer.bound_lines().iter().map(|(i, _)| *i).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
    }
}
