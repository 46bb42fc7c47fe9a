use std::time::Duration;

use crate::error::GpuResult;
use crate::sync::{Fence, FenceValue, Timeline};

/// Lifecycle of one ring slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SlotState {
    /// Free for recording.
    Idle,
    /// Acquired by the CPU; commands and uploads are being written.
    Recording,
    /// Handed to the GPU, guarded by the slot's fence value.
    Submitted,
}

#[derive(Debug)]
struct Slot<T> {
    resource: T,
    fence: FenceValue,
    state: SlotState,
}

/// Fixed rotation of per-frame resources shared between CPU and GPU.
///
/// The CPU records into one slot while the GPU may still execute the others.
/// Reusing a slot waits until the GPU has passed the fence value recorded
/// when that slot was last submitted.
#[derive(Debug)]
pub struct FrameRing<T> {
    slots: Vec<Slot<T>>,
    current: usize,
    /// Whether anything was acquired yet.
    started: bool,
    wait_timeout: Option<Duration>,
}

impl<T> FrameRing<T> {
    pub fn new(resources: Vec<T>) -> Self {
        assert!(!resources.is_empty(), "frame ring needs at least one slot");
        Self {
            slots: resources
                .into_iter()
                .map(|resource| Slot {
                    resource,
                    fence: 0,
                    state: SlotState::Idle,
                })
                .collect(),
            current: 0,
            started: false,
            wait_timeout: None,
        }
    }

    /// Bounds every slot wait. `None` waits forever.
    pub fn with_wait_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &T {
        &self.slots[self.current].resource
    }

    pub fn current_mut(&mut self) -> &mut T {
        &mut self.slots[self.current].resource
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).map(|s| &s.resource)
    }

    pub fn state(&self, index: usize) -> SlotState {
        self.slots[index].state
    }

    pub fn fence(&self, index: usize) -> FenceValue {
        self.slots[index].fence
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().map(|s| &mut s.resource)
    }

    /// Advances to the next slot, waiting for the GPU to release it.
    ///
    /// Panics if the previously acquired slot was never submitted.
    pub fn acquire<Q: Timeline + ?Sized>(
        &mut self,
        queue: &Q,
        fence: &Fence,
    ) -> GpuResult<(usize, &mut T)> {
        if self.started {
            assert_ne!(
                self.slots[self.current].state,
                SlotState::Recording,
                "frame slot {} acquired again before it was submitted",
                self.current
            );
        }
        self.started = true;
        self.current = (self.current + 1) % self.slots.len();

        let index = self.current;
        let slot = &mut self.slots[index];
        if slot.fence != 0 && fence.completed_value() < slot.fence {
            log::debug!(
                "frame slot {index}: waiting for fence {} (completed {})",
                slot.fence,
                fence.completed_value()
            );
            match self.wait_timeout {
                Some(t) => fence.block_until_for(queue, slot.fence, t)?,
                None => fence.block_until(queue, slot.fence)?,
            }
        }

        slot.state = SlotState::Recording;
        Ok((index, &mut slot.resource))
    }

    /// Records that the current slot's work was submitted and is guarded by
    /// `value`.
    pub fn mark_submitted(&mut self, value: FenceValue) {
        let slot = &mut self.slots[self.current];
        assert_eq!(
            slot.state,
            SlotState::Recording,
            "frame slot {} submitted without being acquired",
            self.current
        );
        assert!(value > slot.fence, "fence value must increase per submission");
        slot.fence = value;
        slot.state = SlotState::Submitted;
    }

    /// Consumes the ring, returning the slot resources in index order.
    pub fn into_resources(self) -> Vec<T> {
        self.slots.into_iter().map(|s| s.resource).collect()
    }

    /// Marks every submitted slot whose fence has passed as idle.
    pub fn retire_completed(&mut self, fence: &Fence) {
        let completed = fence.completed_value();
        for slot in &mut self.slots {
            if slot.state == SlotState::Submitted && slot.fence <= completed {
                slot.state = SlotState::Idle;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Completion, HeadlessBackend};

    fn ring() -> FrameRing<u32> {
        FrameRing::new(vec![10, 11, 12])
    }

    #[test]
    fn acquire_rotates_starting_after_slot_zero() {
        let mut backend = HeadlessBackend::new(4, 4, Completion::Immediate);
        let mut fence = Fence::new();
        let mut ring = ring();

        let mut seen = Vec::new();
        for _ in 0..5 {
            let (index, res) = ring.acquire(&backend, &fence).unwrap();
            seen.push((index, *res));
            let value = fence.signal(&mut backend).unwrap();
            ring.mark_submitted(value);
        }
        assert_eq!(seen, [(1, 11), (2, 12), (0, 10), (1, 11), (2, 12)]);
        assert_eq!(ring.fence(1), 4);
    }

    #[test]
    #[should_panic(expected = "acquired again before it was submitted")]
    fn acquiring_twice_without_submit_panics() {
        let backend = HeadlessBackend::new(4, 4, Completion::Immediate);
        let fence = Fence::new();
        let mut ring = ring();
        ring.acquire(&backend, &fence).unwrap();
        let _ = ring.acquire(&backend, &fence);
    }

    #[test]
    fn retire_marks_completed_slots_idle() {
        let mut backend = HeadlessBackend::new(4, 4, Completion::Manual);
        let handle = backend.completion_handle();
        let mut fence = Fence::new();
        let mut ring = ring();

        ring.acquire(&backend, &fence).unwrap();
        ring.mark_submitted(fence.signal(&mut backend).unwrap());
        ring.retire_completed(&fence);
        assert_eq!(ring.state(1), SlotState::Submitted);

        handle.complete_all();
        ring.retire_completed(&fence);
        assert_eq!(ring.state(1), SlotState::Idle);
    }

    #[test]
    fn bounded_wait_surfaces_timeout() {
        let mut backend = HeadlessBackend::new(4, 4, Completion::Manual);
        let mut fence = Fence::new();
        let mut ring = ring().with_wait_timeout(Some(Duration::from_millis(10)));

        for _ in 0..3 {
            ring.acquire(&backend, &fence).unwrap();
            ring.mark_submitted(fence.signal(&mut backend).unwrap());
        }
        let err = ring.acquire(&backend, &fence).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::Timeout);
    }
}
