//! Frame ring reuse against a GPU that completes under test control.

use std::sync::mpsc;
use std::time::Duration;

use lumen_engine::backend::{Completion, HeadlessBackend};
use lumen_engine::frame::{FrameRing, SlotState};
use lumen_engine::sync::Fence;

fn submit_three(ring: &mut FrameRing<u32>, backend: &mut HeadlessBackend, fence: &mut Fence) {
    for _ in 0..3 {
        ring.acquire(&*backend, fence).unwrap();
        let value = fence.signal(backend).unwrap();
        ring.mark_submitted(value);
    }
}

#[test]
fn fourth_acquire_blocks_until_the_first_frame_completes() {
    let mut backend = HeadlessBackend::new(8, 8, Completion::Manual);
    let gpu = backend.completion_handle();
    let mut fence = Fence::new();
    let mut ring = FrameRing::new(vec![0u32, 1, 2]);

    // The CPU runs three frames ahead without waiting.
    submit_three(&mut ring, &mut backend, &mut fence);
    assert_eq!(gpu.pending(), 3);
    assert_eq!(fence.completed_value(), 0);

    let (tx, rx) = mpsc::channel();
    std::thread::scope(|s| {
        s.spawn(|| {
            let (index, _) = ring.acquire(&backend, &fence).unwrap();
            tx.send(index).unwrap();
        });

        std::thread::sleep(Duration::from_millis(50));
        assert!(rx.try_recv().is_err(), "acquire returned while the slot was in flight");

        assert_eq!(gpu.complete_next(), Some(1));
        let index = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(index, 1);
    });

    assert_eq!(ring.state(1), SlotState::Recording);
    assert_eq!(fence.completed_value(), 1);
    assert_eq!(gpu.pending(), 2);
}

#[test]
fn completed_slots_are_reused_without_waiting() {
    let mut backend = HeadlessBackend::new(8, 8, Completion::Manual);
    let gpu = backend.completion_handle();
    let mut fence = Fence::new();
    let mut ring = FrameRing::new(vec![0u32, 1, 2]);
    submit_three(&mut ring, &mut backend, &mut fence);

    // Completing everything at once frees every slot; no acquire blocks.
    gpu.complete_all();
    for expected in [1, 2, 0] {
        let (index, _) = ring.acquire(&backend, &fence).unwrap();
        assert_eq!(index, expected);
        ring.mark_submitted(fence.signal(&mut backend).unwrap());
    }
    assert_eq!(fence.current_value(), 6);
    assert_eq!(gpu.pending(), 3);
}

#[test]
fn one_slot_ring_waits_every_frame() {
    let mut backend = HeadlessBackend::new(8, 8, Completion::Manual);
    let gpu = backend.completion_handle();
    let mut fence = Fence::new();
    let mut ring = FrameRing::new(vec![0u32]);

    ring.acquire(&backend, &fence).unwrap();
    ring.mark_submitted(fence.signal(&mut backend).unwrap());

    let (tx, rx) = mpsc::channel();
    std::thread::scope(|s| {
        s.spawn(|| {
            ring.acquire(&backend, &fence).unwrap();
            tx.send(()).unwrap();
        });
        std::thread::sleep(Duration::from_millis(30));
        assert!(rx.try_recv().is_err());
        gpu.complete_all();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
    });
}
