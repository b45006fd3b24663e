//! Deferred deallocation for objects dropped on the audio thread
//!
//! Removing a [`RenderPair`](super::RenderPair) frees its delay lines and
//! encoder state. Pairs travel inside `basedrop::Owned`, so a drop on the
//! audio thread only enqueues the allocation; a background thread frees it.

use std::sync::OnceLock;
use std::thread;
use std::time::Duration;

use basedrop::{Collector, Handle};

/// Interval between collections
const COLLECT_INTERVAL: Duration = Duration::from_millis(100);

static GC_HANDLE: OnceLock<Handle> = OnceLock::new();

fn init_gc() -> Handle {
    let mut collector = Collector::new();
    let handle = collector.handle();

    let spawned = thread::Builder::new()
        .name("render-gc".to_string())
        .spawn(move || {
            log::info!("Render GC thread started");
            loop {
                collector.collect();
                thread::sleep(COLLECT_INTERVAL);
            }
        });
    if let Err(e) = spawned {
        // allocations made through the handle are leaked instead of freed
        log::error!("Failed to spawn render GC thread: {}", e);
    }
    handle
}

/// Handle for creating `Owned`/`Shared` allocations collected off the
/// audio thread
pub fn gc_handle() -> Handle {
    GC_HANDLE.get_or_init(init_gc).clone()
}
