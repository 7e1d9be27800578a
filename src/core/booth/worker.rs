use super::{RunState, Shared};
use crate::core::event::{BoothEvent, BoothEventKind};
use crate::core::vehicle::Vehicle;
use log::{debug, info, trace, warn};
use std::sync::{Arc, PoisonError};
use std::thread;

/// What the worker does on its next loop iteration
enum Step {
    Serve(Vehicle),
    Idle,
    Exit,
}

/// Booth worker loop. Sole consumer of the queue and sole writer of `current`.
pub(super) fn run(shared: Arc<Shared>) {
    debug!("[Booth {}] Worker started", shared.id);

    loop {
        match next_step(&shared) {
            Step::Exit => break,
            Step::Idle => continue,
            Step::Serve(vehicle) => {
                serve(&shared, &vehicle);
                finish_cycle(&shared);
            }
        }
    }

    info!("[Booth {}] Shutdown requested. Stopping vehicle processing.", shared.id);
}

fn next_step(shared: &Shared) -> Step {
    let mut inner = shared.lock();
    if inner.shutdown {
        return Step::Exit;
    }

    if inner.run_state == RunState::Running && inner.current.is_none() {
        if let Some(vehicle) = inner.queue.pop() {
            info!("[Booth {}] Now processing vehicle {}", shared.id, vehicle.plate());
            inner.current = Some(vehicle.clone());
            return Step::Serve(vehicle);
        }
        trace!("[Booth {}] Idle, no vehicles to process", shared.id);
    }

    // Paused or idle: sleep until admit/resume/stop or the backoff elapses
    let _ = shared
        .changed
        .wait_timeout(inner, shared.config.idle_backoff)
        .unwrap_or_else(PoisonError::into_inner);
    Step::Idle
}

/// Emit Enter, Pay and Exit for `vehicle`, each followed by a third of the processing time.
/// Runs to completion even if shutdown is requested meanwhile.
fn serve(shared: &Shared, vehicle: &Vehicle) {
    let delay = shared.config.event_delay();

    for kind in BoothEventKind::LIFECYCLE {
        let event = BoothEvent::new(shared.id.clone(), vehicle, kind);
        if let Err(e) = shared.sink.send(&event) {
            warn!("[Booth {}] Failed to publish {} event for {}: {}", shared.id, kind, vehicle.plate(), e);
        }
        thread::sleep(delay);
    }
}

fn finish_cycle(shared: &Shared) {
    let mut inner = shared.lock();
    if let Some(vehicle) = inner.current.take() {
        debug!("[Booth {}] Vehicle {} has left", shared.id, vehicle.plate());
    }
    inner.processed += 1;
    shared.changed.notify_all();

    // Short pause between vehicles, cut short by a shutdown request
    let _ = shared
        .changed
        .wait_timeout_while(inner, shared.config.inter_cycle_delay, |inner| !inner.shutdown)
        .unwrap_or_else(PoisonError::into_inner);
}
