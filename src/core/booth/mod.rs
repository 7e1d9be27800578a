//! Toll booth: a bounded admission queue drained by one worker thread.
//!
//! A [`Booth`] owns its queue, its state machine and its worker. Admission
//! can be called from any thread and never blocks; the worker is the only
//! consumer. All state of one booth lives behind one mutex, paired with a
//! condition variable that wakes the worker on admit/resume/stop and wakes
//! `stop` when the booth goes idle.
//!
//! # Lifecycle
//!
//! ```text
//! Stopped --start--> Running <--pause/resume--> Paused
//!    ^                  |                          |
//!    +-------stop-------+----------stop------------+
//! ```
//!
//! `stop` closes the queue, waits up to the drain timeout for the booth to
//! go idle, then asks the worker to exit and joins it. Vehicles still
//! queued at that point are discarded and counted in the [`StopReport`].

mod queue;
mod state;
mod worker;

pub use queue::VehicleQueue;
pub use state::{BoothStatus, QueueState, RunState, StopReport};

use crate::core::errors::AdmitError;
use crate::core::execution::config::BoothConfig;
use crate::core::sink::EventSink;
use crate::core::types::BoothId;
use crate::core::vehicle::Vehicle;
use log::{debug, error, info, warn};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Mutable state of one booth, guarded by [`Shared::inner`]
#[derive(Debug)]
struct BoothInner {
    run_state: RunState,
    queue_state: QueueState,
    queue: VehicleQueue,
    current: Option<Vehicle>,
    /// Cancellation token read by the worker at the top of each loop
    shutdown: bool,
    processed: u64,
}

impl BoothInner {
    fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.current.is_none()
    }
}

/// State shared between the booth handle and its worker thread
struct Shared {
    id: BoothId,
    config: BoothConfig,
    inner: Mutex<BoothInner>,
    changed: Condvar,
    sink: Arc<dyn EventSink>,
}

impl Shared {
    /// Lock the booth state. A worker that panicked mid-cycle never holds the
    /// lock across the sink call, so a poisoned lock still holds consistent data.
    fn lock(&self) -> MutexGuard<'_, BoothInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct Booth {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    /// Serializes start/stop/recover
    lifecycle: Mutex<()>,
}

impl Booth {
    /// Create a stopped booth with an open queue
    ///
    /// # Arguments
    /// * `id` - Identifier used in events and log lines
    /// * `config` - Queue capacity and timings of this booth
    /// * `sink` - Receiver of the Enter, Pay and Exit events
    ///
    /// # Returns
    /// A booth with no worker thread; call [`Booth::start`] to begin processing
    pub fn new(id: impl Into<BoothId>, config: BoothConfig, sink: Arc<dyn EventSink>) -> Self {
        let queue = VehicleQueue::new(config.queue_capacity);
        Self {
            shared: Arc::new(Shared {
                id: id.into(),
                config,
                inner: Mutex::new(BoothInner {
                    run_state: RunState::Stopped,
                    queue_state: QueueState::Open,
                    queue,
                    current: None,
                    shutdown: false,
                    processed: 0,
                }),
                changed: Condvar::new(),
                sink,
            }),
            worker: Mutex::new(None),
            lifecycle: Mutex::new(()),
        }
    }

    /// Get the booth identifier
    pub fn id(&self) -> &BoothId {
        &self.shared.id
    }

    /// Get the configuration the booth was built with
    pub fn config(&self) -> &BoothConfig {
        &self.shared.config
    }

    /// Current run state (`Stopped`, `Running` or `Paused`)
    pub fn run_state(&self) -> RunState {
        self.shared.lock().run_state
    }

    /// Whether the queue accepts new vehicles
    pub fn queue_state(&self) -> QueueState {
        self.shared.lock().queue_state
    }

    pub fn is_queue_open(&self) -> bool {
        self.queue_state() == QueueState::Open
    }

    /// Number of vehicles waiting, not counting the one in service
    pub fn queue_len(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// Maximum number of waiting vehicles
    pub fn capacity(&self) -> usize {
        self.shared.lock().queue.capacity()
    }

    /// True while a vehicle is in service
    pub fn is_busy(&self) -> bool {
        self.shared.lock().current.is_some()
    }

    /// Copy of the vehicle in service, if any
    pub fn current_vehicle(&self) -> Option<Vehicle> {
        self.shared.lock().current.clone()
    }

    /// Number of vehicles that completed Enter/Pay/Exit here
    pub fn processed_count(&self) -> u64 {
        self.shared.lock().processed
    }

    /// True if a worker thread exists and has not terminated
    pub fn is_worker_alive(&self) -> bool {
        self.worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(false, |handle| !handle.is_finished())
    }

    /// Snapshot of state, queue and worker liveness
    ///
    /// # Returns
    /// A [`BoothStatus`] read under a single lock, plus the worker check
    pub fn status(&self) -> BoothStatus {
        let worker_alive = self.is_worker_alive();
        let inner = self.shared.lock();
        BoothStatus {
            id: self.shared.id.clone(),
            run_state: inner.run_state,
            queue_state: inner.queue_state,
            queue_len: inner.queue.len(),
            capacity: inner.queue.capacity(),
            current: inner.current.clone(),
            processed: inner.processed,
            worker_alive,
        }
    }

    /// Enqueue a vehicle without blocking.
    ///
    /// A closed queue is reported before anything else, then a booth that was
    /// never started, then a full queue. A refused vehicle is dropped.
    ///
    /// # Arguments
    /// * `vehicle` - The vehicle to enqueue
    ///
    /// # Returns
    /// `Ok(())` if queued, otherwise the [`AdmitError`] explaining the refusal
    pub fn admit(&self, vehicle: Vehicle) -> Result<(), AdmitError> {
        let mut inner = self.shared.lock();

        if inner.queue_state == QueueState::Closed {
            info!("[Booth {}] Queue is closed. Cannot add vehicle {}.", self.id(), vehicle.plate());
            return Err(AdmitError::QueueClosed(self.id().clone()));
        }
        if inner.run_state == RunState::Stopped {
            error!("[Booth {}] Vehicle {} admitted before the booth was started", self.id(), vehicle.plate());
            return Err(AdmitError::NotStarted(self.id().clone()));
        }

        match inner.queue.try_push(vehicle) {
            Ok(()) => {
                self.shared.changed.notify_all();
                Ok(())
            }
            Err(vehicle) => {
                info!("[Booth {}] Queue is full. Cannot add vehicle {}.", self.id(), vehicle.plate());
                Err(AdmitError::QueueFull(self.id().clone()))
            }
        }
    }

    /// Accept new vehicles again. Idempotent.
    pub fn open_queue(&self) {
        self.set_queue_state(QueueState::Open);
    }

    /// Refuse new vehicles; queued ones are still served. Idempotent.
    pub fn close_queue(&self) {
        self.set_queue_state(QueueState::Closed);
    }

    fn set_queue_state(&self, queue_state: QueueState) {
        let mut inner = self.shared.lock();
        if inner.queue_state == queue_state {
            debug!("[Booth {}] Queue already {}", self.id(), queue_state);
            return;
        }
        inner.queue_state = queue_state;
        match queue_state {
            QueueState::Open => info!("[Booth {}] Queue is now open to new vehicles.", self.id()),
            QueueState::Closed => info!("[Booth {}] Queue is now closed to new vehicles.", self.id()),
        }
    }

    /// Spawn the worker, open the queue and switch to `Running`.
    /// A booth that already runs (or is paused) keeps its single worker.
    pub fn start(&self) {
        let _lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);

        {
            let mut inner = self.shared.lock();
            if inner.run_state != RunState::Stopped {
                info!("[Booth {}] Already {}.", self.id(), inner.run_state);
                return;
            }
            inner.run_state = RunState::Running;
            inner.shutdown = false;
        }

        if !self.spawn_worker() {
            self.shared.lock().run_state = RunState::Stopped;
            return;
        }
        self.open_queue();
        info!("[Booth {}] Started processing.", self.id());
    }

    fn spawn_worker(&self) -> bool {
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(format!("booth-{}", self.id()))
            .spawn(move || worker::run(shared));

        match spawned {
            Ok(handle) => {
                *self.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
                true
            }
            Err(e) => {
                error!("[Booth {}] Failed to spawn worker thread: {}", self.id(), e);
                false
            }
        }
    }

    /// Stop taking vehicles from the queue. Only effective while `Running`;
    /// a cycle in progress completes. Admission keeps working.
    pub fn pause(&self) {
        let mut inner = self.shared.lock();
        if inner.run_state == RunState::Running {
            inner.run_state = RunState::Paused;
            info!("[Booth {}] Paused.", self.id());
        } else {
            info!("[Booth {}] Cannot be paused because it is {}.", self.id(), inner.run_state);
        }
    }

    /// Continue processing after [`Booth::pause`] and wake the worker
    pub fn resume(&self) {
        let mut inner = self.shared.lock();
        if inner.run_state == RunState::Paused {
            inner.run_state = RunState::Running;
            self.shared.changed.notify_all();
            info!("[Booth {}] Resumed processing.", self.id());
        } else {
            debug!("[Booth {}] Not paused, nothing to resume.", self.id());
        }
    }

    /// Block until the booth has nothing queued or in service, or `timeout` elapses.
    ///
    /// # Arguments
    /// * `timeout` - Longest time to wait
    ///
    /// # Returns
    /// True if the booth went idle
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let inner = self.shared.lock();
        let (inner, _) = self
            .shared
            .changed
            .wait_timeout_while(inner, timeout, |inner| !inner.is_idle())
            .unwrap_or_else(PoisonError::into_inner);
        inner.is_idle()
    }

    /// Close the queue, drain within the configured timeout, then join the worker.
    ///
    /// Returns within roughly `drain_timeout` plus one processing cycle.
    /// Vehicles left in the queue after the timeout are discarded and counted.
    ///
    /// # Returns
    /// A [`StopReport`]; stopping a stopped booth yields the default report
    pub fn stop(&self) -> StopReport {
        let _lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        let started = Instant::now();

        if self.run_state() == RunState::Stopped {
            info!("[Booth {}] Not running.", self.id());
            return StopReport::default();
        }

        self.close_queue();

        let drained = if self.is_worker_alive() {
            self.wait_idle(self.shared.config.drain_timeout)
        } else {
            warn!("[Booth {}] Worker is not alive, skipping drain.", self.id());
            self.shared.lock().is_idle()
        };
        if !drained {
            warn!(
                "[Booth {}] Queue not drained within {:?}, forcing shutdown.",
                self.id(),
                self.shared.config.drain_timeout
            );
        }

        self.join_worker();

        let discarded = {
            let mut inner = self.shared.lock();
            inner.run_state = RunState::Stopped;
            inner.current = None;
            inner.queue.drain_all().len()
        };
        if discarded > 0 {
            warn!("[Booth {}] Discarded {} queued vehicles on shutdown.", self.id(), discarded);
        }
        info!("[Booth {}] Has stopped processing.", self.id());

        StopReport {
            was_running: true,
            drained,
            discarded,
            elapsed: started.elapsed(),
        }
    }

    /// Set the shutdown token and wait for the worker thread to exit
    fn join_worker(&self) {
        {
            let mut inner = self.shared.lock();
            inner.shutdown = true;
            self.shared.changed.notify_all();
        }

        let handle = self.worker.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("[Booth {}] Worker thread panicked.", self.id());
            }
        }
    }

    /// Replace a worker that died while the booth was running or paused.
    ///
    /// The vehicle that was in service is lost; queued vehicles are kept.
    /// Returns true if a new worker was spawned.
    pub fn recover(&self) -> bool {
        let _lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);

        if self.run_state() == RunState::Stopped || self.is_worker_alive() {
            return false;
        }

        error!("[Booth {}] Worker halted unexpectedly. Restarting it.", self.id());
        let handle = self.worker.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("[Booth {}] Worker thread panicked.", self.id());
            }
        }

        {
            let mut inner = self.shared.lock();
            if let Some(lost) = inner.current.take() {
                warn!("[Booth {}] Vehicle {} was lost mid-service.", self.id(), lost.plate());
            }
            inner.shutdown = false;
        }

        if self.spawn_worker() {
            true
        } else {
            self.shared.lock().run_state = RunState::Stopped;
            false
        }
    }
}

impl Drop for Booth {
    /// Dropping a booth skips the drain: the worker is told to exit and joined.
    fn drop(&mut self) {
        if self.run_state() != RunState::Stopped {
            self.join_worker();
            let discarded = self.shared.lock().queue.drain_all().len();
            if discarded > 0 {
                warn!("[Booth {}] Dropped with {} queued vehicles.", self.id(), discarded);
            }
        }
    }
}

impl std::fmt::Debug for Booth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Booth")
            .field("id", self.id())
            .field("status", &self.status())
            .finish()
    }
}
