
use crate::core::execution::config::BoothConfig;
use crate::core::vehicle::{Vehicle, VehicleClass};
use std::thread;
use std::time::{Duration, Instant};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Millisecond-scale pacing so threaded tests stay short
fn fast_config() -> BoothConfig {
    BoothConfig::new()
        .with_queue_capacity(10)
        .with_processing_time(Duration::from_millis(60))
        .with_drain_timeout(Duration::from_secs(2))
        .with_idle_backoff(Duration::from_millis(20))
        .with_inter_cycle_delay(Duration::ZERO)
}

fn car(plate: &str) -> Vehicle {
    Vehicle::parse(plate, VehicleClass::Car).unwrap()
}

/// Poll `condition` until it holds or `timeout` elapses
fn wait_for(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}
