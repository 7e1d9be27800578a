//! Traffic generation: where vehicles come from and how fast they arrive.

use crate::core::controller::Controller;
use crate::core::errors::{RoutingError, VehicleError};
use crate::core::vehicle::{PlateFormat, PlateNumber, Vehicle, VehicleClass};
use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Anything that can hand out the next vehicle
pub trait VehicleSource {
    /// Next vehicle, `Some(Err(_))` for a plate that failed validation,
    /// or `None` once the source is exhausted
    fn next_vehicle(&mut self) -> Option<Result<Vehicle, VehicleError>>;
}

impl<I> VehicleSource for I
where
    I: Iterator<Item = Vehicle>,
{
    fn next_vehicle(&mut self) -> Option<Result<Vehicle, VehicleError>> {
        self.next().map(Ok)
    }
}

const PLATE_PREFIXES: [&str; 5] = ["AA", "AB", "CD", "CF", "GA"];

/// Endless stream of vehicles with random plates (`AA 1000` to `GA 9999`) and classes.
/// Every plate is checked against the source's [`PlateFormat`].
#[derive(Debug)]
pub struct RandomVehicleSource {
    rng: StdRng,
    format: PlateFormat,
}

impl RandomVehicleSource {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            format: PlateFormat::default(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            format: PlateFormat::default(),
        }
    }

    /// Validate generated plates against `format` instead of the default one
    ///
    /// # Arguments
    /// * `format` - Compiled plate format, usually from `SimulationConfig::plate_format`
    ///
    /// # Returns
    /// The source, now producing `Err` for plates the format rejects
    pub fn with_format(mut self, format: PlateFormat) -> Self {
        self.format = format;
        self
    }

    pub fn format(&self) -> &PlateFormat {
        &self.format
    }
}

impl Default for RandomVehicleSource {
    fn default() -> Self {
        Self::new()
    }
}

impl VehicleSource for RandomVehicleSource {
    fn next_vehicle(&mut self) -> Option<Result<Vehicle, VehicleError>> {
        let prefix = PLATE_PREFIXES.choose(&mut self.rng)?;
        let digits: u16 = self.rng.gen_range(1000..=9999);
        let class = *VehicleClass::ALL.choose(&mut self.rng)?;
        let plate = format!("{prefix} {digits}");
        Some(PlateNumber::with_format(&plate, &self.format).map(|plate| Vehicle::new(plate, class)))
    }
}

/// Gap between two generated vehicles
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArrivalPattern {
    Fixed(Duration),
    Uniform { min: Duration, max: Duration },
    /// Exponentially distributed gaps with the given mean
    Poisson { mean: Duration },
}

impl Default for ArrivalPattern {
    fn default() -> Self {
        ArrivalPattern::Uniform {
            min: Duration::from_millis(500),
            max: Duration::from_secs(2),
        }
    }
}

impl ArrivalPattern {
    /// Draw the next inter-arrival gap
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
        match *self {
            ArrivalPattern::Fixed(gap) => gap,
            ArrivalPattern::Uniform { min, max } if min < max => rng.gen_range(min..=max),
            ArrivalPattern::Uniform { min, .. } => min,
            ArrivalPattern::Poisson { mean } => {
                let mean = mean.as_secs_f64();
                match Exp::new(1.0 / mean) {
                    Ok(exp) if mean > 0.0 => Duration::from_secs_f64(exp.sample(rng)),
                    _ => Duration::ZERO,
                }
            }
        }
    }
}

/// Counters of one generator run. `generated` counts every vehicle drawn
/// from the source, including the ones whose plate was invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GeneratorReport {
    pub generated: u64,
    pub assigned: u64,
    pub rejected: u64,
    /// Vehicles dropped before routing because their plate failed validation
    pub invalid: u64,
}

/// Feeds vehicles from a [`VehicleSource`] into a [`Controller`]
#[derive(Debug)]
pub struct TrafficGenerator {
    arrivals: ArrivalPattern,
    limit: Option<u64>,
    monitor_every: u64,
    rng: StdRng,
}

impl TrafficGenerator {
    pub fn new() -> Self {
        Self {
            arrivals: ArrivalPattern::default(),
            limit: None,
            monitor_every: 10,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_arrivals(mut self, arrivals: ArrivalPattern) -> Self {
        self.arrivals = arrivals;
        self
    }

    /// Stop after this many vehicles were generated
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Run a controller monitoring pass after every `every` assignments; 0 disables it
    pub fn with_monitor_every(mut self, every: u64) -> Self {
        self.monitor_every = every;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Start the controller and route vehicles until the limit is reached,
    /// the source runs dry or `stop` is raised. Invalid plates and routing
    /// failures are logged and counted; they never end the run. The
    /// controller is left running.
    pub fn run(&mut self, controller: &Controller, source: &mut dyn VehicleSource, stop: &AtomicBool) -> GeneratorReport {
        info!("Starting vehicle generation...");
        controller.start();

        let mut report = GeneratorReport::default();
        while !stop.load(Ordering::SeqCst) {
            if self.limit.is_some_and(|limit| report.generated >= limit) {
                break;
            }
            let Some(next) = source.next_vehicle() else {
                info!("Vehicle source exhausted.");
                break;
            };
            report.generated += 1;

            let vehicle = match next {
                Ok(vehicle) => vehicle,
                Err(e) => {
                    report.invalid += 1;
                    warn!("Skipping generated vehicle: {}", e);
                    self.pause();
                    continue;
                }
            };
            let plate = vehicle.plate().clone();
            match controller.route(vehicle) {
                Ok(assignment) => {
                    report.assigned += 1;
                    info!(
                        "Vehicle {} assigned to plaza {} booth {}.",
                        plate, assignment.plaza_id, assignment.booth_id
                    );
                    if self.monitor_every > 0 && report.assigned % self.monitor_every == 0 {
                        info!("Monitoring system status...");
                        controller.monitor();
                    }
                }
                Err(RoutingError::NoPlazas) => {
                    report.rejected += 1;
                    warn!("No plaza to assign vehicle {}. Stopping generation.", plate);
                    break;
                }
                Err(e) => {
                    report.rejected += 1;
                    error!("Failed to assign vehicle {}: {}", plate, e);
                }
            }

            self.pause();
        }

        info!(
            "Vehicle generation finished: {} generated, {} assigned, {} rejected, {} invalid.",
            report.generated, report.assigned, report.rejected, report.invalid
        );
        report
    }

    /// Sleep for the next inter-arrival gap
    fn pause(&mut self) {
        let gap = self.arrivals.sample(&mut self.rng);
        if !gap.is_zero() {
            thread::sleep(gap);
        }
    }
}

impl Default for TrafficGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(source: &mut RandomVehicleSource, count: usize) -> Vec<Result<Vehicle, VehicleError>> {
        (0..count).map_while(|_| source.next_vehicle()).collect()
    }

    #[test]
    fn test_random_source_produces_valid_vehicles() {
        let mut source = RandomVehicleSource::seeded(42);
        for vehicle in draw(&mut source, 100) {
            let vehicle = vehicle.unwrap();
            let plate = vehicle.plate().as_str();
            assert!(PLATE_PREFIXES.contains(&&plate[..2]));
            let digits: u16 = plate[3..].parse().unwrap();
            assert!((1000..=9999).contains(&digits));
        }
    }

    #[test]
    fn test_seeded_sources_repeat() {
        let a = draw(&mut RandomVehicleSource::seeded(3), 5);
        let b = draw(&mut RandomVehicleSource::seeded(3), 5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_random_source_checks_its_format() {
        let format = PlateFormat::new(r"^(AA|AB) \d{4}$").unwrap();
        let mut source = RandomVehicleSource::seeded(8).with_format(format);
        let drawn = draw(&mut source, 100);
        assert_eq!(drawn.len(), 100);

        let (valid, invalid): (Vec<_>, Vec<_>) = drawn.into_iter().partition(Result::is_ok);
        assert!(!valid.is_empty() && !invalid.is_empty());
        for vehicle in valid {
            assert!(vehicle.unwrap().plate().as_str().starts_with('A'));
        }
        for err in invalid {
            assert!(matches!(err.unwrap_err(), VehicleError::InvalidPlate { pattern, .. } if pattern == r"^(AA|AB) \d{4}$"));
        }
    }

    #[test]
    fn test_invalid_plates_do_not_end_the_run() {
        let controller = Controller::new();
        let format = PlateFormat::new(r"^\d{3}-[A-Z]{3}$").unwrap();
        let mut source = RandomVehicleSource::seeded(5).with_format(format);
        let report = TrafficGenerator::new()
            .with_arrivals(ArrivalPattern::Fixed(Duration::ZERO))
            .with_limit(20)
            .run(&controller, &mut source, &AtomicBool::new(false));
        assert_eq!(report, GeneratorReport { generated: 20, assigned: 0, rejected: 0, invalid: 20 });
    }

    #[test]
    fn test_arrival_patterns() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(ArrivalPattern::Fixed(Duration::from_millis(5)).sample(&mut rng), Duration::from_millis(5));

        let uniform = ArrivalPattern::default();
        for _ in 0..50 {
            let gap = uniform.sample(&mut rng);
            assert!(gap >= Duration::from_millis(500) && gap <= Duration::from_secs(2));
        }

        let poisson = ArrivalPattern::Poisson { mean: Duration::from_millis(10) };
        let total: Duration = (0..200).map(|_| poisson.sample(&mut rng)).sum();
        assert!(total > Duration::from_millis(500) && total < Duration::from_millis(5000));

        assert_eq!(ArrivalPattern::Poisson { mean: Duration::ZERO }.sample(&mut rng), Duration::ZERO);
    }

    #[test]
    fn test_run_without_plazas_stops() {
        let controller = Controller::new();
        let mut source = RandomVehicleSource::seeded(1);
        let stop = AtomicBool::new(false);
        let report = TrafficGenerator::new()
            .with_arrivals(ArrivalPattern::Fixed(Duration::ZERO))
            .run(&controller, &mut source, &stop);
        assert_eq!(report, GeneratorReport { generated: 1, assigned: 0, rejected: 1, invalid: 0 });
    }
}
