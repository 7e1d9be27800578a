//! Top-level supervisor of the toll network.
//!
//! The [`Controller`] owns the plazas, cascades start/stop to them, routes
//! each incoming vehicle to a plaza and then to a booth, and restarts
//! plazas whose booth workers died.

use crate::core::booth::{BoothStatus, StopReport};
use crate::core::errors::{ControllerError, RoutingError};
use crate::core::plaza::Plaza;
use crate::core::routing::{BoothSelector, PlazaSelector, RandomPlaza, ShortestQueue};
use crate::core::types::{BoothId, PlazaId};
use crate::core::vehicle::Vehicle;
use log::{error, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

/// Where a routed vehicle ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub plaza_id: PlazaId,
    pub booth_id: BoothId,
}

/// Result of one monitoring pass over a plaza
#[derive(Debug, Clone, PartialEq)]
pub struct PlazaReport {
    pub plaza_id: PlazaId,
    /// Number of booths whose worker had to be restarted
    pub restarted: usize,
    pub booths: Vec<BoothStatus>,
}

pub struct Controller {
    plazas: RwLock<Vec<Plaza>>,
    running: AtomicBool,
    plaza_selector: Box<dyn PlazaSelector>,
    booth_selector: Box<dyn BoothSelector>,
}

impl Controller {
    /// Create a stopped controller routing to a random plaza, then to the
    /// booth with the shortest queue
    pub fn new() -> Self {
        Self {
            plazas: RwLock::new(Vec::new()),
            running: AtomicBool::new(false),
            plaza_selector: Box::new(RandomPlaza::new()),
            booth_selector: Box::new(ShortestQueue),
        }
    }

    /// Replace the plaza routing policy
    ///
    /// # Arguments
    /// * `selector` - Any [`PlazaSelector`], including closures and fn items
    ///
    /// # Returns
    /// The controller with the new policy
    pub fn with_plaza_selector(mut self, selector: impl PlazaSelector + 'static) -> Self {
        self.plaza_selector = Box::new(selector);
        self
    }

    /// Replace the booth routing policy used inside every plaza
    ///
    /// # Arguments
    /// * `selector` - Any [`BoothSelector`], including closures and fn items
    ///
    /// # Returns
    /// The controller with the new policy
    pub fn with_booth_selector(mut self, selector: impl BoothSelector + 'static) -> Self {
        self.booth_selector = Box::new(selector);
        self
    }

    fn plazas(&self) -> RwLockReadGuard<'_, Vec<Plaza>> {
        self.plazas.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// True between [`Controller::start`] and [`Controller::stop`]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ids of the owned plazas, in insertion order
    pub fn plaza_ids(&self) -> Vec<PlazaId> {
        self.plazas().iter().map(Plaza::id).collect()
    }

    /// Number of owned plazas
    pub fn plaza_count(&self) -> usize {
        self.plazas().len()
    }

    /// Run `f` against the plaza with `id`, if owned
    ///
    /// # Arguments
    /// * `id` - Plaza to look up
    /// * `f` - Closure receiving the plaza while the plaza list is read-locked
    ///
    /// # Returns
    /// `Some` with the closure result, or `None` for an unknown plaza
    pub fn with_plaza<R>(&self, id: PlazaId, f: impl FnOnce(&Plaza) -> R) -> Option<R> {
        self.plazas().iter().find(|plaza| plaza.id() == id).map(f)
    }

    /// Take ownership of a plaza. A plaza whose id is already present is
    /// dropped and reported as a duplicate.
    pub fn add_plaza(&self, plaza: Plaza) -> Result<(), ControllerError> {
        let mut plazas = self.plazas.write().unwrap_or_else(PoisonError::into_inner);
        if plazas.iter().any(|existing| existing.id() == plaza.id()) {
            info!("Toll Plaza {} already exists.", plaza.id());
            return Err(ControllerError::DuplicatePlaza(plaza.id()));
        }
        info!("Toll Plaza {} added to the system.", plaza.id());
        plazas.push(plaza);
        Ok(())
    }

    /// Add a plaza and start it right away if the controller is running
    pub fn add_plaza_started(&self, plaza: Plaza) -> Result<(), ControllerError> {
        let id = plaza.id();
        self.add_plaza(plaza)?;
        if self.is_running() {
            self.start_plaza(id)?;
        }
        Ok(())
    }

    /// Start a single plaza. Fails with `UnknownPlaza` when not owned.
    pub fn start_plaza(&self, id: PlazaId) -> Result<(), ControllerError> {
        self.with_plaza(id, Plaza::start).ok_or_else(|| {
            error!("Toll Plaza {} does not exist.", id);
            ControllerError::UnknownPlaza(id)
        })
    }

    /// Stop a single plaza and return the stop reports of its booths.
    /// Fails with `UnknownPlaza` when not owned.
    pub fn stop_plaza(&self, id: PlazaId) -> Result<Vec<StopReport>, ControllerError> {
        self.with_plaza(id, Plaza::stop).ok_or_else(|| {
            error!("Toll Plaza {} does not exist.", id);
            ControllerError::UnknownPlaza(id)
        })
    }

    /// Start every plaza. No-op when already running.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            info!("Central toll system is already running.");
            return;
        }
        let plazas = self.plazas();
        info!("Starting the central toll system with {} plazas.", plazas.len());
        plazas.iter().for_each(Plaza::start);
    }

    /// Stop every plaza, draining each booth. No-op when not running.
    pub fn stop(&self) -> Vec<StopReport> {
        if !self.running.swap(false, Ordering::SeqCst) {
            info!("Central toll system is not running.");
            return Vec::new();
        }
        info!("Stopping the central toll system.");
        self.plazas().iter().flat_map(Plaza::stop).collect()
    }

    /// Route a vehicle: pick a plaza, then a booth inside it.
    ///
    /// # Arguments
    /// * `vehicle` - The vehicle to admit; it is dropped if refused
    ///
    /// # Returns
    /// The chosen plaza and booth, or the [`RoutingError`]. Nothing is retried.
    pub fn route(&self, vehicle: Vehicle) -> Result<Assignment, RoutingError> {
        let plazas = self.plazas();
        let Some(plaza) = self.plaza_selector.select(&plazas) else {
            error!("No plazas available to assign vehicle {}.", vehicle.plate());
            return Err(RoutingError::NoPlazas);
        };

        info!("Assigning vehicle {} to plaza {}.", vehicle.plate(), plaza.id());
        let booth_id = plaza.route(vehicle, self.booth_selector.as_ref())?;
        Ok(Assignment {
            plaza_id: plaza.id(),
            booth_id,
        })
    }

    /// Check every plaza. An open plaza that lost booth workers is
    /// restarted; the others just report their booths.
    pub fn monitor(&self) -> Vec<PlazaReport> {
        info!("Monitoring all plazas.");
        self.plazas()
            .iter()
            .map(|plaza| {
                let restarted = if plaza.is_open() && !plaza.is_alive() {
                    error!("Toll Plaza {} has halted booth workers. Restarting it.", plaza.id());
                    plaza.restart()
                } else {
                    0
                };
                PlazaReport {
                    plaza_id: plaza.id(),
                    restarted,
                    booths: plaza.monitor(),
                }
            })
            .collect()
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("plazas", &self.plaza_ids())
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::execution::config::BoothConfig;
    use crate::core::sink::MemorySink;
    use std::sync::Arc;

    fn plaza(id: u32) -> Plaza {
        Plaza::with_booths(PlazaId::new(id), 2, &BoothConfig::new(), Arc::new(MemorySink::new()))
    }

    #[test]
    fn test_duplicate_plaza_rejected() {
        let controller = Controller::new();
        controller.add_plaza(plaza(1)).unwrap();
        assert_eq!(
            controller.add_plaza(plaza(1)),
            Err(ControllerError::DuplicatePlaza(PlazaId::new(1)))
        );
        controller.add_plaza(plaza(2)).unwrap();
        assert_eq!(controller.plaza_ids(), vec![PlazaId::new(1), PlazaId::new(2)]);
    }

    #[test]
    fn test_route_without_plazas() {
        let controller = Controller::new();
        let vehicle = Vehicle::parse("AA 1234", crate::core::vehicle::VehicleClass::Car).unwrap();
        assert_eq!(controller.route(vehicle), Err(RoutingError::NoPlazas));
    }

    #[test]
    fn test_unknown_plaza() {
        let controller = Controller::new();
        assert_eq!(controller.start_plaza(PlazaId::new(9)), Err(ControllerError::UnknownPlaza(PlazaId::new(9))));
        assert!(controller.stop_plaza(PlazaId::new(9)).is_err());
    }

    #[test]
    fn test_start_stop_idempotent() {
        let controller = Controller::new();
        controller.add_plaza(plaza(1)).unwrap();

        controller.start();
        controller.start();
        assert!(controller.is_running());
        assert_eq!(controller.with_plaza(PlazaId::new(1), Plaza::is_open), Some(true));

        assert_eq!(controller.stop().len(), 2);
        assert!(controller.stop().is_empty());
        assert_eq!(controller.with_plaza(PlazaId::new(1), Plaza::is_open), Some(false));
    }
}
