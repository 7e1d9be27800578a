//! Routing strategies.
//!
//! A [`BoothSelector`] picks the booth of a plaza that should receive the
//! next vehicle, a [`PlazaSelector`] picks the plaza. Both are passed in by
//! the caller, so plazas can be routed with different policies. Closures
//! implement both traits.
//!
//! Booth selection only considers booths whose queue is open. Queue
//! lengths are read booth by booth without a global snapshot, so a choice
//! may be based on slightly stale lengths.

use crate::core::booth::Booth;
use crate::core::errors::RoutingError;
use crate::core::plaza::Plaza;
use crate::core::types::PlazaId;
use log::warn;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::{Mutex, PoisonError};

/// Chooses the booth that receives the next vehicle
pub trait BoothSelector: Send + Sync {
    fn select<'a>(&self, plaza: PlazaId, booths: &'a [Booth]) -> Result<&'a Booth, RoutingError>;
}

impl<F> BoothSelector for F
where
    F: for<'a> Fn(PlazaId, &'a [Booth]) -> Result<&'a Booth, RoutingError> + Send + Sync,
{
    fn select<'a>(&self, plaza: PlazaId, booths: &'a [Booth]) -> Result<&'a Booth, RoutingError> {
        self(plaza, booths)
    }
}

/// Chooses the plaza that receives the next vehicle
pub trait PlazaSelector: Send + Sync {
    fn select<'a>(&self, plazas: &'a [Plaza]) -> Option<&'a Plaza>;
}

impl<F> PlazaSelector for F
where
    F: for<'a> Fn(&'a [Plaza]) -> Option<&'a Plaza> + Send + Sync,
{
    fn select<'a>(&self, plazas: &'a [Plaza]) -> Option<&'a Plaza> {
        self(plazas)
    }
}

/// Booths whose queue accepts vehicles, in plaza order
fn open_booths(plaza: PlazaId, booths: &[Booth]) -> Result<Vec<&Booth>, RoutingError> {
    let open: Vec<&Booth> = booths.iter().filter(|booth| booth.is_queue_open()).collect();
    if open.is_empty() {
        warn!("[Plaza {}] No available booths to process vehicles.", plaza);
        return Err(RoutingError::NoAvailableBooths(plaza));
    }
    Ok(open)
}

/// Open booth with the fewest queued vehicles; the first one wins ties
#[derive(Debug, Default, Clone, Copy)]
pub struct ShortestQueue;

impl BoothSelector for ShortestQueue {
    fn select<'a>(&self, plaza: PlazaId, booths: &'a [Booth]) -> Result<&'a Booth, RoutingError> {
        open_booths(plaza, booths)?
            .into_iter()
            .min_by_key(|booth| booth.queue_len())
            .ok_or(RoutingError::NoAvailableBooths(plaza))
    }
}

/// Uniformly random open booth
#[derive(Debug)]
pub struct RandomBooth {
    rng: Option<Mutex<StdRng>>,
}

impl RandomBooth {
    /// Draw from the thread-local generator
    pub fn new() -> Self {
        Self { rng: None }
    }

    /// Draw from a deterministic generator
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Some(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }
}

impl Default for RandomBooth {
    fn default() -> Self {
        Self::new()
    }
}

impl BoothSelector for RandomBooth {
    fn select<'a>(&self, plaza: PlazaId, booths: &'a [Booth]) -> Result<&'a Booth, RoutingError> {
        let open = open_booths(plaza, booths)?;
        let chosen = match &self.rng {
            Some(rng) => open.choose(&mut *rng.lock().unwrap_or_else(PoisonError::into_inner)),
            None => open.choose(&mut rand::thread_rng()),
        };
        chosen.copied().ok_or(RoutingError::NoAvailableBooths(plaza))
    }
}

/// Uniformly random plaza among all owned plazas
#[derive(Debug)]
pub struct RandomPlaza {
    rng: Option<Mutex<StdRng>>,
}

impl RandomPlaza {
    pub fn new() -> Self {
        Self { rng: None }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Some(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }
}

impl Default for RandomPlaza {
    fn default() -> Self {
        Self::new()
    }
}

impl PlazaSelector for RandomPlaza {
    fn select<'a>(&self, plazas: &'a [Plaza]) -> Option<&'a Plaza> {
        match &self.rng {
            Some(rng) => plazas.choose(&mut *rng.lock().unwrap_or_else(PoisonError::into_inner)),
            None => plazas.choose(&mut rand::thread_rng()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::execution::config::BoothConfig;
    use crate::core::sink::MemorySink;
    use crate::core::vehicle::{Vehicle, VehicleClass};
    use std::collections::HashSet;
    use std::sync::Arc;

    const PLAZA: PlazaId = PlazaId(1);

    /// Started, paused booths so queue lengths stay put
    fn booths_with_lengths(lengths: &[usize]) -> Vec<Booth> {
        let sink = Arc::new(MemorySink::new());
        lengths
            .iter()
            .enumerate()
            .map(|(i, &len)| {
                let booth = Booth::new(PLAZA.booth(i), BoothConfig::new(), sink.clone());
                booth.start();
                booth.pause();
                for n in 0..len {
                    let plate = format!("AA {:04}", i * 100 + n);
                    booth.admit(Vehicle::parse(&plate, VehicleClass::Car).unwrap()).unwrap();
                }
                booth
            })
            .collect()
    }

    #[test]
    fn test_shortest_queue_picks_minimum() {
        let booths = booths_with_lengths(&[3, 1, 5]);
        let chosen = ShortestQueue.select(PLAZA, &booths).unwrap();
        assert_eq!(chosen.id(), booths[1].id());
    }

    #[test]
    fn test_shortest_queue_skips_closed_booths() {
        let booths = booths_with_lengths(&[3, 1, 5]);
        booths[1].close_queue();
        let chosen = ShortestQueue.select(PLAZA, &booths).unwrap();
        assert_eq!(chosen.id(), booths[0].id());

        booths[0].close_queue();
        booths[2].close_queue();
        assert_eq!(ShortestQueue.select(PLAZA, &booths).unwrap_err(), RoutingError::NoAvailableBooths(PLAZA));
    }

    #[test]
    fn test_shortest_queue_ties_go_to_first() {
        let booths = booths_with_lengths(&[2, 0, 0]);
        assert_eq!(ShortestQueue.select(PLAZA, &booths).unwrap().id(), booths[1].id());
    }

    #[test]
    fn test_random_booth_only_picks_open() {
        let booths = booths_with_lengths(&[0, 0, 0]);
        booths[0].close_queue();
        let selector = RandomBooth::seeded(7);

        let picked: HashSet<_> = (0..50).map(|_| selector.select(PLAZA, &booths).unwrap().id().clone()).collect();
        assert!(!picked.contains(booths[0].id()));
        assert_eq!(picked.len(), 2);

        booths[1].close_queue();
        booths[2].close_queue();
        assert!(RandomBooth::new().select(PLAZA, &booths).is_err());
    }

    #[test]
    fn test_function_selector() {
        let booths = booths_with_lengths(&[0, 0]);
        fn last(plaza: PlazaId, booths: &[Booth]) -> Result<&Booth, RoutingError> {
            booths.last().ok_or(RoutingError::NoAvailableBooths(plaza))
        }
        assert_eq!(BoothSelector::select(&last, PLAZA, &booths).unwrap().id(), booths[1].id());
    }

    #[test]
    fn test_random_plaza_empty() {
        let plazas: Vec<Plaza> = Vec::new();
        assert!(RandomPlaza::new().select(&plazas).is_none());
    }
}
