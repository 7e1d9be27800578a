use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tollsim::{
    Controller, EventSink, LogSink, Plaza, PlazaId, RandomVehicleSource, SimulationConfig, TrafficGenerator,
};

const PLAZAS: u32 = 2;
const BOOTHS_PER_PLAZA: usize = 3;
const VEHICLES: u64 = 50;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    println!("🚗 Starting Toll Plaza Simulation 🚗");

    let config = SimulationConfig::from_env()?;
    let plate_format = config.plate_format()?;

    let sink: Arc<dyn EventSink> = Arc::new(LogSink);
    let controller = Controller::new();
    for id in 1..=PLAZAS {
        let plaza = Plaza::with_booths(PlazaId::new(id), BOOTHS_PER_PLAZA, &config.booth, Arc::clone(&sink))
            .with_concurrency(config.concurrency_mode);
        controller.add_plaza(plaza)?;
    }

    let stop = AtomicBool::new(false);
    let mut source = RandomVehicleSource::new().with_format(plate_format);
    let report = TrafficGenerator::new()
        .with_limit(VEHICLES)
        .run(&controller, &mut source, &stop);

    let stop_reports = controller.stop();
    let discarded: usize = stop_reports.iter().map(|r| r.discarded).sum();

    println!("\n📊 Simulation summary");
    println!("   Vehicles generated: {}", report.generated);
    println!("   Vehicles assigned:  {}", report.assigned);
    println!("   Vehicles rejected:  {}", report.rejected);
    println!("   Invalid plates:     {}", report.invalid);
    println!("   Discarded on stop:  {}", discarded);
    Ok(())
}
