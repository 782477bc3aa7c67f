use crate::protocol::ZoneSnapshot;
use crate::sim::config::SimConfig;
use crate::sim::signal::Signal;
use crate::sim::vehicle::{Bounds, Heading, Vehicle};
use rand::Rng;
use std::time::Instant;

/// What happened during one tick, for logging and tests
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub spawned: Option<String>,
    pub removed: Option<String>,
    pub signal_toggled: bool,
}

/// One worker's simulation partition: its vehicles and its signal.
///
/// Nothing in here is shared; the owning worker serializes access.
#[derive(Clone, Debug)]
pub struct Zone {
    name: String,
    config: SimConfig,
    bounds: Bounds,
    vehicles: Vec<Vehicle>,
    signal: Signal,
    next_vehicle: u64,
}

impl Zone {
    /// Empty zone with its signal at the centre
    pub fn new(name: impl Into<String>, config: SimConfig, now: Instant) -> Self {
        let bounds = Bounds::square(config.zone_size);
        let centre = config.zone_size / 2.0;
        let signal = Signal::new(centre, centre, config.signal_cycle(), now);

        Self {
            name: name.into(),
            config,
            bounds,
            vehicles: Vec::new(),
            signal,
            next_vehicle: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn signal(&self) -> &Signal {
        &self.signal
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// Seed the zone with its starting traffic, spread along the roads
    pub fn populate<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let lo = self.config.initial_min;
        let hi = self.config.initial_max.max(lo);
        let count = rng.gen_range(lo..=hi).min(self.config.capacity);

        let size = self.config.zone_size;
        let lane = self.lane();
        for _ in 0..count {
            let heading = Heading::ALL[rng.gen_range(0..Heading::ALL.len())];
            let (x, y) = match heading {
                Heading::East => (rng.gen_range(0.0..size * 0.4), lane),
                Heading::West => (rng.gen_range(size * 0.6..size), lane),
                Heading::South => (lane, rng.gen_range(0.0..size * 0.4)),
                Heading::North => (lane, rng.gen_range(size * 0.6..size)),
            };
            self.push_vehicle(x, y, heading);
        }
    }

    /// Advance the zone by one tick.
    ///
    /// Order: signal, motion, spawn, attrition. Random draws happen in a
    /// fixed order so a seeded `rng` replays the same decisions.
    pub fn advance<R: Rng + ?Sized>(&mut self, now: Instant, rng: &mut R) -> TickReport {
        let mut report = TickReport {
            signal_toggled: self.signal.update(now),
            ..Default::default()
        };

        let (speed, size) = (self.config.speed, self.config.vehicle_size);
        for vehicle in &mut self.vehicles {
            vehicle.advance(speed, size);
        }

        if rng.gen::<f64>() < self.config.spawn_probability
            && self.vehicles.len() < self.config.capacity
        {
            let heading = Heading::ALL[rng.gen_range(0..Heading::ALL.len())];
            let (x, y) = self.entry_point(heading);
            report.spawned = Some(self.push_vehicle(x, y, heading));
        }

        if rng.gen::<f64>() < self.config.attrition_probability
            && self.vehicles.len() > self.config.attrition_floor
        {
            let index = rng.gen_range(0..self.vehicles.len());
            report.removed = Some(self.vehicles.remove(index).id);
        }

        report
    }

    /// Immutable capture of the current vehicles and signal
    pub fn snapshot(&self) -> ZoneSnapshot {
        ZoneSnapshot {
            entities: self.vehicles.iter().map(Vehicle::state).collect(),
            signal: Some(self.signal.state()),
        }
    }

    /// Centre line of both roads
    fn lane(&self) -> f64 {
        self.config.zone_size / 2.0 - self.config.vehicle_size / 2.0
    }

    /// Just outside the edge a vehicle with `heading` enters from
    fn entry_point(&self, heading: Heading) -> (f64, f64) {
        let size = self.config.zone_size;
        let vsize = self.config.vehicle_size;
        let lane = self.lane();
        match heading {
            Heading::East => (-vsize, lane),
            Heading::West => (size, lane),
            Heading::South => (lane, -vsize),
            Heading::North => (lane, size),
        }
    }

    fn push_vehicle(&mut self, x: f64, y: f64, heading: Heading) -> String {
        let id = format!("{}-car-{}", self.name, self.next_vehicle);
        self.next_vehicle += 1;
        self.vehicles
            .push(Vehicle::new(id.clone(), x, y, heading, self.bounds));
        id
    }
}
