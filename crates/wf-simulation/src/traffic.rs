//! Ship spawning, movement, avoidance, patrol cycling and congestion.

use std::collections::BTreeMap;

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use wf_core::{FactionId, RouteId, SectorId, ShipId, ShipType, TrafficConfig, UnitInterval, Vec3};

use crate::context::TickContext;
use crate::error::{SimError, SimResult};
use crate::event::{EventRecord, WorldEventType};
use crate::system::{Subsystem, rng_stream, roll};

const RNG_SALT: u64 = 0x5452_4146_4649_4300;

/// One active ship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipTraffic {
    /// Ship id.
    pub id: ShipId,
    /// Role.
    pub ship_type: ShipType,
    /// Sector the ship flies in.
    pub sector: SectorId,
    /// Current position.
    pub position: Vec3,
    /// Velocity of the last move.
    pub velocity: Vec3,
    /// Where the ship is heading.
    pub destination: Vec3,
    /// Owning faction.
    #[serde(default)]
    pub faction: Option<FactionId>,
    /// Cruise speed.
    pub speed: f64,
    /// Sensor range.
    pub scan_range: f64,
    /// Patrol route being flown.
    #[serde(default)]
    pub route: Option<RouteId>,
    /// Index of the waypoint currently targeted.
    #[serde(default)]
    pub route_index: usize,
    /// Stopped by an emergency stop on the previous tick.
    #[serde(default)]
    pub holding: bool,
}

impl ShipTraffic {
    fn heading(&self) -> Vec3 {
        (self.destination - self.position).normalized()
    }
}

/// A faction's patrol circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatrolRoute {
    /// Route id.
    pub id: RouteId,
    /// Faction flying the route.
    pub faction: FactionId,
    /// Sector the route lies in.
    pub sector: SectorId,
    /// Waypoints, visited in order and wrapped.
    pub waypoints: Vec<Vec3>,
    /// Multiplier on the patrol spawn chance.
    pub frequency: f64,
}

/// A trade lane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRoute {
    /// Route id.
    pub id: RouteId,
    /// Sector the lane lies in.
    pub sector: SectorId,
    /// Spawn point.
    pub origin: Vec3,
    /// Exit point.
    pub destination: Vec3,
    /// Relative weight when picking a lane.
    pub density: f64,
}

/// Persisted traffic state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficSnapshot {
    /// Active ships.
    #[serde(default)]
    pub ships: Vec<ShipTraffic>,
    /// Registered patrol routes.
    #[serde(default)]
    pub patrol_routes: Vec<PatrolRoute>,
    /// Registered trade routes.
    #[serde(default)]
    pub trade_routes: Vec<TradeRoute>,
    /// Last measured congestion per sector.
    #[serde(default)]
    pub congestion: BTreeMap<SectorId, UnitInterval>,
    /// Last ship id handed out.
    #[serde(default)]
    pub last_ship: ShipId,
}

/// Simulates ship traffic per sector.
#[derive(Debug)]
pub struct TrafficSystem {
    config: TrafficConfig,
    rng: StdRng,
    ships: BTreeMap<ShipId, ShipTraffic>,
    patrol_routes: BTreeMap<RouteId, PatrolRoute>,
    trade_routes: BTreeMap<RouteId, TradeRoute>,
    congestion: BTreeMap<SectorId, UnitInterval>,
    last_ship: ShipId,
}

impl TrafficSystem {
    /// A traffic system with its own RNG stream derived from `seed`.
    pub fn new(config: TrafficConfig, seed: u64) -> Self {
        Self {
            config,
            rng: rng_stream(seed, RNG_SALT, 0),
            ships: BTreeMap::new(),
            patrol_routes: BTreeMap::new(),
            trade_routes: BTreeMap::new(),
            congestion: BTreeMap::new(),
            last_ship: ShipId::default(),
        }
    }

    /// Register or replace a patrol route.
    pub fn register_patrol_route(&mut self, route: PatrolRoute) -> SimResult<()> {
        if route.waypoints.is_empty() {
            return Err(SimError::EmptyRoute(route.id));
        }
        self.patrol_routes.insert(route.id.clone(), route);
        Ok(())
    }

    /// Register or replace a trade route.
    pub fn register_trade_route(&mut self, route: TradeRoute) {
        self.trade_routes.insert(route.id.clone(), route);
    }

    /// A registered patrol route.
    pub fn patrol_route(&self, id: &RouteId) -> Option<&PatrolRoute> {
        self.patrol_routes.get(id)
    }

    /// Add a ship directly, ignoring the sector cap.
    pub fn insert_ship(
        &mut self,
        ship_type: ShipType,
        sector: SectorId,
        position: Vec3,
        destination: Vec3,
        faction: Option<FactionId>,
    ) -> ShipId {
        let ship = self.make_ship(ship_type, sector, position, destination, faction);
        let id = ship.id;
        self.ships.insert(id, ship);
        id
    }

    /// Every active ship, in id order.
    pub fn ships(&self) -> impl Iterator<Item = &ShipTraffic> {
        self.ships.values()
    }

    /// Active ships in `sector`.
    pub fn ships_in<'a>(&'a self, sector: &'a SectorId) -> impl Iterator<Item = &'a ShipTraffic> {
        self.ships.values().filter(move |s| &s.sector == sector)
    }

    /// Look up a ship.
    pub fn ship(&self, id: ShipId) -> Option<&ShipTraffic> {
        self.ships.get(&id)
    }

    /// Congestion measured on the last tick of `sector`, zero if never ticked.
    pub fn congestion(&self, sector: &SectorId) -> f64 {
        self.congestion.get(sector).map_or(0.0, |c| c.get())
    }

    /// Advance traffic in `sector` around `observer`.
    pub fn tick(&mut self, delta_hours: f64, sector: &SectorId, observer: Vec3) -> Vec<EventRecord> {
        let mut events = Vec::new();
        self.move_ships(delta_hours, sector, observer, &mut events);
        self.spawn_trade(delta_hours, sector, &mut events);
        self.spawn_patrols(delta_hours, sector, &mut events);
        self.measure_congestion(sector, &mut events);
        self.scan(sector, observer, &mut events);
        events
    }

    /// Capture persisted state.
    pub fn snapshot(&self) -> TrafficSnapshot {
        TrafficSnapshot {
            ships: self.ships.values().cloned().collect(),
            patrol_routes: self.patrol_routes.values().cloned().collect(),
            trade_routes: self.trade_routes.values().cloned().collect(),
            congestion: self.congestion.clone(),
            last_ship: self.last_ship,
        }
    }

    /// Replace state from a snapshot and reseed the RNG stream for `tick`.
    pub fn restore(&mut self, snapshot: TrafficSnapshot, seed: u64, tick: u64) {
        self.ships = snapshot.ships.into_iter().map(|s| (s.id, s)).collect();
        self.patrol_routes = snapshot
            .patrol_routes
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();
        self.trade_routes = snapshot
            .trade_routes
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();
        self.congestion = snapshot.congestion;
        self.last_ship = snapshot.last_ship;
        self.rng = rng_stream(seed, RNG_SALT, tick);
    }

    // -----------------------------------------------------------------------
    // Tick phases
    // -----------------------------------------------------------------------

    fn make_ship(
        &mut self,
        ship_type: ShipType,
        sector: SectorId,
        position: Vec3,
        destination: Vec3,
        faction: Option<FactionId>,
    ) -> ShipTraffic {
        self.last_ship = self.last_ship.next();
        let speed = self.config.speed_of(ship_type);
        let mut ship = ShipTraffic {
            id: self.last_ship,
            ship_type,
            sector,
            position,
            velocity: Vec3::ZERO,
            destination,
            faction,
            speed,
            scan_range: self.config.scan_range,
            route: None,
            route_index: 0,
            holding: false,
        };
        ship.velocity = ship.heading() * speed;
        ship
    }

    /// Speed for this tick given the ship's distance to the observer.
    ///
    /// An emergency stop lasts one tick. The ship then creeps on at the
    /// avoidance speed, so it always clears the observer eventually.
    fn avoidance_speed(&self, ship: &ShipTraffic, sector: &SectorId, observer: Vec3) -> Option<f64> {
        if &ship.sector != sector {
            return Some(ship.speed);
        }
        let distance = ship.position.distance(observer);
        if distance <= self.config.emergency_distance && !ship.holding {
            None
        } else if distance <= self.config.avoidance_distance {
            Some(ship.speed * self.config.avoidance_factor)
        } else {
            Some(ship.speed)
        }
    }

    fn move_ships(
        &mut self,
        delta_hours: f64,
        sector: &SectorId,
        observer: Vec3,
        events: &mut Vec<EventRecord>,
    ) {
        let tolerance = self.config.arrival_tolerance;
        let speeds: Vec<(ShipId, Option<f64>)> = self
            .ships
            .values()
            .map(|ship| (ship.id, self.avoidance_speed(ship, sector, observer)))
            .collect();
        let mut arrived = Vec::new();

        for (id, speed) in speeds {
            let Some(ship) = self.ships.get_mut(&id) else {
                continue;
            };
            let Some(speed) = speed else {
                ship.holding = true;
                ship.velocity = Vec3::ZERO;
                continue;
            };
            ship.holding = false;
            ship.velocity = ship.heading() * speed;
            ship.position = ship.position.move_towards(ship.destination, speed * delta_hours);
            if ship.position.distance(ship.destination) > tolerance {
                continue;
            }
            let waypoints = ship
                .route
                .as_ref()
                .and_then(|route| self.patrol_routes.get(route))
                .map(|r| r.waypoints.as_slice())
                .filter(|w| !w.is_empty());
            match (ship.ship_type, waypoints) {
                (ShipType::Patrol, Some(waypoints)) => {
                    ship.route_index = (ship.route_index + 1) % waypoints.len();
                    ship.destination = waypoints[ship.route_index];
                    ship.velocity = ship.heading() * speed;
                }
                _ => arrived.push(ship.id),
            }
        }

        for id in arrived {
            if let Some(ship) = self.ships.remove(&id) {
                events.push(
                    EventRecord::new(WorldEventType::ShipArrived)
                        .with("ship_id", ship.id.0)
                        .with("ship_type", ship.ship_type.as_str())
                        .with("sector", ship.sector.as_str()),
                );
            }
        }
    }

    fn active_in(&self, sector: &SectorId) -> usize {
        self.ships.values().filter(|s| &s.sector == sector).count()
    }

    fn random_point(&mut self) -> Vec3 {
        let r = self.config.sector_radius;
        Vec3::new(
            self.rng.random_range(-r..=r),
            self.rng.random_range(-r..=r),
            0.0,
        )
    }

    fn spawn_trade(&mut self, delta_hours: f64, sector: &SectorId, events: &mut Vec<EventRecord>) {
        if self.active_in(sector) >= self.config.max_ships_per_sector {
            return;
        }
        if !roll(&mut self.rng, self.config.trade_density * delta_hours) {
            return;
        }

        let draw: f64 = self.rng.random();
        let (ship_type, event_type) = if draw < self.config.pirate_share {
            (ShipType::Pirate, WorldEventType::PirateSpawned)
        } else if draw < self.config.pirate_share + self.config.civilian_share {
            (ShipType::Civilian, WorldEventType::CivilianSpawned)
        } else {
            (ShipType::Trader, WorldEventType::TraderSpawned)
        };

        let lanes: Vec<&TradeRoute> = self
            .trade_routes
            .values()
            .filter(|r| &r.sector == sector)
            .collect();
        let lane = match lanes.choose_weighted(&mut self.rng, |r| r.density) {
            Ok(lane) => Some(*lane),
            Err(_) => lanes.choose(&mut self.rng).copied(),
        }
        .map(|r| (r.id.clone(), r.origin, r.destination));

        let (route, origin, destination) = match lane {
            Some((id, origin, destination)) => (Some(id), origin, destination),
            None => (None, self.random_point(), self.random_point()),
        };
        let ship = self.make_ship(ship_type, sector.clone(), origin, destination, None);
        let mut record = EventRecord::new(event_type)
            .with("ship_id", ship.id.0)
            .with("sector", sector.as_str())
            .with("x", origin.x)
            .with("y", origin.y)
            .with("z", origin.z);
        if let Some(route) = route {
            record = record.with("route", route.as_str());
        }
        events.push(record);
        self.ships.insert(ship.id, ship);
    }

    fn spawn_patrols(&mut self, delta_hours: f64, sector: &SectorId, events: &mut Vec<EventRecord>) {
        let routes: Vec<PatrolRoute> = self
            .patrol_routes
            .values()
            .filter(|r| &r.sector == sector)
            .cloned()
            .collect();
        for route in routes {
            if self.active_in(sector) >= self.config.max_ships_per_sector {
                return;
            }
            let chance = self.config.patrol_frequency * route.frequency * delta_hours;
            if !roll(&mut self.rng, chance) {
                continue;
            }
            let Some(&start) = route.waypoints.first() else {
                continue;
            };
            let index = 1 % route.waypoints.len();
            let mut ship = self.make_ship(
                ShipType::Patrol,
                sector.clone(),
                start,
                route.waypoints[index],
                Some(route.faction.clone()),
            );
            ship.route = Some(route.id.clone());
            ship.route_index = index;
            events.push(
                EventRecord::new(WorldEventType::PatrolSpawned)
                    .with("ship_id", ship.id.0)
                    .with("sector", sector.as_str())
                    .with("faction", route.faction.as_str())
                    .with("route", route.id.as_str()),
            );
            self.ships.insert(ship.id, ship);
        }
    }

    fn measure_congestion(&mut self, sector: &SectorId, events: &mut Vec<EventRecord>) {
        let active = self.active_in(sector);
        let congestion = UnitInterval::new(active as f64 / self.config.max_ships_per_sector as f64);
        self.congestion.insert(sector.clone(), congestion);
        if congestion.get() > self.config.congestion_threshold {
            events.push(
                EventRecord::new(WorldEventType::TrafficCongestion)
                    .with("sector", sector.as_str())
                    .with("congestion", congestion.get())
                    .with("ships", active as u64),
            );
        }
    }

    fn scan(&self, sector: &SectorId, observer: Vec3, events: &mut Vec<EventRecord>) {
        for ship in self.ships_in(sector) {
            if ship.ship_type != ShipType::Patrol {
                continue;
            }
            let distance = ship.position.distance(observer);
            if distance > ship.scan_range {
                continue;
            }
            let mut record = EventRecord::new(WorldEventType::PatrolScan)
                .with("ship_id", ship.id.0)
                .with("sector", sector.as_str())
                .with("distance", distance);
            if let Some(faction) = &ship.faction {
                record = record.with("faction", faction.as_str());
            }
            events.push(record);
        }
    }
}

impl Subsystem for TrafficSystem {
    fn name(&self) -> &'static str {
        "traffic"
    }

    fn update(&mut self, ctx: &TickContext<'_>) -> SimResult<Vec<EventRecord>> {
        Ok(self.tick(ctx.delta_hours, ctx.sector, ctx.observer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sector() -> SectorId {
        SectorId::new("meridian").unwrap()
    }

    fn still_config() -> TrafficConfig {
        TrafficConfig {
            trade_density: 0.0,
            patrol_frequency: 0.0,
            ..TrafficConfig::default()
        }
    }

    fn types(events: &[EventRecord]) -> Vec<WorldEventType> {
        events.iter().map(|e| e.event_type).collect()
    }

    #[test]
    fn ship_moves_without_overshooting_and_leaves_on_arrival() {
        let mut traffic = TrafficSystem::new(still_config(), 1);
        let far = Vec3::new(1000.0, 0.0, 0.0);
        let id = traffic.insert_ship(ShipType::Trader, sector(), Vec3::new(900.0, 0.0, 0.0), far, None);

        traffic.tick(1.0, &sector(), Vec3::new(-500.0, 0.0, 0.0));
        let x = traffic.ship(id).unwrap().position.x;
        assert!((x - 940.0).abs() < 1e-9);

        let mut arrived = false;
        for _ in 0..5 {
            let events = traffic.tick(1.0, &sector(), Vec3::new(-500.0, 0.0, 0.0));
            arrived |= types(&events).contains(&WorldEventType::ShipArrived);
        }
        assert!(arrived);
        assert!(traffic.ship(id).is_none());
    }

    #[test]
    fn patrol_wraps_waypoints() {
        let mut traffic = TrafficSystem::new(still_config(), 1);
        let route = PatrolRoute {
            id: RouteId::new("loop").unwrap(),
            faction: FactionId::new("Keepers").unwrap(),
            sector: sector(),
            waypoints: vec![Vec3::new(500.0, 0.0, 0.0), Vec3::new(560.0, 0.0, 0.0)],
            frequency: 1.0,
        };
        traffic.register_patrol_route(route).unwrap();
        let id = traffic.insert_ship(
            ShipType::Patrol,
            sector(),
            Vec3::new(500.0, 0.0, 0.0),
            Vec3::new(560.0, 0.0, 0.0),
            None,
        );
        if let Some(ship) = traffic.ships.get_mut(&id) {
            ship.route = Some(RouteId::new("loop").unwrap());
            ship.route_index = 1;
        }

        traffic.tick(1.0, &sector(), Vec3::new(-1000.0, 0.0, 0.0));
        let ship = traffic.ship(id).unwrap();
        assert_eq!(ship.route_index, 0);
        assert_eq!(ship.destination, Vec3::new(500.0, 0.0, 0.0));
    }

    #[test]
    fn empty_patrol_route_rejected() {
        let mut traffic = TrafficSystem::new(still_config(), 1);
        let route = PatrolRoute {
            id: RouteId::new("nowhere").unwrap(),
            faction: FactionId::new("Keepers").unwrap(),
            sector: sector(),
            waypoints: Vec::new(),
            frequency: 1.0,
        };
        assert!(matches!(
            traffic.register_patrol_route(route),
            Err(SimError::EmptyRoute(_))
        ));
    }

    #[test]
    fn avoidance_bands() {
        let mut traffic = TrafficSystem::new(still_config(), 1);
        let dest = Vec3::new(0.0, 1000.0, 0.0);
        let near = traffic.insert_ship(ShipType::Trader, sector(), Vec3::new(10.0, 0.0, 0.0), dest, None);
        let mid = traffic.insert_ship(ShipType::Trader, sector(), Vec3::new(50.0, 0.0, 0.0), dest, None);
        let far = traffic.insert_ship(ShipType::Trader, sector(), Vec3::new(500.0, 0.0, 0.0), dest, None);

        traffic.tick(0.0, &sector(), Vec3::ZERO);
        assert_eq!(traffic.ship(near).unwrap().velocity.length(), 0.0);
        assert!((traffic.ship(mid).unwrap().velocity.length() - 20.0).abs() < 1e-9);
        assert!((traffic.ship(far).unwrap().velocity.length() - 40.0).abs() < 1e-9);

        traffic.tick(0.0, &sector(), Vec3::ZERO);
        let near = traffic.ship(near).unwrap();
        assert!(!near.holding);
        assert!((near.velocity.length() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn ship_crossing_the_observer_still_arrives() {
        let mut traffic = TrafficSystem::new(still_config(), 1);
        let id = traffic.insert_ship(
            ShipType::Trader,
            sector(),
            Vec3::new(-200.0, 0.0, 0.0),
            Vec3::new(200.0, 0.0, 0.0),
            None,
        );

        let mut held = false;
        let mut arrived = false;
        for _ in 0..1000 {
            let events = traffic.tick(0.25, &sector(), Vec3::ZERO);
            held |= traffic.ship(id).is_some_and(|s| s.holding);
            if types(&events).contains(&WorldEventType::ShipArrived) {
                arrived = true;
                break;
            }
        }
        assert!(held);
        assert!(arrived);
        assert!(traffic.ship(id).is_none());
    }

    #[test]
    fn ships_outside_the_ticked_sector_cruise() {
        let mut traffic = TrafficSystem::new(still_config(), 1);
        let elsewhere = SectorId::new("cinder").unwrap();
        let id = traffic.insert_ship(
            ShipType::Trader,
            elsewhere,
            Vec3::new(5.0, 0.0, 0.0),
            Vec3::new(1000.0, 0.0, 0.0),
            None,
        );

        traffic.tick(1.0, &sector(), Vec3::ZERO);
        let ship = traffic.ship(id).unwrap();
        assert!((ship.position.x - 45.0).abs() < 1e-9);
        assert!(!ship.holding);
    }

    #[test]
    fn congestion_is_ratio_clamped_to_one() {
        for count in [0usize, 5, 16, 20, 25] {
            let mut traffic = TrafficSystem::new(still_config(), 1);
            for i in 0..count {
                traffic.insert_ship(
                    ShipType::Civilian,
                    sector(),
                    Vec3::new(1500.0, i as f64, 0.0),
                    Vec3::new(-1500.0, i as f64, 0.0),
                    None,
                );
            }
            let events = traffic.tick(0.01, &sector(), Vec3::ZERO);
            let expected = (count as f64 / 20.0).min(1.0);
            assert_eq!(traffic.congestion(&sector()), expected);
            assert_eq!(
                types(&events).contains(&WorldEventType::TrafficCongestion),
                expected > 0.8
            );
        }
        let traffic = TrafficSystem::new(still_config(), 1);
        assert_eq!(traffic.congestion(&sector()), 0.0);
    }

    #[test]
    fn spawning_respects_sector_cap() {
        let config = TrafficConfig {
            trade_density: 100.0,
            max_ships_per_sector: 4,
            ..TrafficConfig::default()
        };
        let mut traffic = TrafficSystem::new(config, 3);
        for _ in 0..50 {
            traffic.tick(0.01, &sector(), Vec3::new(5000.0, 5000.0, 0.0));
            assert!(traffic.ships_in(&sector()).count() <= 4);
        }
        assert_eq!(traffic.ships_in(&sector()).count(), 4);
    }

    #[test]
    fn trade_spawns_follow_registered_lane() {
        let config = TrafficConfig {
            trade_density: 100.0,
            civilian_share: 0.0,
            pirate_share: 0.0,
            ..TrafficConfig::default()
        };
        let mut traffic = TrafficSystem::new(config, 3);
        traffic.register_trade_route(TradeRoute {
            id: RouteId::new("spice-run").unwrap(),
            sector: sector(),
            origin: Vec3::new(-1000.0, 0.0, 0.0),
            destination: Vec3::new(1000.0, 0.0, 0.0),
            density: 1.0,
        });
        let events = traffic.tick(0.1, &sector(), Vec3::new(0.0, 5000.0, 0.0));
        let spawn = events
            .iter()
            .find(|e| e.event_type == WorldEventType::TraderSpawned)
            .unwrap();
        assert_eq!(spawn.data["route"], "spice-run");
        assert_eq!(spawn.data["x"], -1000.0);
    }

    #[test]
    fn patrol_in_range_scans_observer() {
        let mut traffic = TrafficSystem::new(still_config(), 1);
        traffic.insert_ship(
            ShipType::Patrol,
            sector(),
            Vec3::new(100.0, 0.0, 0.0),
            Vec3::new(100.0, 900.0, 0.0),
            Some(FactionId::new("Keepers").unwrap()),
        );
        let events = traffic.tick(0.01, &sector(), Vec3::ZERO);
        let scan = events
            .iter()
            .find(|e| e.event_type == WorldEventType::PatrolScan)
            .unwrap();
        assert_eq!(scan.data["faction"], "Keepers");
    }

    #[test]
    fn snapshot_round_trip() {
        let config = TrafficConfig {
            trade_density: 50.0,
            ..TrafficConfig::default()
        };
        let mut traffic = TrafficSystem::new(config.clone(), 5);
        traffic.tick(0.5, &sector(), Vec3::ZERO);
        let snapshot = traffic.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();

        let mut restored = TrafficSystem::new(config, 5);
        restored.restore(serde_json::from_str(&json).unwrap(), 5, 2);
        assert_eq!(restored.snapshot(), snapshot);
    }
}
