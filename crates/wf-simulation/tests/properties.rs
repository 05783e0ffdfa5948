use std::collections::BTreeMap;

use proptest::prelude::*;
use wf_core::{CrimeType, FactionId, LawConfig, SectorId, ShipType, TrafficConfig, Vec3};
use wf_simulation::{EscalationLevel, LawSystem, PlayerState, TrafficSystem};

#[derive(Debug, Clone)]
enum LawOp {
    Report {
        crime: usize,
        severity: u8,
        factions: Vec<usize>,
    },
    Tick(f64),
    Clear {
        faction: usize,
        amount: f64,
    },
}

const FACTIONS: [&str; 3] = ["Keepers", "Ashen Compact", "Drift Union"];

fn faction(index: usize) -> FactionId {
    FactionId::new(FACTIONS[index % FACTIONS.len()]).unwrap()
}

fn law_op() -> impl Strategy<Value = LawOp> {
    prop_oneof![
        (0..CrimeType::ALL.len(), 1u8..=5, prop::collection::vec(0..3usize, 1..3)).prop_map(
            |(crime, severity, factions)| LawOp::Report {
                crime,
                severity,
                factions,
            }
        ),
        (0.0f64..3.0).prop_map(LawOp::Tick),
        (0..3usize, 0.0f64..0.5).prop_map(|(faction, amount)| LawOp::Clear { faction, amount }),
    ]
}

proptest! {
    #[test]
    fn suspicion_stays_in_unit_interval(
        seed in 0u64..1_000,
        ops in prop::collection::vec(law_op(), 1..60),
    ) {
        let mut law = LawSystem::new(LawConfig::default(), seed);
        let sector = SectorId::new("meridian").unwrap();
        let player = PlayerState::default();
        for op in ops {
            match op {
                LawOp::Report { crime, severity, factions } => {
                    law.report_crime(
                        CrimeType::ALL[crime],
                        severity,
                        sector.clone(),
                        vec!["witness".into()],
                        factions.into_iter().map(faction).collect(),
                    )
                    .unwrap();
                }
                LawOp::Tick(delta) => {
                    law.tick(delta, &player);
                }
                LawOp::Clear { faction: index, amount } => {
                    let left = law.clear_suspicion(&faction(index), amount);
                    prop_assert!((0.0..=1.0).contains(&left));
                }
            }
            for level in law.suspicion_levels().values() {
                prop_assert!((0.0..=1.0).contains(&level.get()));
            }
        }
    }

    #[test]
    fn pursuits_never_deescalate(
        seed in 0u64..1_000,
        ops in prop::collection::vec(law_op(), 1..80),
    ) {
        let mut law = LawSystem::new(LawConfig::default(), seed);
        let sector = SectorId::new("meridian").unwrap();
        let player = PlayerState::default();
        let mut seen: BTreeMap<FactionId, (f64, EscalationLevel, bool)> = BTreeMap::new();
        for op in ops {
            match op {
                LawOp::Report { crime, severity, factions } => {
                    law.report_crime(
                        CrimeType::ALL[crime],
                        severity,
                        sector.clone(),
                        Vec::new(),
                        factions.into_iter().map(faction).collect(),
                    )
                    .unwrap();
                }
                LawOp::Tick(delta) => {
                    law.tick(delta, &player);
                }
                LawOp::Clear { faction: index, amount } => {
                    law.clear_suspicion(&faction(index), amount);
                }
            }
            for pursuit in law.pursuits() {
                if let Some((started, escalation, blockade)) = seen.get(&pursuit.faction) {
                    if started.to_bits() == pursuit.started_at.to_bits() {
                        prop_assert!(pursuit.escalation >= *escalation);
                        prop_assert!(pursuit.blockade || !*blockade);
                    }
                }
                prop_assert!(pursuit.ships >= 1);
                seen.insert(
                    pursuit.faction.clone(),
                    (pursuit.started_at, pursuit.escalation, pursuit.blockade),
                );
            }
        }
    }

    #[test]
    fn congestion_is_ship_count_over_cap(ships in 0usize..60, cap in 1usize..30) {
        let config = TrafficConfig {
            max_ships_per_sector: cap,
            trade_density: 0.0,
            ..TrafficConfig::default()
        };
        let mut traffic = TrafficSystem::new(config, 1);
        let sector = SectorId::new("meridian").unwrap();
        for i in 0..ships {
            let y = i as f64 * 5.0;
            traffic.insert_ship(
                ShipType::Trader,
                sector.clone(),
                Vec3::new(500.0, y, 0.0),
                Vec3::new(1800.0, y, 0.0),
                None,
            );
        }
        traffic.tick(0.25, &sector, Vec3::ZERO);
        let expected = (ships as f64 / cap as f64).min(1.0);
        prop_assert_eq!(traffic.congestion(&sector), expected);
    }
}
