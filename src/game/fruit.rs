use super::constants::{HAZARD_LIFETIME_TICKS, SPEED_EFFECT_TICKS};
use super::types::FruitKind;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedEffect {
    pub factor: f64,
    pub ticks: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FruitProfile {
    pub kind: FruitKind,
    pub points: i64,
    pub growth: u32,
    pub weight: f64,
    pub speed_effect: Option<SpeedEffect>,
    pub lifetime: Option<u32>,
    pub hazard: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FruitTable {
    profiles: Vec<FruitProfile>,
}

impl Default for FruitTable {
    fn default() -> Self {
        let regular = |kind, points: i64, weight| FruitProfile {
            kind,
            points,
            growth: points as u32,
            weight,
            speed_effect: None,
            lifetime: None,
            hazard: false,
        };
        Self {
            profiles: vec![
                regular(FruitKind::Apple, 1, 0.35),
                regular(FruitKind::Banana, 2, 0.15),
                regular(FruitKind::Orange, 3, 0.15),
                regular(FruitKind::Berry, 5, 0.10),
                regular(FruitKind::Kiwi, 4, 0.10),
                FruitProfile {
                    speed_effect: Some(SpeedEffect {
                        factor: 0.5,
                        ticks: SPEED_EFFECT_TICKS,
                    }),
                    ..regular(FruitKind::IceCream, 6, 0.15)
                },
                FruitProfile {
                    kind: FruitKind::Poison,
                    points: -3,
                    growth: 0,
                    weight: 0.0,
                    speed_effect: None,
                    lifetime: Some(HAZARD_LIFETIME_TICKS),
                    hazard: true,
                },
            ],
        }
    }
}

impl FruitTable {
    pub fn profile(&self, kind: FruitKind) -> FruitProfile {
        self.profiles
            .iter()
            .copied()
            .find(|profile| profile.kind == kind)
            .unwrap_or(FruitProfile {
                kind,
                points: 0,
                growth: 0,
                weight: 0.0,
                speed_effect: None,
                lifetime: None,
                hazard: false,
            })
    }

    #[cfg(test)]
    pub fn set(&mut self, profile: FruitProfile) {
        match self.profiles.iter_mut().find(|entry| entry.kind == profile.kind) {
            Some(entry) => *entry = profile,
            None => self.profiles.push(profile),
        }
    }

    pub fn hazard_kind(&self) -> Option<FruitKind> {
        self.profiles
            .iter()
            .find(|profile| profile.hazard)
            .map(|profile| profile.kind)
    }

    pub fn special_kind(&self) -> FruitKind {
        self.profiles
            .iter()
            .filter(|profile| !profile.hazard)
            .max_by_key(|profile| profile.points)
            .map(|profile| profile.kind)
            .unwrap_or(FruitKind::IceCream)
    }

    pub fn pick_regular<R: Rng>(&self, rng: &mut R) -> FruitKind {
        let candidates: Vec<&FruitProfile> = self
            .profiles
            .iter()
            .filter(|profile| !profile.hazard && profile.weight > 0.0)
            .collect();
        let Ok(distribution) = WeightedIndex::new(candidates.iter().map(|profile| profile.weight))
        else {
            return FruitKind::Apple;
        };
        candidates[distribution.sample(rng)].kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn regular_draw_never_yields_hazard() {
        let table = FruitTable::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            assert_ne!(table.pick_regular(&mut rng), FruitKind::Poison);
        }
    }

    #[test]
    fn regular_draw_favours_apples() {
        let table = FruitTable::default();
        let mut rng = StdRng::seed_from_u64(11);
        let apples = (0..2000)
            .filter(|_| table.pick_regular(&mut rng) == FruitKind::Apple)
            .count();
        assert!(apples > 550 && apples < 850, "apples drawn: {apples}");
    }

    #[test]
    fn default_table_matches_fruit_effects() {
        let table = FruitTable::default();
        assert_eq!(table.hazard_kind(), Some(FruitKind::Poison));
        assert_eq!(table.special_kind(), FruitKind::IceCream);
        let ice = table.profile(FruitKind::IceCream);
        assert_eq!(ice.points, 6);
        assert_eq!(ice.speed_effect.map(|effect| effect.factor), Some(0.5));
        let poison = table.profile(FruitKind::Poison);
        assert!(poison.hazard);
        assert!(poison.points < 0);
        assert_eq!(poison.lifetime, Some(HAZARD_LIFETIME_TICKS));
    }

    #[test]
    fn set_overrides_existing_profile() {
        let mut table = FruitTable::default();
        let mut poison = table.profile(FruitKind::Poison);
        poison.points = -2;
        table.set(poison);
        assert_eq!(table.profile(FruitKind::Poison).points, -2);
    }
}
