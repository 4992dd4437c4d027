#[derive(Debug, Clone, PartialEq)]
pub struct Tier {
    pub threshold: i64,
    pub name: &'static str,
    pub body_color: [u8; 3],
    pub head_color: [u8; 3],
    pub patterns: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionTable {
    tiers: Vec<Tier>,
}

impl Default for EvolutionTable {
    fn default() -> Self {
        fn tier(
            threshold: i64,
            name: &'static str,
            body_color: [u8; 3],
            head_color: [u8; 3],
            patterns: &'static [&'static str],
        ) -> Tier {
            Tier {
                threshold,
                name,
                body_color,
                head_color,
                patterns,
            }
        }
        Self {
            tiers: vec![
                tier(0, "hatchling", [24, 128, 56], [21, 115, 50], &[]),
                tier(10, "azure", [30, 144, 255], [25, 125, 225], &["scales"]),
                tier(15, "ember", [255, 69, 0], [220, 53, 34], &["scales", "fire"]),
                tier(
                    20,
                    "gilded",
                    [218, 165, 32],
                    [184, 134, 11],
                    &["scales", "fire", "golden_scales"],
                ),
                tier(
                    30,
                    "mystic",
                    [138, 43, 226],
                    [106, 90, 205],
                    &["scales", "fire", "golden_scales", "textile"],
                ),
                tier(
                    35,
                    "winged",
                    [255, 215, 0],
                    [218, 165, 32],
                    &["scales", "fire", "golden_scales", "textile", "wings"],
                ),
                tier(
                    40,
                    "clawed",
                    [70, 130, 180],
                    [95, 158, 160],
                    &["scales", "fire", "golden_scales", "textile", "wings", "feet"],
                ),
                tier(
                    45,
                    "dragon",
                    [178, 34, 34],
                    [139, 0, 0],
                    &["scales", "fire", "golden_scales", "textile", "wings", "feet", "dragon"],
                ),
            ],
        }
    }
}

impl EvolutionTable {
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn tier(&self, index: usize) -> Option<&Tier> {
        self.tiers.get(index)
    }

    pub fn name(&self, index: usize) -> &'static str {
        self.tier(index).map(|tier| tier.name).unwrap_or("unknown")
    }

    pub fn top(&self) -> usize {
        self.tiers.len().saturating_sub(1)
    }

    pub fn tier_for(&self, score: i64) -> usize {
        self.tiers
            .iter()
            .rposition(|tier| score >= tier.threshold)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvolutionStep {
    pub evolved_to: Option<usize>,
    pub reached_top: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Evolution {
    previous_tier: usize,
    top_bonus_awarded: bool,
}

impl Evolution {
    pub fn current(&self) -> usize {
        self.previous_tier
    }

    // Re-evaluates the tier for `score`. Reports a transition only when the
    // selected tier differs from the stored one. The top-tier bonus fires
    // once per run.
    pub fn observe(
        &mut self,
        score: i64,
        table: &EvolutionTable,
        allow_regression: bool,
    ) -> EvolutionStep {
        let mut tier = table.tier_for(score);
        if !allow_regression {
            tier = tier.max(self.previous_tier);
        }
        if tier == self.previous_tier {
            return EvolutionStep {
                evolved_to: None,
                reached_top: false,
            };
        }
        self.previous_tier = tier;
        let reached_top = tier == table.top() && !self.top_bonus_awarded;
        if reached_top {
            self.top_bonus_awarded = true;
        }
        EvolutionStep {
            evolved_to: Some(tier),
            reached_top,
        }
    }
}
