use citygrid_common::BuildingTier;

/// Chance per tile per tick that its building grows one tier.
pub const DEFAULT_GROWTH_PROBABILITY: f64 = 0.01;

/// Next tier of a single tile given one uniform sample in `[0, 1)`.
///
/// The tile grows one step when `sample < probability`: absent becomes
/// `Tier1`, `Tier1` becomes `Tier2`, `Tier2` becomes `Tier3`. `Tier3` is
/// terminal. Any other sample leaves the tier unchanged.
pub fn advance(
    current: Option<BuildingTier>,
    sample: f64,
    probability: f64,
) -> Option<BuildingTier> {
    if sample >= probability {
        return current;
    }
    match current {
        None => Some(BuildingTier::Tier1),
        Some(tier) => Some(tier.next().unwrap_or(tier)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn successful_draw_grows_one_step() {
        assert_eq!(advance(None, 0.0, 0.01), Some(BuildingTier::Tier1));
        assert_eq!(
            advance(Some(BuildingTier::Tier1), 0.005, 0.01),
            Some(BuildingTier::Tier2)
        );
        assert_eq!(
            advance(Some(BuildingTier::Tier2), 0.009, 0.01),
            Some(BuildingTier::Tier3)
        );
    }

    #[test]
    fn tier3_is_terminal() {
        assert_eq!(
            advance(Some(BuildingTier::Tier3), 0.0, 1.0),
            Some(BuildingTier::Tier3)
        );
    }

    #[test]
    fn sample_at_threshold_does_not_grow() {
        assert_eq!(advance(None, 0.01, 0.01), None);
        assert_eq!(
            advance(Some(BuildingTier::Tier1), 0.5, 0.01),
            Some(BuildingTier::Tier1)
        );
    }

    #[test]
    fn zero_probability_never_grows() {
        assert_eq!(advance(None, 0.0, 0.0), None);
    }

    fn tier_strategy() -> impl Strategy<Value = Option<BuildingTier>> {
        prop_oneof![
            Just(None),
            Just(Some(BuildingTier::Tier1)),
            Just(Some(BuildingTier::Tier2)),
            Just(Some(BuildingTier::Tier3)),
        ]
    }

    proptest! {
        #[test]
        fn never_regresses_or_skips(
            current in tier_strategy(),
            sample in 0.0f64..1.0,
            probability in 0.0f64..=1.0,
        ) {
            let next = advance(current, sample, probability);
            // Option<BuildingTier> orders None below every tier.
            prop_assert!(next >= current);
            let level = |t: Option<BuildingTier>| t.map_or(0, BuildingTier::level);
            prop_assert!(level(next) - level(current) <= 1);
        }

        #[test]
        fn repeated_steps_follow_the_tier_sequence(
            samples in proptest::collection::vec(0.0f64..1.0, 0..200),
        ) {
            let mut tier = None;
            for sample in samples {
                let next = advance(tier, sample, 0.3);
                let expected = match tier {
                    None => Some(BuildingTier::Tier1),
                    Some(t) => Some(t.next().unwrap_or(t)),
                };
                prop_assert!(next == tier || next == expected);
                tier = next;
            }
        }
    }
}
