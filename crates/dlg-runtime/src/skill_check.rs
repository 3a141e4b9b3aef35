use dlg_core::{
    compare_outcome, compare_values, ComparisonType, DlgValue, SkillCheckInfo, SkillCheckNode,
    SkillCheckTarget, SkillCheckType,
};

use crate::config::DialogueConfig;
use crate::host::CharacterStats;
use crate::rng::next_random_unit;

/// Resolves hard and soft skill checks against a character.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillCheckResolver {
    difficulty: f64,
    clamp_pass_chance: bool,
}

impl Default for SkillCheckResolver {
    fn default() -> Self {
        Self {
            difficulty: 1.0,
            clamp_pass_chance: true,
        }
    }
}

impl SkillCheckResolver {
    pub fn new(difficulty: f64, clamp_pass_chance: bool) -> Self {
        Self {
            difficulty,
            clamp_pass_chance,
        }
    }

    pub fn from_config(config: &DialogueConfig) -> Self {
        Self::new(config.skill_check_difficulty, config.clamp_pass_chance)
    }

    /// The node's value scaled by the difficulty multiplier.
    pub fn threshold(&self, node: &SkillCheckNode) -> f64 {
        node.value * self.difficulty
    }

    /// Missing targets read as zero.
    pub fn target_value<S: CharacterStats + ?Sized>(&self, node: &SkillCheckNode, stats: &S) -> f64 {
        let value = match node.target_type {
            SkillCheckTarget::Stat => stats.stat(&node.target),
            SkillCheckTarget::Skill => stats.skill(&node.target),
            SkillCheckTarget::ActorValue => stats.actor_value_number(&node.target),
        };
        value.unwrap_or(0.0)
    }

    fn passes_outright(&self, node: &SkillCheckNode, value: f64) -> bool {
        compare_values(&DlgValue::Number(value), &DlgValue::Number(self.threshold(node)))
            .map(|ordering| compare_outcome(ordering, node.comparison))
            .unwrap_or(false)
    }

    /// Ratio of how close `value` is to passing. Unclamped; may be above 1,
    /// infinite or NaN for non-positive operands.
    pub fn raw_pass_ratio(&self, node: &SkillCheckNode, value: f64) -> f64 {
        let threshold = self.threshold(node);
        match node.comparison {
            ComparisonType::Less | ComparisonType::LessEqual => threshold / value,
            ComparisonType::Equal => {
                let (low, high) = if value <= threshold {
                    (value, threshold)
                } else {
                    (threshold, value)
                };
                low / high
            }
            _ => value / threshold,
        }
    }

    fn chance_from_ratio(&self, ratio: f64) -> f64 {
        if !self.clamp_pass_chance {
            return ratio;
        }
        if !ratio.is_finite() || ratio <= 0.0 {
            0.0
        } else {
            ratio.min(1.0)
        }
    }

    /// Chance a check succeeds, without sampling. Outright passes are `1`.
    pub fn approximate_pass_chance<S: CharacterStats + ?Sized>(
        &self,
        node: &SkillCheckNode,
        stats: &S,
    ) -> f64 {
        let value = self.target_value(node, stats);
        if self.passes_outright(node, value) {
            return 1.0;
        }
        match node.check_type {
            SkillCheckType::Hard => 0.0,
            SkillCheckType::Soft => self.chance_from_ratio(self.raw_pass_ratio(node, value)),
        }
    }

    /// Hard checks are possible when they pass; soft checks when the target
    /// value is positive.
    pub fn check_if_possible<S: CharacterStats + ?Sized>(&self, node: &SkillCheckNode, stats: &S) -> bool {
        let value = self.target_value(node, stats);
        match node.check_type {
            SkillCheckType::Hard => self.passes_outright(node, value),
            SkillCheckType::Soft => value > 0.0,
        }
    }

    /// Resolves the check, drawing one sample from `rng_state` only when a
    /// soft check does not pass outright.
    pub fn check<S: CharacterStats + ?Sized>(
        &self,
        node: &SkillCheckNode,
        stats: &S,
        rng_state: &mut u32,
    ) -> bool {
        let value = self.target_value(node, stats);
        if self.passes_outright(node, value) {
            return true;
        }
        match node.check_type {
            SkillCheckType::Hard => false,
            SkillCheckType::Soft => {
                let chance = self.chance_from_ratio(self.raw_pass_ratio(node, value));
                let sample = next_random_unit(rng_state);
                chance > 0.0 && sample <= chance
            }
        }
    }

    pub fn evaluate_skill_check<'a, S: CharacterStats + ?Sized>(
        &self,
        node: &'a SkillCheckNode,
        stats: &S,
        rng_state: &mut u32,
    ) -> &'a str {
        if self.check(node, stats, rng_state) {
            log::debug!("[dialogue] skill check on \"{}\" passed", node.target);
            &node.pass_next
        } else {
            log::debug!("[dialogue] skill check on \"{}\" failed", node.target);
            &node.fail_next
        }
    }

    pub fn info<S: CharacterStats + ?Sized>(&self, node: &SkillCheckNode, stats: &S) -> SkillCheckInfo {
        SkillCheckInfo {
            check_type: node.check_type,
            possible: self.check_if_possible(node, stats),
            pass_chance: match node.check_type {
                SkillCheckType::Soft => Some(self.approximate_pass_chance(node, stats)),
                SkillCheckType::Hard => None,
            },
        }
    }

    /// `[Soft Skill Persuasion 40 ~75%] text`.
    pub fn decorate_choice_text<S: CharacterStats + ?Sized>(
        &self,
        node: &SkillCheckNode,
        stats: &S,
        text: &str,
    ) -> String {
        if !node.append_check_text {
            return text.to_string();
        }
        let kind = match node.check_type {
            SkillCheckType::Hard => "Hard",
            SkillCheckType::Soft => "Soft",
        };
        let comparison = match node.comparison {
            ComparisonType::GreaterEqual => String::new(),
            other => format!("{} ", other.symbol()),
        };
        let mut label = format!(
            "[{} {} {} {}{}",
            kind,
            node.target_type.label(),
            node.target,
            comparison,
            DlgValue::Number(self.threshold(node)).to_text()
        );
        if node.check_type == SkillCheckType::Soft {
            let chance = self.approximate_pass_chance(node, stats);
            if chance.is_finite() {
                label.push_str(&format!(" ~{}%", (chance * 100.0).round() as i64));
            }
        }
        label.push(']');
        if text.is_empty() {
            label
        } else {
            format!("{} {}", label, text)
        }
    }
}

#[cfg(test)]
mod skill_check_tests {
    use super::*;

    struct Stats {
        skill: Option<f64>,
    }

    impl CharacterStats for Stats {
        fn stat(&self, _name: &str) -> Option<f64> {
            None
        }

        fn skill(&self, _name: &str) -> Option<f64> {
            self.skill
        }

        fn actor_value_number(&self, _name: &str) -> Option<f64> {
            None
        }
    }

    fn node(check_type: SkillCheckType, comparison: ComparisonType, value: f64) -> SkillCheckNode {
        SkillCheckNode {
            check_type,
            comparison,
            target_type: SkillCheckTarget::Skill,
            target: "Persuasion".to_string(),
            value,
            pass_next: "pass".to_string(),
            fail_next: "fail".to_string(),
            append_check_text: true,
        }
    }

    #[test]
    fn hard_checks_are_deterministic_and_possible_iff_passing() {
        let resolver = SkillCheckResolver::default();
        let check = node(SkillCheckType::Hard, ComparisonType::GreaterEqual, 40.0);
        let mut rng = 1u32;
        let strong = Stats { skill: Some(40.0) };
        let weak = Stats { skill: Some(39.0) };
        assert!(resolver.check(&check, &strong, &mut rng));
        assert!(!resolver.check(&check, &weak, &mut rng));
        assert_eq!(resolver.check_if_possible(&check, &weak), resolver.check(&check, &weak, &mut rng));
        assert_eq!(resolver.evaluate_skill_check(&check, &strong, &mut rng), "pass");
        assert_eq!(resolver.evaluate_skill_check(&check, &weak, &mut rng), "fail");
        assert_eq!(resolver.approximate_pass_chance(&check, &weak), 0.0);
    }

    #[test]
    fn soft_check_at_threshold_passes_without_sampling() {
        let resolver = SkillCheckResolver::default();
        let check = node(SkillCheckType::Soft, ComparisonType::GreaterEqual, 40.0);
        let mut rng = 99u32;
        assert!(resolver.check(&check, &Stats { skill: Some(40.0) }, &mut rng));
        assert_eq!(rng, 99, "no sample drawn");
    }

    #[test]
    fn soft_check_pass_rate_tracks_ratio() {
        let resolver = SkillCheckResolver::default();
        let check = node(SkillCheckType::Soft, ComparisonType::Greater, 40.0);
        let stats = Stats { skill: Some(30.0) };
        let expected = 30.0 / 40.0;
        assert!((resolver.approximate_pass_chance(&check, &stats) - expected).abs() < 1e-9);

        let mut rng = 12345u32;
        let trials = 10_000;
        let passes = (0..trials)
            .filter(|_| resolver.check(&check, &stats, &mut rng))
            .count();
        let rate = passes as f64 / trials as f64;
        assert!((rate - expected).abs() < 0.03, "rate {} vs {}", rate, expected);
    }

    #[test]
    fn inverse_ratio_for_less_comparisons() {
        let resolver = SkillCheckResolver::default();
        let check = node(SkillCheckType::Soft, ComparisonType::Less, 20.0);
        let stats = Stats { skill: Some(40.0) };
        assert!((resolver.approximate_pass_chance(&check, &stats) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn pass_chance_clamp_decision_is_pinned() {
        let clamped = SkillCheckResolver::default();
        let raw = SkillCheckResolver::new(1.0, false);
        let zero = Stats { skill: Some(0.0) };
        let missing = Stats { skill: None };

        let less = node(SkillCheckType::Soft, ComparisonType::Less, 10.0);
        assert!(raw.raw_pass_ratio(&less, 0.0).is_infinite());
        assert_eq!(raw.approximate_pass_chance(&less, &Stats { skill: Some(20.0) }), 0.5);
        let outright = raw.approximate_pass_chance(&less, &Stats { skill: Some(5.0) });
        assert_eq!(outright, 1.0);

        let greater = node(SkillCheckType::Soft, ComparisonType::Greater, 10.0);
        assert_eq!(raw.approximate_pass_chance(&greater, &Stats { skill: Some(10.0) }), 1.0);
        assert_eq!(clamped.approximate_pass_chance(&greater, &zero), 0.0);
        assert!(!clamped.check_if_possible(&greater, &missing));

        let negative_threshold = node(SkillCheckType::Soft, ComparisonType::Equal, -5.0);
        assert_eq!(
            clamped.approximate_pass_chance(&negative_threshold, &Stats { skill: Some(5.0) }),
            0.0
        );
        let mut rng = 3u32;
        assert!(!clamped.check(&greater, &zero, &mut rng));
    }

    #[test]
    fn difficulty_scales_threshold() {
        let resolver = SkillCheckResolver::new(2.0, true);
        let check = node(SkillCheckType::Hard, ComparisonType::GreaterEqual, 20.0);
        let mut rng = 1u32;
        assert!(!resolver.check(&check, &Stats { skill: Some(30.0) }, &mut rng));
        assert!(resolver.check(&check, &Stats { skill: Some(40.0) }, &mut rng));
    }

    #[test]
    fn choice_text_decoration() {
        let resolver = SkillCheckResolver::default();
        let stats = Stats { skill: Some(30.0) };
        let soft = node(SkillCheckType::Soft, ComparisonType::GreaterEqual, 40.0);
        assert_eq!(
            resolver.decorate_choice_text(&soft, &stats, "Talk him down."),
            "[Soft Skill Persuasion 40 ~75%] Talk him down."
        );
        let mut hard = node(SkillCheckType::Hard, ComparisonType::Greater, 5.0);
        hard.target_type = SkillCheckTarget::Stat;
        hard.target = "Strength".to_string();
        assert_eq!(
            resolver.decorate_choice_text(&hard, &stats, "Shove."),
            "[Hard Stat Strength > 5] Shove."
        );
        hard.append_check_text = false;
        assert_eq!(resolver.decorate_choice_text(&hard, &stats, "Shove."), "Shove.");
    }
}
