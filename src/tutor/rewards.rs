//! Reward policies: how a completed turn moves the student's progress.

use serde::{Deserialize, Serialize};

use crate::db::{Progress, MAX_FOCUS_SCORE};

pub const FOCUS_REWARD: i32 = 5;
pub const OFF_TASK_PENALTY: i32 = -10;

pub const QUESTION_EXP: u32 = 10;
pub const VISION_BASE_EXP: u32 = 20;
pub const VISION_CORRECT_EXP: u32 = 30;
pub const SIMILAR_PROBLEM_EXP: u32 = 10;
pub const REVIEW_QUIZ_EXP: u32 = 20;

const FOCUSED_MARKERS: [&str; 3] = ["focused", "studying", "학습"];
const DISENGAGED_MARKERS: [&str; 4] = ["off-task", "off task", "disengaged", "이탈"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RewardPolicy {
    /// Focus score in [0, 100] nudged by the reply status.
    ScoreDelta,
    /// Fixed exp per completed action with level thresholds of `level * 100`.
    ExperienceLevel,
}

/// What happens when exp reaches the level threshold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LevelRollover {
    /// Keep leveling until exp is below the current threshold.
    Cascade,
    /// At most one level per turn; exp may stay above the new threshold.
    SingleStep,
}

impl std::str::FromStr for RewardPolicy {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "score" | "scoredelta" | "score-delta" => Ok(RewardPolicy::ScoreDelta),
            "exp" | "experiencelevel" | "experience-level" => Ok(RewardPolicy::ExperienceLevel),
            other => Err(anyhow::anyhow!("unknown reward policy '{other}'")),
        }
    }
}

impl std::str::FromStr for LevelRollover {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cascade" => Ok(LevelRollover::Cascade),
            "single" | "singlestep" | "single-step" => Ok(LevelRollover::SingleStep),
            other => Err(anyhow::anyhow!("unknown level rollover '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnAction<'a> {
    Question { status: &'a str, off_topic: bool },
    Vision { correct: usize },
    SimilarProblems { count: u8 },
    ReviewQuiz,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LevelUp {
    pub from: u32,
    pub to: u32,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutcome {
    pub progress: Progress,
    /// Applied change to the focus score, after clamping.
    pub score_delta: i32,
    pub exp_awarded: u32,
    pub level_up: Option<LevelUp>,
}

fn contains_any(status: &str, markers: &[&str]) -> bool {
    let lowered = status.to_lowercase();
    markers.iter().any(|marker| lowered.contains(marker))
}

pub fn is_disengaged_status(status: &str) -> bool {
    contains_any(status, &DISENGAGED_MARKERS)
}

pub fn is_focused_status(status: &str) -> bool {
    !is_disengaged_status(status) && contains_any(status, &FOCUSED_MARKERS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalAggregator {
    policy: RewardPolicy,
    rollover: LevelRollover,
}

impl SignalAggregator {
    pub fn new(policy: RewardPolicy, rollover: LevelRollover) -> Self {
        Self { policy, rollover }
    }

    /// New progress after one completed turn. Never called for failed turns.
    pub fn apply(&self, prior: &Progress, action: &TurnAction<'_>) -> TurnOutcome {
        match self.policy {
            RewardPolicy::ScoreDelta => {
                let delta = match action {
                    TurnAction::Question { status, off_topic } => score_delta(status, *off_topic),
                    _ => 0,
                };
                let focus_score = clamp_score(i32::from(prior.focus_score) + delta);
                TurnOutcome {
                    progress: Progress {
                        focus_score,
                        ..*prior
                    },
                    score_delta: i32::from(focus_score) - i32::from(prior.focus_score),
                    exp_awarded: 0,
                    level_up: None,
                }
            }
            RewardPolicy::ExperienceLevel => {
                let reward = exp_reward(action);
                let (progress, level_up) = add_exp(prior, reward, self.rollover);
                TurnOutcome {
                    progress,
                    score_delta: 0,
                    exp_awarded: reward,
                    level_up,
                }
            }
        }
    }
}

fn score_delta(status: &str, off_topic: bool) -> i32 {
    if off_topic || is_disengaged_status(status) {
        OFF_TASK_PENALTY
    } else if contains_any(status, &FOCUSED_MARKERS) {
        FOCUS_REWARD
    } else {
        0
    }
}

fn clamp_score(score: i32) -> u8 {
    score.clamp(0, i32::from(MAX_FOCUS_SCORE)) as u8
}

fn exp_reward(action: &TurnAction<'_>) -> u32 {
    match action {
        TurnAction::Question { off_topic: true, .. } => 0,
        TurnAction::Question { .. } => QUESTION_EXP,
        TurnAction::Vision { correct } => {
            let correct = u32::try_from(*correct).unwrap_or(u32::MAX);
            VISION_BASE_EXP.saturating_add(VISION_CORRECT_EXP.saturating_mul(correct))
        }
        TurnAction::SimilarProblems { count } => SIMILAR_PROBLEM_EXP * u32::from(*count),
        TurnAction::ReviewQuiz => REVIEW_QUIZ_EXP,
    }
}

fn add_exp(prior: &Progress, reward: u32, rollover: LevelRollover) -> (Progress, Option<LevelUp>) {
    let start_level = prior.level.max(1);
    let mut level = start_level;
    let mut exp = prior.exp.saturating_add(reward);

    match rollover {
        LevelRollover::SingleStep => {
            if exp >= Progress::threshold(level) {
                exp -= Progress::threshold(level);
                level += 1;
            }
        }
        LevelRollover::Cascade => {
            while exp >= Progress::threshold(level) {
                exp -= Progress::threshold(level);
                level += 1;
            }
        }
    }

    let level_up = (level > start_level).then_some(LevelUp {
        from: start_level,
        to: level,
    });
    (
        Progress {
            level,
            exp,
            ..*prior
        },
        level_up,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(focus_score: u8, level: u32, exp: u32) -> Progress {
        Progress {
            focus_score,
            level,
            exp,
        }
    }

    fn score_policy() -> SignalAggregator {
        SignalAggregator::new(RewardPolicy::ScoreDelta, LevelRollover::Cascade)
    }

    fn exp_policy(rollover: LevelRollover) -> SignalAggregator {
        SignalAggregator::new(RewardPolicy::ExperienceLevel, rollover)
    }

    #[test]
    fn focused_status_adds_five() {
        let outcome = score_policy().apply(
            &progress(50, 1, 0),
            &TurnAction::Question {
                status: "🟢 Focused studying",
                off_topic: false,
            },
        );
        assert_eq!(outcome.progress.focus_score, 55);
        assert_eq!(outcome.score_delta, 5);
    }

    #[test]
    fn disengaged_status_subtracts_ten() {
        let outcome = score_policy().apply(
            &progress(50, 1, 0),
            &TurnAction::Question {
                status: "🔴 집중 이탈 경고",
                off_topic: false,
            },
        );
        assert_eq!(outcome.progress.focus_score, 40);
    }

    #[test]
    fn neutral_status_leaves_score() {
        let outcome = score_policy().apply(
            &progress(50, 1, 0),
            &TurnAction::Question {
                status: "🟡 General chat",
                off_topic: false,
            },
        );
        assert_eq!(outcome.progress.focus_score, 50);
        assert_eq!(outcome.score_delta, 0);
    }

    #[test]
    fn score_saturates_at_both_bounds() {
        let aggregator = score_policy();
        let focused = TurnAction::Question {
            status: "focused",
            off_topic: false,
        };
        let once = aggregator.apply(&progress(98, 1, 0), &focused);
        let twice = aggregator.apply(&once.progress, &focused);
        assert_eq!(once.progress.focus_score, 100);
        assert_eq!(twice.progress.focus_score, 100);
        assert_eq!(twice.score_delta, 0);

        let off = TurnAction::Question {
            status: "general",
            off_topic: true,
        };
        let low = aggregator.apply(&progress(4, 1, 0), &off);
        assert_eq!(low.progress.focus_score, 0);
        assert_eq!(low.score_delta, -4);
    }

    #[test]
    fn off_topic_never_earns_positive_reward() {
        let off_topic = TurnAction::Question {
            status: "🟢 Focused studying",
            off_topic: true,
        };
        assert!(score_policy().apply(&progress(50, 1, 0), &off_topic).score_delta < 0);
        assert_eq!(
            exp_policy(LevelRollover::Cascade)
                .apply(&progress(50, 1, 0), &off_topic)
                .exp_awarded,
            0
        );
    }

    #[test]
    fn score_policy_ignores_non_question_actions() {
        let outcome = score_policy().apply(&progress(50, 1, 0), &TurnAction::Vision { correct: 3 });
        assert_eq!(outcome.progress, progress(50, 1, 0));
    }

    #[test]
    fn exp_policy_rewards_each_action() {
        let aggregator = exp_policy(LevelRollover::Cascade);
        let base = progress(50, 5, 0);
        let cases = [
            (
                TurnAction::Question {
                    status: "general",
                    off_topic: false,
                },
                10,
            ),
            (TurnAction::Vision { correct: 0 }, 20),
            (TurnAction::Vision { correct: 2 }, 80),
            (TurnAction::SimilarProblems { count: 1 }, 10),
            (TurnAction::SimilarProblems { count: 3 }, 30),
            (TurnAction::ReviewQuiz, 20),
        ];
        for (action, expected) in cases {
            let outcome = aggregator.apply(&base, &action);
            assert_eq!(outcome.exp_awarded, expected, "{action:?}");
            assert_eq!(outcome.progress.exp, expected);
            assert_eq!(outcome.progress.focus_score, 50);
        }
    }

    #[test]
    fn crossing_one_threshold_levels_up_once() {
        for rollover in [LevelRollover::Cascade, LevelRollover::SingleStep] {
            let aggregator = exp_policy(rollover);
            for (level, exp, correct) in [(1u32, 90u32, 0usize), (1, 99, 3), (2, 150, 2), (3, 299, 0)] {
                let reward = VISION_BASE_EXP + VISION_CORRECT_EXP * correct as u32;
                let outcome = aggregator.apply(&progress(50, level, exp), &TurnAction::Vision { correct });
                assert_eq!(outcome.progress.level, level + 1);
                assert_eq!(outcome.progress.exp, exp + reward - level * 100);
                assert!(outcome.progress.exp < outcome.progress.level * 100);
                assert_eq!(
                    outcome.level_up,
                    Some(LevelUp {
                        from: level,
                        to: level + 1
                    })
                );
            }
        }
    }

    #[test]
    fn below_threshold_has_no_level_up() {
        let outcome = exp_policy(LevelRollover::Cascade)
            .apply(&progress(50, 1, 0), &TurnAction::ReviewQuiz);
        assert_eq!(outcome.progress.level, 1);
        assert_eq!(outcome.level_up, None);
    }

    #[test]
    fn cascade_keeps_exp_below_threshold_on_double_crossing() {
        // 90 + 20 + 10 * 30 = 410: crosses level 1 (100) and level 2 (200)
        let outcome = exp_policy(LevelRollover::Cascade)
            .apply(&progress(50, 1, 90), &TurnAction::Vision { correct: 10 });
        assert_eq!(outcome.progress.level, 3);
        assert_eq!(outcome.progress.exp, 110);
        assert_eq!(outcome.level_up, Some(LevelUp { from: 1, to: 3 }));
    }

    #[test]
    fn single_step_gains_exactly_one_level_on_double_crossing() {
        let outcome = exp_policy(LevelRollover::SingleStep)
            .apply(&progress(50, 1, 90), &TurnAction::Vision { correct: 10 });
        assert_eq!(outcome.progress.level, 2);
        assert_eq!(outcome.progress.exp, 310);
        assert_eq!(outcome.level_up, Some(LevelUp { from: 1, to: 2 }));
    }

    #[test]
    fn status_classification_prefers_disengaged() {
        assert!(is_focused_status("🟢 Focused studying"));
        assert!(!is_focused_status("off-task while studying"));
        assert!(is_disengaged_status("OFF-TASK"));
        assert!(!is_focused_status("general"));
    }
}
