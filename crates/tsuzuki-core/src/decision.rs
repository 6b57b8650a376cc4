//! What to do with the user's list entry after an episode was watched.
//!
//! [`decide`] is pure. The rules below run in order and the first one that
//! produces an [`Action`] wins; the table is the whole policy.

use tsuzuki_api::{ListEntry, ListStatus};

use crate::config::PolicyConfig;

/// The mutation to apply, or why none is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SetProgress { progress: u32 },
    SetStatusAndProgress { status: ListStatus, progress: u32 },
    CreateAndSetProgress { status: ListStatus, progress: u32 },
    Reject(RejectReason),
}

impl Action {
    /// The progress the entry ends up with, if anything is written.
    pub fn progress(&self) -> Option<u32> {
        match *self {
            Self::SetProgress { progress }
            | Self::SetStatusAndProgress { progress, .. }
            | Self::CreateAndSetProgress { progress, .. } => Some(progress),
            Self::Reject(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NotOnList,
    RewatchUpdatesDisabled,
    NotNewProgress,
    StatusNotEligible,
}

impl RejectReason {
    /// Process exit code when the invocation ends with this rejection.
    pub fn exit_code(self) -> u8 {
        match self {
            Self::NotOnList => 4,
            _ => 5,
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::NotOnList => "not on your list",
            Self::RewatchUpdatesDisabled => "updating rewatches is disabled",
            Self::NotNewProgress => "episode is not past the current progress",
            Self::StatusNotEligible => "list status does not allow updates",
        })
    }
}

/// Everything a rule may look at.
struct Facts<'a> {
    current: Option<&'a ListEntry>,
    episode: u32,
    total: Option<u32>,
    policy: &'a PolicyConfig,
}

type Rule = fn(&Facts<'_>) -> Option<Action>;

const RULES: &[(&str, Rule)] = &[
    ("absent", absent),
    ("restart completed", restart_completed),
    ("rewatch updates disabled", rewatch_disabled),
    ("paused or dropped", paused_or_dropped),
    ("completed", completed),
    ("not new progress", not_new_progress),
    ("advance", advance),
];

/// Decide how `current` changes after watching `episode` of a season with
/// `total` episodes.
pub fn decide(
    current: Option<&ListEntry>,
    episode: u32,
    total: Option<u32>,
    policy: &PolicyConfig,
) -> Action {
    let facts = Facts {
        current,
        episode,
        total,
        policy,
    };
    for (name, rule) in RULES {
        if let Some(action) = rule(&facts) {
            tracing::debug!(rule = *name, ?action, "decision");
            return action;
        }
    }
    // `advance` matches every entry the rules above let through.
    Action::Reject(RejectReason::StatusNotEligible)
}

fn absent(facts: &Facts<'_>) -> Option<Action> {
    if facts.current.is_some() {
        return None;
    }
    Some(if facts.policy.add_entry_if_missing {
        Action::CreateAndSetProgress {
            status: ListStatus::Current,
            progress: facts.episode,
        }
    } else {
        Action::Reject(RejectReason::NotOnList)
    })
}

fn restart_completed(facts: &Facts<'_>) -> Option<Action> {
    let entry = facts.current?;
    (entry.status == ListStatus::Completed
        && facts.episode == 1
        && facts.policy.first_episode_restarts_completed)
        .then_some(Action::SetStatusAndProgress {
            status: ListStatus::Repeating,
            progress: 1,
        })
}

fn rewatch_disabled(facts: &Facts<'_>) -> Option<Action> {
    let entry = facts.current?;
    (entry.status == ListStatus::Repeating && !facts.policy.update_progress_while_repeating)
        .then_some(Action::Reject(RejectReason::RewatchUpdatesDisabled))
}

fn paused_or_dropped(facts: &Facts<'_>) -> Option<Action> {
    let entry = facts.current?;
    (matches!(entry.status, ListStatus::Paused | ListStatus::Dropped)
        && !facts.policy.resume_paused_or_dropped)
        .then_some(Action::Reject(RejectReason::StatusNotEligible))
}

/// A completed entry only changes through a restart.
fn completed(facts: &Facts<'_>) -> Option<Action> {
    let entry = facts.current?;
    if entry.status != ListStatus::Completed {
        return None;
    }
    Some(Action::Reject(if facts.episode <= entry.progress {
        RejectReason::NotNewProgress
    } else {
        RejectReason::StatusNotEligible
    }))
}

fn not_new_progress(facts: &Facts<'_>) -> Option<Action> {
    let entry = facts.current?;
    (facts.episode <= entry.progress).then_some(Action::Reject(RejectReason::NotNewProgress))
}

fn advance(facts: &Facts<'_>) -> Option<Action> {
    let entry = facts.current?;
    // A resumed entry is treated as currently watched.
    let working = match entry.status {
        ListStatus::Paused | ListStatus::Dropped => ListStatus::Current,
        status => status,
    };

    let is_last = facts.total == Some(facts.episode);
    let policy = facts.policy;
    let may_complete = policy.complete_regardless_of_status
        || match working {
            ListStatus::Current => policy.complete_current_on_last_episode,
            ListStatus::Repeating => policy.complete_repeating_on_last_episode,
            _ => false,
        };
    let target = if is_last && may_complete {
        ListStatus::Completed
    } else {
        working
    };

    Some(if target == entry.status {
        Action::SetProgress {
            progress: facts.episode,
        }
    } else {
        Action::SetStatusAndProgress {
            status: target,
            progress: facts.episode,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(status: ListStatus, progress: u32) -> ListEntry {
        ListEntry {
            media_id: 1,
            status,
            progress,
            repeat: 0,
        }
    }

    fn policy() -> PolicyConfig {
        PolicyConfig::default()
    }

    #[test]
    fn test_absent_entry() {
        assert_eq!(
            decide(None, 3, Some(12), &policy()),
            Action::Reject(RejectReason::NotOnList)
        );
        let adding = PolicyConfig {
            add_entry_if_missing: true,
            ..policy()
        };
        assert_eq!(
            decide(None, 3, Some(12), &adding),
            Action::CreateAndSetProgress {
                status: ListStatus::Current,
                progress: 3
            }
        );
    }

    #[test]
    fn test_current_completes_on_last_episode() {
        let p = PolicyConfig {
            complete_current_on_last_episode: true,
            ..policy()
        };
        assert_eq!(
            decide(Some(&entry(ListStatus::Current, 13)), 14, Some(14), &p),
            Action::SetStatusAndProgress {
                status: ListStatus::Completed,
                progress: 14
            }
        );
    }

    #[test]
    fn test_current_last_episode_without_flag() {
        assert_eq!(
            decide(Some(&entry(ListStatus::Current, 13)), 14, Some(14), &policy()),
            Action::SetProgress { progress: 14 }
        );
    }

    #[test]
    fn test_completed_first_episode() {
        let completed = entry(ListStatus::Completed, 12);
        assert_eq!(
            decide(Some(&completed), 1, Some(12), &policy()),
            Action::Reject(RejectReason::NotNewProgress)
        );
        let p = PolicyConfig {
            first_episode_restarts_completed: true,
            ..policy()
        };
        assert_eq!(
            decide(Some(&completed), 1, Some(12), &p),
            Action::SetStatusAndProgress {
                status: ListStatus::Repeating,
                progress: 1
            }
        );
    }

    #[test]
    fn test_completed_later_episode_is_not_eligible() {
        // Progress below the total on a completed entry.
        let completed = entry(ListStatus::Completed, 10);
        assert_eq!(
            decide(Some(&completed), 11, Some(12), &policy()),
            Action::Reject(RejectReason::StatusNotEligible)
        );
    }

    #[test]
    fn test_repeating() {
        let repeating = entry(ListStatus::Repeating, 4);
        assert_eq!(
            decide(Some(&repeating), 5, Some(12), &policy()),
            Action::SetProgress { progress: 5 }
        );
        // Repeating completes on the last episode by default.
        assert_eq!(
            decide(Some(&entry(ListStatus::Repeating, 11)), 12, Some(12), &policy()),
            Action::SetStatusAndProgress {
                status: ListStatus::Completed,
                progress: 12
            }
        );

        let disabled = PolicyConfig {
            update_progress_while_repeating: false,
            ..policy()
        };
        assert_eq!(
            decide(Some(&repeating), 5, Some(12), &disabled),
            Action::Reject(RejectReason::RewatchUpdatesDisabled)
        );
    }

    #[test]
    fn test_not_new_progress() {
        for status in [ListStatus::Current, ListStatus::Repeating, ListStatus::Planning] {
            assert_eq!(
                decide(Some(&entry(status, 5)), 5, Some(12), &policy()),
                Action::Reject(RejectReason::NotNewProgress)
            );
            assert_eq!(
                decide(Some(&entry(status, 5)), 2, Some(12), &policy()),
                Action::Reject(RejectReason::NotNewProgress)
            );
        }
    }

    #[test]
    fn test_planning_keeps_status() {
        assert_eq!(
            decide(Some(&entry(ListStatus::Planning, 0)), 1, Some(12), &policy()),
            Action::SetProgress { progress: 1 }
        );
        let p = PolicyConfig {
            complete_current_on_last_episode: true,
            ..policy()
        };
        assert_eq!(
            decide(Some(&entry(ListStatus::Planning, 0)), 12, Some(12), &p),
            Action::SetProgress { progress: 12 }
        );
    }

    #[test]
    fn test_unknown_total_never_completes() {
        let p = PolicyConfig {
            complete_current_on_last_episode: true,
            complete_regardless_of_status: true,
            ..policy()
        };
        assert_eq!(
            decide(Some(&entry(ListStatus::Current, 99)), 100, None, &p),
            Action::SetProgress { progress: 100 }
        );
    }

    #[test]
    fn test_complete_regardless_of_status() {
        let p = PolicyConfig {
            complete_repeating_on_last_episode: false,
            complete_regardless_of_status: true,
            ..policy()
        };
        for status in [ListStatus::Current, ListStatus::Repeating, ListStatus::Planning] {
            assert_eq!(
                decide(Some(&entry(status, 11)), 12, Some(12), &p),
                Action::SetStatusAndProgress {
                    status: ListStatus::Completed,
                    progress: 12
                }
            );
        }
    }

    #[test]
    fn test_paused_and_dropped() {
        for status in [ListStatus::Paused, ListStatus::Dropped] {
            assert_eq!(
                decide(Some(&entry(status, 3)), 4, Some(12), &policy()),
                Action::Reject(RejectReason::StatusNotEligible)
            );
        }

        let resume = PolicyConfig {
            resume_paused_or_dropped: true,
            ..policy()
        };
        assert_eq!(
            decide(Some(&entry(ListStatus::Paused, 3)), 4, Some(12), &resume),
            Action::SetStatusAndProgress {
                status: ListStatus::Current,
                progress: 4
            }
        );
        assert_eq!(
            decide(Some(&entry(ListStatus::Dropped, 3)), 3, Some(12), &resume),
            Action::Reject(RejectReason::NotNewProgress)
        );
    }

    #[test]
    fn test_progress_never_decreases_within_a_status() {
        let policies = [
            policy(),
            PolicyConfig {
                add_entry_if_missing: true,
                update_progress_while_repeating: true,
                first_episode_restarts_completed: true,
                complete_current_on_last_episode: true,
                complete_repeating_on_last_episode: true,
                complete_regardless_of_status: true,
                resume_paused_or_dropped: true,
            },
        ];
        let statuses = [
            ListStatus::Current,
            ListStatus::Planning,
            ListStatus::Completed,
            ListStatus::Repeating,
            ListStatus::Paused,
            ListStatus::Dropped,
        ];
        for p in &policies {
            for status in statuses {
                for progress in 0..=13 {
                    for episode in 1..=13 {
                        let current = entry(status, progress);
                        let action = decide(Some(&current), episode, Some(12), p);
                        let restarted = matches!(
                            action,
                            Action::SetStatusAndProgress {
                                status: ListStatus::Repeating,
                                ..
                            }
                        ) && status == ListStatus::Completed;
                        if let Some(new) = action.progress() {
                            if !restarted {
                                assert!(
                                    new > progress,
                                    "{status:?} {progress} -> {new} on episode {episode}"
                                );
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(RejectReason::NotOnList.exit_code(), 4);
        assert_eq!(RejectReason::NotNewProgress.exit_code(), 5);
        assert_eq!(RejectReason::StatusNotEligible.exit_code(), 5);
    }
}
