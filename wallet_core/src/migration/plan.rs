//! Pure selection of the scripts a migration pass runs.

use std::fmt;

use super::version::Version;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
        })
    }
}

/// Scripts to run, in execution order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plan {
    pub direction: Direction,
    pub steps: Vec<Version>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Compute the steps that move storage from `persisted` to `running`.
///
/// `registry` must be sorted ascending.
///
/// Downgrade: walking the registry from highest to lowest, take the window
/// starting at the first script `<= persisted` and ending before the first
/// script `<= running`; keep those recorded in `completed`.
///
/// Upgrade (or same version): walking from lowest to highest, take the window
/// starting at the first script `>= persisted` and ending before the first
/// script `> running`; keep those not yet in `completed`.
pub fn plan(
    registry: &[Version],
    persisted: &Version,
    running: &Version,
    completed: &[Version],
) -> Plan {
    if persisted > running {
        let descending: Vec<&Version> = registry.iter().rev().collect();
        let steps = window(&descending, |v| v <= persisted, |v| v <= running)
            .iter()
            .filter(|v| completed.contains(**v))
            .map(|v| (*v).clone())
            .collect();
        Plan {
            direction: Direction::Down,
            steps,
        }
    } else {
        let ascending: Vec<&Version> = registry.iter().collect();
        let steps = window(&ascending, |v| v >= persisted, |v| v > running)
            .iter()
            .filter(|v| !completed.contains(**v))
            .map(|v| (*v).clone())
            .collect();
        Plan {
            direction: Direction::Up,
            steps,
        }
    }
}

fn window<'a, 'v>(
    ordered: &'a [&'v Version],
    starts: impl Fn(&Version) -> bool,
    ends: impl Fn(&Version) -> bool,
) -> &'a [&'v Version] {
    let Some(start) = ordered.iter().position(|v| starts(*v)) else {
        return &[];
    };
    let end = ordered.iter().position(|v| ends(*v)).unwrap_or(ordered.len());
    if end < start {
        return &[];
    }
    &ordered[start..end]
}
