//! Initial register state, model vs. reference.

use serde::Serialize;

use crate::{RegisterGroup, RegisterSnapshot};

/// A register whose model initial value differs from the reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitialDiff {
    pub register: String,
    pub expected: u64,
    pub actual: u64,
}

/// Initial value of one register, with both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitialValue {
    pub register: String,
    pub group: RegisterGroup,
    pub expected: u64,
    pub actual: u64,
    pub differs: bool,
}

/// Registers whose initial values disagree, in store order.
#[must_use]
pub fn initial_diffs(snapshots: &[RegisterSnapshot]) -> Vec<InitialDiff> {
    snapshots
        .iter()
        .filter(|s| s.differs())
        .map(|s| InitialDiff {
            register: s.name.clone(),
            expected: s.expected_init,
            actual: s.actual_init,
        })
        .collect()
}

/// Every register's initial values, in store order.
#[must_use]
pub fn initial_state(snapshots: &[RegisterSnapshot]) -> Vec<InitialValue> {
    snapshots
        .iter()
        .map(|s| InitialValue {
            register: s.name.clone(),
            group: s.group,
            expected: s.expected_init,
            actual: s.actual_init,
            differs: s.differs(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(name: &str, expected: u64, actual: u64) -> RegisterSnapshot {
        RegisterSnapshot {
            name: name.to_string(),
            group: RegisterGroup::Int,
            index: name[1..].parse().unwrap(),
            expected_init: expected,
            actual_init: actual,
        }
    }

    #[test]
    fn test_single_difference() {
        let snaps = [snap("x4", 0, 0), snap("x5", 0x10, 0x20), snap("x6", 7, 7)];
        assert_eq!(
            initial_diffs(&snaps),
            vec![InitialDiff {
                register: "x5".to_string(),
                expected: 0x10,
                actual: 0x20,
            }]
        );
    }

    #[test]
    fn test_store_order_is_kept() {
        let snaps = [snap("x9", 1, 2), snap("x2", 3, 4)];
        let names: Vec<_> = initial_diffs(&snaps)
            .into_iter()
            .map(|d| d.register)
            .collect();
        assert_eq!(names, vec!["x9", "x2"]);
    }

    #[test]
    fn test_full_initial_state() {
        let snaps = [snap("x1", 1, 1), snap("x2", 3, 4)];
        let state = initial_state(&snaps);
        assert_eq!(state.len(), 2);
        assert!(!state[0].differs);
        assert!(state[1].differs);
    }
}
