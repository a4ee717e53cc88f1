//! Drive action log and inverse-log construction.
//!
//! Every autonomous forward-trip action is recorded here so the return trip
//! can replay the path mirrored: reversed order, turns swapped, durations
//! untouched.

/// One logged drive action, duration in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriveAction {
    Forward { duration: f32 },
    TurnLeft { duration: f32 },
    TurnRight { duration: f32 },
}

impl DriveAction {
    /// The action that undoes this one on the return trip: turns mirror,
    /// forward entries are unchanged (the replay retraces them by backing
    /// down the leg).
    pub fn mirrored(self) -> DriveAction {
        match self {
            DriveAction::Forward { duration } => DriveAction::Forward { duration },
            DriveAction::TurnLeft { duration } => DriveAction::TurnRight { duration },
            DriveAction::TurnRight { duration } => DriveAction::TurnLeft { duration },
        }
    }

    pub fn duration(self) -> f32 {
        match self {
            DriveAction::Forward { duration }
            | DriveAction::TurnLeft { duration }
            | DriveAction::TurnRight { duration } => duration,
        }
    }
}

/// Ordered record of forward-trip actions.
#[derive(Debug, Default)]
pub struct ActionLog {
    entries: Vec<DriveAction>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, action: DriveAction) {
        self.entries.push(action);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[DriveAction] {
        &self.entries
    }

    /// Build the return-trip sequence: reversed order with every entry
    /// mirrored.
    pub fn build_inverse(&self) -> Vec<DriveAction> {
        self.entries
            .iter()
            .rev()
            .map(|action| action.mirrored())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_reverses_and_swaps_turns() {
        let mut log = ActionLog::new();
        log.push(DriveAction::Forward { duration: 1.0 });
        log.push(DriveAction::TurnLeft { duration: 0.4 });
        log.push(DriveAction::Forward { duration: 0.5 });

        let inverse = log.build_inverse();

        assert_eq!(
            inverse,
            vec![
                DriveAction::Forward { duration: 0.5 },
                DriveAction::TurnRight { duration: 0.4 },
                DriveAction::Forward { duration: 1.0 },
            ]
        );
    }

    #[test]
    fn test_inverse_of_inverse_restores_order() {
        let mut log = ActionLog::new();
        log.push(DriveAction::TurnRight { duration: 0.2 });
        log.push(DriveAction::Forward { duration: 0.3 });

        let mut inverse_log = ActionLog::new();
        for action in log.build_inverse() {
            inverse_log.push(action);
        }

        assert_eq!(inverse_log.build_inverse(), log.entries());
    }

    #[test]
    fn test_durations_are_preserved() {
        let mut log = ActionLog::new();
        log.push(DriveAction::TurnLeft { duration: 0.25 });

        let inverse = log.build_inverse();
        assert_eq!(inverse[0].duration(), 0.25);
    }

    #[test]
    fn test_empty_log_inverts_to_empty() {
        let log = ActionLog::new();
        assert!(log.build_inverse().is_empty());
        assert!(log.is_empty());
    }
}
