/*
[INPUT]:  ConnectionStatus and ConnectionAction values
[OUTPUT]: Validated per-wallet-type connection transitions
[POS]:    Connection domain logic - lifecycle state machine
[UPDATE]: When connection states or their transitions change
*/

use serde::Serialize;
use thiserror::Error;

/// Lifecycle state of one wallet type's connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Idle,
    Connecting,
    Connected,
    Failed,
    Retrying,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Failed => "failed",
            Self::Retrying => "retrying",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actions that drive connection transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionAction {
    Connect,
    Succeed,
    Fail,
    ScheduleRetry,
    RetryFired,
    /// Terminal failure surfaced to the user
    Report,
    /// Pending retry dropped because it no longer applies
    Cancel,
    Disconnect,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("Invalid transition: {from:?} -> {action:?}")]
    InvalidTransition {
        from: ConnectionStatus,
        action: ConnectionAction,
    },
}

/// State machine for a single wallet type
#[derive(Debug, Clone, Default)]
pub struct ConnectionMachine {
    current_state: ConnectionStatus,
}

impl ConnectionMachine {
    pub fn new(initial: ConnectionStatus) -> Self {
        Self {
            current_state: initial,
        }
    }

    fn next_state(from: ConnectionStatus, action: ConnectionAction) -> Option<ConnectionStatus> {
        use ConnectionAction as A;
        use ConnectionStatus as S;

        match (from, action) {
            (_, A::Connect) => Some(S::Connecting),
            (S::Connecting, A::Succeed) => Some(S::Connected),
            (S::Connecting, A::Fail) => Some(S::Failed),
            (S::Failed, A::ScheduleRetry) => Some(S::Retrying),
            (S::Retrying, A::RetryFired) => Some(S::Connecting),
            (S::Failed, A::Report) => Some(S::Idle),
            (S::Retrying, A::Cancel) => Some(S::Idle),
            (_, A::Disconnect) => Some(S::Idle),
            _ => None,
        }
    }

    pub fn can_transition(&self, action: ConnectionAction) -> bool {
        Self::next_state(self.current_state, action).is_some()
    }

    pub fn transition(&mut self, action: ConnectionAction) -> Result<ConnectionStatus, StateError> {
        let next = Self::next_state(self.current_state, action).ok_or(
            StateError::InvalidTransition {
                from: self.current_state,
                action,
            },
        )?;
        self.current_state = next;
        Ok(next)
    }

    pub fn state(&self) -> ConnectionStatus {
        self.current_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_idle() {
        assert_eq!(ConnectionMachine::default().state(), ConnectionStatus::Idle);
    }

    #[test]
    fn test_retry_cycle() {
        let mut machine = ConnectionMachine::default();
        machine.transition(ConnectionAction::Connect).unwrap();
        machine.transition(ConnectionAction::Fail).unwrap();
        assert_eq!(machine.state(), ConnectionStatus::Failed);

        machine.transition(ConnectionAction::ScheduleRetry).unwrap();
        assert_eq!(machine.state(), ConnectionStatus::Retrying);

        machine.transition(ConnectionAction::RetryFired).unwrap();
        assert_eq!(machine.state(), ConnectionStatus::Connecting);

        machine.transition(ConnectionAction::Succeed).unwrap();
        assert_eq!(machine.state(), ConnectionStatus::Connected);
    }

    #[test]
    fn test_terminal_failure_returns_to_idle() {
        let mut machine = ConnectionMachine::new(ConnectionStatus::Connecting);
        machine.transition(ConnectionAction::Fail).unwrap();
        machine.transition(ConnectionAction::Report).unwrap();
        assert_eq!(machine.state(), ConnectionStatus::Idle);
    }

    #[test]
    fn test_connect_and_disconnect_from_any_state() {
        let states = [
            ConnectionStatus::Idle,
            ConnectionStatus::Connecting,
            ConnectionStatus::Connected,
            ConnectionStatus::Failed,
            ConnectionStatus::Retrying,
        ];

        for &initial in &states {
            let mut machine = ConnectionMachine::new(initial);
            assert!(machine.transition(ConnectionAction::Connect).is_ok());
            assert_eq!(machine.state(), ConnectionStatus::Connecting);

            let mut machine = ConnectionMachine::new(initial);
            assert!(machine.transition(ConnectionAction::Disconnect).is_ok());
            assert_eq!(machine.state(), ConnectionStatus::Idle);
        }
    }

    #[test]
    fn test_invalid_transitions() {
        let mut machine = ConnectionMachine::default();
        let err = machine.transition(ConnectionAction::Succeed).unwrap_err();
        assert_eq!(
            err,
            StateError::InvalidTransition {
                from: ConnectionStatus::Idle,
                action: ConnectionAction::Succeed,
            }
        );
        assert_eq!(machine.state(), ConnectionStatus::Idle);

        let machine = ConnectionMachine::new(ConnectionStatus::Connected);
        assert!(!machine.can_transition(ConnectionAction::RetryFired));
        assert!(!machine.can_transition(ConnectionAction::Fail));

        let machine = ConnectionMachine::new(ConnectionStatus::Retrying);
        assert!(!machine.can_transition(ConnectionAction::ScheduleRetry));
        assert!(machine.can_transition(ConnectionAction::Cancel));

        let machine = ConnectionMachine::new(ConnectionStatus::Connecting);
        assert!(!machine.can_transition(ConnectionAction::Cancel));
    }
}
