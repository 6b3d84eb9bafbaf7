//! Call phase transition table
//!
//! Every PSTN leg moves through
//! `Ringing -> AwaitingDigits -> JoiningConference -> InConference -> Completed`.
//! The table below is the single place that decides which trigger moves a
//! leg from one phase to the next; a trigger with no entry leaves the phase
//! unchanged. Side effects are keyed on registry bindings, not on the phase,
//! so a duplicated or reordered callback can at worst be refused here.

use serde::Serialize;
use std::fmt;

/// Lifecycle phase of a PSTN leg
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallPhase {
    #[default]
    Ringing,
    AwaitingDigits,
    JoiningConference,
    InConference,
    Completed,
}

/// What happened to the leg
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum PhaseTrigger {
    /// Answer callback received, digit prompt issued
    Answered,
    /// A valid conference number was collected
    DigitsAccepted,
    /// Digit collection timed out or produced an unusable number
    DigitsRejected,
    /// The gateway confirmed the leg is in the conference room
    Transferred,
    /// The gateway reported the leg completed
    Completed,
}

impl CallPhase {
    /// Phase reached from `self` on `trigger`, or `None` if the table has no entry
    pub fn next(self, trigger: PhaseTrigger) -> Option<CallPhase> {
        use CallPhase::*;
        use PhaseTrigger::*;

        match (self, trigger) {
            (CallPhase::Completed, _) => None,
            (_, PhaseTrigger::Completed) => Some(CallPhase::Completed),

            (Ringing, Answered) => Some(AwaitingDigits),

            // The digit result can overtake the answer bookkeeping
            (Ringing | AwaitingDigits, DigitsAccepted) => Some(JoiningConference),
            (Ringing | AwaitingDigits, DigitsRejected) => Some(CallPhase::Completed),

            // Re-entering digit collection rebinds the conference
            (JoiningConference | InConference, DigitsAccepted) => Some(JoiningConference),

            (JoiningConference, Transferred) => Some(InConference),

            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == CallPhase::Completed
    }
}

impl fmt::Display for CallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CallPhase::Ringing => "ringing",
            CallPhase::AwaitingDigits => "awaiting_digits",
            CallPhase::JoiningConference => "joining_conference",
            CallPhase::InConference => "in_conference",
            CallPhase::Completed => "completed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_flow() {
        let phase = CallPhase::Ringing;
        let phase = phase.next(PhaseTrigger::Answered).unwrap();
        assert_eq!(phase, CallPhase::AwaitingDigits);
        let phase = phase.next(PhaseTrigger::DigitsAccepted).unwrap();
        assert_eq!(phase, CallPhase::JoiningConference);
        let phase = phase.next(PhaseTrigger::Transferred).unwrap();
        assert_eq!(phase, CallPhase::InConference);
        let phase = phase.next(PhaseTrigger::Completed).unwrap();
        assert!(phase.is_terminal());
    }

    #[test]
    fn timeout_ends_the_leg() {
        let phase = CallPhase::AwaitingDigits.next(PhaseTrigger::DigitsRejected);
        assert_eq!(phase, Some(CallPhase::Completed));
    }

    #[test]
    fn completed_is_absorbing() {
        for trigger in [
            PhaseTrigger::Answered,
            PhaseTrigger::DigitsAccepted,
            PhaseTrigger::Transferred,
            PhaseTrigger::Completed,
        ] {
            assert_eq!(CallPhase::Completed.next(trigger), None);
        }
    }

    #[test]
    fn transfer_before_digits_is_refused() {
        assert_eq!(CallPhase::AwaitingDigits.next(PhaseTrigger::Transferred), None);
        assert_eq!(CallPhase::Ringing.next(PhaseTrigger::Transferred), None);
    }

    #[test]
    fn duplicate_answer_is_refused() {
        assert_eq!(CallPhase::AwaitingDigits.next(PhaseTrigger::Answered), None);
    }
}
