//! Standstill interlock.
//!
//! The seat may only move while the vehicle speed is exactly zero. This is an
//! equality check, not a threshold: any nonzero reading, negative ones
//! included, blocks the move.

use seatadjuster_types::SignalValue;

/// Outcome of checking a fresh speed reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveDecision {
    Permitted,
    Blocked { speed: SignalValue },
}

pub fn evaluate(speed: SignalValue) -> MoveDecision {
    if speed.as_f64() == 0.0 {
        MoveDecision::Permitted
    } else {
        MoveDecision::Blocked { speed }
    }
}

pub fn blocked_message(speed: SignalValue) -> String {
    format!("Not allowed to move seat because vehicle speed is {speed} and not 0")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_speed_permits() {
        assert_eq!(evaluate(SignalValue::Float(0.0)), MoveDecision::Permitted);
        assert_eq!(evaluate(SignalValue::Float(-0.0)), MoveDecision::Permitted);
        assert_eq!(evaluate(SignalValue::Int(0)), MoveDecision::Permitted);
    }

    #[test]
    fn any_nonzero_speed_blocks() {
        for speed in [0.001, 15.0, -3.0, f64::MAX] {
            assert!(
                matches!(evaluate(SignalValue::Float(speed)), MoveDecision::Blocked { .. }),
                "speed {speed} must block"
            );
        }
    }

    #[test]
    fn blocked_message_includes_speed() {
        assert_eq!(
            blocked_message(SignalValue::Float(15.0)),
            "Not allowed to move seat because vehicle speed is 15 and not 0"
        );
        assert_eq!(
            blocked_message(SignalValue::Float(-2.5)),
            "Not allowed to move seat because vehicle speed is -2.5 and not 0"
        );
    }
}
