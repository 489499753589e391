//! Move encoding and round resolution.

use std::str::FromStr;

use num_bigint::BigUint;
use strum::{Display, EnumIter, IntoStaticStr};

use crate::error::MoveError;

/// A rock/paper/scissors move.
///
/// The discriminant is the field value committed to by the attestation
/// circuit and revealed by the reveal circuit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum Move {
    Rock = 0,
    Paper = 1,
    Scissors = 2,
}

impl Move {
    /// Numeric code used as the circuit's `move` signal.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Returns true if `self` wins against `other`.
    pub const fn beats(self, other: Move) -> bool {
        matches!(
            (self, other),
            (Move::Rock, Move::Scissors) | (Move::Paper, Move::Rock) | (Move::Scissors, Move::Paper)
        )
    }
}

impl TryFrom<u64> for Move {
    type Error = MoveError;

    fn try_from(code: u64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Move::Rock),
            1 => Ok(Move::Paper),
            2 => Ok(Move::Scissors),
            other => Err(MoveError::InvalidCode(other)),
        }
    }
}

impl TryFrom<&BigUint> for Move {
    type Error = MoveError;

    /// Decodes a revealed public signal back into a move.
    fn try_from(value: &BigUint) -> Result<Self, Self::Error> {
        let digits = value.to_u64_digits();
        match digits.as_slice() {
            [] => Ok(Move::Rock),
            [code] => Move::try_from(*code),
            _ => Err(MoveError::OutOfRange(value.to_string())),
        }
    }
}

impl FromStr for Move {
    type Err = MoveError;

    /// Accepts either the lowercase name or the numeric code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rock" | "0" => Ok(Move::Rock),
            "paper" | "1" => Ok(Move::Paper),
            "scissors" | "2" => Ok(Move::Scissors),
            _ => Err(MoveError::UnknownName(s.to_string())),
        }
    }
}

/// Outcome codes reported by the round contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum RoundOutcome {
    Tie = 0,
    FirstPlayer = 1,
    SecondPlayer = 2,
}

impl RoundOutcome {
    /// Resolves a round from the opener's move and the responder's move.
    pub const fn decide(first: Move, second: Move) -> Self {
        if first as u8 == second as u8 {
            RoundOutcome::Tie
        } else if first.beats(second) {
            RoundOutcome::FirstPlayer
        } else {
            RoundOutcome::SecondPlayer
        }
    }

    pub const fn code(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_codes_round_trip() {
        for mv in Move::iter() {
            assert_eq!(Move::try_from(mv.code() as u64), Ok(mv));
            assert_eq!(Move::try_from(&BigUint::from(mv.code())), Ok(mv));
        }
        assert_eq!(Move::try_from(3u64), Err(MoveError::InvalidCode(3)));
    }

    #[test]
    fn test_wide_signal_reports_its_value() {
        let wide = BigUint::from(u64::MAX) + 3u32;
        assert_eq!(
            Move::try_from(&wide),
            Err(MoveError::OutOfRange("18446744073709551618".to_string()))
        );
        assert_eq!(
            Move::try_from(&BigUint::from(7u32)),
            Err(MoveError::InvalidCode(7))
        );
    }

    #[test]
    fn test_parses_names_and_codes() {
        assert_eq!("Rock".parse::<Move>(), Ok(Move::Rock));
        assert_eq!("2".parse::<Move>(), Ok(Move::Scissors));
        assert!("lizard".parse::<Move>().is_err());
        assert_eq!(Move::Paper.to_string(), "paper");
    }

    #[test]
    fn test_every_move_beats_exactly_one_other() {
        for mv in Move::iter() {
            let wins = Move::iter().filter(|other| mv.beats(*other)).count();
            assert_eq!(wins, 1, "{mv} should beat exactly one move");
            assert!(!mv.beats(mv));
        }
    }

    #[test]
    fn test_outcome_matches_contract_codes() {
        assert_eq!(RoundOutcome::decide(Move::Rock, Move::Rock), RoundOutcome::Tie);
        assert_eq!(RoundOutcome::decide(Move::Rock, Move::Scissors).code(), 1);
        assert_eq!(RoundOutcome::decide(Move::Rock, Move::Paper).code(), 2);
    }
}
