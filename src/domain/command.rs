//! Client command vocabulary and server replies.
//!
//! The protocol is line-oriented ASCII. Commands are matched exactly
//! (case-sensitive) after surrounding whitespace is trimmed.

use std::fmt;
use std::str::FromStr;

/// A command token sent by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Run the motor at full duty in the selected heading.
    Start,
    /// Halt the direction outputs.
    Stop,
    /// Select and drive the forward direction.
    Forward,
    /// Select and drive the backward direction.
    Backward,
    /// 20 % duty cycle.
    Low,
    /// 50 % duty cycle.
    Medium,
    /// 75 % duty cycle.
    High,
    /// Release the actuator and close the session.
    Exit,
}

impl Command {
    /// Every command in the vocabulary.
    pub const ALL: [Self; 8] = [
        Self::Start,
        Self::Stop,
        Self::Forward,
        Self::Backward,
        Self::Low,
        Self::Medium,
        Self::High,
        Self::Exit,
    ];

    /// Returns the wire token for this command.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Stop => "STOP",
            Self::Forward => "FORWARD",
            Self::Backward => "BACKWARD",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Exit => "EXIT",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token that is not part of the command vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown command: {0:?}")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.as_str() == s)
            .ok_or_else(|| UnknownCommand(s.to_string()))
    }
}

/// Result code written back for a processed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Command applied.
    Ok,
    /// Unrecognised command or actuator failure.
    Error,
    /// START refused because the hopper is empty.
    NoSeeds,
    /// Session must end; nothing is written.
    Exit,
}

impl Reply {
    /// Returns the line written to the client, or `None` for [`Reply::Exit`].
    #[must_use]
    pub const fn wire_line(self) -> Option<&'static str> {
        match self {
            Self::Ok => Some("OK"),
            Self::Error => Some("ERROR"),
            Self::NoSeeds => Some("ERROR:NO_SEEDS"),
            Self::Exit => None,
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_line().unwrap_or("EXIT"))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn every_token_parses_back() {
        for cmd in Command::ALL {
            let Ok(parsed) = cmd.as_str().parse::<Command>() else {
                panic!("{cmd} should parse");
            };
            assert_eq!(parsed, cmd);
        }
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert!("start".parse::<Command>().is_err());
        assert!("Forward".parse::<Command>().is_err());
    }

    #[test]
    fn unknown_token_carries_input() {
        let Err(err) = "SPIN".parse::<Command>() else {
            panic!("SPIN is not a command");
        };
        assert_eq!(err, UnknownCommand("SPIN".to_string()));
    }

    #[test]
    fn empty_token_is_unknown() {
        assert!("".parse::<Command>().is_err());
    }

    #[test]
    fn reply_lines() {
        assert_eq!(Reply::Ok.wire_line(), Some("OK"));
        assert_eq!(Reply::Error.wire_line(), Some("ERROR"));
        assert_eq!(Reply::NoSeeds.wire_line(), Some("ERROR:NO_SEEDS"));
        assert_eq!(Reply::Exit.wire_line(), None);
    }
}
