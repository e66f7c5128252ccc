//! Relay mode: who is authoritative over the ventilation relay.

use serde::{Deserialize, Serialize};

use crate::error::InvalidModeError;

/// Mode overlay owned by the actuator controller.
///
/// Names follow the installation's panel labels: `Hand` is manual, `Aus` is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RelayMode {
    /// The regulation state machine drives the relay.
    #[default]
    Auto,
    /// Manual commands drive the relay; automatic commands still pass.
    Hand,
    /// Relay held off; automatic commands still pass but the regulator is suspended.
    Aus,
}

impl RelayMode {
    /// Canonical name, as accepted by [`FromStr`](std::str::FromStr).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "Auto",
            Self::Hand => "Hand",
            Self::Aus => "Aus",
        }
    }
}

impl std::fmt::Display for RelayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RelayMode {
    type Err = InvalidModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Auto" => Ok(Self::Auto),
            "Hand" => Ok(Self::Hand),
            "Aus" => Ok(Self::Aus),
            other => Err(InvalidModeError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_auto() {
        assert_eq!(RelayMode::default(), RelayMode::Auto);
    }

    #[test]
    fn should_parse_known_names() {
        assert_eq!("Auto".parse::<RelayMode>(), Ok(RelayMode::Auto));
        assert_eq!("Hand".parse::<RelayMode>(), Ok(RelayMode::Hand));
        assert_eq!("Aus".parse::<RelayMode>(), Ok(RelayMode::Aus));
    }

    #[test]
    fn should_reject_unknown_or_differently_cased_names() {
        assert_eq!(
            "auto".parse::<RelayMode>(),
            Err(InvalidModeError("auto".to_string()))
        );
        assert!("Off".parse::<RelayMode>().is_err());
    }

    #[test]
    fn should_display_canonical_name() {
        assert_eq!(RelayMode::Hand.to_string(), "Hand");
    }

    #[test]
    fn should_serialize_as_canonical_name() {
        let json = serde_json::to_string(&RelayMode::Aus).unwrap();
        assert_eq!(json, "\"Aus\"");
        let parsed: RelayMode = serde_json::from_str("\"Hand\"").unwrap();
        assert_eq!(parsed, RelayMode::Hand);
    }
}
