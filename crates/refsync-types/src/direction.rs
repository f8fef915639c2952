use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The direction of a transfer, shared by connections and refspecs.
///
/// A fetch refspec maps remote names (source) onto local tracking names
/// (destination); a push refspec maps local names onto remote names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Fetch,
    Push,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Fetch => "fetch",
            Direction::Push => "push",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fetch" => Ok(Direction::Fetch),
            "push" => Ok(Direction::Push),
            other => Err(TypeError::UnknownDirection(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree() {
        for d in [Direction::Fetch, Direction::Push] {
            assert_eq!(d.to_string().parse::<Direction>().unwrap(), d);
        }
    }

    #[test]
    fn unknown_direction_rejected() {
        assert_eq!(
            "sideways".parse::<Direction>(),
            Err(TypeError::UnknownDirection("sideways".into()))
        );
    }

    #[test]
    fn serde_uses_lowercase() {
        let json = serde_json::to_string(&Direction::Push).unwrap();
        assert_eq!(json, "\"push\"");
    }
}
