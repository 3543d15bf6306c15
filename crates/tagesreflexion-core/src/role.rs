//! The two fixed journal participants.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// One of exactly two journal participants.
///
/// The lowercase names are also the values stored in the database and used
/// on the wire.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Mann,
  Frau,
}

impl Role {
  pub const ALL: [Role; 2] = [Role::Mann, Role::Frau];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Mann => "mann",
      Self::Frau => "frau",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "mann" => Ok(Self::Mann),
      "frau" => Ok(Self::Frau),
      other => Err(Error::UnknownRole(other.to_owned())),
    }
  }
}
