//! Entries: one role's structured reflection for one day.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, Role, day::DayId};

// ─── Normalisation ───────────────────────────────────────────────────────────

/// Converts CRLF line endings to LF and trims surrounding whitespace.
pub fn normalize_text(s: &str) -> String {
  s.replace("\r\n", "\n").trim().to_owned()
}

fn is_blank(s: &str) -> bool { normalize_text(s).is_empty() }

// ─── Required fields ─────────────────────────────────────────────────────────

/// The fixed set of fields every entry carries. All of them are required
/// before a day may close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryField {
  #[serde(rename = "general_1")]
  General1,
  #[serde(rename = "general_2")]
  General2,
  PartnerSpecific,
  #[serde(rename = "children1_gratitude")]
  Children1Gratitude,
  #[serde(rename = "children2_gratitude")]
  Children2Gratitude,
}

impl EntryField {
  pub const ALL: [EntryField; 5] = [
    EntryField::General1,
    EntryField::General2,
    EntryField::PartnerSpecific,
    EntryField::Children1Gratitude,
    EntryField::Children2Gratitude,
  ];

  /// Column name in the `entries` table; also the JSON key.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::General1 => "general_1",
      Self::General2 => "general_2",
      Self::PartnerSpecific => "partner_specific",
      Self::Children1Gratitude => "children1_gratitude",
      Self::Children2Gratitude => "children2_gratitude",
    }
  }
}

impl fmt::Display for EntryField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── EntryFields ─────────────────────────────────────────────────────────────

/// The free-text payload of an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFields {
  #[serde(default)]
  pub general_1:           String,
  #[serde(default)]
  pub general_2:           String,
  #[serde(default)]
  pub partner_specific:    String,
  #[serde(default)]
  pub children1_gratitude: String,
  #[serde(default)]
  pub children2_gratitude: String,
}

impl EntryFields {
  pub fn get(&self, field: EntryField) -> &str {
    match field {
      EntryField::General1 => &self.general_1,
      EntryField::General2 => &self.general_2,
      EntryField::PartnerSpecific => &self.partner_specific,
      EntryField::Children1Gratitude => &self.children1_gratitude,
      EntryField::Children2Gratitude => &self.children2_gratitude,
    }
  }

  /// Normalise every field, failing on the first one that ends up empty.
  pub fn normalized(&self) -> Result<Self> {
    if let Some(field) = self.first_blank() {
      return Err(Error::EmptyField(field));
    }
    Ok(Self {
      general_1:           normalize_text(&self.general_1),
      general_2:           normalize_text(&self.general_2),
      partner_specific:    normalize_text(&self.partner_specific),
      children1_gratitude: normalize_text(&self.children1_gratitude),
      children2_gratitude: normalize_text(&self.children2_gratitude),
    })
  }

  /// True iff no required field is blank after normalisation.
  pub fn is_complete(&self) -> bool { self.first_blank().is_none() }

  fn first_blank(&self) -> Option<EntryField> {
    EntryField::ALL.into_iter().find(|f| is_blank(self.get(*f)))
  }
}

// ─── Entry ───────────────────────────────────────────────────────────────────

/// A stored entry. Rows are pre-created empty when a day opens, so an entry
/// exists for every (day, role) pair even before anything was written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
  pub day_id:     DayId,
  pub role:       Role,
  #[serde(flatten)]
  pub fields:     EntryFields,
  /// When the empty row was created. `None` for rows from older stores.
  pub created_at: Option<DateTime<Utc>>,
  /// `None` until the first successful submission.
  pub updated_at: Option<DateTime<Utc>>,
}
