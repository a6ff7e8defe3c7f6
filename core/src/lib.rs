pub mod payment;
pub mod record;
pub mod status;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Domain types, in the shape the hosted document database serves them
// ---------------------------------------------------------------------------

/// Payment map keyed by participant id. One record per participant per
/// division/league context; a later write replaces the prior record entirely.
/// BTreeMap so aggregation order (and therefore report output) is stable.
pub type PaymentMap = BTreeMap<String, PaymentRecord>;

/// The single most-recent payment recorded for one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    #[serde(default, deserialize_with = "de::lenient_money")]
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub method: String, // "venmo", "cash", "check", ...
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub recorded_by: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    #[default]
    Individual, // each participant owes the entry fee
    Group, // one fee covers the whole team
}

/// Registration state of a single division. Capacity bookkeeping only;
/// the payment aggregators never read it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivisionStatus {
    #[default]
    Open,
    Full,
    Closed,
}

/// A named sub-category of a tournament ("Mixed Doubles – Intermediate")
/// with its own fee, participant list, and payment map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Division {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub event_type: String, // "mens_doubles", "mixed_doubles", ...
    #[serde(default)]
    pub skill_level: String,
    #[serde(default, deserialize_with = "de::lenient_money")]
    pub entry_fee: Decimal,
    #[serde(default)]
    pub max_participants: Option<u32>,
    #[serde(default)]
    pub payment_mode: PaymentMode,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub payment_data: PaymentMap,
    #[serde(default)]
    pub status: DivisionStatus,
}

/// Tournament roster, as stored. Older tournament documents predate the
/// division model and carry a flat fee/participants/payment map directly;
/// the two shapes are never mixed within one entity. Untagged so both load
/// transparently; documents with a `divisions` array take the first arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Roster {
    Divisions { divisions: Vec<Division> },
    Flat(FlatRoster),
}

impl Default for Roster {
    fn default() -> Self {
        Roster::Flat(FlatRoster::default())
    }
}

/// Legacy flat tournament roster (single implicit division).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatRoster {
    #[serde(default, deserialize_with = "de::lenient_money")]
    pub entry_fee: Decimal,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub payment_data: PaymentMap,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: TournamentStatus,
    #[serde(default)]
    pub event_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub registration_deadline: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub roster: Roster,
}

impl Tournament {
    /// Total participants across every division, fee-bearing or not.
    /// Distinct from the financial summary's participant count, which only
    /// covers fee-bearing divisions.
    pub fn participant_count(&self) -> usize {
        match &self.roster {
            Roster::Divisions { divisions } => {
                divisions.iter().map(|d| d.participants.len()).sum()
            }
            Roster::Flat(flat) => flat.participants.len(),
        }
    }

    /// At least one division with one or more participants. A legacy flat
    /// roster counts as a single division here.
    pub fn has_active_participants(&self) -> bool {
        match &self.roster {
            Roster::Divisions { divisions } => {
                divisions.iter().any(|d| !d.participants.is_empty())
            }
            Roster::Flat(flat) => !flat.participants.is_empty(),
        }
    }

    /// Find a division by id. Legacy flat tournaments have none.
    pub fn find_division(&self, division_id: &str) -> Option<&Division> {
        match &self.roster {
            Roster::Divisions { divisions } => divisions.iter().find(|d| d.id == division_id),
            Roster::Flat(_) => None,
        }
    }

    pub fn find_division_mut(&mut self, division_id: &str) -> Option<&mut Division> {
        match &mut self.roster {
            Roster::Divisions { divisions } => {
                divisions.iter_mut().find(|d| d.id == division_id)
            }
            Roster::Flat(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct League {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: LeagueStatus,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de::lenient_money")]
    pub registration_fee: Decimal,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub payment_data: PaymentMap,
}

/// Tournament lifecycle. `completed` and `archived` are sticky: the status
/// automation engine never overwrites them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    #[default]
    Draft,
    RegistrationOpen,
    Registered,
    InProgress,
    Completed,
    Archived,
}

impl TournamentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TournamentStatus::Draft => "Draft",
            TournamentStatus::RegistrationOpen => "Registration Open",
            TournamentStatus::Registered => "Registered",
            TournamentStatus::InProgress => "In Progress",
            TournamentStatus::Completed => "Completed",
            TournamentStatus::Archived => "Archived",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TournamentStatus::Completed | TournamentStatus::Archived)
    }
}

/// League lifecycle. Leagues skip the draft/registration phases: they are
/// created as `registered` and move on dates alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeagueStatus {
    #[default]
    Registered,
    Active,
    Completed,
    Archived,
}

impl LeagueStatus {
    pub fn label(&self) -> &'static str {
        match self {
            LeagueStatus::Registered => "Registered",
            LeagueStatus::Active => "Active",
            LeagueStatus::Completed => "Completed",
            LeagueStatus::Archived => "Archived",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LeagueStatus::Completed | LeagueStatus::Archived)
    }
}

/// The portfolio snapshot document: everything the club currently runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClubSnapshot {
    #[serde(default)]
    pub tournaments: Vec<Tournament>,
    #[serde(default)]
    pub leagues: Vec<League>,
}

// ---------------------------------------------------------------------------
// Lenient deserialization for fields written by older clients
// ---------------------------------------------------------------------------

pub(crate) mod de {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer};

    /// Money fields degrade rather than fail: a JSON number or numeric
    /// string parses normally, anything else (null, garbage) reads as zero
    /// so one bad record never sinks a whole snapshot load.
    pub fn lenient_money<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let parsed = match &value {
            serde_json::Value::Number(n) => n.to_string().parse().ok(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        Ok(parsed.unwrap_or(Decimal::ZERO))
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
