use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier assigned by whichever backend created the record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpinionId(pub String);

impl OpinionId {
    /// Fresh random id, used by backends that assign ids themselves.
    pub fn generate() -> Self {
        OpinionId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OpinionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OpinionId {
    fn from(s: &str) -> Self {
        OpinionId(s.to_string())
    }
}

/// The three positions a student can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    #[default]
    Beneficial,
    Detrimental,
    Neutral,
}

impl Stance {
    pub const ALL: [Stance; 3] = [Stance::Beneficial, Stance::Detrimental, Stance::Neutral];

    /// Wire/storage form: lowercase tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stance::Beneficial => "beneficial",
            Stance::Detrimental => "detrimental",
            Stance::Neutral => "neutral",
        }
    }

    /// Capitalized label for the feed badge.
    pub fn label(&self) -> &'static str {
        match self {
            Stance::Beneficial => "Beneficial",
            Stance::Detrimental => "Detrimental",
            Stance::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStance(pub String);

impl fmt::Display for UnknownStance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown stance '{}'", self.0)
    }
}

impl FromStr for Stance {
    type Err = UnknownStance;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beneficial" => Ok(Stance::Beneficial),
            "detrimental" => Ok(Stance::Detrimental),
            "neutral" => Ok(Stance::Neutral),
            other => Err(UnknownStance(other.to_string())),
        }
    }
}

/// A submitted opinion. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opinion {
    pub id: OpinionId,
    pub name: String,
    pub partner: String,
    pub stance: Stance,
    pub opinion: String,
    pub timestamp: DateTime<Utc>,
}

/// Create payload handed to a store; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpinionRecord {
    pub name: String,
    pub partner: String,
    pub stance: Stance,
    pub opinion: String,
    pub timestamp: DateTime<Utc>,
}

impl OpinionRecord {
    pub fn into_opinion(self, id: OpinionId) -> Opinion {
        Opinion {
            id,
            name: self.name,
            partner: self.partner,
            stance: self.stance,
            opinion: self.opinion,
            timestamp: self.timestamp,
        }
    }
}

/// Per-stance counts over a list of opinions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub beneficial: usize,
    pub detrimental: usize,
    pub neutral: usize,
}

impl Tally {
    pub fn of(opinions: &[Opinion]) -> Self {
        let count = |stance: Stance| opinions.iter().filter(|o| o.stance == stance).count();
        Tally {
            beneficial: count(Stance::Beneficial),
            detrimental: count(Stance::Detrimental),
            neutral: count(Stance::Neutral),
        }
    }

    pub fn total(&self) -> usize {
        self.beneficial + self.detrimental + self.neutral
    }
}

/// Form input for submitting an opinion from the board page.
/// Missing fields deserialize empty so validation can report them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OpinionForm {
    pub name: String,
    pub partner: String,
    pub stance: String,
    pub opinion: String,
    pub csrf_token: String,
}

/// Form input for delete buttons in the feed.
#[derive(Debug, Clone, Deserialize)]
pub struct CsrfOnlyForm {
    pub csrf_token: String,
}
