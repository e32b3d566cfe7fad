use chrono::{DateTime, Utc};
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::{CardError, NormalizedUrl};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    S,
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Rank {
    pub const ALL: [Rank; 7] = [Rank::S, Rank::A, Rank::B, Rank::C, Rank::D, Rank::E, Rank::F];

    pub const fn as_str(self) -> &'static str {
        use Rank::*;
        match self {
            S => "S",
            A => "A",
            B => "B",
            C => "C",
            D => "D",
            E => "E",
            F => "F",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rank {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rank::ALL
            .into_iter()
            .find(|rank| rank.as_str() == s.trim())
            .ok_or_else(|| CardError::InvalidRank(s.to_string()))
    }
}

/// Power values are kept within `1..=10`.
pub type Power = u8;

pub const POWER_RANGE: core::ops::RangeInclusive<i64> = 1..=10;

pub const HIDDEN_ADVANTAGE_MAX_CHARS: usize = 100;

/// The generated stats for one site, always complete and within range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawPowerStats")]
pub struct PowerStats {
    rank: Rank,
    attack_power: Power,
    defence_power: Power,
    hidden_advantage: String,
}

impl PowerStats {
    pub fn new(
        rank: Rank,
        attack_power: i64,
        defence_power: i64,
        hidden_advantage: impl Into<String>,
    ) -> Result<Self, CardError> {
        let attack_power = check_power("attackPower", attack_power)?;
        let defence_power = check_power("defencePower", defence_power)?;

        let hidden_advantage = hidden_advantage.into().trim().to_string();
        if hidden_advantage.is_empty() {
            return Err(CardError::EmptyHiddenAdvantage);
        }
        let chars = hidden_advantage.chars().count();
        if chars > HIDDEN_ADVANTAGE_MAX_CHARS {
            return Err(CardError::HiddenAdvantageTooLong(chars));
        }

        Ok(Self {
            rank,
            attack_power,
            defence_power,
            hidden_advantage,
        })
    }

    /// Validates a loosely typed record, as received from a remote generator.
    pub fn from_parts(
        rank: &str,
        attack_power: i64,
        defence_power: i64,
        hidden_advantage: impl Into<String>,
    ) -> Result<Self, CardError> {
        Self::new(rank.parse()?, attack_power, defence_power, hidden_advantage)
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn attack_power(&self) -> Power {
        self.attack_power
    }

    pub fn defence_power(&self) -> Power {
        self.defence_power
    }

    pub fn hidden_advantage(&self) -> &str {
        &self.hidden_advantage
    }
}

/// Wire shape of [`PowerStats`] before validation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPowerStats {
    rank: String,
    attack_power: i64,
    defence_power: i64,
    hidden_advantage: String,
}

impl TryFrom<RawPowerStats> for PowerStats {
    type Error = CardError;

    fn try_from(raw: RawPowerStats) -> Result<Self, Self::Error> {
        Self::from_parts(
            &raw.rank,
            raw.attack_power,
            raw.defence_power,
            raw.hidden_advantage,
        )
    }
}

fn check_power(field: &'static str, value: i64) -> Result<Power, CardError> {
    if POWER_RANGE.contains(&value) {
        Ok(value as Power)
    } else {
        Err(CardError::PowerOutOfRange { field, value })
    }
}

/// Screenshot image carried as a `data:` URI so it can be stored and rendered as is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Screenshot(String);

impl Screenshot {
    pub fn from_data_uri(uri: impl Into<String>) -> Result<Self, CardError> {
        let uri = uri.into();
        if uri.starts_with("data:image/") && uri.contains(";base64,") {
            Ok(Self(uri))
        } else {
            Err(CardError::InvalidScreenshot)
        }
    }

    pub fn as_data_uri(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Screenshot {
    type Error = CardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_data_uri(value)
    }
}

impl From<Screenshot> for String {
    fn from(value: Screenshot) -> Self {
        value.0
    }
}

/// The result record for one submitted URL. Immutable once assembled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    site_name: String,
    screenshot: Screenshot,
    #[serde(flatten)]
    stats: PowerStats,
    source_url: NormalizedUrl,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl Card {
    pub fn assemble(
        source_url: NormalizedUrl,
        screenshot: Screenshot,
        stats: PowerStats,
        description: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let description = description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        Self {
            site_name: source_url.site_name().to_string(),
            screenshot,
            stats,
            source_url,
            description,
            created_at,
        }
    }

    pub fn site_name(&self) -> &str {
        &self.site_name
    }

    pub fn screenshot(&self) -> &Screenshot {
        &self.screenshot
    }

    pub fn stats(&self) -> &PowerStats {
        &self.stats
    }

    pub fn rank(&self) -> Rank {
        self.stats.rank()
    }

    pub fn attack_power(&self) -> Power {
        self.stats.attack_power()
    }

    pub fn defence_power(&self) -> Power {
        self.stats.defence_power()
    }

    pub fn hidden_advantage(&self) -> &str {
        self.stats.hidden_advantage()
    }

    pub fn source_url(&self) -> &NormalizedUrl {
        &self.source_url
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
