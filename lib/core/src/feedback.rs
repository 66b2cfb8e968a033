use crate::product::NEIGHBOUR_SLOTS;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Categorical quality rating for one recommended product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    Bad,
    Medium,
    Good,
}

impl Rating {
    pub const ALL: [Rating; 3] = [Rating::Bad, Rating::Medium, Rating::Good];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Bad => "Bad",
            Rating::Medium => "Medium",
            Rating::Good => "Good",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bad" => Ok(Rating::Bad),
            "medium" => Ok(Rating::Medium),
            "good" => Ok(Rating::Good),
            other => Err(Error::InvalidFeedback(format!("unknown rating '{}'", other))),
        }
    }
}

/// A validated feedback entry: one chosen product, four rated neighbours
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackEntry {
    pub chosen: String,
    pub recommended: [String; NEIGHBOUR_SLOTS],
    pub ratings: [Rating; NEIGHBOUR_SLOTS],
    pub comment: Option<String>,
}

impl FeedbackEntry {
    /// Validate a submission.
    ///
    /// Exactly four recommended ids and four ratings are required. An empty
    /// comment is stored as `None`; any other comment, whitespace included,
    /// is kept byte-for-byte.
    pub fn new(
        chosen: impl Into<String>,
        recommended: Vec<String>,
        ratings: Vec<Rating>,
        comment: Option<String>,
    ) -> Result<Self> {
        let chosen = chosen.into();
        if chosen.trim().is_empty() {
            return Err(Error::InvalidFeedback("no chosen product".to_string()));
        }

        let recommended: [String; NEIGHBOUR_SLOTS] = recommended.try_into().map_err(|ids: Vec<String>| {
            Error::InvalidFeedback(format!(
                "expected {} recommended products, got {}",
                NEIGHBOUR_SLOTS,
                ids.len()
            ))
        })?;
        if recommended.iter().any(|id| id.trim().is_empty()) {
            return Err(Error::InvalidFeedback("empty recommended product id".to_string()));
        }

        let ratings: [Rating; NEIGHBOUR_SLOTS] = ratings.try_into().map_err(|r: Vec<Rating>| {
            Error::InvalidFeedback(format!("expected {} ratings, got {}", NEIGHBOUR_SLOTS, r.len()))
        })?;

        let comment = comment.filter(|c| !c.is_empty());

        Ok(Self {
            chosen,
            recommended,
            ratings,
            comment,
        })
    }

    /// Text-only row as written to the feedback store
    pub fn to_row(&self) -> FeedbackRow {
        let [p1, p2, p3, p4] = self.recommended.clone();
        let [r1, r2, r3, r4] = self.ratings.map(|r| r.to_string());
        FeedbackRow {
            chosen_product: self.chosen.clone(),
            product_1: p1,
            rating_1: r1,
            product_2: p2,
            rating_2: r2,
            product_3: p3,
            rating_3: r3,
            product_4: p4,
            rating_4: r4,
            comment: self.comment.clone(),
        }
    }
}

/// Wire form of a feedback entry; every field is text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRow {
    pub chosen_product: String,
    pub product_1: String,
    pub rating_1: String,
    pub product_2: String,
    pub rating_2: String,
    pub product_3: String,
    pub rating_3: String,
    pub product_4: String,
    pub rating_4: String,
    pub comment: Option<String>,
}

impl FeedbackRow {
    /// Recommended products paired with their ratings, slot order
    pub fn pairs(&self) -> [(&str, &str); NEIGHBOUR_SLOTS] {
        [
            (&self.product_1, &self.rating_1),
            (&self.product_2, &self.rating_2),
            (&self.product_3, &self.rating_3),
            (&self.product_4, &self.rating_4),
        ]
    }
}

/// Store-assigned row identifier.
///
/// Anything a store hands back is accepted; ids that are neither integers,
/// UUIDs nor strings are kept as raw JSON so one odd row cannot fail a read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeedbackId {
    Integer(i64),
    Uuid(Uuid),
    String(String),
    Other(serde_json::Value),
}

impl fmt::Display for FeedbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackId::Integer(i) => write!(f, "{}", i),
            FeedbackId::Uuid(u) => write!(f, "{}", u),
            FeedbackId::String(s) => write!(f, "{}", s),
            FeedbackId::Other(v) => write!(f, "{}", v),
        }
    }
}

/// A row read back from the feedback store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFeedback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FeedbackId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub row: FeedbackRow,
}
