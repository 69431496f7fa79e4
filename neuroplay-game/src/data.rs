//! Content catalogs: landmark maps, face identities and the screening bank.
//!
//! Bundled defaults are compiled in; hosts can supply their own (for example
//! localized) content through [`crate::DataLoader`].
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::rc::Rc;
use thiserror::Error;

use crate::graph::Graph;
use crate::puzzle::{CognitiveDomain, FaceIdentity};

const DEFAULT_MAPS_DATA: &str = include_str!("../assets/data/maps.json");
const DEFAULT_FACES_DATA: &str = include_str!("../assets/data/faces.json");
const DEFAULT_SCREENING_DATA: &str = include_str!("../assets/data/screening.json");

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to parse {asset}: {source}")]
    Parse {
        asset: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("content catalog `{0}` is empty")]
    Empty(&'static str),
    #[error("face name `{0}` appears more than once")]
    DuplicateFaceName(String),
    #[error("question id `{0}` appears more than once")]
    DuplicateQuestion(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MapCatalog {
    pub maps: Vec<Graph>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FaceCatalog {
    pub identities: Vec<FaceIdentity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ScreeningBank {
    pub questions: Vec<QuestionDef>,
}

/// Part of today's date an orientation question asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePart {
    Year,
    Month,
    Day,
    Weekday,
    Season,
}

const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];
const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];
const SEASON_NAMES: [&str; 4] = ["Winter", "Spring", "Summer", "Autumn"];

impl DatePart {
    /// Accepted answers for `today`. `labels` localizes month (12),
    /// weekday (7, Monday first) and season (4, winter first) names.
    #[must_use]
    pub fn accepted_answers(self, today: NaiveDate, labels: &[String]) -> Vec<String> {
        let label_or = |index: usize, fallback: &[&str]| {
            labels
                .get(index)
                .cloned()
                .or_else(|| fallback.get(index).map(|s| (*s).to_string()))
        };
        match self {
            Self::Year => vec![today.year().to_string()],
            Self::Day => vec![today.day().to_string()],
            Self::Month => {
                let index = usize::try_from(today.month0()).unwrap_or_default();
                let mut accepted = vec![today.month().to_string()];
                accepted.extend(label_or(index, &MONTH_NAMES[..]));
                accepted
            }
            Self::Weekday => {
                let index = usize::try_from(today.weekday().num_days_from_monday())
                    .unwrap_or_default();
                label_or(index, &WEEKDAY_NAMES[..]).into_iter().collect()
            }
            Self::Season => {
                // Meteorological seasons, northern hemisphere.
                let index = match today.month() {
                    3..=5 => 1,
                    6..=8 => 2,
                    9..=11 => 3,
                    _ => 0,
                };
                label_or(index, &SEASON_NAMES[..]).into_iter().collect()
            }
        }
    }
}

/// A screening question as authored in the bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDef {
    pub id: String,
    pub domain: CognitiveDomain,
    pub prompt: String,
    #[serde(flatten)]
    pub body: QuestionBody,
}

/// Authored question bodies. Date parts and delayed recall are resolved into
/// concrete payloads when a session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionBody {
    Text {
        accepted: Vec<String>,
    },
    DatePart {
        part: DatePart,
        #[serde(default)]
        labels: Vec<String>,
    },
    Choice {
        options: Vec<String>,
        answer: String,
    },
    MemoryRecall {
        words: Vec<String>,
    },
    DelayedRecall {
        /// Id of the earlier memory question whose words are asked for.
        recall_of: String,
    },
    SerialSubtraction {
        start: i32,
        step: i32,
        count: u8,
    },
    Similarity {
        accepted: Vec<String>,
    },
    Fluency {
        category: String,
        target_min: u8,
    },
}

/// Everything the generator draws from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameContent {
    pub maps: Vec<Rc<Graph>>,
    pub faces: Vec<FaceIdentity>,
    pub screening: Vec<QuestionDef>,
}

impl GameContent {
    /// Assemble content from parsed catalogs.
    ///
    /// # Errors
    ///
    /// Returns an error if a catalog is empty or contains duplicate names/ids.
    pub fn new(
        maps: MapCatalog,
        faces: FaceCatalog,
        screening: ScreeningBank,
    ) -> Result<Self, DataError> {
        if maps.maps.is_empty() {
            return Err(DataError::Empty("maps"));
        }
        if faces.identities.is_empty() {
            return Err(DataError::Empty("faces"));
        }
        if screening.questions.is_empty() {
            return Err(DataError::Empty("screening"));
        }
        let mut names = HashSet::new();
        for identity in &faces.identities {
            if !names.insert(identity.name.as_str()) {
                return Err(DataError::DuplicateFaceName(identity.name.clone()));
            }
        }
        let mut ids = HashSet::new();
        for question in &screening.questions {
            if !ids.insert(question.id.as_str()) {
                return Err(DataError::DuplicateQuestion(question.id.clone()));
            }
        }
        Ok(Self {
            maps: maps.maps.into_iter().map(Rc::new).collect(),
            faces: faces.identities,
            screening: screening.questions,
        })
    }

    /// Parse all three catalogs from JSON documents.
    ///
    /// # Errors
    ///
    /// Returns an error if any document fails to parse or validate.
    pub fn from_json(maps: &str, faces: &str, screening: &str) -> Result<Self, DataError> {
        let maps = serde_json::from_str(maps).map_err(|source| DataError::Parse {
            asset: "maps",
            source,
        })?;
        let faces = serde_json::from_str(faces).map_err(|source| DataError::Parse {
            asset: "faces",
            source,
        })?;
        let screening = serde_json::from_str(screening).map_err(|source| DataError::Parse {
            asset: "screening",
            source,
        })?;
        Self::new(maps, faces, screening)
    }

    /// Content compiled into the crate.
    ///
    /// # Errors
    ///
    /// Returns an error only if the bundled assets are malformed.
    pub fn bundled() -> Result<Self, DataError> {
        Self::from_json(DEFAULT_MAPS_DATA, DEFAULT_FACES_DATA, DEFAULT_SCREENING_DATA)
    }

    #[must_use]
    pub fn map(&self, id: &str) -> Option<Rc<Graph>> {
        self.maps.iter().find(|graph| graph.id() == id).cloned()
    }
}
