//! Puzzle instances and submitted answers.
//!
//! A [`PuzzleSpec`] is generated once per round and never changes afterwards.
//! It carries everything the evaluator needs, including the correct answer.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::graph::{Graph, NodeId};

/// Games in the battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    /// Grid recall: remember the order in which cells lit up.
    SequenceRecall,
    /// Follow a token walking over a grid.
    DirectionPath,
    /// Shortest-route questions over a landmark map.
    MapNavigation,
    /// Face-name association.
    FaceName,
    /// Structured multi-domain screening questionnaire.
    Screening,
}

impl GameKind {
    pub const ALL: [Self; 5] = [
        Self::SequenceRecall,
        Self::DirectionPath,
        Self::MapNavigation,
        Self::FaceName,
        Self::Screening,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SequenceRecall => "sequence_recall",
            Self::DirectionPath => "direction_path",
            Self::MapNavigation => "map_navigation",
            Self::FaceName => "face_name",
            Self::Screening => "screening",
        }
    }

    /// Two-letter prefix used in replay codes.
    #[must_use]
    pub const fn code_prefix(self) -> &'static str {
        match self {
            Self::SequenceRecall => "SQ",
            Self::DirectionPath => "DR",
            Self::MapNavigation => "MP",
            Self::FaceName => "FN",
            Self::Screening => "SC",
        }
    }

    #[must_use]
    pub fn from_code_prefix(prefix: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.code_prefix().eq_ignore_ascii_case(prefix))
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::SequenceRecall => "Repeat the order in which grid cells lit up",
            Self::DirectionPath => "Track a token walking across a grid",
            Self::MapNavigation => "Pick the first stop on the shortest route between landmarks",
            Self::FaceName => "Match faces to the names learned a moment ago",
            Self::Screening => "Multi-domain cognitive screening questionnaire",
        }
    }

    /// Whether rounds are worth fixed points (games) or averaged per domain.
    #[must_use]
    pub const fn is_screening(self) -> bool {
        matches!(self, Self::Screening)
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().replace('-', "_").to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == needle)
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Row and column delta of one step.
    #[must_use]
    pub const fn delta(self) -> (i16, i16) {
        match self {
            Self::Up => (-1, 0),
            Self::Down => (1, 0),
            Self::Left => (0, -1),
            Self::Right => (0, 1),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            _ => Err(()),
        }
    }
}

/// Cell on a square grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: u8,
    pub col: u8,
}

impl Cell {
    #[must_use]
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// The neighbouring cell in `direction`, if it stays on an `side`×`side` grid.
    #[must_use]
    pub fn step(self, direction: Direction, side: u8) -> Option<Self> {
        let (dr, dc) = direction.delta();
        let row = i16::from(self.row) + dr;
        let col = i16::from(self.col) + dc;
        let limit = i16::from(side);
        if row < 0 || col < 0 || row >= limit || col >= limit {
            return None;
        }
        Some(Self {
            row: u8::try_from(row).ok()?,
            col: u8::try_from(col).ok()?,
        })
    }

    /// Row-major index on an `side`×`side` grid.
    #[must_use]
    pub fn index(self, side: u8) -> usize {
        usize::from(self.row) * usize::from(side) + usize::from(self.col)
    }

    #[must_use]
    pub fn from_index(index: usize, side: u8) -> Option<Self> {
        let side = usize::from(side);
        if side == 0 || index >= side * side {
            return None;
        }
        Some(Self {
            row: u8::try_from(index / side).ok()?,
            col: u8::try_from(index % side).ok()?,
        })
    }

    #[must_use]
    pub fn in_bounds(self, side: u8) -> bool {
        self.row < side && self.col < side
    }
}

/// Walk steps, stored inline for typical lengths.
pub type StepList = SmallVec<[Direction; 8]>;

/// Follow `steps` from `start`, returning `None` if the walk leaves the grid.
#[must_use]
pub fn walk(start: Cell, steps: &[Direction], side: u8) -> Option<Cell> {
    if !start.in_bounds(side) {
        return None;
    }
    steps
        .iter()
        .try_fold(start, |cell, direction| cell.step(*direction, side))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceSpec {
    /// Side of the square grid.
    pub grid_size: u8,
    pub length: u8,
    /// Row-major cell indices in presentation order.
    pub cells: Vec<usize>,
}

/// How a direction round is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DirectionPrompt {
    /// Re-enter the whole walk.
    #[default]
    Replay,
    /// Multiple choice: which way was move `k`?
    StepRecall,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "prompt", rename_all = "snake_case")]
pub enum DirectionQuestion {
    Replay,
    StepRecall {
        /// Zero-based index of the asked move.
        index: usize,
        options: Vec<Direction>,
        answer: Direction,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionSpec {
    pub grid: u8,
    pub start: Cell,
    pub steps: StepList,
    pub target: Cell,
    pub question: DirectionQuestion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSpec {
    pub graph: Rc<Graph>,
    pub from: NodeId,
    pub to: NodeId,
    /// Shortest route from `from` to `to`, both ends included.
    pub path: Vec<NodeId>,
    pub options: Vec<String>,
    /// Name of the first stop after `from` on `path`.
    pub answer: String,
}

impl MapSpec {
    #[must_use]
    pub fn from_name(&self) -> &str {
        self.graph.name(self.from).unwrap_or_default()
    }

    #[must_use]
    pub fn to_name(&self) -> &str {
        self.graph.name(self.to).unwrap_or_default()
    }

    /// Landmark names along the shortest route.
    #[must_use]
    pub fn path_names(&self) -> Vec<String> {
        self.path
            .iter()
            .filter_map(|id| self.graph.name(*id).map(str::to_string))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceIdentity {
    pub id: String,
    pub name: String,
    /// Asset key of the portrait; rendering belongs to the host.
    #[serde(default)]
    pub portrait: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceSpec {
    /// Faces shown with their names during presentation.
    pub identities: Vec<FaceIdentity>,
    /// Index into `identities` of the face shown when answering.
    pub probe: usize,
    pub options: Vec<String>,
    pub answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Text,
    Choice,
    MemoryRecall,
    DelayedRecall,
    SerialSubtraction,
    Similarity,
    Fluency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CognitiveDomain {
    Orientation,
    Memory,
    Attention,
    Language,
    Executive,
}

impl CognitiveDomain {
    pub const ALL: [Self; 5] = [
        Self::Orientation,
        Self::Memory,
        Self::Attention,
        Self::Language,
        Self::Executive,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Orientation => "orientation",
            Self::Memory => "memory",
            Self::Attention => "attention",
            Self::Language => "language",
            Self::Executive => "executive",
        }
    }
}

/// Question body; the variant is the question type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionPayload {
    Text { accepted: Vec<String> },
    Choice { options: Vec<String>, answer: String },
    MemoryRecall { words: Vec<String> },
    DelayedRecall { words: Vec<String> },
    SerialSubtraction { start: i32, step: i32, count: u8 },
    Similarity { accepted: Vec<String> },
    Fluency { category: String, target_min: u8 },
}

impl QuestionPayload {
    #[must_use]
    pub const fn q_type(&self) -> QuestionType {
        match self {
            Self::Text { .. } => QuestionType::Text,
            Self::Choice { .. } => QuestionType::Choice,
            Self::MemoryRecall { .. } => QuestionType::MemoryRecall,
            Self::DelayedRecall { .. } => QuestionType::DelayedRecall,
            Self::SerialSubtraction { .. } => QuestionType::SerialSubtraction,
            Self::Similarity { .. } => QuestionType::Similarity,
            Self::Fluency { .. } => QuestionType::Fluency,
        }
    }

    /// Expected values of a serial subtraction run, e.g. 100-7 → `[93, 86, ...]`.
    #[must_use]
    pub fn subtraction_sequence(start: i32, step: i32, count: u8) -> Vec<i32> {
        (1..=i32::from(count))
            .map(|n| start.saturating_sub(step.saturating_mul(n)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningQuestionSpec {
    pub id: String,
    pub domain: CognitiveDomain,
    pub prompt: String,
    pub payload: QuestionPayload,
}

impl ScreeningQuestionSpec {
    #[must_use]
    pub const fn q_type(&self) -> QuestionType {
        self.payload.q_type()
    }
}

/// One round's challenge, tagged by game family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "spec", rename_all = "snake_case")]
pub enum PuzzleSpec {
    Sequence(SequenceSpec),
    Direction(DirectionSpec),
    Map(MapSpec),
    Face(FaceSpec),
    Screening(ScreeningQuestionSpec),
}

impl PuzzleSpec {
    #[must_use]
    pub const fn kind(&self) -> GameKind {
        match self {
            Self::Sequence(_) => GameKind::SequenceRecall,
            Self::Direction(_) => GameKind::DirectionPath,
            Self::Map(_) => GameKind::MapNavigation,
            Self::Face(_) => GameKind::FaceName,
            Self::Screening(_) => GameKind::Screening,
        }
    }

    /// Multiple-choice options shown while responding, if any.
    #[must_use]
    pub fn text_options(&self) -> Option<&[String]> {
        match self {
            Self::Map(spec) => Some(&spec.options),
            Self::Face(spec) => Some(&spec.options),
            Self::Screening(ScreeningQuestionSpec {
                payload: QuestionPayload::Choice { options, .. },
                ..
            }) => Some(options),
            _ => None,
        }
    }

    /// Number of single-step inputs that make up a full answer, for puzzles
    /// answered one tap at a time.
    #[must_use]
    pub fn step_count(&self) -> Option<usize> {
        match self {
            Self::Sequence(spec) => Some(spec.cells.len()),
            Self::Direction(DirectionSpec {
                steps,
                question: DirectionQuestion::Replay,
                ..
            }) => Some(steps.len()),
            _ => None,
        }
    }

    /// Stimulus items shown during presentation; 0 means nothing to memorise.
    #[must_use]
    pub fn stimulus_items(&self) -> usize {
        match self {
            Self::Sequence(spec) => spec.cells.len(),
            Self::Direction(spec) => spec.steps.len(),
            Self::Map(spec) => spec.graph.node_count(),
            Self::Face(spec) => spec.identities.len(),
            Self::Screening(ScreeningQuestionSpec {
                payload: QuestionPayload::MemoryRecall { words },
                ..
            }) => words.len(),
            Self::Screening(_) => 0,
        }
    }

    /// The canonical correct submission.
    #[must_use]
    pub fn expected_answer(&self) -> Answer {
        match self {
            Self::Sequence(spec) => Answer::Cells(spec.cells.clone()),
            Self::Direction(spec) => match &spec.question {
                DirectionQuestion::Replay => Answer::Steps(spec.steps.to_vec()),
                DirectionQuestion::StepRecall { answer, .. } => Answer::Choice(answer.to_string()),
            },
            Self::Map(spec) => Answer::Choice(spec.answer.clone()),
            Self::Face(spec) => Answer::Choice(spec.answer.clone()),
            Self::Screening(question) => match &question.payload {
                QuestionPayload::Text { accepted } | QuestionPayload::Similarity { accepted } => {
                    Answer::Text(accepted.first().cloned().unwrap_or_default())
                }
                QuestionPayload::Choice { answer, .. } => Answer::Choice(answer.clone()),
                QuestionPayload::MemoryRecall { words } | QuestionPayload::DelayedRecall { words } => {
                    Answer::Words(words.clone())
                }
                QuestionPayload::SerialSubtraction { start, step, count } => Answer::Numbers(
                    QuestionPayload::subtraction_sequence(*start, *step, *count),
                ),
                QuestionPayload::Fluency {
                    category,
                    target_min,
                } => Answer::Items(
                    (1..=*target_min)
                        .map(|n| format!("{category} {n}"))
                        .collect(),
                ),
            },
        }
    }
}

/// A user submission. Shapes that do not fit the round's puzzle are valid
/// inputs and simply score zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Answer {
    /// One tapped cell of a sequence.
    Cell(usize),
    Cells(Vec<usize>),
    /// One move of a direction walk.
    Step(Direction),
    Steps(Vec<Direction>),
    /// Final cell of a direction walk.
    Target(Cell),
    Choice(String),
    /// Landmark names from start to goal.
    Route(Vec<String>),
    Text(String),
    Words(Vec<String>),
    Numbers(Vec<i32>),
    Items(Vec<String>),
    /// No submission (e.g. the response window ran out).
    Empty,
}

impl Answer {
    /// Whether this is a single step of a multi-step answer.
    #[must_use]
    pub const fn is_step(&self) -> bool {
        matches!(self, Self::Cell(_) | Self::Step(_))
    }
}
