use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a corpus question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(u64);

impl QuestionId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for QuestionId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Granularity of a javadoc entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JavadocKind {
    Class,
    Method,
}

/// A question with its combined similarity to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredQuestion {
    pub id: QuestionId,
    pub score: f32,
}

/// One recommended API.
///
/// `full_name` is always non-empty and unique within one recommendation list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRecommendation {
    pub full_name: String,
    pub description: String,
    pub score: f32,
}

/// The single best-matching corpus question for a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionMatch {
    pub id: QuestionId,
    pub title: String,
    pub score: f32,
}

/// Strip a trailing parameter list: `a.B.m(String)` -> `a.B.m`.
pub fn strip_parameters(name: &str) -> &str {
    match name.find('(') {
        Some(open) => name[..open].trim_end(),
        None => name,
    }
}

/// Owning type of a method name: `a.B.m(String)` -> `a.B`.
pub fn owning_class(name: &str) -> Option<&str> {
    let bare = strip_parameters(name);
    bare.rfind('.').map(|dot| &bare[..dot])
}
