//! Read-only indices over the question corpus and the javadoc corpus.

pub mod corpus;
pub mod javadoc;
pub mod records;

pub use corpus::{CorpusIndex, Question};
pub use javadoc::{JavadocEntry, JavadocIndex};
pub use records::{
    BuildReport, JavadocRecord, JsonLines, QuestionRecord, SkipReason, read_json_lines,
};
