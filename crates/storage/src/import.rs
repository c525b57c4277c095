//! Reader for the tab-separated question bank format.
//!
//! One question per line:
//!
//! ```text
//! level<TAB>question<TAB>correct<TAB>wrong 1<TAB>wrong 2<TAB>wrong 3[<TAB>background info]
//! ```
//!
//! Lines starting with `#` and blank lines are skipped.

use millionaire_core::model::QuestionDraft;
use thiserror::Error;

const REQUIRED_COLUMNS: usize = 6;
const WRONG_ANSWER_COLUMNS: usize = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ImportError {
    #[error("line {line}: expected at least 6 tab-separated columns, found {found}")]
    Malformed { line: usize, found: usize },

    #[error("line {line}: invalid level {raw:?}")]
    InvalidLevel { line: usize, raw: String },
}

/// Parse a whole question file into drafts, in file order.
///
/// Drafts are not validated here; blank answers are reported when the draft
/// is validated on insert.
///
/// # Errors
///
/// Returns the first `ImportError` encountered; line numbers are 1-based.
pub fn parse_question_file(contents: &str) -> Result<Vec<QuestionDraft>, ImportError> {
    let mut drafts = Vec::new();

    for (index, raw_line) in contents.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw_line.trim_end_matches('\r');
        if trimmed.trim().is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let columns: Vec<&str> = trimmed.split('\t').collect();
        if columns.len() < REQUIRED_COLUMNS {
            return Err(ImportError::Malformed {
                line,
                found: columns.len(),
            });
        }

        let level = columns[0]
            .trim()
            .parse::<u32>()
            .map_err(|_| ImportError::InvalidLevel {
                line,
                raw: columns[0].to_owned(),
            })?;

        let wrong_answers = columns[3..3 + WRONG_ANSWER_COLUMNS]
            .iter()
            .map(|s| (*s).to_owned())
            .collect();
        let info = columns
            .get(REQUIRED_COLUMNS)
            .map(|s| (*s).to_owned())
            .filter(|s| !s.trim().is_empty());

        drafts.push(QuestionDraft {
            level,
            text: columns[1].to_owned(),
            correct_answer: columns[2].to_owned(),
            wrong_answers,
            info,
        });
    }

    Ok(drafts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_and_skips_comments() {
        let file = "#Difficulty\tQuestion\tCorrect\tA2\tA3\tA4\tInfo\n\
                    \n\
                    0\tCapital of France?\tParis\tLyon\tMarseille\tNice\tSince 987.\n\
                    1\tLargest planet?\tJupiter\tMars\tVenus\tEarth\r\n";

        let drafts = parse_question_file(file).unwrap();
        assert_eq!(drafts.len(), 2);

        assert_eq!(drafts[0].level, 0);
        assert_eq!(drafts[0].correct_answer, "Paris");
        assert_eq!(drafts[0].wrong_answers, vec!["Lyon", "Marseille", "Nice"]);
        assert_eq!(drafts[0].info.as_deref(), Some("Since 987."));

        assert_eq!(drafts[1].level, 1);
        assert_eq!(drafts[1].wrong_answers[2], "Earth");
        assert_eq!(drafts[1].info, None);
    }

    #[test]
    fn short_rows_are_rejected_with_line_number() {
        let file = "0\tQ\tA\tB\tC\tD\n2\tonly\tthree\n";
        let err = parse_question_file(file).unwrap_err();
        assert_eq!(err, ImportError::Malformed { line: 2, found: 3 });
    }

    #[test]
    fn non_numeric_level_is_rejected() {
        let err = parse_question_file("easy\tQ\tA\tB\tC\tD\n").unwrap_err();
        assert_eq!(
            err,
            ImportError::InvalidLevel {
                line: 1,
                raw: "easy".into()
            }
        );
    }
}
