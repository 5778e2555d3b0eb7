use std::fmt;

use crate::error::EvaluationError;

/// A similarity score as printed by the scorer.
///
/// Keeps the scorer's own token so reports echo `0.0` or `42.7000` exactly as printed.
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub value: f64,
    text: String,
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Takes the last line of scorer output, trims it, splits on single spaces and parses the last token.
pub fn parse_score<S: AsRef<str>>(lines: &[S]) -> Result<Score, EvaluationError> {
    let line = lines.last().ok_or(EvaluationError::EmptyOutput)?.as_ref().trim();
    let token = line.split(' ').last().unwrap_or_default();

    let value: f64 = token.parse().map_err(|_| EvaluationError::InvalidScore {
        line: line.to_string(),
    })?;

    Ok(Score {
        value,
        text: token.to_string(),
    })
}
