//! Reply-grammar parsing, shared by the SMS webhook and the web form.
//!
//! Expected shape: `"<joy>,<achievement>,<meaningfulness>[,<free_text>]"`.
//! Free text may itself contain commas; everything after the third field is
//! rejoined verbatim.

use pulse_core::model::Scores;

/// A successfully parsed reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    pub scores: Scores,
    pub free_text: Option<String>,
}

/// Why a reply failed to parse. All variants surface as the same
/// `invalid_format` outcome; the distinction exists for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyParseError {
    TooFewFields,
    NotANumber,
    OutOfRange,
}

/// Parse a raw reply body into three in-range scores plus optional free text.
pub fn parse_reply(body: &str) -> Result<ParsedReply, ReplyParseError> {
    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    if parts.len() < 3 {
        return Err(ReplyParseError::TooFewFields);
    }

    let mut values = [0i64; 3];
    for (slot, part) in values.iter_mut().zip(&parts[..3]) {
        *slot = part.parse().map_err(|_| ReplyParseError::NotANumber)?;
    }

    let scores = Scores {
        joy: values[0],
        achievement: values[1],
        meaningfulness: values[2],
    };
    if !scores.in_range() {
        return Err(ReplyParseError::OutOfRange);
    }

    let free_text = if parts.len() > 3 {
        let text = parts[3..].join(",").trim().to_string();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    } else {
        None
    };

    Ok(ParsedReply { scores, free_text })
}
