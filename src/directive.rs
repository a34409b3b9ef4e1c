//! Modification directives and the directive file format
//!
//! A directive file has one instruction per line:
//!
//! ```text
//! # action|tag|length|value
//! +|01|02|12
//! +|54||$tarif
//! -|61||
//! ```
//!
//! `+` inserts or overwrites a tag, `-` deletes it. The length column is
//! advisory (the real length is always recomputed from the value) and may be
//! left blank. A value starting with `$` names a field of the per-payload
//! record instead of a literal.

use crate::payload::TAG_LEN;

pub const FIELD_SEPARATOR: char = '|';
pub const RECORD_PREFIX: char = '$';
pub const COMMENT_PREFIX: char = '#';

/// Where an inserted value comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Used as-is
    Literal(String),
    /// Looked up by name in the per-payload record
    Record(String),
}

impl ValueSource {
    /// Parse a value column: `$name` is a record reference, anything else a literal
    pub fn parse(input: &str) -> Self {
        match input.strip_prefix(RECORD_PREFIX) {
            Some(name) if !name.is_empty() => ValueSource::Record(name.to_string()),
            _ => ValueSource::Literal(input.to_string()),
        }
    }
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::Literal(value) => write!(f, "{}", value),
            ValueSource::Record(name) => write!(f, "{}{}", RECORD_PREFIX, name),
        }
    }
}

/// One modification instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Set or overwrite a tag
    Insert { tag: String, source: ValueSource },
    /// Remove a tag if present
    Delete { tag: String },
}

impl Directive {
    /// Insert a literal value
    pub fn insert(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Directive::Insert {
            tag: tag.into(),
            source: ValueSource::Literal(value.into()),
        }
    }

    /// Insert a value taken from the record field `name`
    pub fn insert_from_record(tag: impl Into<String>, name: impl Into<String>) -> Self {
        Directive::Insert {
            tag: tag.into(),
            source: ValueSource::Record(name.into()),
        }
    }

    pub fn delete(tag: impl Into<String>) -> Self {
        Directive::Delete { tag: tag.into() }
    }

    /// Tag this directive targets
    pub fn tag(&self) -> &str {
        match self {
            Directive::Insert { tag, .. } | Directive::Delete { tag } => tag,
        }
    }

    /// Parse directives from file content.
    ///
    /// Blank lines and lines starting with `#` are skipped.
    ///
    /// # Errors
    /// - `DirectiveParseError::MalformedLine` - wrong number of columns
    /// - `DirectiveParseError::UnknownAction` - action is not `+` or `-`
    /// - `DirectiveParseError::InvalidTag` - tag is not exactly 2 characters
    /// - `DirectiveParseError::InvalidLength` - length column is not a number
    pub fn parse_content(content: &str) -> Result<Vec<Directive>, DirectiveParseError> {
        let mut directives = Vec::new();
        for (line_num, line) in content.lines().enumerate() {
            let line_num = line_num + 1; // 1-indexed for error messages
            if let Some(directive) = Self::parse_line(line, line_num)? {
                directives.push(directive);
            }
        }
        Ok(directives)
    }

    /// Parse a single line; `Ok(None)` for blank and comment lines
    pub fn parse_line(line: &str, line_num: usize) -> Result<Option<Directive>, DirectiveParseError> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIX) {
            return Ok(None);
        }

        // The value is the last column so it may itself contain separators
        let columns: Vec<&str> = line.splitn(4, FIELD_SEPARATOR).collect();
        let action = columns[0].trim();

        let tag = match columns.get(1) {
            Some(tag) => tag.trim(),
            None => {
                return Err(DirectiveParseError::MalformedLine {
                    line_number: line_num,
                    line: line.to_string(),
                })
            }
        };
        if tag.chars().count() != TAG_LEN {
            return Err(DirectiveParseError::InvalidTag {
                line_number: line_num,
                tag: tag.to_string(),
            });
        }

        if let Some(length) = columns.get(2).map(|l| l.trim()) {
            if !length.is_empty() && !length.bytes().all(|b| b.is_ascii_digit()) {
                return Err(DirectiveParseError::InvalidLength {
                    line_number: line_num,
                    length: length.to_string(),
                });
            }
        }

        match action {
            "+" => {
                let value = columns.get(3).ok_or_else(|| DirectiveParseError::MalformedLine {
                    line_number: line_num,
                    line: line.to_string(),
                })?;
                Ok(Some(Directive::Insert {
                    tag: tag.to_string(),
                    source: ValueSource::parse(value.trim_end()),
                }))
            }
            "-" => Ok(Some(Directive::Delete { tag: tag.to_string() })),
            other => Err(DirectiveParseError::UnknownAction {
                line_number: line_num,
                action: other.to_string(),
            }),
        }
    }

    /// Format the directive as a directive file line
    pub fn to_line(&self) -> String {
        match self {
            Directive::Insert { tag, source } => {
                let length = match source {
                    ValueSource::Literal(value) => format!("{:02}", value.chars().count()),
                    ValueSource::Record(_) => String::new(),
                };
                format!("+|{}|{}|{}", tag, length, source)
            }
            Directive::Delete { tag } => format!("-|{}||", tag),
        }
    }
}

/// Error type for directive file parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveParseError {
    /// Too few columns for the action
    MalformedLine { line_number: usize, line: String },

    /// Action column is neither `+` nor `-`
    UnknownAction { line_number: usize, action: String },

    /// Tag column is not exactly two characters
    InvalidTag { line_number: usize, tag: String },

    /// Length column is neither blank nor a decimal number
    InvalidLength { line_number: usize, length: String },
}

impl std::fmt::Display for DirectiveParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectiveParseError::MalformedLine { line_number, line } => {
                write!(f, "Malformed directive at line {}: '{}'. Expected action|tag|length|value", line_number, line)
            }
            DirectiveParseError::UnknownAction { line_number, action } => {
                write!(f, "Unknown action '{}' at line {}. Expected + or -", action, line_number)
            }
            DirectiveParseError::InvalidTag { line_number, tag } => {
                write!(f, "Invalid tag '{}' at line {}. Tags are exactly 2 characters", tag, line_number)
            }
            DirectiveParseError::InvalidLength { line_number, length } => {
                write!(f, "Invalid length '{}' at line {}", length, line_number)
            }
        }
    }
}

impl std::error::Error for DirectiveParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_insert_literal() {
        let directives = Directive::parse_content("+|01|02|12").unwrap();
        assert_eq!(directives, vec![Directive::insert("01", "12")]);
    }

    #[test]
    fn test_parse_insert_from_record() {
        let directives = Directive::parse_content("+|54||$tarif").unwrap();
        assert_eq!(directives, vec![Directive::insert_from_record("54", "tarif")]);
    }

    #[test]
    fn test_parse_delete_forms() {
        let content = "-|61||\n-|62\n-|63|04|";
        let directives = Directive::parse_content(content).unwrap();
        assert_eq!(
            directives,
            vec![Directive::delete("61"), Directive::delete("62"), Directive::delete("63")]
        );
    }

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let content = "# tariff update\n\n+|54|04|2000\n   \n# end";
        let directives = Directive::parse_content(content).unwrap();
        assert_eq!(directives.len(), 1);
    }

    #[test]
    fn test_parse_value_with_separator() {
        let directives = Directive::parse_content("+|62||a|b").unwrap();
        assert_eq!(directives, vec![Directive::insert("62", "a|b")]);
    }

    #[test]
    fn test_parse_value_keeps_inner_spaces() {
        let directives = Directive::parse_content("+|59||KEMENHUB SBY KHUSUS").unwrap();
        assert_eq!(directives, vec![Directive::insert("59", "KEMENHUB SBY KHUSUS")]);
    }

    #[test]
    fn test_parse_advisory_length_ignored() {
        let directives = Directive::parse_content("+|54|99|2000").unwrap();
        assert_eq!(directives, vec![Directive::insert("54", "2000")]);
    }

    #[test]
    fn test_parse_lone_dollar_is_literal() {
        let directives = Directive::parse_content("+|62||$").unwrap();
        assert_eq!(directives, vec![Directive::insert("62", "$")]);
    }

    #[test]
    fn test_parse_unknown_action() {
        let err = Directive::parse_content("+|00|02|01\n*|54|04|2000").unwrap_err();
        assert_eq!(
            err,
            DirectiveParseError::UnknownAction { line_number: 2, action: "*".to_string() }
        );
    }

    #[test]
    fn test_parse_missing_value_column() {
        let err = Directive::parse_content("+|54|04").unwrap_err();
        assert!(matches!(err, DirectiveParseError::MalformedLine { line_number: 1, .. }));
    }

    #[test]
    fn test_parse_missing_tag() {
        let err = Directive::parse_content("+").unwrap_err();
        assert!(matches!(err, DirectiveParseError::MalformedLine { line_number: 1, .. }));
    }

    #[test]
    fn test_parse_invalid_tag() {
        let err = Directive::parse_content("+|540|04|2000").unwrap_err();
        assert!(matches!(err, DirectiveParseError::InvalidTag { .. }));
    }

    #[test]
    fn test_parse_invalid_length() {
        let err = Directive::parse_content("+|54|four|2000").unwrap_err();
        assert!(matches!(err, DirectiveParseError::InvalidLength { line_number: 1, .. }));
    }

    #[test]
    fn test_to_line() {
        assert_eq!(Directive::insert("54", "2000").to_line(), "+|54|04|2000");
        assert_eq!(Directive::insert_from_record("54", "tarif").to_line(), "+|54||$tarif");
        assert_eq!(Directive::delete("61").to_line(), "-|61||");
    }

    #[test]
    fn test_directive_tag() {
        assert_eq!(Directive::delete("61").tag(), "61");
        assert_eq!(Directive::insert("54", "1").tag(), "54");
    }
}
