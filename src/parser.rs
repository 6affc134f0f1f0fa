//! Tokenization of the textual declaration language.
//!
//! The language is line based, with whitespace separated tokens:
//!
//! ```text
//! neuron NAME THRESHOLD POTENTIAL
//! synapse NAME|- SOURCE DESTINATION DELAY STRENGTH
//! output INTERVAL END
//! ```
//!
//! Names are a letter followed by letters, digits or underscores. Each field consumes exactly
//! one token; a token of the wrong shape, or a missing one, yields an empty field which the
//! [`crate::builder`] reports. The parser itself never fails.
use std::fs;
use std::path::Path;
use std::str::SplitWhitespace;

use crate::builder::{self, Declaration, Statement, SynapseName};
use crate::error::NetError;
use crate::ANONYMOUS;

/// Returns true if `token` is a valid neuron or synapse name.
pub fn is_name(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

struct Tokens<'a> {
    inner: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn name(&mut self) -> Option<String> {
        self.inner
            .next()
            .filter(|token| is_name(token))
            .map(str::to_string)
    }

    fn number(&mut self) -> Option<f64> {
        self.inner.next().and_then(|token| token.parse().ok())
    }

    fn synapse_name(&mut self) -> SynapseName {
        match self.inner.next() {
            Some(ANONYMOUS) => SynapseName::Anonymous,
            Some(token) if is_name(token) => SynapseName::Named(token.to_string()),
            _ => SynapseName::Invalid,
        }
    }

    fn rest(self) -> Vec<String> {
        self.inner.map(str::to_string).collect()
    }
}

/// Parse a single line. Returns `None` for a blank line.
pub fn parse_line(line_number: usize, line: &str) -> Option<Statement> {
    let mut tokens = Tokens {
        inner: line.split_whitespace(),
    };
    let keyword = tokens.inner.next()?;

    let declaration = match keyword {
        "neuron" => Declaration::Neuron {
            name: tokens.name(),
            threshold: tokens.number(),
            potential: tokens.number(),
        },
        "synapse" => Declaration::Synapse {
            name: tokens.synapse_name(),
            source: tokens.name(),
            destination: tokens.name(),
            delay: tokens.number(),
            strength: tokens.number(),
        },
        "output" => Declaration::Output {
            interval: tokens.number(),
            end: tokens.number(),
        },
        keyword => {
            return Some(Statement::new(
                line_number,
                Declaration::Unknown {
                    keyword: keyword.to_string(),
                },
            ))
        }
    };

    let mut statement = Statement::new(line_number, declaration);
    statement.trailing = tokens.rest();
    Some(statement)
}

/// Parse a whole text, numbering lines from 1.
pub fn parse_str(source: &str) -> Vec<Statement> {
    source
        .lines()
        .enumerate()
        .filter_map(|(i, line)| parse_line(i + 1, line))
        .collect()
}

/// Load the statements of a file: JSON if its extension is `json`, the declaration language otherwise.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Vec<Statement>, NetError> {
    let path = path.as_ref();
    if path.extension().is_some_and(|ext| ext == "json") {
        return builder::load_statements(path);
    }
    let display = path.display().to_string();
    let source = fs::read_to_string(path).map_err(|e| NetError::from_io(e, &display))?;
    log::info!("Read {} bytes from {}", source.len(), display);
    Ok(parse_str(&source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_name() {
        assert!(is_name("X"));
        assert!(is_name("p1"));
        assert!(is_name("a_b_2"));
        assert!(!is_name("1a"));
        assert!(!is_name("-"));
        assert!(!is_name("a-b"));
        assert!(!is_name(""));
    }

    #[test]
    fn test_parse_neuron() {
        let statement = parse_line(4, "neuron X 1.0 2").unwrap();
        assert_eq!(statement.line, 4);
        assert_eq!(
            statement.declaration,
            Declaration::Neuron {
                name: Some("X".to_string()),
                threshold: Some(1.0),
                potential: Some(2.0)
            }
        );
        assert!(statement.trailing.is_empty());
    }

    #[test]
    fn test_parse_synapse() {
        let statement = parse_line(1, "  synapse -   X p1 0.5 -0.25 ").unwrap();
        assert_eq!(
            statement.declaration,
            Declaration::Synapse {
                name: SynapseName::Anonymous,
                source: Some("X".to_string()),
                destination: Some("p1".to_string()),
                delay: Some(0.5),
                strength: Some(-0.25)
            }
        );
    }

    #[test]
    fn test_parse_malformed_fields() {
        let statement = parse_line(1, "synapse 9x X 3Y one").unwrap();
        assert_eq!(
            statement.declaration,
            Declaration::Synapse {
                name: SynapseName::Invalid,
                source: Some("X".to_string()),
                destination: None,
                delay: None,
                strength: None
            }
        );
    }

    #[test]
    fn test_parse_trailing_tokens() {
        let statement = parse_line(1, "output 1 10 more stuff").unwrap();
        assert_eq!(
            statement.declaration,
            Declaration::Output {
                interval: Some(1.0),
                end: Some(10.0)
            }
        );
        assert_eq!(statement.trailing, vec!["more", "stuff"]);
    }

    #[test]
    fn test_parse_unknown_keyword() {
        let statement = parse_line(2, "axon A B C").unwrap();
        assert_eq!(
            statement.declaration,
            Declaration::Unknown {
                keyword: "axon".to_string()
            }
        );
        assert!(statement.trailing.is_empty());
    }

    #[test]
    fn test_parse_str_skips_blank_lines() {
        let statements = parse_str("neuron A 1 0\n\n   \nneuron B 1 0\n");
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].line, 1);
        assert_eq!(statements[1].line, 4);
    }
}
