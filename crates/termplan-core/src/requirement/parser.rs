//! Textual requirement parser.
//!
//! Grammar (`&` binds tighter than `|`):
//!
//! ```text
//! expr := and ('|' and)*
//! and  := atom ('&' atom)*
//! atom := '(' expr ')' | code
//! ```
//!
//! A code is any run of characters other than `(`, `)`, `&`, `|`; it is
//! trimmed and normalised through [`CourseCode::new`].

use thiserror::Error;

use crate::course::{CourseCode, CourseCodeError, RESERVED_CHARS};

use super::Requirement;

/// Errors that can occur while parsing a requirement expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequirementParseError {
    #[error("requirement expression is empty")]
    Empty,

    #[error("unexpected {found} at offset {offset}")]
    UnexpectedToken { found: String, offset: usize },

    #[error("unexpected end of expression (missing operand or ')')")]
    UnexpectedEnd,

    #[error("invalid course code: {0}")]
    InvalidCode(#[from] CourseCodeError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    LParen,
    RParen,
    And,
    Or,
    Code(String),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::LParen => "'('".to_owned(),
            Self::RParen => "')'".to_owned(),
            Self::And => "'&'".to_owned(),
            Self::Or => "'|'".to_owned(),
            Self::Code(code) => format!("course {code:?}"),
        }
    }
}

/// Parse a textual requirement such as `(MATH 135 | MATH 145) & CS 136`.
///
/// Single-branch groups collapse: `(CS 135)` parses to a plain course.
pub fn parse_requirement(input: &str) -> Result<Requirement, RequirementParseError> {
    let tokens = tokenize(input);
    if tokens.is_empty() {
        return Err(RequirementParseError::Empty);
    }

    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expr()?;

    if let Some((offset, token)) = parser.tokens.get(parser.pos) {
        return Err(RequirementParseError::UnexpectedToken {
            found: token.describe(),
            offset: *offset,
        });
    }

    Ok(expr)
}

/// Split the input into tokens, each tagged with its byte offset.
fn tokenize(input: &str) -> Vec<(usize, Token)> {
    let mut tokens = Vec::new();
    let mut code_start: Option<usize> = None;

    let flush = |tokens: &mut Vec<(usize, Token)>, start: Option<usize>, end: usize| {
        if let Some(start) = start {
            let raw = &input[start..end];
            let trimmed = raw.trim_start();
            let offset = start + (raw.len() - trimmed.len());
            let trimmed = trimmed.trim_end();
            if !trimmed.is_empty() {
                tokens.push((offset, Token::Code(trimmed.to_owned())));
            }
        }
    };

    for (i, ch) in input.char_indices() {
        if RESERVED_CHARS.contains(&ch) {
            flush(&mut tokens, code_start.take(), i);
            let token = match ch {
                '(' => Token::LParen,
                ')' => Token::RParen,
                '&' => Token::And,
                _ => Token::Or,
            };
            tokens.push((i, token));
        } else if code_start.is_none() {
            code_start = Some(i);
        }
    }
    flush(&mut tokens, code_start, input.len());

    tokens
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn next(&mut self) -> Option<(usize, Token)> {
        let item = self.tokens.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn parse_expr(&mut self) -> Result<Requirement, RequirementParseError> {
        let mut branches = vec![self.parse_and()?];
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            branches.push(self.parse_and()?);
        }
        Ok(collapse(branches, Requirement::AnyOf))
    }

    fn parse_and(&mut self) -> Result<Requirement, RequirementParseError> {
        let mut branches = vec![self.parse_atom()?];
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            branches.push(self.parse_atom()?);
        }
        Ok(collapse(branches, Requirement::AllOf))
    }

    fn parse_atom(&mut self) -> Result<Requirement, RequirementParseError> {
        match self.next() {
            Some((_, Token::Code(raw))) => Ok(Requirement::Course(CourseCode::new(&raw)?)),
            Some((_, Token::LParen)) => {
                let inner = self.parse_expr()?;
                match self.next() {
                    Some((_, Token::RParen)) => Ok(inner),
                    Some((offset, token)) => Err(RequirementParseError::UnexpectedToken {
                        found: token.describe(),
                        offset,
                    }),
                    None => Err(RequirementParseError::UnexpectedEnd),
                }
            }
            Some((offset, token)) => Err(RequirementParseError::UnexpectedToken {
                found: token.describe(),
                offset,
            }),
            None => Err(RequirementParseError::UnexpectedEnd),
        }
    }
}

fn collapse(
    mut branches: Vec<Requirement>,
    group: fn(Vec<Requirement>) -> Requirement,
) -> Requirement {
    if branches.len() == 1 {
        branches.remove(0)
    } else {
        group(branches)
    }
}
