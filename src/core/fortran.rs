//! Scanning for Fortran list-directed input.
//!
//! SYNSPEC decks are written for Fortran list-directed reads: values separated
//! by whitespace, character values in single quotes, `*` opening a comment
//! line, and floating-point exponents using `D` or dropping the exponent
//! letter entirely (`1.5-4` means `1.5e-4`).

use anyhow::{Result, anyhow};

/// One classified value from an input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Int(i64),
    Float(f64),
    Logical(bool),
    Str(String),
}

impl Token {
    /// Integer value, if the token is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Token::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Numeric value; integers promote to float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Token::Int(value) => Some(*value as f64),
            Token::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Logical value, if the token is a Fortran logical.
    pub fn as_logical(&self) -> Option<bool> {
        match self {
            Token::Logical(value) => Some(*value),
            _ => None,
        }
    }

    /// Text of a character token, with quotes stripped.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Token::Str(value) => Some(value),
            _ => None,
        }
    }
}

/// Split `text` into lines of classified tokens.
///
/// Blank lines and `*`-comment lines are dropped, so callers index meaningful
/// lines only.
pub fn token_lines(text: &str) -> Vec<Vec<Token>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('*'))
        .map(tokenize_line)
        .collect()
}

fn tokenize_line(line: &str) -> Vec<Token> {
    use std::sync::LazyLock;
    static TOKEN_RE: LazyLock<regex::Regex> =
        LazyLock::new(|| regex::Regex::new(r"'[^']*'|\S+").unwrap());

    TOKEN_RE
        .find_iter(line)
        .map(|token| classify(token.as_str()))
        .collect()
}

fn classify(raw: &str) -> Token {
    if let Some(inner) = raw.strip_prefix('\'').and_then(|rest| rest.strip_suffix('\'')) {
        return Token::Str(inner.to_string());
    }
    if let Ok(value) = raw.parse::<i64>() {
        return Token::Int(value);
    }
    if let Ok(value) = parse_fortran_float(raw) {
        return Token::Float(value);
    }
    match raw {
        "T" | "t" | ".true." | ".TRUE." => Token::Logical(true),
        "F" | "f" | ".false." | ".FALSE." => Token::Logical(false),
        _ => Token::Str(raw.to_string()),
    }
}

/// Parse a float in any of the forms Fortran emits: `1.5e-4`, `1.5E-4`,
/// `1.5D-4`, `1.5d-4`, or with the exponent letter dropped (`1.5-4`).
pub fn parse_fortran_float(raw: &str) -> Result<f64> {
    let cleaned = raw.trim().replace(['d', 'D'], "e");
    if let Ok(value) = cleaned.parse::<f64>() {
        return Ok(value);
    }
    // Exponent letter dropped: split the mantissa off at the trailing sign.
    if let Some(pos) = cleaned.rfind(['+', '-'])
        && pos > 0
    {
        let (mantissa, exponent) = cleaned.split_at(pos);
        if let Ok(value) = format!("{mantissa}e{exponent}").parse::<f64>() {
            return Ok(value);
        }
    }
    Err(anyhow!("not a Fortran float: {raw:?}"))
}
