//! Lexer for Torth source text.
//!
//! Tokenizes the include-expanded source into `Token`s. String and
//! character literals are atomic tokens, `//` line comments are ignored,
//! and every token carries a 1-based source location computed from the
//! newline offsets of the text.

use crate::error::{CompileResult, CompilerError, ErrorKind};
use regex::Regex;
use std::sync::LazyLock;

/// Matches one token: a bracketed array literal, a double-quoted string,
/// a single-quoted c-string/char, or any run of non-whitespace.
static TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[.*\]|".*?"|'.*?'|\S+"#).unwrap());

/// Array literals look like `array("a", "b")`, case-insensitive.
static ARRAY_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)ARRAY\(.+\)").unwrap());

/// A position in the (include-expanded) source text.
///
/// `file` is the basename of the root source file; `row` and `col` are
/// 1-based. `col` is the byte offset within the line plus one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub row: usize,
    pub col: usize,
}

impl Location {
    pub fn new(file: impl Into<String>, row: usize, col: usize) -> Self {
        Location {
            file: file.into(),
            row,
            col,
        }
    }
}

/// Language keywords, matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Break,
    Continue,
    Do,
    Done,
    Elif,
    Else,
    End,
    Endif,
    Function,
    If,
    Memory,
    While,
}

impl Keyword {
    pub fn from_name(name: &str) -> Option<Keyword> {
        match name.to_ascii_uppercase().as_str() {
            "BREAK" => Some(Keyword::Break),
            "CONTINUE" => Some(Keyword::Continue),
            "DO" => Some(Keyword::Do),
            "DONE" => Some(Keyword::Done),
            "ELIF" => Some(Keyword::Elif),
            "ELSE" => Some(Keyword::Else),
            "END" => Some(Keyword::End),
            "ENDIF" => Some(Keyword::Endif),
            "FUNCTION" => Some(Keyword::Function),
            "IF" => Some(Keyword::If),
            "MEMORY" => Some(Keyword::Memory),
            "WHILE" => Some(Keyword::While),
            _ => None,
        }
    }
}

/// Classification of a raw token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Int,
    Bool,
    Char,
    Str,
    Cstr,
    Hex,
    Array,
    Keyword,
    Word,
}

/// A classified token with its normalized value and source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub ty: TokenType,
    pub location: Location,
}

impl Token {
    /// The keyword this token names, if it is a keyword token.
    pub fn keyword(&self) -> Option<Keyword> {
        match self.ty {
            TokenType::Keyword => Keyword::from_name(&self.value),
            _ => None,
        }
    }
}

/// Tokenize include-expanded source text.
///
/// `file` is the display name used in every location (the basename of the
/// root source file).
pub fn tokenize(source: &str, file: &str) -> CompileResult<Vec<Token>> {
    let code = blank_comments(source);
    let newline_offsets: Vec<usize> = code
        .bytes()
        .enumerate()
        .filter(|(_, b)| *b == b'\n')
        .map(|(i, _)| i)
        .collect();

    let mut tokens = Vec::new();
    for mat in TOKEN_REGEX.find_iter(&code) {
        let raw = mat.as_str();
        let location = locate(file, mat.start(), &newline_offsets);
        let ty = classify(raw).map_err(|kind| {
            CompilerError::at_token(
                kind,
                format!("String literal {raw} has no closing quote."),
                &Token {
                    value: raw.to_string(),
                    ty: TokenType::Word,
                    location: location.clone(),
                },
            )
        })?;
        tokens.push(Token {
            value: normalize(raw),
            ty,
            location,
        });
    }
    Ok(tokens)
}

/// Replace `//` comments with spaces so token byte offsets are unaffected.
/// Quoted sections are respected: `//` inside a string literal is content.
fn blank_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for (i, line) in source.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        match comment_start(line) {
            Some(pos) => {
                out.push_str(&line[..pos]);
                out.extend(std::iter::repeat(' ').take(line.len() - pos));
            }
            None => out.push_str(line),
        }
    }
    out
}

/// Byte offset of the first `//` outside string literals, if any.
fn comment_start(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        match quote {
            Some(q) => {
                if bytes[i] == q {
                    quote = None;
                }
            }
            None => match bytes[i] {
                b'"' | b'\'' => quote = Some(bytes[i]),
                b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'/' => return Some(i),
                _ => {}
            },
        }
        i += 1;
    }
    None
}

/// Compute the 1-based row and column of a byte position.
fn locate(file: &str, position: usize, newline_offsets: &[usize]) -> Location {
    // Index of the first newline past the position = number of full lines
    // before it.
    let row = newline_offsets.partition_point(|&nl| nl < position);
    let line_start = if row == 0 {
        0
    } else {
        newline_offsets[row - 1] + 1
    };
    Location::new(file, row + 1, position - line_start + 1)
}

/// Rewrite operator tokens to canonical intrinsic names and booleans to
/// their integer values. All other tokens pass through unchanged.
pub fn normalize(raw: &str) -> String {
    match raw {
        "==" => "EQ".to_string(),
        ">=" => "GE".to_string(),
        ">" => "GT".to_string(),
        "<=" => "LE".to_string(),
        "<" => "LT".to_string(),
        "-" => "MINUS".to_string(),
        "*" => "MUL".to_string(),
        "!=" => "NE".to_string(),
        "+" => "PLUS".to_string(),
        "%" => "MOD".to_string(),
        "/" => "DIV".to_string(),
        "^" => "POW".to_string(),
        "." => "PRINT_INT".to_string(),
        _ if raw.eq_ignore_ascii_case("TRUE") => "1".to_string(),
        _ if raw.eq_ignore_ascii_case("FALSE") => "0".to_string(),
        _ => raw.to_string(),
    }
}

/// Classify a raw token. Classification runs before value normalization so
/// `TRUE`/`FALSE` are still visible as booleans.
fn classify(raw: &str) -> Result<TokenType, ErrorKind> {
    if Keyword::from_name(raw).is_some() {
        return Ok(TokenType::Keyword);
    }
    if ARRAY_REGEX.is_match(raw) {
        return Ok(TokenType::Array);
    }
    if raw.eq_ignore_ascii_case("TRUE") || raw.eq_ignore_ascii_case("FALSE") {
        return Ok(TokenType::Bool);
    }
    if raw.starts_with("0x") {
        return Ok(TokenType::Hex);
    }
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        return Ok(TokenType::Str);
    }
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        // A three-byte single-quoted token is a character literal; anything
        // longer is a C-style string.
        return Ok(if raw.len() == 3 {
            TokenType::Char
        } else {
            TokenType::Cstr
        });
    }
    if raw.parse::<i64>().is_ok() {
        return Ok(TokenType::Int);
    }
    if raw.starts_with('"') || raw.starts_with('\'') {
        return Err(ErrorKind::UnterminatedString);
    }
    Ok(TokenType::Word)
}
