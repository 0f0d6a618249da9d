//! Function parser.
//!
//! Recognizes top-level `FUNCTION name params -- returns : body END`
//! definitions with a small state machine, and `MEMORY name size END`
//! reservations. Tokens outside definitions are ignored.

use crate::ast::{Function, Memory, Signature};
use crate::error::{CompileResult, CompilerError, ErrorKind};
use crate::lexer::{Keyword, Token, TokenType};
use std::collections::HashSet;

/// Everything the parser extracts from the token stream.
#[derive(Debug, Default)]
pub struct ParsedSource {
    pub functions: Vec<Function>,
    pub memories: Vec<Memory>,
}

/// Which part of a function definition is being collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Outside,
    Name,
    Params,
    Returns,
    Body,
}

pub fn parse(tokens: &[Token]) -> CompileResult<ParsedSource> {
    let mut parsed = ParsedSource::default();
    let mut part = Part::Outside;
    let mut name = String::new();
    let mut signature = Signature::default();
    let mut body: Vec<Token> = Vec::new();
    let mut seen_names: HashSet<String> = HashSet::new();

    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        match part {
            Part::Outside => match token.keyword() {
                Some(Keyword::Function) => {
                    part = Part::Name;
                    name.clear();
                    signature = Signature::default();
                    body.clear();
                }
                Some(Keyword::Memory) => {
                    let (memory, consumed) = parse_memory(&tokens[i..])?;
                    parsed.memories.push(memory);
                    i += consumed;
                    continue;
                }
                _ => {}
            },
            Part::Name => {
                if token.keyword().is_some() || token.value == "--" || token.value == ":" {
                    return Err(malformed(token, "Expected a function name"));
                }
                name = token.value.clone();
                part = Part::Params;
            }
            Part::Params => {
                if token.value == "--" {
                    part = Part::Returns;
                } else if token.value == ":" || is_definition_keyword(token) {
                    return Err(malformed(
                        token,
                        &format!("Expected '--' before '{}' in function '{}'", token.value, name),
                    ));
                } else {
                    signature.params.push(token.value.to_ascii_uppercase());
                }
            }
            Part::Returns => {
                if token.value == ":" {
                    part = Part::Body;
                } else if token.value == "--" || is_definition_keyword(token) {
                    return Err(malformed(
                        token,
                        &format!("Expected ':' before '{}' in function '{}'", token.value, name),
                    ));
                } else {
                    signature.returns.push(token.value.to_ascii_uppercase());
                }
            }
            Part::Body => match token.keyword() {
                Some(Keyword::End) => {
                    if !seen_names.insert(name.clone()) {
                        return Err(malformed(
                            token,
                            &format!("Function '{}' is defined more than once", name),
                        ));
                    }
                    parsed.functions.push(Function {
                        name: std::mem::take(&mut name),
                        signature: std::mem::take(&mut signature),
                        body: std::mem::take(&mut body),
                    });
                    part = Part::Outside;
                }
                Some(Keyword::Function) => {
                    return Err(malformed(
                        token,
                        &format!("Function '{}' is missing its END", name),
                    ));
                }
                _ => body.push(token.clone()),
            },
        }
        i += 1;
    }

    if part != Part::Outside {
        return Err(CompilerError::new(
            ErrorKind::MalformedFunction,
            format!("Source ended inside the definition of function '{}'", name),
        ));
    }
    Ok(parsed)
}

/// Parse `MEMORY name size END` starting at the MEMORY keyword. Returns the
/// memory and the number of tokens consumed.
fn parse_memory(tokens: &[Token]) -> CompileResult<(Memory, usize)> {
    let memory_token = &tokens[0];
    let name = tokens
        .get(1)
        .filter(|t| t.ty == TokenType::Word)
        .ok_or_else(|| malformed(memory_token, "Expected a name after MEMORY"))?;
    let size_token = tokens
        .get(2)
        .ok_or_else(|| malformed(memory_token, "Expected a size after the memory name"))?;
    let size = parse_size(size_token)
        .ok_or_else(|| malformed(size_token, "Memory size must be a non-negative integer"))?;
    match tokens.get(3).and_then(Token::keyword) {
        Some(Keyword::End) => {}
        _ => return Err(malformed(memory_token, "MEMORY definition is missing END")),
    }
    Ok((
        Memory {
            name: name.value.clone(),
            size,
            location: memory_token.location.clone(),
        },
        4,
    ))
}

fn parse_size(token: &Token) -> Option<u64> {
    match token.ty {
        TokenType::Int => token.value.parse().ok(),
        TokenType::Hex => u64::from_str_radix(token.value.trim_start_matches("0x"), 16).ok(),
        _ => None,
    }
}

fn is_definition_keyword(token: &Token) -> bool {
    matches!(
        token.keyword(),
        Some(Keyword::Function | Keyword::End | Keyword::Memory)
    )
}

fn malformed(token: &Token, message: &str) -> CompilerError {
    CompilerError::at_token(ErrorKind::MalformedFunction, message.to_string(), token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_source(source: &str) -> CompileResult<ParsedSource> {
        parse(&tokenize(source, "test.torth").unwrap())
    }

    #[test]
    fn test_parse_minimal_main() {
        let parsed = parse_source("function main -- : 0 drop end").unwrap();
        assert_eq!(parsed.functions.len(), 1);
        let main = &parsed.functions[0];
        assert_eq!(main.name, "main");
        assert!(main.signature.params.is_empty());
        assert!(main.signature.returns.is_empty());
        assert_eq!(main.body.len(), 2);
    }

    #[test]
    fn test_parse_signature() {
        let parsed = parse_source("function add int int -- int : + end").unwrap();
        let func = &parsed.functions[0];
        assert_eq!(func.signature.params, vec!["INT", "INT"]);
        assert_eq!(func.signature.returns, vec!["INT"]);
        assert_eq!(func.body[0].value, "PLUS");
    }

    #[test]
    fn test_parse_multiple_functions() {
        let parsed =
            parse_source("function f -- INT : 21 2 * end function main -- : f print end").unwrap();
        assert_eq!(parsed.functions.len(), 2);
        assert_eq!(parsed.functions[0].name, "f");
        assert_eq!(parsed.functions[1].name, "main");
    }

    #[test]
    fn test_body_keywords_stay_in_body() {
        let parsed =
            parse_source("function main -- : 0 while dup 5 < do 1 + done drop end").unwrap();
        let body: Vec<&str> = parsed.functions[0]
            .body
            .iter()
            .map(|t| t.value.as_str())
            .collect();
        assert!(body.contains(&"while"));
        assert!(body.contains(&"done"));
    }

    #[test]
    fn test_memory_definition() {
        let parsed = parse_source("memory scratch 1024 end function main -- : end").unwrap();
        assert_eq!(parsed.memories.len(), 1);
        assert_eq!(parsed.memories[0].name, "scratch");
        assert_eq!(parsed.memories[0].size, 1024);
    }

    #[test]
    fn test_memory_hex_size() {
        let parsed = parse_source("memory page 0x1000 end").unwrap();
        assert_eq!(parsed.memories[0].size, 4096);
    }

    #[test]
    fn test_unclosed_function_fails() {
        let err = parse_source("function main -- : 0 drop").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedFunction);
    }

    #[test]
    fn test_delimiter_out_of_order_fails() {
        let err = parse_source("function main : -- end").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedFunction);
    }

    #[test]
    fn test_duplicate_function_name_fails() {
        let err = parse_source("function f -- : end function f -- : end").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedFunction);
        assert!(err.message.contains("more than once"));
    }

    #[test]
    fn test_memory_without_end_fails() {
        let err = parse_source("memory scratch 64 function main -- : end").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedFunction);
    }

    #[test]
    fn test_function_names_are_case_sensitive() {
        let parsed = parse_source("function F -- : end function f -- : end").unwrap();
        assert_eq!(parsed.functions.len(), 2);
    }
}
