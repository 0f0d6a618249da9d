//! Program builder.
//!
//! Walks the flat token stream in order and produces the `Program`: one op
//! per token with its id equal to its position.

use crate::ast::{Constant, Intrinsic, Memory, Op, OpType, Program};
use crate::error::{CompileResult, CompilerError, ErrorKind};
use crate::lexer::{Keyword, Token, TokenType};

pub fn build_program(
    tokens: &[Token],
    memories: &[Memory],
    constants: &[Constant],
) -> CompileResult<Program> {
    tokens
        .iter()
        .enumerate()
        .map(|(id, token)| {
            Ok(Op {
                id,
                ty: op_type_for(token, memories, constants)?,
                token: token.clone(),
            })
        })
        .collect()
}

fn op_type_for(
    token: &Token,
    memories: &[Memory],
    constants: &[Constant],
) -> CompileResult<OpType> {
    match token.ty {
        TokenType::Int | TokenType::Bool | TokenType::Hex => Ok(OpType::PushInt),
        TokenType::Char => Ok(OpType::PushChar),
        TokenType::Str => Ok(OpType::PushStr),
        TokenType::Cstr => Ok(OpType::PushCstr),
        TokenType::Array => Ok(OpType::PushArray),
        TokenType::Keyword => keyword_op(token),
        TokenType::Word => word_op(token, memories, constants),
    }
}

fn keyword_op(token: &Token) -> CompileResult<OpType> {
    match token.keyword() {
        Some(Keyword::If) => Ok(OpType::If),
        Some(Keyword::Elif) => Ok(OpType::Elif),
        Some(Keyword::Else) => Ok(OpType::Else),
        Some(Keyword::Endif) => Ok(OpType::Endif),
        Some(Keyword::While) => Ok(OpType::While),
        Some(Keyword::Do) => Ok(OpType::Do),
        Some(Keyword::Done) => Ok(OpType::Done),
        Some(Keyword::Break) => Ok(OpType::Break),
        Some(Keyword::Continue) => Ok(OpType::Continue),
        // FUNCTION, END and MEMORY are consumed by the function parser;
        // one reaching the builder is stray.
        _ => Err(CompilerError::at_token(
            ErrorKind::UnknownWord,
            format!("Keyword '{}' is not valid inside a function body", token.value),
            token,
        )),
    }
}

fn word_op(token: &Token, memories: &[Memory], constants: &[Constant]) -> CompileResult<OpType> {
    if let Some(cast) = OpType::cast_from_name(&token.value) {
        return Ok(cast);
    }
    if memories.iter().any(|m| m.name == token.value) {
        return Ok(OpType::PushPtr);
    }
    if constants.iter().any(|c| c.name == token.value) {
        // Pushing a constant emits its %define name, which NASM resolves.
        return Ok(OpType::PushInt);
    }
    if let Some(intrinsic) = Intrinsic::from_name(&token.value) {
        return Ok(OpType::Intrinsic(intrinsic));
    }
    Err(CompilerError::at_token(
        ErrorKind::UnknownWord,
        format!("Word '{}' is not an intrinsic, memory, constant or function", token.value),
        token,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn build(source: &str) -> CompileResult<Program> {
        build_program(&tokenize(source, "test.torth").unwrap(), &[], &[])
    }

    #[test]
    fn test_op_ids_are_dense_positions() {
        let program = build("1 2 + print").unwrap();
        for (index, op) in program.iter().enumerate() {
            assert_eq!(op.id, index);
        }
    }

    #[test]
    fn test_literal_mapping() {
        let program = build("42 true 0xff 'a' \"s\" 'cstr'").unwrap();
        let types: Vec<OpType> = program.iter().map(|op| op.ty).collect();
        assert_eq!(
            types,
            vec![
                OpType::PushInt,
                OpType::PushInt,
                OpType::PushInt,
                OpType::PushChar,
                OpType::PushStr,
                OpType::PushCstr,
            ]
        );
    }

    #[test]
    fn test_keyword_mapping() {
        let program = build("if elif else endif while do done break continue").unwrap();
        let types: Vec<OpType> = program.iter().map(|op| op.ty).collect();
        assert_eq!(
            types,
            vec![
                OpType::If,
                OpType::Elif,
                OpType::Else,
                OpType::Endif,
                OpType::While,
                OpType::Do,
                OpType::Done,
                OpType::Break,
                OpType::Continue,
            ]
        );
    }

    #[test]
    fn test_intrinsic_and_cast_words() {
        let program = build("dup cast_ptr swap2 load_int").unwrap();
        assert_eq!(program[0].ty, OpType::Intrinsic(Intrinsic::Dup));
        assert_eq!(program[1].ty, OpType::CastPtr);
        assert_eq!(program[2].ty, OpType::Intrinsic(Intrinsic::Swap2));
        assert_eq!(program[3].ty, OpType::Intrinsic(Intrinsic::LoadInt));
    }

    #[test]
    fn test_normalized_operators_resolve_to_intrinsics() {
        let program = build("+ - * == . ^").unwrap();
        assert_eq!(program[0].ty, OpType::Intrinsic(Intrinsic::Plus));
        assert_eq!(program[4].ty, OpType::Intrinsic(Intrinsic::PrintInt));
        assert_eq!(program[5].ty, OpType::Intrinsic(Intrinsic::Pow));
    }

    #[test]
    fn test_memory_and_constant_words() {
        let tokens = tokenize("scratch LIMIT", "test.torth").unwrap();
        let memories = vec![Memory {
            name: "scratch".to_string(),
            size: 64,
            location: crate::lexer::Location::new("test.torth", 1, 1),
        }];
        let constants = vec![Constant::new("LIMIT", "100")];
        let program = build_program(&tokens, &memories, &constants).unwrap();
        assert_eq!(program[0].ty, OpType::PushPtr);
        assert_eq!(program[1].ty, OpType::PushInt);
    }

    #[test]
    fn test_unknown_word_fails() {
        let err = build("1 frobnicate +").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownWord);
        assert!(err.message.contains("frobnicate"));
    }

    #[test]
    fn test_stray_definition_keyword_fails() {
        let err = build("1 end").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownWord);
    }
}
