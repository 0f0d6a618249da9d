//! NASM x86-64 code generation.
//!
//! Emits the assembly text for a checked program: a fixed prelude, the
//! data/BSS declarations the ops require, one template per op, and an
//! `exit(0)` epilogue. The builder owns one buffer per section and
//! concatenates them at the end, so declarations never rewrite earlier
//! text.
//!
//! Jump targets for the structured control-flow ops are resolved up front
//! in a single pass over the program with a stack of open blocks.

use crate::ast::{Constant, Intrinsic, Memory, Op, OpType, Program};
use crate::error::{CompileResult, CompilerError, ErrorKind};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Fixed integer printer, derived from Porth's `print`. Writes the decimal
/// digits and a newline to fd 1.
const PRINT_ROUTINE: &str = "print:
  mov     r9, -3689348814741910323
  sub     rsp, 40
  mov     BYTE [rsp+31], 10
  lea     rcx, [rsp+30]
.L2:
  mov     rax, rdi
  lea     r8, [rsp+32]
  mul     r9
  mov     rax, rdi
  sub     r8, rcx
  shr     rdx, 3
  lea     rsi, [rdx+rdx*4]
  add     rsi, rsi
  sub     rax, rsi
  add     eax, 48
  mov     BYTE [rcx], al
  mov     rax, rdi
  mov     rdi, rdx
  mov     rdx, rcx
  sub     rcx, 1
  cmp     rax, 9
  ja      .L2
  lea     rax, [rsp+32]
  mov     edi, 1
  sub     rdx, rax
  xor     eax, eax
  lea     rsi, [rsp+32+rdx]
  mov     rdx, r8
  mov     rax, 1
  syscall
  add     rsp, 40
  ret
";

/// Registers receiving syscall arguments, in order.
const SYSCALL_REGISTERS: [&str; 6] = ["rdi", "rsi", "rdx", "r10", "r8", "r9"];

/// Generate the complete assembly text for a program.
pub fn generate_asm(
    program: &Program,
    constants: &[Constant],
    memories: &[Memory],
) -> CompileResult<String> {
    let mut gen = AsmGen::new(resolve_jumps(program)?);
    for op in program {
        gen.emit_op(op)?;
    }
    Ok(clean_asm(&gen.assemble(constants, memories)?))
}

/// Section-oriented assembly builder.
struct AsmGen {
    data: String,
    bss: String,
    text: String,
    jumps: HashMap<usize, String>,
}

impl AsmGen {
    fn new(jumps: HashMap<usize, String>) -> Self {
        AsmGen {
            data: String::new(),
            bss: String::new(),
            text: String::new(),
            jumps,
        }
    }

    /// Concatenate the fixed prelude, the three sections and the epilogue.
    fn assemble(&self, constants: &[Constant], memories: &[Memory]) -> CompileResult<String> {
        let mut asm = String::new();
        writeln!(asm, "default rel")?;
        writeln!(asm)?;
        writeln!(asm, ";; DEFINES")?;
        writeln!(asm, "%define buffer_len 65535 ; User input buffer length")?;
        writeln!(asm, "%define success 0")?;
        writeln!(asm, "%define sys_exit 60")?;
        for constant in constants {
            writeln!(asm, "%define {} {}", constant.name, constant.value)?;
        }
        writeln!(asm, "section .data")?;
        asm.push_str(&self.data);
        writeln!(asm, "section .bss")?;
        writeln!(asm, "  args_ptr: resq 1")?;
        asm.push_str(&self.bss);
        for memory in memories {
            writeln!(
                asm,
                ";; -- MEMORY {} | File: {}, Row: {}, Col: {}",
                memory.name, memory.location.file, memory.location.row, memory.location.col
            )?;
            writeln!(asm, "  {}: RESB {}", memory.name, memory.size)?;
        }
        writeln!(asm, "section .text")?;
        writeln!(asm)?;
        asm.push_str(PRINT_ROUTINE);
        writeln!(asm)?;
        writeln!(asm, "global _start")?;
        writeln!(asm, "_start:")?;
        writeln!(asm, "  mov [args_ptr], rsp   ; Pointer to argc")?;
        asm.push_str(&self.text);
        writeln!(asm, ";; -- exit syscall")?;
        writeln!(asm, "  mov rax, sys_exit")?;
        writeln!(asm, "  mov rdi, success")?;
        writeln!(asm, "  syscall")?;
        Ok(asm)
    }

    fn emit_op(&mut self, op: &Op) -> CompileResult<()> {
        self.emit_comment(op)?;
        match op.ty {
            // Casts only affect the type checker; IF is just the opener the
            // matching DO jumps from.
            OpType::CastBool
            | OpType::CastChar
            | OpType::CastInt
            | OpType::CastPtr
            | OpType::CastStr
            | OpType::If => Ok(()),
            OpType::PushInt | OpType::PushBool | OpType::PushUint8 => {
                self.emit_push_int(&op.token.value)
            }
            OpType::PushChar => self.emit_push_char(op),
            OpType::PushPtr => self.emit_push_ptr(&op.token.value),
            OpType::PushStr => self.emit_push_str(op),
            OpType::PushCstr => self.emit_push_cstr(op),
            OpType::PushArray => self.emit_push_array(op),
            OpType::While => Ok(writeln!(self.text, "WHILE{}:", op.id)?),
            OpType::Do => self.emit_do(op),
            OpType::Done => self.emit_done(op),
            OpType::Elif => self.emit_branch_opener(op, "ELIF"),
            OpType::Else => self.emit_branch_opener(op, "ELSE"),
            OpType::Endif => Ok(writeln!(self.text, "ENDIF{}:", op.id)?),
            OpType::Break => self.emit_jump(op),
            OpType::Continue => self.emit_continue(op),
            OpType::Intrinsic(intrinsic) => self.emit_intrinsic(op, intrinsic),
        }
    }

    fn emit_comment(&mut self, op: &Op) -> CompileResult<()> {
        let name = match op.ty {
            OpType::Intrinsic(_) => format!("{} {}", op.ty.name(), op.token.value),
            _ => op.ty.name().to_string(),
        };
        let loc = &op.token.location;
        writeln!(
            self.text,
            ";; -- {} | File: {}, Row: {}, Col: {}",
            name, loc.file, loc.row, loc.col
        )?;
        Ok(())
    }

    fn jump_target(&self, op: &Op) -> CompileResult<&str> {
        self.jumps.get(&op.id).map(String::as_str).ok_or_else(|| {
            CompilerError::at_token(
                ErrorKind::UnknownError,
                format!("No jump target resolved for {}", op.ty.name()),
                &op.token,
            )
        })
    }

    /// DO removes the condition and the operand the comparison left behind,
    /// then jumps past the branch when the condition is zero.
    fn emit_do(&mut self, op: &Op) -> CompileResult<()> {
        let target = self.jump_target(op)?.to_string();
        writeln!(self.text, "  pop rax")?;
        writeln!(self.text, "  add rsp, 8")?;
        writeln!(self.text, "  test rax, rax")?;
        writeln!(self.text, "  jz {}", target)?;
        Ok(())
    }

    /// DONE jumps back to the loop's WHILE and is the label BREAK targets.
    fn emit_done(&mut self, op: &Op) -> CompileResult<()> {
        let target = self.jump_target(op)?.to_string();
        writeln!(self.text, "  jmp {}", target)?;
        writeln!(self.text, "DONE{}:", op.id)?;
        Ok(())
    }

    /// ELIF and ELSE terminate the previous branch with a jump to ENDIF and
    /// label the start of the next one.
    fn emit_branch_opener(&mut self, op: &Op, label: &str) -> CompileResult<()> {
        let target = self.jump_target(op)?.to_string();
        writeln!(self.text, "  jmp {}", target)?;
        writeln!(self.text, "{}{}:", label, op.id)?;
        Ok(())
    }

    fn emit_jump(&mut self, op: &Op) -> CompileResult<()> {
        let target = self.jump_target(op)?.to_string();
        writeln!(self.text, "  jmp {}", target)?;
        Ok(())
    }

    /// CONTINUE jumps to the loop head and leaves a DONE label under its own
    /// id so forward scans for the loop end stay balanced.
    fn emit_continue(&mut self, op: &Op) -> CompileResult<()> {
        let target = self.jump_target(op)?.to_string();
        writeln!(self.text, "  jmp {}", target)?;
        writeln!(self.text, "DONE{}:", op.id)?;
        Ok(())
    }

    fn emit_push_int(&mut self, value: &str) -> CompileResult<()> {
        writeln!(self.text, "  mov rax, {}", value)?;
        writeln!(self.text, "  push rax")?;
        Ok(())
    }

    fn emit_push_char(&mut self, op: &Op) -> CompileResult<()> {
        let code = op.token.value.as_bytes()[1];
        writeln!(self.text, "  mov rax, {}", code)?;
        writeln!(self.text, "  push rax")?;
        Ok(())
    }

    fn emit_push_ptr(&mut self, name: &str) -> CompileResult<()> {
        writeln!(self.text, "  mov rax, {}", name)?;
        writeln!(self.text, "  push rax")?;
        Ok(())
    }

    fn emit_push_str(&mut self, op: &Op) -> CompileResult<()> {
        writeln!(self.data, "  s{} db {}", op.id, string_operands(&op.token.value))?;
        writeln!(self.text, "  mov rsi, s{} ; Pointer to string", op.id)?;
        writeln!(self.text, "  push rsi")?;
        Ok(())
    }

    fn emit_push_cstr(&mut self, op: &Op) -> CompileResult<()> {
        writeln!(self.data, "  cs{} db {}", op.id, string_operands(&op.token.value))?;
        writeln!(self.text, "  mov rsi, cs{} ; Pointer to string", op.id)?;
        writeln!(self.text, "  push rsi")?;
        Ok(())
    }

    /// Arrays lay out one null-terminated string per element followed by a
    /// null-terminated pointer table the op pushes.
    fn emit_push_array(&mut self, op: &Op) -> CompileResult<()> {
        let elements = array_elements(&op.token.value);
        for (i, element) in elements.iter().enumerate() {
            writeln!(self.data, "  s{}_{} db {}", op.id, i, string_operands(element))?;
        }
        write!(self.data, "  s_arr{}: dq ", op.id)?;
        for i in 0..elements.len() {
            write!(self.data, "s{}_{}, ", op.id, i)?;
        }
        writeln!(self.data, "0")?;
        writeln!(self.text, "  mov rsi, s_arr{} ; Pointer to array", op.id)?;
        writeln!(self.text, "  push rsi")?;
        Ok(())
    }

    fn emit_intrinsic(&mut self, op: &Op, intrinsic: Intrinsic) -> CompileResult<()> {
        use Intrinsic::*;
        match intrinsic {
            Argc => {
                writeln!(self.text, "  mov rax, [args_ptr]")?;
                writeln!(self.text, "  mov rax, [rax]")?;
                writeln!(self.text, "  push rax")?;
            }
            Argv => {
                writeln!(self.text, "  mov rax, [args_ptr]")?;
                writeln!(self.text, "  add rax, 8")?;
                writeln!(self.text, "  push rax")?;
            }
            Divmod => {
                self.emit_division(true, true)?;
            }
            Div => {
                self.emit_division(false, true)?;
            }
            Mod => {
                self.emit_division(true, false)?;
            }
            Drop => writeln!(self.text, "  add rsp, 8")?,
            Dup => {
                writeln!(self.text, "  pop rax")?;
                writeln!(self.text, "  push rax")?;
                writeln!(self.text, "  push rax")?;
            }
            Over => {
                writeln!(self.text, "  pop rax")?;
                writeln!(self.text, "  pop rbx")?;
                writeln!(self.text, "  push rbx")?;
                writeln!(self.text, "  push rax")?;
                writeln!(self.text, "  push rbx")?;
            }
            Rot => {
                // a b c -> b c a: the third-from-top ends up on top.
                writeln!(self.text, "  pop rax")?;
                writeln!(self.text, "  pop rbx")?;
                writeln!(self.text, "  pop rcx")?;
                writeln!(self.text, "  push rbx")?;
                writeln!(self.text, "  push rax")?;
                writeln!(self.text, "  push rcx")?;
            }
            Swap => {
                writeln!(self.text, "  pop rax")?;
                writeln!(self.text, "  pop rbx")?;
                writeln!(self.text, "  push rax")?;
                writeln!(self.text, "  push rbx")?;
            }
            Swap2 => {
                writeln!(self.text, "  pop rax")?;
                writeln!(self.text, "  pop rbx")?;
                writeln!(self.text, "  pop rcx")?;
                writeln!(self.text, "  pop rdx")?;
                writeln!(self.text, "  push rbx")?;
                writeln!(self.text, "  push rax")?;
                writeln!(self.text, "  push rdx")?;
                writeln!(self.text, "  push rcx")?;
            }
            Nth => {
                writeln!(self.text, "  pop rax")?;
                writeln!(self.text, "  sub rax, 1")?;
                writeln!(self.text, "  mov rbx, 8")?;
                writeln!(self.text, "  mul rbx")?;
                writeln!(self.text, "  add rsp, rax ; Stack pointer to the Nth element")?;
                writeln!(self.text, "  pop rbx      ; Get Nth element to rbx")?;
                writeln!(self.text, "  add rax, 8")?;
                writeln!(self.text, "  sub rsp, rax ; Return stack pointer")?;
                writeln!(self.text, "  push rbx")?;
            }
            Eq => self.emit_comparison("cmove")?,
            Ne => self.emit_comparison("cmovne")?,
            Lt => self.emit_comparison("cmovl")?,
            Le => self.emit_comparison("cmovle")?,
            Gt => self.emit_comparison("cmovg")?,
            Ge => self.emit_comparison("cmovge")?,
            Plus => self.emit_arithmetic("add")?,
            Minus => self.emit_arithmetic("sub")?,
            Mul => {
                writeln!(self.text, "  pop rax")?;
                writeln!(self.text, "  pop rbx")?;
                writeln!(self.text, "  mul rbx")?;
                writeln!(self.text, "  push rax  ; Product")?;
            }
            Pow => {
                return Err(CompilerError::at_token(
                    ErrorKind::NotImplemented,
                    "Intrinsic 'POW' has not been implemented.",
                    &op.token,
                ));
            }
            Print | PrintInt => {
                writeln!(self.text, "  pop rdi")?;
                writeln!(self.text, "  call print")?;
            }
            Puts => {
                writeln!(self.text, "  pop r9")?;
                writeln!(self.text, "  mov rdi, r9      ; pointer to string")?;
                writeln!(self.text, "  xor rcx, rcx     ; zero rcx")?;
                writeln!(self.text, "  not rcx          ; set rcx = -1")?;
                writeln!(self.text, "  xor al, al       ; zero the al register")?;
                writeln!(self.text, "  cld              ; clear the direction flag")?;
                writeln!(self.text, "  repnz scasb      ; get the string length")?;
                writeln!(self.text, "  not rcx          ; absolute value of the result")?;
                writeln!(self.text, "  dec rcx          ; skip the null-terminator")?;
                writeln!(self.text, "  mov rdx, rcx     ; put length in rdx")?;
                writeln!(self.text, "  mov rsi, r9")?;
                writeln!(self.text, "  mov rax, 1       ; write")?;
                writeln!(self.text, "  mov rdi, rax     ; stdout")?;
                writeln!(self.text, "  syscall")?;
            }
            Input => {
                writeln!(self.bss, "  buffer{}: resb buffer_len", op.id)?;
                writeln!(self.text, "  mov rax, 0   ; read")?;
                writeln!(self.text, "  mov rdi, 0   ; stdin")?;
                writeln!(self.text, "  mov rsi, buffer{}", op.id)?;
                writeln!(self.text, "  mov rdx, buffer_len")?;
                writeln!(self.text, "  syscall")?;
                writeln!(self.text, "  xor rdx, rdx")?;
                writeln!(
                    self.text,
                    "  mov [buffer{}+rax-1], dl  ; Change newline character to NULL",
                    op.id
                )?;
                writeln!(self.text, "  push buffer{}", op.id)?;
            }
            LoadBool | LoadChar | LoadUint8 => self.emit_load("bl")?,
            LoadInt | LoadPtr | LoadStr => self.emit_load("rbx")?,
            StoreBool | StoreChar | StoreUint8 => self.emit_store("bl")?,
            StoreInt | StorePtr | StoreStr => self.emit_store("rbx")?,
            Syscall0 | Syscall1 | Syscall2 | Syscall3 | Syscall4 | Syscall5 | Syscall6 => {
                let arity = intrinsic.syscall_arity().unwrap();
                writeln!(self.text, "  pop rax ; syscall")?;
                for (i, register) in SYSCALL_REGISTERS.iter().take(arity).enumerate() {
                    writeln!(self.text, "  pop {} ; {}. arg", register, i + 1)?;
                }
                writeln!(self.text, "  syscall")?;
                writeln!(self.text, "  push rax ; return code")?;
            }
        }
        Ok(())
    }

    /// Comparisons leave the first operand and the boolean `a <op> b`, so
    /// the compare runs second-from-top against top.
    fn emit_comparison(&mut self, cmov: &str) -> CompileResult<()> {
        writeln!(self.text, "  pop rax")?;
        writeln!(self.text, "  pop rbx")?;
        writeln!(self.text, "  mov rcx, 0")?;
        writeln!(self.text, "  mov rdx, 1")?;
        writeln!(self.text, "  cmp rbx, rax")?;
        writeln!(self.text, "  {} rcx, rdx", cmov)?;
        writeln!(self.text, "  push rbx")?;
        writeln!(self.text, "  push rcx")?;
        Ok(())
    }

    fn emit_arithmetic(&mut self, operation: &str) -> CompileResult<()> {
        writeln!(self.text, "  pop rbx")?;
        writeln!(self.text, "  pop rax")?;
        writeln!(self.text, "  {} rax, rbx", operation)?;
        writeln!(self.text, "  push rax")?;
        Ok(())
    }

    fn emit_division(&mut self, remainder: bool, quotient: bool) -> CompileResult<()> {
        writeln!(self.text, "  xor edx, edx ; Do not use floating point arithmetic")?;
        writeln!(self.text, "  pop rbx")?;
        writeln!(self.text, "  pop rax")?;
        writeln!(self.text, "  div rbx")?;
        if remainder {
            writeln!(self.text, "  push rdx ; Remainder")?;
        }
        if quotient {
            writeln!(self.text, "  push rax ; Quotient")?;
        }
        Ok(())
    }

    /// LOAD variants dereference the popped pointer, zero-extended.
    fn emit_load(&mut self, register: &str) -> CompileResult<()> {
        writeln!(self.text, "  pop rax")?;
        writeln!(self.text, "  xor rbx, rbx")?;
        writeln!(self.text, "  mov {}, [rax]", register)?;
        writeln!(self.text, "  push rbx")?;
        Ok(())
    }

    /// STORE variants write the value below the popped pointer through it.
    fn emit_store(&mut self, register: &str) -> CompileResult<()> {
        writeln!(self.text, "  pop rax")?;
        writeln!(self.text, "  pop rbx")?;
        writeln!(self.text, "  mov [rax], {}", register)?;
        Ok(())
    }
}

/// An open block during jump resolution.
enum OpenBlock {
    If {
        /// DOs (and branch openers) waiting for the next ELIF/ELSE/ENDIF.
        pending_dos: Vec<usize>,
        /// ELIF/ELSE ids waiting for the ENDIF label.
        pending_branches: Vec<usize>,
    },
    While {
        while_id: usize,
        pending_dos: Vec<usize>,
        pending_breaks: Vec<usize>,
    },
}

/// Resolve every control-flow op's jump target in one pass.
///
/// Returns a map from op id to the label the op jumps to: `DO` to the start
/// of the next branch (or loop end), `ELIF`/`ELSE` to their `ENDIF`,
/// `DONE`/`CONTINUE` back to their `WHILE`, and `BREAK` to its loop's
/// `DONE`.
fn resolve_jumps(program: &Program) -> CompileResult<HashMap<usize, String>> {
    let mut jumps: HashMap<usize, String> = HashMap::new();
    let mut open: Vec<OpenBlock> = Vec::new();

    for op in program {
        match op.ty {
            OpType::If => open.push(OpenBlock::If {
                pending_dos: Vec::new(),
                pending_branches: Vec::new(),
            }),
            OpType::While => open.push(OpenBlock::While {
                while_id: op.id,
                pending_dos: Vec::new(),
                pending_breaks: Vec::new(),
            }),
            OpType::Do => match open.last_mut() {
                Some(OpenBlock::If { pending_dos, .. })
                | Some(OpenBlock::While { pending_dos, .. }) => pending_dos.push(op.id),
                None => {
                    return Err(ambiguous(
                        ErrorKind::AmbiguousDo,
                        "DO without a parent IF, ELIF or WHILE",
                        op,
                    ));
                }
            },
            OpType::Elif | OpType::Else => match open.last_mut() {
                Some(OpenBlock::If {
                    pending_dos,
                    pending_branches,
                }) => {
                    let label = format!("{}{}", op.ty.name(), op.id);
                    for do_id in pending_dos.drain(..) {
                        jumps.insert(do_id, label.clone());
                    }
                    pending_branches.push(op.id);
                }
                _ => {
                    let kind = if op.ty == OpType::Elif {
                        ErrorKind::AmbiguousElif
                    } else {
                        ErrorKind::AmbiguousElse
                    };
                    return Err(ambiguous(
                        kind,
                        &format!("{} without a parent IF", op.ty.name()),
                        op,
                    ));
                }
            },
            OpType::Endif => match open.pop() {
                Some(OpenBlock::If {
                    pending_dos,
                    pending_branches,
                }) => {
                    let label = format!("ENDIF{}", op.id);
                    for id in pending_dos.into_iter().chain(pending_branches) {
                        jumps.insert(id, label.clone());
                    }
                }
                _ => {
                    return Err(ambiguous(
                        ErrorKind::AmbiguousEndif,
                        "ENDIF without a parent IF",
                        op,
                    ));
                }
            },
            OpType::Done => match open.pop() {
                Some(OpenBlock::While {
                    while_id,
                    pending_dos,
                    pending_breaks,
                }) => {
                    jumps.insert(op.id, format!("WHILE{}", while_id));
                    let label = format!("DONE{}", op.id);
                    for id in pending_dos.into_iter().chain(pending_breaks) {
                        jumps.insert(id, label.clone());
                    }
                }
                _ => {
                    return Err(ambiguous(
                        ErrorKind::AmbiguousDone,
                        "DONE without a parent WHILE",
                        op,
                    ));
                }
            },
            OpType::Break => match enclosing_while(&mut open) {
                Some(OpenBlock::While { pending_breaks, .. }) => pending_breaks.push(op.id),
                _ => {
                    return Err(ambiguous(
                        ErrorKind::AmbiguousBreak,
                        "BREAK without an enclosing WHILE",
                        op,
                    ));
                }
            },
            OpType::Continue => match enclosing_while(&mut open) {
                Some(OpenBlock::While { while_id, .. }) => {
                    jumps.insert(op.id, format!("WHILE{}", while_id));
                }
                _ => {
                    return Err(ambiguous(
                        ErrorKind::AmbiguousContinue,
                        "CONTINUE without an enclosing WHILE",
                        op,
                    ));
                }
            },
            _ => {}
        }
    }

    match open.pop() {
        None => Ok(jumps),
        Some(OpenBlock::While { .. }) => Err(CompilerError::new(
            ErrorKind::AmbiguousBreak,
            "WHILE loop does not have DONE.",
        )),
        Some(OpenBlock::If { .. }) => Err(CompilerError::new(
            ErrorKind::AmbiguousEndif,
            "IF block does not have ENDIF.",
        )),
    }
}

/// The innermost open WHILE, skipping open IF blocks.
fn enclosing_while(open: &mut [OpenBlock]) -> Option<&mut OpenBlock> {
    open.iter_mut()
        .rev()
        .find(|block| matches!(block, OpenBlock::While { .. }))
}

fn ambiguous(kind: ErrorKind, message: &str, op: &Op) -> CompilerError {
    CompilerError::at_token(kind, message.to_string(), &op.token)
}

/// Turn a quoted literal into NASM `db` operands, rewriting `\n` escapes to
/// the byte 10 and always null-terminating.
///
/// `"Hi\n"` becomes `"Hi",10,0`.
fn string_operands(quoted: &str) -> String {
    let content = &quoted[1..quoted.len() - 1];
    let mut operands: Vec<String> = Vec::new();
    for (i, part) in content.split("\\n").enumerate() {
        if i > 0 {
            operands.push("10".to_string());
        }
        if !part.is_empty() {
            operands.push(format!("\"{}\"", part));
        }
    }
    operands.push("0".to_string());
    operands.join(",")
}

/// Split an `array(e1,e2,...)` literal into its element literals.
fn array_elements(value: &str) -> Vec<String> {
    let open = value.find('(').map(|i| i + 1).unwrap_or(0);
    let close = value.rfind(')').unwrap_or(value.len());
    value[open..close]
        .split(',')
        .map(|element| element.trim().replace('\'', "\""))
        .filter(|element| !element.is_empty())
        .collect()
}

/// Delete `%define NAME VALUE` lines whose NAME no other line mentions.
fn clean_asm(asm: &str) -> String {
    let lines: Vec<&str> = asm.lines().collect();
    let mut cleaned = String::with_capacity(asm.len());
    for (i, line) in lines.iter().enumerate() {
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.first() == Some(&"%define") {
            let name = words[1];
            let referenced = lines
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .any(|(_, other)| other.split_whitespace().any(|word| word == name));
            if !referenced {
                continue;
            }
        }
        cleaned.push_str(line);
        cleaned.push('\n');
    }
    cleaned
}
