//! End-to-end front-end tests: whole Torth programs compiled to assembly
//! text. The assembler and linker are external collaborators, so the
//! assertions here inspect the emitted assembly rather than run it.

use torthc::{compile_source, compile_to_asm, CompilerConfig, ErrorKind};

fn compile(source: &str) -> String {
    compile_source(source, "test.torth", &CompilerConfig::default()).unwrap()
}

#[test]
fn adds_and_prints() {
    let asm = compile("function main -- : 34 35 + print end");
    assert!(asm.contains("  mov rax, 34"));
    assert!(asm.contains("  mov rax, 35"));
    assert!(asm.contains("  add rax, rbx"));
    assert!(asm.contains("  pop rdi\n  call print"));
}

#[test]
fn hello_world_string_reaches_data_section() {
    let asm = compile("function main -- : \"Hello, World!\\n\" puts end");
    // Op 0 is the string push, so the literal lands in s0 with the newline
    // rewritten to a raw 10.
    assert!(asm.contains("  s0 db \"Hello, World!\",10,0"));
    assert!(asm.contains("  mov rsi, s0 ; Pointer to string"));
    let data = asm.find("section .data").unwrap();
    let bss = asm.find("section .bss").unwrap();
    let literal = asm.find("s0 db").unwrap();
    assert!(data < literal && literal < bss);
}

#[test]
fn counting_loop_shapes_and_labels() {
    let asm = compile("function main -- : 0 while dup 5 < do dup print 1 + done drop end");
    assert!(asm.contains("WHILE1:"));
    assert!(asm.contains("  jz DONE10"));
    assert!(asm.contains("  jmp WHILE1\nDONE10:"));
    assert!(asm.contains("  cmovl rcx, rdx"));
}

#[test]
fn if_else_takes_both_branch_labels() {
    let asm = compile(
        "function main -- : 7 if dup 0 > do \"pos\\n\" puts else \"non-pos\\n\" puts endif drop end",
    );
    assert!(asm.contains("  jz ELSE8"));
    assert!(asm.contains("  jmp ENDIF11\nELSE8:"));
    assert!(asm.contains("ENDIF11:"));
    assert!(asm.contains("db \"pos\",10,0"));
    assert!(asm.contains("db \"non-pos\",10,0"));
}

#[test]
fn rot_rotates_third_to_top() {
    let asm = compile("function main -- : 1 2 3 rot print print print end");
    assert!(asm.contains(
        "  pop rax\n  pop rbx\n  pop rcx\n  push rbx\n  push rax\n  push rcx\n"
    ));
}

#[test]
fn function_calls_are_inlined() {
    let asm = compile("function f -- INT : 21 2 * end function main -- : f print end");
    assert!(asm.contains("  mov rax, 21"));
    assert!(asm.contains("  mov rax, 2"));
    assert!(asm.contains("  mul rbx"));
    // No call/ret for user functions: the body is spliced into main.
    assert!(!asm.contains("call f"));
}

#[test]
fn empty_main_produces_runnable_skeleton() {
    let asm = compile("function main -- : end");
    assert!(asm.contains("global _start"));
    assert!(asm.contains("  mov [args_ptr], rsp"));
    assert!(asm.contains("  mov rax, sys_exit\n  mov rdi, success\n  syscall"));
}

#[test]
fn break_from_innermost_of_nested_loops() {
    let asm = compile(
        "function main -- : \
           0 while dup 5 < do \
             0 while dup 3 < do \
               1 + if dup 2 == do break endif \
             done drop \
             1 + \
           done drop \
         end",
    );
    // Inner DONE is op 20; the BREAK jumps there, not to the outer loop.
    // Ops: 0=0 1=WHILE 2=DUP 3=5 4=LT 5=DO 6=0 7=WHILE 8=DUP 9=3 10=LT
    //      11=DO 12=1 13=PLUS 14=IF 15=DUP 16=2 17=EQ 18=DO 19=BREAK
    //      20=ENDIF 21=DONE 22=DROP 23=1 24=PLUS 25=DONE 26=DROP
    assert!(asm.contains("  jmp DONE21"));
    assert!(asm.contains("  jmp WHILE7\nDONE21:"));
    assert!(asm.contains("  jmp WHILE1\nDONE25:"));
}

#[test]
fn nth_one_duplicates_the_top() {
    // NTH is 1-based: `1 nth` copies the value just below the popped index,
    // which is the previous top, exactly like DUP.
    let asm = compile("function main -- : 42 1 nth print print end");
    assert!(asm.contains("  sub rax, 1"));
    assert!(asm.contains("  pop rbx      ; Get Nth element to rbx"));
}

#[test]
fn memory_definitions_reserve_bss_space() {
    let asm = compile(
        "memory counter 8 end \
         function main -- : counter 42 swap store_int counter load_int print end",
    );
    assert!(asm.contains("  counter: RESB 8"));
    assert!(asm.contains("  mov rax, counter\n  push rax"));
    assert!(asm.contains("  mov [rax], rbx"));
}

#[test]
fn includes_resolve_through_search_path() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("math.torth"),
        "function double -- INT : 2 * end\n",
    )
    .unwrap();
    let config = CompilerConfig::new().with_include_path(dir.path());
    let asm = compile_source(
        "include \"math\"\nfunction main -- : 21 double print end\n",
        "test.torth",
        &config,
    )
    .unwrap();
    assert!(asm.contains("  mul rbx"));
}

#[test]
fn include_cycle_across_three_files_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.torth"), "include \"b\"\n").unwrap();
    std::fs::write(dir.path().join("b.torth"), "include \"c\"\n").unwrap();
    std::fs::write(dir.path().join("c.torth"), "include \"a\"\n").unwrap();
    let config = CompilerConfig::default();
    let err = compile_to_asm(&dir.path().join("a.torth"), &config).unwrap_err();
    match err {
        torthc::BuildError::Compile(e) => {
            assert_eq!(e.kind, ErrorKind::RecursiveInclude);
            assert!(e.message.contains("cycle"));
        }
        other => panic!("expected a compile error, got {:?}", other),
    }
}

#[test]
fn missing_include_fails() {
    let err = compile_source(
        "include \"nosuch\"\nfunction main -- : end\n",
        "test.torth",
        &CompilerConfig::default(),
    )
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::IncludeNotFound);
}

#[test]
fn user_constants_from_config_are_pushable() {
    let config = CompilerConfig::new().with_constant("ANSWER", "42");
    let asm = compile_source(
        "function main -- : ANSWER print end",
        "test.torth",
        &config,
    )
    .unwrap();
    assert!(asm.contains("%define ANSWER 42"));
    assert!(asm.contains("  mov rax, ANSWER"));
}

#[test]
fn diagnostics_carry_the_offending_location() {
    let err = compile_source(
        "function main -- :\n  1 frobnicate +\nend\n",
        "test.torth",
        &CompilerConfig::default(),
    )
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnknownWord);
    let token = err.token.clone().expect("diagnostic should carry its token");
    assert_eq!(token.location.row, 2);
    assert_eq!(token.location.col, 5);
    let rendered = err.to_string();
    assert!(rendered.contains("UNKNOWN_WORD"));
    assert!(rendered.contains("Row: 2"));
}

#[test]
fn cleanup_leaves_only_referenced_defines() {
    let config = CompilerConfig::new()
        .with_constant("USED", "1")
        .with_constant("UNUSED", "2");
    let asm = compile_source(
        "function main -- : USED print end",
        "test.torth",
        &config,
    )
    .unwrap();
    assert!(asm.contains("%define USED 1"));
    assert!(!asm.contains("%define UNUSED"));
    assert!(!asm.contains("%define buffer_len"));
}

#[test]
fn op_comments_enumerate_every_op() {
    let source = "function main -- : 1 2 + print end";
    let asm = compile(source);
    assert_eq!(asm.matches(";; -- PUSH_INT").count(), 2);
    assert_eq!(asm.matches(";; -- INTRINSIC PLUS").count(), 1);
    assert_eq!(asm.matches(";; -- INTRINSIC print").count(), 1);
}
