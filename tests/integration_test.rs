// Integration tests for the compiler's public entry point

use crustcc::{compile, CompileError};
use pretty_assertions::assert_eq;

fn compile_ok(source: &str) -> String {
    match compile(source) {
        Ok(asm) => asm,
        Err(e) => panic!("compilation failed: {}", e),
    }
}

#[test]
fn test_minimal_program() {
    let asm = compile_ok("int main() { return 42; }");
    assert_eq!(
        asm,
        ".intel_syntax noprefix\n\
         .global main\n\
         .text\n\
         main:\n\
         \tpush rbp\n\
         \tmov rbp, rsp\n\
         \tmov rax, 42\n\
         \tmov rsp, rbp\n\
         \tpop rbp\n\
         \tret\n\
         \tmov rax, 0\n\
         \tmov rsp, rbp\n\
         \tpop rbp\n\
         \tret\n\
         .section .note.GNU-stack,\"\",@progbits\n"
    );
}

#[test]
fn test_section_order() {
    let source = r#"
        int counter;
        int limit = 10;
        int main() {
            char *s = "hi";
            return limit;
        }
    "#;
    let asm = compile_ok(source);

    let data = asm.find(".data\n").expect("missing .data");
    let bss = asm.find(".bss\n").expect("missing .bss");
    let rodata = asm.find(".section .rodata\n").expect("missing .rodata");
    let text = asm.find(".text\n").expect("missing .text");
    assert!(data < bss && bss < rodata && rodata < text);

    assert!(asm.contains("limit:\n\t.long 10\n"));
    assert!(asm.contains("counter:\n\t.zero 4\n"));
    assert!(asm.contains(".LC0:\n\t.string \"hi\"\n"));
    assert!(asm.ends_with("\tret\n.section .note.GNU-stack,\"\",@progbits\n"));
}

#[test]
fn test_global_initializers_are_truncated() {
    let asm = compile_ok("char c = 257; short s = -1; int *p = 0; int main() { return c; }");
    assert!(asm.contains("c:\n\t.byte 1\n"));
    assert!(asm.contains("s:\n\t.short 65535\n"));
    assert!(asm.contains("p:\n\t.quad 0\n"));
}

#[test]
fn test_global_initializer_folds_constants() {
    let asm = compile_ok("int g = 2 * 3 + 4; int main() { return g; }");
    assert!(asm.contains("g:\n\t.long 10\n"));
}

#[test]
fn test_globals_are_rip_relative() {
    let asm = compile_ok("int g[3]; int main() { g[1] = 2; return g[1]; }");
    assert!(asm.contains("lea rax, [rip + g]"));
    assert!(asm.contains("g:\n\t.zero 12\n"));
}

#[test]
fn test_string_literals_are_pooled() {
    let asm = compile_ok(r#"int main() { char *a = "x\n"; char *b = "x\n"; char *c = "y"; return 0; }"#);
    assert_eq!(asm.matches(".string").count(), 2);
    assert!(asm.contains(".LC0:\n\t.string \"x\\n\"\n"));
    assert!(asm.contains(".LC1:\n\t.string \"y\"\n"));
}

#[test]
fn test_functions_in_source_order() {
    let asm = compile_ok("int helper() { return 1; } int main() { return helper(); }");
    let helper = asm.find("helper:\n").unwrap();
    let main = asm.find("main:\n").unwrap();
    assert!(helper < main);
    assert!(asm.contains("call helper"));
}

#[test]
fn test_parameters_are_spilled() {
    let asm = compile_ok("int add(int a, int b) { return a + b; } int main() { return add(1, 2); }");
    assert!(asm.contains("add:\n\tpush rbp\n\tmov rbp, rsp\n\tsub rsp, 16\n"));
    assert!(asm.contains("\tmov qword ptr [rbp-8], rdi\n\tmov qword ptr [rbp-16], rsi\n"));
}

#[test]
fn test_compilation_is_deterministic() {
    let source = r#"
        struct point { int x; int y; };
        int g;
        int f(int a) { if (a) return a; while (a < 3) a = a + 1; return a; }
        int main() {
            struct point p;
            p.x = f(1) && f(0);
            return p.x || g;
        }
    "#;
    assert_eq!(compile_ok(source), compile_ok(source));
}

#[test]
fn test_preprocessor_lines_and_comments_are_ignored() {
    let source = r#"
        #include <stdio.h>
        // line comment
        int main() { /* block
            comment */ return 0; }
    "#;
    compile_ok(source);
}

#[test]
fn test_lex_error() {
    let err = compile("int main() { return 1 @ 2; }").unwrap_err();
    assert!(matches!(err, CompileError::Lex { .. }), "{:?}", err);
    assert_eq!(err.location().line, 1);
}

#[test]
fn test_missing_semicolon_is_syntax_error() {
    let err = compile("int main() {\n  return 1\n}").unwrap_err();
    match err {
        CompileError::Syntax { message, location, .. } => {
            assert_eq!(message, "A statement not terminated with ';'.");
            assert_eq!(location.line, 3);
        }
        other => panic!("expected syntax error, got {:?}", other),
    }
}

#[test]
fn test_unterminated_block_is_syntax_error() {
    let err = compile("int main() { return 0;").unwrap_err();
    assert!(matches!(err, CompileError::Syntax { .. }), "{:?}", err);
}

#[test]
fn test_unknown_identifier_is_semantic_error() {
    let err = compile("int main() { return missing; }").unwrap_err();
    match err {
        CompileError::Semantic { message, token, .. } => {
            assert_eq!(message, "Unknown identifier");
            assert_eq!(token, "missing");
        }
        other => panic!("expected semantic error, got {:?}", other),
    }
}

#[test]
fn test_pointer_plus_pointer_is_semantic_error() {
    let err = compile("int main() { int *p; int *q; return p + q; }").unwrap_err();
    assert!(matches!(err, CompileError::Semantic { .. }), "{:?}", err);
}

#[test]
fn test_invalid_lvalue_is_semantic_error() {
    let err = compile("int main() { 1 = 2; return 0; }").unwrap_err();
    match err {
        CompileError::Semantic { message, .. } => assert_eq!(message, "Invalid lvalue"),
        other => panic!("expected semantic error, got {:?}", other),
    }
}

#[test]
fn test_bad_member_reference_is_semantic_error() {
    let no_member = compile("int main() { struct { int x; } s; return s.y; }").unwrap_err();
    assert!(matches!(no_member, CompileError::Semantic { .. }));

    let not_struct = compile("int main() { int i; return i.x; }").unwrap_err();
    assert!(matches!(not_struct, CompileError::Semantic { .. }));
}

#[test]
fn test_non_constant_global_initializer_is_rejected() {
    let err = compile("int a; int b = a; int main() { return b; }").unwrap_err();
    assert!(matches!(err, CompileError::Semantic { .. }), "{:?}", err);
}

#[test]
fn test_error_display_names_location_and_token() {
    let err = compile("int main() { return missing; }").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Semantic error at line 1, column 21: Unknown identifier \"missing\""
    );
}

#[test]
fn test_no_partial_output_on_error() {
    // The first function is fine, the second is not; nothing is returned
    let result = compile("int ok() { return 1; } int main() { return 1 +; }");
    assert!(result.is_err());
}

#[test]
fn test_huge_array_is_diagnosed() {
    for source in [
        "int main() { char a[9223372036854775807]; return 0; }",
        "int a[4611686018427387904]; int main() { return sizeof a; }",
    ] {
        match compile(source).unwrap_err() {
            CompileError::Semantic { message, .. } => assert_eq!(message, "Array too large"),
            other => panic!("expected semantic error, got {:?}", other),
        }
    }
}

#[test]
fn test_oversized_frame_is_diagnosed() {
    let err = compile("int main() { char a[2000000000]; char b[2000000000]; return 0; }").unwrap_err();
    assert!(matches!(err, CompileError::Semantic { ref message, .. } if message == "Stack frame too large"));
}
