// Execution tests for arithmetic, integer widths and operators
//
// Each case compiles a `main` body, links it with the system cc and checks
// the exit status (the low 8 bits of main's return value).

mod common;

use common::run_main;

fn expect(body: &str, expected: i32) {
    if let Some(code) = run_main(body) {
        assert_eq!(code, expected, "body: {}", body);
    }
}

#[test]
fn test_empty_and_bare_returns() {
    expect("", 0);
    expect(";;;", 0);
    expect("42;", 0);
    expect("return;", 0);
    expect("return 42;", 42);
    expect("return 1; return 2;", 1);
}

#[test]
fn test_precedence_and_associativity() {
    expect("return 2+3*4;", 14);
    expect("return 2*3+4;", 10);
    expect("return (2+3)*4;", 20);
    expect("return 5+20-4;", 21);
    expect("return 10-3-2;", 5);
    expect("return 1+60/12-1;", 5);
    expect("return 5*4-3*2;", 14);
}

#[test]
fn test_unary_sign() {
    expect("return -(-3);", 3);
    expect("return +(+3);", 3);
    expect("return -(+(-3)) == 3;", 1);
    expect("return -3 == 0 - 3;", 1);
}

#[test]
fn test_signed_division() {
    expect("return -5/5;", 255);
    expect("int x = -5; return x / 5 == -1;", 1);
    expect("return 60/12;", 5);
}

#[test]
fn test_local_variables() {
    expect("int a; a=1; return a+2;", 3);
    expect("int x = 2; int y = x + 2; return y - 1;", 3);
    expect("int _long_variable_1_; _long_variable_1_ = 2; return _long_variable_1_ * 2;", 4);
    expect("int foo; int bar; int baz; foo=1; bar=baz=foo+1; return foo+bar*baz;", 5);
    expect("int foo; foo = 0; return (foo = foo + 3) == 3;", 1);
}

#[test]
fn test_increment_and_decrement() {
    expect("int x = 5; ++x; return x;", 6);
    expect("int x = 5; x++; return x;", 6);
    expect("int x = -5; return x++ == -5;", 1);
    expect("int x = -5; return ++x == -4;", 1);
    expect("int x = 5; --x; return x;", 4);
    expect("int x = -5; return --x == -6;", 1);
    expect("int x = -5; x--; return x == -6;", 1);
}

#[test]
fn test_char_wraps_to_eight_bits() {
    expect("char c = 0; c = c - 1; return c;", 255);
    expect("char c = 255; c = c + 1; return c;", 0);
    expect("char c0 = -5; char c1 = c0+8; return c1;", 3);
    expect("char x = 255; char y; y = ++x; return y;", 0);
    expect("char x; x = 0; char y; y = --x; return y;", 255);
    expect("char c = 257; return c;", 1);
}

#[test]
fn test_short_wraps_to_sixteen_bits() {
    expect("short x = 0; x = x - 1; return x == 65535;", 1);
    expect("short x = 65535; x = x + 1; return x;", 0);
    expect("short x0 = -5; short x1 = x0+8; return x1;", 3);
    expect("short x = 65535; short y; y = ++x; return y;", 0);
}

#[test]
fn test_relations() {
    expect("return 2 == 2+1;", 0);
    expect("return 2 != 2+1;", 1);
    expect("return 3 < 3;", 0);
    expect("return 2 < 3;", 1);
    expect("return 4 > 3;", 1);
    expect("return 3 <= 3;", 1);
    expect("return 2 >= 3;", 0);
    expect("return 1 < 10 == 10 > 1;", 1);
    expect("int i; int j; i = j = 2+3*4 == 14; return i + j;", 2);
    expect("int i = 256 + 1; char c = 2; return i > c;", 1);
    expect("char c0 = 1; char c1 = 2; return c0 > c1;", 0);
}

#[test]
fn test_logical_operators() {
    expect("char x1 = 0; char x2 = 0; return x1 || x2;", 0);
    expect("char x1 = 0; char x2 = 1; return x1 || x2;", 1);
    expect("char x1 = 1; char x2 = 0; return x1 && x2;", 0);
    expect("char x1 = 1; char x2 = 1; return x1 && x2;", 1);
}

#[test]
fn test_logical_operators_short_circuit() {
    expect(
        "char x1 = 1; char x2 = 0; int res = x1++ || x2++; \
         if (res == 1 && x1 == 2 && x2 == 0) return 1; else return 0;",
        1,
    );
    expect(
        "char x1 = 0; char x2 = 1; int res = x1++ && x2++; \
         if (res == 0 && x1 == 1 && x2 == 1) return 1; else return 0;",
        1,
    );
    expect(
        "char x1 = 1; char x2 = 1; int res = x1++ && x2++; \
         if (res == 1 && x1 == 2 && x2 == 2) return 1; else return 0;",
        1,
    );
}

#[test]
fn test_bitwise_operators() {
    expect("return 1 | 3;", 3);
    expect("return 1 ^ 3;", 2);
    expect("return 2 & 3;", 2);
    expect("return 0 & 3;", 0);
}

#[test]
fn test_compound_assignment() {
    expect("int x = -5; x += 5; return x;", 0);
    expect("int x = -5; return x += 5;", 0);
    expect("int x = -5; x -= 5; return x == -10;", 1);
    expect("int x = -5; x *= 5; return x == -25;", 1);
    expect("int x = -5; x /= 5; return x == -1;", 1);
    expect("char x = 5; x |= 7; return x;", 7);
    expect("int x = 5; x ^= 7; return x;", 2);
    expect("char x = 5; x &= 7; return x;", 5);
}

#[test]
fn test_sizeof() {
    expect("return sizeof(char);", 1);
    expect("return sizeof(short);", 2);
    expect("return sizeof(int);", 4);
    expect("return sizeof(int *);", 8);
    expect("int a[5]; return sizeof a;", 20);
    expect("return sizeof(struct {int x0; char x1;});", 8);
    expect("return sizeof(struct {int x0; char x1; int x2;});", 16);
}
