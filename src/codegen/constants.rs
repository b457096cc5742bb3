// Constants for the x86-64 System V target

/// Integer argument registers, in argument order
pub const ARG_REGISTERS: [&str; 6] = ["rdi", "rsi", "rdx", "rcx", "r8", "r9"];

/// Width of one pushed value and the granularity of frame slots
pub const SLOT_SIZE: usize = 8;

/// `rsp` must be a multiple of this at every `call`
pub const STACK_ALIGNMENT: usize = 16;

/// Offset from `rbp` of the first stack-passed argument
/// (skips the saved `rbp` and the return address)
pub const STACK_ARGS_OFFSET: i64 = 16;

/// Prefix of control-flow labels
pub const LABEL_PREFIX: &str = ".L";

/// Prefix of string-literal labels in `.rodata`
pub const STRING_LABEL_PREFIX: &str = ".LC";
