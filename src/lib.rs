//! MiniVM is a one-pass compiler and a stack-based virtual machine for Mini, a tiny
//! integer-only language whose programs consist of a single, possibly recursive,
//! function of one parameter.
//!
//! # Example
//!
//! ```text
//! fac(n) {
//!     if (n == 0)
//!         return 1;
//!     else
//!         return n * fac(n-1);
//! }
//! ```
//!
//! compiles to
//!
//! ```text
//! 13 3 15 2 1 1 0 9 14 1 1 14 12 25 2 1 2 1 1 1 5 13 3 6 14 0
//! ```
//!
//! and run with `8` yields `40320`.
//!
//! # Grammar
//!
//! ```text
//! Program    = Function
//! Function   = identifier "(" identifier ")" Block
//! Block      = "{" {Statement} "}"
//! Statement  = identifier "=" Expression ";"
//!            | "if" Condition Statement "else" Statement
//!            | "while" Condition Statement
//!            | "return" Expression ";"
//!            | Block | ";"
//! Condition  = "(" Expression ("=="|"!="|">"|"<") Expression ")"
//! Expression = Term {("+"|"-") Term}
//! Term       = Factor {("*"|"/") Factor}
//! Factor     = number | identifier | "(" Expression ")" | identifier "(" Expression ")"
//! ```
//!
//! `*` and `/` take a whole term as their right operand, so `24 / 4 / 2` is `12`.
//!
//! # Instructions
//!
//! | Code | Instruction | Usage      | Brief   |
//! |------|-------------|------------|---------|
//! | 0    | Nop         | NOP        | Do nothing. Ends the function body. |
//! | 1    | Push        | PUSH _c_   | Push the constant `c` on top of the stack. |
//! | 2    | Load        | LOAD _v_   | Push the value of slot `v` of the current frame. |
//! | 3    | Store       | STORE _v_  | Pop a value into slot `v` of the current frame. |
//! | 4    | Add         | ADD        | Pop two values and push their sum. |
//! | 5    | Sub         | SUB        | Pop two values and push `second - top`. |
//! | 6    | Mul         | MUL        | Pop two values and push their product. |
//! | 7    | Div         | DIV        | Pop two values and push `second / top`, truncated toward zero. |
//! | 8    | IfCmpEq     | IF_CMPEQ _a_ | Pop two values, jump to `a` if they are equal. |
//! | 9    | IfCmpNe     | IF_CMPNE _a_ | Pop two values, jump to `a` if they differ. |
//! | 10   | IfCmpLe     | IF_CMPLE _a_ | Pop two values, jump to `a` if `second <= top`. |
//! | 11   | IfCmpGe     | IF_CMPGE _a_ | Pop two values, jump to `a` if `second >= top`. |
//! | 12   | Goto        | GOTO _a_   | Jump to `a`. |
//! | 13   | Call        | CALL _a_   | Call the function at `a` with the top of stack as argument. |
//! | 14   | Return      | RETURN     | Return the top of stack to the caller. |
//! | 15   | Stop        | STOP       | Halt the machine. |
//!
//! # Important notes
//!
//! - Every program starts with `CALL 3; STOP`, so address 3 is the function's start address.
//! - Frame slots are assigned in the order identifiers first appear, function name included.
//! - Division by zero and stack exhaustion are reported as errors.

pub mod bytecode;
pub mod compiler;
pub mod config;
pub mod error;
mod lexer;
pub mod symtab;
pub mod token;
pub mod vm;

use std::{fs, io, path::Path};

use log::trace;

pub use bytecode::{Bytecode, Instruction};
pub use compiler::compile;
pub use config::Config;
pub use error::{Error, Result, Stage};
pub use vm::MiniVm;

/// Read a source file.
pub fn load_source(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => Error::SourceNotFound {
            path: path.to_path_buf(),
            source,
        },
        _ => Error::SourceRead {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// Compile `program` and run it with `arg`.
pub fn run(program: &str, arg: i32, config: &Config) -> Result<i32> {
    trace!("compiling {program}");
    let bytecode = compile(program, config)?;
    trace!("executing {bytecode}");
    MiniVm::load(&bytecode, config).run(arg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_source() {
        let err = load_source("does/not/exist.mini").unwrap_err();
        assert!(matches!(err, Error::SourceNotFound { .. }));
        assert_eq!(err.stage(), Stage::Source);
    }

    #[test]
    fn unreadable_source() {
        let path = std::env::temp_dir().join(format!("minivm-{}-latin1.mini", std::process::id()));
        fs::write(&path, [0x66, 0xff, 0xfe]).unwrap();
        let err = load_source(&path).unwrap_err();
        fs::remove_file(&path).unwrap();

        match &err {
            Error::SourceRead { source, .. } => assert_eq!(source.kind(), io::ErrorKind::InvalidData),
            other => panic!("expected read error, got {:?}", other),
        }
        assert_eq!(err.stage(), Stage::Source);
    }

    #[test]
    fn directory_as_source() {
        let err = load_source(std::env::temp_dir()).unwrap_err();
        assert!(matches!(err, Error::SourceRead { .. }));
        assert!(err.to_string().starts_with("cannot read source file"));
    }

    #[test]
    fn run_reports_stage() {
        let err = run("f(x) { return x / 0; }", 1, &Config::default()).unwrap_err();
        assert_eq!(err.stage(), Stage::Vm);
        let err = run("f(x { }", 1, &Config::default()).unwrap_err();
        assert_eq!(err.stage(), Stage::Parser);
    }
}
