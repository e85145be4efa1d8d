//! Shared helpers for the integration tests.

#![allow(dead_code, unused_imports)]

use std::path::PathBuf;

pub use minivm::{compile, run, Bytecode, Config, Error, Instruction, MiniVm, Stage};

pub const FACTORIAL: &str = "n(x){ if (x==0) return 1; else return x*n(x-1); }";

/// Compile and run with the default limits.
pub fn eval(program: &str, arg: i32) -> minivm::Result<i32> {
    run(program, arg, &Config::default())
}

pub fn bytecode(program: &str) -> Bytecode {
    compile(program, &Config::default()).unwrap()
}

/// Path of a program in the `demos` directory.
pub fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join(name)
}

/// Assert that evaluating `program` with `arg` yields `expected`.
#[macro_export]
macro_rules! assert_eval {
    ($program:expr, $arg:expr, $expected:expr) => {
        assert_eq!(
            common::eval($program, $arg).unwrap(),
            $expected,
            "{} with {}",
            $program,
            $arg
        )
    };
}
