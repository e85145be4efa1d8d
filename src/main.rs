use std::{
    env,
    io::{self, Write},
    process,
};

use anyhow::{anyhow, bail, Context};
use log::debug;

use minivm::{compile, load_source, Config, MiniVm};

#[derive(Debug)]
struct Args {
    source: String,
    arg: i32,
    disasm: bool,
    config: Config,
}

fn main() {
    env_logger::init();

    if let Err(e) = try_main() {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}

fn try_main() -> anyhow::Result<()> {
    let args = parse_args(env::args().skip(1))?;
    debug!("limits: {:?}", args.config);

    let program = load_source(&args.source)?;
    execute(&args, &program, &mut io::stdout().lock())
}

/// Compile and run `program`, writing the code dump and the result to `out`.
///
/// Nothing is written when compilation fails.
fn execute(args: &Args, program: &str, out: &mut impl Write) -> anyhow::Result<()> {
    let bytecode = compile(program, &args.config)
        .with_context(|| format!("compilation of {} failed", args.source))?;

    writeln!(out, "VMCode: {}", bytecode)?;
    if args.disasm {
        write!(out, "{}", bytecode.listing())?;
    }

    let result = MiniVm::load(&bytecode, &args.config)
        .run(args.arg)
        .context("execution failed")?;
    writeln!(out, "Result: {}", result)?;

    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Args> {
    let mut positional = Vec::new();
    let mut disasm = false;
    let mut config = Config::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--disasm" => disasm = true,
            "--code-size" => config = config.with_code_capacity(size_flag(&arg, args.next())?),
            "--stack-size" => config = config.with_stack_capacity(size_flag(&arg, args.next())?),
            "-h" | "--help" => bail!(usage()),
            _ => positional.push(arg),
        }
    }

    let (source, arg) = match positional.as_slice() {
        [source, arg] => (source.clone(), arg),
        _ => bail!(usage()),
    };
    let arg = arg
        .parse::<i32>()
        .with_context(|| format!("argument '{}' is not an integer", arg))?;

    Ok(Args {
        source,
        arg,
        disasm,
        config,
    })
}

fn size_flag(flag: &str, value: Option<String>) -> anyhow::Result<usize> {
    let value = value.ok_or_else(|| anyhow!("{} needs a value", flag))?;
    value
        .parse()
        .with_context(|| format!("{} expects a positive number, got '{}'", flag, value))
}

fn usage() -> String {
    "usage: minivm <source> <integer> [--disasm] [--code-size N] [--stack-size N]".to_string()
}
