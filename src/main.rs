use ccbf::bytecode::disassemble;
use ccbf::{Inst, Options, Vm, compile_with};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ccbf")]
#[command(about = "A bytecode compiler and virtual machine for brainfuck")]
struct Args {
    /// Path to the Brainfuck program file to execute; starts a prompt if omitted
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Flush stdout after each . instruction
    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    flush: bool,

    /// Skip merging runs of > < + -
    #[arg(long)]
    no_collapse: bool,

    /// Skip rewriting [-] loops
    #[arg(long)]
    no_reduce: bool,

    /// Print the compiled bytecode instead of running it
    #[arg(short, long)]
    dump: bool,

    /// Log compiler and VM diagnostics to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn options(&self) -> Options {
        Options {
            collapse: !self.no_collapse,
            reduce_loops: !self.no_reduce,
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn execute(prog: &[Inst], args: &Args) -> io::Result<()> {
    if args.dump {
        return io::stdout().lock().write_all(disassemble(prog).as_bytes());
    }
    let mut vm = Vm::new(io::stdin().lock(), io::stdout().lock());
    if args.flush {
        vm.run_flushing(prog)
    } else {
        vm.run(prog)
    }
}

fn run_file(path: &Path, args: &Args) -> ExitCode {
    let code = match std::fs::read_to_string(path) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let prog = match compile_with(&code, args.options()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    debug!(file = %path.display(), instructions = prog.len(), "compiled");
    match execute(&prog, args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn repl(args: &Args) -> io::Result<()> {
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        {
            let mut out = io::stdout().lock();
            write!(out, "ccbf> ")?;
            out.flush()?;
        }
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 || line.trim().is_empty() {
            return Ok(());
        }
        match compile_with(&line, args.options()) {
            Ok(prog) => execute(&prog, args)?,
            Err(e) => eprintln!("{}", e),
        }
        println!();
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    match &args.file {
        Some(path) => run_file(path, &args),
        None => match repl(&args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("{}", e);
                ExitCode::FAILURE
            }
        },
    }
}
