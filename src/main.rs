use std::error::Error as StdError;
use std::path::PathBuf;
use std::process::{self, Child, ExitCode};

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use trace_dbg::command::{Command, HELP};
use trace_dbg::logging::init_logging;
use trace_dbg::{linux, Debugger, Error, Event, Tracee};

/// Run a program under a minimal breakpoint debugger.
#[derive(Parser, Debug)]
#[command(name = "trace-dbg")]
#[command(version)]
struct Cli {
    /// Path to the executable to debug
    program: PathBuf,
    /// Arguments to pass to the program
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn StdError>> {
    let mut command = process::Command::new(&cli.program);
    command.args(&cli.args);

    let (child, tracee) = linux::spawn(command)?;
    let mut debugger = Debugger::new(cli.program.display().to_string(), tracee);

    println!("Started '{}' as process {}", debugger.program(), debugger.pid());

    let result = repl(&mut debugger);
    reap(child, &debugger);

    result
}

fn repl(debugger: &mut Debugger<Tracee>) -> Result<(), Box<dyn StdError>> {
    let mut editor = DefaultEditor::new()?;

    while !debugger.has_exited() {
        let line = match editor.readline("dbg> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        if line.trim().is_empty() {
            continue;
        }

        editor.add_history_entry(line.as_str())?;

        let command = match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(command) => command,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        if let Err(e) = execute(debugger, command) {
            if e.is_fatal() {
                return Err(e.into());
            }

            eprintln!("Error: {e}");
        }
    }

    Ok(())
}

fn execute(debugger: &mut Debugger<Tracee>, command: Command) -> Result<(), Error> {
    match command {
        Command::Continue => match debugger.continue_execution()? {
            Event::Stopped(signal) => {
                println!("Stopped with {signal} at {:#x}", debugger.get_program_counter()?);
            }
            Event::Exited(status) => println!("Process exited with status {status}"),
            Event::Killed(signal) => println!("Process killed by {signal}"),
        },
        Command::Break(address) => {
            debugger.set_breakpoint_at_address(address)?;
            println!("Set breakpoint at address {address:#x}");
        }
        Command::Delete(address) => {
            debugger.remove_breakpoint(address)?;
            println!("Removed breakpoint at address {address:#x}");
        }
        Command::Breakpoints => {
            for breakpoint in debugger.breakpoints() {
                let state = if breakpoint.is_enabled() { "enabled" } else { "disabled" };
                println!("{:#018x} {state}", breakpoint.address());
            }
        }
        Command::RegisterDump => {
            for (register, value) in debugger.dump_registers()? {
                println!("{:<8} {value:#018x}", register.name());
            }
        }
        Command::RegisterRead(register) => {
            println!("{register} {:#018x}", debugger.read_register(register)?);
        }
        Command::RegisterWrite(register, value) => debugger.write_register(register, value)?,
        Command::MemoryRead(address) => {
            println!("{:#018x}", debugger.read_memory(address)?);
        }
        Command::MemoryWrite(address, value) => debugger.write_memory(address, value)?,
        Command::Help => println!("{HELP}"),
        Command::Quit => (),
    }

    Ok(())
}

/// Kills the program if the session ended while it was still running, then collects it. An
/// exited program has already been reaped by the debugger's wait.
fn reap(mut child: Child, debugger: &Debugger<Tracee>) {
    if debugger.has_exited() {
        return;
    }

    if let Err(e) = child.kill() {
        tracing::warn!(pid = %debugger.pid(), error = %e, "failed to kill tracee");
    }

    if let Err(e) = child.wait() {
        tracing::warn!(pid = %debugger.pid(), error = %e, "failed to reap tracee");
    }
}
