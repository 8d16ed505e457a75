//! Parsing of the commands typed at the prompt.

use crate::arch::x86_64::Register;
use std::str::FromStr;
use thiserror::Error;

pub const REGISTER_USAGE: &str = "register usage:
  - dump
  - read REGISTER
  - write REGISTER VALUE (value format 0x...)";

pub const MEMORY_USAGE: &str = "memory usage:
  - read ADDRESS (address format 0x...)
  - write ADDRESS VALUE (address format 0x..., value format 0x...)";

pub const HELP: &str = "commands:
  continue | c                 resume until the next breakpoint or exit
  break | b ADDRESS            set a breakpoint
  delete | d ADDRESS           remove a breakpoint
  breakpoints                  list breakpoints
  register dump                print every register
  register read REGISTER       print one register
  register write REGISTER VALUE
  memory read ADDRESS          print the word at an address
  memory write ADDRESS VALUE
  help
  quit | q";

/// A command entered by the operator, with its arguments resolved.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    Continue,
    Break(u64),
    Delete(u64),
    Breakpoints,
    RegisterDump,
    RegisterRead(Register),
    RegisterWrite(Register, u64),
    MemoryRead(u64),
    MemoryWrite(u64, u64),
    Help,
    Quit,
}

/// Errors for malformed command lines.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("{0}")]
    Usage(&'static str),

    #[error("'{0}' takes no arguments")]
    UnexpectedArguments(String),

    #[error("invalid number '{0}', expected hexadecimal")]
    InvalidNumber(String),

    #[error("unknown register '{0}'")]
    UnknownRegister(String),
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();

        let (command, args) = match words.split_first() {
            Some((command, args)) => (*command, args),
            None => return Err(ParseError::Empty),
        };

        let command = match (command, args) {
            ("continue" | "c", []) => Self::Continue,
            ("break" | "b", [address]) => Self::Break(parse_number(address)?),
            ("break" | "b", _) => return Err(ParseError::Usage("usage: break ADDRESS")),
            ("delete" | "d", [address]) => Self::Delete(parse_number(address)?),
            ("delete" | "d", _) => return Err(ParseError::Usage("usage: delete ADDRESS")),
            ("breakpoints", []) => Self::Breakpoints,
            ("register", ["dump"]) => Self::RegisterDump,
            ("register", ["read", name]) => Self::RegisterRead(parse_register(name)?),
            ("register", ["write", name, value]) => {
                Self::RegisterWrite(parse_register(name)?, parse_number(value)?)
            }
            ("register", _) => return Err(ParseError::Usage(REGISTER_USAGE)),
            ("memory", ["read", address]) => Self::MemoryRead(parse_number(address)?),
            ("memory", ["write", address, value]) => {
                Self::MemoryWrite(parse_number(address)?, parse_number(value)?)
            }
            ("memory", _) => return Err(ParseError::Usage(MEMORY_USAGE)),
            ("help" | "h", []) => Self::Help,
            ("quit" | "q" | "exit", []) => Self::Quit,
            (command @ ("continue" | "c" | "breakpoints" | "help" | "h" | "quit" | "q" | "exit"), _) => {
                return Err(ParseError::UnexpectedArguments(command.to_string()))
            }
            (command, _) => return Err(ParseError::UnknownCommand(command.to_string())),
        };

        Ok(command)
    }
}

/// Parses a hexadecimal number with an optional `0x` prefix.
pub fn parse_number(text: &str) -> Result<u64, ParseError> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);

    u64::from_str_radix(digits, 16).map_err(|_| ParseError::InvalidNumber(text.to_string()))
}

fn parse_register(name: &str) -> Result<Register, ParseError> {
    Register::from_name(name).map_err(|_| ParseError::UnknownRegister(name.to_string()))
}
