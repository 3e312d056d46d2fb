use crate::help::Usage;
use crate::value::Fault;
use colored::Colorize;
use std::fmt::Display;
use thiserror::Error;

#[derive(Debug, PartialEq, Clone, Default)]
pub enum ColorMode {
    On,
    Off,
    #[default]
    Normal,
}

impl ColorMode {
    /// Applies the mode to the global `colored` override.
    pub fn sync(&self) {
        // without the feature every message stays plain
        if cfg!(feature = "color") == false {
            return colored::control::set_override(false);
        }
        match self {
            Self::On => colored::control::set_override(true),
            Self::Off => colored::control::set_override(false),
            Self::Normal => colored::control::unset_override(),
        }
    }
}

pub(crate) mod exit_code {
    pub const BAD: u8 = 101;
    pub const OKAY: u8 = 0;
}

type Token = String;
type ParamName = String;
type Message = String;

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ErrorKind {
    UnmatchedSwitch,
    Ambiguous,
    InsufficientArgs,
    BadType,
    Unsatisfied,
    UnexpectedArg,
    UnexpectedValue,
    DuplicateOptions,
    Declaration,
    Hook,
    Help,
}

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ErrorContext {
    #[error("unmatched switch \"{}\"", .0.yellow())]
    UnmatchedSwitch(Token),
    #[error("\"{}\" matched multiple parameters: {}", .token.yellow(), .params.join(", "))]
    Ambiguous { token: Token, params: Vec<ParamName> },
    #[error("argument \"{}\" expects a value but none was supplied", .0.blue())]
    InsufficientArgs(ParamName),
    #[error(
        "argument \"{}\" failed to process value \"{}\" as {}: {}",
        .param.blue(),
        .value.yellow(),
        .ty,
        .fault
    )]
    FailedCast {
        param: ParamName,
        value: Token,
        ty: &'static str,
        fault: Fault,
    },
    #[error("parameter not satisfied: \"{}\"", .0.blue())]
    Unsatisfied(ParamName),
    #[error("unexpected argument \"{}\"", .token.yellow())]
    UnexpectedArg { token: Token, usage: Vec<Usage> },
    #[error("flag \"{}\" cannot accept a value but was given \"{}\"", .0.blue(), .1.yellow())]
    UnexpectedValue(ParamName, Token),
    #[error("argument \"{}\" can only be supplied once", .0.blue())]
    DuplicateOptions(ParamName),
    #[error("invalid declaration: {0}")]
    Declaration(Message),
    #[error("after-parse hook of \"{}\" failed: {}", .param.blue(), .message)]
    Hook { param: ParamName, message: Message },
    #[error("{0}")]
    Help(String),
}

impl ErrorContext {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnmatchedSwitch(_) => ErrorKind::UnmatchedSwitch,
            Self::Ambiguous { .. } => ErrorKind::Ambiguous,
            Self::InsufficientArgs(_) => ErrorKind::InsufficientArgs,
            Self::FailedCast { .. } => ErrorKind::BadType,
            Self::Unsatisfied(_) => ErrorKind::Unsatisfied,
            Self::UnexpectedArg { .. } => ErrorKind::UnexpectedArg,
            Self::UnexpectedValue(..) => ErrorKind::UnexpectedValue,
            Self::DuplicateOptions(_) => ErrorKind::DuplicateOptions,
            Self::Declaration(_) => ErrorKind::Declaration,
            Self::Hook { .. } => ErrorKind::Hook,
            Self::Help(_) => ErrorKind::Help,
        }
    }
}

/// The single terminal failure of a parse.
#[derive(Debug, PartialEq, Clone)]
pub struct Error {
    context: ErrorContext,
    scope: Vec<String>,
}

impl Error {
    /// Creates a new error.
    pub fn new(context: ErrorContext) -> Self {
        Self {
            context,
            scope: Vec::new(),
        }
    }

    /// The distinguished outcome of the built-in help parameter.
    pub fn help<T: Into<String>>(text: T) -> Self {
        Self::new(ErrorContext::Help(text.into()))
    }

    pub fn declaration<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorContext::Declaration(message.into()))
    }

    // Returns the kind of error.
    pub fn kind(&self) -> ErrorKind {
        self.context.kind()
    }

    /// References the details for the given error.
    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    /// Names of the subcommands the error passed through, outermost first.
    pub fn scope(&self) -> &[String] {
        &self.scope
    }

    pub fn is_help(&self) -> bool {
        self.kind() == ErrorKind::Help
    }

    /// Returns `OKAY` for help and `BAD` otherwise.
    pub fn code(&self) -> u8 {
        match self.kind() {
            ErrorKind::Help => exit_code::OKAY,
            _ => exit_code::BAD,
        }
    }

    /// The parameters that were available when an unexpected argument was met.
    pub fn usage(&self) -> Option<&[Usage]> {
        match &self.context {
            ErrorContext::UnexpectedArg { usage, .. } => Some(usage),
            _ => None,
        }
    }

    /// Records that the error surfaced from inside subcommand `name`.
    pub(crate) fn within(mut self, name: &str) -> Self {
        if self.is_help() == false {
            self.scope.insert(0, name.to_string());
        }
        self
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        if self.scope.is_empty() == false {
            write!(f, "{}: ", self.scope.join(" ").green())?;
        }
        write!(f, "{}", self.context)
    }
}

impl std::error::Error for Error {}
