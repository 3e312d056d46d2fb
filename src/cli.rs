use crate::arg::{Kind, Param};
use crate::error::{exit_code, ColorMode, Error, ErrorContext};
use crate::help::{self, Usage};
use crate::proc::{self, Action, Context};
use crate::registry::{Match, Registry};
use crate::value::Coercions;
use colored::Colorize;
use std::process::ExitCode;
use std::rc::Rc;
use tracing::{debug, trace};

mod symbol {
    pub const ATTACH: char = '=';
}

/// The ordered tokens of one invocation plus how far parsing has read.
///
/// A single cursor is lent by `&mut` from each scope to the subcommand it
/// dispatches, so tokens consumed by a nested scope are gone for the outer
/// one as well.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Cursor {
    tokens: Vec<String>,
    position: usize,
}

impl Cursor {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: args.into_iter().map(|s| s.into()).collect(),
            position: 0,
        }
    }

    /// Reads the process's arguments, skipping the program name.
    pub fn from_env() -> Self {
        Self::new(std::env::args().skip(1))
    }

    pub fn peek(&self) -> Option<&str> {
        self.tokens.get(self.position).map(|s| s.as_str())
    }

    /// Consumes and returns the next token.
    pub fn advance(&mut self) -> Option<String> {
        let token = self.tokens.get_mut(self.position).map(std::mem::take)?;
        self.position += 1;
        Some(token)
    }

    pub fn remaining(&self) -> &[String] {
        &self.tokens[self.position..]
    }

    pub fn is_empty(&self) -> bool {
        self.position >= self.tokens.len()
    }

    /// The number of tokens consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }
}

/// Configuration shared by a parser and every scope nested under it.
#[derive(Debug, Clone)]
pub struct Settings {
    short_switches: bool,
    color: ColorMode,
    coercions: Rc<Coercions>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            short_switches: true,
            color: ColorMode::default(),
            coercions: Rc::new(Coercions::builtin()),
        }
    }
}

/// One parsing scope: its parameters, its mode, and the actions its
/// subcommands queued.
pub struct Parser<'a> {
    registry: Registry<'a>,
    settings: Settings,
    positional_only: bool,
    ran_subcommand: bool,
    deferred: Vec<Action>,
}

impl<'a> Parser<'a> {
    /// Creates a parser holding only the built-in help parameter.
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub(crate) fn with_settings(settings: Settings) -> Self {
        let mut registry = Registry::new();
        registry.push(help::param());
        Self {
            registry,
            settings,
            positional_only: false,
            ran_subcommand: false,
            deferred: Vec::new(),
        }
    }

    /// Enables or disables `-c` style switches for this scope and all scopes
    /// nested under it.
    pub fn short_switches(mut self, enabled: bool) -> Self {
        self.settings.short_switches = enabled;
        self
    }

    /// Replaces the conversions used to bind values.
    pub fn coercions(mut self, coercions: Coercions) -> Self {
        self.settings.coercions = Rc::new(coercions);
        self
    }

    /// Sets the color used when a driver reports errors.
    pub fn color(mut self, mode: ColorMode) -> Self {
        self.settings.color = mode;
        self
    }

    pub fn add(mut self, param: Param<'a>) -> Self {
        self.push(param);
        self
    }

    pub fn add_params<I>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = Param<'a>>,
    {
        params.into_iter().for_each(|p| self.push(p));
        self
    }

    pub fn push(&mut self, param: Param<'a>) {
        self.registry.push(param);
    }

    /// Matches tokens until `cursor` is exhausted, then checks every
    /// parameter has met its minimum arity.
    pub fn parse(&mut self, cursor: &mut Cursor) -> Result<(), Error> {
        while let Some(token) = cursor.advance() {
            self.parse_one(&token, cursor)?;
        }
        match self.registry.unsatisfied() {
            Some(param) => Err(Error::new(ErrorContext::Unsatisfied(param.to_string()))),
            None => Ok(()),
        }
    }

    fn parse_one(&mut self, token: &str, cursor: &mut Cursor) -> Result<(), Error> {
        let matched = self.registry.classify(
            token,
            self.positional_only,
            self.settings.short_switches,
        )?;
        debug!(token, ?matched, "classified token");
        match matched {
            Match::Separator => {
                self.positional_only = true;
                Ok(())
            }
            Match::Long {
                index,
                negated,
                attached,
            } => match self.registry.get(index).kind() {
                Kind::Flag => self.bind(index, attached, negated),
                Kind::Subcommand => match attached {
                    Some(value) => Err(self.unexpected_value(index, value)),
                    None => self.run_handler(index, cursor),
                },
                Kind::Option | Kind::Positional => match attached {
                    Some(value) => self.bind(index, Some(value), false),
                    None => {
                        let value = cursor.advance();
                        self.bind(index, value.as_deref(), false)
                    }
                },
            },
            Match::Shorts(cluster) => self.parse_shorts(cluster, cursor),
            Match::Positional(index) => self.bind(index, Some(token), false),
            Match::Subcommand(index) => self.run_handler(index, cursor),
        }
    }

    /// Walks a `-abc` cluster left to right.
    ///
    /// Flags bind in place; the first option takes the rest of the cluster
    /// (or the next token) and ends it, as does a subcommand.
    fn parse_shorts(&mut self, cluster: &str, cursor: &mut Cursor) -> Result<(), Error> {
        for (i, c) in cluster.char_indices() {
            let index = self.registry.find_short(c)?;
            let rest = &cluster[i + c.len_utf8()..];
            let attached = match rest.strip_prefix(symbol::ATTACH) {
                Some(value) => Some(value),
                None if rest.is_empty() => None,
                None => Some(rest),
            };
            trace!(switch = %c, rest, "short switch");
            match self.registry.get(index).kind() {
                Kind::Flag => match rest.starts_with(symbol::ATTACH) {
                    true => return self.bind(index, attached, false),
                    false => self.bind(index, None, false)?,
                },
                Kind::Option | Kind::Positional => {
                    return match attached {
                        Some(value) => self.bind(index, Some(value), false),
                        None => {
                            let value = cursor.advance();
                            self.bind(index, value.as_deref(), false)
                        }
                    }
                }
                Kind::Subcommand => {
                    return match attached {
                        Some(value) => Err(self.unexpected_value(index, value)),
                        None => self.run_handler(index, cursor),
                    }
                }
            }
        }
        Ok(())
    }

    /// Binds `value` into the parameter at `index`, then runs its hooks.
    fn bind(&mut self, index: usize, value: Option<&str>, negated: bool) -> Result<(), Error> {
        let param = self.registry.get_mut(index);
        param.bind(value, negated, &self.settings.coercions)?;
        param.run_hooks()
    }

    /// Hands the cursor to the subcommand at `index` for the duration of its
    /// handler.
    fn run_handler(&mut self, index: usize, cursor: &mut Cursor) -> Result<(), Error> {
        let param = self.registry.get_mut(index);
        let name = param.name().to_string();
        let mut run = param.take_handler().ok_or_else(|| {
            Error::declaration(format!("subcommand {} re-entered its own scope", name))
        })?;
        debug!(subcommand = %name, "running subcommand");
        let result = {
            let mut ctx = Context::new(cursor, &self.registry, &self.settings, &mut self.deferred);
            run(&mut ctx)
        };
        self.registry.get_mut(index).restore_handler(run);
        result.map_err(|e| e.within(&name))?;
        self.ran_subcommand = true;
        debug!(subcommand = %name, "finished subcommand");
        Ok(())
    }

    fn unexpected_value(&self, index: usize, value: &str) -> Error {
        Error::new(ErrorContext::UnexpectedValue(
            self.registry.get(index).to_string(),
            value.to_string(),
        ))
    }

    /// Whether a subcommand handler completed in this scope.
    pub fn ran_subcommand(&self) -> bool {
        self.ran_subcommand
    }

    pub fn registry(&self) -> &Registry<'a> {
        &self.registry
    }

    /// Usage lines for every parameter that can still match.
    pub fn usage(&self) -> Vec<Usage> {
        self.registry.usage()
    }

    /// Queues an action directly on this scope.
    pub fn defer<F>(&mut self, action: F)
    where
        F: FnOnce() -> proc::Result + 'static,
    {
        self.deferred.push(Box::new(action));
    }

    pub(crate) fn take_deferred(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.deferred)
    }

    /// Parses `cursor` to completion and releases every borrowed target.
    pub fn finish(mut self, cursor: &mut Cursor) -> ParseResult {
        let outcome = self.parse(cursor);
        let deferred = match outcome.is_ok() {
            true => self.take_deferred(),
            false => Vec::new(),
        };
        ParseResult {
            outcome,
            ran_subcommand: self.ran_subcommand,
            expects_subcommand: self.registry.has_subcommands(),
            deferred,
            usage: self.usage(),
            color: self.settings.color.clone(),
        }
    }

    /// Parses `args` as a complete invocation.
    pub fn parse_args<I, S>(self, args: I) -> ParseResult
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.finish(&mut Cursor::new(args))
    }
}

impl Default for Parser<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// The owned outcome of a complete parse.
pub struct ParseResult {
    outcome: Result<(), Error>,
    ran_subcommand: bool,
    expects_subcommand: bool,
    deferred: Vec<Action>,
    usage: Vec<Usage>,
    color: ColorMode,
}

impl ParseResult {
    pub fn error(&self) -> Option<&Error> {
        self.outcome.as_ref().err()
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn is_help(&self) -> bool {
        self.error().is_some_and(|e| e.is_help())
    }

    pub fn ran_subcommand(&self) -> bool {
        self.ran_subcommand
    }

    /// The top-level usage listing.
    pub fn usage(&self) -> &[Usage] {
        &self.usage
    }

    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// Runs the queued actions in order, stopping at the first failure.
    ///
    /// A failed parse returns its error without running anything.
    pub fn run(self) -> proc::Result {
        self.outcome?;
        for (i, action) in self.deferred.into_iter().enumerate() {
            trace!(action = i, "running deferred action");
            action()?;
        }
        Ok(())
    }

    /// Finishes the invocation as a `main` would.
    ///
    /// Help prints to stdout and succeeds. A parse error, or a scope with
    /// subcommands where none was selected, prints usage to stderr and
    /// fails. Otherwise the deferred actions run and the first failure is
    /// reported.
    pub fn go(self) -> ExitCode {
        self.color.sync();
        match &self.outcome {
            Err(e) if e.is_help() == true => {
                print!("{}", e);
                return ExitCode::from(e.code());
            }
            Err(e) => {
                eprintln!("{}: {}", "error".red().bold(), e);
                eprint!("{}", help::render(e.usage().unwrap_or(self.usage.as_slice())));
                return ExitCode::from(e.code());
            }
            Ok(()) if self.expects_subcommand == true && self.ran_subcommand == false => {
                eprint!("{}", help::render(&self.usage));
                return ExitCode::from(exit_code::BAD);
            }
            Ok(()) => (),
        }
        match self.run() {
            Ok(()) => ExitCode::from(exit_code::OKAY),
            Err(e) => {
                eprintln!("{}: {}", "error".red().bold(), e);
                ExitCode::from(exit_code::BAD)
            }
        }
    }
}

impl std::fmt::Debug for ParseResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseResult")
            .field("outcome", &self.outcome)
            .field("ran_subcommand", &self.ran_subcommand)
            .field("deferred", &self.deferred.len())
            .finish()
    }
}
