use crate::error::{Error, ErrorContext};
use crate::help::Usage;
use crate::proc::{self, Context};
use crate::value::{Coercions, Shape, Slot};
use std::fmt::{Debug, Display};
use tracing::trace;

mod symbol {
    pub const FLAG: &str = "--";
    pub const SWITCH: &str = "-";
    pub const POS_BRACKET_L: &str = "<";
    pub const POS_BRACKET_R: &str = ">";
    pub const REPEAT: &str = "...";
    pub const NEGATION: &str = "no";
}

/// The capability a parameter has when matching tokens.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Kind {
    /// A nullary switch, optionally negatable.
    Flag,
    /// A switch that takes a value.
    Option,
    /// A value recognized by its position.
    Positional,
    /// A handler that takes over the rest of the tokens.
    Subcommand,
}

/// How many values a parameter takes across a whole parse.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum Arity {
    #[default]
    One,
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
}

impl Arity {
    /// Reads a declarative arity marker: `""`, `"?"`, `"*"` or `"+"`.
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "" => Some(Self::One),
            "?" => Some(Self::ZeroOrOne),
            "*" => Some(Self::ZeroOrMore),
            "+" => Some(Self::OneOrMore),
            _ => None,
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            Self::One => "",
            Self::ZeroOrOne => "?",
            Self::ZeroOrMore => "*",
            Self::OneOrMore => "+",
        }
    }

    /// Whether the parameter is satisfied before consuming anything.
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::ZeroOrOne | Self::ZeroOrMore)
    }

    /// Whether the parameter stays open after a value is bound.
    pub fn is_repeatable(&self) -> bool {
        matches!(self, Self::ZeroOrMore | Self::OneOrMore)
    }
}

/// A side effect run right after a parameter binds a value.
pub type Hook<'a> = Box<dyn FnMut() -> proc::Result + 'a>;

/// The body of a subcommand.
pub type Handler<'a> = Box<dyn FnMut(&mut Context<'_, 'a>) -> Result<(), Error> + 'a>;

/// One declared unit of expected input.
pub struct Param<'a> {
    kind: Kind,
    name: String,
    longs: Vec<String>,
    shorts: Vec<char>,
    negation: Option<String>,
    arity: Arity,
    value_name: String,
    slot: Option<Slot<'a>>,
    satisfied: bool,
    valid: bool,
    provisional: bool,
    help: String,
    run: Option<Handler<'a>>,
    after_parse: Vec<Hook<'a>>,
}

impl<'a> Param<'a> {
    fn with_kind(kind: Kind, name: &str, slot: Option<Slot<'a>>, arity: Arity) -> Self {
        Self {
            kind,
            name: name.to_string(),
            longs: Vec::new(),
            shorts: Vec::new(),
            negation: None,
            arity,
            value_name: name.to_string(),
            slot,
            satisfied: arity.is_optional(),
            valid: true,
            provisional: false,
            help: String::new(),
            run: None,
            after_parse: Vec::new(),
        }
    }

    /// Creates a nullary `--long` switch that writes `true` into `target`, or
    /// `false` when spelled `--no-long`.
    pub fn flag<S: Into<Slot<'a>>>(long: &str, target: S) -> Self {
        let mut param = Self::with_kind(Kind::Flag, long, Some(target.into()), Arity::ZeroOrOne);
        param.longs.push(long.to_string());
        param.negation = Some(symbol::NEGATION.to_string());
        param
    }

    /// Creates a `--long <value>` switch.
    ///
    /// The option is optional by default; list targets accept it repeatedly.
    pub fn option<S: Into<Slot<'a>>>(long: &str, target: S) -> Self {
        let slot = target.into();
        let arity = match slot.shape() {
            Shape::List => Arity::ZeroOrMore,
            _ => Arity::ZeroOrOne,
        };
        let mut param = Self::with_kind(Kind::Option, long, Some(slot), arity);
        param.longs.push(long.to_string());
        param
    }

    /// Creates a positional parameter.
    ///
    /// Single targets are required, optional targets may be left out, and
    /// list targets require one or more values.
    pub fn positional<S: Into<Slot<'a>>>(name: &str, target: S) -> Self {
        let slot = target.into();
        let arity = match slot.shape() {
            Shape::Single => Arity::One,
            Shape::Optional => Arity::ZeroOrOne,
            Shape::List => Arity::OneOrMore,
        };
        Self::with_kind(Kind::Positional, name, Some(slot), arity)
    }

    /// Creates a subcommand matched by its bare `name` in positional position.
    pub fn subcommand<F>(name: &str, run: F) -> Self
    where
        F: FnMut(&mut Context<'_, 'a>) -> Result<(), Error> + 'a,
    {
        let mut param = Self::with_kind(Kind::Subcommand, name, None, Arity::ZeroOrOne);
        param.run = Some(Box::new(run));
        param
    }

    /// Creates a subcommand triggered by the `--long` switch (like `--help`).
    pub fn action<F>(long: &str, run: F) -> Self
    where
        F: FnMut(&mut Context<'_, 'a>) -> Result<(), Error> + 'a,
    {
        let mut param = Self::subcommand(long, run);
        param.longs.push(long.to_string());
        param
    }

    /// Creates a required `--long <key>` switch whose key selects one of
    /// `choices` to store into `target`.
    pub fn choice<T, K, I>(long: &str, target: &'a mut T, choices: I) -> Self
    where
        T: Clone + 'static,
        K: Into<String>,
        I: IntoIterator<Item = (K, T)>,
    {
        let choices: Vec<(String, T)> = choices.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let keys: Vec<&str> = choices.iter().map(|(k, _)| k.as_str()).collect();
        let help = keys.join("|");
        Self::option(long, Slot::choice(target, choices))
            .arity(Arity::One)
            .help(help)
    }

    /// Adds another `--long` spelling.
    pub fn long(mut self, long: &str) -> Self {
        self.longs.push(long.to_string());
        self
    }

    /// Adds a single-character `-c` spelling.
    pub fn short(mut self, c: char) -> Self {
        self.shorts.push(c);
        self
    }

    pub fn help<T: AsRef<str>>(mut self, text: T) -> Self {
        self.help = text.as_ref().to_string();
        self
    }

    /// Sets the placeholder shown for the parameter's value in usage.
    pub fn value_name(mut self, name: &str) -> Self {
        self.value_name = name.to_string();
        self
    }

    pub fn arity(mut self, arity: Arity) -> Self {
        self.arity = arity;
        // flags and subcommands never need a token to complete a scope
        self.satisfied = match self.kind {
            Kind::Flag | Kind::Subcommand => true,
            Kind::Option | Kind::Positional => arity.is_optional() || self.provisional,
        };
        self
    }

    /// Makes an option mandatory.
    pub fn required(self) -> Self {
        let arity = match self.arity.is_repeatable() {
            true => Arity::OneOrMore,
            false => Arity::One,
        };
        self.arity(arity)
    }

    /// Sets the prefix accepted in front of a flag to clear it (`no` by default).
    pub fn negation(mut self, prefix: &str) -> Self {
        self.negation = Some(prefix.to_string());
        self
    }

    pub fn without_negation(mut self) -> Self {
        self.negation = None;
        self
    }

    /// Queues `hook` to run every time this parameter binds a value.
    pub fn after_parse<F>(mut self, hook: F) -> Self
    where
        F: FnMut() -> proc::Result + 'a,
    {
        self.after_parse.push(Box::new(hook));
        self
    }

    /// Binds `text` immediately as the parameter's default.
    ///
    /// Errors if the text cannot be coerced; this is a declaration defect.
    pub fn default_value(self, text: &str) -> Result<Self, Error> {
        self.default_with(text, &Coercions::builtin())
    }

    /// Binds `text` as the default using the conversions in `coercions`.
    ///
    /// The default satisfies the parameter but keeps it open; the first real
    /// value replaces it (lists are emptied first).
    pub fn default_with(mut self, text: &str, coercions: &Coercions) -> Result<Self, Error> {
        let display = self.to_string();
        let slot = self.slot.as_mut().ok_or_else(|| {
            Error::declaration(format!("{} has no target to hold a default", display))
        })?;
        slot.assign(text, coercions).map_err(|fault| {
            Error::declaration(format!("setting default {:?} for {}: {}", text, display, fault))
        })?;
        self.provisional = true;
        self.satisfied = true;
        Ok(self)
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn longs(&self) -> &[String] {
        &self.longs
    }

    pub fn shorts(&self) -> &[char] {
        &self.shorts
    }

    pub fn get_arity(&self) -> Arity {
        self.arity
    }

    pub fn get_help(&self) -> &str {
        &self.help
    }

    pub fn is_satisfied(&self) -> bool {
        self.satisfied
    }

    /// Whether the parameter may still match another token.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Whether the parameter is matched by position rather than by switch.
    pub fn is_positional(&self) -> bool {
        self.longs.is_empty() && self.shorts.is_empty()
    }

    /// Checks `long` against this parameter's spellings, returning whether the
    /// negated form matched.
    pub(crate) fn match_long(&self, long: &str) -> Option<bool> {
        let negated = self
            .negation
            .as_deref()
            .and_then(|prefix| long.strip_prefix(prefix))
            .and_then(|rest| rest.strip_prefix(symbol::SWITCH));
        self.longs.iter().find_map(|l| {
            if l == long {
                Some(false)
            } else if negated == Some(l.as_str()) {
                Some(true)
            } else {
                None
            }
        })
    }

    /// Writes a value into the target according to the parameter's kind.
    ///
    /// Flags take no value and store `!negated`; options and positionals
    /// coerce `value` and update their satisfied/valid state.
    pub(crate) fn bind(
        &mut self,
        value: Option<&str>,
        negated: bool,
        coercions: &Coercions,
    ) -> Result<(), Error> {
        let display = self.to_string();
        match self.kind {
            Kind::Subcommand => Err(Error::declaration(format!(
                "subcommand {} cannot bind a value",
                display
            ))),
            Kind::Flag => {
                if let Some(text) = value {
                    return Err(Error::new(ErrorContext::UnexpectedValue(
                        display,
                        text.to_string(),
                    )));
                }
                let text = if negated { "false" } else { "true" };
                trace!(param = %self, text, "binding flag");
                self.assign(text, coercions)
            }
            Kind::Option | Kind::Positional => {
                if self.valid == false {
                    return Err(Error::new(ErrorContext::DuplicateOptions(display)));
                }
                let text =
                    value.ok_or_else(|| Error::new(ErrorContext::InsufficientArgs(display)))?;
                if self.provisional == true {
                    if let Some(slot) = self.slot.as_mut() {
                        slot.clear();
                    }
                    self.provisional = false;
                }
                trace!(param = %self, text, "binding value");
                self.assign(text, coercions)?;
                self.satisfied = true;
                if self.arity.is_repeatable() == false {
                    self.valid = false;
                }
                Ok(())
            }
        }
    }

    fn assign(&mut self, text: &str, coercions: &Coercions) -> Result<(), Error> {
        let display = self.to_string();
        let slot = self
            .slot
            .as_mut()
            .ok_or_else(|| Error::declaration(format!("{} has no target", display)))?;
        let ty = slot.type_name();
        slot.assign(text, coercions).map_err(|fault| {
            Error::new(ErrorContext::FailedCast {
                param: display,
                value: text.to_string(),
                ty,
                fault,
            })
        })
    }

    /// Runs every after-parse hook in registration order.
    pub(crate) fn run_hooks(&mut self) -> Result<(), Error> {
        let display = self.to_string();
        for hook in self.after_parse.iter_mut() {
            hook().map_err(|e| {
                Error::new(ErrorContext::Hook {
                    param: display.clone(),
                    message: e.to_string(),
                })
            })?;
        }
        Ok(())
    }

    pub(crate) fn take_handler(&mut self) -> Option<Handler<'a>> {
        self.run.take()
    }

    pub(crate) fn restore_handler(&mut self, run: Handler<'a>) {
        self.run = Some(run);
    }

    fn placeholder(&self) -> String {
        let suffix = match self.arity.is_repeatable() {
            true => symbol::REPEAT,
            false => "",
        };
        format!(
            "{}{}{}{}",
            symbol::POS_BRACKET_L,
            self.value_name,
            symbol::POS_BRACKET_R,
            suffix
        )
    }

    /// Describes how the parameter is spelled for a usage listing.
    pub fn usage(&self) -> Usage {
        let mut switches: Vec<String> = self
            .longs
            .iter()
            .map(|l| format!("{}{}", symbol::FLAG, l))
            .chain(self.shorts.iter().map(|c| format!("{}{}", symbol::SWITCH, c)))
            .collect();
        let mut arguments = Vec::new();
        match self.kind {
            Kind::Subcommand if self.is_positional() => switches.push(self.name.clone()),
            Kind::Option | Kind::Positional => arguments.push(self.placeholder()),
            _ => (),
        }
        Usage {
            switches,
            arguments,
            help: self.help.clone(),
        }
    }
}

impl Display for Param<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self.kind {
            Kind::Positional => write!(f, "{}", self.placeholder()),
            Kind::Subcommand if self.is_positional() => write!(f, "{}", self.name),
            Kind::Option => write!(f, "{}{} {}", symbol::FLAG, self.name, self.placeholder()),
            Kind::Flag | Kind::Subcommand => write!(f, "{}{}", symbol::FLAG, self.name),
        }
    }
}

impl Debug for Param<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}'", self)
    }
}
