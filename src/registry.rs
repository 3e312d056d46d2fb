//! The set of parameters active in one parsing scope and the rules that
//! decide which of them a token belongs to.

use crate::arg::{Kind, Param};
use crate::error::{Error, ErrorContext};
use crate::help::Usage;

mod symbol {
    pub const SEPARATOR: &str = "--";
    pub const FLAG: &str = "--";
    pub const SWITCH: &str = "-";
    pub const ATTACH: char = '=';
}

/// How a single token was classified.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Match<'t> {
    /// The literal `--`; everything after it is positional.
    Separator,
    /// A `--long` or `--no-long` spelling, with any `=value` suffix.
    Long {
        index: usize,
        negated: bool,
        attached: Option<&'t str>,
    },
    /// A `-abc` cluster of short switches (without the leading hyphen).
    Shorts(&'t str),
    /// The first open positional.
    Positional(usize),
    /// A subcommand named by the token.
    Subcommand(usize),
}

#[derive(Debug, Default)]
pub struct Registry<'a> {
    params: Vec<Param<'a>>,
}

impl<'a> Registry<'a> {
    pub fn new() -> Self {
        Self { params: Vec::new() }
    }

    pub fn push(&mut self, param: Param<'a>) {
        self.params.push(param);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param<'a>> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub(crate) fn get(&self, index: usize) -> &Param<'a> {
        &self.params[index]
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> &mut Param<'a> {
        &mut self.params[index]
    }

    /// Decides what `token` is, in strict priority order: separator, long
    /// switch, short-switch cluster, open positional, subcommand name.
    pub(crate) fn classify<'t>(
        &self,
        token: &'t str,
        positional_only: bool,
        short_switches: bool,
    ) -> Result<Match<'t>, Error> {
        if positional_only == false {
            if token == symbol::SEPARATOR {
                return Ok(Match::Separator);
            }
            if let Some(body) = token.strip_prefix(symbol::FLAG) {
                let (name, attached) = match body.split_once(symbol::ATTACH) {
                    Some((name, value)) => (name, Some(value)),
                    None => (body, None),
                };
                let (index, negated) = self.find_long(name, token)?;
                return Ok(Match::Long {
                    index,
                    negated,
                    attached,
                });
            }
            if let Some(body) = token.strip_prefix(symbol::SWITCH) {
                // a lone hyphen conventionally names stdin/stdout
                if body.is_empty() == false {
                    return match short_switches {
                        true => Ok(Match::Shorts(body)),
                        false => Err(self.unexpected(token)),
                    };
                }
            }
        }
        if let Some(index) = self.find_positional() {
            return Ok(Match::Positional(index));
        }
        if let Some(index) = self.find_subcommand(token)? {
            return Ok(Match::Subcommand(index));
        }
        Err(self.unexpected(token))
    }

    /// Finds the one switch spelled `--name` (or its negation).
    fn find_long(&self, name: &str, token: &str) -> Result<(usize, bool), Error> {
        let found: Vec<(usize, bool)> = self
            .params
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.match_long(name).map(|negated| (i, negated)))
            .collect();
        self.only_one(found, token)?
            .ok_or_else(|| Error::new(ErrorContext::UnmatchedSwitch(token.to_string())))
    }

    /// Finds the one switch spelled `-c`.
    pub(crate) fn find_short(&self, c: char) -> Result<usize, Error> {
        let token = format!("{}{}", symbol::SWITCH, c);
        let found: Vec<(usize, ())> = self
            .params
            .iter()
            .enumerate()
            .filter(|(_, p)| p.shorts().contains(&c))
            .map(|(i, _)| (i, ()))
            .collect();
        self.only_one(found, &token)?
            .map(|(i, _)| i)
            .ok_or_else(|| Error::new(ErrorContext::UnmatchedSwitch(token)))
    }

    /// The earliest declared positional still accepting values.
    fn find_positional(&self) -> Option<usize> {
        self.params
            .iter()
            .position(|p| {
                p.kind() == Kind::Positional && p.is_positional() == true && p.is_valid() == true
            })
    }

    fn find_subcommand(&self, token: &str) -> Result<Option<usize>, Error> {
        let found: Vec<(usize, ())> = self
            .params
            .iter()
            .enumerate()
            .filter(|(_, p)| {
                p.kind() == Kind::Subcommand && p.is_positional() == true && p.name() == token
            })
            .map(|(i, _)| (i, ()))
            .collect();
        Ok(self.only_one(found, token)?.map(|(i, _)| i))
    }

    /// Collapses the candidates for `token` into at most one, treating
    /// several as a declaration defect.
    fn only_one<T: Copy>(
        &self,
        found: Vec<(usize, T)>,
        token: &str,
    ) -> Result<Option<(usize, T)>, Error> {
        match found.as_slice() {
            [] => Ok(None),
            [one] => Ok(Some(*one)),
            many => Err(Error::new(ErrorContext::Ambiguous {
                token: token.to_string(),
                params: many
                    .iter()
                    .map(|(i, _)| self.params[*i].to_string())
                    .collect(),
            })),
        }
    }

    fn unexpected(&self, token: &str) -> Error {
        Error::new(ErrorContext::UnexpectedArg {
            token: token.to_string(),
            usage: self.usage(),
        })
    }

    /// Whether any subcommand can be selected by name in this scope.
    pub fn has_subcommands(&self) -> bool {
        self.params
            .iter()
            .any(|p| p.kind() == Kind::Subcommand && p.is_positional() == true)
    }

    /// Usage lines for every parameter that can still match.
    pub fn usage(&self) -> Vec<Usage> {
        self.params
            .iter()
            .filter(|p| p.is_valid() == true)
            .map(|p| p.usage())
            .collect()
    }

    /// The first parameter that has not met its minimum arity.
    pub fn unsatisfied(&self) -> Option<&Param<'a>> {
        self.params.iter().find(|p| p.is_satisfied() == false)
    }
}
