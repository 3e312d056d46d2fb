//! Declarative binding of a whole record to a list of parameters.
//!
//! Each field of the record is described once with a [Field] (its role,
//! arity marker, default and help), and [Record::into_params] turns the
//! description into ready-to-parse [Param]s:
//!
//! - boolean fields become negatable flags,
//! - switch fields become `--kebab-case-name` options,
//! - positional fields keep their declaration order.
//!
//! ```
//! use argscope::{Field, Fields, Parser, Record};
//!
//! #[derive(Default)]
//! struct Install {
//!     dry_run: bool,
//!     sources: Vec<String>,
//!     dest: String,
//! }
//!
//! impl Fields for Install {
//!     fn fields<'a>(&'a mut self, record: Record<'a>) -> Record<'a> {
//!         record
//!             .field(Field::switch("dry_run", &mut self.dry_run))
//!             .field(Field::positional("dest", &mut self.dest))
//!             .field(Field::positional("sources", &mut self.sources).arity("+"))
//!     }
//! }
//!
//! let mut install = Install::default();
//! let params = Record::of(&mut install).into_params().unwrap();
//! let result = Parser::new()
//!     .add_params(params)
//!     .parse_args(["--dry-run", "out", "a", "b"]);
//! assert!(result.is_ok());
//! assert_eq!(install.dry_run, true);
//! assert_eq!(install.sources, vec!["a", "b"]);
//! ```

use crate::arg::{Arity, Param};
use crate::error::Error;
use crate::value::{Coercions, Slot};
use heck::ToKebabCase;
use tracing::trace;

/// How a field is recognized on the command-line.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Role {
    Positional,
    Switch,
}

/// The declaration of one record field.
#[derive(Debug)]
pub struct Field<'a> {
    name: String,
    role: Role,
    slot: Slot<'a>,
    arity: String,
    default: Option<String>,
    help: String,
    short: Option<char>,
    skip: bool,
}

impl<'a> Field<'a> {
    fn new<S: Into<Slot<'a>>>(name: &str, role: Role, target: S) -> Self {
        Self {
            name: name.to_string(),
            role,
            slot: target.into(),
            arity: String::new(),
            default: None,
            help: String::new(),
            short: None,
            skip: false,
        }
    }

    pub fn positional<S: Into<Slot<'a>>>(name: &str, target: S) -> Self {
        Self::new(name, Role::Positional, target)
    }

    pub fn switch<S: Into<Slot<'a>>>(name: &str, target: S) -> Self {
        Self::new(name, Role::Switch, target)
    }

    /// Sets the arity marker: `""` (exactly one), `"?"`, `"*"` or `"+"`.
    pub fn arity(mut self, marker: &str) -> Self {
        self.arity = marker.to_string();
        self
    }

    pub fn default_value(mut self, text: &str) -> Self {
        self.default = Some(text.to_string());
        self
    }

    pub fn help(mut self, text: &str) -> Self {
        self.help = text.to_string();
        self
    }

    pub fn short(mut self, c: char) -> Self {
        self.short = Some(c);
        self
    }

    /// Leaves the field out of the generated parameters.
    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    fn into_param(self, record: &str, coercions: &Coercions) -> Result<Param<'a>, Error> {
        let qualified = format!("{}.{}", record, self.name);
        let arity = Arity::from_marker(&self.arity).ok_or_else(|| {
            Error::declaration(format!("unhandled arity {:?} on {}", self.arity, qualified))
        })?;
        let long = self.name.to_kebab_case();
        let mut param = match (self.slot.nullary(), self.role) {
            (true, _) => Param::flag(&long, self.slot),
            (false, Role::Switch) => Param::option(&long, self.slot)
                .value_name(&self.name)
                .arity(arity),
            (false, Role::Positional) => Param::positional(&qualified, self.slot).arity(arity),
        };
        if let Some(c) = self.short {
            param = param.short(c);
        }
        param = param.help(&self.help);
        if let Some(text) = &self.default {
            param = param.default_with(text, coercions)?;
        }
        trace!(field = %qualified, param = %param, "declared field");
        Ok(param)
    }
}

/// A type that can describe its own fields to a [Record].
pub trait Fields {
    fn fields<'a>(&'a mut self, record: Record<'a>) -> Record<'a>;
}

/// A named collection of field declarations.
#[derive(Debug)]
pub struct Record<'a> {
    name: String,
    fields: Vec<Field<'a>>,
    coercions: Coercions,
}

impl<'a> Record<'a> {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
            coercions: Coercions::builtin(),
        }
    }

    /// Collects the fields `value` declares, naming the record after its type.
    pub fn of<T: Fields>(value: &'a mut T) -> Self {
        let path = std::any::type_name::<T>();
        // `a::Cmd<b::Opts>` is named `Cmd`
        let base = path.split('<').next().unwrap_or(path);
        let name = base.rsplit("::").next().unwrap_or(base);
        value.fields(Self::new(name))
    }

    pub fn field(mut self, field: Field<'a>) -> Self {
        self.fields.push(field);
        self
    }

    /// Sets the conversions used to bind default values.
    pub fn coercions(mut self, coercions: Coercions) -> Self {
        self.coercions = coercions;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Produces one parameter per non-skipped field, in declaration order.
    ///
    /// Unknown arity markers and defaults that fail to convert are
    /// declaration errors.
    pub fn into_params(self) -> Result<Vec<Param<'a>>, Error> {
        let Self {
            name,
            fields,
            coercions,
        } = self;
        fields
            .into_iter()
            .filter(|f| f.skip == false)
            .map(|f| f.into_param(&name, &coercions))
            .collect()
    }
}
