//! Type-directed conversion of command-line text into caller-owned storage.
//!
//! A [Slot] wraps a mutable reference to the caller's variable. When a
//! parameter matches, the slot asks the [Coercions] registry to turn the
//! token into the slot's type:
//!
//! 1. a coercion registered for the exact type wins,
//! 2. otherwise the type's own [Value] parser runs.
//!
//! Lists append one element per coercion and optionals are filled in place,
//! so the matcher never needs to care which one it is writing into.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt::Debug;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::trace;

/// The reason a piece of text could not become a value.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum Fault {
    #[error("expected a boolean (1, t, true, 0, f, false) but found \"{0}\"")]
    Bool(String),
    #[error("invalid integer literal \"{0}\"")]
    Int(String),
    #[error("\"{text}\" is out of range for {ty}")]
    Overflow { text: String, ty: &'static str },
    #[error("{0}")]
    Parse(String),
    #[error("expected one of {}", .allowed.join("|"))]
    Choice { allowed: Vec<String> },
    #[error("unsupported target type {0}")]
    Unsupported(&'static str),
}

/// A type that knows how to read itself from a single command-line token.
pub trait Value: Sized + 'static {
    fn from_arg(text: &str) -> Result<Self, Fault>;

    /// Targets of nullary types become flags that take no token.
    fn nullary() -> bool {
        false
    }
}

impl Value for String {
    fn from_arg(text: &str) -> Result<Self, Fault> {
        Ok(text.to_owned())
    }
}

impl Value for bool {
    fn from_arg(text: &str) -> Result<Self, Fault> {
        match text {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
            _ => Err(Fault::Bool(text.to_owned())),
        }
    }

    fn nullary() -> bool {
        true
    }
}

/// Durations have no built-in spelling; they resolve through the registry
/// (see [Coercions::builtin]).
impl Value for Duration {
    fn from_arg(_: &str) -> Result<Self, Fault> {
        Err(Fault::Unsupported(type_name::<Self>()))
    }
}

/// Parses an integer literal the way source code spells one: an optional
/// sign, then an optional `0x`, `0o`, `0b` or leading-`0` (octal) prefix.
/// Underscores may separate digits only after a prefix.
fn parse_literal(text: &str) -> Result<i128, Fault> {
    let invalid = || Fault::Int(text.to_owned());
    let (negative, body) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let (radix, digits, prefixed) = match body.get(..2) {
        Some("0x") | Some("0X") => (16, &body[2..], true),
        Some("0o") | Some("0O") => (8, &body[2..], true),
        Some("0b") | Some("0B") => (2, &body[2..], true),
        _ if body.len() > 1 && body.starts_with('0') => (8, &body[1..], true),
        _ => (10, body, false),
    };
    if digits.is_empty()
        || digits.ends_with('_')
        || digits.contains("__")
        || (!prefixed && digits.contains('_'))
        || !digits.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(invalid());
    }
    let digits: String = digits.chars().filter(|c| *c != '_').collect();
    let magnitude = u128::from_str_radix(&digits, radix).map_err(|e| match e.kind() {
        std::num::IntErrorKind::PosOverflow => Fault::Overflow {
            text: text.to_owned(),
            ty: "i128",
        },
        _ => invalid(),
    })?;
    let value = i128::try_from(magnitude).map_err(|_| Fault::Overflow {
        text: text.to_owned(),
        ty: "i128",
    })?;
    Ok(if negative { -value } else { value })
}

macro_rules! integer_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl Value for $t {
                fn from_arg(text: &str) -> Result<Self, Fault> {
                    let overflow = || Fault::Overflow {
                        text: text.to_owned(),
                        ty: stringify!($t),
                    };
                    let wide = parse_literal(text).map_err(|fault| match fault {
                        Fault::Overflow { .. } => overflow(),
                        other => other,
                    })?;
                    <$t>::try_from(wide).map_err(|_| overflow())
                }
            }
        )*
    };
}

integer_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! parsed_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl Value for $t {
                fn from_arg(text: &str) -> Result<Self, Fault> {
                    text.parse::<$t>().map_err(|e| Fault::Parse(e.to_string()))
                }
            }
        )*
    };
}

parsed_value!(f32, f64, char, PathBuf, IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr);

/// A byte buffer spelled as hexadecimal text on the command-line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Hex(pub Vec<u8>);

impl Hex {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Value for Hex {
    fn from_arg(text: &str) -> Result<Self, Fault> {
        hex::decode(text)
            .map(Hex)
            .map_err(|e| Fault::Parse(e.to_string()))
    }
}

type Coercer = Box<dyn Fn(&str) -> Result<Box<dyn Any>, Fault>>;

/// An open registry of conversions keyed by the exact target type.
pub struct Coercions {
    table: HashMap<TypeId, (&'static str, Coercer)>,
}

impl Coercions {
    /// Creates a registry with no entries.
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Creates a registry holding the built-in conversions (currently
    /// [Duration] in `humantime` notation such as `1h 30m` or `250ms`).
    pub fn builtin() -> Self {
        Self::empty().with(|text: &str| {
            humantime::parse_duration(text).map_err(|e| Fault::Parse(e.to_string()))
        })
    }

    /// Registers `coerce` as the conversion for `T`, replacing any previous
    /// entry for the same type.
    pub fn register<T, F>(&mut self, coerce: F) -> &mut Self
    where
        T: Any,
        F: Fn(&str) -> Result<T, Fault> + 'static,
    {
        self.table.insert(
            TypeId::of::<T>(),
            (
                type_name::<T>(),
                Box::new(move |text: &str| coerce(text).map(|v| Box::new(v) as Box<dyn Any>)),
            ),
        );
        self
    }

    /// Builder form of [register][Coercions::register].
    pub fn with<T, F>(mut self, coerce: F) -> Self
    where
        T: Any,
        F: Fn(&str) -> Result<T, Fault> + 'static,
    {
        self.register(coerce);
        self
    }

    pub fn contains<T: Any>(&self) -> bool {
        self.table.contains_key(&TypeId::of::<T>())
    }

    fn lookup<T: Any>(&self, text: &str) -> Option<Result<T, Fault>> {
        let (_, coerce) = self.table.get(&TypeId::of::<T>())?;
        trace!(ty = type_name::<T>(), text, "using registered coercion");
        Some(coerce(text).and_then(|boxed| {
            boxed
                .downcast::<T>()
                .map(|v| *v)
                .map_err(|_| Fault::Unsupported(type_name::<T>()))
        }))
    }

    /// Converts `text` into a `T`, preferring a registered conversion over
    /// the type's own parser.
    pub fn coerce<T: Value>(&self, text: &str) -> Result<T, Fault> {
        match self.lookup::<T>(text) {
            Some(result) => result,
            None => T::from_arg(text),
        }
    }

    /// Converts `text` into a `T` that has no parser of its own.
    pub fn coerce_custom<T: Any>(&self, text: &str) -> Result<T, Fault> {
        self.lookup::<T>(text)
            .unwrap_or_else(|| Err(Fault::Unsupported(type_name::<T>())))
    }
}

impl Default for Coercions {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Debug for Coercions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.table.values().map(|(name, _)| *name).collect();
        names.sort_unstable();
        f.debug_struct("Coercions").field("types", &names).finish()
    }
}

/// How many values a target holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Single,
    List,
    Optional,
}

/// A writable destination for coerced text.
pub trait Target {
    fn assign(&mut self, text: &str, coercions: &Coercions) -> Result<(), Fault>;

    fn shape(&self) -> Shape;

    fn type_name(&self) -> &'static str;

    fn nullary(&self) -> bool {
        false
    }

    /// Forgets previously assigned values (used when a default gives way to
    /// real input).
    fn clear(&mut self) {}
}

struct Single<'a, T>(&'a mut T);

impl<T: Value> Target for Single<'_, T> {
    fn assign(&mut self, text: &str, coercions: &Coercions) -> Result<(), Fault> {
        *self.0 = coercions.coerce(text)?;
        Ok(())
    }

    fn shape(&self) -> Shape {
        Shape::Single
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn nullary(&self) -> bool {
        T::nullary()
    }
}

struct List<'a, T>(&'a mut Vec<T>);

impl<T: Value> Target for List<'_, T> {
    fn assign(&mut self, text: &str, coercions: &Coercions) -> Result<(), Fault> {
        self.0.push(coercions.coerce(text)?);
        Ok(())
    }

    fn shape(&self) -> Shape {
        Shape::List
    }

    fn type_name(&self) -> &'static str {
        type_name::<Vec<T>>()
    }

    fn clear(&mut self) {
        self.0.clear();
    }
}

struct Optional<'a, T>(&'a mut Option<T>);

impl<T: Value> Target for Optional<'_, T> {
    fn assign(&mut self, text: &str, coercions: &Coercions) -> Result<(), Fault> {
        *self.0 = Some(coercions.coerce(text)?);
        Ok(())
    }

    fn shape(&self) -> Shape {
        Shape::Optional
    }

    fn type_name(&self) -> &'static str {
        type_name::<Option<T>>()
    }

    fn nullary(&self) -> bool {
        T::nullary()
    }
}

struct Custom<'a, T>(&'a mut T);

impl<T: Any> Target for Custom<'_, T> {
    fn assign(&mut self, text: &str, coercions: &Coercions) -> Result<(), Fault> {
        *self.0 = coercions.coerce_custom(text)?;
        Ok(())
    }

    fn shape(&self) -> Shape {
        Shape::Single
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// Maps a fixed set of keys onto caller-chosen values.
struct Choice<'a, T> {
    target: &'a mut T,
    choices: Vec<(String, T)>,
}

impl<T: Clone + 'static> Target for Choice<'_, T> {
    fn assign(&mut self, text: &str, _: &Coercions) -> Result<(), Fault> {
        match self.choices.iter().find(|(key, _)| key == text) {
            Some((_, value)) => {
                *self.target = value.clone();
                Ok(())
            }
            None => Err(Fault::Choice {
                allowed: self.choices.iter().map(|(k, _)| k.clone()).collect(),
            }),
        }
    }

    fn shape(&self) -> Shape {
        Shape::Single
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// A caller-owned location that a parameter writes into.
pub struct Slot<'a> {
    target: Box<dyn Target + 'a>,
}

impl<'a> Slot<'a> {
    /// Wraps any [Target] implementation.
    pub fn new<T: Target + 'a>(target: T) -> Self {
        Self {
            target: Box::new(target),
        }
    }

    pub fn value<T: Value>(target: &'a mut T) -> Self {
        Self::new(Single(target))
    }

    pub fn list<T: Value>(target: &'a mut Vec<T>) -> Self {
        Self::new(List(target))
    }

    pub fn optional<T: Value>(target: &'a mut Option<T>) -> Self {
        Self::new(Optional(target))
    }

    /// A slot for a type that can only be filled by a registered coercion.
    pub fn custom<T: Any>(target: &'a mut T) -> Self {
        Self::new(Custom(target))
    }

    /// A slot accepting only the keys of `choices`.
    pub fn choice<T, K, I>(target: &'a mut T, choices: I) -> Self
    where
        T: Clone + 'static,
        K: Into<String>,
        I: IntoIterator<Item = (K, T)>,
    {
        Self::new(Choice {
            target,
            choices: choices.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        })
    }

    pub fn assign(&mut self, text: &str, coercions: &Coercions) -> Result<(), Fault> {
        self.target.assign(text, coercions)
    }

    pub fn shape(&self) -> Shape {
        self.target.shape()
    }

    pub fn type_name(&self) -> &'static str {
        self.target.type_name()
    }

    pub fn nullary(&self) -> bool {
        self.target.nullary()
    }

    pub(crate) fn clear(&mut self) {
        self.target.clear()
    }
}

impl Debug for Slot<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot")
            .field("type", &self.type_name())
            .field("shape", &self.shape())
            .finish()
    }
}

impl<'a, T: Value> From<&'a mut T> for Slot<'a> {
    fn from(target: &'a mut T) -> Self {
        Slot::value(target)
    }
}

impl<'a, T: Value> From<&'a mut Vec<T>> for Slot<'a> {
    fn from(target: &'a mut Vec<T>) -> Self {
        Slot::list(target)
    }
}

impl<'a, T: Value> From<&'a mut Option<T>> for Slot<'a> {
    fn from(target: &'a mut Option<T>) -> Self {
        Slot::optional(target)
    }
}
