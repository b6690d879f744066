//! Typed output slots for parameter values.
//!
//! A parameter that carries a [`Setter`] consumes a value token and hands
//! it to the setter for conversion. [`Slot`] is the usual setter: the host
//! keeps a clone and reads the converted value after parsing.

use std::cell::RefCell;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use crate::error::BoxError;

/// Converts a raw token into a value owned by the host.
pub trait Setter {
    /// Convert `token` and store it.
    fn set(&mut self, token: &str) -> Result<(), BoxError>;

    /// Short name of the target type, shown in help output.
    fn kind(&self) -> &str {
        "value"
    }
}

/// Types that can be parsed from a single command line token.
pub trait FromToken: Sized {
    /// Name shown in help output.
    const KIND: &'static str;

    fn from_token(token: &str) -> Result<Self, BoxError>;
}

impl FromToken for String {
    const KIND: &'static str = "string";

    fn from_token(token: &str) -> Result<Self, BoxError> {
        Ok(token.to_string())
    }
}

impl FromToken for PathBuf {
    const KIND: &'static str = "path";

    fn from_token(token: &str) -> Result<Self, BoxError> {
        Ok(PathBuf::from(token))
    }
}

impl FromToken for bool {
    const KIND: &'static str = "bool";

    fn from_token(token: &str) -> Result<Self, BoxError> {
        match token.to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(format!("invalid bool '{}'", token).into()),
        }
    }
}

impl FromToken for char {
    const KIND: &'static str = "char";

    fn from_token(token: &str) -> Result<Self, BoxError> {
        let mut chars = token.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(format!("expected a single character, got '{}'", token).into()),
        }
    }
}

macro_rules! from_token_via_from_str {
    ($($ty:ty => $kind:literal),* $(,)?) => {
        $(
            impl FromToken for $ty {
                const KIND: &'static str = $kind;

                fn from_token(token: &str) -> Result<Self, BoxError> {
                    Ok(token.trim().parse::<$ty>()?)
                }
            }
        )*
    };
}

from_token_via_from_str! {
    i8 => "i8", i16 => "i16", i32 => "i32", i64 => "i64", isize => "isize",
    u8 => "u8", u16 => "u16", u32 => "u32", u64 => "u64", usize => "usize",
    f32 => "f32", f64 => "f64",
}

impl FromToken for Duration {
    const KIND: &'static str = "duration";

    fn from_token(token: &str) -> Result<Self, BoxError> {
        parse_duration(token)
    }
}

/// Parse a unit-suffixed duration such as `250ms`, `1h30m` or `2days`.
pub fn parse_duration(token: &str) -> Result<Duration, BoxError> {
    let input = token.trim();
    if input.is_empty() {
        return Err("empty duration".into());
    }
    humantime::parse_duration(input)
        .map_err(|e| format!("invalid duration '{}': {}", token, e).into())
}

/// Shared output slot written by the parser and read by the host.
///
/// Cloning a slot shares the underlying storage. Values persist across
/// parses; a parse that does not match the parameter leaves the slot as is.
pub struct Slot<T> {
    inner: Rc<RefCell<Option<T>>>,
}

impl<T> Slot<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(None)),
        }
    }

    /// Slot pre-filled with a default that parsing may overwrite.
    pub fn with_default(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Some(value))),
        }
    }

    pub fn is_set(&self) -> bool {
        self.inner.borrow().is_some()
    }

    pub fn take(&self) -> Option<T> {
        self.inner.borrow_mut().take()
    }

    pub fn replace(&self, value: T) -> Option<T> {
        self.inner.borrow_mut().replace(value)
    }
}

impl<T: Clone> Slot<T> {
    pub fn get(&self) -> Option<T> {
        self.inner.borrow().clone()
    }
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Slot").field(&self.inner.borrow()).finish()
    }
}

impl<T: FromToken> Setter for Slot<T> {
    fn set(&mut self, token: &str) -> Result<(), BoxError> {
        let value = T::from_token(token)?;
        *self.inner.borrow_mut() = Some(value);
        Ok(())
    }

    fn kind(&self) -> &str {
        T::KIND
    }
}

/// A slot that only accepts one of a fixed set of words.
#[derive(Debug, Clone)]
pub struct Choice {
    choices: Rc<[String]>,
    slot: Slot<String>,
}

impl Choice {
    pub fn new<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            choices: choices.into_iter().map(Into::into).collect(),
            slot: Slot::new(),
        }
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    pub fn get(&self) -> Option<String> {
        self.slot.get()
    }

    pub fn is_set(&self) -> bool {
        self.slot.is_set()
    }
}

impl Setter for Choice {
    fn set(&mut self, token: &str) -> Result<(), BoxError> {
        if let Some(choice) = self.choices.iter().find(|c| c.eq_ignore_ascii_case(token)) {
            self.slot.replace(choice.clone());
            return Ok(());
        }
        Err(format!("invalid value '{}'. Use: {}.", token, list_choices(&self.choices)).into())
    }

    fn kind(&self) -> &str {
        "choice"
    }
}

fn list_choices(choices: &[String]) -> String {
    match choices {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{}, or {}", init.join(", "), last),
    }
}

struct FnSetter<F> {
    kind: &'static str,
    f: F,
}

impl<F> Setter for FnSetter<F>
where
    F: FnMut(&str) -> Result<(), BoxError>,
{
    fn set(&mut self, token: &str) -> Result<(), BoxError> {
        (self.f)(token)
    }

    fn kind(&self) -> &str {
        self.kind
    }
}

/// Adapt a closure into a setter.
pub fn setter_fn<F>(kind: &'static str, f: F) -> Box<dyn Setter>
where
    F: FnMut(&str) -> Result<(), BoxError> + 'static,
{
    Box::new(FnSetter { kind, f })
}

/// Box a setter for registration: `cmd.add_param("out", "o", "", true, bind(out.clone()))`.
pub fn bind<S: Setter + 'static>(setter: S) -> Option<Box<dyn Setter>> {
    Some(Box::new(setter))
}
