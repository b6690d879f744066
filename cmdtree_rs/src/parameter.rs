//! Per-command parameter sets.
//!
//! Prefixed parameters (`--name`, `-n`) are addressed explicitly and may be
//! given in any order. Raw parameters are positional and are filled in
//! registration order. All prefixed parameters are registered before any
//! raw parameter, and at most one trailing raw parameter may be optional.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::argument::Argument;
use crate::error::{Error, RegisterError, Result};
use crate::state::Session;
use crate::value::Setter;

/// A single command parameter definition plus its per-parse scratch.
pub struct Parameter {
    long: String,
    short: Option<char>,
    help: String,
    required: bool,
    raw: bool,
    value: Option<Box<dyn Setter>>,
    parsed: bool,
    raw_value: String,
}

impl Parameter {
    pub fn long(&self) -> &str {
        &self.long
    }

    pub fn short(&self) -> Option<char> {
        self.short
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_raw(&self) -> bool {
        self.raw
    }

    /// True if a value token is consumed and converted for this parameter.
    pub fn takes_value(&self) -> bool {
        self.value.is_some()
    }

    /// Kind of the bound value, if any.
    pub fn value_kind(&self) -> Option<&str> {
        self.value.as_ref().map(|v| v.kind())
    }

    /// True if the parameter was matched by the last parse.
    pub fn is_parsed(&self) -> bool {
        self.parsed
    }

    /// Literal token captured by the last parse.
    ///
    /// For value-bearing and raw parameters this is the value token, for
    /// flags it is the flag as typed (`--verbose`, `-v`, `-abc`).
    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    fn reset(&mut self) {
        self.parsed = false;
        self.raw_value.clear();
    }

    fn assign(&mut self, token: &str) -> Result<()> {
        if let Some(value) = self.value.as_mut() {
            value.set(token).map_err(|source| Error::Conversion {
                name: self.long.clone(),
                token: token.to_string(),
                source,
            })?;
        }
        self.raw_value = token.to_string();
        self.parsed = true;
        Ok(())
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("long", &self.long)
            .field("short", &self.short)
            .field("required", &self.required)
            .field("raw", &self.raw)
            .field("value", &self.value_kind())
            .field("parsed", &self.parsed)
            .field("raw_value", &self.raw_value)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Named,
    Raw,
    Done,
}

/// Ordered set of parameters owned by one command.
#[derive(Debug, Default)]
pub struct Parameters {
    params: Vec<Parameter>,
    long: HashMap<String, usize>,
    short: HashMap<char, usize>,
}

impl Parameters {
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameters in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    pub fn get(&self, long: &str) -> Option<&Parameter> {
        self.long.get(long).map(|&i| &self.params[i])
    }

    pub fn get_short(&self, short: char) -> Option<&Parameter> {
        self.short.get(&short).map(|&i| &self.params[i])
    }

    /// True if the parameter under `long` was parsed.
    pub fn is_parsed(&self, long: &str) -> bool {
        self.get(long).is_some_and(Parameter::is_parsed)
    }

    /// Literal token of the parameter under `long`, empty if not parsed.
    pub fn value(&self, long: &str) -> &str {
        self.get(long).map(Parameter::raw_value).unwrap_or_default()
    }

    pub fn has_raw(&self) -> bool {
        self.params.iter().any(|p| p.raw)
    }

    pub fn has_optional_raw(&self) -> bool {
        self.params.iter().any(|p| p.raw && !p.required)
    }

    /// Validate and register a parameter. Nothing is changed on error.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn add(
        &mut self,
        long: &str,
        short: &str,
        help: &str,
        required: bool,
        raw: bool,
        value: Option<Box<dyn Setter>>,
        has_sub_commands: bool,
    ) -> Result<(), RegisterError> {
        let mut chars = short.chars();
        let short_char = chars.next();
        if long.is_empty() || chars.next().is_some() {
            return Err(RegisterError::InvalidName {
                long: long.to_string(),
                short: short.to_string(),
            });
        }
        if self.long.contains_key(long) {
            return Err(RegisterError::DuplicateLong(long.to_string()));
        }
        if let Some(c) = short_char
            && self.short.contains_key(&c)
        {
            return Err(RegisterError::DuplicateShort(short.to_string()));
        }
        if has_sub_commands && raw && !required {
            return Err(RegisterError::OptionalRawWithSubCommands(long.to_string()));
        }
        if let Some(last) = self.params.last()
            && last.raw
        {
            if !raw {
                return Err(RegisterError::PrefixedAfterRaw(long.to_string()));
            }
            if !last.required {
                if required {
                    return Err(RegisterError::RequiredAfterOptional(long.to_string()));
                }
                return Err(RegisterError::MultipleOptionalRaw(long.to_string()));
            }
        }
        if value.is_none() && required && !raw {
            return Err(RegisterError::ValueRequired(long.to_string()));
        }

        let index = self.params.len();
        self.params.push(Parameter {
            long: long.to_string(),
            short: short_char,
            help: help.to_string(),
            required,
            raw,
            value,
            parsed: false,
            raw_value: String::new(),
        });
        self.long.insert(long.to_string(), index);
        if let Some(c) = short_char {
            self.short.insert(c, index);
        }
        Ok(())
    }

    pub(crate) fn reset(&mut self) {
        self.params.iter_mut().for_each(Parameter::reset);
    }

    /// Consume as many tokens from `session` as these parameters claim.
    ///
    /// Stops at the first token that is neither a known prefixed parameter
    /// nor a value for a remaining raw parameter; that token is left for
    /// command resolution.
    pub(crate) fn parse(&mut self, session: &mut Session) -> Result<()> {
        if self.params.is_empty() {
            return Ok(());
        }
        let mut scan = Scan::Named;
        let mut next_raw = self
            .params
            .iter()
            .position(|p| p.raw)
            .unwrap_or(self.params.len());

        while scan != Scan::Done {
            let (arg, kind) = session.next();
            match kind {
                Argument::None => break,
                Argument::Text => {
                    if next_raw >= self.params.len() {
                        scan = Scan::Done;
                        continue;
                    }
                    scan = Scan::Raw;
                    let param = &mut self.params[next_raw];
                    param.assign(&arg)?;
                    debug!(param = %param.long, value = %arg, "matched raw parameter");
                    next_raw += 1;
                    session.skip();
                }
                _ if scan == Scan::Raw => scan = Scan::Done,
                Argument::Invalid => {
                    return Err(Error::InvalidArgument(session.peek_owned()));
                }
                Argument::Combined => {
                    let literal = session.peek_owned();
                    for c in arg.chars() {
                        let index = self.short_index(c)?;
                        let param = &mut self.params[index];
                        if param.takes_value() {
                            return Err(Error::CombinedValue(c.to_string()));
                        }
                        if param.parsed {
                            return Err(Error::DuplicateParameter(c.to_string()));
                        }
                        param.parsed = true;
                        param.raw_value = literal.clone();
                    }
                    debug!(flags = %arg, "matched combined short parameters");
                    session.skip();
                }
                Argument::Long | Argument::Short => {
                    let index = if kind == Argument::Long {
                        self.long_index(&arg)?
                    } else {
                        // Short tokens carry exactly one char.
                        self.short_index(arg.chars().next().unwrap_or_default())?
                    };
                    let literal = session.peek_owned();
                    let param = &mut self.params[index];
                    if param.parsed {
                        return Err(Error::DuplicateParameter(arg));
                    }
                    if param.takes_value() {
                        session.skip();
                        let Some(value) = session.peek().map(str::to_string) else {
                            return Err(Error::MissingValue(arg));
                        };
                        param.assign(&value)?;
                    } else {
                        param.assign(&literal)?;
                    }
                    debug!(param = %param.long, value = %param.raw_value, "matched parameter");
                    session.skip();
                }
            }
        }

        match self.params.iter().find(|p| p.required && !p.parsed) {
            Some(missing) => Err(Error::MissingRequired(missing.long.clone())),
            None => Ok(()),
        }
    }

    fn long_index(&self, name: &str) -> Result<usize> {
        self.long
            .get(name)
            .copied()
            .ok_or_else(|| Error::ParameterNotFound {
                kind: "long parameter",
                name: name.to_string(),
            })
    }

    fn short_index(&self, name: char) -> Result<usize> {
        self.short
            .get(&name)
            .copied()
            .ok_or_else(|| Error::ParameterNotFound {
                kind: "short parameter",
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::value::{Slot, bind};

    fn session(args: &[&str]) -> Session {
        Session::new(args.iter().copied())
    }

    fn flags(names: &[(&str, &str)]) -> Parameters {
        let mut params = Parameters::default();
        for (long, short) in names {
            params
                .add(long, short, "", false, false, None, false)
                .expect("register flag");
        }
        params
    }

    #[test]
    fn rejects_invalid_names() {
        let mut params = Parameters::default();
        assert!(matches!(
            params.add("", "", "", false, false, None, false),
            Err(RegisterError::InvalidName { .. })
        ));
        assert!(matches!(
            params.add("agnes", "ag", "", false, false, None, false),
            Err(RegisterError::InvalidName { .. })
        ));
        assert!(params.is_empty());
    }

    #[test]
    fn rejects_duplicates_in_both_namespaces() {
        let mut params = flags(&[("alice", "a")]);
        assert_eq!(
            params.add("alice", "", "", false, false, None, false),
            Err(RegisterError::DuplicateLong("alice".into()))
        );
        assert_eq!(
            params.add("agnes", "a", "", false, false, None, false),
            Err(RegisterError::DuplicateShort("a".into()))
        );
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn enforces_raw_ordering() {
        let mut params = Parameters::default();
        params.add("bar", "", "", true, true, None, false).unwrap();
        assert_eq!(
            params.add("flag", "", "", false, false, None, false),
            Err(RegisterError::PrefixedAfterRaw("flag".into()))
        );
        params.add("baz", "", "", false, true, None, false).unwrap();
        assert_eq!(
            params.add("boo", "", "", false, true, None, false),
            Err(RegisterError::MultipleOptionalRaw("boo".into()))
        );
        assert_eq!(
            params.add("boo", "", "", true, true, None, false),
            Err(RegisterError::RequiredAfterOptional("boo".into()))
        );
        assert_eq!(params.len(), 2);
        assert!(params.get("boo").is_none());
    }

    #[test]
    fn required_prefixed_needs_value() {
        let mut params = Parameters::default();
        assert_eq!(
            params.add("boo", "", "", true, false, None, false),
            Err(RegisterError::ValueRequired("boo".into()))
        );
        // Required raw parameters may discard their value.
        assert!(params.add("path", "", "", true, true, None, false).is_ok());
    }

    #[test]
    fn optional_raw_conflicts_with_sub_commands() {
        let mut params = Parameters::default();
        assert_eq!(
            params.add("rest", "", "", false, true, None, true),
            Err(RegisterError::OptionalRawWithSubCommands("rest".into()))
        );
        assert!(params.add("id", "", "", true, true, None, true).is_ok());
    }

    #[test]
    fn combined_short_flags() {
        let mut params = flags(&[("alice", "a"), ("buick", "b"), ("cecil", "c")]);
        let mut s = session(&["-abc"]);
        params.parse(&mut s).unwrap();
        assert!(params.is_parsed("alice"));
        assert!(params.is_parsed("buick"));
        assert!(params.is_parsed("cecil"));
        assert_eq!(params.value("buick"), "-abc");
        assert!(s.remaining().is_empty());
    }

    #[test]
    fn combined_duplicate_fails() {
        let mut params = flags(&[("alice", "a")]);
        let err = params.parse(&mut session(&["-aa"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateParameter);
    }

    #[test]
    fn combined_value_parameter_fails() {
        let mut params = flags(&[("alice", "a")]);
        params
            .add("filip", "f", "", false, false, bind(Slot::<String>::new()), false)
            .unwrap();
        let err = params.parse(&mut session(&["-af", "x"])).unwrap_err();
        assert!(matches!(err, Error::CombinedValue(ref c) if c == "f"));
    }

    #[test]
    fn value_parameter_consumes_next_token() {
        let out = Slot::<i64>::new();
        let mut params = Parameters::default();
        params
            .add("count", "n", "", true, false, bind(out.clone()), false)
            .unwrap();
        let mut s = session(&["-n", "-5", "rest"]);
        params.parse(&mut s).unwrap();
        assert_eq!(out.get(), Some(-5));
        assert_eq!(params.value("count"), "-5");
        assert_eq!(s.remaining(), ["rest".to_string()]);
    }

    #[test]
    fn missing_value_and_conversion_errors() {
        let mut params = Parameters::default();
        params
            .add("count", "n", "", false, false, bind(Slot::<i64>::new()), false)
            .unwrap();
        let err = params.parse(&mut session(&["--count"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingValue);

        params.reset();
        let err = params.parse(&mut session(&["--count", "ten"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConversionFailure);
    }

    #[test]
    fn short_and_long_namespaces_are_separate() {
        let mut params = flags(&[("verbose", "v")]);
        let err = params.parse(&mut session(&["--v"])).unwrap_err();
        assert!(matches!(
            err,
            Error::ParameterNotFound { kind: "long parameter", .. }
        ));
        params.reset();
        let err = params.parse(&mut session(&["-x"])).unwrap_err();
        assert!(matches!(
            err,
            Error::ParameterNotFound { kind: "short parameter", .. }
        ));
    }

    #[test]
    fn raw_scanning_never_returns_to_named() {
        let mut params = flags(&[("verbose", "v")]);
        params.add("path", "", "", true, true, None, false).unwrap();
        let mut s = session(&["file.txt", "-v"]);
        params.parse(&mut s).unwrap();
        assert_eq!(params.value("path"), "file.txt");
        assert!(!params.is_parsed("verbose"));
        assert_eq!(s.remaining(), ["-v".to_string()]);
    }

    #[test]
    fn text_without_raw_slot_is_left_for_commands() {
        let mut params = flags(&[("verbose", "v")]);
        let mut s = session(&["-v", "sub"]);
        params.parse(&mut s).unwrap();
        assert_eq!(s.remaining(), ["sub".to_string()]);
    }

    #[test]
    fn required_parameters_are_checked_in_order() {
        let mut params = Parameters::default();
        params
            .add("bar", "", "", true, false, bind(Slot::<String>::new()), false)
            .unwrap();
        params.add("bit", "", "", true, true, None, false).unwrap();
        let err = params.parse(&mut session(&["bit"])).unwrap_err();
        assert!(matches!(err, Error::MissingRequired(ref name) if name == "bar"));
    }

    #[test]
    fn reset_clears_scratch() {
        let mut params = flags(&[("verbose", "v")]);
        params.parse(&mut session(&["-v"])).unwrap();
        assert!(params.is_parsed("verbose"));
        params.reset();
        assert!(!params.is_parsed("verbose"));
        assert_eq!(params.value("verbose"), "");
    }
}
