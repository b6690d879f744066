//! Declarative command trees loaded from TOML.
//!
//! ```toml
//! [[command]]
//! name = ""
//! [[command.param]]
//! long = "verbose"
//! short = "v"
//!
//! [[command]]
//! name = "serve"
//! help = "Start the server."
//! [[command.param]]
//! long = "port"
//! short = "p"
//! value = "uint"
//! required = true
//! ```
//!
//! [`TreeConfig::build`] registers the definitions and returns the value
//! [`Bindings`] the parser writes into.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::command::Commands;
use crate::context::{Handler, handler};
use crate::error::Error;
use crate::value::{Choice, Setter, Slot};

/// Errors raised while loading or registering a tree definition.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse tree definition: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("parameter '{param}' of command '{path}': {message}")]
    Definition {
        path: String,
        param: String,
        message: &'static str,
    },

    #[error("command '{path}': {source}")]
    Register {
        path: String,
        #[source]
        source: Error,
    },
}

/// Root of a tree definition file.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    #[serde(rename = "command")]
    pub commands: Vec<CommandDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandDef {
    /// Empty for the global command, allowed only at the top level.
    pub name: String,
    #[serde(default)]
    pub help: String,
    /// Raw commands always get a handler.
    #[serde(default)]
    pub raw: bool,
    /// Register a handler for this command. Zero-parameter commands with a
    /// handler absorb trailing tokens.
    #[serde(default = "default_true")]
    pub handler: bool,
    #[serde(default, rename = "param")]
    pub params: Vec<ParamDef>,
    #[serde(default, rename = "command")]
    pub commands: Vec<CommandDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParamDef {
    pub long: String,
    #[serde(default)]
    pub short: String,
    #[serde(default)]
    pub help: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub raw: bool,
    pub value: Option<ValueKind>,
    #[serde(default)]
    pub choices: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Int,
    Uint,
    Float,
    Bool,
    Duration,
    Path,
    Choice,
}

fn default_true() -> bool {
    true
}

impl TreeConfig {
    /// Load a definition from a TOML file.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Register every definition into `commands`, giving each command that
    /// asks for one a handler that does nothing.
    pub fn build(&self, commands: &mut Commands) -> Result<Bindings, ConfigError> {
        self.build_with(commands, |_| handler(|_| Ok(())))
    }

    /// Register every definition into `commands`, asking `handlers` for the
    /// handler of each command that wants one. The factory receives the
    /// space-separated command path, e.g. `"remote add"`.
    pub fn build_with<F>(
        &self,
        commands: &mut Commands,
        mut handlers: F,
    ) -> Result<Bindings, ConfigError>
    where
        F: FnMut(&str) -> Option<Handler>,
    {
        let mut bindings = Bindings::default();
        register(commands, &self.commands, &[], &mut bindings, &mut handlers)?;
        debug!(bindings = bindings.len(), "registered tree definition");
        Ok(bindings)
    }
}

fn register<'a, F>(
    commands: &mut Commands,
    defs: &'a [CommandDef],
    prefix: &[&'a str],
    bindings: &mut Bindings,
    handlers: &mut F,
) -> Result<(), ConfigError>
where
    F: FnMut(&str) -> Option<Handler>,
{
    for def in defs {
        let mut names = prefix.to_vec();
        names.push(&def.name);
        let path = names.join(" ");
        let fail = |source: Error| ConfigError::Register {
            path: path.clone(),
            source,
        };

        let handler = if def.handler || def.raw {
            handlers(&path)
        } else {
            None
        };
        let command = if def.raw {
            commands.add_raw_command(&def.name, &def.help, handler)
        } else {
            commands.add_command(&def.name, &def.help, handler)
        }
        .map_err(fail)?;

        for param in &def.params {
            let value = param.setter(&path, bindings)?;
            let added = if param.raw {
                if !param.short.is_empty() {
                    return Err(ConfigError::Definition {
                        path: path.clone(),
                        param: param.long.clone(),
                        message: "raw parameters have no short name",
                    });
                }
                command.add_raw_param(&param.long, &param.help, param.required, value)
            } else {
                command.add_param(
                    &param.long,
                    &param.short,
                    &param.help,
                    param.required,
                    value,
                )
            };
            added.map_err(fail)?;
        }

        if !def.commands.is_empty() {
            let children = command.sub_commands().map_err(|e| fail(e.into()))?;
            register(children, &def.commands, &names, bindings, handlers)?;
        }
    }
    Ok(())
}

impl ParamDef {
    fn setter(
        &self,
        path: &str,
        bindings: &mut Bindings,
    ) -> Result<Option<Box<dyn Setter>>, ConfigError> {
        let Some(kind) = self.value else {
            if !self.choices.is_empty() {
                return Err(self.invalid(path, "choices need value = \"choice\""));
            }
            return Ok(None);
        };
        let binding = match kind {
            ValueKind::String => Binding::String(Slot::new()),
            ValueKind::Int => Binding::Int(Slot::new()),
            ValueKind::Uint => Binding::Uint(Slot::new()),
            ValueKind::Float => Binding::Float(Slot::new()),
            ValueKind::Bool => Binding::Bool(Slot::new()),
            ValueKind::Duration => Binding::Duration(Slot::new()),
            ValueKind::Path => Binding::Path(Slot::new()),
            ValueKind::Choice if self.choices.is_empty() => {
                return Err(self.invalid(path, "choice values need a list of choices"));
            }
            ValueKind::Choice => Binding::Choice(Choice::new(self.choices.iter().cloned())),
        };
        let setter = binding.setter();
        bindings.entries.push((path.to_string(), self.long.clone(), binding));
        Ok(Some(setter))
    }

    fn invalid(&self, path: &str, message: &'static str) -> ConfigError {
        ConfigError::Definition {
            path: path.to_string(),
            param: self.long.clone(),
            message,
        }
    }
}

/// Output slot created for one value-bearing parameter.
#[derive(Debug, Clone)]
pub enum Binding {
    String(Slot<String>),
    Int(Slot<i64>),
    Uint(Slot<u64>),
    Float(Slot<f64>),
    Bool(Slot<bool>),
    Duration(Slot<Duration>),
    Path(Slot<PathBuf>),
    Choice(Choice),
}

impl Binding {
    fn setter(&self) -> Box<dyn Setter> {
        match self {
            Binding::String(slot) => Box::new(slot.clone()),
            Binding::Int(slot) => Box::new(slot.clone()),
            Binding::Uint(slot) => Box::new(slot.clone()),
            Binding::Float(slot) => Box::new(slot.clone()),
            Binding::Bool(slot) => Box::new(slot.clone()),
            Binding::Duration(slot) => Box::new(slot.clone()),
            Binding::Path(slot) => Box::new(slot.clone()),
            Binding::Choice(choice) => Box::new(choice.clone()),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Binding::String(_) => ValueKind::String,
            Binding::Int(_) => ValueKind::Int,
            Binding::Uint(_) => ValueKind::Uint,
            Binding::Float(_) => ValueKind::Float,
            Binding::Bool(_) => ValueKind::Bool,
            Binding::Duration(_) => ValueKind::Duration,
            Binding::Path(_) => ValueKind::Path,
            Binding::Choice(_) => ValueKind::Choice,
        }
    }

    /// Converted value, if the parameter was ever parsed.
    pub fn value(&self) -> Option<Value> {
        match self {
            Binding::String(slot) => slot.get().map(Value::String),
            Binding::Int(slot) => slot.get().map(Value::Int),
            Binding::Uint(slot) => slot.get().map(Value::Uint),
            Binding::Float(slot) => slot.get().map(Value::Float),
            Binding::Bool(slot) => slot.get().map(Value::Bool),
            Binding::Duration(slot) => slot.get().map(Value::Duration),
            Binding::Path(slot) => slot.get().map(Value::Path),
            Binding::Choice(choice) => choice.get().map(Value::String),
        }
    }
}

/// A converted parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    Duration(#[serde(serialize_with = "serialize_duration")] Duration),
    Path(PathBuf),
}

fn serialize_duration<S: Serializer>(
    value: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&humantime::format_duration(*value))
}

/// Value slots of a built tree, in registration order.
#[derive(Debug, Default, Clone)]
pub struct Bindings {
    entries: Vec<(String, String, Binding)>,
}

impl Bindings {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Binding of parameter `long` on the command at `path`.
    pub fn get(&self, path: &str, long: &str) -> Option<&Binding> {
        self.entries
            .iter()
            .find(|(p, l, _)| p == path && l == long)
            .map(|(_, _, binding)| binding)
    }

    /// `(command path, long name, binding)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &Binding)> {
        self.entries
            .iter()
            .map(|(path, long, binding)| (path.as_str(), long.as_str(), binding))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::TempDir;

    use super::*;
    use crate::error::RegisterError;
    use crate::state::parse_args;

    const SERVER: &str = r#"
[[command]]
name = ""
[[command.param]]
long = "verbose"
short = "v"

[[command]]
name = "serve"
help = "Start the server."
[[command.param]]
long = "port"
short = "p"
value = "uint"
required = true
[[command.param]]
long = "timeout"
value = "duration"
[[command.param]]
long = "mode"
value = "choice"
choices = ["dev", "prod"]

[[command]]
name = "remote"
[[command.command]]
name = "add"
[[command.command.param]]
long = "name"
raw = true
required = true
value = "string"
"#;

    #[test]
    fn builds_and_binds_values() {
        let config = TreeConfig::from_toml_str(SERVER).unwrap();
        let mut root = Commands::root();
        let bindings = config.build(&mut root).unwrap();
        assert_eq!(bindings.len(), 4);

        parse_args(
            ["-v", "serve", "-p", "8080", "--timeout", "1m30s", "--mode", "PROD"],
            &mut root,
        )
        .unwrap();
        let value = |path, long| bindings.get(path, long).and_then(Binding::value);
        assert_eq!(value("serve", "port"), Some(Value::Uint(8080)));
        assert_eq!(
            value("serve", "timeout"),
            Some(Value::Duration(Duration::from_secs(90)))
        );
        assert_eq!(value("serve", "mode"), Some(Value::String("prod".into())));
        assert_eq!(value("remote add", "name"), None);
        assert!(root.command("").unwrap().params().is_parsed("verbose"));
    }

    #[test]
    fn nested_commands_are_keyed_by_path() {
        let config = TreeConfig::from_toml_str(SERVER).unwrap();
        let mut root = Commands::root();
        let bindings = config.build(&mut root).unwrap();
        parse_args(["remote", "add", "origin"], &mut root).unwrap();
        let name = bindings.get("remote add", "name").unwrap();
        assert_eq!(name.kind(), ValueKind::String);
        assert_eq!(name.value(), Some(Value::String("origin".into())));
    }

    #[test]
    fn registration_errors_name_the_command() {
        let config = TreeConfig::from_toml_str(
            r#"
[[command]]
name = "run"
raw = true
[[command.command]]
name = "sub"
"#,
        )
        .unwrap();
        let err = config.build(&mut Commands::root()).unwrap_err();
        match err {
            ConfigError::Register { path, source } => {
                assert_eq!(path, "run");
                assert!(matches!(
                    source,
                    Error::Register(RegisterError::SubCommandOfRaw(_))
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn choice_without_choices_is_rejected() {
        let config = TreeConfig::from_toml_str(
            r#"
[[command]]
name = "pick"
[[command.param]]
long = "color"
value = "choice"
"#,
        )
        .unwrap();
        let err = config.build(&mut Commands::root()).unwrap_err();
        assert!(matches!(err, ConfigError::Definition { ref param, .. } if param == "color"));
    }

    #[test]
    fn handler_flag_controls_leftover_capture() {
        let config = TreeConfig::from_toml_str(
            r#"
[[command]]
name = "echo"

[[command]]
name = "bare"
handler = false
"#,
        )
        .unwrap();
        let mut root = Commands::root();
        config.build(&mut root).unwrap();
        let session = parse_args(["echo", "a", "b"], &mut root).unwrap();
        assert_eq!(session.captured(), ["a", "b"].map(String::from));
        assert!(parse_args(["bare", "a"], &mut root).is_err());
    }

    #[test]
    fn load_from_file() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("tree.toml");
        let mut file = std::fs::File::create(&path).expect("create definition");
        writeln!(file, "{}", SERVER).expect("write definition");

        let config = TreeConfig::load_from_path(&path).unwrap();
        assert_eq!(config.commands.len(), 3);
        assert_eq!(config.commands[2].commands[0].name, "add");
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let temp = TempDir::new().expect("temp dir");
        let err = TreeConfig::load_from_path(&temp.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = TreeConfig::from_toml_str("[[command]]\nhelp = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
