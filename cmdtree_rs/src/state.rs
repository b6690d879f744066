//! Parse state: the per-invocation session and the owning parser.
//!
//! A [`Session`] holds everything that lives for one `parse` call: the
//! token cursor, the matched command chain and any captured raw tokens.
//! The command tree keeps only its topology plus per-parameter scratch,
//! which is cleared by one recursive pass before each parse.

use tracing::debug;

use crate::argument::{Argument, classify};
use crate::command::{Command, Commands};
use crate::context::{Handler, visit};
use crate::error::{Error, Result};
use crate::value::Setter;

/// Mutable state of a single parse invocation.
#[derive(Debug, Default, Clone)]
pub struct Session {
    arguments: Vec<String>,
    position: usize,
    matches: Vec<Vec<usize>>,
    captured: Vec<String>,
}

impl Session {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            arguments: args.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Classify the current token without consuming it.
    pub fn next(&self) -> (String, Argument) {
        let (text, kind) = classify(self.peek());
        (text.to_string(), kind)
    }

    /// The current token, unmodified.
    pub fn peek(&self) -> Option<&str> {
        self.arguments.get(self.position).map(String::as_str)
    }

    pub(crate) fn peek_owned(&self) -> String {
        self.peek().unwrap_or_default().to_string()
    }

    /// Advance past the current token. Returns true if tokens remain.
    pub fn skip(&mut self) -> bool {
        if self.position < self.arguments.len() {
            self.position += 1;
        }
        self.position < self.arguments.len()
    }

    /// Number of tokens consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Tokens not yet consumed.
    pub fn remaining(&self) -> &[String] {
        &self.arguments[self.position..]
    }

    /// Matched commands as index paths from the root, in match order.
    pub fn matches(&self) -> &[Vec<usize>] {
        &self.matches
    }

    /// Tokens captured verbatim by the last matched command.
    pub fn captured(&self) -> &[String] {
        &self.captured
    }

    pub(crate) fn add_match(&mut self, path: Vec<usize>) {
        self.matches.push(path);
    }

    pub(crate) fn capture_remaining(&mut self) {
        self.captured = self.arguments.split_off(self.position);
        debug!(count = self.captured.len(), "captured raw arguments");
    }
}

/// Parse `args` against `commands` and run the handlers of the matched chain.
pub fn parse_args<I, S>(args: I, commands: &mut Commands) -> Result<Session>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut session = Session::new(args);
    commands.reset();
    commands.resolve(&mut session, &[], None)?;
    visit(commands, &session)?;
    Ok(session)
}

/// Command line parser owning a root command tree.
///
/// The root tree is the only scope where a command with an empty name may
/// be registered. That command receives parameters given before any named
/// command, e.g. `--verbose list users`.
#[derive(Debug)]
pub struct Parser {
    commands: Commands,
    session: Session,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            commands: Commands::root(),
            session: Session::default(),
        }
    }

    pub fn commands(&self) -> &Commands {
        &self.commands
    }

    pub fn commands_mut(&mut self) -> &mut Commands {
        &mut self.commands
    }

    /// Register a root command. See [`Commands::add_command`].
    pub fn add_command(
        &mut self,
        name: &str,
        help: &str,
        handler: Option<Handler>,
    ) -> Result<&mut Command> {
        self.commands.add_command(name, help, handler)
    }

    /// Register a root raw command. See [`Commands::add_raw_command`].
    pub fn add_raw_command(
        &mut self,
        name: &str,
        help: &str,
        handler: Option<Handler>,
    ) -> Result<&mut Command> {
        self.commands.add_raw_command(name, help, handler)
    }

    /// Register a parameter on the global (empty-named) command, creating it
    /// without a handler if needed.
    pub fn add_global_param(
        &mut self,
        long: &str,
        short: &str,
        help: &str,
        required: bool,
        value: Option<Box<dyn Setter>>,
    ) -> Result<&mut Command> {
        let global = if self.commands.command("").is_some() {
            self.commands.command_mut("")
        } else {
            Some(self.commands.add_command("", "", None)?)
        };
        global
            .ok_or_else(|| Error::CommandNotFound(String::new()))?
            .add_param(long, short, help, required, value)
    }

    pub fn command(&self, name: &str) -> Option<&Command> {
        self.commands.command(name)
    }

    pub fn command_mut(&mut self, name: &str) -> Option<&mut Command> {
        self.commands.command_mut(name)
    }

    /// Parse `args`, usually `std::env::args().skip(1)`.
    ///
    /// Resets all parse scratch, resolves the command chain and visits the
    /// handlers of every matched command. The first error wins.
    pub fn parse<I, S>(&mut self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.session = Session::new(args);
        self.commands.reset();
        self.commands.resolve(&mut self.session, &[], None)?;
        self.visit()
    }

    /// Parse the process arguments.
    pub fn parse_env(&mut self) -> Result<()> {
        self.parse(std::env::args().skip(1))
    }

    /// Run the handlers of the last matched chain again.
    pub fn visit(&mut self) -> Result<()> {
        visit(&mut self.commands, &self.session)
    }

    /// The last parse session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Tokens left unconsumed by the last parse (non-empty after a failure).
    pub fn remaining(&self) -> &[String] {
        self.session.remaining()
    }

    /// Names of the commands matched by the last parse, root first.
    pub fn matched_names(&self) -> Vec<&str> {
        self.session
            .matches()
            .iter()
            .filter_map(|path| self.commands.at_path(path))
            .map(Command::name)
            .collect()
    }

    /// Render the registered tree as help text.
    pub fn print(&self) -> String {
        self.commands.print()
    }
}
