//! Commands and command trees.
//!
//! A [`Commands`] tree is a named set of sibling commands; each [`Command`]
//! owns its parameters and, unless it is raw, a child tree of sub-commands.
//! Resolution descends the tree one matched command at a time until the
//! tokens run out or a token matches nothing.

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::argument::Argument;
use crate::context::{Context, Handler};
use crate::error::{Error, RegisterError, Result};
use crate::parameter::Parameters;
use crate::state::Session;
use crate::value::Setter;

/// What a command does with tokens that follow its parameters.
pub enum CommandBody {
    /// Sub-commands continue the chain.
    Tree(Commands),
    /// Everything left over is handed to the handler verbatim.
    Raw,
}

/// How an unmatched token in a child scope is treated, decided by the
/// command matched just before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fallback {
    /// Capture the rest verbatim for the matched command's handler.
    Capture,
    /// Zero parameters and no handler: nobody can take the rest.
    NoHandler,
    /// The command declared parameters, so leftovers are extra.
    Extra,
    /// Resolving the root again after the global command.
    Global,
}

/// A command definition.
pub struct Command {
    name: String,
    help: String,
    handler: Option<Handler>,
    params: Parameters,
    body: CommandBody,
    /// Named root commands, shared with the global command; they come
    /// after it the way sub-commands do.
    root_named: Option<Rc<Cell<usize>>>,
}

impl Command {
    fn new(name: &str, help: &str, handler: Option<Handler>, raw: bool) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            handler,
            root_named: None,
            params: Parameters::default(),
            body: if raw {
                CommandBody::Raw
            } else {
                CommandBody::Tree(Commands::nested())
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    /// Raw commands take all tokens left after their parameters.
    pub fn is_raw(&self) -> bool {
        matches!(self.body, CommandBody::Raw)
    }

    pub fn body(&self) -> &CommandBody {
        &self.body
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Sub-commands, `None` for raw commands.
    pub fn commands(&self) -> Option<&Commands> {
        match &self.body {
            CommandBody::Tree(commands) => Some(commands),
            CommandBody::Raw => None,
        }
    }

    pub fn command(&self, name: &str) -> Option<&Command> {
        self.commands().and_then(|c| c.command(name))
    }

    pub fn command_mut(&mut self, name: &str) -> Option<&mut Command> {
        match &mut self.body {
            CommandBody::Tree(commands) => commands.command_mut(name),
            CommandBody::Raw => None,
        }
    }

    /// Register a sub-command.
    pub fn add_command(
        &mut self,
        name: &str,
        help: &str,
        handler: Option<Handler>,
    ) -> Result<&mut Command> {
        self.sub_commands()?.add_command(name, help, handler)
    }

    /// Register a raw sub-command.
    pub fn add_raw_command(
        &mut self,
        name: &str,
        help: &str,
        handler: Option<Handler>,
    ) -> Result<&mut Command> {
        self.sub_commands()?.add_raw_command(name, help, handler)
    }

    /// Register a prefixed parameter.
    ///
    /// A parameter with a `value` consumes the following token and converts
    /// it; without one it is a flag. Required prefixed parameters need a
    /// value. Prefixed parameters must be registered before raw ones.
    pub fn add_param(
        &mut self,
        long: &str,
        short: &str,
        help: &str,
        required: bool,
        value: Option<Box<dyn Setter>>,
    ) -> Result<&mut Self> {
        let has_sub_commands = self.has_sub_commands();
        self.params
            .add(long, short, help, required, false, value, has_sub_commands)?;
        Ok(self)
    }

    /// Register a positional raw parameter.
    ///
    /// Raw parameters are filled in registration order. Only the last one
    /// may be optional, and an optional raw parameter rules out sub-commands.
    /// A required raw parameter does not need a value; its token is still
    /// recorded and available through [`Context::value`].
    pub fn add_raw_param(
        &mut self,
        name: &str,
        help: &str,
        required: bool,
        value: Option<Box<dyn Setter>>,
    ) -> Result<&mut Self> {
        let has_sub_commands = self.has_sub_commands();
        self.params
            .add(name, "", help, required, true, value, has_sub_commands)?;
        Ok(self)
    }

    fn has_sub_commands(&self) -> bool {
        self.commands().is_some_and(|c| !c.is_empty())
            || self.root_named.as_ref().is_some_and(|n| n.get() > 0)
    }

    pub(crate) fn sub_commands(&mut self) -> Result<&mut Commands, RegisterError> {
        if self.params.has_optional_raw() {
            return Err(RegisterError::SubCommandOfOptionalRaw(self.name.clone()));
        }
        match &mut self.body {
            CommandBody::Tree(commands) => Ok(commands),
            CommandBody::Raw => Err(RegisterError::SubCommandOfRaw(self.name.clone())),
        }
    }

    fn fallback(&self) -> Fallback {
        match (self.params.is_empty(), self.handler.is_some()) {
            _ if self.is_raw() => Fallback::Capture,
            (true, true) => Fallback::Capture,
            (true, false) => Fallback::NoHandler,
            (false, _) => Fallback::Extra,
        }
    }

    fn reset(&mut self) {
        self.params.reset();
        if let CommandBody::Tree(commands) = &mut self.body {
            commands.reset();
        }
    }

    /// Call the handler, if any, with a context describing this command.
    pub(crate) fn run(&mut self, executed: bool, arguments: &[String]) -> Result<()> {
        let Command {
            name,
            help,
            handler,
            params,
            body,
            ..
        } = self;
        let Some(handler) = handler.as_mut() else {
            return Ok(());
        };
        debug!(command = %name, executed, "visiting handler");
        let ctx = Context::new(name, help, params, body, executed, arguments);
        handler(&ctx).map_err(Error::Handler)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("handler", &self.handler.is_some())
            .field("raw", &self.is_raw())
            .field("params", &self.params)
            .field("commands", &self.commands())
            .finish()
    }
}

/// A set of sibling commands with unique names, kept in registration order.
#[derive(Debug, Default)]
pub struct Commands {
    root: bool,
    commands: Vec<Command>,
    index: HashMap<String, usize>,
    named: Rc<Cell<usize>>,
}

impl Commands {
    /// A root tree, which may hold the empty-named global command.
    pub fn root() -> Self {
        Self {
            root: true,
            ..Self::default()
        }
    }

    fn nested() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.root
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Commands in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    pub fn command(&self, name: &str) -> Option<&Command> {
        self.index.get(name).map(|&i| &self.commands[i])
    }

    pub fn command_mut(&mut self, name: &str) -> Option<&mut Command> {
        self.index.get(name).map(|&i| &mut self.commands[i])
    }

    /// Register a command that runs `handler` when matched.
    ///
    /// An empty name registers the global command, allowed only in the
    /// root tree. It is matched when the arguments start with a parameter
    /// instead of a command name, and a named command may follow it.
    pub fn add_command(
        &mut self,
        name: &str,
        help: &str,
        handler: Option<Handler>,
    ) -> Result<&mut Command> {
        Ok(self.insert(name, help, handler, false)?)
    }

    /// Register a raw command: tokens left after its parameters are passed
    /// to its handler instead of being an error. Raw commands need a handler
    /// and cannot have sub-commands.
    pub fn add_raw_command(
        &mut self,
        name: &str,
        help: &str,
        handler: Option<Handler>,
    ) -> Result<&mut Command> {
        if handler.is_none() {
            return Err(RegisterError::RawWithoutHandler(name.to_string()).into());
        }
        Ok(self.insert(name, help, handler, true)?)
    }

    fn insert(
        &mut self,
        name: &str,
        help: &str,
        handler: Option<Handler>,
        raw: bool,
    ) -> Result<&mut Command, RegisterError> {
        if self.index.contains_key(name) {
            if name.is_empty() {
                return Err(RegisterError::DuplicateEmptyCommand);
            }
            return Err(RegisterError::DuplicateCommand(name.to_string()));
        }
        if name.is_empty() && !self.root {
            return Err(RegisterError::EmptyNameOutsideRoot);
        }
        if !name.is_empty()
            && self.root
            && self.command("").is_some_and(|g| g.params.has_optional_raw())
        {
            return Err(RegisterError::CommandBesideGlobalOptionalRaw(name.to_string()));
        }
        let mut command = Command::new(name, help, handler, raw);
        if self.root {
            if name.is_empty() {
                command.root_named = Some(Rc::clone(&self.named));
            } else {
                self.named.set(self.named.get() + 1);
            }
        }
        let index = self.commands.len();
        self.commands.push(command);
        self.index.insert(name.to_string(), index);
        Ok(&mut self.commands[index])
    }

    /// Command at an index path as recorded in [`Session::matches`].
    pub fn at_path(&self, path: &[usize]) -> Option<&Command> {
        let (&first, rest) = path.split_first()?;
        let mut command = self.commands.get(first)?;
        for &i in rest {
            command = command.commands()?.commands.get(i)?;
        }
        Some(command)
    }

    pub(crate) fn at_path_mut(&mut self, path: &[usize]) -> Option<&mut Command> {
        let (&first, rest) = path.split_first()?;
        let mut command = self.commands.get_mut(first)?;
        for &i in rest {
            command = match &mut command.body {
                CommandBody::Tree(commands) => commands.commands.get_mut(i)?,
                CommandBody::Raw => return None,
            };
        }
        Some(command)
    }

    /// Clear parse scratch of every parameter in this tree.
    pub(crate) fn reset(&mut self) {
        self.commands.iter_mut().for_each(Command::reset);
    }

    fn lookup(&self, name: &str) -> Option<usize> {
        if name.is_empty() {
            return None;
        }
        self.index.get(name).copied()
    }

    /// Match the next token against this scope and keep descending.
    ///
    /// `scope` is the index path of the command owning this tree (empty for
    /// the root); `last` describes the command matched just before.
    pub(crate) fn resolve(
        &mut self,
        session: &mut Session,
        scope: &[usize],
        last: Option<Fallback>,
    ) -> Result<()> {
        let (arg, kind) = session.next();
        trace!(token = %arg, %kind, "classified token");
        let (index, global) = match kind {
            Argument::None => {
                if !session.matches().is_empty() || self.is_empty() {
                    return Ok(());
                }
                return Err(Error::NoArguments);
            }
            Argument::Invalid => {
                let err = Error::InvalidArgument(session.peek_owned());
                return unmatched(session, last, err);
            }
            Argument::Text => match self.lookup(&arg) {
                Some(index) => (index, false),
                None => return unmatched(session, last, Error::CommandNotFound(arg)),
            },
            // The global command matches once per scope; its scan is over.
            Argument::Long | Argument::Short | Argument::Combined
                if last == Some(Fallback::Global) =>
            {
                return Err(Error::ExpectedCommand(session.peek_owned()));
            }
            Argument::Long | Argument::Short | Argument::Combined => match self.index.get("") {
                Some(&index) => (index, true),
                None => {
                    let err = Error::ExpectedCommand(session.peek_owned());
                    return unmatched(session, last, err);
                }
            },
        };

        if !global {
            session.skip();
        }
        let before = session.position();
        let mut path = scope.to_vec();
        path.push(index);

        let command = &mut self.commands[index];
        debug!(command = %command.name, global, "matched command");
        command.params.parse(session)?;
        if global && session.position() == before {
            let kind = match kind {
                Argument::Long => "long parameter",
                _ => "short parameter",
            };
            return Err(Error::ParameterNotFound { kind, name: arg });
        }
        session.add_match(path.clone());

        if global {
            return self.resolve(session, scope, Some(Fallback::Global));
        }
        let fallback = command.fallback();
        match &mut command.body {
            CommandBody::Raw => {
                session.capture_remaining();
                Ok(())
            }
            CommandBody::Tree(children) => children.resolve(session, &path, Some(fallback)),
        }
    }
}

/// Decide what happens to a token that matched nothing in this scope.
fn unmatched(session: &mut Session, last: Option<Fallback>, err: Error) -> Result<()> {
    match last {
        Some(Fallback::Capture) => {
            session.capture_remaining();
            Ok(())
        }
        Some(Fallback::NoHandler) if !matches!(err, Error::InvalidArgument(_)) => {
            Err(Error::NoHandler(session.remaining().to_vec()))
        }
        Some(Fallback::Extra) if matches!(err, Error::CommandNotFound(_)) => {
            Err(Error::ExtraArguments(session.remaining().to_vec()))
        }
        _ => Err(err),
    }
}
