//! Panicking registration shorthands.
//!
//! For trees built from literals at startup, where a registration error is
//! a programming mistake. Each method panics with the error the fallible
//! counterpart would have returned.

use crate::command::{Command, Commands};
use crate::context::Handler;
use crate::state::Parser;
use crate::value::Setter;

impl Commands {
    /// Like [`Commands::add_command`].
    ///
    /// # Panics
    /// On any registration error.
    pub fn must_add_command(
        &mut self,
        name: &str,
        help: &str,
        handler: Option<Handler>,
    ) -> &mut Command {
        match self.add_command(name, help, handler) {
            Ok(command) => command,
            Err(e) => panic!("{e}"),
        }
    }

    /// Like [`Commands::add_raw_command`].
    ///
    /// # Panics
    /// On any registration error.
    pub fn must_add_raw_command(
        &mut self,
        name: &str,
        help: &str,
        handler: Option<Handler>,
    ) -> &mut Command {
        match self.add_raw_command(name, help, handler) {
            Ok(command) => command,
            Err(e) => panic!("{e}"),
        }
    }

    /// Like [`Commands::command_mut`].
    ///
    /// # Panics
    /// If no command is registered under `name`.
    pub fn must_command(&mut self, name: &str) -> &mut Command {
        match self.command_mut(name) {
            Some(command) => command,
            None => panic!("command not found: '{name}'"),
        }
    }
}

impl Command {
    /// Like [`Command::add_command`].
    ///
    /// # Panics
    /// On any registration error.
    pub fn must_add_command(
        &mut self,
        name: &str,
        help: &str,
        handler: Option<Handler>,
    ) -> &mut Command {
        match self.add_command(name, help, handler) {
            Ok(command) => command,
            Err(e) => panic!("{e}"),
        }
    }

    /// Like [`Command::add_raw_command`].
    ///
    /// # Panics
    /// On any registration error.
    pub fn must_add_raw_command(
        &mut self,
        name: &str,
        help: &str,
        handler: Option<Handler>,
    ) -> &mut Command {
        match self.add_raw_command(name, help, handler) {
            Ok(command) => command,
            Err(e) => panic!("{e}"),
        }
    }

    /// Like [`Command::add_param`].
    ///
    /// # Panics
    /// On any registration error.
    pub fn must_add_param(
        &mut self,
        long: &str,
        short: &str,
        help: &str,
        required: bool,
        value: Option<Box<dyn Setter>>,
    ) -> &mut Self {
        if let Err(e) = self.add_param(long, short, help, required, value) {
            panic!("{e}");
        }
        self
    }

    /// Like [`Command::add_raw_param`].
    ///
    /// # Panics
    /// On any registration error.
    pub fn must_add_raw_param(
        &mut self,
        name: &str,
        help: &str,
        required: bool,
        value: Option<Box<dyn Setter>>,
    ) -> &mut Self {
        if let Err(e) = self.add_raw_param(name, help, required, value) {
            panic!("{e}");
        }
        self
    }

    /// Like [`Command::command_mut`].
    ///
    /// # Panics
    /// If no sub-command is registered under `name`.
    pub fn must_command(&mut self, name: &str) -> &mut Command {
        match self.command_mut(name) {
            Some(command) => command,
            None => panic!("command not found: '{name}'"),
        }
    }
}

impl Parser {
    /// Like [`Parser::add_command`].
    ///
    /// # Panics
    /// On any registration error.
    pub fn must_add_command(
        &mut self,
        name: &str,
        help: &str,
        handler: Option<Handler>,
    ) -> &mut Command {
        self.commands_mut().must_add_command(name, help, handler)
    }

    /// Like [`Parser::add_raw_command`].
    ///
    /// # Panics
    /// On any registration error.
    pub fn must_add_raw_command(
        &mut self,
        name: &str,
        help: &str,
        handler: Option<Handler>,
    ) -> &mut Command {
        self.commands_mut().must_add_raw_command(name, help, handler)
    }

    /// Like [`Parser::add_global_param`].
    ///
    /// # Panics
    /// On any registration error.
    pub fn must_add_global_param(
        &mut self,
        long: &str,
        short: &str,
        help: &str,
        required: bool,
        value: Option<Box<dyn Setter>>,
    ) -> &mut Command {
        match self.add_global_param(long, short, help, required, value) {
            Ok(command) => command,
            Err(e) => panic!("{e}"),
        }
    }

    /// Like [`Parser::command_mut`].
    ///
    /// # Panics
    /// If no root command is registered under `name`.
    pub fn must_command(&mut self, name: &str) -> &mut Command {
        self.commands_mut().must_command(name)
    }
}

#[cfg(test)]
mod tests {
    use crate::context::handler;
    use crate::state::Parser;

    #[test]
    fn builds_a_tree_without_results() {
        let mut parser = Parser::new();
        parser
            .must_add_command("remote", "", None)
            .must_add_command("add", "", handler(|_| Ok(())))
            .must_add_raw_param("name", "", true, None)
            .must_add_raw_param("url", "", true, None);
        parser.must_command("remote").must_command("add");
        parser.parse(["remote", "add", "origin", "git@host:repo"]).unwrap();
        assert_eq!(parser.matched_names(), vec!["remote", "add"]);
    }

    #[test]
    #[should_panic(expected = "duplicate command: 'dup'")]
    fn panics_on_duplicate() {
        let mut parser = Parser::new();
        parser.must_add_command("dup", "", None);
        parser.must_add_command("dup", "", None);
    }

    #[test]
    #[should_panic(expected = "command not found: 'nope'")]
    fn panics_on_missing_command() {
        Parser::new().must_command("nope");
    }
}
