//! Handler contexts and visitation of the matched command chain.
//!
//! Every matched command's handler runs once, root first. Only the last
//! one in the chain sees [`Context::executed`] as true; the others were
//! merely traversed (a global-flags command, a sub-command selector).

use crate::command::{CommandBody, Commands};
use crate::error::Result;
use crate::help;
use crate::parameter::Parameters;
use crate::state::Session;

/// Command handler. Returning an error stops visitation and `parse`
/// returns that error unchanged.
pub type Handler = Box<dyn FnMut(&Context<'_>) -> anyhow::Result<()>>;

/// Box a closure as a handler for registration.
pub fn handler<F>(f: F) -> Option<Handler>
where
    F: FnMut(&Context<'_>) -> anyhow::Result<()> + 'static,
{
    Some(Box::new(f))
}

/// What a handler gets to know about the command it was registered on.
pub struct Context<'a> {
    name: &'a str,
    help: &'a str,
    params: &'a Parameters,
    body: &'a CommandBody,
    executed: bool,
    arguments: &'a [String],
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        name: &'a str,
        help: &'a str,
        params: &'a Parameters,
        body: &'a CommandBody,
        executed: bool,
        arguments: &'a [String],
    ) -> Self {
        Self {
            name,
            help,
            params,
            body,
            executed,
            arguments,
        }
    }

    /// Name of the command this handler was registered on.
    pub fn name(&self) -> &str {
        self.name
    }

    pub fn help(&self) -> &str {
        self.help
    }

    /// True if this command is the last one matched.
    pub fn executed(&self) -> bool {
        self.executed
    }

    /// True if the parameter under `long` was given.
    pub fn parsed(&self, long: &str) -> bool {
        self.params.is_parsed(long)
    }

    /// Literal token given for the parameter under `long`; empty if the
    /// parameter was not parsed or is not registered.
    pub fn value(&self, long: &str) -> &str {
        self.params.value(long)
    }

    /// Tokens captured verbatim after this command, when it is raw or
    /// declares no parameters. Empty for commands that were only traversed.
    pub fn arguments(&self) -> &[String] {
        self.arguments
    }

    pub fn params(&self) -> &Parameters {
        self.params
    }

    /// Help text for this command and its sub-commands.
    pub fn print(&self) -> String {
        help::render_command(self.name, self.help, self.params, self.body)
    }
}

/// Run the handlers of every command matched in `session`.
pub(crate) fn visit(commands: &mut Commands, session: &Session) -> Result<()> {
    let count = session.matches().len();
    for (i, path) in session.matches().iter().enumerate() {
        let executed = i + 1 == count;
        let arguments = if executed { session.captured() } else { &[] };
        if let Some(command) = commands.at_path_mut(path) {
            command.run(executed, arguments)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::error::Error;
    use crate::state::Parser;

    type Log = Rc<RefCell<Vec<(String, bool)>>>;

    fn recorder(log: &Log) -> Option<Handler> {
        let log = Rc::clone(log);
        handler(move |ctx| {
            log.borrow_mut().push((ctx.name().to_string(), ctx.executed()));
            Ok(())
        })
    }

    #[test]
    fn only_the_last_command_is_executed() {
        let log = Log::default();
        let mut parser = Parser::new();
        parser
            .add_command("foo", "", recorder(&log))
            .unwrap()
            .add_command("bar", "", recorder(&log))
            .unwrap()
            .add_command("baz", "", recorder(&log))
            .unwrap();
        parser.parse(["foo", "bar", "baz"]).unwrap();
        assert_eq!(
            *log.borrow(),
            vec![
                ("foo".to_string(), false),
                ("bar".to_string(), false),
                ("baz".to_string(), true),
            ]
        );
    }

    #[test]
    fn handler_error_stops_the_chain() {
        let log = Log::default();
        let mut parser = Parser::new();
        parser
            .add_command("foo", "", recorder(&log))
            .unwrap()
            .add_command("bar", "", handler(|_| anyhow::bail!("stop")))
            .unwrap()
            .add_command("baz", "", recorder(&log))
            .unwrap();
        let err = parser.parse(["foo", "bar", "baz"]).unwrap_err();
        assert!(matches!(err, Error::Handler(_)));
        assert_eq!(err.to_string(), "stop");
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn context_exposes_parameters_and_help() {
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        let mut parser = Parser::new();
        parser
            .add_command(
                "foo",
                "Do the foo.",
                handler(move |ctx| {
                    *sink.borrow_mut() = Some((
                        ctx.parsed("bar"),
                        ctx.value("bar").to_string(),
                        ctx.parsed("nope"),
                        ctx.arguments().len(),
                        ctx.print(),
                    ));
                    Ok(())
                }),
            )
            .unwrap()
            .add_param("bar", "b", "Enable bar.", false, None)
            .unwrap();
        parser.parse(["foo", "-b"]).unwrap();
        let (parsed, value, missing, args, printed) = seen.borrow_mut().take().unwrap();
        assert!(parsed);
        assert_eq!(value, "-b");
        assert!(!missing);
        assert_eq!(args, 0);
        assert!(printed.contains("foo  Do the foo."));
        assert!(printed.contains("[--bar]"));
    }
}
