//! The probe's own command line, parsed with cmdtree.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use cmdtree::{Context, Parser, Slot, bind, handler};

pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// What the matched command asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Check {
        definition: PathBuf,
        args: Vec<String>,
    },
    Print {
        definition: PathBuf,
    },
    Classify {
        tokens: Vec<String>,
    },
}

pub struct Cli {
    parser: Parser,
    log_level: Slot<String>,
    action: Rc<RefCell<Option<Action>>>,
}

impl Cli {
    pub fn new() -> cmdtree::Result<Self> {
        let log_level = Slot::with_default(DEFAULT_LOG_LEVEL.to_string());
        let action = Rc::new(RefCell::new(None));
        let mut parser = Parser::new();

        parser.add_global_param(
            "log-level",
            "l",
            "Log filter when RUST_LOG is unset (default: warn).",
            false,
            bind(log_level.clone()),
        )?;
        parser.add_global_param("json", "j", "Print reports as JSON.", false, None)?;
        parser.add_global_param("help", "h", "Show this help.", false, None)?;
        parser.add_global_param("version", "V", "Show version.", false, None)?;

        let sink = Rc::clone(&action);
        parser
            .add_raw_command(
                "check",
                "Parse arguments against a tree definition and report the match.",
                handler(move |ctx: &Context<'_>| {
                    *sink.borrow_mut() = Some(Action::Check {
                        definition: PathBuf::from(ctx.value("definition")),
                        args: ctx.arguments().to_vec(),
                    });
                    Ok(())
                }),
            )?
            .add_raw_param("definition", "Tree definition (TOML).", true, None)?;

        let sink = Rc::clone(&action);
        parser
            .add_command(
                "print",
                "Print the help tree of a definition.",
                handler(move |ctx: &Context<'_>| {
                    *sink.borrow_mut() = Some(Action::Print {
                        definition: PathBuf::from(ctx.value("definition")),
                    });
                    Ok(())
                }),
            )?
            .add_raw_param("definition", "Tree definition (TOML).", true, None)?;

        let sink = Rc::clone(&action);
        parser.add_raw_command(
            "classify",
            "Show how each token is classified.",
            handler(move |ctx: &Context<'_>| {
                *sink.borrow_mut() = Some(Action::Classify {
                    tokens: ctx.arguments().to_vec(),
                });
                Ok(())
            }),
        )?;

        Ok(Self {
            parser,
            log_level,
            action,
        })
    }

    pub fn parse<I, S>(&mut self, args: I) -> cmdtree::Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parser.parse(args)
    }

    pub fn log_level(&self) -> String {
        self.log_level
            .get()
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
    }

    /// True if the global flag `long` was given.
    pub fn flag(&self, long: &str) -> bool {
        self.parser
            .command("")
            .is_some_and(|global| global.params().is_parsed(long))
    }

    pub fn take_action(&self) -> Option<Action> {
        self.action.borrow_mut().take()
    }

    pub fn usage(&self) -> String {
        format!(
            "cmdtree-probe {}\n\nUsage: cmdtree-probe [options] <command> [args...]\n\n{}",
            env!("CARGO_PKG_VERSION"),
            self.parser.print()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_takes_definition_and_the_rest() {
        let mut cli = Cli::new().unwrap();
        cli.parse(["-j", "check", "tree.toml", "serve", "--port", "80"])
            .unwrap();
        assert!(cli.flag("json"));
        assert_eq!(
            cli.take_action(),
            Some(Action::Check {
                definition: PathBuf::from("tree.toml"),
                args: ["serve", "--port", "80"].map(String::from).to_vec(),
            })
        );
    }

    #[test]
    fn log_level_defaults_to_warn() {
        let mut cli = Cli::new().unwrap();
        cli.parse(["classify", "a"]).unwrap();
        assert_eq!(cli.log_level(), "warn");

        let mut cli = Cli::new().unwrap();
        cli.parse(["--log-level", "debug", "classify"]).unwrap();
        assert_eq!(cli.log_level(), "debug");
        assert_eq!(cli.take_action(), Some(Action::Classify { tokens: vec![] }));
    }

    #[test]
    fn print_needs_a_definition() {
        let mut cli = Cli::new().unwrap();
        assert!(cli.parse(["print"]).is_err());
        assert!(cli.take_action().is_none());
    }

    #[test]
    fn usage_lists_commands() {
        let cli = Cli::new().unwrap();
        let usage = cli.usage();
        assert!(usage.contains("[--json] -j"));
        assert!(usage.contains("check  Parse arguments"));
        assert!(usage.contains("<definition>"));
    }
}
