//! Command line token classification.
//!
//! Every token is re-classified each time it is looked at; nothing is cached.

use std::fmt;

/// Kind of a command line token as seen by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Argument {
    /// No token left.
    None,
    /// Malformed dash prefix (`-`, `--`, `---name`).
    Invalid,
    /// A command name or a raw parameter value.
    Text,
    /// `--name`
    Long,
    /// `-n`
    Short,
    /// `-abc`, several one-character flags after a single dash.
    Combined,
}

impl Argument {
    /// True for kinds that address a parameter by name.
    pub fn is_prefixed(self) -> bool {
        matches!(self, Argument::Long | Argument::Short | Argument::Combined)
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Argument::None => "none",
            Argument::Invalid => "invalid",
            Argument::Text => "command or raw argument",
            Argument::Long => "long parameter",
            Argument::Short => "short parameter",
            Argument::Combined => "combined short parameters",
        };
        f.write_str(label)
    }
}

/// Classify `token`, returning the text with its dash prefix removed.
///
/// `None` input means the token list is exhausted. The empty string is
/// plain text: it can be a raw value but never names a command.
pub fn classify(token: Option<&str>) -> (&str, Argument) {
    let Some(token) = token else {
        return ("", Argument::None);
    };
    let text = token.trim_start_matches('-');
    let dashes = token.len() - text.len();
    let chars = text.chars().count();
    let kind = match (dashes, chars) {
        (0, _) => Argument::Text,
        (_, 0) => Argument::Invalid,
        (1, 1) => Argument::Short,
        (1, _) => Argument::Combined,
        (2, _) => Argument::Long,
        _ => Argument::Invalid,
    };
    match kind {
        Argument::Invalid => ("", kind),
        _ => (text, kind),
    }
}
