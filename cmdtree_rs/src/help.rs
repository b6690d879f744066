//! Help text rendering for registered command trees.
//!
//! Commands are listed in registration order. Each parameter is shown as
//! `<--req>`, `[--opt]`, `<raw>` or `[raw]`, followed by its short alias
//! and value kind when present. Nested levels indent by two spaces.

use std::fmt::Write;

use crate::command::{Command, CommandBody, Commands};
use crate::parameter::{Parameter, Parameters};

const INDENT: &str = "  ";

impl Commands {
    /// Render this tree as text suitable for terminal display.
    pub fn print(&self) -> String {
        let mut out = String::new();
        write_commands(&mut out, self, 0);
        out
    }
}

impl Command {
    /// Render this command, its parameters and its sub-commands.
    pub fn print(&self) -> String {
        render_command(self.name(), self.help(), self.params(), self.body())
    }
}

pub(crate) fn render_command(
    name: &str,
    help: &str,
    params: &Parameters,
    body: &CommandBody,
) -> String {
    let mut out = String::new();
    write_command(&mut out, name, help, params, body, 0);
    out
}

fn write_commands(out: &mut String, commands: &Commands, depth: usize) {
    for command in commands.iter() {
        write_command(
            out,
            command.name(),
            command.help(),
            command.params(),
            command.body(),
            depth,
        );
    }
}

fn write_command(
    out: &mut String,
    name: &str,
    help: &str,
    params: &Parameters,
    body: &CommandBody,
    depth: usize,
) {
    // The global command has no name of its own to show.
    let inner = if name.is_empty() {
        depth
    } else {
        write_line(out, depth, name, help);
        depth + 1
    };
    for param in params.iter() {
        write_line(out, inner, &param_label(param), param.help());
    }
    if let CommandBody::Tree(children) = body {
        write_commands(out, children, inner);
    }
}

fn param_label(param: &Parameter) -> String {
    let dashes = if param.is_raw() { "" } else { "--" };
    let mut label = if param.is_required() {
        format!("<{}{}>", dashes, param.long())
    } else {
        format!("[{}{}]", dashes, param.long())
    };
    if let Some(short) = param.short() {
        let _ = write!(label, " -{}", short);
    }
    if let Some(kind) = param.value_kind() {
        let _ = write!(label, " ({})", kind);
    }
    label
}

fn write_line(out: &mut String, depth: usize, label: &str, help: &str) {
    out.push_str(&INDENT.repeat(depth));
    out.push_str(label);
    if !help.is_empty() {
        out.push_str(INDENT);
        out.push_str(help);
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use crate::context::handler;
    use crate::state::Parser;
    use crate::value::{Slot, bind};

    #[test]
    fn prints_tree_in_registration_order() {
        let mut parser = Parser::new();
        parser
            .add_global_param("verbose", "v", "Verbose output.", false, None)
            .unwrap();
        let list = parser.add_command("list", "List things.", None).unwrap();
        list.add_command("users", "", handler(|_| Ok(())))
            .unwrap()
            .add_param("limit", "n", "Max rows.", true, bind(Slot::<u32>::new()))
            .unwrap();
        parser
            .add_raw_command("exec", "Run a program.", handler(|_| Ok(())))
            .unwrap()
            .add_raw_param("program", "Program to run.", true, None)
            .unwrap()
            .add_raw_param("arg", "", false, None)
            .unwrap();

        let expected = "\
[--verbose] -v  Verbose output.
list  List things.
  users
    <--limit> -n (u32)  Max rows.
exec  Run a program.
  <program>  Program to run.
  [arg]
";
        assert_eq!(parser.print(), expected);
    }

    #[test]
    fn single_command_print() {
        let mut parser = Parser::new();
        parser
            .add_command("get", "Fetch.", None)
            .unwrap()
            .add_param("out", "", "", false, bind(Slot::<std::path::PathBuf>::new()))
            .unwrap();
        let get = parser.command("get").unwrap();
        assert_eq!(get.print(), "get  Fetch.\n  [--out] (path)\n");
    }
}
