//! Probe actions and their reports.

use std::cell::RefCell;
use std::fmt::Write;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context as _, Result};
use cmdtree::config::{Binding, Bindings, TreeConfig, Value};
use cmdtree::{Commands, Session, classify, handler, parse_args};
use serde::Serialize;
use tracing::{debug, info};

/// One visited handler.
#[derive(Debug, Clone, Serialize)]
pub struct Visit {
    pub command: String,
    pub executed: bool,
    pub arguments: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ParamState {
    pub long: String,
    pub parsed: bool,
    pub raw_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct MatchedCommand {
    /// Space-separated path from the root; empty for the global command.
    pub path: String,
    pub params: Vec<ParamState>,
}

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    pub chain: Vec<MatchedCommand>,
    pub captured: Vec<String>,
    pub visits: Vec<Visit>,
}

impl CheckReport {
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for command in &self.chain {
            let name = if command.path.is_empty() {
                "<global>"
            } else {
                command.path.as_str()
            };
            let _ = writeln!(out, "command: {}", name);
            for param in &command.params {
                let mark = if param.parsed { "x" } else { " " };
                let _ = write!(out, "  [{}] {}", mark, param.long);
                if param.parsed {
                    let _ = write!(out, " = {}", param.raw_value);
                }
                if let Some(value) = &param.value {
                    let shown = serde_json::to_string(value).unwrap_or_default();
                    let _ = write!(out, " -> {}", shown);
                }
                out.push('\n');
            }
        }
        if !self.captured.is_empty() {
            let _ = writeln!(out, "captured: {}", self.captured.join(" "));
        }
        for visit in &self.visits {
            let _ = writeln!(
                out,
                "visited: {} (executed: {})",
                if visit.command.is_empty() { "<global>" } else { visit.command.as_str() },
                visit.executed
            );
        }
        out
    }
}

fn load_tree(definition: &Path) -> Result<TreeConfig> {
    TreeConfig::load_from_path(definition)
        .with_context(|| format!("Failed to load definition: {}", definition.display()))
}

/// Parse `args` against the tree in `definition`.
pub fn check(definition: &Path, args: &[String]) -> Result<CheckReport> {
    let config = load_tree(definition)?;
    let visits = Rc::new(RefCell::new(Vec::new()));
    let mut commands = Commands::root();
    let bindings = config
        .build_with(&mut commands, |path| {
            let visits = Rc::clone(&visits);
            let command = path.to_string();
            handler(move |ctx| {
                visits.borrow_mut().push(Visit {
                    command: command.clone(),
                    executed: ctx.executed(),
                    arguments: ctx.arguments().to_vec(),
                });
                Ok(())
            })
        })
        .with_context(|| format!("Invalid definition: {}", definition.display()))?;
    info!(definition = %definition.display(), args = args.len(), "checking arguments");

    let result = parse_args(args.iter().cloned(), &mut commands);
    let visits = visits.borrow().clone();
    let report = match result {
        Ok(session) => CheckReport {
            ok: true,
            error: None,
            error_kind: None,
            chain: chain(&commands, &session, &bindings),
            captured: session.captured().to_vec(),
            visits,
        },
        Err(err) => {
            debug!(error = %err, "parse failed");
            CheckReport {
                ok: false,
                error: Some(err.to_string()),
                error_kind: Some(format!("{:?}", err.kind())),
                chain: Vec::new(),
                captured: Vec::new(),
                visits,
            }
        }
    };
    Ok(report)
}

fn chain(commands: &Commands, session: &Session, bindings: &Bindings) -> Vec<MatchedCommand> {
    session
        .matches()
        .iter()
        .filter_map(|indexes| {
            let command = commands.at_path(indexes)?;
            let path = (1..=indexes.len())
                .filter_map(|depth| commands.at_path(&indexes[..depth]))
                .map(|c| c.name())
                .collect::<Vec<_>>()
                .join(" ");
            let params = command
                .params()
                .iter()
                .map(|param| ParamState {
                    long: param.long().to_string(),
                    parsed: param.is_parsed(),
                    raw_value: param.raw_value().to_string(),
                    value: bindings.get(&path, param.long()).and_then(Binding::value),
                })
                .collect();
            Some(MatchedCommand { path, params })
        })
        .collect()
}

/// Help tree of the definition.
pub fn print(definition: &Path) -> Result<String> {
    let config = load_tree(definition)?;
    let mut commands = Commands::root();
    config
        .build(&mut commands)
        .with_context(|| format!("Invalid definition: {}", definition.display()))?;
    Ok(commands.print())
}

#[derive(Debug, Serialize)]
pub struct Classified {
    pub token: String,
    pub kind: String,
    pub text: String,
}

pub fn classify_tokens(tokens: &[String]) -> Vec<Classified> {
    tokens
        .iter()
        .map(|token| {
            let (text, kind) = classify(Some(token.as_str()));
            Classified {
                token: token.clone(),
                kind: kind.to_string(),
                text: text.to_string(),
            }
        })
        .collect()
}

pub fn render_classified(rows: &[Classified]) -> String {
    let mut out = String::new();
    for row in rows {
        let _ = writeln!(out, "{}\t{}\t{}", row.token, row.kind, row.text);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::TempDir;

    fn definition(temp: &TempDir) -> std::path::PathBuf {
        let path = temp.path().join("tree.toml");
        let mut file = std::fs::File::create(&path).expect("create definition");
        writeln!(
            file,
            r#"
[[command]]
name = "serve"
[[command.param]]
long = "port"
short = "p"
value = "uint"
"#
        )
        .expect("write definition");
        path
    }

    #[test]
    fn check_reports_values() {
        let temp = TempDir::new().expect("temp dir");
        let args = ["serve", "-p", "80"].map(String::from);
        let report = check(&definition(&temp), &args).unwrap();
        assert!(report.ok);
        assert_eq!(report.chain.len(), 1);
        assert_eq!(report.chain[0].params[0].value, Some(Value::Uint(80)));
        assert!(report.render_text().contains("[x] port = 80 -> 80"));
    }

    #[test]
    fn check_reports_failures() {
        let temp = TempDir::new().expect("temp dir");
        let args = ["serve", "-p"].map(String::from);
        let report = check(&definition(&temp), &args).unwrap();
        assert!(!report.ok);
        assert_eq!(report.error_kind.as_deref(), Some("MissingValue"));
    }

    #[test]
    fn classifies_tokens() {
        let rows = classify_tokens(&["-abc".to_string(), "---".to_string()]);
        assert_eq!(rows[0].kind, "combined short parameters");
        assert_eq!(rows[1].kind, "invalid");
    }
}
