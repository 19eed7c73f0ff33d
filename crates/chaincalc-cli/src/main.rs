//! Chaincalc CLI - chained calculations from the command line

use anyhow::{bail, Context, Result};
use chaincalc::prelude::*;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chaincalc")]
#[command(author, version, about = "Exact-decimal chained calculations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a formula and print the exact decimal result
    Eval {
        /// Formula text, e.g. "0.1+0.2" or "(2+3)*4"
        formula: String,
    },

    /// Validate a formula and list the node ids it references
    Check {
        /// Formula text, may contain {{id}} references
        formula: String,
    },

    /// Run a calculation script against an in-memory graph
    ///
    /// Script lines: `new <name> = <formula>`, `set <name> = <formula>`,
    /// `del <name>`, `show`. Formulas may reference earlier names as
    /// {{name}}. Blank lines and lines starting with '#' are skipped.
    Run {
        /// Script file
        script: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Eval { formula } => eval_formula(&formula),
        Commands::Check { formula } => check_formula(&formula),
        Commands::Run { script } => run_script(&script),
    }
}

fn eval_formula(formula: &str) -> Result<()> {
    let value = evaluate(formula).with_context(|| format!("Failed to evaluate '{formula}'"))?;
    println!("{value}");
    Ok(())
}

fn check_formula(formula: &str) -> Result<()> {
    validate(formula).with_context(|| format!("Invalid formula '{formula}'"))?;
    let refs = extract_references(formula)?;

    if refs.is_empty() {
        println!("ok (no references)");
    } else {
        let ids: Vec<&str> = refs.iter().map(|id| id.as_str()).collect();
        println!("ok (references: {})", ids.join(", "));
    }
    Ok(())
}

/// A running script session: the graph plus the name→id bindings
struct Session {
    graph: GraphManager<MemoryStore>,
    ids: HashMap<String, NodeId>,
    names: HashMap<NodeId, String>,
}

impl Session {
    fn new() -> Self {
        Self {
            graph: GraphManager::new(MemoryStore::new()),
            ids: HashMap::new(),
            names: HashMap::new(),
        }
    }

    fn id_of(&self, name: &str) -> Result<&NodeId> {
        self.ids
            .get(name)
            .with_context(|| format!("unknown name '{name}'"))
    }

    fn name_of<'a>(&'a self, id: &'a NodeId) -> &'a str {
        self.names.get(id).map(String::as_str).unwrap_or(id.as_str())
    }

    /// Rewrite `{{name}}` references to the `{{id}}` form the graph expects
    fn resolve_names(&self, formula: &str) -> String {
        let mut out = String::with_capacity(formula.len());
        let mut rest = formula;

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            match rest[start + 2..].find("}}") {
                Some(len) => {
                    let inner = rest[start + 2..start + 2 + len].trim();
                    match self.ids.get(inner) {
                        Some(id) => out.push_str(&format!("{{{{{id}}}}}")),
                        None => out.push_str(&rest[start..start + 2 + len + 2]),
                    }
                    rest = &rest[start + 2 + len + 2..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }

        out.push_str(rest);
        out
    }

    fn report_cascade(&self, outcome: &CascadeOutcome) {
        if !outcome.affected.is_empty() {
            let recalculated: Vec<&str> =
                outcome.affected.iter().map(|id| self.name_of(id)).collect();
            println!("  recalculated: {}", recalculated.join(", "));
        }
        for failure in &outcome.failures {
            eprintln!(
                "  warning: {} not recalculated: {}",
                self.name_of(&failure.id),
                failure.error
            );
        }
    }

    fn show(&self) {
        for node in self.graph.nodes() {
            println!(
                "{}\t{}\t= {}\t({})",
                self.name_of(&node.id),
                node.formula,
                node.value_text(),
                node.id
            );
        }
    }
}

fn run_script(path: &PathBuf) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;

    let mut session = Session::new();

    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        execute_line(&mut session, line)
            .with_context(|| format!("line {}: {}", lineno + 1, raw.trim()))?;
    }

    Ok(())
}

fn execute_line(session: &mut Session, line: &str) -> Result<()> {
    let (command, rest) = line
        .split_once(char::is_whitespace)
        .unwrap_or((line, ""));

    match command {
        "new" => {
            let (name, formula) = split_assignment(rest)?;
            if session.ids.contains_key(name) {
                bail!("name '{name}' already defined");
            }
            let resolved = session.resolve_names(formula);
            let node = session.graph.create_node(&resolved)?;
            println!("{} = {}", name, node.value_text());
            session.ids.insert(name.to_string(), node.id.clone());
            session.names.insert(node.id, name.to_string());
        }

        "set" => {
            let (name, formula) = split_assignment(rest)?;
            let id = session.id_of(name)?.clone();
            let resolved = session.resolve_names(formula);
            let outcome = session.graph.update_formula(&id, &resolved)?;
            println!("{} = {}", name, outcome.value.normalized());
            session.report_cascade(&outcome);
        }

        "del" => {
            let name = rest.trim();
            let id = session.id_of(name)?.clone();
            session.graph.delete_node(&id)?;
            session.ids.remove(name);
            session.names.remove(&id);
            println!("deleted {name}");
        }

        "show" => session.show(),

        _ => bail!("unknown command '{command}'"),
    }

    Ok(())
}

fn split_assignment(rest: &str) -> Result<(&str, &str)> {
    let (name, formula) = rest
        .split_once('=')
        .context("expected '<name> = <formula>'")?;
    let name = name.trim();
    let formula = formula.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        bail!("invalid name '{name}'");
    }
    Ok((name, formula))
}
