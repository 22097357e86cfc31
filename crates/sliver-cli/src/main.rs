mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use log::{debug, info};
use sliver::programs::{self, Example, Expected};
use sliver::store::snapshot::{ExplTree, SerializedValue, StoreSnapshot};
use sliver::syntax::Expr;
use sliver::{Annotated, EvalConfig, ExprId, NodeId, Session};

#[derive(Parser)]
#[command(name = "sliver")]
#[command(about = "Explain, slice and check the bundled example programs")]
struct Cli {
    /// Configuration file (default: nearest Sliver.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the example programs
    List,
    /// Evaluate an example and print its result
    Run {
        example: String,
        /// Print the store snapshot as JSON
        #[arg(long)]
        json: bool,
        /// Print the explanation tree of the result
        #[arg(long)]
        explain: bool,
    },
    /// Make literals unavailable and report what the result still has
    Forward {
        example: String,
        /// Source text of the literals to withhold, e.g. `3` or `"one"`
        #[arg(long = "literal", required = true)]
        literals: Vec<String>,
    },
    /// Report which literals the result needed
    Backward { example: String },
    /// Check examples against their expected results
    Test {
        /// Examples to check (default: all)
        examples: Vec<String>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_default_env().format_timestamp(None).init();
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let loaded = config::load(cli.config.as_deref())?;
    info!("configuration from {}", loaded.source);
    let eval = loaded.config.eval;

    match cli.command {
        Commands::List => {
            for (name, build) in programs::ALL {
                let example = build().with_context(|| format!("building {name}"))?;
                println!("{:<20} {}", example.name, example.description);
            }
        }
        Commands::Run { example, json, explain } => {
            let example = load_example(&example)?;
            let mut session = Session::new(&example.program, eval)?;
            let node = session
                .evaluate(example.root)
                .with_context(|| format!("evaluating {}", example.name))?;
            let store = session.store();
            let program = &example.program;
            match (json, explain) {
                (true, true) => println!("{}", ExplTree::of(store, program, node).to_json()?),
                (true, false) => println!("{}", StoreSnapshot::capture(store, program).to_json()?),
                (false, true) => print!("{}", ExplTree::of(store, program, node).render()),
                (false, false) => println!("{}", SerializedValue::of(store, program, node)),
            }
        }
        Commands::Forward { example, literals } => {
            let example = load_example(&example)?;
            let roots = literal_exprs(&example, &literals)?;
            let mut session = Session::new(&example.program, eval)?;
            let node = session.evaluate(example.root)?;
            let roots: Vec<Annotated> = roots.into_iter().map(Annotated::Expr).collect();
            session.slice_forward(&roots)?;

            let store = session.store();
            let result = SerializedValue::of(store, &example.program, node);
            if session.is_available(node) {
                println!("result {result} stays available");
            } else {
                println!("result {result} becomes unavailable");
            }
            let mut lost: Vec<NodeId> = session.annotations().flagged_nodes().collect();
            lost.sort();
            println!("{} unavailable node(s)", lost.len());
            for lost in lost {
                let value = SerializedValue::of(store, &example.program, lost);
                println!("  {lost} {} = {value}", store.address(lost));
            }
        }
        Commands::Backward { example } => {
            let example = load_example(&example)?;
            let mut session = Session::new(&example.program, eval)?;
            let node = session.evaluate(example.root)?;
            session.slice_backward(&[Annotated::Node(node)])?;

            let program = &example.program;
            let mut needed: Vec<ExprId> = session
                .annotations()
                .flagged_exprs()
                .filter(|expr| literal_text(program.expr(*expr)).is_some())
                .collect();
            needed.sort();
            let unused = program
                .exprs()
                .filter(|(id, expr)| literal_text(expr).is_some() && !needed.contains(id))
                .count();
            println!(
                "result {} needed {} literal(s)",
                SerializedValue::of(session.store(), program, node),
                needed.len()
            );
            for expr in needed {
                if let Some(text) = literal_text(program.expr(expr)) {
                    println!("  e{} {text}", expr.0);
                }
            }
            println!("{unused} literal(s) not needed");
        }
        Commands::Test { examples } => return run_tests(&examples, &eval),
    }
    Ok(ExitCode::SUCCESS)
}

fn load_example(name: &str) -> Result<Example> {
    let example = programs::by_name(name)
        .ok_or_else(|| anyhow!("no example named `{name}` (try `sliver list`)"))?;
    example.with_context(|| format!("building {name}"))
}

/// How a literal is written in source.
fn literal_text(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Num(n) => Some(n.to_string()),
        Expr::Str(s) => Some(format!("{s:?}")),
        _ => None,
    }
}

fn literal_exprs(example: &Example, literals: &[String]) -> Result<Vec<ExprId>> {
    let mut found = Vec::new();
    for literal in literals {
        let before = found.len();
        found.extend(
            example
                .program
                .exprs()
                .filter(|(_, expr)| literal_text(expr).as_deref() == Some(literal.as_str()))
                .map(|(id, _)| id),
        );
        if found.len() == before {
            bail!("{} has no literal {literal}", example.name);
        }
    }
    debug!("withholding {} literal occurrence(s)", found.len());
    Ok(found)
}

fn run_tests(names: &[String], eval: &EvalConfig) -> Result<ExitCode> {
    let selected: Vec<&str> = if names.is_empty() {
        programs::ALL.iter().map(|(name, _)| *name).collect()
    } else {
        names.iter().map(String::as_str).collect()
    };

    let mut passed = 0;
    let mut failed = 0;
    for name in &selected {
        match check_example(name, eval) {
            Ok(()) => {
                println!("ok   {name}");
                passed += 1;
            }
            Err(reason) => {
                println!("FAIL {name}: {reason:#}");
                failed += 1;
            }
        }
    }

    eprintln!("\n{} tests: {} passed, {} failed", selected.len(), passed, failed);
    Ok(if failed > 0 { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

fn check_example(name: &str, eval: &EvalConfig) -> Result<()> {
    let example = load_example(name)?;
    let mut session = Session::new(&example.program, eval.clone())?;
    let outcome = session.evaluate(example.root);
    match (&example.expected, outcome) {
        (Expected::Value(expected), Ok(node)) => {
            let actual = SerializedValue::of(session.store(), &example.program, node).to_string();
            if actual != *expected {
                bail!("expected {expected}, got {actual}");
            }
        }
        (Expected::Value(expected), Err(err)) => bail!("expected {expected}, failed with {err}"),
        (Expected::Error(fragment), Ok(node)) => {
            let actual = SerializedValue::of(session.store(), &example.program, node);
            bail!("expected an error mentioning `{fragment}`, got {actual}");
        }
        (Expected::Error(fragment), Err(err)) => {
            if !err.to_string().contains(fragment) {
                bail!("expected an error mentioning `{fragment}`, got {err}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_global_config_after_the_command() {
        let cli = Cli::try_parse_from([
            "sliver",
            "forward",
            "let_arithmetic",
            "--literal",
            "3",
            "--config",
            "x.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(
            cli.command,
            Commands::Forward { ref literals, .. } if literals == &["3"]
        ));
    }

    #[test]
    fn forward_requires_a_literal() {
        assert!(Cli::try_parse_from(["sliver", "forward", "let_arithmetic"]).is_err());
    }

    #[test]
    fn literals_are_found_by_source_text() {
        let example = load_example("let_arithmetic").unwrap();
        let found = literal_exprs(&example, &["3".to_string()]).unwrap();
        assert_eq!(found.len(), 1);
        assert!(literal_exprs(&example, &["99".to_string()]).is_err());
    }

    #[test]
    fn every_bundled_example_checks_out() {
        for (name, _) in programs::ALL {
            check_example(name, &EvalConfig::default()).unwrap();
        }
    }
}
