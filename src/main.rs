use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sbml_astconv::renderer::{InfixRenderer, JsonRenderer};
use sbml_astconv::{parse_formula, AstConverter, AstNode, AstRenderer, Model};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Log at debug level (RUST_LOG takes precedence)
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Target {
  C,
  Fortran,
  Json,
}

#[derive(Subcommand)]
enum Commands {
  /// Convert an infix SBML formula into the target representation
  Render {
    /// The formula, e.g. "k1 * S / (Km + S)"
    formula: String,

    #[arg(short, long, value_enum, default_value_t = Target::C)]
    target: Target,

    /// JSON model providing user-defined functions
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Replace identifier NAME with VALUE, may be repeated
    #[arg(
      short,
      long = "subst",
      value_name = "NAME=VALUE",
      value_parser = parse_substitution
    )]
    substitutions: Vec<(String, String)>,

    /// Token written for the simulation time variable
    #[arg(long, default_value = "t")]
    time_token: String,

    /// Fail instead of emitting a partially usable result
    #[arg(long)]
    strict: bool,
  },
  /// Print the parsed expression tree
  Parse {
    /// The formula to parse
    formula: String,
  },
}

fn parse_substitution(arg: &str) -> Result<(String, String), String> {
  match arg.split_once('=') {
    Some((name, value)) if !name.is_empty() => {
      Ok((name.to_string(), value.to_string()))
    }
    _ => Err(format!("expected NAME=VALUE, got '{arg}'")),
  }
}

fn convert<R: AstRenderer>(
  renderer: R,
  tree: &AstNode,
  model: Option<&Model>,
  substitutions: HashMap<String, R::Output>,
  strict: bool,
) -> Result<Option<R::Output>> {
  let mut converter =
    AstConverter::new(renderer).with_substitutions(substitutions);
  if let Some(model) = model {
    converter = converter.with_model(model);
  }

  if strict {
    Ok(Some(converter.try_convert(tree)?))
  } else {
    Ok(converter.convert(tree))
  }
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_filter = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter)),
    )
    .with_writer(std::io::stderr)
    .init();

  match cli.command {
    Commands::Parse { formula } => {
      let tree = parse_formula(&formula)?;
      println!("{tree:#?}");
    }
    Commands::Render {
      formula,
      target,
      model,
      substitutions,
      time_token,
      strict,
    } => {
      let tree = parse_formula(&formula)
        .with_context(|| format!("Failed to parse '{formula}'"))?;
      let model = model
        .map(|path| {
          Model::load(&path)
            .with_context(|| format!("Failed to load model {}", path.display()))
        })
        .transpose()?;
      tracing::debug!("Rendering {:?}", tree);

      let rendered = match target {
        Target::C | Target::Fortran => {
          let renderer = match target {
            Target::Fortran => InfixRenderer::fortran(),
            _ => InfixRenderer::c(),
          }
          .with_time_token(time_token);
          convert(
            renderer,
            &tree,
            model.as_ref(),
            substitutions.into_iter().collect(),
            strict,
          )?
        }
        Target::Json => {
          let substitutions = substitutions
            .into_iter()
            .map(|(name, value)| (name, serde_json::Value::String(value)))
            .collect();
          convert(JsonRenderer, &tree, model.as_ref(), substitutions, strict)?
            .map(|value| serde_json::to_string_pretty(&value))
            .transpose()?
        }
      };

      match rendered {
        Some(text) => println!("{text}"),
        None => eprintln!("(no output)"),
      }
    }
  }

  Ok(())
}
