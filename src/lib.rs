use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

pub mod converter;
pub mod model;
pub mod renderer;
pub mod syntax;

pub use converter::{AstConverter, Report, Scope};
pub use model::{FunctionDefinition, Model, ModelLookup};
pub use renderer::{AstRenderer, Unsupported, UNSUPPORTED};
pub use syntax::{AstNode, NodeType, Number};

#[derive(Parser)]
#[grammar = "formula.pest"]
pub struct FormulaParser;

#[derive(Error, Debug)]
pub enum ConvertError {
  #[error("Parse error: {0}")]
  Parse(#[from] Box<pest::error::Error<Rule>>),
  #[error("Empty input")]
  EmptyInput,
  #[error("Malformed formula: {0}")]
  Syntax(String),
  #[error("Invalid model: {0}")]
  Model(String),
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
  #[error("Unsupported math node(s): {}", .0.join(", "))]
  Unsupported(Vec<String>),
  #[error("Function call '{0}' needs a model to resolve it")]
  MissingModel(String),
  #[error("Unknown function definition '{0}'")]
  UnknownFunction(String),
  #[error("Recursive function call {0}")]
  RecursiveCall(String),
  #[error("Conversion produced no output")]
  NoOutput,
}

impl FormulaParser {
  pub fn parse_formula(
    input: &str,
  ) -> Result<pest::iterators::Pairs<'_, Rule>, Box<pest::error::Error<Rule>>>
  {
    Self::parse(Rule::Formula, input).map_err(Box::new)
  }
}

pub fn parse(
  input: &str,
) -> Result<pest::iterators::Pairs<'_, Rule>, Box<pest::error::Error<Rule>>> {
  FormulaParser::parse_formula(input)
}

/// Parses an infix formula such as `k1 * S / (Km + S)` into an expression tree.
pub fn parse_formula(input: &str) -> Result<AstNode, ConvertError> {
  if input.trim().is_empty() {
    return Err(ConvertError::EmptyInput);
  }

  let mut pairs = parse(input)?;
  let formula = pairs.next().ok_or(ConvertError::EmptyInput)?;

  if formula.as_rule() != Rule::Formula {
    return Err(ConvertError::Syntax(format!(
      "Expected Formula, got {:?}",
      formula.as_rule()
    )));
  }

  let expression = formula
    .into_inner()
    .find(|pair| pair.as_rule() == Rule::Expression)
    .ok_or(ConvertError::EmptyInput)?;

  syntax::pair_to_node(expression)
}
