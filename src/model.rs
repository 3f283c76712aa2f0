use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::syntax::{AstNode, NodeType};
use crate::{parse_formula, ConvertError};

/// A function defined by the model: formal argument names plus a body.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
  id: String,
  arguments: Vec<String>,
  math: AstNode,
}

impl FunctionDefinition {
  pub fn new(
    id: impl Into<String>,
    arguments: Vec<String>,
    math: AstNode,
  ) -> Self {
    FunctionDefinition {
      id: id.into(),
      arguments,
      math,
    }
  }

  /// Build a definition from `lambda(x, y, body)`; the formal arguments are
  /// the leading name children. Anything other than a lambda becomes a
  /// zero-argument function wrapping `math`.
  pub fn from_lambda(id: impl Into<String>, math: AstNode) -> Self {
    if math.node_type() != NodeType::Lambda {
      return Self::new(id, vec![], AstNode::lambda(&[], math));
    }

    let params = math.num_children().saturating_sub(1);
    let arguments = math.children()[..params]
      .iter()
      .filter_map(|p| p.get_name().map(str::to_string))
      .collect();
    Self::new(id, arguments, math)
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn num_arguments(&self) -> usize {
    self.arguments.len()
  }

  pub fn argument(&self, index: usize) -> Option<&str> {
    self.arguments.get(index).map(String::as_str)
  }

  pub fn arguments(&self) -> &[String] {
    &self.arguments
  }

  /// The stored math, usually a lambda whose last child is the body.
  pub fn body(&self) -> &AstNode {
    &self.math
  }
}

/// Resolves user-defined functions by id.
pub trait ModelLookup {
  fn function_definition(&self, id: &str) -> Option<&FunctionDefinition>;
}

impl ModelLookup for HashMap<String, FunctionDefinition> {
  fn function_definition(&self, id: &str) -> Option<&FunctionDefinition> {
    self.get(id)
  }
}

/// The parts of a model the converter reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
  pub id: String,
  functions: HashMap<String, FunctionDefinition>,
}

#[derive(Deserialize)]
struct ModelFile {
  #[serde(default)]
  id: String,
  #[serde(default)]
  functions: HashMap<String, String>,
}

impl Model {
  pub fn new(id: impl Into<String>) -> Self {
    Model {
      id: id.into(),
      functions: HashMap::new(),
    }
  }

  /// Add or replace a function definition, keyed by its id.
  pub fn add_function(&mut self, definition: FunctionDefinition) {
    self.functions.insert(definition.id.clone(), definition);
  }

  pub fn functions(&self) -> impl Iterator<Item = &FunctionDefinition> {
    self.functions.values()
  }

  /// Read a model of the form
  /// `{"id": "m", "functions": {"f": "lambda(x, x^2)"}}`.
  pub fn from_json(source: &str) -> Result<Self, ConvertError> {
    let file: ModelFile = serde_json::from_str(source)?;
    let mut model = Model::new(file.id);

    for (id, formula) in file.functions {
      let math = parse_formula(&formula).map_err(|e| {
        ConvertError::Model(format!("function '{id}': {e}"))
      })?;
      model.add_function(FunctionDefinition::from_lambda(id, math));
    }

    Ok(model)
  }

  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConvertError> {
    let source = std::fs::read_to_string(path)?;
    Self::from_json(&source)
  }
}

impl ModelLookup for Model {
  fn function_definition(&self, id: &str) -> Option<&FunctionDefinition> {
    self.functions.get(id)
  }
}
