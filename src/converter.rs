use std::cell::RefCell;
use std::collections::HashMap;

use tracing::{debug, error, warn};

use crate::model::ModelLookup;
use crate::renderer::{AstRenderer, Unsupported};
use crate::syntax::{AstNode, NodeType};
use crate::ConvertError;

/// Formal argument name -> already rendered actual argument.
type Bindings<T> = HashMap<String, Option<T>>;

/// Walks an expression tree and hands every node to a renderer.
///
/// The model is needed to resolve calls to functions defined in the model
/// itself; without it those calls render as `None`. Substitutions replace
/// named identifiers with precomputed output and bypass the renderer.
pub struct AstConverter<'m, R: AstRenderer> {
  renderer: R,
  model: Option<&'m dyn ModelLookup>,
  substitutions: Option<HashMap<String, R::Output>>,
}

/// Problems met during one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
  /// Tags (with their source label, if any) that no handler accepted
  pub unsupported: Vec<String>,
  /// User function calls met while no model was attached
  pub missing_model: Vec<String>,
  /// Function ids the model could not resolve
  pub unknown_functions: Vec<String>,
  /// Call chains that reentered a function already being expanded
  pub recursive_calls: Vec<String>,
}

impl Report {
  pub fn is_clean(&self) -> bool {
    self.unsupported.is_empty()
      && self.missing_model.is_empty()
      && self.unknown_functions.is_empty()
      && self.recursive_calls.is_empty()
  }
}

impl<'m, R: AstRenderer> AstConverter<'m, R> {
  pub fn new(renderer: R) -> Self {
    AstConverter {
      renderer,
      model: None,
      substitutions: None,
    }
  }

  pub fn with_model(mut self, model: &'m dyn ModelLookup) -> Self {
    self.model = Some(model);
    self
  }

  pub fn with_substitutions(
    mut self,
    substitutions: HashMap<String, R::Output>,
  ) -> Self {
    self.substitutions = Some(substitutions);
    self
  }

  pub fn renderer(&self) -> &R {
    &self.renderer
  }

  pub fn substitutions(&self) -> Option<&HashMap<String, R::Output>> {
    self.substitutions.as_ref()
  }

  /// Convert `node` and everything below it.
  ///
  /// `None` in gives `None` out. A user function call that cannot be
  /// resolved also yields `None` (and a log line); a node kind with no
  /// handler yields the renderer's [`Unsupported`] marker.
  pub fn convert<'n>(
    &self,
    node: impl Into<Option<&'n AstNode>>,
  ) -> Option<R::Output> {
    self.root_scope(None).dispatch(node.into())
  }

  /// Like [`convert`](Self::convert), but also returns what went wrong.
  pub fn convert_with_report(
    &self,
    node: &AstNode,
  ) -> (Option<R::Output>, Report) {
    let report = RefCell::new(Report::default());
    let output = self.root_scope(Some(&report)).dispatch(Some(node));
    (output, report.into_inner())
  }

  /// Convert `node`, failing if any part of the tree could not be rendered.
  pub fn try_convert(&self, node: &AstNode) -> Result<R::Output, ConvertError> {
    let (output, report) = self.convert_with_report(node);

    if !report.unsupported.is_empty() {
      return Err(ConvertError::Unsupported(report.unsupported));
    }
    if let Some(name) = report.missing_model.into_iter().next() {
      return Err(ConvertError::MissingModel(name));
    }
    if let Some(id) = report.unknown_functions.into_iter().next() {
      return Err(ConvertError::UnknownFunction(id));
    }
    if let Some(chain) = report.recursive_calls.into_iter().next() {
      return Err(ConvertError::RecursiveCall(chain));
    }

    output.ok_or(ConvertError::NoOutput)
  }

  fn root_scope<'a>(
    &'a self,
    report: Option<&'a RefCell<Report>>,
  ) -> Scope<'a, R> {
    Scope {
      renderer: &self.renderer,
      model: self.model,
      substitutions: self.substitutions.as_ref(),
      bindings: None,
      active: None,
      report,
    }
  }
}

/// One user function being expanded, linked to the call that contains it.
struct CallFrame<'a> {
  id: &'a str,
  parent: Option<&'a CallFrame<'a>>,
}

impl<'a> CallFrame<'a> {
  fn ids(&self) -> impl Iterator<Item = &'a str> + '_ {
    std::iter::successors(Some(self), |frame| frame.parent).map(|f| f.id)
  }
}

/// The context a renderer handler recurses through.
///
/// Inside a user function body the scope carries the bound arguments of
/// that call; everywhere else it carries none.
pub struct Scope<'a, R: AstRenderer> {
  renderer: &'a R,
  model: Option<&'a dyn ModelLookup>,
  substitutions: Option<&'a HashMap<String, R::Output>>,
  bindings: Option<&'a Bindings<R::Output>>,
  active: Option<&'a CallFrame<'a>>,
  report: Option<&'a RefCell<Report>>,
}

impl<R: AstRenderer> Clone for Scope<'_, R> {
  fn clone(&self) -> Self {
    *self
  }
}

impl<R: AstRenderer> Copy for Scope<'_, R> {}

impl<'a, R: AstRenderer> Scope<'a, R> {
  pub fn convert(&self, node: &AstNode) -> Option<R::Output> {
    self.dispatch(Some(node))
  }

  /// Convert every child of `node`, keeping absent results in place.
  pub fn convert_children(&self, node: &AstNode) -> Vec<Option<R::Output>> {
    node.children().iter().map(|c| self.convert(c)).collect()
  }

  /// Convert every child of `node`; `None` if any of them converts to `None`.
  pub fn convert_all(&self, node: &AstNode) -> Option<Vec<R::Output>> {
    node.children().iter().map(|c| self.convert(c)).collect()
  }

  fn dispatch(&self, node: Option<&AstNode>) -> Option<R::Output> {
    let node = node?;
    let r = self.renderer;

    let output = match node.node_type() {
      NodeType::ConstE => r.handle_const_e(node, self),
      NodeType::ConstPi => r.handle_const_pi(node, self),
      NodeType::ConstTrue => r.handle_const_true(node, self),
      NodeType::ConstFalse => r.handle_const_false(node, self),
      NodeType::Integer => r.handle_int(node, self),
      // numeric classification wins over every nominal tag below
      _ if node.is_real() => r.handle_real(node, self),
      NodeType::TimeVariable => r.handle_ode_time(node, self),
      NodeType::Name => return self.resolve_name(node),
      NodeType::Plus => r.handle_plus(node, self),
      NodeType::Minus => r.handle_minus(node, self),
      NodeType::Times => r.handle_times(node, self),
      NodeType::Divide => r.handle_divide(node, self),
      NodeType::Power | NodeType::FunctionPower => r.handle_power(node, self),
      NodeType::Ln => r.handle_ln(node, self),
      NodeType::Log => r.handle_log(node, self),
      NodeType::Exp => r.handle_exp(node, self),
      NodeType::Abs => r.handle_abs(node, self),
      NodeType::Ceiling => r.handle_ceiling(node, self),
      NodeType::Floor => r.handle_floor(node, self),
      NodeType::Sin => r.handle_sin(node, self),
      NodeType::Cos => r.handle_cos(node, self),
      NodeType::Function => return self.call_user_function(node),
      // the last child is the body; parameter declarations are skipped
      NodeType::Lambda => return self.dispatch(node.right_child()),
      // real kinds never get here, is_real() caught them
      NodeType::Real
      | NodeType::RealE
      | NodeType::Rational
      | NodeType::Unsupported => self.unsupported(node),
    };

    Some(output)
  }

  fn resolve_name(&self, node: &AstNode) -> Option<R::Output> {
    let id = node.get_name().unwrap_or_default();

    if let Some(bound) = self.bindings.and_then(|b| b.get(id)) {
      return bound.clone();
    }
    if let Some(value) = self.substitutions.and_then(|s| s.get(id)) {
      return Some(value.clone());
    }

    Some(self.renderer.handle_string(node, self))
  }

  /// Render a call to a function defined in the model.
  ///
  /// Actual arguments are rendered in the caller's scope first, then the
  /// function body is rendered in a fresh scope binding each formal
  /// argument to its rendered value. The definition itself is never
  /// touched, so repeated calls with different arguments do not interfere.
  /// A call that reenters a function whose body is still being rendered
  /// yields `None`.
  fn call_user_function(&self, node: &AstNode) -> Option<R::Output> {
    let id = node.get_name().unwrap_or_default();

    let Some(model) = self.model else {
      debug!(
        "Can't handle user function call '{}' without a reference to the model",
        id
      );
      self.record(|report| report.missing_model.push(id.to_string()));
      return None;
    };

    let Some(definition) = model.function_definition(id) else {
      error!("No function definition '{}' in the model", id);
      self.record(|report| report.unknown_functions.push(id.to_string()));
      return None;
    };

    let reentered = self.active.filter(|a| a.ids().any(|caller| caller == id));
    if let Some(active) = reentered {
      let mut chain: Vec<&str> = active.ids().collect();
      chain.reverse();
      chain.push(id);
      let chain = chain.join(" -> ");
      error!("Recursive function call {} can't be expanded inline", chain);
      self.record(|report| report.recursive_calls.push(chain));
      return None;
    }

    let arity = definition.num_arguments();
    if node.num_children() < arity {
      warn!(
        "Call to '{}' has {} argument(s), the definition expects {}",
        id,
        node.num_children(),
        arity
      );
    } else if node.num_children() > arity {
      debug!(
        "Ignoring {} extra argument(s) in call to '{}'",
        node.num_children() - arity,
        id
      );
    }

    let mut bindings: Bindings<R::Output> = HashMap::with_capacity(arity);
    for (i, formal) in definition.arguments().iter().enumerate() {
      let value = self.dispatch(node.child(i));
      bindings.insert(formal.clone(), value);
    }

    let call = CallFrame {
      id,
      parent: self.active,
    };
    let frame = Scope {
      renderer: self.renderer,
      model: self.model,
      substitutions: self.substitutions,
      bindings: Some(&bindings),
      active: Some(&call),
      report: self.report,
    };
    frame.dispatch(Some(definition.body()))
  }

  fn unsupported(&self, node: &AstNode) -> R::Output {
    let label = match node.get_name() {
      Some(name) => format!("{} ({})", node.node_type(), name),
      None => node.node_type().to_string(),
    };
    error!(
      "Couldn't handle math node of type {}. The resulting expression will not be usable!",
      label
    );
    self.record(|report| report.unsupported.push(label));
    R::Output::from(Unsupported)
  }

  fn record(&self, update: impl FnOnce(&mut Report)) {
    if let Some(report) = self.report {
      update(&mut report.borrow_mut());
    }
  }
}
