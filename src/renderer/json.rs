use serde_json::{json, Value};

use crate::converter::Scope;
use crate::renderer::{AstRenderer, Unsupported, UNSUPPORTED};
use crate::syntax::AstNode;

/// Renders math as a structured JSON tree, one object per node.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl From<Unsupported> for Value {
  fn from(_: Unsupported) -> Self {
    Value::String(UNSUPPORTED.to_string())
  }
}

impl JsonRenderer {
  fn op(&self, op: &str, node: &AstNode, scope: &Scope<'_, Self>) -> Value {
    let args: Vec<Value> = scope
      .convert_children(node)
      .into_iter()
      .map(|arg| arg.unwrap_or(Value::Null))
      .collect();
    json!({ "op": op, "args": args })
  }
}

impl AstRenderer for JsonRenderer {
  type Output = Value;

  fn handle_const_e(&self, _: &AstNode, _: &Scope<'_, Self>) -> Value {
    json!({ "const": "e" })
  }

  fn handle_const_pi(&self, _: &AstNode, _: &Scope<'_, Self>) -> Value {
    json!({ "const": "pi" })
  }

  fn handle_const_true(&self, _: &AstNode, _: &Scope<'_, Self>) -> Value {
    json!({ "const": true })
  }

  fn handle_const_false(&self, _: &AstNode, _: &Scope<'_, Self>) -> Value {
    json!({ "const": false })
  }

  fn handle_int(&self, node: &AstNode, _: &Scope<'_, Self>) -> Value {
    match node.integer_value() {
      Some(i) => json!({ "num": i }),
      None => json!({ "num": node.real_value() }),
    }
  }

  fn handle_real(&self, node: &AstNode, _: &Scope<'_, Self>) -> Value {
    // non-finite values have no JSON number and come out as null
    json!({ "num": node.real_value() })
  }

  fn handle_ode_time(&self, node: &AstNode, _: &Scope<'_, Self>) -> Value {
    json!({ "time": node.get_name().unwrap_or("time") })
  }

  fn handle_string(&self, node: &AstNode, _: &Scope<'_, Self>) -> Value {
    json!({ "name": node.get_name() })
  }

  fn handle_plus(&self, node: &AstNode, scope: &Scope<'_, Self>) -> Value {
    self.op("plus", node, scope)
  }

  fn handle_minus(&self, node: &AstNode, scope: &Scope<'_, Self>) -> Value {
    self.op("minus", node, scope)
  }

  fn handle_times(&self, node: &AstNode, scope: &Scope<'_, Self>) -> Value {
    self.op("times", node, scope)
  }

  fn handle_divide(&self, node: &AstNode, scope: &Scope<'_, Self>) -> Value {
    self.op("divide", node, scope)
  }

  fn handle_power(&self, node: &AstNode, scope: &Scope<'_, Self>) -> Value {
    self.op("power", node, scope)
  }

  fn handle_ln(&self, node: &AstNode, scope: &Scope<'_, Self>) -> Value {
    self.op("ln", node, scope)
  }

  fn handle_log(&self, node: &AstNode, scope: &Scope<'_, Self>) -> Value {
    self.op("log", node, scope)
  }

  fn handle_exp(&self, node: &AstNode, scope: &Scope<'_, Self>) -> Value {
    self.op("exp", node, scope)
  }

  fn handle_abs(&self, node: &AstNode, scope: &Scope<'_, Self>) -> Value {
    self.op("abs", node, scope)
  }

  fn handle_ceiling(&self, node: &AstNode, scope: &Scope<'_, Self>) -> Value {
    self.op("ceiling", node, scope)
  }

  fn handle_floor(&self, node: &AstNode, scope: &Scope<'_, Self>) -> Value {
    self.op("floor", node, scope)
  }

  fn handle_sin(&self, node: &AstNode, scope: &Scope<'_, Self>) -> Value {
    self.op("sin", node, scope)
  }

  fn handle_cos(&self, node: &AstNode, scope: &Scope<'_, Self>) -> Value {
    self.op("cos", node, scope)
  }
}
