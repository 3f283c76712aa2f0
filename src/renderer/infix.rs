use crate::converter::Scope;
use crate::renderer::AstRenderer;
use crate::syntax::AstNode;

/// Source language written by [`InfixRenderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
  #[default]
  C,
  Fortran,
}

/// Renders math as a fully parenthesised infix string.
#[derive(Debug, Clone)]
pub struct InfixRenderer {
  dialect: Dialect,
  time_token: String,
}

impl Default for InfixRenderer {
  fn default() -> Self {
    Self::new(Dialect::C)
  }
}

impl InfixRenderer {
  pub fn new(dialect: Dialect) -> Self {
    InfixRenderer {
      dialect,
      time_token: "t".to_string(),
    }
  }

  pub fn c() -> Self {
    Self::new(Dialect::C)
  }

  pub fn fortran() -> Self {
    Self::new(Dialect::Fortran)
  }

  /// Token used for the simulation time variable (default `t`).
  pub fn with_time_token(mut self, token: impl Into<String>) -> Self {
    self.time_token = token.into();
    self
  }

  pub fn dialect(&self) -> Dialect {
    self.dialect
  }

  fn args(&self, node: &AstNode, scope: &Scope<'_, Self>) -> Vec<String> {
    scope
      .convert_children(node)
      .into_iter()
      .map(Option::unwrap_or_default)
      .collect()
  }

  fn call(&self, func: &str, node: &AstNode, scope: &Scope<'_, Self>) -> String {
    format!("{}({})", func, self.args(node, scope).join(","))
  }

  /// `(a op b op ...)`; a lone operand is left bare and no operands give
  /// `identity`.
  fn chain(
    &self,
    op: &str,
    identity: &str,
    node: &AstNode,
    scope: &Scope<'_, Self>,
  ) -> String {
    let args = self.args(node, scope);
    match args.len() {
      0 => identity.to_string(),
      1 => args.into_iter().next().unwrap_or_default(),
      _ => format!("({})", args.join(op)),
    }
  }

  fn pick(&self, c: &'static str, fortran: &'static str) -> &'static str {
    match self.dialect {
      Dialect::C => c,
      Dialect::Fortran => fortran,
    }
  }
}

impl AstRenderer for InfixRenderer {
  type Output = String;

  fn handle_const_e(&self, _: &AstNode, _: &Scope<'_, Self>) -> String {
    self.pick("M_E", "exp(1.0d0)").to_string()
  }

  fn handle_const_pi(&self, _: &AstNode, _: &Scope<'_, Self>) -> String {
    self.pick("M_PI", "(4.0d0*atan(1.0d0))").to_string()
  }

  fn handle_const_true(&self, _: &AstNode, _: &Scope<'_, Self>) -> String {
    self.pick("1", ".true.").to_string()
  }

  fn handle_const_false(&self, _: &AstNode, _: &Scope<'_, Self>) -> String {
    self.pick("0", ".false.").to_string()
  }

  fn handle_int(&self, node: &AstNode, _: &Scope<'_, Self>) -> String {
    match node.integer_value() {
      Some(i) if i < 0 => format!("({i})"),
      Some(i) => i.to_string(),
      None => format_real(node.real_value().unwrap_or_default(), self.dialect),
    }
  }

  fn handle_real(&self, node: &AstNode, _: &Scope<'_, Self>) -> String {
    format_real(node.real_value().unwrap_or_default(), self.dialect)
  }

  fn handle_ode_time(&self, _: &AstNode, _: &Scope<'_, Self>) -> String {
    self.time_token.clone()
  }

  fn handle_string(&self, node: &AstNode, _: &Scope<'_, Self>) -> String {
    node.get_name().unwrap_or_default().to_string()
  }

  fn handle_plus(&self, node: &AstNode, scope: &Scope<'_, Self>) -> String {
    self.chain("+", "0", node, scope)
  }

  fn handle_minus(&self, node: &AstNode, scope: &Scope<'_, Self>) -> String {
    let args = self.args(node, scope);
    match args.as_slice() {
      [operand] => format!("(-{operand})"),
      _ => format!("({})", args.join("-")),
    }
  }

  fn handle_times(&self, node: &AstNode, scope: &Scope<'_, Self>) -> String {
    self.chain("*", "1", node, scope)
  }

  /// Integer operands are written as reals so the quotient is never
  /// truncated by the target's integer division.
  fn handle_divide(&self, node: &AstNode, scope: &Scope<'_, Self>) -> String {
    let operands: Vec<String> = node
      .children()
      .iter()
      .map(|child| match child.integer_value() {
        Some(i) if child.is_integer() => format_real(i as f64, self.dialect),
        _ => scope.convert(child).unwrap_or_default(),
      })
      .collect();
    format!("({})", operands.join("/"))
  }

  fn handle_power(&self, node: &AstNode, scope: &Scope<'_, Self>) -> String {
    match self.dialect {
      Dialect::C => self.call("pow", node, scope),
      Dialect::Fortran => format!("({})", self.args(node, scope).join("**")),
    }
  }

  fn handle_ln(&self, node: &AstNode, scope: &Scope<'_, Self>) -> String {
    self.call("log", node, scope)
  }

  fn handle_log(&self, node: &AstNode, scope: &Scope<'_, Self>) -> String {
    let args = self.args(node, scope);
    match args.as_slice() {
      [base, x] => format!("(log({x})/log({base}))"),
      _ => format!("log10({})", args.join(",")),
    }
  }

  fn handle_exp(&self, node: &AstNode, scope: &Scope<'_, Self>) -> String {
    self.call("exp", node, scope)
  }

  fn handle_abs(&self, node: &AstNode, scope: &Scope<'_, Self>) -> String {
    self.call(self.pick("fabs", "abs"), node, scope)
  }

  fn handle_ceiling(&self, node: &AstNode, scope: &Scope<'_, Self>) -> String {
    self.call(self.pick("ceil", "ceiling"), node, scope)
  }

  fn handle_floor(&self, node: &AstNode, scope: &Scope<'_, Self>) -> String {
    self.call("floor", node, scope)
  }

  fn handle_sin(&self, node: &AstNode, scope: &Scope<'_, Self>) -> String {
    self.call("sin", node, scope)
  }

  fn handle_cos(&self, node: &AstNode, scope: &Scope<'_, Self>) -> String {
    self.call("cos", node, scope)
  }
}

/// Write a real so the target reads it back as a floating point literal.
fn format_real(value: f64, dialect: Dialect) -> String {
  if value.is_nan() {
    return match dialect {
      Dialect::C => "NAN".to_string(),
      Dialect::Fortran => "ieee_value(0.0d0,ieee_quiet_nan)".to_string(),
    };
  }
  if value.is_infinite() {
    let inf = match dialect {
      Dialect::C => "INFINITY",
      Dialect::Fortran => "huge(1.0d0)",
    };
    return if value > 0.0 {
      inf.to_string()
    } else {
      format!("(-{inf})")
    };
  }

  // f64's Display never switches to exponent notation
  let digits = value.to_string();
  let literal = match dialect {
    Dialect::C if digits.contains('.') => digits,
    Dialect::C => format!("{digits}.0"),
    Dialect::Fortran => format!("{digits}d0"),
  };

  if value.is_sign_negative() {
    format!("({literal})")
  } else {
    literal
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn c_reals_always_carry_a_decimal_point() {
    assert_eq!(format_real(1.5, Dialect::C), "1.5");
    assert_eq!(format_real(1500.0, Dialect::C), "1500.0");
    assert_eq!(format_real(0.001, Dialect::C), "0.001");
  }

  #[test]
  fn fortran_reals_are_double_precision() {
    assert_eq!(format_real(1.5, Dialect::Fortran), "1.5d0");
    assert_eq!(format_real(2.0, Dialect::Fortran), "2d0");
  }

  #[test]
  fn negative_whole_reals() {
    assert_eq!(format_real(-3.0, Dialect::C), "(-3.0)");
    assert_eq!(format_real(-3.0, Dialect::Fortran), "(-3d0)");
  }

  #[test]
  fn negative_and_non_finite_reals() {
    assert_eq!(format_real(-0.5, Dialect::C), "(-0.5)");
    assert_eq!(format_real(f64::INFINITY, Dialect::C), "INFINITY");
    assert_eq!(format_real(f64::NEG_INFINITY, Dialect::C), "(-INFINITY)");
    assert_eq!(format_real(f64::NAN, Dialect::C), "NAN");
  }
}
