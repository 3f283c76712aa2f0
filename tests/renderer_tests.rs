use serde_json::json;

use sbml_astconv::renderer::{Dialect, InfixRenderer, JsonRenderer};
use sbml_astconv::{parse_formula, AstConverter, AstNode, UNSUPPORTED};

fn c(formula: &str) -> String {
  render(InfixRenderer::c(), formula)
}

fn fortran(formula: &str) -> String {
  render(InfixRenderer::fortran(), formula)
}

fn render(renderer: InfixRenderer, formula: &str) -> String {
  let tree = parse_formula(formula).unwrap();
  AstConverter::new(renderer)
    .convert(&tree)
    .unwrap_or_else(|| panic!("no output for {formula}"))
}

fn json_of(formula: &str) -> serde_json::Value {
  let tree = parse_formula(formula).unwrap();
  AstConverter::new(JsonRenderer).convert(&tree).unwrap()
}

mod infix {
  use super::*;

  #[test]
  fn rate_law() {
    insta::assert_snapshot!(c("k1 * S / (Km + S)"), @"((k1*S)/(Km+S))");
    insta::assert_snapshot!(fortran("k1 * S / (Km + S)"), @"((k1*S)/(Km+S))");
  }

  #[test]
  fn powers_follow_the_dialect() {
    insta::assert_snapshot!(c("S^2 + exp(-time)"), @"(pow(S,2)+exp((-t)))");
    insta::assert_snapshot!(fortran("S^2 + exp(-time)"), @"((S**2)+exp((-t)))");
    assert_eq!(c("pow(S, 2)"), c("S^2"));
    assert_eq!(fortran("pow(S, 2)"), fortran("S^2"));
  }

  #[test]
  fn integer_division_stays_real() {
    insta::assert_snapshot!(c("1/2*k"), @"((1.0/2.0)*k)");
    insta::assert_snapshot!(fortran("1/2*k"), @"((1d0/2d0)*k)");
    assert_eq!(c("k / 4"), "(k/4.0)");
    assert_eq!(fortran("(n + 1) / m"), "((n+1)/m)");
  }

  #[test]
  fn constants() {
    assert_eq!(c("2 * pi"), "(2*M_PI)");
    assert_eq!(fortran("2 * pi"), "(2*(4.0d0*atan(1.0d0)))");
    assert_eq!(c("exponentiale"), "M_E");
    assert_eq!(fortran("exponentiale"), "exp(1.0d0)");
    assert_eq!(c("true"), "1");
    assert_eq!(c("false"), "0");
    assert_eq!(fortran("true"), ".true.");
    assert_eq!(fortran("false"), ".false.");
  }

  #[test]
  fn logarithms() {
    assert_eq!(c("ln(x)"), "log(x)");
    assert_eq!(c("log(x)"), "log10(x)");
    assert_eq!(c("log(2, x)"), "(log(x)/log(2))");
  }

  #[test]
  fn function_names_follow_the_dialect() {
    assert_eq!(c("abs(x) + ceil(x) + floor(x)"), "(fabs(x)+ceil(x)+floor(x))");
    assert_eq!(
      fortran("abs(x) + ceil(x) + floor(x)"),
      "(abs(x)+ceiling(x)+floor(x))"
    );
    assert_eq!(c("sin(x) * cos(x)"), "(sin(x)*cos(x))");
  }

  #[test]
  fn negation_and_subtraction() {
    assert_eq!(c("-a"), "(-a)");
    assert_eq!(c("a - b - c"), "((a-b)-c)");
  }

  #[test]
  fn reals() {
    assert_eq!(c("1.5"), "1.5");
    assert_eq!(fortran("1.5"), "1.5d0");
    assert_eq!(c("1e-3"), "0.001");
    assert_eq!(c("2.0"), "2.0");
    assert_eq!(fortran("2.0"), "2d0");

    let quarter = AstNode::rational(1, 4);
    assert_eq!(
      AstConverter::new(InfixRenderer::c()).convert(&quarter),
      Some("0.25".to_string())
    );
  }

  #[test]
  fn time_token_is_configurable() {
    let renderer = InfixRenderer::new(Dialect::C).with_time_token("T");
    assert_eq!(renderer.dialect(), Dialect::C);
    assert_eq!(render(renderer, "k * time"), "(k*T)");
  }

  #[test]
  fn unsupported_marker_is_embedded() {
    assert_eq!(c("2 * tan(x)"), format!("(2*{UNSUPPORTED})"));
  }
}

mod structured {
  use super::*;

  #[test]
  fn sine_of_real() {
    assert_eq!(
      json_of("sin(1.5)"),
      json!({ "op": "sin", "args": [{ "num": 1.5 }] })
    );
  }

  #[test]
  fn names_constants_and_time() {
    assert_eq!(
      json_of("k * time + pi"),
      json!({
        "op": "plus",
        "args": [
          { "op": "times", "args": [{ "name": "k" }, { "time": "time" }] },
          { "const": "pi" }
        ]
      })
    );
    assert_eq!(json_of("true"), json!({ "const": true }));
  }

  #[test]
  fn power_spellings_are_identical() {
    assert_eq!(json_of("x^3"), json_of("pow(x, 3)"));
    assert_eq!(
      json_of("x^3"),
      json!({ "op": "power", "args": [{ "name": "x" }, { "num": 3 }] })
    );
  }

  #[test]
  fn unsupported_becomes_a_string() {
    assert_eq!(json_of("sqrt(x)"), json!("unsupported"));
  }

  #[test]
  fn absent_children_are_null() {
    // f cannot be resolved without a model
    assert_eq!(
      json_of("1 + f(x)"),
      json!({ "op": "plus", "args": [{ "num": 1 }, null] })
    );
  }
}
