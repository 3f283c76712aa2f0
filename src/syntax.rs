use pest::iterators::Pair;

use crate::{ConvertError, Rule};

/// Discriminant of an expression node.
///
/// `Power` and `FunctionPower` are two spellings of the same operator
/// (`a^b` and `pow(a, b)`); renderers see both through one handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
  ConstE,
  ConstPi,
  ConstTrue,
  ConstFalse,
  Integer,
  Real,
  RealE,
  Rational,
  TimeVariable,
  Name,
  Plus,
  Minus,
  Times,
  Divide,
  Power,
  FunctionPower,
  Ln,
  Log,
  Exp,
  Abs,
  Ceiling,
  Floor,
  Sin,
  Cos,
  Function,
  Lambda,
  Unsupported,
}

impl NodeType {
  pub fn label(self) -> &'static str {
    match self {
      NodeType::ConstE => "const_e",
      NodeType::ConstPi => "const_pi",
      NodeType::ConstTrue => "const_true",
      NodeType::ConstFalse => "const_false",
      NodeType::Integer => "integer",
      NodeType::Real => "real",
      NodeType::RealE => "real_e",
      NodeType::Rational => "rational",
      NodeType::TimeVariable => "time",
      NodeType::Name => "name",
      NodeType::Plus => "plus",
      NodeType::Minus => "minus",
      NodeType::Times => "times",
      NodeType::Divide => "divide",
      NodeType::Power => "power",
      NodeType::FunctionPower => "function_power",
      NodeType::Ln => "ln",
      NodeType::Log => "log",
      NodeType::Exp => "exp",
      NodeType::Abs => "abs",
      NodeType::Ceiling => "ceiling",
      NodeType::Floor => "floor",
      NodeType::Sin => "sin",
      NodeType::Cos => "cos",
      NodeType::Function => "function",
      NodeType::Lambda => "lambda",
      NodeType::Unsupported => "unsupported",
    }
  }

  pub fn is_constant(self) -> bool {
    matches!(
      self,
      NodeType::ConstE
        | NodeType::ConstPi
        | NodeType::ConstTrue
        | NodeType::ConstFalse
    )
  }

  /// Built-in function tags reachable by name from a formula.
  pub fn from_builtin(name: &str) -> Option<Self> {
    let node_type = match name {
      "ln" => NodeType::Ln,
      "log" => NodeType::Log,
      "exp" => NodeType::Exp,
      "abs" => NodeType::Abs,
      "ceiling" | "ceil" => NodeType::Ceiling,
      "floor" => NodeType::Floor,
      "sin" => NodeType::Sin,
      "cos" => NodeType::Cos,
      "pow" => NodeType::FunctionPower,
      "lambda" => NodeType::Lambda,
      _ => return None,
    };
    Some(node_type)
  }
}

impl std::fmt::Display for NodeType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

/// SBML math functions that are recognised but have no renderer handler.
const KNOWN_UNSUPPORTED: &[&str] = &[
  "tan", "sec", "csc", "cot", "sinh", "cosh", "tanh", "sech", "csch", "coth",
  "arcsin", "arccos", "arctan", "arcsec", "arccsc", "arccot", "arcsinh",
  "arccosh", "arctanh", "arcsech", "arccsch", "arccoth", "asin", "acos",
  "atan", "sqrt", "root", "factorial", "piecewise", "delay", "rateOf", "and",
  "or", "xor", "not", "eq", "neq", "gt", "lt", "geq", "leq", "min", "max",
  "quotient", "rem", "implies",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
  Integer(i64),
  Real(f64),
  RealE { mantissa: f64, exponent: i64 },
  Rational { numerator: i64, denominator: i64 },
}

impl Number {
  pub fn to_f64(self) -> f64 {
    match self {
      Number::Integer(i) => i as f64,
      Number::Real(f) => f,
      // going through text keeps the result correctly rounded; only a
      // non-finite mantissa fails to parse, and scaling leaves it unchanged
      Number::RealE { mantissa, exponent } => format!("{mantissa}e{exponent}")
        .parse()
        .unwrap_or(mantissa),
      Number::Rational {
        numerator,
        denominator,
      } => numerator as f64 / denominator as f64,
    }
  }

  pub fn is_integer(self) -> bool {
    matches!(self, Number::Integer(_))
  }
}

/// One node of a parsed math expression.
///
/// Nodes own their children. A tree is built once and only ever read
/// afterwards; conversion borrows it.
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
  node_type: NodeType,
  name: Option<String>,
  value: Option<Number>,
  children: Vec<AstNode>,
}

impl AstNode {
  pub fn new(
    node_type: NodeType,
    name: Option<String>,
    value: Option<Number>,
    children: Vec<AstNode>,
  ) -> Self {
    AstNode {
      node_type,
      name,
      value,
      children,
    }
  }

  pub fn integer(value: i64) -> Self {
    Self::new(NodeType::Integer, None, Some(Number::Integer(value)), vec![])
  }

  pub fn real(value: f64) -> Self {
    Self::new(NodeType::Real, None, Some(Number::Real(value)), vec![])
  }

  pub fn real_e(mantissa: f64, exponent: i64) -> Self {
    Self::new(
      NodeType::RealE,
      None,
      Some(Number::RealE { mantissa, exponent }),
      vec![],
    )
  }

  pub fn rational(numerator: i64, denominator: i64) -> Self {
    Self::new(
      NodeType::Rational,
      None,
      Some(Number::Rational {
        numerator,
        denominator,
      }),
      vec![],
    )
  }

  pub fn name(id: impl Into<String>) -> Self {
    Self::new(NodeType::Name, Some(id.into()), None, vec![])
  }

  pub fn time() -> Self {
    Self::new(NodeType::TimeVariable, Some("time".to_string()), None, vec![])
  }

  /// # Panics
  /// Debug builds assert that `node_type` is one of the four constants.
  pub fn constant(node_type: NodeType) -> Self {
    debug_assert!(node_type.is_constant());
    Self::new(node_type, None, None, vec![])
  }

  pub fn operator(node_type: NodeType, children: Vec<AstNode>) -> Self {
    Self::new(node_type, None, None, children)
  }

  pub fn function_call(id: impl Into<String>, args: Vec<AstNode>) -> Self {
    Self::new(NodeType::Function, Some(id.into()), None, args)
  }

  /// `params` become leading Name children; `body` is the last child.
  pub fn lambda(params: &[&str], body: AstNode) -> Self {
    let mut children: Vec<AstNode> =
      params.iter().map(|p| AstNode::name(*p)).collect();
    children.push(body);
    Self::new(NodeType::Lambda, None, None, children)
  }

  pub fn unsupported(label: impl Into<String>, children: Vec<AstNode>) -> Self {
    Self::new(NodeType::Unsupported, Some(label.into()), None, children)
  }

  pub fn node_type(&self) -> NodeType {
    self.node_type
  }

  pub fn get_name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  pub fn value(&self) -> Option<Number> {
    self.value
  }

  pub fn children(&self) -> &[AstNode] {
    &self.children
  }

  pub fn child(&self, index: usize) -> Option<&AstNode> {
    self.children.get(index)
  }

  pub fn num_children(&self) -> usize {
    self.children.len()
  }

  pub fn left_child(&self) -> Option<&AstNode> {
    self.children.first()
  }

  /// The last child. For a lambda this is the function body.
  pub fn right_child(&self) -> Option<&AstNode> {
    self.children.last()
  }

  /// Numeric classification used ahead of any nominal dispatch: a node
  /// counts as real when it is tagged as one of the real kinds or carries
  /// a non-integer numeric value.
  pub fn is_real(&self) -> bool {
    matches!(
      self.node_type,
      NodeType::Real | NodeType::RealE | NodeType::Rational
    ) || self.value.is_some_and(|v| !v.is_integer())
  }

  pub fn is_integer(&self) -> bool {
    self.node_type == NodeType::Integer
  }

  pub fn is_number(&self) -> bool {
    self.is_integer() || self.is_real()
  }

  pub fn integer_value(&self) -> Option<i64> {
    match self.value {
      Some(Number::Integer(i)) => Some(i),
      _ => None,
    }
  }

  pub fn real_value(&self) -> Option<f64> {
    self.value.map(Number::to_f64)
  }
}

/// Convert a pest `Expression` (or any sub-rule of it) into an `AstNode`.
pub fn pair_to_node(pair: Pair<Rule>) -> Result<AstNode, ConvertError> {
  match pair.as_rule() {
    Rule::Expression => fold_chain(pair, Rule::AddOp),
    Rule::Term => fold_chain(pair, Rule::MulOp),
    Rule::Unary => {
      let mut negations = 0usize;
      let mut operand = None;
      for inner in pair.into_inner() {
        match inner.as_rule() {
          Rule::UnaryOp => {
            if inner.as_str() == "-" {
              negations += 1;
            }
          }
          _ => operand = Some(pair_to_node(inner)?),
        }
      }
      let mut node = operand
        .ok_or_else(|| ConvertError::Syntax("unary without operand".into()))?;
      for _ in 0..negations {
        node = AstNode::operator(NodeType::Minus, vec![node]);
      }
      Ok(node)
    }
    Rule::Power => {
      let mut inner = pair.into_inner();
      let base = inner
        .next()
        .ok_or_else(|| ConvertError::Syntax("power without base".into()))?;
      let base = pair_to_node(base)?;
      match inner.next() {
        Some(exponent) => Ok(AstNode::operator(
          NodeType::Power,
          vec![base, pair_to_node(exponent)?],
        )),
        None => Ok(base),
      }
    }
    Rule::Number => number_to_node(pair.as_str()),
    Rule::Identifier => Ok(identifier_to_node(pair.as_str())),
    Rule::Call => {
      let mut inner = pair.into_inner();
      let callee = inner
        .next()
        .ok_or_else(|| ConvertError::Syntax("call without name".into()))?;
      let callee = callee.as_str();
      let args = inner.map(pair_to_node).collect::<Result<Vec<_>, _>>()?;
      call_to_node(callee, args)
    }
    other => Err(ConvertError::Syntax(format!(
      "unexpected rule {:?} in formula",
      other
    ))),
  }
}

/// Fold `operand (op operand)*` left to right. Runs of `+` or `*` become a
/// single n-ary node; `-` and `/` stay binary.
fn fold_chain(pair: Pair<Rule>, op_rule: Rule) -> Result<AstNode, ConvertError> {
  let mut inner = pair.into_inner();
  let first = inner
    .next()
    .ok_or_else(|| ConvertError::Syntax("empty operand chain".into()))?;
  let mut acc = pair_to_node(first)?;
  // true while `acc` is an n-ary node built by this fold
  let mut open = false;

  while let Some(op) = inner.next() {
    if op.as_rule() != op_rule {
      return Err(ConvertError::Syntax(format!(
        "expected operator, got {:?}",
        op.as_rule()
      )));
    }
    let rhs = inner
      .next()
      .ok_or_else(|| ConvertError::Syntax("operator without operand".into()))?;
    let rhs = pair_to_node(rhs)?;
    let node_type = match op.as_str() {
      "+" => NodeType::Plus,
      "-" => NodeType::Minus,
      "*" => NodeType::Times,
      _ => NodeType::Divide,
    };
    let flattens = matches!(node_type, NodeType::Plus | NodeType::Times);

    if flattens && open && acc.node_type == node_type {
      acc.children.push(rhs);
    } else {
      acc = AstNode::operator(node_type, vec![acc, rhs]);
      open = flattens;
    }
  }

  Ok(acc)
}

fn number_to_node(text: &str) -> Result<AstNode, ConvertError> {
  if let Some(pos) = text.find(|c: char| c == 'e' || c == 'E') {
    let (mantissa, exponent) = (&text[..pos], &text[pos + 1..]);
    let mantissa = mantissa
      .parse::<f64>()
      .map_err(|e| ConvertError::Syntax(format!("bad number '{text}': {e}")))?;
    let exponent = exponent
      .parse::<i64>()
      .map_err(|e| ConvertError::Syntax(format!("bad number '{text}': {e}")))?;
    return Ok(AstNode::real_e(mantissa, exponent));
  }

  if text.contains('.') {
    return text
      .parse::<f64>()
      .map(AstNode::real)
      .map_err(|e| ConvertError::Syntax(format!("bad number '{text}': {e}")));
  }

  // Integers too wide for i64 are kept as reals
  match text.parse::<i64>() {
    Ok(i) => Ok(AstNode::integer(i)),
    Err(_) => text
      .parse::<f64>()
      .map(AstNode::real)
      .map_err(|e| ConvertError::Syntax(format!("bad number '{text}': {e}"))),
  }
}

fn identifier_to_node(id: &str) -> AstNode {
  match id {
    "pi" => AstNode::constant(NodeType::ConstPi),
    "exponentiale" => AstNode::constant(NodeType::ConstE),
    "true" => AstNode::constant(NodeType::ConstTrue),
    "false" => AstNode::constant(NodeType::ConstFalse),
    "time" => AstNode::time(),
    _ => AstNode::name(id),
  }
}

fn call_to_node(
  callee: &str,
  args: Vec<AstNode>,
) -> Result<AstNode, ConvertError> {
  match NodeType::from_builtin(callee) {
    Some(NodeType::Lambda) => {
      let Some((_, params)) = args.split_last() else {
        return Err(ConvertError::Syntax("lambda needs at least a body".into()));
      };
      if let Some(bad) = params.iter().find(|p| p.node_type != NodeType::Name)
      {
        return Err(ConvertError::Syntax(format!(
          "lambda parameter must be a name, got {}",
          bad.node_type
        )));
      }
      Ok(AstNode::operator(NodeType::Lambda, args))
    }
    Some(node_type) => Ok(AstNode::operator(node_type, args)),
    None if KNOWN_UNSUPPORTED.contains(&callee) => {
      Ok(AstNode::unsupported(callee, args))
    }
    None => Ok(AstNode::function_call(callee, args)),
  }
}
