//! The target side of a conversion.
//!
//! An [`AstRenderer`] decides what each kind of math node turns into. The
//! converter only walks the tree and picks the handler; everything specific
//! to the output language lives in the renderer.

use crate::converter::Scope;
use crate::syntax::AstNode;

pub mod infix;
pub mod json;

pub use infix::{Dialect, InfixRenderer};
pub use json::JsonRenderer;

/// Text of the marker produced for nodes no handler accepts.
pub const UNSUPPORTED: &str = "unsupported";

/// Marker value for a node the converter could not dispatch.
///
/// Every renderer output type converts from it, so the walk can finish and
/// leave the marker in place of the broken subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Unsupported;

impl std::fmt::Display for Unsupported {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(UNSUPPORTED)
  }
}

impl From<Unsupported> for String {
  fn from(_: Unsupported) -> Self {
    UNSUPPORTED.to_string()
  }
}

/// One handler per node kind.
///
/// Constant and leaf handlers get the node itself so they can inspect its
/// value. Operator and function handlers are responsible for their own
/// children: call `scope.convert(child)` (or one of the bulk helpers) to
/// render them in the current scope. The converter never checks arity.
pub trait AstRenderer: Sized {
  type Output: Clone + From<Unsupported>;

  fn handle_const_e(&self, node: &AstNode, scope: &Scope<'_, Self>)
    -> Self::Output;
  fn handle_const_pi(
    &self,
    node: &AstNode,
    scope: &Scope<'_, Self>,
  ) -> Self::Output;
  fn handle_const_true(
    &self,
    node: &AstNode,
    scope: &Scope<'_, Self>,
  ) -> Self::Output;
  fn handle_const_false(
    &self,
    node: &AstNode,
    scope: &Scope<'_, Self>,
  ) -> Self::Output;

  fn handle_int(&self, node: &AstNode, scope: &Scope<'_, Self>) -> Self::Output;
  fn handle_real(&self, node: &AstNode, scope: &Scope<'_, Self>)
    -> Self::Output;

  /// The independent simulation-time variable.
  fn handle_ode_time(
    &self,
    node: &AstNode,
    scope: &Scope<'_, Self>,
  ) -> Self::Output;

  /// A plain identifier that no substitution or bound argument replaced.
  fn handle_string(
    &self,
    node: &AstNode,
    scope: &Scope<'_, Self>,
  ) -> Self::Output;

  fn handle_plus(&self, node: &AstNode, scope: &Scope<'_, Self>)
    -> Self::Output;
  /// Binary subtraction or, with a single child, negation.
  fn handle_minus(
    &self,
    node: &AstNode,
    scope: &Scope<'_, Self>,
  ) -> Self::Output;
  fn handle_times(
    &self,
    node: &AstNode,
    scope: &Scope<'_, Self>,
  ) -> Self::Output;
  fn handle_divide(
    &self,
    node: &AstNode,
    scope: &Scope<'_, Self>,
  ) -> Self::Output;
  /// Called for both `a^b` and `pow(a, b)`.
  fn handle_power(
    &self,
    node: &AstNode,
    scope: &Scope<'_, Self>,
  ) -> Self::Output;

  fn handle_ln(&self, node: &AstNode, scope: &Scope<'_, Self>) -> Self::Output;
  /// One child is base 10; two children are `(base, x)`.
  fn handle_log(&self, node: &AstNode, scope: &Scope<'_, Self>) -> Self::Output;
  fn handle_exp(&self, node: &AstNode, scope: &Scope<'_, Self>) -> Self::Output;
  fn handle_abs(&self, node: &AstNode, scope: &Scope<'_, Self>) -> Self::Output;
  fn handle_ceiling(
    &self,
    node: &AstNode,
    scope: &Scope<'_, Self>,
  ) -> Self::Output;
  fn handle_floor(
    &self,
    node: &AstNode,
    scope: &Scope<'_, Self>,
  ) -> Self::Output;
  fn handle_sin(&self, node: &AstNode, scope: &Scope<'_, Self>) -> Self::Output;
  fn handle_cos(&self, node: &AstNode, scope: &Scope<'_, Self>) -> Self::Output;
}
