//! Botflow Expr
//!
//! The expression language used inside workflow graphs:
//!
//! - [`render`] replaces every `{{ expr }}` in a template with the text of
//!   the resolved expression.
//! - [`resolve`] turns a single operand (a literal, a built-in function call,
//!   a nested template or a context path) into a JSON value.
//! - [`evaluate`] and [`evaluate_group`] decide condition trees.
//!
//! Nothing here fails. Malformed input degrades to `undefined` (`None`), the
//! empty string or the raw text so that a typo in a template never aborts a
//! run; the validator flags such expressions ahead of time instead.

mod coerce;
mod condition;
mod functions;
mod literal;
mod path;
mod resolve;
mod template;

pub use coerce::{strict_equals, to_number, to_text};
pub use condition::{Operator, UnknownOperator, evaluate, evaluate_condition, evaluate_group};
pub use functions::ALLOWED_FUNCTIONS;
pub use literal::{is_literal, parse_literal};
pub use path::{ALLOWED_ROOTS, lookup};
pub use resolve::{parse_call, resolve, split_args};
pub use template::{render, template_expressions};
