//! Directive syntax for clinical-note templates.
//!
//! Templates use `CommonMark` generic directives:
//!
//! - **Inline** `:name[label]{attrs}` and **leaf** `::name[label]{attrs}`:
//!   `value` and `score`.
//! - **Container** `:::name[label]{attrs}` ... `:::`: `selector` and `case`.
//!
//! The scanner works line by line. Fenced code is skipped ([`fence`]),
//! directive markup is recognized ([`parser`]), its `[label]{...}` part is
//! tokenized ([`args`]) and finally checked against the [`grammar`].
//!
//! # Example
//!
//! ```
//! use bf_engine::directive::DirectiveKind;
//!
//! assert_eq!(DirectiveKind::from_name("case"), Some(DirectiveKind::Case));
//! assert!(DirectiveKind::Selector.is_container());
//! assert_eq!(DirectiveKind::Score.attributes(), &["formula", "unit", "primary"]);
//! ```

mod args;
pub(crate) mod fence;
mod grammar;
pub(crate) mod parser;

pub use grammar::DirectiveKind;
