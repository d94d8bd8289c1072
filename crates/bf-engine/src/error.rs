//! Error types for template parsing and schema extraction.
//!
//! Two severities exist:
//!
//! - [`SyntaxError`]: malformed directive markup. Fatal, the template cannot be
//!   rendered until the source is corrected.
//! - [`AttributeError`]: a well-formed directive with a missing or invalid
//!   attribute. The directive is skipped during extraction and the error is
//!   reported as a warning.
//!
//! Formula failures never surface as errors; see [`crate::formula::Evaluation`].

/// Malformed directive markup found while parsing a template.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    /// Container directive opened but never closed.
    #[error("line {line}: unterminated directive :::{name} (missing closing :::)")]
    Unterminated {
        /// Directive name.
        name: String,
        /// Line of the opening fence (1-indexed).
        line: usize,
    },

    /// Closing fence without an open container.
    #[error("line {line}: stray ::: with no opening directive")]
    UnexpectedClose {
        /// Line of the closing fence.
        line: usize,
    },

    /// Attribute not declared for the directive kind.
    #[error("line {line}: unknown attribute `{attribute}` on {directive} directive")]
    UnknownAttribute {
        /// Directive name.
        directive: &'static str,
        /// Offending attribute name.
        attribute: String,
        /// Line of the directive.
        line: usize,
    },

    /// Same attribute given twice.
    #[error("line {line}: duplicate attribute `{attribute}` on {directive} directive")]
    DuplicateAttribute {
        /// Directive name.
        directive: &'static str,
        /// Repeated attribute name.
        attribute: String,
        /// Line of the directive.
        line: usize,
    },

    /// Attribute or label block that cannot be parsed.
    #[error("line {line}: malformed {directive} directive: {message}")]
    MalformedAttributes {
        /// Directive name.
        directive: &'static str,
        /// What went wrong.
        message: String,
        /// Line of the directive.
        line: usize,
    },

    /// Directive used with the wrong number of colons.
    #[error("line {line}: {directive} directive must be written as {expected}")]
    WrongForm {
        /// Directive name.
        directive: &'static str,
        /// Accepted syntax.
        expected: &'static str,
        /// Line of the directive.
        line: usize,
    },

    /// `:::case` whose nearest enclosing directive is not a selector.
    #[error("line {line}: case directive outside of a selector")]
    CaseOutsideSelector {
        /// Line of the case.
        line: usize,
    },

    /// Source contains a character reserved for internal directive markers.
    #[error("line {line}: reserved character U+{code:05X} in template")]
    ReservedCharacter {
        /// Code point of the character.
        code: u32,
        /// Line of the character.
        line: usize,
    },

    /// More inline directives than the marker range can address.
    #[error("template contains more than {limit} inline directives")]
    TooManyDirectives {
        /// Maximum supported count.
        limit: usize,
    },
}

/// A directive that is skipped during schema extraction.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AttributeError {
    /// Directive without its required `primary` attribute.
    #[error("line {line}: {directive} directive has no primary attribute")]
    MissingPrimary {
        /// Directive name.
        directive: &'static str,
        /// Line of the directive.
        line: usize,
    },

    /// Score directive without a formula.
    #[error("line {line}: score directive has an empty formula")]
    EmptyFormula {
        /// Line of the directive.
        line: usize,
    },

    /// Value directive with an unrecognized `type`.
    #[error("line {line}: value `{key}` has unknown type `{value_type}` (expected string, number or date)")]
    InvalidValueType {
        /// Key of the value directive.
        key: String,
        /// Rejected type string.
        value_type: String,
        /// Line of the directive.
        line: usize,
    },
}
