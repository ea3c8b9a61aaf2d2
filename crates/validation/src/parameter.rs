use serde_json::Value;

use crate::{Diagnostics, ValidationKind};

/// The capability set every registered parameter data type implements.
///
/// A `Parameter` is produced by a loader from the raw `spec` block of a
/// resource document. Spec validation collects every field diagnostic in one
/// pass; value validation reports the single rule a candidate value breaks.
pub trait Parameter: Send + Sync + std::fmt::Debug {
    /// The registered data-type name, e.g. "Integer".
    fn data_type(&self) -> &'static str;

    /// Check the spec's own consistency (bounds ordering, step rules, …).
    fn validate_spec(&self) -> Diagnostics;

    /// Check a candidate value against the spec.
    fn validate_value(&self, value: &Value) -> Result<(), ValidationKind>;

    /// The declared default, if the spec carries one.
    fn declared_default(&self) -> Option<Value>;

    /// The configured default, or the type's zero value.
    fn default_value(&self) -> Value;
}
