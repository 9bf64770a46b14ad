//! Per-call parse state
//!
//! Each parse call owns one `ParseContext`. It decides whether a compliance
//! violation aborts the parse (strict) or is recorded and skipped (lenient).

use openapi_operations_common::{ComplianceViolation, ParserError, Result};
use std::fmt;
use tracing::warn;

/// Collects compliance violations for a single parse call
#[derive(Debug, Default)]
pub struct ParseContext {
    lenient: bool,
    violations: Vec<ComplianceViolation>,
}

impl ParseContext {
    pub fn new(ignore_non_compliant_errors: bool) -> Self {
        Self {
            lenient: ignore_non_compliant_errors,
            violations: Vec::new(),
        }
    }

    pub fn is_lenient(&self) -> bool {
        self.lenient
    }

    /// Report a violation at `pointer`
    ///
    /// Strict mode returns `NonCompliantDocument`; lenient mode records the
    /// violation and returns `Ok(())` so the caller can substitute a default.
    pub fn report(&mut self, pointer: &JsonPointer, message: impl Into<String>) -> Result<()> {
        let violation = ComplianceViolation::new(pointer.to_string(), message);

        if !self.lenient {
            return Err(ParserError::NonCompliantDocument(violation));
        }

        warn!(
            pointer = %violation.pointer,
            "ignoring non-compliant document: {}", violation.message
        );
        self.violations.push(violation);
        Ok(())
    }

    pub fn violations(&self) -> &[ComplianceViolation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<ComplianceViolation> {
        self.violations
    }
}

/// RFC 6901 pointer into the document, used to locate violations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonPointer(Vec<String>);

impl JsonPointer {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// A new pointer one segment deeper
    pub fn join(&self, segment: impl AsRef<str>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.as_ref().replace('~', "~0").replace('/', "~1"));
        Self(segments)
    }

    /// Pointer parsed from a local reference such as `#/components/schemas/Pet`
    pub fn from_ref(reference: &str) -> Self {
        let pointer = reference.trim_start_matches('#').trim_start_matches('/');
        if pointer.is_empty() {
            return Self::root();
        }
        Self(pointer.split('/').map(str::to_string).collect())
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}
