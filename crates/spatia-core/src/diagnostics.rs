//! Configuration diagnostics sink
//!
//! Non-fatal findings during configuration (clamped parameters, unusual
//! geometries) are appended to a [`Diagnostics`] value that the caller
//! passes in and inspects afterwards. Each entry is also forwarded to the
//! `log` facade.

/// Severity of a diagnostic entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
}

/// A single diagnostic entry
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Component that produced the entry (e.g. "vbap2d", "delayline")
    pub origin: &'static str,
    pub message: String,
}

/// Collector for configuration-time diagnostics
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning
    pub fn warn(&mut self, origin: &'static str, message: impl Into<String>) {
        let message = message.into();
        log::warn!("[{}] {}", origin, message);
        self.entries.push(Diagnostic {
            severity: Severity::Warning,
            origin,
            message,
        });
    }

    /// Record an informational note
    pub fn info(&mut self, origin: &'static str, message: impl Into<String>) {
        let message = message.into();
        log::info!("[{}] {}", origin, message);
        self.entries.push(Diagnostic {
            severity: Severity::Info,
            origin,
            message,
        });
    }

    /// All entries in insertion order
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Iterate over warnings only
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    /// True if any warning was recorded
    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    /// Remove all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_in_order() {
        let mut diag = Diagnostics::new();
        diag.info("test", "first");
        diag.warn("test", "second");

        assert_eq!(diag.entries().len(), 2);
        assert_eq!(diag.entries()[0].message, "first");
        assert!(diag.has_warnings());
        assert_eq!(diag.warnings().count(), 1);

        diag.clear();
        assert!(!diag.has_warnings());
    }
}
