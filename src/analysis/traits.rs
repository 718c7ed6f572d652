//! Analyzer trait definition

use crate::model::Recording;

/// A behavioral signal analyzer
///
/// Analyzers read an immutable recording and return a complete result; they
/// never publish partial output or keep state between calls.
pub trait SignalAnalyzer {
    type Output;

    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Compute the full result for `recording`
    fn analyze(&self, recording: &Recording) -> Self::Output;
}
