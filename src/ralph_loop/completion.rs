//! Completion detection
//!
//! The loop stops when the agent's output contains a literal promise
//! marker. The whole combined output is scanned, so the marker counts no
//! matter where the agent printed it, including mid-line.

/// Marker an agent emits once every story passes
pub const COMPLETION_PROMISE: &str = "<promise>COMPLETE</promise>";

/// Completion detector for the agent loop
#[derive(Debug, Clone)]
pub struct CompletionDetector {
    /// The promise string to look for
    promise: String,
}

impl CompletionDetector {
    /// Create a detector for a specific promise string
    pub fn new(promise: &str) -> Self {
        Self {
            promise: promise.to_string(),
        }
    }

    /// Check if the output contains the completion promise.
    ///
    /// Case-sensitive, exact substring match over the full output.
    pub fn check(&self, output: &str) -> bool {
        output.contains(&self.promise)
    }

    /// Get the promise string
    pub fn promise(&self) -> &str {
        &self.promise
    }
}

impl Default for CompletionDetector {
    fn default() -> Self {
        Self::new(COMPLETION_PROMISE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_promise_on_own_line() {
        let detector = CompletionDetector::default();
        let output = "Working on task...\nDone!\n<promise>COMPLETE</promise>\n";
        assert!(detector.check(output));
    }

    #[test]
    fn test_detects_promise_mid_line() {
        let detector = CompletionDetector::default();
        let output = "All stories pass <promise>COMPLETE</promise> shutting down";
        assert!(detector.check(output));
    }

    #[test]
    fn test_detects_promise_far_from_the_end() {
        let detector = CompletionDetector::default();

        let mut output = String::from("<promise>COMPLETE</promise>\n");
        for i in 0..200 {
            output.push_str(&format!("trailing line {}\n", i));
        }
        assert!(detector.check(&output));
    }

    #[test]
    fn test_ignores_missing_closing_tag() {
        let detector = CompletionDetector::default();
        assert!(!detector.check("<promise>COMPLETE"));
        assert!(!detector.check("COMPLETE</promise>"));
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let detector = CompletionDetector::default();
        assert!(!detector.check("<promise>complete</promise>"));
        assert!(!detector.check("<PROMISE>COMPLETE</PROMISE>"));
    }

    #[test]
    fn test_absent_promise() {
        let detector = CompletionDetector::default();
        assert!(!detector.check("Working on task...\nDone!\n"));
        assert!(!detector.check(""));
    }

    #[test]
    fn test_custom_promise() {
        let detector = CompletionDetector::new("[[ALL_DONE]]");
        assert!(detector.check("Result: [[ALL_DONE]]"));
        assert!(!detector.check("<promise>COMPLETE</promise>"));
    }
}
