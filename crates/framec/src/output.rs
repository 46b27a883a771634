/// Collected scripts of the unit being compiled, keyed by script name.

use std::collections::BTreeMap;

pub type Scripts = BTreeMap<String, String>;

#[derive(Debug, Default)]
pub struct OutputCollector {
    scripts: Scripts,
}

impl OutputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a script. Last write wins; the replaced body is returned.
    pub fn push(&mut self, name: &str, body: String) -> Option<String> {
        log::trace!("script `{}` ({} bytes)", name, body.len());
        self.scripts.insert(name.to_string(), body)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.scripts.get(name).map(String::as_str)
    }

    /// Independent copy of everything collected so far.
    pub fn snapshot(&self) -> Scripts {
        self.scripts.clone()
    }

    pub fn reset(&mut self) {
        self.scripts.clear();
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let mut output = OutputCollector::new();
        assert!(output.push("main", "a\n".to_string()).is_none());
        assert_eq!(output.push("main", "b\n".to_string()).as_deref(), Some("a\n"));
        assert_eq!(output.get("main"), Some("b\n"));
        assert_eq!(output.len(), 1);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut output = OutputCollector::new();
        output.push("f", "invoke x\n".to_string());
        let snapshot = output.snapshot();
        output.reset();
        assert!(output.is_empty());
        assert_eq!(snapshot.get("f").map(String::as_str), Some("invoke x\n"));
    }
}
