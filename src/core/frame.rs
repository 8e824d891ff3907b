//! Scoped variable frames owned by a layer.
//!
//! A [`FrameStack`] always holds at least one frame. Lookups run from the
//! innermost frame outwards, so inner scopes shadow outer ones.

use super::axion::Parameter;
use super::eq_ignore_case;
use serde::{Deserialize, Serialize};
use std::mem;

/// One scope of case-insensitive `label -> value` bindings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    bindings: Vec<(String, String)>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(bound, _)| eq_ignore_case(bound, label))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    /// Bind `label` to `value`, replacing an existing binding.
    ///
    /// Empty labels are ignored.
    pub fn set(&mut self, label: &str, value: &str) {
        if label.is_empty() {
            return;
        }

        match self
            .bindings
            .iter_mut()
            .find(|(bound, _)| eq_ignore_case(bound, label))
        {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.bindings.push((label.to_string(), value.to_string())),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings
            .iter()
            .map(|(label, value)| (label.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Nested scopes of a layer, innermost first.
///
/// # Example
///
/// ```rust
/// use fsmstack::core::FrameStack;
///
/// let mut frames = FrameStack::new();
/// frames.apply("count", "1");
/// frames.push();
/// frames.write("count", "2");
///
/// assert_eq!(frames.lookup("COUNT"), Some("2"));
/// frames.pop();
/// assert_eq!(frames.lookup("count"), Some("1"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameStack {
    innermost: Frame,
    // Outer frames, nearest last.
    outer: Vec<Frame>,
}

impl FrameStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames, never less than one.
    pub fn depth(&self) -> usize {
        self.outer.len() + 1
    }

    /// Frames from innermost to outermost.
    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        std::iter::once(&self.innermost).chain(self.outer.iter().rev())
    }

    pub fn innermost(&self) -> &Frame {
        &self.innermost
    }

    /// Open a fresh innermost frame.
    pub fn push(&mut self) {
        let previous = mem::take(&mut self.innermost);
        self.outer.push(previous);
    }

    /// Drop the innermost frame; a single-frame stack is left untouched.
    pub fn pop(&mut self) {
        if let Some(next) = self.outer.pop() {
            self.innermost = next;
        }
    }

    /// First binding of `label`, searching innermost to outermost.
    pub fn lookup(&self, label: &str) -> Option<&str> {
        self.frames().find_map(|frame| frame.get(label))
    }

    pub fn lookup_or<'a>(&'a self, label: &str, default: &'a str) -> &'a str {
        self.lookup(label).unwrap_or(default)
    }

    /// Update whichever frame already binds `label`, else the innermost.
    pub fn apply(&mut self, label: &str, value: &str) {
        if label.is_empty() {
            return;
        }

        if !self.innermost.contains(label) {
            if let Some(frame) = self.outer.iter_mut().rev().find(|f| f.contains(label)) {
                frame.set(label, value);
                return;
            }
        }

        self.innermost.set(label, value);
    }

    /// Bind `label` in the innermost frame regardless of outer bindings.
    pub fn write(&mut self, label: &str, value: &str) {
        self.innermost.set(label, value);
    }

    /// Whether the visible binding of `label` equals `value` (case-insensitive).
    ///
    /// Unbound labels never match.
    pub fn matches(&self, label: &str, value: &str) -> bool {
        self.lookup(label)
            .is_some_and(|bound| eq_ignore_case(bound, value))
    }

    /// Whether every labeled pair of `tuple` matches. Unlabeled slots are skipped.
    pub fn matches_all(&self, tuple: &[Parameter]) -> bool {
        tuple
            .iter()
            .filter(|pair| !pair.label.is_empty())
            .all(|pair| self.matches(&pair.label, &pair.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_stack_has_one_empty_frame() {
        let frames = FrameStack::new();

        assert_eq!(frames.depth(), 1);
        assert!(frames.innermost().is_empty());
    }

    #[test]
    fn pop_on_single_frame_is_noop() {
        let mut frames = FrameStack::new();
        frames.write("x", "1");
        frames.pop();
        frames.pop();

        assert_eq!(frames.depth(), 1);
        assert_eq!(frames.lookup("x"), Some("1"));
    }

    #[test]
    fn lookup_prefers_innermost_binding() {
        let mut frames = FrameStack::new();
        frames.write("x", "outer");
        frames.push();
        frames.write("X", "inner");

        assert_eq!(frames.lookup("x"), Some("inner"));
        assert_eq!(frames.depth(), 2);

        frames.pop();
        assert_eq!(frames.lookup("x"), Some("outer"));
    }

    #[test]
    fn apply_updates_the_binding_frame() {
        let mut frames = FrameStack::new();
        frames.write("x", "1");
        frames.push();
        frames.apply("x", "2");
        frames.apply("y", "3");

        assert!(!frames.innermost().contains("x"));
        assert_eq!(frames.innermost().get("y"), Some("3"));

        frames.pop();
        assert_eq!(frames.lookup("x"), Some("2"));
        assert_eq!(frames.lookup("y"), None);
    }

    #[test]
    fn empty_labels_are_never_bound() {
        let mut frames = FrameStack::new();
        frames.apply("", "1");
        frames.write("", "2");

        assert!(frames.innermost().is_empty());
    }

    #[test]
    fn lookup_or_falls_back_to_default() {
        let frames = FrameStack::new();

        assert_eq!(frames.lookup_or("n", "0"), "0");
    }

    #[test]
    fn matching_uses_the_visible_binding() {
        let mut frames = FrameStack::new();
        frames.write("x", "1");
        frames.push();
        frames.write("x", "2");

        assert!(frames.matches("x", "2"));
        assert!(!frames.matches("x", "1"));
        assert!(!frames.matches("missing", ""));
    }

    #[test]
    fn matches_all_requires_every_pair() {
        let mut frames = FrameStack::new();
        frames.write("role", "Worker");
        frames.write("zone", "a");

        let both = [Parameter::new("role", "worker"), Parameter::new("zone", "a")];
        let one_wrong = [Parameter::new("role", "worker"), Parameter::new("zone", "b")];
        let unlabeled = [Parameter::new("", "ignored"), Parameter::new("zone", "A")];

        assert!(frames.matches_all(&both));
        assert!(!frames.matches_all(&one_wrong));
        assert!(frames.matches_all(&unlabeled));
    }
}
