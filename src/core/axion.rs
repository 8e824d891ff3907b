//! Axions: the small command strings attached to state entry and leave.
//!
//! An axion reads `verb:label=value,label=value`. [`Axion::split`] breaks it
//! into a verb and ordered parameters, [`Axion::expand`] substitutes
//! `((name))` markers from a layer's frames, and [`Verb`] classifies the
//! result into the built-in verb set.

use super::eq_ignore_case;
use super::frame::FrameStack;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\((.*?)\)\)").expect("marker pattern should compile"));

/// A `label=value` argument of an axion.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub label: String,
    pub value: String,
}

impl Parameter {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A parsed axion: verb label plus ordered parameters.
///
/// # Example
///
/// ```rust
/// use fsmstack::core::{Axion, Parameter};
///
/// let axion = Axion::split("dosomething: label = argument, value=5,extra=foo");
///
/// assert_eq!(axion.verb, "dosomething");
/// assert_eq!(axion.parameters[0], Parameter::new("label", "argument"));
/// assert_eq!(axion.value_of("VALUE", "0"), "5");
/// assert_eq!(axion.value_of("missing", "none"), "none");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Axion {
    pub verb: String,
    pub parameters: Vec<Parameter>,
}

impl Axion {
    /// Split an axion string into its verb and parameters.
    ///
    /// Without a `:` the whole string is the verb. Otherwise the trimmed text
    /// before the first `:` is the verb and the rest is split on `,`; each
    /// token splits on its first `=` into a trimmed label and value. A token
    /// with no `=` becomes a parameter with an empty label.
    pub fn split(text: &str) -> Self {
        let Some((verb, rest)) = text.split_once(':') else {
            return Self {
                verb: text.to_string(),
                parameters: Vec::new(),
            };
        };

        let parameters = rest
            .split(',')
            .map(|token| match token.split_once('=') {
                Some((label, value)) => Parameter::new(label.trim(), value.trim()),
                None => Parameter::new("", token.trim()),
            })
            .collect();

        Self {
            verb: verb.trim().to_string(),
            parameters,
        }
    }

    /// Value of the first parameter labeled `key`, or `default`.
    pub fn value_of<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.parameters
            .iter()
            .find(|p| !p.label.is_empty() && eq_ignore_case(&p.label, key))
            .map_or(default, |p| p.value.as_str())
    }

    /// Replace every `((name))` marker in parameter values with the
    /// innermost binding of `name`, or nothing when unbound.
    pub fn expand(mut self, frames: &FrameStack) -> Self {
        for parameter in &mut self.parameters {
            if !parameter.value.contains("((") {
                continue;
            }

            let expanded = MARKER.replace_all(&parameter.value, |caps: &Captures| {
                frames.lookup_or(caps[1].trim(), "").to_string()
            });
            parameter.value = expanded.into_owned();
        }
        self
    }

    /// Parameters other than those labeled `key`.
    fn without(&self, key: &str) -> Vec<Parameter> {
        self.parameters
            .iter()
            .filter(|p| !eq_ignore_case(&p.label, key))
            .cloned()
            .collect()
    }
}

/// Result strings produced by built-in verbs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    Success,
    Failure,
    Invalid,
    NotSame,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Invalid => "invalid",
            Self::NotSame => "notsame",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Outcome> for String {
    fn from(outcome: Outcome) -> Self {
        outcome.as_str().to_string()
    }
}

/// The built-in verb set, plus [`Verb::Custom`] for application verbs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verb {
    /// Spawn a child layer of `machine`, seeding its frame.
    Start { machine: String, seed: Vec<Parameter> },
    /// Queue `event` on the parent layer.
    Raise { event: String },
    /// Queue `event` on every descendant layer.
    Blast { event: String },
    /// Forward a command notification to the resolver.
    Patch { command: String, status: String },
    /// Bind a value in the parent layer's innermost frame.
    Write { label: String, value: String },
    /// Count descendants whose bindings match every pair.
    Count { tuple: Vec<Parameter> },
    /// Schedule `event` on this layer; `None` when `expires` did not parse.
    Timer { expires: Option<i64>, event: String },
    Trace { debug: String },
    Set { label: String, value: String },
    Inc { label: String, amount: String },
    Dec { label: String, amount: String },
    Equ { label: String, value: String },
    Rem,
    Use,
    New,
    Pop,
    Custom { label: String, parameters: Vec<Parameter> },
}

/// Names of the built-in verbs, matched with [`eq_ignore_case`].
pub const BUILTIN_VERBS: [&str; 16] = [
    "start", "raise", "blast", "patch", "write", "count", "timer", "trace", "set", "inc", "dec",
    "equ", "rem", "use", "new", "pop",
];

impl From<Axion> for Verb {
    fn from(axion: Axion) -> Self {
        let value = |key: &str, default: &str| axion.value_of(key, default).to_string();
        let verb = axion.verb.trim();
        let label = BUILTIN_VERBS
            .iter()
            .copied()
            .find(|builtin| eq_ignore_case(builtin, verb))
            .unwrap_or_default();

        match label {
            "start" => Verb::Start {
                machine: value("machine", ""),
                seed: axion.without("machine"),
            },
            "raise" => Verb::Raise {
                event: value("event", ""),
            },
            "blast" => Verb::Blast {
                event: value("event", ""),
            },
            "patch" => Verb::Patch {
                command: value("command", ""),
                status: value("status", ""),
            },
            "write" => Verb::Write {
                label: value("label", ""),
                value: value("value", ""),
            },
            "count" => Verb::Count {
                tuple: count_tuple(&axion),
            },
            "timer" => Verb::Timer {
                expires: axion
                    .value_of("expires", "")
                    .parse::<i64>()
                    .ok()
                    .filter(|ms| *ms >= 0),
                event: value("event", ""),
            },
            "trace" => Verb::Trace {
                debug: value("debug", ""),
            },
            "set" => Verb::Set {
                label: value("label", ""),
                value: value("value", ""),
            },
            "inc" => Verb::Inc {
                label: value("label", ""),
                amount: value("value", "0"),
            },
            "dec" => Verb::Dec {
                label: value("label", ""),
                amount: value("value", "0"),
            },
            "equ" => Verb::Equ {
                label: value("label", ""),
                value: value("value", ""),
            },
            "rem" => Verb::Rem,
            "use" => Verb::Use,
            "new" => Verb::New,
            "pop" => Verb::Pop,
            _ => Verb::Custom {
                label: axion.verb,
                parameters: axion.parameters,
            },
        }
    }
}

// `count:label=x,value=1` means "x is bound to 1"; any other tuple lists
// literal bindings.
fn count_tuple(axion: &Axion) -> Vec<Parameter> {
    let label = axion.value_of("label", "");
    if label.is_empty() {
        return axion
            .parameters
            .iter()
            .filter(|p| !p.label.is_empty())
            .cloned()
            .collect();
    }

    vec![Parameter::new(label, axion.value_of("value", ""))]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_without_colon_is_bare_verb() {
        let axion = Axion::split("rem");

        assert_eq!(axion.verb, "rem");
        assert!(axion.parameters.is_empty());
    }

    #[test]
    fn split_trims_labels_and_values() {
        let axion = Axion::split(" v : k1 = a , k2=b ");

        assert_eq!(axion.verb, "v");
        assert_eq!(
            axion.parameters,
            vec![Parameter::new("k1", "a"), Parameter::new("k2", "b")]
        );
    }

    #[test]
    fn split_keeps_tokens_without_equals_as_unlabeled_slots() {
        let axion = Axion::split("count:flag,x=1");

        assert_eq!(axion.parameters.len(), 2);
        assert_eq!(axion.parameters[0].label, "");
        assert_eq!(axion.value_of("", "default"), "default");
        assert_eq!(axion.value_of("x", ""), "1");
    }

    #[test]
    fn split_uses_first_equals_only() {
        let axion = Axion::split("set:label=expr,value=a=b");

        assert_eq!(axion.value_of("value", ""), "a=b");
    }

    #[test]
    fn expand_replaces_markers_inside_values() {
        let mut frames = FrameStack::new();
        frames.write("who", "world");
        frames.write("n", "3");

        let axion = Axion::split("trace:debug=hello ((who)) x((n))((n)),other=((missing))")
            .expand(&frames);

        assert_eq!(axion.value_of("debug", ""), "hello world x33");
        assert_eq!(axion.value_of("other", "unset"), "");
    }

    #[test]
    fn expand_does_not_rescan_substituted_text() {
        let mut frames = FrameStack::new();
        frames.write("a", "((b))");
        frames.write("b", "nested");

        let axion = Axion::split("set:label=x,value=((a))").expand(&frames);

        assert_eq!(axion.value_of("value", ""), "((b))");
    }

    #[test]
    fn verbs_are_case_insensitive() {
        let verb = Verb::from(Axion::split("RAISE:event=done"));

        assert_eq!(
            verb,
            Verb::Raise {
                event: "done".to_string()
            }
        );
    }

    #[test]
    fn builtin_dispatch_follows_eq_ignore_case() {
        for name in BUILTIN_VERBS {
            let shouted = Verb::from(Axion::split(&format!("{}:label=a", name.to_uppercase())));
            assert!(
                !matches!(shouted, Verb::Custom { .. }),
                "{name} should dispatch as a built-in"
            );
        }

        let accented = Verb::from(Axion::split("Séť:label=a,value=1"));
        assert!(matches!(accented, Verb::Custom { ref label, .. } if label == "Séť"));
    }

    #[test]
    fn start_seed_excludes_machine() {
        let verb = Verb::from(Axion::split("start:machine=child,x=1,y=2"));

        match verb {
            Verb::Start { machine, seed } => {
                assert_eq!(machine, "child");
                assert_eq!(seed, vec![Parameter::new("x", "1"), Parameter::new("y", "2")]);
            }
            other => panic!("expected start, got {other:?}"),
        }
    }

    #[test]
    fn timer_rejects_unparseable_expiry() {
        let bad = Verb::from(Axion::split("timer:expires=soon,event=tick"));
        let negative = Verb::from(Axion::split("timer:expires=-5,event=tick"));
        let good = Verb::from(Axion::split("timer:expires=50,event=tick"));

        assert!(matches!(bad, Verb::Timer { expires: None, .. }));
        assert!(matches!(negative, Verb::Timer { expires: None, .. }));
        assert!(matches!(good, Verb::Timer { expires: Some(50), .. }));
    }

    #[test]
    fn count_accepts_label_value_shorthand() {
        let shorthand = Verb::from(Axion::split("count:label=x,value=1"));
        let literal = Verb::from(Axion::split("count:role=worker,zone=a"));

        assert_eq!(
            shorthand,
            Verb::Count {
                tuple: vec![Parameter::new("x", "1")]
            }
        );
        assert_eq!(
            literal,
            Verb::Count {
                tuple: vec![Parameter::new("role", "worker"), Parameter::new("zone", "a")]
            }
        );
    }

    #[test]
    fn unknown_verbs_become_custom() {
        let verb = Verb::from(Axion::split("Deploy:target=prod"));

        assert_eq!(
            verb,
            Verb::Custom {
                label: "Deploy".to_string(),
                parameters: vec![Parameter::new("target", "prod")],
            }
        );
    }

    #[test]
    fn outcome_strings() {
        assert_eq!(Outcome::Success.to_string(), "success");
        assert_eq!(String::from(Outcome::NotSame), "notsame");
    }
}
