//! Execution of axions against a layer and its engine capabilities.

use super::capabilities::Capabilities;
use super::layer::Layer;
use crate::core::{eq_ignore_case, Axion, FrameStack, Outcome, Verb};
use tracing::debug;

/// Where in a transition an axion runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Entering a state; the result drives the next transition.
    Entry,
    /// Leaving a state; only side effects matter.
    Leave,
    /// Leaving a layer that rests in `final`; only hierarchy effects run.
    Final,
}

/// Per-walk values visible to `rem` and `use`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct WalkContext<'a> {
    /// Event that started the walk
    pub external: &'a str,
    /// Result of the previous entry axion in this walk
    pub previous: &'a str,
}

/// Parse, expand and execute one axion. Returns the result string, which is
/// empty outside [`Mode::Entry`].
pub(crate) fn run(
    text: &str,
    mode: Mode,
    context: &WalkContext<'_>,
    layer: &mut Layer,
    caps: &mut dyn Capabilities,
) -> String {
    let verb = Verb::from(Axion::split(text).expand(layer.frames()));

    if mode == Mode::Final && !fires_on_final(&verb) {
        debug!(layer = %layer.id(), axion = text, "axion ignored on final leave");
        return String::new();
    }

    let result = execute(verb, mode, context, layer, caps);
    match mode {
        Mode::Entry => result,
        Mode::Leave | Mode::Final => String::new(),
    }
}

fn fires_on_final(verb: &Verb) -> bool {
    matches!(
        verb,
        Verb::Start { .. }
            | Verb::Patch { .. }
            | Verb::Write { .. }
            | Verb::Blast { .. }
            | Verb::Raise { .. }
    )
}

fn execute(
    verb: Verb,
    mode: Mode,
    context: &WalkContext<'_>,
    layer: &mut Layer,
    caps: &mut dyn Capabilities,
) -> String {
    // Leave-side hierarchy effects need their key parameter.
    let skip = |key: &str| mode != Mode::Entry && key.is_empty();

    match verb {
        Verb::Start { machine, seed } => {
            if skip(&machine) {
                return String::new();
            }
            caps.start(&machine, &seed).into()
        }
        Verb::Raise { event } => {
            if skip(&event) {
                return String::new();
            }
            caps.raise(&event).into()
        }
        Verb::Blast { event } => {
            if skip(&event) {
                return String::new();
            }
            caps.blast(&event).into()
        }
        Verb::Patch { command, status } => {
            if skip(&command) {
                return String::new();
            }
            caps.patch(&command, &status).into()
        }
        Verb::Write { label, value } => {
            if skip(&label) {
                return String::new();
            }
            caps.write(&label, &value).into()
        }
        Verb::Count { tuple } => caps.count(&tuple).to_string(),
        Verb::Timer { expires, event } => match expires {
            Some(ms) if !event.is_empty() => caps.timer(ms, &event).into(),
            _ => Outcome::Invalid.into(),
        },
        Verb::Trace { debug } => caps.trace(&debug).into(),
        Verb::Set { label, value } => {
            layer.frames_mut().apply(&label, &value);
            Outcome::Success.into()
        }
        Verb::Inc { label, amount } => {
            arithmetic(layer.frames_mut(), &label, &amount, i64::checked_add).into()
        }
        Verb::Dec { label, amount } => {
            arithmetic(layer.frames_mut(), &label, &amount, i64::checked_sub).into()
        }
        Verb::Equ { label, value } => {
            let current = layer.frames().lookup_or(&label, "0").to_string();
            let outcome = if eq_ignore_case(&current, &value) {
                Outcome::Success
            } else {
                Outcome::NotSame
            };

            caps.log(&format!(
                "({}) axion 'equ' of '{}' <- '{}'",
                layer.id(),
                current,
                outcome
            ));
            outcome.into()
        }
        Verb::Rem => context.external.to_string(),
        Verb::Use => context.previous.to_string(),
        Verb::New => {
            layer.frames_mut().push();
            String::new()
        }
        Verb::Pop => {
            layer.frames_mut().pop();
            String::new()
        }
        Verb::Custom { label, parameters } => caps.execute(&label, &parameters),
    }
}

/// Combine the current value of `label` (default `0`) with `amount`.
///
/// Any parse failure or overflow stores `0` and reports failure.
fn arithmetic(
    frames: &mut FrameStack,
    label: &str,
    amount: &str,
    op: fn(i64, i64) -> Option<i64>,
) -> Outcome {
    let current = frames.lookup_or(label, "0").parse::<i64>();
    let result = match (current, amount.parse::<i64>()) {
        (Ok(current), Ok(amount)) => op(current, amount),
        _ => None,
    };

    match result {
        Some(value) => {
            frames.apply(label, &value.to_string());
            Outcome::Success
        }
        None => {
            frames.apply(label, "0");
            Outcome::Failure
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MachineDef, Parameter, StateDef};
    use std::sync::Arc;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        logs: Vec<String>,
        count: usize,
    }

    impl Capabilities for Recorder {
        fn start(&mut self, machine: &str, seed: &[Parameter]) -> Outcome {
            self.calls.push(format!("start {machine} {}", seed.len()));
            Outcome::Success
        }
        fn raise(&mut self, event: &str) -> Outcome {
            self.calls.push(format!("raise {event}"));
            Outcome::Success
        }
        fn blast(&mut self, event: &str) -> Outcome {
            self.calls.push(format!("blast {event}"));
            Outcome::Success
        }
        fn patch(&mut self, command: &str, status: &str) -> Outcome {
            self.calls.push(format!("patch {command} {status}"));
            Outcome::Success
        }
        fn write(&mut self, label: &str, value: &str) -> Outcome {
            self.calls.push(format!("write {label} {value}"));
            Outcome::Success
        }
        fn count(&mut self, tuple: &[Parameter]) -> usize {
            self.calls.push(format!("count {}", tuple.len()));
            self.count
        }
        fn timer(&mut self, expires_ms: i64, event: &str) -> Outcome {
            self.calls.push(format!("timer {expires_ms} {event}"));
            Outcome::Success
        }
        fn trace(&mut self, debug: &str) -> Outcome {
            self.calls.push(format!("trace {debug}"));
            Outcome::Success
        }
        fn pop(&mut self) -> Outcome {
            self.calls.push("pop".to_string());
            Outcome::Success
        }
        fn execute(&mut self, verb: &str, _parameters: &[Parameter]) -> String {
            self.calls.push(format!("execute {verb}"));
            "custom".to_string()
        }
        fn log(&mut self, message: &str) {
            self.logs.push(message.to_string());
        }
    }

    fn layer() -> Layer {
        Layer::new(Arc::new(
            MachineDef::new("test").state(StateDef::new("start")),
        ))
    }

    fn entry(text: &str, layer: &mut Layer, caps: &mut Recorder) -> String {
        let context = WalkContext {
            external: "external",
            previous: "earlier",
        };
        run(text, Mode::Entry, &context, layer, caps)
    }

    #[test]
    fn inc_from_unbound_starts_at_zero() {
        let mut layer = layer();
        let mut caps = Recorder::default();

        assert_eq!(entry("inc:label=n,value=5", &mut layer, &mut caps), "success");
        assert_eq!(layer.frames().lookup("n"), Some("5"));

        assert_eq!(entry("dec:label=n,value=7", &mut layer, &mut caps), "success");
        assert_eq!(layer.frames().lookup("n"), Some("-2"));
    }

    #[test]
    fn inc_parse_failure_resets_to_zero() {
        let mut layer = layer();
        let mut caps = Recorder::default();
        layer.frames_mut().apply("n", "5");

        assert_eq!(entry("inc:label=n,value=abc", &mut layer, &mut caps), "failure");
        assert_eq!(layer.frames().lookup("n"), Some("0"));
    }

    #[test]
    fn inc_overflow_is_failure() {
        let mut layer = layer();
        let mut caps = Recorder::default();
        layer.frames_mut().apply("n", &i64::MAX.to_string());

        assert_eq!(entry("inc:label=n,value=1", &mut layer, &mut caps), "failure");
        assert_eq!(layer.frames().lookup("n"), Some("0"));
    }

    #[test]
    fn equ_compares_case_insensitively_and_logs() {
        let mut layer = layer();
        let mut caps = Recorder::default();
        layer.frames_mut().apply("mode", "Ready");

        assert_eq!(entry("equ:label=mode,value=ready", &mut layer, &mut caps), "success");
        assert_eq!(entry("equ:label=mode,value=busy", &mut layer, &mut caps), "notsame");
        assert_eq!(caps.logs.len(), 2);
        assert!(caps.logs[0].ends_with("axion 'equ' of 'Ready' <- 'success'"));
    }

    #[test]
    fn rem_and_use_pass_through_walk_values() {
        let mut layer = layer();
        let mut caps = Recorder::default();

        assert_eq!(entry("rem", &mut layer, &mut caps), "external");
        assert_eq!(entry("use", &mut layer, &mut caps), "earlier");
    }

    #[test]
    fn new_and_pop_manage_frames() {
        let mut layer = layer();
        let mut caps = Recorder::default();

        assert_eq!(entry("new", &mut layer, &mut caps), "");
        assert_eq!(layer.frames().depth(), 2);
        assert_eq!(entry("pop", &mut layer, &mut caps), "");
        assert_eq!(entry("pop", &mut layer, &mut caps), "");
        assert_eq!(layer.frames().depth(), 1);
    }

    #[test]
    fn set_expands_markers_before_binding() {
        let mut layer = layer();
        let mut caps = Recorder::default();
        layer.frames_mut().apply("name", "alpha");

        entry("set:label=copy,value=((name))-1", &mut layer, &mut caps);

        assert_eq!(layer.frames().lookup("copy"), Some("alpha-1"));
    }

    #[test]
    fn count_result_is_decimal() {
        let mut layer = layer();
        let mut caps = Recorder {
            count: 12,
            ..Recorder::default()
        };

        assert_eq!(entry("count:label=x,value=1", &mut layer, &mut caps), "12");
    }

    #[test]
    fn timer_without_valid_expiry_is_invalid() {
        let mut layer = layer();
        let mut caps = Recorder::default();

        assert_eq!(entry("timer:expires=x,event=tick", &mut layer, &mut caps), "invalid");
        assert_eq!(entry("timer:expires=10", &mut layer, &mut caps), "invalid");
        assert_eq!(entry("timer:expires=10,event=tick", &mut layer, &mut caps), "success");
        assert_eq!(caps.calls, vec!["timer 10 tick"]);
    }

    #[test]
    fn unknown_verbs_reach_the_resolver() {
        let mut layer = layer();
        let mut caps = Recorder::default();

        assert_eq!(entry("deploy:target=prod", &mut layer, &mut caps), "custom");
        assert_eq!(caps.calls, vec!["execute deploy"]);
    }

    #[test]
    fn leave_mode_discards_results_and_skips_empty_keys() {
        let mut layer = layer();
        let mut caps = Recorder::default();
        let context = WalkContext {
            external: "e",
            previous: "",
        };

        let result = run("start:machine=", Mode::Leave, &context, &mut layer, &mut caps);
        assert_eq!(result, "");
        assert!(caps.calls.is_empty());

        let result = run("deploy", Mode::Leave, &context, &mut layer, &mut caps);
        assert_eq!(result, "");
        assert_eq!(caps.calls, vec!["execute deploy"]);
    }

    #[test]
    fn final_mode_only_runs_hierarchy_effects() {
        let mut layer = layer();
        let mut caps = Recorder::default();
        let context = WalkContext {
            external: "e",
            previous: "",
        };

        run("set:label=x,value=1", Mode::Final, &context, &mut layer, &mut caps);
        run("deploy", Mode::Final, &context, &mut layer, &mut caps);
        run("raise:event=done", Mode::Final, &context, &mut layer, &mut caps);
        run("write:label=result,value=ok", Mode::Final, &context, &mut layer, &mut caps);

        assert_eq!(layer.frames().lookup("x"), None);
        assert_eq!(caps.calls, vec!["raise done", "write result ok"]);
    }
}
