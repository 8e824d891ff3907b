//! Macros for writing machine definitions inline.

/// Build a [`MachineDef`](crate::core::MachineDef) from a compact table.
///
/// Each state is a label, optional `entry` and `leave` axions, and a braced
/// list of `event => target` transitions. `_` stands for the wildcard event.
///
/// # Example
///
/// ```
/// use fsmstack::machine;
///
/// let door = machine! {
///     "door" {
///         "start" { "open" => "opened" }
///         "opened" entry "inc:label=opens,value=1" { "close" => "start", _ => "opened" }
///         "final" leave "raise:event=gone" {}
///     }
/// };
///
/// assert_eq!(door.states.len(), 3);
/// assert_eq!(door.states[1].follow_on("knock"), Some("opened"));
/// ```
#[macro_export]
macro_rules! machine {
    (@event _) => {
        ""
    };
    (@event $event:literal) => {
        $event
    };
    (
        $name:literal {
            $(
                $label:literal
                $(entry $entry:literal)?
                $(leave $leave:literal)?
                { $($event:tt => $target:literal),* $(,)? }
            )*
        }
    ) => {
        $crate::core::MachineDef::new($name)
            $(
                .state({
                    #[allow(unused_mut)]
                    let mut state = $crate::core::StateDef::new($label);
                    $(state = state.on_entry($entry);)?
                    $(state = state.on_leave($leave);)?
                    $(state = state.on($crate::machine!(@event $event), $target);)*
                    state
                })
            )*
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{StateDef, TransitionDef};

    #[test]
    fn machine_macro_builds_states_in_order() {
        let def = machine! {
            "worker" {
                "start" { "started" => "busy" }
                "busy" entry "execute:task=1" leave "trace:debug=done" {
                    "success" => "final",
                    "failure" => "start",
                }
                "final" {}
            }
        };

        assert_eq!(def.name, "worker");
        let labels: Vec<_> = def.states.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["start", "busy", "final"]);
        assert_eq!(def.states[1].entry, "execute:task=1");
        assert_eq!(def.states[1].leave, "trace:debug=done");
        assert_eq!(
            def.states[1].transitions,
            vec![
                TransitionDef::new("success", "final"),
                TransitionDef::new("failure", "start"),
            ]
        );
    }

    #[test]
    fn underscore_is_the_wildcard() {
        let def = machine! {
            "loop" {
                "start" { _ => "start" }
            }
        };

        assert!(def.states[0].transitions[0].is_wildcard());
    }

    #[test]
    fn macro_matches_builder_output() {
        let from_macro = machine! {
            "m" {
                "start" leave "raise:event=x" { "go" => "final" }
                "final" {}
            }
        };

        let built = crate::core::MachineDef::new("m")
            .state(StateDef::new("start").on_leave("raise:event=x").on("go", "final"))
            .state(StateDef::new("final"));

        assert_eq!(from_macro, built);
    }
}
