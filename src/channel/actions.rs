use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use tracing::warn;

use super::tokenizer::tokenize;

/// Handler invoked with the argument tokens of an inbound command.
pub type Action = Arc<dyn Fn(&[String]) + Send + Sync>;

/// Mapping from inbound command name to handler.
///
/// Registration is last-wins. Dispatching a name with no handler is
/// logged and otherwise ignored; a panicking handler is contained so the
/// reader loop keeps running.
#[derive(Default)]
pub struct ActionRegistry {
    actions: Mutex<HashMap<String, Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `name`, replacing any previous one.
    pub fn register<F>(&self, name: impl Into<String>, action: F)
    where
        F: Fn(&[String]) + Send + Sync + 'static,
    {
        self.actions
            .lock()
            .unwrap()
            .insert(name.into(), Arc::new(action));
    }

    /// Tokenize `raw` and invoke the handler registered for its first
    /// token, passing the remaining tokens as arguments.
    pub fn dispatch(&self, raw: &str) {
        let tokens = tokenize(raw);
        let Some((name, args)) = tokens.split_first() else {
            return;
        };
        // Clone the handler out so a handler can itself register actions.
        let action = self.actions.lock().unwrap().get(name).cloned();
        let Some(action) = action else {
            warn!("no such action: {name}");
            return;
        };
        if panic::catch_unwind(AssertUnwindSafe(|| action(args))).is_err() {
            warn!("action '{name}' panicked");
        }
    }

    /// Number of registered actions.
    pub fn len(&self) -> usize {
        self.actions.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_registry() -> (ActionRegistry, Arc<Mutex<Vec<Vec<String>>>>) {
        let registry = ActionRegistry::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        registry.register("visit", move |args: &[String]| {
            sink.lock().unwrap().push(args.to_vec());
        });
        (registry, calls)
    }

    #[test]
    fn dispatch_invokes_handler_with_remaining_tokens() {
        let (registry, calls) = recording_registry();
        registry.dispatch(r#"visit "a file.rs" 10 0"#);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], vec!["a file.rs", "10", "0"]);
    }

    #[test]
    fn dispatch_with_no_arguments_passes_empty_slice() {
        let (registry, calls) = recording_registry();
        registry.dispatch("visit");

        assert_eq!(calls.lock().unwrap()[0], Vec::<String>::new());
    }

    #[test]
    fn unknown_command_is_ignored() {
        let (registry, calls) = recording_registry();
        registry.dispatch("frobnicate 1 2");

        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn empty_line_is_skipped() {
        let (registry, calls) = recording_registry();
        registry.dispatch("   ");

        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn reregistering_replaces_the_handler() {
        let (registry, calls) = recording_registry();
        let hits = Arc::new(Mutex::new(0u32));
        let sink = hits.clone();
        registry.register("visit", move |_: &[String]| {
            *sink.lock().unwrap() += 1;
        });

        registry.dispatch("visit x");
        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(*hits.lock().unwrap(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn panicking_handler_does_not_poison_dispatch() {
        let (registry, calls) = recording_registry();
        registry.register("boom", |_: &[String]| panic!("handler bug"));

        registry.dispatch("boom");
        registry.dispatch("visit after");

        assert_eq!(calls.lock().unwrap()[0], vec!["after"]);
    }
}
