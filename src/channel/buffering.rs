use std::collections::HashMap;

/// Pending text for buffers whose writes are coalesced until flushed.
///
/// While an entry exists for a buffer name, writes to that buffer are
/// absorbed here instead of going out one command per write; a flush
/// removes the entry and hands back everything accumulated so the caller
/// can send it as a single command. High-frequency producers (compiler
/// output, log streams) use this to trade latency for throughput.
#[derive(Debug, Default)]
pub struct BufferStore {
    pending: HashMap<String, String>,
}

impl BufferStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin coalescing writes to `name`. Calling this again while a
    /// session is open keeps the accumulated text.
    pub fn start(&mut self, name: &str) {
        self.pending.entry(name.to_string()).or_default();
    }

    /// Absorb `text` if a session is open for `name`. Returns `true` when
    /// the text was absorbed and must not be sent now.
    pub fn absorb(&mut self, name: &str, text: &str) -> bool {
        match self.pending.get_mut(name) {
            Some(buf) => {
                buf.push_str(text);
                true
            }
            None => false,
        }
    }

    /// End the session for `name`, yielding the accumulated text. `None`
    /// when no session is open.
    pub fn flush(&mut self, name: &str) -> Option<String> {
        self.pending.remove(name)
    }

    pub fn is_buffering(&self, name: &str) -> bool {
        self.pending.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorb_without_session_is_refused() {
        let mut store = BufferStore::new();
        assert!(!store.absorb("out", "hello"));
        assert!(store.flush("out").is_none());
    }

    #[test]
    fn absorb_accumulates_in_order() {
        let mut store = BufferStore::new();
        store.start("out");
        assert!(store.absorb("out", "a"));
        assert!(store.absorb("out", "b"));
        assert_eq!(store.flush("out").as_deref(), Some("ab"));
    }

    #[test]
    fn start_is_idempotent() {
        let mut store = BufferStore::new();
        store.start("out");
        store.absorb("out", "kept");
        store.start("out");
        assert_eq!(store.flush("out").as_deref(), Some("kept"));
    }

    #[test]
    fn flush_removes_the_session() {
        let mut store = BufferStore::new();
        store.start("out");
        store.absorb("out", "x");
        assert!(store.is_buffering("out"));

        assert_eq!(store.flush("out").as_deref(), Some("x"));
        assert!(!store.is_buffering("out"));
        assert!(store.flush("out").is_none());
        assert!(!store.absorb("out", "late"));
    }

    #[test]
    fn sessions_are_independent_per_name() {
        let mut store = BufferStore::new();
        store.start("a");
        assert!(store.absorb("a", "1"));
        assert!(!store.absorb("b", "2"));
        assert_eq!(store.flush("a").as_deref(), Some("1"));
    }

    #[test]
    fn flush_of_untouched_session_yields_empty_payload() {
        let mut store = BufferStore::new();
        store.start("out");
        assert_eq!(store.flush("out").as_deref(), Some(""));
    }
}
