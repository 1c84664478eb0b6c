use std::time::{Duration, Instant};

use crate::source::ThreadSummary;

/// Threads whose title or username contains `query` (ignoring case), or whose
/// id contains it as written. An empty query keeps everything.
pub fn filter_threads<'a>(threads: &'a [ThreadSummary], query: &str) -> Vec<&'a ThreadSummary> {
    if query.is_empty() {
        return threads.iter().collect();
    }
    let needle = query.to_lowercase();
    threads
        .iter()
        .filter(|t| {
            t.title.to_lowercase().contains(&needle)
                || t.username.to_lowercase().contains(&needle)
                || t.thread_id.to_string().contains(query)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    Pending { query: String, deadline: Instant },
    Fired,
    Canceled,
}

/// Live-search debounce.
///
/// Each keystroke replaces whatever was pending and restarts the delay; only
/// the last input survives to fire.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    state: DebounceState,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Debouncer { delay, state: DebounceState::Idle }
    }

    pub fn state(&self) -> &DebounceState {
        &self.state
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn input(&mut self, query: &str, now: Instant) {
        self.state = DebounceState::Pending { query: query.to_string(), deadline: now + self.delay };
    }

    pub fn deadline(&self) -> Option<Instant> {
        match &self.state {
            DebounceState::Pending { deadline, .. } => Some(*deadline),
            _ => None,
        }
    }

    /// Fire if the delay has elapsed, yielding the trimmed query
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match &self.state {
            DebounceState::Pending { query, deadline } if now >= *deadline => {
                let query = query.trim().to_string();
                self.state = DebounceState::Fired;
                Some(query)
            }
            _ => None,
        }
    }

    /// Drop a pending input; returns whether anything was pending
    pub fn cancel(&mut self) -> bool {
        if matches!(self.state, DebounceState::Pending { .. }) {
            self.state = DebounceState::Canceled;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread(id: u64, title: &str, user: &str) -> ThreadSummary {
        ThreadSummary {
            thread_id: id,
            title: title.into(),
            username: user.into(),
            size: 1,
            created_at: "2024-01-01T00:00:00Z".into(),
            updated_at: "2024-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn empty_query_keeps_all() {
        let threads = vec![thread(1, "a", "b"), thread(2, "c", "d")];
        assert_eq!(filter_threads(&threads, "").len(), 2);
    }

    #[test]
    fn id_match_is_literal() {
        let threads = vec![thread(1234, "x", "y")];
        assert_eq!(filter_threads(&threads, "23").len(), 1);
        assert!(filter_threads(&threads, "24").is_empty());
    }

    #[test]
    fn later_input_restarts_delay() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(150));
        d.input("f", t0);
        d.input("fo", t0 + Duration::from_millis(100));
        assert_eq!(d.poll(t0 + Duration::from_millis(200)), None);
        assert_eq!(d.poll(t0 + Duration::from_millis(250)).as_deref(), Some("fo"));
        assert_eq!(d.state(), &DebounceState::Fired);
        assert_eq!(d.poll(t0 + Duration::from_secs(5)), None);
    }

    #[test]
    fn cancel_only_affects_pending() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(150));
        assert!(!d.cancel());
        d.input(" q ", t0);
        assert!(d.cancel());
        assert_eq!(d.state(), &DebounceState::Canceled);
        assert_eq!(d.poll(t0 + Duration::from_secs(1)), None);
    }
}
