use std::time::Duration;

#[derive(Debug)]
struct Pending<T> {
    seq: u64,
    due: Duration,
    payload: T,
}

/// Cancellable one-shot delayed tasks on a virtual clock.
///
/// Time only moves through [`Scheduler::advance`], so the owner decides when
/// due tasks run and they always run on the owner's thread.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_seq: u64,
    tasks: Vec<Pending<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            tasks: Vec::new(),
        }
    }

    pub fn schedule(&mut self, delay: Duration, payload: T) {
        self.tasks.push(Pending {
            seq: self.next_seq,
            due: self.now + delay,
            payload,
        });
        self.next_seq += 1;
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    /// Moves the clock forward and hands back every task now due, earliest first
    pub fn advance(&mut self, elapsed: Duration) -> Vec<T> {
        self.now += elapsed;
        let now = self.now;

        let (mut due, waiting): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|t| t.due <= now);
        self.tasks = waiting;

        due.sort_by_key(|t| (t.due, t.seq));
        due.into_iter().map(|t| t.payload).collect()
    }

    /// Time until the earliest pending task is due
    pub fn until_next_due(&self) -> Option<Duration> {
        self.tasks
            .iter()
            .map(|t| t.due.saturating_sub(self.now))
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_runs_when_due() {
        let mut s = Scheduler::new();
        s.schedule(Duration::from_millis(800), "advance");

        assert!(s.advance(Duration::from_millis(799)).is_empty());
        assert_eq!(s.advance(Duration::from_millis(1)), vec!["advance"]);
        assert_eq!(s.until_next_due(), None);
    }

    #[test]
    fn test_tasks_come_back_in_due_order() {
        let mut s = Scheduler::new();
        s.schedule(Duration::from_millis(1200), 2);
        s.schedule(Duration::from_millis(800), 1);
        s.schedule(Duration::from_millis(1200), 3);

        assert_eq!(s.advance(Duration::from_secs(2)), vec![1, 2, 3]);
    }

    #[test]
    fn test_cancel_all() {
        let mut s = Scheduler::new();
        s.schedule(Duration::from_millis(100), 'a');
        s.schedule(Duration::from_millis(200), 'b');
        s.cancel_all();
        assert_eq!(s.until_next_due(), None);
        assert!(s.advance(Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn test_until_next_due() {
        let mut s = Scheduler::new();
        assert_eq!(s.until_next_due(), None);

        s.schedule(Duration::from_millis(1200), ());
        s.schedule(Duration::from_millis(800), ());
        s.advance(Duration::from_millis(300));

        assert_eq!(s.until_next_due(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_delay_is_relative_to_current_time() {
        let mut s = Scheduler::new();
        s.advance(Duration::from_secs(10));
        s.schedule(Duration::from_millis(500), ());

        assert!(s.advance(Duration::from_millis(400)).is_empty());
        assert_eq!(s.advance(Duration::from_millis(100)).len(), 1);
    }
}
