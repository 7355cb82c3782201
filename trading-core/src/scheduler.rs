//! Periodic background queries.
//!
//! A [`QueryScheduler`] is driven by a timer. Outside trading hours every
//! `threshold`-th tick rotates the queue and yields the operation at its
//! head; inside trading hours the timer is ignored so refresh queries never
//! compete with live traffic.

use chrono::{NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use trading::model::market_data::china_tz;

/// One continuous trading session, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TradingWindow {
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingWindows {
    windows: Vec<TradingWindow>,
}

impl TradingWindows {
    pub fn new(windows: Vec<TradingWindow>) -> Self {
        Self { windows }
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        self.windows.iter().any(|window| window.contains(time))
    }

    /// Exchange-local wall-clock time.
    pub fn local_now() -> NaiveTime {
        Utc::now().with_timezone(&china_tz()).time()
    }

    pub fn is_trading_now(&self) -> bool {
        self.contains(Self::local_now())
    }
}

impl Default for TradingWindows {
    /// Morning 09:30-11:30 and afternoon 13:00-15:00 sessions.
    fn default() -> Self {
        let at = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN);
        Self::new(vec![
            TradingWindow {
                start: at(9, 30),
                end: at(11, 30),
            },
            TradingWindow {
                start: at(13, 0),
                end: at(15, 0),
            },
        ])
    }
}

/// Round-robin queue of refresh operations.
#[derive(Debug, Clone)]
pub struct QueryScheduler<Op> {
    queue: VecDeque<Op>,
    count: u32,
    threshold: u32,
    windows: TradingWindows,
}

impl<Op: Clone> QueryScheduler<Op> {
    /// # Arguments
    ///
    /// * `ops` - Operations in their initial rotation order.
    /// * `threshold` - Timer ticks between two executions (at least 1).
    /// * `windows` - Trading hours during which the scheduler stays idle.
    pub fn new(ops: Vec<Op>, threshold: u32, windows: TradingWindows) -> Self {
        Self {
            queue: ops.into(),
            count: 0,
            threshold: threshold.max(1),
            windows,
        }
    }

    /// Advances the scheduler by one timer tick at local time `now`.
    ///
    /// # Returns
    ///
    /// * `Some(op)` - The operation to run now; it has moved to the tail of the queue.
    /// * `None` - Nothing is due.
    pub fn on_timer(&mut self, now: NaiveTime) -> Option<Op> {
        if self.windows.contains(now) {
            return None;
        }
        self.count += 1;
        if self.count < self.threshold {
            return None;
        }
        self.count = 0;

        let op = self.queue.pop_front()?;
        self.queue.push_back(op.clone());
        Some(op)
    }

    pub fn pending(&self) -> impl Iterator<Item = &Op> {
        self.queue.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_default_windows_are_inclusive() {
        let windows = TradingWindows::default();
        assert!(windows.contains(at(9, 30)));
        assert!(windows.contains(at(11, 30)));
        assert!(windows.contains(at(14, 0)));
        assert!(!windows.contains(at(12, 0)));
        assert!(!windows.contains(at(15, 1)));
        assert!(!windows.contains(at(9, 29)));
    }

    #[test]
    fn test_scheduler_rotates_every_second_tick() {
        let mut scheduler =
            QueryScheduler::new(vec!["account", "position"], 2, TradingWindows::default());
        let evening = at(20, 0);

        assert_eq!(scheduler.on_timer(evening), None);
        assert_eq!(scheduler.on_timer(evening), Some("account"));
        assert_eq!(scheduler.on_timer(evening), None);
        assert_eq!(scheduler.on_timer(evening), Some("position"));
        assert_eq!(scheduler.on_timer(evening), None);
        assert_eq!(scheduler.on_timer(evening), Some("account"));
        assert_eq!(
            scheduler.pending().copied().collect::<Vec<_>>(),
            vec!["position", "account"]
        );
    }

    #[test]
    fn test_scheduler_idle_during_trading_hours() {
        let mut scheduler = QueryScheduler::new(vec!["position"], 2, TradingWindows::default());
        for _ in 0..10 {
            assert_eq!(scheduler.on_timer(at(10, 0)), None);
        }
        // the counter did not advance while idle
        assert_eq!(scheduler.on_timer(at(12, 0)), None);
        assert_eq!(scheduler.on_timer(at(12, 0)), Some("position"));
    }

    #[test]
    fn test_empty_scheduler_yields_nothing() {
        let mut scheduler: QueryScheduler<u8> =
            QueryScheduler::new(Vec::new(), 1, TradingWindows::default());
        assert_eq!(scheduler.on_timer(at(20, 0)), None);
    }
}
