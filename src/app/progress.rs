use chrono::{DateTime, Local};
use std::collections::VecDeque;

use super::steps::{Step, StepStatus};

/// One timestamped line of an operation log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub at: DateTime<Local>,
    pub message: String,
}

impl LogEntry {
    pub fn line(&self) -> String {
        format!("[{}] {}", self.at.format("%H:%M:%S"), self.message)
    }
}

/// Bounded FIFO of log entries; the oldest entry is evicted once full
#[derive(Debug, Clone)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, message: impl Into<String>) {
        self.record_at(Local::now(), message);
    }

    pub fn record_at(&mut self, at: DateTime<Local>, message: impl Into<String>) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            at,
            message: message.into(),
        });
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Overall reading of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Every step passed
    Perfect,
    /// At least 80% passed
    Mostly,
    NeedsAttention,
}

/// Outcome counts, always derived from the steps themselves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub warning: usize,
}

impl Summary {
    pub fn from_steps(steps: &[Step]) -> Self {
        let mut summary = Summary {
            total: steps.len(),
            ..Summary::default()
        };
        for step in steps {
            match step.status() {
                StepStatus::Completed => summary.passed += 1,
                StepStatus::Failed => summary.failed += 1,
                StepStatus::Warning => summary.warning += 1,
                StepStatus::Pending | StepStatus::Running => {}
            }
        }
        summary
    }

    /// Percentage of passed steps; an empty run counts as fully successful
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.passed as f64 / self.total as f64 * 100.0
    }

    pub fn verdict(&self) -> Verdict {
        let rate = self.success_rate();
        if rate >= 100.0 {
            Verdict::Perfect
        } else if rate >= 80.0 {
            Verdict::Mostly
        } else {
            Verdict::NeedsAttention
        }
    }
}

/// Fraction of steps in a terminal state, 1.0 for an empty list
pub fn completion_ratio(steps: &[Step]) -> f64 {
    if steps.is_empty() {
        return 1.0;
    }
    let done = steps.iter().filter(|s| s.status().is_terminal()).count();
    done as f64 / steps.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::jobs::StepTask;
    use crate::app::steps::Outcome;

    fn step_with(outcome: Option<Outcome>) -> Step {
        let mut step = Step::new("check", "", StepTask::DetectSystem);
        if let Some(outcome) = outcome {
            step.start();
            step.finish(outcome, None);
        }
        step
    }

    #[test]
    fn buffer_keeps_the_last_entries_in_order() {
        let mut logs = LogBuffer::new(6);
        for i in 1..=8 {
            logs.record(format!("message {i}"));
        }
        let kept: Vec<_> = logs.entries().map(|e| e.message.clone()).collect();
        assert_eq!(logs.len(), 6);
        assert_eq!(kept.first().map(String::as_str), Some("message 3"));
        assert_eq!(kept.last().map(String::as_str), Some("message 8"));
    }

    #[test]
    fn zero_capacity_still_holds_one_entry() {
        let mut logs = LogBuffer::new(0);
        logs.record("a");
        logs.record("b");
        assert_eq!(logs.capacity(), 1);
        assert_eq!(logs.entries().next().map(|e| e.message.as_str()), Some("b"));
    }

    #[test]
    fn lines_carry_a_clock_prefix() {
        let mut logs = LogBuffer::new(2);
        logs.record("copied .zshrc");
        let line = logs.entries().next().unwrap().line();
        assert!(line.starts_with('['));
        assert_eq!(&line[9..], "] copied .zshrc");
    }

    #[test]
    fn empty_summary_does_not_divide_by_zero() {
        let summary = Summary::from_steps(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.success_rate(), 100.0);
        assert_eq!(summary.verdict(), Verdict::Perfect);
        assert_eq!(completion_ratio(&[]), 1.0);
    }

    #[test]
    fn summary_counts_each_outcome() {
        let steps = vec![
            step_with(Some(Outcome::Passed)),
            step_with(Some(Outcome::Passed)),
            step_with(Some(Outcome::Passed)),
            step_with(Some(Outcome::Passed)),
            step_with(Some(Outcome::Warning)),
            step_with(Some(Outcome::Failed)),
            step_with(None),
        ];
        let summary = Summary::from_steps(&steps);
        assert_eq!(
            summary,
            Summary {
                total: 7,
                passed: 4,
                failed: 1,
                warning: 1
            }
        );
        assert_eq!(summary.verdict(), Verdict::NeedsAttention);
        assert!((completion_ratio(&steps) - 6.0 / 7.0).abs() < f64::EPSILON);
    }
}
