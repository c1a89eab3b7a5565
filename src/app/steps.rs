use tracing::{debug, warn};

use super::jobs::{Job, StepTask};
use super::progress::Summary;

/// Lifecycle of a step: `Pending -> Running -> {Completed, Warning, Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    /// Completed, but something optional was missing
    Warning,
    Failed,
}

impl StepStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepStatus::Completed | StepStatus::Warning | StepStatus::Failed
        )
    }

    pub fn can_become(&self, next: StepStatus) -> bool {
        match self {
            StepStatus::Pending => next == StepStatus::Running,
            StepStatus::Running => next.is_terminal(),
            _ => false,
        }
    }
}

/// What a unit of work reports for its step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Warning,
    Failed,
}

impl Outcome {
    fn status(self) -> StepStatus {
        match self {
            Outcome::Passed => StepStatus::Completed,
            Outcome::Warning => StepStatus::Warning,
            Outcome::Failed => StepStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub index: usize,
    pub outcome: Outcome,
    pub message: String,
    pub logs: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Step {
    pub name: String,
    pub description: String,
    status: StepStatus,
    message: Option<String>,
    /// Sub-progress in [0, 1]
    progress: Option<f32>,
    task: StepTask,
}

impl Step {
    pub fn new(name: impl Into<String>, description: impl Into<String>, task: StepTask) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            status: StepStatus::Pending,
            message: None,
            progress: None,
            task,
        }
    }

    pub fn status(&self) -> StepStatus {
        self.status
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn progress(&self) -> Option<f32> {
        self.progress
    }

    pub fn task(&self) -> &StepTask {
        &self.task
    }

    /// Ignored unless the step is running
    pub fn set_progress(&mut self, fraction: f32) -> bool {
        if self.status != StepStatus::Running {
            return false;
        }
        self.progress = Some(fraction.clamp(0.0, 1.0));
        true
    }

    /// Returns false when the step was not pending
    pub fn start(&mut self) -> bool {
        if !self.status.can_become(StepStatus::Running) {
            return false;
        }
        self.status = StepStatus::Running;
        self.progress = Some(0.0);
        true
    }

    /// Returns false when the step was not running
    pub fn finish(&mut self, outcome: Outcome, message: Option<String>) -> bool {
        let next = outcome.status();
        if !self.status.can_become(next) {
            return false;
        }
        self.status = next;
        self.message = message;
        self.progress = Some(1.0);
        true
    }
}

/// Whether a failed step stops the remaining ones
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    #[default]
    Continue,
    Halt,
}

/// What the runner does after a step result
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// Dispatch this unit of work next
    Next(Job),
    /// Nothing left to run
    Finished(Summary),
    /// The result did not belong to the running step
    Ignored,
}

/// Ordered steps run one at a time. `current` only moves forward and the
/// sequence is complete when it reaches `len`.
#[derive(Debug, Clone)]
pub struct StepSequence {
    steps: Vec<Step>,
    current: usize,
    policy: FailurePolicy,
    halted: bool,
}

impl StepSequence {
    pub fn new(steps: Vec<Step>, policy: FailurePolicy) -> Self {
        Self {
            steps,
            current: 0,
            policy,
            halted: false,
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn is_complete(&self) -> bool {
        self.current == self.steps.len()
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Complete, or stopped early by the failure policy
    pub fn is_finished(&self) -> bool {
        self.is_complete() || self.halted
    }

    pub fn running(&self) -> Option<&Step> {
        self.steps
            .get(self.current)
            .filter(|s| s.status() == StepStatus::Running)
    }

    pub fn summary(&self) -> Summary {
        Summary::from_steps(&self.steps)
    }

    /// Mark the first step running and hand back its work. `None` for an
    /// empty sequence or one that already started.
    pub fn start(&mut self) -> Option<Job> {
        if self.current != 0 {
            return None;
        }
        self.dispatch()
    }

    fn dispatch(&mut self) -> Option<Job> {
        let index = self.current;
        let step = self.steps.get_mut(index)?;
        if !step.start() {
            return None;
        }
        debug!("Dispatching step {} ({})", index, step.name);
        Some(Job::Step {
            index,
            task: step.task.clone(),
        })
    }

    /// Progress reports for anything but the running step are dropped
    pub fn set_progress(&mut self, index: usize, fraction: f32) -> bool {
        if index != self.current {
            return false;
        }
        self.steps
            .get_mut(index)
            .is_some_and(|step| step.set_progress(fraction))
    }

    pub fn apply(&mut self, result: StepResult) -> Advance {
        if self.is_finished() || result.index != self.current {
            warn!(
                "Ignoring result for step {} (current {})",
                result.index, self.current
            );
            return Advance::Ignored;
        }

        let Some(step) = self.steps.get_mut(self.current) else {
            return Advance::Ignored;
        };
        let message = (!result.message.is_empty()).then(|| result.message.clone());
        if !step.finish(result.outcome, message) {
            return Advance::Ignored;
        }
        self.current += 1;

        if result.outcome == Outcome::Failed && self.policy == FailurePolicy::Halt {
            self.halted = !self.is_complete();
            if self.halted {
                debug!("Halting after failed step {}", result.index);
            }
            return Advance::Finished(self.summary());
        }

        match self.dispatch() {
            Some(job) => Advance::Next(job),
            None => Advance::Finished(self.summary()),
        }
    }
}
