use crossterm::event::KeyCode;
use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};
use ratatui::widgets::{Block, Borders, Gauge};
use ratatui::Frame;
use tracing::info;

use crate::app::jobs::JobMessage;
use crate::app::message::{Effect, Msg};
use crate::app::overlay::{Level, ShortcutGroup};
use crate::app::progress::{completion_ratio, LogBuffer, Summary, Verdict};
use crate::app::screen::{Component, Parent, Update};
use crate::app::steps::{Advance, StepResult, StepSequence, StepStatus};
use crate::app::Context;
use crate::ui::widgets::{self, StatusBarState};

/// Runs a step sequence one step at a time and shows its progress
#[derive(Debug)]
pub struct SequenceScreen {
    title: String,
    sequence: StepSequence,
    logs: LogBuffer,
    parent: Parent,
    summary: Option<Summary>,
    spinner: usize,
}

impl SequenceScreen {
    pub fn new(
        title: impl Into<String>,
        sequence: StepSequence,
        parent: Parent,
        log_capacity: usize,
    ) -> Self {
        Self {
            title: title.into(),
            sequence,
            logs: LogBuffer::new(log_capacity),
            parent,
            summary: None,
            spinner: 0,
        }
    }

    pub fn sequence(&self) -> &StepSequence {
        &self.sequence
    }

    pub fn logs(&self) -> &LogBuffer {
        &self.logs
    }

    /// Set once the last step (or the halting one) reported back
    pub fn summary(&self) -> Option<Summary> {
        self.summary
    }

    pub fn is_finished(&self) -> bool {
        self.summary.is_some()
    }

    fn finish(&mut self, summary: Summary) -> Effect {
        self.summary = Some(summary);
        let verdict = summary.verdict();
        info!(
            "{} finished: {}/{} passed, {} warnings, {} failed",
            self.title, summary.passed, summary.total, summary.warning, summary.failed
        );

        let mut message = format!(
            "{} of {} passed ({:.0}%)",
            summary.passed,
            summary.total,
            summary.success_rate()
        );
        if self.sequence.is_halted() {
            message.push_str(", stopped after a failure");
        }
        self.logs.record(format!("{}: {}", widgets::verdict_text(verdict), message));

        let level = match verdict {
            Verdict::Perfect => Level::Success,
            Verdict::Mostly => Level::Warning,
            Verdict::NeedsAttention => Level::Error,
        };
        Effect::notify(level, self.title.clone(), message)
    }

    fn on_step(&mut self, result: StepResult) -> Update {
        let index = result.index;
        let logs = result.logs.clone();

        let advance = self.sequence.apply(result);
        if advance == Advance::Ignored {
            return Update::none();
        }

        for line in logs {
            self.logs.record(line);
        }
        if let Some(step) = self.sequence.steps().get(index) {
            let label = match step.status() {
                StepStatus::Completed => "done",
                StepStatus::Warning => "warning",
                _ => "failed",
            };
            self.logs.record(format!(
                "{} {}: {}",
                step.name,
                label,
                step.message().unwrap_or_default()
            ));
        }

        match advance {
            Advance::Next(job) => Update::effect(Effect::Spawn(job)),
            Advance::Finished(summary) => Update::effect(self.finish(summary)),
            Advance::Ignored => Update::none(),
        }
    }
}

impl Component for SequenceScreen {
    fn init(&mut self, _ctx: &Context) -> Vec<Effect> {
        self.logs.record(format!("Starting {}", self.title.to_lowercase()));
        match self.sequence.start() {
            Some(job) => vec![Effect::Spawn(job)],
            None => {
                let summary = self.sequence.summary();
                vec![self.finish(summary)]
            }
        }
    }

    fn update(&mut self, msg: Msg, ctx: &Context) -> Update {
        match msg {
            Msg::Job(JobMessage::Step(result)) => self.on_step(result),
            Msg::Job(JobMessage::StepProgress { index, fraction }) => {
                self.sequence.set_progress(index, fraction);
                Update::none()
            }
            Msg::Tick => {
                self.spinner = self.spinner.wrapping_add(1);
                Update::none()
            }
            Msg::Key(key) => match key.code {
                KeyCode::Esc => {
                    if !self.is_finished() {
                        info!("Leaving {} while a step is still running", self.title);
                    }
                    self.parent.update(ctx)
                }
                KeyCode::Enter if self.is_finished() => self.parent.update(ctx),
                _ => Update::none(),
            },
            _ => Update::none(),
        }
    }

    fn draw(&self, frame: &mut Frame, area: Rect, ctx: &Context) {
        let theme = &ctx.theme;
        let steps_height = (self.sequence.steps().len() as u16 + 2).min(area.height / 2).max(3);
        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(steps_height),
                Constraint::Min(3),
                Constraint::Length(if self.is_finished() { 3 } else { 0 }),
            ])
            .split(area);

        let ratio = completion_ratio(self.sequence.steps());
        let label = format!(
            "{}/{} steps",
            self.sequence.current(),
            self.sequence.steps().len()
        );
        let gauge = Gauge::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.border_style())
                    .title(format!(" {} ", self.title))
                    .title_style(theme.primary_style()),
            )
            .gauge_style(theme.primary_style())
            .ratio(ratio.clamp(0.0, 1.0))
            .label(label);
        frame.render_widget(gauge, chunks[0]);

        widgets::draw_steps(frame, chunks[1], self.sequence.steps(), self.spinner, theme);
        widgets::draw_logs(frame, chunks[2], &self.logs, theme);
        if let Some(summary) = &self.summary {
            widgets::draw_summary(frame, chunks[3], summary, self.sequence.is_halted(), theme);
        }
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn shortcuts(&self) -> Vec<ShortcutGroup> {
        vec![ShortcutGroup::new("Progress")
            .key("Esc", "Back; the running step still finishes")
            .key("Enter", "Back, once everything finished")]
    }

    fn status(&self) -> StatusBarState {
        if self.is_finished() {
            StatusBarState::finished()
        } else {
            StatusBarState::running()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::jobs::{Job, StepTask};
    use crate::app::screen::Screen;
    use crate::app::steps::{FailurePolicy, Outcome, Step};
    use crate::testing::{context_with, FakeService};
    use crossterm::event::{KeyEvent, KeyModifiers};

    fn screen(n: usize, policy: FailurePolicy) -> SequenceScreen {
        let steps = (0..n)
            .map(|i| Step::new(format!("step {i}"), "", StepTask::DetectSystem))
            .collect();
        SequenceScreen::new("Test", StepSequence::new(steps, policy), Parent::Backup, 6)
    }

    fn result(index: usize, outcome: Outcome, logs: &[&str]) -> Msg {
        Msg::Job(JobMessage::Step(StepResult {
            index,
            outcome,
            message: format!("step {index} said hi"),
            logs: logs.iter().map(|l| l.to_string()).collect(),
        }))
    }

    #[test]
    fn steps_run_one_after_another() {
        let ctx = context_with(FakeService::default(), None);
        let mut seq = screen(2, FailurePolicy::Continue);

        let effects = seq.init(&ctx);
        assert!(matches!(effects[..], [Effect::Spawn(Job::Step { index: 0, .. })]));

        let update = seq.update(result(0, Outcome::Passed, &["first"]), &ctx);
        assert!(matches!(update.effects[..], [Effect::Spawn(Job::Step { index: 1, .. })]));
        assert!(!seq.is_finished());

        let update = seq.update(result(1, Outcome::Failed, &[]), &ctx);
        assert!(matches!(
            update.effects[..],
            [Effect::Notify {
                level: Level::Error,
                ..
            }]
        ));
        assert_eq!(seq.summary().map(|s| (s.passed, s.failed)), Some((1, 1)));

        let lines: Vec<String> = seq.logs().entries().map(|e| e.message.clone()).collect();
        assert_eq!(lines[0], "Starting test");
        assert!(lines.contains(&"first".to_string()));
        assert!(lines.contains(&"step 1 failed: step 1 said hi".to_string()));
    }

    #[test]
    fn empty_sequence_finishes_on_init() {
        let ctx = context_with(FakeService::default(), None);
        let mut seq = screen(0, FailurePolicy::Continue);
        let effects = seq.init(&ctx);
        assert!(matches!(
            effects[..],
            [Effect::Notify {
                level: Level::Success,
                ..
            }]
        ));
        assert_eq!(seq.summary().map(|s| s.success_rate()), Some(100.0));
    }

    #[test]
    fn duplicate_results_are_ignored() {
        let ctx = context_with(FakeService::default(), None);
        let mut seq = screen(2, FailurePolicy::Continue);
        seq.init(&ctx);
        seq.update(result(0, Outcome::Passed, &[]), &ctx);
        let logged = seq.logs().len();

        let update = seq.update(result(0, Outcome::Passed, &["again"]), &ctx);
        assert!(update.effects.is_empty());
        assert_eq!(seq.logs().len(), logged);
    }

    #[test]
    fn escape_while_running_goes_to_the_parent() {
        let ctx = context_with(FakeService::default(), None);
        let mut seq = screen(2, FailurePolicy::Continue);
        seq.init(&ctx);

        // Enter does nothing until the sequence finished
        let update = seq.update(Msg::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)), &ctx);
        assert!(!update.navigated());

        let update = seq.update(Msg::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)), &ctx);
        match update.next {
            Some(Screen::Submenu(submenu)) => {
                assert_eq!(submenu.kind(), crate::app::screens::SubmenuKind::Backup)
            }
            other => panic!("unexpected transition {:?}", other.map(|s| s.name())),
        }
    }

    #[test]
    fn running_step_shows_its_progress() {
        let ctx = context_with(FakeService::default(), None);
        let mut seq = screen(2, FailurePolicy::Continue);
        seq.init(&ctx);

        let progress = |index, fraction| Msg::Job(JobMessage::StepProgress { index, fraction });
        seq.update(progress(0, 0.5), &ctx);
        // Only the running step moves
        seq.update(progress(1, 0.9), &ctx);
        assert_eq!(seq.sequence().steps()[0].progress(), Some(0.5));
        assert_eq!(seq.sequence().steps()[1].progress(), None);

        let mut terminal = ratatui::Terminal::new(ratatui::backend::TestBackend::new(80, 20)).unwrap();
        terminal
            .draw(|frame| seq.draw(frame, frame.area(), &ctx))
            .unwrap();
        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(text.contains("step 0  50%"));
    }
}
