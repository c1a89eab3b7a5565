use crate::app::progress::{LogBuffer, Summary, Verdict};
use crate::app::steps::{Step, StepStatus};
use crate::ui::Theme;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

pub fn spinner_char(frame: usize) -> char {
    SPINNER[frame % SPINNER.len()]
}

fn status_char(status: StepStatus, spinner: usize) -> char {
    match status {
        StepStatus::Pending => ' ',
        StepStatus::Running => spinner_char(spinner),
        StepStatus::Completed => 'x',
        StepStatus::Warning => '~',
        StepStatus::Failed => '!',
    }
}

/// Partial progress of a running step, hidden until it moves off zero
fn running_fraction(step: &Step) -> Option<f32> {
    if step.status() != StepStatus::Running {
        return None;
    }
    step.progress().filter(|f| *f > 0.0)
}

pub fn draw_steps(frame: &mut Frame, area: Rect, steps: &[Step], spinner: usize, theme: &Theme) {
    let lines: Vec<Line> = steps
        .iter()
        .map(|step| {
            let style = theme.status_style(step.status());
            let mut spans = vec![Span::styled(
                format!(" [{}] {}", status_char(step.status(), spinner), step.name),
                style,
            )];
            if let Some(fraction) = running_fraction(step) {
                spans.push(Span::styled(
                    format!(" {:>3}%", (fraction * 100.0).round() as u32),
                    theme.secondary_style(),
                ));
            }
            match step.message() {
                Some(message) => {
                    spans.push(Span::styled(format!("  {}", message), theme.muted_style()))
                }
                None if step.status() == StepStatus::Running => {
                    spans.push(Span::styled(
                        format!("  {}", step.description),
                        theme.muted_style(),
                    ))
                }
                None => {}
            }
            Line::from(spans)
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title(" Steps ")
        .title_style(theme.primary_style());
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

pub fn draw_logs(frame: &mut Frame, area: Rect, logs: &LogBuffer, theme: &Theme) {
    let lines: Vec<Line> = logs
        .entries()
        .map(|entry| Line::from(Span::styled(entry.line(), theme.muted_style())))
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style())
        .title(" Log ")
        .title_style(theme.primary_style());
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

pub fn verdict_text(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Perfect => "Everything is in place",
        Verdict::Mostly => "Mostly configured",
        Verdict::NeedsAttention => "Needs attention",
    }
}

pub fn draw_summary(frame: &mut Frame, area: Rect, summary: &Summary, halted: bool, theme: &Theme) {
    let verdict = summary.verdict();
    let verdict_style = match verdict {
        Verdict::Perfect => theme.success_style(),
        Verdict::Mostly => theme.warning_style(),
        Verdict::NeedsAttention => theme.error_style(),
    };

    let mut spans = vec![
        Span::styled(format!(" {} ", verdict_text(verdict)), verdict_style.add_modifier(Modifier::BOLD)),
        Span::styled(format!(" {:.0}% ", summary.success_rate()), theme.style()),
        Span::styled(format!(" {} passed", summary.passed), theme.success_style()),
        Span::styled(format!("  {} warnings", summary.warning), theme.warning_style()),
        Span::styled(format!("  {} failed", summary.failed), theme.error_style()),
        Span::styled(format!("  of {}", summary.total), theme.muted_style()),
    ];
    if halted {
        spans.push(Span::styled("  (stopped after a failure)", theme.error_style()));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(verdict_style)
        .title(" Summary ")
        .title_style(verdict_style);
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}
