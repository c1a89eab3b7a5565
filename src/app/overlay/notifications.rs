use ratatui::layout::Rect;
use ratatui::Frame;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use super::ShortcutGroup;
use crate::app::message::{Effect, Msg};
use crate::app::screen::{Component, Host, Screen, Update};
use crate::app::Context;
use crate::config::NotificationsConfig;
use crate::ui::widgets::{self, StatusBarState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub level: Level,
    pub title: String,
    pub message: String,
    pub created: Instant,
    pub duration: Duration,
}

impl Notification {
    pub fn is_visible_at(&self, now: Instant) -> bool {
        now.checked_duration_since(self.created)
            .is_none_or(|elapsed| elapsed < self.duration)
    }
}

/// Bounded stack of toasts; the oldest is dropped when a new one would
/// exceed `max_visible`
#[derive(Debug)]
pub struct NotificationCenter {
    items: VecDeque<Notification>,
    next_id: u64,
    max_visible: usize,
    duration: Duration,
}

impl NotificationCenter {
    pub fn new(max_visible: usize, duration: Duration) -> Self {
        Self {
            items: VecDeque::new(),
            next_id: 1,
            max_visible: max_visible.max(1),
            duration,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn push(&mut self, level: Level, title: &str, message: &str) -> u64 {
        self.push_at(level, title, message, Instant::now())
    }

    pub fn push_at(&mut self, level: Level, title: &str, message: &str, now: Instant) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        while self.items.len() >= self.max_visible {
            self.items.pop_front();
        }
        self.items.push_back(Notification {
            id,
            level,
            title: title.to_string(),
            message: message.to_string(),
            created: now,
            duration: self.duration,
        });
        id
    }

    /// Returns false when the notification was already gone
    pub fn expire(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    pub fn purge(&mut self, now: Instant) {
        self.items.retain(|n| n.is_visible_at(now));
    }

    pub fn visible_at(&self, now: Instant) -> Vec<&Notification> {
        self.items.iter().filter(|n| n.is_visible_at(now)).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Stores notifications requested by the wrapped screen and draws them in
/// the top right corner. Never intercepts keys.
#[derive(Debug)]
pub struct WithNotifications<S> {
    inner: S,
    center: NotificationCenter,
}

impl<S: Host> WithNotifications<S> {
    pub fn new(inner: S, config: &NotificationsConfig) -> Self {
        Self {
            inner,
            center: NotificationCenter::new(config.max_visible, config.duration()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.center
    }

    /// Store notify requests and replace each with its expiry timer
    fn absorb(&mut self, effects: Vec<Effect>) -> Vec<Effect> {
        effects
            .into_iter()
            .map(|effect| match effect {
                Effect::Notify {
                    level,
                    title,
                    message,
                } => {
                    let id = self.center.push(level, &title, &message);
                    Effect::ScheduleExpiry {
                        id,
                        after: self.center.duration(),
                    }
                }
                other => other,
            })
            .collect()
    }
}

impl<S: Host> Component for WithNotifications<S> {
    fn init(&mut self, ctx: &Context) -> Vec<Effect> {
        let effects = self.inner.init(ctx);
        self.absorb(effects)
    }

    fn update(&mut self, msg: Msg, ctx: &Context) -> Update {
        match msg {
            Msg::NotificationExpired(id) => {
                self.center.expire(id);
                return Update::none();
            }
            Msg::Tick => self.center.purge(Instant::now()),
            _ => {}
        }
        let Update { next, effects } = self.inner.update(msg, ctx);
        Update {
            next,
            effects: self.absorb(effects),
        }
    }

    fn draw(&self, frame: &mut Frame, area: Rect, ctx: &Context) {
        self.inner.draw(frame, area, ctx);
        let visible = self.center.visible_at(Instant::now());
        if !visible.is_empty() {
            widgets::draw_notifications(frame, area, &visible, &ctx.theme);
        }
    }

    fn title(&self) -> String {
        self.inner.title()
    }

    fn shortcuts(&self) -> Vec<ShortcutGroup> {
        self.inner.shortcuts()
    }

    fn status(&self) -> StatusBarState {
        self.inner.status()
    }

    fn captures_text(&self) -> bool {
        self.inner.captures_text()
    }
}

impl<S: Host> Host for WithNotifications<S> {
    fn adopt(&mut self, next: Screen, ctx: &Context) -> Vec<Effect> {
        let effects = self.inner.adopt(next, ctx);
        self.absorb(effects)
    }

    fn screen(&self) -> &Screen {
        self.inner.screen()
    }
}
