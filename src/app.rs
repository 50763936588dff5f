use std::time::Instant;

use tracing::debug;

use crate::clock::Clock;
use crate::input::{Command, KeyFilter};
use crate::mood::MoodAnimator;
use crate::round::{GameEvent, Notice, RoundMachine, RoundState};
use crate::runtime::ReflexEvent;
use crate::stats::{format_ms, StatsSnapshot};
use crate::store::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Accent,
    Error,
}

/// Text shown in the arena for the current state
#[derive(Debug, Clone, PartialEq)]
pub struct StateView {
    pub state: RoundState,
    pub headline: &'static str,
    pub help: &'static str,
    pub readout: String,
    pub tone: Tone,
    /// Line for the announcement channel, if entering this state warrants one
    pub announcement: Option<String>,
}

impl StateView {
    pub fn for_state(state: RoundState, reaction_ms: Option<f64>) -> Self {
        match state {
            RoundState::Idle => Self {
                state,
                headline: "Press space to start",
                help: "You will get a random delay. React when the panel turns green.",
                readout: "—".to_string(),
                tone: Tone::Neutral,
                announcement: None,
            },
            RoundState::Waiting => Self {
                state,
                headline: "WAIT",
                help: "Red means do not press yet. Wait for green.",
                readout: "HOLD".to_string(),
                tone: Tone::Error,
                announcement: Some("Wait. Do not press yet.".to_string()),
            },
            RoundState::Ready => Self {
                state,
                headline: "GO!",
                help: "Press now!",
                readout: "NOW".to_string(),
                tone: Tone::Accent,
                announcement: Some("Go!".to_string()),
            },
            RoundState::TooEarly => Self {
                state,
                headline: "False start",
                help: "You pressed too early. Press to try again.",
                readout: "Too early".to_string(),
                tone: Tone::Error,
                announcement: Some("False start. You pressed too early.".to_string()),
            },
            RoundState::Result => Self {
                state,
                headline: "Reaction time",
                help: "Press to play again.",
                readout: format_ms(reaction_ms),
                tone: Tone::Accent,
                announcement: reaction_ms
                    .filter(|ms| ms.is_finite())
                    .map(|ms| format!("Reaction time {} milliseconds.", ms.round())),
            },
        }
    }
}

pub fn notice_text(notice: Notice) -> &'static str {
    match notice {
        Notice::InvalidSample => "Invalid timing sample. Try again.",
        Notice::Paused => "Paused. Press space to start again.",
        Notice::SessionReset => "Session stats reset.",
        Notice::BestCleared => "Best time cleared.",
    }
}

/// Everything the terminal front end needs: the round machine plus the
/// presentation state derived from its events.
pub struct App<S: KeyValueStore, C: Clock = crate::clock::MonotonicClock> {
    pub machine: RoundMachine<S, C>,
    pub view: StateView,
    pub stats: StatsSnapshot,
    pub mood: MoodAnimator,
    /// Latest message for the single text announcement channel
    pub announcement: Option<String>,
    pub frame: u64,
    pub should_quit: bool,
    keys: KeyFilter,
}

impl<S: KeyValueStore, C: Clock> App<S, C> {
    pub fn new(machine: RoundMachine<S, C>, reduced_motion: bool, reports_release: bool) -> Self {
        let stats = machine.stats();
        let view = StateView::for_state(machine.state(), machine.last_reaction());
        let mut mood = MoodAnimator::new(reduced_motion);
        mood.set_state(machine.state());
        Self {
            machine,
            view,
            stats,
            mood,
            announcement: None,
            frame: 0,
            should_quit: false,
            keys: KeyFilter::new(reports_release),
        }
    }

    /// Apply one runtime event. Returns true when the screen should be redrawn.
    pub fn handle_event(&mut self, event: ReflexEvent) -> bool {
        match event {
            ReflexEvent::Key(key, at) => match self.keys.command(key) {
                Some(command) => self.apply(command, at),
                None => return false,
            },
            ReflexEvent::Click(at) => self.machine.primary_input_at(at),
            ReflexEvent::FocusLost => self.machine.visibility_hidden(),
            ReflexEvent::Resize => return true,
            ReflexEvent::Tick => {
                self.frame = self.frame.wrapping_add(1);
                self.mood.tick();
                let cued = self.machine.poll_timer();
                let changed = self.sync();
                return cued || changed || !self.mood.is_settled();
            }
        }
        self.sync();
        true
    }

    pub fn apply(&mut self, command: Command, at: Instant) {
        match command {
            Command::Activate => self.machine.primary_input_at(at),
            Command::ResetSession => self.machine.reset_session(),
            Command::ClearBest => self.machine.clear_best(),
            Command::Quit => self.should_quit = true,
        }
    }

    /// Fold pending machine events into the presentation state.
    /// Returns whether anything changed.
    pub fn sync(&mut self) -> bool {
        let events = self.machine.drain_events();
        let changed = !events.is_empty();
        for event in events {
            match event {
                GameEvent::StateChanged { state, reaction_ms } => {
                    debug!(%state, ?reaction_ms, "state changed");
                    self.view = StateView::for_state(state, reaction_ms);
                    self.mood.set_state(state);
                    if let Some(line) = &self.view.announcement {
                        self.announcement = Some(line.clone());
                    }
                }
                GameEvent::Stats(stats) => self.stats = stats,
                GameEvent::Notice(notice) => {
                    self.announcement = Some(notice_text(notice).to_string());
                }
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::RoundSettings;
    use crate::store::MemoryStore;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn app() -> (App<MemoryStore, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let machine =
            RoundMachine::with_clock(MemoryStore::new(), RoundSettings::default(), clock.clone())
                .with_seed(1);
        (App::new(machine, false, false), clock)
    }

    fn space(at: Instant) -> ReflexEvent {
        ReflexEvent::Key(KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE), at)
    }

    #[test]
    fn test_initial_view_is_idle() {
        let (app, _) = app();
        assert_eq!(app.view.state, RoundState::Idle);
        assert_eq!(app.view.headline, "Press space to start");
        assert_eq!(app.stats.session_count, 0);
        assert!(app.announcement.is_none());
    }

    #[test]
    fn test_full_round_through_events() {
        let (mut app, clock) = app();
        assert!(app.handle_event(space(clock.now())));
        assert_eq!(app.view.state, RoundState::Waiting);
        assert_eq!(app.announcement.as_deref(), Some("Wait. Do not press yet."));

        let delay = app.machine.pending_timer().unwrap().delay;
        clock.advance(delay);
        assert!(app.handle_event(ReflexEvent::Tick));
        assert_eq!(app.view.state, RoundState::Ready);
        assert_eq!(app.announcement.as_deref(), Some("Go!"));

        clock.advance_ms(220);
        app.handle_event(space(clock.now()));
        assert_eq!(app.view.state, RoundState::Result);
        assert_eq!(app.view.readout, "220 ms");
        assert_eq!(app.stats.current, Some(220.0));
        assert_eq!(app.stats.best, Some(220.0));
        assert_eq!(
            app.announcement.as_deref(),
            Some("Reaction time 220 milliseconds.")
        );
    }

    #[test]
    fn test_click_activates() {
        let (mut app, clock) = app();
        app.handle_event(ReflexEvent::Click(clock.now()));
        assert_eq!(app.machine.state(), RoundState::Waiting);
    }

    #[test]
    fn test_focus_lost_pauses() {
        let (mut app, clock) = app();
        app.handle_event(space(clock.now()));
        app.handle_event(ReflexEvent::FocusLost);
        assert_eq!(app.view.state, RoundState::Idle);
        assert_eq!(
            app.announcement.as_deref(),
            Some("Paused. Press space to start again.")
        );
    }

    #[test]
    fn test_unmapped_key_is_ignored() {
        let (mut app, clock) = app();
        let redraw = app.handle_event(ReflexEvent::Key(
            KeyEvent::new(KeyCode::Char('z'), KeyModifiers::NONE),
            clock.now(),
        ));
        assert!(!redraw);
        assert_eq!(app.machine.state(), RoundState::Idle);
    }

    #[test]
    fn test_quit_key() {
        let (mut app, clock) = app();
        app.handle_event(ReflexEvent::Key(
            KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE),
            clock.now(),
        ));
        assert!(app.should_quit);
    }

    #[test]
    fn test_reset_and_clear_announce() {
        let (mut app, clock) = app();
        app.handle_event(ReflexEvent::Key(
            KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE),
            clock.now(),
        ));
        assert_eq!(app.announcement.as_deref(), Some("Session stats reset."));

        app.handle_event(ReflexEvent::Key(
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE),
            clock.now(),
        ));
        assert_eq!(app.announcement.as_deref(), Some("Best time cleared."));
    }

    #[test]
    fn test_result_view_without_reaction() {
        let view = StateView::for_state(RoundState::Result, None);
        assert_eq!(view.readout, "—");
        assert_eq!(view.announcement, None);
    }
}
