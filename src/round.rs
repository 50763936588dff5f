//! Round lifecycle for a single player.
//!
//! ```text
//!   Idle / Result / TooEarly ──input──► Waiting ──timer──► Ready ──input──► Result
//!                                          │                 │                (or Idle on a
//!                                        input               │                 bad sample)
//!                                          ▼                 │
//!                                       TooEarly    hidden ──┴──► Idle
//! ```
//!
//! The machine never calls out to the presentation layer directly. Every
//! transition pushes a [`GameEvent`] onto an outbox that the host drains
//! with [`RoundMachine::drain_events`].

use std::time::{Duration, Instant};

use rand::{rngs::StdRng, Rng, SeedableRng};
use strum_macros::Display;
use tracing::{debug, info};

use crate::best::BestStore;
use crate::clock::{elapsed_ms, Clock, MonotonicClock};
use crate::config::RoundSettings;
use crate::history::AttemptHistory;
use crate::stats::StatsSnapshot;
use crate::store::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RoundState {
    Idle,
    Waiting,
    Ready,
    TooEarly,
    Result,
}

/// Identifies one scheduled cue. A fire carrying any other handle is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTimer {
    pub handle: TimerHandle,
    pub delay: Duration,
    pub due: Instant,
}

/// Phase data lives inside the variant that owns it: a pending timer exists
/// only while waiting, a ready timestamp only while ready.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Waiting(PendingTimer),
    Ready { at: Instant },
    TooEarly,
    Result { reaction_ms: f64 },
}

impl Phase {
    fn state(&self) -> RoundState {
        match self {
            Phase::Idle => RoundState::Idle,
            Phase::Waiting(_) => RoundState::Waiting,
            Phase::Ready { .. } => RoundState::Ready,
            Phase::TooEarly => RoundState::TooEarly,
            Phase::Result { .. } => RoundState::Result,
        }
    }
}

/// Out-of-band messages for the announcement line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// Reaction sample failed the validity check and was discarded
    InvalidSample,
    /// Round abandoned because the host surface lost visibility
    Paused,
    SessionReset,
    BestCleared,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    StateChanged {
        state: RoundState,
        reaction_ms: Option<f64>,
    },
    Stats(StatsSnapshot),
    Notice(Notice),
}

pub struct RoundMachine<S: KeyValueStore, C: Clock = MonotonicClock> {
    phase: Phase,
    settings: RoundSettings,
    rng: StdRng,
    next_timer: u64,
    history: AttemptHistory,
    best: BestStore<S>,
    clock: C,
    events: Vec<GameEvent>,
}

impl<S: KeyValueStore> RoundMachine<S, MonotonicClock> {
    pub fn new(store: S, settings: RoundSettings) -> Self {
        Self::with_clock(store, settings, MonotonicClock)
    }
}

impl<S: KeyValueStore, C: Clock> RoundMachine<S, C> {
    pub fn with_clock(store: S, settings: RoundSettings, clock: C) -> Self {
        Self {
            phase: Phase::Idle,
            settings,
            rng: StdRng::from_entropy(),
            next_timer: 0,
            history: AttemptHistory::new(),
            best: BestStore::new(store),
            clock,
            events: Vec::new(),
        }
    }

    /// Make cue delays reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn state(&self) -> RoundState {
        self.phase.state()
    }

    pub fn ready_timestamp(&self) -> Option<Instant> {
        match self.phase {
            Phase::Ready { at } => Some(at),
            _ => None,
        }
    }

    pub fn pending_timer(&self) -> Option<PendingTimer> {
        match self.phase {
            Phase::Waiting(timer) => Some(timer),
            _ => None,
        }
    }

    /// Reaction of the round currently on display
    pub fn last_reaction(&self) -> Option<f64> {
        match self.phase {
            Phase::Result { reaction_ms } => Some(reaction_ms),
            _ => None,
        }
    }

    pub fn settings(&self) -> &RoundSettings {
        &self.settings
    }

    pub fn history(&self) -> &AttemptHistory {
        &self.history
    }

    pub fn best(&self) -> Option<f64> {
        self.best.read()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.snapshot(self.last_reaction())
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// The single "activate" signal, timestamped now
    pub fn primary_input(&mut self) {
        let now = self.clock.now();
        self.primary_input_at(now);
    }

    /// The "activate" signal, timestamped when the host read it
    pub fn primary_input_at(&mut self, at: Instant) {
        match self.phase {
            Phase::Idle | Phase::Result { .. } | Phase::TooEarly => self.start_round(),
            Phase::Waiting(timer) => self.false_start(timer),
            // read off the terminal before the cue was raised
            Phase::Ready { at: ready_at } if at < ready_at => {
                debug!("input predates the cue, counted as a false start");
                self.set_phase(Phase::TooEarly);
            }
            Phase::Ready { at: ready_at } => self.stop(ready_at, at),
        }
    }

    /// Deliver a timer fire. Only honored while still waiting on `handle`;
    /// returns whether the cue was raised.
    pub fn fire(&mut self, handle: TimerHandle) -> bool {
        match self.phase {
            Phase::Waiting(timer) if timer.handle == handle => {
                let at = self.clock.now();
                debug!(delay_ms = timer.delay.as_millis() as u64, "cue raised");
                self.set_phase(Phase::Ready { at });
                true
            }
            _ => {
                debug!(?handle, state = %self.state(), "ignoring stale timer");
                false
            }
        }
    }

    /// Fire the pending timer if it is due on the machine's clock
    pub fn poll_timer(&mut self) -> bool {
        match self.phase {
            Phase::Waiting(timer) if self.clock.now() >= timer.due => self.fire(timer.handle),
            _ => false,
        }
    }

    /// Time left before the cue, for hosts that sleep until the next deadline
    pub fn time_until_cue(&self) -> Option<Duration> {
        self.pending_timer()
            .map(|timer| timer.due.saturating_duration_since(self.clock.now()))
    }

    /// The host surface was hidden: abandon any in-flight round without penalty
    pub fn visibility_hidden(&mut self) {
        if matches!(self.phase, Phase::Waiting(_) | Phase::Ready { .. }) {
            debug!(state = %self.state(), "round abandoned on visibility loss");
            self.set_phase(Phase::Idle);
            self.events.push(GameEvent::Notice(Notice::Paused));
        }
    }

    /// Clear the session's attempts and go back to idle. Best time survives.
    pub fn reset_session(&mut self) {
        self.history.reset();
        let stats = self.snapshot(None);
        self.events.push(GameEvent::Stats(stats));
        self.set_phase(Phase::Idle);
        self.events.push(GameEvent::Notice(Notice::SessionReset));
    }

    pub fn clear_best(&mut self) {
        self.best.clear();
        let stats = self.snapshot(None);
        self.events.push(GameEvent::Stats(stats));
        self.events.push(GameEvent::Notice(Notice::BestCleared));
    }

    fn start_round(&mut self) {
        let delay_ms = self
            .rng
            .gen_range(self.settings.delay.min_ms()..=self.settings.delay.max_ms());
        let delay = Duration::from_millis(delay_ms);
        self.next_timer += 1;
        let timer = PendingTimer {
            handle: TimerHandle(self.next_timer),
            delay,
            due: self.clock.now() + delay,
        };
        debug!(delay_ms, handle = ?timer.handle, "round started");
        self.set_phase(Phase::Waiting(timer));
    }

    fn false_start(&mut self, timer: PendingTimer) {
        debug!(handle = ?timer.handle, "false start, timer cancelled");
        self.set_phase(Phase::TooEarly);
    }

    fn stop(&mut self, ready_at: Instant, clicked_at: Instant) {
        let reaction_ms = elapsed_ms(ready_at, clicked_at);

        if !self.is_valid_sample(reaction_ms) {
            debug!(reaction_ms, "discarding invalid timing sample");
            self.set_phase(Phase::Idle);
            self.events.push(GameEvent::Notice(Notice::InvalidSample));
            return;
        }

        self.history.record(reaction_ms);
        if self.best.offer(reaction_ms) {
            info!(best_ms = reaction_ms, "new best time");
        }
        let stats = self.snapshot(Some(reaction_ms));
        self.events.push(GameEvent::Stats(stats));
        self.set_phase(Phase::Result { reaction_ms });
    }

    fn is_valid_sample(&self, reaction_ms: f64) -> bool {
        reaction_ms.is_finite() && reaction_ms > 0.0 && reaction_ms <= self.settings.max_reaction_ms
    }

    fn snapshot(&self, current: Option<f64>) -> StatsSnapshot {
        StatsSnapshot::from_history(&self.history, current, self.best.read())
    }

    fn set_phase(&mut self, next: Phase) {
        let changed = next.state() != self.phase.state();
        self.phase = next;
        if changed {
            self.events.push(GameEvent::StateChanged {
                state: self.phase.state(),
                reaction_ms: self.last_reaction(),
            });
        }
    }
}
