use crate::round::RoundState;

/// Ambient animation targets for a round state.
/// `glow`, `red` and `jitter` are 0..=1 intensities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mood {
    pub speed: f64,
    pub glow: f64,
    pub red: f64,
    pub jitter: f64,
}

impl Mood {
    pub fn for_state(state: RoundState, reduced_motion: bool) -> Self {
        let pick = |full: f64, reduced: f64| if reduced_motion { reduced } else { full };
        match state {
            RoundState::Waiting => Mood {
                speed: pick(0.14, 0.10),
                glow: 0.25,
                red: 1.0,
                jitter: 0.0,
            },
            RoundState::Ready => Mood {
                speed: pick(0.55, 0.18),
                glow: 0.95,
                red: 0.0,
                jitter: 0.0,
            },
            RoundState::TooEarly => Mood {
                speed: pick(0.42, 0.2),
                glow: 0.35,
                red: 1.0,
                jitter: 1.0,
            },
            RoundState::Result => Mood {
                speed: pick(0.16, 0.10),
                glow: 0.18,
                red: 0.0,
                jitter: 0.0,
            },
            RoundState::Idle => Mood {
                speed: pick(0.12, 0.08),
                glow: 0.12,
                red: 0.0,
                jitter: 0.0,
            },
        }
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Eases the displayed mood toward the latest target one tick at a time
#[derive(Debug, Clone)]
pub struct MoodAnimator {
    current: Mood,
    target: Mood,
    reduced_motion: bool,
}

impl MoodAnimator {
    pub fn new(reduced_motion: bool) -> Self {
        let idle = Mood::for_state(RoundState::Idle, reduced_motion);
        Self {
            current: idle,
            target: idle,
            reduced_motion,
        }
    }

    pub fn set_state(&mut self, state: RoundState) {
        self.target = Mood::for_state(state, self.reduced_motion);
    }

    pub fn tick(&mut self) {
        self.current.speed = lerp(self.current.speed, self.target.speed, 0.06);
        self.current.glow = lerp(self.current.glow, self.target.glow, 0.08);
        self.current.red = lerp(self.current.red, self.target.red, 0.09);
        self.current.jitter = lerp(self.current.jitter, self.target.jitter, 0.22);
        // a false start is a one-off shake, not a sustained one
        self.target.jitter = lerp(self.target.jitter, 0.0, 0.14);
    }

    pub fn current(&self) -> Mood {
        self.current
    }

    pub fn is_settled(&self) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() < 0.01;
        close(self.current.glow, self.target.glow)
            && close(self.current.red, self.target.red)
            && self.current.jitter < 0.01
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_glows_waiting_is_red() {
        let ready = Mood::for_state(RoundState::Ready, false);
        let waiting = Mood::for_state(RoundState::Waiting, false);
        assert!(ready.glow > waiting.glow);
        assert_eq!(ready.red, 0.0);
        assert_eq!(waiting.red, 1.0);
    }

    #[test]
    fn test_reduced_motion_slows_down() {
        for state in [
            RoundState::Idle,
            RoundState::Waiting,
            RoundState::Ready,
            RoundState::TooEarly,
            RoundState::Result,
        ] {
            assert!(Mood::for_state(state, true).speed <= Mood::for_state(state, false).speed);
        }
    }

    #[test]
    fn test_animator_converges() {
        let mut animator = MoodAnimator::new(false);
        animator.set_state(RoundState::Ready);
        assert!(!animator.is_settled());

        for _ in 0..200 {
            animator.tick();
        }
        assert!(animator.is_settled());
        assert!((animator.current().glow - 0.95).abs() < 0.01);
    }

    #[test]
    fn test_false_start_jitter_decays() {
        let mut animator = MoodAnimator::new(false);
        animator.set_state(RoundState::TooEarly);
        animator.tick();
        assert!(animator.current().jitter > 0.0);

        for _ in 0..200 {
            animator.tick();
        }
        assert!(animator.current().jitter < 0.01);
        assert!(animator.is_settled());
    }
}
