// Tab switch animation as an explicit state machine.
//
// Every frame recomputes absolute state from the elapsed wall-clock time, so
// dropped or late frames never accumulate error. Each run carries a generation;
// frames from a superseded or finished run are reported as stale.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::settings::TransitionStyle;

const EASED_BASE_MS: u64 = 200;
const EASED_PER_STEP_MS: u64 = 50;
const EASED_MAX_MS: u64 = 400;
const SPRING_MIN_MS: u64 = 300;
const SPRING_PER_STEP_MS: u64 = 80;
const SPRING_STIFFNESS: f64 = 8.0;

/// Per-tab visual weight while a transition runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabVisual {
    pub opacity: f64,
    pub scale: f64,
    pub blur_px: f64,
}

impl TabVisual {
    /// Weight for a tab `distance` slots away from the animated position.
    pub fn at_distance(distance: f64) -> Self {
        let d = distance.abs();
        Self {
            opacity: (1.0 - 0.18 * d).max(0.45),
            scale: (1.0 - 0.04 * d).max(0.88),
            blur_px: (0.9 * d).min(3.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from_index: usize,
    pub to_index: usize,
    pub target_id: String,
    pub started: Instant,
    pub duration: Duration,
    pub generation: u64,
}

impl Transition {
    fn steps(&self) -> usize {
        self.from_index.abs_diff(self.to_index)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AnimatorState {
    #[default]
    Idle,
    Transitioning(Transition),
}

/// One rendered step of a running transition.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionFrame {
    pub generation: u64,
    pub progress: f64,
    /// Continuous animated position in the strip.
    pub position: f64,
    /// Tab whose view is shown for this frame.
    pub intermediate_index: usize,
    pub visuals: Vec<TabVisual>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// The frame belongs to a superseded or finished run; nothing to do.
    Stale,
    Frame(TransitionFrame),
    /// Progress reached 1; the caller commits `target_id`.
    Completed { target_id: String },
}

pub fn duration_for(style: TransitionStyle, steps: usize) -> Duration {
    let steps = steps as u64;
    let ms = match style {
        TransitionStyle::Eased => (EASED_BASE_MS + steps * EASED_PER_STEP_MS).min(EASED_MAX_MS),
        TransitionStyle::Spring => (steps * SPRING_PER_STEP_MS).max(SPRING_MIN_MS),
    };
    Duration::from_millis(ms)
}

/// Maps linear progress in `[0, 1]` to eased progress in `[0, 1]`.
pub fn ease(style: TransitionStyle, t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    match style {
        TransitionStyle::Eased => {
            if t < 0.5 {
                4.0 * t * t * t
            } else {
                1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
            }
        }
        TransitionStyle::Spring => {
            // Critically damped response, normalised so that ease(1) == 1.
            let w = SPRING_STIFFNESS;
            let response = |x: f64| 1.0 - (1.0 + w * x) * (-w * x).exp();
            response(t) / response(1.0)
        }
    }
}

#[derive(Debug, Default)]
pub struct Animator {
    style: TransitionStyle,
    state: AnimatorState,
    generation: u64,
}

impl Animator {
    pub fn new(style: TransitionStyle) -> Self {
        Self {
            style,
            state: AnimatorState::Idle,
            generation: 0,
        }
    }

    pub fn style(&self) -> TransitionStyle {
        self.style
    }

    pub fn state(&self) -> &AnimatorState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, AnimatorState::Transitioning(_))
    }

    pub fn current(&self) -> Option<&Transition> {
        match &self.state {
            AnimatorState::Transitioning(t) => Some(t),
            AnimatorState::Idle => None,
        }
    }

    /// Starts (or restarts) a run toward `target_id`. Any earlier run becomes stale.
    pub fn begin(&mut self, from_index: usize, to_index: usize, target_id: &str, now: Instant) -> u64 {
        self.generation += 1;
        let steps = from_index.abs_diff(to_index);
        let duration = duration_for(self.style, steps);
        log::debug!(
            "[Transition] #{} {} -> {} ({} steps, {:?})",
            self.generation,
            from_index,
            to_index,
            steps,
            duration
        );
        self.state = AnimatorState::Transitioning(Transition {
            from_index,
            to_index,
            target_id: target_id.to_string(),
            started: now,
            duration,
            generation: self.generation,
        });
        self.generation
    }

    /// Drops the running transition, if any, and invalidates its frames.
    pub fn cancel(&mut self) {
        if self.is_running() {
            self.generation += 1;
            self.state = AnimatorState::Idle;
        }
    }

    /// Advances the run tagged `generation` to time `now` for a strip of `tab_count` tabs.
    pub fn step(&mut self, generation: u64, now: Instant, tab_count: usize) -> FrameOutcome {
        let AnimatorState::Transitioning(transition) = &self.state else {
            return FrameOutcome::Stale;
        };
        if transition.generation != generation {
            return FrameOutcome::Stale;
        }

        let elapsed = now.saturating_duration_since(transition.started);
        let progress = if transition.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f64() / transition.duration.as_secs_f64()).min(1.0)
        };

        if progress >= 1.0 {
            let target_id = transition.target_id.clone();
            self.state = AnimatorState::Idle;
            return FrameOutcome::Completed { target_id };
        }

        let eased = ease(self.style, progress);
        let direction = if transition.to_index >= transition.from_index { 1.0 } else { -1.0 };
        let position = transition.from_index as f64 + direction * transition.steps() as f64 * eased;
        let last = tab_count.saturating_sub(1);
        let intermediate_index = (position.round().max(0.0) as usize).min(last);
        let visuals = (0..tab_count)
            .map(|i| TabVisual::at_distance(i as f64 - position))
            .collect();

        FrameOutcome::Frame(TransitionFrame {
            generation,
            progress,
            position,
            intermediate_index,
            visuals,
        })
    }
}
