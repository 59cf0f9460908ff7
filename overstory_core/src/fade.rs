// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The element fade lifecycle state machine.
//!
//! ## Overview
//!
//! Every element moves through `FadingIn → Visible → FadingOut → Deleted`,
//! with one permitted back-edge: a descriptor update while fading out
//! revives the element back to `FadingIn`.
//!
//! Two raw progress scalars drive the exposed fade:
//!
//! - `progress_in` climbs 0→1 over `fade_in_time` (after `fade_in_delay`).
//! - `progress_out` climbs 0→1 over `fade_out_time` (after
//!   `fade_out_delay`), and *decays* back toward 0 at the fade-in rate
//!   when the element is revived.
//!
//! The exposed fade is `clamp(progress_in) * (1 - clamp(progress_out))`,
//! which keeps reversals continuous in both directions: deleting mid
//! fade-in starts the fade-out from the partial level, and reviving mid
//! fade-out climbs back from wherever the fade-out had gotten to.
//!
//! Reaching `progress_out = 1` flags the element deleted; a zero
//! `fade_out_time` with no delay deletes synchronously inside
//! [`FadeState::start_deletion`].

/// Lifecycle phases.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FadePhase {
    /// Fading toward fully visible; entered at construction and on revive.
    FadingIn,
    /// Fully visible.
    Visible,
    /// Deletion has started; fading toward removal.
    FadingOut,
    /// Fully faded; the context removes the element at the next rebuild.
    Deleted,
}

/// Timing configuration, mirrored from the element's descriptor.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FadeTiming {
    /// Seconds for the fade-in ramp. Zero snaps.
    pub fade_in_time: f32,
    /// Seconds to wait before the fade-in ramp starts.
    pub fade_in_delay: f32,
    /// Seconds for the fade-out ramp. Zero deletes synchronously.
    pub fade_out_time: f32,
    /// Seconds to wait after deletion starts before the ramp runs.
    pub fade_out_delay: f32,
}

impl Default for FadeTiming {
    fn default() -> Self {
        Self {
            fade_in_time: 0.0,
            fade_in_delay: 0.0,
            fade_out_time: 0.0,
            fade_out_delay: 0.0,
        }
    }
}

impl FadeTiming {
    /// Total seconds from deletion start until removal.
    #[must_use]
    pub fn absolute_fade_out_time(&self) -> f32 {
        self.fade_out_delay + self.fade_out_time
    }
}

/// What a fade step observed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct FadeStepResult {
    /// The element just finished fading in.
    pub faded_in: bool,
    /// The element just reached `Deleted`.
    pub deleted: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct FadeState {
    phase: FadePhase,
    delay_elapsed: f32,
    out_delay_elapsed: f32,
    progress_in: f32,
    progress_out: f32,
}

impl FadeState {
    pub(crate) fn new() -> Self {
        Self {
            phase: FadePhase::FadingIn,
            delay_elapsed: 0.0,
            out_delay_elapsed: 0.0,
            progress_in: 0.0,
            progress_out: 0.0,
        }
    }

    pub(crate) fn phase(&self) -> FadePhase {
        self.phase
    }

    /// The exposed fade scalar in `[0, 1]`.
    pub(crate) fn element_fade(&self) -> f32 {
        if self.phase == FadePhase::Deleted {
            return 0.0;
        }
        self.progress_in.clamp(0.0, 1.0) * (1.0 - self.progress_out.clamp(0.0, 1.0))
    }

    /// Begin deletion.
    ///
    /// Returns `None` if deletion was already underway, otherwise
    /// `Some(synchronous)` — `true` when a zero ramp and zero delay
    /// deleted the element on the spot.
    pub(crate) fn start_deletion(&mut self, timing: &FadeTiming) -> Option<bool> {
        match self.phase {
            FadePhase::FadingOut | FadePhase::Deleted => None,
            FadePhase::FadingIn | FadePhase::Visible => {
                self.phase = FadePhase::FadingOut;
                self.out_delay_elapsed = 0.0;
                self.progress_out = 0.0;
                if timing.fade_out_time <= 0.0 && timing.fade_out_delay <= 0.0 {
                    self.progress_out = 1.0;
                    self.phase = FadePhase::Deleted;
                    return Some(true);
                }
                Some(false)
            }
        }
    }

    /// Revive a fading-out element back toward visible.
    ///
    /// Returns `true` if the state changed (the element was fading out).
    pub(crate) fn revive(&mut self) -> bool {
        if self.phase == FadePhase::FadingOut {
            self.phase = FadePhase::FadingIn;
            self.out_delay_elapsed = 0.0;
            true
        } else {
            false
        }
    }

    /// Advance by `dt` seconds.
    pub(crate) fn step(&mut self, dt: f32, timing: &FadeTiming) -> FadeStepResult {
        let mut result = FadeStepResult::default();
        match self.phase {
            FadePhase::Visible | FadePhase::Deleted => {}
            FadePhase::FadingIn => {
                // Undo any fade-out progress first, at the fade-in rate.
                if self.progress_out > 0.0 {
                    self.progress_out -= ramp(dt, timing.fade_in_time);
                    self.progress_out = self.progress_out.max(0.0);
                }
                if self.delay_elapsed < timing.fade_in_delay {
                    self.delay_elapsed += dt;
                } else {
                    self.progress_in += ramp(dt, timing.fade_in_time);
                }
                if self.progress_in >= 1.0 && self.progress_out <= 0.0 {
                    self.progress_in = 1.0;
                    self.phase = FadePhase::Visible;
                    result.faded_in = true;
                }
            }
            FadePhase::FadingOut => {
                if self.out_delay_elapsed < timing.fade_out_delay {
                    self.out_delay_elapsed += dt;
                } else {
                    self.progress_out += ramp(dt, timing.fade_out_time);
                }
                if self.progress_out >= 1.0 {
                    self.progress_out = 1.0;
                    self.phase = FadePhase::Deleted;
                    result.deleted = true;
                }
            }
        }
        result
    }
}

/// Progress gained over `dt` for a ramp of length `time`; instant when the
/// ramp has no length.
fn ramp(dt: f32, time: f32) -> f32 {
    if time <= 0.0 { 1.0 } else { dt / time }
}
