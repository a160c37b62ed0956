//! Alarm state machine: Idle ↔ Active with cooldown hysteresis.
//! A confirmed detection activates immediately; clearing requires C
//! consecutive no-fire frames so brief gaps in a flickering detection
//! signal cannot chatter the alarm sound on and off.

use serde::Serialize;
use tracing::{info, warn};

use crate::audio::AlarmSound;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlarmState {
    Idle,
    Active,
}

impl std::fmt::Display for AlarmState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlarmState::Idle => write!(f, "Idle"),
            AlarmState::Active => write!(f, "Active"),
        }
    }
}

/// Converts the per-frame confirmed-fire signal into a stable alarm and
/// manages the looping audio session. All mutation happens on the
/// frame-processing path; the audio side effect is best-effort and its
/// failure never blocks the state transition.
pub struct AlarmController {
    state: AlarmState,
    no_fire_streak: u32,
    cooldown_frames: u32,
    sound_enabled: bool,
    sound: Box<dyn AlarmSound>,
}

impl AlarmController {
    pub fn new(cooldown_frames: u32, sound_enabled: bool, sound: Box<dyn AlarmSound>) -> Self {
        Self {
            state: AlarmState::Idle,
            no_fire_streak: 0,
            cooldown_frames,
            sound_enabled,
            sound,
        }
    }

    /// Drive the state machine with one frame's confirmed-fire signal.
    pub fn update(&mut self, fire_confirmed: bool) {
        if fire_confirmed {
            self.no_fire_streak = 0;
            if self.state == AlarmState::Idle {
                self.trigger();
            }
        } else if self.state == AlarmState::Active {
            self.no_fire_streak += 1;
            if self.no_fire_streak >= self.cooldown_frames {
                self.clear();
            }
        }
    }

    fn trigger(&mut self) {
        self.state = AlarmState::Active;
        warn!("fire_alarm_triggered");
        if self.sound_enabled {
            self.sound.start_loop();
            if !self.sound.is_active() {
                // Visual/state alarm is authoritative; audio is best-effort.
                warn!("alarm audio unavailable, continuing without sound");
            }
        }
    }

    fn clear(&mut self) {
        self.state = AlarmState::Idle;
        self.no_fire_streak = 0;
        self.sound.stop();
        info!("fire_alarm_cleared");
    }

    /// Flip the sound-enabled flag. Disabling mutes an active alarm without
    /// clearing it; re-enabling while active starts a fresh session.
    /// Returns the new flag value.
    pub fn toggle_sound(&mut self) -> bool {
        self.sound_enabled = !self.sound_enabled;
        if !self.sound_enabled {
            self.sound.stop();
        } else if self.state == AlarmState::Active {
            self.sound.start_loop();
        }
        info!(enabled = self.sound_enabled, "alarm_sound_toggled");
        self.sound_enabled
    }

    /// Force Idle, stop any audio session, clear the streak. Leaves the
    /// sound-enabled flag untouched.
    pub fn reset(&mut self) {
        self.sound.stop();
        self.no_fire_streak = 0;
        if self.state == AlarmState::Active {
            info!("fire_alarm_reset");
        }
        self.state = AlarmState::Idle;
    }

    pub fn state(&self) -> AlarmState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == AlarmState::Active
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn sound_active(&self) -> bool {
        self.sound.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SilentSound;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Records session starts/stops through shared counters so tests can
    /// inspect them after the controller takes ownership.
    struct CountingSound {
        active: Arc<AtomicBool>,
        starts: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
    }

    impl CountingSound {
        fn new() -> (Self, Arc<AtomicBool>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
            let active = Arc::new(AtomicBool::new(false));
            let starts = Arc::new(AtomicUsize::new(0));
            let stops = Arc::new(AtomicUsize::new(0));
            let sound = Self {
                active: Arc::clone(&active),
                starts: Arc::clone(&starts),
                stops: Arc::clone(&stops),
            };
            (sound, active, starts, stops)
        }
    }

    impl AlarmSound for CountingSound {
        fn start_loop(&mut self) {
            if !self.active.swap(true, Ordering::SeqCst) {
                self.starts.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn stop(&mut self) {
            if self.active.swap(false, Ordering::SeqCst) {
                self.stops.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn is_active(&self) -> bool {
            self.active.load(Ordering::SeqCst)
        }
    }

    fn controller(cooldown: u32) -> (AlarmController, Arc<AtomicBool>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let (sound, active, starts, stops) = CountingSound::new();
        (
            AlarmController::new(cooldown, true, Box::new(sound)),
            active,
            starts,
            stops,
        )
    }

    #[test]
    fn confirmed_fire_activates_and_starts_one_session() {
        let (mut alarm, active, starts, _) = controller(30);
        assert!(!alarm.is_active());
        alarm.update(true);
        assert!(alarm.is_active());
        assert!(active.load(Ordering::SeqCst));
        assert_eq!(starts.load(Ordering::SeqCst), 1);

        // Repeated confirmations are idempotent: still one session.
        alarm.update(true);
        alarm.update(true);
        assert_eq!(starts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn alarm_holds_through_short_gaps() {
        let (mut alarm, _, _, stops) = controller(30);
        alarm.update(true);
        for _ in 0..29 {
            alarm.update(false);
        }
        assert!(alarm.is_active());
        assert_eq!(stops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn cooldown_clears_and_stops_the_session() {
        let (mut alarm, active, _, stops) = controller(5);
        alarm.update(true);
        for _ in 0..5 {
            alarm.update(false);
        }
        assert!(!alarm.is_active());
        assert!(!active.load(Ordering::SeqCst));
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn interleaved_confirmation_resets_the_streak() {
        let (mut alarm, _, starts, _) = controller(5);
        alarm.update(true);
        alarm.update(false);
        alarm.update(false);
        alarm.update(false);
        alarm.update(true); // streak back to 0, still Active, no new session
        for _ in 0..4 {
            alarm.update(false);
        }
        assert!(alarm.is_active());
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        alarm.update(false);
        assert!(!alarm.is_active());
    }

    #[test]
    fn idle_no_fire_is_a_no_op() {
        let (mut alarm, active, starts, stops) = controller(5);
        for _ in 0..10 {
            alarm.update(false);
        }
        assert!(!alarm.is_active());
        assert!(!active.load(Ordering::SeqCst));
        assert_eq!(starts.load(Ordering::SeqCst), 0);
        assert_eq!(stops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn toggle_sound_mutes_without_clearing_alarm() {
        let (mut alarm, active, starts, stops) = controller(30);
        alarm.update(true);
        assert!(active.load(Ordering::SeqCst));

        assert!(!alarm.toggle_sound());
        assert!(alarm.is_active(), "alarm state persists while muted");
        assert!(!active.load(Ordering::SeqCst));
        assert_eq!(stops.load(Ordering::SeqCst), 1);

        // Re-enabling while active starts a fresh session, exactly one.
        assert!(alarm.toggle_sound());
        assert!(active.load(Ordering::SeqCst));
        assert_eq!(starts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn toggle_sound_while_idle_touches_no_session() {
        let (mut alarm, active, starts, _) = controller(30);
        assert!(!alarm.toggle_sound());
        assert!(alarm.toggle_sound());
        assert!(!active.load(Ordering::SeqCst));
        assert_eq!(starts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn disabled_sound_still_activates_the_alarm() {
        let (sound, active, starts, _) = CountingSound::new();
        let mut alarm = AlarmController::new(30, false, Box::new(sound));
        alarm.update(true);
        assert!(alarm.is_active());
        assert!(!active.load(Ordering::SeqCst));
        assert_eq!(starts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unavailable_backend_never_blocks_activation() {
        let mut alarm = AlarmController::new(30, true, Box::new(SilentSound));
        alarm.update(true);
        assert!(alarm.is_active());
        assert!(!alarm.sound_active());
    }

    #[test]
    fn reset_forces_idle_and_keeps_sound_flag() {
        let (mut alarm, active, _, _) = controller(30);
        alarm.update(true);
        alarm.toggle_sound(); // sound now disabled
        alarm.reset();
        assert!(!alarm.is_active());
        assert!(!active.load(Ordering::SeqCst));
        assert!(!alarm.sound_enabled(), "reset must not touch the sound flag");

        // Reset from Idle is harmless too.
        alarm.reset();
        assert!(!alarm.is_active());
    }
}
