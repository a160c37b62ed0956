//! Alarm sound capability.
//! The alarm state machine depends only on the `AlarmSound` trait; the
//! concrete backend (file-based loop player or silent no-op) is selected
//! once at startup. A broken or missing backend degrades to silence and
//! never blocks alarm activation.

pub mod loop_player;

use std::path::Path;
use tracing::info;

pub use loop_player::LoopPlayer;

/// One continuous looped alarm playback, started and stopped from the
/// frame-processing path.
pub trait AlarmSound: Send {
    /// Begin looping playback. No-op if a session is already active or the
    /// backend is inert; there is never more than one live session.
    fn start_loop(&mut self);

    /// Stop playback and join the playback path. Idempotent; after it
    /// returns, the session produces no further audio.
    fn stop(&mut self);

    fn is_active(&self) -> bool;
}

/// No-op backend used when no sound asset is configured.
pub struct SilentSound;

impl AlarmSound for SilentSound {
    fn start_loop(&mut self) {}

    fn stop(&mut self) {}

    fn is_active(&self) -> bool {
        false
    }
}

/// Select the audio backend once at startup.
pub fn open_alarm_sound(path: Option<&Path>) -> Box<dyn AlarmSound> {
    match path {
        Some(path) => Box::new(LoopPlayer::new(path.to_path_buf())),
        None => {
            info!("no alarm sound configured, alarm runs silent");
            Box::new(SilentSound)
        }
    }
}
