use crate::types::AudioTime;

/// Authoritative playback clock.
///
/// `None` means the clock is not available yet (audio never unlocked by a user
/// gesture, or the host has no audio device). Callers treat that as "nothing
/// happens" rather than as an error.
pub trait AudioClockPort {
    fn now_seconds(&self) -> Option<AudioTime>;
}

impl<T: AudioClockPort + ?Sized> AudioClockPort for std::rc::Rc<T> {
    fn now_seconds(&self) -> Option<AudioTime> {
        (**self).now_seconds()
    }
}

impl<T: AudioClockPort + ?Sized> AudioClockPort for std::sync::Arc<T> {
    fn now_seconds(&self) -> Option<AudioTime> {
        (**self).now_seconds()
    }
}
