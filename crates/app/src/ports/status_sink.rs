//! Status sink port: append-only event log.

use humivent_domain::event::Event;

/// Fire-and-forget event consumer.
///
/// `log` is called from the regulation loop and from actuator timers; it must
/// return promptly and never fail the caller. Implementations that write to
/// slow media are expected to buffer and drop when full.
pub trait StatusSink: Send + Sync {
    fn log(&self, event: Event);
}

impl<T: StatusSink + ?Sized> StatusSink for std::sync::Arc<T> {
    fn log(&self, event: Event) {
        (**self).log(event);
    }
}
