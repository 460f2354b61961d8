use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("groqchat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("groqchat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("groqchat.client.request_duration_seconds");

pub(crate) static STREAM_EVENTS: Counter = Counter::new("groqchat.stream.events");
pub(crate) static STREAM_ERRORS: Counter = Counter::new("groqchat.stream.errors");
pub(crate) static STREAM_BYTES: Counter = Counter::new("groqchat.stream.bytes");
pub(crate) static STREAM_FRAGMENTS: Counter = Counter::new("groqchat.stream.fragments");
pub(crate) static STREAM_TTFB: Moments = Moments::new("groqchat.stream.ttfb_seconds");
pub(crate) static STREAM_DURATION: Moments = Moments::new("groqchat.stream.duration_seconds");

pub(crate) static EXCHANGES_COMPLETED: Counter = Counter::new("groqchat.exchange.completed");
pub(crate) static EXCHANGES_FAILED: Counter = Counter::new("groqchat.exchange.failed");
pub(crate) static EXCHANGES_INTERRUPTED: Counter = Counter::new("groqchat.exchange.interrupted");
pub(crate) static EXCHANGES_UNCONFIGURED: Counter =
    Counter::new("groqchat.exchange.unconfigured");

pub(crate) static EXPORTS: Counter = Counter::new("groqchat.export.files");
pub(crate) static IMPORTS: Counter = Counter::new("groqchat.import.files");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&STREAM_EVENTS);
    collector.register_counter(&STREAM_ERRORS);
    collector.register_counter(&STREAM_BYTES);
    collector.register_counter(&STREAM_FRAGMENTS);
    collector.register_moments(&STREAM_TTFB);
    collector.register_moments(&STREAM_DURATION);

    collector.register_counter(&EXCHANGES_COMPLETED);
    collector.register_counter(&EXCHANGES_FAILED);
    collector.register_counter(&EXCHANGES_INTERRUPTED);
    collector.register_counter(&EXCHANGES_UNCONFIGURED);

    collector.register_counter(&EXPORTS);
    collector.register_counter(&IMPORTS);
}
