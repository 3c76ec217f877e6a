mod envelope;
mod text;

pub use envelope::{DataEnvelope, EnvelopeKind, MutePayload};
pub use text::{linkify, sanitize};
