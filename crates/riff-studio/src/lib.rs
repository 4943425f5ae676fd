//! Client-side generation flow for riff.
//!
//! [`Studio`] walks a request through compose → lyrics preview → queued →
//! generating → player, submitting two contrasting takes and polling them
//! until both are playable or one fails. It talks to the proxy through the
//! [`StudioApi`] trait ([`HttpStudioApi`] in production) and persists finished
//! takes through a [`riff_library::TrackStore`].

pub mod api;
pub mod drafts;
pub mod error;
pub mod http;
pub mod state;
pub mod studio;

#[cfg(test)]
mod tests;

pub use api::{AudioFile, StudioApi};
pub use drafts::{ComposeOptions, caption_with_tags, contrast_caption};
pub use error::StudioError;
pub use http::HttpStudioApi;
pub use state::{SlotStatus, StudioPhase, TickOutcome, TrackJob};
pub use studio::{POLL_INTERVAL, Studio, TAKES};
