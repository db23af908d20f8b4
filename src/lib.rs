//! # img-compressor
//!
//! JPEG recompression with a live preview. Open an image, drag a compression
//! slider, watch the recompressed result and its size update, save it.
//!
//! # Architecture: Request → Encode → Accept
//!
//! ```text
//! slider event ─▶ PreviewController::set_quality(q)
//!                      │  CompressionRequest { generation, sequence, q }
//!                      ▼
//!                 worker pool ─▶ Encoder::encode(ImageBuffer, q)
//!                      │  Completion (over an mpsc channel)
//!                      ▼
//!                 accepted iff sequence is still the latest
//!                      │
//!                      ▼
//!                 PreviewEvent::Updated { bytes, "412.7 KB" } ─▶ UI
//!                      │
//!                 save ─▶ persist::save(last accepted, path)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Decoding ([`imaging::ImageBuffer`]), [`imaging::Quality`], the [`imaging::Encoder`] trait and JPEG encoder |
//! | [`preview`] | The live preview state machine and its worker-pool controller |
//! | [`session`] | The [`session::Session`] value: opened image, source path, accepted result |
//! | [`cache`] | Content-addressed in-memory cache of encoded previews |
//! | [`persist`] | Atomic save of the accepted preview |
//! | [`size`] | `"0.5 KB"` / `"3.20 MB"` size labels |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//! | [`error`] | Precondition errors and the crate-wide error aggregate |
//! | [`types`] | Requests, results and image info shared across modules |
//!
//! # Design Decisions
//!
//! ## Sequence Numbers Decide What Is Shown
//!
//! Every quality change gets the next sequence number; every image load
//! starts a new generation. A finished encode is shown only if both still
//! match the latest values, so a slow encode for an old slider position can
//! never overwrite a newer preview, whatever order encodes finish in.
//!
//! ## One Encode In Flight
//!
//! Codec calls cannot be interrupted, so "cancelling" an encode means
//! ignoring its result. While one encode runs, only the newest requested
//! position waits behind it. Dragging the slider across fifty positions
//! costs at most two encodes.
//!
//! ## Session As A Value
//!
//! There is no shared mutable session state. The controller owns a
//! [`session::Session`] and replaces it whole on open and on each accepted
//! preview. The worker threads only ever see an `Arc` of the decoded pixels.
//!
//! ## Pure-Rust Codecs
//!
//! Decoding and JPEG encoding use the `image` crate only. Output is
//! deterministic: the same pixels at the same quality give the same bytes.

pub mod cache;
pub mod config;
pub mod error;
pub mod imaging;
pub mod output;
pub mod persist;
pub mod preview;
pub mod session;
pub mod size;
pub mod types;

pub use error::{CompressorError, PreconditionError};

#[cfg(test)]
pub(crate) mod test_helpers;
