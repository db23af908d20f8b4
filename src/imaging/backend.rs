//! Encoder trait and shared error type.
//!
//! The [`Encoder`] trait is the one capability the preview pipeline needs from
//! a codec: turn an [`ImageBuffer`] and a [`Quality`] into compressed bytes.
//! Implementations must be deterministic (same input, same bytes) and must
//! accept the full quality range including both endpoints.
//!
//! The production implementation is [`JpegEncoder`](super::jpeg::JpegEncoder).
//! Tests swap in the mocks from [`tests`].

use super::buffer::ImageBuffer;
use super::params::Quality;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("no {0} encoder available")]
    Unavailable(String),
    #[error("encoding failed: {0}")]
    Failed(String),
    #[error("encoder produced no output")]
    EmptyOutput,
}

/// A lossy codec.
///
/// `Send + Sync` because encodes run on the worker pool while the control
/// thread keeps its own handle.
pub trait Encoder: Send + Sync {
    /// Short codec name, part of the encode cache key.
    fn name(&self) -> &'static str;

    /// Compress `image` at `quality`.
    fn encode(&self, image: &ImageBuffer, quality: Quality) -> Result<Vec<u8>, EncodeError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::mpsc::{Receiver, Sender, channel};

    /// Fake output whose length encodes the quality, so tests can tell
    /// results apart by size alone.
    pub fn fake_bytes(quality: Quality) -> Vec<u8> {
        vec![0xAB; 100 + quality.codec_value() as usize]
    }

    /// Encoder that records every call and returns [`fake_bytes`].
    #[derive(Default)]
    pub struct MockEncoder {
        pub calls: Mutex<Vec<Quality>>,
    }

    impl MockEncoder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn get_calls(&self) -> Vec<Quality> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Encoder for MockEncoder {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn encode(&self, _image: &ImageBuffer, quality: Quality) -> Result<Vec<u8>, EncodeError> {
            self.calls.lock().unwrap().push(quality);
            Ok(fake_bytes(quality))
        }
    }

    /// Encoder that reports each start and then blocks until the test
    /// releases it, giving tests control over completion timing.
    pub struct GatedEncoder {
        started: Mutex<Sender<Quality>>,
        release: Mutex<Receiver<()>>,
        pub calls: Mutex<Vec<Quality>>,
    }

    impl GatedEncoder {
        /// Returns the encoder, the receiver of start notifications and the
        /// sender that lets one blocked encode finish per message.
        pub fn new() -> (Self, Receiver<Quality>, Sender<()>) {
            let (started_tx, started_rx) = channel();
            let (release_tx, release_rx) = channel();
            let encoder = Self {
                started: Mutex::new(started_tx),
                release: Mutex::new(release_rx),
                calls: Mutex::new(Vec::new()),
            };
            (encoder, started_rx, release_tx)
        }

        pub fn get_calls(&self) -> Vec<Quality> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Encoder for GatedEncoder {
        fn name(&self) -> &'static str {
            "gated"
        }

        fn encode(&self, _image: &ImageBuffer, quality: Quality) -> Result<Vec<u8>, EncodeError> {
            self.calls.lock().unwrap().push(quality);
            self.started.lock().unwrap().send(quality).ok();
            self.release
                .lock()
                .unwrap()
                .recv()
                .map_err(|_| EncodeError::Failed("gate dropped".into()))?;
            Ok(fake_bytes(quality))
        }
    }

    /// Encoder that fails for qualities below a threshold.
    pub struct FailingEncoder {
        pub fail_below: Quality,
    }

    impl Encoder for FailingEncoder {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn encode(&self, _image: &ImageBuffer, quality: Quality) -> Result<Vec<u8>, EncodeError> {
            if quality < self.fail_below {
                Err(EncodeError::Unavailable("jpeg".into()))
            } else {
                Ok(fake_bytes(quality))
            }
        }
    }

    fn tiny_image() -> ImageBuffer {
        ImageBuffer::from_image(image::DynamicImage::new_rgb8(4, 4), 0).unwrap()
    }

    #[test]
    fn mock_records_calls() {
        let encoder = MockEncoder::new();
        let bytes = encoder.encode(&tiny_image(), Quality::new(0.5)).unwrap();

        assert_eq!(bytes.len(), 151);
        assert_eq!(encoder.get_calls(), vec![Quality::new(0.5)]);
    }

    #[test]
    fn gated_encoder_waits_for_release() {
        let (encoder, started, release) = GatedEncoder::new();
        let encoder = std::sync::Arc::new(encoder);
        let worker = {
            let encoder = encoder.clone();
            std::thread::spawn(move || encoder.encode(&tiny_image(), Quality::MAX))
        };

        assert_eq!(started.recv().unwrap(), Quality::MAX);
        release.send(()).unwrap();
        let bytes = worker.join().unwrap().unwrap();
        assert_eq!(bytes, fake_bytes(Quality::MAX));
    }

    #[test]
    fn failing_encoder_fails_below_threshold() {
        let encoder = FailingEncoder {
            fail_below: Quality::new(0.5),
        };
        assert!(encoder.encode(&tiny_image(), Quality::new(0.2)).is_err());
        assert!(encoder.encode(&tiny_image(), Quality::new(0.8)).is_ok());
    }
}
