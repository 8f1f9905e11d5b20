//! Continuous camera scanning.
//!
//! A [`ScanSession`] owns the camera while scanning. The camera reports one
//! result per frame; frames without a usable product code are reported and
//! scanning continues. The first good decode ends the session and releases
//! the camera. Releasing happens exactly once, whichever of decode, `stop()`
//! or drop gets there first.

use tracing::{debug, warn};

use super::{QrError, ScannedProduct, decode};

/// A camera that can be released.
pub trait Camera {
    /// Stop capturing and free the device.
    fn release(self);
}

/// Why a frame produced no product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanIssue {
    /// The camera found no readable code in the frame.
    NoCode(String),
    /// A code was read but is not a product code.
    NotAProduct(QrError),
}

/// Result of feeding one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// Scanning continues.
    Recoverable(ScanIssue),
    /// A product was read and the camera released.
    Decoded(ScannedProduct),
}

/// One scanning run.
#[derive(Debug)]
pub struct ScanSession<C: Camera> {
    camera: Option<C>,
}

impl<C: Camera> ScanSession<C> {
    /// Start scanning with `camera`.
    #[must_use]
    pub const fn start(camera: C) -> Self {
        Self {
            camera: Some(camera),
        }
    }

    /// Whether the session still holds the camera.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.camera.is_some()
    }

    /// Feed one frame result: decoded text or the camera's error message.
    ///
    /// Returns `None` once the session has finished.
    pub fn feed(&mut self, frame: Result<&str, String>) -> Option<ScanEvent> {
        if !self.is_active() {
            return None;
        }

        let event = match frame {
            Err(message) => ScanEvent::Recoverable(ScanIssue::NoCode(message)),
            Ok(text) => match decode(text) {
                Ok(product) => {
                    debug!(product_id = %product.product_id, "Product code scanned");
                    self.stop();
                    ScanEvent::Decoded(product)
                }
                Err(e) => {
                    warn!(error = %e, "Scanned code is not a product code");
                    ScanEvent::Recoverable(ScanIssue::NotAProduct(e))
                }
            },
        };
        Some(event)
    }

    /// Stop scanning. Releases the camera if still held.
    pub fn stop(&mut self) {
        if let Some(camera) = self.camera.take() {
            camera.release();
        }
    }
}

impl<C: Camera> Drop for ScanSession<C> {
    fn drop(&mut self) {
        self.stop();
    }
}
