// SPDX-License-Identifier: MPL-2.0

//! Still photo pipeline
//!
//! ```text
//! take_picture ─▶ still request ─▶ transient session ─▶ capture
//!                                        │                  │
//!                          configure failed          image available
//!                                        ▼                  ▼
//!                             preview snapshot      copy plane 0, release
//!                                        │                  │
//!                                        └──────▶ ImageWriter ◀┘
//! ```
//!
//! # Pipeline Stages
//!
//! 1. **Request**: one-shot request into a dedicated still sink plus the
//!    preview surface, stamped with the current parameters and zoom crop
//! 2. **Extraction**: the latest image is copied out and released at once
//! 3. **Persistence**: the owned bytes go to the image writer
//!
//! When the transient session cannot be configured, the rendered preview is
//! encoded instead. The lower fidelity result is still reported as a saved
//! photo.

pub mod capture;
pub mod encoding;

pub use capture::{CapturedImage, build_still_request, extract_image, select_still_size};
pub use encoding::{EncodedImage, PhotoEncoder};

use crate::backends::camera::{CaptureRequest, ImageReader};
use std::fmt;
use std::path::{Path, PathBuf};

/// Still capture waiting for its session or its image
pub struct PendingStill {
    reader: Box<dyn ImageReader>,
    request: CaptureRequest,
    destination: PathBuf,
}

impl PendingStill {
    pub fn new(reader: Box<dyn ImageReader>, request: CaptureRequest, destination: PathBuf) -> Self {
        Self {
            reader,
            request,
            destination,
        }
    }

    pub fn reader_id(&self) -> u64 {
        self.reader.id()
    }

    pub fn request(&self) -> &CaptureRequest {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut CaptureRequest {
        &mut self.request
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Pull the captured image out of the still sink
    pub fn extract(&mut self) -> Result<CapturedImage, crate::errors::PhotoError> {
        extract_image(self.reader.as_mut())
    }
}

impl fmt::Debug for PendingStill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingStill")
            .field("reader", &self.reader.id())
            .field("destination", &self.destination)
            .finish()
    }
}
