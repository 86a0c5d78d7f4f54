// SPDX-License-Identifier: MPL-2.0

//! Still capture from the camera device
//!
//! Builds the one-shot request for a still and pulls the resulting image out
//! of the still sink. The device-side image is released as soon as its
//! payload has been copied, so the sink never holds on to a buffer while the
//! file is being written.

use crate::backends::camera::request::CONTROL_MODE_AUTO;
use crate::backends::camera::{
    BackendResult, CameraCharacteristics, CameraDevice, CaptureRequest, ControlKey, ControlValue,
    ImageReader, OutputTarget, RequestTemplate,
};
use crate::constants::DEFAULT_STILL_SIZE;
use crate::errors::PhotoError;
use crate::geometry::Size;
use crate::session::parameters::CaptureParameters;
use tracing::{debug, info};

/// Owned copy of a captured image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    /// Payload of the first plane (JPEG bytes for still sinks)
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Still size: first size the device can encode, 640x480 when none is reported
pub fn select_still_size(characteristics: &CameraCharacteristics) -> Size {
    characteristics
        .still_sizes
        .first()
        .copied()
        .unwrap_or(DEFAULT_STILL_SIZE)
}

/// One-shot request into `sink`, also rendering into the preview surface
///
/// All parameters are stamped from `parameters`; the crop region is left to
/// the caller, which owns the sensor geometry.
pub fn build_still_request(
    device: &dyn CameraDevice,
    sink: OutputTarget,
    preview: Option<OutputTarget>,
    parameters: &CaptureParameters,
) -> BackendResult<CaptureRequest> {
    let mut request = device.create_capture_request(RequestTemplate::StillCapture)?;
    request.add_target(sink);
    if let Some(preview) = preview {
        request.add_target(preview);
    }
    request.set(ControlKey::ControlMode, ControlValue::Int(CONTROL_MODE_AUTO));
    parameters.apply(&mut request);

    debug!(
        targets = request.targets().len(),
        enhance = parameters.enhance,
        "Still request built"
    );
    Ok(request)
}

/// Copy the latest image out of `reader` and release it
pub fn extract_image(reader: &mut dyn ImageReader) -> Result<CapturedImage, PhotoError> {
    let image = reader
        .acquire_latest_image()
        .ok_or(PhotoError::NoImageAvailable)?;

    let data = image
        .plane(0)
        .ok_or(PhotoError::NoImageAvailable)?
        .to_vec();
    let (width, height) = (image.width(), image.height());
    drop(image);

    info!(width, height, size = data.len(), "Still image extracted");
    Ok(CapturedImage {
        data,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::{
        Image, RequestTemplate, SessionPurpose, TargetKind,
    };
    use crate::constants::JPEG_QUALITY;
    use crate::geometry::Rect;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TestImage {
        data: Vec<u8>,
        released: Arc<AtomicUsize>,
    }

    impl Image for TestImage {
        fn width(&self) -> u32 {
            2
        }
        fn height(&self) -> u32 {
            1
        }
        fn plane_count(&self) -> usize {
            1
        }
        fn plane(&self, index: usize) -> Option<&[u8]> {
            (index == 0).then_some(self.data.as_slice())
        }
    }

    impl Drop for TestImage {
        fn drop(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct TestReader {
        pending: Option<Box<dyn Image>>,
    }

    impl ImageReader for TestReader {
        fn id(&self) -> u64 {
            1
        }
        fn target(&self) -> OutputTarget {
            OutputTarget::new(1, TargetKind::StillSink)
        }
        fn size(&self) -> Size {
            Size::new(2, 1)
        }
        fn acquire_latest_image(&mut self) -> Option<Box<dyn Image>> {
            self.pending.take()
        }
    }

    struct TestDevice;

    impl CameraDevice for TestDevice {
        fn id(&self) -> &str {
            "test"
        }
        fn create_capture_request(&self, template: RequestTemplate) -> BackendResult<CaptureRequest> {
            Ok(CaptureRequest::new(template))
        }
        fn create_image_reader(&mut self, _: Size, _: usize) -> BackendResult<Box<dyn ImageReader>> {
            Ok(Box::new(TestReader { pending: None }))
        }
        fn create_capture_session(&mut self, _: &[OutputTarget], _: SessionPurpose) -> BackendResult<()> {
            Ok(())
        }
        fn close(&mut self) {}
    }

    fn characteristics(still_sizes: Vec<Size>) -> CameraCharacteristics {
        CameraCharacteristics {
            active_array: Rect::from_size(4000, 3000),
            max_digital_zoom: Some(4.0),
            min_focus_distance: None,
            preview_sizes: Vec::new(),
            still_sizes,
        }
    }

    #[test]
    fn test_still_size_selection() {
        let sizes = vec![Size::new(4000, 3000), Size::new(1920, 1080)];
        assert_eq!(select_still_size(&characteristics(sizes)), Size::new(4000, 3000));
        assert_eq!(select_still_size(&characteristics(Vec::new())), Size::new(640, 480));
    }

    #[test]
    fn test_still_request_targets_and_parameters() {
        let sink = OutputTarget::new(7, TargetKind::StillSink);
        let preview = OutputTarget::new(3, TargetKind::Preview);
        let parameters = CaptureParameters {
            flash: true,
            ..Default::default()
        };
        let request = build_still_request(&TestDevice, sink, Some(preview), &parameters).unwrap();

        assert_eq!(request.template(), RequestTemplate::StillCapture);
        assert_eq!(request.targets(), &[sink, preview]);
        assert_eq!(request.get_int(ControlKey::JpegQuality), Some(JPEG_QUALITY as i32));
        assert_eq!(request.get_int(ControlKey::ControlMode), Some(CONTROL_MODE_AUTO));
        assert_eq!(request.get_int(ControlKey::FlashMode), Some(2));
    }

    #[test]
    fn test_extract_releases_image_after_copy() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut reader = TestReader {
            pending: Some(Box::new(TestImage {
                data: vec![0xFF, 0xD8, 0x00],
                released: released.clone(),
            })),
        };

        let captured = extract_image(&mut reader).unwrap();
        assert_eq!(captured.data, vec![0xFF, 0xD8, 0x00]);
        assert_eq!(released.load(Ordering::SeqCst), 1);

        assert!(matches!(
            extract_image(&mut reader),
            Err(PhotoError::NoImageAvailable)
        ));
    }
}
