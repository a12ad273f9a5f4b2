#![warn(missing_docs)]
//! # restyle-capture
//!
//! ## Purpose
//! Acquires one still room photo from a live camera stream or a user-picked
//! file and normalizes it into a single encoded representation.
//!
//! ## Responsibilities
//! - Define a backend-agnostic camera acquisition seam.
//! - Drive the `Idle -> Streaming -> Frozen` capture lifecycle.
//! - Downscale frames so neither dimension exceeds the capture bound while
//!   preserving aspect ratio, then encode as quality-lossy JPEG.
//! - Ingest picked image files through the same normalization path.
//! - Expose deterministic synthetic capture for CI and unit tests.
//!
//! ## Data flow
//! App starts the camera -> backend yields a [`CameraStream`] -> an explicit
//! capture grabs one [`CameraFrame`] -> downscale + encode produce a
//! [`restyle_core::EncodedImage`] handed to session transfer.
//!
//! ## Ownership and lifetimes
//! The controller exclusively owns the live stream handle; frames and encoded
//! images are owned values with independent buffers.
//!
//! ## Error model
//! Acquisition failures (no device, denied permission, unavailable backend)
//! never surface as hard errors from the start flow; they map to a
//! file-picker fallback outcome. Pipeline failures report [`CaptureError`].
//!
//! ## Security and privacy notes
//! The stream is stopped and released before the frozen state is entered and
//! unconditionally on controller teardown; a frozen frame and a live camera
//! handle never coexist.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use restyle_core::EncodedImage;
use thiserror::Error;

#[cfg(feature = "real-camera")]
pub use real::RealCameraBackend;

/// Upper bound for either output dimension, in pixels.
pub const MAX_CAPTURE_DIMENSION: u32 = 1920;

/// JPEG encode quality for normalized captures.
pub const CAPTURE_JPEG_QUALITY: u8 = 92;

/// MIME type of every normalized capture.
pub const CAPTURE_MIME: &str = "image/jpeg";

/// Camera placement preference for stream acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraFacing {
    /// Rear/environment-facing camera, preferred for room photos.
    Rear,
    /// Front/user-facing camera.
    Front,
}

/// Acquisition request handed to camera backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamRequest {
    /// Preferred camera placement.
    pub facing: CameraFacing,
    /// Preferred stream width; backends may negotiate down.
    pub width: u32,
    /// Preferred stream height; backends may negotiate down.
    pub height: u32,
}

impl StreamRequest {
    /// Default request: rear camera at 1920x1080.
    pub fn rear_preferred() -> Self {
        Self {
            facing: CameraFacing::Rear,
            width: 1920,
            height: 1080,
        }
    }
}

/// One raw RGB frame grabbed from a live stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Raw RGB pixel buffer (`width * height * 3` bytes).
    pub rgb: Vec<u8>,
}

impl CameraFrame {
    /// Constructs a validated frame.
    ///
    /// # Errors
    /// Returns [`CaptureError::InvalidFrameShape`] when the pixel buffer
    /// length is not exactly `width * height * 3`.
    pub fn new(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self, CaptureError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(3))
            .ok_or_else(|| CaptureError::Backend("frame dimensions overflow".to_string()))?;
        if rgb.len() != expected {
            return Err(CaptureError::InvalidFrameShape {
                expected,
                actual: rgb.len(),
            });
        }

        Ok(Self { width, height, rgb })
    }
}

/// Trait implemented by concrete camera providers.
pub trait CameraBackend: Send + Sync {
    /// Opens a live stream negotiated against the request.
    ///
    /// # Errors
    /// Returns [`CaptureError::PermissionDenied`], [`CaptureError::NoDevice`]
    /// or [`CaptureError::CameraUnavailable`] when acquisition fails.
    fn open_stream(&self, request: &StreamRequest) -> Result<Box<dyn CameraStream>, CaptureError>;
}

/// One exclusively-owned live camera stream.
pub trait CameraStream: Send {
    /// Reported track dimensions, when the backend exposes metadata.
    ///
    /// Callers fall back to the grabbed frame's intrinsic size when `None`.
    fn dimensions(&self) -> Option<(u32, u32)>;

    /// Grabs the current frame from the stream.
    ///
    /// # Errors
    /// Returns [`CaptureError::Backend`] on device read failures.
    fn grab_frame(&mut self) -> Result<CameraFrame, CaptureError>;

    /// Stops all tracks and releases the device handle. Idempotent.
    fn stop(&mut self);

    /// Returns `true` once every track reports a stopped state.
    fn is_stopped(&self) -> bool;
}

/// Computes the output geometry bounded by `max_dimension`.
///
/// # Semantics
/// Dimensions already within the bound are returned unchanged. Otherwise both
/// sides are scaled by the same factor so the longer side equals the bound,
/// preserving aspect ratio to within rounding.
pub fn bounded_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longer = width.max(height);
    if longer <= max_dimension || longer == 0 {
        return (width, height);
    }

    let scale = max_dimension as f64 / longer as f64;
    let target_width = ((width as f64 * scale).round() as u32).max(1);
    let target_height = ((height as f64 * scale).round() as u32).max(1);
    (target_width, target_height)
}

/// Normalizes one raw frame into the canonical encoded representation.
///
/// `reported_size` is the stream's track metadata when available; the frame's
/// intrinsic size is used otherwise. The output never exceeds
/// [`MAX_CAPTURE_DIMENSION`] on its longer side.
///
/// # Errors
/// Returns [`CaptureError::Encode`] when the raster or JPEG encode fails.
pub fn normalize_frame(
    frame: &CameraFrame,
    reported_size: Option<(u32, u32)>,
) -> Result<EncodedImage, CaptureError> {
    let (source_width, source_height) = reported_size.unwrap_or((frame.width, frame.height));
    let (target_width, target_height) =
        bounded_dimensions(source_width, source_height, MAX_CAPTURE_DIMENSION);

    let raster = image::RgbImage::from_raw(frame.width, frame.height, frame.rgb.clone())
        .ok_or_else(|| {
            CaptureError::Encode(format!(
                "failed to construct RGB raster {}x{}",
                frame.width, frame.height
            ))
        })?;

    let output = if (frame.width, frame.height) == (target_width, target_height) {
        raster
    } else {
        image::imageops::resize(
            &raster,
            target_width,
            target_height,
            image::imageops::FilterType::Triangle,
        )
    };

    encode_jpeg(output.as_raw(), target_width, target_height)
}

/// Decodes a user-picked image file and normalizes it like a live capture.
///
/// Downstream consumers stay format-agnostic: whatever the picked file's
/// format was, the result is the same bounded JPEG representation.
///
/// # Errors
/// Returns [`CaptureError::FileDecode`] for undecodable input and
/// [`CaptureError::Encode`] when re-encoding fails.
pub fn normalize_picked_file(bytes: &[u8]) -> Result<EncodedImage, CaptureError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|error| CaptureError::FileDecode(error.to_string()))?
        .to_rgb8();

    let frame = CameraFrame::new(decoded.width(), decoded.height(), decoded.into_raw())?;
    normalize_frame(&frame, None)
}

fn encode_jpeg(rgb: &[u8], width: u32, height: u32) -> Result<EncodedImage, CaptureError> {
    let mut jpeg_bytes = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg_bytes, CAPTURE_JPEG_QUALITY)
        .encode(rgb, width, height, image::ColorType::Rgb8.into())
        .map_err(|error| CaptureError::Encode(format!("jpeg encoding failed: {error}")))?;

    EncodedImage::new(jpeg_bytes, CAPTURE_MIME, width, height)
        .map_err(|error| CaptureError::Encode(error.to_string()))
}

/// Capture lifecycle phase projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// No active stream and no captured frame.
    Idle,
    /// Live stream attached to the preview.
    Streaming,
    /// Still frame extracted; stream released.
    Frozen,
}

/// Outcome of the start-camera flow.
///
/// Acquisition failures are never hard errors: the user is offered the file
/// picker instead of a dead end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// Stream acquired; live preview may be shown.
    Streaming,
    /// Acquisition failed; open the file picker and show the reason.
    FallbackToFilePicker {
        /// Human-readable acquisition failure description.
        reason: String,
    },
}

/// Owns the camera lifecycle and the frozen capture result.
pub struct CaptureController {
    backend: Arc<dyn CameraBackend>,
    request: StreamRequest,
    stream: Option<Box<dyn CameraStream>>,
    frozen: Option<EncodedImage>,
}

impl CaptureController {
    /// Creates an idle controller over the given backend.
    pub fn new(backend: Arc<dyn CameraBackend>) -> Self {
        Self {
            backend,
            request: StreamRequest::rear_preferred(),
            stream: None,
            frozen: None,
        }
    }

    /// Returns the current lifecycle phase.
    pub fn state(&self) -> CaptureState {
        if self.stream.is_some() {
            CaptureState::Streaming
        } else if self.frozen.is_some() {
            CaptureState::Frozen
        } else {
            CaptureState::Idle
        }
    }

    /// Starts the camera, entering `Streaming` on success.
    ///
    /// Every acquisition failure (denied permission, missing device,
    /// unavailable backend) is treated identically: the failure is logged and
    /// mapped to the file-picker fallback.
    pub fn start_camera(&mut self) -> StartOutcome {
        self.release_stream();

        match self.backend.open_stream(&self.request) {
            Ok(stream) => {
                self.frozen = None;
                self.stream = Some(stream);
                log::info!("camera stream acquired");
                StartOutcome::Streaming
            }
            Err(error) => {
                log::warn!("camera acquisition failed, offering file picker: {error}");
                StartOutcome::FallbackToFilePicker {
                    reason: error.to_string(),
                }
            }
        }
    }

    /// Freezes the current stream frame into the encoded representation.
    ///
    /// The stream is stopped and released before `Frozen` is entered.
    ///
    /// # Errors
    /// Returns [`CaptureError::NoActiveStream`] outside `Streaming` and
    /// propagates frame grab/encode failures, in which case the stream stays
    /// live for another attempt.
    pub fn capture_still(&mut self) -> Result<&EncodedImage, CaptureError> {
        let stream = self.stream.as_mut().ok_or(CaptureError::NoActiveStream)?;

        let reported_size = stream.dimensions();
        let frame = stream.grab_frame()?;
        let encoded = normalize_frame(&frame, reported_size)?;

        // Invariant:
        // - All tracks stop before the frozen state becomes observable.
        self.release_stream();
        log::info!(
            "captured still frame {}x{} ({} bytes)",
            encoded.width,
            encoded.height,
            encoded.bytes.len()
        );
        Ok(&*self.frozen.insert(encoded))
    }

    /// Ingests a user-picked image file, entering `Frozen` directly.
    ///
    /// Any active stream is stopped as a side effect, so a file picked during
    /// a live preview behaves like an explicit capture.
    ///
    /// # Errors
    /// Propagates decode/encode failures; state falls back to `Idle`.
    pub fn ingest_file(&mut self, bytes: &[u8]) -> Result<&EncodedImage, CaptureError> {
        self.release_stream();
        self.frozen = None;

        let encoded = normalize_picked_file(bytes)?;
        log::info!(
            "ingested picked file as {}x{} ({} bytes)",
            encoded.width,
            encoded.height,
            encoded.bytes.len()
        );
        Ok(&*self.frozen.insert(encoded))
    }

    /// Discards the frozen frame and re-invokes the start-camera flow.
    pub fn retry(&mut self) -> StartOutcome {
        self.frozen = None;
        self.start_camera()
    }

    /// Returns the frozen capture, when one exists.
    pub fn frozen_image(&self) -> Option<&EncodedImage> {
        self.frozen.as_ref()
    }

    /// Hands the frozen capture to the caller, returning to `Idle`.
    pub fn take_frozen(&mut self) -> Option<EncodedImage> {
        self.frozen.take()
    }

    /// Stops and releases any active stream unconditionally.
    pub fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            log::debug!("camera stream released");
        }
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        // Invariant:
        // - No camera handle survives controller teardown, including abnormal
        //   unwind paths.
        self.release_stream();
    }
}

/// Deterministic synthetic backend for test and CI usage.
///
/// Streams expose a shared stopped-flag probe so tests can assert release
/// discipline after the controller consumed the stream handle.
pub struct SyntheticCameraBackend {
    width: u32,
    height: u32,
    report_track_size: bool,
    deny_access: bool,
    sequence: AtomicU64,
    last_stream_stopped: Mutex<Option<Arc<AtomicBool>>>,
}

impl SyntheticCameraBackend {
    /// Creates a backend streaming 1280x720 frames.
    pub fn new() -> Self {
        Self::with_dimensions(1280, 720)
    }

    /// Creates a backend streaming frames of the given geometry.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            report_track_size: true,
            deny_access: false,
            sequence: AtomicU64::new(0),
            last_stream_stopped: Mutex::new(None),
        }
    }

    /// Disables track metadata so callers exercise the intrinsic-size fallback.
    pub fn without_track_metadata(mut self) -> Self {
        self.report_track_size = false;
        self
    }

    /// Makes every acquisition fail like a denied permission prompt.
    pub fn denying_access(mut self) -> Self {
        self.deny_access = true;
        self
    }

    /// Returns `true` when the most recently opened stream has been stopped.
    pub fn last_stream_stopped(&self) -> bool {
        self.last_stream_stopped
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(|flag| flag.load(Ordering::SeqCst)))
            .unwrap_or(false)
    }
}

impl Default for SyntheticCameraBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for SyntheticCameraBackend {
    fn open_stream(&self, _request: &StreamRequest) -> Result<Box<dyn CameraStream>, CaptureError> {
        if self.deny_access {
            return Err(CaptureError::PermissionDenied);
        }

        let stopped = Arc::new(AtomicBool::new(false));
        if let Ok(mut slot) = self.last_stream_stopped.lock() {
            *slot = Some(Arc::clone(&stopped));
        }

        Ok(Box::new(SyntheticCameraStream {
            width: self.width,
            height: self.height,
            report_track_size: self.report_track_size,
            fill: (self.sequence.fetch_add(1, Ordering::SeqCst) % 255) as u8,
            stopped,
        }))
    }
}

struct SyntheticCameraStream {
    width: u32,
    height: u32,
    report_track_size: bool,
    fill: u8,
    stopped: Arc<AtomicBool>,
}

impl CameraStream for SyntheticCameraStream {
    fn dimensions(&self) -> Option<(u32, u32)> {
        self.report_track_size.then_some((self.width, self.height))
    }

    fn grab_frame(&mut self) -> Result<CameraFrame, CaptureError> {
        if self.is_stopped() {
            return Err(CaptureError::Backend(
                "synthetic stream already stopped".to_string(),
            ));
        }

        let rgb_len = (self.width as usize) * (self.height as usize) * 3;
        CameraFrame::new(self.width, self.height, vec![self.fill; rgb_len])
    }

    fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Capture layer error type.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Platform exposes no camera access.
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),
    /// User or platform denied camera permission.
    #[error("camera permission denied")]
    PermissionDenied,
    /// No camera device is present.
    #[error("no camera device present")]
    NoDevice,
    /// Capture was requested without an active stream.
    #[error("no active stream to capture from")]
    NoActiveStream,
    /// Frame buffer shape does not match declared geometry.
    #[error("invalid frame shape: expected {expected} bytes, got {actual}")]
    InvalidFrameShape {
        /// Expected RGB byte count.
        expected: usize,
        /// Actual RGB byte count.
        actual: usize,
    },
    /// Picked file could not be decoded as an image.
    #[error("picked file decode failure: {0}")]
    FileDecode(String),
    /// Raster construction or JPEG encoding failed.
    #[error("capture encode failure: {0}")]
    Encode(String),
    /// Backend runtime failure.
    #[error("camera backend failure: {0}")]
    Backend(String),
}

#[cfg(feature = "real-camera")]
mod real {
    //! Webcam acquisition through nokhwa, compiled only with `real-camera`.

    use nokhwa::pixel_format::RgbFormat;
    use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
    use nokhwa::Camera;

    use super::{CameraBackend, CameraFrame, CameraStream, CaptureError, StreamRequest};

    /// Device-backed camera provider using the first available webcam.
    pub struct RealCameraBackend;

    impl RealCameraBackend {
        /// Creates the device-backed provider.
        pub fn new() -> Self {
            Self
        }
    }

    impl Default for RealCameraBackend {
        fn default() -> Self {
            Self::new()
        }
    }

    impl CameraBackend for RealCameraBackend {
        fn open_stream(
            &self,
            _request: &StreamRequest,
        ) -> Result<Box<dyn CameraStream>, CaptureError> {
            let requested =
                RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);
            let mut camera = Camera::new(CameraIndex::Index(0), requested)
                .map_err(|error| CaptureError::CameraUnavailable(error.to_string()))?;
            camera
                .open_stream()
                .map_err(|error| CaptureError::CameraUnavailable(error.to_string()))?;

            Ok(Box::new(RealCameraStream {
                camera: Some(camera),
            }))
        }
    }

    struct RealCameraStream {
        camera: Option<Camera>,
    }

    impl CameraStream for RealCameraStream {
        fn dimensions(&self) -> Option<(u32, u32)> {
            self.camera.as_ref().map(|camera| {
                let resolution = camera.resolution();
                (resolution.width(), resolution.height())
            })
        }

        fn grab_frame(&mut self) -> Result<CameraFrame, CaptureError> {
            let camera = self
                .camera
                .as_mut()
                .ok_or_else(|| CaptureError::Backend("stream already stopped".to_string()))?;
            let buffer = camera
                .frame()
                .map_err(|error| CaptureError::Backend(error.to_string()))?;
            let decoded = buffer
                .decode_image::<RgbFormat>()
                .map_err(|error| CaptureError::Backend(error.to_string()))?;

            CameraFrame::new(decoded.width(), decoded.height(), decoded.into_raw())
        }

        fn stop(&mut self) {
            if let Some(mut camera) = self.camera.take() {
                let _ = camera.stop_stream();
            }
        }

        fn is_stopped(&self) -> bool {
            self.camera.is_none()
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for lifecycle transitions, bounds and release discipline.

    use super::*;

    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        use image::ImageEncoder as _;

        let raster = image::RgbImage::from_pixel(width, height, image::Rgb([120, 80, 40]));
        let mut bytes = Vec::new();
        image::codecs::png::PngEncoder::new(&mut bytes)
            .write_image(raster.as_raw(), width, height, image::ColorType::Rgb8.into())
            .expect("png fixture should encode");
        bytes
    }

    #[test]
    fn bounded_dimensions_preserves_aspect_ratio() {
        assert_eq!(bounded_dimensions(3000, 2000, 1920), (1920, 1280));
        assert_eq!(bounded_dimensions(2000, 3000, 1920), (1280, 1920));
        assert_eq!(bounded_dimensions(1280, 720, 1920), (1280, 720));
    }

    #[test]
    fn capture_downscales_and_releases_stream() {
        let backend = Arc::new(SyntheticCameraBackend::with_dimensions(3000, 2000));
        let mut controller = CaptureController::new(Arc::clone(&backend) as Arc<dyn CameraBackend>);

        assert_eq!(controller.start_camera(), StartOutcome::Streaming);
        assert_eq!(controller.state(), CaptureState::Streaming);

        let encoded = controller.capture_still().expect("capture should succeed");
        assert_eq!((encoded.width, encoded.height), (1920, 1280));
        assert_eq!(encoded.mime, CAPTURE_MIME);

        assert_eq!(controller.state(), CaptureState::Frozen);
        assert!(backend.last_stream_stopped());
    }

    #[test]
    fn capture_falls_back_to_frame_size_without_track_metadata() {
        let backend =
            Arc::new(SyntheticCameraBackend::with_dimensions(640, 480).without_track_metadata());
        let mut controller = CaptureController::new(backend as Arc<dyn CameraBackend>);

        assert_eq!(controller.start_camera(), StartOutcome::Streaming);
        let encoded = controller.capture_still().expect("capture should succeed");
        assert_eq!((encoded.width, encoded.height), (640, 480));
    }

    #[test]
    fn denied_acquisition_offers_file_picker_fallback() {
        let backend = Arc::new(SyntheticCameraBackend::new().denying_access());
        let mut controller = CaptureController::new(backend as Arc<dyn CameraBackend>);

        match controller.start_camera() {
            StartOutcome::FallbackToFilePicker { reason } => {
                assert!(reason.contains("permission denied"));
            }
            StartOutcome::Streaming => panic!("denied backend must not stream"),
        }
        assert_eq!(controller.state(), CaptureState::Idle);
    }

    #[test]
    fn file_ingest_freezes_and_stops_active_stream() {
        let backend = Arc::new(SyntheticCameraBackend::new());
        let mut controller = CaptureController::new(Arc::clone(&backend) as Arc<dyn CameraBackend>);

        assert_eq!(controller.start_camera(), StartOutcome::Streaming);
        let encoded = controller
            .ingest_file(&sample_png(2400, 1600))
            .expect("picked file should normalize");
        assert_eq!(encoded.mime, CAPTURE_MIME);
        assert_eq!((encoded.width, encoded.height), (1920, 1280));
        assert_eq!(controller.state(), CaptureState::Frozen);
        assert!(backend.last_stream_stopped());
    }

    #[test]
    fn undecodable_file_reports_decode_failure() {
        let backend = Arc::new(SyntheticCameraBackend::new());
        let mut controller = CaptureController::new(backend as Arc<dyn CameraBackend>);
        assert!(matches!(
            controller.ingest_file(b"not an image"),
            Err(CaptureError::FileDecode(_))
        ));
        assert_eq!(controller.state(), CaptureState::Idle);
    }

    #[test]
    fn retry_discards_frozen_frame_and_restarts_camera() {
        let backend = Arc::new(SyntheticCameraBackend::new());
        let mut controller = CaptureController::new(backend as Arc<dyn CameraBackend>);

        controller.start_camera();
        controller.capture_still().expect("capture should succeed");
        assert_eq!(controller.state(), CaptureState::Frozen);

        assert_eq!(controller.retry(), StartOutcome::Streaming);
        assert_eq!(controller.state(), CaptureState::Streaming);
        assert!(controller.frozen_image().is_none());
    }

    #[test]
    fn drop_releases_active_stream() {
        let backend = Arc::new(SyntheticCameraBackend::new());
        {
            let mut controller =
                CaptureController::new(Arc::clone(&backend) as Arc<dyn CameraBackend>);
            controller.start_camera();
        }
        assert!(backend.last_stream_stopped());
    }

    #[test]
    fn capture_without_stream_reports_no_active_stream() {
        let backend = Arc::new(SyntheticCameraBackend::new());
        let mut controller = CaptureController::new(backend as Arc<dyn CameraBackend>);
        assert!(matches!(
            controller.capture_still(),
            Err(CaptureError::NoActiveStream)
        ));
    }
}
