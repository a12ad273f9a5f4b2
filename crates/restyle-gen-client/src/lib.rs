#![warn(missing_docs)]
//! # restyle-gen-client
//!
//! ## Purpose
//! Talks to the external design-generation service and normalizes its
//! responses for the comparison flow.
//!
//! ## Responsibilities
//! - Validate the configurable service base URL.
//! - Build multipart generation requests (source photo, optional style tile).
//! - Route to the tile-pinned or service-randomized generation endpoint.
//! - Convert raw generated payloads into the displayable data-URL form.
//! - Surface non-success responses with their status and service message.
//!
//! ## Data flow
//! Compare flow hands a [`restyle_core::EncodedImage`] to
//! [`DesignServiceClient::generate`] -> transport POSTs multipart `files`
//! parts -> raw image body returns as [`GeneratedImage`] -> display surfaces
//! consume [`to_displayable`].
//!
//! ## Ownership and lifetimes
//! Requests and responses own their byte buffers; nothing borrows from
//! transient network buffers.
//!
//! ## Error model
//! Endpoint policy violations, transport failures and non-2xx service
//! responses are reported as [`GenerationError`] variants. The service's
//! response body text doubles as the human-readable error message by
//! contract.
//!
//! ## Security and privacy notes
//! Photo bytes are never logged; diagnostics carry endpoint paths and status
//! codes only.

use std::sync::Arc;
use std::time::Duration;

use restyle_core::{EncodedImage, encode_data_url};
use thiserror::Error;
use url::Url;

/// Multipart field name expected by every service upload.
pub const MULTIPART_FIELD: &str = "files";

/// Fallback MIME type for generated images (the service produces PNG).
pub const GENERATED_MIME_FALLBACK: &str = "image/png";

/// Fallback MIME type for style tiles (the service serves JPEG tiles).
pub const TILE_MIME_FALLBACK: &str = "image/jpeg";

/// Default transport timeout for one generation round trip.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Validated set of service endpoints derived from one base URL.
#[derive(Debug, Clone)]
pub struct ServiceEndpoints {
    style_tile: Url,
    generate_with_tile: Url,
    generate_random: Url,
}

impl ServiceEndpoints {
    /// Parses and validates the service base URL.
    ///
    /// # Errors
    /// Returns [`GenerationError::InvalidEndpoint`] for non-http(s) schemes,
    /// missing hosts, or unparseable URLs.
    pub fn new(base_url: &str) -> Result<Self, GenerationError> {
        let mut base = Url::parse(base_url)
            .map_err(|error| GenerationError::InvalidEndpoint(format!("invalid base url: {error}")))?;

        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(GenerationError::InvalidEndpoint(
                "service base url must use http or https".to_string(),
            ));
        }

        if base.host_str().is_none_or(str::is_empty) {
            return Err(GenerationError::InvalidEndpoint(
                "service base url must include a host".to_string(),
            ));
        }

        // Url::join replaces the last path segment unless the base ends in '/'.
        if !base.path().ends_with('/') {
            let normalized = format!("{}/", base.path());
            base.set_path(&normalized);
        }

        let join = |path: &str| {
            base.join(path).map_err(|error| {
                GenerationError::InvalidEndpoint(format!("cannot resolve '{path}': {error}"))
            })
        };

        Ok(Self {
            style_tile: join("tiles")?,
            generate_with_tile: join("tiles/generate/")?,
            generate_random: join("tiles/generate-random/")?,
        })
    }

    /// `GET` endpoint serving one style-reference tile.
    pub fn style_tile(&self) -> Url {
        self.style_tile.clone()
    }

    /// `POST` endpoint generating with a caller-chosen style tile.
    pub fn generate_with_tile(&self) -> Url {
        self.generate_with_tile.clone()
    }

    /// `POST` endpoint generating with a service-chosen random style.
    pub fn generate_random(&self) -> Url {
        self.generate_random.clone()
    }
}

/// HTTP method of one service request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// Body-less retrieval.
    Get,
    /// Multipart upload.
    Post,
}

/// One image part of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePart {
    /// File name advertised in the multipart headers.
    pub file_name: String,
    /// MIME type of the part body.
    pub mime: String,
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
}

/// One request executed by a [`GenerationTransport`].
#[derive(Debug, Clone)]
pub struct ServiceRequest {
    /// Request method.
    pub method: HttpMethod,
    /// Fully resolved endpoint URL.
    pub url: Url,
    /// Multipart parts, in upload order (source photo first). Empty for GET.
    pub parts: Vec<ImagePart>,
}

/// Raw response captured from the service.
#[derive(Debug, Clone)]
pub struct ServiceResponse {
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` header value, when present.
    pub content_type: Option<String>,
    /// Raw response body bytes.
    pub body: Vec<u8>,
}

/// Abstract transport executing service requests.
pub trait GenerationTransport: Send + Sync {
    /// Executes one request against the service.
    ///
    /// # Errors
    /// Returns [`GenerationError::Transport`] for connection-level failures;
    /// non-2xx statuses are returned as responses, not errors.
    fn execute(&self, request: &ServiceRequest) -> Result<ServiceResponse, GenerationError>;
}

/// Raw generated image payload plus its self-describing MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// Encoded image bytes as returned by the service.
    pub bytes: Vec<u8>,
    /// MIME type from the response, or the documented fallback.
    pub mime: String,
}

/// Converts a raw generated payload into the displayable data-URL form.
///
/// Never fails on well-formed input; a decode problem downstream is a defect,
/// not an expected runtime condition.
pub fn to_displayable(image: &GeneratedImage) -> String {
    encode_data_url(&image.mime, &image.bytes)
}

/// Client for the external design-generation service.
#[derive(Clone)]
pub struct DesignServiceClient {
    endpoints: ServiceEndpoints,
    transport: Arc<dyn GenerationTransport>,
}

impl DesignServiceClient {
    /// Creates a validated client over the given transport.
    ///
    /// # Errors
    /// Returns [`GenerationError::InvalidEndpoint`] when the base URL violates
    /// endpoint policy.
    pub fn new(
        base_url: &str,
        transport: Arc<dyn GenerationTransport>,
    ) -> Result<Self, GenerationError> {
        Ok(Self {
            endpoints: ServiceEndpoints::new(base_url)?,
            transport,
        })
    }

    /// Generates one redesign of the source photo.
    ///
    /// With a style tile the service applies that exact style
    /// (`tiles/generate/`, source photo first, tile second); without one the
    /// service picks a random style internally (`tiles/generate-random/`).
    /// The default interactive flow always omits the tile.
    ///
    /// # Errors
    /// Returns [`GenerationError::Service`] for non-2xx responses (the body
    /// text is the service's human-readable message),
    /// [`GenerationError::Transport`] for connection failures and
    /// [`GenerationError::EmptyResponse`] for a 2xx response without a body.
    pub fn generate(
        &self,
        source: &EncodedImage,
        style_tile: Option<&EncodedImage>,
    ) -> Result<GeneratedImage, GenerationError> {
        let mut parts = vec![ImagePart {
            file_name: "room.jpg".to_string(),
            mime: source.mime.clone(),
            bytes: source.bytes.clone(),
        }];

        let url = match style_tile {
            Some(tile) => {
                parts.push(ImagePart {
                    file_name: "style-tile.jpg".to_string(),
                    mime: tile.mime.clone(),
                    bytes: tile.bytes.clone(),
                });
                self.endpoints.generate_with_tile()
            }
            None => self.endpoints.generate_random(),
        };

        log::debug!("issuing generation request to {}", url.path());
        let response = self.transport.execute(&ServiceRequest {
            method: HttpMethod::Post,
            url,
            parts,
        })?;

        Self::into_image(response, GENERATED_MIME_FALLBACK)
    }

    /// Fetches one standalone style-reference tile.
    ///
    /// Not used on the default interactive path; exists for style-pinned
    /// generation.
    ///
    /// # Errors
    /// Same taxonomy as [`DesignServiceClient::generate`].
    pub fn fetch_random_style_tile(&self) -> Result<GeneratedImage, GenerationError> {
        let response = self.transport.execute(&ServiceRequest {
            method: HttpMethod::Get,
            url: self.endpoints.style_tile(),
            parts: Vec::new(),
        })?;

        Self::into_image(response, TILE_MIME_FALLBACK)
    }

    /// Returns the validated endpoint set.
    pub fn endpoints(&self) -> &ServiceEndpoints {
        &self.endpoints
    }

    fn into_image(
        response: ServiceResponse,
        mime_fallback: &str,
    ) -> Result<GeneratedImage, GenerationError> {
        if !(200..300).contains(&response.status) {
            return Err(GenerationError::Service {
                status: response.status,
                message: String::from_utf8_lossy(&response.body).trim().to_string(),
            });
        }

        if response.body.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        let mime = response
            .content_type
            .as_deref()
            .map(|value| value.split(';').next().unwrap_or(value).trim())
            .filter(|value| !value.is_empty())
            .unwrap_or(mime_fallback)
            .to_string();

        Ok(GeneratedImage {
            bytes: response.body,
            mime,
        })
    }
}

/// Production transport over a blocking HTTP client.
pub struct HttpGenerationTransport {
    client: reqwest::blocking::Client,
}

impl HttpGenerationTransport {
    /// Creates a transport with the default request timeout.
    ///
    /// # Errors
    /// Returns [`GenerationError::Transport`] when the HTTP client cannot be
    /// constructed.
    pub fn new() -> Result<Self, GenerationError> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Creates a transport with a caller-chosen request timeout.
    ///
    /// # Errors
    /// Returns [`GenerationError::Transport`] when the HTTP client cannot be
    /// constructed.
    pub fn with_timeout(timeout: Duration) -> Result<Self, GenerationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| GenerationError::Transport(error.to_string()))?;
        Ok(Self { client })
    }
}

impl GenerationTransport for HttpGenerationTransport {
    fn execute(&self, request: &ServiceRequest) -> Result<ServiceResponse, GenerationError> {
        let builder = match request.method {
            HttpMethod::Get => self.client.get(request.url.clone()),
            HttpMethod::Post => {
                let mut form = reqwest::blocking::multipart::Form::new();
                for part in &request.parts {
                    let form_part = reqwest::blocking::multipart::Part::bytes(part.bytes.clone())
                        .file_name(part.file_name.clone())
                        .mime_str(&part.mime)
                        .map_err(|error| GenerationError::Transport(error.to_string()))?;
                    form = form.part(MULTIPART_FIELD, form_part);
                }
                self.client.post(request.url.clone()).multipart(form)
            }
        };

        let response = builder
            .send()
            .map_err(|error| GenerationError::Transport(error.to_string()))?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        let body = response
            .bytes()
            .map_err(|error| GenerationError::Transport(error.to_string()))?
            .to_vec();

        Ok(ServiceResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Generation client error type.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Base URL violates endpoint policy.
    #[error("invalid service endpoint: {0}")]
    InvalidEndpoint(String),
    /// Service answered with a non-success status.
    #[error("generation service error ({status}): {message}")]
    Service {
        /// HTTP status code returned by the service.
        status: u16,
        /// Human-readable message taken from the response body.
        message: String,
    },
    /// Connection-level or client-construction failure.
    #[error("generation transport failure: {0}")]
    Transport(String),
    /// Service reported success but returned no payload.
    #[error("generation service returned an empty payload")]
    EmptyResponse,
}
