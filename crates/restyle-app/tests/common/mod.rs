//! Shared fixtures for app integration tests.

use std::sync::{Arc, Mutex};

use restyle_core::EncodedImage;
use restyle_gen_client::{
    DesignServiceClient, GenerationError, GenerationTransport, ServiceRequest, ServiceResponse,
};

/// Deterministic source photo fixture.
#[allow(dead_code)]
pub fn fixture_source() -> EncodedImage {
    EncodedImage::new(vec![0xFF, 0xD8, 0xFF, 0xE0], "image/jpeg", 1920, 1280)
        .expect("source fixture should be valid")
}

/// Transport returning one fixed response while recording every request.
pub struct CountingTransport {
    requests: Mutex<Vec<ServiceRequest>>,
    response: ServiceResponse,
}

#[allow(dead_code)]
impl CountingTransport {
    /// Transport answering 200 with a tiny PNG-ish body.
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            response: ServiceResponse {
                status: 200,
                content_type: Some("image/png".to_string()),
                body: vec![0x89, 0x50, 0x4E, 0x47],
            },
        })
    }

    /// Transport answering a fixed error status and body message.
    pub fn failing(status: u16, message: &str) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            response: ServiceResponse {
                status,
                content_type: Some("text/plain".to_string()),
                body: message.as_bytes().to_vec(),
            },
        })
    }

    /// Number of requests executed so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("request lock should work").len()
    }
}

impl GenerationTransport for CountingTransport {
    fn execute(&self, request: &ServiceRequest) -> Result<ServiceResponse, GenerationError> {
        self.requests
            .lock()
            .expect("request lock should work")
            .push(request.clone());
        Ok(self.response.clone())
    }
}

/// Builds a client over the given transport with a local base URL.
#[allow(dead_code)]
pub fn client_over(transport: Arc<CountingTransport>) -> DesignServiceClient {
    DesignServiceClient::new("http://localhost:8000", transport)
        .expect("client fixture should build")
}
