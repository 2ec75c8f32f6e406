//! Google Cloud Vision document-text detection.
//!
//! One `images:annotate` request per call, with the image inlined as base64
//! and the `DOCUMENT_TEXT_DETECTION` feature, which is tuned for dense
//! paragraph text rather than sparse labels. The response carries either a
//! per-image error or a `fullTextAnnotation` whose `text` is returned as-is.

use crate::config::{ConversionConfig, VisionCredentials, DEFAULT_VISION_ENDPOINT};
use crate::error::Notes2PdfError;
use crate::pipeline::auth::{ServiceAccountKey, TokenSource};
use crate::pipeline::recognize::{text_or_sentinel, TextRecognizer};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const ANNOTATE_PATH: &str = "/v1/images:annotate";
const DOCUMENT_TEXT_DETECTION: &str = "DOCUMENT_TEXT_DETECTION";

/// How requests are authorised.
enum Auth {
    ApiKey(String),
    ServiceAccount(TokenSource),
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Auth::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Auth::ServiceAccount(tokens) => f.debug_tuple("ServiceAccount").field(tokens).finish(),
        }
    }
}

/// [`TextRecognizer`] backed by the Cloud Vision REST API.
#[derive(Debug)]
pub struct GoogleVisionRecognizer {
    client: reqwest::Client,
    auth: Auth,
    endpoint: String,
    language_hints: Vec<String>,
}

impl GoogleVisionRecognizer {
    /// Create a client from explicit credentials.
    ///
    /// A service-account key file is read and parsed here, so a bad path
    /// fails before any image work starts.
    pub fn new(credentials: &VisionCredentials) -> Result<Self, Notes2PdfError> {
        let auth = match credentials {
            VisionCredentials::ApiKey(key) => Auth::ApiKey(key.clone()),
            VisionCredentials::ServiceAccountFile(path) => {
                let key = ServiceAccountKey::from_file(path)?;
                info!("Using service account {}", key.client_email);
                Auth::ServiceAccount(TokenSource::new(key))
            }
        };
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Notes2PdfError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            auth,
            endpoint: DEFAULT_VISION_ENDPOINT.to_string(),
            language_hints: Vec::new(),
        })
    }

    /// Create a client from the credentials, endpoint and hints in `config`.
    pub fn from_config(config: &ConversionConfig) -> Result<Self, Notes2PdfError> {
        let credentials = config
            .credentials
            .as_ref()
            .ok_or(Notes2PdfError::MissingCredentials)?;
        Ok(Self::new(credentials)?
            .with_endpoint(&config.endpoint)
            .with_language_hints(config.language_hints.clone()))
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    /// Use a caller-configured HTTP client (proxy, TLS roots, timeouts).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_language_hints(mut self, hints: Vec<String>) -> Self {
        self.language_hints = hints;
        self
    }

    fn annotate_url(&self) -> String {
        format!("{}{}", self.endpoint, ANNOTATE_PATH)
    }
}

#[async_trait]
impl TextRecognizer for GoogleVisionRecognizer {
    fn name(&self) -> &str {
        "google-vision"
    }

    async fn recognize(&self, image: &[u8]) -> Result<String, Notes2PdfError> {
        let body = build_request(image, &self.language_hints);
        let mut request = self.client.post(self.annotate_url()).json(&body);

        request = match &self.auth {
            Auth::ApiKey(key) => request.query(&[("key", key.as_str())]),
            Auth::ServiceAccount(tokens) => {
                request.bearer_auth(tokens.access_token(&self.client).await?)
            }
        };

        debug!("POST {} ({} image bytes)", self.annotate_url(), image.len());
        let response = request
            .send()
            .await
            .map_err(|e| Notes2PdfError::RecognitionTransport {
                detail: e.to_string(),
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Notes2PdfError::RecognitionTransport {
                detail: e.to_string(),
            })?;
        debug!("Vision responded HTTP {} ({} bytes)", status, text.len());

        parse_annotate_response(status, &text)
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AnnotateRequest {
    pub requests: Vec<AnnotateImageRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateImageRequest {
    pub image: ImageContent,
    pub features: Vec<Feature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_context: Option<ImageContext>,
}

#[derive(Debug, Serialize)]
pub struct ImageContent {
    /// Base64-encoded image bytes.
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageContext {
    pub language_hints: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnnotateResponse {
    #[serde(default)]
    pub responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateImageResponse {
    #[serde(default)]
    pub full_text_annotation: Option<TextAnnotation>,
    #[serde(default)]
    pub error: Option<Status>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TextAnnotation {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Status,
}

/// Build the single-image document-text-detection request body.
pub fn build_request(image: &[u8], language_hints: &[String]) -> AnnotateRequest {
    let image_context = if language_hints.is_empty() {
        None
    } else {
        Some(ImageContext {
            language_hints: language_hints.to_vec(),
        })
    };

    AnnotateRequest {
        requests: vec![AnnotateImageRequest {
            image: ImageContent {
                content: STANDARD.encode(image),
            },
            features: vec![Feature {
                kind: DOCUMENT_TEXT_DETECTION,
            }],
            image_context,
        }],
    }
}

/// Interpret an `images:annotate` response.
///
/// A service-reported error message, whether per-image or in the top-level
/// HTTP error envelope, becomes [`Notes2PdfError::RecognitionService`]. An
/// empty or absent annotation becomes the no-text sentinel.
pub fn parse_annotate_response(status: StatusCode, body: &str) -> Result<String, Notes2PdfError> {
    if !status.is_success() {
        return Err(match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(env) if !env.error.message.is_empty() => Notes2PdfError::RecognitionService {
                message: env.error.message,
            },
            _ => Notes2PdfError::RecognitionTransport {
                detail: format!("HTTP {status}"),
            },
        });
    }

    let parsed: AnnotateResponse =
        serde_json::from_str(body).map_err(|e| Notes2PdfError::RecognitionTransport {
            detail: format!("unexpected response body: {e}"),
        })?;

    let first = parsed.responses.into_iter().next().unwrap_or_default();
    if let Some(err) = first.error.filter(|s| !s.message.is_empty()) {
        debug!("Vision reported error code {}", err.code);
        return Err(Notes2PdfError::RecognitionService {
            message: err.message,
        });
    }

    Ok(text_or_sentinel(first.full_text_annotation.map(|a| a.text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::recognize::NO_TEXT_DETECTED;
    use crate::test_support::{direct_client, StubServer, TEST_RSA_KEY};

    #[test]
    fn request_uses_document_mode() {
        let body = build_request(b"png-bytes", &[]);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json["requests"][0]["features"][0]["type"],
            "DOCUMENT_TEXT_DETECTION"
        );
        assert_eq!(
            json["requests"][0]["image"]["content"],
            STANDARD.encode(b"png-bytes")
        );
        assert!(json["requests"][0].get("imageContext").is_none());
    }

    #[test]
    fn request_carries_language_hints() {
        let body = build_request(b"x", &["en".to_string(), "de".to_string()]);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json["requests"][0]["imageContext"]["languageHints"],
            serde_json::json!(["en", "de"])
        );
    }

    #[test]
    fn full_text_returned_verbatim() {
        let body = r#"{"responses":[{"fullTextAnnotation":{"text":"Hello World\nsecond line\n"}}]}"#;
        let text = parse_annotate_response(StatusCode::OK, body).unwrap();
        assert_eq!(text, "Hello World\nsecond line\n");
    }

    #[test]
    fn empty_response_is_sentinel() {
        assert_eq!(
            parse_annotate_response(StatusCode::OK, r#"{"responses":[{}]}"#).unwrap(),
            NO_TEXT_DETECTED
        );
        assert_eq!(
            parse_annotate_response(StatusCode::OK, r#"{"responses":[]}"#).unwrap(),
            NO_TEXT_DETECTED
        );
        assert_eq!(
            parse_annotate_response(
                StatusCode::OK,
                r#"{"responses":[{"fullTextAnnotation":{"text":""}}]}"#
            )
            .unwrap(),
            NO_TEXT_DETECTED
        );
    }

    #[test]
    fn per_image_error_is_service_error() {
        let body = r#"{"responses":[{"error":{"code":3,"message":"Bad image data."}}]}"#;
        let err = parse_annotate_response(StatusCode::OK, body).unwrap_err();
        match err {
            Notes2PdfError::RecognitionService { message } => {
                assert_eq!(message, "Bad image data.")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_error_message_is_ignored() {
        let body = r#"{"responses":[{"error":{"code":0,"message":""},"fullTextAnnotation":{"text":"ok"}}]}"#;
        assert_eq!(parse_annotate_response(StatusCode::OK, body).unwrap(), "ok");
    }

    #[test]
    fn http_error_envelope_is_service_error() {
        let body = r#"{"error":{"code":403,"message":"Cloud Vision API has not been used in project","status":"PERMISSION_DENIED"}}"#;
        let err = parse_annotate_response(StatusCode::FORBIDDEN, body).unwrap_err();
        assert!(matches!(err, Notes2PdfError::RecognitionService { .. }));
        assert!(err.to_string().contains("has not been used"));
    }

    #[test]
    fn http_error_without_body_is_transport() {
        let err = parse_annotate_response(StatusCode::BAD_GATEWAY, "<html>").unwrap_err();
        assert!(matches!(err, Notes2PdfError::RecognitionTransport { .. }));
    }

    #[test]
    fn garbage_body_is_transport() {
        let err = parse_annotate_response(StatusCode::OK, "not json").unwrap_err();
        assert!(matches!(err, Notes2PdfError::RecognitionTransport { .. }));
    }

    #[test]
    fn from_config_requires_credentials() {
        let config = ConversionConfig::default();
        let err = GoogleVisionRecognizer::from_config(&config).unwrap_err();
        assert!(matches!(err, Notes2PdfError::MissingCredentials));
    }

    #[test]
    fn api_key_client_uses_configured_endpoint() {
        let config = ConversionConfig::builder()
            .credentials(VisionCredentials::ApiKey("k".into()))
            .endpoint("http://127.0.0.1:9/")
            .build()
            .unwrap();
        let client = GoogleVisionRecognizer::from_config(&config).unwrap();
        assert_eq!(client.annotate_url(), "http://127.0.0.1:9/v1/images:annotate");
        assert_eq!(client.name(), "google-vision");
    }

    // ── Live request path against a loopback stub ────────────────────────

    fn api_key_recognizer(endpoint: &str) -> GoogleVisionRecognizer {
        GoogleVisionRecognizer::new(&VisionCredentials::ApiKey("test-key".into()))
            .unwrap()
            .with_client(direct_client())
            .with_endpoint(endpoint)
    }

    #[tokio::test]
    async fn api_key_request_posts_once_and_returns_text() {
        let stub = StubServer::start(|_| {
            (
                200,
                r#"{"responses":[{"fullTextAnnotation":{"text":"Hello World\n"}}]}"#.into(),
            )
        })
        .await;
        let recognizer = api_key_recognizer(&format!("{}/", stub.base_url));

        let text = recognizer.recognize(b"png-bytes").await.unwrap();
        assert_eq!(text, "Hello World\n");

        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].request_line,
            "POST /v1/images:annotate?key=test-key HTTP/1.1"
        );
        assert!(requests[0].header("authorization").is_none());

        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(
            body["requests"][0]["features"][0]["type"],
            "DOCUMENT_TEXT_DETECTION"
        );
        assert_eq!(
            body["requests"][0]["image"]["content"],
            STANDARD.encode(b"png-bytes")
        );
    }

    #[tokio::test]
    async fn http_error_envelope_is_service_error_without_retry() {
        let stub = StubServer::start(|_| {
            (
                403,
                r#"{"error":{"code":403,"message":"API key not valid.","status":"PERMISSION_DENIED"}}"#
                    .into(),
            )
        })
        .await;
        let recognizer = api_key_recognizer(&stub.base_url);

        let err = recognizer.recognize(b"png-bytes").await.unwrap_err();
        assert_eq!(err.to_string(), "Vision API error: API key not valid.");
        assert_eq!(stub.requests().len(), 1);
    }

    #[tokio::test]
    async fn service_account_exchanges_token_once_and_sends_bearer() {
        let stub = StubServer::start(|req| {
            if req.request_line.starts_with("POST /token ") {
                (
                    200,
                    r#"{"access_token":"ya29.stub","expires_in":3600,"token_type":"Bearer"}"#
                        .into(),
                )
            } else {
                (
                    200,
                    r#"{"responses":[{"fullTextAnnotation":{"text":"Buy milk"}}]}"#.into(),
                )
            }
        })
        .await;

        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("key.json");
        let key_json = serde_json::json!({
            "type": "service_account",
            "private_key_id": "test-kid",
            "private_key": TEST_RSA_KEY,
            "client_email": "ocr@notes.iam.gserviceaccount.com",
            "token_uri": format!("{}/token", stub.base_url),
        });
        std::fs::write(&key_path, key_json.to_string()).unwrap();

        let recognizer =
            GoogleVisionRecognizer::new(&VisionCredentials::ServiceAccountFile(key_path))
                .unwrap()
                .with_client(direct_client())
                .with_endpoint(&stub.base_url);

        assert_eq!(recognizer.recognize(b"one").await.unwrap(), "Buy milk");
        assert_eq!(recognizer.recognize(b"two").await.unwrap(), "Buy milk");

        let requests = stub.requests();
        let token_requests: Vec<_> = requests
            .iter()
            .filter(|r| r.request_line.starts_with("POST /token "))
            .collect();
        assert_eq!(token_requests.len(), 1, "token must be cached");
        let form = token_requests[0].body_text();
        assert!(form.contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer"));
        assert!(form.contains("assertion="));

        let annotate: Vec<_> = requests
            .iter()
            .filter(|r| r.request_line == "POST /v1/images:annotate HTTP/1.1")
            .collect();
        assert_eq!(annotate.len(), 2);
        for r in annotate {
            assert_eq!(r.header("authorization"), Some("Bearer ya29.stub"));
        }
    }
}
