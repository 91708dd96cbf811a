use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;

use super::{parse_response, RemovalPayload, RemovalRequest, RemovalService, ServiceError, ServiceResult};
use crate::editor::EncodedImage;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5002/api/remove-watermark";

const IMAGE_FIELD: &str = "image";
const IMAGE_FILE_NAME: &str = "current_image.png";
const MASK_FIELD: &str = "mask";
const MASK_FILE_NAME: &str = "mask.png";
const MASK_MEDIA_TYPE: &str = "image/png";

/// Multipart-over-HTTP client for the removal endpoint.
#[derive(Debug, Clone)]
pub struct HttpRemovalService {
    client: Client,
    endpoint: String,
}

impl HttpRemovalService {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> ServiceResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Text parts sent alongside the binary ones.
fn text_fields(payload: &RemovalPayload) -> Vec<(&'static str, String)> {
    match payload {
        RemovalPayload::Region(rect) => vec![
            ("x", rect.x.to_string()),
            ("y", rect.y.to_string()),
            ("w", rect.width.to_string()),
            ("h", rect.height.to_string()),
        ],
        RemovalPayload::Mask { action, .. } => vec![("action_type", action.as_str().to_string())],
    }
}

fn build_form(request: &RemovalRequest) -> ServiceResult<Form> {
    let image = Part::bytes(request.image.bytes().to_vec())
        .file_name(IMAGE_FILE_NAME)
        .mime_str(request.image.media_type())?;
    let mut form = Form::new().part(IMAGE_FIELD, image);
    for (name, value) in text_fields(&request.payload) {
        form = form.text(name, value);
    }
    if let RemovalPayload::Mask { png, .. } = &request.payload {
        let mask = Part::bytes(png.clone())
            .file_name(MASK_FILE_NAME)
            .mime_str(MASK_MEDIA_TYPE)?;
        form = form.part(MASK_FIELD, mask);
    }
    Ok(form)
}

/// Non-success statuses still carry the service's JSON error when the
/// service produced them; anything else is reported by status code.
fn interpret(status: u16, success: bool, body: &str) -> ServiceResult<EncodedImage> {
    if success {
        return parse_response(body);
    }
    match parse_response(body) {
        Err(err @ ServiceError::Rejected { .. }) => Err(err),
        _ => Err(ServiceError::HttpStatus { status }),
    }
}

impl RemovalService for HttpRemovalService {
    fn remove(&self, request: &RemovalRequest) -> ServiceResult<EncodedImage> {
        let form = build_form(request)?;
        tracing::info!(
            ticket = request.ticket.0,
            mode = %request.mode(),
            endpoint = %self.endpoint,
            "sending removal request"
        );
        let response = self.client.post(&self.endpoint).multipart(form).send()?;
        let status = response.status();
        let body = response.text()?;
        tracing::debug!(ticket = request.ticket.0, status = status.as_u16(), "removal response received");
        interpret(status.as_u16(), status.is_success(), &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::ActionType;
    use crate::geometry::{ImageSize, PixelRect};

    #[test]
    fn region_payload_sends_integer_coordinates() {
        let fields = text_fields(&RemovalPayload::Region(PixelRect::new(300, 200, 100, 100)));
        assert_eq!(
            fields,
            vec![
                ("x", "300".to_string()),
                ("y", "200".to_string()),
                ("w", "100".to_string()),
                ("h", "100".to_string()),
            ]
        );
    }

    #[test]
    fn mask_payload_sends_action_type() {
        let fields = text_fields(&RemovalPayload::Mask {
            png: vec![1, 2, 3],
            size: ImageSize::new(4, 4),
            action: ActionType::Mosaic,
        });
        assert_eq!(fields, vec![("action_type", "mosaic".to_string())]);
    }

    #[test]
    fn non_success_status_prefers_service_message() {
        let err = interpret(400, false, r#"{"status":"error","message":"No selected file"}"#)
            .expect_err("400 should fail");
        assert!(err.is_rejection());

        let err = interpret(502, false, "Bad Gateway").expect_err("502 should fail");
        assert!(matches!(err, ServiceError::HttpStatus { status: 502 }));
    }

    #[test]
    fn service_keeps_configured_endpoint() {
        let service = HttpRemovalService::new(DEFAULT_ENDPOINT, Duration::from_secs(5))
            .expect("client should build");
        assert_eq!(service.endpoint(), DEFAULT_ENDPOINT);
    }
}
