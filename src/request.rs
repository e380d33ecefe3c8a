use crate::events::{ClientEvent, RequestInfo, SharedEventBroadcaster};
use crate::headers::add_submission_headers;
use crate::outcome::classify_response;
use crate::signer::API_SIG_KEY;
use crate::{ParameterSet, SubmissionOutcome};
use http_client::{HttpClient, Request};
use http_types::{Method, Url};

/// A signed POST to the web service endpoint.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    endpoint: Url,
    parameters: ParameterSet,
}

impl SubmissionRequest {
    pub fn new(endpoint: Url, parameters: ParameterSet) -> Self {
        Self {
            endpoint,
            parameters,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    /// Send the request and return the raw response body.
    ///
    /// Network failures, including failures while reading the body, are
    /// returned as `Err` with the transport's description.
    pub async fn send(
        &self,
        client: &dyn HttpClient,
        user_agent: &str,
        broadcaster: &SharedEventBroadcaster,
    ) -> Result<String, String> {
        let request_info = RequestInfo::new(
            self.parameters.get("method").unwrap_or("unknown"),
            self.endpoint.as_str(),
        );
        log::debug!(
            "{} params: {}",
            request_info.short_description(),
            masked_parameters(&self.parameters)
        );

        let mut request = Request::new(Method::Post, self.endpoint.clone());
        add_submission_headers(&mut request, user_agent);
        request.set_body(self.parameters.to_wire_form());

        broadcaster.broadcast_event(ClientEvent::RequestStarted {
            request: request_info.clone(),
        });
        let request_start = std::time::Instant::now();

        let mut response = client.send(request).await.map_err(|e| e.to_string())?;

        broadcaster.broadcast_event(ClientEvent::RequestCompleted {
            request: request_info,
            status_code: response.status().into(),
            duration_ms: request_start.elapsed().as_millis() as u64,
        });
        log::debug!("Submission response status: {}", response.status());

        response.body_string().await.map_err(|e| e.to_string())
    }

    /// Send the request and classify the response.
    pub async fn execute(
        &self,
        client: &dyn HttpClient,
        user_agent: &str,
        broadcaster: &SharedEventBroadcaster,
    ) -> SubmissionOutcome {
        match self.send(client, user_agent, broadcaster).await {
            Ok(body) => {
                let outcome = classify_response(&body);
                log::trace!("Response classified as {outcome}");
                outcome
            }
            Err(cause) => {
                log::warn!("Submission to {} failed: {cause}", self.endpoint);
                SubmissionOutcome::transport(cause)
            }
        }
    }
}

/// Render parameters for logging with credentials masked.
fn masked_parameters(params: &ParameterSet) -> String {
    params
        .iter()
        .map(|(key, value)| match key {
            API_SIG_KEY | "sk" | "authToken" => format!("{key}=***"),
            _ => format!("{key}={value}"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
