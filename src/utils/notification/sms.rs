use super::error::ProviderFailure;
use super::message::ComposedMessage;
use super::{Channel, ProviderClient, ProviderSuccess, PROVIDER_TIMEOUT};
use crate::types::SmsContext;
use crate::utils::phone::PhoneNumber;
use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize, Debug)]
struct SmsServerResponse {
    success: bool,
    message_id: Option<String>,
    message: Option<String>,
}

pub struct SmsClient {
    endpoint: String,
    api_key: String,
    sender_id: String,
    http: reqwest::Client,
}

impl SmsClient {
    pub fn new(ctx: &SmsContext) -> Self {
        Self {
            endpoint: ctx.send_endpoint.clone(),
            api_key: ctx.api_key.clone(),
            sender_id: ctx.sender_id.clone(),
            http: reqwest::Client::builder()
                .timeout(PROVIDER_TIMEOUT)
                .build()
                .expect("Failed to build SMS HTTP client"),
        }
    }
}

#[async_trait]
impl ProviderClient for SmsClient {
    fn provider(&self) -> &'static str {
        "bulksms"
    }

    fn channel(&self) -> Channel {
        Channel::Sms
    }

    fn payload(&self, message: &ComposedMessage, recipient: &PhoneNumber) -> serde_json::Value {
        let body = match message {
            ComposedMessage::Text { body } => body.clone(),
            ComposedMessage::Template { args, .. } => args.join(" "),
        };
        json!({
            "to": recipient.as_str(),
            "from": self.sender_id,
            "body": body,
        })
    }

    /// The gateway signals delivery through the `success` flag in the body,
    /// independent of the HTTP status it happens to answer with.
    async fn call(&self, payload: serde_json::Value) -> Result<ProviderSuccess, ProviderFailure> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            format!("Bearer {}", self.api_key)
                .try_into()
                .expect("Invalid auth header value"),
        );
        headers.insert(
            "Content-Type",
            "application/json"
                .try_into()
                .expect("Invalid content type header value"),
        );

        let res = self
            .http
            .post(&self.endpoint)
            .headers(headers)
            .body(payload.to_string())
            .send()
            .await
            .map_err(|err| {
                tracing::error!("Failed to reach SMS endpoint {}: {}", self.endpoint, err);
                ProviderFailure::from_transport(&err)
            })?;

        let status = res.status().as_u16();
        let body = res.text().await.map_err(|err| {
            tracing::error!("Failed to read SMS response body: {}", err);
            ProviderFailure::from_transport(&err)
        })?;

        let parsed = serde_json::from_str::<SmsServerResponse>(&body)
            .map_err(|_| ProviderFailure::from_response(status, body.clone()))?;

        if !parsed.success {
            tracing::error!("SMS gateway refused the message: {}", body);
            return Err(ProviderFailure::from_response(status, body));
        }

        tracing::debug!("SMS accepted by gateway");

        Ok(ProviderSuccess {
            message_id: parsed.message_id.unwrap_or_default(),
            status: parsed.message.unwrap_or_else(|| "accepted".to_string()),
        })
    }
}
