use super::error::ProviderFailure;
use super::message::ComposedMessage;
use super::{Channel, ProviderClient, ProviderSuccess, PROVIDER_TIMEOUT};
use crate::types::WhatsAppContext;
use crate::utils::phone::PhoneNumber;
use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize, Debug)]
struct WhatsAppServerResponse {
    success: Option<bool>,
    message_id: Option<String>,
    request_id: Option<String>,
    status: Option<String>,
}

/// A 2xx response is only a delivery acceptance when the body says so: an
/// explicit `success: false` is a failure, and so is a body carrying neither
/// a success flag nor any message/request id.
fn interpret_body(status: u16, body: String) -> Result<ProviderSuccess, ProviderFailure> {
    let parsed = serde_json::from_str::<WhatsAppServerResponse>(&body)
        .map_err(|_| ProviderFailure::from_response(status, body.clone()))?;

    if parsed.success == Some(false) {
        return Err(ProviderFailure::from_response(status, body));
    }

    let message_id = parsed.message_id.or(parsed.request_id);
    if parsed.success.is_none() && message_id.is_none() {
        return Err(ProviderFailure::from_response(status, body));
    }

    Ok(ProviderSuccess {
        message_id: message_id.unwrap_or_default(),
        status: parsed.status.unwrap_or_else(|| "accepted".to_string()),
    })
}

fn auth_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "Authorization",
        format!("Bearer {}", api_key)
            .try_into()
            .expect("Invalid auth header value"),
    );
    headers.insert(
        "Content-Type",
        "application/json"
            .try_into()
            .expect("Invalid content type header value"),
    );
    headers
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(PROVIDER_TIMEOUT)
        .build()
        .expect("Failed to build WhatsApp HTTP client")
}

async fn post(
    http: &reqwest::Client,
    endpoint: &str,
    api_key: &str,
    payload: serde_json::Value,
) -> Result<ProviderSuccess, ProviderFailure> {
    let res = http
        .post(endpoint)
        .headers(auth_headers(api_key))
        .body(payload.to_string())
        .send()
        .await
        .map_err(|err| {
            tracing::error!("Failed to reach WhatsApp endpoint {}: {}", endpoint, err);
            ProviderFailure::from_transport(&err)
        })?;

    let status = res.status().as_u16();
    let body = res.text().await.map_err(|err| {
        tracing::error!("Failed to read WhatsApp response body: {}", err);
        ProviderFailure::from_transport(&err)
    })?;

    if !(200..300).contains(&status) {
        return Err(ProviderFailure::from_response(status, body));
    }

    interpret_body(status, body)
}

pub struct WhatsAppTextClient {
    endpoint: String,
    api_key: String,
    http: reqwest::Client,
}

impl WhatsAppTextClient {
    pub fn new(ctx: &WhatsAppContext) -> Self {
        Self {
            endpoint: ctx.text_endpoint.clone(),
            api_key: ctx.api_key.clone(),
            http: http_client(),
        }
    }
}

#[async_trait]
impl ProviderClient for WhatsAppTextClient {
    fn provider(&self) -> &'static str {
        "whatsapp-business"
    }

    fn channel(&self) -> Channel {
        Channel::WhatsApp
    }

    fn payload(&self, message: &ComposedMessage, recipient: &PhoneNumber) -> serde_json::Value {
        let body = match message {
            ComposedMessage::Text { body } => body.clone(),
            ComposedMessage::Template { args, .. } => args.join(" "),
        };
        json!({
            "to": recipient.as_str(),
            "type": "text",
            "text": { "body": body },
        })
    }

    async fn call(&self, payload: serde_json::Value) -> Result<ProviderSuccess, ProviderFailure> {
        post(&self.http, &self.endpoint, &self.api_key, payload).await
    }
}

pub struct WhatsAppTemplateClient {
    endpoint: String,
    api_key: String,
    template_id: String,
    http: reqwest::Client,
}

impl WhatsAppTemplateClient {
    pub fn new(ctx: &WhatsAppContext) -> Self {
        Self {
            endpoint: ctx.template_endpoint.clone(),
            api_key: ctx.api_key.clone(),
            template_id: ctx.template_id.clone(),
            http: http_client(),
        }
    }
}

#[async_trait]
impl ProviderClient for WhatsAppTemplateClient {
    fn provider(&self) -> &'static str {
        "whatsapp-business"
    }

    fn channel(&self) -> Channel {
        Channel::WhatsApp
    }

    fn payload(&self, message: &ComposedMessage, recipient: &PhoneNumber) -> serde_json::Value {
        // Parameter order is the contract with the registered template.
        let (template_id, params) = match message {
            ComposedMessage::Template { template_id, args } => (template_id.clone(), args.clone()),
            ComposedMessage::Text { body } => (self.template_id.clone(), vec![body.clone()]),
        };
        json!({
            "to": recipient.as_str(),
            "type": "template",
            "template": {
                "id": template_id,
                "params": params,
            },
        })
    }

    async fn call(&self, payload: serde_json::Value) -> Result<ProviderSuccess, ProviderFailure> {
        post(&self.http, &self.endpoint, &self.api_key, payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_success_false_is_a_failure() {
        let result = interpret_body(200, r#"{"success":false,"message_id":"m1"}"#.to_string());
        assert!(result.is_err());
    }

    #[test]
    fn message_id_alone_is_a_success() {
        let success = interpret_body(200, r#"{"message_id":"m1"}"#.to_string()).unwrap();
        assert_eq!(success.message_id, "m1");
    }

    #[test]
    fn request_id_substitutes_for_message_id() {
        let success = interpret_body(200, r#"{"success":true,"request_id":"r9"}"#.to_string()).unwrap();
        assert_eq!(success.message_id, "r9");
    }

    #[test]
    fn body_without_flag_or_id_is_a_failure() {
        let result = interpret_body(200, r#"{"status":"queued"}"#.to_string());
        assert!(result.is_err());
    }

    #[test]
    fn unparseable_body_is_a_failure_carrying_the_raw_body() {
        let err = interpret_body(200, "<html>gateway error</html>".to_string()).unwrap_err();
        assert_eq!(err.body, "<html>gateway error</html>");
        assert_eq!(err.status, Some(200));
    }
}
