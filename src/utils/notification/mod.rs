pub mod error;
pub mod message;
pub mod sms;
pub mod whatsapp;

use crate::types::Context;
use crate::utils::invoice_link::{self, ForwardedOrigin};
use crate::utils::phone::{self, PhoneNumber};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use self::error::{classify, ErrorKind, ProviderFailure};
use self::message::ComposedMessage;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Hard cap on a WhatsApp message body.
pub const WHATSAPP_TEXT_LIMIT: usize = 4096;

/// Bound on a single provider round trip. A call that exceeds this is
/// aborted so the fallback attempt is not delayed indefinitely.
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    WhatsApp,
    Sms,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WhatsApp => "whatsapp",
            Self::Sms => "sms",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderSuccess {
    pub message_id: String,
    pub status: String,
}

/// One upstream messaging channel. `payload` builds the exact JSON body the
/// provider receives (kept per attempt for diagnostics); `call` performs a
/// single atomic round trip with no retries.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn provider(&self) -> &'static str;
    fn channel(&self) -> Channel;
    fn payload(&self, message: &ComposedMessage, recipient: &PhoneNumber) -> serde_json::Value;
    async fn call(&self, payload: serde_json::Value) -> Result<ProviderSuccess, ProviderFailure>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Invoice,
    AdvancePayment,
    PaymentCompletion,
}

pub struct NotificationRequest {
    pub kind: NotificationKind,
    pub phone_number: String,
    pub customer_name: String,
    pub order_number: String,
    pub bill_token: Option<String>,
    pub total_amount: Option<f64>,
    pub final_amount: Option<f64>,
    pub origin: Option<String>,
    pub forwarded: ForwardedOrigin,
}

#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    Success {
        message_id: String,
        provider_status: String,
    },
    Failure {
        kind: ErrorKind,
        raw_message: String,
    },
}

#[derive(Debug, Clone)]
pub struct DispatchAttempt {
    pub provider: &'static str,
    pub channel: Channel,
    pub request_payload: serde_json::Value,
    pub outcome: AttemptOutcome,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct DispatchError {
    pub kind: ErrorKind,
    pub message: String,
    /// Classified kinds of the individual failed attempts, in execution
    /// order. Carries both kinds when the fallback path also fails.
    pub underlying: Vec<ErrorKind>,
}

/// Terminal value of one dispatch. Built fresh per request and never
/// mutated after the orchestrator returns.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub success: bool,
    pub attempts: Vec<DispatchAttempt>,
    pub provider: Option<&'static str>,
    pub channel: Option<Channel>,
    pub message_id: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub phone_number: Option<String>,
    pub bill_link: String,
    pub error: Option<DispatchError>,
}

impl DispatchResult {
    fn rejected(kind: ErrorKind, message: String, bill_link: String) -> Self {
        Self {
            success: false,
            attempts: vec![],
            provider: None,
            channel: None,
            message_id: None,
            sent_at: None,
            phone_number: None,
            bill_link,
            error: Some(DispatchError {
                kind,
                message,
                underlying: vec![],
            }),
        }
    }
}

pub struct Dispatcher {
    whatsapp_text: Arc<dyn ProviderClient>,
    whatsapp_template: Arc<dyn ProviderClient>,
    sms: Arc<dyn ProviderClient>,
    template_id: String,
}

impl Dispatcher {
    pub fn from_context(ctx: &Context) -> Self {
        Self {
            whatsapp_text: Arc::new(whatsapp::WhatsAppTextClient::new(&ctx.whatsapp)),
            whatsapp_template: Arc::new(whatsapp::WhatsAppTemplateClient::new(&ctx.whatsapp)),
            sms: Arc::new(sms::SmsClient::new(&ctx.sms)),
            template_id: ctx.whatsapp.template_id.clone(),
        }
    }

    pub fn with_clients(
        whatsapp_text: Arc<dyn ProviderClient>,
        whatsapp_template: Arc<dyn ProviderClient>,
        sms: Arc<dyn ProviderClient>,
        template_id: String,
    ) -> Self {
        Self {
            whatsapp_text,
            whatsapp_template,
            sms,
            template_id,
        }
    }

    pub async fn dispatch(&self, request: NotificationRequest) -> DispatchResult {
        let bill_link = invoice_link::resolve(
            request.origin.as_deref(),
            &request.forwarded,
            request.bill_token.as_deref(),
        );

        if request.customer_name.trim().is_empty() || request.order_number.trim().is_empty() {
            return DispatchResult::rejected(
                ErrorKind::ValidationError,
                "customerName and orderNumber are required".to_string(),
                bill_link,
            );
        }

        let recipient = match phone::validate(&request.phone_number) {
            Ok(recipient) => recipient,
            Err(_) => {
                return DispatchResult::rejected(
                    ErrorKind::ValidationError,
                    "Invalid phone number: expected a 10-digit Indian mobile number".to_string(),
                    bill_link,
                )
            }
        };

        let final_amount = request.final_amount;
        if request.kind == NotificationKind::PaymentCompletion {
            match final_amount {
                Some(amount) if amount.is_finite() && amount > 0.0 => {}
                _ => {
                    return DispatchResult::rejected(
                        ErrorKind::InvalidAmount,
                        ErrorKind::InvalidAmount.message().to_string(),
                        bill_link,
                    )
                }
            }
        }

        let primary_message = match request.kind {
            NotificationKind::Invoice => message::invoice_template(
                &self.template_id,
                &request.customer_name,
                &request.order_number,
                request.total_amount.unwrap_or(0.0),
                &bill_link,
            ),
            NotificationKind::AdvancePayment => message::advance_payment_text(
                &request.customer_name,
                &request.order_number,
                &bill_link,
            ),
            NotificationKind::PaymentCompletion => message::payment_completion_text(
                &request.customer_name,
                &request.order_number,
                final_amount.unwrap_or(0.0),
                &bill_link,
            ),
        };

        if primary_message.len() > WHATSAPP_TEXT_LIMIT {
            return DispatchResult::rejected(
                ErrorKind::MessageTooLong,
                ErrorKind::MessageTooLong.message().to_string(),
                bill_link,
            );
        }

        let primary: &dyn ProviderClient = match request.kind {
            NotificationKind::Invoice => self.whatsapp_template.as_ref(),
            _ => self.whatsapp_text.as_ref(),
        };

        let (attempt, outcome) = run_attempt(primary, &primary_message, &recipient).await;
        let mut attempts = vec![attempt];

        let primary_kind = match outcome {
            Ok(success) => {
                return finished(attempts, primary, success, recipient, bill_link);
            }
            Err(kind) => kind,
        };

        // Only the generic invoice kind falls back: its template channel is
        // the least reliable one, the plain-text channel used by the other
        // kinds stands on its own.
        if request.kind != NotificationKind::Invoice {
            return DispatchResult {
                success: false,
                attempts,
                provider: Some(primary.provider()),
                channel: Some(primary.channel()),
                message_id: None,
                sent_at: None,
                phone_number: Some(recipient.as_str().to_string()),
                bill_link,
                error: Some(DispatchError {
                    kind: primary_kind,
                    message: primary_kind.message().to_string(),
                    underlying: vec![primary_kind],
                }),
            };
        }

        let fallback_message = message::invoice_text(
            &request.customer_name,
            &request.order_number,
            request.total_amount.unwrap_or(0.0),
            &bill_link,
        );

        let (attempt, outcome) =
            run_attempt(self.sms.as_ref(), &fallback_message, &recipient).await;
        attempts.push(attempt);

        match outcome {
            Ok(success) => finished(attempts, self.sms.as_ref(), success, recipient, bill_link),
            Err(fallback_kind) => DispatchResult {
                success: false,
                attempts,
                provider: Some(self.sms.provider()),
                channel: Some(Channel::Sms),
                message_id: None,
                sent_at: None,
                phone_number: Some(recipient.as_str().to_string()),
                bill_link,
                error: Some(DispatchError {
                    kind: ErrorKind::AllProvidersUnavailable,
                    message: ErrorKind::AllProvidersUnavailable.message().to_string(),
                    underlying: vec![primary_kind, fallback_kind],
                }),
            },
        }
    }
}

fn finished(
    attempts: Vec<DispatchAttempt>,
    winner: &dyn ProviderClient,
    success: ProviderSuccess,
    recipient: PhoneNumber,
    bill_link: String,
) -> DispatchResult {
    DispatchResult {
        success: true,
        attempts,
        provider: Some(winner.provider()),
        channel: Some(winner.channel()),
        message_id: Some(success.message_id),
        sent_at: Some(Utc::now()),
        phone_number: Some(recipient.as_str().to_string()),
        bill_link,
        error: None,
    }
}

async fn run_attempt(
    client: &dyn ProviderClient,
    message: &ComposedMessage,
    recipient: &PhoneNumber,
) -> (DispatchAttempt, Result<ProviderSuccess, ErrorKind>) {
    let payload = client.payload(message, recipient);
    let started_at = Utc::now();
    let clock = Instant::now();

    let result = client.call(payload.clone()).await;
    let duration_ms = clock.elapsed().as_millis() as u64;

    match result {
        Ok(success) => {
            tracing::debug!(
                "Sent {} notification via {} in {}ms",
                client.channel().as_str(),
                client.provider(),
                duration_ms
            );
            let attempt = DispatchAttempt {
                provider: client.provider(),
                channel: client.channel(),
                request_payload: payload,
                outcome: AttemptOutcome::Success {
                    message_id: success.message_id.clone(),
                    provider_status: success.status.clone(),
                },
                started_at,
                duration_ms,
            };
            (attempt, Ok(success))
        }
        Err(failure) => {
            let kind = classify(&failure);
            tracing::error!(
                "{} attempt via {} failed ({:?}): {}",
                client.channel().as_str(),
                client.provider(),
                kind,
                failure.body
            );
            let attempt = DispatchAttempt {
                provider: client.provider(),
                channel: client.channel(),
                request_payload: payload,
                outcome: AttemptOutcome::Failure {
                    kind,
                    raw_message: failure.body,
                },
                started_at,
                duration_ms,
            };
            (attempt, Err(kind))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubClient {
        provider: &'static str,
        channel: Channel,
        outcome: Result<ProviderSuccess, ProviderFailure>,
        calls: Arc<AtomicUsize>,
    }

    impl StubClient {
        fn succeeding(provider: &'static str, channel: Channel, calls: Arc<AtomicUsize>) -> Self {
            Self {
                provider,
                channel,
                outcome: Ok(ProviderSuccess {
                    message_id: format!("{}-msg-1", provider),
                    status: "sent".to_string(),
                }),
                calls,
            }
        }

        fn failing(
            provider: &'static str,
            channel: Channel,
            failure: ProviderFailure,
            calls: Arc<AtomicUsize>,
        ) -> Self {
            Self {
                provider,
                channel,
                outcome: Err(failure),
                calls,
            }
        }
    }

    #[async_trait]
    impl ProviderClient for StubClient {
        fn provider(&self) -> &'static str {
            self.provider
        }

        fn channel(&self) -> Channel {
            self.channel
        }

        fn payload(&self, message: &ComposedMessage, recipient: &PhoneNumber) -> serde_json::Value {
            match message {
                ComposedMessage::Text { body } => json!({ "to": recipient.as_str(), "text": body }),
                ComposedMessage::Template { template_id, args } => {
                    json!({ "to": recipient.as_str(), "template": template_id, "args": args })
                }
            }
        }

        async fn call(&self, _payload: serde_json::Value) -> Result<ProviderSuccess, ProviderFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    struct Harness {
        dispatcher: Dispatcher,
        text_calls: Arc<AtomicUsize>,
        template_calls: Arc<AtomicUsize>,
        sms_calls: Arc<AtomicUsize>,
    }

    fn harness(template_ok: bool, text_ok: bool, sms_ok: bool) -> Harness {
        let text_calls = Arc::new(AtomicUsize::new(0));
        let template_calls = Arc::new(AtomicUsize::new(0));
        let sms_calls = Arc::new(AtomicUsize::new(0));

        let server_error = ProviderFailure::from_response(500, "upstream exploded".to_string());
        let timeout = ProviderFailure {
            status: None,
            body: "operation timed out".to_string(),
            timed_out: true,
            connect_failed: false,
        };

        let text: Arc<dyn ProviderClient> = if text_ok {
            Arc::new(StubClient::succeeding("wa-stub", Channel::WhatsApp, text_calls.clone()))
        } else {
            Arc::new(StubClient::failing(
                "wa-stub",
                Channel::WhatsApp,
                server_error.clone(),
                text_calls.clone(),
            ))
        };
        let template: Arc<dyn ProviderClient> = if template_ok {
            Arc::new(StubClient::succeeding("wa-stub", Channel::WhatsApp, template_calls.clone()))
        } else {
            Arc::new(StubClient::failing(
                "wa-stub",
                Channel::WhatsApp,
                server_error,
                template_calls.clone(),
            ))
        };
        let sms: Arc<dyn ProviderClient> = if sms_ok {
            Arc::new(StubClient::succeeding("sms-stub", Channel::Sms, sms_calls.clone()))
        } else {
            Arc::new(StubClient::failing(
                "sms-stub",
                Channel::Sms,
                timeout,
                sms_calls.clone(),
            ))
        };

        Harness {
            dispatcher: Dispatcher::with_clients(text, template, sms, "inv_v1".to_string()),
            text_calls,
            template_calls,
            sms_calls,
        }
    }

    fn request(kind: NotificationKind) -> NotificationRequest {
        NotificationRequest {
            kind,
            phone_number: "+91 98765 43210".to_string(),
            customer_name: "Asha".to_string(),
            order_number: "ORD-42".to_string(),
            bill_token: Some("abc123".to_string()),
            total_amount: Some(150.5),
            final_amount: Some(150.5),
            origin: Some("https://shop.example".to_string()),
            forwarded: ForwardedOrigin::default(),
        }
    }

    fn total_calls(h: &Harness) -> usize {
        h.text_calls.load(Ordering::SeqCst)
            + h.template_calls.load(Ordering::SeqCst)
            + h.sms_calls.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn invalid_phone_fails_before_any_provider_call() {
        let h = harness(true, true, true);
        let mut req = request(NotificationKind::Invoice);
        req.phone_number = "5987654321".to_string();

        let result = h.dispatcher.dispatch(req).await;

        assert!(!result.success);
        assert_eq!(result.error.unwrap().kind, ErrorKind::ValidationError);
        assert!(result.attempts.is_empty());
        assert_eq!(total_calls(&h), 0);
    }

    #[tokio::test]
    async fn blank_order_number_fails_validation() {
        let h = harness(true, true, true);
        let mut req = request(NotificationKind::AdvancePayment);
        req.order_number = "   ".to_string();

        let result = h.dispatcher.dispatch(req).await;

        assert_eq!(result.error.unwrap().kind, ErrorKind::ValidationError);
        assert_eq!(total_calls(&h), 0);
    }

    #[tokio::test]
    async fn oversized_message_is_rejected_before_dispatch() {
        let h = harness(true, true, true);
        let mut req = request(NotificationKind::AdvancePayment);
        req.customer_name = "x".repeat(WHATSAPP_TEXT_LIMIT + 1);

        let result = h.dispatcher.dispatch(req).await;

        assert_eq!(result.error.unwrap().kind, ErrorKind::MessageTooLong);
        assert!(result.attempts.is_empty());
        assert_eq!(total_calls(&h), 0);
    }

    #[tokio::test]
    async fn invoice_success_makes_exactly_one_attempt() {
        let h = harness(true, true, true);

        let result = h.dispatcher.dispatch(request(NotificationKind::Invoice)).await;

        assert!(result.success);
        assert_eq!(result.attempts.len(), 1);
        assert_eq!(result.channel, Some(Channel::WhatsApp));
        assert_eq!(result.message_id.as_deref(), Some("wa-stub-msg-1"));
        assert_eq!(h.sms_calls.load(Ordering::SeqCst), 0);
        assert_eq!(result.bill_link, "https://shop.example/public/invoice/abc123");
    }

    #[tokio::test]
    async fn invoice_falls_back_to_sms_when_template_fails() {
        let h = harness(false, true, true);

        let result = h.dispatcher.dispatch(request(NotificationKind::Invoice)).await;

        assert!(result.success);
        assert_eq!(result.attempts.len(), 2);
        assert_eq!(result.channel, Some(Channel::Sms));
        assert_eq!(result.provider, Some("sms-stub"));
        assert_eq!(h.template_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.sms_calls.load(Ordering::SeqCst), 1);
        // The fallback body is recomposed as plain text for the SMS channel
        match &result.attempts[1].request_payload {
            serde_json::Value::Object(payload) => {
                let text = payload["text"].as_str().unwrap();
                assert!(text.contains("₹150.50"));
            }
            _ => panic!("expected an object payload"),
        }
    }

    #[tokio::test]
    async fn invoice_with_both_channels_down_aggregates_attempts() {
        let h = harness(false, true, false);

        let result = h.dispatcher.dispatch(request(NotificationKind::Invoice)).await;

        assert!(!result.success);
        assert_eq!(result.attempts.len(), 2);
        let error = result.error.unwrap();
        assert_eq!(error.kind, ErrorKind::AllProvidersUnavailable);
        assert_eq!(error.kind.http_status(), 503);
        assert_eq!(
            error.underlying,
            vec![ErrorKind::UpstreamServerError, ErrorKind::Timeout]
        );
    }

    #[tokio::test]
    async fn advance_payment_never_falls_back() {
        let h = harness(true, false, true);

        let result = h
            .dispatcher
            .dispatch(request(NotificationKind::AdvancePayment))
            .await;

        assert!(!result.success);
        assert_eq!(result.attempts.len(), 1);
        assert_eq!(result.error.unwrap().kind, ErrorKind::UpstreamServerError);
        assert_eq!(h.sms_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn payment_completion_requires_positive_amount() {
        for amount in [Some(0.0), Some(-5.0), None] {
            let h = harness(true, true, true);
            let mut req = request(NotificationKind::PaymentCompletion);
            req.final_amount = amount;

            let result = h.dispatcher.dispatch(req).await;

            assert_eq!(result.error.unwrap().kind, ErrorKind::InvalidAmount);
            assert_eq!(total_calls(&h), 0);
        }
    }

    #[tokio::test]
    async fn payment_completion_renders_amount_with_two_decimals() {
        let h = harness(true, true, true);

        let result = h
            .dispatcher
            .dispatch(request(NotificationKind::PaymentCompletion))
            .await;

        assert!(result.success);
        assert_eq!(result.attempts.len(), 1);
        let text = result.attempts[0].request_payload["text"].as_str().unwrap();
        assert!(text.contains("₹150.50"));
        assert_eq!(h.text_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invoice_template_args_follow_the_registered_order() {
        let h = harness(true, true, true);

        let result = h.dispatcher.dispatch(request(NotificationKind::Invoice)).await;

        let payload = &result.attempts[0].request_payload;
        assert_eq!(payload["template"], "inv_v1");
        let args = payload["args"].as_array().unwrap();
        assert_eq!(args.len(), 4);
        assert_eq!(args[0], "Asha");
        assert_eq!(args[1], "ORD-42");
        assert_eq!(args[2], "150.50");
        assert_eq!(args[3], "https://shop.example/public/invoice/abc123");
    }
}
