use async_trait::async_trait;
use std::env;

#[derive(Clone)]
pub enum AppEnvironment {
    Production,
    Development,
}

impl AppEnvironment {
    pub fn from(raw_environment: String) -> Self {
        match raw_environment.as_ref() {
            "production" => Self::Production,
            _ => Self::Development,
        }
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub host: String,
    pub environment: AppEnvironment,
    pub port: u32,
    pub url: String,
    /// Optional deployment override for the public invoice-link origin.
    /// Unset, the link origin is resolved from forwarded headers.
    pub public_url: Option<String>,
}

#[derive(Clone)]
pub struct WhatsAppContext {
    pub text_endpoint: String,
    pub template_endpoint: String,
    pub api_key: String,
    pub template_id: String,
}

#[derive(Clone)]
pub struct SmsContext {
    pub send_endpoint: String,
    pub api_key: String,
    pub sender_id: String,
}

#[derive(Clone)]
pub struct Context {
    pub app: AppContext,
    pub whatsapp: WhatsAppContext,
    pub sms: SmsContext,
}

#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub environment: AppEnvironment,
    pub port: u32,
    pub url: String,
    pub public_url: Option<String>,
}

#[derive(Clone)]
pub struct WhatsAppConfig {
    pub text_endpoint: String,
    pub template_endpoint: String,
    pub api_key: String,
    pub template_id: String,
}

#[derive(Clone)]
pub struct SmsConfig {
    pub send_endpoint: String,
    pub api_key: String,
    pub sender_id: String,
}

#[derive(Clone)]
pub struct Config {
    pub app: AppConfig,
    pub whatsapp: WhatsAppConfig,
    pub sms: SmsConfig,
}

impl Default for Config {
    fn default() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let environment = env::var("APP_ENV").expect("APP_ENV not set");
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u32>()
            .expect("Invalid PORT number");
        let url = env::var("URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));
        let public_url = env::var("PUBLIC_URL").ok();
        let whatsapp_text_endpoint =
            env::var("WHATSAPP_TEXT_ENDPOINT").expect("WHATSAPP_TEXT_ENDPOINT not set");
        let whatsapp_template_endpoint =
            env::var("WHATSAPP_TEMPLATE_ENDPOINT").expect("WHATSAPP_TEMPLATE_ENDPOINT not set");
        let whatsapp_api_key = env::var("WHATSAPP_API_KEY").expect("WHATSAPP_API_KEY not set");
        let whatsapp_template_id =
            env::var("WHATSAPP_TEMPLATE_ID").expect("WHATSAPP_TEMPLATE_ID not set");
        let sms_send_endpoint = env::var("SMS_SEND_ENDPOINT").expect("SMS_SEND_ENDPOINT not set");
        let sms_api_key = env::var("SMS_API_KEY").expect("SMS_API_KEY not set");
        let sms_sender_id = env::var("SMS_SENDER_ID").expect("SMS_SENDER_ID not set");

        return Self {
            app: AppConfig {
                host,
                environment: AppEnvironment::from(environment),
                port,
                url,
                public_url,
            },
            whatsapp: WhatsAppConfig {
                text_endpoint: whatsapp_text_endpoint,
                template_endpoint: whatsapp_template_endpoint,
                api_key: whatsapp_api_key,
                template_id: whatsapp_template_id,
            },
            sms: SmsConfig {
                send_endpoint: sms_send_endpoint,
                api_key: sms_api_key,
                sender_id: sms_sender_id,
            },
        };
    }
}

#[async_trait]
pub trait ToContext {
    async fn to_context(self) -> Context;
}

#[async_trait]
impl ToContext for Config {
    async fn to_context(self) -> Context {
        Context {
            app: AppContext {
                host: self.app.host,
                environment: self.app.environment,
                port: self.app.port,
                url: self.app.url,
                public_url: self.app.public_url,
            },
            whatsapp: WhatsAppContext {
                text_endpoint: self.whatsapp.text_endpoint,
                template_endpoint: self.whatsapp.template_endpoint,
                api_key: self.whatsapp.api_key,
                template_id: self.whatsapp.template_id,
            },
            sms: SmsContext {
                send_endpoint: self.sms.send_endpoint,
                api_key: self.sms.api_key,
                sender_id: self.sms.sender_id,
            },
        }
    }
}
