use std::sync::{Arc, LazyLock, Mutex};

use budgetwise::{
    app::{
        email::transport::{EmailMessage, MailTransport},
        Application,
    },
    config::AppConfig,
    telemetry::{build_telemetry, register_telemetry},
};
use clap::Parser;
use fake::{faker::internet::en::SafeEmail, Fake};
use regex::Regex;

static TELEMETRY: LazyLock<()> = LazyLock::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let telemetry = build_telemetry(subscriber_name, default_filter_level, std::io::stdout);
        register_telemetry(telemetry);
    } else {
        let null_telemetry = build_telemetry(subscriber_name, default_filter_level, std::io::sink);
        register_telemetry(null_telemetry);
    };
});

static OTP_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"class="otp-code">(\d{6})<"#).unwrap());

/// Keeps every message it is handed
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_otp_for(&self, email: &str) -> Option<String> {
        self.sent()
            .iter()
            .rev()
            .find(|m| m.recipient == email)
            .and_then(|m| extract_otp(&m.html_body))
    }
}

#[async_trait::async_trait]
impl MailTransport for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

/// Rejects everything, like a relay that is down
pub struct FailingMailer;

#[async_trait::async_trait]
impl MailTransport for FailingMailer {
    async fn send(&self, _message: EmailMessage) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("connection refused"))
    }
}

pub fn extract_otp(html: &str) -> Option<String> {
    OTP_CODE_REGEX
        .captures(html)
        .map(|captures| captures[1].to_string())
}

pub fn test_email() -> String {
    SafeEmail().fake()
}

pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub async fn post_send_otp(&self, email: &str) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/auth/otp/send", &self.address))
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn post_verify_otp(&self, email: &str, code: &str) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/auth/otp/verify", &self.address))
            .json(&serde_json::json!({ "email": email, "code": code }))
            .send()
            .await
            .expect("failed to execute request")
    }
}

pub fn test_config() -> AppConfig {
    let mut c = AppConfig::parse_from(["budgetwise"]);

    // Use a random OS port
    c.app_application_port = 0;
    c.otp_sweep_interval_secs = 0;

    c
}

pub async fn spawn_app() -> TestApp {
    let mailer = Arc::new(RecordingMailer::default());
    let (address, _) = spawn_with_transport(mailer.clone()).await;

    TestApp {
        address,
        api_client: api_client(),
        mailer,
    }
}

/// Spawn the app with a transport of the caller's choosing, returns address and port
pub async fn spawn_with_transport(transport: Arc<dyn MailTransport>) -> (String, u16) {
    spawn_with_config(test_config(), transport).await
}

pub async fn spawn_with_config(
    config: AppConfig,
    transport: Arc<dyn MailTransport>,
) -> (String, u16) {
    LazyLock::force(&TELEMETRY);

    let app = Application::build_with_transport(config, transport)
        .await
        .unwrap();
    let port = app.port;

    _ = tokio::spawn(app.run_until_stopped());

    (format!("http://localhost:{}", port), port)
}

pub fn api_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
