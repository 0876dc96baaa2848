use anyhow::Context;
use aws_config::SdkConfig;
use aws_sdk_sesv2::{
    types::{Body, Content, Destination, EmailContent, Message as SesMessage},
    Client,
};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::{ExposeSecret, SecretString};

const CHARSET: &str = "UTF-8";

/// A composed email, built per send and dropped afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
    pub sender_email: String,
    pub sender_name: String,
}

impl EmailMessage {
    /// Sender mailbox, its `Display` quotes and RFC 2047 encodes the name as needed
    pub fn sender_mailbox(&self) -> anyhow::Result<Mailbox> {
        let address: Address = self
            .sender_email
            .parse()
            .context("invalid sender address")?;

        Ok(Mailbox::new(Some(self.sender_name.clone()), address))
    }
}

/// Delivers finished messages. Timeouts and retries belong to the implementor.
#[async_trait::async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: EmailMessage) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct SesMailer {
    ses_client: Client,
}

impl SesMailer {
    /// Build an SES mailer
    ///
    /// It should only be called once, and shared
    pub fn new(sdk_config: &SdkConfig) -> Self {
        SesMailer {
            ses_client: Client::new(sdk_config),
        }
    }
}

#[async_trait::async_trait]
impl MailTransport for SesMailer {
    #[tracing::instrument(name = "Sending email through SES", skip_all, fields(email = %message.recipient))]
    async fn send(&self, message: EmailMessage) -> anyhow::Result<()> {
        let subject = Content::builder()
            .data(&message.subject)
            .charset(CHARSET)
            .build()
            .context("failed to build email subject")?;

        let html = Content::builder()
            .data(&message.html_body)
            .charset(CHARSET)
            .build()
            .context("failed to build email body")?;

        let email_content = EmailContent::builder()
            .simple(
                SesMessage::builder()
                    .subject(subject)
                    .body(Body::builder().html(html).build())
                    .build(),
            )
            .build();

        match self
            .ses_client
            .send_email()
            .from_email_address(message.sender_mailbox()?.to_string())
            .destination(
                Destination::builder()
                    .to_addresses(&message.recipient)
                    .build(),
            )
            .content(email_content)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => Err(anyhow::anyhow!(
                "Error sending email to {}: {}",
                message.recipient,
                e
            )),
        }
    }
}

pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub starttls: bool,
}

#[derive(Clone)]
pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(settings: SmtpSettings) -> anyhow::Result<Self> {
        let mut builder = if settings.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
                .context("failed to configure smtp relay")?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
        };

        builder = builder.port(settings.port);

        if let (Some(username), Some(password)) = (settings.username, settings.password) {
            builder = builder.credentials(Credentials::new(
                username,
                password.expose_secret().to_string(),
            ));
        }

        Ok(SmtpMailer {
            mailer: builder.build(),
        })
    }
}

#[async_trait::async_trait]
impl MailTransport for SmtpMailer {
    #[tracing::instrument(name = "Sending email through SMTP relay", skip_all, fields(email = %message.recipient))]
    async fn send(&self, message: EmailMessage) -> anyhow::Result<()> {
        let from = message.sender_mailbox()?;
        let to: Mailbox = message
            .recipient
            .parse()
            .context("invalid recipient address")?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject)
            .header(ContentType::TEXT_HTML)
            .body(message.html_body)
            .context("failed to build email")?;

        self.mailer
            .send(email)
            .await
            .context("smtp relay rejected the message")?;

        Ok(())
    }
}

/// Logs messages instead of delivering them, for local development
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait::async_trait]
impl MailTransport for LogMailer {
    async fn send(&self, message: EmailMessage) -> anyhow::Result<()> {
        tracing::info!(
            email = %message.recipient,
            subject = %message.subject,
            "Mail delivery disabled, dropping message"
        );

        Ok(())
    }
}
