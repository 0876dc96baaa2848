use std::sync::Arc;

use askama::Template;
use thiserror::Error;
use time::OffsetDateTime;

use super::{
    template::{EmailTemplates, EmailVerifyData, PasswordResetData},
    transport::{EmailMessage, MailTransport},
};
use crate::app::otp::store::OTP_EXPIRY;

pub const DEFAULT_APP_NAME: &str = "BudgetWise";
pub const DEFAULT_SENDER_NAME: &str = "DORO Budget Tracker";
pub const DEFAULT_SENDER_EMAIL: &str = "noreply@budgetwise.com";
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

pub const RESET_PASSWORD_PATH: &str = "/reset-password";
pub const RESET_LINK_EXPIRE_IN_HOURS: i64 = 1;

const DEFAULT_USERNAME: &str = "User";

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("{0} cannot be empty")]
    InvalidArgument(&'static str),

    #[error("failed to send {kind}")]
    SendFailure {
        kind: EmailTemplates,
        #[source]
        source: anyhow::Error,
    },
}

/// Branding and link settings, read once at startup.
///
/// Unset values fall back to the defaults above. An unset app name shows up
/// as `BudgetWise` in subjects and bodies but as `DORO Budget Tracker` in the
/// sender display name.
#[derive(Debug, Clone, Default)]
pub struct NotificationSettings {
    pub app_name: Option<String>,
    pub sender_email: Option<String>,
    pub base_url: Option<String>,
    pub otp_expiry_minutes: Option<i64>,
}

impl NotificationSettings {
    pub fn app_name(&self) -> &str {
        self.app_name.as_deref().unwrap_or(DEFAULT_APP_NAME)
    }

    pub fn sender_name(&self) -> &str {
        self.app_name.as_deref().unwrap_or(DEFAULT_SENDER_NAME)
    }

    pub fn sender_email(&self) -> &str {
        self.sender_email.as_deref().unwrap_or(DEFAULT_SENDER_EMAIL)
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn otp_expiry_minutes(&self) -> i64 {
        self.otp_expiry_minutes.unwrap_or(OTP_EXPIRY.whole_minutes())
    }
}

#[derive(Clone)]
pub struct NotificationComposer {
    transport: Arc<dyn MailTransport>,
    settings: NotificationSettings,
}

impl NotificationComposer {
    pub fn new(transport: Arc<dyn MailTransport>, settings: NotificationSettings) -> Self {
        NotificationComposer {
            transport,
            settings,
        }
    }

    pub fn reset_link(&self, reset_token: &str) -> String {
        format!(
            "{}{}?token={}",
            self.settings.base_url(),
            RESET_PASSWORD_PATH,
            reset_token
        )
    }

    #[tracing::instrument(name = "Sending password reset email", skip(self, username, reset_token))]
    pub async fn send_password_reset(
        &self,
        to_email: &str,
        username: Option<&str>,
        reset_token: &str,
    ) -> Result<(), NotifyError> {
        require(to_email, "email address")?;
        require(reset_token, "reset token")?;

        let kind = EmailTemplates::PasswordReset;
        let reset_link = self.reset_link(reset_token);

        let html_body = PasswordResetData {
            app_name: self.settings.app_name(),
            username: username.unwrap_or(DEFAULT_USERNAME),
            reset_link: &reset_link,
            expire_in_hours: RESET_LINK_EXPIRE_IN_HOURS,
            year: OffsetDateTime::now_utc().year(),
        }
        .render()
        .map_err(|e| send_failure(kind, to_email, e.into()))?;

        self.dispatch(kind, to_email, html_body).await
    }

    #[tracing::instrument(name = "Sending verification OTP email", skip(self, otp))]
    pub async fn send_verification_otp(&self, to_email: &str, otp: &str) -> Result<(), NotifyError> {
        require(to_email, "email address")?;
        require(otp, "OTP")?;

        let kind = EmailTemplates::EmailVerify;

        let html_body = EmailVerifyData {
            app_name: self.settings.app_name(),
            code: otp,
            expire_in_minutes: self.settings.otp_expiry_minutes(),
            year: OffsetDateTime::now_utc().year(),
        }
        .render()
        .map_err(|e| send_failure(kind, to_email, e.into()))?;

        self.dispatch(kind, to_email, html_body).await
    }

    async fn dispatch(
        &self,
        kind: EmailTemplates,
        to_email: &str,
        html_body: String,
    ) -> Result<(), NotifyError> {
        let message = EmailMessage {
            recipient: to_email.to_string(),
            subject: format!("{} - {}", self.settings.app_name(), kind.subject_suffix()),
            html_body,
            sender_email: self.settings.sender_email().to_string(),
            sender_name: self.settings.sender_name().to_string(),
        };

        self.transport
            .send(message)
            .await
            .map_err(|e| send_failure(kind, to_email, e))?;

        tracing::info!("{} sent", kind);

        Ok(())
    }
}

fn require(value: &str, name: &'static str) -> Result<(), NotifyError> {
    if value.is_empty() {
        return Err(NotifyError::InvalidArgument(name));
    }

    Ok(())
}

fn send_failure(kind: EmailTemplates, to_email: &str, source: anyhow::Error) -> NotifyError {
    tracing::error!(email = %to_email, "Failed to send {}: {:?}", kind, source);

    NotifyError::SendFailure { kind, source }
}
