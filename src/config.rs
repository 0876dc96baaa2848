use secrecy::SecretString;

use crate::app::{
    email::{composer::NotificationSettings, transport::SmtpSettings},
    otp::store::OTP_EXPIRY,
};

/// One day, longer lifetimes defeat the point of a one-time code
pub const OTP_EXPIRY_MAX_MINUTES: i64 = 24 * 60;

#[derive(clap::Parser)]
pub struct AppConfig {
    #[clap(long, env, default_value = "dev")]
    pub stage: Stage,

    // App configs
    #[clap(long, env, default_value_t = 8000)]
    pub app_application_port: u16,

    #[clap(long, env, default_value = "127.0.0.1")]
    pub app_application_host: String,

    // Branding, unset values fall back to built-in defaults
    #[clap(long, env)]
    pub app_name: Option<String>,

    #[clap(long, env)]
    pub app_support_email: Option<String>,

    #[clap(long, env)]
    pub app_base_url: Option<String>,

    // OTP
    #[clap(
        long,
        env,
        default_value_t = OTP_EXPIRY.whole_minutes(),
        value_parser = clap::value_parser!(i64).range(1..=OTP_EXPIRY_MAX_MINUTES)
    )]
    pub otp_expiry_minutes: i64,

    /// 0 disables the background sweep
    #[clap(long, env, default_value_t = 300)]
    pub otp_sweep_interval_secs: u64,

    // Mail
    #[clap(long, env, default_value = "log")]
    pub mail_backend: MailBackend,

    #[clap(long, env)]
    pub smtp_host: Option<String>,

    #[clap(long, env, default_value_t = 587)]
    pub smtp_port: u16,

    #[clap(long, env)]
    pub smtp_username: Option<String>,

    #[clap(long, env)]
    pub smtp_password: Option<SecretString>,

    #[clap(long, env, default_value_t = true, action = clap::ArgAction::Set)]
    pub smtp_starttls: bool,
}

#[derive(clap::ValueEnum, Debug, Clone, PartialEq)]
#[clap(rename_all = "kebab_case")]
pub enum Stage {
    Dev,
    Prod,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq)]
#[clap(rename_all = "kebab_case")]
pub enum MailBackend {
    Ses,
    Smtp,
    Log,
}

impl AppConfig {
    pub fn notification_settings(&self) -> NotificationSettings {
        NotificationSettings {
            app_name: self.app_name.clone(),
            sender_email: self.app_support_email.clone(),
            base_url: self.app_base_url.clone(),
            otp_expiry_minutes: Some(self.otp_expiry_minutes),
        }
    }

    pub fn smtp_settings(&self) -> anyhow::Result<SmtpSettings> {
        let host = self
            .smtp_host
            .clone()
            .ok_or_else(|| anyhow::anyhow!("SMTP_HOST is required for the smtp mail backend"))?;

        Ok(SmtpSettings {
            host,
            port: self.smtp_port,
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
            starttls: self.smtp_starttls,
        })
    }
}
