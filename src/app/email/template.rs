use askama::Template;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplates {
    EmailVerify,
    PasswordReset,
}

impl std::fmt::Display for EmailTemplates {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::EmailVerify => write!(f, "verification OTP email"),
            Self::PasswordReset => write!(f, "password reset email"),
        }
    }
}

impl EmailTemplates {
    pub fn subject_suffix(&self) -> &'static str {
        match self {
            Self::EmailVerify => "Email Verification Code",
            Self::PasswordReset => "Password Reset Request",
        }
    }
}

#[derive(Template, Debug)]
#[template(path = "emails/otp_verification.html")]
pub struct EmailVerifyData<'a> {
    pub app_name: &'a str,
    pub code: &'a str,
    pub expire_in_minutes: i64,
    pub year: i32,
}

#[derive(Template, Debug)]
#[template(path = "emails/password_reset.html")]
pub struct PasswordResetData<'a> {
    pub app_name: &'a str,
    pub username: &'a str,
    pub reset_link: &'a str,
    pub expire_in_hours: i64,
    pub year: i32,
}
