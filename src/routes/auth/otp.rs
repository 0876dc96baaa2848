use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use validator::Validate;

use crate::app::{error::AppError, extrator::ValidatedJson, ApiContext};

#[derive(Debug, Deserialize, Validate)]
pub struct SendOtpInput {
    #[validate(email)]
    email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpInput {
    #[validate(email)]
    email: String,
    #[validate(length(equal = 6))]
    code: String,
}

#[tracing::instrument(name = "Send verification OTP", skip_all, fields(email = %req.email))]
pub async fn send_otp(
    ctx: State<ApiContext>,
    ValidatedJson(req): ValidatedJson<SendOtpInput>,
) -> Result<StatusCode, AppError> {
    let code = ctx.otp_store.generate(&req.email);

    if let Err(e) = ctx.notifier.send_verification_otp(&req.email, &code).await {
        // Nobody received this code, don't leave it redeemable.
        // A later request may have replaced it already, keep that one.
        ctx.otp_store.clear_if(&req.email, &code);
        return Err(e.into());
    }

    Ok(StatusCode::ACCEPTED)
}

#[tracing::instrument(name = "Verify OTP", skip_all, fields(email = %req.email))]
pub async fn verify_otp(
    ctx: State<ApiContext>,
    ValidatedJson(req): ValidatedJson<VerifyOtpInput>,
) -> Result<StatusCode, AppError> {
    if !ctx.otp_store.verify(&req.email, &req.code) {
        return Err(AppError::InvalidOtp);
    }

    Ok(StatusCode::NO_CONTENT)
}
