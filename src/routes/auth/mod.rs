use axum::{routing::post, Router};
use otp::{send_otp, verify_otp};

use crate::app::ApiContext;

pub mod otp;

pub fn router() -> Router<ApiContext> {
    Router::new()
        .route("/auth/otp/send", post(send_otp))
        .route("/auth/otp/verify", post(verify_otp))
}
