use std::{sync::Arc, time::Duration};

use axum::{extract::MatchedPath, http::Request, Router};
use tokio::{net::TcpListener, task::JoinHandle};
use tower_http::trace::TraceLayer;
use tracing::info_span;
use uuid::Uuid;

pub mod email;
pub mod error;
pub mod extrator;
pub mod otp;

use crate::{
    config::{AppConfig, MailBackend, Stage},
    routes::{auth, health_check},
};
use email::{
    composer::NotificationComposer,
    transport::{LogMailer, MailTransport, SesMailer, SmtpMailer},
};
use otp::{store::OtpStore, sweeper::spawn_expiry_sweeper};

pub struct Application {
    listener: TcpListener,
    pub port: u16,
    app: Router,
    sweeper: Option<JoinHandle<()>>,
}

#[derive(Clone)]
pub struct ApiContext {
    pub otp_store: Arc<OtpStore>,
    pub notifier: Arc<NotificationComposer>,
}

impl Application {
    pub async fn build(config: AppConfig) -> Result<Self, anyhow::Error> {
        let transport = build_mail_transport(&config).await?;

        Self::build_with_transport(config, transport).await
    }

    /// Same as `build`, with the mail transport supplied by the caller
    pub async fn build_with_transport(
        config: AppConfig,
        transport: Arc<dyn MailTransport>,
    ) -> Result<Self, anyhow::Error> {
        // Connection
        let addr = format!(
            "{}:{}",
            config.app_application_host, config.app_application_port
        );
        let listener = TcpListener::bind(addr).await?;
        let port = listener.local_addr()?.port();

        // OTP
        let otp_store = Arc::new(OtpStore::with_ttl(time::Duration::minutes(
            config.otp_expiry_minutes,
        )));
        let sweeper = match config.otp_sweep_interval_secs {
            0 => None,
            secs => Some(spawn_expiry_sweeper(
                otp_store.clone(),
                Duration::from_secs(secs),
            )),
        };

        let notifier = Arc::new(NotificationComposer::new(
            transport,
            config.notification_settings(),
        ));

        let api_context = ApiContext {
            otp_store,
            notifier,
        };

        let app = build_routes(api_context);

        Ok(Self {
            port,
            listener,
            app,
            sweeper,
        })
    }

    /// Used in main, run the app
    pub async fn run_gracefully(
        self,
        close_rx: tokio::sync::oneshot::Receiver<()>,
    ) -> Result<(), anyhow::Error> {
        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(async move {
                _ = close_rx.await;
            })
            .await?;

        if let Some(sweeper) = self.sweeper {
            sweeper.abort();
        }

        Ok(())
    }

    /// Useful for tests
    /// Don't use in main
    pub async fn run_until_stopped(self) -> Result<(), anyhow::Error> {
        axum::serve(self.listener, self.app).await?;

        Ok(())
    }
}

fn build_routes(api_context: ApiContext) -> Router {
    Router::new()
        .merge(health_check::router())
        .merge(auth::router())
        .with_state(api_context)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<_>| {
                    let request_id = Uuid::new_v4();

                    let matched_path = req
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str);

                    info_span!(
                        "http_request",
                        method = ?req.method(),
                        matched_path,
                        request_id = ?request_id,
                    )
                })
                .on_failure(()),
        )
}

pub async fn build_mail_transport(config: &AppConfig) -> anyhow::Result<Arc<dyn MailTransport>> {
    if config.stage == Stage::Prod && config.mail_backend == MailBackend::Log {
        tracing::warn!("Mail backend is `log`, no email will be delivered");
    }

    let transport: Arc<dyn MailTransport> = match config.mail_backend {
        MailBackend::Ses => {
            let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
            Arc::new(SesMailer::new(&sdk_config))
        }
        MailBackend::Smtp => Arc::new(SmtpMailer::new(config.smtp_settings()?)?),
        MailBackend::Log => Arc::new(LogMailer),
    };

    Ok(transport)
}
