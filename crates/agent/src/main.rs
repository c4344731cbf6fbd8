//! `rendermail-agent` -- emails the outcome of render jobs.
//!
//! Reads render lifecycle messages from the host application on stdin (see
//! [`rendermail_agent::bridge`]), tracks each render job and sends one email
//! when it completes, is cancelled or errors. With the `test-email` argument
//! it sends a single test message and exits.
//!
//! # Environment variables
//!
//! | Variable                  | Required | Default          | Description                        |
//! |---------------------------|----------|------------------|------------------------------------|
//! | `RENDERMAIL_SENDER`       | yes      | --               | Sender address and SMTP login      |
//! | `RENDERMAIL_PASSWORD`     | yes      | --               | App-specific password              |
//! | `RENDERMAIL_RECIPIENTS`   | no       | --               | Comma-separated recipients         |
//! | `RENDERMAIL_SEND_TO_SELF` | no       | `false`          | Send only to the sender            |
//! | `SMTP_HOST`               | no       | `smtp.gmail.com` | Mail submission host               |
//! | `SMTP_PORT`               | no       | `465`            | 465 for implicit TLS, else STARTTLS |
//! | `RENDERMAIL_DELAY_MS`     | no       | `500`            | Delay before completion delivery   |
//! | `RENDERMAIL_PREVIEW_DIR`  | no       | temp dir         | Where the preview JPEG is written  |
//! | `LOG_FORMAT`              | no       | `text`           | `json` for structured log lines    |

use std::sync::Arc;

use rendermail_agent::bridge;
use rendermail_core::config::NotifierConfig;
use rendermail_core::message::Notification;
use rendermail_events::{
    Collaborators, Dispatcher, EmailDispatcher, FilePreviewCapture, LogNotice, NoticeLevel,
    NoticeSurface, NotifierService, RenderTracker, SharedRenderContext, SignalBus,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command that sends a test email instead of running the bridge.
const CMD_TEST_EMAIL: &str = "test-email";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rendermail_agent=info,rendermail_events=info".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    let notice: Arc<dyn NoticeSurface> = Arc::new(LogNotice);
    let config = NotifierConfig::from_env().unwrap_or_else(|e| {
        notice.show(NoticeLevel::Error, &format!("Invalid configuration: {e}"));
        std::process::exit(1);
    });
    let dispatcher = EmailDispatcher::smtp(config.clone(), notice.clone()).unwrap_or_else(|e| {
        tracing::error!(error = %e, smtp_host = %config.smtp_host, "Failed to set up SMTP transport");
        std::process::exit(1);
    });

    match std::env::args().nth(1).as_deref() {
        Some(CMD_TEST_EMAIL) => {
            let outcome = dispatcher.send(&Notification::test()).await;
            if outcome.success {
                tracing::info!("Test email sent successfully!");
                return;
            }
            tracing::error!(message = %outcome.message, "Error sending test email");
            std::process::exit(1);
        }
        Some(other) => {
            tracing::error!(command = other, "Unknown command; expected `{CMD_TEST_EMAIL}`");
            std::process::exit(2);
        }
        None => {}
    }

    let context = SharedRenderContext::new();
    let collaborators = Collaborators {
        context: Arc::new(context.clone()),
        preview: Arc::new(FilePreviewCapture::new(
            context.clone(),
            config.preview_dir.clone(),
        )),
        dispatcher: Arc::new(dispatcher),
        notice,
    };

    let bus = SignalBus::default();
    let shutdown = CancellationToken::new();
    let service =
        NotifierService::new(RenderTracker::new(collaborators)).with_delay(config.delivery_delay);
    let mut service_handle = tokio::spawn(service.run(bus.subscribe(), shutdown.clone()));

    tracing::info!(
        sender = %config.sender,
        recipients = config.resolved_recipients().len(),
        send_to_self = config.send_to_self,
        smtp_host = %config.smtp_host,
        smtp_port = config.smtp_port,
        "Starting rendermail-agent",
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    tokio::select! {
        result = bridge::run(stdin, &context, &bus) => match result {
            Ok(published) => tracing::info!(published, "Host input closed"),
            Err(e) => tracing::error!(error = %e, "Host input failed"),
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
            shutdown.cancel();
        }
    }

    // Closing the bus lets the service drain queued signals and make any
    // delivery that is still waiting on its timer. Ctrl-C skips the wait.
    drop(bus);
    let joined = tokio::select! {
        joined = &mut service_handle => joined,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, dropping pending notification");
            shutdown.cancel();
            service_handle.await
        }
    };
    if let Err(e) = joined {
        tracing::error!(error = %e, "Render notifier task failed");
    }
}
