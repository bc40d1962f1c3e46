pub mod config;
pub mod errors;
pub mod metrics_defs;
pub mod naming;
pub mod normalize;
pub mod populate;
pub mod service;
pub mod submission;
#[cfg(test)]
mod testutils;

use config::IntakeConfig;
use errors::IntakeError;
use service::IntakeService;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use submission::SubmissionHandler;

pub async fn run(config: IntakeConfig) -> Result<(), IntakeError> {
    let time_zone = sheets::parse_time_zone(&config.time_zone)?;
    let store = sheets::get_store(&config.store, &config.spreadsheet_id, time_zone)?;

    let config = Arc::new(config);
    let handler = Arc::new(SubmissionHandler::new(config.clone(), store));

    // Submissions are served before the probe finishes, each one looks the
    // template up again.
    let ready = Arc::new(AtomicBool::new(false));
    tokio::spawn(mark_ready(handler.clone(), ready.clone()));

    let intake_task = run_http_service(
        &config.listener.host,
        config.listener.port,
        IntakeService::new(handler),
    );

    match &config.admin_listener {
        Some(admin_listener) => {
            let admin_service =
                AdminService::<_, IntakeError>::new(move || ready.load(Ordering::Relaxed));
            let admin_task =
                run_http_service(&admin_listener.host, admin_listener.port, admin_service);
            tokio::try_join!(intake_task, admin_task)?;
        }
        None => intake_task.await?,
    }

    Ok(())
}

/// Sets `ready` once the template sheet has been found in the spreadsheet.
async fn mark_ready(handler: Arc<SubmissionHandler>, ready: Arc<AtomicBool>) {
    match handler.probe().await {
        Ok(()) => {
            tracing::info!("Template sheet found, ready");
            ready.store(true, Ordering::Relaxed);
        }
        Err(e) => tracing::error!(error = %e, "Startup probe failed"),
    }
}
