use kube::Client;
use kube_batch_deployer::config::settings::{Logger, Settings};
use kube_batch_deployer::orchestrator::BatchReport;
use kube_batch_deployer::orchestrator::deployer::{DeployContext, Orchestrator};
use kube_batch_deployer::orchestrator::kubernetes;
use kube_batch_deployer::resources::factory;
use kube_batch_deployer::system::signals;
use rolling_file::{BasicRollingFileAppender, RollingConditionBasic};
use std::process::ExitCode;
use std::str::FromStr;
use std::{env, fs};
use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::Layer;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Registry, layer::SubscriberExt};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const BASE_DIRECTORY_LOG: &str = "logs";
const BASE_DIRECTORY_SIZE: usize = 5;
const PREFIX_LOG_NAME: &str = "kube-batch-deployer.log";

// The returned guard must live as long as the process to flush the file writer.
fn init_logger(logger_config: &Logger) -> Option<WorkerGuard> {
    let log_level = Level::from_str(logger_config.level.as_str()).unwrap_or(Level::INFO);
    let console_layer = Layer::new()
        .with_writer(std::io::stdout.with_max_level(log_level))
        .pretty();
    let (file_layer, guard) = if logger_config.directory {
        let log_path = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|parent| parent.join(BASE_DIRECTORY_LOG)))
            .unwrap_or_else(|| BASE_DIRECTORY_LOG.into());
        fs::create_dir_all(&log_path).unwrap_or_default();
        let condition = RollingConditionBasic::new().daily();
        match BasicRollingFileAppender::new(
            log_path.join(PREFIX_LOG_NAME),
            condition,
            BASE_DIRECTORY_SIZE,
        ) {
            Ok(file_appender) => {
                let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
                let layer = Layer::new()
                    .with_writer(file_writer.with_max_level(log_level))
                    .json();
                (Some(layer), Some(guard))
            }
            Err(e) => {
                eprintln!("Could not open log file in {}: {}", log_path.display(), e);
                (None, None)
            }
        }
    } else {
        (None, None)
    };
    Registry::default()
        .with(logger_config.console.then_some(console_layer))
        .with(file_layer)
        .init();
    guard
}

fn exit_code(reports: &[&BatchReport]) -> ExitCode {
    if reports.iter().all(|report| report.is_success()) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let setting = match kube_batch_deployer::init_settings() {
        Ok(setting) => setting,
        Err(e) => {
            eprintln!("Could not load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let _guard = init_logger(&setting.logger);
    let namespace = setting.namespace();
    let mode = Settings::mode();
    info!(
        version = VERSION,
        env = %mode,
        namespace = %namespace,
        "Starting kube batch deployer"
    );

    // Kubeconfig (KUBECONFIG or default location), then in-cluster config
    let client = match Client::try_default().await {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Could not build a kubernetes client");
            return ExitCode::FAILURE;
        }
    };

    let cancellation = CancellationToken::new();
    tokio::spawn(signals::cancel_on_stop_signals(cancellation.clone()));

    let orchestrator = Orchestrator::new(
        kubernetes::registry(),
        DeployContext {
            client,
            namespace,
            cancellation: cancellation.clone(),
            policy: setting.deploy.cancellation_policy,
        },
    );

    // Order matters: secrets and config maps precede the deployment using them
    let batch = factory::default_batch();

    let cleanup = orchestrator.cleanup(&batch).await;

    // Give the cluster time to finish the deletions
    let settle_delay = setting.deploy.settle_delay();
    info!(seconds = settle_delay.as_secs(), "Waiting for deletions to settle");
    tokio::select! {
        _ = tokio::time::sleep(settle_delay) => {}
        _ = cancellation.cancelled() => warn!("Settle delay interrupted by cancellation"),
    }

    let deploy = orchestrator.deploy(&batch).await;

    // Stop the signal listener
    cancellation.cancel();
    exit_code(&[&cleanup, &deploy])
}
