use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand, ValueEnum};
use grantkit_session::testing::{FakeCameraBackend, RecordingNotifier, ScriptedHost, StaticSurface};
use grantkit_session::{
    CameraError, CameraSessionController, DisplaySurface, PermissionBroker, SessionConfig,
};
use log::info;
use owo_colors::OwoColorize;

#[derive(Parser)]
#[command(name = "grantkit-demo")]
#[command(about = "Drive a camera session through permission scenarios", long_about = None)]
struct Cli {
    /// JSON session config to use instead of the defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single scenario
    Scenario {
        /// The scenario to run
        #[arg(value_enum)]
        kind: Scenario,
    },
    /// Run every scenario
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scenario {
    /// The user grants the permission
    Granted,
    /// The user denies, the app may ask again
    SoftDenied,
    /// The user denies and ticks "don't ask again"
    HardDenied,
    /// The host is destroyed while the dialog is open
    DestroyPending,
    /// The camera opens but the preview cannot start
    PreviewFailure,
}

const ALL: [Scenario; 5] = [
    Scenario::Granted,
    Scenario::SoftDenied,
    Scenario::HardDenied,
    Scenario::DestroyPending,
    Scenario::PreviewFailure,
];

struct Report {
    camera_open: bool,
    previewing: bool,
    messages: Vec<String>,
    pending_cancelled: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let config = SessionConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            info!("Loaded session config from {}", path.display());
            config
        }
        None => SessionConfig::default(),
    };

    let scenarios = match cli.command {
        Commands::Scenario { kind } => vec![kind],
        Commands::All => ALL.to_vec(),
    };

    let mut failures = 0;
    for scenario in scenarios {
        println!("{} {scenario:?}", "▶".cyan().bold());
        let report = run(scenario, config.clone())?;
        if check(scenario, &report) {
            println!("  {}", "ok".green().bold());
        } else {
            failures += 1;
            println!("  {}", "unexpected result".red().bold());
        }
        print_report(&report);
    }

    if failures > 0 {
        bail!("{failures} scenario(s) did not behave as expected");
    }
    Ok(())
}

fn run(scenario: Scenario, config: SessionConfig) -> Result<Report> {
    let permission = config.permission.clone();
    let host = Arc::new(ScriptedHost::new());
    let broker = Arc::new(PermissionBroker::new(host.clone()));
    let camera = FakeCameraBackend::new();
    let surface: Arc<dyn DisplaySurface> = Arc::new(StaticSurface::new(1));
    let notifier = Arc::new(RecordingNotifier::new());

    let mut controller = CameraSessionController::new(
        broker.clone(),
        camera.clone(),
        Arc::downgrade(&surface),
        notifier.clone(),
        config,
    );

    controller.on_enable_requested();

    match scenario {
        Scenario::Granted => {
            // The dialog answers from its own thread.
            let dialog = broker.clone();
            let answer = std::thread::spawn(move || {
                dialog.on_request_permissions_result(&[permission.as_str()], &[true])
            });
            futures::executor::block_on(controller.dispatch_next());
            let delivered = answer
                .join()
                .map_err(|_| anyhow!("permission dialog thread panicked"))?;
            info!("dialog answered {delivered} subscriber(s)");
        }
        Scenario::SoftDenied => {
            host.set_rationale(&permission, true);
            broker.on_request_permissions_result(&[permission.as_str()], &[false]);
            controller.pump();
        }
        Scenario::HardDenied => {
            broker.on_request_permissions_result(&[permission.as_str()], &[false]);
            controller.pump();
        }
        Scenario::DestroyPending => {
            controller.on_stop();
            controller.on_destroy();
            broker.on_request_permissions_result(&[permission.as_str()], &[true]);
            controller.pump();
        }
        Scenario::PreviewFailure => {
            camera.fail_start(Some(CameraError::StartFailed("surface was destroyed".into())));
            broker.on_request_permissions_result(&[permission.as_str()], &[true]);
            controller.pump();
        }
    }

    Ok(Report {
        camera_open: controller.is_camera_open(),
        previewing: controller
            .camera()
            .is_some_and(grantkit_session::CameraHandle::is_previewing),
        messages: notifier.messages(),
        pending_cancelled: controller
            .subscription()
            .is_some_and(grantkit_session::Subscription::is_cancelled),
    })
}

fn check(scenario: Scenario, report: &Report) -> bool {
    match scenario {
        Scenario::Granted => report.camera_open && report.previewing && report.messages.is_empty(),
        Scenario::SoftDenied | Scenario::HardDenied => {
            !report.camera_open && report.messages.len() == 1
        }
        Scenario::DestroyPending => !report.camera_open && report.pending_cancelled,
        Scenario::PreviewFailure => report.camera_open && !report.previewing,
    }
}

fn print_report(report: &Report) {
    println!("  camera open: {}", report.camera_open);
    println!("  previewing:  {}", report.previewing);
    if report.pending_cancelled {
        println!("  pending request cancelled");
    }
    for message in &report.messages {
        println!("  {} {message}", "toast:".yellow());
    }
}
