use color_eyre::{eyre::eyre, Result};
use swerve_teleop::config::TeleopConfig;
use swerve_teleop::controller::GamepadReader;
use swerve_teleop::drivetrain::LoggingDrivetrain;
use swerve_teleop::robot::RobotContainer;
use swerve_teleop::scheduler::TeleopLoop;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config = setup_config().await?;

    info!("Initializing gamepad reader");
    let reader = GamepadReader::create(Some(config.controller.clone()))
        .map_err(|e| eyre!("Failed to create gamepad reader: {}", e))?
        .initialize();

    let period = config.scheduler.tick_period().as_secs_f64();
    let container = RobotContainer::new(
        &config,
        Box::new(reader),
        Box::new(LoggingDrivetrain::new(period)),
    );
    container.autonomous_command();

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl-C received, stopping"),
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
        signal_token.cancel();
    });

    let teleop = TeleopLoop::create(container, config.scheduler.clone()).activate();
    teleop.run_until_shutdown(shutdown).await?.shutdown()?;

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

async fn setup_config() -> Result<TeleopConfig> {
    let path = TeleopConfig::default_path()?;
    TeleopConfig::ensure_default_config(&path).await?;
    Ok(TeleopConfig::load(&path).await?)
}
