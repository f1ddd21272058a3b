// Process wiring: board, control thread, command listener, Ctrl-C shutdown
//
// The control loop owns the board and runs on its own OS thread so the
// blocking sensor wait and stop dwell never stall the listener.

use std::thread;

use embedded_hal::digital::OutputPin;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::command::CommandChannel;
use crate::config::{ControlConfig, LISTEN_ADDR, PWM_FREQUENCY_HZ};
use crate::control::ControlLoop;
use crate::hal::{SimBoard, ThreadDelay};
use crate::motor::{HBridge, MotorActuator};
use crate::sensor::DistanceSensor;
use crate::server;

pub async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(LISTEN_ADDR).await?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(shutdown_on_signal(tokio::signal::ctrl_c(), shutdown_tx));

    info!("Bringing up simulated board...");
    run_with(SimBoard::new(), listener, ControlConfig::default(), shutdown_rx).await
}

/// Raise `shutdown` once `signal` fires.
///
/// If the signal cannot be listened for, the error is logged and the task
/// parks holding the sender: the vehicle keeps running without a Ctrl-C path.
pub async fn shutdown_on_signal<F>(signal: F, shutdown: watch::Sender<bool>)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            info!("Ctrl-C received, shutting down");
            let _ = shutdown.send(true);
        }
        Err(e) => {
            error!("Failed to listen for Ctrl-C, shutdown signal disabled: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

/// Run the control thread and command listener on `board` until `shutdown`
pub async fn run_with(
    board: SimBoard,
    listener: TcpListener,
    config: ControlConfig,
    shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut status_led = board.status_led.clone();

    let actuator = MotorActuator::new(
        HBridge::new(board.motor1_forward.clone(), board.motor1_reverse.clone()),
        HBridge::new(board.motor2_forward.clone(), board.motor2_reverse.clone()),
        PWM_FREQUENCY_HZ,
    )?;
    let sensor = DistanceSensor::new(board.trigger.clone(), board.echo.clone(), ThreadDelay);

    let commands = CommandChannel::new();
    let control = ControlLoop::new(actuator, sensor, commands.clone(), ThreadDelay, config);
    let control_rx = shutdown.clone();
    let control_thread = thread::Builder::new()
        .name("control-loop".into())
        .spawn(move || control.run(control_rx))?;

    // Listener is already bound: the vehicle is reachable
    status_led.set_high()?;

    server::serve(listener, commands, shutdown).await;

    match tokio::task::spawn_blocking(move || control_thread.join()).await {
        Ok(Ok(())) => {}
        Ok(Err(_)) => warn!("Control thread panicked"),
        Err(e) => warn!("Failed to join control thread: {}", e),
    }
    status_led.set_low()?;

    info!(
        "Shutdown complete (motor1 duty {}/{})",
        board.motor1_forward.duty(),
        board.motor1_reverse.duty()
    );
    Ok(())
}
