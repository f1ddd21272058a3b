// Latest-value command slot shared between the listener and the control loop

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tracing::info;

use crate::messages::{Request, Response, StatusReport};
use crate::motor::SpeedPercent;

/// Most recently requested travel speed.
///
/// Cloning yields another handle to the same slot. Writes overwrite; there is
/// no queue, so readers only ever see the last value written.
#[derive(Debug, Clone, Default)]
pub struct CommandChannel {
    requested: Arc<AtomicU8>,
}

impl CommandChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_requested_speed(&self, speed: impl Into<SpeedPercent>) {
        let speed = speed.into();
        self.requested.store(speed.get(), Ordering::Release);
    }

    pub fn requested_speed(&self) -> SpeedPercent {
        SpeedPercent::from(self.requested.load(Ordering::Acquire))
    }

    /// Apply a decoded request and pick the response to send back
    pub fn handle(&self, request: Request) -> Response {
        match request {
            Request::SetSpeed(speed) => {
                self.set_requested_speed(speed);
                info!("Requested speed set to {}", speed);
                Response::Page
            }
            Request::Status => Response::Status(StatusReport {
                requested_speed: self.requested_speed().get(),
            }),
            Request::Other => Response::Page,
        }
    }
}
