//! Single-threaded event loop driving the [`Controller`].
//!
//! One task multiplexes the session event queue, the controller's
//! earliest deadline and the 1 Hz movement tick. Nothing here runs in
//! parallel, so the controller needs no locking of its own.

use std::future;
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::controller::Controller;
use crate::session::{Action, Outbound, Pathfinder, SessionEvent, World};

/// Movement tick cadence.
pub const MOVEMENT_TICK: Duration = Duration::from_secs(1);

/// Runs until the session ends or the event queue closes.
pub async fn run<R, W, O, P>(
    controller: &mut Controller<R>,
    world: &W,
    outbound: &mut O,
    pathfinder: &mut P,
    mut events: mpsc::UnboundedReceiver<SessionEvent>,
) where
    R: Rng,
    W: World,
    O: Outbound,
    P: Pathfinder,
{
    send_all(controller.start(Instant::now()), outbound);

    let mut movement = time::interval(MOVEMENT_TICK);
    movement.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let deadline = controller.next_deadline();

        tokio::select! {
            event = events.recv() => {
                let event = event.unwrap_or_else(|| {
                    tracing::info!("Event queue closed");
                    SessionEvent::Ended
                });
                let actions = controller.handle_event(&event, Instant::now(), world);
                send_all(actions, outbound);
                if !controller.is_active() {
                    break;
                }
            }
            () = wait_until(deadline) => {
                let actions = controller.on_timer(Instant::now(), world);
                send_all(actions, outbound);
            }
            _ = movement.tick() => {
                controller.tick_movement(Instant::now(), world, pathfinder);
            }
        }
    }

    tracing::info!("Runtime stopped");
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}

fn send_all(actions: Vec<Action>, outbound: &mut impl Outbound) {
    for action in actions {
        tracing::trace!(?action, "Sending");
        action.send(outbound);
    }
}
