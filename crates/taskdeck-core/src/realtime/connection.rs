//! Per-connection actor bridging a transport to its hub queue.

use std::fmt;
use std::time::Duration;

use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::hub::{ConnectionId, Subscription};
use super::RealtimeError;

/// Transport-neutral frame. The HTTP layer maps its socket messages to and
/// from this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close,
}

#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Interval between server pings.
    pub heartbeat_interval: Duration,
    /// Upper bound on a single frame write.
    pub write_timeout: Duration,
    /// The peer is dropped if nothing (pongs included) arrives for this long.
    pub idle_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(60),
            write_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(90),
        }
    }
}

/// One live session. Runs an outbound loop (queued events, heartbeats) and
/// an inbound loop (close and liveness detection) until either ends.
pub struct Connection {
    subscription: Subscription,
    config: ConnectionConfig,
}

impl Connection {
    pub fn new(subscription: Subscription, config: ConnectionConfig) -> Self {
        Self {
            subscription,
            config,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.subscription.id
    }

    /// Drive the connection to completion.
    ///
    /// When either loop ends the other is dropped, the connection leaves the
    /// hub, and both transport halves are released before this returns.
    pub async fn run<S, R, E>(self, sink: S, stream: R) -> Result<(), RealtimeError>
    where
        S: Sink<Frame> + Unpin,
        S::Error: fmt::Display,
        R: Stream<Item = Result<Frame, E>> + Unpin,
        E: fmt::Display,
    {
        let Subscription {
            id,
            queue,
            released,
            hub,
        } = self.subscription;
        let config = self.config;
        info!(connection_id = id, "Realtime connection opened");

        let outcome = {
            let outbound = write_loop(id, queue, sink, &config);
            let inbound = read_loop(id, stream, config.idle_timeout);
            tokio::select! {
                result = outbound => result,
                result = inbound => result,
            }
        };

        hub.unregister(id);
        drop(released);

        match &outcome {
            Ok(()) => info!(connection_id = id, "Realtime connection closed"),
            Err(e) => warn!(connection_id = id, error = %e, "Realtime connection dropped"),
        }
        outcome
    }
}

async fn write_loop<S>(
    id: ConnectionId,
    mut queue: tokio::sync::mpsc::Receiver<std::sync::Arc<str>>,
    mut sink: S,
    config: &ConnectionConfig,
) -> Result<(), RealtimeError>
where
    S: Sink<Frame> + Unpin,
    S::Error: fmt::Display,
{
    let period = config.heartbeat_interval;
    let mut heartbeat = time::interval_at(Instant::now() + period, period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            message = queue.recv() => match message {
                Some(text) => {
                    send_frame(&mut sink, Frame::Text(text.to_string()), config.write_timeout).await?;
                }
                None => {
                    debug!(connection_id = id, "Queue closed, sending close frame");
                    // The peer may already be gone; closing is best effort.
                    let _ = send_frame(&mut sink, Frame::Close, config.write_timeout).await;
                    return Ok(());
                }
            },
            _ = heartbeat.tick() => {
                send_frame(&mut sink, Frame::Ping(Vec::new()), config.write_timeout).await?;
            }
        }
    }
}

async fn send_frame<S>(sink: &mut S, frame: Frame, limit: Duration) -> Result<(), RealtimeError>
where
    S: Sink<Frame> + Unpin,
    S::Error: fmt::Display,
{
    match time::timeout(limit, sink.send(frame)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(RealtimeError::Transport(e.to_string())),
        Err(_) => Err(RealtimeError::WriteTimeout(limit)),
    }
}

async fn read_loop<R, E>(id: ConnectionId, mut stream: R, idle: Duration) -> Result<(), RealtimeError>
where
    R: Stream<Item = Result<Frame, E>> + Unpin,
    E: fmt::Display,
{
    loop {
        match time::timeout(idle, stream.next()).await {
            Err(_) => return Err(RealtimeError::IdleTimeout(idle)),
            Ok(None) | Ok(Some(Ok(Frame::Close))) => return Ok(()),
            Ok(Some(Err(e))) => return Err(RealtimeError::Transport(e.to_string())),
            Ok(Some(Ok(Frame::Text(text)))) => {
                debug!(connection_id = id, len = text.len(), "Ignoring client message");
            }
            Ok(Some(Ok(_))) => {}
        }
    }
}
