// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The reconnecting transport driver.

use async_trait::async_trait;
use tokio::time::{self, MissedTickBehavior};

use crate::error::LinkError;
use crate::message::LinkMessage;
use crate::settings::LinkSettings;

/// An open connection to the authoring tool.
#[async_trait]
pub trait Connection: Send {
    /// Waits for the next text frame. `None` means the peer closed the
    /// connection.
    async fn recv(&mut self) -> Option<Result<String, LinkError>>;

    /// Sends a keep-alive.
    async fn ping(&mut self) -> Result<(), LinkError>;
}

/// Opens connections. Implemented by the concrete socket backend.
#[async_trait]
pub trait Connector: Send + Sync {
    /// The connection type produced.
    type Connection: Connection;

    /// Connects to `url`.
    async fn connect(&self, url: &str) -> Result<Self::Connection, LinkError>;
}

/// Counters returned when [`run_link`] stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkReport {
    /// Connections established.
    pub connections: usize,
    /// Messages forwarded to the engine.
    pub delivered: usize,
    /// Frames dropped as malformed.
    pub malformed: usize,
}

enum Session {
    Lost,
    ReceiverGone,
}

/// Keeps a connection to the authoring tool alive and forwards its
/// messages into `sender`.
///
/// A lost or refused connection is retried after the fixed
/// [`LinkSettings::reconnect_delay`], forever. Malformed frames are logged
/// and dropped. Returns once the receiving side of `sender` is dropped.
pub async fn run_link<C: Connector>(
    connector: C,
    sender: flume::Sender<LinkMessage>,
    settings: LinkSettings,
) -> LinkReport {
    let mut report = LinkReport::default();
    loop {
        if sender.is_disconnected() {
            break;
        }
        match connector.connect(&settings.url).await {
            Ok(mut connection) => {
                report.connections += 1;
                log::info!("Live link connected to {}.", settings.url);
                match session(&mut connection, &sender, &settings, &mut report).await {
                    Session::ReceiverGone => break,
                    Session::Lost => log::info!(
                        "Live link closed; reconnecting in {}ms.",
                        settings.reconnect_delay_ms
                    ),
                }
            }
            Err(e) => log::warn!("{e}; retrying in {}ms.", settings.reconnect_delay_ms),
        }
        time::sleep(settings.reconnect_delay()).await;
    }
    log::info!("Live link stopped: the engine went away.");
    report
}

async fn session<C: Connection>(
    connection: &mut C,
    sender: &flume::Sender<LinkMessage>,
    settings: &LinkSettings,
    report: &mut LinkReport,
) -> Session {
    let mut ping = time::interval_at(time::Instant::now() + settings.ping_interval(), settings.ping_interval());
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            frame = connection.recv() => match frame {
                None => return Session::Lost,
                Some(Err(e)) => {
                    log::warn!("{e}");
                    return Session::Lost;
                }
                Some(Ok(text)) => match LinkMessage::parse(&text) {
                    Ok(message) => {
                        log::debug!("Live link received {:?} '{}'.", message.kind(), message.name());
                        if sender.send(message).is_err() {
                            return Session::ReceiverGone;
                        }
                        report.delivered += 1;
                    }
                    Err(e) => {
                        report.malformed += 1;
                        log::warn!("Dropping live link frame: {e}");
                    }
                },
            },
            _ = ping.tick() => {
                if sender.is_disconnected() {
                    return Session::ReceiverGone;
                }
                if let Err(e) = connection.ping().await {
                    log::warn!("Live link ping failed: {e}");
                    return Session::Lost;
                }
            }
        }
    }
}
