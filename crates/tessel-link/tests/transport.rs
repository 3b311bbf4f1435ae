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

//! Transport driver behaviour against a scripted connector.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tessel_link::{run_link, Connection, Connector, LinkError, LinkInbox, LinkMessage, LinkSettings};

/// What one connection attempt does.
enum Attempt {
    Refuse,
    /// Delivers the frames, then closes.
    Frames(Vec<&'static str>),
    /// Stays open without sending anything.
    Idle,
}

struct ScriptedConnector {
    attempts: Mutex<VecDeque<Attempt>>,
    calls: Arc<AtomicUsize>,
    pings: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    fn new(attempts: Vec<Attempt>) -> Self {
        Self {
            attempts: Mutex::new(attempts.into()),
            calls: Arc::new(AtomicUsize::new(0)),
            pings: Arc::new(AtomicUsize::new(0)),
        }
    }
}

struct ScriptedConnection {
    frames: VecDeque<&'static str>,
    idle: bool,
    pings: Arc<AtomicUsize>,
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn recv(&mut self) -> Option<Result<String, LinkError>> {
        if self.idle {
            std::future::pending::<()>().await;
        }
        self.frames.pop_front().map(|frame| Ok(frame.to_string()))
    }

    async fn ping(&mut self) -> Result<(), LinkError> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Connection = ScriptedConnection;

    async fn connect(&self, url: &str) -> Result<ScriptedConnection, LinkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let attempt = self.attempts.lock().unwrap().pop_front().unwrap_or(Attempt::Refuse);
        let refused = || LinkError::Connect {
            url: url.to_string(),
            reason: "refused".into(),
        };
        match attempt {
            Attempt::Refuse => Err(refused()),
            Attempt::Frames(frames) => Ok(ScriptedConnection {
                frames: frames.into(),
                idle: false,
                pings: Arc::clone(&self.pings),
            }),
            Attempt::Idle => Ok(ScriptedConnection {
                frames: VecDeque::new(),
                idle: true,
                pings: Arc::clone(&self.pings),
            }),
        }
    }
}

fn settings() -> LinkSettings {
    LinkSettings {
        enabled: true,
        ..LinkSettings::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_reconnects_and_drops_malformed_frames() {
    // --- 1. SETUP ---
    let connector = ScriptedConnector::new(vec![
        Attempt::Frames(vec![
            r#"{"type": "shaderTree", "name": "Rock", "data": {"nodes": []}}"#,
            "not json",
        ]),
        Attempt::Refuse,
        Attempt::Frames(vec![r#"{"type": "export", "name": "level.glb", "data": {}}"#]),
    ]);
    let calls = Arc::clone(&connector.calls);
    let (sender, receiver) = flume::unbounded();

    // --- 2. ACTION ---
    let driver = tokio::spawn(run_link(connector, sender, settings()));
    let first = receiver.recv_async().await.unwrap();
    let second = receiver.recv_async().await.unwrap();
    drop(receiver);
    let report = driver.await.unwrap();

    // --- 3. ASSERTIONS ---
    assert_eq!(first.name(), "Rock");
    assert!(matches!(second, LinkMessage::Export { .. }));
    assert_eq!(report.connections, 2);
    assert_eq!(report.delivered, 2);
    assert_eq!(report.malformed, 1);
    assert!(calls.load(Ordering::SeqCst) >= 3, "The refused attempt is retried");
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_waits_the_fixed_delay() {
    let connector = ScriptedConnector::new(vec![Attempt::Refuse, Attempt::Refuse, Attempt::Idle]);
    let calls = Arc::clone(&connector.calls);
    let (sender, receiver) = flume::unbounded::<LinkMessage>();
    let driver = tokio::spawn(run_link(connector, sender, settings()));

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    drop(receiver);
    driver.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_open_connection_is_pinged_and_stops_with_the_inbox() {
    // --- 1. SETUP ---
    let connector = ScriptedConnector::new(vec![Attempt::Idle]);
    let pings = Arc::clone(&connector.pings);
    let inbox = LinkInbox::new();
    let driver = tokio::spawn(run_link(connector, inbox.sender(), settings()));

    // --- 2. ACTION ---
    tokio::time::sleep(Duration::from_millis(15_500)).await;
    let pinged = pings.load(Ordering::SeqCst);
    drop(inbox);
    let report = driver.await.unwrap();

    // --- 3. ASSERTIONS ---
    assert_eq!(pinged, 3);
    assert_eq!(report.connections, 1);
    assert_eq!(report.delivered, 0);
}
