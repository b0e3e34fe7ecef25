//! End-to-end controller tests against a scripted receiver on loopback TCP.
//!
//! The fake receiver answers status queries with canned state codes and
//! echoes the results of volume commands, which is exactly how the real
//! device behaves on its control port.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use avr_panel::domain::config::PanelConfig;
use avr_panel::infrastructure::avr_conn::TcpDial;
use avr_panel::AvrController;

// ── Fake receiver ─────────────────────────────────────────────────────────────

/// Binds a scripted receiver on an ephemeral port and returns the port.
async fn spawn_receiver() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let mv_polls = Arc::new(AtomicUsize::new(0));

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let counter = Arc::clone(&mv_polls);
            tokio::spawn(serve_connection(stream, counter));
        }
    });

    port
}

async fn serve_connection(mut stream: TcpStream, mv_polls: Arc<AtomicUsize>) {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 256];

    loop {
        let n = match stream.read(&mut tmp).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&tmp[..n]);

        while let Some(pos) = buf.iter().position(|b| *b == b'\r') {
            let line: Vec<u8> = buf.drain(..=pos).collect();
            let command = String::from_utf8_lossy(&line).trim().to_string();
            if let Some(reply) = reply_for(&command, &mv_polls) {
                if stream.write_all(reply.as_bytes()).await.is_err() {
                    return;
                }
            }
        }
    }
}

fn reply_for(command: &str, mv_polls: &AtomicUsize) -> Option<String> {
    match command {
        // The main volume "changes on its own" after the first poll, as if
        // someone turned the knob on the front panel.
        "MV?" => {
            if mv_polls.fetch_add(1, Ordering::Relaxed) == 0 {
                Some("MV55\rMVMAX 80\r".to_string())
            } else {
                Some("MV60\rMVMAX 80\r".to_string())
            }
        }
        "MU?" => Some("MUOFF\r".to_string()),
        "PW?" => Some("PWON\r".to_string()),
        "SI?" => Some("SICD\r".to_string()),
        "MVUP" => Some("MV56\r".to_string()),
        "MUON" => Some("MUON\r".to_string()),
        // Most commands are accepted silently.
        _ => None,
    }
}

fn config_for(port: u16) -> PanelConfig {
    PanelConfig {
        avr_host: "127.0.0.1".to_string(),
        avr_port: port,
        connect_timeout: Duration::from_secs(1),
        reply_timeout: Duration::from_millis(300),
        command_gap: Duration::from_millis(10),
        // Individual tests lower this when they exercise the poll loop.
        poll_interval: Duration::from_secs(600),
        ..PanelConfig::default()
    }
}

fn controller_for(config: PanelConfig) -> AvrController {
    let dial = TcpDial::from_config(&config);
    AvrController::new(config, Box::new(dial))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_primes_state_from_status_queries() {
    let port = spawn_receiver().await;
    let controller = controller_for(config_for(port));

    controller.connect().await.unwrap();

    assert!(controller.is_connected());
    let state = controller.current_state().await;
    assert_eq!(state.power, Some(true));
    assert_eq!(state.volume, Some(55));
    assert_eq!(state.muted, Some(false));
    assert_eq!(state.input_source.as_deref(), Some("CD"));
}

#[tokio::test]
async fn test_send_command_round_trip_updates_state() {
    let port = spawn_receiver().await;
    let controller = controller_for(config_for(port));
    controller.connect().await.unwrap();

    let reply = controller.send_command("MVUP").await.unwrap();

    assert_eq!(reply.as_deref(), Some("MV56"));
    assert_eq!(controller.current_state().await.volume, Some(56));
}

#[tokio::test]
async fn test_unanswered_command_still_succeeds() {
    let port = spawn_receiver().await;
    let controller = controller_for(config_for(port));
    controller.connect().await.unwrap();

    // The fake receiver accepts surround changes silently.
    let reply = controller.send_command("MSSTEREO").await.unwrap();

    assert_eq!(reply, None);
    assert!(controller.is_connected());
}

#[tokio::test]
async fn test_state_change_notifies_subscribers() {
    let port = spawn_receiver().await;
    let controller = controller_for(config_for(port));
    controller.connect().await.unwrap();

    let mut rx = controller.subscribe();
    rx.borrow_and_update();

    controller.send_command("MUON").await.unwrap();

    tokio::time::timeout(Duration::from_secs(2), rx.changed())
        .await
        .expect("no snapshot within 2s")
        .unwrap();
    assert_eq!(rx.borrow().state.muted, Some(true));
}

#[tokio::test]
async fn test_poll_loop_picks_up_external_changes() {
    let port = spawn_receiver().await;
    let config = PanelConfig {
        poll_interval: Duration::from_millis(200),
        ..config_for(port)
    };
    let controller = controller_for(config);
    controller.connect().await.unwrap();
    assert_eq!(controller.current_state().await.volume, Some(55));

    let mut rx = controller.subscribe();
    rx.borrow_and_update();

    // The next poll observes the knob-turned volume.
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            rx.changed().await.unwrap();
            if rx.borrow_and_update().state.volume == Some(60) {
                break;
            }
        }
    })
    .await
    .expect("poll never observed the new volume");
}

#[tokio::test]
async fn test_disconnect_reports_in_snapshot() {
    let port = spawn_receiver().await;
    let controller = controller_for(config_for(port));
    controller.connect().await.unwrap();

    controller.disconnect().await;

    assert!(!controller.is_connected());
    assert!(!controller.subscribe().borrow().connected);
}

#[tokio::test]
async fn test_unreachable_receiver_fails_with_error() {
    // Bind and drop a listener so the port is very likely unbound.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = PanelConfig {
        max_retries: 1,
        initial_retry_delay: Duration::from_millis(10),
        ..config_for(port)
    };
    let controller = controller_for(config);

    assert!(controller.connect().await.is_err());
    assert!(!controller.is_connected());
    assert!(controller.last_error().await.is_some());
}
