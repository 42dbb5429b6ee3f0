//! Control connection tests over in-memory message channels

use axum::extract::ws::Message;
use camcar_server::hardware::mock::{
    MockCamera, MockFlashlight, MockLink, MockMotorDriver, MockPanServo, MockSystem,
};
use camcar_server::state::{AppConfig, AppState, Hardware};
use camcar_server::web_api::serve_control_connection;
use futures::channel::mpsc;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

type Inbound = Result<Message, axum::Error>;

fn app_state(motors: Arc<MockMotorDriver>) -> AppState {
    let hardware = Hardware {
        motors,
        servo: Arc::new(MockPanServo::new()),
        flashlight: Arc::new(MockFlashlight::new()),
        camera: Arc::new(MockCamera::new()),
        link: Arc::new(MockLink::new(-61)),
        system: Arc::new(MockSystem::new()),
    };
    AppState::new(AppConfig::default(), hardware)
}

struct Client {
    inbound: mpsc::UnboundedSender<Inbound>,
    outbound: mpsc::UnboundedReceiver<Message>,
    task: JoinHandle<()>,
}

impl Client {
    fn connect(state: &AppState) -> Self {
        let (out_tx, out_rx) = mpsc::unbounded::<Message>();
        let (in_tx, in_rx) = mpsc::unbounded::<Inbound>();
        let task = tokio::spawn(serve_control_connection(out_tx, in_rx, state.clone()));
        Self {
            inbound: in_tx,
            outbound: out_rx,
            task,
        }
    }

    fn send_text(&self, text: &str) {
        self.inbound
            .unbounded_send(Ok(Message::Text(text.to_string())))
            .unwrap();
    }

    fn send_binary(&self, data: &[u8]) {
        self.inbound
            .unbounded_send(Ok(Message::Binary(data.to_vec())))
            .unwrap();
    }

    async fn recv(&mut self) -> String {
        let next = tokio::time::timeout(Duration::from_secs(2), self.outbound.next())
            .await
            .expect("no frame within 2s");
        match next {
            Some(Message::Text(text)) => text,
            other => panic!("unexpected outbound frame: {:?}", other),
        }
    }

    async fn recv_burst(&mut self) -> Vec<String> {
        let mut burst = Vec::new();
        for _ in 0..3 {
            burst.push(self.recv().await);
        }
        burst
    }
}

#[tokio::test]
async fn test_status_burst_precedes_first_reply() {
    let state = app_state(Arc::new(MockMotorDriver::new()));
    let mut client = Client::connect(&state);

    // Queued before the burst has been read
    client.send_text("ping");

    assert_eq!(
        client.recv_burst().await,
        vec!["Flash-OFF", "WIFI-1", "FRAMESIZE-QVGA"]
    );
    assert_eq!(client.recv().await, "pong-61");
}

#[tokio::test]
async fn test_reply_goes_only_to_sender() {
    let state = app_state(Arc::new(MockMotorDriver::new()));
    let mut a = Client::connect(&state);
    let mut b = Client::connect(&state);
    a.recv_burst().await;
    b.recv_burst().await;
    assert_eq!(state.hub.connection_count(), 2);

    a.send_text("toggleFlash");
    assert_eq!(a.recv().await, "Flash-ON");

    // B's next frame is its own reply, not A's flash report
    b.send_text("ping");
    assert_eq!(b.recv().await, "pong-61");
}

#[tokio::test]
async fn test_binary_frames_dispatch_only_when_utf8() {
    let motors = Arc::new(MockMotorDriver::new());
    let state = app_state(motors.clone());
    let mut client = Client::connect(&state);
    client.recv_burst().await;

    client.send_binary(&[0xFF, 0xFE, 0x00]);
    client.send_binary(b"toggleFlash");
    assert_eq!(client.recv().await, "Flash-ON");

    client.send_binary(b"forward");
    client.send_text("ping");
    assert_eq!(client.recv().await, "pong-61");
    assert_eq!(motors.duties(), (200, 200));
}

#[tokio::test]
async fn test_close_unregisters_connection() {
    let state = app_state(Arc::new(MockMotorDriver::new()));
    let mut client = Client::connect(&state);
    client.recv_burst().await;
    assert_eq!(state.hub.connection_count(), 1);

    client.inbound.unbounded_send(Ok(Message::Close(None))).unwrap();
    client.task.await.unwrap();

    assert_eq!(state.hub.connection_count(), 0);
    assert!(client.outbound.next().await.is_none());
}

#[tokio::test]
async fn test_dropped_client_unregisters_connection() {
    let state = app_state(Arc::new(MockMotorDriver::new()));
    let mut client = Client::connect(&state);
    client.recv_burst().await;

    drop(client.inbound);
    client.task.await.unwrap();
    assert_eq!(state.hub.connection_count(), 0);
}
