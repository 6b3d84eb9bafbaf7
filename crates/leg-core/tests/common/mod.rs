//! Shared fixtures for call flow tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use confstream_leg_core::{
    AnswerCallback, CallFlowController, CallbackUrls, CreateCallRequest, DigitCollection, FlowConfig,
    HangupOutcome, LegError, LegId, LegRegistry, Result, TelephonyGateway,
};

/// A command the flow sent to the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCommand {
    Create(CreateCallRequest),
    Hangup(LegId),
    Record(LegId),
}

/// Gateway double recording every command
#[derive(Default)]
pub struct MockGateway {
    commands: Mutex<Vec<GatewayCommand>>,
    created: AtomicUsize,
    fail_create: bool,
    fail_recording: bool,
    hangup_outcome: Option<HangupOutcome>,
    /// When set, `create_call` parks until `open_gate` is called
    gate: Option<Arc<Notify>>,
    create_started: Notify,
    recording_started: Notify,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// `create_call` waits for [`MockGateway::open_gate`] before answering
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Notify::new())),
            ..Self::default()
        }
    }

    pub fn failing_create() -> Self {
        Self {
            fail_create: true,
            ..Self::default()
        }
    }

    pub fn failing_recording() -> Self {
        Self {
            fail_recording: true,
            ..Self::default()
        }
    }

    pub fn with_hangup_outcome(outcome: HangupOutcome) -> Self {
        Self {
            hangup_outcome: Some(outcome),
            ..Self::default()
        }
    }

    pub fn open_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    /// Resolves once a `create_call` is in flight
    pub async fn wait_for_create(&self) {
        tokio::time::timeout(Duration::from_secs(5), self.create_started.notified())
            .await
            .expect("create_call was never called");
    }

    pub async fn wait_for_recording(&self) {
        tokio::time::timeout(Duration::from_secs(5), self.recording_started.notified())
            .await
            .expect("start_recording was never called");
    }

    pub fn commands(&self) -> Vec<GatewayCommand> {
        self.commands.lock().clone()
    }

    pub fn creates(&self) -> Vec<CreateCallRequest> {
        self.commands()
            .into_iter()
            .filter_map(|command| match command {
                GatewayCommand::Create(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn hangups(&self) -> Vec<LegId> {
        self.commands()
            .into_iter()
            .filter_map(|command| match command {
                GatewayCommand::Hangup(leg) => Some(leg),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl TelephonyGateway for MockGateway {
    async fn create_call(&self, request: CreateCallRequest) -> Result<LegId> {
        self.commands.lock().push(GatewayCommand::Create(request));
        self.create_started.notify_one();

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail_create {
            return Err(LegError::gateway("create call", "service unavailable"));
        }
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(LegId::new(format!("created-{}", n)))
    }

    async fn hangup_leg(&self, leg: &LegId) -> Result<HangupOutcome> {
        self.commands.lock().push(GatewayCommand::Hangup(leg.clone()));
        Ok(self.hangup_outcome.unwrap_or(HangupOutcome::Terminated))
    }

    async fn start_recording(&self, leg: &LegId) -> Result<()> {
        self.commands.lock().push(GatewayCommand::Record(leg.clone()));
        self.recording_started.notify_one();
        if self.fail_recording {
            return Err(LegError::gateway("start recording", "forbidden"));
        }
        Ok(())
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("confstream_leg_core=debug")
        .with_test_writer()
        .try_init();
}

pub fn urls() -> CallbackUrls {
    CallbackUrls::new("https", "calls.example.com").unwrap()
}

pub fn controller(gateway: Arc<MockGateway>) -> CallFlowController {
    controller_with_config(gateway, FlowConfig::default())
}

pub fn controller_with_config(gateway: Arc<MockGateway>, config: FlowConfig) -> CallFlowController {
    init_tracing();
    CallFlowController::new(gateway, Arc::new(LegRegistry::new()), config)
}

pub fn answer(leg: &str) -> AnswerCallback {
    AnswerCallback {
        leg: LegId::new(leg),
        from: Some("12995550111".to_string()),
        to: Some("12995550100".to_string()),
    }
}

pub fn digits(leg: &str, digits: &str) -> DigitCollection {
    DigitCollection {
        leg: LegId::new(leg),
        digits: digits.to_string(),
        timed_out: false,
    }
}

pub fn timed_out(leg: &str) -> DigitCollection {
    DigitCollection {
        leg: LegId::new(leg),
        digits: String::new(),
        timed_out: true,
    }
}
