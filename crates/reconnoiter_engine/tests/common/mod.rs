#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use reconnoiter_core::{ComparisonResult, JobEvent, JobSession, TransportKind};
use reconnoiter_engine::{
    ApiError, ComparisonApi, CreatedJob, Navigator, PollTransport, SignalSink, StatusResponse,
    Transport, TransportFactory, TransportSignal,
};
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(reconnoiter_logging::initialize_for_tests);
}

#[derive(Default)]
pub struct TestSink {
    signals: Mutex<Vec<TransportSignal>>,
}

impl TestSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn signals(&self) -> Vec<TransportSignal> {
        self.signals.lock().unwrap().clone()
    }

    /// Waits until at least `count` signals arrived, panicking after `limit`.
    pub async fn wait_for(&self, count: usize, limit: Duration) -> Vec<TransportSignal> {
        let deadline = Instant::now() + limit;
        loop {
            let signals = self.signals();
            if signals.len() >= count {
                return signals;
            }
            assert!(
                Instant::now() < deadline,
                "expected {count} signals, got {signals:?}"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl SignalSink for TestSink {
    fn emit(&self, signal: TransportSignal) {
        self.signals.lock().unwrap().push(signal);
    }
}

/// Backend stand-in. Status replies are served in order; once the script runs
/// out every further request fails with a network error.
pub struct ScriptedApi {
    create_result: Mutex<Result<CreatedJob, ApiError>>,
    create_delay: Duration,
    statuses: Mutex<VecDeque<Result<StatusResponse, ApiError>>>,
    create_calls: AtomicUsize,
    status_calls: Mutex<Vec<Instant>>,
}

impl ScriptedApi {
    pub fn new(statuses: Vec<Result<StatusResponse, ApiError>>) -> Self {
        Self {
            create_result: Mutex::new(Ok(CreatedJob::new("abc"))),
            create_delay: Duration::ZERO,
            statuses: Mutex::new(statuses.into()),
            create_calls: AtomicUsize::new(0),
            status_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_create(err: ApiError) -> Self {
        let api = Self::new(Vec::new());
        *api.create_result.lock().unwrap() = Err(err);
        api
    }

    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> Vec<Instant> {
        self.status_calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ComparisonApi for ScriptedApi {
    async fn create_comparison(&self, _query: &str) -> Result<CreatedJob, ApiError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if !self.create_delay.is_zero() {
            tokio::time::sleep(self.create_delay).await;
        }
        self.create_result.lock().unwrap().clone()
    }

    async fn comparison_status(&self, _session: &JobSession) -> Result<StatusResponse, ApiError> {
        self.status_calls.lock().unwrap().push(Instant::now());
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network("script exhausted".into())))
    }
}

/// Channel stand-in that plays back `(delay, signal)` pairs once started.
///
/// A leaky channel ignores `stop` and keeps playing, the way a socket that
/// has not noticed the close yet might.
pub struct ScriptedChannel {
    script: Vec<(Duration, TransportSignal)>,
    leaky: bool,
    counters: Arc<ChannelCounters>,
    task: Option<JoinHandle<()>>,
}

#[derive(Default)]
pub struct ChannelCounters {
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
}

impl Transport for ScriptedChannel {
    fn kind(&self) -> TransportKind {
        TransportKind::Channel
    }

    fn start(&mut self, _session: &JobSession, sink: Arc<dyn SignalSink>) {
        self.counters.starts.fetch_add(1, Ordering::SeqCst);
        let script = self.script.clone();
        self.task = Some(tokio::spawn(async move {
            for (delay, signal) in script {
                tokio::time::sleep(delay).await;
                sink.emit(signal);
            }
        }));
    }

    fn stop(&mut self) {
        self.counters.stops.fetch_add(1, Ordering::SeqCst);
        if self.leaky {
            return;
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

pub struct TestTransports {
    pub api: Arc<ScriptedApi>,
    pub script: Vec<(Duration, TransportSignal)>,
    pub leaky: bool,
    pub counters: Arc<ChannelCounters>,
}

impl TestTransports {
    pub fn new(api: Arc<ScriptedApi>, script: Vec<(Duration, TransportSignal)>) -> Self {
        Self {
            api,
            script,
            leaky: false,
            counters: Arc::new(ChannelCounters::default()),
        }
    }

    pub fn leaky(mut self) -> Self {
        self.leaky = true;
        self
    }
}

impl TransportFactory for TestTransports {
    fn channel(&self) -> Box<dyn Transport> {
        Box::new(ScriptedChannel {
            script: self.script.clone(),
            leaky: self.leaky,
            counters: self.counters.clone(),
            task: None,
        })
    }

    fn poll(&self, interval: Duration) -> Box<dyn Transport> {
        Box::new(PollTransport::new(self.api.clone(), interval))
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    targets: Mutex<Vec<ComparisonResult>>,
}

impl RecordingNavigator {
    pub fn targets(&self) -> Vec<u64> {
        self.targets
            .lock()
            .unwrap()
            .iter()
            .map(|target| target.comparison_id)
            .collect()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: &ComparisonResult) {
        self.targets.lock().unwrap().push(target.clone());
    }
}

pub fn failed(reason: &str) -> TransportSignal {
    TransportSignal::Event(JobEvent::Failed {
        reason: reason.to_string(),
    })
}

pub fn completed(comparison_id: u64) -> TransportSignal {
    TransportSignal::Event(JobEvent::Complete {
        result: ComparisonResult {
            comparison_id,
            redirect_url: None,
        },
        message: None,
    })
}
