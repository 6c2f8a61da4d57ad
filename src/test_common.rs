#![cfg(test)]
use std::cell::RefCell;
use std::sync::{Mutex, Once};

use async_trait::async_trait;
use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::client::{ClientError, FlagChangeListener, LdClient};
use crate::detail::{Detail, Reason};
use crate::flag_value::FlagValue;
use crate::user::User;

/// How [TestClient::wait_for_initialization] behaves.
pub(crate) enum Readiness {
    Ready,
    Fails(ClientError),
    Never,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct VariationCall {
    pub flag_key: String,
    pub user: User,
    pub default: FlagValue,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TrackCall {
    pub key: String,
    pub user: User,
    pub data: Option<serde_json::Value>,
    pub metric_value: Option<f64>,
}

/// An [LdClient] that answers every evaluation with a canned detail and records what it was
/// asked to do.
pub(crate) struct TestClient {
    readiness: Readiness,
    detail: Mutex<Option<Detail<FlagValue>>>,
    listeners: Mutex<Vec<FlagChangeListener>>,
    pub variation_calls: Mutex<Vec<VariationCall>>,
    pub track_calls: Mutex<Vec<TrackCall>>,
    pub lifecycle: Mutex<Vec<&'static str>>,
}

impl TestClient {
    pub fn new(readiness: Readiness) -> Self {
        TestClient {
            readiness,
            detail: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
            variation_calls: Mutex::new(Vec::new()),
            track_calls: Mutex::new(Vec::new()),
            lifecycle: Mutex::new(Vec::new()),
        }
    }

    /// Answer subsequent evaluations with `detail`.
    pub fn set_detail(&self, detail: Detail<FlagValue>) {
        *self.detail.lock().unwrap() = Some(detail);
    }

    /// Answer subsequent evaluations with `value` and the given reason.
    pub fn set_value(&self, value: impl Into<FlagValue>, reason: Reason) {
        self.set_detail(Detail {
            value: Some(value.into()),
            variation_index: None,
            reason,
        });
    }

    /// Notify listeners that `flag_key` changed, as the data source would.
    pub fn change_flag(&self, flag_key: &str) {
        for listener in self.listeners.lock().unwrap().iter() {
            listener(flag_key);
        }
    }
}

#[async_trait]
impl LdClient for TestClient {
    fn variation_detail(
        &self,
        user: &User,
        flag_key: &str,
        default: FlagValue,
    ) -> Detail<FlagValue> {
        self.variation_calls.lock().unwrap().push(VariationCall {
            flag_key: flag_key.to_string(),
            user: user.clone(),
            default: default.clone(),
        });

        match &*self.detail.lock().unwrap() {
            Some(detail) => detail.clone(),
            None => Detail {
                value: Some(default),
                variation_index: None,
                reason: Reason::Fallthrough {
                    in_experiment: false,
                },
            },
        }
    }

    async fn wait_for_initialization(&self) -> Result<(), ClientError> {
        match &self.readiness {
            Readiness::Ready => Ok(()),
            Readiness::Fails(e) => Err(e.clone()),
            Readiness::Never => std::future::pending().await,
        }
    }

    fn track(
        &self,
        user: &User,
        key: &str,
        data: Option<serde_json::Value>,
        metric_value: Option<f64>,
    ) {
        self.track_calls.lock().unwrap().push(TrackCall {
            key: key.to_string(),
            user: user.clone(),
            data,
            metric_value,
        });
    }

    fn flush(&self) {
        self.lifecycle.lock().unwrap().push("flush");
    }

    fn close(&self) {
        self.lifecycle.lock().unwrap().push("close");
    }

    fn on_flag_change(&self, listener: FlagChangeListener) {
        self.listeners.lock().unwrap().push(listener);
    }
}

thread_local! {
    static CAPTURED_LOGS: RefCell<Vec<(Level, String)>> = RefCell::new(Vec::new());
}

/// Records log output per thread, so tests running in parallel only see their own messages.
struct CapturingLogger;

impl Log for CapturingLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        CAPTURED_LOGS.with(|logs| {
            logs.borrow_mut()
                .push((record.level(), record.args().to_string()))
        });
    }

    fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger;
static INSTALL_LOGGER: Once = Once::new();

/// Run `f` and return everything it logged on this thread.
pub(crate) fn capture_logs<F: FnOnce()>(f: F) -> Vec<(Level, String)> {
    INSTALL_LOGGER.call_once(|| {
        log::set_logger(&LOGGER).expect("no other logger is installed in tests");
        log::set_max_level(LevelFilter::Trace);
    });

    CAPTURED_LOGS.with(|logs| logs.borrow_mut().clear());
    f();
    CAPTURED_LOGS.with(|logs| logs.take())
}
