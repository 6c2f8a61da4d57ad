use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use log::{debug, error, warn};
use tokio::sync::broadcast;

use crate::client::{ClientError, LdClient};
use crate::error::{Error, Result};
use crate::evaluation_context::EvaluationContext;
use crate::events::{ProviderEvent, ProviderEvents};
use crate::flag_value::FlagValue;
use crate::options::ProviderOptions;
use crate::resolution::{
    ErrorCode, ProviderMetadata, ProviderStatus, ResolutionDetails, TrackingEventDetails,
};
use crate::translate::{
    translate_context, translate_result, translate_tracking_event_details, FlagType,
};

const PROVIDER_NAME: &str = "launchdarkly-rust-provider";

/// The interface the OpenFeature API drives a flag provider through.
///
/// Resolution never fails outright: problems are reported in the returned
/// [ResolutionDetails], which then carries the caller's default value.
#[async_trait]
pub trait FeatureProvider: Send + Sync {
    fn metadata(&self) -> &ProviderMetadata;

    fn status(&self) -> ProviderStatus;

    /// Prepare the provider for evaluations.
    async fn initialize(&self, context: &EvaluationContext) -> Result<()>;

    /// Release everything the provider holds.
    async fn on_close(&self);

    async fn resolve_boolean_evaluation(
        &self,
        flag_key: &str,
        default_value: bool,
        context: &EvaluationContext,
    ) -> ResolutionDetails<bool>;

    async fn resolve_string_evaluation(
        &self,
        flag_key: &str,
        default_value: String,
        context: &EvaluationContext,
    ) -> ResolutionDetails<String>;

    async fn resolve_number_evaluation(
        &self,
        flag_key: &str,
        default_value: f64,
        context: &EvaluationContext,
    ) -> ResolutionDetails<f64>;

    async fn resolve_integer_evaluation(
        &self,
        flag_key: &str,
        default_value: i64,
        context: &EvaluationContext,
    ) -> ResolutionDetails<i64>;

    async fn resolve_object_evaluation(
        &self,
        flag_key: &str,
        default_value: serde_json::Value,
        context: &EvaluationContext,
    ) -> ResolutionDetails<serde_json::Value>;

    /// Record that the subject of `context` performed `event_name`.
    fn track(
        &self,
        _event_name: &str,
        _context: &EvaluationContext,
        _details: &TrackingEventDetails,
    ) {
    }

    /// Subscribe to the provider's events, if it emits any.
    fn events(&self) -> Option<broadcast::Receiver<ProviderEvent>> {
        None
    }
}

/// An OpenFeature provider backed by a LaunchDarkly client.
///
/// # Examples
///
/// ```ignore
/// let provider = LaunchDarklyProvider::new(client, ProviderOptions::default());
/// provider.initialize(&EvaluationContext::default()).await?;
///
/// let context = EvaluationContext::default().with_targeting_key("user-key");
/// let details = provider
///     .resolve_boolean_evaluation("my-flag", false, &context)
///     .await;
/// ```
pub struct LaunchDarklyProvider<C> {
    client: std::result::Result<C, ClientError>,
    options: ProviderOptions,
    metadata: ProviderMetadata,
    status: RwLock<ProviderStatus>,
    events: ProviderEvents,
}

impl<C: LdClient> LaunchDarklyProvider<C> {
    /// Create a provider around an already-constructed client.
    pub fn new(client: C, options: ProviderOptions) -> Self {
        Self::from_client_result(Ok(client), options)
    }

    /// Create a provider, constructing its client with `factory`.
    ///
    /// A construction failure does not fail this call. It is reported by
    /// [FeatureProvider::initialize], and evaluations return their defaults until then.
    pub fn from_factory<F>(factory: F, options: ProviderOptions) -> Self
    where
        F: FnOnce() -> std::result::Result<C, ClientError>,
    {
        let client = factory();
        if let Err(e) = &client {
            warn!("failed to create the LaunchDarkly client: {}", e);
        }
        Self::from_client_result(client, options)
    }

    fn from_client_result(
        client: std::result::Result<C, ClientError>,
        options: ProviderOptions,
    ) -> Self {
        let events = ProviderEvents::new();
        if let Ok(client) = &client {
            let flag_events = events.clone();
            client.on_flag_change(Box::new(move |flag_key| {
                flag_events.emit(ProviderEvent::ConfigurationChanged {
                    flags_changed: vec![flag_key.to_string()],
                })
            }));
        }

        LaunchDarklyProvider {
            client,
            options,
            metadata: ProviderMetadata::new(PROVIDER_NAME),
            status: RwLock::new(ProviderStatus::NotReady),
            events,
        }
    }

    /// The wrapped client, or None if it could not be constructed.
    pub fn client(&self) -> Option<&C> {
        self.client.as_ref().ok()
    }

    fn set_status(&self, status: ProviderStatus) {
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = status;
    }

    fn fail(&self, e: Error) -> Result<()> {
        error!("{}", e);
        self.set_status(ProviderStatus::Error);
        self.events.emit(ProviderEvent::Error {
            message: e.to_string(),
        });
        Err(e)
    }

    fn resolve<T>(
        &self,
        flag_key: &str,
        default: T,
        context: &EvaluationContext,
    ) -> ResolutionDetails<T>
    where
        T: FlagType + Clone + Into<FlagValue>,
    {
        let Ok(client) = &self.client else {
            return ResolutionDetails::error(
                default,
                ErrorCode::ProviderNotReady,
                "the LaunchDarkly client could not be created",
            );
        };

        let user = translate_context(context);
        let detail = client.variation_detail(&user, flag_key, default.clone().into());
        translate_result(detail, default)
    }
}

#[async_trait]
impl<C: LdClient> FeatureProvider for LaunchDarklyProvider<C> {
    fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    fn status(&self) -> ProviderStatus {
        *self.status.read().unwrap_or_else(PoisonError::into_inner)
    }

    async fn initialize(&self, _context: &EvaluationContext) -> Result<()> {
        let client = match &self.client {
            Ok(client) => client,
            Err(e) => return self.fail(Error::ClientConstruction(e.clone())),
        };

        let timeout = self.options.initialization_timeout;
        match tokio::time::timeout(timeout, client.wait_for_initialization()).await {
            Ok(Ok(())) => {
                debug!("LaunchDarkly client initialized");
                self.set_status(ProviderStatus::Ready);
                self.events.emit(ProviderEvent::Ready);
                Ok(())
            }
            Ok(Err(e)) => self.fail(Error::Initialization(e)),
            Err(_) => self.fail(Error::InitializationTimeout(timeout)),
        }
    }

    async fn on_close(&self) {
        if let Ok(client) = &self.client {
            client.flush();
            client.close();
        }
        self.set_status(ProviderStatus::NotReady);
    }

    async fn resolve_boolean_evaluation(
        &self,
        flag_key: &str,
        default_value: bool,
        context: &EvaluationContext,
    ) -> ResolutionDetails<bool> {
        self.resolve(flag_key, default_value, context)
    }

    async fn resolve_string_evaluation(
        &self,
        flag_key: &str,
        default_value: String,
        context: &EvaluationContext,
    ) -> ResolutionDetails<String> {
        self.resolve(flag_key, default_value, context)
    }

    async fn resolve_number_evaluation(
        &self,
        flag_key: &str,
        default_value: f64,
        context: &EvaluationContext,
    ) -> ResolutionDetails<f64> {
        self.resolve(flag_key, default_value, context)
    }

    async fn resolve_integer_evaluation(
        &self,
        flag_key: &str,
        default_value: i64,
        context: &EvaluationContext,
    ) -> ResolutionDetails<i64> {
        self.resolve(flag_key, default_value, context)
    }

    async fn resolve_object_evaluation(
        &self,
        flag_key: &str,
        default_value: serde_json::Value,
        context: &EvaluationContext,
    ) -> ResolutionDetails<serde_json::Value> {
        self.resolve(flag_key, default_value, context)
    }

    fn track(&self, event_name: &str, context: &EvaluationContext, details: &TrackingEventDetails) {
        let Ok(client) = &self.client else {
            warn!("dropping '{}' event: no LaunchDarkly client", event_name);
            return;
        };

        client.track(
            &translate_context(context),
            event_name,
            translate_tracking_event_details(details),
            details.value,
        );
    }

    fn events(&self) -> Option<broadcast::Receiver<ProviderEvent>> {
        Some(self.events.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::detail::{Detail, Error as EvalError, Reason};
    use crate::test_common::{Readiness, TestClient, TrackCall, VariationCall};
    use serde_json::json;
    use spectral::prelude::*;

    const TEST_FLAG_KEY: &str = "a-key";

    fn basic_context() -> EvaluationContext {
        EvaluationContext::default().with_targeting_key("the-key")
    }

    fn ready_provider() -> LaunchDarklyProvider<TestClient> {
        LaunchDarklyProvider::new(TestClient::new(Readiness::Ready), ProviderOptions::default())
    }

    fn client(provider: &LaunchDarklyProvider<TestClient>) -> &TestClient {
        provider.client().expect("client should exist")
    }

    #[tokio::test]
    async fn can_be_initialized() {
        let provider = ready_provider();
        let mut events = provider.events().unwrap();
        assert_eq!(provider.status(), ProviderStatus::NotReady);

        provider
            .initialize(&EvaluationContext::default())
            .await
            .unwrap();

        assert_eq!(provider.status(), ProviderStatus::Ready);
        assert_eq!(events.try_recv().unwrap(), ProviderEvent::Ready);
        provider.on_close().await;
    }

    #[tokio::test]
    async fn can_fail_to_initialize_client() {
        let provider = LaunchDarklyProvider::new(
            TestClient::new(Readiness::Fails(ClientError::Unauthorized)),
            ProviderOptions::default(),
        );
        let mut events = provider.events().unwrap();

        let err = provider
            .initialize(&EvaluationContext::default())
            .await
            .unwrap_err();

        assert_eq!(err, Error::Initialization(ClientError::Unauthorized));
        assert_eq!(
            std::error::Error::source(&err).unwrap().to_string(),
            "Authentication failed. Double check your SDK key."
        );
        assert_eq!(provider.status(), ProviderStatus::Error);
        assert!(matches!(events.try_recv().unwrap(), ProviderEvent::Error { .. }));
    }

    #[tokio::test]
    async fn initialization_times_out() {
        let mut options = ProviderOptions::new();
        options.initialization_timeout(Duration::from_millis(20));
        let provider = LaunchDarklyProvider::new(TestClient::new(Readiness::Never), options);

        let err = provider
            .initialize(&EvaluationContext::default())
            .await
            .unwrap_err();

        assert_eq!(err, Error::InitializationTimeout(Duration::from_millis(20)));
        assert_eq!(provider.status(), ProviderStatus::Error);
    }

    #[tokio::test]
    async fn construction_failure_is_raised_on_initialize() {
        let provider: LaunchDarklyProvider<TestClient> = LaunchDarklyProvider::from_factory(
            || Err(ClientError::InvalidConfig("bad sdk key".into())),
            ProviderOptions::default(),
        );
        assert!(provider.client().is_none());
        assert_eq!(provider.status(), ProviderStatus::NotReady);

        let err = provider
            .initialize(&EvaluationContext::default())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            Error::ClientConstruction(ClientError::InvalidConfig("bad sdk key".into()))
        );
        assert_eq!(provider.status(), ProviderStatus::Error);

        let res = provider
            .resolve_boolean_evaluation(TEST_FLAG_KEY, true, &basic_context())
            .await;
        assert!(res.value);
        assert_that!(res.error_code).contains_value(ErrorCode::ProviderNotReady);

        // Nothing to close, but closing must not fail.
        provider.on_close().await;
    }

    #[tokio::test]
    async fn factory_success_behaves_like_new() {
        let provider = LaunchDarklyProvider::from_factory(
            || Ok(TestClient::new(Readiness::Ready)),
            ProviderOptions::default(),
        );

        assert_that!(provider.initialize(&EvaluationContext::default()).await).is_ok();
        assert_eq!(provider.status(), ProviderStatus::Ready);
    }

    #[tokio::test]
    async fn emits_events_for_flag_changes() {
        let provider = ready_provider();
        let mut events = provider.events().unwrap();

        client(&provider).change_flag("flagA");

        assert_eq!(
            events.recv().await.unwrap(),
            ProviderEvent::ConfigurationChanged {
                flags_changed: vec!["flagA".to_string()],
            }
        );
    }

    #[tokio::test]
    async fn calls_the_client_correctly() {
        let provider = ready_provider();
        let context = basic_context();

        provider
            .resolve_boolean_evaluation(TEST_FLAG_KEY, false, &context)
            .await;
        provider
            .resolve_string_evaluation(TEST_FLAG_KEY, "default".into(), &context)
            .await;
        provider
            .resolve_number_evaluation(TEST_FLAG_KEY, 0.0, &context)
            .await;
        provider
            .resolve_integer_evaluation(TEST_FLAG_KEY, 0, &context)
            .await;
        provider
            .resolve_object_evaluation(TEST_FLAG_KEY, json!({}), &context)
            .await;

        let expected_defaults: Vec<FlagValue> = vec![
            false.into(),
            "default".into(),
            0.0.into(),
            0_i64.into(),
            json!({}).into(),
        ];
        let calls = client(&provider).variation_calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            expected_defaults
                .into_iter()
                .map(|default| VariationCall {
                    flag_key: TEST_FLAG_KEY.to_string(),
                    user: translate_context(&context),
                    default,
                })
                .collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn handles_correct_return_types() {
        let provider = ready_provider();
        let context = basic_context();
        let test_client = client(&provider);

        test_client.set_value(true, Reason::Off);
        let res = provider
            .resolve_boolean_evaluation(TEST_FLAG_KEY, false, &context)
            .await;
        assert!(res.value);
        assert_that!(res.reason).contains_value("OFF".to_string());
        assert_that!(res.error_code).is_none();

        test_client.set_value("good", Reason::Off);
        let res = provider
            .resolve_string_evaluation(TEST_FLAG_KEY, "default".into(), &context)
            .await;
        assert_eq!(res.value, "good");

        test_client.set_value(17_i64, Reason::Off);
        let res = provider
            .resolve_number_evaluation(TEST_FLAG_KEY, 0.0, &context)
            .await;
        assert_eq!(res.value, 17.0);

        let res = provider
            .resolve_integer_evaluation(TEST_FLAG_KEY, 0, &context)
            .await;
        assert_eq!(res.value, 17);

        test_client.set_value(json!({"some": "value"}), Reason::Off);
        let res = provider
            .resolve_object_evaluation(TEST_FLAG_KEY, json!({}), &context)
            .await;
        assert_eq!(res.value, json!({"some": "value"}));
    }

    #[tokio::test]
    async fn handles_incorrect_return_types() {
        let provider = ready_provider();
        let context = basic_context();
        let test_client = client(&provider);

        test_client.set_value("badness", Reason::Off);
        let res = provider
            .resolve_boolean_evaluation(TEST_FLAG_KEY, false, &context)
            .await;
        assert!(!res.value);
        assert_that!(res.reason).contains_value("ERROR".to_string());
        assert_that!(res.error_code).contains_value(ErrorCode::TypeMismatch);

        test_client.set_value(true, Reason::Off);
        let res = provider
            .resolve_string_evaluation(TEST_FLAG_KEY, "default".into(), &context)
            .await;
        assert_eq!(res.value, "default");
        assert_that!(res.error_code).contains_value(ErrorCode::TypeMismatch);

        let res = provider
            .resolve_number_evaluation(TEST_FLAG_KEY, 0.0, &context)
            .await;
        assert_eq!(res.value, 0.0);
        assert_that!(res.error_code).contains_value(ErrorCode::TypeMismatch);

        test_client.set_value(22_i64, Reason::Off);
        let res = provider
            .resolve_object_evaluation(TEST_FLAG_KEY, json!({}), &context)
            .await;
        assert_eq!(res.value, json!({}));
        assert_that!(res.error_code).contains_value(ErrorCode::TypeMismatch);
    }

    #[tokio::test]
    async fn handles_errors_from_the_client() {
        let cases = vec![
            (Some(EvalError::ClientNotReady), ErrorCode::ProviderNotReady),
            (Some(EvalError::MalformedFlag), ErrorCode::ParseError),
            (Some(EvalError::FlagNotFound), ErrorCode::FlagNotFound),
            (Some(EvalError::UserNotSpecified), ErrorCode::TargetingKeyMissing),
            (Some(EvalError::Unspecified), ErrorCode::General),
            (None, ErrorCode::General),
        ];

        let provider = ready_provider();
        for (error, expected) in cases {
            client(&provider).set_value(json!({"yes": "no"}), Reason::Error { error });
            let res = provider
                .resolve_object_evaluation(TEST_FLAG_KEY, json!({"yes": "no"}), &basic_context())
                .await;

            assert_eq!(res.value, json!({"yes": "no"}));
            assert_that!(res.reason).contains_value("ERROR".to_string());
            assert_that!(res.error_code).contains_value(expected);
        }
    }

    #[tokio::test]
    async fn includes_the_variant() {
        let provider = ready_provider();
        client(&provider).set_detail(Detail {
            value: Some(json!({"yes": "no"}).into()),
            variation_index: Some(22),
            reason: Reason::Off,
        });

        let res = provider
            .resolve_object_evaluation(TEST_FLAG_KEY, json!({}), &basic_context())
            .await;

        assert_eq!(res.value, json!({"yes": "no"}));
        assert_that!(res.variant).contains_value("22".to_string());
        assert_that!(res.reason).contains_value("OFF".to_string());
    }

    #[tokio::test]
    async fn close_flushes_then_closes() {
        let provider = ready_provider();
        provider
            .initialize(&EvaluationContext::default())
            .await
            .unwrap();

        provider.on_close().await;

        assert_eq!(*client(&provider).lifecycle.lock().unwrap(), vec!["flush", "close"]);
        assert_eq!(provider.status(), ProviderStatus::NotReady);
    }

    #[test]
    fn track_forwards_to_the_client() {
        let provider = ready_provider();
        let context = basic_context().with_custom_field("email", "a@b.c");
        let details = TrackingEventDetails::default()
            .with_value(99.0)
            .with_attribute("plan", "gold");

        provider.track("checkout", &context, &details);

        assert_eq!(
            *client(&provider).track_calls.lock().unwrap(),
            vec![TrackCall {
                key: "checkout".to_string(),
                user: translate_context(&context),
                data: Some(json!({"plan": "gold"})),
                metric_value: Some(99.0),
            }]
        );
    }

    #[tokio::test]
    async fn usable_as_a_trait_object() {
        let provider: Box<dyn FeatureProvider> = Box::new(ready_provider());

        assert_eq!(provider.metadata().name, "launchdarkly-rust-provider");
        let res = provider
            .resolve_boolean_evaluation(TEST_FLAG_KEY, true, &basic_context())
            .await;
        assert!(res.value);
        assert_that!(res.reason).contains_value("FALLTHROUGH".to_string());
    }
}
