//! Shared test doubles: a scripted provider and a factory that hands it out.

#![allow(dead_code)]

use ai_chat_relay::drivers::{ChatProvider, ProviderFactory};
use ai_chat_relay::transport::TransportError;
use ai_chat_relay::{
    ChatService, Configuration, Error, Message, NormalizedResult, ProviderKind, RetryPolicy, Storage,
    UsageStats,
};
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One scripted outcome of `generate`.
#[derive(Clone)]
pub enum Step {
    Reply(NormalizedResult),
    Fail(Arc<dyn Fn() -> Error + Send + Sync>),
    Hang,
}

impl Step {
    pub fn reply(content: &str) -> Self {
        Step::Reply(NormalizedResult {
            content: content.into(),
            model: "gpt-3.5-turbo".into(),
            usage: Some(UsageStats::from(json!({"prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8}))),
        })
    }

    pub fn fail(make: impl Fn() -> Error + Send + Sync + 'static) -> Self {
        Step::Fail(Arc::new(make))
    }

    pub fn server_error() -> Self {
        Step::fail(|| Error::Upstream {
            provider: "OpenAI".into(),
            status: 500,
            message: "The server had an error while processing your request".into(),
        })
    }

    pub fn bad_key() -> Self {
        Step::fail(|| Error::Upstream {
            provider: "OpenAI".into(),
            status: 401,
            message: "Incorrect API key provided: sk-xxxx".into(),
        })
    }

    pub fn quota() -> Self {
        Step::fail(|| Error::Upstream {
            provider: "OpenAI".into(),
            status: 429,
            message: "You exceeded your current quota".into(),
        })
    }

    pub fn unreachable() -> Self {
        Step::fail(|| Error::Transport(TransportError::Other("connection refused".into())))
    }
}

/// Provider that plays back `script` and then repeats `fallback` forever.
pub struct StubProvider {
    kind: ProviderKind,
    script: Mutex<VecDeque<Step>>,
    fallback: Step,
    calls: AtomicUsize,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl StubProvider {
    pub fn new(script: Vec<Step>, fallback: Step) -> Arc<Self> {
        Arc::new(Self {
            kind: ProviderKind::OpenAi,
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn always(step: Step) -> Arc<Self> {
        Self::new(Vec::new(), step)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Message lists passed to each call, in call order.
    pub fn seen(&self) -> Vec<Vec<Message>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatProvider for StubProvider {
    fn provider(&self) -> ProviderKind {
        self.kind
    }

    async fn generate(&self, messages: &[Message], _config: &Configuration) -> ai_chat_relay::Result<NormalizedResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(messages.to_vec());
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        match step {
            Step::Reply(r) => Ok(r),
            Step::Fail(make) => Err(make()),
            Step::Hang => std::future::pending().await,
        }
    }
}

pub struct StubFactory {
    pub provider: Arc<StubProvider>,
}

impl ProviderFactory for StubFactory {
    fn create(&self, _config: &Configuration) -> Arc<dyn ChatProvider> {
        self.provider.clone()
    }
}

/// Retry policy without backoff waits, for tests that run on real time.
pub fn quick_retry() -> RetryPolicy {
    RetryPolicy::new()
        .with_base_delay(std::time::Duration::ZERO)
        .with_jitter(false)
}

pub fn service_with(provider: Arc<StubProvider>) -> ChatService {
    ChatService::builder()
        .storage(Storage::in_memory())
        .retry_policy(quick_retry())
        .provider_factory(Arc::new(StubFactory { provider }))
        .build()
        .expect("service builds")
}

pub async fn set_api_key(service: &ChatService, key: &str) {
    service
        .config_manager()
        .update(&json!({"aiApiKey": key}))
        .await
        .expect("config saved");
}
