use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::{ServiceRequest, ServiceResponse};
use crate::client::ChatService;
use crate::{Error, Result};

/// Caller-side deadline for one request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

type Envelope = (ServiceRequest, oneshot::Sender<ServiceResponse>);

/// Cloneable sender half of a running service worker.
#[derive(Clone)]
pub struct ServiceHandle {
    tx: mpsc::Sender<Envelope>,
    timeout: Duration,
}

impl ServiceHandle {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send a request and wait for its response.
    ///
    /// Fails with [`Error::Channel`] when the worker is gone and with
    /// [`Error::Timeout`] when no reply arrives within the deadline. A chat
    /// turn that retries can outlive the default deadline; the worker still
    /// finishes it and the late reply is dropped.
    pub async fn send(&self, request: ServiceRequest) -> Result<ServiceResponse> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send((request, reply_tx))
            .await
            .map_err(|_| Error::Channel {
                message: "service worker has stopped".into(),
            })?;

        match tokio::time::timeout(self.timeout, reply_rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(Error::Channel {
                message: "service worker dropped the request".into(),
            }),
            Err(_) => Err(Error::Timeout { after: self.timeout }),
        }
    }
}

/// Run `service` on a background task fed by a bounded queue.
///
/// Each request is handled on its own task so a slow chat turn does not hold
/// up configuration or history requests. The worker stops once every handle
/// has been dropped.
pub fn spawn_service(service: Arc<ChatService>, buffer: usize) -> ServiceHandle {
    let (tx, mut rx) = mpsc::channel::<Envelope>(buffer.max(1));
    tokio::spawn(async move {
        while let Some((request, reply)) = rx.recv().await {
            let service = service.clone();
            tokio::spawn(async move {
                let response = service.handle(request).await;
                if reply.send(response).is_err() {
                    debug!("caller went away before the response was ready");
                }
            });
        }
        debug!("service worker stopped");
    });
    ServiceHandle {
        tx,
        timeout: DEFAULT_REQUEST_TIMEOUT,
    }
}
