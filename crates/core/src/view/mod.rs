//! View controllers.
//!
//! A controller issues one request against its route and turns the payload
//! into a model. [`View`] owns the controller together with its bound state
//! and runs the loading/idle cycle:
//!
//! ```text
//!   Idle ──refresh()──▶ Loading ──response (current)──▶ Idle
//!                          │
//!                          └──response (superseded)──▶ dropped
//! ```
//!
//! Every refresh takes a new generation number. Only the response belonging
//! to the latest generation is applied, so overlapping refreshes cannot leave
//! stale data on screen.

mod home;
mod torrents;

pub use home::HomeController;
pub use torrents::{TorrentListController, TIME_ADDED};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::client::{request, ApiTransport, ClientError};
use crate::envelope::EnvelopeStatus;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error(transparent)]
    Request(#[from] ClientError),

    #[error("Unexpected payload: {0}")]
    Bind(String),
}

/// Turns a route's payload into something a view can display.
pub trait Controller: Send + Sync + 'static {
    type Model: Clone + Send + Sync + 'static;

    /// Daemon route this controller posts to.
    fn route(&self) -> &'static str;

    /// Body sent with every request.
    fn request_body(&self) -> Value {
        json!({})
    }

    /// Build the model from a delivered payload.
    fn bind(&self, payload: Value) -> Result<Self::Model, ViewError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Idle,
}

/// State a view renders from.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState<M> {
    pub phase: Phase,
    /// Last successfully bound model; `None` until the first success.
    pub data: Option<M>,
    /// Envelope status of the last applied response, if it had one.
    pub status: Option<EnvelopeStatus>,
}

impl<M> Default for ViewState<M> {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            data: None,
            status: None,
        }
    }
}

/// How a refresh ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The response was bound into the view state.
    Applied,
    /// A newer refresh started before this one finished; its result was dropped.
    Superseded,
}

struct ViewInner<C: Controller> {
    controller: C,
    transport: Arc<dyn ApiTransport>,
    state: RwLock<ViewState<C::Model>>,
    generation: AtomicU64,
}

/// A controller bound to a transport and its own view state.
pub struct View<C: Controller> {
    inner: Arc<ViewInner<C>>,
}

impl<C: Controller> Clone for View<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Controller> View<C> {
    pub fn new(controller: C, transport: Arc<dyn ApiTransport>) -> Self {
        Self {
            inner: Arc::new(ViewInner {
                controller,
                transport,
                state: RwLock::new(ViewState::default()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn controller(&self) -> &C {
        &self.inner.controller
    }

    /// Copy of the current view state.
    pub async fn snapshot(&self) -> ViewState<C::Model> {
        self.inner.state.read().await.clone()
    }

    /// Issue one request and bind the response if it is still current.
    ///
    /// On failure the bound data and status are left untouched.
    pub async fn refresh(&self) -> Result<RefreshOutcome, ViewError> {
        let inner = &self.inner;
        let generation = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        inner.state.write().await.phase = Phase::Loading;

        let route = inner.controller.route();
        let result = request(inner.transport.as_ref(), route, &inner.controller.request_body())
            .await
            .map_err(ViewError::from)
            .and_then(|delivery| {
                let model = inner.controller.bind(delivery.payload)?;
                Ok((model, delivery.status))
            });

        let mut state = inner.state.write().await;
        if inner.generation.load(Ordering::SeqCst) != generation {
            debug!(route, generation, "Discarding superseded response");
            return Ok(RefreshOutcome::Superseded);
        }

        state.phase = Phase::Idle;
        match result {
            Ok((model, status)) => {
                state.data = Some(model);
                state.status = status;
                Ok(RefreshOutcome::Applied)
            }
            Err(e) => {
                warn!(route, error = %e, "Error retrieving JSON data from server");
                Err(e)
            }
        }
    }

    /// A refresh trigger scoped to this view.
    pub fn refresh_handle(&self) -> RefreshHandle<C> {
        RefreshHandle { view: self.clone() }
    }
}

/// Cloneable trigger that refreshes one particular view in the background.
pub struct RefreshHandle<C: Controller> {
    view: View<C>,
}

impl<C: Controller> Clone for RefreshHandle<C> {
    fn clone(&self) -> Self {
        Self {
            view: self.view.clone(),
        }
    }
}

impl<C: Controller> RefreshHandle<C> {
    /// Spawn a refresh on the current tokio runtime.
    pub fn trigger(&self) -> JoinHandle<Result<RefreshOutcome, ViewError>> {
        let view = self.view.clone();
        tokio::spawn(async move { view.refresh().await })
    }
}
