//! Loader and action contract.
//!
//! A loader is any `Fn(LoaderArgs) -> impl Future<Output = LoaderResult>`.
//! It may resolve to data, to a redirect, or to a [`LoaderError`]. Actions
//! share the same shape and run only for mutating [`Submission`]s.
//!
//! ```
//! use data_navigator::{data, redirect, LoaderArgs, Route};
//! use serde_json::json;
//!
//! let route = Route::new("users/:id").loader(|args: LoaderArgs| async move {
//!     match args.params.get("id") {
//!         Some("me") => redirect("/profile"),
//!         Some(id) => data(json!({ "id": id })),
//!         None => unreachable!(),
//!     }
//! });
//! # let _ = route;
//! ```

use crate::error::LoaderError;
use crate::location::Location;
use crate::params::RouteParams;
use crate::route::RouteId;
use futures::future::{self, BoxFuture, Either};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// What a loader or action produced.
#[derive(Debug, Clone, PartialEq)]
pub enum LoaderOutput {
    /// Data for the route
    Data(Value),
    /// Abandon this navigation and navigate to the given path instead
    Redirect(String),
}

impl From<Value> for LoaderOutput {
    fn from(value: Value) -> Self {
        LoaderOutput::Data(value)
    }
}

/// Return type of loaders and actions.
pub type LoaderResult = Result<LoaderOutput, LoaderError>;

/// Resolve a loader with data.
pub fn data(value: impl Into<Value>) -> LoaderResult {
    Ok(LoaderOutput::Data(value.into()))
}

/// Resolve a loader with a redirect.
pub fn redirect(to: impl Into<String>) -> LoaderResult {
    Ok(LoaderOutput::Redirect(to.into()))
}

/// Request method of a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Non-GET methods run the route's action.
    pub fn is_mutation(self) -> bool {
        !matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// A form-style submission: method plus body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub method: Method,
    pub body: Value,
}

impl Submission {
    /// Create a submission.
    pub fn new(method: Method, body: Value) -> Self {
        Self { method, body }
    }

    /// `POST` with the given body.
    pub fn post(body: Value) -> Self {
        Self::new(Method::Post, body)
    }
}

/// Request-equivalent handed to loaders and actions.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Target location of the navigation
    pub location: Location,
    /// `GET` for loaders; the submission method for actions
    pub method: Method,
    /// Submission body (actions only)
    pub body: Option<Value>,
}

/// Arguments passed to every loader and action invocation.
#[derive(Debug, Clone)]
pub struct LoaderArgs {
    /// Id of the route being loaded
    pub route_id: RouteId,
    /// Params accumulated down to this route
    pub params: RouteParams,
    pub request: Request,
    /// Cancelled when the navigation is superseded or redirected.
    ///
    /// Advisory: results of superseded navigations are discarded whether or
    /// not the loader stops early.
    pub signal: CancellationToken,
}

impl LoaderArgs {
    /// Resolve with [`LoaderError::Cancelled`] once the signal fires, or with
    /// `fut`'s output if it finishes first.
    pub async fn or_cancelled<F>(&self, fut: F) -> LoaderResult
    where
        F: Future<Output = LoaderResult>,
    {
        let cancelled = Box::pin(self.signal.cancelled());
        match future::select(cancelled, Box::pin(fut)).await {
            Either::Left(((), _)) => Err(LoaderError::Cancelled),
            Either::Right((result, _)) => result,
        }
    }
}

/// Type-erased loader or action.
pub(crate) type Handler = Arc<dyn Fn(LoaderArgs) -> BoxFuture<'static, LoaderResult> + Send + Sync>;

pub(crate) fn boxed_handler<F, Fut>(f: F) -> Handler
where
    F: Fn(LoaderArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = LoaderResult> + Send + 'static,
{
    Arc::new(move |args| f(args).boxed())
}

/// Call a handler, turning panics (at call time or while polled) into
/// [`LoaderError::Panicked`].
pub(crate) fn invoke(handler: &Handler, args: LoaderArgs) -> BoxFuture<'static, LoaderResult> {
    match std::panic::catch_unwind(AssertUnwindSafe(|| handler(args))) {
        Ok(fut) => AssertUnwindSafe(fut)
            .catch_unwind()
            .map(|outcome| outcome.unwrap_or_else(|payload| Err(panicked(&*payload))))
            .boxed(),
        Err(payload) => future::ready(Err(panicked(&*payload))).boxed(),
    }
}

fn panicked(payload: &(dyn Any + Send)) -> LoaderError {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    LoaderError::Panicked { message }
}
