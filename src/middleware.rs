//! Service seam around the dispatcher.
//!
//! Hosts embed the engine through [`Service`]: a [`Dispatcher`] is a service
//! turning a [`RequestContext`] into a [`Response`], and [`Transform`]
//! implementations wrap it with cross-cutting behaviour. Middleware reaches
//! the wrapped service through [`Next`].

use std::{sync::Arc, time::Instant};

use async_trait::async_trait;

use crate::{
    dispatch::Dispatcher,
    error::{DispatchError, RenderError},
    request::{RequestContext, Response},
};

/// Continuation used by middleware to call the next service in the chain.
pub struct Next<'a, S>
where
    S: Service + ?Sized,
{
    service: &'a S,
}

impl<'a, S> Next<'a, S>
where
    S: Service + ?Sized,
{
    /// Wrap a reference to `service`.
    pub const fn new(service: &'a S) -> Self { Self { service } }

    /// Call the next service with `ctx`.
    ///
    /// # Errors
    ///
    /// Propagates the wrapped service's error.
    pub async fn call(&self, ctx: &RequestContext) -> Result<Response, S::Error> {
        self.service.call(ctx).await
    }
}

/// Asynchronous request handler.
#[async_trait]
pub trait Service: Send + Sync {
    /// Error type returned by the service.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Produce a response for `ctx`.
    async fn call(&self, ctx: &RequestContext) -> Result<Response, Self::Error>;
}

/// Factory wrapping a service with middleware.
#[async_trait]
pub trait Transform<S>: Send + Sync
where
    S: Service + 'static,
{
    /// Wrapped service produced by the middleware.
    type Output: Service;

    /// Wrap `service`.
    async fn transform(&self, service: S) -> Self::Output;
}

#[async_trait]
impl Service for Dispatcher {
    type Error = DispatchError;

    async fn call(&self, ctx: &RequestContext) -> Result<Response, DispatchError> {
        let outcome = self.dispatch(ctx).await?;
        Ok(outcome.into_response(self.config()))
    }
}

#[async_trait]
impl<S: Service + ?Sized> Service for Arc<S> {
    type Error = S::Error;

    async fn call(&self, ctx: &RequestContext) -> Result<Response, S::Error> {
        (**self).call(ctx).await
    }
}

/// Service answering dispatch errors with a `500` instead of failing.
///
/// Documentation rendering failures name the failing step's position and
/// type. Every other error gets a generic message. Scenario names never
/// reach the body; the full error is logged.
pub struct Recover<S> {
    inner: S,
}

impl<S> Recover<S> {
    /// Wrap `inner`.
    pub const fn new(inner: S) -> Self { Self { inner } }
}

#[async_trait]
impl<S: Service> Service for Recover<S> {
    type Error = std::convert::Infallible;

    async fn call(&self, ctx: &RequestContext) -> Result<Response, Self::Error> {
        match Next::new(&self.inner).call(ctx).await {
            Ok(response) => Ok(response),
            Err(error) => {
                tracing::error!(method = ctx.method(), path = ctx.path(), %error, "dispatch failed");
                Ok(Response::internal_error(&public_message(&error)))
            }
        }
    }
}

fn public_message(error: &(dyn std::error::Error + 'static)) -> String {
    match error.downcast_ref::<DispatchError>() {
        Some(DispatchError::Render(RenderError::Step {
            position,
            step_type,
            ..
        })) => format!("cannot render step {position} ({step_type})"),
        _ => "Internal Server Error".to_owned(),
    }
}

/// Middleware logging each request with its status and latency.
#[derive(Clone, Copy, Debug, Default)]
pub struct TraceRequests;

/// Service produced by [`TraceRequests`].
pub struct Traced<S> {
    inner: S,
}

#[async_trait]
impl<S> Transform<S> for TraceRequests
where
    S: Service + 'static,
{
    type Output = Traced<S>;

    async fn transform(&self, service: S) -> Self::Output { Traced { inner: service } }
}

#[async_trait]
impl<S: Service> Service for Traced<S> {
    type Error = S::Error;

    async fn call(&self, ctx: &RequestContext) -> Result<Response, S::Error> {
        let started = Instant::now();
        let result = Next::new(&self.inner).call(ctx).await;
        let elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        match &result {
            Ok(response) => tracing::info!(
                method = ctx.method(),
                path = ctx.path(),
                status = response.status(),
                elapsed_us,
                "request served"
            ),
            Err(error) => tracing::warn!(
                method = ctx.method(),
                path = ctx.path(),
                %error,
                elapsed_us,
                "request failed"
            ),
        }
        result
    }
}
