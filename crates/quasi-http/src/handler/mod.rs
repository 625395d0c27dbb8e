//! Server applications.
//!
//! An [`Application`] turns a [`Request`] into an optional [`Response`].
//! Plain async functions become applications through [`make_application`].

use std::future::Future;

use async_trait::async_trait;

use crate::protocol::{BoxError, Request, Response};

#[async_trait]
pub trait Application: Send + Sync {
    type Error: Into<BoxError>;

    /// `Ok(None)` fails the exchange with a "no response" error.
    async fn process_request(&self, request: Request) -> Result<Option<Response>, Self::Error>;
}

#[derive(Debug)]
pub struct ApplicationFn<F> {
    f: F,
}

#[async_trait]
impl<Err, F, Fut> Application for ApplicationFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Err: Into<BoxError>,
    Fut: Future<Output = Result<Option<Response>, Err>> + Send,
{
    type Error = Err;

    async fn process_request(&self, request: Request) -> Result<Option<Response>, Self::Error> {
        (self.f)(request).await
    }
}

pub fn make_application<F, Err, Ret>(f: F) -> ApplicationFn<F>
where
    Err: Into<BoxError>,
    Ret: Future<Output = Result<Option<Response>, Err>>,
    F: Fn(Request) -> Ret,
{
    ApplicationFn { f }
}
