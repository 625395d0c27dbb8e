use std::fmt;
use std::sync::Arc;

use futures::{FutureExt, TryFutureExt};
use tracing::debug;

use crate::connection::{
    AltTransport, Connection, ServerTransport, Transport, read_request, run_timeout_scheduler, write_response,
};
use crate::handler::Application;
use crate::protocol::{QuasiHttpError, Response};

/// Reads one request off each accepted connection, hands it to an
/// [`Application`] and writes back the response.
pub struct StandardServer<T, A> {
    transport: Option<Arc<T>>,
    application: Option<Arc<A>>,
}

impl<T, A> Default for StandardServer<T, A> {
    fn default() -> Self {
        Self { transport: None, application: None }
    }
}

impl<T, A> fmt::Debug for StandardServer<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardServer")
            .field("has_transport", &self.transport.is_some())
            .field("has_application", &self.application.is_some())
            .finish()
    }
}

impl<T, A> StandardServer<T, A> {
    pub fn new(transport: Arc<T>, application: Arc<A>) -> Self {
        Self { transport: Some(transport), application: Some(application) }
    }

    pub fn transport(&self) -> Option<&Arc<T>> {
        self.transport.as_ref()
    }

    pub fn set_transport(&mut self, transport: Option<Arc<T>>) {
        self.transport = transport;
    }

    pub fn application(&self) -> Option<&Arc<A>> {
        self.application.as_ref()
    }

    pub fn set_application(&mut self, application: Option<Arc<A>>) {
        self.application = application;
    }
}

impl<T, A> StandardServer<T, A>
where
    T: ServerTransport,
    A: Application,
{
    /// Serves the single exchange carried by `connection`, then releases
    /// the connection whatever the outcome.
    pub async fn accept_connection(&self, connection: &T::Connection) -> Result<(), QuasiHttpError> {
        let transport = self.transport.as_deref().ok_or_else(|| QuasiHttpError::missing_dependency("server transport"))?;
        let application =
            self.application.as_deref().ok_or_else(|| QuasiHttpError::missing_dependency("server application"))?;

        let outcome = match connection.timeout_scheduler() {
            Some(scheduler) => {
                let procedure = Self::process_accept(application, transport, connection).map_ok(|()| None).boxed();
                run_timeout_scheduler(scheduler, false, procedure).await.map(|_| ())
            }
            None => Self::process_accept(application, transport, connection).await,
        };
        let released = transport.release_connection(connection).await;

        let result = match (outcome, released) {
            (Ok(()), released) => released,
            (Err(e), released) => {
                if let Err(release_error) = released {
                    debug!(error = %release_error, "ignoring error while releasing connection after failed accept");
                }
                Err(e)
            }
        };
        result.map_err(|e| {
            debug!(error = %e, "accept failed");
            e.wrap_unless_protocol("encountered error during receive request processing")
        })
    }

    async fn process_accept(application: &A, transport: &T, connection: &T::Connection) -> Result<(), QuasiHttpError> {
        let alt_transport = transport.alt_transport();
        let request = match alt_transport {
            Some(alt) => alt.deserialize_request(connection).await?,
            None => None,
        };
        let request = match request {
            Some(request) => request,
            None => read_request(transport.readable_stream(connection), connection).await?,
        };
        debug!(method = %request.method, target = %request.target, "received request");

        let mut response = application
            .process_request(request)
            .await
            .map_err(|e| QuasiHttpError::from_boxed(e.into()))?
            .ok_or_else(|| QuasiHttpError::general("no response"))?;

        let written = Self::send_response(transport, alt_transport, connection, &mut response).await;
        let released = response.release().await;
        written?;
        released
    }

    async fn send_response(
        transport: &T,
        alt_transport: Option<&dyn AltTransport<T::Connection>>,
        connection: &T::Connection,
        response: &mut Response,
    ) -> Result<(), QuasiHttpError> {
        let serialized = match alt_transport {
            Some(alt) => alt.serialize_response(connection, response).await?,
            None => false,
        };
        if !serialized {
            write_response(response, transport.writable_stream(connection), connection).await?;
        }
        Ok(())
    }
}
