use std::fmt;
use std::sync::Arc;

use futures::{FutureExt, TryFutureExt};
use tracing::debug;

use crate::connection::{ClientTransport, Connection, Transport, read_response, run_timeout_scheduler, write_request};
use crate::protocol::{Attributes, Disposer, ProcessingOptions, QuasiHttpError, Request, Response};

type RequestFn = Box<dyn FnOnce(&Attributes) -> Option<Request> + Send>;

enum PendingRequest {
    Ready(Request),
    /// Built from the connection environment once the connection is
    /// established.
    Deferred(RequestFn),
}

/// Sends one request per connection and returns its response.
///
/// A response read off the connection keeps the connection open until
/// [`Response::release`] is called, so its body can be streamed.
pub struct StandardClient<T> {
    transport: Option<Arc<T>>,
}

impl<T> Default for StandardClient<T> {
    fn default() -> Self {
        Self { transport: None }
    }
}

impl<T> fmt::Debug for StandardClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardClient").field("has_transport", &self.transport.is_some()).finish()
    }
}

impl<T> StandardClient<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport: Some(transport) }
    }

    pub fn transport(&self) -> Option<&Arc<T>> {
        self.transport.as_ref()
    }

    pub fn set_transport(&mut self, transport: Option<Arc<T>>) {
        self.transport = transport;
    }
}

impl<T: ClientTransport + 'static> StandardClient<T> {
    pub async fn send(
        &self,
        endpoint: &T::Endpoint,
        request: Request,
        options: Option<&ProcessingOptions>,
    ) -> Result<Response, QuasiHttpError> {
        self.send_internal(endpoint, PendingRequest::Ready(request), options).await
    }

    /// Like [`send`](Self::send), but builds the request from the
    /// environment of the established connection. Returning `None` fails the
    /// send.
    pub async fn send2<F>(
        &self,
        endpoint: &T::Endpoint,
        request_fn: F,
        options: Option<&ProcessingOptions>,
    ) -> Result<Response, QuasiHttpError>
    where
        F: FnOnce(&Attributes) -> Option<Request> + Send + 'static,
    {
        self.send_internal(endpoint, PendingRequest::Deferred(Box::new(request_fn)), options).await
    }

    async fn send_internal(
        &self,
        endpoint: &T::Endpoint,
        pending: PendingRequest,
        options: Option<&ProcessingOptions>,
    ) -> Result<Response, QuasiHttpError> {
        let transport =
            self.transport.as_ref().map(Arc::clone).ok_or_else(|| QuasiHttpError::missing_dependency("client transport"))?;

        let mut allocated = None;
        match Self::try_send(&transport, endpoint, pending, options, &mut allocated).await {
            Ok(response) => Ok(response),
            Err(e) => {
                if let Some(connection) = allocated
                    && let Err(release_error) = transport.release_connection(&connection, None).await
                {
                    debug!(error = %release_error, "ignoring error while releasing connection after failed send");
                }
                debug!(error = %e, "send failed");
                Err(e.wrap_unless_protocol("encountered error during send request processing"))
            }
        }
    }

    async fn try_send(
        transport: &Arc<T>,
        endpoint: &T::Endpoint,
        pending: PendingRequest,
        options: Option<&ProcessingOptions>,
        allocated: &mut Option<Arc<T::Connection>>,
    ) -> Result<Response, QuasiHttpError> {
        let connection = transport
            .allocate_connection(endpoint, options)
            .await?
            .ok_or_else(|| QuasiHttpError::general("no connection"))?;
        let connection = Arc::new(connection);
        *allocated = Some(Arc::clone(&connection));

        let response = match connection.timeout_scheduler() {
            Some(scheduler) => {
                let procedure = Self::process_send(transport, &connection, pending).map_ok(Some).boxed();
                run_timeout_scheduler(scheduler, true, procedure)
                    .await?
                    .ok_or_else(|| QuasiHttpError::general("no response from timeout scheduler"))?
            }
            None => Self::process_send(transport, &connection, pending).await?,
        };

        transport.release_connection(&connection, Some(&response)).await?;
        debug!(status_code = response.status_code, "send completed");
        Ok(response)
    }

    async fn process_send(
        transport: &Arc<T>,
        connection: &Arc<T::Connection>,
        pending: PendingRequest,
    ) -> Result<Response, QuasiHttpError> {
        transport.establish_connection(connection).await?;

        let mut request = match pending {
            PendingRequest::Ready(request) => request,
            PendingRequest::Deferred(request_fn) => {
                request_fn(connection.environment()).ok_or_else(|| QuasiHttpError::general("no request"))?
            }
        };

        // the whole request goes out before the response is read
        let alt_transport = transport.alt_transport();
        let serialized = match alt_transport {
            Some(alt) => alt.serialize_request(connection, &mut request).await?,
            None => false,
        };
        if !serialized {
            write_request(&mut request, transport.writable_stream(connection), connection.as_ref()).await?;
        }

        if let Some(alt) = alt_transport
            && let Some(response) = alt.deserialize_response(connection).await?
        {
            return Ok(response);
        }

        let mut response = read_response(transport.readable_stream(connection), connection.as_ref()).await?;
        let transport = Arc::clone(transport);
        let connection = Arc::clone(connection);
        response.disposer = Some(Disposer::new(move || {
            async move { transport.release_connection(&connection, None).await }.boxed()
        }));
        Ok(response)
    }
}
