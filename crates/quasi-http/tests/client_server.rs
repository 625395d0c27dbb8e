use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::FutureExt;
use quasi_http::connection::{
    AltTransport, ClientTransport, Connection, ServerTransport, TimeoutScheduler, TokioTimeoutScheduler, Transport,
};
use quasi_http::handler::make_application;
use quasi_http::io::{PushbackReader, SharedWriter};
use quasi_http::protocol::{
    Attributes, Disposer, Headers, ProcessingOptions, QuasiHttpError, ReasonCode, Request, Response,
};
use quasi_http::{StandardClient, StandardServer};
use tokio::io::AsyncWrite;

const ENDPOINT: &str = "memory";

#[derive(Default)]
struct MemoryConnection {
    reader: Option<PushbackReader>,
    writer: Option<SharedWriter>,
    options: Option<ProcessingOptions>,
    scheduler: Option<TokioTimeoutScheduler>,
    environment: Attributes,
}

impl Connection for MemoryConnection {
    fn processing_options(&self) -> Option<&ProcessingOptions> {
        self.options.as_ref()
    }

    fn timeout_scheduler(&self) -> Option<&dyn TimeoutScheduler> {
        self.scheduler.as_ref().map(|s| s as &dyn TimeoutScheduler)
    }

    fn environment(&self) -> &Attributes {
        &self.environment
    }
}

/// Alternative serialization used to cut exchanges short on one side.
#[derive(Default)]
struct Shortcuts {
    dummy_response: bool,
    swallow_response: bool,
}

#[async_trait]
impl AltTransport<MemoryConnection> for Shortcuts {
    async fn serialize_response(
        &self,
        _connection: &MemoryConnection,
        _response: &mut Response,
    ) -> Result<bool, QuasiHttpError> {
        Ok(self.swallow_response)
    }

    async fn deserialize_response(&self, _connection: &MemoryConnection) -> Result<Option<Response>, QuasiHttpError> {
        Ok(self.dummy_response.then(|| Response::new().with_status_code(299)))
    }
}

#[derive(Default)]
struct MemoryClientTransport {
    connection: Mutex<Option<MemoryConnection>>,
    shortcuts: Option<Shortcuts>,
    fail_establish: bool,
    /// Status code of the response passed to each release, if any.
    releases: Mutex<Vec<Option<i32>>>,
}

impl MemoryClientTransport {
    fn with_connection(connection: MemoryConnection) -> Self {
        Self { connection: Mutex::new(Some(connection)), ..Default::default() }
    }

    fn releases(&self) -> Vec<Option<i32>> {
        self.releases.lock().unwrap().clone()
    }
}

impl Transport for MemoryClientTransport {
    type Connection = MemoryConnection;

    fn readable_stream(&self, connection: &MemoryConnection) -> Option<PushbackReader> {
        connection.reader.clone()
    }

    fn writable_stream(&self, connection: &MemoryConnection) -> Option<SharedWriter> {
        connection.writer.clone()
    }

    fn alt_transport(&self) -> Option<&dyn AltTransport<MemoryConnection>> {
        self.shortcuts.as_ref().map(|s| s as &dyn AltTransport<MemoryConnection>)
    }
}

#[async_trait]
impl ClientTransport for MemoryClientTransport {
    type Endpoint = &'static str;

    async fn allocate_connection(
        &self,
        endpoint: &&'static str,
        options: Option<&ProcessingOptions>,
    ) -> Result<Option<MemoryConnection>, QuasiHttpError> {
        assert_eq!(*endpoint, ENDPOINT);
        let connection = self.connection.lock().unwrap().take();
        Ok(connection.map(|mut connection| {
            connection.options = ProcessingOptions::merge(options, connection.options.as_ref());
            connection
        }))
    }

    async fn establish_connection(&self, _connection: &MemoryConnection) -> Result<(), QuasiHttpError> {
        if self.fail_establish {
            return Err(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused").into());
        }
        Ok(())
    }

    async fn release_connection(
        &self,
        _connection: &MemoryConnection,
        response: Option<&Response>,
    ) -> Result<(), QuasiHttpError> {
        self.releases.lock().unwrap().push(response.map(|r| r.status_code));
        Ok(())
    }
}

#[derive(Default)]
struct MemoryServerTransport {
    shortcuts: Option<Shortcuts>,
    releases: Mutex<usize>,
}

impl Transport for MemoryServerTransport {
    type Connection = MemoryConnection;

    fn readable_stream(&self, connection: &MemoryConnection) -> Option<PushbackReader> {
        connection.reader.clone()
    }

    fn writable_stream(&self, connection: &MemoryConnection) -> Option<SharedWriter> {
        connection.writer.clone()
    }

    fn alt_transport(&self) -> Option<&dyn AltTransport<MemoryConnection>> {
        self.shortcuts.as_ref().map(|s| s as &dyn AltTransport<MemoryConnection>)
    }
}

#[async_trait]
impl ServerTransport for MemoryServerTransport {
    async fn release_connection(&self, connection: &MemoryConnection) -> Result<(), QuasiHttpError> {
        *self.releases.lock().unwrap() += 1;
        if let Some(writer) = &connection.writer {
            writer.shutdown().await?;
        }
        Ok(())
    }
}

/// Collects everything written to it in a buffer the test can inspect.
#[derive(Clone, Default)]
struct Sink(Arc<Mutex<Vec<u8>>>);

impl Sink {
    fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

impl AsyncWrite for Sink {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<std::io::Result<usize>> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// A writer whose every write fails.
struct BrokenWriter;

impl AsyncWrite for BrokenWriter {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, _buf: &[u8]) -> Poll<std::io::Result<usize>> {
        Poll::Ready(Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "peer went away")))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// A client whose request lands in a [`Sink`] and whose response is faked.
fn sink_client(options: Option<ProcessingOptions>) -> (StandardClient<MemoryClientTransport>, Sink) {
    let sink = Sink::default();
    let connection = MemoryConnection { writer: Some(SharedWriter::new(sink.clone())), options, ..Default::default() };
    let transport = MemoryClientTransport {
        shortcuts: Some(Shortcuts { dummy_response: true, ..Default::default() }),
        ..MemoryClientTransport::with_connection(connection)
    };
    (StandardClient::new(Arc::new(transport)), sink)
}

#[derive(Debug, Default, PartialEq)]
struct SeenRequest {
    method: String,
    target: String,
    http_version: String,
    content_length: i64,
    headers: Headers,
    body: Option<Bytes>,
    connection_id: Option<u32>,
}

/// Sends `request` through a client, then accepts the written bytes on a
/// server, delivering them in chunks of `split` bytes.
async fn round_trip(request: Request, split: usize) -> (Vec<u8>, SeenRequest) {
    let (client, sink) = sink_client(None);
    let response = client.send(&ENDPOINT, request, None).await.unwrap();
    assert_eq!(response.status_code, 299);
    let written = sink.contents();

    let seen = Arc::new(Mutex::new(None));
    let application = {
        let seen = Arc::clone(&seen);
        make_application(move |mut request: Request| {
            let seen = Arc::clone(&seen);
            async move {
                let body = match request.body.as_mut() {
                    Some(body) => Some(body.read_to_end().await?),
                    None => None,
                };
                *seen.lock().unwrap() = Some(SeenRequest {
                    method: request.method,
                    target: request.target,
                    http_version: request.http_version,
                    content_length: request.content_length,
                    headers: request.headers,
                    body,
                    connection_id: request.environment.get::<u32>("id").copied(),
                });
                Ok::<_, QuasiHttpError>(Some(Response::new()))
            }
        })
    };
    let transport = MemoryServerTransport {
        shortcuts: Some(Shortcuts { swallow_response: true, ..Default::default() }),
        ..Default::default()
    };
    let server = StandardServer::new(Arc::new(transport), Arc::new(application));
    let connection = MemoryConnection {
        reader: Some(PushbackReader::from_chunks(
            written.chunks(split).map(Bytes::copy_from_slice).collect::<Vec<_>>(),
        )),
        environment: Attributes::new().with("id", 7u32),
        ..Default::default()
    };
    server.accept_connection(&connection).await.unwrap();
    assert_eq!(*server.transport().unwrap().releases.lock().unwrap(), 1);

    let seen = seen.lock().unwrap().take().unwrap();
    (written, seen)
}

#[tokio::test]
async fn test_request_serialization_with_raw_body() {
    let request = || {
        Request::new()
            .with_method("GET")
            .with_target("/")
            .with_http_version("HTTP/1.0")
            .with_content_length(6)
            .with_headers(
                Headers::new()
                    .with("Accept", ["text/plain", "text/csv"])
                    .with("Content-Type", ["application/json,charset=UTF-8"]),
            )
            .with_body("tanner")
    };
    let expected = [
        &b"hdrs\x00\x00\x00\x5a"[..],
        b"GET,/,HTTP/1.0,6\nAccept,text/plain,text/csv\nContent-Type,\"application/json,charset=UTF-8\"\n",
        b"tanner",
    ]
    .concat();

    for split in [1, 4, 1000] {
        let (written, seen) = round_trip(request(), split).await;
        assert_eq!(written, expected);
        assert_eq!(
            seen,
            SeenRequest {
                method: "GET".into(),
                target: "/".into(),
                http_version: "HTTP/1.0".into(),
                content_length: 6,
                headers: Headers::new()
                    .with("accept", ["text/plain", "text/csv"])
                    .with("content-type", ["application/json,charset=UTF-8"]),
                body: Some(Bytes::from_static(b"tanner")),
                connection_id: Some(7),
            }
        );
    }
}

#[tokio::test]
async fn test_request_serialization_of_empty_request() {
    let (written, seen) = round_trip(Request::new(), 3).await;
    assert_eq!(written, b"hdrs\x00\x00\x00\x0b\"\",\"\",\"\",0\n");
    assert_eq!(seen, SeenRequest { connection_id: Some(7), ..Default::default() });
}

#[tokio::test]
async fn test_request_serialization_with_chunked_body() {
    let request = Request::new()
        .with_method("POST")
        .with_target("/upload")
        .with_http_version("HTTP/1.1")
        .with_content_length(-1)
        .with_body(&b"\x08\x07\x08\x09"[..]);
    let (written, seen) = round_trip(request, 2).await;

    let expected = [
        &b"hdrs\x00\x00\x00\x19POST,/upload,HTTP/1.1,-1\n"[..],
        b"bdta\x00\x00\x00\x04\x08\x07\x08\x09",
        b"bdta\x00\x00\x00\x00",
    ]
    .concat();
    assert_eq!(written, expected);
    assert_eq!(seen.content_length, -1);
    assert_eq!(seen.body, Some(Bytes::from_static(b"\x08\x07\x08\x09")));
}

#[tokio::test]
async fn test_request_serialization_with_options() {
    let cases: Vec<(Request, Option<ProcessingOptions>, Option<ProcessingOptions>, Vec<u8>)> = vec![
        (
            Request::new().with_method("POST").with_target("/Update").with_content_length(8),
            Some(ProcessingOptions::new().with_max_headers_size(18)),
            None,
            b"hdrs\x00\x00\x00\x12POST,/Update,\"\",8\n".to_vec(),
        ),
        (
            Request::new().with_method("PUT").with_target("/Updates").with_body(&b"\x04"[..]),
            None,
            Some(ProcessingOptions::new().with_max_headers_size(19)),
            [&b"hdrs\x00\x00\x00\x12PUT,/Updates,\"\",0\n"[..], b"bdta\x00\x00\x00\x01\x04", b"bdta\x00\x00\x00\x00"]
                .concat(),
        ),
        (
            Request::new().with_content_length(10).with_body(&b"\x04\x05\x06"[..]),
            None,
            None,
            b"hdrs\x00\x00\x00\x0c\"\",\"\",\"\",10\n\x04\x05\x06".to_vec(),
        ),
    ];

    for (request, send_options, connection_options, expected) in cases {
        let (client, sink) = sink_client(connection_options);
        client.send(&ENDPOINT, request, send_options.as_ref()).await.unwrap();
        assert_eq!(sink.contents(), expected);
    }
}

#[tokio::test]
async fn test_request_serialization_errors() {
    let (client, _sink) = sink_client(None);
    let options = ProcessingOptions::new().with_max_headers_size(5);
    let err = client.send(&ENDPOINT, Request::new(), Some(&options)).await.unwrap_err();
    assert_eq!(err.reason(), Some(ReasonCode::MESSAGE_LENGTH_LIMIT_EXCEEDED));
    assert!(err.to_string().contains("quasi http headers exceed max size"), "{err}");

    let (client, _sink) = sink_client(None);
    let request = Request::new()
        .with_http_version("no-spaces-allowed")
        .with_headers(Headers::new().with("empty-prohibited", ["a: \nb"]));
    let err = client.send(&ENDPOINT, request, None).await.unwrap_err();
    assert_eq!(err.reason(), Some(ReasonCode::PROTOCOL_VIOLATION));
    assert!(err.to_string().contains("quasi http header value contains newlines"), "{err}");
}

#[tokio::test]
async fn test_client_server_exchange_over_duplex_streams() {
    let (client_out, server_in) = tokio::io::duplex(64 * 1024);
    let (server_out, client_in) = tokio::io::duplex(64 * 1024);

    let application = make_application(|mut request: Request| async move {
        let body = match request.body.as_mut() {
            Some(body) => body.read_to_end().await?,
            None => Bytes::new(),
        };
        let reply = format!("{} {} received {} bytes", request.method, request.target, body.len());
        let response = Response::new()
            .with_status_code(200)
            .with_http_status_message("OK")
            .with_http_version("HTTP/1.1")
            .with_content_length(-1)
            .with_headers(Headers::new().with("x-echo", [String::from_utf8_lossy(&body).into_owned()]))
            .with_body(reply);
        Ok::<_, QuasiHttpError>(Some(response))
    });
    let server = Arc::new(StandardServer::new(Arc::new(MemoryServerTransport::default()), Arc::new(application)));
    let server_connection = MemoryConnection {
        reader: Some(PushbackReader::from_async_read(server_in)),
        writer: Some(SharedWriter::new(server_out)),
        ..Default::default()
    };
    let serving = tokio::spawn({
        let server = Arc::clone(&server);
        async move { server.accept_connection(&server_connection).await }
    });

    let transport = Arc::new(MemoryClientTransport::with_connection(MemoryConnection {
        reader: Some(PushbackReader::from_async_read(client_in)),
        writer: Some(SharedWriter::new(client_out)),
        ..Default::default()
    }));
    let client = StandardClient::new(Arc::clone(&transport));
    let request = Request::new().with_method("PUT").with_target("/notes").with_content_length(5).with_body("hello");
    let mut response = client.send(&ENDPOINT, request, None).await.unwrap();

    assert_eq!(response.status_code, 200);
    assert_eq!(response.http_status_message, "OK");
    assert_eq!(response.content_length, -1);
    assert_eq!(response.headers.first("x-echo"), Some("hello"));
    assert_eq!(response.body.as_mut().unwrap().read_to_end().await.unwrap(), "PUT /notes received 5 bytes");
    assert_eq!(transport.releases(), [Some(200)]);

    response.release().await.unwrap();
    assert_eq!(transport.releases(), [Some(200), None]);
    // a second release is a no-op
    response.release().await.unwrap();
    assert_eq!(transport.releases().len(), 2);

    serving.await.unwrap().unwrap();
    assert_eq!(*server.transport().unwrap().releases.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_response_body_size_limit() {
    let response_bytes = Bytes::from_static(b"hdrs\x00\x00\x00\x12HTTP/1.1,200,OK,2\nab");
    let connection = MemoryConnection {
        reader: Some(PushbackReader::from_chunks([response_bytes])),
        writer: Some(SharedWriter::new(Sink::default())),
        ..Default::default()
    };
    let client = StandardClient::new(Arc::new(MemoryClientTransport::with_connection(connection)));
    let options = ProcessingOptions::new().with_max_response_body_size(1);
    let mut response = client.send(&ENDPOINT, Request::new(), Some(&options)).await.unwrap();
    assert!(response.body.as_mut().unwrap().read_to_end().await.is_err());
}

#[tokio::test]
async fn test_send_timeout() {
    // keep the peer half alive so reads never end
    let (_peer, client_in) = tokio::io::duplex(64);
    let connection = MemoryConnection {
        reader: Some(PushbackReader::from_async_read(client_in)),
        writer: Some(SharedWriter::new(Sink::default())),
        scheduler: Some(TokioTimeoutScheduler::new(Duration::from_millis(50))),
        ..Default::default()
    };
    let transport = Arc::new(MemoryClientTransport::with_connection(connection));
    let client = StandardClient::new(Arc::clone(&transport));

    let err = client.send(&ENDPOINT, Request::new(), None).await.unwrap_err();
    assert_eq!(err.reason(), Some(ReasonCode::TIMEOUT));
    assert_eq!(err.to_string(), "send timeout");
    assert_eq!(transport.releases(), [None]);
}

#[tokio::test]
async fn test_receive_timeout() {
    let (_peer, server_in) = tokio::io::duplex(64);
    let connection = MemoryConnection {
        reader: Some(PushbackReader::from_async_read(server_in)),
        writer: Some(SharedWriter::new(Sink::default())),
        scheduler: TokioTimeoutScheduler::from_millis(50),
        ..Default::default()
    };
    let application = make_application(|_request: Request| async { Ok::<_, QuasiHttpError>(Some(Response::new())) });
    let server = StandardServer::new(Arc::new(MemoryServerTransport::default()), Arc::new(application));

    let err = server.accept_connection(&connection).await.unwrap_err();
    assert_eq!(err.reason(), Some(ReasonCode::TIMEOUT));
    assert_eq!(err.to_string(), "receive timeout");
    assert_eq!(*server.transport().unwrap().releases.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_missing_dependencies() {
    let client = StandardClient::<MemoryClientTransport>::default();
    let err = client.send(&ENDPOINT, Request::new(), None).await.unwrap_err();
    assert_eq!(err.to_string(), "missing dependency: client transport");

    let application = make_application(|_request: Request| async { Ok::<_, QuasiHttpError>(None) });
    let mut server = StandardServer::<MemoryServerTransport, _>::default();
    server.set_application(Some(Arc::new(application)));
    let err = server.accept_connection(&MemoryConnection::default()).await.unwrap_err();
    assert_eq!(err.to_string(), "missing dependency: server transport");

    server.set_transport(Some(Arc::new(MemoryServerTransport::default())));
    server.set_application(None);
    let err = server.accept_connection(&MemoryConnection::default()).await.unwrap_err();
    assert_eq!(err.to_string(), "missing dependency: server application");
}

#[tokio::test]
async fn test_no_connection() {
    let client = StandardClient::new(Arc::new(MemoryClientTransport::default()));
    let err = client.send(&ENDPOINT, Request::new(), None).await.unwrap_err();
    assert_eq!(err.reason(), Some(ReasonCode::GENERAL));
    assert_eq!(err.to_string(), "no connection");
}

#[tokio::test]
async fn test_send2_builds_request_from_connection_environment() {
    let sink = Sink::default();
    let connection = MemoryConnection {
        writer: Some(SharedWriter::new(sink.clone())),
        environment: Attributes::new().with("target", "/from-env"),
        ..Default::default()
    };
    let transport = MemoryClientTransport {
        shortcuts: Some(Shortcuts { dummy_response: true, ..Default::default() }),
        ..MemoryClientTransport::with_connection(connection)
    };
    let client = StandardClient::new(Arc::new(transport));

    let response = client
        .send2(
            &ENDPOINT,
            |environment: &Attributes| {
                let target = environment.get::<&str>("target").copied()?;
                Some(Request::new().with_method("GET").with_target(target))
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(response.status_code, 299);
    assert!(sink.contents().ends_with(b"GET,/from-env,\"\",0\n"));
}

#[tokio::test]
async fn test_send2_without_request() {
    let (client, sink) = sink_client(None);
    let err = client.send2(&ENDPOINT, |_: &Attributes| None, None).await.unwrap_err();
    assert_eq!(err.reason(), Some(ReasonCode::GENERAL));
    assert_eq!(err.to_string(), "no request");
    assert!(sink.contents().is_empty());
    assert_eq!(client.transport().unwrap().releases(), [None]);
}

#[tokio::test]
async fn test_non_protocol_errors_are_wrapped() {
    let transport = MemoryClientTransport {
        fail_establish: true,
        ..MemoryClientTransport::with_connection(MemoryConnection::default())
    };
    let client = StandardClient::new(Arc::new(transport));
    let err = client.send(&ENDPOINT, Request::new(), None).await.unwrap_err();
    assert_eq!(err.reason(), Some(ReasonCode::GENERAL));
    assert_eq!(err.to_string(), "encountered error during send request processing");
    let source = std::error::Error::source(&err).unwrap();
    assert!(source.to_string().contains("refused"), "{source}");
    assert_eq!(client.transport().unwrap().releases(), [None]);
}

#[tokio::test]
async fn test_application_without_response() {
    let connection = MemoryConnection {
        reader: Some(PushbackReader::from_chunks([Bytes::from_static(b"hdrs\x00\x00\x00\x0b\"\",\"\",\"\",0\n")])),
        writer: Some(SharedWriter::new(Sink::default())),
        ..Default::default()
    };
    let application = make_application(|_request: Request| async { Ok::<_, QuasiHttpError>(None) });
    let server = StandardServer::new(Arc::new(MemoryServerTransport::default()), Arc::new(application));

    let err = server.accept_connection(&connection).await.unwrap_err();
    assert_eq!(err.reason(), Some(ReasonCode::GENERAL));
    assert_eq!(err.to_string(), "no response");
    assert_eq!(*server.transport().unwrap().releases.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_application_errors_are_wrapped() {
    let connection = MemoryConnection {
        reader: Some(PushbackReader::from_chunks([Bytes::from_static(b"hdrs\x00\x00\x00\x0b\"\",\"\",\"\",0\n")])),
        writer: Some(SharedWriter::new(Sink::default())),
        ..Default::default()
    };
    let application = make_application(|_request: Request| async { Err::<Option<Response>, _>("database is down") });
    let server = StandardServer::new(Arc::new(MemoryServerTransport::default()), Arc::new(application));

    let err = server.accept_connection(&connection).await.unwrap_err();
    assert_eq!(err.reason(), Some(ReasonCode::GENERAL));
    assert_eq!(err.to_string(), "encountered error during receive request processing");
    assert_eq!(std::error::Error::source(&err).unwrap().to_string(), "database is down");
}

#[tokio::test]
async fn test_response_released_when_write_fails() {
    let connection = MemoryConnection {
        reader: Some(PushbackReader::from_chunks([Bytes::from_static(b"hdrs\x00\x00\x00\x0b\"\",\"\",\"\",0\n")])),
        writer: Some(SharedWriter::new(BrokenWriter)),
        ..Default::default()
    };
    let disposals = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&disposals);
    let application = make_application(move |_request: Request| {
        let counter = Arc::clone(&counter);
        async move {
            let disposer = Disposer::new(move || {
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
                .boxed()
            });
            Ok::<_, QuasiHttpError>(Some(Response::new().with_status_code(200).with_disposer(disposer)))
        }
    });
    let server = StandardServer::new(Arc::new(MemoryServerTransport::default()), Arc::new(application));

    let err = server.accept_connection(&connection).await.unwrap_err();
    assert_eq!(err.reason(), Some(ReasonCode::GENERAL));
    assert_eq!(err.to_string(), "encountered error during receive request processing");
    assert!(std::error::Error::source(&err).unwrap().to_string().contains("peer went away"));
    assert_eq!(disposals.load(Ordering::SeqCst), 1);
    assert_eq!(*server.transport().unwrap().releases.lock().unwrap(), 1);
}
