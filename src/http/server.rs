/*!
A minimal HTTP/1.1 server: accepts connections on a `TcpListener`, parses one request at a time,
dispatches it to a [`Handler`], and honours keep-alive until the peer (or the handler) asks for
`Connection: close` or a 30 s idle timeout elapses (§4.2).
*/

use crate::error::Error;
use crate::http::message::{Request, Response};
use std::io::{BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// ------------------------------------------------------------------------------------------------
// Public Values
// ------------------------------------------------------------------------------------------------

pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

/// Implemented by whatever routes requests to descriptions, SOAP dispatch, or GENA endpoints.
/// Invoked on a worker thread, never holding any registry lock (§5's reentrancy rule).
pub trait Handler: Send + Sync {
    fn handle(&self, request: &Request) -> Response;
}

#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    exiting: Arc<AtomicBool>,
}

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

impl Server {
    /// Binds to `addr` (port 0 picks an ephemeral port, per §4.8's default). Returns the server
    /// and the bound local address so the caller can advertise it in `LOCATION`.
    pub fn bind(addr: &str) -> Result<(Self, std::net::SocketAddr), Error> {
        let listener = TcpListener::bind(addr)?;
        let local_addr = listener.local_addr()?;
        Ok((
            Server {
                listener,
                exiting: Arc::new(AtomicBool::new(false)),
            },
            local_addr,
        ))
    }

    /// Spawns the accept loop on its own thread, dispatching each connection to its own worker
    /// thread. Returns immediately; call [`Server::shutdown`] to stop the accept loop.
    pub fn serve<H: Handler + 'static>(&self, handler: Arc<H>) -> Result<(), Error> {
        let listener = self.listener.try_clone()?;
        let exiting = self.exiting.clone();
        thread::Builder::new()
            .name("upnp-http-accept".into())
            .spawn(move || {
                for stream in listener.incoming() {
                    if exiting.load(Ordering::SeqCst) {
                        break;
                    }
                    match stream {
                        Ok(stream) => {
                            let handler = handler.clone();
                            let exiting = exiting.clone();
                            thread::spawn(move || {
                                if let Err(e) = serve_connection(stream, handler.as_ref(), &exiting) {
                                    debug!("connection handler exited: {}", e);
                                }
                            });
                        }
                        Err(e) => {
                            debug!("accept failed: {}", e);
                        }
                    }
                }
            })?;
        Ok(())
    }

    /// Marks the server as shutting down; the accept loop observes this on its next wakeup and
    /// returns. Per §4.8, in-flight connections are allowed to drain up to their own deadlines.
    pub fn shutdown(&self) {
        self.exiting.store(true, Ordering::SeqCst);
    }
}

// ------------------------------------------------------------------------------------------------
// Private Functions
// ------------------------------------------------------------------------------------------------

fn serve_connection(
    stream: TcpStream,
    handler: &dyn Handler,
    exiting: &AtomicBool,
) -> Result<(), Error> {
    stream.set_read_timeout(Some(IDLE_TIMEOUT))?;
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);

    loop {
        let request = match Request::read_from(&mut reader) {
            Ok(r) => r,
            Err(_) => break,
        };

        let close_requested = request
            .headers
            .get("Connection")
            .map(|v| v.eq_ignore_ascii_case("close"))
            .unwrap_or(false);

        let mut response = handler.handle(&request);
        let shutting_down = exiting.load(Ordering::SeqCst);
        if close_requested || shutting_down {
            response.headers.set("Connection", "close");
        }

        let encoded = response.encode(
            crate::http::chunked::DEFAULT_CHUNK_THRESHOLD,
            crate::http::chunked::DEFAULT_MAX_CHUNK_SIZE,
        )?;
        writer.write_all(&encoded)?;

        if close_requested || shutting_down {
            break;
        }
    }
    Ok(())
}

// ------------------------------------------------------------------------------------------------
// Private Types
// ------------------------------------------------------------------------------------------------
