use crate::err::{AppliesTo, BindError, Error, IoErrorExt};
use crate::routes::{respond_to_request, State};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};

/// The one port this server ever binds.
pub const PORT: u16 = 8000;

pub async fn run(port: u16, state: State) -> Result<(), Error> {
    // all interfaces, so a phone on the same network can install the app
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
            return Err(BindError::PortInUse(port).into())
        }
        Err(e) => return Err(BindError::Other(port, e).into()),
    };

    log::info!("serving {} at http://localhost:{}/", state.root().display(), port);
    log::info!("press Ctrl+C to stop");

    tokio::select! {
        result = accept_loop(listener, &state) => result,
        result = tokio::signal::ctrl_c() => {
            result?;
            log::info!("server stopped");
            Ok(())
        }
    }
}

// One connection at a time, served to completion before the next
// accept. Keep-alive is off so a browser holding its connection open
// cannot starve the listener.
async fn accept_loop(listener: TcpListener, state: &State) -> Result<(), Error> {
    loop {
        let stream = accept(&listener).await?;
        let io = TokioIo::new(stream);
        let serve = service_fn(move |req| async move {
            Ok::<_, Infallible>(respond_to_request(req, state).await)
        });
        if let Err(e) = http1::Builder::new()
            .keep_alive(false)
            .serve_connection(io, serve)
            .await
        {
            log::error!("Error serving connection: {}", e);
        }
    }
}

async fn accept(listener: &TcpListener) -> Result<TcpStream, io::Error> {
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                stream.set_nodelay(true)?;
                return Ok(stream);
            }
            Err(e) => match e.applies_to() {
                AppliesTo::Connection => log::debug!("Aborted connection dropped: {}", e),
                AppliesTo::Listener => return Err(e),
            },
        }
    }
}
