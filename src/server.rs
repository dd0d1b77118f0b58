//! Minimal message-oriented TCP server framework.
//!
//! Binds a listener, accepts connections forever, and for each one spawns a
//! handler thread that loops reading framed [`Message`]s and writing back
//! whatever [`RequestHandler::process_req`] returns. Concurrency between
//! requests on one socket is impossible by construction (the handler thread
//! is single-threaded per socket); concurrency across sockets is unbounded.

use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use log::{debug, info, warn};

use crate::message::{read_message, write_message};

/// The sole extension point of the server framework. CR and CRAQ replicas
/// each provide one implementation; the framework is oblivious to which.
pub trait RequestHandler: Send + Sync {
    fn process_req(&self, msg: crate::message::Message) -> crate::message::Message;
}

/// Accept connections on `listener` forever, dispatching each to its own
/// handler thread. Returns only if the listener itself errors out.
pub fn serve<H>(listener: TcpListener, handler: Arc<H>)
where
    H: RequestHandler + 'static,
{
    info!("listening on {:?}", listener.local_addr());
    for conn in listener.incoming() {
        match conn {
            Ok(stream) => {
                let handler = handler.clone();
                thread::spawn(move || handle_connection(stream, handler));
            }
            Err(e) => warn!("failed to accept connection: {}", e),
        }
    }
}

fn handle_connection<H>(mut stream: TcpStream, handler: Arc<H>)
where
    H: RequestHandler,
{
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "<unknown>".to_string());
    loop {
        let req = match read_message(&mut stream, &peer) {
            Ok(req) => req,
            Err(e) => {
                debug!("connection from {} closed: {}", peer, e);
                return;
            }
        };
        let reply = handler.process_req(req);
        if let Err(e) = write_message(&mut stream, &reply, &peer) {
            warn!("failed to reply to {}: {}", peer, e);
            return;
        }
    }
}
