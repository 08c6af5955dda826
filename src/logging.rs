//! Logger setup and the `peer` MDC tag
//!
//! `log_mdc` is thread-local while requests and photo tasks hop between
//! threads, so the tag is set around each poll of the future it belongs to and
//! put back the way it was afterwards.

use log::{info, warn};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

/// MDC key printed by the log pattern in `server_log.yaml`
pub const PEER_KEY: &str = "peer";

/// Initialise log4rs from `config_file`, or fall back to env_logger when the
/// file is missing or invalid. Safe to call more than once.
pub fn init(config_file: &str) {
    if Path::new(config_file).exists() {
        match log4rs::init_file(config_file, Default::default()) {
            Ok(()) => {
                info!("Logging configured from {}", config_file);
                return;
            }
            Err(e) => eprintln!("Could not load log configuration {}: {}", config_file, e),
        }
    }

    let fallback = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
    if fallback.is_ok() {
        warn!("Log configuration {} not found, logging to stderr", config_file);
    }
}

/// Peer tagged on the current thread, if any
pub fn current_peer() -> Option<String> {
    log_mdc::get(PEER_KEY, |peer| peer.map(str::to_string))
}

/// Run `future` with the `peer` tag set to `peer` whenever it is polled
pub fn with_peer<F: Future>(peer: Option<String>, future: F) -> PeerScoped<F> {
    PeerScoped {
        peer,
        inner: Box::pin(future),
    }
}

/// Run `future` under the peer tagged on the calling thread, for work handed
/// to another runtime
pub fn carry_peer<F: Future>(future: F) -> PeerScoped<F> {
    with_peer(current_peer(), future)
}

pub struct PeerScoped<F> {
    peer: Option<String>,
    inner: Pin<Box<F>>,
}

impl<F: Future> Future for PeerScoped<F> {
    type Output = F::Output;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<F::Output> {
        let previous = current_peer();
        set_peer(self.peer.as_deref());
        let poll = self.inner.as_mut().poll(cx);
        set_peer(previous.as_deref());
        poll
    }
}

fn set_peer(peer: Option<&str>) {
    match peer {
        Some(peer) => {
            log_mdc::insert(PEER_KEY, peer);
        }
        None => {
            log_mdc::remove(PEER_KEY);
        }
    }
}
