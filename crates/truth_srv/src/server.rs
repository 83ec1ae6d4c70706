//! truth http server types.

use std::sync::Arc;

use agent_truth_api::{TruthError, TruthResult};

use crate::*;

/// Print out a message if this thread dies.
struct ThreadGuard(&'static str);

impl Drop for ThreadGuard {
    fn drop(&mut self) {
        tracing::debug!("{}", self.0);
    }
}

/// An actual agent_truth_srv server instance.
///
/// This server is built to be direct, light-weight, and responsive.
/// The discovery responses are produced by blocking OS thread workers
/// rather than async tasks; everything a response needs beyond the
/// signature is pre-computed once at startup.
pub struct TruthSrv {
    cont: Arc<std::sync::atomic::AtomicBool>,
    workers: Vec<std::thread::JoinHandle<std::io::Result<()>>>,
    addrs: Vec<std::net::SocketAddr>,
    server: Option<Server>,
}

impl std::fmt::Debug for TruthSrv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TruthSrv")
            .field("addrs", &self.addrs)
            .finish_non_exhaustive()
    }
}

impl Drop for TruthSrv {
    fn drop(&mut self) {
        let _g = ThreadGuard("Server Shutdown Complete!");

        tracing::debug!("begin server shutdown...");
        let _ = self.shutdown();
    }
}

impl TruthSrv {
    /// Construct a new TruthSrv instance.
    ///
    /// Fails with a [TruthError::Configuration] when the site config is
    /// inconsistent (e.g. the announced schema version is not listed as
    /// supported), before any socket is bound.
    pub fn new(config: Config) -> TruthResult<Self> {
        let publisher = Arc::new(Publisher::new(&config.site)?);

        let config = Arc::new(config);

        // atomic flag for telling worker threads to shutdown
        let cont = Arc::new(std::sync::atomic::AtomicBool::new(true));

        let sconf = ServerConfig {
            addrs: config.listen_address_list.clone(),
            worker_thread_count: config.worker_thread_count,
        };

        // start the actual http server
        let server = Server::new(config.clone(), sconf).map_err(|err| {
            TruthError::network(format!("failed to start http server: {err}"))
        })?;

        // get the address that was assigned
        let addrs = server.server_addrs().to_vec();
        tracing::info!(?addrs, "Listening");

        // spawn our worker threads
        let mut workers = Vec::with_capacity(config.worker_thread_count);
        for _ in 0..config.worker_thread_count {
            let cont = cont.clone();
            let publisher = publisher.clone();
            let recv = server.receiver().clone();
            workers.push(std::thread::spawn(move || {
                worker(cont, publisher, recv)
            }));
        }

        Ok(Self {
            cont,
            workers,
            addrs,
            server: Some(server),
        })
    }

    /// Shutdown the server, returning an error result if any
    /// of the worker threads had panicked.
    pub fn shutdown(&mut self) -> std::io::Result<()> {
        let mut is_err = false;
        self.cont.store(false, std::sync::atomic::Ordering::SeqCst);
        drop(self.server.take());
        while !self.workers.is_empty() {
            tracing::debug!(
                "waiting on {} threads to close...",
                self.workers.len()
            );
            if self.workers.pop().unwrap().join().is_err() {
                is_err = true;
            }
        }
        tracing::debug!("all threads closed.");
        if is_err {
            Err(std::io::Error::other("Failure shutting down worker thread"))
        } else {
            Ok(())
        }
    }

    /// Get the bound listening addresses of this server.
    pub fn listen_addrs(&self) -> &[std::net::SocketAddr] {
        self.addrs.as_slice()
    }

    /// Print the address server started on
    pub fn print_addrs(&self) {
        println!("#agent_truth_srv#running#");
        for addr in self.addrs.iter() {
            // print these incase someone wants to parse for them
            println!("#agent_truth_srv#listening#{addr:?}#");
        }
    }
}

fn worker(
    cont: Arc<std::sync::atomic::AtomicBool>,
    publisher: Arc<Publisher>,
    recv: HttpReceiver,
) -> std::io::Result<()> {
    let _g = ThreadGuard("worker thread has ended");

    while cont.load(std::sync::atomic::Ordering::SeqCst) {
        let (req, res) = match recv.recv() {
            None => break,
            Some(r) => r,
        };

        let handler = Handler {
            publisher: &publisher,
            res,
        };

        handler.handle(req)?;
    }

    Ok(())
}

struct Handler<'lt> {
    publisher: &'lt Publisher,
    res: HttpRespondCb,
}

impl Handler<'_> {
    /// Wrap the handle call so we can respond to the client with errors.
    pub fn handle(self, req: HttpRequest) -> std::io::Result<()> {
        let res = self.handle_inner(req);
        (self.res)(res);
        Ok(())
    }

    /// Dispatch to the correct handlers.
    fn handle_inner(&self, req: HttpRequest) -> HttpResponse {
        match req {
            HttpRequest::HealthGet => HttpResponse {
                status: 200,
                headers: Vec::new(),
                body: b"{}".to_vec(),
            },
            HttpRequest::TruthGet {
                intent,
                if_none_match,
            } => self
                .publisher
                .respond(intent.as_deref(), if_none_match.as_deref()),
        }
    }
}
