use crate::domain::MockStore;
use crate::http::http_server::HttpServer;
use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct ApplicationState {
    store: RwLock<MockStore>,
}

impl ApplicationState {
    pub fn new(store: MockStore) -> Self {
        Self {
            store: RwLock::new(store),
        }
    }

    pub const fn store(&self) -> &RwLock<MockStore> {
        &self.store
    }
}

pub type SharedApplicationState = Arc<ApplicationState>;

/// Handle on a started server.
pub struct RunningApplication {
    local_addr: SocketAddr,
    state: SharedApplicationState,
    cancellation_token: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl RunningApplication {
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Root URL to use as API host, e.g. `http://127.0.0.1:40123`.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    pub const fn state(&self) -> &SharedApplicationState {
        &self.state
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Waits until the server stops.
    pub async fn wait(self) -> Result<()> {
        for handle in self.handles {
            handle.await?;
        }

        Ok(())
    }

    /// Stops accepting connections and waits for in-flight requests.
    pub async fn shutdown(self) -> Result<()> {
        self.cancellation_token.cancel();
        self.wait().await
    }
}

/// Binds `addr` and serves the emulated APIs backed by `store`.
///
/// Links returned by the server point at the bound address, so port `0`
/// can be used to pick any free port.
pub async fn start_application(
    addr: SocketAddr,
    mut store: MockStore,
) -> Result<RunningApplication> {
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;

    store.set_base_url(format!("http://{local_addr}"));
    let state = Arc::new(ApplicationState::new(store));
    let cancellation_token = CancellationToken::new();

    let http_server = HttpServer::new(listener, Arc::clone(&state), cancellation_token.clone());
    let handles = http_server.start();

    Ok(RunningApplication {
        local_addr,
        state,
        cancellation_token,
        handles,
    })
}
