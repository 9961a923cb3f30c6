//! Contract between the startup logic and a reverse proxy.
//!
//! A proxy layer holds a [`ProxyTargetSource`] and awaits it when it needs to
//! know where to forward requests. The future resolves once the development
//! server accepts connections, or fails with the startup error.

use crate::coordinator::StartupCoordinator;
use crate::error::Result;
use async_trait::async_trait;
use url::Url;

/// Asynchronously supplies the URL a proxy should forward requests to.
#[async_trait]
pub trait ProxyTargetSource: Send + Sync {
    async fn proxy_target(&self) -> Result<Url>;
}

#[async_trait]
impl ProxyTargetSource for StartupCoordinator {
    async fn proxy_target(&self) -> Result<Url> {
        self.resolve().await?.to_url()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DevServerConfig, ServeMode};
    use crate::probe::PortProbe;
    use crate::process::{Launcher, ProcessHandle};
    use std::path::Path;
    use std::sync::Arc;

    struct Listening;

    impl PortProbe for Listening {
        fn is_listening(&self, _port: u16) -> bool {
            true
        }
    }

    struct NeverLaunch;

    impl Launcher for NeverLaunch {
        fn launch(&self, _: ServeMode, _: &Path, _: bool) -> Result<ProcessHandle> {
            panic!("server is already running");
        }
    }

    #[tokio::test]
    async fn test_proxy_target_is_endpoint_url() {
        let source: Arc<dyn ProxyTargetSource> = Arc::new(
            StartupCoordinator::with_components(
                DevServerConfig::new().with_port(5173),
                Arc::new(Listening),
                Arc::new(NeverLaunch),
            )
            .unwrap(),
        );

        let url = source.proxy_target().await.unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:5173/");
    }
}
