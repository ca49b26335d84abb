//! Loopback http listener that stands in for the page the provider redirects back to.
use std::convert::Infallible;
use std::net::SocketAddr;

use html_to_string_macro::html;
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode, Uri};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::{Error, Result};

macro_rules! layout {
    ($($html: tt)*) => {
        layout(html! { $($html)*})
    };
}

/// Forwards the path and query of every request on the redirect path.
#[derive(Clone)]
pub struct Callback {
    path: String,
    tx: UnboundedSender<String>,
}

impl Callback {
    pub fn new<S: Into<String>>(path: S, tx: UnboundedSender<String>) -> Self {
        Self { path: path.into(), tx }
    }
}

fn page(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
}

impl Service<Request<Incoming>> for Callback {
    type Response = Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = futures::future::BoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        if req.method() == Method::GET && req.uri().path() == self.path {
            let location = req
                .uri()
                .path_and_query()
                .map(|p| p.to_string())
                .unwrap_or_else(|| self.path.clone());

            if self.tx.send(location).is_err() {
                log::warn!("Redirect arrived after the login stopped waiting");
            }

            Box::pin(async {
                Ok::<_, Infallible>(page(
                    StatusCode::OK,
                    layout! {
                        <h1>
                            "Returned to "
                            <span class="green">"statify"</span>
                        </h1>
                        <h3>"This tab may now be closed"</h3>
                    },
                ))
            })
        } else {
            Box::pin(async {
                Ok::<_, Infallible>(page(
                    StatusCode::NOT_FOUND,
                    layout! {
                        <h1>"404 Page not found"</h1>
                    },
                ))
            })
        }
    }
}

/// Listens on the redirect uri until dropped.
pub struct Listener {
    addr: SocketAddr,
    rx: UnboundedReceiver<String>,
    handle: JoinHandle<()>,
}

impl Listener {
    /// Bind to the host and port of `redirect_uri`
    pub async fn bind(redirect_uri: &str) -> Result<Self> {
        let uri = redirect_uri
            .parse::<Uri>()
            .map_err(|e| Error::Configuration(format!("Invalid redirect uri `{redirect_uri}`: {e}")))?;
        let host = uri.host().unwrap_or("127.0.0.1").to_string();
        let port = uri.port_u16().unwrap_or(80);

        let listener = TcpListener::bind((host.as_str(), port)).await?;
        let addr = listener.local_addr()?;
        log::debug!("Listening for the redirect on {addr}");

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let callback = Callback::new(uri.path(), tx);

        let handle = tokio::task::spawn(async move {
            loop {
                let stream = match listener.accept().await {
                    Ok((stream, _)) => stream,
                    Err(err) => {
                        log::error!("Failed to accept redirect connection: {err}");
                        continue;
                    }
                };
                let io = TokioIo::new(stream);

                let cb = callback.clone();
                tokio::task::spawn(async move {
                    if let Err(err) = hyper::server::conn::http1::Builder::new()
                        .serve_connection(io, cb)
                        .await
                    {
                        log::error!("Error serving redirect connection: {err:?}");
                    }
                });
            }
        });

        Ok(Self { addr, rx, handle })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the next redirect and return its path and query
    pub async fn next(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Forget redirects that arrived while no login was waiting. Returns how many were dropped.
    pub fn discard_pending(&mut self) -> usize {
        let mut dropped = 0;
        while self.rx.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            log::debug!("Discarded {dropped} stale redirect(s)");
        }
        dropped
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn layout(body: String) -> String {
    html! {
        <html>
            <head>
                <title>"statify"</title>
                <style>"
                * {
                    box-sizing: border-box
                }
                html {
                    font-family: Arial;
                    background-color: #191414;
                    color: #FFFFFF
                }
                :is(h1, h3) {
                    text-align: center;
                }
                body {
                    padding: 1.5rem;
                }
                .green {
                    color: #1DB954
                }
                "</style>
            </head>
            <body>
                {body}
            </body>
        </html>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn forwards_the_redirect_location() {
        let mut listener = Listener::bind("http://127.0.0.1:0/callback").await.unwrap();
        let base = format!("http://{}", listener.local_addr());
        let client = reqwest::Client::builder().no_proxy().build().unwrap();

        let missing = client.get(format!("{base}/elsewhere")).send().await.unwrap();
        assert_eq!(missing.status().as_u16(), 404);

        let found = client
            .get(format!("{base}/callback?code=abc&state=1"))
            .send()
            .await
            .unwrap();
        assert_eq!(found.status().as_u16(), 200);
        assert!(found.text().await.unwrap().contains("This tab may now be closed"));

        assert_eq!(listener.next().await.as_deref(), Some("/callback?code=abc&state=1"));
    }

    #[tokio::test]
    async fn one_listener_serves_every_login() {
        let mut listener = Listener::bind("http://127.0.0.1:0/callback").await.unwrap();
        let base = format!("http://{}", listener.local_addr());
        let client = reqwest::Client::builder().no_proxy().build().unwrap();

        client.get(format!("{base}/callback?code=first")).send().await.unwrap();
        assert_eq!(listener.next().await.as_deref(), Some("/callback?code=first"));

        client.get(format!("{base}/callback?code=stale")).send().await.unwrap();
        assert_eq!(listener.discard_pending(), 1);

        let found = client
            .get(format!("{base}/callback?code=second"))
            .send()
            .await
            .unwrap();
        assert_eq!(found.status().as_u16(), 200);
        assert_eq!(listener.next().await.as_deref(), Some("/callback?code=second"));
    }

    #[tokio::test]
    async fn invalid_redirect_uri_is_a_configuration_error() {
        assert!(matches!(
            Listener::bind("not a uri").await,
            Err(Error::Configuration(_))
        ));
    }
}
