//! HTTP server: tokio + hyper http1 driving an [`HttpService`].

use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response as HyperResponse, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::response::{RequestContext, Response};
use crate::service::HttpService;
use crate::CoreError;

/// Serve `service` until ctrl-c. Blocks on its own multi-thread runtime.
pub fn run(
    service: Arc<dyn HttpService>,
    config: &ServerConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(serve(service, config.addr()))
}

/// Accept loop on `addr`; returns after ctrl-c.
pub async fn serve(
    service: Arc<dyn HttpService>,
    addr: String,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("shutting down");
                return Ok(());
            }
            accept_result = listener.accept() => {
                let (stream, peer) = match accept_result {
                    Ok(x) => x,
                    Err(e) => {
                        tracing::error!(error = %e, "accept error");
                        continue;
                    }
                };
                let io = TokioIo::new(stream);
                let service = Arc::clone(&service);
                tokio::task::spawn(async move {
                    let conn = service_fn(move |req: Request<hyper::body::Incoming>| {
                        let service = Arc::clone(&service);
                        async move { dispatch(service, req).await }
                    });
                    if let Err(e) = http1::Builder::new().serve_connection(io, conn).await {
                        tracing::error!(%peer, error = %e, "serve_connection error");
                    }
                });
            }
        }
    }
}

async fn dispatch(
    service: Arc<dyn HttpService>,
    req: Request<hyper::body::Incoming>,
) -> Result<HyperResponse<Full<Bytes>>, Infallible> {
    let response = match to_request_context(req).await {
        Ok(ctx) => {
            let method = ctx.method.clone();
            let path = ctx.path.clone();
            match service.call(ctx).await {
                Ok(resp) => resp,
                Err(e) => {
                    tracing::debug!(%method, %path, status = e.status_code(), "request failed: {}", e);
                    Response::from_error(&e)
                }
            }
        }
        Err(e) => Response::from_error(&e),
    };
    Ok(to_hyper_response(response))
}

async fn to_request_context(
    req: Request<hyper::body::Incoming>,
) -> Result<RequestContext, CoreError> {
    let method = req.method().as_str().to_uppercase();
    let path = req.uri().path().to_owned();
    let query_string = req.uri().query().unwrap_or("").to_owned();
    let headers: Vec<(String, String)> = req
        .headers()
        .iter()
        .map(|(k, v)| (k.as_str().to_owned(), v.to_str().unwrap_or("").to_owned()))
        .collect();
    let body = req
        .into_body()
        .collect()
        .await
        .map_err(|e| CoreError::Handler(format!("reading request body: {}", e)))?
        .to_bytes();
    Ok(RequestContext {
        method,
        path,
        query_string,
        headers,
        body: body.to_vec(),
    })
}

fn to_hyper_response(resp: Response) -> HyperResponse<Full<Bytes>> {
    let status = StatusCode::from_u16(resp.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = HyperResponse::builder().status(status);
    if let Some(content_type) = &resp.content_type {
        builder = builder.header(CONTENT_TYPE, content_type.as_str());
    }
    builder.body(Full::new(Bytes::from(resp.body))).unwrap_or_else(|e| {
        tracing::error!(error = %e, "building response failed");
        let mut fallback = HyperResponse::new(Full::new(Bytes::new()));
        *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        fallback
    })
}
