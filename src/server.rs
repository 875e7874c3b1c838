use crate::{
  config::Config,
  service::{point_body, status_body, Artifact, Endpoint, MissionService, ServiceError},
};
use hyper::{
  body::HttpBody,
  header::{self, HeaderValue},
  server::conn::AddrStream,
  service::{make_service_fn, service_fn},
  Body, Method, Request, Response, Server, StatusCode,
};
use log::{debug, error, info};
use std::{
  convert::Infallible, error::Error, fmt::Display, net::SocketAddr, sync::Arc, time::Duration,
};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

#[derive(Debug)]
enum BodyError {
  Transport(hyper::Error),
  TooLarge(usize),
  Timeout(Duration),
}

impl Display for BodyError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      BodyError::Transport(err) => write!(f, "error reading request body: {err}"),
      BodyError::TooLarge(limit) => write!(f, "request body exceeds {limit} bytes"),
      BodyError::Timeout(d) => write!(f, "request body not received within {d:?}"),
    }
  }
}

impl Error for BodyError {}

impl BodyError {
  fn status(&self) -> StatusCode {
    match self {
      BodyError::Transport(_) => StatusCode::BAD_REQUEST,
      BodyError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
      BodyError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
    }
  }
}

#[derive(Debug)]
pub struct HttpFrontend {
  service: MissionService,
  max_body_bytes: usize,
  read_timeout: Duration,
}

fn text_response(status: StatusCode, msg: String) -> Response<Body> {
  let mut res = Response::new(Body::from(msg));
  *res.status_mut() = status;
  res
    .headers_mut()
    .insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
  res
}

fn json_response(body: String) -> Response<Body> {
  let mut res = Response::new(Body::from(body));
  res
    .headers_mut()
    .insert(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
  res
}

fn error_response(err: &ServiceError) -> Response<Body> {
  let status = StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
  text_response(status, err.to_string())
}

fn artifact_response(artifact: Artifact) -> Response<Body> {
  let res = Response::builder()
    .status(StatusCode::OK)
    .header(header::CONTENT_TYPE, artifact.content_type)
    .header(
      header::CONTENT_DISPOSITION,
      format!("attachment; filename={}", artifact.filename),
    )
    .body(Body::from(artifact.body));
  match res {
    Ok(res) => res,
    Err(err) => {
      error!("error building response: {err}");
      error_response(&ServiceError::Internal(err.to_string()))
    }
  }
}

impl HttpFrontend {
  pub fn new(cfg: &Config) -> Self {
    Self {
      service: MissionService::new(cfg),
      max_body_bytes: cfg.web.max_body_bytes,
      read_timeout: cfg.web.read_timeout,
    }
  }

  async fn read_body(&self, body: Body) -> Result<Vec<u8>, BodyError> {
    let limit = self.max_body_bytes;
    let read = async move {
      let mut body = body;
      let mut buf = vec![];
      while let Some(chunk) = body.data().await {
        let chunk = chunk.map_err(BodyError::Transport)?;
        if buf.len() + chunk.len() > limit {
          return Err(BodyError::TooLarge(limit));
        }
        buf.extend_from_slice(&chunk);
      }
      Ok(buf)
    };
    tokio::time::timeout(self.read_timeout, read)
      .await
      .map_err(|_| BodyError::Timeout(self.read_timeout))?
  }

  async fn generate(&self, endpoint: Endpoint, req: Request<Body>) -> Response<Body> {
    let method = req.method().clone();
    // the body of anything but POST is never read
    let body = if method == Method::POST {
      match self.read_body(req.into_body()).await {
        Ok(body) => body,
        Err(err) => {
          info!("{endpoint} request rejected: {err}");
          return text_response(err.status(), err.to_string());
        }
      }
    } else {
      vec![]
    };

    match self.service.handle(endpoint, method.as_str(), &body) {
      Ok(artifact) => artifact_response(artifact),
      Err(err) => error_response(&err),
    }
  }

  pub async fn route(&self, req: Request<Body>, remote: SocketAddr) -> Response<Body> {
    let path = req.uri().path().to_owned();
    debug!("[{remote}] {} {path}", req.method());

    let is_get = req.method() == Method::GET;
    let probe = move |res: Response<Body>| {
      if is_get {
        res
      } else {
        error_response(&ServiceError::MethodNotAllowed)
      }
    };

    match path.as_str() {
      "/api/generate" => self.generate(Endpoint::Table, req).await,
      "/api/generate_kml" => self.generate(Endpoint::Path, req).await,
      "/api/generate_csv_status" => probe(json_response(status_body(Endpoint::Table))),
      "/api/generate_kml_status" => probe(json_response(status_body(Endpoint::Path))),
      "/api/generate_point" => match point_body(req.uri().query()) {
        Ok(body) => probe(json_response(body)),
        Err(err) => probe(error_response(&err)),
      },
      _ => text_response(StatusCode::NOT_FOUND, format!("{path} not found")),
    }
  }
}

async fn shutdown_signal() {
  if let Err(err) = tokio::signal::ctrl_c().await {
    error!("error waiting for shutdown signal: {err}");
    return;
  }
  info!("shutdown signal received");
}

pub async fn serve(cfg: &Config) -> Result<(), Box<dyn Error>> {
  let addr: SocketAddr = cfg.web.listen.parse()?;
  let frontend = Arc::new(HttpFrontend::new(cfg));

  let make_svc = make_service_fn(move |conn: &AddrStream| {
    let frontend = frontend.clone();
    let remote = conn.remote_addr();
    async move {
      Ok::<_, Infallible>(service_fn(move |req| {
        let frontend = frontend.clone();
        async move { Ok::<_, Infallible>(frontend.route(req, remote).await) }
      }))
    }
  });

  info!("listening on {addr}");
  Server::try_bind(&addr)?
    .serve(make_svc)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}
