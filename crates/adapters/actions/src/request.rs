//! `request` — HTTP calls through a shared `reqwest` client.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use codematic_app::context::ExecutionContext;
use codematic_app::ports::ActionHandler;
use codematic_domain::error::ConfigError;
use codematic_domain::options::RequestOptions;
use codematic_domain::rule::{ActionNode, Outcome};
use codematic_domain::variables::{BODY, RESPONSE, RESPONSE_PREFIX};

use crate::error::ActionsError;
use crate::failed;

/// Status reported when no HTTP response was received.
const TRANSPORT_FAILURE: u16 = 500;

/// Issues one HTTP call and reports the response status as
/// [`Outcome::Status`].
///
/// The target is `url`, or `route` joined to the configured base URL.
/// `data` goes into the query string for `GET`/`DELETE` and into a form body
/// for `POST`/`PUT` when it is an object; a string is sent as the raw body.
/// With `filename`, the body is streamed to disk instead of being stored.
#[derive(Debug, Clone)]
pub struct RequestAction {
    client: Client,
    base_url: Option<String>,
}

impl RequestAction {
    /// Build the handler and its HTTP client.
    ///
    /// # Errors
    ///
    /// Fails when the TLS backend cannot be initialised.
    pub fn new(options: &RequestOptions) -> Result<Self, ActionsError> {
        let mut builder = Client::builder();
        if options.timeout_secs > 0 {
            builder = builder.timeout(options.timeout());
        }
        Ok(Self {
            client: builder.build()?,
            base_url: options.url.clone().filter(|url| !url.is_empty()),
        })
    }

    fn target(&self, node: &ActionNode) -> Result<String, ConfigError> {
        if let Some(url) = node.optional_str("url")? {
            return Ok(url.to_string());
        }
        match (node.optional_str("route")?, &self.base_url) {
            (Some(route), Some(base)) => Ok(join(base, route)),
            _ => Err(ConfigError::missing(&node.kind, "url")),
        }
    }
}

/// Join a route to a base URL with exactly one slash between them.
fn join(base: &str, route: &str) -> String {
    let base = base.strip_suffix('/').unwrap_or(base);
    let route = route.strip_prefix('/').unwrap_or(route);
    format!("{base}/{route}")
}

/// `GET`, `POST`, `PUT` or `DELETE`; anything else falls back to `GET`.
fn method(node: &ActionNode) -> Result<Method, ConfigError> {
    let name = node.optional_str("method")?.unwrap_or("GET");
    Ok(match name.to_ascii_uppercase().as_str() {
        "POST" => Method::POST,
        "PUT" => Method::PUT,
        "DELETE" => Method::DELETE,
        _ => Method::GET,
    })
}

#[derive(Debug, PartialEq, Eq)]
enum Payload {
    Empty,
    Raw(String),
    Fields(Vec<(String, String)>),
}

impl Payload {
    fn parse(node: &ActionNode, ctx: &ExecutionContext) -> Result<Self, ConfigError> {
        let Some(data) = node.get("data") else {
            return Ok(Self::Empty);
        };
        match ctx.variables().substitute_value(data.clone()) {
            Value::String(raw) => Ok(Self::Raw(raw)),
            Value::Object(map) => Ok(Self::Fields(
                map.into_iter()
                    .map(|(key, value)| (key, field_text(value)))
                    .collect(),
            )),
            _ => Err(ConfigError::invalid(
                &node.kind,
                "data",
                "expected a string or an object",
            )),
        }
    }

    fn apply(self, request: RequestBuilder, method: &Method) -> RequestBuilder {
        match self {
            Self::Empty => request,
            Self::Raw(body) => request.body(body),
            Self::Fields(fields) if *method == Method::POST || *method == Method::PUT => {
                request.form(&fields)
            }
            Self::Fields(fields) => request.query(&fields),
        }
    }
}

fn field_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `Content-Type` becomes `RESPONSE_CONTENT_TYPE`.
fn header_variable(name: &str) -> String {
    format!("{RESPONSE_PREFIX}{}", name.to_ascii_uppercase().replace('-', "_"))
}

#[derive(Debug, thiserror::Error)]
enum DownloadError {
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("transfer failed: {0}")]
    Http(#[from] reqwest::Error),
}

async fn download(mut response: Response, filename: &str) -> Result<u64, DownloadError> {
    let mut file = tokio::fs::File::create(filename).await?;
    let mut written = 0_u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

fn record_metadata(ctx: &ExecutionContext, response: &Response) {
    let vars = ctx.variables();
    for (name, value) in response.headers() {
        vars.set(
            header_variable(name.as_str()),
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
        );
    }
    vars.set(header_variable("status"), response.status().as_u16());
    vars.set(header_variable("url"), response.url().to_string());
}

#[async_trait]
impl ActionHandler for RequestAction {
    async fn execute(
        &self,
        node: &ActionNode,
        ctx: &ExecutionContext,
    ) -> Result<Outcome, ConfigError> {
        let url = ctx.variables().substitute(&self.target(node)?);
        let method = method(node)?;
        let payload = Payload::parse(node, ctx)?;
        let var = node.target_var(RESPONSE)?;
        let filename = node
            .optional_str("filename")?
            .map(|name| ctx.variables().substitute(name));

        tracing::debug!(%method, %url, "sending request");
        let request = payload.apply(self.client.request(method.clone(), &url), &method);
        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                failed(ctx, &node.kind, format!("{method} {url}: {err}"));
                return Ok(Outcome::Status(TRANSPORT_FAILURE));
            }
        };

        let status = response.status().as_u16();
        record_metadata(ctx, &response);

        if let Some(filename) = filename {
            return Ok(match download(response, &filename).await {
                Ok(bytes) => {
                    tracing::debug!(%filename, bytes, "response saved");
                    ctx.variables().set(header_variable("file"), filename);
                    Outcome::Status(status)
                }
                Err(err @ DownloadError::Io(_)) => failed(ctx, &node.kind, format!("{filename}: {err}")),
                Err(err @ DownloadError::Http(_)) => {
                    failed(ctx, &node.kind, format!("{method} {url}: {err}"));
                    Outcome::Status(TRANSPORT_FAILURE)
                }
            });
        }

        match response.text().await {
            Ok(body) => {
                let vars = ctx.variables();
                vars.set(var, body.clone());
                vars.set(BODY, body);
                tracing::debug!(status, "response received");
                Ok(Outcome::Status(status))
            }
            Err(err) => {
                failed(ctx, &node.kind, format!("{method} {url}: {err}"));
                Ok(Outcome::Status(TRANSPORT_FAILURE))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use axum::Router;
    use axum::extract::{Form, Query};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use codematic_domain::variables::ERROR;

    use crate::testing::{context, text};

    async fn serve() -> String {
        let app = Router::new()
            .route(
                "/status",
                get(|| async { (StatusCode::OK, [("x-scanner-id", "42")], "ready") }),
            )
            .route(
                "/echo",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    format!("code={}", params.get("code").cloned().unwrap_or_default())
                }),
            )
            .route(
                "/form",
                post(|Form(fields): Form<HashMap<String, String>>| async move {
                    format!("code={}", fields.get("code").cloned().unwrap_or_default())
                }),
            )
            .route("/raw", post(|body: String| async move { body }))
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn action(base: &str) -> RequestAction {
        RequestAction::new(&RequestOptions {
            url: Some(base.to_string()),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn should_join_route_with_single_slash() {
        assert_eq!(join("http://h/api", "status"), "http://h/api/status");
        assert_eq!(join("http://h/api/", "/status"), "http://h/api/status");
        assert_eq!(join("http://h/api", "/status"), "http://h/api/status");
    }

    #[test]
    fn should_fall_back_to_get_when_method_is_unknown() {
        let node = ActionNode::new("request").param("method", "patch");
        assert_eq!(method(&node).unwrap(), Method::GET);
        let node = ActionNode::new("request").param("method", "post");
        assert_eq!(method(&node).unwrap(), Method::POST);
    }

    #[test]
    fn should_name_header_variables_in_upper_snake_case() {
        assert_eq!(header_variable("content-type"), "RESPONSE_CONTENT_TYPE");
    }

    #[tokio::test]
    async fn should_report_500_when_transport_fails() {
        let (ctx, _) = context();
        let node = ActionNode::new("request")
            .param("method", "GET")
            .param("route", "/status");

        let outcome = action("http://127.0.0.1:1").execute(&node, &ctx).await.unwrap();

        assert_eq!(outcome, Outcome::Status(500));
        assert!(text(&ctx, ERROR).is_some_and(|e| !e.is_empty()));
    }

    #[tokio::test]
    async fn should_store_body_status_and_headers() {
        let base = serve().await;
        let (ctx, _) = context();
        let node = ActionNode::new("request").param("route", "/status");

        let outcome = action(&base).execute(&node, &ctx).await.unwrap();

        assert_eq!(outcome, Outcome::Status(200));
        assert_eq!(text(&ctx, RESPONSE).as_deref(), Some("ready"));
        assert_eq!(text(&ctx, BODY).as_deref(), Some("ready"));
        assert_eq!(text(&ctx, "RESPONSE_STATUS").as_deref(), Some("200"));
        assert_eq!(text(&ctx, "RESPONSE_X_SCANNER_ID").as_deref(), Some("42"));
        assert_eq!(
            text(&ctx, "RESPONSE_URL").as_deref(),
            Some(format!("{base}/status").as_str())
        );
    }

    #[tokio::test]
    async fn should_send_object_data_as_query_for_get() {
        let base = serve().await;
        let (ctx, _) = context();
        ctx.variables().set("CODE", "A123");
        let node = ActionNode::new("request")
            .param("url", format!("{base}/echo"))
            .param("data", serde_json::json!({"code": "%CODE%"}))
            .param("var", "ECHO");

        action(&base).execute(&node, &ctx).await.unwrap();

        assert_eq!(text(&ctx, "ECHO").as_deref(), Some("code=A123"));
        assert!(ctx.variables().get(RESPONSE).is_none());
    }

    #[tokio::test]
    async fn should_send_object_data_as_form_for_post() {
        let base = serve().await;
        let (ctx, _) = context();
        let node = ActionNode::new("request")
            .param("route", "form")
            .param("method", "POST")
            .param("data", serde_json::json!({"code": "B7"}));

        let outcome = action(&base).execute(&node, &ctx).await.unwrap();

        assert_eq!(outcome, Outcome::Status(200));
        assert_eq!(text(&ctx, RESPONSE).as_deref(), Some("code=B7"));
    }

    #[tokio::test]
    async fn should_send_string_data_as_raw_body() {
        let base = serve().await;
        let (ctx, _) = context();
        ctx.variables().set("CODE", "C9");
        let node = ActionNode::new("request")
            .param("route", "/raw")
            .param("method", "post")
            .param("data", "scanned %CODE%");

        action(&base).execute(&node, &ctx).await.unwrap();

        assert_eq!(text(&ctx, RESPONSE).as_deref(), Some("scanned C9"));
    }

    #[tokio::test]
    async fn should_report_http_status_when_not_found() {
        let base = serve().await;
        let (ctx, _) = context();
        let node = ActionNode::new("request").param("route", "/missing");

        let outcome = action(&base).execute(&node, &ctx).await.unwrap();

        assert_eq!(outcome, Outcome::Status(404));
        assert!(ctx.variables().get(ERROR).is_none());
    }

    #[tokio::test]
    async fn should_stream_body_to_file_when_filename_given() {
        let base = serve().await;
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("status.txt");
        let (ctx, _) = context();
        let node = ActionNode::new("request")
            .param("route", "/status")
            .param("filename", target.to_string_lossy().into_owned());

        let outcome = action(&base).execute(&node, &ctx).await.unwrap();

        assert_eq!(outcome, Outcome::Status(200));
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "ready");
        assert_eq!(
            text(&ctx, "RESPONSE_FILE").as_deref(),
            Some(target.to_string_lossy().as_ref())
        );
        assert!(ctx.variables().get(RESPONSE).is_none());
    }

    #[tokio::test]
    async fn should_reject_route_when_no_base_url_configured() {
        let (ctx, _) = context();
        let handler = RequestAction::new(&RequestOptions::default()).unwrap();
        let node = ActionNode::new("request").param("route", "/status");

        let err = handler.execute(&node, &ctx).await.unwrap_err();

        assert!(matches!(err, ConfigError::MissingParameter { param: "url", .. }));
    }

    #[tokio::test]
    async fn should_reject_array_data() {
        let (ctx, _) = context();
        let node = ActionNode::new("request")
            .param("url", "http://127.0.0.1:1/")
            .param("data", serde_json::json!([1, 2]));

        let err = action("http://127.0.0.1:1")
            .execute(&node, &ctx)
            .await
            .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidParameter { param: "data", .. }));
    }
}
