//! View response types
//!
//! Thin wrappers that render through [`Views`] and put the result into an
//! HTTP response. The free functions propagate render errors; [`View`]
//! keeps the error and turns it into a 500 page when converted.

use crate::context::RequestContext;
use crate::error::{Result, ViewError};
use crate::render::EngineKind;
use crate::request::RenderRequest;
use crate::vars::Vars;
use crate::Views;
use bytes::Bytes;
use http::header::{self, HeaderName};
use http::{HeaderMap, HeaderValue, StatusCode};
use http_body_util::Full;
use serde_json::Value;

/// HTTP response produced by views
pub type Response = http::Response<Full<Bytes>>;

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

const FALLBACK_ERROR_PAGE: &str = "<!DOCTYPE html><html><head><title>Error</title></head>\
    <body><h1>500 Internal Server Error</h1>\
    <p>Template rendering failed</p></body></html>";

/// A rendered view, or the error that prevented rendering
///
/// # Example
///
/// ```rust,no_run
/// use http::StatusCode;
/// use tessera_view::{RenderRequest, RequestContext, View, Views};
///
/// fn missing_page(views: &Views, ctx: &RequestContext) -> tessera_view::Response {
///     View::render(views, ctx, RenderRequest::new("errors/404"))
///         .status(StatusCode::NOT_FOUND)
///         .into_response()
/// }
/// ```
#[derive(Debug)]
pub struct View {
    /// The rendered HTML content
    content: Result<String, ViewError>,
    /// Status code (default 200)
    status: StatusCode,
    /// Extra response headers
    headers: HeaderMap,
}

impl View {
    /// Render with the engine configured for the request's plugin
    pub fn render(views: &Views, ctx: &RequestContext, request: RenderRequest) -> Self {
        Self::from_result(views.render(ctx, request))
    }

    /// Render with a specific engine
    pub fn render_with(
        views: &Views,
        kind: EngineKind,
        ctx: &RequestContext,
        request: RenderRequest,
    ) -> Self {
        Self::from_result(views.render_with(kind, ctx, request))
    }

    /// Create a view from pre-rendered HTML
    pub fn from_html(html: impl Into<String>) -> Self {
        Self::from_result(Ok(html.into()))
    }

    /// Create an error view
    pub fn error(err: ViewError) -> Self {
        Self {
            content: Err(err),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            headers: HeaderMap::new(),
        }
    }

    fn from_result(content: Result<String>) -> Self {
        match content {
            Ok(html) => Self {
                content: Ok(html),
                status: StatusCode::OK,
                headers: HeaderMap::new(),
            },
            Err(err) => Self::error(err),
        }
    }

    /// Set the status code
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Add a response header
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Rendered content, or the render error
    pub fn content(&self) -> Result<&str, &ViewError> {
        self.content.as_deref()
    }

    /// Convert into a response, propagating a render error
    pub fn into_result(self) -> Result<Response> {
        let html = self.content?;
        Ok(html_response(self.status, self.headers, html))
    }

    /// Convert into a response, replacing a render error with a 500 page
    pub fn into_response(self) -> Response {
        match self.content {
            Ok(html) => html_response(self.status, self.headers, html),
            Err(err) => {
                tracing::error!("Template rendering failed: {}", err);
                html_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    HeaderMap::new(),
                    FALLBACK_ERROR_PAGE.to_string(),
                )
            }
        }
    }
}

impl From<View> for Response {
    fn from(view: View) -> Self {
        view.into_response()
    }
}

fn html_response(status: StatusCode, headers: HeaderMap, body: String) -> Response {
    let mut response = http::Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
    response.headers_mut().extend(headers);
    response
}

/// Render with the configured engine and answer 200
pub fn view(views: &Views, ctx: &RequestContext, request: RenderRequest) -> Result<Response> {
    View::render(views, ctx, request).into_result()
}

/// Render with the raw engine and answer 200
pub fn raw_view(views: &Views, ctx: &RequestContext, request: RenderRequest) -> Result<Response> {
    View::render_with(views, EngineKind::Raw, ctx, request).into_result()
}

/// Render with Tera and answer 200
pub fn tera_view(views: &Views, ctx: &RequestContext, request: RenderRequest) -> Result<Response> {
    View::render_with(views, EngineKind::Tera, ctx, request).into_result()
}

/// Render with MiniJinja and answer 200
pub fn minijinja_view(
    views: &Views,
    ctx: &RequestContext,
    request: RenderRequest,
) -> Result<Response> {
    View::render_with(views, EngineKind::MiniJinja, ctx, request).into_result()
}

/// Render with Handlebars and answer 200
pub fn handlebars_view(
    views: &Views,
    ctx: &RequestContext,
    request: RenderRequest,
) -> Result<Response> {
    View::render_with(views, EngineKind::Handlebars, ctx, request).into_result()
}

/// Answer with the `success` or `error` system template
///
/// A `status` field in `data` between 100 and 599 replaces `status` when
/// that is 200, 500 or absent. The final status picks the template:
/// `success` for 200, `error` for anything else. With neither a status nor
/// a usable payload status the answer is a 500.
pub fn response_view(
    views: &Views,
    ctx: &RequestContext,
    data: &Vars,
    status: Option<StatusCode>,
    headers: HeaderMap,
) -> Result<Response> {
    let status = system_status(data, status);
    let html = views.render_system(ctx, system_template(status), data)?;
    Ok(html_response(status, headers, html))
}

/// Final status of a system response
pub fn system_status(data: &Vars, status: Option<StatusCode>) -> StatusCode {
    let payload = data.get("status").and_then(payload_status);
    match (status, payload) {
        (Some(status), Some(payload))
            if status == StatusCode::OK || status == StatusCode::INTERNAL_SERVER_ERROR =>
        {
            payload
        }
        (Some(status), _) => status,
        (None, Some(payload)) => payload,
        (None, None) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// System template name for a status
pub fn system_template(status: StatusCode) -> &'static str {
    if status == StatusCode::OK {
        "success"
    } else {
        "error"
    }
}

fn payload_status(value: &Value) -> Option<StatusCode> {
    let code = match value {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    if (100..600).contains(&code) {
        StatusCode::from_u16(u16::try_from(code).ok()?).ok()
    } else {
        None
    }
}
