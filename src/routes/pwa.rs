use crate::body;
use crate::err::Error;
use crate::routes::State;
use headers::{ContentLength, HeaderMapExt};
use http_body_util::combinators::BoxBody;
use http_body_util::BodyExt;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};
use tokio::fs::File;

/// A manifest served as plain JSON never triggers install prompts, so
/// its content type is fixed here, before extension inference runs.
pub async fn manifest<B>(req: &Request<B>, state: &State) -> Response<BoxBody<Bytes, Error>> {
    forced(req, state, "manifest.json", "application/manifest+json").await
}

/// Browsers only register service workers delivered as JavaScript.
pub async fn service_worker<B>(req: &Request<B>, state: &State) -> Response<BoxBody<Bytes, Error>> {
    forced(req, state, "sw.js", "application/javascript").await
}

async fn forced<B>(
    req: &Request<B>,
    state: &State,
    name: &str,
    content_type: &'static str,
) -> Response<BoxBody<Bytes, Error>> {
    let path = state.root().join(name);
    let file = match File::open(&path).await {
        Ok(f) => f,
        Err(e) => {
            log::warn!("{} {} -> [file error] {} : {}", req.method(), req.uri(), path.display(), e);
            let mut resp = Response::new(body::empty());
            *resp.status_mut() = StatusCode::NOT_FOUND;
            return resp;
        }
    };
    let len = file.metadata().await.map(|m| m.len()).ok();

    log::info!("{} {} -> [forced {}]", req.method(), req.uri(), content_type);
    let mut resp = Response::new(body::from_file(file).map_err(Error::from).boxed());
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    if let Some(len) = len {
        resp.headers_mut().typed_insert(ContentLength(len));
    }
    resp
}
