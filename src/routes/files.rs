use crate::body;
use crate::err::Error;
use crate::file;
use crate::mime;
use crate::routes::{listing, State};
use headers::{ContentLength, HeaderMapExt, IfModifiedSince, LastModified};
use http_body_util::combinators::BoxBody;
use http_body_util::BodyExt;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE, LOCATION};
use hyper::{Request, Response, StatusCode};
use std::fs::Metadata;
use std::path::Path;
use tokio::fs::File;

pub async fn get<B>(req: &Request<B>, state: &State) -> Response<BoxBody<Bytes, Error>> {
    let uri_path = req.uri().path();
    let path = match file::resolve(state.root(), uri_path) {
        Some(path) => path,
        None => {
            log::warn!("GET {} -> [path rejected]", req.uri());
            return not_found();
        }
    };

    let metadata = match tokio::fs::metadata(&path).await {
        Ok(m) => m,
        Err(e) => {
            log::info!("GET {} -> [not found] {}", req.uri(), e);
            return not_found();
        }
    };

    if !metadata.is_dir() {
        return serve_file(req, &path, &metadata).await;
    }

    // directory URLs need the trailing slash so relative links resolve
    if !uri_path.ends_with('/') {
        return redirect_with_slash(req);
    }

    for index in ["index.html", "index.htm"] {
        let candidate = path.join(index);
        if let Ok(m) = tokio::fs::metadata(&candidate).await {
            if m.is_file() {
                return serve_file(req, &candidate, &m).await;
            }
        }
    }

    listing::render(req, &path).await
}

async fn serve_file<B>(
    req: &Request<B>,
    path: &Path,
    metadata: &Metadata,
) -> Response<BoxBody<Bytes, Error>> {
    let modified = metadata.modified().ok();

    if let (Some(since), Some(modified)) = (req.headers().typed_get::<IfModifiedSince>(), modified)
    {
        if !since.is_modified(modified) {
            log::info!("GET {} -> [not modified]", req.uri());
            let mut resp = Response::new(body::empty());
            *resp.status_mut() = StatusCode::NOT_MODIFIED;
            resp.headers_mut().typed_insert(LastModified::from(modified));
            return resp;
        }
    }

    let file = match File::open(path).await {
        Ok(f) => f,
        Err(e) => {
            log::warn!("GET {} -> [file error] {} : {}", req.uri(), path.display(), e);
            return not_found();
        }
    };

    log::info!("GET {} -> {} ({} bytes)", req.uri(), path.display(), metadata.len());
    let mut resp = Response::new(body::from_file(file).map_err(Error::from).boxed());
    resp.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static(mime::content_type_for(path)),
    );
    resp.headers_mut().typed_insert(ContentLength(metadata.len()));
    if let Some(modified) = modified {
        resp.headers_mut().typed_insert(LastModified::from(modified));
    }
    resp
}

fn redirect_with_slash<B>(req: &Request<B>) -> Response<BoxBody<Bytes, Error>> {
    let location = match req.uri().query() {
        Some(query) => format!("{}/?{}", req.uri().path(), query),
        None => format!("{}/", req.uri().path()),
    };
    log::info!("GET {} -> [redirect] {}", req.uri(), location);
    if let Ok(location) = HeaderValue::from_str(&location) {
        let mut resp = Response::new(body::empty());
        *resp.status_mut() = StatusCode::MOVED_PERMANENTLY;
        resp.headers_mut().insert(LOCATION, location);
        return resp;
    }
    not_found()
}

fn not_found() -> Response<BoxBody<Bytes, Error>> {
    let mut resp = Response::new(body::empty());
    *resp.status_mut() = StatusCode::NOT_FOUND;
    resp
}
