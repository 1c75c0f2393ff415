use crate::body;
use crate::err::Error;
use http_body_util::combinators::BoxBody;
use hyper::body::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use std::path::{Path, PathBuf};

mod files;
mod listing;
mod pwa;

pub struct State {
    root: PathBuf,
}

impl State {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[allow(clippy::declare_interior_mutable_const)]
pub async fn respond_to_request<B>(
    req: Request<B>,
    state: &State,
) -> Response<BoxBody<Bytes, Error>> {
    const NO_CACHE: HeaderValue = HeaderValue::from_static("no-cache, no-store, must-revalidate");
    const PRAGMA_NO_CACHE: HeaderValue = HeaderValue::from_static("no-cache");
    const EXPIRED: HeaderValue = HeaderValue::from_static("0");
    const ANY: HeaderValue = HeaderValue::from_static("*");
    const ALLOWED_METHODS: HeaderValue = HeaderValue::from_static("GET, POST, OPTIONS");
    const ALLOWED_HEADERS: HeaderValue = HeaderValue::from_static("Content-Type");

    let head_only = req.method() == Method::HEAD;
    let mut resp = match *req.method() {
        Method::GET | Method::HEAD => match req.uri().path() {
            "/manifest.json" => pwa::manifest(&req, state).await,
            "/sw.js" => pwa::service_worker(&req, state).await,
            _ => files::get(&req, state).await,
        },
        _ => {
            log::warn!("{} {} -> [method not allowed]", req.method(), req.uri());
            let mut resp = Response::new(body::empty());
            *resp.status_mut() = StatusCode::METHOD_NOT_ALLOWED;
            resp
        }
    };

    // every response, whatever its status: never cached, usable
    // cross-origin
    let headers = resp.headers_mut();
    headers.insert(header::CACHE_CONTROL, NO_CACHE);
    headers.insert(header::PRAGMA, PRAGMA_NO_CACHE);
    headers.insert(header::EXPIRES, EXPIRED);
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, ANY);
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS);
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOWED_HEADERS);

    if head_only {
        let (parts, _) = resp.into_parts();
        Response::from_parts(parts, body::empty())
    } else {
        resp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use headers::{ContentLength, HeaderMapExt, IfModifiedSince};
    use http_body_util::{BodyExt, Empty};
    use std::fs;
    use tempfile::TempDir;

    fn request(method: Method, uri: &str) -> Request<Empty<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Empty::new())
            .unwrap()
    }

    fn state(dir: &TempDir) -> State {
        State::new(dir.path().to_path_buf())
    }

    async fn text(resp: Response<BoxBody<Bytes, Error>>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn assert_no_cache_and_cors(resp: &Response<BoxBody<Bytes, Error>>) {
        let h = resp.headers();
        assert_eq!(h[header::CACHE_CONTROL], "no-cache, no-store, must-revalidate");
        assert_eq!(h[header::PRAGMA], "no-cache");
        assert_eq!(h[header::EXPIRES], "0");
        assert_eq!(h[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(h[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, POST, OPTIONS");
        assert_eq!(h[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
    }

    #[tokio::test]
    async fn manifest_gets_forced_content_type() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("manifest.json"), "{\"name\":\"app\"}").unwrap();
        let resp = respond_to_request(request(Method::GET, "/manifest.json"), &state(&dir)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/manifest+json");
        assert_no_cache_and_cors(&resp);
        assert_eq!(text(resp).await, "{\"name\":\"app\"}");
    }

    #[tokio::test]
    async fn service_worker_gets_forced_content_type() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("sw.js"), "self.skipWaiting()").unwrap();
        let resp = respond_to_request(request(Method::GET, "/sw.js"), &state(&dir)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/javascript");
        assert_eq!(text(resp).await, "self.skipWaiting()");
    }

    #[tokio::test]
    async fn head_on_forced_path_keeps_the_forced_type() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("sw.js"), "self.skipWaiting()").unwrap();
        let resp = respond_to_request(request(Method::HEAD, "/sw.js"), &state(&dir)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/javascript");
        assert!(text(resp).await.is_empty());
    }

    #[tokio::test]
    async fn missing_manifest_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let resp = respond_to_request(request(Method::GET, "/manifest.json"), &state(&dir)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_no_cache_and_cors(&resp);
    }

    #[tokio::test]
    async fn content_type_is_inferred_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.css"), "body{}").unwrap();
        fs::write(dir.path().join("data.blob"), [0u8, 1, 2]).unwrap();

        let resp = respond_to_request(request(Method::GET, "/app.css"), &state(&dir)).await;
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/css");

        let resp = respond_to_request(request(Method::GET, "/data.blob"), &state(&dir)).await;
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/octet-stream");
    }

    #[tokio::test]
    async fn missing_file_is_not_found_with_headers() {
        let dir = tempfile::tempdir().unwrap();
        let resp = respond_to_request(request(Method::GET, "/nope.html"), &state(&dir)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_no_cache_and_cors(&resp);
        assert!(text(resp).await.is_empty());
    }

    #[tokio::test]
    async fn post_is_not_allowed_but_still_carries_headers() {
        let dir = tempfile::tempdir().unwrap();
        let resp = respond_to_request(request(Method::POST, "/anything"), &state(&dir)).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_no_cache_and_cors(&resp);
    }

    #[tokio::test]
    async fn head_keeps_headers_and_strips_the_body() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hello.txt"), "hello").unwrap();
        let resp = respond_to_request(request(Method::HEAD, "/hello.txt"), &state(&dir)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().typed_get::<ContentLength>(),
            Some(ContentLength(5))
        );
        assert_no_cache_and_cors(&resp);
        assert!(text(resp).await.is_empty());
    }

    #[tokio::test]
    async fn directory_without_slash_redirects() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("static")).unwrap();

        let resp = respond_to_request(request(Method::GET, "/static"), &state(&dir)).await;
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(resp.headers()[header::LOCATION], "/static/");
        assert_no_cache_and_cors(&resp);

        let resp = respond_to_request(request(Method::GET, "/static?tab=1"), &state(&dir)).await;
        assert_eq!(resp.headers()[header::LOCATION], "/static/?tab=1");
    }

    #[tokio::test]
    async fn directory_serves_its_index_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
        let resp = respond_to_request(request(Method::GET, "/"), &state(&dir)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(text(resp).await, "<h1>home</h1>");
    }

    #[tokio::test]
    async fn directory_without_index_gets_a_listing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a&b.txt"), "x").unwrap();
        fs::create_dir(dir.path().join("icons")).unwrap();

        let resp = respond_to_request(request(Method::GET, "/"), &state(&dir)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");
        let page = text(resp).await;
        assert!(page.contains("a&amp;b.txt"));
        assert!(page.contains("href=\"icons/\""));
    }

    #[tokio::test]
    async fn listing_hrefs_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a%20b.txt"), "x").unwrap();

        let resp = respond_to_request(request(Method::GET, "/"), &state(&dir)).await;
        let page = text(resp).await;
        assert!(page.contains("href=\"a%2520b.txt\""));

        // requesting the emitted href serves the file it named
        let resp = respond_to_request(request(Method::GET, "/a%2520b.txt"), &state(&dir)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(text(resp).await, "x");
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let resp = respond_to_request(request(Method::GET, "/../secret"), &state(&dir)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = respond_to_request(request(Method::GET, "/%2e%2e/secret"), &state(&dir)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unchanged_file_is_not_modified() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.js"), "let x = 1").unwrap();
        let modified = fs::metadata(dir.path().join("app.js"))
            .unwrap()
            .modified()
            .unwrap();

        let mut req = request(Method::GET, "/app.js");
        req.headers_mut().typed_insert(IfModifiedSince::from(modified));
        let resp = respond_to_request(req, &state(&dir)).await;
        assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
        assert_no_cache_and_cors(&resp);
        assert!(text(resp).await.is_empty());
    }
}
