use crate::body;
use crate::err::Error;
use http_body_util::combinators::BoxBody;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::path::Path;

// characters that cannot appear raw in the path segment of an href
const HREF: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'%')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`');

pub async fn render<B>(req: &Request<B>, dir: &Path) -> Response<BoxBody<Bytes, Error>> {
    let mut read_dir = match tokio::fs::read_dir(dir).await {
        Ok(rd) => rd,
        Err(e) => {
            log::warn!("GET {} -> [listing error] {} : {}", req.uri(), dir.display(), e);
            let mut resp = Response::new(body::empty());
            *resp.status_mut() = StatusCode::NOT_FOUND;
            return resp;
        }
    };

    let mut entries = Vec::new();
    loop {
        match read_dir.next_entry().await {
            Ok(Some(entry)) => {
                let mut name = entry.file_name().to_string_lossy().into_owned();
                if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
                    name.push('/');
                }
                entries.push(name);
            }
            Ok(None) => break,
            Err(e) => {
                log::warn!("GET {} -> [listing error] {} : {}", req.uri(), dir.display(), e);
                break;
            }
        }
    }
    entries.sort_by_key(|name| name.to_lowercase());

    let items = entries
        .iter()
        .map(|name| {
            format!(
                "<li><a href=\"{href}\">{name}</a></li>",
                href = utf8_percent_encode(name, HREF),
                name = escape(name),
            )
        })
        .collect::<Vec<_>>()
        .join("");

    log::info!("GET {} -> [listing {} entries]", req.uri(), entries.len());
    let title = escape(req.uri().path());
    let page = format!(
        concat!(
            "<!DOCTYPE html>",
            "<html>",
            "<head><meta charset=\"utf-8\"><title>Directory listing for {title}</title></head>",
            "<body>",
            "<h1>Directory listing for {title}</h1>",
            "<hr><ul>",
            "{items}",
            "</ul><hr>",
            "</body>",
            "</html>",
        ),
        title = title,
        items = items
    );

    let mut resp = Response::new(body::full(Bytes::from(page)));
    resp.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    resp
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}
