use std::path::Path;

/// Content type by file extension.
///
/// Web app manifests are special-cased first: browsers refuse to
/// install from a manifest served as plain JSON, so `.webmanifest`
/// files and anything named `manifest.json` always get
/// `application/manifest+json`.
pub fn content_type_for(path: &Path) -> &'static str {
    let name = path.file_name().and_then(|n| n.to_str());
    if name.is_some_and(|n| n.ends_with(".webmanifest") || n.ends_with("manifest.json")) {
        return "application/manifest+json";
    }
    from_extension(path.extension().and_then(|e| e.to_str()))
}

fn from_extension(extension: Option<&str>) -> &'static str {
    match extension {
        // Text
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("txt" | "md") => "text/plain; charset=utf-8",
        Some("xml") => "application/xml",

        // JavaScript/WASM
        Some("js" | "mjs") => "application/javascript",
        Some("json" | "map") => "application/json",
        Some("wasm") => "application/wasm",

        // Images
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",

        // Audio/video
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("ogg" | "ogv") => "video/ogg",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",

        // Default
        _ => "application/octet-stream",
    }
}
