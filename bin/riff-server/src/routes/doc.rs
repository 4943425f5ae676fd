use utoipa::OpenApi;

use crate::routes::{audio, generate, health, lyrics, upload};

#[derive(OpenApi)]
#[openapi(info(
    title = "riff-server",
    description = "Proxy for music generation, lyrics drafting and audio upload",
    contact(name = "riff", url = "https://github.com/Cyberhan123/riff")
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(health::HealthApi::openapi());
    root.merge(generate::GenerateApi::openapi());
    root.merge(audio::AudioApi::openapi());
    root.merge(lyrics::LyricsApi::openapi());
    root.merge(upload::UploadApi::openapi());
    root
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = get_docs();
        for path in ["/health", "/api/generate", "/api/generate/file", "/api/audio", "/api/lyrics", "/api/upload"] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing from OpenAPI document");
        }
    }
}
