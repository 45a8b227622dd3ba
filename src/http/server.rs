use log::info;
use rouille::{Request, Response};
use std::sync::Arc;

use crate::{
    artwork::AlbumArtCache,
    config::HttpConfig,
    domain::token::AccessToken,
    http::{ART_RESOURCE_PATH, error::ApiError},
};

/// Serves the current cover image to the presence display's image proxy.
///
/// Exactly one resource exists; everything else is a 404. Requests are
/// handled concurrently by rouille's pool and only the cache access itself
/// serializes.
pub struct AssetServer {
    cache: Arc<AlbumArtCache>,
    pub config: HttpConfig,
}

impl AssetServer {
    pub fn new(cache: Arc<AlbumArtCache>, config: HttpConfig) -> Self {
        Self { cache, config }
    }

    pub fn run(self) {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        if !self.cache.has_art() {
            info!("no album cover cached yet; requests will 404 until a track is seen");
        }
        info!("asset server listening on http://{}", addr);
        rouille::start_server(addr, move |request| self.handle_request(request));
    }

    fn handle_request(&self, request: &Request) -> Response {
        info!("{} {}", request.method(), request.raw_url());

        let response = if request.method() == "GET" && request.url() == ART_RESOURCE_PATH {
            self.handle_album_image(request)
        } else {
            info!("invalid request path: {}", request.url());
            Response::empty_404()
        };

        info!("Response: {} {}", request.method(), response.status_code);
        response
    }

    fn handle_album_image(&self, request: &Request) -> Response {
        match self.album_image(request) {
            Ok(r) => r,
            Err(e) => e.into_response(),
        }
    }

    fn album_image(&self, request: &Request) -> Result<Response, ApiError> {
        let invalid_token = || {
            info!("invalid token");
            ApiError::NotFound("not found".into())
        };

        let id = request.get_param("id").ok_or_else(invalid_token)?;
        let token = AccessToken::from_hex(&id).map_err(|_| invalid_token())?;

        let bytes = self
            .cache
            .read_if_match(&token)?
            .ok_or_else(invalid_token)?;

        Ok(Response::from_data("image/jpeg", bytes))
    }
}
