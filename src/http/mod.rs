pub mod error;
pub mod server;

/// The one resource the asset server exposes. The same path is used to build
/// the image URL handed to the presence display.
pub const ART_RESOURCE_PATH: &str = "/album_image/current_album.jpg";
