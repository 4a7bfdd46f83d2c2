//! Hashtag, music, and genre catalogs.

use serde_json::Value;

use super::client::{ApiClient, ApiError, FormData};
use super::types::{Genre, Hashtag, Track};
use super::{envelope, with_query};

/// List hashtags, optionally filtered (`search`, `limit`, ...).
pub async fn hashtags(api: &ApiClient, params: &[(&str, String)]) -> Result<Vec<Hashtag>, ApiError> {
    let value = api.get(&with_query("/hashtags/", params)).await?;
    Ok(envelope::parse_rows(&value))
}

/// List music tracks.
pub async fn music(api: &ApiClient, params: &[(&str, String)]) -> Result<Vec<Track>, ApiError> {
    let value = api.get(&with_query("/musics/", params)).await?;
    Ok(envelope::parse_rows(&value))
}

/// Upload a music track: audio file plus a title, optional artist.
pub async fn music_upload(
    api: &ApiClient,
    file_name: &str,
    mime: &str,
    bytes: Vec<u8>,
    title: &str,
    artist: Option<&str>,
) -> Result<Value, ApiError> {
    let mut form = FormData::new()
        .file("audio", file_name, mime, bytes)
        .text("title", title);
    if let Some(artist) = artist {
        form = form.text("artist", artist);
    }
    api.post_form("/musics/", form).await
}

/// List post genres.
pub async fn genres(api: &ApiClient) -> Result<Vec<Genre>, ApiError> {
    let value = api.get("/posts/genres/").await?;
    Ok(envelope::parse_rows(&value))
}
