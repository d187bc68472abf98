// YouTube playlists (export only)

use super::dto::{PageDto, PlaylistDto};
use super::YouTubeProvider;
use crate::http::{map_transport_error, pause_between_pages, RawResponse};
use reqwest::StatusCode;
use subsync_core::domain::ContentItem;
use subsync_core::port::ProviderError;
use tracing::info;

impl YouTubeProvider {
    pub(super) async fn list_playlists(
        &self,
        access_token: &str,
    ) -> Result<Vec<ContentItem>, ProviderError> {
        let mut playlists = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("part", "snippet,status,contentDetails".to_string()),
                ("mine", "true".to_string()),
                ("maxResults", "50".to_string()),
            ];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let response = self
                .client
                .get(self.endpoints.api("/youtube/v3/playlists"))
                .bearer_auth(access_token)
                .query(&query)
                .send()
                .await
                .map_err(map_transport_error)?;

            let raw = RawResponse::read(response).await?;
            if raw.status == StatusCode::UNAUTHORIZED {
                return Err(ProviderError::AuthExpired);
            }
            if !raw.is_success() {
                return Err(raw.unknown());
            }

            let page: PageDto<PlaylistDto> = raw.decode("playlist listing")?;
            playlists.extend(page.items.into_iter().map(PlaylistDto::into_content));

            page_token = page.next_page_token.filter(|t| !t.is_empty());
            if page_token.is_none() {
                break;
            }
            pause_between_pages(self.settings.page_delay).await;
        }

        info!(platform = "youtube", count = playlists.len(), "Playlists fetched");
        Ok(playlists)
    }
}
