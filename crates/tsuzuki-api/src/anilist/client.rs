use reqwest::Client;

use super::error::AniListError;
use super::types::{
    GraphQLResponse, MediaListResponse, PageResponse, SaveMediaListEntryResponse, ViewerResponse,
};
use crate::traits::{Catalog, CatalogMedia, ListEntry, ListEntryUpdate, SearchQuery};

const API_URL: &str = "https://graphql.anilist.co";

const SEARCH_QUERY: &str = r#"
query ($search: String, $onList: Boolean) {
    Page(perPage: 50) {
        media(search: $search, type: ANIME, onList: $onList) {
            id
            title { romaji english native }
            synonyms
            format
            duration
            episodes
            status
            startDate { year month day }
        }
    }
}
"#;

const VIEWER_QUERY: &str = r#"
query {
    Viewer {
        id
    }
}
"#;

const MEDIA_LIST_QUERY: &str = r#"
query ($userId: Int, $mediaId: Int) {
    MediaList(userId: $userId, mediaId: $mediaId, type: ANIME) {
        mediaId
        status
        progress
        repeat
    }
}
"#;

const SAVE_MEDIA_LIST_ENTRY_MUTATION: &str = r#"
mutation ($mediaId: Int, $progress: Int, $status: MediaListStatus) {
    SaveMediaListEntry(mediaId: $mediaId, progress: $progress, status: $status) {
        mediaId
        status
        progress
        repeat
    }
}
"#;

/// AniList GraphQL API client.
pub struct AniListClient {
    access_token: String,
    http: Client,
}

impl AniListClient {
    pub fn new(access_token: String) -> Self {
        Self {
            access_token,
            http: Client::new(),
        }
    }

    async fn graphql_request<T: serde::de::DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, AniListError> {
        tracing::debug!(operation, %variables, "AniList GraphQL request");

        let resp = self
            .http
            .post(API_URL)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(&serde_json::json!({
                "query": query,
                "variables": variables,
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(operation, status = status_code, "AniList API error");
            return Err(AniListError::Api {
                status: status_code,
                message: body,
            });
        }

        tracing::debug!(operation, status = %status, "AniList response received");
        let envelope = resp
            .json::<GraphQLResponse<T>>()
            .await
            .map_err(|e| AniListError::Parse(e.to_string()))?;
        envelope.into_data()
    }
}

impl Catalog for AniListClient {
    type Error = AniListError;

    async fn search_media(&self, query: &SearchQuery) -> Result<Vec<CatalogMedia>, AniListError> {
        // AniList treats an absent variable as "no filter".
        let mut vars = serde_json::json!({ "search": query.text });
        if let Some(on_list) = query.on_list {
            vars["onList"] = serde_json::json!(on_list);
        }

        let resp: PageResponse = self.graphql_request("Search", SEARCH_QUERY, vars).await?;
        Ok(resp.page.media.into_iter().map(Into::into).collect())
    }

    async fn viewer_id(&self) -> Result<u64, AniListError> {
        let resp: ViewerResponse = self
            .graphql_request("Viewer", VIEWER_QUERY, serde_json::json!({}))
            .await?;
        Ok(resp.viewer.id)
    }

    async fn list_entry(
        &self,
        user_id: u64,
        media_id: u64,
    ) -> Result<Option<ListEntry>, AniListError> {
        let result: Result<MediaListResponse, _> = self
            .graphql_request(
                "MediaList",
                MEDIA_LIST_QUERY,
                serde_json::json!({ "userId": user_id, "mediaId": media_id }),
            )
            .await;

        match result {
            Ok(resp) => Ok(resp.media_list.map(Into::into)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn save_list_entry(
        &self,
        media_id: u64,
        update: &ListEntryUpdate,
    ) -> Result<ListEntry, AniListError> {
        let mut vars = serde_json::json!({ "mediaId": media_id });
        if let Some(progress) = update.progress {
            vars["progress"] = serde_json::json!(progress);
        }
        if let Some(status) = update.status {
            vars["status"] = serde_json::json!(status.as_str());
        }

        let resp: SaveMediaListEntryResponse = self
            .graphql_request(
                "SaveMediaListEntry",
                SAVE_MEDIA_LIST_ENTRY_MUTATION,
                vars,
            )
            .await?;
        Ok(resp.entry.into())
    }
}
