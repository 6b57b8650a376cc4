//! In-memory catalog shared by the resolver and pipeline tests.

use std::collections::HashMap;
use std::sync::Mutex;

use tsuzuki_api::{
    AiringStatus, Catalog, CatalogMedia, ListEntry, ListEntryUpdate, ListStatus, MediaFormat,
    MediaTitle, SearchQuery, StartDate,
};

use crate::normalize::normalize;

pub const VIEWER_ID: u64 = 5120;

#[derive(Debug, thiserror::Error)]
#[error("catalog offline")]
pub struct Offline;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Search(SearchQuery),
    Viewer,
    ListEntry(u64),
    Save(u64, ListEntryUpdate),
}

/// A finished TV season with 24-minute episodes starting in April of `year`.
pub fn season(id: u64, romaji: &str, year: u32, episodes: Option<u32>) -> CatalogMedia {
    CatalogMedia {
        id,
        title: MediaTitle {
            romaji: Some(romaji.into()),
            ..Default::default()
        },
        synonyms: Vec::new(),
        format: Some(MediaFormat::Tv),
        duration: Some(24),
        episodes,
        status: Some(AiringStatus::Finished),
        start_date: Some(StartDate {
            year: Some(year),
            month: Some(4),
            day: Some(1),
        }),
    }
}

#[derive(Default)]
struct State {
    list: HashMap<u64, ListEntry>,
    calls: Vec<Call>,
    offline: bool,
}

pub struct FakeCatalog {
    media: Vec<CatalogMedia>,
    state: Mutex<State>,
}

impl FakeCatalog {
    pub fn new(media: Vec<CatalogMedia>) -> Self {
        Self {
            media,
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_entry(self, media_id: u64, status: ListStatus, progress: u32) -> Self {
        self.state.lock().unwrap().list.insert(
            media_id,
            ListEntry {
                media_id,
                status,
                progress,
                repeat: 0,
            },
        );
        self
    }

    pub fn fail_requests(&self) {
        self.state.lock().unwrap().offline = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn saves(&self) -> Vec<(u64, ListEntryUpdate)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Save(id, update) => Some((id, update)),
                _ => None,
            })
            .collect()
    }

    pub fn entry(&self, media_id: u64) -> Option<ListEntry> {
        self.state.lock().unwrap().list.get(&media_id).copied()
    }

    fn record(&self, call: Call) -> Result<(), Offline> {
        let mut state = self.state.lock().unwrap();
        if state.offline {
            return Err(Offline);
        }
        state.calls.push(call);
        Ok(())
    }
}

impl Catalog for FakeCatalog {
    type Error = Offline;

    async fn search_media(&self, query: &SearchQuery) -> Result<Vec<CatalogMedia>, Offline> {
        self.record(Call::Search(query.clone()))?;
        let wanted = normalize(&query.text);
        let state = self.state.lock().unwrap();
        Ok(self
            .media
            .iter()
            .filter(|media| media.all_titles().any(|t| normalize(t).starts_with(&wanted)))
            .filter(|media| query.on_list != Some(true) || state.list.contains_key(&media.id))
            .cloned()
            .collect())
    }

    async fn viewer_id(&self) -> Result<u64, Offline> {
        self.record(Call::Viewer)?;
        Ok(VIEWER_ID)
    }

    async fn list_entry(&self, _user_id: u64, media_id: u64) -> Result<Option<ListEntry>, Offline> {
        self.record(Call::ListEntry(media_id))?;
        Ok(self.entry(media_id))
    }

    async fn save_list_entry(
        &self,
        media_id: u64,
        update: &ListEntryUpdate,
    ) -> Result<ListEntry, Offline> {
        self.record(Call::Save(media_id, *update))?;
        let mut state = self.state.lock().unwrap();
        let entry = state.list.entry(media_id).or_insert(ListEntry {
            media_id,
            status: ListStatus::Current,
            progress: 0,
            repeat: 0,
        });
        if let Some(status) = update.status {
            entry.status = status;
        }
        if let Some(progress) = update.progress {
            entry.progress = progress;
        }
        Ok(*entry)
    }
}
