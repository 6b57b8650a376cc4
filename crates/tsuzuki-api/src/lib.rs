//! AniList catalog client and the [`Catalog`] trait the core is generic over.

pub mod anilist;
pub mod traits;

pub use traits::{
    AiringStatus, Catalog, CatalogMedia, ListEntry, ListEntryUpdate, ListStatus, MediaFormat,
    MediaTitle, SearchQuery, StartDate,
};
