//! Gallery of saved image pairs.

use maskpaint_shared::ImagePair;

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::lifecycle::{RequestSequence, RequestToken};
use crate::notice::{self, Notice};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(usize),
    Failed(ApiError),
    Stale,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeleteTicket {
    pub id: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { id: i64 },
    Failed { id: i64, error: ApiError },
}

impl DeleteOutcome {
    pub fn notice(&self) -> Option<Notice> {
        match self {
            DeleteOutcome::Deleted { .. } => None,
            DeleteOutcome::Failed { .. } => Some(Notice::failure(notice::DELETE_FAILED)),
        }
    }
}

#[derive(Debug, Default)]
pub struct GalleryState {
    pairs: Vec<ImagePair>,
    loading: bool,
    loads: RequestSequence,
}

impl GalleryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pairs(&self) -> &[ImagePair] {
        &self.pairs
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn begin_load(&mut self) -> RequestToken {
        self.loading = true;
        self.loads.next()
    }

    /// Applies a listing if it answers the latest load. A failed load keeps
    /// whatever was shown before.
    pub fn finish_load(
        &mut self,
        token: RequestToken,
        result: Result<Vec<ImagePair>, ApiError>,
    ) -> LoadOutcome {
        if !self.loads.is_latest(token) {
            log::debug!("Discarding stale gallery listing token={}", token.value());
            return LoadOutcome::Stale;
        }
        self.loading = false;
        match result {
            Ok(pairs) => {
                let count = pairs.len();
                log::debug!("Gallery loaded {count} image pairs");
                self.pairs = pairs;
                LoadOutcome::Loaded(count)
            }
            Err(error) => {
                log::error!("Error fetching images: {error}");
                LoadOutcome::Failed(error)
            }
        }
    }

    /// `None` when the user declined the confirmation. Nothing is sent then.
    pub fn begin_delete(&self, id: i64, confirmed: bool) -> Option<DeleteTicket> {
        if !confirmed {
            log::debug!("Delete of image pair {id} cancelled");
            return None;
        }
        Some(DeleteTicket { id })
    }

    pub fn finish_delete(
        &mut self,
        ticket: DeleteTicket,
        result: Result<(), ApiError>,
    ) -> DeleteOutcome {
        let id = ticket.id;
        match result {
            Ok(()) => {
                self.pairs.retain(|pair| pair.id != id);
                // A listing requested before the delete may still hold the pair.
                self.loads.invalidate();
                self.loading = false;
                log::info!("Deleted image pair {id}");
                DeleteOutcome::Deleted { id }
            }
            Err(error) => {
                log::error!("Error deleting image {id}: {error}");
                DeleteOutcome::Failed { id, error }
            }
        }
    }

    pub async fn refresh(&mut self, api: &ApiClient) -> LoadOutcome {
        let token = self.begin_load();
        let result = api.list_images().await;
        self.finish_load(token, result)
    }

    /// Asks `confirm` first and deletes only on a yes.
    pub async fn delete(
        &mut self,
        api: &ApiClient,
        id: i64,
        confirm: impl FnOnce(&str) -> bool,
    ) -> Option<DeleteOutcome> {
        let ticket = self.begin_delete(id, confirm(notice::DELETE_CONFIRMATION))?;
        let result = api.delete_image(ticket.id).await;
        Some(self.finish_delete(ticket, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(id: i64) -> ImagePair {
        ImagePair {
            id,
            original_url: format!("/images/{id}/original.png"),
            mask_url: format!("/images/{id}/mask.png"),
            created_at: "2024-03-09 17:04:11".into(),
        }
    }

    fn loaded(ids: &[i64]) -> GalleryState {
        let mut gallery = GalleryState::new();
        let token = gallery.begin_load();
        gallery.finish_load(token, Ok(ids.iter().copied().map(pair).collect()));
        gallery
    }

    fn ids(gallery: &GalleryState) -> Vec<i64> {
        gallery.pairs().iter().map(|pair| pair.id).collect()
    }

    #[test]
    fn loading_flag_tracks_latest_request() {
        let mut gallery = GalleryState::new();
        assert!(!gallery.is_loading());
        let token = gallery.begin_load();
        assert!(gallery.is_loading());
        assert_eq!(gallery.finish_load(token, Ok(vec![pair(1)])), LoadOutcome::Loaded(1));
        assert!(!gallery.is_loading());
    }

    #[test]
    fn out_of_order_listing_is_dropped() {
        let mut gallery = GalleryState::new();
        let older = gallery.begin_load();
        let newer = gallery.begin_load();
        gallery.finish_load(newer, Ok(vec![pair(2), pair(3)]));
        assert_eq!(gallery.finish_load(older, Ok(vec![pair(1)])), LoadOutcome::Stale);
        assert_eq!(ids(&gallery), vec![2, 3]);
    }

    #[test]
    fn failed_listing_keeps_previous_pairs() {
        let mut gallery = loaded(&[1, 2]);
        let token = gallery.begin_load();
        let outcome = gallery.finish_load(token, Err(ApiError::Transport("offline".into())));
        assert!(matches!(outcome, LoadOutcome::Failed(_)));
        assert!(!gallery.is_loading());
        assert_eq!(ids(&gallery), vec![1, 2]);
    }

    #[test]
    fn declined_delete_sends_nothing() {
        let gallery = loaded(&[1, 2, 3]);
        assert_eq!(gallery.begin_delete(2, false), None);
        assert_eq!(gallery.begin_delete(2, true), Some(DeleteTicket { id: 2 }));
    }

    #[test]
    fn delete_removes_only_that_pair_in_order() {
        let mut gallery = loaded(&[1, 2, 3, 4]);
        let ticket = gallery.begin_delete(3, true).unwrap();
        let outcome = gallery.finish_delete(ticket, Ok(()));
        assert_eq!(outcome, DeleteOutcome::Deleted { id: 3 });
        assert_eq!(outcome.notice(), None);
        assert_eq!(ids(&gallery), vec![1, 2, 4]);
    }

    #[test]
    fn listing_older_than_a_delete_does_not_restore_the_pair() {
        let mut gallery = loaded(&[1, 2, 3]);
        let pending = gallery.begin_load();
        let ticket = gallery.begin_delete(2, true).unwrap();
        gallery.finish_delete(ticket, Ok(()));
        assert!(!gallery.is_loading());
        let late = gallery.finish_load(pending, Ok(vec![pair(1), pair(2), pair(3)]));
        assert_eq!(late, LoadOutcome::Stale);
        assert_eq!(ids(&gallery), vec![1, 3]);

        let token = gallery.begin_load();
        gallery.finish_load(token, Ok(vec![pair(1), pair(3), pair(4)]));
        assert_eq!(ids(&gallery), vec![1, 3, 4]);
    }

    #[test]
    fn failed_delete_keeps_pairs_and_notifies() {
        let mut gallery = loaded(&[1, 2]);
        let ticket = gallery.begin_delete(1, true).unwrap();
        let outcome = gallery.finish_delete(
            ticket,
            Err(ApiError::Status {
                status: 404,
                body: String::new(),
            }),
        );
        assert_eq!(outcome.notice(), Some(Notice::failure(notice::DELETE_FAILED)));
        assert_eq!(ids(&gallery), vec![1, 2]);
    }
}
