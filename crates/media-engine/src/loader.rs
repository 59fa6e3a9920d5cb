//! Segment Loader: double-buffered handle swaps behind a loading guard
//!
//! A swap creates the next handle next to the current one and only removes
//! the old handle once the new one reports `CanPlay`. While a swap is in
//! flight every further swap request is rejected.

use crate::error::{EngineError, EngineResult};
use crate::media::{
    bind, HandleId, LoadRequest, MediaFactory, MediaHandle, SignalEnvelope, Subscription,
};
use crate::timeline::Segment;
use crossbeam_channel::Sender;
use seamline_config::Preload;

struct BoundHandle {
    id: HandleId,
    /// `None` for the poster handle, which never counts as loaded
    segment: Option<usize>,
    media: Box<dyn MediaHandle>,
    subscription: Subscription,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    Started(HandleId),
    /// Another swap is still in flight
    Rejected,
}

pub struct SegmentLoader {
    factory: Box<dyn MediaFactory>,
    signals: Sender<SignalEnvelope>,
    container: Option<String>,
    next_id: u64,
    current: Option<BoundHandle>,
    previous: Option<BoundHandle>,
    loading: bool,
}

impl SegmentLoader {
    pub fn new(
        factory: Box<dyn MediaFactory>,
        signals: Sender<SignalEnvelope>,
        container: Option<String>,
    ) -> Self {
        Self {
            factory,
            signals,
            container,
            next_id: 0,
            current: None,
            previous: None,
            loading: false,
        }
    }

    /// Creates the initial visible handle for `segment` without loading it
    pub fn install_poster(
        &mut self,
        segment: &Segment,
        preload: Preload,
        volume: f64,
    ) -> EngineResult<HandleId> {
        if self.current.is_some() {
            return Err(EngineError::InvalidState(
                "poster requested after media was loaded".to_string(),
            ));
        }

        let request = self.request_for(segment, preload, true);
        let mut bound = self.create(&request, None)?;
        bound.media.set_volume(volume);
        bound.media.set_current(true);

        let id = bound.id;
        self.current = Some(bound);
        log::debug!("Poster {} created for {}", id, segment.url);
        Ok(id)
    }

    /// Starts loading `segment`, positioned at `offset_secs`
    ///
    /// The new handle becomes current right away so its signals are accepted,
    /// but the old one stays in the presentation layer until [`complete`].
    ///
    /// [`complete`]: SegmentLoader::complete
    pub fn swap_to(
        &mut self,
        segment: &Segment,
        offset_secs: f64,
        volume: f64,
    ) -> EngineResult<SwapOutcome> {
        if self.loading {
            log::debug!("Swap to segment {} rejected, transition in flight", segment.index);
            return Ok(SwapOutcome::Rejected);
        }

        let request = self.request_for(segment, Preload::Auto, false);
        let mut bound = self.create(&request, Some(segment.index))?;

        bound.media.set_volume(volume);
        if offset_secs != 0.0 {
            bound.media.seek(offset_secs);
        }

        if let Some(old) = self.current.as_mut() {
            old.media.pause();
        }

        let id = bound.id;
        self.loading = true;
        self.previous = self.current.replace(bound);
        log::debug!(
            "Loading segment {} into {} at {:.3}s",
            segment.index,
            id,
            offset_secs
        );
        Ok(SwapOutcome::Started(id))
    }

    /// Finishes the swap that created `handle`
    ///
    /// Returns false for a stale or repeated completion.
    pub fn complete(&mut self, handle: HandleId) -> bool {
        if !self.loading || self.current_id() != Some(handle) {
            return false;
        }

        if let Some(old) = self.previous.take() {
            self.release(old);
        }
        if let Some(current) = self.current.as_mut() {
            current.media.set_current(true);
        }
        self.loading = false;
        log::debug!("Swap to {} complete", handle);
        true
    }

    /// Gives up on the in-flight swap after a media failure
    ///
    /// The failed handle stays current so the failure remains visible.
    pub fn abort(&mut self) {
        if let Some(old) = self.previous.take() {
            self.release(old);
        }
        self.loading = false;
    }

    /// Removes every handle from the presentation layer
    pub fn teardown(&mut self) {
        if let Some(old) = self.previous.take() {
            self.release(old);
        }
        if let Some(current) = self.current.take() {
            self.release(current);
        }
        self.loading = false;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn current_id(&self) -> Option<HandleId> {
        self.current.as_ref().map(|b| b.id)
    }

    /// Segment of the current handle; `None` before anything was loaded
    pub fn current_segment(&self) -> Option<usize> {
        self.current.as_ref().and_then(|b| b.segment)
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    pub fn media(&self) -> Option<&dyn MediaHandle> {
        self.current.as_ref().map(|b| b.media.as_ref())
    }

    pub fn media_mut(&mut self) -> Option<&mut (dyn MediaHandle + 'static)> {
        self.current.as_mut().map(|b| b.media.as_mut())
    }

    fn request_for(&self, segment: &Segment, preload: Preload, current: bool) -> LoadRequest {
        LoadRequest {
            url: segment.url.clone(),
            segment_index: segment.index,
            preload,
            container: self.container.clone(),
            duration_secs: segment.duration_secs,
            current,
        }
    }

    fn create(
        &mut self,
        request: &LoadRequest,
        segment: Option<usize>,
    ) -> EngineResult<BoundHandle> {
        let mut media =
            self.factory
                .create(request)
                .map_err(|e| EngineError::MediaLoadFailure {
                    url: request.url.clone(),
                    reason: e.message,
                })?;

        self.next_id += 1;
        let id = HandleId(self.next_id);
        let subscription = bind(media.as_mut(), id, self.signals.clone());

        Ok(BoundHandle {
            id,
            segment,
            media,
            subscription,
        })
    }

    fn release(&mut self, bound: BoundHandle) {
        let BoundHandle {
            id,
            mut media,
            subscription,
            ..
        } = bound;
        drop(subscription);
        media.pause();
        self.factory.remove(media);
        log::trace!("Removed {}", id);
    }
}

impl Drop for SegmentLoader {
    fn drop(&mut self) {
        self.teardown();
    }
}
