//! The two-take generation controller.
//!
//! A [`Studio`] owns every piece of client state (phase, drafts, job slots,
//! the current error) and is driven through `&mut self`, so the polling loop
//! never races a user action: [`Studio::run_until`] drops the loop before
//! cancelling.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use riff_library::TrackStore;
use riff_types::{
    Contrast, JobStatus, JobStatusResponse, LibraryTrack, LyricsRequest, TrackDraft, Variant,
    clamp_duration, make_title, INSTRUMENTAL,
};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::drafts::{caption_with_tags, contrast_caption, extract_section, replace_section};
use crate::{
    ComposeOptions, SlotStatus, StudioApi, StudioError, StudioPhase, TickOutcome, TrackJob,
};

/// Number of takes produced per request.
pub const TAKES: usize = 2;
/// Upper bound for "generate longer".
pub const LONGER_MAX_DURATION: f64 = 120.0;
/// Seed offset applied when regenerating a single take.
pub const REGENERATE_SEED_OFFSET: i64 = 17;
/// Default polling period.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

const EMPTY_PROMPT: &str = "Please describe the music you want";
const SUBMIT_PARTIAL_FAILURE: &str = "Failed to submit both tracks. Please try again.";
const SUBMIT_FAILURE: &str = "Failed to submit generation request.";
const TAKE_FAILED: &str = "One of the tracks failed to generate.";
const SAVE_FAILED: &str = "Failed to save track locally.";
const STATUS_ERROR: &str = "Status error";
const GENERATION_FAILED: &str = "Generation failed";
const REWRITE_CHORUS_PROMPT: &str =
    "Rewrite only the chorus for this song. Return full lyrics with section markers.";

pub struct Studio<A, S> {
    api: A,
    store: S,
    phase: StudioPhase,
    drafts: Vec<TrackDraft>,
    jobs: Vec<TrackJob>,
    error: Option<String>,
    auto_save: bool,
    /// Job ids covered by the polling loop; empty when polling is stopped.
    polling: Vec<String>,
}

impl<A: StudioApi, S: TrackStore> Studio<A, S> {
    pub fn new(api: A, store: S) -> Self {
        Self {
            api,
            store,
            phase: StudioPhase::Compose,
            drafts: vec![TrackDraft::default(); TAKES],
            jobs: vec![TrackJob::default(); TAKES],
            error: None,
            auto_save: true,
            polling: Vec::new(),
        }
    }

    pub fn phase(&self) -> StudioPhase {
        self.phase
    }

    pub fn drafts(&self) -> &[TrackDraft] {
        &self.drafts
    }

    pub fn jobs(&self) -> &[TrackJob] {
        &self.jobs
    }

    /// The message to show the user, if the last action failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn auto_save(&self) -> bool {
        self.auto_save
    }

    /// Persist takes to the library as soon as their audio arrives.
    pub fn set_auto_save(&mut self, enabled: bool) {
        self.auto_save = enabled;
    }

    pub fn is_polling(&self) -> bool {
        !self.polling.is_empty()
    }

    pub fn polled_ids(&self) -> &[String] {
        &self.polling
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ── composition ─────────────────────────────────────────────────────────

    /// Draft two takes from a free-form description, asking the lyrics
    /// writer for words unless the request is instrumental.
    pub async fn prepare_smart(
        &mut self,
        prompt: &str,
        options: &ComposeOptions,
    ) -> Result<(), StudioError> {
        self.error = None;
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(self.reject(EMPTY_PROMPT));
        }
        let (seed_a, seed_b) = options.seeds();

        if options.instrumental {
            self.drafts = vec![
                options.draft(prompt.to_owned(), INSTRUMENTAL.to_owned(), seed_a),
                options.draft(
                    contrast_caption(prompt, options.contrast),
                    INSTRUMENTAL.to_owned(),
                    seed_b,
                ),
            ];
            self.phase = StudioPhase::PreviewLyrics;
            return Ok(());
        }

        self.phase = StudioPhase::WritingLyrics;
        let primary = match self.api.write_lyrics(&options.primary_request(prompt)).await {
            Ok(primary) => primary,
            Err(e) => return Err(self.fail(e)),
        };

        let (caption_b, lyrics_b) = if options.alt_lyrics {
            let request = options.alternate_request(prompt, &primary.caption, &primary.lyrics);
            match self.api.write_lyrics(&request).await {
                Ok(secondary) => (secondary.caption, secondary.lyrics),
                Err(e) => return Err(self.fail(e)),
            }
        } else {
            (contrast_caption(&primary.caption, options.contrast), primary.lyrics.clone())
        };

        self.drafts = vec![
            options.draft(primary.caption, primary.lyrics, seed_a),
            options.draft(caption_b, lyrics_b, seed_b),
        ];
        self.phase = StudioPhase::PreviewLyrics;
        Ok(())
    }

    /// Draft two takes from an explicit caption and optional lyrics.
    ///
    /// Style and negative tags are folded into the caption; take B's caption
    /// additionally carries the contrast instruction. Blank lyrics are drafted
    /// by the lyrics writer.
    pub async fn prepare_pro(
        &mut self,
        caption: &str,
        lyrics: &str,
        options: &ComposeOptions,
    ) -> Result<(), StudioError> {
        self.error = None;
        if caption.trim().is_empty() {
            return Err(self.reject(EMPTY_PROMPT));
        }
        let base = caption_with_tags(
            caption,
            options.style_tags.as_deref(),
            options.negative_tags.as_deref(),
        );
        let alt = contrast_caption(&base, options.contrast);
        let (seed_a, seed_b) = options.seeds();

        if options.instrumental {
            self.drafts = vec![
                options.draft(base, INSTRUMENTAL.to_owned(), seed_a),
                options.draft(alt, INSTRUMENTAL.to_owned(), seed_b),
            ];
            self.phase = StudioPhase::PreviewLyrics;
            return Ok(());
        }

        let mut primary_lyrics = lyrics.trim().to_owned();
        let mut secondary_lyrics = primary_lyrics.clone();

        if primary_lyrics.is_empty() {
            self.phase = StudioPhase::WritingLyrics;
            let primary = match self.api.write_lyrics(&options.primary_request(&base)).await {
                Ok(primary) => primary,
                Err(e) => return Err(self.fail(e)),
            };
            primary_lyrics = primary.lyrics;
            secondary_lyrics = primary_lyrics.clone();

            if options.alt_lyrics {
                let request = options.alternate_request(&base, &primary.caption, &primary_lyrics);
                match self.api.write_lyrics(&request).await {
                    Ok(secondary) => secondary_lyrics = secondary.lyrics,
                    Err(e) => return Err(self.fail(e)),
                }
            }
        } else if options.alt_lyrics {
            self.phase = StudioPhase::WritingLyrics;
            let request = options.alternate_request(&base, &base, &primary_lyrics);
            match self.api.write_lyrics(&request).await {
                Ok(secondary) => secondary_lyrics = secondary.lyrics,
                Err(e) => return Err(self.fail(e)),
            }
        }

        if secondary_lyrics.trim().is_empty() {
            secondary_lyrics = primary_lyrics.clone();
        }
        self.drafts = vec![
            options.draft(base, primary_lyrics, seed_a),
            options.draft(alt, secondary_lyrics, seed_b),
        ];
        self.phase = StudioPhase::PreviewLyrics;
        Ok(())
    }

    /// Edit one draft while previewing.
    pub fn update_draft(
        &mut self,
        index: usize,
        edit: impl FnOnce(&mut TrackDraft),
    ) -> Result<(), StudioError> {
        let draft = self.drafts.get_mut(index).ok_or(StudioError::InvalidIndex(index))?;
        edit(draft);
        Ok(())
    }

    /// Leave the preview without submitting.
    pub fn back_to_compose(&mut self) {
        self.phase = StudioPhase::Compose;
    }

    /// Ask the lyrics writer for a new chorus for one draft and splice it in.
    ///
    /// Instrumental drafts are left untouched.
    pub async fn rewrite_chorus(
        &mut self,
        index: usize,
        contrast: Contrast,
    ) -> Result<(), StudioError> {
        let draft = self.drafts.get(index).ok_or(StudioError::InvalidIndex(index))?;
        if draft.instrumental {
            return Ok(());
        }
        let request = LyricsRequest {
            variant: Some(Variant::Alternate),
            base_lyrics: Some(draft.lyrics.clone()),
            base_caption: Some(draft.caption.clone()),
            contrast: Some(contrast),
            ..LyricsRequest::new(REWRITE_CHORUS_PROMPT)
        };

        self.error = None;
        self.phase = StudioPhase::WritingLyrics;
        let result = self.api.write_lyrics(&request).await;
        self.phase = StudioPhase::PreviewLyrics;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e);
            }
        };
        let draft = &mut self.drafts[index];
        draft.lyrics = match extract_section(&response.lyrics, "Chorus") {
            Some(chorus) => replace_section(&draft.lyrics, "Chorus", &chorus),
            None => response.lyrics,
        };
        Ok(())
    }

    /// Upload source audio for cover, repaint, extend or extract tasks and
    /// return its storage path.
    pub async fn upload_source(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StudioError> {
        Ok(self.api.upload(file_name, content_type, bytes).await?.path)
    }

    // ── submission ──────────────────────────────────────────────────────────

    /// Submit every draft concurrently and start polling the new jobs.
    ///
    /// A partial failure cancels the jobs that were accepted and returns to
    /// compose.
    pub async fn submit_tracks(&mut self, drafts: Vec<TrackDraft>) -> Result<(), StudioError> {
        self.polling.clear();
        self.phase = StudioPhase::Queued;
        self.error = None;

        let params: Vec<_> = drafts.iter().map(TrackDraft::to_params).collect();
        self.drafts = drafts;
        let api = &self.api;
        let results = join_all(params.iter().map(|p| api.submit(p))).await;

        self.jobs = results
            .into_iter()
            .map(|result| match result {
                Ok(submitted) => {
                    info!(job_id = %submitted.job_id, position = submitted.position, "take submitted");
                    TrackJob::queued(submitted.job_id, submitted.position)
                }
                Err(e) => {
                    warn!(error = %e, "take submission failed");
                    TrackJob::failed(e.to_string())
                }
            })
            .collect();

        let ids = self.job_ids();
        if self.jobs.iter().any(|job| job.status == SlotStatus::Failed) {
            self.cancel_jobs(&ids).await;
            return Err(self.reject(SUBMIT_PARTIAL_FAILURE));
        }
        if ids.is_empty() {
            return Err(self.reject(SUBMIT_FAILURE));
        }
        self.polling = ids;
        Ok(())
    }

    /// Submit the drafts currently under review.
    pub async fn generate_from_preview(&mut self) -> Result<(), StudioError> {
        let drafts = self.drafts.clone();
        self.submit_tracks(drafts).await
    }

    /// Resubmit both drafts with a new duration.
    pub async fn generate_longer(&mut self, duration: f64) -> Result<(), StudioError> {
        let duration = clamp_duration(duration, LONGER_MAX_DURATION);
        for draft in &mut self.drafts {
            draft.duration = duration;
        }
        self.generate_from_preview().await
    }

    /// Resubmit a single take with a shifted seed, keeping the other slot.
    pub async fn regenerate_track(&mut self, index: usize) -> Result<(), StudioError> {
        let draft = self.drafts.get(index).ok_or(StudioError::InvalidIndex(index))?;
        let seed = draft.seed.map(|s| s.wrapping_add(REGENERATE_SEED_OFFSET));
        let params = draft.to_params_with_seed(seed);

        self.error = None;
        self.phase = StudioPhase::Queued;
        let submitted = match self.api.submit(&params).await {
            Ok(submitted) => submitted,
            Err(e) => return Err(self.fail(e)),
        };
        info!(index, job_id = %submitted.job_id, "take resubmitted");

        if self.jobs.len() <= index {
            self.jobs.resize_with(index + 1, TrackJob::default);
        }
        self.jobs[index] = TrackJob::queued(submitted.job_id, submitted.position);
        self.polling = self.job_ids();
        Ok(())
    }

    // ── polling ─────────────────────────────────────────────────────────────

    /// Query every polled job once and advance the slots.
    pub async fn poll_tick(&mut self) -> TickOutcome {
        if self.polling.is_empty() {
            return TickOutcome::Idle;
        }

        let api = &self.api;
        let responses = join_all(self.polling.iter().map(|id| api.status(id))).await;

        let mut updates = Vec::with_capacity(responses.len());
        for (id, response) in self.polling.iter().zip(responses) {
            match response {
                Ok(status) => updates.push((id.clone(), status)),
                Err(e) if e.is_rejection() => {
                    let mut failed = JobStatusResponse::new(JobStatus::Failed);
                    failed.error = Some(STATUS_ERROR.to_owned());
                    updates.push((id.clone(), failed));
                }
                Err(e) => {
                    debug!(job_id = %id, error = %e, "status check failed, retrying next tick");
                    return TickOutcome::Retry;
                }
            }
        }

        for (id, update) in updates {
            if let Some(job) = self.jobs.iter_mut().find(|job| job.id.as_deref() == Some(&id)) {
                apply_status(job, update);
            }
        }

        self.fetch_pending_audio().await;
        self.settle().await
    }

    /// Poll every `interval` until the jobs settle. The first poll happens
    /// one interval after the call.
    pub async fn run_polling(&mut self, interval: Duration) -> TickOutcome {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let outcome = self.poll_tick().await;
            if outcome.is_terminal() {
                return outcome;
            }
        }
    }

    /// [`Self::run_polling`] raced against `shutdown`; on shutdown the jobs
    /// are cancelled and `None` is returned.
    pub async fn run_until(
        &mut self,
        interval: Duration,
        shutdown: impl Future<Output = ()>,
    ) -> Option<TickOutcome> {
        let outcome = tokio::select! {
            outcome = self.run_polling(interval) => Some(outcome),
            _ = shutdown => None,
        };
        if outcome.is_none() {
            info!("generation interrupted, cancelling jobs");
            self.cancel().await;
        }
        outcome
    }

    async fn fetch_pending_audio(&mut self) {
        let pending: Vec<(usize, String, Option<u32>)> = self
            .jobs
            .iter()
            .enumerate()
            .filter(|(_, job)| job.needs_audio())
            .filter_map(|(i, job)| job.id.clone().map(|id| (i, id, job.audio_index)))
            .collect();
        if pending.is_empty() {
            return;
        }

        let api = &self.api;
        let fetched = join_all(
            pending.iter().map(|(_, id, audio_index)| api.fetch_audio(id, *audio_index)),
        )
        .await;

        for ((index, id, _), result) in pending.into_iter().zip(fetched) {
            match result {
                Ok(audio) => {
                    debug!(job_id = %id, bytes = audio.bytes.len(), "audio fetched");
                    self.jobs[index].audio = Some(audio);
                    if self.auto_save {
                        if let Err(e) = self.persist(index).await {
                            warn!(job_id = %id, error = %e, "auto-save failed");
                        }
                    }
                }
                Err(e) => warn!(job_id = %id, error = %e, "audio fetch failed, retrying next tick"),
            }
        }
    }

    async fn settle(&mut self) -> TickOutcome {
        // Slots with no job (e.g. a cancelled sibling of a regenerated take)
        // do not hold the batch open.
        let mut submitted = self.jobs.iter().filter(|job| job.id.is_some()).peekable();
        let all_complete = submitted.peek().is_some()
            && submitted.all(|job| job.status == SlotStatus::Complete && !job.needs_audio());
        if all_complete {
            self.polling.clear();
            self.phase = StudioPhase::Player;
            info!("all takes ready");
            return TickOutcome::Finished;
        }

        if self.jobs.iter().any(|job| job.status == SlotStatus::Failed) {
            self.polling.clear();
            let active: Vec<String> = self
                .jobs
                .iter()
                .filter(|job| job.status.is_active())
                .filter_map(|job| job.id.clone())
                .collect();
            self.cancel_jobs(&active).await;
            warn!(cancelled = active.len(), "take failed");
            self.error = Some(TAKE_FAILED.to_owned());
            self.phase = StudioPhase::Compose;
            return TickOutcome::Failed;
        }

        if self.jobs.iter().any(|job| job.status == SlotStatus::Generating) {
            self.phase = StudioPhase::Generating;
        } else if self.jobs.iter().any(|job| job.status == SlotStatus::Queued) {
            self.phase = StudioPhase::Queued;
        }
        TickOutcome::Continue
    }

    // ── cancellation ────────────────────────────────────────────────────────

    /// Stop polling, cancel every known job and return to compose.
    pub async fn cancel(&mut self) {
        self.polling.clear();
        let ids = self.job_ids();
        self.cancel_jobs(&ids).await;
        self.jobs = vec![TrackJob::default(); TAKES];
        self.phase = StudioPhase::Compose;
    }

    /// Forget everything and return to an empty compose screen.
    pub fn reset(&mut self) {
        self.polling.clear();
        self.drafts = vec![TrackDraft::default(); TAKES];
        self.jobs = vec![TrackJob::default(); TAKES];
        self.error = None;
        self.auto_save = true;
        self.phase = StudioPhase::Compose;
    }

    async fn cancel_jobs(&self, ids: &[String]) {
        let api = &self.api;
        let results = join_all(ids.iter().map(|id| api.cancel(id))).await;
        for (id, result) in ids.iter().zip(results) {
            match result {
                Ok(cancelled) => debug!(job_id = %id, cancelled, "cancel requested"),
                Err(e) => debug!(job_id = %id, error = %e, "cancel failed"),
            }
        }
    }

    // ── library ─────────────────────────────────────────────────────────────

    /// Save a fetched take to the library.
    ///
    /// Returns `Ok(false)` when the slot has no audio yet.
    pub async fn save_track(&mut self, index: usize) -> Result<bool, StudioError> {
        if index >= self.jobs.len() {
            return Err(StudioError::InvalidIndex(index));
        }
        match self.persist(index).await {
            Ok(saved) => Ok(saved),
            Err(e) => {
                warn!(index, error = %e, "saving track failed");
                self.error = Some(SAVE_FAILED.to_owned());
                Err(StudioError::Failed(SAVE_FAILED.to_owned()))
            }
        }
    }

    async fn persist(&mut self, index: usize) -> Result<bool, StudioError> {
        let (Some(job), Some(draft)) = (self.jobs.get(index), self.drafts.get(index)) else {
            return Ok(false);
        };
        let (Some(id), Some(audio)) = (job.id.as_ref(), job.audio.as_ref()) else {
            return Ok(false);
        };
        let track = LibraryTrack {
            id: id.clone(),
            title: make_title(&draft.caption),
            caption: draft.caption.clone(),
            lyrics: draft.lyrics.clone(),
            duration: draft.duration,
            created_at: Utc::now().timestamp_millis(),
            audio: audio.bytes.to_vec(),
        };
        self.store.save_track(track).await?;
        self.jobs[index].saved = true;
        Ok(true)
    }

    // ── helpers ─────────────────────────────────────────────────────────────

    fn job_ids(&self) -> Vec<String> {
        self.jobs.iter().filter_map(|job| job.id.clone()).collect()
    }

    /// Record `message`, return to compose, and hand back the error.
    fn reject(&mut self, message: &str) -> StudioError {
        self.error = Some(message.to_owned());
        self.phase = StudioPhase::Compose;
        StudioError::Failed(message.to_owned())
    }

    fn fail(&mut self, error: StudioError) -> StudioError {
        self.error = Some(error.to_string());
        self.phase = StudioPhase::Compose;
        error
    }
}

fn apply_status(job: &mut TrackJob, update: JobStatusResponse) {
    match update.status {
        JobStatus::Complete => {
            job.status = SlotStatus::Complete;
            job.position = 0;
            job.error = None;
            if update.audio_urls.as_ref().is_some_and(|urls| !urls.is_empty()) {
                job.audio_index = Some(0);
            } else if update.audio_url.is_none() && update.extract_metadata.is_some() {
                job.extract_metadata = update.extract_metadata;
            }
        }
        JobStatus::Failed | JobStatus::Cancelled => {
            job.status = SlotStatus::Failed;
            job.error = Some(update.error.unwrap_or_else(|| GENERATION_FAILED.to_owned()));
        }
        JobStatus::Generating => {
            job.status = SlotStatus::Generating;
            job.position = 0;
        }
        JobStatus::Queued => {
            job.status = SlotStatus::Queued;
            job.position = update.position.unwrap_or(0);
        }
        JobStatus::Unknown => {}
    }
}
