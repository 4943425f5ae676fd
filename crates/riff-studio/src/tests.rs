use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use bytes::Bytes;
use riff_library::{MemoryLibrary, TrackStore};
use riff_types::{
    Contrast, GenerateParams, INSTRUMENTAL, JobStatus, JobStatusResponse, LyricsRequest,
    LyricsResponse, SubmitResponse, UploadResponse, Variant,
};
use tracing_test::traced_test;

use crate::*;

/// Scripted status reply.
#[derive(Clone)]
enum Reply {
    Status(JobStatusResponse),
    Rejected,
    Offline,
}

fn status(s: JobStatus) -> Reply {
    Reply::Status(JobStatusResponse::new(s))
}

fn queued_at(position: u32) -> Reply {
    let mut r = JobStatusResponse::new(JobStatus::Queued);
    r.position = Some(position);
    Reply::Status(r)
}

fn failed_with(error: &str) -> Reply {
    let mut r = JobStatusResponse::new(JobStatus::Failed);
    r.error = Some(error.into());
    Reply::Status(r)
}

#[derive(Default)]
struct FakeApi {
    /// Job ids handed out in order; `None` makes that submission fail.
    submit_ids: Mutex<VecDeque<Option<String>>>,
    submitted: Mutex<Vec<GenerateParams>>,
    /// Per-job replies; the last one repeats.
    statuses: Mutex<HashMap<String, VecDeque<Reply>>>,
    cancelled: Mutex<Vec<String>>,
    audio_fetches: Mutex<Vec<(String, Option<u32>)>>,
    audio_failures: Mutex<HashSet<String>>,
    lyrics: Mutex<VecDeque<Result<LyricsResponse, String>>>,
    lyrics_requests: Mutex<Vec<LyricsRequest>>,
}

impl FakeApi {
    fn with_ids(ids: &[Option<&str>]) -> Self {
        let api = Self::default();
        *api.submit_ids.lock().unwrap() = ids.iter().map(|id| id.map(str::to_owned)).collect();
        api
    }

    fn script(&self, id: &str, replies: Vec<Reply>) {
        self.statuses.lock().unwrap().insert(id.to_owned(), replies.into());
    }

    fn lyrics_reply(&self, caption: &str, lyrics: &str) {
        self.lyrics.lock().unwrap().push_back(Ok(LyricsResponse {
            caption: caption.into(),
            lyrics: lyrics.into(),
        }));
    }

    fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().unwrap().clone()
    }

    fn fetches_for(&self, id: &str) -> usize {
        self.audio_fetches.lock().unwrap().iter().filter(|(j, _)| j == id).count()
    }
}

impl StudioApi for FakeApi {
    async fn submit(&self, params: &GenerateParams) -> Result<SubmitResponse, StudioError> {
        self.submitted.lock().unwrap().push(params.clone());
        match self.submit_ids.lock().unwrap().pop_front().flatten() {
            Some(job_id) => Ok(SubmitResponse { job_id, position: 3 }),
            None => Err(StudioError::Rejected {
                status: 500,
                message: "Failed to submit. Please try again.".into(),
            }),
        }
    }

    async fn status(&self, job_id: &str) -> Result<JobStatusResponse, StudioError> {
        let mut statuses = self.statuses.lock().unwrap();
        let queue = statuses.get_mut(job_id).expect("unscripted job");
        let reply = if queue.len() > 1 { queue.pop_front() } else { queue.front().cloned() };
        match reply.expect("empty script") {
            Reply::Status(s) => Ok(s),
            Reply::Rejected => Err(StudioError::Rejected { status: 404, message: "Job not found".into() }),
            Reply::Offline => Err(StudioError::Transport("connection refused".into())),
        }
    }

    async fn cancel(&self, job_id: &str) -> Result<bool, StudioError> {
        self.cancelled.lock().unwrap().push(job_id.to_owned());
        Ok(true)
    }

    async fn fetch_audio(&self, job_id: &str, index: Option<u32>) -> Result<AudioFile, StudioError> {
        self.audio_fetches.lock().unwrap().push((job_id.to_owned(), index));
        if self.audio_failures.lock().unwrap().remove(job_id) {
            return Err(StudioError::Rejected { status: 404, message: "Audio not found".into() });
        }
        Ok(AudioFile {
            bytes: Bytes::from(format!("audio-{job_id}")),
            content_type: "audio/mpeg".into(),
        })
    }

    async fn write_lyrics(&self, request: &LyricsRequest) -> Result<LyricsResponse, StudioError> {
        self.lyrics_requests.lock().unwrap().push(request.clone());
        match self.lyrics.lock().unwrap().pop_front().expect("unscripted lyrics call") {
            Ok(r) => Ok(r),
            Err(message) => Err(StudioError::Rejected { status: 500, message }),
        }
    }

    async fn upload(&self, file_name: &str, _: &str, _: Vec<u8>) -> Result<UploadResponse, StudioError> {
        Ok(UploadResponse { path: format!("/audio/uploads/{file_name}") })
    }
}

type TestStudio = Studio<FakeApi, MemoryLibrary>;

fn studio(api: FakeApi) -> TestStudio {
    Studio::new(api, MemoryLibrary::new())
}

fn draft(caption: &str) -> riff_types::TrackDraft {
    riff_types::TrackDraft {
        caption: caption.into(),
        lyrics: "[Verse]\nhello".into(),
        seed: Some(100),
        ..Default::default()
    }
}

/// A studio with two submitted takes, `a` and `b`.
async fn submitted(api: FakeApi) -> TestStudio {
    let mut studio = studio(api);
    studio
        .submit_tracks(vec![draft("Dreamy synthwave. Night drive"), draft("Punk rock")])
        .await
        .unwrap();
    studio
}

// ── composition ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn smart_flow_drafts_two_lyric_sets() {
    let api = FakeApi::default();
    api.lyrics_reply("Sunny indie pop", "[Verse]\nA words");
    api.lyrics_reply("Moody indie folk", "[Verse]\nB words");
    let mut studio = studio(api);

    let options = ComposeOptions { alt_lyrics: true, seed: Some(7), contrast: Contrast::Bold, ..Default::default() };
    studio.prepare_smart("  summer road trip ", &options).await.unwrap();

    assert_eq!(studio.phase(), StudioPhase::PreviewLyrics);
    let drafts = studio.drafts();
    assert_eq!(drafts[0].caption, "Sunny indie pop");
    assert_eq!(drafts[1].lyrics, "[Verse]\nB words");
    assert_eq!((drafts[0].seed, drafts[1].seed), (Some(7), Some(8)));

    let requests = studio.api().lyrics_requests.lock().unwrap();
    assert_eq!(requests[0].prompt.as_deref(), Some("summer road trip"));
    assert_eq!(requests[1].variant, Some(Variant::Alternate));
    assert_eq!(requests[1].base_caption.as_deref(), Some("Sunny indie pop"));
    assert_eq!(requests[1].contrast, Some(Contrast::Bold));
}

#[tokio::test]
async fn smart_flow_reuses_lyrics_without_alt() {
    let api = FakeApi::default();
    api.lyrics_reply("Lo-fi beats", "[Verse]\nsame words");
    let mut studio = studio(api);

    studio.prepare_smart("study music", &ComposeOptions::default()).await.unwrap();

    let drafts = studio.drafts();
    assert_eq!(drafts[1].lyrics, drafts[0].lyrics);
    assert_eq!(drafts[1].caption, contrast_caption("Lo-fi beats", Contrast::Balanced));
    assert_eq!(studio.api().lyrics_requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn instrumental_skips_the_lyrics_writer() {
    let mut studio = studio(FakeApi::default());
    let options = ComposeOptions { instrumental: true, ..Default::default() };
    studio.prepare_smart("ambient rain", &options).await.unwrap();

    assert_eq!(studio.phase(), StudioPhase::PreviewLyrics);
    assert!(studio.drafts().iter().all(|d| d.instrumental && d.lyrics == INSTRUMENTAL));
    assert!(studio.drafts()[1].caption.starts_with("ambient rain\n\n"));
    assert!(studio.api().lyrics_requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn empty_prompt_is_refused() {
    let mut studio = studio(FakeApi::default());
    assert!(studio.prepare_smart("   ", &ComposeOptions::default()).await.is_err());
    assert_eq!(studio.error(), Some("Please describe the music you want"));
    assert_eq!(studio.phase(), StudioPhase::Compose);
}

#[tokio::test]
async fn lyrics_failure_returns_to_compose() {
    let api = FakeApi::default();
    api.lyrics.lock().unwrap().push_back(Err("XAI_API_KEY not configured".into()));
    let mut studio = studio(api);

    let err = studio.prepare_smart("jazz", &ComposeOptions::default()).await.unwrap_err();
    assert!(err.is_rejection());
    assert_eq!(studio.phase(), StudioPhase::Compose);
    assert_eq!(studio.error(), Some("XAI_API_KEY not configured"));
}

#[tokio::test]
async fn pro_flow_with_lyrics_asks_once_for_alternate() {
    let api = FakeApi::default();
    api.lyrics_reply("ignored", "[Verse]\nalt words");
    let mut studio = studio(api);

    let options = ComposeOptions {
        alt_lyrics: true,
        style_tags: Some("808, trap".into()),
        negative_tags: Some("guitar".into()),
        ..Default::default()
    };
    studio.prepare_pro("dark hip hop", "[Verse]\nmy words", &options).await.unwrap();

    let drafts = studio.drafts();
    assert_eq!(drafts[0].caption, "dark hip hop | Style tags: 808, trap | Avoid: guitar");
    assert!(drafts[1].caption.starts_with(&drafts[0].caption));
    assert_eq!(drafts[0].lyrics, "[Verse]\nmy words");
    assert_eq!(drafts[1].lyrics, "[Verse]\nalt words");

    let requests = studio.api().lyrics_requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].base_lyrics.as_deref(), Some("[Verse]\nmy words"));
}

#[tokio::test]
async fn pro_flow_without_lyrics_drafts_them() {
    let api = FakeApi::default();
    api.lyrics_reply("cap", "[Chorus]\nwritten for you");
    let mut studio = studio(api);

    studio.prepare_pro("soul ballad", "  ", &ComposeOptions::default()).await.unwrap();
    assert_eq!(studio.drafts()[0].lyrics, "[Chorus]\nwritten for you");
    assert_eq!(studio.drafts()[1].lyrics, "[Chorus]\nwritten for you");
}

// ── submission ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn submit_sends_one_request_per_draft() {
    let api = FakeApi::with_ids(&[Some("a"), Some("b")]);
    let studio = submitted(api).await;

    assert_eq!(studio.phase(), StudioPhase::Queued);
    assert_eq!(studio.polled_ids(), ["a", "b"]);
    assert_eq!(studio.jobs()[0].position, 3);
    assert_eq!(studio.api().submitted.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn instrumental_submission_sends_sentinel() {
    let api = FakeApi::with_ids(&[Some("a")]);
    let mut studio = studio(api);
    let mut d = draft("drone");
    d.instrumental = true;
    studio.submit_tracks(vec![d]).await.unwrap();

    let submitted = studio.api().submitted.lock().unwrap();
    assert_eq!(submitted[0].lyrics.as_deref(), Some(INSTRUMENTAL));
}

#[tokio::test]
async fn partial_submit_failure_cancels_accepted_job() {
    let api = FakeApi::with_ids(&[Some("a"), None]);
    let mut studio = studio(api);

    let err = studio.submit_tracks(vec![draft("x"), draft("y")]).await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to submit both tracks. Please try again.");
    assert_eq!(studio.api().cancelled(), ["a"]);
    assert_eq!(studio.phase(), StudioPhase::Compose);
    assert!(!studio.is_polling());
}

#[tokio::test]
async fn submitting_nothing_is_an_error() {
    let mut studio = studio(FakeApi::default());
    studio.submit_tracks(Vec::new()).await.unwrap_err();
    assert_eq!(studio.error(), Some("Failed to submit generation request."));
}

#[tokio::test]
async fn generate_longer_clamps_and_resubmits() {
    let api = FakeApi::with_ids(&[Some("a"), Some("b")]);
    let mut studio = studio(api);
    studio.generate_longer(500.0).await.unwrap();

    let submitted = studio.api().submitted.lock().unwrap();
    assert!(submitted.iter().all(|p| p.duration == Some(120.0)));
}

#[tokio::test]
async fn regenerate_offsets_seed_and_keeps_sibling() {
    let api = FakeApi::with_ids(&[Some("a"), Some("b"), Some("c")]);
    let mut studio = submitted(api).await;

    studio.regenerate_track(1).await.unwrap();
    assert_eq!(studio.polled_ids(), ["a", "c"]);
    assert_eq!(studio.jobs()[1].status, SlotStatus::Queued);
    let submitted = studio.api().submitted.lock().unwrap();
    assert_eq!(submitted[2].seed, Some(117));
    drop(submitted);

    assert!(matches!(studio.regenerate_track(9).await, Err(StudioError::InvalidIndex(9))));
}

#[tokio::test]
async fn regenerate_after_cancel_settles() {
    let api = FakeApi::with_ids(&[Some("a"), Some("b"), Some("c")]);
    api.script("c", vec![status(JobStatus::Generating), status(JobStatus::Complete)]);
    let mut studio = submitted(api).await;
    studio.cancel().await;

    studio.regenerate_track(0).await.unwrap();
    assert_eq!(studio.polled_ids(), ["c"]);
    assert_eq!(studio.poll_tick().await, TickOutcome::Continue);
    assert_eq!(studio.poll_tick().await, TickOutcome::Finished);
    assert_eq!(studio.phase(), StudioPhase::Player);
    assert!(!studio.is_polling());
    assert!(studio.jobs()[0].audio.is_some());
    assert!(studio.jobs()[1].id.is_none());
}

// ── polling ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn both_complete_fetches_audio_once_each() {
    let api = FakeApi::with_ids(&[Some("a"), Some("b")]);
    api.script("a", vec![queued_at(2), status(JobStatus::Complete)]);
    api.script("b", vec![status(JobStatus::Generating), status(JobStatus::Complete)]);
    let mut studio = submitted(api).await;

    assert_eq!(studio.poll_tick().await, TickOutcome::Continue);
    assert_eq!(studio.phase(), StudioPhase::Generating);
    assert_eq!(studio.jobs()[0].position, 2);

    assert_eq!(studio.poll_tick().await, TickOutcome::Finished);
    assert_eq!(studio.phase(), StudioPhase::Player);
    assert!(!studio.is_polling());
    assert_eq!(studio.poll_tick().await, TickOutcome::Idle);

    assert_eq!(studio.api().fetches_for("a"), 1);
    assert_eq!(studio.api().fetches_for("b"), 1);
    assert!(studio.jobs().iter().all(|j| j.saved));

    let library = studio.store().get_all_tracks().await.unwrap();
    assert_eq!(library.len(), 2);
    let a = library.iter().find(|t| t.id == "a").unwrap();
    assert_eq!(a.title, "Dreamy synthwave");
    assert_eq!(a.audio, b"audio-a");
}

#[tokio::test]
async fn one_failure_stops_polling_and_cancels_the_other() {
    let api = FakeApi::with_ids(&[Some("a"), Some("b")]);
    api.script("a", vec![failed_with("GPU out of memory")]);
    api.script("b", vec![status(JobStatus::Generating)]);
    let mut studio = submitted(api).await;

    assert_eq!(studio.poll_tick().await, TickOutcome::Failed);
    assert!(!studio.is_polling());
    assert_eq!(studio.phase(), StudioPhase::Compose);
    assert_eq!(studio.error(), Some("One of the tracks failed to generate."));
    assert_eq!(studio.jobs()[0].error.as_deref(), Some("GPU out of memory"));
    assert_eq!(studio.api().cancelled(), ["b"]);
}

#[tokio::test]
async fn status_rejection_marks_the_job_failed() {
    let api = FakeApi::with_ids(&[Some("a"), Some("b")]);
    api.script("a", vec![Reply::Rejected]);
    api.script("b", vec![status(JobStatus::Complete)]);
    let mut studio = submitted(api).await;

    assert_eq!(studio.poll_tick().await, TickOutcome::Failed);
    assert_eq!(studio.jobs()[0].error.as_deref(), Some("Status error"));
    assert!(studio.api().cancelled().is_empty());
}

#[tokio::test]
#[traced_test]
async fn transport_error_leaves_state_untouched() {
    let api = FakeApi::with_ids(&[Some("a"), Some("b")]);
    api.script("a", vec![Reply::Offline, status(JobStatus::Generating)]);
    api.script("b", vec![status(JobStatus::Generating)]);
    let mut studio = submitted(api).await;

    assert_eq!(studio.poll_tick().await, TickOutcome::Retry);
    assert_eq!(studio.phase(), StudioPhase::Queued);
    assert!(studio.jobs().iter().all(|j| j.status == SlotStatus::Queued));
    assert!(logs_contain("retrying next tick"));

    assert_eq!(studio.poll_tick().await, TickOutcome::Continue);
    assert_eq!(studio.phase(), StudioPhase::Generating);
}

#[tokio::test]
async fn failed_audio_fetch_is_retried() {
    let api = FakeApi::with_ids(&[Some("a"), Some("b")]);
    api.script("a", vec![status(JobStatus::Complete)]);
    api.script("b", vec![status(JobStatus::Complete)]);
    api.audio_failures.lock().unwrap().insert("b".into());
    let mut studio = submitted(api).await;

    assert_eq!(studio.poll_tick().await, TickOutcome::Continue);
    assert!(studio.jobs()[1].needs_audio());
    assert_eq!(studio.poll_tick().await, TickOutcome::Finished);
    assert_eq!(studio.api().fetches_for("a"), 1);
    assert_eq!(studio.api().fetches_for("b"), 2);
}

#[tokio::test]
async fn batch_and_extract_results() {
    let api = FakeApi::with_ids(&[Some("a"), Some("b")]);
    let mut batch = JobStatusResponse::new(JobStatus::Complete);
    batch.audio_urls = Some(vec!["/audio/a/0".into(), "/audio/a/1".into()]);
    api.script("a", vec![Reply::Status(batch)]);
    let mut extract = JobStatusResponse::new(JobStatus::Complete);
    extract.extract_metadata = Some(serde_json::json!({"bpm": 120}));
    api.script("b", vec![Reply::Status(extract)]);
    let mut studio = submitted(api).await;
    studio.set_auto_save(false);

    assert_eq!(studio.poll_tick().await, TickOutcome::Finished);
    assert_eq!(*studio.api().audio_fetches.lock().unwrap(), [("a".to_owned(), Some(0))]);
    assert_eq!(studio.jobs()[1].extract_metadata, Some(serde_json::json!({"bpm": 120})));
    assert!(studio.store().is_empty().await);
}

#[tokio::test]
async fn run_polling_runs_to_completion() {
    let api = FakeApi::with_ids(&[Some("a"), Some("b")]);
    api.script("a", vec![status(JobStatus::Generating), status(JobStatus::Complete)]);
    api.script("b", vec![status(JobStatus::Complete)]);
    let mut studio = submitted(api).await;

    let outcome = studio.run_polling(Duration::from_millis(5)).await;
    assert_eq!(outcome, TickOutcome::Finished);
    assert_eq!(studio.phase(), StudioPhase::Player);
}

#[tokio::test]
async fn shutdown_cancels_jobs() {
    let api = FakeApi::with_ids(&[Some("a"), Some("b")]);
    api.script("a", vec![status(JobStatus::Generating)]);
    api.script("b", vec![status(JobStatus::Generating)]);
    let mut studio = submitted(api).await;

    let outcome = studio.run_until(Duration::from_secs(60), async {}).await;
    assert!(outcome.is_none());
    assert_eq!(studio.api().cancelled(), ["a", "b"]);
    assert_eq!(studio.phase(), StudioPhase::Compose);
    assert!(studio.jobs().iter().all(|j| j.id.is_none()));
}

// ── library and editing ─────────────────────────────────────────────────────

#[tokio::test]
async fn manual_save_after_completion() {
    let api = FakeApi::with_ids(&[Some("a"), Some("b")]);
    api.script("a", vec![status(JobStatus::Complete)]);
    api.script("b", vec![status(JobStatus::Complete)]);
    let mut studio = submitted(api).await;
    studio.set_auto_save(false);

    assert!(!studio.save_track(0).await.unwrap());
    studio.poll_tick().await;
    assert!(studio.store().is_empty().await);

    assert!(studio.save_track(1).await.unwrap());
    assert!(studio.jobs()[1].saved);
    assert_eq!(studio.store().len().await, 1);
    assert!(matches!(studio.save_track(5).await, Err(StudioError::InvalidIndex(5))));
}

#[tokio::test]
async fn rewrite_chorus_splices_new_section() {
    let api = FakeApi::default();
    api.lyrics_reply("c", "[Verse]\nnoise\n[Chorus]\nbrand new hook");
    let mut studio = studio(api);
    studio
        .update_draft(0, |d| d.lyrics = "[Verse]\nkeep me\n[Chorus]\nold hook\n[Outro]\nbye".into())
        .unwrap();

    studio.rewrite_chorus(0, Contrast::Subtle).await.unwrap();
    assert_eq!(studio.drafts()[0].lyrics, "[Verse]\nkeep me\n[Chorus]\nbrand new hook\n[Outro]\nbye");
    assert_eq!(studio.phase(), StudioPhase::PreviewLyrics);

    let requests = studio.api().lyrics_requests.lock().unwrap();
    assert!(requests[0].prompt.as_deref().unwrap().starts_with("Rewrite only the chorus"));
    assert_eq!(requests[0].contrast, Some(Contrast::Subtle));
}

#[tokio::test]
async fn reset_clears_everything() {
    let api = FakeApi::with_ids(&[Some("a"), Some("b")]);
    let mut studio = submitted(api).await;
    studio.set_auto_save(false);
    studio.reset();

    assert!(!studio.is_polling());
    assert!(studio.auto_save());
    assert_eq!(studio.phase(), StudioPhase::Compose);
    assert!(studio.drafts().iter().all(|d| d.caption.is_empty()));
    assert_eq!(studio.jobs().len(), TAKES);
    assert!(studio.api().cancelled().is_empty());
}

#[tokio::test]
async fn upload_returns_storage_path() {
    let studio = studio(FakeApi::default());
    let path = studio.upload_source("demo.mp3", "audio/mpeg", vec![1, 2, 3]).await.unwrap();
    assert_eq!(path, "/audio/uploads/demo.mp3");
}
