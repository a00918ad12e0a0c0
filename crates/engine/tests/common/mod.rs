//! Shared test harness: in-memory store plus scripted collaborators.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use vidova_core::collab::{
    CollabError, InferenceQueue, InferenceRequest, PresignedUpload, SpeechSynthesizer,
    StorageImporter, StorageSigner, UploadPurpose, VideoRenderer,
};
use vidova_core::job::{
    ChangeAudioInput, JobInput, NewJob, PhotoToVideoInput, TranslateInput,
};
use vidova_core::store::GenerationStore;
use vidova_core::types::Id;
use vidova_core::webhook::{CallbackPayload, ProviderCallback, VideoArtifact};
use vidova_db::memory::MemoryStore;
use vidova_engine::{
    AdmissionController, Collaborators, Dispatcher, Pipelines, WebhookReconciler,
};

// ---------------------------------------------------------------------------
// Mock collaborators
// ---------------------------------------------------------------------------

pub struct MockSigner;

#[async_trait]
impl StorageSigner for MockSigner {
    async fn presign_get(&self, key: &str) -> Result<String, CollabError> {
        Ok(format!("https://signed.test/{key}"))
    }

    async fn presign_upload(
        &self,
        file_name: &str,
        _content_type: &str,
        purpose: UploadPurpose,
    ) -> Result<PresignedUpload, CollabError> {
        Ok(PresignedUpload {
            url: format!("https://upload.test/{file_name}"),
            key: vidova_core::collab::upload_key(purpose, file_name),
        })
    }
}

#[derive(Default)]
pub struct MockImporter {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl StorageImporter for MockImporter {
    async fn import_remote(&self, _url: &str) -> Result<String, CollabError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(CollabError::new("storage-import", "download refused"));
        }
        Ok("outputs/imported.mp4".to_string())
    }
}

#[derive(Default)]
pub struct MockSpeech {
    pub calls: AtomicUsize,
}

#[async_trait]
impl SpeechSynthesizer for MockSpeech {
    async fn synthesize(
        &self,
        _script: &str,
        _voice_key: Option<&str>,
    ) -> Result<String, CollabError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("tts/synth.wav".to_string())
    }
}

#[derive(Default)]
pub struct MockRenderer {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl VideoRenderer for MockRenderer {
    async fn render(
        &self,
        _script: &str,
        _photo_key: &str,
        _audio_key: Option<&str>,
    ) -> Result<String, CollabError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(CollabError::new("renderer", "GPU worker unavailable"));
        }
        Ok("outputs/rendered.mp4".to_string())
    }
}

#[derive(Default)]
pub struct MockQueue {
    pub submissions: Mutex<Vec<(InferenceRequest, String)>>,
}

impl MockQueue {
    pub fn submission_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }
}

#[async_trait]
impl InferenceQueue for MockQueue {
    async fn submit(
        &self,
        request: &InferenceRequest,
        callback_url: &str,
    ) -> Result<String, CollabError> {
        let mut submissions = self.submissions.lock().unwrap();
        let id = format!("req-{}", submissions.len() + 1);
        submissions.push((request.clone(), callback_url.to_string()));
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub queue: Arc<MockQueue>,
    pub importer: Arc<MockImporter>,
    pub speech: Arc<MockSpeech>,
    pub renderer: Arc<MockRenderer>,
    pub admission: Arc<AdmissionController>,
    pub pipelines: Arc<Pipelines>,
    pub dispatcher: Dispatcher,
    pub reconciler: WebhookReconciler,
}

pub fn harness(per_user_limit: usize) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let queue = Arc::new(MockQueue::default());
    let importer = Arc::new(MockImporter::default());
    let speech = Arc::new(MockSpeech::default());
    let renderer = Arc::new(MockRenderer::default());

    let collab = Collaborators {
        signer: Arc::new(MockSigner),
        speech: speech.clone(),
        renderer: renderer.clone(),
        queue: queue.clone(),
    };
    let pipelines = Arc::new(Pipelines::new(
        store.clone() as Arc<dyn GenerationStore>,
        collab,
        "https://api.test/api/v1/webhooks/inference".to_string(),
    ));
    let admission = Arc::new(AdmissionController::new(per_user_limit));
    let dispatcher = Dispatcher::new(
        store.clone() as Arc<dyn GenerationStore>,
        pipelines.clone(),
        admission.clone(),
    );
    let reconciler = WebhookReconciler::new(
        store.clone() as Arc<dyn GenerationStore>,
        importer.clone(),
    );

    Harness {
        store,
        queue,
        importer,
        speech,
        renderer,
        admission,
        pipelines,
        dispatcher,
        reconciler,
    }
}

impl Harness {
    /// Run one dispatch cycle and wait for the launched pipelines.
    pub async fn dispatch_and_wait(&self) {
        let handles = self.dispatcher.dispatch_once().await.unwrap();
        for handle in handles {
            handle.await.unwrap();
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn translate_job(owner: Id) -> NewJob {
    NewJob {
        owner_id: owner,
        name: "dub it".to_string(),
        input: JobInput::Translate(TranslateInput {
            source_video_key: "vt/source.mp4".to_string(),
            target_language: "hindi".to_string(),
        }),
    }
}

pub fn change_audio_job(owner: Id) -> NewJob {
    NewJob {
        owner_id: owner,
        name: "swap audio".to_string(),
        input: JobInput::ChangeAudio(ChangeAudioInput {
            source_video_key: "cva/source.mp4".to_string(),
            new_audio_key: "cva/new.wav".to_string(),
        }),
    }
}

pub fn avatar_job(owner: Id, experimental: bool) -> NewJob {
    NewJob {
        owner_id: owner,
        name: "avatar".to_string(),
        input: JobInput::PhotoToVideo(PhotoToVideoInput {
            photo_key: "ptv/portrait.jpg".to_string(),
            script: Some("Welcome to the demo".to_string()),
            driving_audio_key: None,
            voice_key: None,
            expressiveness: Some(0.8),
            enhancement: false,
            experimental_model: experimental,
            resolution: "720p".to_string(),
        }),
    }
}

pub fn success_callback(request_id: &str, url: Option<&str>) -> ProviderCallback {
    ProviderCallback {
        request_id: request_id.to_string(),
        status: "OK".to_string(),
        payload: Some(CallbackPayload {
            video: url.map(|u| VideoArtifact {
                url: u.to_string(),
                file_name: None,
                file_size: None,
                content_type: None,
            }),
            detail: None,
        }),
        error: None,
    }
}

pub fn failure_callback(request_id: &str, error: &str) -> ProviderCallback {
    ProviderCallback {
        request_id: request_id.to_string(),
        status: "ERROR".to_string(),
        payload: None,
        error: Some(error.to_string()),
    }
}
