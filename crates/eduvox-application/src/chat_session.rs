//! Chat session use case.
//!
//! This module provides the `ChatSession` which orchestrates one interactive
//! session end to end: user text (or recognized speech) goes to the AI
//! backend, the reply is voiced through the artifact store, and the finished
//! exchange is appended to the date-keyed archive and persisted.
//!
//! All session state lives in this object. There is no global state; a
//! surface owns exactly one `ChatSession` and drives it sequentially.

use eduvox_core::archive::{ArchiveRepository, ChatArchive, DateKey, Turn};
use eduvox_core::backend::{AudioClip, Conversation, ConversationBackend, Transcriber};
use eduvox_core::error::Result;
use eduvox_infrastructure::{render_player, VoiceArtifactStore};
use std::sync::Arc;
use uuid::Uuid;

/// Instruction sent to the AI backend once per conversation.
pub const SYSTEM_INSTRUCTION: &str = "You are an AI designed to simplify complex academic and \
     technical content for enhanced learning accessibility.";

/// One interactive chat session over the archived history.
///
/// # Responsibilities
///
/// - Bootstrapping the archive and today's bucket on start
/// - Recording finished turns (append, then persist)
/// - Holding the lazily-created conversation handle across turns
/// - Browsing and deleting archived days for the sidebar
pub struct ChatSession {
    /// Session identifier, used only for log correlation
    session_id: String,
    /// Repository for archive persistence
    repository: Arc<dyn ArchiveRepository>,
    /// Backend that opens AI conversations
    backend: Arc<dyn ConversationBackend>,
    /// Store for synthesized voiceover artifacts
    voice_store: Arc<VoiceArtifactStore>,
    /// Speech-to-text backend for microphone input
    transcriber: Arc<dyn Transcriber>,
    /// In-memory archive, the single source of truth during the session
    archive: ChatArchive,
    /// The day new turns are recorded under, fixed at session start
    current_date: DateKey,
    /// The day whose transcript the surface is showing
    selected_date: DateKey,
    /// Conversation handle, created on the first send and then reused
    conversation: Option<Box<dyn Conversation>>,
    /// The turn most recently produced by this session, for display only
    latest_turn: Option<Turn>,
}

impl ChatSession {
    /// Starts a session: loads the archive and prepares today's bucket.
    ///
    /// Today's bucket exists in memory from this point but is not listed or
    /// persisted until the first turn lands in it.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the archive cannot be read at all. A
    /// corrupt archive file is not an error here; the repository degrades
    /// it to an empty archive.
    pub async fn start(
        repository: Arc<dyn ArchiveRepository>,
        backend: Arc<dyn ConversationBackend>,
        voice_store: Arc<VoiceArtifactStore>,
        transcriber: Arc<dyn Transcriber>,
    ) -> Result<Self> {
        let mut archive = repository.load().await?;
        let current_date = DateKey::today();
        archive.ensure_day(current_date.clone());

        let session_id = Uuid::new_v4().to_string();
        tracing::info!(
            "[ChatSession] Session {} started on {} with {} archived day(s)",
            session_id,
            current_date,
            archive.dates_desc().len()
        );

        Ok(Self {
            session_id,
            repository,
            backend,
            voice_store,
            transcriber,
            archive,
            selected_date: current_date.clone(),
            current_date,
            conversation: None,
            latest_turn: None,
        })
    }

    /// Sends a user message through the AI backend and records the exchange.
    ///
    /// The conversation handle is created on the first call and reused for
    /// the rest of the session. A failed send leaves the handle and the
    /// archive untouched, so the user can simply try again.
    ///
    /// The reply is voiced before recording; if synthesis fails the turn is
    /// still recorded, just without a voiceover.
    ///
    /// # Returns
    ///
    /// The recorded turn, already persisted to the archive file.
    pub async fn send_message(&mut self, text: &str) -> Result<Turn> {
        let text = text.trim();

        if self.conversation.is_none() {
            self.conversation = Some(self.backend.start_conversation(SYSTEM_INSTRUCTION)?);
            tracing::debug!("[ChatSession] Conversation handle created");
        }
        let Some(conversation) = self.conversation.as_mut() else {
            return Err(eduvox_core::EduvoxError::internal(
                "conversation handle missing after creation",
            ));
        };

        let reply = conversation.send_message(text).await?;

        let voiceover = match self.voice_store.store_voiceover(&reply).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("[ChatSession] Voiceover synthesis failed: {}", e);
                None
            }
        };

        let turn = Turn::new(text, reply, voiceover);
        self.record_turn(turn.clone()).await?;
        self.latest_turn = Some(turn.clone());
        Ok(turn)
    }

    /// Appends a finished turn to today's bucket and persists the archive.
    async fn record_turn(&mut self, turn: Turn) -> Result<()> {
        self.archive.append(self.current_date.clone(), turn);
        self.repository.save(&self.archive).await?;
        tracing::debug!(
            "[ChatSession] Recorded turn {} for {}",
            self.archive.turns(&self.current_date).len(),
            self.current_date
        );
        Ok(())
    }

    /// Recognizes speech from a captured audio clip.
    ///
    /// # Errors
    ///
    /// Propagates the three recognition conditions (timeout, unintelligible,
    /// request failure); callers show `user_message()` for these.
    pub async fn transcribe(&self, clip: &AudioClip) -> Result<String> {
        self.transcriber.transcribe(clip).await
    }

    /// Archived days with at least one turn, most recent first.
    pub fn list_dates(&self) -> Vec<DateKey> {
        self.archive.dates_desc()
    }

    /// Points the transcript view at a day. Never mutates the archive.
    pub fn select_date(&mut self, date: DateKey) {
        self.selected_date = date;
    }

    /// The transcript of the selected day, oldest first. Empty when the day
    /// has no recorded turns.
    pub fn view(&self) -> &[Turn] {
        self.archive.turns(&self.selected_date)
    }

    /// Deletes a whole day from the archive and persists the removal.
    ///
    /// # Returns
    ///
    /// `true` if the day existed and was deleted. Deleting an absent day is
    /// a no-op returning `false`, with nothing written to disk.
    pub async fn delete_date(&mut self, date: &DateKey) -> Result<bool> {
        if !self.archive.remove_day(date) {
            return Ok(false);
        }
        self.repository.save(&self.archive).await?;

        if self.selected_date == *date {
            self.selected_date = self.current_date.clone();
        }

        tracing::info!("[ChatSession] Deleted chat history for {}", date);
        Ok(true)
    }

    /// The turn most recently produced by this session, if any.
    ///
    /// This is display scratch state, not an archive read: a fresh session
    /// starts with no latest turn even when today already has recorded
    /// history, exactly like the response area of a freshly opened page.
    pub fn latest_turn(&self) -> Option<&Turn> {
        self.latest_turn.as_ref()
    }

    /// Renders the inline audio player for a turn's voiceover.
    ///
    /// Empty string when the turn has no voiceover or its artifact file is
    /// gone; playback absence is never an error.
    pub fn render_player(&self, turn: &Turn) -> String {
        turn.voiceover
            .as_deref()
            .map(render_player)
            .unwrap_or_default()
    }

    /// The identifier logs carry for this session.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The day new turns are recorded under.
    pub fn current_date(&self) -> &DateKey {
        &self.current_date
    }

    /// The day the transcript view is showing.
    pub fn selected_date(&self) -> &DateKey {
        &self.selected_date
    }
}
