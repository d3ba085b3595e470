//! DraftSessionManager - drives drafting sessions around their collaborators.
//!
//! Each conversation has one [`DraftSession`] behind an async mutex. A submit
//! holds that mutex for the whole streaming run, so a second submit or an
//! approval on the same session is rejected with `SessionBusy` instead of
//! interleaving. Every run gets its own watch channel for cancellation,
//! installed in the same critical section that takes the session lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as SyncMutex, MutexGuard as SyncMutexGuard, PoisonError};

use futures::StreamExt;
use tokio::sync::{mpsc, watch, Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, error, info, warn};

use crate::domain::conversation::{PersistedMessage, ThreadRecord};
use crate::domain::drafting::DraftSession;
use crate::domain::foundation::{ConversationId, DomainError, ThreadIdentity, TurnId};
use crate::ports::{AIError, ConversationStore, ReplyGenerator, ReplyRequest, ThreadStore};

use super::commands::{
    ApprovalReceipt, ClearOutcome, SaveMessageCommand, SavedMessage, SessionSnapshot,
    SubmitCommand,
};
use super::errors::DraftingError;
use super::events::DraftEvent;
use super::seller_hints::{SellerHints, SellerHintsService};

/// Buffered events per submit before the producer waits on the consumer.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Error turn text after a failed or truncated generation.
pub const GENERATION_FAILED_NOTICE: &str =
    "La génération de la réponse a échoué. Vous pouvez renvoyer votre message.";

/// Error turn text after the approved message could not be saved.
pub const SEND_FAILED_NOTICE: &str =
    "L'envoi du message au vendeur a échoué. Réessayez dans un instant.";

/// Context for follow-up messages, once the seller has already been contacted.
const FOLLOW_UP_CONTEXT: &str = "La conversation avec le vendeur est déjà engagée. \
Ne vous présentez pas à nouveau et ne répétez pas les informations demandées par le vendeur.";

struct SessionEntry {
    session: Arc<Mutex<DraftSession>>,
    control: SyncMutex<RunControl>,
}

/// Cancellation state of a session, guarded by a sync mutex that is never
/// held across an await.
#[derive(Default)]
struct RunControl {
    /// Token of the current (or most recent) run.
    cancel: Option<watch::Sender<bool>>,
    /// Set while a clear waits for the session; new runs are refused.
    clearing: bool,
}

impl RunControl {
    fn cancel_run(&self) {
        if let Some(cancel) = &self.cancel {
            cancel.send_replace(true);
        }
    }
}

impl SessionEntry {
    fn new(session: DraftSession) -> Arc<Self> {
        Arc::new(Self {
            session: Arc::new(Mutex::new(session)),
            control: SyncMutex::new(RunControl::default()),
        })
    }

    fn control(&self) -> SyncMutexGuard<'_, RunControl> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes the session for a new run and installs its cancellation token.
    ///
    /// Both happen under the control mutex, so a concurrent `cancel` either
    /// sees no run at all or signals this run's token.
    fn start_run(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<(OwnedMutexGuard<DraftSession>, watch::Receiver<bool>), DraftingError> {
        let mut control = self.control();
        if control.clearing {
            return Err(DraftingError::SessionBusy(conversation_id.clone()));
        }
        let session = self
            .session
            .clone()
            .try_lock_owned()
            .map_err(|_| DraftingError::SessionBusy(conversation_id.clone()))?;

        let (cancel, receiver) = watch::channel(false);
        control.cancel = Some(cancel);
        Ok((session, receiver))
    }
}

/// Registry and orchestrator of drafting sessions.
pub struct DraftSessionManager {
    generator: Arc<dyn ReplyGenerator>,
    hints: Arc<SellerHintsService>,
    conversations: Arc<dyn ConversationStore>,
    threads: Arc<dyn ThreadStore>,
    sessions: RwLock<HashMap<ConversationId, Arc<SessionEntry>>>,
}

impl DraftSessionManager {
    pub fn new(
        generator: Arc<dyn ReplyGenerator>,
        hints: SellerHintsService,
        conversations: Arc<dyn ConversationStore>,
        threads: Arc<dyn ThreadStore>,
    ) -> Self {
        Self {
            generator,
            hints: Arc::new(hints),
            conversations,
            threads,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Sessions
    // ───────────────────────────────────────────────────────────────

    /// Opens a session on a brand-new conversation.
    pub async fn open_session(&self, customer_name: Option<String>) -> SessionSnapshot {
        let session = DraftSession::open(ConversationId::generate(), customer_name);
        let snapshot = SessionSnapshot::from(&session);

        self.sessions
            .write()
            .await
            .insert(snapshot.conversation_id.clone(), SessionEntry::new(session));

        debug!(
            conversation_id = %snapshot.conversation_id,
            thread_id = %snapshot.thread_id,
            "drafting session opened"
        );
        snapshot
    }

    /// Current view of a session.
    ///
    /// Waits for an in-flight submit to finish.
    pub async fn snapshot(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<SessionSnapshot, DraftingError> {
        let entry = self.entry(conversation_id).await?;
        let session = entry.session.lock().await;
        Ok(SessionSnapshot::from(&*session))
    }

    // ───────────────────────────────────────────────────────────────
    // Submit
    // ───────────────────────────────────────────────────────────────

    /// Submits a customer message and streams the drafted reply.
    ///
    /// The returned receiver yields `start`, then `token`s, then exactly one
    /// of `end`, `error` or `cancelled`. Dropping the receiver cancels.
    pub async fn submit(
        &self,
        cmd: SubmitCommand,
    ) -> Result<mpsc::Receiver<DraftEvent>, DraftingError> {
        let message = cmd.message.trim().to_string();
        if message.is_empty() {
            return Err(DraftingError::EmptyMessage);
        }

        let entry = self
            .entry_or_open(&cmd.conversation_id, cmd.customer_name.clone())
            .await;
        let (mut session, cancel) = entry.start_run(&cmd.conversation_id)?;

        if let Some(raw) = cmd.thread_id.as_deref() {
            let claimed = ThreadIdentity::parse(raw)?;
            if &claimed != session.thread_identity() {
                return Err(DraftingError::ThreadMismatch {
                    thread_id: raw.to_string(),
                });
            }
        }
        session.set_customer_name(cmd.customer_name);

        let disable_seller_hints = match self.conversations.has_messages(&cmd.conversation_id).await
        {
            Ok(has_messages) => has_messages,
            Err(e) => {
                warn!(
                    conversation_id = %cmd.conversation_id,
                    error = %e,
                    "could not check conversation history, treating as first message"
                );
                false
            }
        };

        session.begin_submit(&message)?;
        let turn_id = session
            .turns()
            .last()
            .map(|turn| turn.id)
            .ok_or_else(|| DraftingError::Internal("streaming turn missing".into()))?;

        let (events, receiver) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        debug!(
            conversation_id = %cmd.conversation_id,
            thread_id = %session.thread_identity(),
            disable_seller_hints,
            "reply generation starting"
        );

        let run = ReplyRun {
            generator: self.generator.clone(),
            hints: self.hints.clone(),
            threads: self.threads.clone(),
            message,
            disable_seller_hints,
            turn_id,
        };
        tokio::spawn(run.drive(session, cancel, events));

        Ok(receiver)
    }

    /// Requests cancellation of the in-flight reply, if any.
    ///
    /// Returns true if a reply or approval was in flight.
    pub async fn cancel(&self, conversation_id: &ConversationId) -> Result<bool, DraftingError> {
        let entry = self.entry(conversation_id).await?;
        let control = entry.control();
        let in_flight = entry.session.try_lock().is_err();
        if in_flight {
            control.cancel_run();
            info!(conversation_id = %conversation_id, "reply cancellation requested");
        }
        Ok(in_flight)
    }

    // ───────────────────────────────────────────────────────────────
    // Approval
    // ───────────────────────────────────────────────────────────────

    /// Sends the pending proposal to the seller.
    ///
    /// On success exactly one customer message is persisted, the turns are
    /// cleared and a fresh thread identity is installed. On failure nothing
    /// is persisted: with no message to resolve the session stays in
    /// `ProposalPending` behind an error turn, and a failed write returns it
    /// to `Drafting`.
    pub async fn approve(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<ApprovalReceipt, DraftingError> {
        let entry = self.entry(conversation_id).await?;
        let mut session = entry
            .session
            .try_lock()
            .map_err(|_| DraftingError::SessionBusy(conversation_id.clone()))?;

        let content = session.begin_approval().map_err(|e| {
            debug!(conversation_id = %conversation_id, error = %e, "approval rejected");
            DraftingError::from(e)
        })?;

        let persisted = match PersistedMessage::from_customer(
            conversation_id.clone(),
            content.clone(),
            session.customer_name().map(str::to_string),
        ) {
            Ok(message) => match self.conversations.persist_message(&message).await {
                Ok(()) => Ok(message),
                Err(e) => Err(DraftingError::from(e)),
            },
            Err(e) => Err(DraftingError::from(e)),
        };

        let message = match persisted {
            Ok(message) => message,
            Err(e) => {
                error!(
                    conversation_id = %conversation_id,
                    error = %e,
                    "failed to persist approved message"
                );
                session.fail_approval(SEND_FAILED_NOTICE)?;
                return Err(e);
            }
        };

        let closed = session.complete_approval()?;
        if let Err(e) = self
            .threads
            .delete_threads_by_prefix(&closed.to_string())
            .await
        {
            warn!(thread_id = %closed, error = %e, "failed to delete closed thread history");
        }

        info!(
            conversation_id = %conversation_id,
            message_id = %message.id(),
            thread_id = %session.thread_identity(),
            "proposal approved and sent"
        );

        Ok(ApprovalReceipt {
            message_id: message.id(),
            timestamp: message.timestamp(),
            content,
            thread_id: session.thread_identity().clone(),
        })
    }

    // ───────────────────────────────────────────────────────────────
    // Clear
    // ───────────────────────────────────────────────────────────────

    /// Deletes a conversation's messages and thread history, then moves its
    /// session to a brand-new conversation id.
    ///
    /// An in-flight reply is cancelled first.
    pub async fn clear(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<ClearOutcome, DraftingError> {
        let existing = self.sessions.read().await.get(conversation_id).cloned();
        let entry = existing
            .unwrap_or_else(|| SessionEntry::new(DraftSession::open(conversation_id.clone(), None)));

        {
            let mut control = entry.control();
            control.clearing = true;
            control.cancel_run();
        }
        let mut session = entry.session.lock().await;
        entry.control().clearing = false;

        let deleted_messages = self.conversations.delete_messages(conversation_id).await?;
        let deleted_thread_records = self
            .threads
            .delete_threads_by_prefix(conversation_id.as_str())
            .await?;

        let fresh = ConversationId::generate();
        session.reset(fresh.clone());
        let thread_id = session.thread_identity().clone();
        drop(session);

        {
            let mut sessions = self.sessions.write().await;
            sessions.remove(conversation_id);
            sessions.insert(fresh.clone(), entry);
        }

        info!(
            conversation_id = %conversation_id,
            new_conversation_id = %fresh,
            deleted_messages,
            deleted_thread_records,
            "conversation cleared"
        );

        Ok(ClearOutcome {
            deleted_messages,
            deleted_thread_records,
            conversation_id: fresh,
            thread_id,
        })
    }

    // ───────────────────────────────────────────────────────────────
    // Conversation messages
    // ───────────────────────────────────────────────────────────────

    /// Persists a message directly, without drafting.
    pub async fn save_message(
        &self,
        cmd: SaveMessageCommand,
    ) -> Result<SavedMessage, DraftingError> {
        let message =
            PersistedMessage::new(cmd.conversation_id, cmd.from, cmd.content, cmd.customer_name)?;

        self.conversations
            .persist_message(&message)
            .await
            .map_err(|e| {
                error!(
                    conversation_id = %message.conversation_id(),
                    error = %e,
                    "failed to save message"
                );
                e
            })?;

        debug!(
            conversation_id = %message.conversation_id(),
            message_id = %message.id(),
            from = message.from().as_str(),
            "message saved"
        );

        Ok(SavedMessage {
            message_id: message.id(),
            timestamp: message.timestamp(),
        })
    }

    /// Persisted messages of a conversation, oldest first.
    pub async fn list_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<PersistedMessage>, DraftingError> {
        Ok(self.conversations.list_messages(conversation_id).await?)
    }

    // ───────────────────────────────────────────────────────────────
    // Registry
    // ───────────────────────────────────────────────────────────────

    async fn entry(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Arc<SessionEntry>, DraftingError> {
        self.sessions
            .read()
            .await
            .get(conversation_id)
            .cloned()
            .ok_or_else(|| DraftingError::SessionNotFound(conversation_id.clone()))
    }

    async fn entry_or_open(
        &self,
        conversation_id: &ConversationId,
        customer_name: Option<String>,
    ) -> Arc<SessionEntry> {
        if let Some(entry) = self.sessions.read().await.get(conversation_id) {
            return entry.clone();
        }

        self.sessions
            .write()
            .await
            .entry(conversation_id.clone())
            .or_insert_with(|| {
                debug!(conversation_id = %conversation_id, "drafting session opened on submit");
                SessionEntry::new(DraftSession::open(conversation_id.clone(), customer_name))
            })
            .clone()
    }
}

#[cfg(test)]
impl DraftSessionManager {
    async fn with_session(
        &self,
        conversation_id: &ConversationId,
        f: impl FnOnce(&mut DraftSession),
    ) {
        if let Ok(entry) = self.entry(conversation_id).await {
            f(&mut *entry.session.lock().await);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Reply run
// ═══════════════════════════════════════════════════════════════════

enum StreamOutcome {
    Completed,
    Failed(AIError),
    Cancelled,
    Broken(DomainError),
}

/// One spawned generation, owning the session lock until it ends.
struct ReplyRun {
    generator: Arc<dyn ReplyGenerator>,
    hints: Arc<SellerHintsService>,
    threads: Arc<dyn ThreadStore>,
    message: String,
    disable_seller_hints: bool,
    turn_id: TurnId,
}

impl ReplyRun {
    async fn drive(
        self,
        mut session: OwnedMutexGuard<DraftSession>,
        mut cancel: watch::Receiver<bool>,
        events: mpsc::Sender<DraftEvent>,
    ) {
        let start = DraftEvent::Start {
            conversation_id: session.conversation_id().to_string(),
            thread_id: session.thread_identity().to_string(),
            turn_id: self.turn_id,
        };

        let outcome = if events.send(start).await.is_err() {
            StreamOutcome::Cancelled
        } else {
            self.stream_reply(&mut session, &mut cancel, &events).await
        };

        let last = self.finish(&mut session, outcome).await;
        let conversation_id = session.conversation_id().clone();
        // Unlock before the terminal event so the client can act on it at once.
        drop(session);

        if events.send(last).await.is_err() {
            debug!(conversation_id = %conversation_id, "final event dropped, consumer gone");
        }
    }

    async fn stream_reply(
        &self,
        session: &mut DraftSession,
        cancel: &mut watch::Receiver<bool>,
        events: &mpsc::Sender<DraftEvent>,
    ) -> StreamOutcome {
        let hints = tokio::select! {
            biased;
            _ = wait_for_cancel(cancel) => return StreamOutcome::Cancelled,
            hints = self.hints.compose(&self.message, self.disable_seller_hints) => hints,
        };

        let mut request = ReplyRequest::new(self.message.clone(), session.thread_identity().clone())
            .with_customer_name(session.customer_name().map(str::to_string))
            .with_seller_hints_disabled(self.disable_seller_hints);
        if let Some(context) = reply_context(hints.as_ref(), self.disable_seller_hints) {
            request = request.with_context(context);
        }

        let mut stream = tokio::select! {
            biased;
            _ = wait_for_cancel(cancel) => return StreamOutcome::Cancelled,
            opened = self.generator.generate_reply(request) => match opened {
                Ok(stream) => stream,
                Err(e) => return StreamOutcome::Failed(e),
            },
        };

        loop {
            let next = tokio::select! {
                biased;
                _ = wait_for_cancel(cancel) => return StreamOutcome::Cancelled,
                _ = events.closed() => {
                    debug!("event consumer dropped, cancelling reply");
                    return StreamOutcome::Cancelled;
                }
                next = stream.next() => next,
            };

            let chunk = match next {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => return StreamOutcome::Failed(e),
                None => return StreamOutcome::Failed(AIError::IncompleteStream),
            };

            if !chunk.delta.is_empty() {
                if let Err(e) = session.append_fragment(&chunk.delta) {
                    return StreamOutcome::Broken(e);
                }
                let token = DraftEvent::Token {
                    delta: chunk.delta.clone(),
                };
                if events.send(token).await.is_err() {
                    debug!("event consumer dropped, cancelling reply");
                    return StreamOutcome::Cancelled;
                }
            }

            if chunk.is_final() {
                return StreamOutcome::Completed;
            }
        }
    }

    /// Settles the session and returns the terminal event.
    async fn finish(&self, session: &mut DraftSession, outcome: StreamOutcome) -> DraftEvent {
        let conversation_id = session.conversation_id().clone();

        match outcome {
            StreamOutcome::Completed => {
                let extractor = session.extractor(!self.disable_seller_hints);
                match session.complete_stream(&extractor) {
                    Ok(proposal) => {
                        self.record_history(session).await;
                        debug!(
                            conversation_id = %conversation_id,
                            state = %session.state(),
                            has_proposal = proposal.has_proposal(),
                            "reply completed"
                        );
                        DraftEvent::End {
                            proposal,
                            state: session.state(),
                            thread_id: session.thread_identity().to_string(),
                        }
                    }
                    Err(e) => self.fail(session, &e.to_string()),
                }
            }
            StreamOutcome::Failed(e) => self.fail(session, &e.to_string()),
            StreamOutcome::Broken(e) => self.fail(session, &e.to_string()),
            StreamOutcome::Cancelled => {
                if let Err(e) = session.cancel_stream() {
                    error!(conversation_id = %conversation_id, error = %e, "could not cancel reply");
                }
                warn!(conversation_id = %conversation_id, "reply generation cancelled");
                DraftEvent::Cancelled
            }
        }
    }

    fn fail(&self, session: &mut DraftSession, cause: &str) -> DraftEvent {
        warn!(
            conversation_id = %session.conversation_id(),
            error = cause,
            "reply generation failed"
        );
        if let Err(e) = session.fail_stream(GENERATION_FAILED_NOTICE) {
            error!(conversation_id = %session.conversation_id(), error = %e, "could not fail reply");
        }
        DraftEvent::Error {
            message: GENERATION_FAILED_NOTICE.to_string(),
        }
    }

    /// Stores the customer turn and the completed reply under the thread.
    async fn record_history(&self, session: &DraftSession) {
        let turns = session.turns();
        let completed = &turns[turns.len().saturating_sub(2)..];

        for turn in completed {
            let record = ThreadRecord::new(
                session.thread_identity().clone(),
                turn.role,
                turn.content.clone(),
            );
            if let Err(e) = self.threads.append(&record).await {
                error!(
                    thread_id = %session.thread_identity(),
                    error = %e,
                    "failed to record thread history"
                );
            }
        }
    }
}

/// Resolves once cancellation has been requested.
async fn wait_for_cancel(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            // Sender gone: nobody can cancel any more.
            std::future::pending::<()>().await;
        }
    }
}

/// Per-turn context handed to the generator.
fn reply_context(hints: Option<&SellerHints>, disable_seller_hints: bool) -> Option<String> {
    if disable_seller_hints {
        return Some(FOLLOW_UP_CONTEXT.to_string());
    }

    let hints = hints?;
    let mut context = String::new();
    if let Some(label) = hints.typology.query_label() {
        context.push_str(&format!("Type de problème détecté : {}\n", label));
    }
    context.push_str("Informations que le vendeur pourrait demander :\n");
    context.push_str(&hints.requirements);
    Some(context)
}
