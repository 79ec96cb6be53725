//! Session lifecycle: login/signup, persistence, restore, timed logout.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::api::{AuthGrant, IdentityEndpoint};
use crate::navigator::{Navigator, LOGIN_ROUTE};
use crate::store::KeyValueStore;
use crate::time::{Clock, Scheduler, SystemClock, TimerHandle, TokioScheduler};

use super::session::SESSION_KEY;
use super::{AuthError, Session};

#[derive(Debug, Clone, Copy)]
enum Operation {
    SignUp,
    SignIn,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::SignUp => write!(f, "signup"),
            Operation::SignIn => write!(f, "login"),
        }
    }
}

struct Inner {
    identity: Arc<dyn IdentityEndpoint>,
    store: Arc<dyn KeyValueStore>,
    navigator: Arc<dyn Navigator>,
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn Scheduler>,
    current: watch::Sender<Option<Session>>,
    expiry_timer: Mutex<TimerSlot>,
}

/// The pending expiry timer and the generation it was armed in.
///
/// Held for the whole of every session transition so that a firing timer
/// either finishes before a new session starts or sees a newer generation.
#[derive(Default)]
struct TimerSlot {
    generation: u64,
    handle: Option<TimerHandle>,
}

/// Owns the current session and keeps it, the durable store and the expiry
/// timer in step.
///
/// Clone is cheap; clones share the same session slot.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(
        identity: Arc<dyn IdentityEndpoint>,
        store: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
        clock: Arc<dyn Clock>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                identity,
                store,
                navigator,
                clock,
                scheduler,
                current,
                expiry_timer: Mutex::new(TimerSlot::default()),
            }),
        }
    }

    /// Wall clock and tokio timers. Expiry timers need a running tokio runtime.
    pub fn with_system_time(
        identity: Arc<dyn IdentityEndpoint>,
        store: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self::new(
            identity,
            store,
            navigator,
            Arc::new(SystemClock),
            Arc::new(TokioScheduler),
        )
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Create an account and start a session for it
    pub async fn signup(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.authenticate(Operation::SignUp, email, password).await
    }

    /// Sign in and start a session
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.authenticate(Operation::SignIn, email, password).await
    }

    async fn authenticate(
        &self,
        operation: Operation,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let identity = &self.inner.identity;
        let result = match operation {
            Operation::SignUp => identity.sign_up(email, password).await,
            Operation::SignIn => identity.sign_in(email, password).await,
        };

        match result {
            Ok(grant) => self.handle_authentication(grant),
            Err(e) => {
                error!(%operation, error = %e, "Authentication failed");
                Err(AuthError::from(&e))
            }
        }
    }

    fn handle_authentication(&self, grant: AuthGrant) -> Result<Session, AuthError> {
        let expires_in_secs = grant.expires_in_secs;
        let now = self.inner.clock.now();
        let Some(session) = Session::from_grant(grant, now) else {
            error!(expires_in_secs, "Identity provider sent an unusable expiry");
            return Err(AuthError::Unknown);
        };

        let mut slot = self.inner.timer_slot();
        self.inner.current.send_replace(Some(session.clone()));
        self.inner.persist(&session);
        self.arm_expiry_timer(&mut slot, session.time_until_expiry(now));

        info!(email = %session.email, expires_at = %session.expires_at, "Session started");
        Ok(session)
    }

    /// Resume the persisted session, if there is one that has not expired.
    ///
    /// An expired record is left in the store untouched. Returns whether a
    /// session is now current.
    pub fn restore_session(&self) -> bool {
        let record = match self.inner.store.get(SESSION_KEY) {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!("No persisted session");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted session");
                return false;
            }
        };

        let session = match Session::from_record(&record) {
            Ok(session) => session,
            Err(e) => {
                debug!(error = %e, "Ignoring malformed persisted session");
                return false;
            }
        };

        let now = self.inner.clock.now();
        if session.is_expired_at(now) {
            debug!(expires_at = %session.expires_at, "Persisted session already expired");
            return false;
        }

        let remaining = session.time_until_expiry(now);
        info!(email = %session.email, expires_at = %session.expires_at, "Session restored");
        let mut slot = self.inner.timer_slot();
        self.inner.current.send_replace(Some(session));
        self.arm_expiry_timer(&mut slot, remaining);
        true
    }

    /// End the session and send the UI to the login view. Safe to call when
    /// already logged out.
    pub fn logout(&self) {
        let mut slot = self.inner.timer_slot();
        self.inner.end_session(&mut slot);
    }

    /// Replace the pending expiry timer with one that logs out after `duration`.
    fn arm_expiry_timer(&self, slot: &mut TimerSlot, duration: Duration) {
        if let Some(previous) = slot.handle.take() {
            debug!("Replacing pending expiry timer");
            previous.cancel();
        }

        slot.generation += 1;
        let generation = slot.generation;
        let weak = Arc::downgrade(&self.inner);
        let handle = self.inner.scheduler.schedule(
            duration,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.expire(generation);
                }
            }),
        );

        slot.handle = Some(handle);
        debug!(expires_in_ms = duration.num_milliseconds(), generation, "Expiry timer armed");
    }

    // =========================================================================
    // Observation
    // =========================================================================

    /// Snapshot of the current session
    pub fn current(&self) -> Option<Session> {
        self.inner.current.borrow().clone()
    }

    /// Follow the current session. The receiver starts at the present value
    /// and sees every later change.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.inner.current.subscribe()
    }

    /// Bearer token of the current session while it is unexpired
    pub fn token(&self) -> Option<String> {
        let now = self.inner.clock.now();
        self.inner
            .current
            .borrow()
            .as_ref()
            .and_then(|s| s.token_at(now))
            .map(str::to_string)
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

impl Inner {
    fn persist(&self, session: &Session) {
        let result = session
            .to_record()
            .map_err(anyhow::Error::from)
            .and_then(|record| self.store.set(SESSION_KEY, &record));

        if let Err(e) = result {
            warn!(error = %e, "Failed to persist session");
        }
    }

    /// Timer callback. A timer armed before the latest session transition is
    /// stale and must not end the session that replaced it.
    fn expire(&self, generation: u64) {
        let mut slot = self.timer_slot();
        if slot.generation != generation {
            debug!(generation, current = slot.generation, "Ignoring stale expiry timer");
            return;
        }
        info!("Session expired");
        self.end_session(&mut slot);
    }

    fn end_session(&self, slot: &mut TimerSlot) {
        slot.generation += 1;
        self.current.send_replace(None);
        self.navigator.navigate(LOGIN_ROUTE);

        if let Err(e) = self.store.remove(SESSION_KEY) {
            warn!(error = %e, "Failed to remove persisted session");
        }

        if let Some(timer) = slot.handle.take() {
            timer.cancel();
        }
        info!("Logged out");
    }

    fn timer_slot(&self) -> MutexGuard<'_, TimerSlot> {
        self.expiry_timer.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ============================================================================
// Tests
// ============================================================================
