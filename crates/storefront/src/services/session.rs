//! The signed-in user's profile.
//!
//! A [`Session`] is the explicit replacement for a global "current user":
//! services that need to know who is acting receive one. It holds the
//! profile behind a `watch` channel so views can observe changes.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use cafe_core::{Identity, UserProfile};

use crate::store::{StoreError, UserDirectory};

/// Handle to the current user's profile. Cheap to clone.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    users: Arc<dyn UserDirectory>,
    profile: watch::Sender<Option<UserProfile>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.current().map(|p| p.id))
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a signed-out session.
    #[must_use]
    pub fn new(users: Arc<dyn UserDirectory>) -> Self {
        let (profile, _) = watch::channel(None);
        Self {
            inner: Arc::new(SessionInner { users, profile }),
        }
    }

    /// Current profile, if signed in.
    #[must_use]
    pub fn current(&self) -> Option<UserProfile> {
        self.inner.profile.borrow().clone()
    }

    /// Whether a profile is loaded.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.profile.borrow().is_some()
    }

    /// Observe profile changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<UserProfile>> {
        self.inner.profile.subscribe()
    }

    /// Replace the profile outright.
    pub fn set_profile(&self, profile: Option<UserProfile>) {
        self.inner.profile.send_replace(profile);
    }

    /// Mirror a points balance already written to the user directory.
    pub fn set_points(&self, points: u32) {
        self.inner.profile.send_if_modified(|profile| match profile {
            Some(p) if p.points != points => {
                p.points = points;
                true
            }
            _ => false,
        });
    }

    /// Load the profile for an identity, or clear it.
    ///
    /// An identity without a profile leaves the session signed out.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the profile cannot be read. A profile that
    /// already belongs to the identity is kept; any other is cleared so the
    /// session never acts as the previous user.
    #[instrument(skip(self, identity), fields(user_id = identity.map(|i| i.user_id.as_str())))]
    pub async fn apply_identity(
        &self,
        identity: Option<&Identity>,
    ) -> Result<Option<UserProfile>, StoreError> {
        let profile = match identity {
            None => None,
            Some(identity) => {
                let profile = match self.inner.users.get_profile(&identity.user_id).await {
                    Ok(profile) => profile,
                    Err(e) => {
                        let stale = self
                            .current()
                            .is_some_and(|current| current.id != identity.user_id);
                        if stale {
                            warn!("Clearing previous user's profile after failed load");
                            self.set_profile(None);
                        }
                        return Err(e);
                    }
                };
                if profile.is_none() {
                    warn!("Identity has no profile");
                }
                profile
            }
        };
        self.set_profile(profile.clone());
        Ok(profile)
    }

    /// Track identity changes until the provider goes away.
    ///
    /// Meant to be spawned. Profile load failures are logged; see
    /// [`Session::apply_identity`] for what the session holds afterwards.
    pub async fn follow(self, mut identities: watch::Receiver<Option<Identity>>) {
        loop {
            let identity = identities.borrow_and_update().clone();
            if let Err(e) = self.apply_identity(identity.as_ref()).await {
                warn!(error = %e, "Failed to load profile for identity change");
            }
            if identities.changed().await.is_err() {
                debug!("Identity provider closed; session no longer following");
                return;
            }
        }
    }
}
