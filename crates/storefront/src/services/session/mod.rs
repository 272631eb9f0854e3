//! Session lifecycle: sign-up, sign-in, sign-out and profile loading.
//!
//! Identity verification itself happens elsewhere; this service is handed an
//! already-authenticated [`AccountId`] and turns it into a [`Session`].

mod error;

pub use error::SessionError;

use std::sync::Arc;

use tracing::{info, instrument, warn};

use ecofinds_core::{AccountId, DisplayName};

use crate::models::{NewProfile, ProfilePatch, Session};
use crate::store::{LocalFallbackStore, ProfileStore, StoreError};

/// Creates and refreshes [`Session`] values.
#[derive(Clone)]
pub struct SessionManager {
    profiles: Arc<dyn ProfileStore>,
    local: LocalFallbackStore,
}

impl SessionManager {
    /// Create a new session manager.
    #[must_use]
    pub fn new(profiles: Arc<dyn ProfileStore>, local: LocalFallbackStore) -> Self {
        Self { profiles, local }
    }

    /// An anonymous session over the current contents of the local store.
    pub async fn anonymous(&self) -> Session {
        Session::anonymous(self.local.snapshot().await)
    }

    /// Register a new account under a generated id.
    ///
    /// # Errors
    ///
    /// See [`Self::sign_up_with_id`].
    pub async fn sign_up(&self, display_name: &str) -> Result<Session, SessionError> {
        self.sign_up_with_id(AccountId::generate(), display_name)
            .await
    }

    /// Create the profile document for `account_id` and sign it in.
    ///
    /// The new profile starts with an empty cart and purchase history. The
    /// local store is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidDisplayName` if the name is blank or too long.
    /// Returns `SessionError::AlreadyExists` if the account already has a profile.
    #[instrument(skip(self, display_name), fields(account_id = %account_id))]
    pub async fn sign_up_with_id(
        &self,
        account_id: AccountId,
        display_name: &str,
    ) -> Result<Session, SessionError> {
        let display_name = DisplayName::parse(display_name)?;

        let profile = self
            .profiles
            .create(NewProfile {
                account_id: account_id.clone(),
                display_name,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => SessionError::AlreadyExists,
                other => SessionError::Store(other),
            })?;

        info!("Account created");
        Ok(Session::authenticated(account_id, Some(profile)))
    }

    /// Sign in `account_id` and load its profile.
    ///
    /// An account without a profile document still signs in, with the profile
    /// left unloaded; cart operations on such a session fail until a profile
    /// exists and [`Self::refresh`] is called.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Store` if the profile could not be read.
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn sign_in(&self, account_id: AccountId) -> Result<Session, SessionError> {
        let profile = self.profiles.load(&account_id).await?;
        if profile.is_none() {
            warn!("Signed in without a profile document");
        }

        info!("Signed in");
        Ok(Session::authenticated(account_id, profile))
    }

    /// Reload whatever backs `session`: the profile document when signed in,
    /// the local store otherwise.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Store` if the profile could not be read. The
    /// session is unchanged in that case.
    #[instrument(skip(self, session), fields(account_id = ?session.identity()))]
    pub async fn refresh(&self, session: &mut Session) -> Result<(), SessionError> {
        match session.identity() {
            Some(account_id) => {
                let profile = self.profiles.load(account_id).await?;
                if profile.is_none() {
                    warn!("Profile document missing on refresh");
                }
                session.set_profile(profile);
            }
            None => *session = self.anonymous().await,
        }
        Ok(())
    }

    /// Sign out, returning an anonymous session over the local store.
    ///
    /// The local cart is whatever was last stored there; nothing is copied
    /// from the signed-out profile.
    #[instrument(skip(self, session), fields(account_id = ?session.identity()))]
    pub async fn sign_out(&self, session: Session) -> Session {
        if session.is_authenticated() {
            info!("Signed out");
        }
        self.anonymous().await
    }

    /// Change the display name of the signed-in account.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidDisplayName` if the name is blank or too long.
    /// Returns `SessionError::NotAuthenticated` for an anonymous session.
    /// Returns `SessionError::ProfileNotLoaded` if no profile is loaded.
    /// Returns `SessionError::Store` if the write failed; the session is
    /// unchanged in that case.
    #[instrument(skip(self, session, display_name), fields(account_id = ?session.identity()))]
    pub async fn update_display_name(
        &self,
        session: &mut Session,
        display_name: &str,
    ) -> Result<(), SessionError> {
        let display_name = DisplayName::parse(display_name)?;
        let account_id = session
            .identity()
            .ok_or(SessionError::NotAuthenticated)?
            .clone();
        if session.profile().is_none() {
            return Err(SessionError::ProfileNotLoaded(account_id));
        }

        let profile = self
            .profiles
            .mutate(&account_id, ProfilePatch::display_name(display_name))
            .await?;

        session.set_profile(Some(profile));
        info!("Display name updated");
        Ok(())
    }
}
