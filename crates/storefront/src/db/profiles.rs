//! Profile repository backed by `PostgreSQL`.
//!
//! Cart and purchases are `JSONB` columns. Queries are checked at runtime
//! (`sqlx::query_as`) so the crate builds without a live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use ecofinds_core::{AccountId, DisplayName};

use crate::models::{NewProfile, Profile, ProfilePatch};
use crate::store::{ProfileStore, StoreError, normalize_sequence};

/// [`ProfileStore`] over the `storefront.profile` table.
#[derive(Debug, Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    account_id: String,
    display_name: String,
    cart: Option<serde_json::Value>,
    purchases: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let account_id = AccountId::parse(&row.account_id).map_err(|e| {
            StoreError::DataCorruption(format!("invalid account id in database: {e}"))
        })?;
        let display_name = DisplayName::parse(&row.display_name).map_err(|e| {
            StoreError::DataCorruption(format!("invalid display name in database: {e}"))
        })?;
        let cart = normalize_sequence(row.cart).map_err(|e| {
            StoreError::DataCorruption(format!("invalid cart for {account_id}: {e}"))
        })?;
        let purchases = normalize_sequence(row.purchases).map_err(|e| {
            StoreError::DataCorruption(format!("invalid purchases for {account_id}: {e}"))
        })?;

        Ok(Self {
            account_id,
            display_name,
            cart,
            purchases,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl PgProfileStore {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn create(&self, profile: NewProfile) -> Result<Profile, StoreError> {
        let row: ProfileRow = sqlx::query_as(
            r"
            INSERT INTO storefront.profile (account_id, display_name)
            VALUES ($1, $2)
            RETURNING account_id, display_name, cart, purchases, created_at, updated_at
            ",
        )
        .bind(&profile.account_id)
        .bind(profile.display_name.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::Conflict("profile already exists".to_owned());
            }
            StoreError::Database(e)
        })?;

        row.try_into()
    }

    async fn load(&self, account_id: &AccountId) -> Result<Option<Profile>, StoreError> {
        let row: Option<ProfileRow> = sqlx::query_as(
            r"
            SELECT account_id, display_name, cart, purchases, created_at, updated_at
            FROM storefront.profile
            WHERE account_id = $1
            ",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Profile::try_from).transpose()
    }

    async fn mutate(
        &self,
        account_id: &AccountId,
        patch: ProfilePatch,
    ) -> Result<Profile, StoreError> {
        let display_name = patch.display_name.as_ref().map(DisplayName::as_str);
        let cart = patch.cart.map(Json);
        let purchases = patch.purchases.map(Json);

        let row: Option<ProfileRow> = sqlx::query_as(
            r"
            UPDATE storefront.profile
            SET display_name = COALESCE($2, display_name),
                cart = COALESCE($3, cart),
                purchases = COALESCE($4, purchases),
                updated_at = now()
            WHERE account_id = $1
            RETURNING account_id, display_name, cart, purchases, created_at, updated_at
            ",
        )
        .bind(account_id)
        .bind(display_name)
        .bind(cart)
        .bind(purchases)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(StoreError::NotFound)?.try_into()
    }
}
