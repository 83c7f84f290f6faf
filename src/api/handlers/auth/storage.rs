//! Database helpers for accounts, sessions, and password reset tokens.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::Instrument;

use super::utils::{generate_reset_token, generate_session_token, hash_token, is_unique_violation};

// Token collisions are astronomically unlikely (256-bit values) but the
// unique index makes them a retryable error rather than a corrupt row.
const TOKEN_INSERT_ATTEMPTS: usize = 3;

/// Full account row used by the login flow; the only reader of the password column.
pub(super) struct AccountRecord {
    pub(super) id: i64,
    pub(super) name: String,
    pub(super) email: String,
    pub(super) phone: String,
    pub(super) date_of_birth: String,
    pub(super) password: String,
}

/// Account row without the password column, for responses.
pub(crate) struct AccountProfile {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) phone: String,
    pub(crate) date_of_birth: String,
}

/// Outcome when attempting to create a new account.
#[derive(Debug)]
pub(super) enum InsertAccountOutcome {
    Created(i64),
    EmailTaken,
}

/// Outcome of consuming a password reset token.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum ResetOutcome {
    Completed { account_id: i64 },
    Invalid,
    AlreadyUsed,
    Expired,
}

/// Validity of a stored reset token row at a given instant.
#[derive(Debug, PartialEq, Eq)]
enum ResetTokenState {
    Valid,
    AlreadyUsed,
    Expired,
}

/// A used token stays invalid forever, even once it is also past expiry.
fn classify_reset_token(used: bool, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> ResetTokenState {
    if used {
        ResetTokenState::AlreadyUsed
    } else if now > expires_at {
        ResetTokenState::Expired
    } else {
        ResetTokenState::Valid
    }
}

pub(super) async fn insert_account(
    pool: &PgPool,
    name: &str,
    email: &str,
    phone: &str,
    date_of_birth: &str,
    password: &str,
) -> Result<InsertAccountOutcome> {
    // The unique index on email is the source of truth for duplicates; a
    // pre-flight SELECT would race with concurrent registrations.
    let query = r"
        INSERT INTO accounts (name, email, phone, date_of_birth, password)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(date_of_birth)
        .bind(password)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(InsertAccountOutcome::Created(row.get("id"))),
        Err(err) if is_unique_violation(&err) => Ok(InsertAccountOutcome::EmailTaken),
        Err(err) => Err(err).context("failed to insert account"),
    }
}

/// Look up the full account row by email (login and forgot-password flows).
pub(super) async fn lookup_account_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<AccountRecord>> {
    let query = r"
        SELECT id, name, email, phone, date_of_birth, password
        FROM accounts
        WHERE email = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup account by email")?;

    Ok(row.map(|row| AccountRecord {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        date_of_birth: row.get("date_of_birth"),
        password: row.get("password"),
    }))
}

pub(crate) async fn fetch_account_profile(
    pool: &PgPool,
    account_id: i64,
) -> Result<Option<AccountProfile>> {
    let query = r"
        SELECT id, name, email, phone, date_of_birth
        FROM accounts
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(account_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to fetch account profile")?;

    Ok(row.map(|row| AccountProfile {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        date_of_birth: row.get("date_of_birth"),
    }))
}

/// Apply allow-listed profile updates and return the fresh row.
pub(crate) async fn update_account_profile(
    pool: &PgPool,
    account_id: i64,
    name: Option<&str>,
    phone: Option<&str>,
) -> Result<Option<AccountProfile>> {
    let query = r"
        UPDATE accounts
        SET name = COALESCE($2, name),
            phone = COALESCE($3, phone)
        WHERE id = $1
        RETURNING id, name, email, phone, date_of_birth
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(account_id)
        .bind(name)
        .bind(phone)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to update account profile")?;

    Ok(row.map(|row| AccountProfile {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        date_of_birth: row.get("date_of_birth"),
    }))
}

/// Delete an account and its sessions; returns false when the account is unknown.
pub(crate) async fn delete_account(pool: &PgPool, account_id: i64) -> Result<bool> {
    let mut tx = pool.begin().await.context("begin delete-account transaction")?;

    delete_sessions_for_account(&mut tx, account_id).await?;

    let query = "DELETE FROM accounts WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(account_id)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to delete account")?;

    tx.commit().await.context("commit delete-account transaction")?;
    Ok(result.rows_affected() > 0)
}

/// Replace a legacy plaintext secret with its hashed form after a successful login.
pub(super) async fn update_account_password(
    pool: &PgPool,
    account_id: i64,
    password: &str,
) -> Result<()> {
    let query = "UPDATE accounts SET password = $2 WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(account_id)
        .bind(password)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update account password")?;
    Ok(())
}

/// Mint a session row and return the raw token plus its expiry.
///
/// The raw token goes back to the client; only its hash is stored.
pub(super) async fn insert_session(
    pool: &PgPool,
    account_id: i64,
    ttl_seconds: i64,
) -> Result<(String, DateTime<Utc>)> {
    let query = r"
        INSERT INTO sessions (account_id, token, expires_at)
        VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
        RETURNING expires_at
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );

    for _ in 0..TOKEN_INSERT_ATTEMPTS {
        let token = generate_session_token()?;
        let token_hash = hash_token(&token);
        let result = sqlx::query(query)
            .bind(account_id)
            .bind(&token_hash)
            .bind(ttl_seconds)
            .fetch_one(pool)
            .instrument(span.clone())
            .await;

        match result {
            Ok(row) => return Ok((token, row.get("expires_at"))),
            Err(err) if is_unique_violation(&err) => {}
            Err(err) => return Err(err).context("failed to insert session"),
        }
    }

    Err(anyhow!("failed to generate unique session token"))
}

/// Resolve a token hash to its owning account, honoring expiry.
///
/// Expired rows simply stop matching; they are not purged here.
pub(super) async fn lookup_session_account(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<i64>> {
    let query = r"
        SELECT account_id
        FROM sessions
        WHERE token = $1
          AND expires_at > NOW()
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup session")?;

    Ok(row.map(|row| row.get("account_id")))
}

pub(super) async fn delete_session(pool: &PgPool, token_hash: &str) -> Result<()> {
    // Logout is idempotent; it's fine if no rows are deleted.
    let query = "DELETE FROM sessions WHERE token = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete session")?;
    Ok(())
}

async fn delete_sessions_for_account(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    account_id: i64,
) -> Result<()> {
    let query = "DELETE FROM sessions WHERE account_id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(account_id)
        .execute(&mut **tx)
        .instrument(span)
        .await
        .context("failed to delete account sessions")?;
    Ok(())
}

/// Drop any unused reset token for the account and mint a fresh one.
///
/// At most one active unused token exists per account at any time.
pub(super) async fn replace_reset_token(
    pool: &PgPool,
    account_id: i64,
    ttl_seconds: i64,
) -> Result<(String, DateTime<Utc>)> {
    let mut tx = pool.begin().await.context("begin reset-token transaction")?;

    let query = "DELETE FROM password_reset_tokens WHERE account_id = $1 AND used = FALSE";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(account_id)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to delete previous reset tokens")?;

    let query = r"
        INSERT INTO password_reset_tokens (account_id, token, expires_at)
        VALUES ($1, $2, NOW() + ($3 * INTERVAL '1 second'))
        RETURNING expires_at
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );

    for _ in 0..TOKEN_INSERT_ATTEMPTS {
        let token = generate_reset_token()?;
        let token_hash = hash_token(&token);
        let result = sqlx::query(query)
            .bind(account_id)
            .bind(&token_hash)
            .bind(ttl_seconds)
            .fetch_one(&mut *tx)
            .instrument(span.clone())
            .await;

        match result {
            Ok(row) => {
                let expires_at: DateTime<Utc> = row.get("expires_at");
                tx.commit().await.context("commit reset-token transaction")?;
                return Ok((token, expires_at));
            }
            Err(err) if is_unique_violation(&err) => {}
            Err(err) => return Err(err).context("failed to insert reset token"),
        }
    }

    Err(anyhow!("failed to generate unique reset token"))
}

/// Consume a reset token: write the new secret, mark the token used, and
/// revoke every session for the account.
///
/// All three writes share one transaction, so a failure part-way leaves no
/// half-reset account behind.
pub(super) async fn consume_reset_token(
    pool: &PgPool,
    token_hash: &str,
    new_password: &str,
) -> Result<ResetOutcome> {
    let mut tx = pool.begin().await.context("begin reset transaction")?;

    let query = r"
        SELECT id, account_id, expires_at, used
        FROM password_reset_tokens
        WHERE token = $1
        FOR UPDATE
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(&mut *tx)
        .instrument(span)
        .await
        .context("failed to lookup reset token")?;

    let Some(row) = row else {
        let _ = tx.rollback().await;
        return Ok(ResetOutcome::Invalid);
    };

    let token_id: i64 = row.get("id");
    let account_id: i64 = row.get("account_id");
    let expires_at: DateTime<Utc> = row.get("expires_at");
    let used: bool = row.get("used");

    match classify_reset_token(used, expires_at, Utc::now()) {
        ResetTokenState::AlreadyUsed => {
            let _ = tx.rollback().await;
            return Ok(ResetOutcome::AlreadyUsed);
        }
        ResetTokenState::Expired => {
            let _ = tx.rollback().await;
            return Ok(ResetOutcome::Expired);
        }
        ResetTokenState::Valid => {}
    }

    let query = "UPDATE accounts SET password = $2 WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(account_id)
        .bind(new_password)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to write reset password")?;

    let query = "UPDATE password_reset_tokens SET used = TRUE WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(token_id)
        .execute(&mut *tx)
        .instrument(span)
        .await
        .context("failed to mark reset token used")?;

    delete_sessions_for_account(&mut tx, account_id).await?;

    tx.commit().await.context("commit reset transaction")?;

    Ok(ResetOutcome::Completed { account_id })
}

#[cfg(test)]
mod tests {
    use super::{ResetOutcome, ResetTokenState, classify_reset_token};
    use chrono::{Duration, Utc};

    #[test]
    fn reset_token_valid_before_expiry() {
        let created = Utc::now();
        let expires_at = created + Duration::hours(1);
        let state = classify_reset_token(false, expires_at, created + Duration::minutes(59));
        assert_eq!(state, ResetTokenState::Valid);
    }

    #[test]
    fn reset_token_expired_after_window() {
        let created = Utc::now();
        let expires_at = created + Duration::hours(1);
        let state = classify_reset_token(false, expires_at, created + Duration::minutes(61));
        assert_eq!(state, ResetTokenState::Expired);
    }

    #[test]
    fn reset_token_valid_at_expiry_instant() {
        let expires_at = Utc::now();
        let state = classify_reset_token(false, expires_at, expires_at);
        assert_eq!(state, ResetTokenState::Valid);
    }

    #[test]
    fn used_token_stays_used_even_past_expiry() {
        let created = Utc::now();
        let expires_at = created + Duration::hours(1);
        let state = classify_reset_token(true, expires_at, created + Duration::hours(2));
        assert_eq!(state, ResetTokenState::AlreadyUsed);
    }

    #[test]
    fn reset_outcome_debug_names() {
        assert_eq!(format!("{:?}", ResetOutcome::Invalid), "Invalid");
        assert_eq!(format!("{:?}", ResetOutcome::AlreadyUsed), "AlreadyUsed");
        assert_eq!(format!("{:?}", ResetOutcome::Expired), "Expired");
    }
}
