use serde::Serialize;
use sqlx::{FromRow, PgExecutor, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// A stored account. `password_hash` and the soft-delete marker never leave
/// the server; everything else is the public body of `GET /user`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile_phone: String,
    pub company: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub access_token: String,
    pub email_confirmed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(skip_serializing)]
    pub deleted_at: Option<OffsetDateTime>,
}

pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub mobile_phone: &'a str,
    pub company: &'a str,
    pub password_hash: &'a str,
    pub access_token: &'a str,
}

#[derive(Default)]
pub struct ProfileChanges<'a> {
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub mobile_phone: Option<&'a str>,
    pub company: Option<&'a str>,
}

impl User {
    pub async fn find_by_id(db: impl PgExecutor<'_>, id: Uuid) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, mobile_phone, company,
                   password_hash, access_token, email_confirmed, created_at, deleted_at
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Lookup by email, case-insensitive, live rows only.
    pub async fn find_by_email(
        db: impl PgExecutor<'_>,
        email: &str,
    ) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, mobile_phone, company,
                   password_hash, access_token, email_confirmed, created_at, deleted_at
            FROM users
            WHERE lower(email) = lower($1) AND deleted_at IS NULL
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await
    }

    /// Resolve a bearer credential to its owner. Soft-deleted users do not
    /// authenticate.
    pub async fn find_by_access_token(
        db: impl PgExecutor<'_>,
        access_token: &str,
    ) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, mobile_phone, company,
                   password_hash, access_token, email_confirmed, created_at, deleted_at
            FROM users
            WHERE access_token = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(access_token)
        .fetch_optional(db)
        .await
    }

    pub async fn email_taken(db: impl PgExecutor<'_>, email: &str) -> sqlx::Result<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users WHERE lower(email) = lower($1) AND deleted_at IS NULL
            )
            "#,
        )
        .bind(email)
        .fetch_one(db)
        .await
    }

    pub async fn email_taken_by_other(
        db: impl PgExecutor<'_>,
        email: &str,
        user_id: Uuid,
    ) -> sqlx::Result<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                WHERE lower(email) = lower($1) AND id <> $2 AND deleted_at IS NULL
            )
            "#,
        )
        .bind(email)
        .bind(user_id)
        .fetch_one(db)
        .await
    }

    pub async fn create(db: &PgPool, new_user: &NewUser<'_>) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users
                (first_name, last_name, email, mobile_phone, company, password_hash, access_token)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, first_name, last_name, email, mobile_phone, company,
                      password_hash, access_token, email_confirmed, created_at, deleted_at
            "#,
        )
        .bind(new_user.first_name)
        .bind(new_user.last_name)
        .bind(new_user.email)
        .bind(new_user.mobile_phone)
        .bind(new_user.company)
        .bind(new_user.password_hash)
        .bind(new_user.access_token)
        .fetch_one(db)
        .await
    }

    /// Partial profile update; absent fields keep their stored value.
    /// Password and access token are not reachable from here.
    pub async fn update_profile(
        db: impl PgExecutor<'_>,
        id: Uuid,
        changes: &ProfileChanges<'_>,
    ) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email),
                mobile_phone = COALESCE($5, mobile_phone),
                company = COALESCE($6, company)
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, first_name, last_name, email, mobile_phone, company,
                      password_hash, access_token, email_confirmed, created_at, deleted_at
            "#,
        )
        .bind(id)
        .bind(changes.first_name)
        .bind(changes.last_name)
        .bind(changes.email)
        .bind(changes.mobile_phone)
        .bind(changes.company)
        .fetch_optional(db)
        .await
    }

    pub async fn set_password_hash(
        db: impl PgExecutor<'_>,
        id: Uuid,
        password_hash: &str,
    ) -> sqlx::Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .bind(password_hash)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn mark_email_confirmed(db: impl PgExecutor<'_>, id: Uuid) -> sqlx::Result<()> {
        sqlx::query("UPDATE users SET email_confirmed = TRUE WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Soft delete: the row stays, every lookup above stops seeing it.
    pub async fn soft_delete(db: impl PgExecutor<'_>, id: Uuid) -> sqlx::Result<()> {
        sqlx::query("UPDATE users SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            first_name: "John".into(),
            last_name: "Doe".into(),
            email: "john.doe@company.lt".into(),
            mobile_phone: "+37069037984".into(),
            company: "Company".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$secret".into(),
            access_token: "EOryR8qub5XiiNm9oyLIFZ4iKHP662UC".into(),
            email_confirmed: false,
            created_at: OffsetDateTime::UNIX_EPOCH,
            deleted_at: None,
        }
    }

    #[test]
    fn serialized_user_never_contains_password_hash() {
        let json = serde_json::to_string(&sample_user()).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("deleted_at"));
    }

    #[test]
    fn serialized_user_exposes_profile_and_access_token() {
        let json = serde_json::to_string(&sample_user()).unwrap();
        assert!(json.contains("john.doe@company.lt"));
        assert!(json.contains("EOryR8qub5XiiNm9oyLIFZ4iKHP662UC"));
        assert!(json.contains("\"email_confirmed\":false"));
    }
}
