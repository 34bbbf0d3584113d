//! User lifecycle: create, list, update, guarded delete, bulk import.

use super::{map_write_err, Store};
use pulse_core::error::PulseError;
use pulse_core::model::{User, UserSummary};

const USER_COLUMNS: &str =
    "id, phone_number, name, timezone, is_active, created_at, updated_at";

impl Store {
    /// Create a user. Returns `Conflict` when the phone number already exists.
    pub async fn create_user(
        &self,
        phone_number: &str,
        name: Option<&str>,
        timezone: &str,
    ) -> Result<User, PulseError> {
        let result = sqlx::query("INSERT INTO users (phone_number, name, timezone) VALUES (?, ?, ?)")
            .bind(phone_number)
            .bind(name)
            .bind(timezone)
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_err(e, "create user"))?;

        let id = result.last_insert_rowid();
        self.get_user(id).await?.ok_or_else(|| {
            PulseError::Store(format!("created user {id} not found on readback"))
        })
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>, PulseError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| PulseError::Store(format!("get user failed: {e}")))
    }

    pub async fn get_user_by_phone(&self, phone_number: &str) -> Result<Option<User>, PulseError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE phone_number = ?"
        ))
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PulseError::Store(format!("get user by phone failed: {e}")))
    }

    /// All users, newest first, joined with their response stats.
    pub async fn list_users(&self) -> Result<Vec<UserSummary>, PulseError> {
        sqlx::query_as::<_, UserSummary>(
            "SELECT u.id, u.phone_number, u.name, u.timezone, u.is_active,
                    u.created_at, u.updated_at,
                    COUNT(sr.id) AS total_responses,
                    MAX(sr.submitted_at) AS last_response
             FROM users u
             LEFT JOIN survey_responses sr ON u.id = sr.user_id
             GROUP BY u.id
             ORDER BY u.created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PulseError::Store(format!("list users failed: {e}")))
    }

    /// Users eligible for daily dispatch.
    pub async fn active_users(&self) -> Result<Vec<User>, PulseError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE is_active = 1 ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PulseError::Store(format!("active users failed: {e}")))
    }

    /// Update fields of a user. Only non-`None` fields are touched.
    /// Returns the updated row, or `None` when the user does not exist.
    pub async fn update_user(
        &self,
        id: i64,
        name: Option<&str>,
        timezone: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<Option<User>, PulseError> {
        let mut sets = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(n) = name {
            sets.push("name = ?");
            values.push(n.to_string());
        }
        if let Some(tz) = timezone {
            sets.push("timezone = ?");
            values.push(tz.to_string());
        }
        if let Some(active) = is_active {
            sets.push("is_active = ?");
            values.push(if active { "1".into() } else { "0".into() });
        }

        if sets.is_empty() {
            return self.get_user(id).await;
        }
        sets.push("updated_at = CURRENT_TIMESTAMP");

        let sql = format!("UPDATE users SET {} WHERE id = ?", sets.join(", "));
        let mut query = sqlx::query(&sql);
        for v in &values {
            query = query.bind(v);
        }
        query = query.bind(id);

        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| map_write_err(e, "update user"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_user(id).await
    }

    /// Number of stored responses for a user. Non-zero blocks hard deletion.
    pub async fn user_response_count(&self, id: i64) -> Result<i64, PulseError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM survey_responses WHERE user_id = ?")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| PulseError::Store(format!("user response count failed: {e}")))?;
        Ok(count)
    }

    /// Hard-delete a user. Callers must first check `user_response_count`.
    /// Returns `false` when no such user exists.
    pub async fn delete_user(&self, id: i64) -> Result<bool, PulseError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| PulseError::Store(format!("delete user failed: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    /// Bulk-import insert: existing phone numbers are silently skipped.
    /// Returns `true` when a row was actually inserted.
    pub async fn import_user(
        &self,
        phone_number: &str,
        name: Option<&str>,
        timezone: &str,
    ) -> Result<bool, PulseError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO users (phone_number, name, timezone) VALUES (?, ?, ?)",
        )
        .bind(phone_number)
        .bind(name)
        .bind(timezone)
        .execute(&self.pool)
        .await
        .map_err(|e| PulseError::Store(format!("import user failed: {e}")))?;
        Ok(result.rows_affected() > 0)
    }
}
