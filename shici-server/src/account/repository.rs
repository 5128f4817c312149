//! User, favorite and history persistence

use super::types::{User, UserStatus, UserTarget};
use chrono::{DateTime, Utc};
use shici_common::{Error, Page, PageRequest, Result, TargetKind, TargetRef};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const USER_COLUMNS: &str = r#"
    SELECT id, username, password_hash, nickname, avatar_url, email, phone, gender,
           province, city, level, experience, coins, vip_level, status,
           last_login_at, created_at, updated_at
    FROM users
"#;

/// Values for a new user row
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub nickname: &'a str,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
}

/// Columns to overwrite; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<i64>,
    pub province: Option<String>,
    pub city: Option<String>,
}

/// Which account list a target entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetList {
    Favorites,
    History,
}

impl TargetList {
    fn table(self) -> &'static str {
        match self {
            TargetList::Favorites => "user_favorites",
            TargetList::History => "user_history",
        }
    }
}

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new_user: NewUser<'_>) -> Result<User> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, nickname, email, phone, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new_user.username)
        .bind(new_user.password_hash)
        .bind(new_user.nickname)
        .bind(new_user.email)
        .bind(new_user.phone)
        .bind(UserStatus::Active.as_i64())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        self.find_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| Error::Internal("user vanished after insert".into()))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("{} WHERE username = ?", USER_COLUMNS))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    /// True if another user (not `except`) already has this email
    pub async fn email_taken(&self, email: &str, except: Option<i64>) -> Result<bool> {
        self.contact_taken("email", email, except).await
    }

    /// True if another user (not `except`) already has this phone number
    pub async fn phone_taken(&self, phone: &str, except: Option<i64>) -> Result<bool> {
        self.contact_taken("phone", phone, except).await
    }

    async fn contact_taken(&self, column: &str, value: &str, except: Option<i64>) -> Result<bool> {
        let taken: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS (SELECT 1 FROM users WHERE {} = ?1 AND (?2 IS NULL OR id <> ?2))",
            column
        ))
        .bind(value)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    pub async fn update_profile(&self, id: i64, changes: &ProfileChanges) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                nickname = COALESCE(?, nickname),
                avatar_url = COALESCE(?, avatar_url),
                email = COALESCE(?, email),
                phone = COALESCE(?, phone),
                gender = COALESCE(?, gender),
                province = COALESCE(?, province),
                city = COALESCE(?, city),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&changes.nickname)
        .bind(&changes.avatar_url)
        .bind(&changes.email)
        .bind(&changes.phone)
        .bind(changes.gender)
        .bind(&changes.province)
        .bind(&changes.city)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;
        Ok(())
    }

    pub async fn touch_last_login(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Returns false if no such user
    pub async fn set_status(&self, id: i64, status: UserStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_i64())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Insert unless the same (user, target) is already a favorite
    pub async fn add_favorite(&self, user_id: i64, target: &TargetRef) -> Result<UserTarget> {
        sqlx::query(
            r#"
            INSERT INTO user_favorites (user_id, target_kind, target_id, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id, target_kind, target_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(target.kind().as_str())
        .bind(target.id())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(
            r#"
            SELECT id, target_kind, target_id, created_at FROM user_favorites
            WHERE user_id = ? AND target_kind = ? AND target_id = ?
            "#,
        )
        .bind(user_id)
        .bind(target.kind().as_str())
        .bind(target.id())
        .fetch_one(&self.pool)
        .await?;
        target_from_row(&row)
    }

    /// Returns false if it was not a favorite
    pub async fn remove_favorite(&self, user_id: i64, target: &TargetRef) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM user_favorites WHERE user_id = ? AND target_kind = ? AND target_id = ?",
        )
        .bind(user_id)
        .bind(target.kind().as_str())
        .bind(target.id())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Append a history entry; repeats are kept
    pub async fn add_history(&self, user_id: i64, target: &TargetRef) -> Result<UserTarget> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO user_history (user_id, target_kind, target_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(target.kind().as_str())
        .bind(target.id())
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(UserTarget {
            id: result.last_insert_rowid(),
            target: target.clone(),
            created_at,
        })
    }

    pub async fn list_favorites(&self, user_id: i64, kind: Option<TargetKind>, page: PageRequest) -> Result<Page<UserTarget>> {
        self.list_targets(TargetList::Favorites, user_id, kind, page).await
    }

    pub async fn list_history(&self, user_id: i64, kind: Option<TargetKind>, page: PageRequest) -> Result<Page<UserTarget>> {
        self.list_targets(TargetList::History, user_id, kind, page).await
    }

    /// Newest first
    async fn list_targets(
        &self,
        list: TargetList,
        user_id: i64,
        kind: Option<TargetKind>,
        page: PageRequest,
    ) -> Result<Page<UserTarget>> {
        let kind = kind.map(|k| k.as_str());
        let filter = "WHERE user_id = ?1 AND (?2 IS NULL OR target_kind = ?2)";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {} {}", list.table(), filter))
            .bind(user_id)
            .bind(kind)
            .fetch_one(&self.pool)
            .await?;

        let Some(offset) = page.sql_offset() else {
            return Ok(page.page_of(Vec::new(), total as usize));
        };

        let rows = sqlx::query(&format!(
            "SELECT id, target_kind, target_id, created_at FROM {} {} ORDER BY created_at DESC, id DESC LIMIT ?3 OFFSET ?4",
            list.table(),
            filter
        ))
        .bind(user_id)
        .bind(kind)
        .bind(page.page_size as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let items = rows.iter().map(target_from_row).collect::<Result<Vec<_>>>()?;
        Ok(page.page_of(items, total as usize))
    }
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        nickname: row.get("nickname"),
        avatar_url: row.get("avatar_url"),
        email: row.get("email"),
        phone: row.get("phone"),
        gender: row.get("gender"),
        province: row.get("province"),
        city: row.get("city"),
        level: row.get("level"),
        experience: row.get("experience"),
        coins: row.get("coins"),
        vip_level: row.get("vip_level"),
        status: UserStatus::from_i64(row.get("status"))?,
        last_login_at: row.get("last_login_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn target_from_row(row: &SqliteRow) -> Result<UserTarget> {
    let kind: String = row.get("target_kind");
    Ok(UserTarget {
        id: row.get("id"),
        target: TargetRef::from_parts(&kind, row.get("target_id"))
            .map_err(|e| Error::Internal(e.to_string()))?,
        created_at: row.get("created_at"),
    })
}

/// Unique-constraint failures become AlreadyExists (username) or Conflict
fn map_unique_violation(err: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let message = db_err.message();
            if message.contains("users.username") {
                return Error::AlreadyExists("username already registered".into());
            }
            if message.contains("users.email") {
                return Error::Conflict("email already in use".into());
            }
            if message.contains("users.phone") {
                return Error::Conflict("phone already in use".into());
            }
        }
    }
    Error::Database(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shici_common::db::open_in_memory;

    async fn repo_with_user() -> (UserRepository, User) {
        let repo = UserRepository::new(open_in_memory().await.unwrap());
        let user = repo
            .create(NewUser {
                username: "libai",
                password_hash: "$argon2id$fake",
                nickname: "青莲居士",
                email: Some("libai@example.com"),
                phone: None,
            })
            .await
            .unwrap();
        (repo, user)
    }

    #[tokio::test]
    async fn test_create_defaults() {
        let (_, user) = repo_with_user().await;
        assert_eq!(user.status, UserStatus::Active);
        assert_eq!(user.level, 1);
        assert_eq!(user.gender, 0);
        assert!(user.last_login_at.is_none());
    }

    #[tokio::test]
    async fn test_unique_violations_mapped() {
        let (repo, _) = repo_with_user().await;
        let dup_name = repo
            .create(NewUser {
                username: "libai",
                password_hash: "h",
                nickname: "x",
                email: None,
                phone: None,
            })
            .await;
        assert!(matches!(dup_name, Err(Error::AlreadyExists(_))));

        let dup_email = repo
            .create(NewUser {
                username: "dufu",
                password_hash: "h",
                nickname: "x",
                email: Some("libai@example.com"),
                phone: None,
            })
            .await;
        assert!(matches!(dup_email, Err(Error::Conflict(_))));
    }

    #[tokio::test]
    async fn test_contact_taken_excludes_self() {
        let (repo, user) = repo_with_user().await;
        assert!(repo.email_taken("libai@example.com", None).await.unwrap());
        assert!(!repo.email_taken("libai@example.com", Some(user.id)).await.unwrap());
        assert!(!repo.phone_taken("13800000000", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_favorites_dedupe_and_remove() {
        let (repo, user) = repo_with_user().await;
        let poem = TargetRef::Poem("tang-libai-1".into());

        let a = repo.add_favorite(user.id, &poem).await.unwrap();
        let b = repo.add_favorite(user.id, &poem).await.unwrap();
        assert_eq!(a.id, b.id);
        repo.add_favorite(user.id, &TargetRef::Author("李白".into())).await.unwrap();

        let all = repo.list_favorites(user.id, None, PageRequest::default()).await.unwrap();
        assert_eq!(all.total, 2);
        let poems = repo
            .list_favorites(user.id, Some(TargetKind::Poem), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(poems.total, 1);
        assert_eq!(poems.items[0].target, poem);

        assert!(repo.remove_favorite(user.id, &poem).await.unwrap());
        assert!(!repo.remove_favorite(user.id, &poem).await.unwrap());
    }

    #[tokio::test]
    async fn test_favorites_page_past_sql_range_is_empty() {
        let (repo, user) = repo_with_user().await;
        repo.add_favorite(user.id, &TargetRef::Poem("tang-libai-1".into())).await.unwrap();

        let far = PageRequest::new(100_000_000_000_000_000, 100);
        let page = repo.list_favorites(user.id, None, far).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 1);

        let history = repo.list_history(user.id, None, far).await.unwrap();
        assert!(history.items.is_empty());
    }

    #[tokio::test]
    async fn test_history_appends_newest_first() {
        let (repo, user) = repo_with_user().await;
        let first = TargetRef::Poem("a".into());
        let second = TargetRef::Poem("b".into());

        repo.add_history(user.id, &first).await.unwrap();
        repo.add_history(user.id, &second).await.unwrap();
        repo.add_history(user.id, &first).await.unwrap();

        let page = repo.list_history(user.id, None, PageRequest::new(1, 2)).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items[0].target, first);
        assert_eq!(page.items[1].target, second);
    }
}
