use super::models::{
    Category, Course, CourseDetails, CourseFilter, CourseOwner, CourseUpdate, NewCourse, NewUser,
    User,
};
use super::schema::CATALOG_VERSIONED_SCHEMAS;
use super::slug::{slugify, unique_slug};
use super::trait_def::{
    AuthTokenStore, CategoryStore, CourseStore, EnrollmentStore, UserCredentialsStore, UserStore,
};
use crate::sqlite_persistence::open_versioned_db;
use crate::user::auth::{AuthToken, AuthTokenValue, CredentialsHasher, PasswordCredentials};
use crate::user::UserRole;
use anyhow::{anyhow, bail, Context, Result};
use rusqlite::types::{Type, Value};
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};
use tracing::{debug, info};

const COURSE_COLUMNS: &str =
    "course.id, course.name, course.description, course.category_id, course.owner_id, course.slug, course.created";

/// Course columns followed by owner and category columns, see `course_details_from_row`.
const COURSE_DETAILS_SELECT: &str = "SELECT course.id, course.name, course.description, course.category_id, course.owner_id, course.slug, course.created, \
     user.id, user.name, \
     category.id, category.name, category.slug \
     FROM course \
     JOIN user ON user.id = course.owner_id \
     JOIN category ON category.id = course.category_id";

#[derive(Clone)]
pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalogStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = open_versioned_db(&db_path, CATALOG_VERSIONED_SCHEMAS)?;
        register_functions(&conn)?;
        info!("Opened catalog db at {:?}", db_path.as_ref());
        Ok(SqliteCatalogStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Catalog db connection lock poisoned"))
    }
}

/// SQLite folds case for ASCII only, `unicode_lower` folds the rest.
fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "unicode_lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|text| text.to_lowercase())),
    )
    .context("Failed to register unicode_lower")?;
    Ok(())
}

fn system_time_from_column_result(value: i64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(value.max(0) as u64)
}

fn system_time_to_secs(time: SystemTime) -> i64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn now_secs() -> i64 {
    system_time_to_secs(SystemTime::now())
}

fn role_from_column(row: &Row, index: usize) -> rusqlite::Result<UserRole> {
    let raw: String = row.get(index)?;
    UserRole::from_str(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Text,
            format!("Unknown user role {}", raw).into(),
        )
    })
}

fn user_from_row(row: &Row, offset: usize) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
        email: row.get(offset + 2)?,
        role: role_from_column(row, offset + 3)?,
        created: row.get(offset + 4)?,
    })
}

fn course_from_row(row: &Row) -> rusqlite::Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        category_id: row.get(3)?,
        owner_id: row.get(4)?,
        slug: row.get(5)?,
        created: row.get(6)?,
    })
}

fn course_details_from_row(row: &Row) -> rusqlite::Result<CourseDetails> {
    Ok(CourseDetails {
        course: course_from_row(row)?,
        owner: CourseOwner {
            id: row.get(7)?,
            name: row.get(8)?,
        },
        category: Category {
            id: row.get(9)?,
            name: row.get(10)?,
            slug: row.get(11)?,
        },
    })
}

fn category_from_row(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
    })
}

/// Escapes `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'` pattern.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn slug_taken(
    conn: &Connection,
    table: &str,
    slug: &str,
    except_id: Option<usize>,
) -> Result<bool> {
    let taken = conn.query_row(
        &format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE slug = ?1 AND id != ?2)",
            table
        ),
        params![slug, except_id.map(|id| id as i64).unwrap_or(-1)],
        |row| row.get::<_, bool>(0),
    )?;
    Ok(taken)
}

fn query_course_by_slug(conn: &Connection, slug: &str) -> Result<Option<Course>> {
    conn.query_row(
        &format!("SELECT {} FROM course WHERE course.slug = ?1", COURSE_COLUMNS),
        params![slug],
        course_from_row,
    )
    .optional()
    .with_context(|| format!("Failed to read course {}", slug))
}

impl UserStore for SqliteCatalogStore {
    fn create_user(&self, new_user: &NewUser, password: &str) -> Result<usize> {
        // Hashing is slow, keep it outside of the connection lock.
        let credentials = PasswordCredentials::create(0, password)?;

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO user (name, email, role) VALUES (?1, ?2, ?3)",
            params![new_user.name, new_user.email, new_user.role.as_str()],
        )
        .with_context(|| format!("Failed to create user {}", new_user.email))?;
        let user_id = tx.last_insert_rowid() as usize;
        tx.execute(
            "INSERT INTO user_password_credentials (user_id, salt, hash, hasher, created) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user_id,
                credentials.salt,
                credentials.hash,
                credentials.hasher.to_string(),
                system_time_to_secs(credentials.created),
            ],
        )?;
        tx.commit()?;
        Ok(user_id)
    }

    fn get_user(&self, user_id: usize) -> Result<Option<User>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, name, email, role, created FROM user WHERE id = ?1",
            params![user_id],
            |row| user_from_row(row, 0),
        )
        .optional()
        .with_context(|| format!("Failed to read user {}", user_id))
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, name, email, role, created FROM user WHERE email = ?1",
            params![email],
            |row| user_from_row(row, 0),
        )
        .optional()
        .with_context(|| format!("Failed to read user {}", email))
    }

    fn get_all_users(&self) -> Result<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, name, email, role, created FROM user ORDER BY id")?;
        let users = stmt
            .query_map([], |row| user_from_row(row, 0))?
            .collect::<rusqlite::Result<Vec<User>>>()?;
        Ok(users)
    }

    fn set_user_role(&self, user_id: usize, role: UserRole) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE user SET role = ?1 WHERE id = ?2",
            params![role.as_str(), user_id],
        )?;
        if updated == 0 {
            bail!("User {} does not exist", user_id);
        }
        Ok(())
    }

    fn delete_user(&self, user_id: usize) -> Result<Option<usize>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM user WHERE id = ?1)",
            params![user_id],
            |row| row.get(0),
        )?;
        if !exists {
            return Ok(None);
        }
        let deleted_courses =
            tx.execute("DELETE FROM course WHERE owner_id = ?1", params![user_id])?;
        tx.execute("DELETE FROM user WHERE id = ?1", params![user_id])?;
        tx.commit()?;
        debug!(
            "Deleted user {} and {} owned courses",
            user_id, deleted_courses
        );
        Ok(Some(deleted_courses))
    }
}

impl UserCredentialsStore for SqliteCatalogStore {
    fn get_password_credentials(&self, user_id: usize) -> Result<Option<PasswordCredentials>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT user_id, salt, hash, hasher, created, last_tried, last_used FROM user_password_credentials WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok((
                        row.get::<_, usize>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, Option<i64>>(5)?,
                        row.get::<_, Option<i64>>(6)?,
                    ))
                },
            )
            .optional()?;

        let Some((user_id, salt, hash, hasher, created, last_tried, last_used)) = row else {
            return Ok(None);
        };
        Ok(Some(PasswordCredentials {
            user_id,
            salt,
            hash,
            hasher: CredentialsHasher::from_str(&hasher)?,
            created: system_time_from_column_result(created),
            last_tried: last_tried.map(system_time_from_column_result),
            last_used: last_used.map(system_time_from_column_result),
        }))
    }

    fn record_login_attempt(&self, user_id: usize, success: bool) -> Result<()> {
        let conn = self.conn()?;
        let now = now_secs();
        if success {
            conn.execute(
                "UPDATE user_password_credentials SET last_tried = ?1, last_used = ?1 WHERE user_id = ?2",
                params![now, user_id],
            )?;
        } else {
            conn.execute(
                "UPDATE user_password_credentials SET last_tried = ?1 WHERE user_id = ?2",
                params![now, user_id],
            )?;
        }
        Ok(())
    }
}

impl AuthTokenStore for SqliteCatalogStore {
    fn get_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT user_id, value, created, last_used FROM auth_token WHERE value = ?1",
            params![token.0],
            |row| {
                Ok(AuthToken {
                    user_id: row.get(0)?,
                    value: AuthTokenValue(row.get(1)?),
                    created: system_time_from_column_result(row.get(2)?),
                    last_used: row
                        .get::<usize, Option<i64>>(3)?
                        .map(system_time_from_column_result),
                })
            },
        )
        .optional()
        .context("Failed to read auth token")
    }

    fn add_auth_token(&self, token: &AuthToken) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO auth_token (user_id, value, created) VALUES (?1, ?2, ?3)",
            params![token.user_id, token.value.0, system_time_to_secs(token.created)],
        )?;
        Ok(())
    }

    fn delete_auth_token(&self, token: &AuthTokenValue) -> Result<Option<AuthToken>> {
        let Some(existing) = self.get_auth_token(token)? else {
            return Ok(None);
        };
        let conn = self.conn()?;
        conn.execute("DELETE FROM auth_token WHERE value = ?1", params![token.0])?;
        Ok(Some(existing))
    }

    fn touch_auth_token(&self, token: &AuthTokenValue) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE auth_token SET last_used = ?1 WHERE value = ?2",
            params![now_secs(), token.0],
        )?;
        Ok(())
    }

    fn prune_unused_auth_tokens(&self, unused_for_days: u64) -> Result<usize> {
        let cutoff = now_secs() - (unused_for_days as i64) * 24 * 60 * 60;
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM auth_token WHERE COALESCE(last_used, created) < ?1",
            params![cutoff],
        )?;
        Ok(deleted)
    }
}

impl CategoryStore for SqliteCatalogStore {
    fn create_category(&self, name: &str) -> Result<Category> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let slug = unique_slug(&slugify(name, "category"), |candidate| {
            slug_taken(&tx, "category", candidate, None)
        })?;
        tx.execute(
            "INSERT INTO category (name, slug) VALUES (?1, ?2)",
            params![name, slug],
        )
        .with_context(|| format!("Failed to create category {}", name))?;
        let id = tx.last_insert_rowid() as usize;
        tx.commit()?;
        Ok(Category {
            id,
            name: name.to_string(),
            slug,
        })
    }

    fn get_category(&self, category_id: usize) -> Result<Option<Category>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, name, slug FROM category WHERE id = ?1",
            params![category_id],
            category_from_row,
        )
        .optional()
        .with_context(|| format!("Failed to read category {}", category_id))
    }

    fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, name, slug FROM category WHERE slug = ?1",
            params![slug],
            category_from_row,
        )
        .optional()
        .with_context(|| format!("Failed to read category {}", slug))
    }

    fn get_all_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, name, slug FROM category ORDER BY name, id")?;
        let categories = stmt
            .query_map([], category_from_row)?
            .collect::<rusqlite::Result<Vec<Category>>>()?;
        Ok(categories)
    }
}

impl CourseStore for SqliteCatalogStore {
    fn create_course(&self, new_course: &NewCourse) -> Result<Course> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let slug = unique_slug(&slugify(&new_course.name, "course"), |candidate| {
            slug_taken(&tx, "course", candidate, None)
        })?;
        tx.execute(
            "INSERT INTO course (name, description, category_id, owner_id, slug) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                new_course.name,
                new_course.description,
                new_course.category_id,
                new_course.owner_id,
                slug
            ],
        )
        .with_context(|| format!("Failed to create course {}", new_course.name))?;
        let course_id = tx.last_insert_rowid();
        let course = tx.query_row(
            &format!("SELECT {} FROM course WHERE course.id = ?1", COURSE_COLUMNS),
            params![course_id],
            course_from_row,
        )?;
        tx.commit()?;
        Ok(course)
    }

    fn get_course(&self, course_id: usize) -> Result<Option<Course>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM course WHERE course.id = ?1", COURSE_COLUMNS),
            params![course_id],
            course_from_row,
        )
        .optional()
        .with_context(|| format!("Failed to read course {}", course_id))
    }

    fn get_course_details(&self, slug: &str) -> Result<Option<CourseDetails>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("{} WHERE course.slug = ?1", COURSE_DETAILS_SELECT),
            params![slug],
            course_details_from_row,
        )
        .optional()
        .with_context(|| format!("Failed to read course {}", slug))
    }

    fn find_courses(&self, filter: &CourseFilter) -> Result<Vec<CourseDetails>> {
        let mut conditions: Vec<String> = vec![];
        let mut values: Vec<Value> = vec![];
        if let Some(category_id) = filter.category_id {
            values.push(Value::Integer(category_id as i64));
            conditions.push(format!("course.category_id = ?{}", values.len()));
        }
        if let Some(text) = &filter.name_contains {
            values.push(Value::Text(format!(
                "%{}%",
                escape_like(&text.to_lowercase())
            )));
            conditions.push(format!(
                "unicode_lower(course.name) LIKE ?{} ESCAPE '\\'",
                values.len()
            ));
        }

        let mut sql = COURSE_DETAILS_SELECT.to_string();
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY course.created DESC, course.id DESC");

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let courses = stmt
            .query_map(params_from_iter(values.iter()), course_details_from_row)?
            .collect::<rusqlite::Result<Vec<CourseDetails>>>()
            .context("Failed to list courses")?;
        Ok(courses)
    }

    fn get_courses_by_owner(&self, owner_id: usize) -> Result<Vec<Course>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM course WHERE course.owner_id = ?1 ORDER BY course.created DESC, course.id DESC",
            COURSE_COLUMNS
        ))?;
        let courses = stmt
            .query_map(params![owner_id], course_from_row)?
            .collect::<rusqlite::Result<Vec<Course>>>()?;
        Ok(courses)
    }

    fn update_course(&self, slug: &str, update: &CourseUpdate) -> Result<Option<Course>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let Some(existing) = query_course_by_slug(&tx, slug)? else {
            return Ok(None);
        };

        let new_slug = if existing.name == update.name {
            existing.slug.clone()
        } else {
            unique_slug(&slugify(&update.name, "course"), |candidate| {
                slug_taken(&tx, "course", candidate, Some(existing.id))
            })?
        };
        tx.execute(
            "UPDATE course SET name = ?1, description = ?2, category_id = ?3, slug = ?4 WHERE id = ?5",
            params![
                update.name,
                update.description,
                update.category_id,
                new_slug,
                existing.id
            ],
        )
        .with_context(|| format!("Failed to update course {}", slug))?;
        tx.commit()?;

        Ok(Some(Course {
            name: update.name.clone(),
            description: update.description.clone(),
            category_id: update.category_id,
            slug: new_slug,
            ..existing
        }))
    }

    fn delete_course(&self, slug: &str) -> Result<Option<Course>> {
        let conn = self.conn()?;
        let Some(existing) = query_course_by_slug(&conn, slug)? else {
            return Ok(None);
        };
        conn.execute("DELETE FROM course WHERE id = ?1", params![existing.id])?;
        Ok(Some(existing))
    }
}

impl EnrollmentStore for SqliteCatalogStore {
    fn enroll(&self, user_id: usize, course_id: usize) -> Result<bool> {
        let conn = self.conn()?;
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO enrollment (user_id, course_id) VALUES (?1, ?2)",
                params![user_id, course_id],
            )
            .with_context(|| format!("Failed to enroll user {} in course {}", user_id, course_id))?;
        Ok(inserted > 0)
    }

    fn release(&self, user_id: usize, course_id: usize) -> Result<usize> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM enrollment WHERE user_id = ?1 AND course_id = ?2",
            params![user_id, course_id],
        )?;
        Ok(removed)
    }

    fn get_enrolled_courses(&self, user_id: usize) -> Result<Vec<Course>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM enrollment JOIN course ON course.id = enrollment.course_id WHERE enrollment.user_id = ?1 ORDER BY enrollment.rowid",
            COURSE_COLUMNS
        ))?;
        let courses = stmt
            .query_map(params![user_id], course_from_row)?
            .collect::<rusqlite::Result<Vec<Course>>>()?;
        Ok(courses)
    }

    fn is_enrolled(&self, user_id: usize, course_id: usize) -> Result<bool> {
        let conn = self.conn()?;
        let enrolled = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM enrollment WHERE user_id = ?1 AND course_id = ?2)",
            params![user_id, course_id],
            |row| row.get(0),
        )?;
        Ok(enrolled)
    }
}
