use std::convert::TryFrom;

use chrono::NaiveDate;
use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::models::reflection::{EqCategory, StoredReflection};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone)]
pub struct ReflectionRow {
    pub id: String,
    pub user_id: String,
    pub date: String,
    pub items: String,
    pub created_at: String,
    pub updated_at: String,
}

impl ReflectionRow {
    pub fn into_stored(self) -> AppResult<StoredReflection> {
        let date = NaiveDate::parse_from_str(&self.date, DATE_FORMAT)
            .map_err(|err| AppError::validation(format!("invalid reflection date: {err}")))?;

        Ok(StoredReflection {
            id: self.id,
            user_id: self.user_id,
            date,
            items: self.items,
            updated_at: self.updated_at,
        })
    }
}

impl TryFrom<&Row<'_>> for ReflectionRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            date: row.get("date")?,
            items: row.get("items")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

pub struct ReflectionRepository;

impl ReflectionRepository {
    pub fn find_by_user_and_date(
        conn: &Connection,
        user_id: &str,
        date: NaiveDate,
    ) -> AppResult<Option<StoredReflection>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT id, user_id, date, items, created_at, updated_at
                FROM eq_reflections
                WHERE user_id = :user_id AND date = :date
            "#,
        )?;

        let row = stmt
            .query_row(
                named_params! {
                    ":user_id": user_id,
                    ":date": date.format(DATE_FORMAT).to_string(),
                },
                |row| ReflectionRow::try_from(row),
            )
            .optional()?;

        row.map(ReflectionRow::into_stored).transpose()
    }

    /// Writes the whole items document for `(user_id, date)`, creating the
    /// row on first save. Returns the row id.
    pub fn upsert_items(
        conn: &Connection,
        id: &str,
        user_id: &str,
        date: NaiveDate,
        items: &str,
        now: &str,
    ) -> AppResult<String> {
        let row_id = conn.query_row(
            r#"
                INSERT INTO eq_reflections (id, user_id, date, items, created_at, updated_at)
                VALUES (:id, :user_id, :date, :items, :now, :now)
                ON CONFLICT(user_id, date) DO UPDATE SET
                    items = excluded.items,
                    updated_at = excluded.updated_at
                RETURNING id
            "#,
            named_params! {
                ":id": id,
                ":user_id": user_id,
                ":date": date.format(DATE_FORMAT).to_string(),
                ":items": items,
                ":now": now,
            },
            |row| row.get(0),
        )?;

        Ok(row_id)
    }

    /// Writes one category entry, leaving the other entries untouched.
    /// A document that is not a JSON object is replaced.
    pub fn upsert_item(
        conn: &Connection,
        id: &str,
        user_id: &str,
        date: NaiveDate,
        category: EqCategory,
        item: &str,
        now: &str,
    ) -> AppResult<String> {
        let row_id = conn.query_row(
            r#"
                INSERT INTO eq_reflections (id, user_id, date, items, created_at, updated_at)
                VALUES (:id, :user_id, :date, json_object(:category, json(:item)), :now, :now)
                ON CONFLICT(user_id, date) DO UPDATE SET
                    items = json_set(
                        CASE WHEN json_valid(eq_reflections.items)
                            THEN CASE WHEN json_type(eq_reflections.items) = 'object'
                                THEN eq_reflections.items
                                ELSE '{}'
                            END
                            ELSE '{}'
                        END,
                        '$.' || :category,
                        json(:item)
                    ),
                    updated_at = excluded.updated_at
                RETURNING id
            "#,
            named_params! {
                ":id": id,
                ":user_id": user_id,
                ":date": date.format(DATE_FORMAT).to_string(),
                ":category": category.as_str(),
                ":item": item,
                ":now": now,
            },
            |row| row.get(0),
        )?;

        Ok(row_id)
    }

    pub fn list_for_user(
        conn: &Connection,
        user_id: &str,
        limit: usize,
    ) -> AppResult<Vec<StoredReflection>> {
        let mut stmt = conn.prepare(
            r#"
                SELECT id, user_id, date, items, created_at, updated_at
                FROM eq_reflections
                WHERE user_id = :user_id
                ORDER BY date DESC
                LIMIT :limit
            "#,
        )?;

        let records = stmt
            .query_map(
                named_params! {":user_id": user_id, ":limit": limit as i64},
                |row| ReflectionRow::try_from(row),
            )?
            .map(|row| row.map_err(AppError::from).and_then(ReflectionRow::into_stored))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(records)
    }
}
