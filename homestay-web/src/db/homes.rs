//! Home persistence

use homestay_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use crate::homes::Home;

const HOME_COLUMNS: &str = "guid, house_name, price, location, rating, description, \
     photo, photo_asset_id, rules_url, rules_asset_id";

fn home_from_row(row: &SqliteRow) -> Result<Home> {
    let guid_str: String = row.get("guid");
    let id = Uuid::parse_str(&guid_str)
        .map_err(|e| Error::Internal(format!("Invalid home guid '{}': {}", guid_str, e)))?;

    Ok(Home {
        id,
        house_name: row.get("house_name"),
        price: row.get("price"),
        location: row.get("location"),
        rating: row.get("rating"),
        description: row.get("description"),
        photo: row.get("photo"),
        photo_asset_id: row.get("photo_asset_id"),
        rules_url: row.get("rules_url"),
        rules_asset_id: row.get("rules_asset_id"),
    })
}

/// Insert a new home
pub async fn insert_home(pool: &SqlitePool, home: &Home) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO homes (guid, house_name, price, location, rating, description,
                           photo, photo_asset_id, rules_url, rules_asset_id)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(home.id.to_string())
    .bind(&home.house_name)
    .bind(home.price)
    .bind(&home.location)
    .bind(home.rating)
    .bind(&home.description)
    .bind(&home.photo)
    .bind(&home.photo_asset_id)
    .bind(&home.rules_url)
    .bind(&home.rules_asset_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a home by id
pub async fn load_home(pool: &SqlitePool, id: Uuid) -> Result<Option<Home>> {
    let row = sqlx::query(&format!("SELECT {} FROM homes WHERE guid = ?", HOME_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(home_from_row).transpose()
}

/// Load all homes in insertion order
pub async fn load_all_homes(pool: &SqlitePool) -> Result<Vec<Home>> {
    let rows = sqlx::query(&format!("SELECT {} FROM homes ORDER BY rowid", HOME_COLUMNS))
        .fetch_all(pool)
        .await?;

    rows.iter().map(home_from_row).collect()
}

/// Overwrite every mutable column of an existing home
///
/// Returns false if no row has that id.
pub async fn update_home(pool: &SqlitePool, home: &Home) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE homes
        SET house_name = ?, price = ?, location = ?, rating = ?, description = ?,
            photo = ?, photo_asset_id = ?, rules_url = ?, rules_asset_id = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE guid = ?
        "#,
    )
    .bind(&home.house_name)
    .bind(home.price)
    .bind(&home.location)
    .bind(home.rating)
    .bind(&home.description)
    .bind(&home.photo)
    .bind(&home.photo_asset_id)
    .bind(&home.rules_url)
    .bind(&home.rules_asset_id)
    .bind(home.id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a home; returns false if it did not exist
pub async fn delete_home(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM homes WHERE guid = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
