use anyhow::{anyhow, Result};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::image::Image;
use crate::domain::transformation::{
    strip_transformation, transformed_url, AspectRatio, Filter, Transformation,
    TransformationInput,
};
use crate::infra::db::Db;

const IMAGE_COLUMNS: &str = "id, owner_id, title, description, image_url, thumbnail_url, \
     aspect_ratio, width, height, quality, filter, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewImage {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub thumbnail_url: String,
    pub transformation: Transformation,
}

/// Partial replace. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct ImageChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub transformation: Option<TransformationInput>,
}

#[derive(Clone)]
pub struct ImageService {
    db: Db,
}

impl ImageService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<Image>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM images ORDER BY created_at DESC, id DESC",
            IMAGE_COLUMNS
        ))
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(image_from_row).collect()
    }

    pub async fn get(&self, image_id: Uuid) -> Result<Option<Image>> {
        let row = sqlx::query(&format!("SELECT {} FROM images WHERE id = $1", IMAGE_COLUMNS))
            .bind(image_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(image_from_row).transpose()
    }

    pub async fn create(&self, owner_id: Uuid, image: NewImage) -> Result<Image> {
        let image_url = transformed_url(&image.image_url, &image.transformation);
        let row = sqlx::query(&format!(
            "INSERT INTO images \
                (owner_id, title, description, image_url, thumbnail_url, \
                 aspect_ratio, width, height, quality, filter) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {}",
            IMAGE_COLUMNS
        ))
        .bind(owner_id)
        .bind(image.title)
        .bind(image.description)
        .bind(image_url)
        .bind(image.thumbnail_url)
        .bind(image.transformation.aspect_ratio.as_db())
        .bind(image.transformation.width)
        .bind(image.transformation.height)
        .bind(image.transformation.quality)
        .bind(image.transformation.filter.as_db())
        .fetch_one(self.db.pool())
        .await?;

        image_from_row(&row)
    }

    /// Applies `changes` to an image owned by `owner_id`. Returns `None` when
    /// the image does not exist or belongs to someone else.
    pub async fn update(
        &self,
        image_id: Uuid,
        owner_id: Uuid,
        changes: ImageChanges,
    ) -> Result<Option<Image>> {
        let mut tx = self.db.pool().begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM images WHERE id = $1 AND owner_id = $2 FOR UPDATE",
            IMAGE_COLUMNS
        ))
        .bind(image_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?;

        let current = match row {
            Some(row) => image_from_row(&row)?,
            None => {
                tx.rollback().await?;
                return Ok(None);
            }
        };

        let rebuild_url = changes.transformation.is_some() || changes.image_url.is_some();
        let transformation = match &changes.transformation {
            Some(input) => input.apply_to(&current.transformation),
            None => current.transformation.clone(),
        };
        let image_url = if rebuild_url {
            let source = changes.image_url.as_deref().unwrap_or(&current.image_url);
            transformed_url(strip_transformation(source), &transformation)
        } else {
            current.image_url.clone()
        };

        let row = sqlx::query(&format!(
            "UPDATE images \
             SET title = $3, description = $4, image_url = $5, thumbnail_url = $6, \
                 aspect_ratio = $7, width = $8, height = $9, quality = $10, filter = $11, \
                 updated_at = now() \
             WHERE id = $1 AND owner_id = $2 \
             RETURNING {}",
            IMAGE_COLUMNS
        ))
        .bind(image_id)
        .bind(owner_id)
        .bind(changes.title.unwrap_or(current.title))
        .bind(changes.description.unwrap_or(current.description))
        .bind(image_url)
        .bind(changes.thumbnail_url.unwrap_or(current.thumbnail_url))
        .bind(transformation.aspect_ratio.as_db())
        .bind(transformation.width)
        .bind(transformation.height)
        .bind(transformation.quality)
        .bind(transformation.filter.as_db())
        .fetch_one(&mut *tx)
        .await?;

        let image = image_from_row(&row)?;
        tx.commit().await?;
        Ok(Some(image))
    }

    pub async fn delete(&self, image_id: Uuid, owner_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM images WHERE id = $1 AND owner_id = $2")
            .bind(image_id)
            .bind(owner_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn image_from_row(row: &PgRow) -> Result<Image> {
    let aspect_ratio: String = row.get("aspect_ratio");
    let aspect_ratio = AspectRatio::from_db(&aspect_ratio)
        .ok_or_else(|| anyhow!("unknown aspect ratio: {}", aspect_ratio))?;
    let filter: String = row.get("filter");
    let filter =
        Filter::from_db(&filter).ok_or_else(|| anyhow!("unknown image filter: {}", filter))?;

    Ok(Image {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        title: row.get("title"),
        description: row.get("description"),
        image_url: row.get("image_url"),
        thumbnail_url: row.get("thumbnail_url"),
        transformation: Transformation {
            aspect_ratio,
            width: row.get("width"),
            height: row.get("height"),
            quality: row.get("quality"),
            filter,
        },
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
