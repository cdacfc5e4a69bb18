use anyhow::{anyhow, Result};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::transformation::{
    strip_transformation, transformed_url, AspectRatio, TransformationInput, VideoTransformation,
};
use crate::domain::video::Video;
use crate::infra::db::Db;

const VIDEO_COLUMNS: &str = "id, owner_id, title, description, video_url, thumbnail_url, controls, \
     aspect_ratio, width, height, quality, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewVideo {
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub thumbnail_url: String,
    pub controls: bool,
    pub transformation: VideoTransformation,
}

#[derive(Debug, Clone, Default)]
pub struct VideoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub controls: Option<bool>,
    pub transformation: Option<TransformationInput>,
}

#[derive(Clone)]
pub struct VideoService {
    db: Db,
}

impl VideoService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<Video>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM videos ORDER BY created_at DESC, id DESC",
            VIDEO_COLUMNS
        ))
        .fetch_all(self.db.pool())
        .await?;

        rows.iter().map(video_from_row).collect()
    }

    pub async fn get(&self, video_id: Uuid) -> Result<Option<Video>> {
        let row = sqlx::query(&format!("SELECT {} FROM videos WHERE id = $1", VIDEO_COLUMNS))
            .bind(video_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(video_from_row).transpose()
    }

    pub async fn create(&self, owner_id: Uuid, video: NewVideo) -> Result<Video> {
        let video_url = transformed_url(&video.video_url, &video.transformation);
        let row = sqlx::query(&format!(
            "INSERT INTO videos \
                (owner_id, title, description, video_url, thumbnail_url, controls, \
                 aspect_ratio, width, height, quality) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {}",
            VIDEO_COLUMNS
        ))
        .bind(owner_id)
        .bind(video.title)
        .bind(video.description)
        .bind(video_url)
        .bind(video.thumbnail_url)
        .bind(video.controls)
        .bind(video.transformation.aspect_ratio.as_db())
        .bind(video.transformation.width)
        .bind(video.transformation.height)
        .bind(video.transformation.quality)
        .fetch_one(self.db.pool())
        .await?;

        video_from_row(&row)
    }

    pub async fn update(
        &self,
        video_id: Uuid,
        owner_id: Uuid,
        changes: VideoChanges,
    ) -> Result<Option<Video>> {
        let mut tx = self.db.pool().begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM videos WHERE id = $1 AND owner_id = $2 FOR UPDATE",
            VIDEO_COLUMNS
        ))
        .bind(video_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?;

        let current = match row {
            Some(row) => video_from_row(&row)?,
            None => {
                tx.rollback().await?;
                return Ok(None);
            }
        };

        let rebuild_url = changes.transformation.is_some() || changes.video_url.is_some();
        let transformation = match &changes.transformation {
            Some(input) => input.apply_to_video(&current.transformation),
            None => current.transformation.clone(),
        };
        let video_url = if rebuild_url {
            let source = changes.video_url.as_deref().unwrap_or(&current.video_url);
            transformed_url(strip_transformation(source), &transformation)
        } else {
            current.video_url.clone()
        };

        let row = sqlx::query(&format!(
            "UPDATE videos \
             SET title = $3, description = $4, video_url = $5, thumbnail_url = $6, controls = $7, \
                 aspect_ratio = $8, width = $9, height = $10, quality = $11, \
                 updated_at = now() \
             WHERE id = $1 AND owner_id = $2 \
             RETURNING {}",
            VIDEO_COLUMNS
        ))
        .bind(video_id)
        .bind(owner_id)
        .bind(changes.title.unwrap_or(current.title))
        .bind(changes.description.unwrap_or(current.description))
        .bind(video_url)
        .bind(changes.thumbnail_url.unwrap_or(current.thumbnail_url))
        .bind(changes.controls.unwrap_or(current.controls))
        .bind(transformation.aspect_ratio.as_db())
        .bind(transformation.width)
        .bind(transformation.height)
        .bind(transformation.quality)
        .fetch_one(&mut *tx)
        .await?;

        let video = video_from_row(&row)?;
        tx.commit().await?;
        Ok(Some(video))
    }

    pub async fn delete(&self, video_id: Uuid, owner_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1 AND owner_id = $2")
            .bind(video_id)
            .bind(owner_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn video_from_row(row: &PgRow) -> Result<Video> {
    let aspect_ratio: String = row.get("aspect_ratio");
    let aspect_ratio = AspectRatio::from_db(&aspect_ratio)
        .ok_or_else(|| anyhow!("unknown aspect ratio: {}", aspect_ratio))?;

    Ok(Video {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        title: row.get("title"),
        description: row.get("description"),
        video_url: row.get("video_url"),
        thumbnail_url: row.get("thumbnail_url"),
        controls: row.get("controls"),
        transformation: VideoTransformation {
            aspect_ratio,
            width: row.get("width"),
            height: row.get("height"),
            quality: row.get("quality"),
        },
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
