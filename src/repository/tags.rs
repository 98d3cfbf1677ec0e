use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, DatabaseTransaction, EntityTrait, IntoActiveModel, QueryOrder, Set,
};

use super::{Resource, require_movie};
use crate::{
    entities::tag,
    error::{AppError, AppResult},
    models::{Tag, TagInput},
};

pub struct Tags;

#[async_trait]
impl Resource for Tags {
    const NAME: &'static str = "tag";
    const PATH: &'static str = "/tags";

    type Key = i64;
    type Input = TagInput;
    type Output = Tag;

    async fn list(txn: &DatabaseTransaction) -> AppResult<Vec<Tag>> {
        let rows = tag::Entity::find().order_by_asc(tag::Column::Id).all(txn).await?;
        Ok(rows.into_iter().map(Tag::from).collect())
    }

    async fn get(txn: &DatabaseTransaction, id: i64) -> AppResult<Tag> {
        tag::Entity::find_by_id(id)
            .one(txn)
            .await?
            .map(Tag::from)
            .ok_or_else(|| AppError::not_found(Self::NAME, id))
    }

    async fn create(txn: &DatabaseTransaction, input: TagInput) -> AppResult<Tag> {
        require_movie(txn, input.movie_id).await?;

        let movie_id = input.movie_id;
        let row = tag::ActiveModel {
            user_id: Set(input.user_id),
            movie_id: Set(movie_id),
            tag: Set(input.tag),
            timestamp: Set(input.timestamp),
            ..Default::default()
        }
        .insert(txn)
        .await
        .map_err(|err| AppError::from_write(err, || "tag already exists".into(), movie_id))?;

        Ok(row.into())
    }

    async fn update(txn: &DatabaseTransaction, id: i64, input: TagInput) -> AppResult<Tag> {
        let row = tag::Entity::find_by_id(id)
            .one(txn)
            .await?
            .ok_or_else(|| AppError::not_found(Self::NAME, id))?;
        require_movie(txn, input.movie_id).await?;

        let mut active = row.into_active_model();
        active.user_id = Set(input.user_id);
        active.movie_id = Set(input.movie_id);
        active.tag = Set(input.tag);
        active.timestamp = Set(input.timestamp);

        Ok(active.update(txn).await?.into())
    }

    async fn delete(txn: &DatabaseTransaction, id: i64) -> AppResult<()> {
        let deleted = tag::Entity::delete_by_id(id).exec(txn).await?.rows_affected;
        if deleted == 0 {
            return Err(AppError::not_found(Self::NAME, id));
        }
        Ok(())
    }
}
