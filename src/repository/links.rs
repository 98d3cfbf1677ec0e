use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};

use super::{Resource, require_movie, require_same_key};
use crate::{
    entities::link,
    error::{AppError, AppResult},
    models::Link,
};

/// External ids for a movie; at most one per `movieId`, addressed by it.
pub struct Links;

async fn find(txn: &DatabaseTransaction, movie_id: i64) -> AppResult<Option<link::Model>> {
    Ok(link::Entity::find().filter(link::Column::MovieId.eq(movie_id)).one(txn).await?)
}

#[async_trait]
impl Resource for Links {
    const NAME: &'static str = "link";
    const PATH: &'static str = "/links";

    type Key = i64;
    type Input = Link;
    type Output = Link;

    async fn list(txn: &DatabaseTransaction) -> AppResult<Vec<Link>> {
        let rows = link::Entity::find().order_by_asc(link::Column::MovieId).all(txn).await?;
        Ok(rows.into_iter().map(Link::from).collect())
    }

    async fn get(txn: &DatabaseTransaction, movie_id: i64) -> AppResult<Link> {
        find(txn, movie_id)
            .await?
            .map(Link::from)
            .ok_or_else(|| AppError::not_found(Self::NAME, movie_id))
    }

    async fn create(txn: &DatabaseTransaction, input: Link) -> AppResult<Link> {
        let movie_id = input.movie_id;
        let conflict = || format!("link for movie {movie_id} already exists");

        if find(txn, movie_id).await?.is_some() {
            return Err(AppError::Conflict(conflict()));
        }
        require_movie(txn, movie_id).await?;

        let row = link::ActiveModel {
            movie_id: Set(movie_id),
            imdb_id: Set(input.imdb_id),
            tmdb_id: Set(input.tmdb_id),
            ..Default::default()
        }
        .insert(txn)
        .await
        .map_err(|err| AppError::from_write(err, conflict, movie_id))?;

        Ok(row.into())
    }

    async fn update(txn: &DatabaseTransaction, movie_id: i64, input: Link) -> AppResult<Link> {
        require_same_key(Self::NAME, movie_id, input.movie_id)?;

        let row = find(txn, movie_id)
            .await?
            .ok_or_else(|| AppError::not_found(Self::NAME, movie_id))?;

        let mut active = row.into_active_model();
        active.imdb_id = Set(input.imdb_id);
        active.tmdb_id = Set(input.tmdb_id);

        Ok(active.update(txn).await?.into())
    }

    async fn delete(txn: &DatabaseTransaction, movie_id: i64) -> AppResult<()> {
        let deleted = link::Entity::delete_many()
            .filter(link::Column::MovieId.eq(movie_id))
            .exec(txn)
            .await?
            .rows_affected;

        if deleted == 0 {
            return Err(AppError::not_found(Self::NAME, movie_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{self, test_support};

    fn link(movie_id: i64) -> Link {
        Link { movie_id, imdb_id: "0114709".into(), tmdb_id: "862".into() }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = test_support::store_with_movies(&[1]).await;

        assert_eq!(repository::create::<Links>(&store, link(1)).await.unwrap(), link(1));
        assert_eq!(repository::get::<Links>(&store, 1).await.unwrap(), link(1));
    }

    #[tokio::test]
    async fn missing_movie_is_a_foreign_key_violation() {
        let store = test_support::store().await;

        let err = repository::create::<Links>(&store, link(5)).await.unwrap_err();
        assert!(matches!(err, AppError::ForeignKeyViolation { movie_id: 5 }));
        assert!(repository::list::<Links>(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_link_for_movie_conflicts() {
        let store = test_support::store_with_movies(&[2]).await;
        repository::create::<Links>(&store, link(2)).await.unwrap();

        let other = Link { movie_id: 2, imdb_id: "x".into(), tmdb_id: "y".into() };
        let err = repository::create::<Links>(&store, other).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(repository::get::<Links>(&store, 2).await.unwrap(), link(2));
    }

    #[tokio::test]
    async fn update_replaces_external_ids() {
        let store = test_support::store_with_movies(&[3]).await;
        repository::create::<Links>(&store, link(3)).await.unwrap();

        let input = Link { movie_id: 3, imdb_id: "1234567".into(), tmdb_id: "987654".into() };
        assert_eq!(repository::update::<Links>(&store, 3, input.clone()).await.unwrap(), input);
        assert_eq!(repository::get::<Links>(&store, 3).await.unwrap(), input);
    }

    #[tokio::test]
    async fn update_missing_link_is_not_found() {
        let store = test_support::store_with_movies(&[4]).await;

        let err = repository::update::<Links>(&store, 4, link(4)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
        assert!(repository::list::<Links>(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_only_the_link() {
        let store = test_support::store_with_movies(&[6]).await;
        repository::create::<Links>(&store, link(6)).await.unwrap();

        repository::delete::<Links>(&store, 6).await.unwrap();
        assert!(matches!(
            repository::get::<Links>(&store, 6).await.unwrap_err(),
            AppError::NotFound { .. }
        ));
        assert!(repository::get::<crate::repository::Movies>(&store, 6).await.is_ok());

        let err = repository::delete::<Links>(&store, 6).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
