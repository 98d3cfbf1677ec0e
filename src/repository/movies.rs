use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};

use super::{Resource, require_same_key};
use crate::{
    entities::{link, movie, rating, tag},
    error::{AppError, AppResult},
    models::Movie,
};

pub struct Movies;

#[async_trait]
impl Resource for Movies {
    const NAME: &'static str = "movie";
    const PATH: &'static str = "/movies";

    type Key = i64;
    type Input = Movie;
    type Output = Movie;

    async fn list(txn: &DatabaseTransaction) -> AppResult<Vec<Movie>> {
        let rows = movie::Entity::find().order_by_asc(movie::Column::MovieId).all(txn).await?;
        Ok(rows.into_iter().map(Movie::from).collect())
    }

    async fn get(txn: &DatabaseTransaction, movie_id: i64) -> AppResult<Movie> {
        movie::Entity::find_by_id(movie_id)
            .one(txn)
            .await?
            .map(Movie::from)
            .ok_or_else(|| AppError::not_found(Self::NAME, movie_id))
    }

    async fn create(txn: &DatabaseTransaction, input: Movie) -> AppResult<Movie> {
        let movie_id = input.movie_id;
        let conflict = || format!("movie {movie_id} already exists");

        if movie::Entity::find_by_id(movie_id).one(txn).await?.is_some() {
            return Err(AppError::Conflict(conflict()));
        }

        let row = movie::ActiveModel {
            movie_id: Set(movie_id),
            title: Set(input.title),
            genres: Set(input.genres),
        }
        .insert(txn)
        .await
        .map_err(|err| AppError::from_write(err, conflict, movie_id))?;

        Ok(row.into())
    }

    async fn update(txn: &DatabaseTransaction, movie_id: i64, input: Movie) -> AppResult<Movie> {
        require_same_key(Self::NAME, movie_id, input.movie_id)?;

        let row = movie::Entity::find_by_id(movie_id)
            .one(txn)
            .await?
            .ok_or_else(|| AppError::not_found(Self::NAME, movie_id))?;

        let mut active = row.into_active_model();
        active.title = Set(input.title);
        active.genres = Set(input.genres);

        Ok(active.update(txn).await?.into())
    }

    async fn delete(txn: &DatabaseTransaction, movie_id: i64) -> AppResult<()> {
        if movie::Entity::find_by_id(movie_id).one(txn).await?.is_none() {
            return Err(AppError::not_found(Self::NAME, movie_id));
        }

        // Dependents first so the parent row is never gone while they remain.
        let links = link::Entity::delete_many()
            .filter(link::Column::MovieId.eq(movie_id))
            .exec(txn)
            .await?
            .rows_affected;
        let ratings = rating::Entity::delete_many()
            .filter(rating::Column::MovieId.eq(movie_id))
            .exec(txn)
            .await?
            .rows_affected;
        let tags = tag::Entity::delete_many()
            .filter(tag::Column::MovieId.eq(movie_id))
            .exec(txn)
            .await?
            .rows_affected;

        movie::Entity::delete_by_id(movie_id).exec(txn).await?;

        tracing::debug!(movie_id, links, ratings, tags, "removed movie with dependents");
        Ok(())
    }
}
