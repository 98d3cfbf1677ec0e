use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, DatabaseTransaction, EntityTrait, IntoActiveModel, QueryOrder, Set,
};

use super::{Resource, require_movie};
use crate::{
    entities::rating,
    error::{AppError, AppResult},
    models::{Rating, RatingInput},
};

pub struct Ratings;

#[async_trait]
impl Resource for Ratings {
    const NAME: &'static str = "rating";
    const PATH: &'static str = "/ratings";

    type Key = i64;
    type Input = RatingInput;
    type Output = Rating;

    async fn list(txn: &DatabaseTransaction) -> AppResult<Vec<Rating>> {
        let rows = rating::Entity::find().order_by_asc(rating::Column::Id).all(txn).await?;
        Ok(rows.into_iter().map(Rating::from).collect())
    }

    async fn get(txn: &DatabaseTransaction, id: i64) -> AppResult<Rating> {
        rating::Entity::find_by_id(id)
            .one(txn)
            .await?
            .map(Rating::from)
            .ok_or_else(|| AppError::not_found(Self::NAME, id))
    }

    async fn create(txn: &DatabaseTransaction, input: RatingInput) -> AppResult<Rating> {
        require_movie(txn, input.movie_id).await?;

        let movie_id = input.movie_id;
        let row = rating::ActiveModel {
            user_id: Set(input.user_id),
            movie_id: Set(movie_id),
            rating: Set(input.rating),
            timestamp: Set(input.timestamp),
            ..Default::default()
        }
        .insert(txn)
        .await
        .map_err(|err| AppError::from_write(err, || "rating already exists".into(), movie_id))?;

        Ok(row.into())
    }

    async fn update(txn: &DatabaseTransaction, id: i64, input: RatingInput) -> AppResult<Rating> {
        let row = rating::Entity::find_by_id(id)
            .one(txn)
            .await?
            .ok_or_else(|| AppError::not_found(Self::NAME, id))?;
        require_movie(txn, input.movie_id).await?;

        let mut active = row.into_active_model();
        active.user_id = Set(input.user_id);
        active.movie_id = Set(input.movie_id);
        active.rating = Set(input.rating);
        active.timestamp = Set(input.timestamp);

        Ok(active.update(txn).await?.into())
    }

    async fn delete(txn: &DatabaseTransaction, id: i64) -> AppResult<()> {
        let deleted = rating::Entity::delete_by_id(id).exec(txn).await?.rows_affected;
        if deleted == 0 {
            return Err(AppError::not_found(Self::NAME, id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{self, test_support};

    fn input(movie_id: i64) -> RatingInput {
        RatingInput { user_id: 1, movie_id, rating: 4.5, timestamp: 100 }
    }

    #[tokio::test]
    async fn create_assigns_id_and_round_trips() {
        let store = test_support::store_with_movies(&[1]).await;

        let first = repository::create::<Ratings>(&store, input(1)).await.unwrap();
        let second = repository::create::<Ratings>(&store, input(1)).await.unwrap();
        assert_ne!(first.id, second.id);

        let fetched = repository::get::<Ratings>(&store, first.id).await.unwrap();
        assert_eq!(fetched, first);
        assert_eq!(
            (fetched.user_id, fetched.movie_id, fetched.rating, fetched.timestamp),
            (1, 1, 4.5, 100)
        );
    }

    #[tokio::test]
    async fn missing_movie_is_a_foreign_key_violation() {
        let store = test_support::store().await;

        let err = repository::create::<Ratings>(&store, input(9)).await.unwrap_err();
        assert!(matches!(err, AppError::ForeignKeyViolation { movie_id: 9 }));
        assert!(repository::list::<Ratings>(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_replaces_all_fields() {
        let store = test_support::store_with_movies(&[1, 2]).await;
        let created = repository::create::<Ratings>(&store, input(1)).await.unwrap();

        let replacement = RatingInput { user_id: 7, movie_id: 2, rating: 1.0, timestamp: 200 };
        let updated =
            repository::update::<Ratings>(&store, created.id, replacement).await.unwrap();
        assert_eq!(
            updated,
            Rating { id: created.id, user_id: 7, movie_id: 2, rating: 1.0, timestamp: 200 }
        );
    }

    #[tokio::test]
    async fn update_to_missing_movie_is_rejected_and_rolled_back() {
        let store = test_support::store_with_movies(&[1]).await;
        let created = repository::create::<Ratings>(&store, input(1)).await.unwrap();

        let err = repository::update::<Ratings>(&store, created.id, input(404)).await.unwrap_err();
        assert!(matches!(err, AppError::ForeignKeyViolation { movie_id: 404 }));
        assert_eq!(repository::get::<Ratings>(&store, created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn update_missing_rating_is_not_found() {
        let store = test_support::store_with_movies(&[1]).await;

        let err = repository::update::<Ratings>(&store, 12345, input(1)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: "rating", .. }));
        assert!(repository::list::<Ratings>(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_by_generated_id() {
        let store = test_support::store_with_movies(&[1]).await;
        let created = repository::create::<Ratings>(&store, input(1)).await.unwrap();

        repository::delete::<Ratings>(&store, created.id).await.unwrap();
        let err = repository::delete::<Ratings>(&store, created.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
