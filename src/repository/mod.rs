//! Per-entity CRUD over a single unit of work.
//!
//! Each entity implements [`Resource`] against an already-open transaction.
//! The free functions in this module own the session lifecycle: they open a
//! [`Session`](crate::session::Session), delegate, and commit only when the
//! operation returned `Ok`. An `Err` drops the session, which rolls it back.

mod links;
mod movies;
mod ratings;
mod tags;

use std::fmt::Display;

use async_trait::async_trait;
use sea_orm::{DatabaseTransaction, EntityTrait};
use serde::{Serialize, de::DeserializeOwned};

pub use self::{links::Links, movies::Movies, ratings::Ratings, tags::Tags};
use crate::{
    entities::movie,
    error::{AppError, AppResult},
    session::Store,
};

#[async_trait]
pub trait Resource: Send + Sync + 'static {
    /// Singular name used in messages and logs.
    const NAME: &'static str;
    /// Collection path; items live at `{PATH}/{key}`.
    const PATH: &'static str;

    type Key: DeserializeOwned + Display + Copy + Send + Sync + 'static;
    type Input: DeserializeOwned + Send + 'static;
    type Output: Serialize + Send + 'static;

    async fn list(txn: &DatabaseTransaction) -> AppResult<Vec<Self::Output>>;

    async fn get(txn: &DatabaseTransaction, key: Self::Key) -> AppResult<Self::Output>;

    async fn create(txn: &DatabaseTransaction, input: Self::Input) -> AppResult<Self::Output>;

    /// Replaces every mutable field with the values in `input`.
    async fn update(
        txn: &DatabaseTransaction,
        key: Self::Key,
        input: Self::Input,
    ) -> AppResult<Self::Output>;

    async fn delete(txn: &DatabaseTransaction, key: Self::Key) -> AppResult<()>;
}

pub async fn list<R: Resource>(store: &Store) -> AppResult<Vec<R::Output>> {
    let session = store.session().await?;
    let rows = R::list(&session).await?;
    session.commit().await?;
    Ok(rows)
}

pub async fn get<R: Resource>(store: &Store, key: R::Key) -> AppResult<R::Output> {
    let session = store.session().await?;
    let row = R::get(&session, key).await?;
    session.commit().await?;
    Ok(row)
}

pub async fn create<R: Resource>(store: &Store, input: R::Input) -> AppResult<R::Output> {
    let session = store.session().await?;
    let row = R::create(&session, input).await?;
    session.commit().await?;
    tracing::debug!(resource = R::NAME, "created");
    Ok(row)
}

pub async fn update<R: Resource>(
    store: &Store,
    key: R::Key,
    input: R::Input,
) -> AppResult<R::Output> {
    let session = store.session().await?;
    let row = R::update(&session, key, input).await?;
    session.commit().await?;
    tracing::debug!(resource = R::NAME, key = %key, "updated");
    Ok(row)
}

pub async fn delete<R: Resource>(store: &Store, key: R::Key) -> AppResult<()> {
    let session = store.session().await?;
    R::delete(&session, key).await?;
    session.commit().await?;
    tracing::debug!(resource = R::NAME, key = %key, "deleted");
    Ok(())
}

/// Fails with `ForeignKeyViolation` unless `movie_id` names an existing movie
/// as seen by this transaction.
async fn require_movie(txn: &DatabaseTransaction, movie_id: i64) -> AppResult<()> {
    match movie::Entity::find_by_id(movie_id).one(txn).await? {
        Some(_) => Ok(()),
        None => Err(AppError::ForeignKeyViolation { movie_id }),
    }
}

/// Movie and Link items are addressed by `movieId`, which is immutable.
fn require_same_key(entity: &str, path_key: i64, body_key: i64) -> AppResult<()> {
    if path_key == body_key {
        return Ok(());
    }
    Err(AppError::Validation(format!(
        "{entity} movieId {body_key} in body does not match {path_key} in path"
    )))
}


#[cfg(test)]
mod tests {
    use sea_orm::{ActiveModelTrait, Set};

    use super::*;
    use crate::{
        entities::{link, rating},
        models::Link,
    };

    #[tokio::test]
    async fn duplicate_link_rejected_by_store_is_a_conflict() {
        let store = test_support::store_with_movies(&[1]).await;
        let existing = Link { movie_id: 1, imdb_id: "0114709".into(), tmdb_id: "862".into() };
        create::<Links>(&store, existing).await.unwrap();

        let session = store.session().await.unwrap();
        let err = link::ActiveModel {
            movie_id: Set(1),
            imdb_id: Set("other".into()),
            tmdb_id: Set("other".into()),
            ..Default::default()
        }
        .insert(&*session)
        .await
        .unwrap_err();

        let err = AppError::from_write(err, || "duplicate link".into(), 1);
        assert!(matches!(&err, AppError::Conflict(msg) if msg == "duplicate link"));
    }

    #[tokio::test]
    async fn orphan_rating_rejected_by_store_is_a_foreign_key_violation() {
        let store = test_support::store().await;

        let session = store.session().await.unwrap();
        let err = rating::ActiveModel {
            user_id: Set(1),
            movie_id: Set(77),
            rating: Set(2.5),
            timestamp: Set(1),
            ..Default::default()
        }
        .insert(&*session)
        .await
        .unwrap_err();

        let err = AppError::from_write(err, || "unused".into(), 77);
        assert!(matches!(err, AppError::ForeignKeyViolation { movie_id: 77 }));
    }

    #[tokio::test]
    async fn racing_movie_creates_leave_one_winner_and_one_conflict() {
        let (store, _dir) = test_support::file_store().await;

        let winner = store.session().await.unwrap();
        let loser = store.session().await.unwrap();

        // Both sessions pass the existence check before either writes.
        assert!(Movies::get(&winner, 1).await.is_err());
        assert!(Movies::get(&loser, 1).await.is_err());

        Movies::create(&winner, test_support::movie(1)).await.unwrap();
        winner.commit().await.unwrap();

        let err = Movies::create(&loser, test_support::movie(1)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)), "{err:?}");
        drop(loser);

        assert_eq!(list::<Movies>(&store).await.unwrap(), vec![test_support::movie(1)]);
    }
}
