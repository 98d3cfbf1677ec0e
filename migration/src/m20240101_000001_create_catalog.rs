use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movies::Table)
                    .if_not_exists()
                    .col(big_integer(Movies::MovieId).primary_key())
                    .col(string(Movies::Title))
                    .col(string(Movies::Genres))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Links::Table)
                    .if_not_exists()
                    .col(pk_auto(Links::Id))
                    .col(big_integer(Links::MovieId))
                    .col(string(Links::ImdbId))
                    .col(string(Links::TmdbId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_links_movie")
                            .from(Links::Table, Links::MovieId)
                            .to(Movies::Table, Movies::MovieId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_links_movie_unique")
                    .table(Links::Table)
                    .col(Links::MovieId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Ratings::Table)
                    .if_not_exists()
                    .col(pk_auto(Ratings::Id))
                    .col(big_integer(Ratings::UserId))
                    .col(big_integer(Ratings::MovieId))
                    .col(double(Ratings::Rating))
                    .col(big_integer(Ratings::Timestamp))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ratings_movie")
                            .from(Ratings::Table, Ratings::MovieId)
                            .to(Movies::Table, Movies::MovieId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ratings_movie")
                    .table(Ratings::Table)
                    .col(Ratings::MovieId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tags::Table)
                    .if_not_exists()
                    .col(pk_auto(Tags::Id))
                    .col(big_integer(Tags::UserId))
                    .col(big_integer(Tags::MovieId))
                    .col(string(Tags::Tag))
                    .col(big_integer(Tags::Timestamp))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tags_movie")
                            .from(Tags::Table, Tags::MovieId)
                            .to(Movies::Table, Movies::MovieId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tags_movie")
                    .table(Tags::Table)
                    .col(Tags::MovieId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Tags::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Ratings::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Links::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movies::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movies {
    Table,
    #[sea_orm(iden = "movieId")]
    MovieId,
    Title,
    Genres,
}

#[derive(DeriveIden)]
enum Links {
    Table,
    Id,
    #[sea_orm(iden = "movieId")]
    MovieId,
    #[sea_orm(iden = "imdbId")]
    ImdbId,
    #[sea_orm(iden = "tmdbId")]
    TmdbId,
}

#[derive(DeriveIden)]
enum Ratings {
    Table,
    Id,
    #[sea_orm(iden = "userId")]
    UserId,
    #[sea_orm(iden = "movieId")]
    MovieId,
    Rating,
    Timestamp,
}

#[derive(DeriveIden)]
enum Tags {
    Table,
    Id,
    #[sea_orm(iden = "userId")]
    UserId,
    #[sea_orm(iden = "movieId")]
    MovieId,
    Tag,
    Timestamp,
}
