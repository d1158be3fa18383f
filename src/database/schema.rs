//! Table bootstrap derived from the entity definitions.

use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Schema};

use super::models::{comments, newsletter_subscribers, posts, sessions, users};

/// Creates every table and index that does not exist yet.
///
/// Order matters: referenced tables first.
pub async fn create_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    create_entity(db, users::Entity).await?;
    create_entity(db, sessions::Entity).await?;
    create_entity(db, posts::Entity).await?;
    create_entity(db, comments::Entity).await?;
    create_entity(db, newsletter_subscribers::Entity).await?;
    Ok(())
}

async fn create_entity<C, E>(db: &C, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(backend.build(&table)).await?;

    for mut index in schema.create_index_from_entity(entity) {
        index.if_not_exists();
        db.execute(backend.build(&index)).await?;
    }

    log::info!("Ensured table {}", entity.table_name());
    Ok(())
}
