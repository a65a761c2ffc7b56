use anyhow::{bail, Result};
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ColumnTrait, Database, EntityTrait, QueryFilter, Set};
use tracing::{debug, info, trace};

use model::entities::user;

use crate::auth::hash_password;
use crate::handlers::users::normalize_email;

/// Create a superuser account. Staff and superuser flags are always set;
/// there is no way to produce a superuser without them.
pub async fn create_superuser(database_url: &str, email: &str, password: &str) -> Result<()> {
    trace!("Entering create_superuser function");

    let email = normalize_email(email);
    if email.is_empty() {
        bail!("Email must be set");
    }

    debug!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;
    Migrator::up(&db, None).await?;

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(email.clone()))
        .one(&db)
        .await?;
    if existing.is_some() {
        bail!("User with email '{}' already exists", email);
    }

    let password_hash = hash_password(password)?;

    let superuser = user::ActiveModel {
        email: Set(email.clone()),
        password_hash: Set(password_hash),
        is_active: Set(true),
        is_staff: Set(true),
        is_superuser: Set(true),
        date_joined: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&db)
    .await?;

    info!("Superuser created with ID: {}, email: {}", superuser.id, superuser.email);

    Ok(())
}
