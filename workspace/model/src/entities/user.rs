use sea_orm::entity::prelude::*;

/// An employee account. The email address is the unique login identifier;
/// there is no separate username.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    /// Argon2id password hash
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Stored path of the uploaded avatar image.
    pub avatar: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    /// Inactive accounts are rejected by the permission gate.
    #[sea_orm(default_value = "true")]
    pub is_active: bool,
    #[sea_orm(default_value = "false")]
    pub is_staff: bool,
    #[sea_orm(default_value = "false")]
    pub is_superuser: bool,
    pub date_joined: DateTimeUtc,
    pub last_login: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
