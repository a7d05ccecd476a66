#[allow(warnings, clippy::all)]
pub mod url {
    use sea_orm::entity::prelude::*;

    /// One long-URL-to-short-code mapping.
    ///
    /// `original_url` carries no unique index; the service's check-then-insert
    /// is the only dedupe, so concurrent first requests for the same URL can
    /// leave duplicate rows behind. All duplicates resolve to the same token
    /// since code derivation is deterministic.
    #[sea_orm::model]
    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "urls")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i64,
        pub original_url: String,
        pub short_code: i32,
    }

    impl ActiveModelBehavior for ActiveModel {}
}
