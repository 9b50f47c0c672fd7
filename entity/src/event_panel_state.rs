use sea_orm::entity::prelude::*;

/// Persisted snapshot of an event panel message.
///
/// One row per panel message. The structured panel fields live in `state`
/// as JSON so the panel layout can evolve without schema churn; the indexed
/// columns exist for lookups and stale-panel sweeps.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "event_panel_state")]
pub struct Model {
    /// Discord message id of the panel message.
    #[sea_orm(primary_key, auto_increment = false)]
    pub message_id: String,
    pub guild_id: String,
    pub channel_id: String,
    /// "staff" or "public".
    pub panel_type: String,
    /// "setup", "running" or "ended".
    pub status: String,
    pub state: Json,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
