use super::*;

/// Tests listing all of a guild's bindings.
///
/// Expected: Ok with both bindings and none from other guilds
#[tokio::test]
async fn lists_guild_bindings() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::PanelChannel)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = PanelChannelRepository::new(db);
    repo.set("g1", "eventpanel", "c1").await?;
    repo.set("g1", "eventannounce", "c2").await?;
    repo.set("g2", "eventpanel", "c3").await?;

    let mut bindings = repo.all_for_guild("g1").await?;
    bindings.sort_by(|a, b| a.panel_key.cmp(&b.panel_key));

    assert_eq!(bindings.len(), 2);
    assert_eq!(bindings[0].panel_key, "eventannounce");
    assert_eq!(bindings[0].channel_id, "c2");
    assert_eq!(bindings[1].panel_key, "eventpanel");
    assert_eq!(bindings[1].channel_id, "c1");

    Ok(())
}

/// Tests a guild with no bindings.
///
/// Expected: Ok with an empty list
#[tokio::test]
async fn empty_for_unconfigured_guild() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::PanelChannel)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = PanelChannelRepository::new(db);
    assert!(repo.all_for_guild("g1").await?.is_empty());

    Ok(())
}
