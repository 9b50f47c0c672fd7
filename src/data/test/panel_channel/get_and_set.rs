use super::*;

/// Tests binding a panel to a channel and reading it back.
///
/// Expected: Ok(Some) with the configured channel id
#[tokio::test]
async fn set_then_get() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::PanelChannel)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = PanelChannelRepository::new(db);
    repo.set("g1", "eventannounce", "c100").await?;

    assert_eq!(
        repo.get("g1", "eventannounce").await?.as_deref(),
        Some("c100")
    );
    assert!(repo.get("g1", "eventpanel").await?.is_none());
    assert!(repo.get("g2", "eventannounce").await?.is_none());

    Ok(())
}

/// Tests that rebinding replaces the previous channel instead of adding a row.
///
/// Expected: Ok with one row holding the new channel
#[tokio::test]
async fn set_replaces_existing_binding() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::PanelChannel)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = PanelChannelRepository::new(db);
    repo.set("g1", "eventpanel", "c1").await?;
    repo.set("g1", "eventpanel", "c2").await?;

    assert_eq!(repo.get("g1", "eventpanel").await?.as_deref(), Some("c2"));

    let count = entity::prelude::PanelChannel::find().count(db).await?;
    assert_eq!(count, 1);

    Ok(())
}

/// Tests that the same panel key binds independently per guild.
///
/// Expected: Ok with each guild seeing its own channel
#[tokio::test]
async fn bindings_are_per_guild() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::PanelChannel)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = PanelChannelRepository::new(db);
    repo.set("g1", "adminpanel", "c1").await?;
    repo.set("g2", "adminpanel", "c2").await?;

    assert_eq!(repo.get("g1", "adminpanel").await?.as_deref(), Some("c1"));
    assert_eq!(repo.get("g2", "adminpanel").await?.as_deref(), Some("c2"));

    Ok(())
}
