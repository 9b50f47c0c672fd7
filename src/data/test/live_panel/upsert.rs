use super::*;

/// Tests recording a guild's live panel.
///
/// Expected: Ok with the record readable back
#[tokio::test]
async fn creates_record() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::LivePanel)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = LivePanelRepository::new(db);
    repo.upsert(&record("g1", "game-1")).await?;

    let stored = repo.get_by_guild("g1").await?.unwrap();
    assert_eq!(stored.game_id, "game-1");
    assert_eq!(stored.event_key, "killstreak");

    Ok(())
}

/// Tests that a guild only ever holds one live panel record.
///
/// Expected: Ok with the newer record replacing the older one
#[tokio::test]
async fn replaces_previous_record() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::LivePanel)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = LivePanelRepository::new(db);
    repo.upsert(&record("g1", "game-1")).await?;

    let mut next = record("g1", "game-2");
    next.event_key = "deathmatch".to_string();
    next.time_limit_seconds = Some(600);
    repo.upsert(&next).await?;

    let count = entity::prelude::LivePanel::find().count(db).await?;
    assert_eq!(count, 1);

    let stored = repo.get_by_guild("g1").await?.unwrap();
    assert_eq!(stored.game_id, "game-2");
    assert_eq!(stored.time_limit_seconds, Some(600));

    Ok(())
}

/// Tests that the factory row loads through the repository.
///
/// Expected: Ok(Some) for the factory's guild
#[tokio::test]
async fn loads_factory_row() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::LivePanel)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let row = factory::create_live_panel(db).await?;

    let repo = LivePanelRepository::new(db);
    let stored = repo.get_by_guild(&row.guild_id).await?.unwrap();
    assert_eq!(stored.message_id, row.message_id);

    Ok(())
}
