use super::*;

/// Tests creating a new panel state row.
///
/// Expected: Ok with the row present and indexed columns mirrored from state
#[tokio::test]
async fn creates_new_row() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::EventPanelState)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let mut state = PanelState::new("g1", "c1", "m1");
    state.selected_event_key = Some(EventKey::Killstreak);

    let repo = EventPanelRepository::new(db);
    repo.save(&state).await?;

    let stored = entity::prelude::EventPanelState::find_by_id("m1".to_string())
        .one(db)
        .await?
        .unwrap();

    assert_eq!(stored.guild_id, "g1");
    assert_eq!(stored.panel_type, "staff");
    assert_eq!(stored.status, "setup");
    assert_eq!(stored.state["selectedEventKey"], "killstreak");

    Ok(())
}

/// Tests that saving an existing message id updates the row in place.
///
/// Expected: Ok with one row reflecting the latest state
#[tokio::test]
async fn updates_existing_row() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::EventPanelState)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = EventPanelRepository::new(db);

    let mut state = PanelState::new("g1", "c1", "m1");
    repo.save(&state).await?;

    state.status = PanelStatus::Running;
    state.settings.game_id = "game-9".to_string();
    repo.save(&state).await?;

    let count = entity::prelude::EventPanelState::find().count(db).await?;
    assert_eq!(count, 1);

    let stored = entity::prelude::EventPanelState::find_by_id("m1".to_string())
        .one(db)
        .await?
        .unwrap();
    assert_eq!(stored.status, "running");
    assert_eq!(stored.state["settings"]["gameId"], "game-9");

    Ok(())
}

/// Tests that a state still waiting on its Discord message is not persisted.
///
/// Expected: Ok with no rows written
#[tokio::test]
async fn skips_pending_message_id() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::EventPanelState)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let staff = PanelState::new("g1", "c1", "m1");
    let public = staff.clone_for_public("c2");

    let repo = EventPanelRepository::new(db);
    repo.save(&public).await?;

    let count = entity::prelude::EventPanelState::find().count(db).await?;
    assert_eq!(count, 0);

    Ok(())
}
