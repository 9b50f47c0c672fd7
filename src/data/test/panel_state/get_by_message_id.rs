use super::*;

/// Tests loading a saved panel state back by message id.
///
/// Expected: Ok(Some) with the state round-tripped intact
#[tokio::test]
async fn round_trips_saved_state() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::EventPanelState)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let mut state = PanelState::new("g1", "c1", "m1");
    state.selected_event_key = Some(EventKey::Deathmatch);
    state.settings.target_number = Some(25);
    state.settings.map = "castle".to_string();

    let repo = EventPanelRepository::new(db);
    repo.save(&state).await?;

    let loaded = repo.get_by_message_id("m1").await?.unwrap();
    assert_eq!(loaded, state);

    Ok(())
}

/// Tests that a missing message id loads as None.
///
/// Expected: Ok(None)
#[tokio::test]
async fn returns_none_for_unknown_message() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::EventPanelState)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = EventPanelRepository::new(db);
    assert!(repo.get_by_message_id("nope").await?.is_none());

    Ok(())
}

/// Tests that loading hydrates junk region/map values back to defaults.
///
/// Expected: Ok(Some) with region and map clamped
#[tokio::test]
async fn hydrates_unknown_region_and_map() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::EventPanelState)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    factory::panel_state::PanelStateFactory::new(db)
        .message_id("m1")
        .guild_id("g1")
        .state(serde_json::json!({
            "guildId": "g1",
            "channelId": "c1",
            "messageId": "m1",
            "panelType": "staff",
            "status": "setup",
            "settings": { "region": "australia", "map": "volcano" },
            "createdAt": "2026-08-01T00:00:00Z",
            "updatedAt": "2026-08-01T00:00:00Z"
        }))
        .build()
        .await?;

    let repo = EventPanelRepository::new(db);
    let loaded = repo.get_by_message_id("m1").await?.unwrap();

    assert_eq!(loaded.settings.region, "uscentral");
    assert_eq!(loaded.settings.map, "cluckgrounds");

    Ok(())
}
