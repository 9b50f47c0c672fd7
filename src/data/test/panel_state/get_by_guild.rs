use super::*;

/// Tests that guild scans only return that guild's states.
///
/// Expected: Ok with two states for the queried guild
#[tokio::test]
async fn scopes_to_guild() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::EventPanelState)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = EventPanelRepository::new(db);
    repo.save(&PanelState::new("g1", "c1", "m1")).await?;
    repo.save(&PanelState::new("g1", "c1", "m2")).await?;
    repo.save(&PanelState::new("g2", "c9", "m3")).await?;

    let states = repo.get_by_guild("g1").await?;
    assert_eq!(states.len(), 2);
    assert!(states.iter().all(|s| s.guild_id == "g1"));

    Ok(())
}

/// Tests that undecodable JSON rows are skipped instead of failing the scan.
///
/// Expected: Ok with only the valid state returned
#[tokio::test]
async fn skips_undecodable_rows() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::EventPanelState)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    factory::panel_state::PanelStateFactory::new(db)
        .message_id("junk")
        .guild_id("g1")
        .state(serde_json::json!({ "not": "a panel state" }))
        .build()
        .await?;

    let repo = EventPanelRepository::new(db);
    repo.save(&PanelState::new("g1", "c1", "m1")).await?;

    let states = repo.get_by_guild("g1").await?;
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].message_id, "m1");

    Ok(())
}

/// Tests that public running panels survive the round trip with their type
/// and status intact, which the active-event scan depends on.
///
/// Expected: Ok with panel_type public and status running
#[tokio::test]
async fn preserves_public_running_markers() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::EventPanelState)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let mut staff = PanelState::new("g1", "c1", "m1");
    staff.selected_event_key = Some(EventKey::Killstreak);
    let mut public = staff.clone_for_public("c2");
    public.message_id = "m2".to_string();

    let repo = EventPanelRepository::new(db);
    repo.save(&public).await?;

    let states = repo.get_by_guild("g1").await?;
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].panel_type, PanelType::Public);
    assert_eq!(states[0].status, PanelStatus::Running);

    Ok(())
}
