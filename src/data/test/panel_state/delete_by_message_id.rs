use super::*;

/// Tests deleting an existing panel state row.
///
/// Expected: Ok(true) and the row is gone
#[tokio::test]
async fn deletes_existing_row() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::EventPanelState)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = EventPanelRepository::new(db);
    repo.save(&PanelState::new("g1", "c1", "m1")).await?;

    assert!(repo.delete_by_message_id("m1").await?);
    assert!(repo.get_by_message_id("m1").await?.is_none());

    Ok(())
}

/// Tests deleting a message id that has no row.
///
/// Expected: Ok(false)
#[tokio::test]
async fn returns_false_for_unknown_row() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::EventPanelState)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = EventPanelRepository::new(db);
    assert!(!repo.delete_by_message_id("nope").await?);

    Ok(())
}
