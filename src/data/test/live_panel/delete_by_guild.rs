use super::*;

/// Tests removing a guild's live panel record.
///
/// Expected: Ok(true) and the record is gone
#[tokio::test]
async fn deletes_existing_record() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::LivePanel)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = LivePanelRepository::new(db);
    repo.upsert(&record("g1", "game-1")).await?;

    assert!(repo.delete_by_guild("g1").await?);
    assert!(repo.get_by_guild("g1").await?.is_none());

    Ok(())
}

/// Tests deleting when no record exists.
///
/// Expected: Ok(false)
#[tokio::test]
async fn returns_false_when_absent() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::LivePanel)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = LivePanelRepository::new(db);
    assert!(!repo.delete_by_guild("g1").await?);

    Ok(())
}
