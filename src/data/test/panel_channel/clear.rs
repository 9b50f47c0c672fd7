use super::*;

/// Tests clearing an existing binding.
///
/// Expected: Ok(true) and the binding is gone
#[tokio::test]
async fn clears_existing_binding() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::PanelChannel)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = PanelChannelRepository::new(db);
    repo.set("g1", "eventannounce", "c1").await?;

    assert!(repo.clear("g1", "eventannounce").await?);
    assert!(repo.get("g1", "eventannounce").await?.is_none());

    Ok(())
}

/// Tests clearing a binding that doesn't exist.
///
/// Expected: Ok(false)
#[tokio::test]
async fn returns_false_when_nothing_bound() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::PanelChannel)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = PanelChannelRepository::new(db);
    assert!(!repo.clear("g1", "eventannounce").await?);

    Ok(())
}
