use super::*;

/// Tests listing live panel records across guilds.
///
/// Expected: Ok with one record per guild
#[tokio::test]
async fn lists_all_guilds() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_table(entity::prelude::LivePanel)
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = LivePanelRepository::new(db);
    repo.upsert(&record("g1", "game-1")).await?;
    repo.upsert(&record("g2", "game-2")).await?;

    let mut all = repo.all().await?;
    all.sort_by(|a, b| a.guild_id.cmp(&b.guild_id));
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].guild_id, "g1");
    assert_eq!(all[1].game_id, "game-2");

    Ok(())
}
