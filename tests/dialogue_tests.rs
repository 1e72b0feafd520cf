use anyhow::Result;
use std::sync::Arc;
use teloxide::types::ChatId;

use category_bot::dialogue::{ScratchCache, SessionState, SessionStore};

/// Session states of different chats never interfere
#[tokio::test]
async fn test_sessions_are_per_chat() -> Result<()> {
    let sessions = SessionStore::new();

    sessions
        .set(ChatId(1), SessionState::AwaitingRootCategoryName)
        .await?;
    sessions
        .set(ChatId(2), SessionState::AwaitingChildCategoryName)
        .await?;

    assert_eq!(sessions.get(ChatId(1)).await?, SessionState::AwaitingRootCategoryName);
    assert_eq!(sessions.get(ChatId(2)).await?, SessionState::AwaitingChildCategoryName);
    assert_eq!(sessions.get(ChatId(3)).await?, SessionState::Idle);

    // Overwriting replaces the previous state
    sessions
        .set(ChatId(1), SessionState::AwaitingChildCategoryName)
        .await?;
    assert_eq!(sessions.get(ChatId(1)).await?, SessionState::AwaitingChildCategoryName);

    sessions.clear(ChatId(2)).await;
    assert_eq!(sessions.get(ChatId(2)).await?, SessionState::Idle);

    Ok(())
}

/// Clones share the same underlying storage
#[tokio::test]
async fn test_session_store_clones_share_state() -> Result<()> {
    let sessions = SessionStore::new();
    let other = sessions.clone();

    sessions
        .set(ChatId(10), SessionState::AwaitingRootCategoryName)
        .await?;
    assert_eq!(other.get(ChatId(10)).await?, SessionState::AwaitingRootCategoryName);

    Ok(())
}

/// Concurrent writers on distinct chats all land
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_access() -> Result<()> {
    let sessions = SessionStore::new();
    let scratch = Arc::new(ScratchCache::new());

    let mut handles = Vec::new();
    for id in 0..64i64 {
        let sessions = sessions.clone();
        let scratch = Arc::clone(&scratch);
        handles.push(tokio::spawn(async move {
            scratch.put(ChatId(id), format!("parent-{id}"));
            sessions
                .set(ChatId(id), SessionState::AwaitingChildCategoryName)
                .await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    for id in 0..64i64 {
        assert_eq!(scratch.get(ChatId(id)), Some(format!("parent-{id}")));
        assert_eq!(
            sessions.get(ChatId(id)).await?,
            SessionState::AwaitingChildCategoryName
        );
    }

    Ok(())
}

/// Session states survive a serde round trip, as teloxide storages require
#[test]
fn test_session_state_is_serializable() {
    fn assert_serde<T: serde::Serialize + for<'de> serde::Deserialize<'de>>() {}
    assert_serde::<SessionState>();
}

#[test]
fn test_scratch_overwrite() {
    let scratch = ScratchCache::new();
    scratch.put(ChatId(1), "Drinks");
    scratch.put(ChatId(1), "Snacks");
    assert_eq!(scratch.get(ChatId(1)).as_deref(), Some("Snacks"));
}
