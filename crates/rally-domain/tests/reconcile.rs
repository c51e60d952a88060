//! Startup reconciliation against the notifier and stored users.

mod common;

use anyhow::Result;
use common::{Harness, params};
use rally_domain::{ReconcileReport, SessionId, UserId};
use rally_store::{StoreBackend, UserRecord};

#[tokio::test]
async fn test_clean_state_changes_nothing() -> Result<()> {
    let h = Harness::with_defaults(params(4, false));
    let session = h.server.create_session(&"owner".into(), None).await?;
    h.server.join_session(&session.id(), &"A".into()).await?;

    let report = h.registry.reconcile().await?;
    assert_eq!(
        report,
        ReconcileReport {
            sessions_checked: 1,
            ..Default::default()
        }
    );
    assert_eq!(session.confirmed().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_deleted_announcement_drops_session_and_references() -> Result<()> {
    let h = Harness::with_defaults(params(1, false));
    let gone = h.server.create_session(&"owner".into(), None).await?;
    h.server.join_session(&gone.id(), &"A".into()).await?;
    let kept = h.server.create_session(&"host".into(), None).await?;
    h.server.join_session(&kept.id(), &"B".into()).await?;

    h.notifier.forget_announcement(&gone.id());
    let report = h.registry.reconcile().await?;

    assert_eq!(report.sessions_checked, 2);
    assert_eq!(report.sessions_dropped, 1);
    // owner and A pointed at the dropped session
    assert_eq!(report.users_repaired, 2);
    assert_eq!(report.users_deleted, 2);

    let driver = h.registry.driver();
    let guild = "guild".into();
    assert!(driver.get_session_view(&guild, &gone.id()).is_err());
    assert!(driver.get_session_view(&guild, &kept.id()).is_ok());
    assert!(driver.backend().load_user(&guild, &"owner".into())?.is_none());
    assert!(driver.backend().load_user(&guild, &"A".into())?.is_none());

    let b = driver.backend().load_user(&guild, &"B".into())?;
    assert_eq!(
        b.map(|u| u.waitlisted_session_ids.into_iter().collect::<Vec<_>>()),
        Some(vec![kept.id()])
    );
    Ok(())
}

#[tokio::test]
async fn test_dangling_references_are_scrubbed() -> Result<()> {
    let h = Harness::with_defaults(params(4, false));
    let session = h.server.create_session(&"owner".into(), None).await?;

    let mut stale = UserRecord::new("guild".into(), "stale".into());
    stale.joined_session_ids.insert(session.id());
    stale.joined_session_ids.insert(SessionId::from("long-gone"));
    let driver = h.registry.driver();
    driver.backend().save_user(&stale)?;
    driver
        .backend()
        .save_user(&UserRecord::new("guild".into(), "idle".into()))?;

    let report = h.registry.reconcile().await?;
    assert_eq!(report.sessions_dropped, 0);
    assert_eq!(report.users_repaired, 1);
    assert_eq!(report.users_deleted, 1);

    let repaired = h.server.resolver().resolve_user(&UserId::from("stale"))?;
    assert_eq!(repaired.joined_sessions(), vec![session.id()]);
    Ok(())
}

#[tokio::test]
async fn test_session_left_closed_is_dropped() -> Result<()> {
    let h = Harness::with_defaults(params(4, false));
    let session = h.server.create_system_session(None).await?;
    h.server.join_session(&session.id(), &"A".into()).await?;

    // Simulate a crash between marking the record closed and deleting it.
    session.view().mark_closed()?;

    let report = h.registry.reconcile().await?;
    assert_eq!(report.sessions_dropped, 1);
    assert_eq!(report.users_deleted, 1);
    assert!(
        h.registry
            .driver()
            .get_session_view(&"guild".into(), &session.id())
            .is_err()
    );
    Ok(())
}
