//! Server orchestration: creation, start/close and membership events.

mod common;

use anyhow::Result;
use common::{Event, Harness, RecordingNotifier, params};
use rally_domain::{Admission, DomainError, Driver, Removal, SessionId, SessionOverrides, UserId};

fn position(events: &[Event], wanted: &Event) -> usize {
    events
        .iter()
        .position(|e| e == wanted)
        .unwrap_or_else(|| panic!("missing event {wanted:?}"))
}

#[tokio::test]
async fn test_create_session_admits_owner_and_links_both_records() -> Result<()> {
    let h = Harness::with_defaults(params(4, false));
    let owner: UserId = "owner".into();

    let session = h.server.create_session(&owner, None).await?;
    let id = session.id();

    assert_eq!(session.owner_id(), Some(owner.clone()));
    assert_eq!(session.confirmed(), vec![owner.clone()]);

    let user = h.server.resolver().resolve_user(&owner)?;
    assert_eq!(user.created_session_id(), Some(id.clone()));
    assert_eq!(user.joined_sessions(), vec![id.clone()]);

    let events = h.notifier.events();
    assert!(matches!(&events[0], Event::Posted { session, .. } if *session == id));
    assert!(events.contains(&Event::Reacted {
        session: id.clone(),
        emoji: "✅".to_string()
    }));
    Ok(())
}

#[tokio::test]
async fn test_join_during_create_survives_owner_link() -> Result<()> {
    let h = Harness::build(Driver::in_memory(), RecordingNotifier::yielding(), params(4, false));
    let alice: UserId = "alice".into();
    let bobs = h.server.create_session(&"bob".into(), None).await?.id();
    assert_eq!(bobs, SessionId::from("msg-1"));

    // Alice joins Bob's session while her own announcement is being posted.
    let (created, joined) = tokio::join!(
        h.server.create_session(&alice, None),
        h.server.join_session(&bobs, &alice),
    );
    let own = created?.id();
    assert_eq!(joined?, Admission::Confirmed);
    assert_eq!(own, SessionId::from("msg-2"));

    let user = h.server.resolver().resolve_user(&alice)?;
    let joined = user.joined_sessions();
    assert!(joined.contains(&bobs), "joined: {joined:?}");
    assert!(joined.contains(&own), "joined: {joined:?}");
    assert_eq!(user.created_session_id(), Some(own));
    Ok(())
}

#[tokio::test]
async fn test_second_create_closes_previous_first() -> Result<()> {
    let h = Harness::with_defaults(params(4, false));
    let owner: UserId = "owner".into();

    let first = h.server.create_session(&owner, None).await?;
    first.add_player(&"A".into()).await?;
    let first_id = first.id();

    let second = h.server.create_session(&owner, None).await?;
    let second_id = second.id();
    assert_ne!(first_id, second_id);

    let events = h.notifier.events();
    let cancelled = position(
        &events,
        &Event::Direct {
            user: "A".into(),
            text: "**Raid** has been cancelled.".to_string(),
        },
    );
    let deleted = position(
        &events,
        &Event::Deleted {
            session: first_id.clone(),
        },
    );
    let posted = events
        .iter()
        .position(|e| matches!(e, Event::Posted { session, .. } if *session == second_id))
        .expect("second announcement posted");
    assert!(cancelled < deleted);
    assert!(deleted < posted);

    let driver = h.registry.driver();
    assert!(driver.get_session_view(&"guild".into(), &first_id).is_err());
    assert!(driver.get_session_view(&"guild".into(), &second_id).is_ok());

    let user = h.server.resolver().resolve_user(&owner)?;
    assert_eq!(user.created_session_id(), Some(second_id.clone()));
    assert_eq!(user.joined_sessions(), vec![second_id]);
    assert!(h.server.resolver().resolve_user(&"A".into())?.is_idle());
    Ok(())
}

#[tokio::test]
async fn test_create_applies_template_overrides() -> Result<()> {
    let h = Harness::with_defaults(params(4, false));
    let overrides = SessionOverrides::new()
        .with_name("Scrim")
        .with_capacity(2)
        .with_fire_when_full(true);

    let session = h.server.create_session(&"owner".into(), Some(&overrides)).await?;
    assert_eq!(session.name(), "Scrim");
    assert_eq!(session.capacity(), 2);

    h.server.join_session(&session.id(), &"A".into()).await?;
    assert!(session.is_closed());
    assert!(
        h.server
            .resolver()
            .resolve_user(&"owner".into())?
            .created_session_id()
            .is_none()
    );
    Ok(())
}

#[tokio::test]
async fn test_create_rejects_zero_capacity_before_posting() -> Result<()> {
    let h = Harness::new();
    let overrides = SessionOverrides::new().with_capacity(0);

    let err = h
        .server
        .create_session(&"owner".into(), Some(&overrides))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidCapacity { requested: 0, .. }));
    assert!(h.notifier.events().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_start_session_owned_by_user() -> Result<()> {
    let h = Harness::with_defaults(params(4, false));
    let owner: UserId = "owner".into();
    let session = h.server.create_session(&owner, None).await?;
    h.server.join_session(&session.id(), &"A".into()).await?;

    assert!(h.server.start_session_owned_by_user(&owner).await?);

    assert_eq!(
        h.notifier.directs_to("A").last().map(String::as_str),
        Some("**Raid** has started! https://example.test/raid")
    );
    assert!(
        h.server
            .resolver()
            .resolve_user(&owner)?
            .created_session_id()
            .is_none()
    );
    assert!(matches!(
        h.server.start_session_owned_by_user(&owner).await,
        Err(DomainError::NoActiveSession(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_close_session_owned_by_user_deletes_announcement() -> Result<()> {
    let h = Harness::with_defaults(params(4, false));
    let owner: UserId = "owner".into();
    let session = h.server.create_session(&owner, None).await?;

    assert!(h.server.close_session_owned_by_user(&owner).await?);
    assert!(h.notifier.events().contains(&Event::Deleted {
        session: session.id()
    }));
    Ok(())
}

#[tokio::test]
async fn test_no_active_session() -> Result<()> {
    let h = Harness::new();
    let user: UserId = "nobody".into();

    assert!(matches!(
        h.server.start_session_owned_by_user(&user).await,
        Err(DomainError::NoActiveSession(_))
    ));
    assert!(matches!(
        h.server.set_session_capacity(&user, 3).await,
        Err(DomainError::NoActiveSession(_))
    ));
    assert!(matches!(
        h.server.broadcast_from_owner(&user, "hi", true).await,
        Err(DomainError::NoActiveSession(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_ownership_mismatch_is_reported() -> Result<()> {
    let h = Harness::with_defaults(params(4, false));
    let system = h.server.create_system_session(None).await?;

    let user = h.server.resolver().resolve_user(&"intruder".into())?;
    user.set_created_session(&system.id())?;

    let err = h
        .server
        .start_session_owned_by_user(&"intruder".into())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::OwnershipMismatch { .. }));
    assert!(!system.is_closed());
    Ok(())
}

#[tokio::test]
async fn test_id_addressed_start_and_close() -> Result<()> {
    let h = Harness::with_defaults(params(4, false));
    let a = h.server.create_system_session(None).await?;
    let b = h.server.create_session(&"owner".into(), None).await?;

    assert!(h.server.start_session(&a.id()).await?);
    assert!(h.server.close_session(&b.id()).await?);

    assert!(matches!(
        h.server.start_session(&a.id()).await,
        Err(DomainError::SessionNotFound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_join_and_leave_events() -> Result<()> {
    let h = Harness::with_defaults(params(2, false));
    let session = h.server.create_session(&"owner".into(), None).await?;
    let id = session.id();

    assert_eq!(h.server.join_session(&id, &"A".into()).await?, Admission::Confirmed);
    assert_eq!(
        h.server.join_session(&id, &"B".into()).await?,
        Admission::Waitlisted { position: 1 }
    );
    assert_eq!(h.server.leave_session(&id, &"A".into()).await?, Removal::Confirmed);
    assert_eq!(session.confirmed(), vec![UserId::from("owner"), UserId::from("B")]);

    assert!(matches!(
        h.server.leave_session(&id, &"owner".into()).await,
        Err(DomainError::OwnerCannotLeave(_))
    ));
    assert!(matches!(
        h.server.join_session(&"unknown".into(), &"A".into()).await,
        Err(DomainError::SessionNotFound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_owner_capacity_and_broadcast() -> Result<()> {
    let h = Harness::with_defaults(params(2, false));
    let owner: UserId = "owner".into();
    let session = h.server.create_session(&owner, None).await?;
    h.server.join_session(&session.id(), &"A".into()).await?;
    h.server.join_session(&session.id(), &"B".into()).await?;

    let promoted = h.server.set_session_capacity(&owner, 3).await?;
    assert_eq!(promoted, vec![UserId::from("B")]);

    assert_eq!(h.server.broadcast_from_owner(&owner, "go", false).await?, 2);
    Ok(())
}

#[tokio::test]
async fn test_best_effort_lookups() -> Result<()> {
    let h = Harness::new();
    let session = h.server.create_session(&"owner".into(), None).await?;

    let found = h
        .server
        .get_session_from_announcement_message(&session.id())
        .await?;
    assert_eq!(found.map(|s| s.id()), Some(session.id()));
    assert!(
        h.server
            .get_session_from_announcement_message(&"nope".into())
            .await?
            .is_none()
    );

    let owner = h.server.resolver().resolve_user(&"owner".into())?;
    assert!(h.server.get_session_from_user(&owner).await?.is_some());
    let stranger = h.server.resolver().resolve_user(&"stranger".into())?;
    assert!(h.server.get_session_from_user(&stranger).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_servers_are_isolated() -> Result<()> {
    let h = Harness::with_notifier(RecordingNotifier::new());
    let other = h.registry.server(&"other-guild".into());

    let session = h.server.create_session(&"owner".into(), None).await?;
    assert!(
        other
            .get_session_from_announcement_message(&session.id())
            .await?
            .is_none()
    );
    assert_eq!(h.registry.len(), 2);
    Ok(())
}
