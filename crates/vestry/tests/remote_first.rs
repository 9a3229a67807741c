//! Remote-first behaviour of the facade: which side answers, and how often
//! each side runs.

use serde_json::json;
use vestry::remote::{Method, Origin};
use vestry::remote::RemoteError;
use vestry::{CollectionName, OtpOutcome, VestryError};
use vestry_testkit::{init_tracing, record, TestFixture};

#[tokio::test]
async fn remote_list_is_used_as_is() -> anyhow::Result<()> {
    init_tracing();
    let fixture = TestFixture::new();
    fixture
        .transport
        .respond(200, json!([{"id": "news-remote", "title": "From the API"}]));

    let news = fixture.vestry.news().list().await?;

    assert_eq!(news.origin, Origin::Remote);
    assert_eq!(news.value.len(), 1);
    assert_eq!(news.value[0].id(), Some("news-remote"));
    // Local copy untouched.
    assert_eq!(fixture.store().collection(CollectionName::News)?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn remote_success_skips_local_write() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    fixture
        .transport
        .respond(201, json!({"id": "ann-1", "title": "Picnic"}));

    let created = fixture
        .vestry
        .announcements()
        .create(record(json!({"title": "Picnic"})))
        .await?;

    assert!(!created.is_degraded());
    assert_eq!(created.value.id(), Some("ann-1"));
    assert_eq!(
        fixture.store().collection(CollectionName::Announcements)?.len(),
        1
    );
    assert_eq!(fixture.transport.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn remote_delete_takes_no_local_backup() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    fixture.transport.respond(200, json!({"success": true}));

    let deleted = fixture.vestry.news().delete("news-welcome").await?;

    assert!(deleted.value);
    assert_eq!(deleted.origin, Origin::Remote);
    assert!(fixture.store().list_backups()?.is_empty());
    assert!(fixture
        .store()
        .get(CollectionName::News, "news-welcome")?
        .is_some());
    Ok(())
}

#[tokio::test]
async fn offline_create_falls_back_once() -> anyhow::Result<()> {
    let fixture = TestFixture::new();

    let created = fixture
        .vestry
        .departments()
        .create(record(json!({"name": "Music"})))
        .await?;

    assert!(created.is_degraded());
    let id = created.value.id().unwrap_or_default().to_string();
    assert!(id.starts_with("dept-"));
    assert_eq!(fixture.transport.call_count(), 1);

    let departments = fixture.store().collection(CollectionName::Departments)?;
    assert_eq!(departments.len(), 3);
    assert_eq!(departments[0].id(), Some(id.as_str()));
    Ok(())
}

#[tokio::test]
async fn server_error_degrades_with_reason() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    fixture
        .transport
        .respond(500, json!({"error": "database unavailable"}));

    let leaders = fixture.vestry.leaders().list().await?;

    match leaders.origin {
        Origin::Local { reason } => assert!(reason.contains("database unavailable")),
        Origin::Remote => panic!("expected a local answer"),
    }
    assert_eq!(leaders.value.len(), 2);
    Ok(())
}

#[tokio::test]
async fn hung_remote_times_out_into_fallback() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    fixture.transport.hang();

    let about = fixture.vestry.about().get().await?;

    assert!(about.is_degraded());
    assert_eq!(
        about.value.get_str("address"),
        Some("1 Chapel Lane")
    );
    Ok(())
}

#[tokio::test]
async fn requests_use_resource_endpoints() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    let vestry = &fixture.vestry;

    vestry.members().update_role("mem-admin", "editor").await?;
    vestry.donations().list().await?;
    vestry.home().get().await?;
    vestry.news().update("news-welcome", record(json!({"title": "Hi"}))).await?;

    let requests = fixture.transport.requests();
    let seen: Vec<(Method, &str)> = requests
        .iter()
        .map(|r| (r.method, r.path.as_str()))
        .collect();
    assert_eq!(
        seen,
        vec![
            (Method::Patch, "/members/mem-admin/role"),
            (Method::Get, "/donations"),
            (Method::Get, "/config/home"),
            (Method::Put, "/news/news-welcome"),
        ]
    );
    assert_eq!(requests[0].body, Some(json!({"role": "editor"})));
    Ok(())
}

#[tokio::test]
async fn role_and_status_changes_fall_back() -> anyhow::Result<()> {
    let fixture = TestFixture::new();

    let admin = fixture.vestry.members().update_role("mem-admin", "editor").await?;
    assert_eq!(admin.value.get_str("role"), Some("editor"));

    fixture
        .vestry
        .donations()
        .create(record(json!({"id": "don-1", "amount": 50, "status": "pending"})))
        .await?;
    let donation = fixture
        .vestry
        .donations()
        .update_status("don-1", "received")
        .await?;
    assert_eq!(donation.value.get_str("status"), Some("received"));
    assert_eq!(donation.value.get("amount"), Some(&json!(50)));
    Ok(())
}

#[tokio::test]
async fn fallback_failure_is_an_error() {
    let fixture = TestFixture::new();

    let err = fixture
        .vestry
        .donations()
        .update_status("don-missing", "received")
        .await
        .unwrap_err();

    assert!(matches!(
        err.store_error(),
        Some(vestry::store::StoreError::NotFound { .. })
    ));
}

#[tokio::test]
async fn singleton_handles_are_separate() {
    let fixture = TestFixture::new();

    assert!(matches!(
        fixture.vestry.resource(CollectionName::Home),
        Err(VestryError::Unsupported { .. })
    ));
    assert!(matches!(
        fixture.vestry.document(CollectionName::News),
        Err(VestryError::Unsupported { .. })
    ));
    assert!(fixture.vestry.document(CollectionName::About).is_ok());
    assert_eq!(fixture.transport.call_count(), 0);
}

#[tokio::test]
async fn document_update_merges() -> anyhow::Result<()> {
    let fixture = TestFixture::new();

    let home = fixture
        .vestry
        .home()
        .update(record(json!({"heroTitle": "Harvest Sunday"})))
        .await?;

    assert_eq!(home.value.get_str("heroTitle"), Some("Harvest Sunday"));
    assert_eq!(
        home.value.get_str("heroSubtitle"),
        Some("A community of faith, hope and service")
    );
    let logs = fixture.store().logs()?;
    assert_eq!(logs[0].action, "Updated home configuration");
    Ok(())
}

#[tokio::test]
async fn empty_create_reply_echoes_sent_record() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    fixture.transport.respond(201, serde_json::Value::Null);

    let created = fixture
        .vestry
        .announcements()
        .create(record(json!({"title": "Picnic"})))
        .await?;

    assert!(!created.is_degraded());
    assert_eq!(created.value.get_str("title"), Some("Picnic"));
    // The server took it; no local copy on top.
    assert_eq!(
        fixture.store().collection(CollectionName::Announcements)?.len(),
        1
    );
    Ok(())
}

#[tokio::test]
async fn acknowledged_backup_takes_no_local_copy() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    fixture
        .transport
        .respond(201, json!({"message": "Backup created"}));

    let backup = fixture.vestry.create_backup("nightly").await?;

    assert_eq!(backup.origin, Origin::Remote);
    assert!(backup.value.is_none());
    assert!(fixture.store().list_backups()?.is_empty());
    assert_eq!(fixture.transport.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn undecodable_list_is_an_error() {
    let fixture = TestFixture::new();
    fixture.transport.respond(200, json!({"message": "maintenance"}));

    let err = fixture.vestry.news().list().await.unwrap_err();

    assert!(matches!(err, VestryError::Remote(RemoteError::Decode(_))));
}

#[tokio::test]
async fn rejected_reset_code_is_not_verified() -> anyhow::Result<()> {
    let fixture = TestFixture::new();
    fixture
        .transport
        .respond(200, json!({"success": false, "message": "Invalid code"}));
    fixture.transport.respond(200, json!({"message": "ok"}));

    let rejected = fixture
        .vestry
        .verify_reset_code("admin@vestry.local", "123456")
        .await?;
    assert_eq!(rejected.value, OtpOutcome::InvalidCode);

    let vague = fixture
        .vestry
        .verify_reset_code("admin@vestry.local", "123456")
        .await?;
    assert_eq!(vague.value, OtpOutcome::InvalidCode);
    Ok(())
}
