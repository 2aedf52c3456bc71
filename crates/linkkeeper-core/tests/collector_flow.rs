use linkkeeper_core::collector::{LinkCollector, ReviewStart, ReviewSummary, VerdictOutcome};
use linkkeeper_core::storage::{DocumentStorage, LocalFileStorage};
use linkkeeper_core::store::{LinkStore, ReviewItem};
use linkkeeper_core::Platform;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

async fn open_at(path: &Path) -> Result<LinkCollector, Box<dyn std::error::Error>> {
    let storage: Arc<dyn DocumentStorage> = Arc::new(LocalFileStorage::new(path));
    Ok(LinkCollector::open(storage, None).await?)
}

fn read_store(path: &Path) -> Result<LinkStore, Box<dyn std::error::Error>> {
    let raw = std::fs::read(path)?;
    Ok(LinkStore::decode(Some(&raw)).0)
}

#[tokio::test]
async fn same_message_spellings_collapse_to_one_link() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("saved_links.json");
    let collector = open_at(&path).await?;

    let report = collector
        .submit_text(1, "check https://t.me/group1/ and https://t.me/group1")
        .await?;

    assert_eq!(report.added.telegram, vec!["https://t.me/group1"]);
    assert_eq!(report.duplicates, 1);
    assert_eq!(read_store(&path)?.links.telegram, vec!["https://t.me/group1"]);
    Ok(())
}

#[tokio::test]
async fn resubmitting_is_all_duplicates() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("saved_links.json");
    let collector = open_at(&path).await?;
    let text = "https://t.me/a https://chat.whatsapp.com/B https://t.me/c";

    let first = collector.submit_text(1, text).await?;
    assert_eq!(first.added.total(), 3);

    let second = collector.submit_text(2, text).await?;
    assert!(!second.has_new());
    assert_eq!(second.duplicates, second.candidates);
    assert_eq!(second.duplicates, 3);
    Ok(())
}

#[tokio::test]
async fn store_survives_restart() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("saved_links.json");

    {
        let collector = open_at(&path).await?;
        collector
            .submit_text(1, "https://chat.whatsapp.com/Inv https://t.me/x")
            .await?;
    }

    let reopened = open_at(&path).await?;
    let links = reopened.stored_links().await;
    assert_eq!(links.telegram, vec!["https://t.me/x"]);
    assert_eq!(links.whatsapp, vec!["https://chat.whatsapp.com/Inv"]);
    Ok(())
}

#[tokio::test]
async fn legacy_document_is_upgraded_on_disk() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("saved_links.json");
    std::fs::write(
        &path,
        r#"{"t.me": ["https://t.me/old/"], "chat.whatsapp": ["https://chat.whatsapp.com/W"]}"#,
    )?;

    let collector = open_at(&path).await?;
    assert_eq!(collector.stored_links().await.telegram, vec!["https://t.me/old"]);

    let on_disk: serde_json::Value = serde_json::from_slice(&std::fs::read(&path)?)?;
    assert!(on_disk.get("links").is_some());
    assert!(on_disk.get("checked").is_some());
    assert!(on_disk.get("deleted").is_some());
    assert!(on_disk.get("t.me").is_none());
    Ok(())
}

#[tokio::test]
async fn malformed_document_starts_empty() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("saved_links.json");
    std::fs::write(&path, "this is not json")?;

    let collector = open_at(&path).await?;
    assert!(collector.stored_links().await.is_empty());

    collector.submit_text(1, "https://t.me/fresh").await?;
    assert_eq!(read_store(&path)?.links.telegram, vec!["https://t.me/fresh"]);
    Ok(())
}

#[tokio::test]
async fn review_removes_exactly_the_broken_links() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("saved_links.json");
    let collector = open_at(&path).await?;
    collector
        .submit_text(
            1,
            "https://t.me/g0 https://t.me/g1 https://t.me/g2 https://t.me/g3 https://t.me/g4",
        )
        .await?;

    let ReviewStart::Started { prompt, restarted } = collector.begin_review(1).await else {
        panic!("review should start");
    };
    assert!(!restarted);
    assert_eq!(prompt.position, 1);
    assert_eq!(prompt.total, 5);

    let verdicts = ["yes", "no", "yes", "no", "yes"];
    let mut outcome = None;
    for (i, verdict) in verdicts.iter().enumerate() {
        let shown = collector.current_prompt(1).await.expect("pending link");
        assert_eq!(
            shown.item,
            ReviewItem::new(Platform::Telegram, format!("https://t.me/g{i}"))
        );
        outcome = Some(collector.receive_verdict(1, verdict).await?);
    }

    assert_eq!(
        outcome,
        Some(VerdictOutcome::Completed(ReviewSummary {
            reviewed: 5,
            removed: 2
        }))
    );
    assert!(!collector.is_reviewing(1).await);

    let store = read_store(&path)?;
    assert_eq!(
        store.links.telegram,
        vec!["https://t.me/g0", "https://t.me/g2", "https://t.me/g4"]
    );
    assert!(store.deleted.contains(Platform::Telegram, "https://t.me/g1"));
    assert!(store.deleted.contains(Platform::Telegram, "https://t.me/g3"));
    assert_eq!(store.checked.telegram.len(), 3);

    // Deleted links are never re-added; checked links are not reviewed again
    let again = collector.submit_text(1, "https://t.me/g1").await?;
    assert!(!again.has_new());
    assert_eq!(collector.begin_review(1).await, ReviewStart::NothingToReview);
    Ok(())
}

#[tokio::test]
async fn unrecognized_reply_keeps_the_same_link() -> TestResult {
    let dir = TempDir::new()?;
    let collector = open_at(&dir.path().join("saved_links.json")).await?;
    collector
        .submit_text(1, "https://t.me/a https://chat.whatsapp.com/B")
        .await?;
    collector.begin_review(1).await;

    let outcome = collector.receive_verdict(1, "perhaps").await?;
    let VerdictOutcome::Unrecognized(prompt) = outcome else {
        panic!("expected a re-prompt, got {outcome:?}");
    };
    assert_eq!(prompt.position, 1);
    assert_eq!(prompt.item.link, "https://t.me/a");

    let VerdictOutcome::Next(next) = collector.receive_verdict(1, "YES").await? else {
        panic!("expected the next link");
    };
    assert_eq!(next.position, 2);
    assert_eq!(next.item.platform, Platform::WhatsApp);
    Ok(())
}

#[tokio::test]
async fn restarting_a_review_discards_pending_verdicts() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("saved_links.json");
    let collector = open_at(&path).await?;
    collector.submit_text(1, "https://t.me/a https://t.me/b").await?;

    collector.begin_review(1).await;
    collector.receive_verdict(1, "no").await?;

    let ReviewStart::Started { prompt, restarted } = collector.begin_review(1).await else {
        panic!("review should restart");
    };
    assert!(restarted);
    assert_eq!(prompt.position, 1);
    assert_eq!(prompt.item.link, "https://t.me/a");

    collector.receive_verdict(1, "yes").await?;
    let outcome = collector.receive_verdict(1, "yes").await?;
    assert_eq!(
        outcome,
        VerdictOutcome::Completed(ReviewSummary {
            reviewed: 2,
            removed: 0
        })
    );
    assert_eq!(read_store(&path)?.links.telegram.len(), 2);
    Ok(())
}

#[tokio::test]
async fn sessions_are_per_user() -> TestResult {
    let dir = TempDir::new()?;
    let collector = open_at(&dir.path().join("saved_links.json")).await?;
    collector.submit_text(1, "https://t.me/a").await?;

    collector.begin_review(1).await;
    assert!(collector.is_reviewing(1).await);
    assert!(!collector.is_reviewing(2).await);
    assert_eq!(
        collector.receive_verdict(2, "no").await?,
        VerdictOutcome::NoActiveReview
    );

    assert!(collector.cancel_review(1).await);
    assert!(!collector.cancel_review(1).await);
    assert_eq!(collector.stored_links().await.telegram.len(), 1);
    Ok(())
}

#[tokio::test]
async fn empty_store_has_nothing_to_review() -> TestResult {
    let dir = TempDir::new()?;
    let collector = open_at(&dir.path().join("saved_links.json")).await?;
    assert_eq!(collector.begin_review(1).await, ReviewStart::NothingToReview);
    assert!(!collector.is_reviewing(1).await);
    Ok(())
}

#[tokio::test]
async fn review_batch_is_capped() -> TestResult {
    let dir = TempDir::new()?;
    let storage: Arc<dyn DocumentStorage> =
        Arc::new(LocalFileStorage::new(dir.path().join("saved_links.json")));
    let collector = LinkCollector::open(storage, Some(2)).await?;
    collector
        .submit_text(1, "https://t.me/a https://t.me/b https://t.me/c")
        .await?;

    let ReviewStart::Started { prompt, .. } = collector.begin_review(1).await else {
        panic!("review should start");
    };
    assert_eq!(prompt.total, 2);
    Ok(())
}
