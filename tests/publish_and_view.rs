//! End-to-end: publish letters into a directory-backed repository, then load
//! and render the gallery from the same files.
//!
//! Run with: cargo test --test publish_and_view

use chrono::{Duration, TimeZone, Utc};
use letters::config::{PathsConfig, SiteConfig};
use letters::gallery::{self, GalleryView, MessageSource};
use letters::publish::{self, ImageUpload, PublishError, PublishRequest};
use letters::render;
use letters::store::{DirStore, StoreError};
use letters::visit::VisitStore;
use std::fs;
use std::sync::Barrier;
use tempfile::TempDir;

fn request(title: &str, event: &str) -> PublishRequest {
    PublishRequest {
        title: title.to_string(),
        event_name: event.to_string(),
        message: format!("A letter called {title}"),
        image: Some(ImageUpload {
            file_name: "photo.jpg".to_string(),
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
        }),
    }
}

#[test]
fn published_letters_show_up_newest_first() {
    let repo = TempDir::new().unwrap();
    let store = DirStore::new(repo.path());
    let paths = PathsConfig::default();
    let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();

    publish::publish(&store, &paths, &request("First Light", ""), t0).unwrap();
    publish::publish(
        &store,
        &paths,
        &request("Second Wind", "Picnic"),
        t0 + Duration::hours(1),
    )
    .unwrap();

    let visits = VisitStore::new(repo.path().join(".state.json"));
    let source = MessageSource::Path(repo.path().join(&paths.messages));
    let view = gallery::present(&source, &visits);

    let titles: Vec<&str> = view.cards().iter().map(|c| c.message.title.as_str()).collect();
    assert_eq!(titles, vec!["Second Wind", "First Light"]);
    assert_eq!(view.new_count(), 2);

    for card in view.cards() {
        assert!(repo.path().join(&card.message.image_url).exists());
    }

    let out = repo.path().join("dist");
    let page = render::write_site(&view, &SiteConfig::default(), &out).unwrap();
    let html = fs::read_to_string(page).unwrap();
    assert!(html.contains("Event: Picnic"));
    assert_eq!(html.matches(r#"class="new-badge""#).count(), 2);
}

#[test]
fn only_letters_after_last_visit_are_new() {
    let repo = TempDir::new().unwrap();
    let store = DirStore::new(repo.path());
    let paths = PathsConfig::default();
    let visits = VisitStore::new(repo.path().join(".state.json"));
    let source = MessageSource::Path(repo.path().join(&paths.messages));
    let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();

    publish::publish(&store, &paths, &request("Old News", ""), t0).unwrap();
    let first_look = gallery::present(&source, &visits);
    assert_eq!(first_look.new_count(), 1);
    gallery::commit_visit(&first_look, &visits, t0 + Duration::minutes(5));

    publish::publish(&store, &paths, &request("Fresh", ""), t0 + Duration::minutes(10)).unwrap();
    let second_look = gallery::present(&source, &visits);
    let flags: Vec<(&str, bool)> = second_look
        .cards()
        .iter()
        .map(|c| (c.message.title.as_str(), c.is_new))
        .collect();
    assert_eq!(flags, vec![("Fresh", true), ("Old News", false)]);
}

#[test]
fn malformed_list_looks_like_no_letters() {
    let repo = TempDir::new().unwrap();
    let list = repo.path().join("data/messages.json");
    fs::create_dir_all(list.parent().unwrap()).unwrap();
    fs::write(&list, "[{\"title\": \"broken\"").unwrap();

    let visits = VisitStore::new(repo.path().join(".state.json"));
    let view = gallery::present(&MessageSource::Path(list), &visits);
    assert!(matches!(view, GalleryView::Empty));

    let html = render::render_page(&view, &SiteConfig::default()).into_string();
    assert!(html.contains(r#"<p class="empty-state">"#));
}

#[test]
fn outside_edit_between_read_and_write_is_rejected() {
    // A store whose list changes underneath the publisher: wrap DirStore and
    // touch the list file on the first read.
    struct Meddling {
        inner: DirStore,
    }

    impl letters::store::ContentStore for Meddling {
        fn get(
            &self,
            path: &str,
        ) -> Result<Option<letters::store::StoredFile>, StoreError> {
            let file = self.inner.get(path)?;
            fs::write(self.inner.root().join(path), "[]").unwrap();
            Ok(file)
        }

        fn put(
            &self,
            path: &str,
            content: &letters::store::EncodedContent,
            commit_message: &str,
            revision: Option<&letters::store::Revision>,
        ) -> Result<(), StoreError> {
            self.inner.put(path, content, commit_message, revision)
        }
    }

    let repo = TempDir::new().unwrap();
    let list = repo.path().join("data/messages.json");
    fs::create_dir_all(list.parent().unwrap()).unwrap();
    fs::write(&list, r#"[{"id": "msg_1", "title": "Kept"}]"#).unwrap();

    let store = Meddling {
        inner: DirStore::new(repo.path()),
    };
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
    let err = publish::publish(&store, &PathsConfig::default(), &request("Lost", ""), now)
        .unwrap_err();

    assert!(matches!(err, PublishError::Store(StoreError::Conflict { .. })));
    assert_eq!(err.user_message(), publish::UPLOAD_FAILED_MESSAGE);
    assert_eq!(fs::read_to_string(&list).unwrap(), "[]");
    let orphan = repo
        .path()
        .join(format!("uploads/lost-{}.jpg", now.timestamp_millis()));
    assert!(orphan.exists());
}

#[test]
fn concurrent_publishers_never_lose_a_letter() {
    let paths = PathsConfig::default();
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();

    for round in 0..30 {
        let repo = TempDir::new().unwrap();
        let store = DirStore::new(repo.path());
        let barrier = Barrier::new(2);
        let results: Vec<Result<_, PublishError>> = std::thread::scope(|s| {
            let handles: Vec<_> = ["Left", "Right"]
                .into_iter()
                .map(|title| {
                    let store = store.clone();
                    let (paths, barrier) = (&paths, &barrier);
                    s.spawn(move || {
                        barrier.wait();
                        publish::publish(&store, paths, &request(title, ""), now)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        let list = fs::read_to_string(repo.path().join(&paths.messages)).unwrap();
        let stored = letters::types::parse_message_list(&list).unwrap();
        assert!(succeeded >= 1, "round {round}");
        assert_eq!(stored.len(), succeeded, "round {round}");
        for failed in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(matches!(failed, PublishError::Store(StoreError::Conflict { .. })));
        }
    }
}

#[test]
fn failed_render_keeps_letters_new() {
    let repo = TempDir::new().unwrap();
    let store = DirStore::new(repo.path());
    let paths = PathsConfig::default();
    let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
    publish::publish(&store, &paths, &request("Still New", ""), t0).unwrap();

    let visits = VisitStore::new(repo.path().join(".state.json"));
    let source = MessageSource::Path(repo.path().join(&paths.messages));
    let view = gallery::present(&source, &visits);

    // The output directory sits under a regular file, so writing fails.
    let blocker = repo.path().join("not-a-dir");
    fs::write(&blocker, "").unwrap();
    let result = render::write_site(&view, &SiteConfig::default(), &blocker.join("dist"));
    assert!(result.is_err());
    assert_eq!(visits.last_visit(), None);

    let again = gallery::present(&source, &visits);
    assert_eq!(again.new_count(), 1);
}
