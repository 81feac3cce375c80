//! Preload and upload pipeline behaviour against in-memory backends.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use slidesync_assets::{
    preload, schedule_uploads, AssetError, DirStorage, ImageFetcher, PreloadRequest, Preloaded,
    Storage, UploadRequest,
};
use slidesync_core::{ImageResource, RemoteImageRef, UploadState};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn remote(name: &str) -> RemoteImageRef {
    RemoteImageRef {
        url: format!("https://remote.test/{name}"),
        id: name.to_string(),
    }
}

/// Serves `bytes = url id` for every reference; sleeps longer for earlier ids
/// so results complete out of order.
#[derive(Default)]
struct FakeFetcher {
    fail_on: Option<String>,
    calls: AtomicUsize,
}

impl ImageFetcher for FakeFetcher {
    fn fetch_image(&self, image: &RemoteImageRef) -> Result<slidesync_core::Image, AssetError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.as_deref() == Some(image.id.as_str()) {
            return Err(AssetError::Fetch {
                url: image.url.clone(),
                reason: "404".into(),
            });
        }
        let delay = image.id.bytes().last().map_or(0, |b| 20 - (b % 10) as u64 * 2);
        std::thread::sleep(Duration::from_millis(delay));
        Ok(ImageResource::uploaded(
            image.id.as_bytes().to_vec(),
            "image/png",
            image.clone(),
        ))
    }
}

/// Records every call; `put` ids are sequential.
#[derive(Default)]
struct RecordingStorage {
    fail_grant: bool,
    puts: AtomicUsize,
    deleted: Mutex<Vec<String>>,
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl Storage for RecordingStorage {
    fn put(&self, bytes: &[u8], _mime_type: &str) -> Result<String, AssetError> {
        let n = self.puts.fetch_add(1, Ordering::SeqCst);
        let id = format!("obj-{n}");
        self.objects.lock().unwrap().insert(id.clone(), bytes.to_vec());
        Ok(id)
    }

    fn grant_public_read(&self, _id: &str) -> Result<(), AssetError> {
        if self.fail_grant {
            Err(AssetError::Storage("grant refused".into()))
        } else {
            Ok(())
        }
    }

    fn public_url(&self, id: &str) -> Result<String, AssetError> {
        Ok(format!("https://cdn.test/{id}"))
    }

    fn delete(&self, id: &str) -> Result<(), AssetError> {
        self.objects.lock().unwrap().remove(id);
        self.deleted.lock().unwrap().push(id.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Preload
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn preload_reassembles_images_in_page_order() {
    let fetcher = Arc::new(FakeFetcher::default());
    let requests = vec![
        PreloadRequest {
            page_index: 4,
            images: vec![remote("p4-0"), remote("p4-1"), remote("p4-2")],
        },
        PreloadRequest {
            page_index: 1,
            images: vec![remote("p1-0"), remote("p1-1")],
        },
        PreloadRequest {
            page_index: 2,
            images: vec![],
        },
    ];

    let preloaded = preload(Arc::clone(&fetcher), requests, 3).await.expect("preload");

    let ids = |page: usize| -> Vec<String> {
        preloaded
            .page(page)
            .iter()
            .map(|image| image.location().unwrap().id)
            .collect()
    };
    assert_eq!(ids(4), vec!["p4-0", "p4-1", "p4-2"]);
    assert_eq!(ids(1), vec!["p1-0", "p1-1"]);
    assert!(ids(2).is_empty());
    assert_eq!(preloaded.len(), 5);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn preload_fails_fast_on_first_error() {
    let fetcher = Arc::new(FakeFetcher {
        fail_on: Some("a".into()),
        ..FakeFetcher::default()
    });
    let requests = vec![PreloadRequest {
        page_index: 0,
        images: vec![remote("a"), remote("b"), remote("c"), remote("d")],
    }];

    let err = preload(Arc::clone(&fetcher), requests, 1).await.unwrap_err();
    assert!(matches!(err, AssetError::Fetch { .. }), "{err}");
    // One worker: the failing fetch is the only one attempted.
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn preload_with_no_requests_does_nothing() {
    let fetcher = Arc::new(FakeFetcher::default());
    let preloaded = preload(Arc::clone(&fetcher), Vec::new(), 8).await.expect("preload");
    assert!(preloaded.is_empty());
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

async fn preloaded_with(page_index: usize, bytes: &[u8], location: RemoteImageRef) -> Preloaded {
    struct Fixed(Vec<u8>);
    impl ImageFetcher for Fixed {
        fn fetch_image(&self, image: &RemoteImageRef) -> Result<slidesync_core::Image, AssetError> {
            Ok(ImageResource::uploaded(self.0.clone(), "image/png", image.clone()))
        }
    }
    preload(
        Arc::new(Fixed(bytes.to_vec())),
        vec![PreloadRequest {
            page_index,
            images: vec![location],
        }],
        2,
    )
    .await
    .expect("preload")
}

#[tokio::test]
async fn identical_fingerprint_reuses_remote_image_without_uploading() {
    let existing = remote("already-there");
    let preloaded = preloaded_with(3, b"same pixels", existing.clone()).await;
    let storage = Arc::new(RecordingStorage::default());

    let image = ImageResource::new(b"same pixels".to_vec(), "image/png");
    let batch = schedule_uploads(
        Arc::clone(&storage),
        &[UploadRequest {
            page_index: Some(3),
            images: vec![Arc::clone(&image)],
        }],
        &preloaded,
        4,
    );

    assert_eq!(batch.scheduled(), 0);
    assert_eq!(batch.adopted(), 1);
    batch.join().await.expect("join");
    assert_eq!(storage.puts.load(Ordering::SeqCst), 0);
    assert_eq!(image.wait().await.expect("uploaded"), existing);
}

#[tokio::test]
async fn fingerprint_on_another_page_is_not_reused() {
    let preloaded = preloaded_with(3, b"same pixels", remote("elsewhere")).await;
    let storage = Arc::new(RecordingStorage::default());
    let image = ImageResource::new(b"same pixels".to_vec(), "image/png");

    let batch = schedule_uploads(
        Arc::clone(&storage),
        &[UploadRequest {
            page_index: Some(0),
            images: vec![Arc::clone(&image)],
        }],
        &preloaded,
        4,
    );
    assert_eq!(batch.scheduled(), 1);
    batch.join().await.expect("join");
    assert_eq!(storage.puts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn shared_image_is_uploaded_once() {
    let storage = Arc::new(RecordingStorage::default());
    let image = ImageResource::new(b"logo".to_vec(), "image/png");
    let requests = vec![
        UploadRequest {
            page_index: None,
            images: vec![Arc::clone(&image)],
        },
        UploadRequest {
            page_index: Some(1),
            images: vec![Arc::clone(&image), Arc::clone(&image)],
        },
    ];

    let batch = schedule_uploads(Arc::clone(&storage), &requests, &Preloaded::default(), 8);
    assert_eq!(batch.scheduled(), 1);

    let location = image.wait().await.expect("uploaded");
    assert_eq!(location.url, "https://cdn.test/obj-0");
    batch.join().await.expect("join");
    assert_eq!(storage.puts.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn identical_copies_in_one_batch_share_a_single_upload() {
    let storage = Arc::new(RecordingStorage::default());
    let copies: Vec<_> = (0..6)
        .map(|_| ImageResource::new(b"logo".to_vec(), "image/png"))
        .collect();
    let requests: Vec<UploadRequest> = copies
        .iter()
        .map(|copy| UploadRequest {
            page_index: None,
            images: vec![Arc::clone(copy)],
        })
        .collect();

    let batch = schedule_uploads(Arc::clone(&storage), &requests, &Preloaded::default(), 4);
    assert_eq!(batch.scheduled(), 1);
    assert_eq!(batch.adopted(), 5);

    for copy in &copies {
        assert_eq!(copy.wait().await.expect("uploaded").id, "obj-0");
    }
    batch.join().await.expect("join");
    assert_eq!(storage.puts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn copies_fail_with_the_upload_they_follow() {
    let storage = Arc::new(RecordingStorage {
        fail_grant: true,
        ..RecordingStorage::default()
    });
    let first = ImageResource::new(b"logo".to_vec(), "image/png");
    let second = ImageResource::new(b"logo".to_vec(), "image/png");

    let batch = schedule_uploads(
        Arc::clone(&storage),
        &[UploadRequest {
            page_index: None,
            images: vec![Arc::clone(&first), Arc::clone(&second)],
        }],
        &Preloaded::default(),
        2,
    );

    let err = second.wait().await.unwrap_err();
    assert!(err.reason.contains("grant refused"), "{err}");
    assert!(first.wait().await.is_err());
    batch.join().await.expect("join");
    assert_eq!(storage.puts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn images_already_claimed_are_left_alone() {
    let storage = Arc::new(RecordingStorage::default());
    let claimed = ImageResource::new(b"busy".to_vec(), "image/png");
    assert!(claimed.begin_upload());
    let done = ImageResource::uploaded(b"done".to_vec(), "image/png", remote("done"));

    let batch = schedule_uploads(
        Arc::clone(&storage),
        &[UploadRequest {
            page_index: None,
            images: vec![claimed.clone(), done],
        }],
        &Preloaded::default(),
        2,
    );
    assert_eq!(batch.scheduled(), 0);
    assert_eq!(claimed.state(), UploadState::Uploading);
}

#[tokio::test]
async fn failed_publish_marks_image_failed_and_cleans_up() {
    let storage = Arc::new(RecordingStorage {
        fail_grant: true,
        ..RecordingStorage::default()
    });
    let image = ImageResource::new(b"secret".to_vec(), "image/jpeg");

    let batch = schedule_uploads(
        Arc::clone(&storage),
        &[UploadRequest {
            page_index: None,
            images: vec![Arc::clone(&image)],
        }],
        &Preloaded::default(),
        1,
    );

    let err = image.wait().await.unwrap_err();
    assert!(err.reason.contains("grant refused"), "{err}");
    batch.join().await.expect("join");
    assert_eq!(*storage.deleted.lock().unwrap(), vec!["obj-0".to_string()]);
    assert!(storage.objects.lock().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn many_images_upload_through_a_small_pool() {
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(DirStorage::new(dir.path()));
    let images: Vec<_> = (0..12)
        .map(|i| ImageResource::new(format!("image {i}").into_bytes(), "image/png"))
        .collect();

    let batch = schedule_uploads(
        Arc::clone(&storage),
        &[UploadRequest {
            page_index: None,
            images: images.clone(),
        }],
        &Preloaded::default(),
        3,
    );
    assert_eq!(batch.scheduled(), 12);

    for image in &images {
        let location = image.wait().await.expect("uploaded");
        assert!(dir.path().join(&location.id).exists());
    }
    batch.join().await.expect("join");
}
