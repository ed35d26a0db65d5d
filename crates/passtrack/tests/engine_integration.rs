//! Integration tests for the synchronization engine against a scripted
//! remote API and an in-memory database.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use passtrack::api::types::{
    BeatmapDetail, Cover, MapsetDetail, MapsetRef, MapsetSearchPage, MapsetSummary, Score,
    UserProfile,
};
use passtrack::api::{ApiError, ApiRateLimiter, OsuApi, Result as ApiResult};
use passtrack::connect_and_migrate;
use passtrack::entity::prelude::*;
use passtrack::store::{ProfileUpdate, catalog, completions, queue, users};
use passtrack::sync::{
    Lifecycle, RECENT_WINDOW_MS, SyncContext, WorkerTick, admission, discovery, now_ms, worker,
};
use sea_orm::DatabaseConnection;

// ─── Scripted remote API ─────────────────────────────────────────────────────

/// In-memory stand-in for the remote service. Reads are scripted up front;
/// `passed_script` lets tests inject per-call failures for the batch endpoint.
#[derive(Default)]
struct MockApi {
    search_pages: Vec<MapsetSearchPage>,
    mapsets: HashMap<i64, MapsetDetail>,
    profiles: HashMap<i64, UserProfile>,
    /// Recent scores per (user, ruleset). Missing key = remote 404.
    recent: HashMap<(i64, Ruleset), Vec<Score>>,
    /// All beatmaps the user has ever passed; batch calls filter by mapset.
    passed: HashMap<i64, Vec<BeatmapDetail>>,
    /// Outcome script for `get_passed_beatmaps`: `Some(err)` fails that
    /// call, `None` lets it through. Exhausted script = success.
    passed_script: Mutex<VecDeque<Option<ApiError>>>,

    search_calls: AtomicUsize,
    mapset_calls: AtomicUsize,
    recent_calls: AtomicUsize,
    passed_calls: AtomicUsize,
}

impl MockApi {
    /// Chain the given pages with `cursor-N` continuation cursors.
    fn with_search_pages(mut self, mut pages: Vec<MapsetSearchPage>) -> Self {
        let count = pages.len();
        for (i, page) in pages.iter_mut().enumerate() {
            page.cursor_string = if i + 1 < count {
                Some(format!("cursor-{}", i + 1))
            } else {
                None
            };
        }
        self.search_pages = pages;
        self
    }

    fn script_passed(&self, outcomes: Vec<Option<ApiError>>) {
        *self.passed_script.lock().unwrap() = outcomes.into();
    }
}

#[async_trait]
impl OsuApi for MockApi {
    async fn search_ranked_mapsets(&self, cursor: Option<&str>) -> ApiResult<MapsetSearchPage> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let index = match cursor {
            None => 0,
            Some(c) => c
                .strip_prefix("cursor-")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| ApiError::not_found(format!("cursor {}", c)))?,
        };
        self.search_pages
            .get(index)
            .cloned()
            .ok_or_else(|| ApiError::not_found("search page"))
    }

    async fn get_mapset(&self, mapset_id: i64) -> ApiResult<MapsetDetail> {
        self.mapset_calls.fetch_add(1, Ordering::SeqCst);
        self.mapsets
            .get(&mapset_id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("beatmapsets/{}", mapset_id)))
    }

    async fn get_user(&self, user_id: i64) -> ApiResult<UserProfile> {
        self.profiles
            .get(&user_id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("users/{}", user_id)))
    }

    async fn get_user_recent_scores(
        &self,
        user_id: i64,
        ruleset: Ruleset,
        limit: usize,
        offset: usize,
    ) -> ApiResult<Vec<Score>> {
        self.recent_calls.fetch_add(1, Ordering::SeqCst);
        let Some(scores) = self.recent.get(&(user_id, ruleset)) else {
            return Err(ApiError::not_found(format!("users/{}/scores", user_id)));
        };
        let start = offset.min(scores.len());
        let end = (offset + limit).min(scores.len());
        Ok(scores[start..end].to_vec())
    }

    async fn get_passed_beatmaps(
        &self,
        user_id: i64,
        mapset_ids: &[i64],
    ) -> ApiResult<Vec<BeatmapDetail>> {
        self.passed_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(Some(error)) = self.passed_script.lock().unwrap().pop_front() {
            return Err(error);
        }
        Ok(self
            .passed
            .get(&user_id)
            .map(|maps| {
                maps.iter()
                    .filter(|m| mapset_ids.contains(&m.beatmapset_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn summary(id: i64) -> MapsetSummary {
    MapsetSummary {
        id,
        status: "ranked".to_string(),
        title: format!("Song {}", id),
        artist: "Artist".to_string(),
        ranked_date: None,
        submitted_date: None,
    }
}

fn page(ids: &[i64]) -> MapsetSearchPage {
    MapsetSearchPage {
        cursor_string: None,
        beatmapsets: ids.iter().map(|&id| summary(id)).collect(),
    }
}

fn bmap(id: i64, mapset_id: i64, mode: Ruleset) -> BeatmapDetail {
    BeatmapDetail {
        id,
        beatmapset_id: mapset_id,
        status: "ranked".to_string(),
        version: "Hard".to_string(),
        mode,
        difficulty_rating: 3.5,
        convert: false,
    }
}

fn detail(id: i64, beatmaps: Vec<BeatmapDetail>) -> MapsetDetail {
    MapsetDetail {
        id,
        status: "ranked".to_string(),
        title: format!("Song {}", id),
        artist: "Artist".to_string(),
        ranked_date: None,
        submitted_date: None,
        beatmaps,
        converts: vec![],
    }
}

fn remote_profile(id: i64, name: &str, playmode: Ruleset) -> UserProfile {
    UserProfile {
        id,
        username: name.to_string(),
        avatar_url: format!("https://a/{}", id),
        cover: Cover { url: None },
        playmode,
    }
}

fn score(map: BeatmapDetail) -> Score {
    let mapset = MapsetRef {
        id: map.beatmapset_id,
    };
    Score {
        beatmap: map,
        beatmapset: mapset,
    }
}

async fn setup_db() -> DatabaseConnection {
    connect_and_migrate("sqlite::memory:")
        .await
        .expect("in-memory db should migrate")
}

fn context(db: DatabaseConnection, api: MockApi) -> (Arc<SyncContext>, Arc<MockApi>) {
    let api = Arc::new(api);
    let ctx = Arc::new(SyncContext::new(
        db,
        Arc::clone(&api) as Arc<dyn OsuApi>,
        // Effectively unlimited: tests exercise pacing logic, not the limiter.
        ApiRateLimiter::new(1_000_000),
    ));
    (ctx, api)
}

/// Seed a tracked user directly, as the excluded registration surface would.
async fn seed_user(db: &DatabaseConnection, id: i64, name: &str, last_update: i64) {
    users::upsert_profile(
        db,
        ProfileUpdate {
            id,
            name: name.to_string(),
            avatar_url: String::new(),
            banner_url: String::new(),
            ruleset: Ruleset::Osu,
        },
    )
    .await
    .unwrap();
    users::set_last_score_update(db, id, last_update).await.unwrap();
}

// ─── Discovery ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_discovery_stops_at_first_known_mapset() {
    let db = setup_db().await;

    // Remote lists [C, B, A] newest-first; B is already mirrored.
    let mut api = MockApi::default().with_search_pages(vec![page(&[300, 200, 100])]);
    api.mapsets.insert(300, detail(300, vec![bmap(31, 300, Ruleset::Osu)]));
    api.mapsets.insert(100, detail(100, vec![bmap(11, 100, Ruleset::Osu)]));
    let (ctx, api) = context(db.clone(), api);

    seed_mapset(&db, 200).await;

    let stats = discovery::discover_once(&ctx).await.unwrap();

    assert_eq!(stats.new_mapsets, 1);
    assert!(catalog::mapset_exists(&db, 300).await.unwrap());
    assert!(!catalog::mapset_exists(&db, 100).await.unwrap());
    // Only the genuinely new mapset was re-fetched in detail.
    assert_eq!(api.mapset_calls.load(Ordering::SeqCst), 1);
}

async fn seed_mapset(db: &DatabaseConnection, id: i64) {
    use sea_orm::Set;
    catalog::save_mapset(
        db,
        passtrack::entity::mapset::ActiveModel {
            id: Set(id),
            status: Set("ranked".to_string()),
            title: Set(format!("Song {}", id)),
            artist: Set("Artist".to_string()),
            recency_ms: Set(id * 1000),
        },
        vec![],
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_discovery_is_idempotent_against_unchanged_remote() {
    let db = setup_db().await;
    let mut api = MockApi::default().with_search_pages(vec![page(&[100])]);
    api.mapsets.insert(100, detail(100, vec![bmap(11, 100, Ruleset::Osu)]));
    let (ctx, api) = context(db.clone(), api);

    let first = discovery::discover_once(&ctx).await.unwrap();
    assert_eq!(first.new_mapsets, 1);
    assert_eq!(first.new_beatmaps, 1);

    let second = discovery::discover_once(&ctx).await.unwrap();
    assert_eq!(second.new_mapsets, 0);
    assert_eq!(catalog::count_mapsets(&db).await.unwrap(), 1);
    // The second sweep terminated on its first page.
    assert_eq!(api.search_calls.load(Ordering::SeqCst), 2);
    assert_eq!(api.mapset_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_discovery_follows_cursor_across_pages() {
    let db = setup_db().await;
    let mut api =
        MockApi::default().with_search_pages(vec![page(&[300, 200]), page(&[100])]);
    for id in [100, 200, 300] {
        api.mapsets.insert(id, detail(id, vec![bmap(id / 10, id, Ruleset::Osu)]));
    }
    let (ctx, api) = context(db.clone(), api);

    let stats = discovery::discover_once(&ctx).await.unwrap();
    assert_eq!(stats.new_mapsets, 3);
    assert_eq!(api.search_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_discovery_force_full_skips_known_and_continues() {
    let db = setup_db().await;
    let mut api = MockApi::default().with_search_pages(vec![page(&[300, 200, 100])]);
    api.mapsets.insert(300, detail(300, vec![]));
    api.mapsets.insert(100, detail(100, vec![]));
    let (ctx, _api) = {
        let api = Arc::new(api);
        let ctx = Arc::new(
            SyncContext::new(
                db.clone(),
                Arc::clone(&api) as Arc<dyn OsuApi>,
                ApiRateLimiter::new(1_000_000),
            )
            .with_force_full_discovery(true),
        );
        (ctx, api)
    };
    seed_mapset(&db, 200).await;

    let stats = discovery::discover_once(&ctx).await.unwrap();
    assert_eq!(stats.new_mapsets, 2);
    assert!(catalog::mapset_exists(&db, 100).await.unwrap());
}

// ─── Admission ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_admission_queues_only_stale_unqueued_users() {
    let db = setup_db().await;
    let (ctx, _api) = context(db.clone(), MockApi::default());

    seed_user(&db, 1, "never-synced", 0).await;
    seed_user(&db, 2, "fresh", now_ms()).await;
    seed_user(&db, 3, "already-queued", 0).await;
    queue::enqueue(&db, 3, 0).await.unwrap();

    let queued = admission::admit_once(&ctx).await.unwrap();
    assert_eq!(queued, 1);
    assert_eq!(queue::len(&db).await.unwrap(), 2);

    let task = queue::find_by_user(&db, 1).await.unwrap().unwrap();
    assert_eq!(task.last_mapset_id, 0);

    // A second scan admits nobody new.
    assert_eq!(admission::admit_once(&ctx).await.unwrap(), 0);
}

// ─── Worker ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_worker_idles_on_empty_queue() {
    let db = setup_db().await;
    let (ctx, _api) = context(db, MockApi::default());
    let lifecycle = Lifecycle::new();

    let tick = worker::tick(&ctx, &lifecycle).await.unwrap();
    assert_eq!(tick, WorkerTick::Idle);
}

#[tokio::test]
async fn test_end_to_end_discovery_admission_full_rescan() {
    let db = setup_db().await;
    let mut api = MockApi::default().with_search_pages(vec![page(&[100])]);
    api.mapsets.insert(
        100,
        detail(
            100,
            vec![bmap(1, 100, Ruleset::Osu), bmap(2, 100, Ruleset::Osu)],
        ),
    );
    api.profiles.insert(42, remote_profile(42, "alice", Ruleset::Osu));
    // The batch query reports a pass on beatmap 1 only.
    api.passed.insert(42, vec![bmap(1, 100, Ruleset::Osu)]);
    let (ctx, _api) = context(db.clone(), api);
    let lifecycle = Lifecycle::new();

    // Discovery mirrors one mapset with two beatmaps.
    discovery::discover_once(&ctx).await.unwrap();
    assert_eq!(catalog::count_mapsets(&db).await.unwrap(), 1);
    assert_eq!(catalog::count_beatmaps(&db).await.unwrap(), 2);

    // Admission queues the never-synced user with a zero cursor.
    seed_user(&db, 42, "alice", 0).await;
    admission::admit_once(&ctx).await.unwrap();
    let task = queue::find_by_user(&db, 42).await.unwrap().unwrap();
    assert_eq!(task.last_mapset_id, 0);

    // The worker claims it; never-synced means full rescan.
    let before = now_ms();
    let tick = worker::tick(&ctx, &lifecycle).await.unwrap();
    assert_eq!(tick, WorkerTick::Worked);

    assert_eq!(completions::count_for_user(&db, 42).await.unwrap(), 1);
    assert!(completions::exists(&db, 42, 1, Ruleset::Osu).await.unwrap());
    assert!(queue::find_by_user(&db, 42).await.unwrap().is_none());
    let user = users::get(&db, 42).await.unwrap();
    assert!(user.last_score_update >= before);
}

#[tokio::test]
async fn test_rescan_resumes_after_failure_without_duplicates() {
    let db = setup_db().await;
    let mut api = MockApi::default();
    api.profiles.insert(42, remote_profile(42, "alice", Ruleset::Osu));
    // Passes live in the first and second batches of a 120-mapset catalog.
    api.passed.insert(
        42,
        vec![bmap(1010, 10, Ruleset::Osu), bmap(1060, 60, Ruleset::Osu)],
    );
    let (ctx, api) = context(db.clone(), api);
    let lifecycle = Lifecycle::new();

    for id in 1..=120 {
        catalog::save_mapset(
            &db,
            {
                use sea_orm::Set;
                passtrack::entity::mapset::ActiveModel {
                    id: Set(id),
                    status: Set("ranked".to_string()),
                    title: Set(format!("Song {}", id)),
                    artist: Set("Artist".to_string()),
                    recency_ms: Set(id * 1000),
                }
            },
            vec![{
                use sea_orm::Set;
                passtrack::entity::beatmap::ActiveModel {
                    id: Set(1000 + id),
                    ruleset: Set(Ruleset::Osu),
                    mapset_id: Set(id),
                    status: Set("ranked".to_string()),
                    version: Set("Hard".to_string()),
                    star_rating: Set(3.5),
                    is_convert: Set(false),
                }
            }],
        )
        .await
        .unwrap();
    }

    seed_user(&db, 42, "alice", 0).await;
    queue::enqueue(&db, 42, now_ms()).await.unwrap();

    // First batch succeeds, second batch hits a hard remote error.
    api.script_passed(vec![None, Some(ApiError::Status {
        status: 500,
        resource: "beatmaps-passed".to_string(),
    })]);

    let result = worker::tick(&ctx, &lifecycle).await;
    assert!(result.is_err());

    // The entry survived with the cursor parked at the last committed batch.
    let task = queue::find_by_user(&db, 42).await.unwrap().unwrap();
    assert_eq!(task.last_mapset_id, 50);
    assert_eq!(task.count_new_completions, 1);
    assert_eq!(completions::count_for_user(&db, 42).await.unwrap(), 1);
    let user = users::get(&db, 42).await.unwrap();
    assert_eq!(user.last_score_update, 0);

    // Next claim resumes strictly after the cursor and finishes cleanly.
    let tick = worker::tick(&ctx, &lifecycle).await.unwrap();
    assert_eq!(tick, WorkerTick::Worked);
    assert_eq!(completions::count_for_user(&db, 42).await.unwrap(), 2);
    assert!(queue::find_by_user(&db, 42).await.unwrap().is_none());
}

#[tokio::test]
async fn test_rescan_retries_same_batch_on_throttle() {
    let db = setup_db().await;
    let mut api = MockApi::default();
    api.profiles.insert(42, remote_profile(42, "alice", Ruleset::Osu));
    api.passed.insert(42, vec![bmap(11, 1, Ruleset::Osu)]);
    let (ctx, api) = context(db.clone(), api);
    let lifecycle = Lifecycle::new();

    seed_mapset(&db, 1).await;
    seed_user(&db, 42, "alice", 0).await;
    queue::enqueue(&db, 42, now_ms()).await.unwrap();

    api.script_passed(vec![Some(ApiError::RateLimited), None]);

    let tick = worker::tick(&ctx, &lifecycle).await.unwrap();
    assert_eq!(tick, WorkerTick::Worked);
    // Throttled once, then the same batch succeeded.
    assert_eq!(api.passed_calls.load(Ordering::SeqCst), 2);
    assert_eq!(completions::count_for_user(&db, 42).await.unwrap(), 1);
}

#[tokio::test]
async fn test_strategy_boundary_recent_window() {
    // Just inside the 24h window: incremental sync, no batch queries.
    let db = setup_db().await;
    let mut api = MockApi::default();
    api.profiles.insert(42, remote_profile(42, "alice", Ruleset::Osu));
    api.recent.insert((42, Ruleset::Osu), vec![]);
    let (ctx, api) = context(db.clone(), api);
    let lifecycle = Lifecycle::new();

    seed_mapset(&db, 1).await;
    seed_user(&db, 42, "alice", now_ms() - RECENT_WINDOW_MS + 60_000).await;
    queue::enqueue(&db, 42, now_ms()).await.unwrap();

    worker::tick(&ctx, &lifecycle).await.unwrap();

    // One recent-scores page per ruleset; the missing rulesets 404 and are
    // treated as empty.
    assert_eq!(api.recent_calls.load(Ordering::SeqCst), 4);
    assert_eq!(api.passed_calls.load(Ordering::SeqCst), 0);
    assert!(queue::find_by_user(&db, 42).await.unwrap().is_none());
}

#[tokio::test]
async fn test_strategy_boundary_stale_window() {
    // Just outside the 24h window: full rescan, no recent-score queries.
    let db = setup_db().await;
    let mut api = MockApi::default();
    api.profiles.insert(42, remote_profile(42, "alice", Ruleset::Osu));
    let (ctx, api) = context(db.clone(), api);
    let lifecycle = Lifecycle::new();

    seed_mapset(&db, 1).await;
    seed_user(&db, 42, "alice", now_ms() - RECENT_WINDOW_MS - 60_000).await;
    queue::enqueue(&db, 42, now_ms()).await.unwrap();

    worker::tick(&ctx, &lifecycle).await.unwrap();

    assert_eq!(api.recent_calls.load(Ordering::SeqCst), 0);
    assert_eq!(api.passed_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_incremental_sync_records_new_completions_once() {
    let db = setup_db().await;

    let beatmap_a = bmap(201, 20, Ruleset::Mania);
    let beatmap_b = bmap(202, 20, Ruleset::Mania);

    let mut api = MockApi::default();
    api.profiles.insert(42, remote_profile(42, "alice", Ruleset::Mania));
    // The recent listing repeats beatmap A and includes already-recorded B.
    api.recent.insert(
        (42, Ruleset::Mania),
        vec![
            score(beatmap_a.clone()),
            score(beatmap_a.clone()),
            score(beatmap_b.clone()),
        ],
    );
    let (ctx, _api) = context(db.clone(), api);
    let lifecycle = Lifecycle::new();

    seed_user(&db, 42, "alice", now_ms() - 1000).await;
    completions::insert_ignore_many(
        &db,
        vec![passtrack::entity::completion::ActiveModel {
            user_id: sea_orm::Set(42),
            beatmap_id: sea_orm::Set(202),
            ruleset: sea_orm::Set(Ruleset::Mania),
            mapset_id: sea_orm::Set(20),
            status: sea_orm::Set("ranked".to_string()),
            is_convert: sea_orm::Set(false),
        }],
    )
    .await
    .unwrap();
    queue::enqueue(&db, 42, now_ms()).await.unwrap();

    let before = now_ms();
    worker::tick(&ctx, &lifecycle).await.unwrap();

    assert_eq!(completions::count_for_user(&db, 42).await.unwrap(), 2);
    assert!(completions::exists(&db, 42, 201, Ruleset::Mania).await.unwrap());
    assert!(queue::find_by_user(&db, 42).await.unwrap().is_none());
    let user = users::get(&db, 42).await.unwrap();
    assert!(user.last_score_update >= before);
}

#[tokio::test]
async fn test_failed_profile_fetch_leaves_entry_queued() {
    let db = setup_db().await;
    // No profile scripted: the remote 404s the user.
    let (ctx, _api) = context(db.clone(), MockApi::default());
    let lifecycle = Lifecycle::new();

    seed_user(&db, 42, "alice", 0).await;
    queue::enqueue(&db, 42, now_ms()).await.unwrap();

    assert!(worker::tick(&ctx, &lifecycle).await.is_err());
    // The entry stays for the next claim cycle.
    assert!(queue::find_by_user(&db, 42).await.unwrap().is_some());
}

#[tokio::test]
async fn test_rescan_pauses_at_batch_boundary_when_draining() {
    let db = setup_db().await;
    let mut api = MockApi::default();
    api.profiles.insert(42, remote_profile(42, "alice", Ruleset::Osu));
    let (ctx, _api) = context(db.clone(), api);
    let lifecycle = Lifecycle::new();

    for id in 1..=60 {
        seed_mapset(&db, id).await;
    }
    seed_user(&db, 42, "alice", 0).await;
    queue::enqueue(&db, 42, now_ms()).await.unwrap();

    // Drain before the worker starts: the rescan commits its first batch,
    // then observes the drain during the pacing pause and yields.
    lifecycle.drain();
    let tick = worker::tick(&ctx, &lifecycle).await.unwrap();
    assert_eq!(tick, WorkerTick::Worked);

    let task = queue::find_by_user(&db, 42).await.unwrap().unwrap();
    assert_eq!(task.last_mapset_id, 50);
    let user = users::get(&db, 42).await.unwrap();
    assert_eq!(user.last_score_update, 0);
}
