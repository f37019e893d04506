//! End-to-end passes over a scratch project on disk

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use nm_graph::{ChapterId, MemoryTaskStore, StoreError, TaskGraphStore};
use nm_manuscript::{CompileFormat, ProgressLedger};
use nm_sync::{
    ComparisonMetric, FixedClock, ManuscriptSynchronizer, SyncOptions, SyncResponse, LEDGER_KEY,
};
use nm_test_utils::{broken_tag, replace_draft, sample_tag, TestProject, DRAFT_END, DRAFT_START};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const CHAPTER_ONE: &str = ".novelmaster/manuscript/outline/chapters/chapter-001.md";
const SUMMARY: &str = ".novelmaster/manuscript/outline/manuscript-summary.json";
const COMPILED: &str = ".novelmaster/manuscript/outline/compiled/manuscript-outline.md";

async fn open(project: &TestProject) -> ManuscriptSynchronizer {
    let clock = FixedClock(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
    ManuscriptSynchronizer::open(project.root())
        .await
        .unwrap()
        .with_clock(Arc::new(clock))
}

fn summary_json(project: &TestProject) -> Value {
    serde_json::from_str(&project.read(SUMMARY)).unwrap()
}

#[tokio::test]
async fn fresh_scaffold_starts_at_zero() {
    let project = TestProject::with_tag("outline", &sample_tag());
    let sync = open(&project).await;

    let report = sync.sync_with_state(&SyncOptions::new("outline")).await.unwrap();

    assert_eq!(report.chapters.len(), 3);
    assert!(report.fixes.is_empty());
    for chapter in &report.chapters {
        assert_eq!(chapter.draft_word_count, 0);
    }
    assert_eq!(report.chapters[0].progress, Some(0));
    assert_eq!(report.chapters[2].progress, None);

    let chapter = project.read(CHAPTER_ONE);
    assert!(chapter.contains("title: \"Arrival\""));
    assert!(chapter.contains(DRAFT_START));
    assert!(chapter.contains(DRAFT_END));

    let summary = summary_json(&project);
    assert_eq!(summary["totals"]["completion"], json!(0.0));
    assert_eq!(summary["generatedAt"], json!("2024-03-01T12:00:00.000Z"));

    assert!(project.read(COMPILED).contains("_Draft not started._"));
}

#[tokio::test]
async fn repeated_passes_are_byte_identical() {
    let project = TestProject::with_tag("outline", &sample_tag());
    let sync = open(&project).await;
    let options = SyncOptions::new("outline");

    sync.sync_with_state(&options).await.unwrap();
    let first = (
        project.read(CHAPTER_ONE),
        project.read(SUMMARY),
        project.read(COMPILED),
        project.read(".novelmaster/tasks/tasks.json"),
    );

    sync.sync_with_state(&options).await.unwrap();
    let second = (
        project.read(CHAPTER_ONE),
        project.read(SUMMARY),
        project.read(COMPILED),
        project.read(".novelmaster/tasks/tasks.json"),
    );

    assert_eq!(first, second);
}

#[tokio::test]
async fn draft_edits_survive_and_are_counted() {
    let project = TestProject::with_tag("outline", &sample_tag());
    let sync = open(&project).await;
    let options = SyncOptions::new("outline");
    sync.sync_with_state(&options).await.unwrap();

    let edited = replace_draft(&project.read(CHAPTER_ONE), "Hello world");
    project.write(CHAPTER_ONE, &edited);

    let report = sync.sync_with_state(&options).await.unwrap();
    assert_eq!(report.chapters[0].draft_word_count, 2);
    assert_eq!(report.chapters[0].progress, Some(0));

    let tasks = project.read_tasks();
    let metadata = &tasks["outline"]["tasks"][0]["metadata"];
    assert_eq!(metadata["draftWordCount"], json!(2));
    assert_eq!(metadata["progress"], json!(0));
    assert_eq!(metadata["pov"], json!("Mara"));

    // Metadata changes refresh the managed block only
    let mut renamed = sample_tag();
    renamed.tasks[0].title = "Landfall".to_string();
    project.write_tag("outline", &renamed);
    sync.sync_with_state(&options).await.unwrap();

    let chapter = project.read(CHAPTER_ONE);
    assert!(chapter.contains("title: \"Landfall\""));
    assert!(!chapter.contains("title: \"Arrival\""));
    assert!(chapter.contains("Hello world"));
    assert!(project.read(COMPILED).contains("Hello world"));
}

#[tokio::test]
async fn summary_and_ledger_shapes() {
    let project = TestProject::with_tag("outline", &sample_tag());
    project.write_config(&json!({ "global": { "targetWordCount": "80k" } }));
    let sync = open(&project).await;

    sync.sync_with_state(&SyncOptions::new("outline")).await.unwrap();

    let summary = summary_json(&project);
    assert_eq!(summary["tag"], json!("outline"));
    assert_eq!(summary["totals"]["chapters"], json!(3));
    assert_eq!(summary["totals"]["targetWords"], json!(5000));
    assert_eq!(summary["totals"]["globalTarget"], json!(80_000));
    assert_eq!(summary["statusCounts"]["done"], json!(1));
    assert_eq!(summary["chapters"][1]["wordCountTarget"], json!(3000));

    let state: Value = serde_json::from_str(&project.read(".novelmaster/state.json")).unwrap();
    let rollup = &state[LEDGER_KEY]["outline"];
    assert_eq!(rollup["totalChapters"], json!(3));
    assert_eq!(rollup["targetWords"], json!(80_000));
    assert_eq!(rollup["completedChapters"], json!(1));
    assert_eq!(rollup["lastGenerated"], json!("2024-03-01T12:00:00.000Z"));
    assert_eq!(rollup["chapterStatus"]["1"]["targetWordCount"], json!(2000));

    let document = sync.read_summary("outline", None).await.unwrap();
    assert_eq!(document.summary.totals.chapters, 3);
}

#[tokio::test]
async fn config_selects_format_and_output_dir() {
    let project = TestProject::with_tag("outline", &sample_tag());
    project.write_config(&json!({
        "manuscript": { "outputDir": "book", "format": "txt", "summary": false }
    }));
    let sync = open(&project).await;

    let report = sync.sync_with_state(&SyncOptions::new("outline")).await.unwrap();

    assert_eq!(report.summary_path, None);
    assert!(project.root().join("book/outline/chapters/chapter-003.md").exists());
    let compiled = project.read("book/outline/compiled/manuscript-outline.txt");
    assert!(compiled.starts_with("MANUSCRIPT: OUTLINE"));
    assert!(!project.root().join(".novelmaster/state.json").exists());

    let override_md = SyncOptions::new("outline").with_format(CompileFormat::Markdown);
    sync.sync_with_state(&override_md).await.unwrap();
    assert!(project.root().join("book/outline/compiled/manuscript-outline.md").exists());
}

#[tokio::test]
async fn repairs_are_written_back_to_the_tasks_file() {
    let project = TestProject::with_tag("broken", &broken_tag());
    let sync = open(&project).await;

    let report = sync
        .sync_with_state(&SyncOptions::new("broken").with_compile(false))
        .await
        .unwrap();
    assert_eq!(report.fixes.len(), 2);

    let tasks = project.read_tasks();
    assert_eq!(tasks["broken"]["tasks"][2]["dependencies"], json!([1]));
    assert_eq!(tasks["broken"]["tasks"][4]["dependencies"], json!([]));
}

#[tokio::test]
async fn envelope_reports_failures() {
    let project = TestProject::with_tag("outline", &sample_tag());
    let sync = open(&project).await;

    let response = SyncResponse::from(sync.sync_with_state(&SyncOptions::new("sequel")).await);
    let value = serde_json::to_value(&response).unwrap();

    assert_eq!(value["success"], json!(false));
    assert_eq!(value["error"]["code"], json!("TAG_NOT_FOUND"));
    assert!(!project.root().join(".novelmaster/manuscript").exists());
}

#[tokio::test]
async fn compares_tags_from_the_tasks_file() {
    let project = TestProject::with_tag("draft-1", &sample_tag());
    let mut revised = sample_tag();
    revised.tasks[1].details = "Rain hammers the quay".to_string();
    project.write_tag("draft-2", &revised);
    let sync = open(&project).await;

    let comparison = sync
        .compare_tags("draft-1", "draft-2", ComparisonMetric::WordCount)
        .await
        .unwrap();

    assert_eq!(comparison.metric1.word_count, 5);
    assert_eq!(comparison.metric2.word_count, 9);
    assert!((comparison.improvement - 80.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn write_back_keeps_authored_fields() {
    let project = TestProject::new();
    project.write_tasks(&json!({
        "outline": {
            "tasks": [
                {
                    "id": 1,
                    "title": "Opening",
                    "status": "Done",
                    "description": "",
                    "details": "",
                    "priority": null,
                    "dependencies": [],
                    "metadata": { "wordCountTarget": "1k" },
                    "subtasks": []
                },
                { "id": 2, "title": "Turn", "dependencies": ["1"], "subtasks": [] }
            ]
        }
    }));
    let sync = open(&project).await;

    sync.sync_with_state(&SyncOptions::new("outline")).await.unwrap();

    let tasks = project.read_tasks();
    assert_eq!(
        tasks["outline"]["tasks"][0],
        json!({
            "id": 1,
            "title": "Opening",
            "status": "Done",
            "description": "",
            "details": "",
            "priority": null,
            "dependencies": [],
            "metadata": { "wordCountTarget": "1k", "draftWordCount": 0, "progress": 0 },
            "subtasks": []
        })
    );
    assert_eq!(tasks["outline"]["tasks"][1]["dependencies"], json!(["1"]));
    assert_eq!(tasks["outline"]["tasks"][1]["metadata"], json!({ "draftWordCount": 0 }));
    assert_eq!(summary_json(&project)["statusCounts"]["Done"], json!(1));
}

/// Store that is edited by someone else between the load and the write-back
struct EditedDuringPass {
    inner: MemoryTaskStore,
    loads: AtomicUsize,
}

#[async_trait]
impl TaskGraphStore for EditedDuringPass {
    async fn load_record(&self, tag: &str) -> Result<Option<Value>, StoreError> {
        let mut record = self.inner.load_record(tag).await?;
        if self.loads.fetch_add(1, Ordering::SeqCst) > 0 {
            if let Some(record) = record.as_mut() {
                record["tasks"][0]["details"] = json!("Revised while syncing");
                if let Some(tasks) = record["tasks"].as_array_mut() {
                    tasks.push(json!({ "id": 4, "title": "Coda", "subtasks": [] }));
                }
            }
        }
        Ok(record)
    }

    async fn save_record(&self, tag: &str, record: &Value) -> Result<(), StoreError> {
        self.inner.save_record(tag, record).await
    }

    async fn tags(&self) -> Result<Vec<String>, StoreError> {
        self.inner.tags().await
    }
}

#[tokio::test]
async fn write_back_keeps_concurrent_edits() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(EditedDuringPass {
        inner: MemoryTaskStore::new().with_tag("outline", sample_tag()),
        loads: AtomicUsize::new(0),
    });
    let sync = ManuscriptSynchronizer::new(dir.path(), store.clone());

    let report = sync
        .sync(&SyncOptions::new("outline").with_compile(false), &mut ProgressLedger::new())
        .await
        .unwrap();
    assert_eq!(report.chapters.len(), 3);
    assert_eq!(store.loads.load(Ordering::SeqCst), 2);

    let saved = store.inner.snapshot("outline").unwrap();
    assert_eq!(saved.tasks.len(), 4);
    assert_eq!(saved.tasks[0].details, "Revised while syncing");
    assert_eq!(saved.tasks[3].id, ChapterId(4));
    assert_eq!(saved.tasks[3].metadata, None);

    let meta = saved.tasks[0].metadata.as_ref().unwrap();
    assert_eq!(meta.draft_word_count, Some(0));
    assert_eq!(meta.progress, Some(0));
    assert_eq!(meta.pov, Some(json!("Mara")));
}
