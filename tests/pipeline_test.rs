mod common;

use catalog_scraper::utils::error::ErrorSeverity;
use catalog_scraper::{
    CatalogPipeline, LocalStorage, OutputConfig, ProductRecord, Result, RunSummary, ScrapeEngine,
    ScrapeTarget,
};
use common::{
    card_html, quiet_profile, FixturePage, FixtureRenderer, Listing, BASE_URL, FIXTURE,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use tempfile::TempDir;

struct Run {
    _temp_dir: TempDir,
    output_dir: PathBuf,
    result: Result<RunSummary>,
    shutdowns: usize,
}

async fn run_with(renderer: FixtureRenderer, min_items: usize, emit_json: bool, emit_csv: bool) -> Run {
    let temp_dir = TempDir::new().unwrap();
    let output_dir = temp_dir.path().join("data");
    let shutdowns = renderer.shutdowns.clone();

    let output = OutputConfig::new(
        output_dir.clone(),
        "gsshop_whisky".to_string(),
        emit_json,
        emit_csv,
    )
    .unwrap();
    let pipeline = CatalogPipeline::new(
        renderer,
        LocalStorage::new(output_dir.clone()),
        ScrapeTarget::new(BASE_URL, min_items),
        output,
        &quiet_profile(),
    )
    .unwrap();

    let result = ScrapeEngine::new(pipeline).run().await;

    Run {
        _temp_dir: temp_dir,
        output_dir,
        result,
        shutdowns: shutdowns.load(Ordering::SeqCst),
    }
}

async fn run(page: FixturePage, min_items: usize) -> Run {
    run_with(FixtureRenderer::new(page), min_items, true, true).await
}

fn files_with_extension(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .map(|e| e.unwrap().path())
                .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(extension))
                .collect()
        })
        .unwrap_or_default();
    files.sort();
    files
}

fn read_json_records(dir: &Path) -> Vec<ProductRecord> {
    let files = files_with_extension(dir, "json");
    assert_eq!(files.len(), 1, "expected exactly one JSON file");
    serde_json::from_slice(&std::fs::read(&files[0]).unwrap()).unwrap()
}

fn names(records: &[ProductRecord]) -> Vec<&str> {
    records.iter().map(|r| r.name.as_str()).collect()
}

fn numbered_cards(codes: &[u32]) -> Vec<String> {
    codes
        .iter()
        .map(|code| card_html(*code, &format!("Whisky {}", code), 10000 + code))
        .collect()
}

#[tokio::test]
async fn test_fixture_page_exports_five_records() {
    let run = run(FixturePage::static_html(FIXTURE), 5).await;

    let summary = run.result.unwrap();
    assert_eq!(summary.records, 5);
    assert_eq!(summary.written.len(), 2);
    assert!(!summary.is_partial());
    assert!(!summary.retries_exhausted);
    assert_eq!(run.shutdowns, 1);

    let records = read_json_records(&run.output_dir);
    assert_eq!(
        names(&records),
        vec![
            "[글렌피딕] 12년 싱글몰트 스카치 위스키 700ml",
            "[맥캘란] 12년 더블 캐스크 700ml",
            "[발베니] 14년 캐리비안 캐스크 700ml",
            "[조니워커] 블루라벨 750ml",
            "[산토리] 히비키 하모니 700ml",
        ]
    );
    let prices: Vec<Option<u64>> = records.iter().map(|r| r.price).collect();
    assert_eq!(
        prices,
        vec![Some(69900), Some(129000), Some(159000), None, Some(198000)]
    );
    assert_eq!(records[0].product_code.as_deref(), Some("1001234567"));
    assert_eq!(
        records[0].product_url,
        "https://www.gsshop.com/prd/prd.gs?prdid=1001234567&lseq=415680"
    );

    let csv_files = files_with_extension(&run.output_dir, "csv");
    assert_eq!(csv_files.len(), 1);
    let csv_text = std::fs::read_to_string(&csv_files[0]).unwrap();
    let mut lines = csv_text.lines();
    assert_eq!(
        lines.next(),
        Some("name,price,product_code,product_url,image_url,metadata")
    );
    assert_eq!(lines.count(), 5);
}

#[tokio::test]
async fn test_output_file_names_are_timestamped() {
    let run = run(FixturePage::static_html(FIXTURE), 5).await;
    let summary = run.result.unwrap();

    let pattern = regex::Regex::new(r"^gsshop_whisky_\d{8}T\d{6}Z\.(json|csv)$").unwrap();
    for path in &summary.written {
        let file_name = path.file_name().unwrap().to_str().unwrap();
        assert!(pattern.is_match(file_name), "unexpected name {}", file_name);
        assert!(path.exists());
    }
}

#[tokio::test]
async fn test_unreachable_target_terminates_with_partial_results() {
    let page = FixturePage::static_html(FIXTURE);
    let run = run(page.clone(), 1000).await;

    let summary = run.result.unwrap();
    assert_eq!(summary.records, 5);
    assert_eq!(summary.requested, 1000);
    assert!(summary.is_partial());
    assert!(summary.retries_exhausted);
    // two stalled rounds exhaust the retry budget
    assert_eq!(page.load_calls(), 2);
    assert_eq!(read_json_records(&run.output_dir).len(), 5);
}

#[tokio::test]
async fn test_load_more_until_target_then_cap() {
    let codes: Vec<u32> = (1..=20).collect();
    let listing = Listing::Incremental {
        total: None,
        page_size: None,
        cards: numbered_cards(&codes),
    };
    let page = FixturePage::new(vec![listing], 5, 5);

    let run = run(page.clone(), 12).await;

    assert_eq!(run.result.unwrap().records, 12);
    assert_eq!(page.load_calls(), 2);

    let records = read_json_records(&run.output_dir);
    assert_eq!(records.first().unwrap().name, "Whisky 1");
    assert_eq!(records.last().unwrap().name, "Whisky 12");
}

#[tokio::test]
async fn test_duplicate_codes_are_dropped() {
    let listing = Listing::Incremental {
        total: None,
        page_size: None,
        cards: numbered_cards(&[1, 2, 2, 3, 1, 4]),
    };
    let page = FixturePage::new(vec![listing], 6, 0);

    let run = run(page, 10).await;

    assert_eq!(run.result.unwrap().records, 4);
    let records = read_json_records(&run.output_dir);
    assert_eq!(
        names(&records),
        vec!["Whisky 1", "Whisky 2", "Whisky 3", "Whisky 4"]
    );
}

#[tokio::test]
async fn test_duplicates_in_first_batch_load_more_cards() {
    let listing = Listing::Incremental {
        total: None,
        page_size: None,
        cards: numbered_cards(&[1, 1, 2, 3, 4, 5, 6]),
    };
    let page = FixturePage::new(vec![listing], 3, 3);

    let run = run(page.clone(), 3).await;

    let summary = run.result.unwrap();
    assert_eq!(summary.records, 3);
    assert!(!summary.is_partial());
    assert_eq!(page.load_calls(), 1);
    let records = read_json_records(&run.output_dir);
    assert_eq!(
        names(&records),
        vec!["Whisky 1", "Whisky 2", "Whisky 3"]
    );
}

#[tokio::test]
async fn test_nameless_cards_load_more_cards() {
    let mut cards = vec![card_html(1, "", 10001), card_html(2, "", 10002)];
    cards.extend(numbered_cards(&[3, 4, 5, 6]));
    let listing = Listing::Incremental {
        total: None,
        page_size: None,
        cards,
    };
    let page = FixturePage::new(vec![listing], 2, 2);

    let run = run(page, 2).await;

    assert_eq!(run.result.unwrap().records, 2);
    let records = read_json_records(&run.output_dir);
    assert_eq!(names(&records), vec!["Whisky 3", "Whisky 4"]);
}

#[tokio::test]
async fn test_pagination_collects_following_pages() {
    let listings = vec![
        Listing::Incremental {
            total: Some(6),
            page_size: Some(3),
            cards: numbered_cards(&[1, 2, 3]),
        },
        Listing::Incremental {
            total: Some(6),
            page_size: Some(3),
            cards: numbered_cards(&[4, 5, 6]),
        },
    ];
    let page = FixturePage::new(listings, 3, 0);

    let run = run(page.clone(), 6).await;

    assert_eq!(run.result.unwrap().records, 6);
    assert_eq!(page.load_calls(), 0);
    let records = read_json_records(&run.output_dir);
    assert_eq!(records[3].product_code.as_deref(), Some("4"));
}

#[tokio::test]
async fn test_pagination_stops_at_last_page() {
    let listing = |codes: &[u32]| Listing::Incremental {
        total: Some(6),
        page_size: Some(3),
        cards: numbered_cards(codes),
    };
    let page = FixturePage::new(
        vec![listing(&[1, 2, 3]), listing(&[4, 5, 6]), listing(&[7, 8, 9])],
        3,
        0,
    );

    let run = run(page, 100).await;

    assert_eq!(run.result.unwrap().records, 6);
}

#[tokio::test]
async fn test_failed_page_navigation_keeps_collected_records() {
    let listing = |codes: &[u32]| Listing::Incremental {
        total: Some(6),
        page_size: Some(3),
        cards: numbered_cards(codes),
    };
    let page = FixturePage::new(vec![listing(&[1, 2, 3]), listing(&[4, 5, 6])], 3, 0)
        .failing_goto_from(2);

    let run = run(page, 6).await;

    assert_eq!(run.result.unwrap().records, 3);
    assert_eq!(read_json_records(&run.output_dir).len(), 3);
}

#[tokio::test]
async fn test_navigation_failure_is_fatal() {
    let renderer = FixtureRenderer::failing(FixturePage::static_html(FIXTURE));
    let run = run_with(renderer, 5, true, true).await;

    let err = run.result.unwrap_err();
    assert_eq!(err.severity(), ErrorSeverity::Critical);
    assert_ne!(err.exit_code(), 0);
    assert_eq!(run.shutdowns, 1);
    assert!(files_with_extension(&run.output_dir, "json").is_empty());
    assert!(files_with_extension(&run.output_dir, "csv").is_empty());
}

#[tokio::test]
async fn test_json_only_output() {
    let renderer = FixtureRenderer::new(FixturePage::static_html(FIXTURE));
    let run = run_with(renderer, 5, true, false).await;

    let summary = run.result.unwrap();
    assert_eq!(summary.written.len(), 1);
    assert!(files_with_extension(&run.output_dir, "csv").is_empty());
    assert_eq!(read_json_records(&run.output_dir).len(), 5);
}
