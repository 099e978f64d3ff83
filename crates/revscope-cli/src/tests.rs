use super::*;

use chrono::NaiveDate;
use revscope_core::NormalizedRecord;
use revscope_processing::REPORT_FILE_NAME;

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("revscope-cli-{tag}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["revscope-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_crawl_with_defaults() {
    let cli = Cli::try_parse_from([
        "revscope-cli",
        "crawl",
        "--capture",
        "feed.json",
        "--site",
        "kakao",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Crawl {
            site: ReviewSite::Kakao,
            target: None,
            page_size: 20,
            no_end_signal: false,
            output_dir: None,
            ..
        })
    ));
}

#[test]
fn parses_crawl_overrides() {
    let cli = Cli::try_parse_from([
        "revscope-cli",
        "crawl",
        "--capture",
        "feed.json",
        "--site",
        "google",
        "--target",
        "50",
        "--page-size",
        "5",
        "--no-end-signal",
        "--output-dir",
        "out",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Crawl {
            site: ReviewSite::Google,
            target: Some(50),
            page_size: 5,
            no_end_signal: true,
            output_dir: Some(ref dir),
            ..
        }) if dir == &PathBuf::from("out")
    ));
}

#[test]
fn crawl_rejects_unknown_site() {
    let result = Cli::try_parse_from([
        "revscope-cli",
        "crawl",
        "--capture",
        "feed.json",
        "--site",
        "yelp",
    ]);
    assert!(result.is_err());
}

#[test]
fn parses_process_command() {
    let cli = Cli::try_parse_from([
        "revscope-cli",
        "process",
        "--site",
        "tripdotcom",
        "--input",
        "reviews_tripdotcom.csv",
        "--no-embeddings",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Process {
            site: ReviewSite::Tripdotcom,
            no_embeddings: true,
            sites_config: None,
            ..
        })
    ));
}

#[test]
fn process_requires_input() {
    let result = Cli::try_parse_from(["revscope-cli", "process", "--site", "google"]);
    assert!(result.is_err());
}

#[test]
fn parses_eda_chart_list() {
    let cli = Cli::try_parse_from([
        "revscope-cli",
        "eda",
        "a.csv",
        "b.csv",
        "--charts",
        "rating,weekday",
    ])
    .expect("expected valid cli args");

    let Some(Commands::Eda {
        inputs,
        charts,
        embeddings,
        ..
    }) = cli.command
    else {
        panic!("expected eda command");
    };
    assert_eq!(inputs.len(), 2);
    assert!(!embeddings);
    assert_eq!(
        charts,
        Some(vec![
            TableChart::RatingDistribution,
            TableChart::ReviewsByWeekday
        ])
    );
}

#[test]
fn eda_requires_an_input() {
    assert!(Cli::try_parse_from(["revscope-cli", "eda"]).is_err());
}

#[test]
fn eda_options_keep_defaults_without_flags() {
    let options = eda::build_options(None, None);
    assert_eq!(options.charts, TableChart::ALL.to_vec());

    let options = eda::build_options(Some(vec![TableChart::ReviewsByMonth]), Some("plots".into()));
    assert_eq!(options.charts, vec![TableChart::ReviewsByMonth]);
    assert_eq!(options.output_dir, PathBuf::from("plots"));
}

#[test]
fn eda_fails_only_when_no_input_exists() {
    let dir = temp_dir("eda");
    let options = eda::build_options(None, Some(dir.join("plot")));

    let missing = vec![dir.join("missing-a.csv"), dir.join("missing-b.csv")];
    assert!(eda::run_eda(&missing, false, &options).is_err());

    let table = dir.join("preprocessed_reviews.csv");
    std::fs::write(
        &table,
        "rating,date,content,content_length,is_positive\n5,2024-05-01,good,4,1\n2,2024-05-02,bad,3,0\n",
    )
    .expect("write table");
    let mixed = vec![dir.join("missing-a.csv"), table];
    assert!(eda::run_eda(&mixed, false, &options).is_ok());
    assert!(dir
        .join("plot")
        .join("preprocessed_reviews_rating_distribution.csv")
        .exists());
    assert!(dir
        .join("plot")
        .join("preprocessed_reviews_rating_distribution.png")
        .exists());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn eda_embeddings_compare_all_inputs_together() {
    let dir = temp_dir("eda-emb");
    let options = eda::build_options(None, Some(dir.join("plot")));
    let google = dir.join("google_tfidf.csv");
    let kakao = dir.join("kakao_tfidf.csv");
    std::fs::write(&google, "good,view\n0.5,0.5\n1,0\n").expect("write google");
    std::fs::write(&kakao, "good,clean\n1,0\n").expect("write kakao");

    let inputs = vec![google, dir.join("missing.csv"), kakao];
    assert!(eda::run_eda(&inputs, true, &options).is_ok());

    let report = std::fs::read_to_string(dir.join("plot").join(REPORT_FILE_NAME))
        .expect("read report");
    assert!(report.contains("[google_tfidf] vs [kakao_tfidf]\n"));
    assert!(report.contains("  - intersection: 1\n"));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn raw_rows_use_output_formatting() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 9).expect("valid date");
    let records = vec![
        NormalizedRecord::from_validated(5.0, date, "great view".to_string()),
        NormalizedRecord::from_validated(4.5, date, "nice".to_string()),
    ];

    let rows = crawl::raw_rows(&records);
    assert_eq!(crawl::RAW_HEADERS, ["rating", "date", "content"]);
    assert_eq!(rows[0], ["5".to_string(), "2024-03-09".to_string(), "great view".to_string()]);
    assert_eq!(rows[1][0], "4.5");
}

#[test]
fn profile_falls_back_to_built_in() {
    let profile = process::resolve_profile(ReviewSite::Kakao, None).expect("profile");
    assert_eq!(profile, ReviewSite::Kakao.default_profile());

    let dir = temp_dir("sites");
    let path = dir.join("sites.yaml");
    std::fs::write(&path, "sites:\n  - site: google\n    content_column: review_text\n")
        .expect("write sites file");

    let google = process::resolve_profile(ReviewSite::Google, Some(&path)).expect("profile");
    assert_eq!(google.columns.content, "review_text");
    let trip = process::resolve_profile(ReviewSite::Tripdotcom, Some(&path)).expect("profile");
    assert_eq!(trip, ReviewSite::Tripdotcom.default_profile());

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn crawl_writes_raw_table() {
    let dir = temp_dir("crawl");
    let capture = dir.join("capture.json");
    std::fs::write(
        &capture,
        r#"[
            {"rating": "5", "date": "2024-05-01", "content": "amazing food"},
            {"rating": "5", "date": "2024-05-01", "content": "amazing food"},
            {"rating": "9", "date": "2024-05-02", "content": "out of range"},
            {"rating": 4, "date": "2024.05.03", "content": "good service"}
        ]"#,
    )
    .expect("write capture");

    let options = crawl::CrawlOptions {
        capture,
        site: ReviewSite::Kakao,
        page_size: 2,
        end_signal: true,
    };
    let crawl_config = revscope_core::CrawlConfig {
        poll_timeout: std::time::Duration::from_millis(50),
        poll_interval: std::time::Duration::from_millis(1),
        ..revscope_core::CrawlConfig::default()
    };
    let pipeline = revscope_core::PipelineConfig {
        output_dir: dir.join("out"),
        ..revscope_core::PipelineConfig::default()
    };

    crawl::run_crawl(&options, &crawl_config, &pipeline)
        .await
        .expect("crawl succeeds");

    let table = revscope_processing::read_table(&dir.join("out").join("reviews_kakao.csv"))
        .expect("read raw table");
    assert_eq!(table.headers(), ["rating", "date", "content"]);
    assert_eq!(table.len(), 2);

    std::fs::remove_dir_all(&dir).ok();
}
