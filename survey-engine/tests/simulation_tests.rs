//! Synthetic deliveries through the real persistence paths

mod common;

use common::*;
use rand::RngCore;
use sqlx::SqlitePool;
use survey_common::db::connect_in_memory;
use survey_common::Error;
use survey_engine::config::IngestionPolicy;
use survey_engine::orchestrator::ingest;
use survey_engine::simulation::{
    rng_from_seed, simulate_batch, simulate_survey, FreeTextSource, SimulationRequest, TemplateText,
};

struct FixedText;

impl FreeTextSource for FixedText {
    fn answer(&self, _question_text: &str, _rng: &mut dyn RngCore) -> String {
        "fixed answer".to_string()
    }
}

async fn setup() -> (SqlitePool, String) {
    let pool = connect_in_memory().await.unwrap();
    ingest(&pool, &IngestionPolicy::default(), &[standard_unit("acme", "Spring")])
        .await
        .unwrap();
    let s1 = survey_id(&pool, "acme", "S1").await;
    (pool, s1)
}

#[tokio::test]
async fn test_simulation_creates_completed_deliveries() {
    let (pool, s1) = setup().await;
    let mut rng = rng_from_seed(Some(11));

    let report = simulate_survey(&pool, "acme", &s1, 8, &mut rng, &TemplateText)
        .await
        .unwrap();

    assert_eq!(report.survey_id, s1);
    assert_eq!(report.deliveries_created, 8);
    // Per delivery: 1-2 multi-select rows, 1 single-select row, 3 free-text rows
    assert!(report.responses_created >= 8 * 5);
    assert!(report.responses_created <= 8 * 6);

    assert_eq!(count(&pool, "recipients").await, 8);
    assert_eq!(count(&pool, "responses").await, report.responses_created as i64);
    let open: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM deliveries WHERE responded_at IS NULL")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(open, 0);
}

#[tokio::test]
async fn test_repeated_simulation_never_reuses_contacts() {
    let (pool, s1) = setup().await;
    let mut rng = rng_from_seed(Some(5));
    simulate_survey(&pool, "acme", &s1, 10, &mut rng, &TemplateText)
        .await
        .unwrap();

    // Same seed again replays the same candidates, all of which are taken
    let mut replay = rng_from_seed(Some(5));
    simulate_survey(&pool, "acme", &s1, 10, &mut replay, &TemplateText)
        .await
        .unwrap();

    assert_eq!(count(&pool, "recipients").await, 20);
    let distinct_phones: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT phone) FROM recipients")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(distinct_phones, 20);
}

#[tokio::test]
async fn test_free_text_comes_from_source() {
    let (pool, s1) = setup().await;
    let mut rng = rng_from_seed(Some(2));

    simulate_survey(&pool, "acme", &s1, 2, &mut rng, &FixedText)
        .await
        .unwrap();

    let texts: Vec<String> =
        sqlx::query_scalar("SELECT DISTINCT free_text FROM responses WHERE free_text IS NOT NULL")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(texts, vec!["fixed answer".to_string()]);
}

#[tokio::test]
async fn test_simulation_limits_and_ownership() {
    let (pool, s1) = setup().await;
    let mut rng = rng_from_seed(Some(1));

    let zero = simulate_survey(&pool, "acme", &s1, 0, &mut rng, &TemplateText).await;
    assert!(matches!(zero, Err(Error::InvalidInput(_))));

    let too_many = simulate_survey(&pool, "acme", &s1, 501, &mut rng, &TemplateText).await;
    assert!(matches!(too_many, Err(Error::InvalidInput(_))));

    let foreign = simulate_survey(&pool, "intruder", &s1, 1, &mut rng, &TemplateText).await;
    assert!(matches!(foreign, Err(Error::Forbidden(_))));

    assert_eq!(count(&pool, "deliveries").await, 0);
}

#[tokio::test]
async fn test_batch_isolates_failing_surveys() {
    let (pool, s1) = setup().await;
    let s2 = survey_id(&pool, "acme", "S2").await;
    let mut rng = rng_from_seed(Some(9));

    let requests = vec![
        SimulationRequest {
            survey_id: s1.clone(),
            recipients: 2,
        },
        SimulationRequest {
            survey_id: "missing".to_string(),
            recipients: 2,
        },
        SimulationRequest {
            survey_id: s2.clone(),
            recipients: 3,
        },
    ];
    let report = simulate_batch(&pool, "acme", &requests, &mut rng, &TemplateText).await;

    assert_eq!(report.processed_count, 3);
    let statuses: Vec<&str> = report.results.iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec!["success", "failed", "success"]);
    assert!(report.results[1].error.is_some());
    assert_eq!(report.results[2].report.as_ref().unwrap().deliveries_created, 3);
    assert_eq!(count(&pool, "deliveries").await, 5);
}
