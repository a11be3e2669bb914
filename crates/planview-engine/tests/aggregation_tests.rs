use chrono::{TimeZone, Utc};
use planview_engine::*;
use planview_types::{PointState, ResultEntity, TestOutcome};
use std::time::Duration;

fn entity(test_id: i32, suite_id: i32, outcome: TestOutcome, day: u32) -> ResultEntity {
    let mut e = ResultEntity::new("Login", suite_id, test_id, "Root", "");
    e.outcome = outcome;
    e.state = PointState::Completed;
    e.completed = Some(Utc.with_ymd_and_hms(2024, 1, day, 9, 30, 0).unwrap());
    e.exists = true;
    e.priority = 1;
    e.test_case_area = "Product".to_string();
    e
}

fn mixed_plan() -> Vec<ResultEntity> {
    let mut running = entity(4, 1, TestOutcome::Failed, 3);
    running.state = PointState::Ready;
    let mut never = ResultEntity::new("Never", 2, 6, "Root", "");
    never.outcome = TestOutcome::Unspecified;

    vec![
        entity(1, 1, TestOutcome::Passed, 1),
        entity(1, 2, TestOutcome::Failed, 2),
        entity(2, 1, TestOutcome::Blocked, 1),
        entity(3, 1, TestOutcome::NotExecuted, 1),
        entity(3, 2, TestOutcome::Aborted, 4),
        running,
        entity(5, 1, TestOutcome::None, 2),
        never,
        entity(7, 1, TestOutcome::Inconclusive, 5),
        entity(8, 3, TestOutcome::Warning, 5),
        ResultEntity::suite_placeholder(1, "Root"),
    ]
}

fn partition_sum(results: &AllResults<'_>, latest_only: bool) -> usize {
    let tracked: usize = TestOutcome::TRACKED
        .iter()
        .map(|outcome| results.outcome_count(*outcome, latest_only))
        .sum();
    tracked + results.other_count(latest_only) + results.active_count(latest_only)
}

#[test]
fn test_counts_cover_every_entity_exactly_once() {
    let plan = mixed_plan();
    let results: AllResults = plan.iter().collect();

    assert_eq!(results.count(), 10);
    assert_eq!(results.non_dup_count(), 8);
    assert_eq!(partition_sum(&results, false), results.count());
    assert_eq!(partition_sum(&results, true), results.non_dup_count());
}

#[test]
fn test_one_primary_per_test_id() {
    let plan = mixed_plan();
    let results: AllResults = plan.iter().collect();

    let primaries: Vec<&ResultEntity> = results
        .types_and_results()
        .filter(|(primary, _)| *primary)
        .map(|(_, e)| e)
        .collect();
    let duplicates = results.types_and_results().filter(|(p, _)| !*p).count();

    assert_eq!(primaries.len(), results.non_dup_count());
    assert_eq!(duplicates, results.count() - results.non_dup_count());

    for primary in primaries {
        let group_max = plan
            .iter()
            .filter(|e| e.test_id == primary.test_id && !e.is_placeholder())
            .max_by(|a, b| a.cmp_recency(b))
            .unwrap();
        assert_eq!(group_max.recency_key(), primary.recency_key());
    }
}

#[test]
fn test_latest_only_counts_primaries() {
    let plan = mixed_plan();
    let results: AllResults = plan.iter().collect();

    // Test 1 failed most recently in suite 2.
    assert_eq!(results.outcome_count(TestOutcome::Passed, true), 0);
    assert_eq!(results.outcome_count(TestOutcome::Passed, false), 1);
    assert_eq!(results.outcome_count(TestOutcome::Failed, true), 1);

    // Test 3 was aborted after it was skipped: both are "other", one per id.
    assert_eq!(results.other_count(false), 3);
    assert_eq!(results.other_count(true), 2);
    assert_eq!(results.active_count(true), 1);
}

#[test]
fn test_breakdown_snapshot() {
    let plan = mixed_plan();
    let results: AllResults = plan.iter().collect();

    insta::assert_json_snapshot!(results.breakdown(true), @r#"
    {
      "passed": 0,
      "failed": 1,
      "blocked": 1,
      "queued": 1,
      "inconclusive": 1,
      "never_executed": 1,
      "active": 1,
      "other": 2,
      "not_executed": 0,
      "total": 8
    }
    "#);
}

#[test]
fn test_export_marks_duplicates() {
    let mut newer = entity(5, 2, TestOutcome::Failed, 2);
    newer.area = "Root\\Auth".to_string();
    newer.is_automated = true;
    newer.duration = Duration::from_secs(75);
    newer.error_message = "line1\r\nline2".to_string();
    newer.historic_outcomes = vec![TestOutcome::Failed, TestOutcome::Passed];
    let mut older = entity(5, 1, TestOutcome::Passed, 1);
    older.historic_outcomes = vec![TestOutcome::Passed];

    let results: AllResults = [&older, &newer].into_iter().collect();
    let rows = result_rows(&results);

    let mut buffer = Vec::new();
    let written = write_results(&rows, &mut buffer, ExportDelimiter::Tsv).unwrap();
    assert_eq!(written, 2);

    let text = String::from_utf8(buffer).unwrap();
    let expected = [
        "Outcome\tName\tArea\tIsAutomated\tCurrentlyExists\tID\tPriority\tCompleted\tDuration\tTestCaseArea\tFailureType\tErrorMessage\tPrimary\tState\tRecent History (*most recent first)",
        "Failed\tLogin\tRoot\\Auth\ttrue\ttrue\t5\t1\t2024/01/02\t0:01:15\tProduct\t\tline1  line2\ttrue\tCompleted\tFailed Passed",
        "Passed\tLogin\tRoot\tfalse\ttrue\t5\t1\t2024/01/01\tNA\tProduct\t\t\tfalse\tCompleted\tPassed",
        "",
    ]
    .join("\n");
    assert_eq!(text, expected);
}

#[test]
fn test_csv_export_quotes_commas() {
    let mut e = entity(9, 1, TestOutcome::Passed, 1);
    e.name = "Login, then logout".to_string();
    let results: AllResults = [&e].into_iter().collect();

    let mut buffer = Vec::new();
    write_results(&result_rows(&results), &mut buffer, ExportDelimiter::Csv).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    assert!(text.lines().nth(1).unwrap().starts_with("Passed,\"Login, then logout\",Root,"));
}
