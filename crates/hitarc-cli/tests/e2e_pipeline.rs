//! End-to-end library pipeline: generate, answer, grade, report, compare.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use hitarc_core::banks::ContentBanks;
use hitarc_core::engine::{BatchConfig, BatchEngine, GradingJob, NoopReporter};
use hitarc_core::grader::Grader;
use hitarc_core::model::{AnswerKey, KeyPolicy, SectionCode, TestPlan};
use hitarc_core::plan::{generate_plan, seal_plan, PlanOptions};
use hitarc_core::report::GradeReport;
use hitarc_core::results::{Answer, Response, Submission};
use hitarc_core::statistics::{compute_cohort_stats, VerdictBand};

fn options() -> PlanOptions {
    PlanOptions {
        sections: vec![SectionCode::B, SectionCode::D],
        ..PlanOptions::default()
    }
}

/// Answer every item correctly, or only the first `limit` items.
fn answers(plan: &TestPlan, limit: usize) -> Submission {
    let responses = plan
        .items()
        .take(limit)
        .map(|item| {
            let answer = match &item.answer_key {
                Some(AnswerKey::Numeric { expected, .. }) => Answer::Numeric {
                    value: expected.to_string(),
                },
                Some(AnswerKey::Choice { correct_index }) => Answer::Choice {
                    selected_index: *correct_index,
                },
                other => panic!("unexpected key {other:?}"),
            };
            Response {
                item_id: item.id.clone(),
                answer,
                time_ms: Some(1_500),
            }
        })
        .collect();
    Submission {
        plan_id: Some(plan.id),
        responses,
    }
}

#[test]
fn full_pipeline() {
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    let banks = ContentBanks::builtin().unwrap();
    let plan = generate_plan("pipeline", &options(), &banks, now).unwrap();
    assert_eq!(plan.item_count(), 13);

    // The public view keeps ids so responses line up.
    let public = plan.public_view();
    assert!(public.items().all(|i| i.answer_key.is_none()));
    assert!(public.items().map(|i| &i.id).eq(plan.items().map(|i| &i.id)));

    let grader = Grader::default();
    let perfect = GradeReport::from_grade(grader.grade_plan(&plan, &answers(&plan, usize::MAX)), now);
    assert!((perfect.overall - 1.0).abs() < 1e-9);
    assert_eq!(perfect.verdict, VerdictBand::A);

    let partial = GradeReport::from_grade(grader.grade_plan(&plan, &answers(&plan, 4)), now);
    assert!(partial.overall < perfect.overall);

    let comparison = partial.compare(&perfect, 0.05);
    assert!(comparison.has_regressions());
    assert_eq!(comparison.regressions.len(), 2);
    assert_eq!(comparison.regressions[0].code, SectionCode::B);

    let stats = compute_cohort_stats(&[perfect, partial]);
    assert_eq!(stats.reports, 2);
    // Half of section B was answered in the partial run, none of D.
    assert_eq!(stats.strongest_section, Some(SectionCode::B));
    assert_eq!(stats.weakest_section, Some(SectionCode::D));
}

#[test]
fn sealed_plan_grades_like_plaintext() {
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    let banks = ContentBanks::builtin().unwrap();
    let plan = generate_plan("sealed", &options(), &banks, now).unwrap();
    let submission = answers(&plan, usize::MAX);

    let grader = Grader::default();
    let mut sealed = plan.clone();
    seal_plan(&mut sealed, grader.digest());
    assert_eq!(sealed.key_policy, KeyPolicy::Hashed);

    let plain = grader.grade_plan(&plan, &submission);
    let hashed = grader.grade_plan(&sealed, &submission);
    assert_eq!(plain.overall, hashed.overall);

    // Choice indices typed as numbers fit neither form of the key.
    let mut typed = submission.clone();
    for response in &mut typed.responses {
        if let Answer::Choice { selected_index } = response.answer {
            response.answer = Answer::Numeric {
                value: selected_index.to_string(),
            };
        }
    }
    let plain = grader.grade_plan(&plan, &typed);
    let hashed = grader.grade_plan(&sealed, &typed);
    assert!(plain.overall < 1.0);
    assert_eq!(plain.overall, hashed.overall);
}

#[tokio::test]
async fn batch_grading_matches_sequential() {
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    let banks = Arc::new(ContentBanks::builtin().unwrap());
    let engine = BatchEngine::new(
        Arc::clone(&banks),
        Grader::default(),
        BatchConfig {
            parallelism: 3,
            plan_options: options(),
        },
    );

    let seeds: Vec<String> = (0..6).map(|i| format!("cohort-{i}")).collect();
    let plans = engine
        .generate_plans(&seeds, now, &NoopReporter)
        .await
        .unwrap();
    assert_eq!(plans.results.len(), 6);
    assert!(plans.failures.is_empty());

    let jobs = plans
        .results
        .iter()
        .enumerate()
        .map(|(i, plan)| GradingJob {
            label: plan.seed.clone(),
            plan: Arc::new(plan.clone()),
            submission: answers(plan, i * 2),
        })
        .collect();
    let graded = engine
        .grade_submissions(jobs, now, &NoopReporter)
        .await
        .unwrap();
    assert_eq!(graded.results.len(), 6);

    for report in &graded.results {
        let index = plans
            .results
            .iter()
            .position(|p| p.id == report.plan_id)
            .unwrap();
        let plan = &plans.results[index];
        let sequential = Grader::default().grade_plan(plan, &answers(plan, index * 2));
        assert_eq!(report.overall, sequential.overall);
    }
}
