use std::str::FromStr;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use cron::Schedule;

use mailcraft_mailer::domain::types::{CampaignStatus, ScheduleChoice};
use mailcraft_mailer::error::MailerError;
use mailcraft_mailer::scheduler::{CampaignScheduler, Trigger};
use mailcraft_mailer::usecase::assist::AssistUseCase;
use mailcraft_mailer::usecase::campaign::{
    CreateCampaignInput, CreateCampaignUseCase, FireCampaignUseCase, ListCampaignsUseCase,
    ScheduleCampaignUseCase,
};

use crate::helpers::{
    MockCampaignRepo, MockCompletion, MockMailProvider, MockRecipientRepo, test_campaign,
};

fn scheduler() -> CampaignScheduler {
    let weekly = Schedule::from_str("0 0 9 * * Mon *").unwrap();
    CampaignScheduler::new(StdDuration::from_secs(30), weekly)
}

fn input(schedule: Option<ScheduleChoice>) -> CreateCampaignInput {
    CreateCampaignInput {
        name: "Launch".to_owned(),
        subject: "We are live".to_owned(),
        body: Some("Come and see".to_owned()),
        prompt: None,
        schedule,
    }
}

fn create_usecase(
    campaigns: MockCampaignRepo,
    completion: MockCompletion,
    scheduler: CampaignScheduler,
) -> CreateCampaignUseCase<MockCampaignRepo, MockCompletion> {
    CreateCampaignUseCase {
        campaigns,
        assist: AssistUseCase { completion },
        scheduler,
    }
}

// ── Create ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_schedule_once_campaign_days_ahead() {
    let campaigns = MockCampaignRepo::default();
    let scheduler = scheduler();
    let usecase = create_usecase(
        campaigns.clone(),
        MockCompletion::replying("unused"),
        scheduler.clone(),
    );
    let now = Utc::now();

    let created = usecase
        .execute(input(Some(ScheduleChoice::Once { days: 2 })), "grant-1", now)
        .await
        .unwrap();

    assert_eq!(created.campaign.status, CampaignStatus::Scheduled);
    let at = created.campaign.scheduled_at.unwrap();
    assert!((at - (now + Duration::days(2))).num_seconds().abs() <= 1);

    let job = created.job.unwrap();
    assert!(matches!(job.trigger, Trigger::Once));
    assert_eq!(job.next_run_at, Some(at));
    assert_eq!(job.grant_id, "grant-1");
    assert!(scheduler.get(created.campaign.id).await.is_some());
}

#[tokio::test]
async fn should_register_recurring_campaign_on_next_occurrence() {
    let scheduler = scheduler();
    let usecase = create_usecase(
        MockCampaignRepo::default(),
        MockCompletion::replying("unused"),
        scheduler.clone(),
    );
    let now = Utc::now();

    let created = usecase
        .execute(input(Some(ScheduleChoice::Recurring)), "grant-1", now)
        .await
        .unwrap();

    assert_eq!(created.campaign.status, CampaignStatus::Recurring);
    assert_eq!(created.campaign.scheduled_at, None);
    let job = created.job.unwrap();
    assert!(job.is_recurring());
    assert!(job.next_run_at.unwrap() > now);
}

#[tokio::test]
async fn should_store_draft_without_job() {
    let scheduler = scheduler();
    let usecase = create_usecase(
        MockCampaignRepo::default(),
        MockCompletion::replying("unused"),
        scheduler.clone(),
    );

    let created = usecase.execute(input(None), "grant-1", Utc::now()).await.unwrap();

    assert_eq!(created.campaign.status, CampaignStatus::Draft);
    assert!(created.job.is_none());
    assert!(scheduler.jobs().await.is_empty());
}

#[tokio::test]
async fn should_generate_body_from_prompt_when_body_missing() {
    let campaigns = MockCampaignRepo::default();
    let completion = MockCompletion::replying("  Fresh spring deals inside!  ");
    let usecase = create_usecase(campaigns.clone(), completion.clone(), scheduler());

    let created = usecase
        .execute(
            CreateCampaignInput {
                body: None,
                prompt: Some("spring sale".to_owned()),
                ..input(None)
            },
            "grant-1",
            Utc::now(),
        )
        .await
        .unwrap();

    assert_eq!(created.campaign.body, "Fresh spring deals inside!");
    assert_eq!(completion.requests().len(), 1);
}

#[tokio::test]
async fn should_reject_campaign_without_body_or_prompt() {
    let campaigns = MockCampaignRepo::default();
    let usecase = create_usecase(
        campaigns.clone(),
        MockCompletion::replying("unused"),
        scheduler(),
    );

    let result = usecase
        .execute(
            CreateCampaignInput {
                body: Some("   ".to_owned()),
                ..input(None)
            },
            "grant-1",
            Utc::now(),
        )
        .await;

    assert!(matches!(result, Err(MailerError::MissingField("body"))));
    assert!(campaigns.campaigns.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_reject_blank_name() {
    let usecase = create_usecase(
        MockCampaignRepo::default(),
        MockCompletion::replying("unused"),
        scheduler(),
    );

    let result = usecase
        .execute(
            CreateCampaignInput {
                name: " ".to_owned(),
                ..input(None)
            },
            "grant-1",
            Utc::now(),
        )
        .await;

    assert!(matches!(result, Err(MailerError::MissingField("name"))));
}

// ── Schedule / list ──────────────────────────────────────────────────────────

#[tokio::test]
async fn should_reschedule_existing_campaign_under_new_grant() {
    let at = Utc::now() + Duration::hours(5);
    let campaigns = MockCampaignRepo::with(vec![test_campaign(
        1,
        CampaignStatus::Scheduled,
        Some(at),
    )]);
    let scheduler = scheduler();
    let usecase = ScheduleCampaignUseCase {
        campaigns,
        scheduler: scheduler.clone(),
    };

    usecase.execute(1, "grant-old", Utc::now()).await.unwrap();
    let job = usecase.execute(1, "grant-new", Utc::now()).await.unwrap();

    assert_eq!(job.grant_id, "grant-new");
    assert_eq!(scheduler.jobs().await.len(), 1);
    assert_eq!(scheduler.get(1).await.unwrap().grant_id, "grant-new");
}

#[tokio::test]
async fn should_refuse_to_schedule_draft_sent_or_unknown_campaign() {
    let campaigns = MockCampaignRepo::with(vec![
        test_campaign(1, CampaignStatus::Draft, None),
        test_campaign(2, CampaignStatus::Sent, None),
    ]);
    let usecase = ScheduleCampaignUseCase {
        campaigns,
        scheduler: scheduler(),
    };

    assert!(matches!(
        usecase.execute(1, "g", Utc::now()).await,
        Err(MailerError::InvalidSchedule(_))
    ));
    assert!(matches!(
        usecase.execute(2, "g", Utc::now()).await,
        Err(MailerError::CampaignAlreadySent)
    ));
    assert!(matches!(
        usecase.execute(9, "g", Utc::now()).await,
        Err(MailerError::CampaignNotFound)
    ));
}

#[tokio::test]
async fn should_list_campaigns_with_their_jobs() {
    let campaigns = MockCampaignRepo::with(vec![
        test_campaign(1, CampaignStatus::Draft, None),
        test_campaign(2, CampaignStatus::Recurring, None),
    ]);
    let scheduler = scheduler();
    ScheduleCampaignUseCase {
        campaigns: campaigns.clone(),
        scheduler: scheduler.clone(),
    }
    .execute(2, "grant-1", Utc::now())
    .await
    .unwrap();

    let listed = ListCampaignsUseCase {
        campaigns,
        scheduler,
    }
    .execute()
    .await
    .unwrap();

    assert_eq!(listed.len(), 2);
    let (recurring, job) = listed.iter().find(|(c, _)| c.id == 2).unwrap();
    assert_eq!(recurring.status, CampaignStatus::Recurring);
    assert!(job.as_ref().is_some_and(|j| j.is_recurring()));
    let (_, draft_job) = listed.iter().find(|(c, _)| c.id == 1).unwrap();
    assert!(draft_job.is_none());
}

// ── Fire ─────────────────────────────────────────────────────────────────────

fn recipients() -> MockRecipientRepo {
    MockRecipientRepo::with(&[
        ("Ada", "ada@example.com"),
        ("Grace", "grace@example.com"),
        ("Linus", "linus@example.com"),
    ])
}

#[tokio::test]
async fn should_send_to_every_recipient_and_mark_sent() {
    let campaigns = MockCampaignRepo::with(vec![test_campaign(
        1,
        CampaignStatus::Scheduled,
        Some(Utc::now()),
    )]);
    let provider = MockMailProvider::failing_for(&["grace@example.com"]);
    let usecase = FireCampaignUseCase {
        campaigns: campaigns.clone(),
        recipients: recipients(),
        provider: provider.clone(),
        sender: None,
    };

    let report = usecase.execute(1, "grant-1").await.unwrap();

    assert_eq!(report.attempted, 3);
    assert_eq!(report.failed, 1);
    assert!(!report.skipped);
    assert_eq!(provider.call_count(), 3);
    assert_eq!(campaigns.status_of(1), Some(CampaignStatus::Sent));

    let sent: Vec<String> = provider
        .sent_messages()
        .into_iter()
        .map(|m| m.to[0].email.clone())
        .collect();
    assert_eq!(sent, ["ada@example.com", "linus@example.com"]);
}

#[tokio::test]
async fn should_keep_recurring_status_after_firing() {
    let campaigns = MockCampaignRepo::with(vec![test_campaign(
        1,
        CampaignStatus::Recurring,
        None,
    )]);
    let provider = MockMailProvider::default();
    let usecase = FireCampaignUseCase {
        campaigns: campaigns.clone(),
        recipients: recipients(),
        provider: provider.clone(),
        sender: None,
    };

    let report = usecase.execute(1, "grant-1").await.unwrap();

    assert_eq!(report.attempted, 3);
    assert_eq!(report.failed, 0);
    assert_eq!(campaigns.status_of(1), Some(CampaignStatus::Recurring));
}

#[tokio::test]
async fn should_resend_recurring_campaign_on_every_fire() {
    let campaigns = MockCampaignRepo::with(vec![test_campaign(
        1,
        CampaignStatus::Recurring,
        None,
    )]);
    let provider = MockMailProvider::default();
    let usecase = FireCampaignUseCase {
        campaigns: campaigns.clone(),
        recipients: recipients(),
        provider: provider.clone(),
        sender: None,
    };

    usecase.execute(1, "grant-1").await.unwrap();
    usecase.execute(1, "grant-1").await.unwrap();

    let mut sent: Vec<String> = provider
        .sent_messages()
        .into_iter()
        .map(|m| m.to[0].email.clone())
        .collect();
    sent.sort();
    assert_eq!(
        sent,
        [
            "ada@example.com",
            "ada@example.com",
            "grace@example.com",
            "grace@example.com",
            "linus@example.com",
            "linus@example.com",
        ]
    );
    assert_eq!(campaigns.status_of(1), Some(CampaignStatus::Recurring));
}

#[tokio::test]
async fn should_skip_campaign_already_sent() {
    let campaigns = MockCampaignRepo::with(vec![test_campaign(1, CampaignStatus::Sent, None)]);
    let provider = MockMailProvider::default();
    let usecase = FireCampaignUseCase {
        campaigns,
        recipients: recipients(),
        provider: provider.clone(),
        sender: None,
    };

    let report = usecase.execute(1, "grant-1").await.unwrap();

    assert!(report.skipped);
    assert_eq!(report.attempted, 0);
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn should_mark_sent_even_with_no_recipients() {
    let campaigns = MockCampaignRepo::with(vec![test_campaign(
        1,
        CampaignStatus::Scheduled,
        Some(Utc::now()),
    )]);
    let usecase = FireCampaignUseCase {
        campaigns: campaigns.clone(),
        recipients: MockRecipientRepo::default(),
        provider: MockMailProvider::default(),
        sender: None,
    };

    let report = usecase.execute(1, "grant-1").await.unwrap();

    assert_eq!(report.attempted, 0);
    assert_eq!(campaigns.status_of(1), Some(CampaignStatus::Sent));
}

#[tokio::test]
async fn should_fire_due_job_through_scheduler() {
    let campaigns = MockCampaignRepo::with(vec![test_campaign(
        1,
        CampaignStatus::Scheduled,
        Some(Utc::now() - Duration::minutes(1)),
    )]);
    let provider = MockMailProvider::default();
    let scheduler = scheduler();
    ScheduleCampaignUseCase {
        campaigns: campaigns.clone(),
        scheduler: scheduler.clone(),
    }
    .execute(1, "grant-1", Utc::now())
    .await
    .unwrap();

    let handler = FireCampaignUseCase {
        campaigns: campaigns.clone(),
        recipients: recipients(),
        provider: provider.clone(),
        sender: None,
    };
    let cancel = tokio_util::sync::CancellationToken::new();
    scheduler.run_due(&handler, Utc::now(), &cancel).await;

    assert_eq!(provider.sent_messages().len(), 3);
    assert_eq!(campaigns.status_of(1), Some(CampaignStatus::Sent));
    assert!(scheduler.get(1).await.is_none());
}

#[tokio::test]
async fn should_resend_recurring_campaign_each_time_the_job_comes_due() {
    let campaigns = MockCampaignRepo::with(vec![test_campaign(
        1,
        CampaignStatus::Recurring,
        None,
    )]);
    let provider = MockMailProvider::default();
    let scheduler = scheduler();
    ScheduleCampaignUseCase {
        campaigns: campaigns.clone(),
        scheduler: scheduler.clone(),
    }
    .execute(1, "grant-1", Utc::now())
    .await
    .unwrap();

    let handler = FireCampaignUseCase {
        campaigns: campaigns.clone(),
        recipients: recipients(),
        provider: provider.clone(),
        sender: None,
    };
    let cancel = tokio_util::sync::CancellationToken::new();
    for _ in 0..2 {
        let due_at = scheduler.get(1).await.unwrap().next_run_at.unwrap();
        assert_eq!(scheduler.run_due(&handler, due_at, &cancel).await, 1);
    }

    assert_eq!(provider.sent_messages().len(), 6);
    assert_eq!(campaigns.status_of(1), Some(CampaignStatus::Recurring));
    assert!(scheduler.get(1).await.unwrap().is_recurring());
}
