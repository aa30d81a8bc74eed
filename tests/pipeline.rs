// tests/pipeline.rs
// Fluxos completos do funil sobre o armazenamento em memória.

use std::{collections::BTreeSet, sync::Arc};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use sales_pipeline::{
    common::error::{AppError, ErrorKind},
    db::MemoryDatabase,
    models::{
        activity::{ActivityType, NewActivity, OwnerRef},
        deal::{DealChanges, DealStage, NewDeal},
        lead::{LeadChanges, LeadSource, LeadStatus, NewLead},
        proposal::{NewProposal, ProposalChanges, ProposalStatus},
    },
    services::{PipelineService, TxSettings},
};

fn pipeline() -> PipelineService {
    PipelineService::new(Arc::new(MemoryDatabase::new()), TxSettings::default())
}

fn lead(name: &str) -> NewLead {
    NewLead {
        name: Some(name.to_string()),
        source: Some(LeadSource::Website),
        status: Some(LeadStatus::New),
        ..Default::default()
    }
}

fn deal(title: &str, lead_ids: Vec<Uuid>) -> NewDeal {
    NewDeal {
        title: Some(title.to_string()),
        stage: Some(DealStage::Prospecting),
        value: Some(Decimal::from(48_000)),
        expected_close_date: NaiveDate::from_ymd_opt(2026, 12, 15),
        lead_ids,
        ..Default::default()
    }
}

fn proposal(title: &str) -> NewProposal {
    NewProposal {
        title: Some(title.to_string()),
        status: Some(ProposalStatus::Draft),
        total_value: Some(Decimal::from(1000)),
        ..Default::default()
    }
}

// =============================================================================
//  LEADS
// =============================================================================

#[tokio::test]
async fn qualifying_and_assigning_records_both_activities() {
    let pipeline = pipeline();
    let actor = Uuid::new_v4();
    let u1 = Uuid::new_v4();

    let created = pipeline.create_lead(lead("Acme"), actor).await.unwrap();
    assert!(pipeline.list_activities(OwnerRef::lead(created.id)).await.unwrap().is_empty());

    let updated = pipeline
        .update_lead(
            created.id,
            LeadChanges {
                status: Some(LeadStatus::Qualified),
                assigned_to_id: Some(Some(u1)),
                ..Default::default()
            },
            actor,
        )
        .await
        .unwrap();
    assert_eq!(updated.status, LeadStatus::Qualified);
    assert_eq!(updated.assigned_to_id, Some(u1));

    let activities = pipeline.list_activities(OwnerRef::lead(created.id)).await.unwrap();
    assert_eq!(activities.len(), 2);

    let status = activities.iter().find(|a| a.activity_type == ActivityType::Status).unwrap();
    assert_eq!(status.description, "Status changed from new to qualified");
    assert_eq!(status.performed_by_id, actor);

    let assignment = activities.iter().find(|a| a.activity_type == ActivityType::Assignment).unwrap();
    assert_eq!(assignment.description, format!("Lead assigned to {u1}"));
}

#[tokio::test]
async fn reassignment_without_status_change_adds_only_an_assignment() {
    let pipeline = pipeline();
    let actor = Uuid::new_v4();
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    let created = pipeline
        .create_lead(NewLead { assigned_to_id: Some(first), ..lead("Acme") }, actor)
        .await
        .unwrap();
    // Criação já atribuída deixa uma nota
    let before = pipeline.list_activities(OwnerRef::lead(created.id)).await.unwrap();
    assert_eq!(before.len(), 1);
    assert_eq!(before[0].activity_type, ActivityType::Note);

    pipeline
        .update_lead(
            created.id,
            LeadChanges {
                assigned_to_id: Some(Some(second)),
                status: Some(LeadStatus::New),
                ..Default::default()
            },
            actor,
        )
        .await
        .unwrap();

    let activities = pipeline.list_activities(OwnerRef::lead(created.id)).await.unwrap();
    let assignments: Vec<_> = activities
        .iter()
        .filter(|a| a.activity_type == ActivityType::Assignment)
        .collect();
    assert_eq!(assignments.len(), 1);
    assert!(assignments[0].description.contains(&second.to_string()));
    assert!(!activities.iter().any(|a| a.activity_type == ActivityType::Status));

    // Mesmo responsável de novo: nada muda
    pipeline
        .update_lead(
            created.id,
            LeadChanges { assigned_to_id: Some(Some(second)), ..Default::default() },
            actor,
        )
        .await
        .unwrap();
    assert_eq!(pipeline.list_activities(OwnerRef::lead(created.id)).await.unwrap().len(), 2);
}

#[tokio::test]
async fn omitted_fields_are_kept_and_explicit_null_clears() {
    let pipeline = pipeline();
    let actor = Uuid::new_v4();
    let assignee = Uuid::new_v4();

    let created = pipeline
        .create_lead(
            NewLead {
                assigned_to_id: Some(assignee),
                company: Some("Acme Ltda".into()),
                ..lead("Acme")
            },
            actor,
        )
        .await
        .unwrap();

    let renamed = pipeline
        .update_lead(created.id, LeadChanges { name: Some("Acme SA".into()), ..Default::default() }, actor)
        .await
        .unwrap();
    assert_eq!(renamed.assigned_to_id, Some(assignee));
    assert_eq!(renamed.company.as_deref(), Some("Acme Ltda"));

    let cleared = pipeline
        .update_lead(created.id, LeadChanges { assigned_to_id: Some(None), ..Default::default() }, actor)
        .await
        .unwrap();
    assert_eq!(cleared.assigned_to_id, None);

    let activities = pipeline.list_activities(OwnerRef::lead(created.id)).await.unwrap();
    assert!(activities.iter().any(|a| a.description == "Lead unassigned"));
}

#[tokio::test]
async fn illegal_lead_transition_writes_nothing() {
    let pipeline = pipeline();
    let actor = Uuid::new_v4();
    let created = pipeline.create_lead(lead("Acme"), actor).await.unwrap();

    let err = pipeline
        .update_lead(
            created.id,
            LeadChanges {
                status: Some(LeadStatus::Converted),
                assigned_to_id: Some(Some(Uuid::new_v4())),
                ..Default::default()
            },
            actor,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));
    assert_eq!(err.kind(), ErrorKind::Validation);

    let stored = pipeline.get_lead(created.id).await.unwrap();
    assert_eq!(stored.status, LeadStatus::New);
    assert_eq!(stored.assigned_to_id, None);
    assert!(pipeline.list_activities(OwnerRef::lead(created.id)).await.unwrap().is_empty());
}

#[tokio::test]
async fn converting_a_lead_stamps_the_conversion_date() {
    let pipeline = pipeline();
    let actor = Uuid::new_v4();
    let created = pipeline
        .create_lead(NewLead { status: Some(LeadStatus::Qualified), ..lead("Acme") }, actor)
        .await
        .unwrap();
    assert!(created.conversion_date.is_none());

    let converted = pipeline
        .update_lead(created.id, LeadChanges { status: Some(LeadStatus::Converted), ..Default::default() }, actor)
        .await
        .unwrap();
    assert!(converted.conversion_date.is_some());
}

#[tokio::test]
async fn missing_required_lead_fields_fail_validation() {
    let pipeline = pipeline();
    let err = pipeline
        .create_lead(NewLead { source: None, ..lead("Acme") }, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(pipeline.list_leads().await.unwrap().is_empty());
}

#[tokio::test]
async fn contact_activities_update_the_lead() {
    let pipeline = pipeline();
    let actor = Uuid::new_v4();
    let created = pipeline.create_lead(lead("Acme"), actor).await.unwrap();
    let follow_up = chrono::Utc::now() + chrono::Duration::days(3);

    let call = pipeline
        .log_lead_activity(
            created.id,
            NewActivity {
                activity_type: Some(ActivityType::Call),
                description: Some("Ligação de qualificação".into()),
                follow_up_date: Some(follow_up),
                ..Default::default()
            },
            actor,
        )
        .await
        .unwrap();

    let stored = pipeline.get_lead(created.id).await.unwrap();
    assert_eq!(stored.last_contact, Some(call.date));
    assert_eq!(stored.next_contact_date, Some(follow_up));

    // Nota não é contato
    pipeline
        .log_lead_activity(
            created.id,
            NewActivity {
                activity_type: Some(ActivityType::Note),
                description: Some("Prefere e-mail".into()),
                ..Default::default()
            },
            actor,
        )
        .await
        .unwrap();
    assert_eq!(pipeline.get_lead(created.id).await.unwrap().last_contact, Some(call.date));

    let reserved = pipeline
        .log_lead_activity(
            created.id,
            NewActivity {
                activity_type: Some(ActivityType::Status),
                description: Some("forjado".into()),
                ..Default::default()
            },
            actor,
        )
        .await
        .unwrap_err();
    assert_eq!(reserved.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn deleting_a_lead_removes_its_history() {
    let pipeline = pipeline();
    let actor = Uuid::new_v4();
    let created = pipeline
        .create_lead(NewLead { assigned_to_id: Some(Uuid::new_v4()), ..lead("Acme") }, actor)
        .await
        .unwrap();

    pipeline.delete_lead(created.id, actor).await.unwrap();

    let err = pipeline.list_activities(OwnerRef::lead(created.id)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(pipeline.delete_lead(created.id, actor).await.unwrap_err().kind(), ErrorKind::NotFound);
}

// =============================================================================
//  DEALS
// =============================================================================

#[tokio::test]
async fn updating_lead_ids_reconciles_the_association() {
    let pipeline = pipeline();
    let actor = Uuid::new_v4();
    let a = pipeline.create_lead(lead("A"), actor).await.unwrap().id;
    let b = pipeline.create_lead(lead("B"), actor).await.unwrap().id;
    let c = pipeline.create_lead(lead("C"), actor).await.unwrap().id;

    let created = pipeline.create_deal(deal("ERP", vec![a, b, a]), actor).await.unwrap();
    assert_eq!(created.leads.iter().copied().collect::<BTreeSet<_>>(), BTreeSet::from([a, b]));

    let updated = pipeline
        .update_deal(created.id, DealChanges { lead_ids: Some(vec![b, c]), ..Default::default() }, actor)
        .await
        .unwrap();
    assert_eq!(updated.leads.iter().copied().collect::<BTreeSet<_>>(), BTreeSet::from([b, c]));

    assert_eq!(pipeline.get_lead(a).await.unwrap().deal_id, None);
    assert_eq!(pipeline.get_lead(b).await.unwrap().deal_id, Some(created.id));
    assert_eq!(pipeline.get_lead(c).await.unwrap().deal_id, Some(created.id));

    let emptied = pipeline
        .update_deal(created.id, DealChanges { lead_ids: Some(vec![]), ..Default::default() }, actor)
        .await
        .unwrap();
    assert!(emptied.leads.is_empty());
}

#[tokio::test]
async fn a_lead_moves_between_deals() {
    let pipeline = pipeline();
    let actor = Uuid::new_v4();
    let a = pipeline.create_lead(lead("A"), actor).await.unwrap().id;

    let first = pipeline.create_deal(deal("Primeiro", vec![a]), actor).await.unwrap();
    let second = pipeline.create_deal(deal("Segundo", vec![a]), actor).await.unwrap();

    assert_eq!(second.leads, vec![a]);
    assert!(pipeline.get_deal(first.id).await.unwrap().leads.is_empty());
    assert_eq!(pipeline.get_lead(a).await.unwrap().deal_id, Some(second.id));
}

#[tokio::test]
async fn deal_with_unknown_lead_rolls_back_entirely() {
    let pipeline = pipeline();
    let actor = Uuid::new_v4();
    let a = pipeline.create_lead(lead("A"), actor).await.unwrap().id;

    let err = pipeline
        .create_deal(deal("ERP", vec![a, Uuid::new_v4()]), actor)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert!(pipeline.list_deals().await.unwrap().is_empty());
    assert_eq!(pipeline.get_lead(a).await.unwrap().deal_id, None);
}

#[tokio::test]
async fn closing_requires_a_reason_and_stamps_the_close_date_once() {
    let pipeline = pipeline();
    let actor = Uuid::new_v4();
    let created = pipeline.create_deal(deal("ERP", vec![]), actor).await.unwrap();

    let err = pipeline
        .update_deal(created.id, DealChanges { stage: Some(DealStage::ClosedWon), ..Default::default() }, actor)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(pipeline.get_deal(created.id).await.unwrap().stage, DealStage::Prospecting);

    let won = pipeline
        .update_deal(
            created.id,
            DealChanges {
                stage: Some(DealStage::ClosedWon),
                win_reason: Some("Melhor preço".into()),
                ..Default::default()
            },
            actor,
        )
        .await
        .unwrap();
    let closed_at = won.actual_close_date.expect("data de fechamento");

    let err = pipeline
        .update_deal(
            created.id,
            DealChanges {
                stage: Some(DealStage::ClosedLost),
                loss_reason: Some("Desistiu".into()),
                ..Default::default()
            },
            actor,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let touched = pipeline
        .update_deal(
            created.id,
            DealChanges {
                stage: Some(DealStage::ClosedWon),
                description: Some("Fase 2".into()),
                ..Default::default()
            },
            actor,
        )
        .await
        .unwrap();
    assert_eq!(touched.actual_close_date, Some(closed_at));
    assert_eq!(touched.stage, DealStage::ClosedWon);

    let stages: Vec<_> = pipeline
        .list_activities(OwnerRef::deal(created.id))
        .await
        .unwrap()
        .into_iter()
        .filter(|a| a.activity_type == ActivityType::Stage)
        .collect();
    assert_eq!(stages.len(), 1);
    assert_eq!(stages[0].description, "Stage changed from prospecting to closed-won");
}

#[tokio::test]
async fn a_reason_saved_earlier_does_not_close_the_deal() {
    let pipeline = pipeline();
    let actor = Uuid::new_v4();
    let created = pipeline
        .create_deal(NewDeal { win_reason: Some("Indicação".into()), ..deal("ERP", vec![]) }, actor)
        .await
        .unwrap();

    let err = pipeline
        .update_deal(created.id, DealChanges { stage: Some(DealStage::ClosedWon), ..Default::default() }, actor)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let blank = pipeline
        .update_deal(
            created.id,
            DealChanges {
                stage: Some(DealStage::ClosedWon),
                win_reason: Some("   ".into()),
                ..Default::default()
            },
            actor,
        )
        .await
        .unwrap_err();
    assert_eq!(blank.kind(), ErrorKind::Validation);

    let stored = pipeline.get_deal(created.id).await.unwrap();
    assert_eq!(stored.stage, DealStage::Prospecting);
    assert!(stored.actual_close_date.is_none());
}

#[tokio::test]
async fn concurrent_lead_set_updates_do_not_interleave() {
    let pipeline = pipeline();
    let actor = Uuid::new_v4();
    let mut ids = Vec::new();
    for name in ["A", "B", "C", "D"] {
        ids.push(pipeline.create_lead(lead(name), actor).await.unwrap().id);
    }
    let created = pipeline.create_deal(deal("ERP", vec![ids[0]]), actor).await.unwrap();

    let first: BTreeSet<Uuid> = BTreeSet::from([ids[0], ids[1]]);
    let second: BTreeSet<Uuid> = BTreeSet::from([ids[2], ids[3]]);

    let handles: Vec<_> = [first.clone(), second.clone()]
        .into_iter()
        .map(|set| {
            let pipeline = pipeline.clone();
            let deal_id = created.id;
            tokio::spawn(async move {
                pipeline
                    .update_deal(
                        deal_id,
                        DealChanges { lead_ids: Some(set.into_iter().collect()), ..Default::default() },
                        actor,
                    )
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored: BTreeSet<Uuid> = pipeline.get_deal(created.id).await.unwrap().leads.into_iter().collect();
    assert!(stored == first || stored == second, "conjunto misturado: {stored:?}");

    for id in ids {
        let linked = pipeline.get_lead(id).await.unwrap().deal_id == Some(created.id);
        assert_eq!(linked, stored.contains(&id));
    }
}

#[tokio::test]
async fn deal_born_closed_needs_its_reason() {
    let pipeline = pipeline();
    let actor = Uuid::new_v4();

    let err = pipeline
        .create_deal(NewDeal { stage: Some(DealStage::ClosedLost), ..deal("ERP", vec![]) }, actor)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let lost = pipeline
        .create_deal(
            NewDeal {
                stage: Some(DealStage::ClosedLost),
                loss_reason: Some("Sem orçamento".into()),
                ..deal("ERP", vec![])
            },
            actor,
        )
        .await
        .unwrap();
    assert!(lost.actual_close_date.is_some());
}

#[tokio::test]
async fn deleting_a_deal_unlinks_leads_and_drops_history() {
    let pipeline = pipeline();
    let actor = Uuid::new_v4();
    let mut ids = Vec::new();
    for name in ["A", "B", "C"] {
        ids.push(pipeline.create_lead(lead(name), actor).await.unwrap().id);
    }
    let created = pipeline.create_deal(deal("ERP", ids.clone()), actor).await.unwrap();
    pipeline
        .log_deal_activity(
            created.id,
            NewActivity {
                activity_type: Some(ActivityType::Meeting),
                description: Some("Kickoff".into()),
                ..Default::default()
            },
            actor,
        )
        .await
        .unwrap();

    pipeline.delete_deal(created.id, actor).await.unwrap();

    for id in ids {
        assert_eq!(pipeline.get_lead(id).await.unwrap().deal_id, None);
    }
    assert_eq!(pipeline.get_deal(created.id).await.unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(
        pipeline.list_activities(OwnerRef::deal(created.id)).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[tokio::test]
async fn deal_amounts_and_probability_are_bounded() {
    let pipeline = pipeline();
    let actor = Uuid::new_v4();

    let negative = pipeline
        .create_deal(NewDeal { value: Some(Decimal::from(-1)), ..deal("ERP", vec![]) }, actor)
        .await
        .unwrap_err();
    assert_eq!(negative.kind(), ErrorKind::Validation);

    let created = pipeline.create_deal(deal("ERP", vec![]), actor).await.unwrap();
    let err = pipeline
        .update_deal(created.id, DealChanges { probability: Some(120), ..Default::default() }, actor)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

// =============================================================================
//  PROPOSALS
// =============================================================================

#[tokio::test]
async fn new_version_keeps_everything_else() {
    let pipeline = pipeline();
    let actor = Uuid::new_v4();

    let created = pipeline.create_proposal(proposal("T"), actor).await.unwrap();
    assert_eq!(created.version, 1);
    assert_eq!(created.created_by_id, actor);

    let bumped = pipeline
        .update_proposal(
            created.id,
            ProposalChanges { create_new_version: true, ..Default::default() },
            actor,
        )
        .await
        .unwrap();

    assert_eq!(bumped.version, 2);
    assert_eq!(bumped.title, "T");
    assert_eq!(bumped.status, ProposalStatus::Draft);
    assert_eq!(bumped.total_value, Decimal::from(1000));
    assert_eq!(bumped.proposal_number, created.proposal_number);
    assert_eq!(bumped.created_by_id, created.created_by_id);
}

#[tokio::test]
async fn concurrent_proposals_get_gapless_numbers() {
    let pipeline = pipeline();
    let actor = Uuid::new_v4();

    let handles: Vec<_> = (0..12)
        .map(|i| {
            let pipeline = pipeline.clone();
            tokio::spawn(async move { pipeline.create_proposal(proposal(&format!("P{i}")), actor).await })
        })
        .collect();

    let mut suffixes = BTreeSet::new();
    for handle in handles {
        let created = handle.await.unwrap().unwrap();
        assert!(created.proposal_number.starts_with("PROP-"));
        let suffix: u32 = created.proposal_number.rsplit('-').next().unwrap().parse().unwrap();
        suffixes.insert(suffix);
    }

    assert_eq!(suffixes, (1..=12).collect::<BTreeSet<_>>());
}

#[tokio::test]
async fn proposals_start_as_draft_or_sent() {
    let pipeline = pipeline();
    let actor = Uuid::new_v4();

    for status in [ProposalStatus::Accepted, ProposalStatus::Rejected, ProposalStatus::Expired, ProposalStatus::Converted] {
        let err = pipeline
            .create_proposal(NewProposal { status: Some(status), ..proposal("T") }, actor)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
    assert!(pipeline.list_proposals().await.unwrap().is_empty());

    let sent = pipeline
        .create_proposal(NewProposal { status: Some(ProposalStatus::Sent), ..proposal("T") }, actor)
        .await
        .unwrap();
    assert!(sent.sent_date.is_some());
    assert!(sent.proposal_number.ends_with("-0001"));
}

#[tokio::test]
async fn sending_a_proposal_stamps_the_sent_date() {
    let pipeline = pipeline();
    let actor = Uuid::new_v4();
    let created = pipeline.create_proposal(proposal("T"), actor).await.unwrap();
    assert!(created.sent_date.is_none());

    let sent = pipeline
        .update_proposal(
            created.id,
            ProposalChanges { status: Some(ProposalStatus::Sent), ..Default::default() },
            actor,
        )
        .await
        .unwrap();
    assert!(sent.sent_date.is_some());

    let err = pipeline
        .update_proposal(
            created.id,
            ProposalChanges { status: Some(ProposalStatus::Draft), ..Default::default() },
            actor,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn proposal_referencing_unknown_deal_is_not_found() {
    let pipeline = pipeline();
    let err = pipeline
        .create_proposal(NewProposal { deal_id: Some(Uuid::new_v4()), ..proposal("T") }, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // O número não foi consumido
    let created = pipeline.create_proposal(proposal("T"), Uuid::new_v4()).await.unwrap();
    assert!(created.proposal_number.ends_with("-0001"));
}
