use super::common::*;
use crate::verification::domain::{ComparisonOutcome, FieldKind, VerifiedField};
use crate::verification::{ExtractedData, VerificationEngine, VerificationEvent};

fn labels(events: &[VerificationEvent]) -> Vec<&'static str> {
    events.iter().map(VerificationEvent::label).collect()
}

#[test]
fn stages_run_in_fixed_order() {
    let events: Vec<_> = VerificationEngine::default()
        .live(&application(), pay_stub())
        .expect("valid")
        .collect();

    assert_eq!(
        labels(&events),
        vec![
            "extraction_received",
            "normalization_complete",
            "name_compared",
            "salary_compared",
            "employer_compared",
            "ssn_compared",
            "completed",
        ]
    );
    assert!(events
        .windows(2)
        .all(|pair| pair[0].progress() < pair[1].progress()));
    assert_eq!(events.last().map(VerificationEvent::progress), Some(100));
}

#[test]
fn size_hint_counts_remaining_stages() {
    let mut live = VerificationEngine::default()
        .live(&application(), pay_stub())
        .expect("valid");

    assert_eq!(live.len(), 7);
    live.next();
    live.next();
    assert_eq!(live.len(), 5);
    assert!(!live.is_finished());
}

#[test]
fn finished_stream_stays_finished() {
    let mut live = VerificationEngine::default()
        .live(&application(), ExtractedData::new())
        .expect("valid");

    assert_eq!(live.by_ref().count(), 7);
    assert!(live.is_finished());
    assert!(live.next().is_none());
    assert!(live.next().is_none());
}

#[test]
fn normalization_event_reports_each_field() {
    let extracted = pay_stub()
        .with(FieldKind::Ssn, "12-34")
        .with(FieldKind::EmployerName, "N/A");
    let event = VerificationEngine::default()
        .live(&application(), extracted)
        .expect("valid")
        .nth(1)
        .expect("normalization event");

    let VerificationEvent::NormalizationComplete { fields } = &event else {
        panic!("expected normalization event, got {event:?}");
    };
    let status = |kind: FieldKind| {
        fields
            .iter()
            .find(|diagnostic| diagnostic.field == kind)
            .map(|diagnostic| diagnostic.status)
    };
    assert_eq!(status(FieldKind::Name), Some("parsed"));
    assert_eq!(status(FieldKind::PayPeriod), Some("parsed"));
    assert_eq!(status(FieldKind::EmployerName), Some("missing"));
    assert_eq!(status(FieldKind::Ssn), Some("unparsable"));

    let ssn_detail = fields
        .iter()
        .find(|diagnostic| diagnostic.field == FieldKind::Ssn)
        .and_then(|diagnostic| diagnostic.detail.clone())
        .unwrap_or_default();
    assert!(ssn_detail.contains("expected 9 digits"));
}

#[test]
fn comparison_events_mirror_report_verdicts() {
    let extracted = pay_stub().with(FieldKind::Ssn, "987654321");
    let events: Vec<_> = VerificationEngine::default()
        .live(&application(), extracted)
        .expect("valid")
        .collect();

    let ssn_event = events
        .iter()
        .find(|event| event.label() == "ssn_compared")
        .expect("ssn stage");
    match ssn_event {
        VerificationEvent::FieldCompared {
            field,
            matched,
            outcome,
            ..
        } => {
            assert_eq!(*field, VerifiedField::Ssn);
            assert!(!matched);
            assert_eq!(*outcome, ComparisonOutcome::Mismatch);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(ssn_event.message().starts_with("ssn compared: digits differ"));
}

#[test]
fn events_serialize_with_step_tag_and_masked_ssn() {
    let events: Vec<_> = VerificationEngine::default()
        .live(&application(), pay_stub())
        .expect("valid")
        .collect();

    let first = serde_json::to_value(&events[0]).expect("serializes");
    assert_eq!(first["step"], "extraction_received");

    for event in &events {
        let text = serde_json::to_string(event).expect("serializes");
        assert!(!text.contains("123456789"), "{text}");
    }
}
