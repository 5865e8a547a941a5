use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::Arc;
use trigger_context::{
    standard_codec, BuildRecord, DocConfig, DocError, DocumentCodec, EventKind, ItemReference,
    PersistedRecord, RecordKind, RecordSummary, RetriggerAction, TriggerCause, TriggerContext,
};
use trigger_doc::{shared, Shared};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn codec() -> DocumentCodec {
    standard_codec(DocConfig::default()).expect("valid config")
}

fn context_of(action: &RetriggerAction) -> Shared<TriggerContext> {
    action.context.clone().expect("action holds a context")
}

#[test]
fn old_data_with_single_other() {
    let action: RetriggerAction = codec()
        .read_from_path(fixture("retrigger_action_old_data.xml"))
        .expect("legacy record decodes");
    let context = context_of(&action);
    let context = context.read();

    let event = context.event().expect("event");
    assert_eq!(event.kind, EventKind::PatchsetCreated);
    assert_eq!(
        event.project(),
        Some("semctools/hudson/plugins/gerrit-trigger-plugin")
    );
    assert_eq!(
        event.patch_set.as_ref().map(|patch_set| patch_set.number.as_str()),
        Some("1")
    );

    assert_eq!(
        context.this_build(),
        Some(&ItemReference::new("EXPERIMENTAL_Gerrit_Trigger_1", 6))
    );
    assert_eq!(
        context.others().cloned().collect::<Vec<_>>(),
        vec![ItemReference::new("EXPERIMENTAL_Gerrit_Trigger_2", 16)]
    );
}

#[test]
fn old_data_with_wrapped_references_and_nulls() {
    let action: RetriggerAction = codec()
        .read_from_path(fixture("retrigger_action_old_data2.xml"))
        .expect("legacy record decodes");
    let context = context_of(&action);
    let context = context.read();

    assert_eq!(
        context.event().and_then(|event| event.project()),
        Some("semctools/hudson/plugins/gerrit-trigger-plugin")
    );
    assert_eq!(
        context.this_build(),
        Some(&ItemReference::new("EXPERIMENTAL_Gerrit_Trigger_1", 6))
    );
    assert_eq!(
        context.other_slots().to_vec(),
        vec![
            Some(ItemReference::new("EXPERIMENTAL_Gerrit_Trigger_2", 16)),
            Some(ItemReference::new("EXPERIMENTAL_Gerrit_Trigger_3", 15)),
        ]
    );
}

#[test]
fn matrix_build_with_owner_only_reference() {
    let build: BuildRecord = codec()
        .read_from_path(fixture("matrix_build.xml"))
        .expect("matrix record decodes");

    assert_eq!(build.job, "Gerrit_master-theme_matrix");
    assert_eq!(build.number, 102);

    let contexts = build.trigger_contexts();
    assert_eq!(contexts.len(), 1, "cause and action share one context");

    let cause_context = build.causes[0].context.clone().expect("cause context");
    let action_context = context_of(&build.actions[0]);
    assert!(Arc::ptr_eq(&cause_context, &action_context));

    let context = cause_context.read();
    assert_eq!(
        context.this_build(),
        Some(&ItemReference::new("Gerrit_master-theme_matrix", 102))
    );
    let others: Vec<ItemReference> = context.others().cloned().collect();
    assert_eq!(others, vec![ItemReference::owner_only("master-theme")]);
    assert_eq!(others[0].build_number, None);
    assert!(!build.causes[0].silent);
}

#[test]
fn matrix_build_with_cause_under_upstream_cause() {
    let build: BuildRecord = codec()
        .read_from_path(fixture("matrix_build_upstream.xml"))
        .expect("matrix record decodes");

    assert!(build.causes.is_empty());
    let upstream = &build.upstream[0];
    assert_eq!(upstream.upstream_project, "Gerrit_master-theme_matrix");
    assert_eq!(upstream.upstream_build, 102);

    let cause = &upstream.upstream_causes[0];
    assert!(cause.silent);
    let cause_context = cause.context.clone().expect("cause context");
    assert!(Arc::ptr_eq(&cause_context, &context_of(&build.actions[0])));

    let contexts = build.trigger_contexts();
    assert_eq!(contexts.len(), 1);
    assert!(Arc::ptr_eq(&contexts[0], &cause_context));

    let context = cause_context.read();
    let others: Vec<ItemReference> = context.others().cloned().collect();
    assert_eq!(others, vec![ItemReference::owner_only("master-theme")]);
    assert_eq!(
        context.this_build(),
        Some(&ItemReference::new("Gerrit_master-theme_matrix", 102))
    );
}

#[test]
fn event_given_as_back_reference_decodes_the_cause_event() {
    let build: BuildRecord = codec()
        .read_from_path(fixture("matrix_build_upstream.xml"))
        .expect("matrix record decodes");

    let cause = &build.upstream[0].upstream_causes[0];
    let cause_event = cause.event.clone().expect("cause event");
    assert_eq!(cause_event.project(), Some("platform/project"));

    let context = cause.context.clone().expect("cause context");
    let context_event = context.read().event().cloned().expect("context event");
    assert_eq!(context_event, cause_event);
    assert_eq!(
        context_event.patch_set.map(|patch_set| patch_set.number),
        Some("3".to_string())
    );
}

#[test]
fn dangling_event_reference_is_an_error() {
    let result: trigger_doc::Result<RetriggerAction> = codec().from_xml(
        r#"<retriggerAction><context><event reference="../../event"/></context></retriggerAction>"#,
    );
    assert!(matches!(
        result,
        Err(DocError::UnresolvedReference { ref reference, .. }) if reference == "../../event"
    ));
}

#[test]
fn migrated_upstream_build_inlines_the_referenced_event() {
    let codec = codec();
    let raw = std::fs::read_to_string(fixture("matrix_build_upstream.xml")).expect("fixture");
    let record = PersistedRecord::decode(&codec, &raw, None).expect("decode");

    let migrated = record.encode(&codec).expect("encode");
    assert!(!migrated.contains(r#"reference="../../event""#), "{migrated}");
    assert!(migrated.contains("<upstreamCause>"), "{migrated}");

    let reread = PersistedRecord::decode(&codec, &migrated, None).expect("re-decode");
    assert_eq!(RecordSummary::from(&reread), RecordSummary::from(&record));
}

#[test]
fn migrated_record_uses_current_layout_and_decodes_identically() {
    let codec = codec();
    let raw = std::fs::read_to_string(fixture("retrigger_action_old_data2.xml")).expect("fixture");
    let record = PersistedRecord::decode(&codec, &raw, None).expect("decode");
    assert_eq!(record.kind(), RecordKind::Action);

    let migrated = record.encode(&codec).expect("encode");
    for legacy in ["<thisRun", "<build>", "<build ", "<null/>", "number=\""] {
        assert!(!migrated.contains(legacy), "{legacy} left in {migrated}");
    }
    assert!(migrated.contains("<itemReference>"));

    let reread = PersistedRecord::decode(&codec, &migrated, None).expect("re-decode");
    assert_eq!(
        RecordSummary::from(&reread),
        RecordSummary::from(&record)
    );
}

#[test]
fn migrated_build_keeps_shared_context() {
    let codec = codec();
    let raw = std::fs::read_to_string(fixture("matrix_build.xml")).expect("fixture");
    let record = PersistedRecord::decode(&codec, &raw, Some(RecordKind::Build)).expect("decode");

    let migrated = record.encode(&codec).expect("encode");
    assert!(migrated.contains(r#"reference="1""#), "{migrated}");

    let reread = PersistedRecord::decode(&codec, &migrated, None).expect("re-decode");
    assert_eq!(reread.contexts().len(), 1);
    assert_eq!(
        RecordSummary::from(&reread),
        RecordSummary::from(&record)
    );
}

#[test]
fn build_record_round_trip_through_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("build.xml");
    let codec = codec();

    let context = shared(
        TriggerContext::new(None).with_this_build(ItemReference::new("downstream", 7)),
    );
    let mut build = BuildRecord::new("downstream", 7);
    build.causes.push(TriggerCause::new(None, context.clone()));
    build.actions.push(RetriggerAction::new(context));

    codec.write_to_path(&build, &path).expect("write");
    let record = PersistedRecord::read_from_path(&codec, &path, None).expect("read");

    let context = record.primary_context().expect("context present");
    assert_eq!(
        context.read().this_build(),
        Some(&ItemReference::new("downstream", 7))
    );
    assert_eq!(record.contexts().len(), 1);
}
