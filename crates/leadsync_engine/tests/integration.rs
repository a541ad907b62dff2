//! End-to-end reconciliation scenarios over in-memory adapters.

use leadsync_engine::{
    BoardConfig, MemoryLeadSource, MemoryTaskBoard, Method, MockHttpClient, RestLeadSource,
    RestTaskBoard, RetryPolicy, SourceConfig, SyncService, TaskBoard,
};
use leadsync_model::{embed_lead_id, Lead, LeadStatus, TaskStatus, LEAD_ID_MARKER};

fn service_with(leads: Vec<Lead>) -> SyncService<MemoryLeadSource, MemoryTaskBoard> {
    SyncService::new(MemoryLeadSource::with_leads(leads), MemoryTaskBoard::new())
}

#[test]
fn new_lead_lands_in_todo_with_a_token() {
    let svc = service_with(vec![Lead::new("L1", "Ann", "a@x.com", LeadStatus::New)]);

    let report = svc.run_full_sync_cycle();
    assert!(report.succeeded());

    let board = svc.board();
    let todo = board.tasks_in(TaskStatus::Todo);
    assert_eq!(todo.len(), 1);
    assert_eq!(board.card_count(), 1);

    let task = &todo[0];
    assert_eq!(task.title, "Follow up: Ann");
    assert_eq!(task.lead_id, "L1");
    let notes = task.notes.as_deref().unwrap();
    assert!(notes.contains("LeadID: L1"));
    assert!(notes.contains("Email: a@x.com"));
}

#[test]
fn contacted_lead_moves_its_task_without_rewriting_it() {
    let svc = service_with(vec![Lead::new("L1", "Ann", "a@x.com", LeadStatus::Contacted)]);
    svc.board().insert_card(
        TaskStatus::Todo,
        "Follow up: Ann",
        &embed_lead_id("L1", "Email: a@x.com\nSource: "),
    );

    let report = svc.run_full_sync_cycle();
    assert!(report.succeeded());

    let board = svc.board();
    assert_eq!(board.card_count(), 1);
    assert!(board.tasks_in(TaskStatus::Todo).is_empty());

    let moved = &board.tasks_in(TaskStatus::InProgress)[0];
    assert_eq!(moved.title, "Follow up: Ann");
    assert_eq!(
        moved.notes.as_deref(),
        Some("LeadID: L1\nEmail: a@x.com\nSource: ")
    );
}

#[test]
fn done_task_qualifies_its_lead_and_leaves_an_audit_trail() {
    let svc = service_with(vec![Lead::new("L1", "Ann", "a@x.com", LeadStatus::New)]);
    svc.board()
        .insert_card(TaskStatus::Done, "Follow up: Ann", &embed_lead_id("L1", ""));

    let report = svc.task_to_lead_updates().unwrap();
    assert_eq!(report.changed, 1);
    assert_eq!(
        svc.leads().lead("L1").unwrap().status,
        LeadStatus::Qualified
    );
    assert_eq!(
        svc.leads().appended_notes(),
        vec![("L1".to_string(), "DONE → QUALIFIED".to_string())]
    );
}

#[test]
fn audit_note_failure_does_not_undo_the_status_update() {
    let svc = service_with(vec![Lead::new("L1", "Ann", "a@x.com", LeadStatus::New)]);
    svc.board()
        .insert_card(TaskStatus::Done, "Follow up: Ann", &embed_lead_id("L1", ""));
    svc.leads().set_fail_appends(true);

    let report = svc.task_to_lead_updates().unwrap();
    assert!(report.errors.is_empty());
    assert_eq!(
        svc.leads().lead("L1").unwrap().status,
        LeadStatus::Qualified
    );
}

#[test]
fn two_cycles_against_the_same_lead_produce_one_task() {
    let svc = service_with(vec![Lead::new("L1", "Ann", "a@x.com", LeadStatus::New)]);

    assert!(svc.run_full_sync_cycle().succeeded());
    assert!(svc.run_full_sync_cycle().succeeded());

    assert_eq!(svc.board().card_count(), 1);
    assert_eq!(svc.board().tasks_in(TaskStatus::Todo).len(), 1);
}

#[test]
fn cycles_converge_without_oscillating() {
    // Forward then reverse round-trips are stable for non-terminal
    // statuses, so a second cycle must not move anything.
    let svc = service_with(vec![
        Lead::new("L1", "Ann", "a@x.com", LeadStatus::New),
        Lead::new("L2", "Bo", "b@x.com", LeadStatus::Qualified),
    ]);

    assert!(svc.run_full_sync_cycle().succeeded());
    let after_first: Vec<_> = svc
        .board()
        .tasks_in(TaskStatus::Todo)
        .into_iter()
        .chain(svc.board().tasks_in(TaskStatus::Done))
        .map(|t| (t.id, t.status))
        .collect();

    assert!(svc.run_full_sync_cycle().succeeded());
    let after_second: Vec<_> = svc
        .board()
        .tasks_in(TaskStatus::Todo)
        .into_iter()
        .chain(svc.board().tasks_in(TaskStatus::Done))
        .map(|t| (t.id, t.status))
        .collect();

    assert_eq!(after_first, after_second);
    assert_eq!(svc.leads().lead("L1").unwrap().status, LeadStatus::New);
    assert_eq!(
        svc.leads().lead("L2").unwrap().status,
        LeadStatus::Qualified
    );
}

#[test]
fn lost_leads_never_reach_the_board() {
    let svc = service_with(vec![
        Lead::new("L1", "Ann", "a@x.com", LeadStatus::Lost),
        Lead::new("L2", "Bo", "b@x.com", LeadStatus::New),
    ]);

    assert!(svc.run_full_sync_cycle().succeeded());
    assert_eq!(svc.board().card_count(), 1);
    assert!(svc.board().find_task_by_lead_id("L1").unwrap().is_none());
    // And nothing ever maps a lead back to Lost.
    assert_eq!(svc.leads().lead("L1").unwrap().status, LeadStatus::Lost);
}

#[test]
fn one_bad_record_does_not_starve_the_rest_of_the_pass() {
    let svc = service_with(vec![
        Lead::new("L1", "Ann", "a@x.com", LeadStatus::New),
        Lead::new("L2", "Bo", "b@x.com", LeadStatus::New),
        Lead::new("L3", "Cy", "c@x.com", LeadStatus::New),
    ]);
    svc.board().fail_ensure_for("L2");

    let report = svc.run_full_sync_cycle();
    assert!(report.succeeded());
    assert!(report.record_errors() >= 1);
    assert!(svc.board().find_task_by_lead_id("L1").unwrap().is_some());
    assert!(svc.board().find_task_by_lead_id("L3").unwrap().is_some());
}

#[test]
fn rest_adapters_wire_a_creation_cycle_end_to_end() {
    let source_client = MockHttpClient::new();
    source_client.on(
        Method::Get,
        "/v0/base1/Leads",
        200,
        r#"{"records":[{"id":"L1","fields":{"Name":"Ann","Email":"a@x.com","Status":"Todo"}}]}"#,
    );

    let board_client = std::sync::Arc::new(MockHttpClient::new());
    board_client.on(Method::Get, "/lists/list-todo/cards", 200, "[]");
    board_client.on(Method::Get, "/lists/list-wip/cards", 200, "[]");
    board_client.on(Method::Get, "/lists/list-done/cards", 200, "[]");
    board_client.on(
        Method::Post,
        "/cards",
        200,
        r#"{"id":"c1","name":"Follow up: Ann","desc":"LeadID: L1\nEmail: a@x.com\nSource: "}"#,
    );

    let svc = SyncService::new(
        RestLeadSource::new(
            SourceConfig::new("https://crm.example.com/v0", "tok", "base1"),
            RetryPolicy::no_retry(),
            source_client,
        ),
        RestTaskBoard::new(
            BoardConfig::new(
                "https://board.example.com/1",
                "k",
                "t",
                "board1",
                "list-todo",
                "list-wip",
                "list-done",
            ),
            RetryPolicy::no_retry(),
            std::sync::Arc::clone(&board_client),
        ),
    );

    let report = svc.run_full_sync_cycle();
    assert!(report.succeeded());

    let creation = report.creation.unwrap();
    assert_eq!(creation.processed, 1);
    assert_eq!(creation.errors.len(), 0);

    // Exactly one card was created, with the back-reference token in the
    // form-encoded description.
    let creates: Vec<_> = board_client
        .requests()
        .into_iter()
        .filter(|r| r.method == Method::Post)
        .collect();
    assert_eq!(creates.len(), 1);
    let body = format!("{:?}", creates[0].body);
    assert!(body.contains(LEAD_ID_MARKER));
}
