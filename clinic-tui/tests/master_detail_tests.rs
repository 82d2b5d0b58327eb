use clinic_core::{EntitySchema, FetchError, Record, RecordId, SchemaRegistry, Transport};
use clinic_test_utils::fixtures;
use clinic_test_utils::generators::arb_collection;
use clinic_test_utils::MockTransport;
use clinic_tui::config::{AuthConfig, ThemeConfig, TuiConfig};
use clinic_tui::controller::{main_table, MasterDetailController, ViewCommand, ViewEvent};
use clinic_tui::events::TuiEvent;
use clinic_tui::form::{FormInput, FormMode, FormPhase, FormRegistry, FormState};
use clinic_tui::state::App;
use clinic_tui::table::RowTarget;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

struct Harness {
    mock: Arc<MockTransport>,
    view: MasterDetailController,
    rx: mpsc::Receiver<TuiEvent>,
}

fn harness_with(registry: Arc<SchemaRegistry>, mock: MockTransport, entity: &str) -> Harness {
    let mock = Arc::new(mock);
    let transport: Arc<dyn Transport> = mock.clone();
    let (tx, rx) = mpsc::channel(64);
    let forms = Arc::new(FormRegistry::from_schemas(&registry));
    let schema = registry.get_schema(entity).unwrap();
    let view = MasterDetailController::new(7, schema, forms, transport, tx);
    Harness { mock, view, rx }
}

fn harness(entity: &str) -> Harness {
    harness_with(fixtures::registry(), fixtures::petclinic(), entity)
}

impl Harness {
    /// Apply completions until nothing spawned by the view is outstanding.
    async fn settle(&mut self) {
        while self.view.in_flight() > 0 {
            let next = tokio::time::timeout(Duration::from_secs(2), self.rx.recv())
                .await
                .expect("view work did not complete");
            match next {
                Some(TuiEvent::View { mount, event }) if mount == self.view.mount() => {
                    self.view.handle_event(event)
                }
                Some(_) => {}
                None => panic!("event channel closed"),
            }
        }
    }

    async fn loaded(entity: &str) -> Self {
        let mut h = harness(entity);
        h.view.load();
        h.settle().await;
        h
    }

    fn main_record(&self, id: i64) -> Record {
        self.view
            .main_collection()
            .iter()
            .find(|r| r.id() == &RecordId::Int(id))
            .cloned()
            .expect("record in main collection")
    }
}

fn parent_selection(form: &FormState, key: &str) -> Option<Value> {
    form.inputs().iter().find_map(|input| match input {
        FormInput::Parent(parent) if parent.key() == key => parent.selected().cloned(),
        _ => None,
    })
}

// ============================================================================
// LOADING AND SELECTION
// ============================================================================

#[tokio::test]
async fn test_load_renders_rows_in_schema_order() {
    let h = Harness::loaded("Pet").await;

    assert!(h.view.is_loaded());
    assert_eq!(h.mock.count("GET", "/pets/"), 1);

    let table = main_table(h.view.main_collection(), h.view.schema());
    assert_eq!(
        table.headers(),
        vec!["ID", "name", "birth_date", "Actions"]
    );
    let rows = table.rows();
    assert_eq!(rows[0][..3], ["1", "Rex", "2020-01-01"]);
}

#[tokio::test]
async fn test_load_failure_is_reported_and_keeps_collection() {
    let mut h = Harness::loaded("Vet").await;
    h.mock.fail("GET", "/vets/", 503);

    h.view.load();
    h.settle().await;

    assert_eq!(h.view.main_collection().len(), 2);
    assert!(matches!(
        h.view.main_error(),
        Some(FetchError::Status { status: 503, .. })
    ));
    assert!(!h.view.take_notifications().is_empty());
}

#[tokio::test]
async fn test_superseded_load_is_ignored() {
    let mut h = Harness::loaded("Vet").await;

    h.view.handle_event(ViewEvent::MainLoaded {
        seq: 0,
        result: Ok(Vec::new()),
    });

    assert_eq!(h.view.main_collection().len(), 2);
}

#[tokio::test]
async fn test_select_fetches_nested_collection_once() {
    let mut h = Harness::loaded("Pet").await;
    h.mock.reset_calls();

    let table = main_table(h.view.main_collection(), h.view.schema());
    let command = table.click(0, RowTarget::Row).unwrap();
    drop(table);
    h.view.apply(command);
    h.settle().await;

    let paths: Vec<String> = h.mock.calls().into_iter().map(|c| c.path).collect();
    assert_eq!(paths, vec!["/pets/1/visits"]);
    assert_eq!(h.view.selected().map(Record::id), Some(&RecordId::Int(1)));
    assert_eq!(h.view.related("visit").map(<[_]>::len), Some(2));
}

#[tokio::test]
async fn test_empty_nested_collection_is_loaded_not_missing() {
    let mut h = Harness::loaded("Pet").await;

    let record = h.main_record(2);
    h.view.select(record);
    h.settle().await;

    assert_eq!(h.view.related("visit").map(<[_]>::len), Some(0));
}

#[tokio::test]
async fn test_related_failure_is_isolated() {
    let registry = Arc::new(
        SchemaRegistry::from_toml_str(
            r#"
            [[entities]]
            name = "Owner"
            fields = [{ name = "last_name", type = "text" }]
            relationships = [
                { target = "Pet", kind = "nested_collection" },
                { target = "Visit", kind = "nested_collection" },
            ]

            [[entities]]
            name = "Pet"
            fields = [{ name = "name", type = "text" }]
            relationships = [{ target = "Owner", kind = "parent_reference" }]

            [[entities]]
            name = "Visit"
            fields = [{ name = "description", type = "text" }]
            relationships = [{ target = "Owner", kind = "parent_reference" }]
            "#,
        )
        .unwrap(),
    );
    let mut h = harness_with(registry, fixtures::petclinic(), "Owner");
    h.mock.fail("GET", "/owners/1/visits", 500);
    h.view.load();
    h.settle().await;

    let record = h.main_record(1);
    h.view.select(record);
    h.settle().await;

    assert_eq!(h.view.related("pet").map(<[_]>::len), Some(1));
    assert!(h.view.related("visit").is_none());
    assert_eq!(h.view.related_cache().len(), 1);
    assert_eq!(h.view.take_notifications().len(), 1);
}

#[tokio::test]
async fn test_unreachable_nested_endpoint_leaves_placeholder() {
    let mut h = Harness::loaded("Vet").await;
    h.mock.fail_network("GET", "/vets/1/visits");

    let record = h.main_record(1);
    h.view.select(record);
    h.settle().await;

    assert!(h.view.selected().is_some());
    assert!(h.view.related("visit").is_none());
    assert!(h.view.main_error().is_none());
    let notices = h.view.take_notifications();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].message.contains("connection refused"));
}

#[tokio::test]
async fn test_related_data_for_previous_selection_is_discarded() {
    let mut h = Harness::loaded("Pet").await;
    h.mock.insert(
        "Visit",
        json!({"id": 3, "visit_date": "2022-01-01", "description": "checkup", "pet_id": 2}),
    );
    h.mock.hold("/pets/1/visits");

    let record = h.main_record(1);
    h.view.select(record);
    let record = h.main_record(2);
    h.view.select(record);
    h.mock.release("/pets/1/visits");
    h.settle().await;

    let visits = h.view.related("visit").unwrap();
    assert_eq!(visits.len(), 1);
    assert_eq!(visits[0].id(), &RecordId::Int(3));
}

#[tokio::test]
async fn test_create_new_clears_selection() {
    let mut h = Harness::loaded("Pet").await;
    let record = h.main_record(1);
    h.view.select(record);
    h.settle().await;

    h.view.create_new();

    assert!(h.view.selected().is_none());
    assert!(h.view.related_cache().is_empty());
    let form = h.view.main_form().unwrap();
    assert_eq!(form.mode(), &FormMode::Create);
    assert_eq!(form.title(), "Create Pet");
}

// ============================================================================
// FORMS
// ============================================================================

#[tokio::test]
async fn test_create_posts_body_and_reloads() {
    let mut h = Harness::loaded("Vet").await;

    h.view.create_new();
    let form = h.view.main_form_mut().unwrap();
    assert!(form.set_text("first_name", "Linda"));
    assert!(form.set_text("last_name", "Douglas"));
    h.view.submit_main_form();
    h.settle().await;

    assert_eq!(
        h.mock.last_body("POST", "/vets/"),
        Some(json!({"first_name": "Linda", "last_name": "Douglas"}))
    );
    assert!(h.view.main_form().is_none());
    assert_eq!(h.view.last_saved().map(Record::id), Some(&RecordId::Int(3)));
    assert_eq!(h.mock.count("GET", "/vets/"), 2);
    assert_eq!(h.view.main_collection().len(), 3);
}

#[tokio::test]
async fn test_untouched_edit_puts_original_values() {
    let mut h = Harness::loaded("Pet").await;

    let record = h.main_record(1);
    h.view.edit(record);
    h.settle().await;
    h.view.submit_main_form();
    h.settle().await;

    assert_eq!(
        h.mock.last_body("PUT", "/pets/1"),
        Some(json!({"name": "Rex", "birth_date": "2020-01-01", "owner_id": 1}))
    );
    assert!(h.view.selected().is_none());
}

#[tokio::test]
async fn test_save_failure_keeps_form_open() {
    let mut h = Harness::loaded("Vet").await;
    h.mock.fail("PUT", "/vets/2", 422);

    let record = h.main_record(2);
    h.view.edit(record);
    h.view.submit_main_form();
    h.settle().await;

    let form = h.view.main_form().unwrap();
    assert_eq!(form.phase(), &FormPhase::Ready);
    assert!(matches!(
        form.submit_error(),
        Some(FetchError::Status { status: 422, .. })
    ));
    assert!(h.view.last_saved().is_none());
}

#[tokio::test]
async fn test_dropdown_options_fetched_once_per_mount() {
    let mut h = Harness::loaded("Pet").await;

    h.view.create_new();
    h.settle().await;
    h.view.close_main_form();
    let record = h.main_record(2);
    h.view.edit(record);
    h.settle().await;

    assert_eq!(h.mock.count("GET", "/owners/"), 1);
    assert!(h.view.resolver().is_cached("Owner"));
    assert_eq!(h.view.resolver().options("Owner").len(), 2);
}

#[tokio::test]
async fn test_failed_dropdown_is_retried_on_next_open() {
    let mut h = Harness::loaded("Pet").await;
    h.mock.fail("GET", "/owners/", 500);

    h.view.create_new();
    h.settle().await;
    assert!(!h.view.resolver().is_cached("Owner"));

    h.mock.clear_failures();
    h.view.close_main_form();
    h.view.create_new();
    h.settle().await;

    assert_eq!(h.mock.count("GET", "/owners/"), 2);
    assert!(h.view.resolver().is_cached("Owner"));
}

#[tokio::test]
async fn test_edit_by_id_loads_record() {
    let mut h = Harness::loaded("Vet").await;

    h.view.edit_by_id(RecordId::Int(2));
    assert_eq!(h.view.main_form().unwrap().phase(), &FormPhase::Loading);
    h.settle().await;

    let form = h.view.main_form().unwrap();
    assert_eq!(form.phase(), &FormPhase::Ready);
    assert_eq!(form.payload().get("last_name"), Some(&json!("Leary")));
}

#[tokio::test]
async fn test_edit_by_id_failure_is_shown() {
    let mut h = Harness::loaded("Vet").await;

    h.view.edit_by_id(RecordId::Int(99));
    h.settle().await;

    let form = h.view.main_form().unwrap();
    assert!(matches!(
        form.phase(),
        FormPhase::LoadFailed(FetchError::Status { status: 404, .. })
    ));
    h.view.submit_main_form();
    assert_eq!(h.view.in_flight(), 0);
}

#[tokio::test]
async fn test_save_after_form_closed_still_reloads() {
    let mut h = Harness::loaded("Vet").await;
    h.mock.hold("/vets/");

    h.view.create_new();
    h.view.main_form_mut().unwrap().set_text("first_name", "Linda");
    h.view.submit_main_form();
    h.view.close_main_form();
    h.mock.release("/vets/");
    h.settle().await;

    assert_eq!(h.mock.records("Vet").len(), 3);
    assert_eq!(h.mock.count("GET", "/vets/"), 2);
    assert_eq!(h.view.main_collection().len(), 3);
    assert_eq!(h.view.last_saved().map(Record::id), Some(&RecordId::Int(3)));
    assert!(h.view.main_form().is_none());
}

#[tokio::test]
async fn test_save_after_form_closed_keeps_newer_form() {
    let mut h = Harness::loaded("Vet").await;
    h.mock.hold("/vets/1");

    let record = h.main_record(1);
    h.view.edit(record);
    h.view.submit_main_form();
    h.view.close_main_form();
    h.view.create_new();
    h.mock.release("/vets/1");
    h.settle().await;

    assert_eq!(h.mock.count("GET", "/vets/"), 2);
    let form = h.view.main_form().unwrap();
    assert_eq!(form.mode(), &FormMode::Create);
    assert_eq!(form.phase(), &FormPhase::Ready);
}

#[tokio::test]
async fn test_failed_save_after_form_closed_is_silent() {
    let mut h = Harness::loaded("Vet").await;
    h.mock.fail("PUT", "/vets/1", 500);
    h.mock.hold("/vets/1");

    let record = h.main_record(1);
    h.view.edit(record);
    h.view.submit_main_form();
    h.view.close_main_form();
    h.mock.release("/vets/1");
    h.settle().await;

    assert_eq!(h.mock.count("GET", "/vets/"), 1);
    assert!(h.view.last_saved().is_none());
    assert!(h.view.take_notifications().is_empty());
}

#[tokio::test]
async fn test_related_save_after_form_closed_refreshes_tab() {
    let mut h = Harness::loaded("Owner").await;
    let record = h.main_record(1);
    h.view.select(record);
    h.settle().await;
    h.mock.hold("/pets/");

    h.view.add_related("pet").unwrap();
    h.view
        .related_form_mut()
        .unwrap()
        .form
        .set_text("name", "Max");
    h.view.submit_related_form();
    h.view.close_related_form();
    h.mock.release("/pets/");
    h.settle().await;

    assert_eq!(h.mock.count("GET", "/owners/1/pets"), 2);
    assert_eq!(h.view.related("pet").map(<[_]>::len), Some(2));
    assert!(h.view.related_form().is_none());
}

// ============================================================================
// DELETION
// ============================================================================

#[tokio::test]
async fn test_delete_requires_confirmation() {
    let mut h = Harness::loaded("Vet").await;

    let table = main_table(h.view.main_collection(), h.view.schema());
    let command = table.click(1, RowTarget::DeleteButton).unwrap();
    drop(table);
    h.view.apply(command);

    assert_eq!(h.view.delete_confirm().unwrap().id, RecordId::Int(2));
    assert!(h.mock.calls().iter().all(|c| c.method != "DELETE"));

    h.view.cancel_delete();
    assert!(h.view.delete_confirm().is_none());
    assert_eq!(h.view.in_flight(), 0);
}

#[tokio::test]
async fn test_failed_delete_leaves_state_unchanged() {
    let mut h = Harness::loaded("Vet").await;
    h.mock.fail("DELETE", "/vets/1", 500);

    h.view.delete(RecordId::Int(1));
    h.view.confirm_delete();
    h.settle().await;

    let confirm = h.view.delete_confirm().unwrap();
    assert!(!confirm.in_flight);
    assert!(confirm.error.is_some());
    assert_eq!(h.view.main_collection().len(), 2);
    assert_eq!(h.mock.count("GET", "/vets/"), 1);

    h.mock.clear_failures();
    h.view.confirm_delete();
    h.settle().await;

    assert!(h.view.delete_confirm().is_none());
    assert_eq!(h.view.main_collection().len(), 1);
}

#[tokio::test]
async fn test_related_delete_is_immediate_and_refreshes() {
    let mut h = Harness::loaded("Pet").await;
    let record = h.main_record(1);
    h.view.select(record);
    h.settle().await;

    h.view.apply(ViewCommand::DeleteRelated {
        relationship: "visit".to_string(),
        id: RecordId::Int(1),
    });
    h.settle().await;

    assert_eq!(h.mock.count("DELETE", "/visits/1"), 1);
    assert_eq!(h.mock.count("GET", "/pets/1/visits"), 2);
    assert_eq!(h.view.related("visit").map(<[_]>::len), Some(1));
    assert!(h.view.delete_confirm().is_none());
}

#[tokio::test]
async fn test_unknown_relationship_is_rejected() {
    let mut h = Harness::loaded("Pet").await;

    h.view.apply(ViewCommand::DeleteRelated {
        relationship: "owner".to_string(),
        id: RecordId::Int(1),
    });

    assert_eq!(h.view.in_flight(), 0);
    assert_eq!(h.view.take_notifications().len(), 1);
}

// ============================================================================
// RELATED FORMS
// ============================================================================

#[tokio::test]
async fn test_add_related_prefills_parent_and_refreshes() {
    let mut h = Harness::loaded("Owner").await;
    let record = h.main_record(1);
    h.view.select(record);
    h.settle().await;

    h.view.add_related("pet").unwrap();
    let related = h.view.related_form_mut().unwrap();
    assert_eq!(related.relationship, "pet");
    assert_eq!(parent_selection(&related.form, "owner_id"), Some(json!(1)));
    related.form.set_text("name", "Max");
    h.view.submit_related_form();
    h.settle().await;

    assert_eq!(
        h.mock.last_body("POST", "/pets/"),
        Some(json!({"name": "Max", "owner_id": 1}))
    );
    assert!(h.view.related_form().is_none());
    assert_eq!(h.mock.count("GET", "/owners/1/pets"), 2);
    assert_eq!(h.view.related("pet").map(<[_]>::len), Some(2));
    assert!(h.view.selected().is_some());
}

#[tokio::test]
async fn test_changing_parent_reference_sends_new_key() {
    let mut h = Harness::loaded("Pet").await;

    let record = h.main_record(1);
    h.view.edit(record);
    h.settle().await;
    let form = h.view.main_form_mut().unwrap();
    assert!(form.select_parent("Owner", Some(&RecordId::Int(2))));
    assert!(!form.select_parent("Vet", None));
    h.view.submit_main_form();
    h.settle().await;

    let body = h.mock.last_body("PUT", "/pets/1").unwrap();
    assert_eq!(body["owner_id"], json!(2));
    assert_eq!(body["name"], json!("Rex"));
}

#[tokio::test]
async fn test_edit_related_updates_child() {
    let mut h = Harness::loaded("Vet").await;
    let record = h.main_record(1);
    h.view.select(record);
    h.settle().await;

    let visit = h.view.related("visit").unwrap()[0].clone();
    h.view.edit_related("visit", visit).unwrap();
    h.view
        .related_form_mut()
        .unwrap()
        .form
        .set_text("description", "booster");
    h.view.submit_related_form();
    h.settle().await;

    let body = h.mock.last_body("PUT", "/visits/1").unwrap();
    assert_eq!(body["description"], json!("booster"));
    assert_eq!(body["pet_id"], json!(1));
    assert_eq!(h.mock.count("GET", "/vets/1/visits"), 2);
}

// ============================================================================
// APP
// ============================================================================

fn base_config() -> TuiConfig {
    TuiConfig {
        api_base_url: "http://localhost:9966/petclinic/api".to_string(),
        auth: AuthConfig::default(),
        request_timeout_ms: 5_000,
        refresh_interval_ms: 250,
        persistence_path: "tmp/clinic-tui.json".into(),
        log_path: "tmp/clinic-tui.log".into(),
        log_filter: "info".to_string(),
        model_path: None,
        theme: ThemeConfig {
            name: "dark".to_string(),
        },
    }
}

async fn settle_app(app: &mut App, rx: &mut mpsc::Receiver<TuiEvent>) {
    while app.view.in_flight() > 0 {
        let next = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("view work did not complete");
        match next {
            Some(TuiEvent::View { mount, event }) => app.handle_view_event(mount, event),
            Some(_) => {}
            None => panic!("event channel closed"),
        }
    }
}

#[tokio::test]
async fn test_switching_views_drops_old_completions() {
    let mock = Arc::new(fixtures::petclinic());
    let transport: Arc<dyn Transport> = mock.clone();
    let (tx, mut rx) = mpsc::channel(64);
    let mut app = App::new(base_config(), fixtures::registry(), transport, tx, Some("pet")).unwrap();
    assert_eq!(app.nav.active(), "Pet");
    let old_mount = app.view.mount();

    app.switch_view(2);
    settle_app(&mut app, &mut rx).await;

    assert_eq!(app.view.schema().name, "Vet");
    assert_ne!(app.view.mount(), old_mount);
    app.handle_view_event(
        old_mount,
        ViewEvent::MainLoaded {
            seq: 99,
            result: Ok(Vec::new()),
        },
    );
    assert_eq!(app.view.main_collection().len(), 2);
    assert_eq!(app.persisted_state().active_entity, "Vet");
}

#[tokio::test]
async fn test_command_palette_edit_opens_form() {
    let mock = Arc::new(fixtures::petclinic());
    let transport: Arc<dyn Transport> = mock.clone();
    let (tx, mut rx) = mpsc::channel(64);
    let mut app = App::new(base_config(), fixtures::registry(), transport, tx, Some("Vet")).unwrap();
    settle_app(&mut app, &mut rx).await;

    assert!(!app.run_command("edit 1"));
    settle_app(&mut app, &mut rx).await;

    let form = app.view.main_form().unwrap();
    assert_eq!(form.mode(), &FormMode::Edit(RecordId::Int(1)));
    assert_eq!(form.payload().get("first_name"), Some(&json!("James")));
    assert!(app.run_command("quit"));
}

#[tokio::test]
async fn test_tab_command_switches_related_tab() {
    let mock = Arc::new(fixtures::petclinic());
    let transport: Arc<dyn Transport> = mock.clone();
    let (tx, mut rx) = mpsc::channel(64);
    let mut app = App::new(base_config(), fixtures::registry(), transport, tx, Some("Pet")).unwrap();
    settle_app(&mut app, &mut rx).await;

    assert!(!app.run_command("tab visit"));
    assert_eq!(app.view.active_tab(), Some("visit"));

    assert!(!app.run_command("tab owner"));
    assert_eq!(app.view.active_tab(), Some("visit"));
    assert!(app.notifications.last().unwrap().message.contains("owner"));
}

// ============================================================================
// PROPERTIES
// ============================================================================

fn entity_collection() -> impl Strategy<Value = (Arc<EntitySchema>, Vec<Record>)> {
    let entities = fixtures::registry().entities().to_vec();
    (0..entities.len()).prop_flat_map(move |index| {
        let schema = Arc::clone(&entities[index]);
        (Just(Arc::clone(&schema)), arb_collection(schema, 6))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// The main table shows exactly the listed records, in listed order.
    #[test]
    fn prop_load_shows_listed_records_in_order((schema, records) in entity_collection()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let mock = MockTransport::new();
        for record in &records {
            mock.insert(&schema.name, Value::Object(record.clone().into_map()));
        }

        let (ids, rows) = runtime.block_on(async {
            let mut h = harness_with(fixtures::registry(), mock, &schema.name);
            h.view.load();
            h.settle().await;
            let ids: Vec<RecordId> = h.view.main_collection().iter().map(|r| r.id().clone()).collect();
            let rows = main_table(h.view.main_collection(), h.view.schema()).rows();
            (ids, rows)
        });

        let expected: Vec<RecordId> = records.iter().map(|r| r.id().clone()).collect();
        prop_assert_eq!(ids, expected);
        prop_assert_eq!(rows.len(), records.len());
        for (row, record) in rows.iter().zip(&records) {
            prop_assert_eq!(&row[0], &record.id().to_string());
            for (column, field) in schema.fields.iter().enumerate() {
                prop_assert_eq!(&row[column + 1], &record.display_value(&field.name));
            }
        }
    }
}
