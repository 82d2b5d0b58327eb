//! Master-detail view controller.
//!
//! One controller drives one mounted entity view: the main collection, the
//! selected record and its nested collections, and the main form, delete
//! confirmation and related form overlays. Transitions run on the UI loop;
//! network work is spawned and reports back as a [`ViewEvent`] tagged with
//! the mount id.
//!
//! Completions are matched against the state that started them:
//! - main loads carry a sequence number and never overwrite a newer load
//! - related fetches carry the selection generation, so a cascade for a
//!   record that is no longer selected is discarded
//! - form completions carry the form token and are dropped once that form
//!   is closed or replaced

use crate::events::TuiEvent;
use crate::form::{FormMode, FormRegistry, FormSource, FormState, ParentContext, SubmitRequest};
use crate::notifications::{Notification, NotificationLevel};
use crate::resolver::RelationshipResolver;
use crate::table::RecordTable;
use clinic_core::{
    EntitySchema, FetchError, Record, RecordId, RelationshipDescriptor, SchemaError, Transport,
};
use crossterm::event::KeyEvent;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Which overlay a form completion belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormSlot {
    Main,
    Related,
}

/// Completion of background work, applied by [`MasterDetailController::handle_event`].
#[derive(Debug)]
pub enum ViewEvent {
    MainLoaded {
        seq: u64,
        result: Result<Vec<Record>, FetchError>,
    },
    RelatedLoaded {
        generation: u64,
        relationship: String,
        result: Result<Vec<Record>, FetchError>,
    },
    MainDeleted {
        id: RecordId,
        result: Result<(), FetchError>,
    },
    RelatedDeleted {
        relationship: String,
        id: RecordId,
        result: Result<(), FetchError>,
    },
    OptionsLoaded {
        target: String,
        result: Result<Vec<Record>, FetchError>,
    },
    FormLoaded {
        slot: FormSlot,
        token: u64,
        result: Result<Record, FetchError>,
    },
    FormSaved {
        slot: FormSlot,
        token: u64,
        /// Relationship a related form was saved under.
        relationship: Option<String>,
        result: Result<Record, FetchError>,
    },
}

/// Messages produced by table handlers.
#[derive(Debug, Clone)]
pub enum ViewCommand {
    Select(Record),
    Edit(Record),
    Delete(RecordId),
    EditRelated { relationship: String, record: Record },
    DeleteRelated { relationship: String, id: RecordId },
}

/// Pending main-record deletion awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteConfirm {
    pub id: RecordId,
    pub in_flight: bool,
    pub error: Option<FetchError>,
}

pub struct RelatedForm {
    pub relationship: String,
    pub form: FormState,
}

pub struct MasterDetailController {
    mount: u64,
    schema: Arc<EntitySchema>,
    forms: Arc<FormRegistry>,
    transport: Arc<dyn Transport>,
    events: mpsc::Sender<TuiEvent>,
    resolver: RelationshipResolver,

    main: Vec<Record>,
    loaded: bool,
    main_error: Option<FetchError>,
    load_seq: u64,
    applied_seq: u64,

    selected: Option<Record>,
    generation: u64,
    related: HashMap<String, Vec<Record>>,
    active_tab: Option<String>,

    main_form: Option<FormState>,
    delete_confirm: Option<DeleteConfirm>,
    related_form: Option<RelatedForm>,
    next_token: u64,

    in_flight: usize,
    last_saved: Option<Record>,
    notices: Vec<Notification>,
}

impl MasterDetailController {
    pub fn new(
        mount: u64,
        schema: Arc<EntitySchema>,
        forms: Arc<FormRegistry>,
        transport: Arc<dyn Transport>,
        events: mpsc::Sender<TuiEvent>,
    ) -> Self {
        let active_tab = schema.nested_collections().next().map(|r| r.name());
        Self {
            mount,
            resolver: RelationshipResolver::new(Arc::clone(&transport)),
            schema,
            forms,
            transport,
            events,
            main: Vec::new(),
            loaded: false,
            main_error: None,
            load_seq: 0,
            applied_seq: 0,
            selected: None,
            generation: 0,
            related: HashMap::new(),
            active_tab,
            main_form: None,
            delete_confirm: None,
            related_form: None,
            next_token: 0,
            in_flight: 0,
            last_saved: None,
            notices: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn mount(&self) -> u64 {
        self.mount
    }

    pub fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    pub fn main_collection(&self) -> &[Record] {
        &self.main
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn main_error(&self) -> Option<&FetchError> {
        self.main_error.as_ref()
    }

    pub fn selected(&self) -> Option<&Record> {
        self.selected.as_ref()
    }

    /// Cached collection for a nested relationship. `None` until fetched.
    pub fn related(&self, relationship: &str) -> Option<&[Record]> {
        self.related
            .get(&relationship.to_lowercase())
            .map(Vec::as_slice)
    }

    pub fn related_cache(&self) -> &HashMap<String, Vec<Record>> {
        &self.related
    }

    pub fn active_tab(&self) -> Option<&str> {
        self.active_tab.as_deref()
    }

    pub fn main_form(&self) -> Option<&FormState> {
        self.main_form.as_ref()
    }

    pub fn main_form_mut(&mut self) -> Option<&mut FormState> {
        self.main_form.as_mut()
    }

    pub fn related_form(&self) -> Option<&RelatedForm> {
        self.related_form.as_ref()
    }

    pub fn related_form_mut(&mut self) -> Option<&mut RelatedForm> {
        self.related_form.as_mut()
    }

    pub fn delete_confirm(&self) -> Option<&DeleteConfirm> {
        self.delete_confirm.as_ref()
    }

    pub fn resolver(&self) -> &RelationshipResolver {
        &self.resolver
    }

    /// Spawned tasks whose completion has not been applied yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Record returned by the most recent successful save.
    pub fn last_saved(&self) -> Option<&Record> {
        self.last_saved.as_ref()
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notices)
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Fetch the main collection.
    pub fn load(&mut self) {
        self.load_seq += 1;
        let seq = self.load_seq;
        let transport = Arc::clone(&self.transport);
        let entity = self.schema.name.clone();
        tracing::debug!(entity = %entity, seq, "Loading main collection");
        self.spawn(async move {
            let result = transport.list(&entity).await;
            ViewEvent::MainLoaded { seq, result }
        });
    }

    /// Open an empty main form. Selection and related data are dropped so
    /// the form cannot inherit a previously selected record.
    pub fn create_new(&mut self) {
        self.clear_selection();
        self.main_form = self.open_form(FormSource::New, None, FormSlot::Main);
    }

    /// Open the main form on `record` and show its related data.
    pub fn edit(&mut self, record: Record) {
        self.begin_selection(record.clone());
        self.main_form = self.open_form(FormSource::Record(record), None, FormSlot::Main);
    }

    /// Open the main form on a record known only by id.
    pub fn edit_by_id(&mut self, id: RecordId) {
        self.main_form = self.open_form(FormSource::Id(id), None, FormSlot::Main);
    }

    pub fn select(&mut self, record: Record) {
        self.begin_selection(record);
    }

    pub fn delete(&mut self, id: RecordId) {
        self.delete_confirm = Some(DeleteConfirm {
            id,
            in_flight: false,
            error: None,
        });
    }

    pub fn cancel_delete(&mut self) {
        self.delete_confirm = None;
    }

    pub fn confirm_delete(&mut self) {
        let Some(confirm) = self.delete_confirm.as_mut() else {
            return;
        };
        if confirm.in_flight {
            return;
        }
        confirm.in_flight = true;
        confirm.error = None;
        let id = confirm.id.clone();
        let transport = Arc::clone(&self.transport);
        let entity = self.schema.name.clone();
        self.spawn(async move {
            let result = transport.delete(&entity, &id).await;
            ViewEvent::MainDeleted { id, result }
        });
    }

    /// Open a create form for a nested relationship of the selected record.
    pub fn add_related(&mut self, relationship: &str) -> Result<(), SchemaError> {
        let rel = self.nested_relationship(relationship)?;
        let parent = self.selected.as_ref().map(|record| ParentContext {
            entity: self.schema.name.clone(),
            id: record.id().clone(),
        });
        let form = self.open_related_form(&rel, FormSource::New, parent)?;
        self.related_form = Some(RelatedForm {
            relationship: rel.name(),
            form,
        });
        Ok(())
    }

    pub fn edit_related(&mut self, relationship: &str, record: Record) -> Result<(), SchemaError> {
        let rel = self.nested_relationship(relationship)?;
        let form = self.open_related_form(&rel, FormSource::Record(record), None)?;
        self.related_form = Some(RelatedForm {
            relationship: rel.name(),
            form,
        });
        Ok(())
    }

    /// Delete a related record immediately; there is no confirmation step.
    pub fn delete_related(&mut self, relationship: &str, id: RecordId) -> Result<(), SchemaError> {
        let rel = self.nested_relationship(relationship)?;
        let transport = Arc::clone(&self.transport);
        let relationship = rel.name();
        self.spawn(async move {
            let result = transport.delete(&rel.target, &id).await;
            ViewEvent::RelatedDeleted {
                relationship,
                id,
                result,
            }
        });
        Ok(())
    }

    /// Main form saved: close it, drop the selection and reload.
    pub fn form_success(&mut self, saved: Record) {
        self.main_form = None;
        self.clear_selection();
        self.notify(
            NotificationLevel::Success,
            format!("Saved {} {}", self.schema.name, saved.id()),
        );
        self.last_saved = Some(saved);
        self.load();
    }

    /// Related form saved: close it and refresh that relationship.
    pub fn related_form_success(&mut self, saved: Record) {
        let Some(closed) = self.related_form.take() else {
            return;
        };
        self.notify(
            NotificationLevel::Success,
            format!("Saved {} {}", closed.form.schema().name, saved.id()),
        );
        self.last_saved = Some(saved);
        self.refresh_relationship(&closed.relationship);
    }

    pub fn close_main_form(&mut self) {
        self.main_form = None;
    }

    pub fn close_related_form(&mut self) {
        self.related_form = None;
    }

    pub fn submit_main_form(&mut self) {
        let Some(request) = self.main_form.as_mut().and_then(FormState::begin_submit) else {
            return;
        };
        self.spawn_submit(FormSlot::Main, None, request);
    }

    pub fn submit_related_form(&mut self) {
        let Some((relationship, request)) = self
            .related_form
            .as_mut()
            .and_then(|r| Some((r.relationship.clone(), r.form.begin_submit()?)))
        else {
            return;
        };
        self.spawn_submit(FormSlot::Related, Some(relationship), request);
    }

    /// Route a key to the open form in `slot`, with the dropdown options of
    /// its focused input.
    pub fn form_key(&mut self, slot: FormSlot, key: KeyEvent) -> bool {
        let form = match slot {
            FormSlot::Main => self.main_form.as_mut(),
            FormSlot::Related => self.related_form.as_mut().map(|r| &mut r.form),
        };
        let Some(form) = form else {
            return false;
        };
        let options = form
            .focused_target()
            .map(|target| self.resolver.options(target))
            .unwrap_or(&[]);
        form.handle_key(key, options)
    }

    pub fn set_active_tab(&mut self, relationship: &str) -> bool {
        match self.nested_relationship(relationship) {
            Ok(rel) => {
                self.active_tab = Some(rel.name());
                true
            }
            Err(_) => false,
        }
    }

    pub fn next_tab(&mut self) {
        self.step_tab(true);
    }

    pub fn previous_tab(&mut self) {
        self.step_tab(false);
    }

    pub fn apply(&mut self, command: ViewCommand) {
        let outcome = match command {
            ViewCommand::Select(record) => {
                self.select(record);
                Ok(())
            }
            ViewCommand::Edit(record) => {
                self.edit(record);
                Ok(())
            }
            ViewCommand::Delete(id) => {
                self.delete(id);
                Ok(())
            }
            ViewCommand::EditRelated {
                relationship,
                record,
            } => self.edit_related(&relationship, record),
            ViewCommand::DeleteRelated { relationship, id } => {
                self.delete_related(&relationship, id)
            }
        };
        if let Err(err) = outcome {
            tracing::error!(entity = %self.schema.name, error = %err, "View command rejected");
            self.notify(NotificationLevel::Error, err.to_string());
        }
    }

    // ------------------------------------------------------------------
    // Completions
    // ------------------------------------------------------------------

    pub fn handle_event(&mut self, event: ViewEvent) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match event {
            ViewEvent::MainLoaded { seq, result } => self.on_main_loaded(seq, result),
            ViewEvent::RelatedLoaded {
                generation,
                relationship,
                result,
            } => self.on_related_loaded(generation, relationship, result),
            ViewEvent::MainDeleted { id, result } => self.on_main_deleted(id, result),
            ViewEvent::RelatedDeleted {
                relationship,
                id,
                result,
            } => self.on_related_deleted(relationship, id, result),
            ViewEvent::OptionsLoaded { target, result } => self.on_options_loaded(target, result),
            ViewEvent::FormLoaded {
                slot,
                token,
                result,
            } => self.on_form_loaded(slot, token, result),
            ViewEvent::FormSaved {
                slot,
                token,
                relationship,
                result,
            } => self.on_form_saved(slot, token, relationship, result),
        }
    }

    fn on_main_loaded(&mut self, seq: u64, result: Result<Vec<Record>, FetchError>) {
        if seq <= self.applied_seq {
            tracing::debug!(entity = %self.schema.name, seq, "Discarding superseded load");
            return;
        }
        self.applied_seq = seq;
        match result {
            Ok(records) => {
                tracing::debug!(entity = %self.schema.name, count = records.len(), "Main collection loaded");
                self.main = records;
                self.loaded = true;
                self.main_error = None;
            }
            Err(err) => {
                tracing::warn!(entity = %self.schema.name, error = %err, "Main collection load failed");
                self.notify(
                    NotificationLevel::Error,
                    format!("Loading {} failed: {}", self.schema.collection_segment(), err),
                );
                self.main_error = Some(err);
            }
        }
    }

    fn on_related_loaded(
        &mut self,
        generation: u64,
        relationship: String,
        result: Result<Vec<Record>, FetchError>,
    ) {
        if generation != self.generation || self.selected.is_none() {
            tracing::debug!(%relationship, generation, "Discarding related data for stale selection");
            return;
        }
        match result {
            Ok(records) => {
                self.related.insert(relationship, records);
            }
            Err(err) => {
                tracing::warn!(%relationship, error = %err, "Related fetch failed");
                self.notify(
                    NotificationLevel::Warning,
                    format!("Loading {} failed: {}", relationship, err),
                );
            }
        }
    }

    fn on_main_deleted(&mut self, id: RecordId, result: Result<(), FetchError>) {
        let pending = self.delete_confirm.as_mut().filter(|c| c.id == id);
        match result {
            Ok(()) => {
                if pending.is_some() {
                    self.delete_confirm = None;
                }
                tracing::info!(entity = %self.schema.name, %id, "Deleted");
                self.notify(
                    NotificationLevel::Success,
                    format!("Deleted {} {}", self.schema.name, id),
                );
                self.load();
            }
            Err(err) => {
                if let Some(confirm) = pending {
                    confirm.in_flight = false;
                    confirm.error = Some(err.clone());
                }
                tracing::warn!(entity = %self.schema.name, %id, error = %err, "Delete failed");
                self.notify(NotificationLevel::Error, format!("Delete failed: {}", err));
            }
        }
    }

    fn on_related_deleted(
        &mut self,
        relationship: String,
        id: RecordId,
        result: Result<(), FetchError>,
    ) {
        match result {
            Ok(()) => {
                tracing::info!(%relationship, %id, "Related record deleted");
                self.refresh_relationship(&relationship);
            }
            Err(err) => {
                tracing::warn!(%relationship, %id, error = %err, "Related delete failed");
                self.notify(NotificationLevel::Error, format!("Delete failed: {}", err));
            }
        }
    }

    fn on_options_loaded(&mut self, target: String, result: Result<Vec<Record>, FetchError>) {
        match self.resolver.complete(&target, result) {
            Ok(count) => tracing::debug!(target_entity = %target, count, "Dropdown options loaded"),
            Err(err) => {
                tracing::warn!(target_entity = %target, error = %err, "Dropdown options failed");
                self.notify(
                    NotificationLevel::Warning,
                    format!("{} options unavailable: {}", target, err),
                );
            }
        }
    }

    fn on_form_loaded(&mut self, slot: FormSlot, token: u64, result: Result<Record, FetchError>) {
        let Some(form) = self.form_slot_mut(slot, token) else {
            tracing::debug!(?slot, token, "Discarding load for closed form");
            return;
        };
        match result {
            Ok(record) => form.populate(record),
            Err(err) => {
                form.load_failed(err.clone());
                tracing::warn!(?slot, error = %err, "Form record load failed");
                self.notify(NotificationLevel::Error, format!("Loading record failed: {}", err));
            }
        }
    }

    fn on_form_saved(
        &mut self,
        slot: FormSlot,
        token: u64,
        relationship: Option<String>,
        result: Result<Record, FetchError>,
    ) {
        if self.form_slot_mut(slot, token).is_none() {
            self.on_detached_save(slot, token, relationship, result);
            return;
        }
        match result {
            Ok(saved) => match slot {
                FormSlot::Main => self.form_success(saved),
                FormSlot::Related => self.related_form_success(saved),
            },
            Err(err) => {
                tracing::warn!(?slot, error = %err, "Save failed");
                self.notify(NotificationLevel::Error, format!("Save failed: {}", err));
                if let Some(form) = self.form_slot_mut(slot, token) {
                    form.submit_failed(err);
                }
            }
        }
    }

    /// A save whose form was closed or replaced meanwhile. The server state
    /// changed, so the affected collection is still refreshed; only the form
    /// feedback is dropped.
    fn on_detached_save(
        &mut self,
        slot: FormSlot,
        token: u64,
        relationship: Option<String>,
        result: Result<Record, FetchError>,
    ) {
        let saved = match result {
            Ok(saved) => saved,
            Err(err) => {
                tracing::debug!(?slot, token, error = %err, "Discarding failed save for closed form");
                return;
            }
        };
        tracing::debug!(?slot, token, id = %saved.id(), "Save completed after its form closed");
        self.last_saved = Some(saved);
        match (slot, relationship) {
            (FormSlot::Main, _) => self.load(),
            (FormSlot::Related, Some(relationship)) => self.refresh_relationship(&relationship),
            (FormSlot::Related, None) => {}
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ViewEvent> + Send + 'static,
    {
        self.in_flight += 1;
        let sender = self.events.clone();
        let mount = self.mount;
        tokio::spawn(async move {
            let event = task.await;
            let _ = sender.send(TuiEvent::View { mount, event }).await;
        });
    }

    fn spawn_submit(
        &mut self,
        slot: FormSlot,
        relationship: Option<String>,
        request: SubmitRequest,
    ) {
        let transport = Arc::clone(&self.transport);
        self.spawn(async move {
            let result = match &request.mode {
                FormMode::Create => transport.create(&request.entity, &request.body).await,
                FormMode::Edit(id) => {
                    transport
                        .update(&request.entity, id, &request.body)
                        .await
                }
            };
            ViewEvent::FormSaved {
                slot,
                token: request.token,
                relationship,
                result,
            }
        });
    }

    fn form_slot_mut(&mut self, slot: FormSlot, token: u64) -> Option<&mut FormState> {
        let form = match slot {
            FormSlot::Main => self.main_form.as_mut(),
            FormSlot::Related => self.related_form.as_mut().map(|r| &mut r.form),
        };
        form.filter(|f| f.token() == token)
    }

    fn clear_selection(&mut self) {
        self.selected = None;
        self.related.clear();
        self.generation += 1;
    }

    fn begin_selection(&mut self, record: Record) {
        self.generation += 1;
        self.related.clear();
        let id = record.id().clone();
        self.selected = Some(record);
        let nested: Vec<RelationshipDescriptor> =
            self.schema.nested_collections().cloned().collect();
        for rel in &nested {
            self.fetch_related(&id, rel);
        }
    }

    fn fetch_related(&mut self, id: &RecordId, rel: &RelationshipDescriptor) {
        let generation = self.generation;
        let transport = Arc::clone(&self.transport);
        let parent = self.schema.name.clone();
        let child = rel.target.clone();
        let relationship = rel.name();
        let id = id.clone();
        self.spawn(async move {
            let result = transport.list_nested(&parent, &id, &child).await;
            ViewEvent::RelatedLoaded {
                generation,
                relationship,
                result,
            }
        });
    }

    /// Re-fetch one relationship if a record is still selected.
    fn refresh_relationship(&mut self, relationship: &str) {
        let Some(id) = self.selected.as_ref().map(|r| r.id().clone()) else {
            return;
        };
        if let Ok(rel) = self.nested_relationship(relationship) {
            self.fetch_related(&id, &rel);
        }
    }

    fn nested_relationship(&self, name: &str) -> Result<RelationshipDescriptor, SchemaError> {
        self.schema
            .relationship(name)
            .filter(|r| r.is_nested_collection())
            .cloned()
            .ok_or_else(|| SchemaError::NotNestedCollection(name.to_string()))
    }

    fn open_form(
        &mut self,
        source: FormSource,
        parent: Option<ParentContext>,
        slot: FormSlot,
    ) -> Option<FormState> {
        let entity = self.schema.name.clone();
        match self.open_form_for(&entity, source, parent, slot) {
            Ok(form) => Some(form),
            Err(err) => {
                tracing::error!(%entity, error = %err, "No form registered");
                self.notify(NotificationLevel::Error, err.to_string());
                None
            }
        }
    }

    fn open_related_form(
        &mut self,
        rel: &RelationshipDescriptor,
        source: FormSource,
        parent: Option<ParentContext>,
    ) -> Result<FormState, SchemaError> {
        self.open_form_for(&rel.target, source, parent, FormSlot::Related)
    }

    fn open_form_for(
        &mut self,
        entity: &str,
        source: FormSource,
        parent: Option<ParentContext>,
        slot: FormSlot,
    ) -> Result<FormState, SchemaError> {
        self.next_token += 1;
        let token = self.next_token;
        let form = self.forms.open(entity, token, source, parent)?;

        if let Some(id) = form.pending_load().cloned() {
            let transport = Arc::clone(&self.transport);
            let entity = entity.to_string();
            self.spawn(async move {
                let result = transport.get(&entity, &id).await;
                ViewEvent::FormLoaded {
                    slot,
                    token,
                    result,
                }
            });
        }

        let schema = Arc::clone(form.schema());
        for rel in schema.parent_references() {
            match self.resolver.resolve_options(rel) {
                Ok(Some(fetch)) => self.spawn(async move {
                    let target = fetch.target().to_string();
                    let result = fetch.run().await;
                    ViewEvent::OptionsLoaded { target, result }
                }),
                Ok(None) => {}
                Err(err) => tracing::error!(error = %err, "Dropdown requested for non-parent relationship"),
            }
        }
        Ok(form)
    }

    fn step_tab(&mut self, forward: bool) {
        let names: Vec<String> = self.schema.nested_collections().map(|r| r.name()).collect();
        if names.is_empty() {
            return;
        }
        let current = self
            .active_tab
            .as_ref()
            .and_then(|t| names.iter().position(|n| n == t))
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % names.len()
        } else {
            (current + names.len() - 1) % names.len()
        };
        self.active_tab = Some(names[next].clone());
    }

    fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.notices.push(Notification::new(level, message));
    }
}

/// Main table with row selection, edit and delete.
pub fn main_table<'a>(
    collection: &'a [Record],
    schema: &'a EntitySchema,
) -> RecordTable<'a, ViewCommand> {
    RecordTable::new(collection, schema)
        .on_select(|record| ViewCommand::Select(record.clone()))
        .on_edit(|record| ViewCommand::Edit(record.clone()))
        .on_delete(|id| ViewCommand::Delete(id.clone()))
}

/// Table for one nested relationship: edit and delete, no selection.
pub fn related_table<'a>(
    collection: &'a [Record],
    schema: &'a EntitySchema,
    relationship: &'a str,
) -> RecordTable<'a, ViewCommand> {
    RecordTable::new(collection, schema)
        .on_edit(move |record| ViewCommand::EditRelated {
            relationship: relationship.to_string(),
            record: record.clone(),
        })
        .on_delete(move |id| ViewCommand::DeleteRelated {
            relationship: relationship.to_string(),
            id: id.clone(),
        })
}
