//! Schema-driven record forms.
//!
//! A form has one input per scalar field and one dropdown per parent
//! reference. Opened on a record it edits that record; opened on an id it
//! loads the record first; opened on nothing it creates. Submitting yields a
//! [`SubmitRequest`] that the owning view sends.

use crate::resolver::DropdownOption;
use clinic_core::{
    EntitySchema, FetchError, FieldSpec, FieldType, Payload, Record, RecordId,
    RelationshipDescriptor, SchemaError, SchemaRegistry,
};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::style::{Modifier, Style};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tui_textarea::{CursorMove, TextArea};

/// What a form is opened on.
#[derive(Debug, Clone)]
pub enum FormSource {
    New,
    Record(Record),
    Id(RecordId),
}

/// Parent record a related form is created under. Its foreign key is
/// prefilled in create mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentContext {
    pub entity: String,
    pub id: RecordId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(RecordId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPhase {
    Loading,
    Ready,
    Submitting,
    /// The record to edit could not be loaded. Only cancel is possible.
    LoadFailed(FetchError),
}

/// Body and destination of a save.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitRequest {
    pub token: u64,
    pub entity: String,
    pub mode: FormMode,
    pub body: Payload,
}

pub struct ScalarInput {
    pub spec: FieldSpec,
    original: Option<Value>,
    editor: TextArea<'static>,
    dirty: bool,
}

impl ScalarInput {
    fn new(spec: FieldSpec, original: Option<Value>) -> Self {
        let text = match &original {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        let editor = editor_with(&text, spec.field_type);
        Self {
            spec,
            original,
            editor,
            dirty: false,
        }
    }

    pub fn editor(&self) -> &TextArea<'static> {
        &self.editor
    }

    pub fn text(&self) -> String {
        self.editor.lines().join("\n")
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn value(&self) -> Option<Value> {
        if self.dirty {
            Some(parse_input(&self.text(), self.spec.field_type))
        } else {
            self.original.clone()
        }
    }

    fn set_text(&mut self, text: &str) {
        self.editor = editor_with(text, self.spec.field_type);
        self.dirty = true;
    }
}

pub struct ParentInput {
    pub relationship: RelationshipDescriptor,
    key: String,
    original: Option<Value>,
    selected: Option<Value>,
    dirty: bool,
}

impl ParentInput {
    fn new(relationship: RelationshipDescriptor, original: Option<Value>) -> Self {
        let key = relationship.foreign_key();
        Self {
            relationship,
            key,
            selected: original.clone().filter(|v| !v.is_null()),
            original,
            dirty: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Currently chosen foreign key value, if any.
    pub fn selected(&self) -> Option<&Value> {
        self.selected.as_ref()
    }

    /// Label of the chosen option among `options`, falling back to the raw
    /// value when the options are not loaded.
    pub fn selected_label(&self, options: &[DropdownOption]) -> Option<String> {
        let value = self.selected.as_ref()?;
        let label = options
            .iter()
            .find(|o| o.id.matches(value))
            .map(|o| o.label.clone())
            .unwrap_or_else(|| match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
        Some(label)
    }

    fn value(&self) -> Option<Value> {
        if self.dirty {
            Some(self.selected.clone().unwrap_or(Value::Null))
        } else {
            self.original.clone()
        }
    }

    fn choose(&mut self, id: Option<&RecordId>) {
        self.selected = id.map(RecordId::to_value);
        self.dirty = true;
    }

    /// Step through `None` followed by each option.
    fn cycle(&mut self, options: &[DropdownOption], forward: bool) {
        let slots = options.len() + 1;
        let current = self
            .selected
            .as_ref()
            .and_then(|v| options.iter().position(|o| o.id.matches(v)))
            .map(|i| i + 1)
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % slots
        } else {
            (current + slots - 1) % slots
        };
        let choice = next.checked_sub(1).and_then(|i| options.get(i));
        self.choose(choice.map(|o| &o.id));
    }
}

pub enum FormInput {
    Scalar(ScalarInput),
    Parent(ParentInput),
}

impl FormInput {
    /// Payload key the input writes.
    pub fn key(&self) -> &str {
        match self {
            FormInput::Scalar(input) => &input.spec.name,
            FormInput::Parent(input) => &input.key,
        }
    }

    fn value(&self) -> Option<Value> {
        match self {
            FormInput::Scalar(input) => input.value(),
            FormInput::Parent(input) => input.value(),
        }
    }
}

pub struct FormState {
    token: u64,
    schema: Arc<EntitySchema>,
    mode: FormMode,
    phase: FormPhase,
    parent: Option<ParentContext>,
    inputs: Vec<FormInput>,
    focus: usize,
    submit_error: Option<FetchError>,
}

impl FormState {
    pub fn open(
        token: u64,
        schema: Arc<EntitySchema>,
        source: FormSource,
        parent: Option<ParentContext>,
    ) -> Self {
        let (mode, phase, record) = match source {
            FormSource::New => (FormMode::Create, FormPhase::Ready, None),
            FormSource::Record(record) => {
                (FormMode::Edit(record.id().clone()), FormPhase::Ready, Some(record))
            }
            FormSource::Id(id) => (FormMode::Edit(id), FormPhase::Loading, None),
        };
        let mut form = Self {
            token,
            inputs: build_inputs(&schema, record.as_ref()),
            schema,
            mode,
            phase,
            parent,
            focus: 0,
            submit_error: None,
        };
        if form.mode == FormMode::Create {
            form.prefill_parent();
        }
        form.refresh_cursor_styles();
        form
    }

    fn prefill_parent(&mut self) {
        let Some(parent) = self.parent.clone() else {
            return;
        };
        for input in &mut self.inputs {
            if let FormInput::Parent(input) = input {
                if input.relationship.target.eq_ignore_ascii_case(&parent.entity) {
                    input.choose(Some(&parent.id));
                }
            }
        }
    }

    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn phase(&self) -> &FormPhase {
        &self.phase
    }

    pub fn parent(&self) -> Option<&ParentContext> {
        self.parent.as_ref()
    }

    pub fn inputs(&self) -> &[FormInput] {
        &self.inputs
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn submit_error(&self) -> Option<&FetchError> {
        self.submit_error.as_ref()
    }

    pub fn title(&self) -> String {
        match self.mode {
            FormMode::Create => format!("Create {}", self.schema.name),
            FormMode::Edit(_) => format!("Edit {}", self.schema.name),
        }
    }

    /// Id still to be loaded before the form is usable.
    pub fn pending_load(&self) -> Option<&RecordId> {
        match (&self.phase, &self.mode) {
            (FormPhase::Loading, FormMode::Edit(id)) => Some(id),
            _ => None,
        }
    }

    /// Fill the inputs from a freshly loaded record.
    pub fn populate(&mut self, record: Record) {
        if self.phase != FormPhase::Loading {
            return;
        }
        self.mode = FormMode::Edit(record.id().clone());
        self.inputs = build_inputs(&self.schema, Some(&record));
        self.phase = FormPhase::Ready;
        self.refresh_cursor_styles();
    }

    pub fn load_failed(&mut self, err: FetchError) {
        self.phase = FormPhase::LoadFailed(err);
    }

    /// The request body: parsed values of touched inputs, original values of
    /// untouched ones. Fields absent from the original record and never
    /// touched are omitted.
    pub fn payload(&self) -> Payload {
        let mut body = Payload::new();
        for input in &self.inputs {
            if let Some(value) = input.value() {
                body.insert(input.key().to_string(), value);
            }
        }
        body
    }

    /// Move to `Submitting` and build the request. `None` unless ready.
    pub fn begin_submit(&mut self) -> Option<SubmitRequest> {
        if self.phase != FormPhase::Ready {
            return None;
        }
        self.phase = FormPhase::Submitting;
        self.submit_error = None;
        Some(SubmitRequest {
            token: self.token,
            entity: self.schema.name.clone(),
            mode: self.mode.clone(),
            body: self.payload(),
        })
    }

    /// A failed save keeps the form open with the error shown.
    pub fn submit_failed(&mut self, err: FetchError) {
        if self.phase == FormPhase::Submitting {
            self.phase = FormPhase::Ready;
        }
        self.submit_error = Some(err);
    }

    pub fn focus_next(&mut self) {
        if !self.inputs.is_empty() {
            self.focus = (self.focus + 1) % self.inputs.len();
            self.refresh_cursor_styles();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.inputs.is_empty() {
            self.focus = (self.focus + self.inputs.len() - 1) % self.inputs.len();
            self.refresh_cursor_styles();
        }
    }

    /// Dropdown target of the focused input, if it is a parent reference.
    pub fn focused_target(&self) -> Option<&str> {
        match self.inputs.get(self.focus) {
            Some(FormInput::Parent(input)) => Some(&input.relationship.target),
            _ => None,
        }
    }

    /// Feed a key to the focused input. Left/Right step a dropdown through
    /// `options`; everything else goes to the text editor.
    pub fn handle_key(&mut self, key: KeyEvent, options: &[DropdownOption]) -> bool {
        if self.phase != FormPhase::Ready {
            return false;
        }
        match self.inputs.get_mut(self.focus) {
            Some(FormInput::Parent(input)) => match key.code {
                KeyCode::Right => {
                    input.cycle(options, true);
                    true
                }
                KeyCode::Left => {
                    input.cycle(options, false);
                    true
                }
                KeyCode::Backspace | KeyCode::Delete => {
                    input.choose(None);
                    true
                }
                _ => false,
            },
            Some(FormInput::Scalar(input)) => {
                let changed = input.editor.input(key);
                if changed {
                    input.dirty = true;
                }
                changed
            }
            None => false,
        }
    }

    /// Replace the text of a scalar field. Returns false if there is none.
    pub fn set_text(&mut self, field: &str, text: &str) -> bool {
        for input in &mut self.inputs {
            if let FormInput::Scalar(input) = input {
                if input.spec.name == field {
                    input.set_text(text);
                    self.refresh_cursor_styles();
                    return true;
                }
            }
        }
        false
    }

    /// Choose a parent record for the dropdown targeting `target`.
    pub fn select_parent(&mut self, target: &str, id: Option<&RecordId>) -> bool {
        for input in &mut self.inputs {
            if let FormInput::Parent(input) = input {
                if input.relationship.target.eq_ignore_ascii_case(target) {
                    input.choose(id);
                    return true;
                }
            }
        }
        false
    }

    fn refresh_cursor_styles(&mut self) {
        let focus = self.focus;
        for (index, input) in self.inputs.iter_mut().enumerate() {
            if let FormInput::Scalar(input) = input {
                let cursor = if index == focus {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                };
                input.editor.set_cursor_style(cursor);
            }
        }
    }
}

fn build_inputs(schema: &EntitySchema, record: Option<&Record>) -> Vec<FormInput> {
    let original = |key: &str| record.and_then(|r| r.get(key)).cloned();
    let mut inputs: Vec<FormInput> = schema
        .fields
        .iter()
        .map(|spec| FormInput::Scalar(ScalarInput::new(spec.clone(), original(&spec.name))))
        .collect();
    inputs.extend(schema.parent_references().map(|rel| {
        let value = original(&rel.foreign_key());
        FormInput::Parent(ParentInput::new(rel.clone(), value))
    }));
    inputs
}

fn editor_with(text: &str, field_type: FieldType) -> TextArea<'static> {
    let mut editor = TextArea::new(vec![text.to_string()]);
    editor.set_cursor_line_style(Style::default());
    editor.set_placeholder_text(field_type.placeholder());
    editor.move_cursor(CursorMove::End);
    editor
}

/// Convert input text to the JSON value sent for a field of `field_type`.
/// Text that does not parse is sent as typed and left to the server.
pub fn parse_input(text: &str, field_type: FieldType) -> Value {
    let trimmed = text.trim();
    match field_type {
        FieldType::Text | FieldType::Email => Value::String(text.to_string()),
        FieldType::Date | FieldType::DateTime => {
            if trimmed.is_empty() {
                Value::Null
            } else {
                Value::String(trimmed.to_string())
            }
        }
        FieldType::Number => {
            if trimmed.is_empty() {
                Value::Null
            } else if let Ok(n) = trimmed.parse::<i64>() {
                Value::from(n)
            } else if let Some(n) = trimmed
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
            {
                Value::Number(n)
            } else {
                Value::String(text.to_string())
            }
        }
        FieldType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "" => Value::Null,
            "true" | "yes" | "1" => Value::Bool(true),
            "false" | "no" | "0" => Value::Bool(false),
            _ => Value::String(text.to_string()),
        },
    }
}

/// A per-entity form factory.
pub trait FormCapability: Send + Sync {
    fn open(&self, token: u64, source: FormSource, parent: Option<ParentContext>) -> FormState;
}

/// Form generated directly from an entity schema.
pub struct SchemaForm {
    schema: Arc<EntitySchema>,
}

impl SchemaForm {
    pub fn new(schema: Arc<EntitySchema>) -> Self {
        Self { schema }
    }
}

impl FormCapability for SchemaForm {
    fn open(&self, token: u64, source: FormSource, parent: Option<ParentContext>) -> FormState {
        FormState::open(token, Arc::clone(&self.schema), source, parent)
    }
}

/// Entity name to form capability.
#[derive(Default)]
pub struct FormRegistry {
    forms: HashMap<String, Arc<dyn FormCapability>>,
}

impl FormRegistry {
    /// One [`SchemaForm`] per registered entity.
    pub fn from_schemas(registry: &SchemaRegistry) -> Self {
        let mut forms = Self::default();
        for schema in registry.entities() {
            forms.register(&schema.name, Arc::new(SchemaForm::new(Arc::clone(schema))));
        }
        forms
    }

    pub fn register(&mut self, entity: &str, form: Arc<dyn FormCapability>) {
        self.forms.insert(entity.to_lowercase(), form);
    }

    pub fn open(
        &self,
        entity: &str,
        token: u64,
        source: FormSource,
        parent: Option<ParentContext>,
    ) -> Result<FormState, SchemaError> {
        let form = self
            .forms
            .get(&entity.to_lowercase())
            .ok_or_else(|| SchemaError::UnknownEntity(entity.to_string()))?;
        Ok(form.open(token, source, parent))
    }
}
