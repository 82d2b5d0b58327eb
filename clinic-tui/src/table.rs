//! Generic record table.
//!
//! Columns come from the entity schema: `ID`, each declared field in order,
//! then `Actions` when an edit or delete handler is present. Handlers turn a
//! click into a message for the owning view; a click on an action cell
//! never also counts as a row selection.

use clinic_core::{EntitySchema, Record, RecordId};
use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

pub type RecordHandler<'a, M> = Box<dyn Fn(&Record) -> M + 'a>;
pub type IdHandler<'a, M> = Box<dyn Fn(&RecordId) -> M + 'a>;

/// Part of a row that received a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowTarget {
    Row,
    EditButton,
    DeleteButton,
}

pub struct TableHandlers<'a, M> {
    pub on_select: Option<RecordHandler<'a, M>>,
    pub on_edit: Option<RecordHandler<'a, M>>,
    pub on_delete: Option<IdHandler<'a, M>>,
}

impl<M> Default for TableHandlers<'_, M> {
    fn default() -> Self {
        Self {
            on_select: None,
            on_edit: None,
            on_delete: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableStyle {
    pub border: Style,
    pub header: Style,
    pub highlight: Style,
}

pub struct RecordTable<'a, M> {
    collection: &'a [Record],
    schema: &'a EntitySchema,
    handlers: TableHandlers<'a, M>,
}

impl<'a, M> RecordTable<'a, M> {
    pub fn new(collection: &'a [Record], schema: &'a EntitySchema) -> Self {
        Self {
            collection,
            schema,
            handlers: TableHandlers::default(),
        }
    }

    pub fn on_select(mut self, handler: impl Fn(&Record) -> M + 'a) -> Self {
        self.handlers.on_select = Some(Box::new(handler));
        self
    }

    pub fn on_edit(mut self, handler: impl Fn(&Record) -> M + 'a) -> Self {
        self.handlers.on_edit = Some(Box::new(handler));
        self
    }

    pub fn on_delete(mut self, handler: impl Fn(&RecordId) -> M + 'a) -> Self {
        self.handlers.on_delete = Some(Box::new(handler));
        self
    }

    pub fn has_actions(&self) -> bool {
        self.handlers.on_edit.is_some() || self.handlers.on_delete.is_some()
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    pub fn headers(&self) -> Vec<String> {
        let mut headers = Vec::with_capacity(self.schema.fields.len() + 2);
        headers.push("ID".to_string());
        headers.extend(self.schema.fields.iter().map(|f| f.name.clone()));
        if self.has_actions() {
            headers.push("Actions".to_string());
        }
        headers
    }

    /// Cell text for one record. Missing or null values render empty.
    pub fn row_cells(&self, record: &Record) -> Vec<String> {
        let mut cells = Vec::with_capacity(self.schema.fields.len() + 2);
        cells.push(record.id().to_string());
        cells.extend(
            self.schema
                .fields
                .iter()
                .map(|f| record.display_value(&f.name)),
        );
        if self.has_actions() {
            cells.push(self.action_text());
        }
        cells
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        self.collection.iter().map(|r| self.row_cells(r)).collect()
    }

    fn action_text(&self) -> String {
        let mut actions = Vec::new();
        if self.handlers.on_edit.is_some() {
            actions.push("[e] Edit");
        }
        if self.handlers.on_delete.is_some() {
            actions.push("[d] Delete");
        }
        actions.join("  ")
    }

    /// Dispatch a click on row `index`. Returns the handler's message, or
    /// `None` when the row or handler does not exist.
    pub fn click(&self, index: usize, target: RowTarget) -> Option<M> {
        let record = self.collection.get(index)?;
        match target {
            RowTarget::Row => self.handlers.on_select.as_ref().map(|h| h(record)),
            RowTarget::EditButton => self.handlers.on_edit.as_ref().map(|h| h(record)),
            RowTarget::DeleteButton => self.handlers.on_delete.as_ref().map(|h| h(record.id())),
        }
    }

    pub fn render(
        &self,
        f: &mut Frame<'_>,
        area: Rect,
        title: &str,
        selected: Option<usize>,
        style: &TableStyle,
    ) {
        let header = Row::new(self.headers().into_iter().map(Cell::from)).style(style.header);
        let rows: Vec<Row> = self
            .rows()
            .into_iter()
            .map(|cells| Row::new(cells.into_iter().map(Cell::from)))
            .collect();

        let mut widths = vec![Constraint::Length(6)];
        widths.extend(self.schema.fields.iter().map(|_| Constraint::Min(10)));
        if self.has_actions() {
            widths.push(Constraint::Length(20));
        }

        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .title(title.to_string())
                    .borders(Borders::ALL)
                    .border_style(style.border),
            )
            .highlight_style(style.highlight)
            .highlight_symbol("> ");

        let mut state = TableState::default();
        state.select(selected.filter(|i| *i < self.collection.len()));
        f.render_stateful_widget(table, area, &mut state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinic_core::{FieldType, RelationshipKind};
    use serde_json::json;

    #[derive(Debug, PartialEq)]
    enum Msg {
        Select(RecordId),
        Edit(RecordId),
        Delete(RecordId),
    }

    fn pet_schema() -> EntitySchema {
        EntitySchema::new("Pet")
            .with_field("name", FieldType::Text)
            .with_field("birth_date", FieldType::Date)
            .with_relationship("Owner", RelationshipKind::ParentReference)
    }

    fn pets() -> Vec<Record> {
        vec![
            Record::from_value(json!({"id": 1, "name": "Rex", "birth_date": "2020-01-01", "owner_id": 1}))
                .unwrap(),
            Record::from_value(json!({"id": 2, "name": "Leo", "birth_date": null})).unwrap(),
        ]
    }

    #[test]
    fn test_headers_without_actions() {
        let schema = pet_schema();
        let records = pets();
        let table: RecordTable<'_, Msg> = RecordTable::new(&records, &schema);
        assert_eq!(table.headers(), vec!["ID", "name", "birth_date"]);
        assert_eq!(table.rows()[0], vec!["1", "Rex", "2020-01-01"]);
    }

    #[test]
    fn test_null_renders_empty() {
        let schema = pet_schema();
        let records = pets();
        let table: RecordTable<'_, Msg> = RecordTable::new(&records, &schema);
        assert_eq!(table.rows()[1], vec!["2", "Leo", ""]);
    }

    #[test]
    fn test_actions_column() {
        let schema = pet_schema();
        let records = pets();
        let table = RecordTable::new(&records, &schema).on_delete(|id| Msg::Delete(id.clone()));
        assert_eq!(table.headers().last().map(String::as_str), Some("Actions"));
        assert_eq!(table.rows()[0].last().map(String::as_str), Some("[d] Delete"));
    }

    #[test]
    fn test_click_dispatch_does_not_bubble() {
        let schema = pet_schema();
        let records = pets();
        let table = RecordTable::new(&records, &schema)
            .on_select(|r| Msg::Select(r.id().clone()))
            .on_edit(|r| Msg::Edit(r.id().clone()))
            .on_delete(|id| Msg::Delete(id.clone()));

        assert_eq!(table.click(0, RowTarget::Row), Some(Msg::Select(RecordId::Int(1))));
        assert_eq!(table.click(1, RowTarget::EditButton), Some(Msg::Edit(RecordId::Int(2))));
        assert_eq!(
            table.click(0, RowTarget::DeleteButton),
            Some(Msg::Delete(RecordId::Int(1)))
        );
        assert_eq!(table.click(5, RowTarget::Row), None);
    }

    #[test]
    fn test_absent_handler_is_inert() {
        let schema = pet_schema();
        let records = pets();
        let table = RecordTable::new(&records, &schema).on_edit(|r| Msg::Edit(r.id().clone()));
        assert_eq!(table.click(0, RowTarget::Row), None);
        assert_eq!(table.click(0, RowTarget::DeleteButton), None);
    }
}
