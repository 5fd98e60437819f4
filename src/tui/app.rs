use std::path::Path;
use chrono::Local;
use ratatui::widgets::TableState;
use crate::error::Result;
use crate::filter::{apply, DateRange, FilterSortSpec, SortOrder};
use crate::models::{RecurringTemplate, Task};
use crate::storage::JsonDirStore;
use crate::tasks::TaskBook;
use crate::templates::TemplateStore;

#[derive(PartialEq)]
pub enum InputMode {
    Normal,
    Search,
}

#[derive(PartialEq)]
pub enum ViewMode {
    Tasks,
    Templates,
}

pub struct App {
    book: TaskBook<JsonDirStore>,
    store: TemplateStore<JsonDirStore>,
    /// Tasks after the current filter and sort.
    pub visible: Vec<Task>,
    pub spec: FilterSortSpec,
    pub state: TableState,
    pub template_state: TableState,
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    pub input_buffer: String,
    /// Status line shown under the table.
    pub message: Option<String>,
}

impl App {
    /// Opens both stores in `dir` and materializes templates that came due
    /// while the app was closed.
    pub fn new(dir: &Path) -> Result<App> {
        let kv = JsonDirStore::open(dir)?;
        let mut app = App {
            book: TaskBook::open(kv.clone()),
            store: TemplateStore::open(kv),
            visible: Vec::new(),
            spec: FilterSortSpec::default(),
            state: TableState::default(),
            template_state: TableState::default(),
            view_mode: ViewMode::Tasks,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            message: None,
        };
        app.run_due();
        app.refresh();
        Ok(app)
    }

    pub fn templates(&self) -> &[RecurringTemplate] {
        self.store.list()
    }

    fn run_due(&mut self) {
        let now = Local::now().naive_local();
        let book = &mut self.book;
        let result = self.store.run_due_with(now, |d| book.insert(d, now));
        match result {
            Ok(created) if !created.is_empty() => {
                self.message = Some(format!("{} recurring task(s) created", created.len()));
            }
            Ok(_) => {}
            Err(e) => self.message = Some(e.to_string()),
        }
    }

    /// Re-applies the filter and keeps the selection in bounds.
    pub fn refresh(&mut self) {
        self.visible = apply(self.book.tasks(), &self.spec, Local::now().date_naive());
        clamp_selection(&mut self.state, self.visible.len());
        clamp_selection(&mut self.template_state, self.store.list().len());
    }

    fn current_len(&self) -> usize {
        match self.view_mode {
            ViewMode::Tasks => self.visible.len(),
            ViewMode::Templates => self.store.list().len(),
        }
    }

    fn current_state(&mut self) -> &mut TableState {
        match self.view_mode {
            ViewMode::Tasks => &mut self.state,
            ViewMode::Templates => &mut self.template_state,
        }
    }

    /// Selects the next item in the current list.
    pub fn next(&mut self) {
        let len = self.current_len();
        if len == 0 { return; }
        let state = self.current_state();
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    /// Selects the previous item in the current list.
    pub fn previous(&mut self) {
        let len = self.current_len();
        if len == 0 { return; }
        let state = self.current_state();
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    fn selected_task_id(&self) -> Option<u64> {
        self.state.selected().and_then(|i| self.visible.get(i)).map(|t| t.id)
    }

    fn selected_template_id(&self) -> Option<u64> {
        self.template_state
            .selected()
            .and_then(|i| self.store.list().get(i))
            .map(|t| t.id)
    }

    /// Moves the selected task to the next board column.
    pub fn advance_selected(&mut self) {
        let Some(id) = self.selected_task_id() else { return };
        let Some(status) = self.book.get(id).map(|t| t.status.advance()) else { return };
        let result = self.book.set_status(id, status).map(|t| format!("Task {} is now {}", t.id, t.status));
        self.report(result);
    }

    /// Deletes the selected task or template.
    pub fn delete_selected(&mut self) {
        match self.view_mode {
            ViewMode::Tasks => {
                let Some(id) = self.selected_task_id() else { return };
                let result = self.book.remove(id).map(|t| format!("Task {} removed", t.id));
                self.report(result);
            }
            ViewMode::Templates => {
                let Some(id) = self.selected_template_id() else { return };
                let result = self.store.delete(id).map(|t| format!("Template '{}' removed", t.title));
                self.report(result);
            }
        }
    }

    /// Creates a task from the selected template.
    pub fn run_selected_template(&mut self) {
        let Some(id) = self.selected_template_id() else { return };
        let now = Local::now().naive_local();
        let book = &mut self.book;
        let result = match self.store.run_now_with(id, now, |d| book.insert(d, now)) {
            Ok(Some(task)) => Ok(format!("Task {} created", task.id)),
            Ok(None) => Ok(format!("Template {} is inactive", id)),
            Err(e) => Err(e),
        };
        self.report(result);
    }

    pub fn toggle_selected_template(&mut self) {
        let Some(id) = self.selected_template_id() else { return };
        let result = self.store.toggle_active(id).map(|active| {
            format!("Template {} {}", id, if active { "activated" } else { "deactivated" })
        });
        self.report(result);
    }

    pub fn cycle_sort(&mut self) {
        self.spec.sort_by = self.spec.sort_by.next();
        self.refresh();
    }

    pub fn toggle_order(&mut self) {
        self.spec.sort_order = match self.spec.sort_order {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        };
        self.refresh();
    }

    pub fn cycle_range(&mut self) {
        self.spec.date_range = match self.spec.date_range {
            DateRange::All => DateRange::Today,
            DateRange::Today => DateRange::Week,
            DateRange::Week => DateRange::Month,
            DateRange::Month => DateRange::Overdue,
            DateRange::Overdue | DateRange::Custom { .. } => DateRange::All,
        };
        self.refresh();
    }

    pub fn start_search(&mut self) {
        self.input_mode = InputMode::Search;
        self.input_buffer = self.spec.query.clone();
    }

    /// Applies the search box contents as the text filter.
    pub fn handle_input(&mut self) {
        self.spec.query = std::mem::take(&mut self.input_buffer);
        self.input_mode = InputMode::Normal;
        self.refresh();
    }

    pub fn toggle_view(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Tasks => ViewMode::Templates,
            ViewMode::Templates => ViewMode::Tasks,
        };
    }

    fn report(&mut self, result: Result<String>) {
        self.message = Some(match result {
            Ok(msg) => msg,
            Err(e) => format!("Error: {}", e),
        });
        self.refresh();
    }
}

fn clamp_selection(state: &mut TableState, len: usize) {
    if len == 0 {
        state.select(None);
    } else {
        match state.selected() {
            Some(i) if i >= len => state.select(Some(len - 1)),
            None => state.select(Some(0)),
            _ => {}
        }
    }
}
