use crate::field::FieldValue;
use crate::model::{Priority, TaskDraft, TaskId};
use crate::store::Planner;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Tasks,
    Notes,
}

#[derive(Debug, Default)]
pub enum Modal {
    #[default]
    Closed,
    Open(DayModal),
}

/// Everything the day dialog edits while it is open on `date`.
#[derive(Debug)]
pub struct DayModal {
    date: NaiveDate,
    pub tab: Tab,
    pub selected: usize,
    pub form: Option<TaskForm>,
    pub note: FieldValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Title,
    Description,
    Priority,
}

#[derive(Debug)]
pub struct TaskForm {
    pub title: FieldValue,
    pub description: FieldValue,
    pub priority: Priority,
    pub field: TaskField,
}

impl Tab {
    pub fn label(&self) -> &'static str {
        match self {
            Tab::Tasks => "To-Do List",
            Tab::Notes => "Notes",
        }
    }

    fn other(self) -> Self {
        match self {
            Tab::Tasks => Tab::Notes,
            Tab::Notes => Tab::Tasks,
        }
    }
}

impl Modal {
    /// Opens on `date`, or moves an already open dialog to `date`.
    /// The sub-view survives a date change; the note buffer does not.
    pub fn open(&mut self, date: NaiveDate, planner: &Planner) {
        match self {
            Modal::Open(day) => day.set_date(date, planner),
            Modal::Closed => *self = Modal::Open(DayModal::new(date, planner)),
        }
    }

    pub fn close(&mut self) {
        *self = Modal::Closed;
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Modal::Open(_))
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Modal::Open(day) => Some(day.date),
            Modal::Closed => None,
        }
    }

    pub fn day(&self) -> Option<&DayModal> {
        match self {
            Modal::Open(day) => Some(day),
            Modal::Closed => None,
        }
    }

    pub fn day_mut(&mut self) -> Option<&mut DayModal> {
        match self {
            Modal::Open(day) => Some(day),
            Modal::Closed => None,
        }
    }
}

impl DayModal {
    fn new(date: NaiveDate, planner: &Planner) -> Self {
        let mut day = DayModal {
            date,
            tab: Tab::Tasks,
            selected: 0,
            form: None,
            note: FieldValue::default(),
        };
        day.load_note(planner);
        day
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn set_date(&mut self, date: NaiveDate, planner: &Planner) {
        self.date = date;
        self.selected = 0;
        self.load_note(planner);
    }

    pub fn switch_tab(&mut self) {
        self.tab = self.tab.other();
    }

    pub fn begin_task(&mut self) {
        if self.form.is_none() {
            self.form = Some(TaskForm::new());
        }
    }

    pub fn cancel_task(&mut self) {
        self.form = None;
    }

    /// Adds the drafted task on this dialog's date. A blank title keeps the
    /// form open and changes nothing.
    pub fn submit_task(&mut self, planner: &mut Planner) -> Option<TaskId> {
        let draft = self.form.as_ref()?.draft();
        let id = planner.add_task(draft, Some(self.date))?.id.clone();
        self.form = None;
        self.selected = planner.tasks_on(self.date).len().saturating_sub(1);
        Some(id)
    }

    pub fn save_note(&mut self, planner: &mut Planner) {
        planner.upsert_note_for_date(self.date, self.note.value.clone());
    }

    pub fn selected_task_id(&self, planner: &Planner) -> Option<TaskId> {
        planner
            .tasks_on(self.date)
            .get(self.selected)
            .map(|t| t.id.clone())
    }

    pub fn select_next(&mut self, planner: &Planner) {
        if self.selected + 1 < planner.tasks_on(self.date).len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn toggle_selected(&mut self, planner: &mut Planner) -> bool {
        let Some(id) = self.selected_task_id(planner) else {
            return false;
        };
        let next = match planner.task(&id) {
            Some(task) => task.status.toggled_complete(),
            None => return false,
        };
        planner.update_task_status(&id, next)
    }

    pub fn cycle_selected(&mut self, planner: &mut Planner) -> bool {
        let Some(id) = self.selected_task_id(planner) else {
            return false;
        };
        let next = match planner.task(&id) {
            Some(task) => task.status.next(),
            None => return false,
        };
        planner.update_task_status(&id, next)
    }

    pub fn delete_selected(&mut self, planner: &mut Planner) -> Option<TaskId> {
        let id = self.selected_task_id(planner)?;
        planner.delete_task(&id);
        let remaining = planner.tasks_on(self.date).len();
        self.selected = self.selected.min(remaining.saturating_sub(1));
        Some(id)
    }

    fn load_note(&mut self, planner: &Planner) {
        let content = planner
            .note_for_date(self.date)
            .map(|n| n.content.as_str())
            .unwrap_or_default();
        self.note = FieldValue::new(content);
    }
}

impl TaskForm {
    pub fn new() -> Self {
        TaskForm {
            title: FieldValue::default(),
            description: FieldValue::default(),
            priority: Priority::default(),
            field: TaskField::Title,
        }
    }

    pub fn next_field(&mut self) {
        self.field = match self.field {
            TaskField::Title => TaskField::Description,
            TaskField::Description => TaskField::Priority,
            TaskField::Priority => TaskField::Title,
        };
    }

    pub fn prev_field(&mut self) {
        self.field = match self.field {
            TaskField::Title => TaskField::Priority,
            TaskField::Description => TaskField::Title,
            TaskField::Priority => TaskField::Description,
        };
    }

    /// Text field under the cursor, `None` while the priority picker is focused.
    pub fn active_text_mut(&mut self) -> Option<&mut FieldValue> {
        match self.field {
            TaskField::Title => Some(&mut self.title),
            TaskField::Description => Some(&mut self.description),
            TaskField::Priority => None,
        }
    }

    fn draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.value.clone(),
            description: self.description.value.clone(),
            priority: self.priority,
        }
    }
}

impl Default for TaskForm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn type_text(field: &mut FieldValue, text: &str) {
        for ch in text.chars() {
            field.insert_char(ch);
        }
    }

    #[test]
    fn open_and_close() {
        let planner = Planner::new();
        let mut modal = Modal::default();
        assert!(!modal.is_open());
        modal.open(ymd(2024, 5, 5), &planner);
        assert_eq!(modal.date(), Some(ymd(2024, 5, 5)));
        modal.close();
        assert!(modal.date().is_none());
    }

    #[test]
    fn note_buffer_follows_date() {
        let mut planner = Planner::new();
        planner.upsert_note_for_date(ymd(2024, 5, 5), "pack bags");
        let mut modal = Modal::default();
        modal.open(ymd(2024, 5, 5), &planner);
        assert_eq!(modal.day().unwrap().note.value, "pack bags");

        modal.open(ymd(2024, 5, 6), &planner);
        assert_eq!(modal.day().unwrap().note.value, "");
    }

    #[test]
    fn switching_tab_keeps_date() {
        let planner = Planner::new();
        let mut modal = Modal::default();
        modal.open(ymd(2024, 5, 5), &planner);
        let day = modal.day_mut().unwrap();
        day.switch_tab();
        assert_eq!(day.tab, Tab::Notes);
        assert_eq!(day.date(), ymd(2024, 5, 5));
        modal.open(ymd(2024, 5, 9), &planner);
        assert_eq!(modal.day().unwrap().tab, Tab::Notes);
    }

    #[test]
    fn submit_adds_task_on_open_date_and_resets_form() {
        let mut planner = Planner::new();
        let mut modal = Modal::default();
        modal.open(ymd(2024, 8, 1), &planner);
        let day = modal.day_mut().unwrap();

        day.begin_task();
        assert!(day.submit_task(&mut planner).is_none());
        assert!(day.form.is_some());

        let form = day.form.as_mut().unwrap();
        type_text(&mut form.title, "Call bank");
        form.priority = Priority::High;
        let id = day.submit_task(&mut planner).unwrap();
        assert!(day.form.is_none());
        let task = planner.task(&id).unwrap();
        assert_eq!(task.date, ymd(2024, 8, 1));
        assert_eq!(task.priority, Priority::High);
    }

    #[test]
    fn task_actions_apply_to_selection() {
        let mut planner = Planner::new();
        let date = ymd(2024, 8, 1);
        for title in ["one", "two"] {
            planner.add_task(
                TaskDraft {
                    title: title.into(),
                    ..TaskDraft::default()
                },
                Some(date),
            );
        }
        let mut modal = Modal::default();
        modal.open(date, &planner);
        let day = modal.day_mut().unwrap();
        day.select_next(&planner);
        day.select_next(&planner);
        assert_eq!(day.selected, 1);

        assert!(day.toggle_selected(&mut planner));
        assert_eq!(planner.tasks_on(date)[1].status, Status::Completed);
        assert!(day.toggle_selected(&mut planner));
        assert_eq!(planner.tasks_on(date)[1].status, Status::NotStarted);
        assert!(day.cycle_selected(&mut planner));
        assert_eq!(planner.tasks_on(date)[1].status, Status::InProgress);

        day.delete_selected(&mut planner);
        assert_eq!(day.selected, 0);
        assert_eq!(planner.tasks_on(date)[0].title, "one");
        day.delete_selected(&mut planner);
        assert!(day.delete_selected(&mut planner).is_none());
        assert!(!day.toggle_selected(&mut planner));
    }

    #[test]
    fn save_note_round_trip() {
        let mut planner = Planner::new();
        let date = ymd(2024, 8, 1);
        planner.upsert_note_for_date(date, "old");
        let mut modal = Modal::default();
        modal.open(date, &planner);
        let day = modal.day_mut().unwrap();
        day.note.clear();
        type_text(&mut day.note, "x");
        day.save_note(&mut planner);
        assert_eq!(planner.note_for_date(date).unwrap().content, "x");
        assert_eq!(planner.notes().len(), 1);
    }
}
