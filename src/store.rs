use crate::index::{first_on_date, records_on_date};
use crate::model::{Note, NoteId, Status, Task, TaskDraft, TaskId};
use chrono::{NaiveDate, Utc};
use log::{debug, info};
use rand::{distributions::Alphanumeric, Rng};

const ID_LEN: usize = 6;

/// In-memory tasks and notes for the running session.
///
/// Notes are kept one per date: the only way to write a note is
/// [`Planner::upsert_note_for_date`], which overwrites the existing note for
/// that date instead of adding a second one.
#[derive(Debug, Default)]
pub struct Planner {
    tasks: Vec<Task>,
    notes: Vec<Note>,
}

impl Planner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn tasks_on(&self, date: NaiveDate) -> Vec<&Task> {
        records_on_date(&self.tasks, date)
    }

    pub fn note_for_date(&self, date: NaiveDate) -> Option<&Note> {
        first_on_date(&self.notes, date)
    }

    /// Appends a new task on `date`. Returns `None` without touching the
    /// collection when the title is blank or no date is selected.
    pub fn add_task(&mut self, draft: TaskDraft, date: Option<NaiveDate>) -> Option<&Task> {
        let date = date?;
        if draft.title.trim().is_empty() {
            debug!("event=task_add status=skipped reason=empty_title");
            return None;
        }
        let id = self.fresh_id(|p, id| p.task(id).is_some());
        let task = Task::new(id, draft, date);
        info!(
            "event=task_add status=ok id={} date={} priority={}",
            task.id,
            task.date,
            task.priority.label()
        );
        self.tasks.push(task);
        self.tasks.last()
    }

    /// Returns whether a task with `id` was found.
    pub fn update_task_status(&mut self, id: &str, status: Status) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                task.status = status;
                info!("event=task_status id={} status={}", id, status.label());
                true
            }
            None => {
                debug!("event=task_status status=missing id={}", id);
                false
            }
        }
    }

    pub fn delete_task(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        let removed = self.tasks.len() != before;
        if removed {
            info!("event=task_delete id={}", id);
        }
        removed
    }

    pub fn upsert_note_for_date(&mut self, date: NaiveDate, content: impl Into<String>) -> &Note {
        let content = content.into();
        let idx = match self.notes.iter().position(|n| n.date == date) {
            Some(idx) => {
                let note = &mut self.notes[idx];
                note.content = content;
                note.updated_at = Utc::now();
                info!("event=note_upsert status=updated id={} date={}", note.id, date);
                idx
            }
            None => {
                let id: NoteId = self.fresh_id(|p, id| p.notes.iter().any(|n| n.id == id));
                info!("event=note_upsert status=created id={} date={}", id, date);
                self.notes.push(Note::new(id, content, date));
                self.notes.len() - 1
            }
        };
        &self.notes[idx]
    }

    fn fresh_id(&self, taken: impl Fn(&Self, &str) -> bool) -> TaskId {
        loop {
            let id = generate_id();
            if !taken(self, &id) {
                return id;
            }
        }
    }
}

fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft(title: &str) -> TaskDraft {
        TaskDraft {
            title: title.into(),
            description: "details".into(),
            priority: Priority::Low,
        }
    }

    #[test]
    fn add_task_assigns_id_and_not_started() {
        let mut planner = Planner::new();
        let task = planner.add_task(draft("Dentist"), Some(ymd(2024, 4, 2))).cloned().unwrap();
        assert_eq!(task.id.len(), ID_LEN);
        assert_eq!(task.status, Status::NotStarted);
        assert_eq!(planner.tasks().len(), 1);
        assert_eq!(planner.tasks_on(ymd(2024, 4, 2))[0].title, "Dentist");
    }

    #[test]
    fn blank_title_or_missing_date_is_a_no_op() {
        let mut planner = Planner::new();
        for title in ["", "   ", "\t\n"] {
            assert!(planner.add_task(draft(title), Some(ymd(2024, 4, 2))).is_none());
        }
        assert!(planner.add_task(draft("Real"), None).is_none());
        assert!(planner.tasks().is_empty());
    }

    #[test]
    fn ids_are_unique() {
        let mut planner = Planner::new();
        for i in 0..200 {
            planner.add_task(draft(&format!("t{i}")), Some(ymd(2024, 1, 1)));
        }
        let mut ids: Vec<&str> = planner.tasks().iter().map(|t| t.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 200);
    }

    #[test]
    fn status_update_is_visible_through_date_query() {
        let mut planner = Planner::new();
        let date = ymd(2024, 7, 4);
        let id = planner.add_task(draft("Fireworks"), Some(date)).unwrap().id.clone();
        assert!(planner.update_task_status(&id, Status::InProgress));
        assert_eq!(planner.tasks_on(date)[0].status, Status::InProgress);
    }

    #[test]
    fn unknown_ids_are_no_ops() {
        let mut planner = Planner::new();
        planner.add_task(draft("Keep"), Some(ymd(2024, 7, 4)));
        assert!(!planner.update_task_status("missing", Status::Completed));
        assert!(!planner.delete_task("missing"));
        assert_eq!(planner.tasks().len(), 1);
        assert_eq!(planner.tasks()[0].status, Status::NotStarted);
    }

    #[test]
    fn delete_removes_only_matching_task() {
        let mut planner = Planner::new();
        let date = ymd(2024, 7, 4);
        let a = planner.add_task(draft("a"), Some(date)).unwrap().id.clone();
        planner.add_task(draft("b"), Some(date));
        assert!(planner.delete_task(&a));
        let left: Vec<&str> = planner.tasks_on(date).iter().map(|t| t.title.as_str()).collect();
        assert_eq!(left, vec!["b"]);
    }

    #[test]
    fn upsert_note_overwrites_per_date() {
        let mut planner = Planner::new();
        let date = ymd(2024, 2, 29);
        assert!(planner.note_for_date(date).is_none());

        let first_id = planner.upsert_note_for_date(date, "draft").id.clone();
        planner.upsert_note_for_date(date, "x");
        assert_eq!(planner.notes().len(), 1);
        let note = planner.note_for_date(date).unwrap();
        assert_eq!(note.content, "x");
        assert_eq!(note.id, first_id);

        planner.upsert_note_for_date(ymd(2024, 3, 1), "");
        assert_eq!(planner.notes().len(), 2);
        assert_eq!(planner.note_for_date(ymd(2024, 3, 1)).unwrap().content, "");
    }
}
