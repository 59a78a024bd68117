use crate::index::counts_by_date;
use crate::model::{Note, Priority, Status, Task};
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub total: usize,
    pub not_started: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub overdue: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub notes: usize,
    /// Date with the most tasks; the earliest such date on a tie.
    pub busiest_day: Option<(NaiveDate, usize)>,
}

impl Summary {
    pub fn collect(tasks: &[Task], notes: &[Note]) -> Self {
        let mut summary = Summary {
            total: tasks.len(),
            notes: notes.len(),
            busiest_day: counts_by_date(tasks)
                .into_iter()
                .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0))),
            ..Summary::default()
        };
        for task in tasks {
            match task.status {
                Status::NotStarted => summary.not_started += 1,
                Status::InProgress => summary.in_progress += 1,
                Status::Completed => summary.completed += 1,
                Status::Overdue => summary.overdue += 1,
            }
            match task.priority {
                Priority::High => summary.high += 1,
                Priority::Medium => summary.medium += 1,
                Priority::Low => summary.low += 1,
            }
        }
        summary
    }

    /// Completed share as a whole percent, rounded half up. Zero when empty.
    pub fn completion_rate(&self) -> u16 {
        percent(self.completed, self.total)
    }

    pub fn priority_count(&self, priority: Priority) -> usize {
        match priority {
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }

    pub fn priority_share(&self, priority: Priority) -> u16 {
        percent(self.priority_count(priority), self.total)
    }
}

fn percent(part: usize, whole: usize) -> u16 {
    if whole == 0 {
        return 0;
    }
    ((part * 200 + whole) / (whole * 2)) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskDraft;

    fn task(priority: Priority, status: Status) -> Task {
        let draft = TaskDraft {
            title: "t".into(),
            description: String::new(),
            priority,
        };
        let mut task = Task::new("id".into(), draft, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        task.status = status;
        task
    }

    #[test]
    fn empty_board_has_zero_rate() {
        let summary = Summary::collect(&[], &[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.completion_rate(), 0);
        assert_eq!(summary.priority_share(Priority::High), 0);
    }

    #[test]
    fn counts_statuses_and_priorities() {
        let tasks = vec![
            task(Priority::High, Status::Completed),
            task(Priority::High, Status::InProgress),
            task(Priority::Low, Status::Overdue),
        ];
        let summary = Summary::collect(&tasks, &[]);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.in_progress, 1);
        assert_eq!(summary.overdue, 1);
        assert_eq!(summary.not_started, 0);
        assert_eq!(summary.high, 2);
        assert_eq!(summary.medium, 0);
        // 1/3 -> 33, 2/3 -> 67
        assert_eq!(summary.completion_rate(), 33);
        assert_eq!(summary.priority_share(Priority::High), 67);
    }

    #[test]
    fn half_rounds_up() {
        let tasks = vec![
            task(Priority::Medium, Status::Completed),
            task(Priority::Medium, Status::NotStarted),
            task(Priority::Medium, Status::NotStarted),
            task(Priority::Medium, Status::NotStarted),
            task(Priority::Medium, Status::NotStarted),
            task(Priority::Medium, Status::NotStarted),
            task(Priority::Medium, Status::NotStarted),
            task(Priority::Medium, Status::NotStarted),
        ];
        // 1/8 = 12.5%
        assert_eq!(Summary::collect(&tasks, &[]).completion_rate(), 13);
    }

    #[test]
    fn busiest_day_prefers_earliest_on_tie() {
        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
        let mut tasks = vec![
            task(Priority::Low, Status::NotStarted),
            task(Priority::Low, Status::NotStarted),
            task(Priority::Low, Status::NotStarted),
            task(Priority::Low, Status::NotStarted),
        ];
        tasks[0].date = day(9);
        tasks[1].date = day(9);
        tasks[2].date = day(4);
        tasks[3].date = day(4);
        assert_eq!(Summary::collect(&tasks, &[]).busiest_day, Some((day(4), 2)));
        tasks[3].date = day(9);
        assert_eq!(Summary::collect(&tasks, &[]).busiest_day, Some((day(9), 3)));
        assert_eq!(Summary::collect(&[], &[]).busiest_day, None);
    }
}
