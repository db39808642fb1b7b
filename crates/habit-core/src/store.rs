//! State container for the habit collection.
//!
//! The store owns every [`Habit`] for the session. Changes are expressed as
//! [`Action`]s; each one is validated, applied, followed by a full
//! recomputation of the touched habit's derived stats, and then saved through
//! the repository. If saving fails the in-memory change is kept and the
//! caller gets [`HabitError::Storage`].

use crate::day::Day;
use crate::error::{HabitError, HabitResult};
use crate::models::{validate_name, Goal, Habit, HabitId, NewHabit, COLORS, ICONS};
use crate::storage::HabitRepository;
use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

/// A change requested by the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Create a habit stamped with `created_at`.
    AddHabit {
        request: NewHabit,
        created_at: DateTime<Local>,
    },
    /// Delete a habit and its completions.
    DeleteHabit(HabitId),
    /// Mark or unmark a day.
    ToggleCompletion { id: HabitId, day: Day },
    /// Change the goal.
    UpdateGoal { id: HabitId, goal: Goal },
    /// Change the display name.
    RenameHabit { id: HabitId, name: String },
}

/// The habit collection plus the repository it is saved to.
pub struct HabitStore<R: HabitRepository> {
    habits: Vec<Habit>,
    repo: R,
}

impl<R: HabitRepository> HabitStore<R> {
    /// Load habits from the repository, recomputing derived stats.
    ///
    /// Stored stats are not trusted: they may have been written on an earlier
    /// day or by an older engine.
    pub fn load(repo: R, today: Day) -> HabitResult<Self> {
        let mut habits = repo.load()?;
        let stale = habits
            .iter_mut()
            .map(|h| h.recompute(today))
            .filter(|changed| *changed)
            .count();
        if stale > 0 {
            warn!(stale, "recomputed outdated streak data on load");
        }
        info!(count = habits.len(), %today, "loaded habits");
        Ok(Self { habits, repo })
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn get(&self, id: HabitId) -> Option<&Habit> {
        self.habits.iter().find(|h| h.id == id)
    }

    pub fn len(&self) -> usize {
        self.habits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.habits.is_empty()
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Apply an action and save. Returns the id of the affected habit.
    pub fn dispatch(&mut self, action: Action, today: Day) -> HabitResult<HabitId> {
        let id = self.apply(action, today)?;
        self.persist()?;
        Ok(id)
    }

    /// Recompute every habit's stats for a new `today` (e.g. after midnight).
    ///
    /// Saves only if something changed. Returns the number of habits whose
    /// stats changed.
    pub fn refresh(&mut self, today: Day) -> HabitResult<usize> {
        let changed = self
            .habits
            .iter_mut()
            .map(|h| h.recompute(today))
            .filter(|changed| *changed)
            .count();
        if changed > 0 {
            debug!(changed, %today, "stats changed on refresh");
            self.persist()?;
        }
        Ok(changed)
    }

    /// Add imported habits, skipping ids that already exist.
    ///
    /// Returns the number of habits added.
    pub fn import(&mut self, habits: Vec<Habit>, today: Day) -> HabitResult<usize> {
        let mut added = 0;
        for mut habit in habits {
            if self.get(habit.id).is_some() {
                debug!(id = %habit.id, "skipping already present habit");
                continue;
            }
            habit.recompute(today);
            self.habits.push(habit);
            added += 1;
        }
        info!(added, "imported habits");
        if added > 0 {
            self.persist()?;
        }
        Ok(added)
    }

    fn apply(&mut self, action: Action, today: Day) -> HabitResult<HabitId> {
        match action {
            Action::AddHabit {
                mut request,
                created_at,
            } => {
                let n = self.habits.len();
                request
                    .color
                    .get_or_insert_with(|| COLORS[n % COLORS.len()].to_string());
                request
                    .icon
                    .get_or_insert_with(|| ICONS[n % ICONS.len()].to_string());
                let habit = Habit::create(request, created_at)?;
                info!(id = %habit.id, name = %habit.name, goal = %habit.goal, "habit created");
                let id = habit.id;
                self.habits.push(habit);
                Ok(id)
            }
            Action::DeleteHabit(id) => {
                let index = self.index_of(id)?;
                let habit = self.habits.remove(index);
                info!(id = %id, name = %habit.name, "habit deleted");
                Ok(id)
            }
            Action::ToggleCompletion { id, day } => {
                let habit = self.habit_mut(id)?;
                habit.toggle(day, today);
                debug!(
                    id = %id,
                    %day,
                    completed = habit.is_completed_on(day),
                    streak = habit.streak(),
                    longest = habit.longest_streak(),
                    "completion toggled"
                );
                Ok(id)
            }
            Action::UpdateGoal { id, goal } => {
                self.habit_mut(id)?.goal = goal;
                debug!(id = %id, %goal, "goal updated");
                Ok(id)
            }
            Action::RenameHabit { id, name } => {
                let name = validate_name(&name)?;
                self.habit_mut(id)?.name = name;
                Ok(id)
            }
        }
    }

    fn index_of(&self, id: HabitId) -> HabitResult<usize> {
        self.habits
            .iter()
            .position(|h| h.id == id)
            .ok_or(HabitError::NotFound(id))
    }

    fn habit_mut(&mut self, id: HabitId) -> HabitResult<&mut Habit> {
        self.habits
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or(HabitError::NotFound(id))
    }

    fn persist(&mut self) -> HabitResult<()> {
        self.repo.save(&self.habits).map_err(|e| {
            warn!(error = %e, "failed to save habits; keeping in-memory state");
            HabitError::from(e)
        })
    }
}
