//! The job table: bash's `jobs`/`fg`/`bg`/`wait` all read and write this.
//!
//! Grounded on the process-group model described for job control — one
//! `Job` per pipeline launched, tracked by process group id (pgid) so that
//! `fg`/`bg`/`kill` can signal the whole pipeline at once via
//! `killpg`/`tcsetpgrp` rather than chasing individual pids.

use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    Stopped,
    Done,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Running => "Running",
            JobState::Stopped => "Stopped",
            JobState::Done => "Done",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: u32,
    /// Process group id of the job's pipeline.
    pub pgid: i32,
    /// Member pids, in pipeline order.
    pub pids: Vec<i32>,
    pub command_text: String,
    pub state: JobState,
    pub last_status: Option<i32>,
    pub background: bool,
    /// True for the job last referred to by a bare `%%`/`%+`.
    pub is_current: bool,
}

/// Ordered by job id so `jobs` prints in launch order; job ids are reused
/// only after `Done` jobs are reaped, matching bash's `%N` numbering.
#[derive(Debug, Clone, Default)]
pub struct JobTable {
    jobs: IndexMap<u32, Job>,
    next_id: u32,
}

impl JobTable {
    pub fn new() -> Self {
        Self { jobs: IndexMap::new(), next_id: 1 }
    }

    pub fn add(&mut self, pgid: i32, pids: Vec<i32>, command_text: String, background: bool) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        for job in self.jobs.values_mut() {
            job.is_current = false;
        }
        self.jobs.insert(id, Job {
            id,
            pgid,
            pids,
            command_text,
            state: JobState::Running,
            last_status: None,
            background,
            is_current: true,
        });
        id
    }

    pub fn get(&self, id: u32) -> Option<&Job> {
        self.jobs.get(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Job> {
        self.jobs.get_mut(&id)
    }

    pub fn find_by_pgid_mut(&mut self, pgid: i32) -> Option<&mut Job> {
        self.jobs.values_mut().find(|j| j.pgid == pgid)
    }

    pub fn find_by_pid(&self, pid: i32) -> Option<&Job> {
        self.jobs.values().find(|j| j.pids.contains(&pid))
    }

    pub fn current(&self) -> Option<&Job> {
        self.jobs.values().find(|j| j.is_current)
            .or_else(|| self.jobs.values().last())
    }

    pub fn remove(&mut self, id: u32) -> Option<Job> {
        self.jobs.shift_remove(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Remove every job already marked `Done` (called after `wait`/`jobs`
    /// has reported them once).
    pub fn reap_done(&mut self) -> Vec<Job> {
        let done_ids: Vec<u32> = self.jobs.iter()
            .filter(|(_, j)| j.state == JobState::Done)
            .map(|(id, _)| *id)
            .collect();
        done_ids.into_iter().filter_map(|id| self.jobs.shift_remove(&id)).collect()
    }
}

/// Parse a `%spec` job reference (`%1`, `%+`, `%-`, `%%`, `%foo` prefix
/// match, `%?foo` substring match). Returns the resolved job id.
pub fn resolve_job_spec(table: &JobTable, spec: &str) -> Option<u32> {
    let spec = spec.strip_prefix('%').unwrap_or(spec);
    if spec.is_empty() || spec == "%" || spec == "+" {
        return table.current().map(|j| j.id);
    }
    if spec == "-" {
        let mut jobs: Vec<&Job> = table.iter().collect();
        jobs.sort_by_key(|j| j.id);
        return jobs.iter().rev().nth(1).map(|j| j.id);
    }
    if let Ok(n) = spec.parse::<u32>() {
        return table.get(n).map(|j| j.id);
    }
    if let Some(needle) = spec.strip_prefix('?') {
        return table.iter().find(|j| j.command_text.contains(needle)).map(|j| j.id);
    }
    table.iter().find(|j| j.command_text.starts_with(spec)).map(|j| j.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_assigns_increasing_ids() {
        let mut t = JobTable::new();
        let a = t.add(100, vec![100], "sleep 1".into(), true);
        let b = t.add(200, vec![200], "sleep 2".into(), true);
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn current_job_tracks_most_recent() {
        let mut t = JobTable::new();
        t.add(100, vec![100], "a".into(), true);
        let b = t.add(200, vec![200], "b".into(), true);
        assert_eq!(t.current().unwrap().id, b);
    }

    #[test]
    fn resolve_job_spec_by_number_and_prefix() {
        let mut t = JobTable::new();
        t.add(100, vec![100], "make build".into(), true);
        assert_eq!(resolve_job_spec(&t, "%1"), Some(1));
        assert_eq!(resolve_job_spec(&t, "%make").map(|_| ()), Some(()));
        assert_eq!(resolve_job_spec(&t, "%nope"), None);
    }

    #[test]
    fn reap_done_removes_only_finished_jobs() {
        let mut t = JobTable::new();
        let a = t.add(100, vec![100], "a".into(), true);
        t.add(200, vec![200], "b".into(), true);
        t.get_mut(a).unwrap().state = JobState::Done;
        let reaped = t.reap_done();
        assert_eq!(reaped.len(), 1);
        assert_eq!(t.len(), 1);
    }
}
