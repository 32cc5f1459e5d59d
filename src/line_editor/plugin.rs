//! `PluginRegistry`: the collaborator the shell consults for externally
//! registered hooks (custom prompt segments, custom completion sources,
//! pre/post-command hooks). Trait seam only, per SPEC_FULL.md §1 — no
//! built-in plugin ships with this crate; a host embedding `den` implements
//! this to extend behaviour without the core knowing about it.

pub trait PluginRegistry {
    /// Called once per accepted command line, before parsing. Returning
    /// `Some` replaces the line (e.g. an alias-expansion plugin); `None`
    /// leaves it untouched.
    fn before_execute(&self, line: &str) -> Option<String>;

    /// Called after a command line finishes, with its exit code.
    fn after_execute(&self, line: &str, exit_code: i32);
}

/// No-op registry used when no plugins are configured.
#[derive(Debug, Clone, Default)]
pub struct NoPlugins;

impl PluginRegistry for NoPlugins {
    fn before_execute(&self, _line: &str) -> Option<String> {
        None
    }

    fn after_execute(&self, _line: &str, _exit_code: i32) {}
}
