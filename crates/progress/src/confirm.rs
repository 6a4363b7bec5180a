//! Yes/no confirmation prompts.

/// Blocking yes/no prompt shown before a destructive or final action.
pub trait Confirm {
    /// Ask `message`; `true` means the user agreed.
    fn confirm(&self, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

/// Answers every prompt with the same value, e.g. for `--yes` flags.
#[derive(Debug, Clone, Copy)]
pub struct Preanswered(pub bool);

impl Confirm for Preanswered {
    fn confirm(&self, _message: &str) -> bool {
        self.0
    }
}
