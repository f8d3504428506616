//! An ordered list of stages.

use std::sync::Arc;

use crate::error::StackError;
use crate::stage::Stage;

/// Where [`Phase::intercept`] puts a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    /// Before every existing stage.
    First,
    /// After every existing stage.
    Last,
    /// Immediately before the first stage with this name.
    Before(String),
    /// Immediately after the first stage with this name.
    After(String),
}

/// Stages run strictly in list order.
///
/// Names need not be unique: inserting the same stage twice runs it twice.
pub struct Phase<S: ?Sized> {
    stages: Vec<Arc<S>>,
}

impl<S: ?Sized + Stage> std::fmt::Debug for Phase<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl<S: ?Sized> Default for Phase<S> {
    fn default() -> Self {
        Self { stages: Vec::new() }
    }
}

impl<S: ?Sized> Clone for Phase<S> {
    fn clone(&self) -> Self {
        Self {
            stages: self.stages.clone(),
        }
    }
}

impl<S: ?Sized + Stage> Phase<S> {
    /// An empty phase.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `stage` at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::StageNotFound`] if a relative position names a
    /// stage that is not in the phase. The phase is left unchanged.
    pub fn intercept(&mut self, position: Position, stage: Arc<S>) -> Result<(), StackError> {
        let index = match position {
            Position::First => 0,
            Position::Last => self.stages.len(),
            Position::Before(name) => self.index_of(&name)?,
            Position::After(name) => self.index_of(&name)? + 1,
        };
        self.stages.insert(index, stage);
        Ok(())
    }

    /// Append `stage` at the end.
    pub fn append(&mut self, stage: Arc<S>) {
        self.stages.push(stage);
    }

    /// Stage names in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Stages in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<S>> {
        self.stages.iter()
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the phase has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    fn index_of(&self, name: &str) -> Result<usize, StackError> {
        self.stages
            .iter()
            .position(|stage| stage.name() == name)
            .ok_or_else(|| StackError::StageNotFound(name.to_owned()))
    }
}
