use std::fmt;

use log::{debug, warn};

use crate::{Error, Result};

/// A reversible mutation of a target `T`.
///
/// `redo` applies the change and `undo` reverts it. After `redo` then `undo`
/// the target must be observably identical to its state before `redo`.
pub trait Command<T> {
    /// Human-readable name, shown by hosts as "Undo <label>".
    fn label(&self) -> &str;

    fn redo(&mut self, target: &mut T) -> Result<()>;

    fn undo(&mut self, target: &mut T) -> Result<()>;
}

/// A group of commands that redo in push order and undo in reverse.
pub struct Macro<T> {
    label: String,
    commands: Vec<Box<dyn Command<T>>>,
}

impl<T> Macro<T> {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            commands: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn push(&mut self, command: Box<dyn Command<T>>) {
        self.commands.push(command);
    }
}

impl<T> Command<T> for Macro<T> {
    fn label(&self) -> &str {
        &self.label
    }

    /// Redoes every command. If one fails, the ones before it are undone
    /// again so the target is left as it was.
    fn redo(&mut self, target: &mut T) -> Result<()> {
        for i in 0..self.commands.len() {
            if let Err(err) = self.commands[i].redo(target) {
                warn!("'{}' failed at step {}, rolling back", self.label, i);
                for command in self.commands[..i].iter_mut().rev() {
                    command.undo(target)?;
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// Undoes every command in reverse. If one fails, the ones after it are
    /// redone again so the target is left as it was.
    fn undo(&mut self, target: &mut T) -> Result<()> {
        for i in (0..self.commands.len()).rev() {
            if let Err(err) = self.commands[i].undo(target) {
                warn!("undo of '{}' failed at step {}, rolling back", self.label, i);
                for command in &mut self.commands[i + 1..] {
                    command.redo(target)?;
                }
                return Err(err);
            }
        }
        Ok(())
    }
}

impl<T> fmt::Debug for Macro<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Macro")
            .field("label", &self.label)
            .field("commands", &self.commands.len())
            .finish()
    }
}

/// Linear command history.
///
/// Entries below `index` are done, entries at or above it can be redone.
/// Pushing truncates the redo tail. While a macro is open, pushed commands
/// are collected into it and the history cannot be navigated; the macro is
/// recorded as a single entry when its outermost `end_macro` is reached.
pub struct UndoStack<T> {
    entries: Vec<Box<dyn Command<T>>>,
    index: usize,
    open: Vec<Macro<T>>,
}

impl<T> Default for UndoStack<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: 0,
            open: Vec::new(),
        }
    }
}

impl<T: 'static> UndoStack<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `command` against `target` and records it.
    ///
    /// If the command fails it is not recorded and the error is returned.
    pub fn push<C>(&mut self, command: C, target: &mut T) -> Result<()>
    where
        C: Command<T> + 'static,
    {
        self.push_boxed(Box::new(command), target)
    }

    pub fn push_boxed(&mut self, mut command: Box<dyn Command<T>>, target: &mut T) -> Result<()> {
        command.redo(target)?;
        debug!("pushed '{}'", command.label());
        match self.open.last_mut() {
            Some(open) => open.push(command),
            None => self.record(command),
        }
        Ok(())
    }

    /// Opens a macro. Macros nest: an inner macro becomes a single command
    /// of the enclosing one.
    pub fn begin_macro(&mut self, label: impl Into<String>) {
        let label = label.into();
        debug!("begin macro '{}' (depth {})", label, self.open.len() + 1);
        self.open.push(Macro::new(label));
    }

    /// Closes the innermost open macro.
    ///
    /// An empty macro is discarded.
    ///
    /// # Errors
    /// [`Error::UnbalancedMacro`] if no macro is open.
    pub fn end_macro(&mut self) -> Result<()> {
        let closed = self.open.pop().ok_or(Error::UnbalancedMacro)?;
        debug!("end macro '{}' ({} commands)", closed.label, closed.len());
        if closed.is_empty() {
            return Ok(());
        }

        match self.open.last_mut() {
            Some(parent) => parent.push(Box::new(closed)),
            None => self.record(Box::new(closed)),
        }
        Ok(())
    }

    /// Closes the innermost open macro, reverting the commands it collected.
    ///
    /// # Errors
    /// [`Error::UnbalancedMacro`] if no macro is open.
    pub fn abort_macro(&mut self, target: &mut T) -> Result<()> {
        let mut aborted = self.open.pop().ok_or(Error::UnbalancedMacro)?;
        debug!("abort macro '{}'", aborted.label);
        aborted.undo(target)
    }

    /// Undoes the last done entry. Returns `false` if there is none.
    ///
    /// # Errors
    /// [`Error::MacroOpen`] while a macro is being recorded, or the error of
    /// the command itself, in which case the history position is unchanged.
    pub fn undo(&mut self, target: &mut T) -> Result<bool> {
        self.ensure_closed()?;
        if self.index == 0 {
            return Ok(false);
        }
        let command = &mut self.entries[self.index - 1];
        command.undo(target)?;
        debug!("undo '{}'", command.label());
        self.index -= 1;
        Ok(true)
    }

    /// Redoes the next undone entry. Returns `false` if there is none.
    ///
    /// # Errors
    /// Same as [`UndoStack::undo`].
    pub fn redo(&mut self, target: &mut T) -> Result<bool> {
        self.ensure_closed()?;
        if self.index == self.entries.len() {
            return Ok(false);
        }
        let command = &mut self.entries[self.index];
        command.redo(target)?;
        debug!("redo '{}'", command.label());
        self.index += 1;
        Ok(true)
    }

    /// Drops the whole history.
    ///
    /// # Errors
    /// [`Error::MacroOpen`] while a macro is being recorded.
    pub fn clear(&mut self) -> Result<()> {
        self.ensure_closed()?;
        self.entries.clear();
        self.index = 0;
        Ok(())
    }

    #[inline]
    pub fn can_undo(&self) -> bool {
        self.open.is_empty() && self.index > 0
    }

    #[inline]
    pub fn can_redo(&self) -> bool {
        self.open.is_empty() && self.index < self.entries.len()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.index
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .map(|c| c.label())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.entries.get(self.index).map(|c| c.label())
    }

    /// Number of recorded entries, done and undone.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries currently done.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn is_macro_open(&self) -> bool {
        !self.open.is_empty()
    }

    #[inline]
    pub fn macro_depth(&self) -> usize {
        self.open.len()
    }

    fn record(&mut self, command: Box<dyn Command<T>>) {
        self.entries.truncate(self.index);
        self.entries.push(command);
        self.index = self.entries.len();
    }

    fn ensure_closed(&self) -> Result<()> {
        match self.open.last() {
            Some(open) => Err(Error::MacroOpen {
                label: open.label.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl<T> fmt::Debug for UndoStack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoStack")
            .field("entries", &self.entries.len())
            .field("index", &self.index)
            .field("open", &self.open)
            .finish()
    }
}
