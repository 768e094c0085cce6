//! Menu data model.
//!
//! Items carry a tagged action instead of opaque callbacks: a branch holds
//! its child items, a leaf holds a command value the navigator hands back to
//! the caller. All mutation happens at the call site.

pub struct MenuItem<C> {
    pub id: String,
    pub label: String,
    pub action: MenuAction<C>,
}

pub enum MenuAction<C> {
    /// Selecting descends into a submenu.
    Navigate(Vec<MenuItem<C>>),
    /// Selecting returns this command and ends the navigation session.
    Invoke(C),
}

impl<C> MenuItem<C> {
    pub fn leaf(id: impl Into<String>, label: impl Into<String>, command: C) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            action: MenuAction::Invoke(command),
        }
    }

    pub fn branch(
        id: impl Into<String>,
        label: impl Into<String>,
        children: Vec<MenuItem<C>>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            action: MenuAction::Navigate(children),
        }
    }

    pub fn is_branch(&self) -> bool {
        matches!(self.action, MenuAction::Navigate(_))
    }
}
