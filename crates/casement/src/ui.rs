//! The toolkit runtime: controller ownership, binding, event routing,
//! cascade deletion and the timer pump.
//!
//! [`Ui`] owns the registry mapping bound elements to their controllers.
//! Binding is idempotent: a second `bind_*` on the same element hands back
//! the existing controller untouched. Input enters through
//! [`dispatch`](Ui::dispatch), which sweeps the outside-dismiss watchers,
//! applies modality, routes the event to the controller on the nearest
//! bound ancestor of the target, and then delivers the resulting semantic
//! [`Outcome`]s to ancestor controllers.
//!
//! # Locking
//!
//! One controller is locked at a time; outcomes are routed only after the
//! emitting controller's lock is released. User callbacks therefore may use
//! the document and *other* controllers freely, but must not re-enter the
//! controller they are registered on.

use std::collections::HashMap;
use std::sync::Arc;

use casement_core::{Result, TimerId, TimerManager, UiError};
use parking_lot::{Mutex, RwLock};

use crate::callback::{CallbackRegistry, Handler};
use crate::controller::{Controller, DismissWatchers, ModalStack, Outcome};
use crate::dom::{Dom, ElementId, EventKind, InputEvent, Key};
use crate::widgets::dialog::{
    self, DialogController, DialogOptions, DrawerController, DrawerOptions, FloatingController,
    FloatingOptions,
};
use crate::widgets::menu::{self, ContextMenuController};
use crate::widgets::message::{MessageController, MessageOptions};
use crate::widgets::select::{self, DropListController, SelectController};
use crate::widgets::tabs::{TAB_CLASS, TabController};
use crate::widgets::{
    AppBarController, EditController, FieldsetController, ListController, PagingController,
    SashController, StackedController, TreeController,
};

/// A shared handle to one bound controller.
///
/// The widget set is a closed contract, so the registry stores a concrete
/// enum rather than trait objects; [`with`](WidgetRef::with) erases to
/// `dyn Controller` for the uniform operations.
#[derive(Clone)]
pub enum WidgetRef {
    List(Arc<Mutex<ListController>>),
    Stacked(Arc<Mutex<StackedController>>),
    Tree(Arc<Mutex<TreeController>>),
    Tab(Arc<Mutex<TabController>>),
    Select(Arc<Mutex<SelectController>>),
    DropList(Arc<Mutex<DropListController>>),
    Paging(Arc<Mutex<PagingController>>),
    AppBar(Arc<Mutex<AppBarController>>),
    Edit(Arc<Mutex<EditController>>),
    Fieldset(Arc<Mutex<FieldsetController>>),
    Sash(Arc<Mutex<SashController>>),
    Dialog(Arc<Mutex<DialogController>>),
    Drawer(Arc<Mutex<DrawerController>>),
    Floating(Arc<Mutex<FloatingController>>),
    Menu(Arc<Mutex<ContextMenuController>>),
    Message(Arc<Mutex<MessageController>>),
}

impl WidgetRef {
    /// Run a closure against the controller behind this handle.
    pub fn with<R>(&self, f: impl FnOnce(&mut dyn Controller) -> R) -> R {
        match self {
            Self::List(c) => f(&mut *c.lock()),
            Self::Stacked(c) => f(&mut *c.lock()),
            Self::Tree(c) => f(&mut *c.lock()),
            Self::Tab(c) => f(&mut *c.lock()),
            Self::Select(c) => f(&mut *c.lock()),
            Self::DropList(c) => f(&mut *c.lock()),
            Self::Paging(c) => f(&mut *c.lock()),
            Self::AppBar(c) => f(&mut *c.lock()),
            Self::Edit(c) => f(&mut *c.lock()),
            Self::Fieldset(c) => f(&mut *c.lock()),
            Self::Sash(c) => f(&mut *c.lock()),
            Self::Dialog(c) => f(&mut *c.lock()),
            Self::Drawer(c) => f(&mut *c.lock()),
            Self::Floating(c) => f(&mut *c.lock()),
            Self::Menu(c) => f(&mut *c.lock()),
            Self::Message(c) => f(&mut *c.lock()),
        }
    }

    /// The controller type name. Does not lock the controller.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::List(_) => "List",
            Self::Stacked(_) => "Stacked",
            Self::Tree(_) => "Tree",
            Self::Tab(_) => "Tab",
            Self::Select(_) => "Select",
            Self::DropList(_) => "DropList",
            Self::Paging(_) => "Paging",
            Self::AppBar(_) => "AppBar",
            Self::Edit(_) => "Edit",
            Self::Fieldset(_) => "Fieldset",
            Self::Sash(_) => "Sash",
            Self::Dialog(_) => "Dialog",
            Self::Drawer(_) => "Drawer",
            Self::Floating(_) => "Floating",
            Self::Menu(_) => "ContextMenu",
            Self::Message(_) => "Message",
        }
    }
}

/// The toolkit runtime. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct Ui {
    dom: Dom,
    registry: CallbackRegistry,
    controllers: Arc<RwLock<HashMap<ElementId, WidgetRef>>>,
    watchers: DismissWatchers,
    modals: ModalStack,
    timers: Arc<Mutex<TimerManager>>,
    timer_targets: Arc<Mutex<HashMap<TimerId, ElementId>>>,
}

impl Default for Ui {
    fn default() -> Self {
        Self::new()
    }
}

impl Ui {
    /// Create a runtime over a fresh document.
    pub fn new() -> Self {
        Self::with_dom(Dom::new())
    }

    /// Create a runtime over an existing document.
    pub fn with_dom(dom: Dom) -> Self {
        Self {
            dom,
            registry: CallbackRegistry::new(),
            controllers: Arc::new(RwLock::new(HashMap::new())),
            watchers: DismissWatchers::new(),
            modals: ModalStack::new(),
            timers: Arc::new(Mutex::new(TimerManager::new())),
            timer_targets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The document handle.
    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    /// The declarative callback registry.
    pub fn registry(&self) -> &CallbackRegistry {
        &self.registry
    }

    /// Number of live outside-dismiss watchers.
    pub fn watcher_count(&self) -> usize {
        self.watchers.count()
    }

    /// The controller bound to `element`, if any.
    pub fn controller(&self, element: ElementId) -> Option<WidgetRef> {
        self.controllers.read().get(&element).cloned()
    }

    /// Number of bound controllers.
    pub fn controller_count(&self) -> usize {
        self.controllers.read().len()
    }

    /// Replace a named callback slot on the controller bound to `element`.
    pub fn set_callback(&self, element: ElementId, name: &str, handler: Handler) -> Result<()> {
        let widget = self
            .controller(element)
            .ok_or_else(|| UiError::parameter_mismatch(format!("{element:?} is not bound")))?;
        widget.with(|c| c.callbacks_mut().set(name, handler))
    }

    fn register(&self, element: ElementId, widget: WidgetRef) {
        self.controllers.write().insert(element, widget);
    }

    /// Look up an existing binding, insisting on the expected kind.
    fn existing<T>(
        &self,
        element: Option<ElementId>,
        pick: impl Fn(&WidgetRef) -> Option<Arc<Mutex<T>>>,
    ) -> Result<Option<Arc<Mutex<T>>>> {
        let Some(element) = element else {
            return Ok(None);
        };
        match self.controllers.read().get(&element) {
            None => Ok(None),
            Some(widget) => match pick(widget) {
                Some(existing) => Ok(Some(existing)),
                None => Err(UiError::parameter_mismatch(format!(
                    "{element:?} is already bound as {}",
                    widget.kind()
                ))),
            },
        }
    }

    // =========================================================================
    // Binding
    // =========================================================================

    /// Bind a list controller. Binding an already-bound element returns the
    /// existing controller with its callback customizations intact.
    pub fn bind_list(&self, element: Option<ElementId>) -> Result<Arc<Mutex<ListController>>> {
        if let Some(existing) = self.existing(element, |w| match w {
            WidgetRef::List(c) => Some(c.clone()),
            _ => None,
        })? {
            return Ok(existing);
        }
        let controller = Arc::new(Mutex::new(ListController::new(
            self.dom.clone(),
            &self.registry,
            element,
        )?));
        let element = controller.lock().element();
        self.register(element, WidgetRef::List(controller.clone()));
        Ok(controller)
    }

    /// Bind a stacked-view controller.
    pub fn bind_stacked(&self, element: Option<ElementId>) -> Result<Arc<Mutex<StackedController>>> {
        if let Some(existing) = self.existing(element, |w| match w {
            WidgetRef::Stacked(c) => Some(c.clone()),
            _ => None,
        })? {
            return Ok(existing);
        }
        let controller = Arc::new(Mutex::new(StackedController::new(
            self.dom.clone(),
            &self.registry,
            element,
        )?));
        let element = controller.lock().element();
        self.register(element, WidgetRef::Stacked(controller.clone()));
        Ok(controller)
    }

    /// Bind a tree controller.
    pub fn bind_tree(&self, element: Option<ElementId>) -> Result<Arc<Mutex<TreeController>>> {
        if let Some(existing) = self.existing(element, |w| match w {
            WidgetRef::Tree(c) => Some(c.clone()),
            _ => None,
        })? {
            return Ok(existing);
        }
        let controller = Arc::new(Mutex::new(TreeController::new(
            self.dom.clone(),
            &self.registry,
            element,
        )?));
        let element = controller.lock().element();
        self.register(element, WidgetRef::Tree(controller.clone()));
        Ok(controller)
    }

    /// Bind an edit controller.
    pub fn bind_edit(&self, element: Option<ElementId>) -> Result<Arc<Mutex<EditController>>> {
        if let Some(existing) = self.existing(element, |w| match w {
            WidgetRef::Edit(c) => Some(c.clone()),
            _ => None,
        })? {
            return Ok(existing);
        }
        let controller = Arc::new(Mutex::new(EditController::new(
            self.dom.clone(),
            &self.registry,
            element,
        )?));
        let element = controller.lock().element();
        self.register(element, WidgetRef::Edit(controller.clone()));
        Ok(controller)
    }

    /// Bind a fieldset controller.
    pub fn bind_fieldset(
        &self,
        element: Option<ElementId>,
    ) -> Result<Arc<Mutex<FieldsetController>>> {
        if let Some(existing) = self.existing(element, |w| match w {
            WidgetRef::Fieldset(c) => Some(c.clone()),
            _ => None,
        })? {
            return Ok(existing);
        }
        let controller = Arc::new(Mutex::new(FieldsetController::new(
            self.dom.clone(),
            &self.registry,
            element,
        )?));
        let element = controller.lock().element();
        self.register(element, WidgetRef::Fieldset(controller.clone()));
        Ok(controller)
    }

    /// Bind a paging controller.
    pub fn bind_paging(&self, element: Option<ElementId>) -> Result<Arc<Mutex<PagingController>>> {
        if let Some(existing) = self.existing(element, |w| match w {
            WidgetRef::Paging(c) => Some(c.clone()),
            _ => None,
        })? {
            return Ok(existing);
        }
        let controller = Arc::new(Mutex::new(PagingController::new(
            self.dom.clone(),
            &self.registry,
            element,
        )?));
        let element = controller.lock().element();
        self.register(element, WidgetRef::Paging(controller.clone()));
        Ok(controller)
    }

    /// Bind an app-bar controller.
    pub fn bind_appbar(&self, element: Option<ElementId>) -> Result<Arc<Mutex<AppBarController>>> {
        if let Some(existing) = self.existing(element, |w| match w {
            WidgetRef::AppBar(c) => Some(c.clone()),
            _ => None,
        })? {
            return Ok(existing);
        }
        let controller = Arc::new(Mutex::new(AppBarController::new(
            self.dom.clone(),
            &self.registry,
            element,
        )?));
        let element = controller.lock().element();
        self.register(element, WidgetRef::AppBar(controller.clone()));
        Ok(controller)
    }

    /// Bind a sash controller.
    pub fn bind_sash(&self, element: Option<ElementId>) -> Result<Arc<Mutex<SashController>>> {
        if let Some(existing) = self.existing(element, |w| match w {
            WidgetRef::Sash(c) => Some(c.clone()),
            _ => None,
        })? {
            return Ok(existing);
        }
        let controller = Arc::new(Mutex::new(SashController::new(
            self.dom.clone(),
            &self.registry,
            element,
        )?));
        let element = controller.lock().element();
        self.register(element, WidgetRef::Sash(controller.clone()));
        Ok(controller)
    }

    /// Bind a tab composite: ensures the bar and content children, binds
    /// their primitive controllers, and assembles the composite over them.
    pub fn bind_tab(&self, element: Option<ElementId>) -> Result<Arc<Mutex<TabController>>> {
        if let Some(existing) = self.existing(element, |w| match w {
            WidgetRef::Tab(c) => Some(c.clone()),
            _ => None,
        })? {
            return Ok(existing);
        }

        let element = match element {
            Some(element) => element,
            None => {
                let element = self.dom.create_element("div");
                self.dom.with_mut(|doc| doc.add_class(element, TAB_CLASS))?;
                element
            }
        };
        let (bar_el, content_el, views) = TabController::prepare(&self.dom, element)?;
        let bar = self.bind_list(Some(bar_el))?;
        let content = self.bind_stacked(Some(content_el))?;
        let controller = Arc::new(Mutex::new(TabController::new(
            self.dom.clone(),
            &self.registry,
            element,
            bar,
            content,
            views,
        )?));
        self.register(element, WidgetRef::Tab(controller.clone()));
        Ok(controller)
    }

    /// Bind a select composite.
    pub fn bind_select(&self, element: Option<ElementId>) -> Result<Arc<Mutex<SelectController>>> {
        if let Some(existing) = self.existing(element, |w| match w {
            WidgetRef::Select(c) => Some(c.clone()),
            _ => None,
        })? {
            return Ok(existing);
        }

        let element = match element {
            Some(element) => element,
            None => {
                let element = self.dom.create_element("div");
                self.dom
                    .with_mut(|doc| doc.add_class(element, select::SELECT_ROLE_CLASS))?;
                element
            }
        };
        let (field, popup_el) = select::prepare(&self.dom, element, true)?;
        let popup = self.bind_list(Some(popup_el))?;
        let field = field.ok_or_else(|| UiError::missing_vital_element("select field"))?;
        let controller = Arc::new(Mutex::new(SelectController::new(
            self.dom.clone(),
            &self.registry,
            element,
            field,
            popup,
            self.watchers.clone(),
        )?));
        self.register(element, WidgetRef::Select(controller.clone()));
        Ok(controller)
    }

    /// Bind a drop-list composite.
    pub fn bind_droplist(
        &self,
        element: Option<ElementId>,
    ) -> Result<Arc<Mutex<DropListController>>> {
        if let Some(existing) = self.existing(element, |w| match w {
            WidgetRef::DropList(c) => Some(c.clone()),
            _ => None,
        })? {
            return Ok(existing);
        }

        let element = match element {
            Some(element) => element,
            None => {
                let element = self.dom.create_element("div");
                self.dom
                    .with_mut(|doc| doc.add_class(element, select::DROPLIST_CLASS))?;
                element
            }
        };
        let (_, popup_el) = select::prepare(&self.dom, element, false)?;
        let popup = self.bind_list(Some(popup_el))?;
        let controller = Arc::new(Mutex::new(DropListController::new(
            self.dom.clone(),
            &self.registry,
            element,
            popup,
            self.watchers.clone(),
        )?));
        self.register(element, WidgetRef::DropList(controller.clone()));
        Ok(controller)
    }

    // =========================================================================
    // Programmatic shells
    // =========================================================================

    /// Enforce the event-id uniqueness rule: the latest opener of a given
    /// interaction identity wins, the previous shell is deleted.
    fn displace(&self, event_id: Option<&str>) -> Result<()> {
        let Some(event_id) = event_id else {
            return Ok(());
        };
        let previous = self.dom.with(|doc| dialog::displace_event_id(doc, event_id));
        if let Some(previous) = previous {
            tracing::debug!(
                target: "casement::controller",
                event_id,
                "displacing previous shell"
            );
            self.delete(previous)?;
        }
        Ok(())
    }

    /// Open a dialog shell.
    pub fn open_dialog(&self, options: DialogOptions) -> Result<Arc<Mutex<DialogController>>> {
        self.displace(options.event_id.as_deref())?;
        let controller = Arc::new(Mutex::new(DialogController::create(
            self.dom.clone(),
            self.modals.clone(),
            options,
        )?));
        let element = controller.lock().element();
        self.register(element, WidgetRef::Dialog(controller.clone()));
        Ok(controller)
    }

    /// Open a drawer shell.
    pub fn open_drawer(&self, options: DrawerOptions) -> Result<Arc<Mutex<DrawerController>>> {
        self.displace(options.event_id.as_deref())?;
        let controller = Arc::new(Mutex::new(DrawerController::create(
            self.dom.clone(),
            self.modals.clone(),
            self.watchers.clone(),
            options,
        )?));
        let element = controller.lock().element();
        self.register(element, WidgetRef::Drawer(controller.clone()));
        Ok(controller)
    }

    /// Open a floating panel.
    pub fn open_floating(
        &self,
        options: FloatingOptions,
    ) -> Result<Arc<Mutex<FloatingController>>> {
        self.displace(options.event_id.as_deref())?;
        let controller = Arc::new(Mutex::new(FloatingController::create(
            self.dom.clone(),
            options,
        )?));
        let element = controller.lock().element();
        self.register(element, WidgetRef::Floating(controller.clone()));
        Ok(controller)
    }

    /// Show a transient message notice.
    pub fn open_message(&self, options: MessageOptions) -> Result<Arc<Mutex<MessageController>>> {
        self.displace(options.event_id.as_deref())?;
        let duration = options.duration;
        let controller = Arc::new(Mutex::new(MessageController::create(
            self.dom.clone(),
            options,
        )?));
        let element = controller.lock().element();
        if let Some(duration) = duration {
            let id = self.timers.lock().start_one_shot(duration);
            self.timer_targets.lock().insert(id, element);
            controller.lock().set_dismiss_timer(id);
        }
        self.register(element, WidgetRef::Message(controller.clone()));
        Ok(controller)
    }

    /// Open a context menu with the given entries at a point.
    pub fn open_context_menu(
        &self,
        entries: &[&str],
        x: i64,
        y: i64,
        event_id: Option<&str>,
    ) -> Result<Arc<Mutex<ContextMenuController>>> {
        self.displace(event_id)?;
        let element = self.dom.create_element("div");
        self.dom.with_mut(|doc| {
            doc.add_class(element, menu::MENU_CLASS)?;
            if let Some(event_id) = event_id {
                doc.set_attr(element, dialog::EVENT_ID_ATTR, event_id)?;
            }
            let root = doc.root();
            doc.append_child(root, element)
        })?;

        let list_el = menu::prepare(&self.dom, element)?;
        let list = self.bind_list(Some(list_el))?;
        let controller = Arc::new(Mutex::new(ContextMenuController::new(
            self.dom.clone(),
            &self.registry,
            element,
            list,
            self.watchers.clone(),
        )?));
        self.register(element, WidgetRef::Menu(controller.clone()));
        {
            let mut menu = controller.lock();
            menu.set_entries(entries)?;
            menu.show_at(x, y)?;
        }
        Ok(controller)
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Delete an element and everything below it.
    ///
    /// Every controller bound inside the subtree is deleted first, children
    /// before parents, each firing its `delete` slot; the subtree is then
    /// removed from the document.
    pub fn delete(&self, element: ElementId) -> Result<()> {
        let order = self.dom.with(|doc| doc.post_order(element))?;
        for node in order {
            self.drop_controller(node);
        }
        self.dom.remove(element)
    }

    /// Remove and tear down the controller bound to `element`, if any.
    pub(crate) fn drop_controller(&self, element: ElementId) {
        let widget = self.controllers.write().remove(&element);
        let Some(widget) = widget else {
            return;
        };
        tracing::debug!(target: "casement::controller", ?element, kind = widget.kind(), "deleting controller");
        widget.with(|c| c.on_delete());
        self.watchers.remove_owner(element);
        self.modals.remove(element);
        self.timer_targets.lock().retain(|_, &mut target| target != element);
    }

    // =========================================================================
    // Event routing
    // =========================================================================

    /// Inject an input event.
    ///
    /// Pointer-down first sweeps the outside-dismiss watchers (a press
    /// outside a watched popup dismisses it and is consumed); Escape
    /// dismisses the topmost popup; while a modal shell is up, events
    /// outside it are swallowed. Otherwise the event goes to the controller
    /// on the nearest bound ancestor of the target, and the semantic
    /// outcomes it produces are delivered up the ancestor chain.
    pub fn dispatch(&self, event: InputEvent) -> Result<()> {
        if matches!(event.kind, EventKind::Key(Key::Escape)) {
            if let Some(watcher) = self.watchers.take_top() {
                if let Some(widget) = self.controller(watcher.owner) {
                    widget.with(|c| c.on_dismiss());
                }
                return Ok(());
            }
        }

        if matches!(event.kind, EventKind::PointerDown) {
            let outside = self
                .dom
                .with(|doc| self.watchers.take_outside(doc, event.target));
            if !outside.is_empty() {
                for watcher in outside {
                    if let Some(widget) = self.controller(watcher.owner) {
                        widget.with(|c| c.on_dismiss());
                    }
                }
                // The press that dismissed a popup does nothing else.
                return Ok(());
            }
        }

        if let Some(top) = self.modals.top() {
            let inside = self
                .dom
                .with(|doc| doc.contains(top, event.target))
                .unwrap_or(false);
            if !inside {
                return Ok(());
            }
        }

        let Some((element, widget)) = self.find_controller_for(event.target)? else {
            return Ok(());
        };
        let outcomes = widget.with(|c| c.handle_event(&event));
        self.route_outcomes(element, outcomes);
        Ok(())
    }

    fn find_controller_for(&self, target: ElementId) -> Result<Option<(ElementId, WidgetRef)>> {
        let chain = self.dom.with(|doc| -> Result<Vec<ElementId>> {
            let mut chain = Vec::new();
            let mut current = Some(target);
            while let Some(id) = current {
                chain.push(id);
                current = doc.parent(id)?;
            }
            Ok(chain)
        })?;

        let controllers = self.controllers.read();
        for element in chain {
            if let Some(widget) = controllers.get(&element) {
                return Ok(Some((element, widget.clone())));
            }
        }
        Ok(None)
    }

    fn ancestors_of(&self, element: ElementId) -> Vec<ElementId> {
        self.dom
            .with(|doc| -> Result<Vec<ElementId>> {
                let mut out = Vec::new();
                let mut current = doc.parent(element)?;
                while let Some(id) = current {
                    out.push(id);
                    current = doc.parent(id)?;
                }
                Ok(out)
            })
            .unwrap_or_default()
    }

    fn route_outcomes(&self, from: ElementId, outcomes: Vec<Outcome>) {
        for outcome in outcomes {
            if let Outcome::CloseRequested { element } = outcome {
                let _ = self.delete(element);
                continue;
            }

            for ancestor in self.ancestors_of(from) {
                let Some(widget) = self.controller(ancestor) else {
                    continue;
                };
                let further = widget.with(|c| c.on_child_outcome(&outcome));
                self.route_outcomes(ancestor, further);
            }
        }
    }

    // =========================================================================
    // Timers
    // =========================================================================

    /// Drain due timers and pending debounced work.
    ///
    /// Call this from the host's idle loop (or from tests after waiting out
    /// a debounce window).
    pub fn pump(&self) {
        let fired = self.timers.lock().process_expired();
        for id in fired {
            let target = self.timer_targets.lock().remove(&id);
            let Some(element) = target else {
                continue;
            };
            if let Some(widget) = self.controller(element) {
                let outcomes = widget.with(|c| c.on_timer(id));
                self.route_outcomes(element, outcomes);
            }
        }

        let entries: Vec<(ElementId, WidgetRef)> = self
            .controllers
            .read()
            .iter()
            .map(|(&element, widget)| (element, widget.clone()))
            .collect();
        for (element, widget) in entries {
            let outcomes = widget.with(|c| c.pump());
            if !outcomes.is_empty() {
                self.route_outcomes(element, outcomes);
            }
        }
    }
}
