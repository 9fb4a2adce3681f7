//! The widget set: the two collection engines, the composites built on
//! them, and the window shells.

pub mod appbar;
pub mod dialog;
pub mod edit;
pub mod fieldset;
pub mod item;
pub mod list;
pub mod menu;
pub mod message;
pub mod paging;
pub mod sash;
pub mod select;
pub mod stacked;
pub mod tabs;
pub mod tree;
pub mod window_flags;

pub use appbar::AppBarController;
pub use dialog::{
    ContentSpec, DialogController, DialogOptions, Direction, DrawerController, DrawerOptions,
    FloatingController, FloatingOptions, Place,
};
pub use edit::EditController;
pub use fieldset::FieldsetController;
pub use item::{ItemContent, ItemRef};
pub use list::{ListController, SortOrder, TriggerMode};
pub use menu::ContextMenuController;
pub use message::{MessageController, MessageOptions, Severity};
pub use paging::PagingController;
pub use sash::{Orientation, SashController};
pub use select::{DropListController, SelectController};
pub use stacked::StackedController;
pub use tabs::TabController;
pub use tree::{TreeController, TreeData, TreeNode, TreeNodeData};
pub use window_flags::WindowFlags;
