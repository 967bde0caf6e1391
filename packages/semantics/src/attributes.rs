//! Reserved attribute and class names.
//!
//! Both halves of the engine read these names: the template index and the
//! transform engine look them up on source attributes, the mirror looks them up
//! on live DOM attributes. They must never be spelled anywhere else.

/// Stable source identifier, written into markup by the tag pass.
pub const OID_ATTRIBUTE: &str = "data-oid";

/// Ephemeral runtime identifier, only ever present in the live document.
pub const UUID_ATTRIBUTE: &str = "data-odid";

/// Reconciliation key regenerated on siblings after structural edits.
pub const KEY_ATTRIBUTE: &str = "key";

/// Prefix of generated reconciliation keys.
pub const KEY_PREFIX: &str = "tk-";

/// Class-list attribute in component markup.
pub const CLASS_NAME_ATTRIBUTE: &str = "className";

/// Class-list attribute in the live document.
pub const DOM_CLASS_ATTRIBUTE: &str = "class";

/// Marks the element currently being dragged.
pub const DRAG_MARKER_ATTRIBUTE: &str = "data-tandem-dragging";

/// Bookkeeping attribute holding the drag start index of the dragged element.
pub const DRAG_INDEX_ATTRIBUTE: &str = "data-tandem-drag-index";

/// Marks the element whose text is being edited.
pub const EDITING_TEXT_ATTRIBUTE: &str = "data-tandem-editing-text";

/// Class of the placeholder inserted while dragging.
pub const DRAG_STUB_CLASS: &str = "tandem-drag-stub";

/// Class of the placeholder shown while drawing a new element.
pub const INSERT_STUB_CLASS: &str = "tandem-insert-stub";

/// Class of the measurement helper nodes.
pub const MEASURE_STUB_CLASS: &str = "tandem-measure-stub";

/// Editor-injected helper classes. Nodes carrying one are invisible to the mirror.
pub const IGNORED_CLASSES: &[&str] = &[DRAG_STUB_CLASS, INSERT_STUB_CLASS, MEASURE_STUB_CLASS];

/// Attributes written by the editor for its own bookkeeping.
pub const BOOKKEEPING_ATTRIBUTES: &[&str] = &[
    UUID_ATTRIBUTE,
    DRAG_MARKER_ATTRIBUTE,
    DRAG_INDEX_ATTRIBUTE,
    EDITING_TEXT_ATTRIBUTE,
];

pub fn is_bookkeeping_attribute(name: &str) -> bool {
    BOOKKEEPING_ATTRIBUTES.contains(&name)
}
