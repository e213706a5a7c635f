//! OAuth scope constants required by each class operation.
//!
//! Tokens carry the scopes granted to the client; the HTTP layer rejects a
//! request whose token lacks the scope of the operation it invokes.

/// Scope to read a single class
pub const CLASSES_GET: &str = "classes.get";
/// Scope to list the caller's classes
pub const CLASSES_LIST: &str = "classes.list";
/// Scope to create a class
pub const CLASSES_NEW: &str = "classes.new";
/// Scope to update class fields
pub const CLASSES_UPDATE: &str = "classes.update";
/// Scope to deactivate a class
pub const CLASSES_DELETE: &str = "classes.delete";

/// Scope to list class members
pub const CLASSES_LIST_MEMBERS: &str = "classes.list_members";
/// Scope to join a class
pub const CLASSES_JOIN: &str = "classes.join";
/// Scope to leave a class or remove a member
pub const CLASSES_LEAVE: &str = "classes.leave";
/// Scope to change a member's role
pub const CLASSES_MEMBERS_UPDATE: &str = "classes.members:update";

pub const ALL: [&str; 9] = [
    CLASSES_GET,
    CLASSES_LIST,
    CLASSES_NEW,
    CLASSES_UPDATE,
    CLASSES_DELETE,
    CLASSES_LIST_MEMBERS,
    CLASSES_JOIN,
    CLASSES_LEAVE,
    CLASSES_MEMBERS_UPDATE,
];
